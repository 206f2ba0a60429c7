use super::call::{ambiguous, build_call};
use super::conditional::bind_condition;
use super::{bind, check_arity, poisoned};
use crate::bound::{BoundKind, BoundNode};
use crate::context::BindingContext;
use crate::diagnostics::codes;
use crate::error::BindError;
use crate::resolve::{Resolution, find_method};
use rl_ast::{BinaryOp, Span, SyntaxNode, UnaryOp};
use rl_types::{NumericKind, PrimitiveKind, TypeRef, builtins};

/// Comparisons that lift onto a shared boxed type when an operand may be null.
const NULLABLE_COMPARISONS: [&str; 6] = ["eq", "ne", "gt", "ge", "lt", "le"];

/// Binary operators bind as calls to the operator method of the same name.
pub(super) fn bind_binary(
    node: &SyntaxNode,
    op: BinaryOp,
    ctx: &mut BindingContext<'_>,
) -> Result<BoundNode, BindError> {
    let Some(method_name) = op.method_name() else {
        return bind_logical(node, op, ctx);
    };
    if let Some(error) = check_arity(node, 2..=2, ctx) {
        return Ok(error);
    }
    let lhs = bind(&node.children[0], ctx)?;
    let rhs = bind(&node.children[1], ctx)?;
    if lhs.is_error() || rhs.is_error() {
        return Ok(poisoned(node));
    }
    operator_call(method_name, op.symbol(), vec![lhs, rhs], &node.span, ctx)
}

pub(super) fn bind_unary(
    node: &SyntaxNode,
    op: UnaryOp,
    ctx: &mut BindingContext<'_>,
) -> Result<BoundNode, BindError> {
    if let Some(error) = check_arity(node, 1..=1, ctx) {
        return Ok(error);
    }
    let operand = bind(&node.children[0], ctx)?;
    if operand.is_error() {
        return Ok(poisoned(node));
    }
    let symbol = match op {
        UnaryOp::Not => "!",
        UnaryOp::Negate => "-",
    };
    operator_call(op.method_name(), symbol, vec![operand], &node.span, ctx)
}

/// Short-circuit `and` / `or` over boolean-like operands.
pub(super) fn bind_logical(
    node: &SyntaxNode,
    op: BinaryOp,
    ctx: &mut BindingContext<'_>,
) -> Result<BoundNode, BindError> {
    if let Some(error) = check_arity(node, 2..=2, ctx) {
        return Ok(error);
    }
    let lhs = bind_condition(&node.children[0], ctx)?;
    let rhs = bind_condition(&node.children[1], ctx)?;
    if lhs.is_error() || rhs.is_error() {
        return Ok(poisoned(node));
    }
    let kind = match op {
        BinaryOp::Or => BoundKind::Or(Box::new(lhs), Box::new(rhs)),
        _ => BoundKind::And(Box::new(lhs), Box::new(rhs)),
    };
    Ok(BoundNode::new(kind, builtins().boolean(), node.span.clone()))
}

fn operator_call(
    method_name: &str,
    symbol: &str,
    operands: Vec<BoundNode>,
    span: &Span,
    ctx: &mut BindingContext<'_>,
) -> Result<BoundNode, BindError> {
    let written_types: Vec<TypeRef> = operands.iter().map(|operand| operand.ty.clone()).collect();
    let operands = if operands.iter().all(|operand| operand.ty.is_null()) {
        coerce_all(operands, &builtins().object, ctx)?
    } else if NULLABLE_COMPARISONS.contains(&method_name) {
        match lifted_type(&written_types) {
            Some(target) => coerce_all(operands, &target, ctx)?,
            None => operands,
        }
    } else {
        operands
    };
    let operand_types: Vec<TypeRef> = operands.iter().map(|operand| operand.ty.clone()).collect();
    let candidates = ctx.find_methods(method_name);
    match find_method(&candidates, method_name, &operand_types, ctx.registry())? {
        Resolution::Found(caller) => Ok(build_call(caller, None, operands, span, ctx)),
        Resolution::NotFound => {
            let rendered: Vec<String> = written_types.iter().map(ToString::to_string).collect();
            Ok(ctx.error_node(
                codes::METHOD_NOT_FOUND,
                format!(
                    "operator '{symbol}' is not defined for ({})",
                    rendered.join(", ")
                ),
                span,
            ))
        }
        Resolution::Ambiguous(methods) => {
            Ok(ambiguous(&methods, method_name, &operand_types, span, ctx))
        }
    }
}

/// Shared boxed type for a comparison with at least one boxed operand, so a
/// null operand yields a three-state result instead of failing to unbox.
fn lifted_type(types: &[TypeRef]) -> Option<TypeRef> {
    if !types.iter().any(|ty| ty.boxed_kind().is_some()) {
        return None;
    }
    let present: Vec<&TypeRef> = types.iter().filter(|ty| !ty.is_null()).collect();
    if present.iter().all(|ty| ty.is_boolean_like()) {
        return Some(builtins().boxed(PrimitiveKind::Boolean));
    }
    let working = present
        .iter()
        .map(|ty| ty.numeric_kind())
        .try_fold(None::<NumericKind>, |acc, kind| {
            let kind = kind?;
            Some(Some(acc.map_or(kind.promote(kind), |acc| acc.promote(kind))))
        })??;
    Some(match working.primitive() {
        Some(primitive) => builtins().boxed(primitive),
        None => builtins().numeric(working),
    })
}

/// Implicitly casts every operand to `target`; operands that do not convert
/// stay as written and fall back to ordinary overload resolution.
fn coerce_all(
    operands: Vec<BoundNode>,
    target: &TypeRef,
    ctx: &BindingContext<'_>,
) -> Result<Vec<BoundNode>, BindError> {
    let mut casts = Vec::with_capacity(operands.len());
    for operand in &operands {
        match ctx.get_implicit_cast(&operand.ty, target)? {
            Some(cast) => casts.push(cast),
            None => return Ok(operands),
        }
    }
    Ok(operands
        .into_iter()
        .zip(casts)
        .map(|(operand, cast)| ctx.wrap_cast(operand, cast))
        .collect())
}
