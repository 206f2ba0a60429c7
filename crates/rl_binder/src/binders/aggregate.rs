//! Aggregate selections over arrays and collections:
//! `source[@ filter]`, `source[!@ filter]` and `source[*@ expression]`.

use super::conditional::bind_condition;
use super::{bind, check_arity, poisoned, resolve_type};
use crate::bound::{BoundKind, BoundNode};
use crate::context::{BindingContext, LOCAL_NAMESPACE};
use crate::diagnostics::{Diagnostic, codes};
use crate::error::BindError;
use rl_ast::{AggregateKind, NodeKind, SyntaxNode};
use rl_types::{Cast, TypeRef, builtins};

/// Binds an aggregate. The body is bound inside its own local scope, which is
/// closed again on every path out of this function.
pub fn bind_aggregate(
    node: &SyntaxNode,
    kind: AggregateKind,
    ctx: &mut BindingContext<'_>,
) -> Result<BoundNode, BindError> {
    if let Some(error) = check_arity(node, 2..=3, ctx) {
        return Ok(error);
    }
    let source = bind(&node.children[0], ctx)?;
    if source.is_error() {
        return Ok(poisoned(node));
    }
    let Some(element) = source.ty.component_type() else {
        let message = format!(
            "{} needs an array or collection, found '{}'",
            kind.label(),
            source.ty
        );
        return Ok(ctx.error_node(codes::NOT_AGGREGATE, message, &source.span));
    };

    let (var_node, body_node) = match node.children.as_slice() {
        [_, var, body] => (Some(var), body),
        [_, body] => (None, body),
        _ => return Ok(poisoned(node)),
    };

    let bound = {
        let mut scope = ctx.push_local_var_context();
        bind_body(kind, &element, var_node, body_node, &mut scope)?
    };
    let Some(LoopBody {
        slot,
        var_type,
        element_cast,
        body,
    }) = bound
    else {
        return Ok(poisoned(node));
    };

    let ty = match kind {
        AggregateKind::SelectAll if source.ty.is_array() && element_cast.is_none() => {
            source.ty.clone()
        }
        AggregateKind::SelectAll => ctx.array_of(&var_type),
        AggregateKind::SelectFirst => builtins().box_type(&var_type),
        AggregateKind::Collect => {
            let component = if body.ty.is_null() || body.ty.is_void() {
                builtins().object.clone()
            } else {
                body.ty.clone()
            };
            ctx.array_of(&component)
        }
    };
    Ok(BoundNode::new(
        BoundKind::Aggregate {
            kind,
            source: Box::new(source),
            slot,
            element_cast,
            body: Box::new(body),
        },
        ty,
        node.span.clone(),
    ))
}

struct LoopBody {
    slot: usize,
    var_type: TypeRef,
    element_cast: Option<Cast>,
    body: BoundNode,
}

/// Declares the loop variable in the current (fresh) scope and binds the body.
/// `None` when something failed and was already reported.
fn bind_body(
    kind: AggregateKind,
    element: &TypeRef,
    var_node: Option<&SyntaxNode>,
    body_node: &SyntaxNode,
    ctx: &mut BindingContext<'_>,
) -> Result<Option<LoopBody>, BindError> {
    let (var, element_cast) = match var_node {
        Some(var_node) => {
            if var_node.kind != NodeKind::LoopVar {
                ctx.report(Diagnostic::error(
                    codes::MALFORMED_NODE,
                    format!("expected a loop variable, found {}", var_node.kind.label()),
                    Some(var_node.span.clone()),
                ));
                return Ok(None);
            }
            let declared = match var_node.child(0) {
                Some(type_node) => match resolve_type(type_node, ctx) {
                    Some(ty) => ty,
                    None => return Ok(None),
                },
                None => element.clone(),
            };
            let element_cast = if &declared == element {
                None
            } else {
                match ctx.get_implicit_cast(element, &declared)? {
                    Some(cast) => Some(cast),
                    None => {
                        ctx.report(Diagnostic::error(
                            codes::TYPE_MISMATCH,
                            format!(
                                "elements of type '{element}' cannot be assigned to '{}' of type '{declared}'",
                                var_node.text()
                            ),
                            Some(var_node.span.clone()),
                        ));
                        return Ok(None);
                    }
                }
            };
            let Some(var) = ctx.add_var(LOCAL_NAMESPACE, var_node.text(), declared, &var_node.span)
            else {
                return Ok(None);
            };
            (var, element_cast)
        }
        None => {
            let name = ctx.hidden_var_name();
            let Some(var) = ctx.add_var(LOCAL_NAMESPACE, &name, element.clone(), &body_node.span)
            else {
                return Ok(None);
            };
            ctx.add_implicit_receiver(var.clone());
            (var, None)
        }
    };

    let body = if kind.is_filter() {
        bind_condition(body_node, ctx)?
    } else {
        bind(body_node, ctx)?
    };
    if body.is_error() {
        return Ok(None);
    }
    Ok(Some(LoopBody {
        slot: var.slot,
        var_type: var.ty,
        element_cast,
        body,
    }))
}
