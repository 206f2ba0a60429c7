use super::{bind, check_arity, poisoned, resolve_type};
use crate::bound::BoundNode;
use crate::context::BindingContext;
use crate::diagnostics::codes;
use crate::error::BindError;
use rl_ast::SyntaxNode;

/// `(Type) operand`; implicit and explicit conversions are both allowed.
pub(super) fn bind_cast(
    node: &SyntaxNode,
    ctx: &mut BindingContext<'_>,
) -> Result<BoundNode, BindError> {
    if let Some(error) = check_arity(node, 2..=2, ctx) {
        return Ok(error);
    }
    let target = resolve_type(&node.children[0], ctx);
    let operand = bind(&node.children[1], ctx)?;
    let Some(target) = target else {
        return Ok(poisoned(node));
    };
    if operand.is_error() {
        return Ok(poisoned(node));
    }
    if operand.ty == target {
        return Ok(operand);
    }
    match ctx.get_cast(&operand.ty, &target)? {
        Some(cast) => {
            let mut cast_node = ctx.wrap_cast(operand, cast);
            cast_node.span = node.span.clone();
            Ok(cast_node)
        }
        None => {
            let message = format!("cannot cast '{}' to '{}'", operand.ty, target);
            Ok(ctx.error_node(codes::INVALID_CAST, message, &node.span))
        }
    }
}
