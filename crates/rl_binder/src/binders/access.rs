use super::{bind, check_arity, poisoned};
use crate::bound::{BoundKind, BoundNode};
use crate::context::BindingContext;
use crate::diagnostics::codes;
use crate::error::BindError;
use rl_ast::SyntaxNode;
use rl_types::builtins;

/// `target.field`; arrays expose `length`.
pub(super) fn bind_field_access(
    node: &SyntaxNode,
    ctx: &mut BindingContext<'_>,
) -> Result<BoundNode, BindError> {
    if let Some(error) = check_arity(node, 1..=1, ctx) {
        return Ok(error);
    }
    let target = bind(&node.children[0], ctx)?;
    if target.is_error() {
        return Ok(poisoned(node));
    }
    let name = node.text();
    let span = node.span.clone();

    if target.ty.is_array() && name == "length" {
        return Ok(BoundNode::new(
            BoundKind::ArrayLength(Box::new(target)),
            builtins().int(),
            span,
        ));
    }
    let Some(field) = target.ty.field(name).cloned() else {
        let message = format!("type '{}' has no field '{name}'", target.ty);
        return Ok(ctx.error_node(codes::FIELD_NOT_FOUND, message, &span));
    };
    Ok(BoundNode::new(
        BoundKind::FieldAccess {
            target: Box::new(target),
            field: field.name,
        },
        field.ty,
        span,
    ))
}

/// `array[index]` over arrays and collections.
pub(super) fn bind_index(
    node: &SyntaxNode,
    ctx: &mut BindingContext<'_>,
) -> Result<BoundNode, BindError> {
    if let Some(error) = check_arity(node, 2..=2, ctx) {
        return Ok(error);
    }
    let array = bind(&node.children[0], ctx)?;
    let index = bind(&node.children[1], ctx)?;
    if array.is_error() || index.is_error() {
        return Ok(poisoned(node));
    }
    let Some(component) = array.ty.component_type() else {
        let message = format!("cannot index a value of type '{}'", array.ty);
        return Ok(ctx.error_node(codes::NOT_AGGREGATE, message, &node.span));
    };
    let index = ctx.coerce(index, &builtins().int())?;
    if index.is_error() {
        return Ok(poisoned(node));
    }
    Ok(BoundNode::new(
        BoundKind::ArrayElement {
            array: Box::new(array),
            index: Box::new(index),
        },
        component,
        node.span.clone(),
    ))
}
