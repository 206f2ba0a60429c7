use super::{bind_all, poisoned};
use crate::bound::{BoundKind, BoundNode};
use crate::context::BindingContext;
use crate::diagnostics::codes;
use crate::error::BindError;
use rl_ast::SyntaxNode;
use rl_types::{TypeRef, builtins};

/// `{e1, e2, ...}`: elements are converted to their narrowest common type.
pub(super) fn bind_array_init(
    node: &SyntaxNode,
    ctx: &mut BindingContext<'_>,
) -> Result<BoundNode, BindError> {
    let elements = bind_all(&node.children, ctx)?;
    if elements.iter().any(BoundNode::is_error) {
        return Ok(poisoned(node));
    }

    let mut common: Option<TypeRef> = None;
    for element in &elements {
        let next = match &common {
            None => Some(element.ty.clone()),
            Some(current) => ctx.implicit_castable_type(current, &element.ty)?,
        };
        let Some(next) = next else {
            let message = format!(
                "array elements of type '{}' and '{}' have no common type",
                common.as_ref().map(ToString::to_string).unwrap_or_default(),
                element.ty
            );
            return Ok(ctx.error_node(codes::TYPE_MISMATCH, message, &element.span));
        };
        common = Some(next);
    }
    let component = match common {
        Some(ty) if !ty.is_null() => ty,
        _ => builtins().object.clone(),
    };

    let mut converted = Vec::with_capacity(elements.len());
    for element in elements {
        converted.push(ctx.coerce(element, &component)?);
    }
    let ty = ctx.array_of(&component);
    Ok(BoundNode::new(
        BoundKind::ArrayInit(converted),
        ty,
        node.span.clone(),
    ))
}
