use crate::bound::{BoundKind, BoundNode};
use crate::context::BindingContext;
use crate::diagnostics::codes;
use crate::error::BindError;
use rl_ast::SyntaxNode;

/// Resolves a bare name: local variable, then a field of an implicit
/// receiver, then a module field.
pub(super) fn bind_identifier(
    node: &SyntaxNode,
    ctx: &mut BindingContext<'_>,
) -> Result<BoundNode, BindError> {
    let name = node.text();
    let span = node.span.clone();

    if let Some(var) = ctx.lookup_var(name) {
        return Ok(BoundNode::new(
            BoundKind::LocalVar {
                name: var.name.clone(),
                slot: var.slot,
            },
            var.ty.clone(),
            span,
        ));
    }

    if let Some((receiver, field)) = ctx.find_receiver_field(name) {
        let target = BoundNode::new(
            BoundKind::LocalVar {
                name: receiver.name,
                slot: receiver.slot,
            },
            receiver.ty,
            span.clone(),
        );
        return Ok(BoundNode::new(
            BoundKind::FieldAccess {
                target: Box::new(target),
                field: field.name,
            },
            field.ty,
            span,
        ));
    }

    if let Some(field) = ctx.module().get_field(name).cloned() {
        let ty = field.ty.clone();
        return Ok(BoundNode::new(BoundKind::ModuleField(field), ty, span));
    }

    Ok(ctx.error_node(
        codes::UNKNOWN_IDENTIFIER,
        format!("unknown identifier '{name}'"),
        &span,
    ))
}
