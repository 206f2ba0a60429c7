use super::{bind, check_arity, poisoned, resolve_type};
use crate::bound::{BoundKind, BoundNode};
use crate::context::{BindingContext, LOCAL_NAMESPACE};
use crate::error::BindError;
use rl_ast::SyntaxNode;
use rl_types::builtins;

/// `{ s1; s2; ... }`: statements share one local scope; the block's value is
/// the value of its last statement.
pub(super) fn bind_block(
    node: &SyntaxNode,
    ctx: &mut BindingContext<'_>,
) -> Result<BoundNode, BindError> {
    let statements = {
        let mut scope = ctx.push_local_var_context();
        let mut statements = Vec::with_capacity(node.child_count());
        for child in &node.children {
            statements.push(bind(child, &mut scope)?);
        }
        statements
    };
    let ty = statements
        .last()
        .map(|last| last.ty.clone())
        .unwrap_or_else(|| builtins().void.clone());
    Ok(BoundNode::new(
        BoundKind::Block(statements),
        ty,
        node.span.clone(),
    ))
}

/// `Type name = init`.
pub(super) fn bind_var_decl(
    node: &SyntaxNode,
    ctx: &mut BindingContext<'_>,
) -> Result<BoundNode, BindError> {
    if let Some(error) = check_arity(node, 2..=2, ctx) {
        return Ok(error);
    }
    let declared = resolve_type(&node.children[0], ctx);
    let init = bind(&node.children[1], ctx)?;
    let Some(declared) = declared else {
        return Ok(poisoned(node));
    };
    let init = ctx.coerce(init, &declared)?;
    if init.is_error() {
        return Ok(poisoned(node));
    }
    let Some(var) = ctx.add_var(LOCAL_NAMESPACE, node.text(), declared, &node.span) else {
        return Ok(poisoned(node));
    };
    Ok(BoundNode::new(
        BoundKind::VarDecl {
            slot: var.slot,
            init: Box::new(init),
        },
        var.ty,
        node.span.clone(),
    ))
}
