//! Node binders: syntax node in, typed bound node out.
//!
//! Each binder binds its children, validates them, computes the result type,
//! inserts implicit casts and builds the node. Semantic failures produce an
//! error node plus a diagnostic; only internal failures return `Err`.

use crate::bound::BoundNode;
use crate::context::BindingContext;
use crate::diagnostics::codes;
use crate::error::BindError;
use rl_ast::{NodeKind, SyntaxNode};
use std::ops::RangeInclusive;

mod access;
mod aggregate;
mod array;
mod block;
mod call;
mod cast;
mod conditional;
mod identifier;
mod literal;
mod new;
mod operator;
mod type_name;

pub use aggregate::bind_aggregate;
pub use call::{bind_member_call, bind_method_call};
pub use conditional::{bind_condition, bind_conditional};
pub use type_name::resolve_type;

/// Binds `node` and everything below it.
pub fn bind(node: &SyntaxNode, ctx: &mut BindingContext<'_>) -> Result<BoundNode, BindError> {
    if !ctx.enter_node() {
        let limit = ctx.config().max_bind_depth;
        return Ok(ctx.error_node(
            codes::NESTING_TOO_DEEP,
            format!("expression is nested deeper than {limit} levels"),
            &node.span,
        ));
    }
    let bound = bind_node(node, ctx);
    ctx.exit_node();
    bound
}

fn bind_node(node: &SyntaxNode, ctx: &mut BindingContext<'_>) -> Result<BoundNode, BindError> {
    match node.kind {
        NodeKind::Literal(kind) => literal::bind_literal(node, kind, ctx),
        NodeKind::Identifier => identifier::bind_identifier(node, ctx),
        NodeKind::FieldAccess => access::bind_field_access(node, ctx),
        NodeKind::Index => access::bind_index(node, ctx),
        NodeKind::MethodCall => call::bind_method_call(node, ctx),
        NodeKind::MemberCall => call::bind_member_call(node, ctx),
        NodeKind::Binary(op) if op.is_logical() => operator::bind_logical(node, op, ctx),
        NodeKind::Binary(op) => operator::bind_binary(node, op, ctx),
        NodeKind::Unary(op) => operator::bind_unary(node, op, ctx),
        NodeKind::Cast => cast::bind_cast(node, ctx),
        NodeKind::Ternary | NodeKind::If => conditional::bind_conditional(node, ctx),
        NodeKind::New => new::bind_new(node, ctx),
        NodeKind::NewArray => new::bind_new_array(node, ctx),
        NodeKind::ArrayInit => array::bind_array_init(node, ctx),
        NodeKind::Aggregate(kind) => aggregate::bind_aggregate(node, kind, ctx),
        NodeKind::Block => block::bind_block(node, ctx),
        NodeKind::VarDecl => block::bind_var_decl(node, ctx),
        NodeKind::TypeName | NodeKind::ArrayType | NodeKind::LoopVar => Ok(ctx.error_node(
            codes::MALFORMED_NODE,
            format!("{} cannot be used as a value", node.kind.label()),
            &node.span,
        )),
    }
}

/// Error node for a node whose child count is outside `expected`.
pub(crate) fn check_arity(
    node: &SyntaxNode,
    expected: RangeInclusive<usize>,
    ctx: &mut BindingContext<'_>,
) -> Option<BoundNode> {
    if expected.contains(&node.child_count()) {
        return None;
    }
    let message = if *expected.end() == usize::MAX {
        format!(
            "{} expects at least {} children, found {}",
            node.kind.label(),
            expected.start(),
            node.child_count()
        )
    } else if expected.start() == expected.end() {
        format!(
            "{} expects {} children, found {}",
            node.kind.label(),
            expected.start(),
            node.child_count()
        )
    } else {
        format!(
            "{} expects {} to {} children, found {}",
            node.kind.label(),
            expected.start(),
            expected.end(),
            node.child_count()
        )
    };
    Some(ctx.error_node(codes::MALFORMED_NODE, message, &node.span))
}

pub(crate) fn bind_all(
    nodes: &[SyntaxNode],
    ctx: &mut BindingContext<'_>,
) -> Result<Vec<BoundNode>, BindError> {
    nodes.iter().map(|node| bind(node, ctx)).collect()
}

/// Error node standing for a parent whose child already failed and was
/// reported.
pub(crate) fn poisoned(node: &SyntaxNode) -> BoundNode {
    BoundNode::error(format!("{} has an operand that failed to bind", node.kind.label()), node.span.clone())
}
