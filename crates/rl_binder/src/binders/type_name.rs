use crate::context::BindingContext;
use crate::diagnostics::{Diagnostic, codes};
use rl_ast::{NodeKind, SyntaxNode};
use rl_types::TypeRef;

/// Resolves a type reference, reporting a diagnostic when it cannot.
pub fn resolve_type(node: &SyntaxNode, ctx: &mut BindingContext<'_>) -> Option<TypeRef> {
    match node.kind {
        NodeKind::TypeName => {
            let found = ctx.find_type(node.text());
            if found.is_none() {
                ctx.report(Diagnostic::error(
                    codes::TYPE_NOT_FOUND,
                    format!("unknown type '{}'", node.text()),
                    Some(node.span.clone()),
                ));
            }
            found
        }
        NodeKind::ArrayType => match node.child(0) {
            Some(element) => {
                let element = resolve_type(element, ctx)?;
                Some(ctx.array_of(&element))
            }
            None => {
                ctx.report(Diagnostic::error(
                    codes::MALFORMED_NODE,
                    "array type without an element type",
                    Some(node.span.clone()),
                ));
                None
            }
        },
        _ => {
            ctx.report(Diagnostic::error(
                codes::MALFORMED_NODE,
                format!("expected a type, found {}", node.kind.label()),
                Some(node.span.clone()),
            ));
            None
        }
    }
}
