use super::{bind, bind_all, check_arity, poisoned};
use crate::bound::{BoundKind, BoundNode};
use crate::context::BindingContext;
use crate::diagnostics::{Diagnostic, codes};
use crate::error::BindError;
use crate::resolve::{MethodCaller, Resolution, describe_call, find_method};
use rl_ast::{Span, SyntaxNode};
use rl_types::{MethodKind, MethodRef, TypeRef};

/// `name(args...)` against module methods and the operator library.
pub fn bind_method_call(
    node: &SyntaxNode,
    ctx: &mut BindingContext<'_>,
) -> Result<BoundNode, BindError> {
    let args = bind_all(&node.children, ctx)?;
    if args.iter().any(BoundNode::is_error) {
        return Ok(poisoned(node));
    }
    let candidates = ctx.find_methods(node.text());
    invoke_resolved(&candidates, node.text(), None, args, &node.span, ctx)
}

/// `receiver.name(args...)` against the receiver type's methods.
pub fn bind_member_call(
    node: &SyntaxNode,
    ctx: &mut BindingContext<'_>,
) -> Result<BoundNode, BindError> {
    if let Some(error) = check_arity(node, 1..=usize::MAX, ctx) {
        return Ok(error);
    }
    let receiver = bind(&node.children[0], ctx)?;
    let args = bind_all(&node.children[1..], ctx)?;
    if receiver.is_error() || args.iter().any(BoundNode::is_error) {
        return Ok(poisoned(node));
    }
    let candidates = receiver.ty.methods_named(node.text());
    invoke_resolved(&candidates, node.text(), Some(receiver), args, &node.span, ctx)
}

/// Resolves `name` among `candidates` and builds the call, or an error node.
pub(super) fn invoke_resolved(
    candidates: &[MethodRef],
    name: &str,
    receiver: Option<BoundNode>,
    args: Vec<BoundNode>,
    span: &Span,
    ctx: &mut BindingContext<'_>,
) -> Result<BoundNode, BindError> {
    let arg_types: Vec<TypeRef> = args.iter().map(|arg| arg.ty.clone()).collect();
    match find_method(candidates, name, &arg_types, ctx.registry())? {
        Resolution::Found(caller) => {
            let target = receiver.filter(|_| !caller.method.is_static());
            Ok(build_call(caller, target, args, span, ctx))
        }
        Resolution::NotFound => Ok(ctx.error_node(
            codes::METHOD_NOT_FOUND,
            format!("method '{}' is not found", describe_call(name, &arg_types)),
            span,
        )),
        Resolution::Ambiguous(methods) => Ok(ambiguous(&methods, name, &arg_types, span, ctx)),
    }
}

pub(super) fn ambiguous(
    methods: &[MethodRef],
    name: &str,
    arg_types: &[TypeRef],
    span: &Span,
    ctx: &mut BindingContext<'_>,
) -> BoundNode {
    let signatures: Vec<String> = methods.iter().map(|method| method.signature()).collect();
    ctx.error_node(
        codes::AMBIGUOUS_METHOD,
        format!(
            "call '{}' is ambiguous between {}",
            describe_call(name, arg_types),
            signatures.join(" and ")
        ),
        span,
    )
}

/// Wraps arguments in their casts and builds a call or constructor node.
pub(super) fn build_call(
    caller: MethodCaller,
    target: Option<BoundNode>,
    args: Vec<BoundNode>,
    span: &Span,
    ctx: &mut BindingContext<'_>,
) -> BoundNode {
    let MethodCaller { method, casts, .. } = caller;
    if let Some(note) = method.deprecation() {
        if ctx.config().report_deprecations {
            ctx.report(Diagnostic::warning(
                codes::DEPRECATED_METHOD,
                format!("'{}' is deprecated: {note}", method.signature()),
                Some(span.clone()),
            ));
        }
    }
    let args: Vec<BoundNode> = args
        .into_iter()
        .zip(casts)
        .map(|(arg, cast)| ctx.wrap_cast(arg, cast))
        .collect();
    let ty = method.return_type().clone();
    let kind = if method.kind() == MethodKind::Constructor {
        BoundKind::Constructor { method, args }
    } else {
        BoundKind::MethodCall {
            method,
            target: target.map(Box::new),
            args,
        }
    };
    BoundNode::new(kind, ty, span.clone())
}
