use super::call::{ambiguous, build_call};
use super::{bind, bind_all, check_arity, poisoned, resolve_type};
use crate::bound::{BoundKind, BoundNode};
use crate::context::BindingContext;
use crate::diagnostics::codes;
use crate::error::BindError;
use crate::resolve::{Resolution, describe_call, find_method};
use rl_ast::SyntaxNode;
use rl_types::{TypeRef, builtins};

/// `new Type(args...)`.
pub(super) fn bind_new(
    node: &SyntaxNode,
    ctx: &mut BindingContext<'_>,
) -> Result<BoundNode, BindError> {
    if let Some(error) = check_arity(node, 1..=usize::MAX, ctx) {
        return Ok(error);
    }
    let ty = resolve_type(&node.children[0], ctx);
    let args = bind_all(&node.children[1..], ctx)?;
    let Some(ty) = ty else {
        return Ok(poisoned(node));
    };
    if args.iter().any(BoundNode::is_error) {
        return Ok(poisoned(node));
    }

    let arg_types: Vec<TypeRef> = args.iter().map(|arg| arg.ty.clone()).collect();
    let constructors = ty.constructors().to_vec();
    let name = constructors
        .first()
        .map(|constructor| constructor.name().to_string())
        .unwrap_or_else(|| ty.name().to_string());
    match find_method(&constructors, &name, &arg_types, ctx.registry())? {
        Resolution::Found(caller) => Ok(build_call(caller, None, args, &node.span, ctx)),
        Resolution::NotFound => Ok(ctx.error_node(
            codes::CONSTRUCTOR_NOT_FOUND,
            format!(
                "constructor '{}' is not found",
                describe_call(ty.name(), &arg_types)
            ),
            &node.span,
        )),
        Resolution::Ambiguous(methods) => {
            Ok(ambiguous(&methods, ty.name(), &arg_types, &node.span, ctx))
        }
    }
}

/// `new Type[size]`, filled with the element type's default value.
pub(super) fn bind_new_array(
    node: &SyntaxNode,
    ctx: &mut BindingContext<'_>,
) -> Result<BoundNode, BindError> {
    if let Some(error) = check_arity(node, 2..=2, ctx) {
        return Ok(error);
    }
    let element = resolve_type(&node.children[0], ctx);
    let size = bind(&node.children[1], ctx)?;
    let Some(element) = element else {
        return Ok(poisoned(node));
    };
    if size.is_error() {
        return Ok(poisoned(node));
    }
    let size = ctx.coerce(size, &builtins().int())?;
    if size.is_error() {
        return Ok(poisoned(node));
    }
    let ty = ctx.array_of(&element);
    Ok(BoundNode::new(
        BoundKind::NewArray {
            element,
            size: Box::new(size),
        },
        ty,
        node.span.clone(),
    ))
}
