//! `if` and ternary expressions, including branch type widening.

use super::{bind, check_arity, poisoned};
use crate::bound::{BoundKind, BoundNode};
use crate::config::WideningFailure;
use crate::context::BindingContext;
use crate::diagnostics::{Diagnostic, codes};
use crate::error::BindError;
use rl_ast::{NodeKind, SyntaxNode};
use rl_types::{Cast, TypeRef, builtins};
use tracing::{trace, warn};

/// Binds a condition: `boolean` passes, `Boolean` is unboxed, anything else
/// becomes an error node.
pub fn bind_condition(
    node: &SyntaxNode,
    ctx: &mut BindingContext<'_>,
) -> Result<BoundNode, BindError> {
    let condition = bind(node, ctx)?;
    if condition.is_error() {
        return Ok(condition);
    }
    let boolean = builtins().boolean();
    if condition.ty.is_boolean_like() {
        return ctx.coerce(condition, &boolean);
    }
    let message = format!("condition must be boolean, found '{}'", condition.ty);
    Ok(ctx.error_node(codes::CONDITION_NOT_BOOLEAN, message, &condition.span))
}

pub fn bind_conditional(
    node: &SyntaxNode,
    ctx: &mut BindingContext<'_>,
) -> Result<BoundNode, BindError> {
    let arity = if node.kind == NodeKind::Ternary {
        3..=3
    } else {
        2..=3
    };
    if let Some(error) = check_arity(node, arity, ctx) {
        return Ok(error);
    }
    let condition = bind_condition(&node.children[0], ctx)?;
    let then = bind(&node.children[1], ctx)?;
    let otherwise = node
        .children
        .get(2)
        .map(|child| bind(child, ctx))
        .transpose()?;
    if condition.is_error() {
        return Ok(condition);
    }
    if then.is_error() || otherwise.as_ref().is_some_and(BoundNode::is_error) {
        return Ok(poisoned(node));
    }

    let span = node.span.clone();
    let Some(otherwise) = otherwise else {
        let ty = then.ty.clone();
        return Ok(BoundNode::new(
            BoundKind::Conditional {
                condition: Box::new(condition),
                then: Box::new(then),
                otherwise: None,
            },
            ty,
            span,
        ));
    };

    let (then, otherwise, ty) = match unify_branches(then, otherwise, ctx)? {
        Unified::Typed(then, otherwise, ty) => (then, otherwise, ty),
        Unified::Failed(then_ty, else_ty) => {
            let message = format!("branches of type '{then_ty}' and '{else_ty}' have no common type");
            return Ok(ctx.error_node(codes::INCOMPATIBLE_BRANCHES, message, &span));
        }
    };
    Ok(BoundNode::new(
        BoundKind::Conditional {
            condition: Box::new(condition),
            then: Box::new(then),
            otherwise: Some(Box::new(otherwise)),
        },
        ty,
        span,
    ))
}

enum Unified {
    Typed(BoundNode, BoundNode, TypeRef),
    Failed(TypeRef, TypeRef),
}

fn unify_branches(
    then: BoundNode,
    otherwise: BoundNode,
    ctx: &mut BindingContext<'_>,
) -> Result<Unified, BindError> {
    if then.ty == otherwise.ty {
        let ty = then.ty.clone();
        return Ok(Unified::Typed(then, otherwise, ty));
    }

    if then.ty.is_null() || otherwise.ty.is_null() {
        let other = if then.ty.is_null() { &otherwise.ty } else { &then.ty };
        let ty = builtins().box_type(other);
        let then = ctx.coerce(then, &ty)?;
        let otherwise = ctx.coerce(otherwise, &ty)?;
        return Ok(Unified::Typed(then, otherwise, ty));
    }

    let forward = ctx.get_implicit_cast(&then.ty, &otherwise.ty)?;
    let backward = ctx.get_implicit_cast(&otherwise.ty, &then.ty)?;
    match (forward, backward) {
        (Some(forward), Some(backward)) => {
            // Convert the branch that is further from the other one.
            if forward.distance > backward.distance {
                Ok(cast_then(then, otherwise, forward, ctx))
            } else {
                Ok(cast_else(then, otherwise, backward, ctx))
            }
        }
        (Some(forward), None) => Ok(cast_then(then, otherwise, forward, ctx)),
        (None, Some(backward)) => Ok(cast_else(then, otherwise, backward, ctx)),
        (None, None) => widen_both(then, otherwise, ctx),
    }
}

fn cast_then(
    then: BoundNode,
    otherwise: BoundNode,
    cast: Cast,
    ctx: &mut BindingContext<'_>,
) -> Unified {
    let ty = otherwise.ty.clone();
    Unified::Typed(ctx.wrap_cast(then, cast), otherwise, ty)
}

fn cast_else(
    then: BoundNode,
    otherwise: BoundNode,
    cast: Cast,
    ctx: &mut BindingContext<'_>,
) -> Unified {
    let ty = then.ty.clone();
    Unified::Typed(then, ctx.wrap_cast(otherwise, cast), ty)
}

/// Neither branch converts to the other: look for a shared superclass, then
/// the narrowest common implicit target, then apply the configured policy.
fn widen_both(
    then: BoundNode,
    otherwise: BoundNode,
    ctx: &mut BindingContext<'_>,
) -> Result<Unified, BindError> {
    let common = match common_superclass(&then.ty, &otherwise.ty) {
        Some(common) => Some(common),
        None => ctx.implicit_castable_type(&then.ty, &otherwise.ty)?,
    };
    if let Some(ty) = common {
        trace!(then = %then.ty, otherwise = %otherwise.ty, common = %ty, "branches widened");
        let then = ctx.coerce(then, &ty)?;
        let otherwise = ctx.coerce(otherwise, &ty)?;
        return Ok(Unified::Typed(then, otherwise, ty));
    }

    match ctx.config().widening_failure {
        WideningFailure::Error => Ok(Unified::Failed(then.ty, otherwise.ty)),
        WideningFailure::KeepBranches => {
            warn!(then = %then.ty, otherwise = %otherwise.ty, "branches kept unconverted");
            ctx.report(Diagnostic::warning(
                codes::BRANCHES_KEPT,
                format!(
                    "branches of type '{}' and '{}' share no type; the result is typed as Object",
                    then.ty, otherwise.ty
                ),
                Some(then.span.merge(&otherwise.span)),
            ));
            Ok(Unified::Typed(then, otherwise, builtins().object.clone()))
        }
    }
}

/// Nearest non-interface class shared by both types, excluding the object
/// root.
fn common_superclass(a: &TypeRef, b: &TypeRef) -> Option<TypeRef> {
    if a.is_primitive() || b.is_primitive() {
        return None;
    }
    let own = |ty: &TypeRef| {
        let mut chain = vec![ty.clone()];
        chain.extend(ty.superclass_chain());
        chain
    };
    let theirs = own(b);
    own(a)
        .into_iter()
        .filter(|ty| !ty.is_interface() && !ty.is_object_root())
        .find(|ty| theirs.contains(ty))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BinderConfig;
    use crate::module::ModuleOpenClass;
    use rl_ast::build;
    use rl_types::{CastKind, NumericKind, PrimitiveKind};

    fn bind_with(config: BinderConfig, node: &SyntaxNode) -> (BoundNode, Vec<Diagnostic>) {
        let mut module = ModuleOpenClass::new("Rules", "rules");
        let base = module.declare_datatype("Vehicle", Vec::new(), Vec::new()).unwrap();
        module
            .declare_datatype("Car", vec![base.clone()], Vec::new())
            .unwrap();
        module.declare_datatype("Truck", vec![base], Vec::new()).unwrap();
        let mut ctx = BindingContext::new(&mut module, config);
        let bound = bind(node, &mut ctx).unwrap();
        (bound, ctx.take_diagnostics())
    }

    #[test]
    fn sibling_classes_widen_to_their_superclass() {
        let node = build::ternary(
            build::boolean(true),
            build::new_object(build::type_name("Car"), Vec::new()),
            build::new_object(build::type_name("Truck"), Vec::new()),
        );
        let (bound, diagnostics) = bind_with(BinderConfig::default(), &node);
        assert!(diagnostics.is_empty(), "{diagnostics:?}");
        assert_eq!(bound.ty.name(), "Vehicle");
    }

    #[test]
    fn null_branch_boxes_a_primitive_branch() {
        let node = build::ternary(build::boolean(true), build::null(), build::int(3));
        let (bound, _) = bind_with(BinderConfig::default(), &node);
        assert_eq!(bound.ty, builtins().boxed(PrimitiveKind::Int));
        let BoundKind::Conditional { otherwise, .. } = &bound.kind else {
            panic!("conditional node");
        };
        let otherwise = otherwise.as_deref().expect("else branch");
        assert!(matches!(
            &otherwise.kind,
            BoundKind::Cast { cast, .. } if matches!(cast.kind, CastKind::Boxing)
        ));
    }

    #[test]
    fn unrelated_branches_fail_by_default() {
        let node = build::ternary(build::boolean(true), build::string("a"), build::int(1));
        let (bound, diagnostics) = bind_with(BinderConfig::default(), &node);
        assert!(bound.is_error());
        assert_eq!(diagnostics[0].code, codes::INCOMPATIBLE_BRANCHES);
    }

    #[test]
    fn unrelated_branches_can_be_kept() {
        let config = BinderConfig {
            widening_failure: WideningFailure::KeepBranches,
            ..BinderConfig::default()
        };
        let node = build::ternary(build::boolean(true), build::string("a"), build::int(1));
        let (bound, diagnostics) = bind_with(config, &node);
        assert!(!bound.is_error());
        assert!(bound.ty.is_object_root());
        assert_eq!(diagnostics[0].code, codes::BRANCHES_KEPT);
        assert!(!diagnostics[0].is_error());
    }

    #[test]
    fn boxed_condition_is_unboxed() {
        let node = build::ternary(
            build::cast(build::type_name("Boolean"), build::boolean(true)),
            build::int(1),
            build::int(2),
        );
        let (bound, diagnostics) = bind_with(BinderConfig::default(), &node);
        assert!(diagnostics.is_empty(), "{diagnostics:?}");
        let BoundKind::Conditional { condition, .. } = &bound.kind else {
            panic!("conditional node");
        };
        assert_eq!(condition.ty, builtins().boolean());
    }

    #[test]
    fn non_boolean_condition_is_rejected() {
        let node = build::ternary(build::int(1), build::int(1), build::int(2));
        let (bound, diagnostics) = bind_with(BinderConfig::default(), &node);
        assert!(bound.is_error());
        assert_eq!(diagnostics[0].code, codes::CONDITION_NOT_BOOLEAN);
    }

    #[test]
    fn meta_and_primitive_branches_convert_the_farther_branch() {
        let int_value = builtins().meta(NumericKind::Int).expect("IntValue");
        let node = build::ternary(
            build::boolean(false),
            build::int(1),
            build::cast(build::type_name(int_value.name()), build::int(2)),
        );
        let (bound, diagnostics) = bind_with(BinderConfig::default(), &node);
        assert!(diagnostics.is_empty(), "{diagnostics:?}");
        assert_eq!(bound.ty, builtins().int());
    }
}
