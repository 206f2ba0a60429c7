use super::{Cast, CastKind, CastProvider, distance};
use crate::primitive::{NumericKind, PrimitiveKind};
use crate::types::{OpenType, TypeKind, TypeRef, builtins};

/// Casts implied by the type structure itself: identity, null, the numeric
/// lattice with boxing, arbitrary precision, inheritance and array covariance.
#[derive(Debug, Default)]
pub struct StructuralCasts;

impl StructuralCasts {
    pub fn new() -> Self {
        Self
    }

    fn numeric_cast(from: &TypeRef, to: &TypeRef) -> Option<Cast> {
        let source = from.numeric_kind()?;
        let target = to.numeric_kind()?;
        let from_boxed = from.boxed_kind().is_some();
        let to_boxed = to.boxed_kind().is_some();

        if source == target {
            return match (from.kind(), to.kind()) {
                (TypeKind::Primitive(_), TypeKind::Boxed(_)) => Some(Cast::implicit(
                    from,
                    to,
                    CastKind::Boxing,
                    distance::BOXING,
                )),
                (TypeKind::Boxed(_), TypeKind::Primitive(_)) => Some(Cast::implicit(
                    from,
                    to,
                    CastKind::Unboxing,
                    distance::UNBOXING,
                )),
                _ => None,
            };
        }

        if source.widens_to(target) {
            let mut cost = source.steps_to(target) * distance::WIDENING_STEP;
            if from_boxed {
                cost += distance::UNBOXING;
            }
            if to_boxed {
                cost += distance::BOXING;
            }
            if target.primitive().is_none() && source.primitive().is_some() {
                cost += distance::TO_BIG_NUMBER;
            }
            return Some(Cast::implicit(from, to, CastKind::Widening(target), cost));
        }

        let extra = source.rank().abs_diff(target.rank());
        Some(Cast::explicit(from, to, CastKind::Narrowing(target), extra))
    }

    fn boolean_cast(from: &TypeRef, to: &TypeRef) -> Option<Cast> {
        match (from.kind(), to.kind()) {
            (TypeKind::Primitive(PrimitiveKind::Boolean), TypeKind::Boxed(PrimitiveKind::Boolean)) => {
                Some(Cast::implicit(from, to, CastKind::Boxing, distance::BOXING))
            }
            (TypeKind::Boxed(PrimitiveKind::Boolean), TypeKind::Primitive(PrimitiveKind::Boolean)) => {
                Some(Cast::implicit(from, to, CastKind::Unboxing, distance::UNBOXING))
            }
            _ => None,
        }
    }

    fn reference_cast(from: &TypeRef, to: &TypeRef) -> Option<Cast> {
        if let Some(levels) = from.ancestor_distance(to) {
            return Some(Cast::implicit(
                from,
                to,
                CastKind::Upcast,
                levels * distance::UPCAST_STEP,
            ));
        }
        if let Some(levels) = to.ancestor_distance(from) {
            return Some(Cast::explicit(
                from,
                to,
                CastKind::Downcast,
                levels * distance::UPCAST_STEP,
            ));
        }
        None
    }

    fn array_cast(&self, from: &TypeRef, to: &TypeRef) -> Option<Cast> {
        let (TypeKind::Array { component: source }, TypeKind::Array { component: target }) =
            (from.kind(), to.kind())
        else {
            return None;
        };
        if source.is_primitive() || target.is_primitive() {
            return None;
        }
        let inner = self.cast(source, target)?;
        match inner.kind {
            CastKind::Upcast | CastKind::NullToReference => Some(Cast::implicit(
                from,
                to,
                CastKind::Upcast,
                inner.distance,
            )),
            CastKind::Downcast => Some(Cast::explicit(
                from,
                to,
                CastKind::Downcast,
                inner.distance - distance::EXPLICIT,
            )),
            _ => None,
        }
    }

    fn numeric_targets(kind: NumericKind) -> Vec<TypeRef> {
        let types = builtins();
        let mut targets = Vec::new();
        if let Some(primitive) = kind.primitive() {
            targets.push(types.boxed(primitive));
            for wider in primitive.widening_targets() {
                targets.push(types.primitive(*wider));
                targets.push(types.boxed(*wider));
            }
        }
        if kind.widens_to(NumericKind::BigInteger) {
            targets.push(types.big_integer.clone());
        }
        if kind.widens_to(NumericKind::BigDecimal) {
            targets.push(types.big_decimal.clone());
        }
        targets
    }
}

impl CastProvider for StructuralCasts {
    fn name(&self) -> &str {
        "structural"
    }

    fn cast(&self, from: &TypeRef, to: &TypeRef) -> Option<Cast> {
        if from == to {
            return Some(Cast::identity(from));
        }
        if from.is_error() || to.is_error() || from.is_void() || to.is_void() {
            return None;
        }
        if from.is_null() {
            if !to.is_reference() {
                return None;
            }
            let cost = if to.is_object_root() {
                distance::TO_OBJECT
            } else {
                distance::NULL_TO_REFERENCE
            };
            return Some(Cast::implicit(from, to, CastKind::NullToReference, cost));
        }
        if to.is_object_root() {
            return if from.is_primitive() {
                Some(Cast::implicit(
                    from,
                    to,
                    CastKind::Boxing,
                    distance::BOXING + distance::TO_OBJECT,
                ))
            } else {
                Some(Cast::implicit(from, to, CastKind::Upcast, distance::TO_OBJECT))
            };
        }
        if let Some(cast) = Self::boolean_cast(from, to) {
            return Some(cast);
        }
        if let Some(cast) = Self::numeric_cast(from, to) {
            return Some(cast);
        }
        if let Some(primitive) = from.primitive_kind() {
            // Primitive to an ancestor of its box, such as `int` to `Number`.
            let boxed = builtins().boxed(primitive);
            let levels = boxed.ancestor_distance(to)?;
            return Some(Cast::implicit(
                from,
                to,
                CastKind::Boxing,
                distance::BOXING + levels * distance::UPCAST_STEP,
            ));
        }
        if let Some(target) = to.primitive_kind().and_then(PrimitiveKind::numeric) {
            // Unchecked unboxing from `Object` or `Number`.
            let boxed = builtins().boxed(to.primitive_kind()?);
            if from.is_object_root() || boxed.ancestor_distance(from).is_some() {
                return Some(Cast::explicit(
                    from,
                    to,
                    CastKind::Narrowing(target),
                    distance::UNBOXING,
                ));
            }
            return None;
        }
        if from.is_object_root() && to.is_reference() {
            return Some(Cast::explicit(from, to, CastKind::Downcast, 0));
        }
        if from.is_array() && to.is_array() {
            return self.array_cast(from, to);
        }
        Self::reference_cast(from, to)
    }

    fn implicit_targets(&self, from: &TypeRef) -> Vec<TypeRef> {
        let mut targets = Vec::new();
        match from.kind() {
            TypeKind::Null | TypeKind::Void | TypeKind::Error | TypeKind::Object => {}
            TypeKind::Primitive(PrimitiveKind::Boolean) => {
                targets.push(builtins().boxed(PrimitiveKind::Boolean));
            }
            TypeKind::Boxed(PrimitiveKind::Boolean) => {
                targets.push(builtins().boolean());
            }
            TypeKind::Array { component } if !component.is_primitive() => {
                targets.extend(
                    self.implicit_targets(component)
                        .into_iter()
                        .map(OpenType::array),
                );
            }
            _ => {
                if let Some(kind) = from.numeric_kind() {
                    if from.boxed_kind().is_some() {
                        targets.extend(kind.primitive().map(|primitive| builtins().primitive(primitive)));
                    }
                    targets.extend(
                        Self::numeric_targets(kind)
                            .into_iter()
                            .filter(|target| target != from),
                    );
                }
                let ancestors = match from.primitive_kind() {
                    Some(primitive) => builtins().boxed(primitive).ancestors(),
                    None => from.ancestors(),
                };
                targets.extend(ancestors.into_iter().map(|(ty, _)| ty));
            }
        }
        targets
    }
}
