use super::{Cast, CastError, CastProvider};
use crate::types::{TypeKey, TypeRef};
use indexmap::IndexMap;
use std::sync::Arc;
use tracing::trace;

/// Ordered list of cast providers. The first provider with an answer wins;
/// answers are never merged.
#[derive(Debug, Clone, Default)]
pub struct CastRegistry {
    providers: Vec<Arc<dyn CastProvider>>,
}

impl CastRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_provider(mut self, provider: Arc<dyn CastProvider>) -> Self {
        self.providers.push(provider);
        self
    }

    pub fn register(&mut self, provider: Arc<dyn CastProvider>) {
        self.providers.push(provider);
    }

    pub fn providers(&self) -> impl Iterator<Item = &Arc<dyn CastProvider>> {
        self.providers.iter()
    }

    /// Cast from `from` to `to`, implicit or explicit.
    pub fn get_cast(&self, from: &TypeRef, to: &TypeRef) -> Result<Option<Cast>, CastError> {
        for provider in &self.providers {
            let Some(cast) = provider.cast(from, to) else {
                continue;
            };
            if &cast.from != from || &cast.to != to {
                return Err(CastError::Misconfigured {
                    provider: provider.name().to_string(),
                    from: from.key().clone(),
                    to: to.key().clone(),
                    actual_from: cast.from.key().clone(),
                    actual_to: cast.to.key().clone(),
                });
            }
            trace!(provider = provider.name(), cast = %cast, "cast resolved");
            return Ok(Some(cast));
        }
        Ok(None)
    }

    /// Cast from `from` to `to` only if it may be inserted automatically.
    pub fn get_implicit_cast(
        &self,
        from: &TypeRef,
        to: &TypeRef,
    ) -> Result<Option<Cast>, CastError> {
        if from == to {
            return Ok(Some(Cast::identity(from)));
        }
        Ok(self.get_cast(from, to)?.filter(|cast| cast.implicit))
    }

    fn implicit_distance(&self, from: &TypeRef, to: &TypeRef) -> Result<Option<u32>, CastError> {
        Ok(self.get_implicit_cast(from, to)?.map(|cast| cast.distance))
    }

    /// Narrowest type both `a` and `b` implicitly convert to.
    ///
    /// Candidates are `a`, `b` and every implicit target advertised by the
    /// providers for either of them. The winner minimises the summed distance,
    /// then the larger of the two distances, then candidate order.
    pub fn implicit_castable_type(
        &self,
        a: &TypeRef,
        b: &TypeRef,
    ) -> Result<Option<TypeRef>, CastError> {
        if a == b {
            return Ok(Some(a.clone()));
        }
        let mut candidates: IndexMap<TypeKey, TypeRef> = IndexMap::new();
        candidates.insert(a.key().clone(), a.clone());
        candidates.insert(b.key().clone(), b.clone());
        for provider in &self.providers {
            for source in [a, b] {
                for target in provider.implicit_targets(source) {
                    candidates.entry(target.key().clone()).or_insert(target);
                }
            }
        }

        let mut best: Option<((u32, u32), TypeRef)> = None;
        for candidate in candidates.into_values() {
            let (Some(from_a), Some(from_b)) = (
                self.implicit_distance(a, &candidate)?,
                self.implicit_distance(b, &candidate)?,
            ) else {
                continue;
            };
            let score = (from_a + from_b, from_a.max(from_b));
            if best.as_ref().is_none_or(|(current, _)| score < *current) {
                best = Some((score, candidate));
            }
        }
        if let Some((score, ty)) = &best {
            trace!(a = %a, b = %b, common = %ty, total = score.0, "implicit castable type");
        }
        Ok(best.map(|(_, ty)| ty))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cast::{CastKind, StructuralCasts};
    use crate::primitive::PrimitiveKind;
    use crate::types::{OpenType, builtins};

    fn registry() -> CastRegistry {
        CastRegistry::new().with_provider(Arc::new(StructuralCasts::new()))
    }

    #[derive(Debug)]
    struct Broken;

    impl CastProvider for Broken {
        fn name(&self) -> &str {
            "broken"
        }

        fn cast(&self, from: &TypeRef, _to: &TypeRef) -> Option<Cast> {
            Some(Cast::identity(from))
        }

        fn implicit_targets(&self, _from: &TypeRef) -> Vec<TypeRef> {
            Vec::new()
        }
    }

    #[test]
    fn first_provider_wins() {
        let types = builtins();
        let registry = CastRegistry::new()
            .with_provider(Arc::new(StructuralCasts::new()))
            .with_provider(Arc::new(Broken));
        let cast = registry
            .get_cast(&types.int(), &types.double())
            .unwrap()
            .unwrap();
        assert!(matches!(cast.kind, CastKind::Widening(_)));
    }

    #[test]
    fn mismatched_endpoints_are_a_configuration_error() {
        let types = builtins();
        let registry = CastRegistry::new().with_provider(Arc::new(Broken));
        let error = registry.get_cast(&types.int(), &types.double()).unwrap_err();
        assert!(matches!(error, CastError::Misconfigured { ref provider, .. } if provider == "broken"));
    }

    #[test]
    fn common_type_of_numeric_lattice() {
        let types = builtins();
        let registry = registry();
        let byte = types.primitive(PrimitiveKind::Byte);
        let char = types.primitive(PrimitiveKind::Char);
        assert_eq!(
            registry.implicit_castable_type(&types.int(), &types.double()).unwrap(),
            Some(types.double())
        );
        assert_eq!(
            registry.implicit_castable_type(&byte, &char).unwrap(),
            Some(types.int())
        );
        assert_eq!(
            registry
                .implicit_castable_type(&types.null, &types.int())
                .unwrap(),
            Some(types.boxed(PrimitiveKind::Int))
        );
    }

    #[test]
    fn common_type_of_unrelated_classes_is_absent() {
        let registry = registry();
        let left = OpenType::class("zoo", "Rock", Vec::new());
        let right = OpenType::class("zoo", "Tree", Vec::new());
        assert_eq!(registry.implicit_castable_type(&left, &right).unwrap(), None);
    }

    #[test]
    fn common_type_of_siblings_is_shared_parent() {
        let registry = registry();
        let animal = OpenType::class("zoo", "Animal", Vec::new());
        let dog = OpenType::class("zoo", "Dog", vec![animal.clone()]);
        let cat = OpenType::class("zoo", "Cat", vec![animal.clone()]);
        assert_eq!(
            registry.implicit_castable_type(&dog, &cat).unwrap(),
            Some(animal)
        );
    }
}
