use super::{Cast, CastKind, CastProvider};
use crate::method::MethodRef;
use crate::types::TypeRef;
use tracing::trace;

/// Operator name of library methods eligible as implicit conversions.
pub const AUTO_CAST: &str = "autocast";
/// Operator name of library methods usable only in explicit casts.
pub const EXPLICIT_CAST: &str = "cast";

#[derive(Debug, Clone)]
struct CastEntry {
    method: MethodRef,
    distance: u32,
    implicit: bool,
}

/// Conversion methods registered under the cast operator names.
///
/// Each method takes the source value as its only parameter and returns the
/// target type. Auto-casts win over explicit casts for the same pair.
#[derive(Debug, Clone)]
pub struct CastLibrary {
    name: String,
    entries: Vec<CastEntry>,
}

impl CastLibrary {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: Vec::new(),
        }
    }

    /// Registers a method by its operator name; other names are ignored.
    /// Returns whether the method was accepted.
    pub fn register(&mut self, method: MethodRef, distance: u32) -> bool {
        let implicit = match method.name() {
            AUTO_CAST => true,
            EXPLICIT_CAST => false,
            _ => return false,
        };
        if method.arity() != 1 {
            return false;
        }
        trace!(
            library = %self.name,
            signature = %method.signature(),
            returns = %method.return_type(),
            implicit,
            distance,
            "register library cast"
        );
        self.entries.push(CastEntry {
            method,
            distance,
            implicit,
        });
        true
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All registered conversion methods in registration order.
    pub fn methods(&self) -> impl Iterator<Item = &MethodRef> {
        self.entries.iter().map(|entry| &entry.method)
    }

    fn matching(&self, from: &TypeRef, to: &TypeRef, implicit: bool) -> Option<&CastEntry> {
        self.entries.iter().find(|entry| {
            entry.implicit == implicit
                && &entry.method.params()[0] == from
                && entry.method.return_type() == to
        })
    }
}

impl CastProvider for CastLibrary {
    fn name(&self) -> &str {
        &self.name
    }

    fn cast(&self, from: &TypeRef, to: &TypeRef) -> Option<Cast> {
        let entry = self
            .matching(from, to, true)
            .or_else(|| self.matching(from, to, false))?;
        let kind = CastKind::Method(entry.method.clone());
        Some(if entry.implicit {
            Cast::implicit(from, to, kind, entry.distance)
        } else {
            Cast::explicit(from, to, kind, entry.distance)
        })
    }

    fn implicit_targets(&self, from: &TypeRef) -> Vec<TypeRef> {
        self.entries
            .iter()
            .filter(|entry| entry.implicit && &entry.method.params()[0] == from)
            .map(|entry| entry.method.return_type().clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::method::{MethodKind, NativeInvoker, OpenMethod};
    use crate::primitive::NumericKind;
    use crate::types::builtins;
    use crate::value::{RuntimeEnv, Value};

    fn conversion(name: &str, from: TypeRef, to: TypeRef) -> MethodRef {
        OpenMethod::new(
            name,
            vec![from],
            to,
            MethodKind::Static,
            NativeInvoker::new("test", |_, args| Ok(args[0].clone())),
        )
        .into_ref()
    }

    #[test]
    fn autocast_preferred_over_explicit_cast() {
        let types = builtins();
        let meta = types.meta(NumericKind::Int).unwrap();
        let mut library = CastLibrary::new("test");
        assert!(library.register(conversion(EXPLICIT_CAST, types.int(), meta.clone()), 5));
        assert!(library.register(conversion(AUTO_CAST, types.int(), meta.clone()), 30));
        assert!(!library.register(conversion("convert", types.int(), meta.clone()), 1));

        let cast = library.cast(&types.int(), &meta).unwrap();
        assert!(cast.implicit);
        assert_eq!(cast.distance, 30);
        assert_eq!(library.implicit_targets(&types.int()), vec![meta.clone()]);
        assert!(library.cast(&meta, &types.int()).is_none());

        let mut env = RuntimeEnv::new(0);
        assert_eq!(cast.apply(Value::Int(4), &mut env), Ok(Value::Int(4)));
    }

    #[test]
    fn explicit_only_casts_rank_behind_implicit() {
        let types = builtins();
        let meta = types.meta(NumericKind::Double).unwrap();
        let mut library = CastLibrary::new("test");
        library.register(conversion(EXPLICIT_CAST, meta.clone(), types.int()), 3);
        let cast = library.cast(&meta, &types.int()).unwrap();
        assert!(!cast.implicit);
        assert!(cast.distance > 200);
        assert!(library.implicit_targets(&meta).is_empty());
    }
}
