//! Overload resolution by minimal total cast distance.

use rl_types::{Cast, CastError, CastRegistry, MethodRef, TypeRef};
use smallvec::SmallVec;
use tracing::trace;

/// A selected method with the conversion each argument needs.
#[derive(Debug, Clone)]
pub struct MethodCaller {
    pub method: MethodRef,
    pub casts: SmallVec<[Cast; 4]>,
    pub distance: u32,
}

#[derive(Debug, Clone)]
pub enum Resolution {
    Found(MethodCaller),
    NotFound,
    /// Several candidates share the minimal distance.
    Ambiguous(Vec<MethodRef>),
}

/// Selects among `candidates` the method called `name` whose parameters the
/// arguments reach with the smallest summed implicit-cast distance.
///
/// Ties at the minimum are ambiguous regardless of declaration order.
pub fn find_method(
    candidates: &[MethodRef],
    name: &str,
    arg_types: &[TypeRef],
    registry: &CastRegistry,
) -> Result<Resolution, CastError> {
    let mut best: Vec<MethodCaller> = Vec::new();
    for method in candidates {
        if method.name() != name || method.arity() != arg_types.len() {
            continue;
        }
        let Some(caller) = match_arguments(method, arg_types, registry)? else {
            trace!(candidate = %method.signature(), "candidate not applicable");
            continue;
        };
        trace!(candidate = %method.signature(), distance = caller.distance, "candidate applicable");
        match best.first().map(|current| current.distance) {
            Some(current) if caller.distance > current => {}
            Some(current) if caller.distance == current => best.push(caller),
            _ => best = vec![caller],
        }
    }

    let resolution = match best.len() {
        0 => Resolution::NotFound,
        1 => best
            .pop()
            .map(Resolution::Found)
            .unwrap_or(Resolution::NotFound),
        _ => Resolution::Ambiguous(best.into_iter().map(|caller| caller.method).collect()),
    };
    trace!(name, outcome = %outcome_label(&resolution), "overload resolved");
    Ok(resolution)
}

fn match_arguments(
    method: &MethodRef,
    arg_types: &[TypeRef],
    registry: &CastRegistry,
) -> Result<Option<MethodCaller>, CastError> {
    let mut casts = SmallVec::new();
    let mut distance = 0u32;
    for (arg, param) in arg_types.iter().zip(method.params()) {
        let Some(cast) = registry.get_implicit_cast(arg, param)? else {
            return Ok(None);
        };
        distance = distance.saturating_add(cast.distance);
        casts.push(cast);
    }
    Ok(Some(MethodCaller {
        method: method.clone(),
        casts,
        distance,
    }))
}

fn outcome_label(resolution: &Resolution) -> String {
    match resolution {
        Resolution::Found(caller) => format!("{} ({})", caller.method.signature(), caller.distance),
        Resolution::NotFound => "not found".to_string(),
        Resolution::Ambiguous(methods) => format!("ambiguous between {}", methods.len()),
    }
}

/// `name(type, type)` rendering of an attempted call.
pub fn describe_call(name: &str, arg_types: &[TypeRef]) -> String {
    let args: Vec<String> = arg_types.iter().map(ToString::to_string).collect();
    format!("{name}({})", args.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rl_types::{
        MethodKind, NativeInvoker, OpenMethod, PrimitiveKind, StandardLibrary, Value, builtins,
    };
    use test_case::test_case;

    fn method(name: &str, params: Vec<TypeRef>) -> MethodRef {
        OpenMethod::new(
            name,
            params,
            builtins().void.clone(),
            MethodKind::Static,
            NativeInvoker::new(name, |_, _| Ok(Value::Null)),
        )
        .into_ref()
    }

    fn registry() -> CastRegistry {
        StandardLibrary::shared().cast_registry()
    }

    #[test]
    fn exact_match_wins_even_when_declared_last() {
        let types = builtins();
        let candidates = vec![
            method("m", vec![types.boxed(PrimitiveKind::Int)]),
            method("m", vec![types.primitive(PrimitiveKind::Long)]),
            method("m", vec![types.int()]),
        ];
        let Resolution::Found(caller) =
            find_method(&candidates, "m", &[types.int()], &registry()).unwrap()
        else {
            panic!("m(int) resolves");
        };
        assert_eq!(caller.distance, 0);
        assert_eq!(caller.method.signature(), "m(int)");
    }

    #[test]
    fn equal_distances_are_ambiguous() {
        let types = builtins();
        let short = types.primitive(PrimitiveKind::Short);
        let candidates = vec![
            method("m", vec![types.int(), short.clone()]),
            method("m", vec![short.clone(), types.int()]),
        ];
        let resolution = find_method(&candidates, "m", &[short.clone(), short], &registry()).unwrap();
        assert!(matches!(resolution, Resolution::Ambiguous(methods) if methods.len() == 2));
    }

    #[test_case("m", 2 ; "wrong arity")]
    #[test_case("n", 1 ; "wrong name")]
    fn filters_by_name_and_arity(name: &str, args: usize) {
        let types = builtins();
        let candidates = vec![method("m", vec![types.int()])];
        let arg_types = vec![types.int(); args];
        let resolution = find_method(&candidates, name, &arg_types, &registry()).unwrap();
        assert!(matches!(resolution, Resolution::NotFound));
    }

    #[test]
    fn explicit_only_conversions_do_not_qualify() {
        let types = builtins();
        let candidates = vec![method("m", vec![types.primitive(PrimitiveKind::Byte)])];
        let resolution = find_method(&candidates, "m", &[types.int()], &registry()).unwrap();
        assert!(matches!(resolution, Resolution::NotFound));
    }

    #[test]
    fn casts_are_reported_per_argument() {
        let types = builtins();
        let candidates = vec![method("m", vec![types.double(), types.int()])];
        let Resolution::Found(caller) =
            find_method(&candidates, "m", &[types.int(), types.int()], &registry()).unwrap()
        else {
            panic!("m(double, int) resolves");
        };
        assert!(!caller.casts[0].is_identity());
        assert!(caller.casts[1].is_identity());
        assert_eq!(caller.distance, caller.casts[0].distance);
        assert_eq!(describe_call("m", &[types.int(), types.double()]), "m(int, double)");
    }
}
