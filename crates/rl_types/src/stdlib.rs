//! Built-in operator library and meta numeric conversions.
//!
//! Binary and unary operators bind as ordinary overload resolution over the
//! methods registered here (`add`, `eq`, `strict_gt`, `negative`, ...), so the
//! numeric lattice and its cast distances decide which overload applies.

use crate::cast::{AUTO_CAST, CastLibrary, CastRegistry, EXPLICIT_CAST, StructuralCasts, distance};
use crate::compare::{self, LooseOrd};
use crate::method::{MethodKind, MethodRef, NativeInvoker, OpenMethod};
use crate::primitive::{NumericKind, PrimitiveKind};
use crate::types::{META_KINDS, TypeRef, builtins};
use crate::value::{ArithmeticOp, EvalError, Value, arithmetic, negate};
use once_cell::sync::OnceCell;
use rustc_hash::FxHashMap;
use std::sync::Arc;
use tracing::debug;

/// Declaring type recorded on every library method.
pub const OPERATORS_TYPE: &str = "Operators";

const ALL_NUMERIC: [NumericKind; 9] = [
    NumericKind::Byte,
    NumericKind::Short,
    NumericKind::Char,
    NumericKind::Int,
    NumericKind::Long,
    NumericKind::Float,
    NumericKind::Double,
    NumericKind::BigInteger,
    NumericKind::BigDecimal,
];

/// Kinds with arithmetic and comparison overloads; narrower kinds promote.
const OPERATOR_KINDS: [NumericKind; 6] = [
    NumericKind::Int,
    NumericKind::Long,
    NumericKind::Float,
    NumericKind::Double,
    NumericKind::BigInteger,
    NumericKind::BigDecimal,
];

/// Boxed numeric kinds with three-state ordering overloads.
const BOXED_COMPARISON_KINDS: [PrimitiveKind; 7] = [
    PrimitiveKind::Byte,
    PrimitiveKind::Short,
    PrimitiveKind::Char,
    PrimitiveKind::Int,
    PrimitiveKind::Long,
    PrimitiveKind::Float,
    PrimitiveKind::Double,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CompareOp {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
}

impl CompareOp {
    const ALL: [CompareOp; 6] = [
        CompareOp::Eq,
        CompareOp::Ne,
        CompareOp::Gt,
        CompareOp::Ge,
        CompareOp::Lt,
        CompareOp::Le,
    ];

    fn method_name(self, strict: bool) -> &'static str {
        match (self, strict) {
            (CompareOp::Eq, false) => "eq",
            (CompareOp::Ne, false) => "ne",
            (CompareOp::Gt, false) => "gt",
            (CompareOp::Ge, false) => "ge",
            (CompareOp::Lt, false) => "lt",
            (CompareOp::Le, false) => "le",
            (CompareOp::Eq, true) => "strict_eq",
            (CompareOp::Ne, true) => "strict_ne",
            (CompareOp::Gt, true) => "strict_gt",
            (CompareOp::Ge, true) => "strict_ge",
            (CompareOp::Lt, true) => "strict_lt",
            (CompareOp::Le, true) => "strict_le",
        }
    }

    fn is_equality(self) -> bool {
        matches!(self, CompareOp::Eq | CompareOp::Ne)
    }

    fn decide<T: LooseOrd + PartialOrd + ?Sized>(self, strict: bool, x: &T, y: &T) -> bool {
        match (self, strict) {
            (CompareOp::Eq, false) => compare::eq(x, y),
            (CompareOp::Ne, false) => compare::ne(x, y),
            (CompareOp::Gt, false) => compare::gt(x, y),
            (CompareOp::Ge, false) => compare::ge(x, y),
            (CompareOp::Lt, false) => compare::lt(x, y),
            (CompareOp::Le, false) => compare::le(x, y),
            (CompareOp::Eq, true) => compare::strict_eq(x, y),
            (CompareOp::Ne, true) => compare::strict_ne(x, y),
            (CompareOp::Gt, true) => compare::strict_gt(x, y),
            (CompareOp::Ge, true) => compare::strict_ge(x, y),
            (CompareOp::Lt, true) => compare::strict_lt(x, y),
            (CompareOp::Le, true) => compare::strict_le(x, y),
        }
    }

    /// Three-state comparison of nullable operands.
    fn decide_nullable<T: LooseOrd + ?Sized>(self, x: Option<&T>, y: Option<&T>) -> Option<bool> {
        match self {
            CompareOp::Eq => Some(compare::eq_nullable(x, y)),
            CompareOp::Ne => Some(compare::ne_nullable(x, y)),
            CompareOp::Gt => compare::gt_nullable(x, y),
            CompareOp::Ge => compare::ge_nullable(x, y),
            CompareOp::Lt => compare::lt_nullable(x, y),
            CompareOp::Le => compare::le_nullable(x, y),
        }
    }

    /// Comparison through `PartialOrd`; orderings are unknown when an operand
    /// is null.
    fn decide_generic<T: LooseOrd + PartialOrd + ?Sized>(
        self,
        x: Option<&T>,
        y: Option<&T>,
    ) -> Option<bool> {
        match self {
            CompareOp::Eq => Some(compare::eq_nullable(x, y)),
            CompareOp::Ne => Some(compare::ne_nullable(x, y)),
            CompareOp::Gt => compare::gt_generic(x, y),
            CompareOp::Ge => compare::ge_generic(x, y),
            CompareOp::Lt => compare::lt_generic(x, y),
            CompareOp::Le => compare::le_generic(x, y),
        }
    }
}

fn three_state(outcome: Option<bool>) -> Value {
    match outcome {
        Some(result) => Value::Bool(result),
        None => Value::Null,
    }
}

fn mismatch(expected: &str, found: &Value) -> EvalError {
    EvalError::TypeMismatch {
        expected: expected.to_string(),
        found: found.label().to_string(),
    }
}

/// Compares two non-null numeric values after converting them to `kind`.
fn compare_numeric(
    op: CompareOp,
    strict: bool,
    kind: NumericKind,
    lhs: &Value,
    rhs: &Value,
) -> Result<bool, EvalError> {
    let lhs = lhs.convert_numeric(kind)?;
    let rhs = rhs.convert_numeric(kind)?;
    Ok(match (&lhs, &rhs) {
        (Value::Int(x), Value::Int(y)) => op.decide(strict, x, y),
        (Value::Long(x), Value::Long(y)) => op.decide(strict, x, y),
        (Value::Float(x), Value::Float(y)) => op.decide(strict, x, y),
        (Value::Double(x), Value::Double(y)) => op.decide(strict, x, y),
        (Value::BigInteger(x), Value::BigInteger(y)) => op.decide(strict, x, y),
        (Value::BigDecimal(x), Value::BigDecimal(y)) => op.decide(strict, x, y),
        _ => return Err(mismatch(&format!("{kind:?}"), &lhs)),
    })
}

/// Outcome of `op` when at least one operand is null.
fn null_outcome(op: CompareOp, lhs: &Value, rhs: &Value) -> Value {
    let none: Option<&i64> = None;
    let present = Some(&0i64);
    let (x, y) = match (lhs.is_null(), rhs.is_null()) {
        (true, true) => (none, none),
        (true, false) => (none, present),
        _ => (present, none),
    };
    three_state(op.decide_nullable(x, y))
}

/// Nullable numeric comparison: equality treats two nulls as equal, orderings
/// are unknown (`Null`) when an operand is null.
fn compare_boxed(
    op: CompareOp,
    strict: bool,
    kind: NumericKind,
    lhs: &Value,
    rhs: &Value,
) -> Result<Value, EvalError> {
    if lhs.is_null() || rhs.is_null() {
        return Ok(null_outcome(op, lhs, rhs));
    }
    compare_numeric(op, strict, kind, lhs, rhs).map(Value::Bool)
}

fn compare_nullable_booleans(op: CompareOp, lhs: &Value, rhs: &Value) -> Result<Value, EvalError> {
    let as_bool = |value: &Value| match value {
        Value::Bool(flag) => Ok(Some(*flag)),
        Value::Null => Ok(None),
        other => Err(mismatch("Boolean", other)),
    };
    let (x, y) = (as_bool(lhs)?, as_bool(rhs)?);
    Ok(three_state(op.decide_nullable(x.as_ref(), y.as_ref())))
}

fn compare_strings(op: CompareOp, lhs: &Value, rhs: &Value) -> Result<Value, EvalError> {
    let as_str = |value: &Value| match value {
        Value::String(text) => Ok(Some(text.clone())),
        Value::Null => Ok(None),
        other => Err(mismatch("String", other)),
    };
    let (x, y) = (as_str(lhs)?, as_str(rhs)?);
    Ok(three_state(op.decide_generic(x.as_deref(), y.as_deref())))
}

fn expect_bool(value: &Value) -> Result<bool, EvalError> {
    value.as_bool().ok_or_else(|| match value {
        Value::Null => EvalError::NullValue {
            expected: "boolean".to_string(),
        },
        other => mismatch("boolean", other),
    })
}

fn text_of(value: &Value) -> String {
    value.to_string()
}

/// The shared operator library and the meta conversion casts.
#[derive(Debug)]
pub struct StandardLibrary {
    operators: FxHashMap<String, Vec<MethodRef>>,
    casts: Arc<CastLibrary>,
}

impl StandardLibrary {
    fn new() -> Self {
        let mut library = Self {
            operators: FxHashMap::default(),
            casts: Arc::new(CastLibrary::new("meta")),
        };
        library.register_arithmetic();
        library.register_comparisons();
        library.register_logic_and_strings();
        library.casts = Arc::new(meta_casts());
        debug!(
            operators = library.operators.values().map(Vec::len).sum::<usize>(),
            casts = library.casts.len(),
            "standard library ready"
        );
        library
    }

    /// Process-wide library instance.
    pub fn shared() -> &'static StandardLibrary {
        static SHARED: OnceCell<StandardLibrary> = OnceCell::new();
        SHARED.get_or_init(StandardLibrary::new)
    }

    /// Overloads registered for an operator method name.
    pub fn operators(&self, name: &str) -> &[MethodRef] {
        self.operators.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn operator_names(&self) -> impl Iterator<Item = &str> {
        self.operators.keys().map(String::as_str)
    }

    pub fn cast_library(&self) -> Arc<CastLibrary> {
        self.casts.clone()
    }

    /// Registry with structural casts first, then the library conversions.
    pub fn cast_registry(&self) -> CastRegistry {
        CastRegistry::new()
            .with_provider(Arc::new(StructuralCasts::new()))
            .with_provider(self.casts.clone())
    }

    fn add<F>(&mut self, name: &str, params: Vec<TypeRef>, returns: TypeRef, body: F)
    where
        F: Fn(&[Value]) -> Result<Value, EvalError> + Send + Sync + 'static,
    {
        let label = format!("{name}/{}", params.len());
        let method = OpenMethod::new(
            name,
            params,
            returns,
            MethodKind::Static,
            NativeInvoker::new(label, move |_, args| body(args)),
        )
        .declared_in(OPERATORS_TYPE)
        .into_ref();
        self.operators
            .entry(name.to_string())
            .or_default()
            .push(method);
    }

    fn register_arithmetic(&mut self) {
        let types = builtins();
        for kind in OPERATOR_KINDS {
            let ty = types.numeric(kind);
            for op in ArithmeticOp::ALL {
                self.add(
                    op.method_name(),
                    vec![ty.clone(), ty.clone()],
                    ty.clone(),
                    move |args| arithmetic(op, kind, &args[0], &args[1]),
                );
            }
            self.add("negative", vec![ty.clone()], ty.clone(), move |args| {
                negate(kind, &args[0])
            });
        }
        for kind in META_KINDS {
            let Some(meta) = types.meta(kind) else {
                continue;
            };
            let working = kind.promote(kind);
            for op in ArithmeticOp::ALL {
                self.add(
                    op.method_name(),
                    vec![meta.clone(), meta.clone()],
                    meta.clone(),
                    move |args| arithmetic(op, working, &args[0], &args[1])?.convert_numeric(kind),
                );
            }
        }
    }

    fn register_comparisons(&mut self) {
        let types = builtins();
        let boolean = types.boolean();
        let nullable_boolean = types.boxed(PrimitiveKind::Boolean);
        // Orderings over nullable operands may be unknown, so they return `Boolean`.
        let returns_for = |op: CompareOp| {
            if op.is_equality() {
                boolean.clone()
            } else {
                nullable_boolean.clone()
            }
        };

        for kind in OPERATOR_KINDS {
            let ty = types.numeric(kind);
            let nullable = ty.is_reference();
            for op in CompareOp::ALL {
                for strict in [false, true] {
                    if nullable {
                        self.add(
                            op.method_name(strict),
                            vec![ty.clone(), ty.clone()],
                            returns_for(op),
                            move |args| compare_boxed(op, strict, kind, &args[0], &args[1]),
                        );
                    } else {
                        self.add(
                            op.method_name(strict),
                            vec![ty.clone(), ty.clone()],
                            boolean.clone(),
                            move |args| {
                                compare_numeric(op, strict, kind, &args[0], &args[1]).map(Value::Bool)
                            },
                        );
                    }
                }
            }
        }

        for primitive in BOXED_COMPARISON_KINDS {
            let boxed = types.boxed(primitive);
            let Some(kind) = primitive.numeric() else {
                continue;
            };
            let working = kind.promote(kind);
            for op in CompareOp::ALL {
                self.add(
                    op.method_name(false),
                    vec![boxed.clone(), boxed.clone()],
                    returns_for(op),
                    move |args| compare_boxed(op, false, working, &args[0], &args[1]),
                );
            }
        }

        for op in CompareOp::ALL {
            self.add(
                op.method_name(false),
                vec![boolean.clone(), boolean.clone()],
                boolean.clone(),
                move |args| {
                    let (x, y) = (expect_bool(&args[0])?, expect_bool(&args[1])?);
                    Ok(Value::Bool(op.decide(false, &x, &y)))
                },
            );
            self.add(
                op.method_name(false),
                vec![nullable_boolean.clone(), nullable_boolean.clone()],
                returns_for(op),
                move |args| compare_nullable_booleans(op, &args[0], &args[1]),
            );
            self.add(
                op.method_name(false),
                vec![types.string.clone(), types.string.clone()],
                returns_for(op),
                move |args| compare_strings(op, &args[0], &args[1]),
            );
        }

        for op in [CompareOp::Eq, CompareOp::Ne] {
            self.add(
                op.method_name(false),
                vec![types.object.clone(), types.object.clone()],
                boolean.clone(),
                move |args| {
                    let same = args[0] == args[1];
                    Ok(Value::Bool(if op == CompareOp::Eq { same } else { !same }))
                },
            );
        }
    }

    fn register_logic_and_strings(&mut self) {
        let types = builtins();
        let boolean = types.boolean();
        self.add("not", vec![boolean.clone()], boolean, |args| {
            Ok(Value::Bool(!expect_bool(&args[0])?))
        });

        let string = types.string.clone();
        let object = types.object.clone();
        let concat = |args: &[Value]| -> Result<Value, EvalError> {
            Ok(Value::string(format!("{}{}", text_of(&args[0]), text_of(&args[1]))))
        };
        self.add("add", vec![string.clone(), string.clone()], string.clone(), concat);
        self.add("add", vec![string.clone(), object.clone()], string.clone(), concat);
        self.add("add", vec![object, string.clone()], string, concat);
    }
}

/// Conversions between plain numeric types and the meta wrappers.
fn meta_casts() -> CastLibrary {
    let types = builtins();
    let mut library = CastLibrary::new("meta");
    let mut conversion = |name: &str, from: TypeRef, to: TypeRef, target: NumericKind, cost: u32| {
        let label = format!("{name} {from} -> {to}");
        let method = OpenMethod::new(
            name,
            vec![from],
            to,
            MethodKind::Static,
            NativeInvoker::new(label, move |_, args| args[0].convert_numeric(target)),
        )
        .declared_in(OPERATORS_TYPE)
        .into_ref();
        library.register(method, cost);
    };

    for meta_kind in META_KINDS {
        let Some(meta) = types.meta(meta_kind) else {
            continue;
        };
        for kind in ALL_NUMERIC {
            let plain = types.numeric(kind);
            if kind == meta_kind || kind.widens_to(meta_kind) {
                let steps = kind.steps_to(meta_kind) * distance::WIDENING_STEP;
                conversion(AUTO_CAST, plain.clone(), meta.clone(), meta_kind, distance::META_WRAP + steps);
            }
            if kind == meta_kind || meta_kind.widens_to(kind) {
                let steps = meta_kind.steps_to(kind) * distance::WIDENING_STEP;
                conversion(AUTO_CAST, meta.clone(), plain, kind, distance::META_UNWRAP + steps);
            } else {
                conversion(EXPLICIT_CAST, meta.clone(), plain, kind, distance::META_UNWRAP);
            }
        }
        for wider_kind in META_KINDS {
            if !meta_kind.widens_to(wider_kind) {
                continue;
            }
            let Some(wider) = types.meta(wider_kind) else {
                continue;
            };
            let steps = meta_kind.steps_to(wider_kind) * distance::WIDENING_STEP;
            conversion(AUTO_CAST, meta.clone(), wider, wider_kind, distance::META_WRAP + steps);
        }
    }
    library
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::RuntimeEnv;

    fn find(name: &str, params: &[TypeRef]) -> MethodRef {
        StandardLibrary::shared()
            .operators(name)
            .iter()
            .find(|method| method.params() == params)
            .cloned()
            .unwrap()
    }

    fn call(method: &MethodRef, args: &[Value]) -> Result<Value, EvalError> {
        method.invoke(None, args, &mut RuntimeEnv::new(0))
    }

    #[test]
    fn loose_and_strict_float_equality() {
        let types = builtins();
        let float = types.primitive(PrimitiveKind::Float);
        let x = Value::Float(1.0);
        let y = Value::Float(f32::from_bits(1.0f32.to_bits() + 1));
        let eq = find("eq", &[float.clone(), float.clone()]);
        let strict_eq = find("strict_eq", &[float.clone(), float.clone()]);
        assert_eq!(call(&eq, &[x.clone(), y.clone()]), Ok(Value::Bool(true)));
        assert_eq!(call(&strict_eq, &[x, y]), Ok(Value::Bool(false)));
    }

    #[test]
    fn boxed_ordering_is_three_state() {
        let types = builtins();
        let integer = types.boxed(PrimitiveKind::Int);
        let gt = find("gt", &[integer.clone(), integer.clone()]);
        let ge = find("ge", &[integer.clone(), integer.clone()]);
        let eq = find("eq", &[integer.clone(), integer.clone()]);
        assert_eq!(gt.return_type(), &types.boxed(PrimitiveKind::Boolean));
        assert_eq!(call(&gt, &[Value::Int(2), Value::Int(1)]), Ok(Value::Bool(true)));
        assert_eq!(call(&gt, &[Value::Null, Value::Int(1)]), Ok(Value::Null));
        assert_eq!(call(&ge, &[Value::Null, Value::Null]), Ok(Value::Bool(true)));
        assert_eq!(call(&eq, &[Value::Null, Value::Null]), Ok(Value::Bool(true)));
        assert_eq!(call(&eq, &[Value::Null, Value::Int(1)]), Ok(Value::Bool(false)));
    }

    #[test]
    fn meta_arithmetic_stays_in_meta_kind() {
        let types = builtins();
        let int_value = types.meta(NumericKind::Int).unwrap();
        let add = find("add", &[int_value.clone(), int_value.clone()]);
        assert_eq!(add.return_type(), &int_value);
        assert_eq!(call(&add, &[Value::Int(2), Value::Int(3)]), Ok(Value::Int(5)));
        let byte_value = types.meta(NumericKind::Byte).unwrap();
        let add_bytes = find("add", &[byte_value.clone(), byte_value]);
        assert_eq!(
            call(&add_bytes, &[Value::Byte(100), Value::Byte(100)]),
            Ok(Value::Byte(-56))
        );
    }

    #[test]
    fn string_concatenation_renders_null() {
        let types = builtins();
        let add = find("add", &[types.string.clone(), types.object.clone()]);
        assert_eq!(
            call(&add, &[Value::string("n="), Value::Null]),
            Ok(Value::string("n=null"))
        );
    }

    #[test]
    fn meta_wrappers_convert_through_registry() {
        let types = builtins();
        let registry = StandardLibrary::shared().cast_registry();
        let double_value = types.meta(NumericKind::Double).unwrap();
        let wrap = registry.get_cast(&types.int(), &double_value).unwrap().unwrap();
        assert!(wrap.implicit);
        assert_eq!(wrap.distance, distance::META_WRAP + 3);
        let unwrap = registry.get_cast(&double_value, &types.int()).unwrap().unwrap();
        assert!(!unwrap.implicit);
        let mut env = RuntimeEnv::new(0);
        assert_eq!(wrap.apply(Value::Int(2), &mut env), Ok(Value::Double(2.0)));
        assert_eq!(
            registry.implicit_castable_type(&types.int(), &double_value).unwrap(),
            Some(double_value)
        );
    }
}
