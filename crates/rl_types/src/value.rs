//! Runtime values seen by casts, operators and the bound-node evaluator.

use crate::primitive::NumericKind;
use indexmap::IndexMap;
use num_bigint::BigInt;
use num_traits::{ToPrimitive, Zero};
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;

/// Failures raised while evaluating a bound tree.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    #[error("null value where a {expected} was required")]
    NullValue { expected: String },
    #[error("division by zero")]
    DivisionByZero,
    #[error("index {index} out of bounds for length {length}")]
    IndexOutOfBounds { index: i64, length: usize },
    #[error("cannot convert {value} to {target}")]
    InvalidConversion { value: String, target: String },
    #[error("arithmetic overflow in {operation}")]
    Overflow { operation: String },
    #[error("expected {expected}, found {found}")]
    TypeMismatch { expected: String, found: String },
    #[error("unknown field '{name}'")]
    UnknownField { name: String },
    #[error("expression was not bound: {message}")]
    Unbound { message: String },
    #[error("negative array size {size}")]
    NegativeArraySize { size: i64 },
    #[error("local slot {slot} is outside the current frame")]
    SlotOutOfRange { slot: usize },
    #[error("no active frame")]
    NoFrame,
}

/// Instance of a datatype.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectValue {
    pub type_name: String,
    pub fields: IndexMap<String, Value>,
}

impl ObjectValue {
    pub fn new(type_name: impl Into<String>, fields: IndexMap<String, Value>) -> Self {
        Self {
            type_name: type_name.into(),
            fields,
        }
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }
}

/// Runtime value. Boxed and meta wrapper values share the representation of
/// their underlying numeric kind; `Null` stands in for any absent reference.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Byte(i8),
    Short(i16),
    Char(char),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    BigInteger(BigInt),
    BigDecimal(Decimal),
    String(Arc<str>),
    Array(Arc<[Value]>),
    Object(Arc<ObjectValue>),
}

impl Value {
    pub fn string(value: impl AsRef<str>) -> Self {
        Value::String(Arc::from(value.as_ref()))
    }

    pub fn array(values: Vec<Value>) -> Self {
        Value::Array(Arc::from(values))
    }

    pub fn object(value: ObjectValue) -> Self {
        Value::Object(Arc::new(value))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(values) => Some(values),
            _ => None,
        }
    }

    /// Short description of the value's runtime shape, used in error messages.
    pub fn label(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Byte(_) => "byte",
            Value::Short(_) => "short",
            Value::Char(_) => "char",
            Value::Int(_) => "int",
            Value::Long(_) => "long",
            Value::Float(_) => "float",
            Value::Double(_) => "double",
            Value::BigInteger(_) => "BigInteger",
            Value::BigDecimal(_) => "BigDecimal",
            Value::String(_) => "String",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
        }
    }

    pub fn numeric_kind(&self) -> Option<NumericKind> {
        match self {
            Value::Byte(_) => Some(NumericKind::Byte),
            Value::Short(_) => Some(NumericKind::Short),
            Value::Char(_) => Some(NumericKind::Char),
            Value::Int(_) => Some(NumericKind::Int),
            Value::Long(_) => Some(NumericKind::Long),
            Value::Float(_) => Some(NumericKind::Float),
            Value::Double(_) => Some(NumericKind::Double),
            Value::BigInteger(_) => Some(NumericKind::BigInteger),
            Value::BigDecimal(_) => Some(NumericKind::BigDecimal),
            _ => None,
        }
    }

    fn to_i64(&self) -> Option<i64> {
        match self {
            Value::Byte(v) => Some(i64::from(*v)),
            Value::Short(v) => Some(i64::from(*v)),
            Value::Char(v) => Some(i64::from(u32::from(*v))),
            Value::Int(v) => Some(i64::from(*v)),
            Value::Long(v) => Some(*v),
            // Saturating float-to-integer truncation, like the JVM.
            Value::Float(v) => Some(*v as i64),
            Value::Double(v) => Some(*v as i64),
            Value::BigInteger(v) => v.to_i64(),
            Value::BigDecimal(v) => v.trunc().to_i64(),
            _ => None,
        }
    }

    fn to_f64(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(f64::from(*v)),
            Value::Double(v) => Some(*v),
            Value::BigInteger(v) => v.to_f64(),
            Value::BigDecimal(v) => v.to_f64(),
            other => other.to_i64().map(|v| v as f64),
        }
    }

    fn to_bigint(&self) -> Option<BigInt> {
        match self {
            Value::BigInteger(v) => Some(v.clone()),
            Value::BigDecimal(v) => BigInt::from_str(&v.trunc().to_string()).ok(),
            Value::Float(_) | Value::Double(_) => {
                let value = self.to_f64()?;
                if value.is_finite() {
                    BigInt::from_str(&format!("{:.0}", value.trunc())).ok()
                } else {
                    None
                }
            }
            other => other.to_i64().map(BigInt::from),
        }
    }

    fn to_decimal(&self) -> Option<Decimal> {
        match self {
            Value::BigDecimal(v) => Some(*v),
            Value::BigInteger(v) => Decimal::from_str(&v.to_string()).ok(),
            Value::Float(v) => Decimal::from_f32(*v),
            Value::Double(v) => Decimal::from_f64(*v),
            other => other.to_i64().map(Decimal::from),
        }
    }

    /// Converts a numeric value to `target`, with primitive narrowing semantics
    /// for integral targets. `Null` converts to `Null`.
    pub fn convert_numeric(&self, target: NumericKind) -> Result<Value, EvalError> {
        if self.is_null() {
            return Ok(Value::Null);
        }
        let invalid = || EvalError::InvalidConversion {
            value: self.to_string(),
            target: format!("{target:?}"),
        };
        if self.numeric_kind().is_none() {
            return Err(invalid());
        }
        let converted = match target {
            NumericKind::Byte => Value::Byte(self.to_i64().ok_or_else(invalid)? as i8),
            NumericKind::Short => Value::Short(self.to_i64().ok_or_else(invalid)? as i16),
            NumericKind::Int => Value::Int(self.to_i64().ok_or_else(invalid)? as i32),
            NumericKind::Long => Value::Long(self.to_i64().ok_or_else(invalid)?),
            NumericKind::Char => {
                let code = self.to_i64().ok_or_else(invalid)? as u16;
                Value::Char(char::from_u32(u32::from(code)).ok_or_else(invalid)?)
            }
            NumericKind::Float => Value::Float(self.to_f64().ok_or_else(invalid)? as f32),
            NumericKind::Double => Value::Double(self.to_f64().ok_or_else(invalid)?),
            NumericKind::BigInteger => Value::BigInteger(self.to_bigint().ok_or_else(invalid)?),
            NumericKind::BigDecimal => Value::BigDecimal(self.to_decimal().ok_or_else(invalid)?),
        };
        Ok(converted)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(v) => write!(f, "{v}"),
            Value::Byte(v) => write!(f, "{v}"),
            Value::Short(v) => write!(f, "{v}"),
            Value::Char(v) => write!(f, "{v}"),
            Value::Int(v) => write!(f, "{v}"),
            Value::Long(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Double(v) => write!(f, "{v}"),
            Value::BigInteger(v) => write!(f, "{v}"),
            Value::BigDecimal(v) => write!(f, "{v}"),
            Value::String(v) => f.write_str(v),
            Value::Array(values) => {
                f.write_str("[")?;
                for (index, value) in values.iter().enumerate() {
                    if index > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{value}")?;
                }
                f.write_str("]")
            }
            Value::Object(object) => write!(f, "{}{{..}}", object.type_name),
        }
    }
}

/// Arithmetic operators implemented by the operator library.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArithmeticOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Remainder,
}

impl ArithmeticOp {
    pub const ALL: [ArithmeticOp; 5] = [
        ArithmeticOp::Add,
        ArithmeticOp::Subtract,
        ArithmeticOp::Multiply,
        ArithmeticOp::Divide,
        ArithmeticOp::Remainder,
    ];

    pub const fn method_name(self) -> &'static str {
        match self {
            ArithmeticOp::Add => "add",
            ArithmeticOp::Subtract => "subtract",
            ArithmeticOp::Multiply => "multiply",
            ArithmeticOp::Divide => "divide",
            ArithmeticOp::Remainder => "rem",
        }
    }
}

fn overflow(op: ArithmeticOp) -> EvalError {
    EvalError::Overflow {
        operation: op.method_name().to_string(),
    }
}

/// Applies `op` to two values already converted to `kind`.
pub fn arithmetic(
    op: ArithmeticOp,
    kind: NumericKind,
    lhs: &Value,
    rhs: &Value,
) -> Result<Value, EvalError> {
    if lhs.is_null() || rhs.is_null() {
        return Err(EvalError::NullValue {
            expected: format!("{kind:?} operand"),
        });
    }
    let lhs = lhs.convert_numeric(kind)?;
    let rhs = rhs.convert_numeric(kind)?;
    let result = match (lhs, rhs) {
        (Value::Int(a), Value::Int(b)) => Value::Int(match op {
            ArithmeticOp::Add => a.wrapping_add(b),
            ArithmeticOp::Subtract => a.wrapping_sub(b),
            ArithmeticOp::Multiply => a.wrapping_mul(b),
            ArithmeticOp::Divide if b == 0 => return Err(EvalError::DivisionByZero),
            ArithmeticOp::Divide => a.wrapping_div(b),
            ArithmeticOp::Remainder if b == 0 => return Err(EvalError::DivisionByZero),
            ArithmeticOp::Remainder => a.wrapping_rem(b),
        }),
        (Value::Long(a), Value::Long(b)) => Value::Long(match op {
            ArithmeticOp::Add => a.wrapping_add(b),
            ArithmeticOp::Subtract => a.wrapping_sub(b),
            ArithmeticOp::Multiply => a.wrapping_mul(b),
            ArithmeticOp::Divide if b == 0 => return Err(EvalError::DivisionByZero),
            ArithmeticOp::Divide => a.wrapping_div(b),
            ArithmeticOp::Remainder if b == 0 => return Err(EvalError::DivisionByZero),
            ArithmeticOp::Remainder => a.wrapping_rem(b),
        }),
        (Value::Float(a), Value::Float(b)) => Value::Float(match op {
            ArithmeticOp::Add => a + b,
            ArithmeticOp::Subtract => a - b,
            ArithmeticOp::Multiply => a * b,
            ArithmeticOp::Divide => a / b,
            ArithmeticOp::Remainder => a % b,
        }),
        (Value::Double(a), Value::Double(b)) => Value::Double(match op {
            ArithmeticOp::Add => a + b,
            ArithmeticOp::Subtract => a - b,
            ArithmeticOp::Multiply => a * b,
            ArithmeticOp::Divide => a / b,
            ArithmeticOp::Remainder => a % b,
        }),
        (Value::BigInteger(a), Value::BigInteger(b)) => Value::BigInteger(match op {
            ArithmeticOp::Add => a + b,
            ArithmeticOp::Subtract => a - b,
            ArithmeticOp::Multiply => a * b,
            ArithmeticOp::Divide | ArithmeticOp::Remainder if b.is_zero() => {
                return Err(EvalError::DivisionByZero);
            }
            ArithmeticOp::Divide => a / b,
            ArithmeticOp::Remainder => a % b,
        }),
        (Value::BigDecimal(a), Value::BigDecimal(b)) => Value::BigDecimal(match op {
            ArithmeticOp::Add => a.checked_add(b).ok_or_else(|| overflow(op))?,
            ArithmeticOp::Subtract => a.checked_sub(b).ok_or_else(|| overflow(op))?,
            ArithmeticOp::Multiply => a.checked_mul(b).ok_or_else(|| overflow(op))?,
            ArithmeticOp::Divide | ArithmeticOp::Remainder if b.is_zero() => {
                return Err(EvalError::DivisionByZero);
            }
            ArithmeticOp::Divide => a.checked_div(b).ok_or_else(|| overflow(op))?,
            ArithmeticOp::Remainder => a.checked_rem(b).ok_or_else(|| overflow(op))?,
        }),
        (lhs, _) => {
            return Err(EvalError::TypeMismatch {
                expected: format!("{kind:?}"),
                found: lhs.label().to_string(),
            });
        }
    };
    Ok(result)
}

/// Arithmetic negation of a value converted to `kind`.
pub fn negate(kind: NumericKind, operand: &Value) -> Result<Value, EvalError> {
    if operand.is_null() {
        return Err(EvalError::NullValue {
            expected: format!("{kind:?} operand"),
        });
    }
    let result = match operand.convert_numeric(kind)? {
        Value::Int(v) => Value::Int(v.wrapping_neg()),
        Value::Long(v) => Value::Long(v.wrapping_neg()),
        Value::Float(v) => Value::Float(-v),
        Value::Double(v) => Value::Double(-v),
        Value::BigInteger(v) => Value::BigInteger(-v),
        Value::BigDecimal(v) => Value::BigDecimal(-v),
        other => {
            return Err(EvalError::TypeMismatch {
                expected: format!("{kind:?}"),
                found: other.label().to_string(),
            });
        }
    };
    Ok(result)
}

/// Local-variable frames used while evaluating bound trees.
///
/// Each method invocation pushes a frame; locals address slots in the top frame.
#[derive(Debug, Default)]
pub struct RuntimeEnv {
    frames: Vec<Vec<Value>>,
}

impl RuntimeEnv {
    /// Environment with a single top-level frame of `size` slots.
    pub fn new(size: usize) -> Self {
        Self {
            frames: vec![vec![Value::Null; size]],
        }
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn push_frame(&mut self, size: usize) {
        self.frames.push(vec![Value::Null; size]);
    }

    pub fn pop_frame(&mut self) -> Result<(), EvalError> {
        self.frames.pop().map(|_| ()).ok_or(EvalError::NoFrame)
    }

    pub fn load(&self, slot: usize) -> Result<Value, EvalError> {
        let frame = self.frames.last().ok_or(EvalError::NoFrame)?;
        frame
            .get(slot)
            .cloned()
            .ok_or(EvalError::SlotOutOfRange { slot })
    }

    /// Stores into the top frame, growing it when the slot lies past its end.
    pub fn store(&mut self, slot: usize, value: Value) -> Result<(), EvalError> {
        let frame = self.frames.last_mut().ok_or(EvalError::NoFrame)?;
        if slot >= frame.len() {
            frame.resize(slot + 1, Value::Null);
        }
        frame[slot] = value;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integral_conversion_truncates_like_narrowing() {
        let value = Value::Int(300);
        assert_eq!(value.convert_numeric(NumericKind::Byte), Ok(Value::Byte(44)));
        assert_eq!(
            Value::Double(3.9).convert_numeric(NumericKind::Int),
            Ok(Value::Int(3))
        );
        assert_eq!(
            Value::Char('A').convert_numeric(NumericKind::Int),
            Ok(Value::Int(65))
        );
    }

    #[test]
    fn conversion_to_arbitrary_precision() {
        assert_eq!(
            Value::Long(12).convert_numeric(NumericKind::BigInteger),
            Ok(Value::BigInteger(BigInt::from(12)))
        );
        assert_eq!(
            Value::Int(5).convert_numeric(NumericKind::BigDecimal),
            Ok(Value::BigDecimal(Decimal::from(5)))
        );
        assert!(matches!(
            Value::Double(f64::NAN).convert_numeric(NumericKind::BigInteger),
            Err(EvalError::InvalidConversion { .. })
        ));
        assert_eq!(Value::Null.convert_numeric(NumericKind::Int), Ok(Value::Null));
    }

    #[test]
    fn integer_division_by_zero_fails() {
        let result = arithmetic(
            ArithmeticOp::Divide,
            NumericKind::Int,
            &Value::Int(1),
            &Value::Int(0),
        );
        assert_eq!(result, Err(EvalError::DivisionByZero));
        let floating = arithmetic(
            ArithmeticOp::Divide,
            NumericKind::Double,
            &Value::Double(1.0),
            &Value::Double(0.0),
        );
        assert_eq!(floating, Ok(Value::Double(f64::INFINITY)));
    }

    #[test]
    fn arithmetic_promotes_operands_to_kind() {
        let sum = arithmetic(
            ArithmeticOp::Add,
            NumericKind::Double,
            &Value::Int(1),
            &Value::Double(0.5),
        );
        assert_eq!(sum, Ok(Value::Double(1.5)));
        assert_eq!(negate(NumericKind::Long, &Value::Int(4)), Ok(Value::Long(-4)));
    }

    #[test]
    fn frames_grow_on_store_and_reject_missing_frames() {
        let mut env = RuntimeEnv::new(1);
        env.store(3, Value::Int(7)).unwrap();
        assert_eq!(env.load(3), Ok(Value::Int(7)));
        env.push_frame(0);
        assert_eq!(env.load(0), Err(EvalError::SlotOutOfRange { slot: 0 }));
        env.pop_frame().unwrap();
        env.pop_frame().unwrap();
        assert_eq!(env.pop_frame(), Err(EvalError::NoFrame));
    }
}
