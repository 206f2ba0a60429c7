// rl_types - Open Types, casts and operators shared by the rule binder
//! Type-level building blocks of the binder.
//!
//! - [`types`]: Open Types, built-in types and the array-interning [`TypeSpace`].
//! - [`primitive`]: the primitive kinds and the numeric widening lattice.
//! - [`cast`]: casts, cast providers and the [`CastRegistry`].
//! - [`compare`]: tolerant and strict comparison operators.
//! - [`method`]: methods, signatures and invokers.
//! - [`value`]: runtime values, arithmetic and the local-variable frame stack.
//! - [`stdlib`]: the operator library and meta numeric conversions.

pub mod cast;
pub mod compare;
pub mod method;
pub mod primitive;
pub mod stdlib;
pub mod types;
pub mod value;

pub use cast::{Cast, CastError, CastKind, CastLibrary, CastProvider, CastRegistry, StructuralCasts};
pub use method::{MethodInvoker, MethodKey, MethodKind, MethodRef, NativeInvoker, OpenMethod};
pub use primitive::{NumericKind, PrimitiveKind};
pub use stdlib::StandardLibrary;
pub use types::{
    Builtins, OpenField, OpenType, TypeError, TypeKey, TypeKind, TypeMembers, TypeRef, TypeSpace,
    builtins,
};
pub use value::{ArithmeticOp, EvalError, ObjectValue, RuntimeEnv, Value};
