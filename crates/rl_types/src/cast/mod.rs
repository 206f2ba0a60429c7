//! Casts between Open Types and the distance model used to rank them.
//!
//! A [`Cast`] is a directed, distance-weighted conversion. Providers answer
//! `cast(from, to)` queries; the [`CastRegistry`] asks them in registration
//! order and returns the first answer. Distances of composite conversions
//! are the sum of their hops, so a composite cast never ranks ahead of one of
//! its own steps.

mod library;
mod registry;
mod structural;

pub use library::{AUTO_CAST, CastLibrary, EXPLICIT_CAST};
pub use registry::CastRegistry;
pub use structural::StructuralCasts;

use crate::method::MethodRef;
use crate::primitive::NumericKind;
use crate::types::{TypeKey, TypeRef};
use crate::value::{EvalError, RuntimeEnv, Value};
use std::fmt;
use thiserror::Error;

pub mod distance {
    //! Distance of every structural conversion step.

    pub const IDENTITY: u32 = 0;
    pub const NULL_TO_REFERENCE: u32 = 1;
    /// Per rank of the numeric lattice.
    pub const WIDENING_STEP: u32 = 1;
    /// Per inheritance level.
    pub const UPCAST_STEP: u32 = 2;
    pub const BOXING: u32 = 10;
    pub const UNBOXING: u32 = 12;
    pub const TO_BIG_NUMBER: u32 = 20;
    pub const META_WRAP: u32 = 30;
    pub const META_UNWRAP: u32 = 40;
    pub const TO_OBJECT: u32 = 100;
    pub const EXPLICIT: u32 = 200;
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CastError {
    #[error(
        "cast provider '{provider}' answered {from} -> {to} with a cast for {actual_from} -> {actual_to}"
    )]
    Misconfigured {
        provider: String,
        from: TypeKey,
        to: TypeKey,
        actual_from: TypeKey,
        actual_to: TypeKey,
    },
}

/// How a value is transformed when the cast is applied.
#[derive(Debug, Clone)]
pub enum CastKind {
    Identity,
    NullToReference,
    /// Numeric conversion towards a wider kind, including boxed forms.
    Widening(NumericKind),
    /// Lossy numeric conversion; always explicit.
    Narrowing(NumericKind),
    Boxing,
    Unboxing,
    /// Subclass to superclass, array covariance or reference to object root.
    Upcast,
    /// Superclass to subclass; always explicit.
    Downcast,
    /// Conversion performed by a library method taking the source value.
    Method(MethodRef),
}

impl CastKind {
    pub fn label(&self) -> &'static str {
        match self {
            CastKind::Identity => "identity",
            CastKind::NullToReference => "null",
            CastKind::Widening(_) => "widening",
            CastKind::Narrowing(_) => "narrowing",
            CastKind::Boxing => "boxing",
            CastKind::Unboxing => "unboxing",
            CastKind::Upcast => "upcast",
            CastKind::Downcast => "downcast",
            CastKind::Method(_) => "method",
        }
    }
}

/// A directed conversion between two Open Types.
#[derive(Debug, Clone)]
pub struct Cast {
    pub from: TypeRef,
    pub to: TypeRef,
    pub kind: CastKind,
    pub implicit: bool,
    pub distance: u32,
}

impl Cast {
    pub fn identity(ty: &TypeRef) -> Self {
        Self {
            from: ty.clone(),
            to: ty.clone(),
            kind: CastKind::Identity,
            implicit: true,
            distance: distance::IDENTITY,
        }
    }

    pub fn implicit(from: &TypeRef, to: &TypeRef, kind: CastKind, distance: u32) -> Self {
        Self {
            from: from.clone(),
            to: to.clone(),
            kind,
            implicit: true,
            distance,
        }
    }

    /// Explicit casts rank behind every implicit one.
    pub fn explicit(from: &TypeRef, to: &TypeRef, kind: CastKind, extra: u32) -> Self {
        Self {
            from: from.clone(),
            to: to.clone(),
            kind,
            implicit: false,
            distance: distance::EXPLICIT + extra,
        }
    }

    pub fn is_identity(&self) -> bool {
        matches!(self.kind, CastKind::Identity)
    }

    /// Converts a runtime value of the source type into the target type.
    pub fn apply(&self, value: Value, env: &mut RuntimeEnv) -> Result<Value, EvalError> {
        if value.is_null() && self.to.is_primitive() {
            return Err(EvalError::NullValue {
                expected: self.to.to_string(),
            });
        }
        match &self.kind {
            CastKind::Identity
            | CastKind::NullToReference
            | CastKind::Boxing
            | CastKind::Unboxing
            | CastKind::Upcast
            | CastKind::Downcast => Ok(value),
            CastKind::Widening(kind) | CastKind::Narrowing(kind) => value.convert_numeric(*kind),
            CastKind::Method(method) => method.invoke(None, std::slice::from_ref(&value), env),
        }
    }
}

impl fmt::Display for Cast {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} -> {} ({})",
            self.kind.label(),
            self.from,
            self.to,
            self.distance
        )
    }
}

/// A source of casts consulted by the [`CastRegistry`].
pub trait CastProvider: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;

    /// Cast from `from` to `to`, if this provider knows one.
    fn cast(&self, from: &TypeRef, to: &TypeRef) -> Option<Cast>;

    /// Types this provider can implicitly convert `from` into. Used as
    /// candidates when looking for a common type of two operands.
    fn implicit_targets(&self, from: &TypeRef) -> Vec<TypeRef>;
}
