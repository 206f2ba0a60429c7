//! Primitive kinds, their boxed counterparts and the numeric lattice.

use serde::{Deserialize, Serialize};

/// Primitive value kinds of the rule language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PrimitiveKind {
    Boolean,
    Byte,
    Short,
    Char,
    Int,
    Long,
    Float,
    Double,
}

impl PrimitiveKind {
    pub const ALL: [PrimitiveKind; 8] = [
        PrimitiveKind::Boolean,
        PrimitiveKind::Byte,
        PrimitiveKind::Short,
        PrimitiveKind::Char,
        PrimitiveKind::Int,
        PrimitiveKind::Long,
        PrimitiveKind::Float,
        PrimitiveKind::Double,
    ];

    /// Lower-case primitive name.
    pub const fn name(self) -> &'static str {
        match self {
            PrimitiveKind::Boolean => "boolean",
            PrimitiveKind::Byte => "byte",
            PrimitiveKind::Short => "short",
            PrimitiveKind::Char => "char",
            PrimitiveKind::Int => "int",
            PrimitiveKind::Long => "long",
            PrimitiveKind::Float => "float",
            PrimitiveKind::Double => "double",
        }
    }

    /// Simple name of the boxed counterpart.
    pub const fn boxed_name(self) -> &'static str {
        match self {
            PrimitiveKind::Boolean => "Boolean",
            PrimitiveKind::Byte => "Byte",
            PrimitiveKind::Short => "Short",
            PrimitiveKind::Char => "Character",
            PrimitiveKind::Int => "Integer",
            PrimitiveKind::Long => "Long",
            PrimitiveKind::Float => "Float",
            PrimitiveKind::Double => "Double",
        }
    }

    pub const fn is_numeric(self) -> bool {
        !matches!(self, PrimitiveKind::Boolean)
    }

    pub const fn is_integral(self) -> bool {
        matches!(
            self,
            PrimitiveKind::Byte
                | PrimitiveKind::Short
                | PrimitiveKind::Char
                | PrimitiveKind::Int
                | PrimitiveKind::Long
        )
    }

    /// Targets of a widening primitive conversion.
    pub fn widening_targets(self) -> &'static [PrimitiveKind] {
        const NONE: &[PrimitiveKind] = &[];
        const BYTE_TARGETS: &[PrimitiveKind] = &[
            PrimitiveKind::Short,
            PrimitiveKind::Int,
            PrimitiveKind::Long,
            PrimitiveKind::Float,
            PrimitiveKind::Double,
        ];
        const SHORT_TARGETS: &[PrimitiveKind] = &[
            PrimitiveKind::Int,
            PrimitiveKind::Long,
            PrimitiveKind::Float,
            PrimitiveKind::Double,
        ];
        const CHAR_TARGETS: &[PrimitiveKind] = &[
            PrimitiveKind::Int,
            PrimitiveKind::Long,
            PrimitiveKind::Float,
            PrimitiveKind::Double,
        ];
        const INT_TARGETS: &[PrimitiveKind] = &[
            PrimitiveKind::Long,
            PrimitiveKind::Float,
            PrimitiveKind::Double,
        ];
        const LONG_TARGETS: &[PrimitiveKind] = &[PrimitiveKind::Float, PrimitiveKind::Double];
        const FLOAT_TARGETS: &[PrimitiveKind] = &[PrimitiveKind::Double];

        match self {
            PrimitiveKind::Boolean => NONE,
            PrimitiveKind::Byte => BYTE_TARGETS,
            PrimitiveKind::Short => SHORT_TARGETS,
            PrimitiveKind::Char => CHAR_TARGETS,
            PrimitiveKind::Int => INT_TARGETS,
            PrimitiveKind::Long => LONG_TARGETS,
            PrimitiveKind::Float => FLOAT_TARGETS,
            PrimitiveKind::Double => NONE,
        }
    }

    pub fn widens_to(self, target: PrimitiveKind) -> bool {
        self.widening_targets().contains(&target)
    }

    pub fn numeric(self) -> Option<NumericKind> {
        match self {
            PrimitiveKind::Boolean => None,
            PrimitiveKind::Byte => Some(NumericKind::Byte),
            PrimitiveKind::Short => Some(NumericKind::Short),
            PrimitiveKind::Char => Some(NumericKind::Char),
            PrimitiveKind::Int => Some(NumericKind::Int),
            PrimitiveKind::Long => Some(NumericKind::Long),
            PrimitiveKind::Float => Some(NumericKind::Float),
            PrimitiveKind::Double => Some(NumericKind::Double),
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        PrimitiveKind::ALL
            .into_iter()
            .find(|kind| kind.name() == name)
    }

    /// Resolves a boxed simple or qualified name (`Integer`, `java.lang.Integer`).
    pub fn from_boxed_name(identifier: &str) -> Option<Self> {
        let simple = identifier.rsplit('.').next().unwrap_or(identifier);
        PrimitiveKind::ALL
            .into_iter()
            .find(|kind| kind.boxed_name() == simple)
    }
}

/// Numeric kinds ordered by the widening lattice, including arbitrary precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum NumericKind {
    Byte,
    Short,
    Char,
    Int,
    Long,
    Float,
    Double,
    BigInteger,
    BigDecimal,
}

impl NumericKind {
    /// Position in the lattice. `Short` and `Char` share a rank; neither widens into the other.
    pub const fn rank(self) -> u32 {
        match self {
            NumericKind::Byte => 0,
            NumericKind::Short | NumericKind::Char => 1,
            NumericKind::Int => 2,
            NumericKind::Long => 3,
            NumericKind::Float => 4,
            NumericKind::Double => 5,
            NumericKind::BigInteger => 6,
            NumericKind::BigDecimal => 7,
        }
    }

    pub const fn is_integral(self) -> bool {
        matches!(
            self,
            NumericKind::Byte
                | NumericKind::Short
                | NumericKind::Char
                | NumericKind::Int
                | NumericKind::Long
                | NumericKind::BigInteger
        )
    }

    pub const fn is_floating(self) -> bool {
        matches!(self, NumericKind::Float | NumericKind::Double)
    }

    pub fn primitive(self) -> Option<PrimitiveKind> {
        match self {
            NumericKind::Byte => Some(PrimitiveKind::Byte),
            NumericKind::Short => Some(PrimitiveKind::Short),
            NumericKind::Char => Some(PrimitiveKind::Char),
            NumericKind::Int => Some(PrimitiveKind::Int),
            NumericKind::Long => Some(PrimitiveKind::Long),
            NumericKind::Float => Some(PrimitiveKind::Float),
            NumericKind::Double => Some(PrimitiveKind::Double),
            NumericKind::BigInteger | NumericKind::BigDecimal => None,
        }
    }

    /// Whether every value of `self` is representable (up to rounding) in `target`.
    pub fn widens_to(self, target: NumericKind) -> bool {
        if self == target {
            return false;
        }
        match (self.primitive(), target.primitive()) {
            (Some(from), Some(to)) => from.widens_to(to),
            (Some(from), None) => match target {
                NumericKind::BigInteger => from.is_integral(),
                _ => true,
            },
            (None, Some(_)) => false,
            (None, None) => self == NumericKind::BigInteger && target == NumericKind::BigDecimal,
        }
    }

    /// Number of lattice steps between `self` and a wider `target`.
    pub fn steps_to(self, target: NumericKind) -> u32 {
        target.rank().saturating_sub(self.rank())
    }

    /// Name of the meta wrapper type built on this kind.
    pub const fn meta_name(self) -> &'static str {
        match self {
            NumericKind::Byte => "ByteValue",
            NumericKind::Short => "ShortValue",
            NumericKind::Char => "CharValue",
            NumericKind::Int => "IntValue",
            NumericKind::Long => "LongValue",
            NumericKind::Float => "FloatValue",
            NumericKind::Double => "DoubleValue",
            NumericKind::BigInteger => "BigIntegerValue",
            NumericKind::BigDecimal => "BigDecimalValue",
        }
    }

    /// Kind both operands are promoted to before a binary arithmetic operation.
    pub fn promote(self, other: NumericKind) -> NumericKind {
        let wider = if self.rank() >= other.rank() { self } else { other };
        match wider {
            NumericKind::Byte | NumericKind::Short | NumericKind::Char => NumericKind::Int,
            NumericKind::BigInteger if other.is_floating() || self.is_floating() => {
                NumericKind::BigDecimal
            }
            kind => kind,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(PrimitiveKind::Byte, PrimitiveKind::Int => true; "byte widens to int")]
    #[test_case(PrimitiveKind::Char, PrimitiveKind::Short => false; "char does not widen to short")]
    #[test_case(PrimitiveKind::Int, PrimitiveKind::Byte => false; "int narrows to byte")]
    #[test_case(PrimitiveKind::Long, PrimitiveKind::Float => true; "long widens to float")]
    #[test_case(PrimitiveKind::Boolean, PrimitiveKind::Int => false; "boolean is not numeric")]
    fn primitive_widening(from: PrimitiveKind, to: PrimitiveKind) -> bool {
        from.widens_to(to)
    }

    #[test]
    fn boxed_names_resolve_both_simple_and_qualified() {
        assert_eq!(PrimitiveKind::from_boxed_name("Integer"), Some(PrimitiveKind::Int));
        assert_eq!(
            PrimitiveKind::from_boxed_name("java.lang.Character"),
            Some(PrimitiveKind::Char)
        );
        assert_eq!(PrimitiveKind::from_boxed_name("int"), None);
        assert_eq!(PrimitiveKind::from_name("double"), Some(PrimitiveKind::Double));
    }

    #[test]
    fn big_numbers_sit_above_primitives() {
        assert!(NumericKind::Long.widens_to(NumericKind::BigInteger));
        assert!(!NumericKind::Double.widens_to(NumericKind::BigInteger));
        assert!(NumericKind::Double.widens_to(NumericKind::BigDecimal));
        assert!(NumericKind::BigInteger.widens_to(NumericKind::BigDecimal));
        assert!(!NumericKind::BigDecimal.widens_to(NumericKind::Double));
        assert_eq!(NumericKind::Byte.steps_to(NumericKind::Int), 2);
    }

    #[test]
    fn promotion_follows_binary_numeric_promotion() {
        assert_eq!(NumericKind::Byte.promote(NumericKind::Short), NumericKind::Int);
        assert_eq!(NumericKind::Int.promote(NumericKind::Double), NumericKind::Double);
        assert_eq!(
            NumericKind::BigInteger.promote(NumericKind::Double),
            NumericKind::BigDecimal
        );
    }
}
