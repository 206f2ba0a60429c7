//! Comparison operators with "human" tolerance for floating round-off.
//!
//! The loose operators (`eq`, `ne`, `gt`, `lt`, `ge`, `le`) treat two floating
//! values that differ by no more than one unit in the last place as equal, and
//! only call `x > y` when `x` exceeds `y` by more than that rounding noise.
//! The `strict_*` operators compare exactly. Nullable (boxed) operands use a
//! three-state `Option<bool>` result instead of failing. Nothing here panics.

use num_bigint::BigInt;
use rust_decimal::Decimal;
use std::cmp::Ordering;

/// Unit in the last place of `x`, mirroring `Math.ulp(double)`.
pub fn ulp_f64(x: f64) -> f64 {
    if x.is_nan() {
        return f64::NAN;
    }
    if x.is_infinite() {
        return f64::INFINITY;
    }
    let magnitude = x.abs();
    if magnitude == f64::MAX {
        return magnitude - f64::from_bits(magnitude.to_bits() - 1);
    }
    f64::from_bits(magnitude.to_bits() + 1) - magnitude
}

/// Unit in the last place of `x`, mirroring `Math.ulp(float)`.
pub fn ulp_f32(x: f32) -> f32 {
    if x.is_nan() {
        return f32::NAN;
    }
    if x.is_infinite() {
        return f32::INFINITY;
    }
    let magnitude = x.abs();
    if magnitude == f32::MAX {
        return magnitude - f32::from_bits(magnitude.to_bits() - 1);
    }
    f32::from_bits(magnitude.to_bits() + 1) - magnitude
}

/// Unit in the last place of a decimal at its own scale (`10^-scale`).
pub fn ulp_decimal(x: &Decimal) -> Decimal {
    Decimal::new(1, x.scale())
}

/// Loose ordering used by the non-strict operators.
///
/// Only `loose_eq` and `loose_gt` are required; the remaining operators are
/// derived so that `lt`/`le` are always the swapped forms of `gt`/`ge`.
pub trait LooseOrd {
    fn loose_eq(&self, other: &Self) -> bool;

    fn loose_gt(&self, other: &Self) -> bool;

    fn loose_ge(&self, other: &Self) -> bool {
        self.loose_gt(other) || self.loose_eq(other)
    }
}

macro_rules! exact_loose_ord {
    ($($ty:ty),* $(,)?) => {
        $(
            impl LooseOrd for $ty {
                fn loose_eq(&self, other: &Self) -> bool {
                    self == other
                }

                fn loose_gt(&self, other: &Self) -> bool {
                    self > other
                }
            }
        )*
    };
}

exact_loose_ord!(i8, i16, i32, i64, char, BigInt, String, str);

impl LooseOrd for bool {
    fn loose_eq(&self, other: &Self) -> bool {
        self == other
    }

    fn loose_gt(&self, other: &Self) -> bool {
        *self && !*other
    }

    fn loose_ge(&self, other: &Self) -> bool {
        *self || !*other
    }
}

macro_rules! floating_loose_ord {
    ($ty:ty, $ulp:ident) => {
        impl LooseOrd for $ty {
            fn loose_eq(&self, other: &Self) -> bool {
                let (x, y) = (*self, *other);
                if x.to_bits() == y.to_bits() || x == y {
                    return true;
                }
                if !x.is_finite() || !y.is_finite() {
                    return false;
                }
                // The larger of the two ULPs keeps the relation symmetric at binade boundaries.
                let tolerance = $ulp(x).max($ulp(y));
                (x - y).abs() <= tolerance
            }

            fn loose_gt(&self, other: &Self) -> bool {
                let (x, y) = (*self, *other);
                x > y && (x.is_infinite() || (x - y) > $ulp(x))
            }
        }
    };
}

floating_loose_ord!(f64, ulp_f64);
floating_loose_ord!(f32, ulp_f32);

impl LooseOrd for Decimal {
    fn loose_eq(&self, other: &Self) -> bool {
        match self.checked_sub(*other) {
            Some(difference) => difference.abs() <= ulp_decimal(self),
            None => false,
        }
    }

    fn loose_gt(&self, other: &Self) -> bool {
        if self <= other {
            return false;
        }
        match self.checked_sub(*other) {
            Some(difference) => difference > ulp_decimal(self),
            // Overflowing difference is far beyond any rounding noise.
            None => true,
        }
    }
}

pub fn eq<T: LooseOrd + ?Sized>(x: &T, y: &T) -> bool {
    x.loose_eq(y)
}

pub fn ne<T: LooseOrd + ?Sized>(x: &T, y: &T) -> bool {
    !x.loose_eq(y)
}

pub fn gt<T: LooseOrd + ?Sized>(x: &T, y: &T) -> bool {
    x.loose_gt(y)
}

pub fn ge<T: LooseOrd + ?Sized>(x: &T, y: &T) -> bool {
    x.loose_ge(y)
}

pub fn lt<T: LooseOrd + ?Sized>(x: &T, y: &T) -> bool {
    y.loose_gt(x)
}

pub fn le<T: LooseOrd + ?Sized>(x: &T, y: &T) -> bool {
    y.loose_ge(x)
}

pub fn strict_eq<T: PartialOrd + ?Sized>(x: &T, y: &T) -> bool {
    x == y
}

pub fn strict_ne<T: PartialOrd + ?Sized>(x: &T, y: &T) -> bool {
    x != y
}

pub fn strict_gt<T: PartialOrd + ?Sized>(x: &T, y: &T) -> bool {
    x > y
}

pub fn strict_ge<T: PartialOrd + ?Sized>(x: &T, y: &T) -> bool {
    x >= y
}

pub fn strict_lt<T: PartialOrd + ?Sized>(x: &T, y: &T) -> bool {
    x < y
}

pub fn strict_le<T: PartialOrd + ?Sized>(x: &T, y: &T) -> bool {
    x <= y
}

/// Equality of nullable operands: both null are equal, one null is not.
pub fn eq_nullable<T: LooseOrd + ?Sized>(x: Option<&T>, y: Option<&T>) -> bool {
    match (x, y) {
        (None, None) => true,
        (Some(x), Some(y)) => x.loose_eq(y),
        _ => false,
    }
}

pub fn ne_nullable<T: LooseOrd + ?Sized>(x: Option<&T>, y: Option<&T>) -> bool {
    !eq_nullable(x, y)
}

/// Three-state `x > y`: unknown when either operand is null.
pub fn gt_nullable<T: LooseOrd + ?Sized>(x: Option<&T>, y: Option<&T>) -> Option<bool> {
    match (x, y) {
        (Some(x), Some(y)) => Some(x.loose_gt(y)),
        _ => None,
    }
}

/// Three-state `x >= y`: two nulls compare as equal, a single null is unknown.
pub fn ge_nullable<T: LooseOrd + ?Sized>(x: Option<&T>, y: Option<&T>) -> Option<bool> {
    match (x, y) {
        (None, None) => Some(true),
        (Some(x), Some(y)) => Some(x.loose_ge(y)),
        _ => None,
    }
}

pub fn lt_nullable<T: LooseOrd + ?Sized>(x: Option<&T>, y: Option<&T>) -> Option<bool> {
    gt_nullable(y, x)
}

pub fn le_nullable<T: LooseOrd + ?Sized>(x: Option<&T>, y: Option<&T>) -> Option<bool> {
    ge_nullable(y, x)
}

/// `x > y` for any ordered type; unknown when an operand is null or the pair is unordered.
pub fn gt_generic<T: PartialOrd + ?Sized>(x: Option<&T>, y: Option<&T>) -> Option<bool> {
    let ordering = x?.partial_cmp(y?)?;
    Some(ordering == Ordering::Greater)
}

pub fn ge_generic<T: PartialOrd + ?Sized>(x: Option<&T>, y: Option<&T>) -> Option<bool> {
    let ordering = x?.partial_cmp(y?)?;
    Some(ordering != Ordering::Less)
}

pub fn lt_generic<T: PartialOrd + ?Sized>(x: Option<&T>, y: Option<&T>) -> Option<bool> {
    gt_generic(y, x)
}

pub fn le_generic<T: PartialOrd + ?Sized>(x: Option<&T>, y: Option<&T>) -> Option<bool> {
    ge_generic(y, x)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use test_case::test_case;

    fn next_up_f32(x: f32) -> f32 {
        f32::from_bits(x.to_bits() + 1)
    }

    fn next_up_f64(x: f64) -> f64 {
        f64::from_bits(x.to_bits() + 1)
    }

    #[test]
    fn float_one_ulp_apart_is_loosely_equal_but_strictly_different() {
        let x = 1.0f32;
        let y = next_up_f32(x);
        assert!(eq(&x, &y));
        assert!(eq(&y, &x));
        assert!(!strict_eq(&x, &y));
        assert!(strict_ne(&x, &y));
    }

    #[test]
    fn adding_min_value_to_one_rounds_back_to_one() {
        let x = 1.0f32;
        let min_value = f32::from_bits(1);
        let y = 1.0f32 + min_value;
        assert!(eq(&x, &y));
        assert!(strict_eq(&x, &y));
    }

    #[test]
    fn one_ulp_above_is_strictly_but_not_loosely_greater() {
        let y = 10.0f64;
        let x = next_up_f64(y);
        assert!(strict_gt(&x, &y));
        assert!(!gt(&x, &y));
        assert!(ge(&x, &y));
        assert!(eq(&x, &y));
    }

    #[test]
    fn loose_greater_implies_strict_greater() {
        let samples = [-3.5f64, -1.0, 0.0, 1e-300, 0.1, 0.3, 1.0, 2.0, 1e10, f64::MAX];
        for x in samples {
            for y in samples {
                if gt(&x, &y) {
                    assert!(strict_gt(&x, &y), "{x} > {y}");
                }
            }
        }
    }

    #[test]
    fn tolerance_is_symmetric_across_binade_boundary() {
        let x = 2.0f64;
        let below = f64::from_bits(x.to_bits() - 2);
        assert_eq!(eq(&x, &below), eq(&below, &x));
        for value in [0.0f64, -0.0, 1.5, 1e-310, f64::MAX, f64::INFINITY] {
            assert!(eq(&value, &value));
        }
    }

    #[test]
    fn infinity_and_nan_only_equal_themselves() {
        assert!(eq(&f64::INFINITY, &f64::INFINITY));
        assert!(!eq(&f64::INFINITY, &f64::MAX));
        assert!(gt(&f64::INFINITY, &f64::MAX));
        let nan = f64::NAN;
        assert!(eq(&nan, &nan));
        assert!(!eq(&nan, &1.0));
        assert!(!strict_eq(&nan, &nan));
    }

    #[test]
    fn ulp_matches_reference_values() {
        assert_eq!(ulp_f64(1.0), f64::EPSILON);
        assert_eq!(ulp_f32(1.0), f32::EPSILON);
        assert_eq!(ulp_f64(0.0), f64::from_bits(1));
        assert_eq!(ulp_f64(-1.0), f64::EPSILON);
    }

    #[test]
    fn decimal_equality_uses_scale_of_first_operand() {
        let x = Decimal::from_str("1.00").unwrap();
        let within = Decimal::from_str("1.01").unwrap();
        let outside = Decimal::from_str("1.02").unwrap();
        assert!(eq(&x, &within));
        assert!(!eq(&x, &outside));
        assert!(gt(&outside, &x));
        assert!(!gt(&within, &x));
        assert!(eq_nullable::<Decimal>(None, None));
        assert!(!eq_nullable(Some(&x), None));
    }

    #[test_case(true, false => true; "true greater than false")]
    #[test_case(false, true => false; "false not greater than true")]
    #[test_case(true, true => false; "equal values")]
    fn boolean_greater(x: bool, y: bool) -> bool {
        gt(&x, &y)
    }

    #[test_case(true, false => true; "true ge false")]
    #[test_case(false, true => false; "false ge true")]
    #[test_case(false, false => true; "false ge false")]
    fn boolean_greater_or_equal(x: bool, y: bool) -> bool {
        ge(&x, &y)
    }

    #[test]
    fn nullable_orderings_are_three_state() {
        let one = 1i32;
        let two = 2i32;
        assert_eq!(gt_nullable(Some(&two), Some(&one)), Some(true));
        assert_eq!(gt_nullable(Some(&two), None), None);
        assert_eq!(gt_nullable::<i32>(None, None), None);
        assert_eq!(ge_nullable::<i32>(None, None), Some(true));
        assert_eq!(ge_nullable(None, Some(&one)), None);
        assert_eq!(lt_nullable(Some(&one), Some(&two)), Some(true));
        assert_eq!(le_nullable(Some(&two), Some(&one)), Some(false));
    }

    #[test]
    fn generic_comparisons_delegate_to_partial_ord() {
        let a = "apple".to_string();
        let b = "banana".to_string();
        assert_eq!(gt_generic(Some(&b), Some(&a)), Some(true));
        assert_eq!(ge_generic(Some(&a), Some(&a)), Some(true));
        assert_eq!(lt_generic(Some(&a), None), None);
        assert_eq!(gt_generic(Some(&f64::NAN), Some(&1.0)), None);
    }

    #[test]
    fn integers_compare_exactly() {
        assert!(!eq(&1i64, &2i64));
        assert!(gt(&2i64, &1i64));
        assert!(le(&1i32, &1i32));
        assert!(lt(&'a', &'b'));
    }
}
