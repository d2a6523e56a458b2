// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

//! Binary floating point numbers with an explicit bit precision, backed by
//! MPFR through `rug`.

use crate::errors::{BackendError, BackendResult};
use crate::round::{RoundingMode, Ternary};
use num::BigRational;
use num_bigint::{BigInt, BigUint, Sign};
use num_traits::Zero;
use rug::float::{Round, Special};
use rug::integer::Order;
use rug::ops::AssignRound;
use std::cmp::Ordering;
use std::num::FpCategory;

/// Smallest precision a `BigFloat` may carry.
pub const MIN_PRECISION: u32 = 2;

/// Largest precision a `BigFloat` may carry.
pub const MAX_PRECISION: u32 = (i32::MAX as u32) - 256;

/// Largest exponent of a regular value, `0.m × 2^EXPONENT_LIMIT`.
pub const EXPONENT_LIMIT: i64 = (1 << 30) - 1;

/// Classification of a [`BigFloat`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FloatClass {
    Zero,
    Regular,
    Infinite,
    Nan,
}

/// A binary floating point number.
///
/// A regular value of precision `p` has a `p`-bit significand `m` with its
/// top bit set and an exponent `e`; the represented value is `m × 2^(e - p)`,
/// i.e. `0.m × 2^e`. Zero and infinities carry a sign; NaN carries none.
#[derive(Debug, Clone)]
pub struct BigFloat(rug::Float);

pub(crate) fn to_rug_integer(value: &BigInt) -> rug::Integer {
    let (sign, digits) = value.to_u32_digits();
    let magnitude = rug::Integer::from_digits(&digits, Order::Lsf);
    match sign {
        Sign::Minus => -magnitude,
        _ => magnitude,
    }
}

pub(crate) fn to_rug_natural(value: &BigUint) -> rug::Integer {
    rug::Integer::from_digits(&value.to_u32_digits(), Order::Lsf)
}

pub(crate) fn from_rug_integer(value: &rug::Integer) -> BigInt {
    let sign = if value.is_negative() {
        Sign::Minus
    } else {
        Sign::Plus
    };
    BigInt::from_biguint(sign, magnitude_of(value))
}

/// Absolute value of a `rug` integer.
pub(crate) fn magnitude_of(value: &rug::Integer) -> BigUint {
    BigUint::new(value.to_digits::<u32>(Order::Lsf))
}

pub(crate) fn to_rug_rational(value: &BigRational) -> rug::Rational {
    rug::Rational::from((to_rug_integer(value.numer()), to_rug_integer(value.denom())))
}

impl BigFloat {
    /// Validates a requested precision.
    pub fn check_precision(precision: u64) -> BackendResult<u32> {
        if precision < u64::from(MIN_PRECISION) || precision > u64::from(MAX_PRECISION) {
            return Err(BackendError::PrecisionOutOfRange { precision });
        }
        Ok(precision as u32)
    }

    /// Rounds anything MPFR can assign into a value of `precision` bits.
    ///
    /// Results that MPFR clamps to its largest or smallest magnitude are
    /// reported as infinity or zero, so that the caller's exponent range
    /// decides how to saturate.
    pub(crate) fn rounded<T>(precision: u32, value: T, rnd: RoundingMode) -> (Self, Ternary)
    where
        rug::Float: AssignRound<T, Round = Round, Ordering = Ordering>,
    {
        let (float, ordering) = rug::Float::with_val_round(precision, value, rnd.into());
        Self(float).settle(Ternary::from(ordering), rnd)
    }

    fn settle(self, ternary: Ternary, rnd: RoundingMode) -> (Self, Ternary) {
        let Some(exp) = self.0.get_exp() else {
            return (self, ternary);
        };
        let negative = self.0.is_sign_negative();
        let toward_zero = ternary == if negative { Ternary::Greater } else { Ternary::Less };
        let away_from_zero = !ternary.is_exact() && !toward_zero;
        if exp == rug::float::exp_max() && toward_zero && rnd != RoundingMode::Nearest {
            let mut next = self.0.clone().abs();
            next.next_up();
            if next.is_infinite() {
                let ternary = if negative { Ternary::Less } else { Ternary::Greater };
                return (Self::infinity(self.precision(), negative), ternary);
            }
        }
        if exp == rug::float::exp_min() && away_from_zero {
            let mut next = self.0.clone().abs();
            next.next_down();
            if next.is_zero() {
                let ternary = if negative { Ternary::Greater } else { Ternary::Less };
                return (Self::signed_zero(self.precision(), negative), ternary);
            }
        }
        (self, ternary)
    }

    /// Creates positive zero.
    pub fn zero(precision: u32) -> Self {
        Self(rug::Float::new(precision))
    }

    pub fn signed_zero(precision: u32, negative: bool) -> Self {
        let special = if negative {
            Special::NegZero
        } else {
            Special::Zero
        };
        Self(rug::Float::with_val(precision, special))
    }

    pub fn infinity(precision: u32, negative: bool) -> Self {
        let special = if negative {
            Special::NegInfinity
        } else {
            Special::Infinity
        };
        Self(rug::Float::with_val(precision, special))
    }

    pub fn nan(precision: u32) -> Self {
        Self(rug::Float::with_val(precision, Special::Nan))
    }

    /// Largest finite magnitude with exponent `emax`.
    pub fn max_finite(precision: u32, emax: i64, negative: bool) -> Self {
        // 1 - 2^-p has all p bits set and exponent 0.
        let mut value = rug::Float::with_val(precision, 1);
        value.next_down();
        value <<= clamp_exponent(emax);
        Self(if negative { -value } else { value })
    }

    /// Smallest regular magnitude with exponent `emin`, i.e. `0.1 × 2^emin`.
    pub fn min_regular(precision: u32, emin: i64, negative: bool) -> Self {
        let mut value = rug::Float::with_val(precision, 0.5);
        value <<= clamp_exponent(emin);
        Self(if negative { -value } else { value })
    }

    pub fn from_bigint(value: &BigInt, precision: u32, rnd: RoundingMode) -> (Self, Ternary) {
        Self::rounded(precision, &to_rug_integer(value), rnd)
    }

    pub fn from_i64(value: i64, precision: u32, rnd: RoundingMode) -> (Self, Ternary) {
        Self::rounded(precision, value, rnd)
    }

    /// Rounds `num / den`.
    pub fn from_ratio(
        num: &BigInt,
        den: &BigInt,
        precision: u32,
        rnd: RoundingMode,
    ) -> BackendResult<(Self, Ternary)> {
        if den.is_zero() {
            return Err(BackendError::DivisionByZero);
        }
        let ratio = rug::Rational::from((to_rug_integer(num), to_rug_integer(den)));
        Ok(Self::rounded(precision, &ratio, rnd))
    }

    pub fn from_rational(value: &BigRational, precision: u32, rnd: RoundingMode) -> (Self, Ternary) {
        Self::rounded(precision, &to_rug_rational(value), rnd)
    }

    pub fn from_f64(value: f64, precision: u32, rnd: RoundingMode) -> (Self, Ternary) {
        Self::rounded(precision, value, rnd)
    }

    /// Same value rounded to a new precision.
    pub fn round_to(&self, precision: u32, rnd: RoundingMode) -> (Self, Ternary) {
        Self::rounded(precision, &self.0, rnd)
    }

    /// `self × 2^e2`, keeping `ternary` unless the shift leaves the exponent
    /// range.
    pub(crate) fn scaled_by_power_of_two(
        self,
        e2: i64,
        ternary: Ternary,
        rnd: RoundingMode,
    ) -> (Self, Ternary) {
        let (scaled, shifted) = Self::rounded(self.precision(), &self.0 << clamp_exponent(e2), rnd);
        if shifted.is_exact() {
            (scaled, ternary)
        } else {
            (scaled, shifted)
        }
    }

    pub fn neg(&self) -> Self {
        Self(-self.0.clone())
    }

    pub fn abs(&self) -> Self {
        Self(self.0.clone().abs())
    }

    pub fn class(&self) -> FloatClass {
        match self.0.classify() {
            FpCategory::Nan => FloatClass::Nan,
            FpCategory::Infinite => FloatClass::Infinite,
            FpCategory::Zero => FloatClass::Zero,
            FpCategory::Normal | FpCategory::Subnormal => FloatClass::Regular,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn is_nan(&self) -> bool {
        self.0.is_nan()
    }

    pub fn is_infinite(&self) -> bool {
        self.0.is_infinite()
    }

    pub fn is_finite(&self) -> bool {
        self.0.is_finite()
    }

    pub fn is_regular(&self) -> bool {
        self.0.is_normal()
    }

    pub fn is_sign_negative(&self) -> bool {
        !self.0.is_nan() && self.0.is_sign_negative()
    }

    /// True for values strictly below zero.
    pub fn is_negative_value(&self) -> bool {
        self.is_sign_negative() && !self.0.is_zero()
    }

    pub fn precision(&self) -> u32 {
        self.0.prec()
    }

    /// Exponent `e` such that the value is `0.m × 2^e` (regular values only).
    pub fn exponent(&self) -> i64 {
        self.0.get_exp().map_or(0, i64::from)
    }

    /// Significand of exactly `precision` bits and binary exponent of a
    /// regular value: `|value| = m × 2^e2`.
    pub fn dyadic(&self) -> (BigUint, i64) {
        match self.0.to_integer_exp() {
            Some((m, e2)) if !m.is_zero() => {
                let m = magnitude_of(&m);
                let pad = u64::from(self.precision()).saturating_sub(m.bits());
                (m << pad, i64::from(e2) - pad as i64)
            }
            _ => (BigUint::zero(), 0),
        }
    }

    /// Number of significant bits once trailing zeros are dropped.
    pub fn significant_bits(&self) -> u64 {
        if !self.is_regular() {
            return 0;
        }
        let (m, _) = self.dyadic();
        m.bits() - m.trailing_zeros().unwrap_or(0)
    }

    pub fn is_integer(&self) -> bool {
        self.0.is_integer()
    }

    /// Exact rational value, `None` for NaN and infinities.
    pub fn to_rational(&self) -> Option<BigRational> {
        let ratio = self.0.to_rational()?;
        Some(BigRational::new_raw(
            from_rug_integer(ratio.numer()),
            from_rug_integer(ratio.denom()),
        ))
    }

    /// Integer obtained by rounding with `rnd`; `None` for non-finite values.
    pub fn to_integer(&self, rnd: RoundingMode) -> Option<BigInt> {
        let (value, _) = self.0.to_integer_round(rnd.into())?;
        Some(from_rug_integer(&value))
    }

    /// Nearest native double.
    pub fn to_f64(&self) -> f64 {
        self.0.to_f64()
    }

    /// Sign-aware comparison by value; `None` when either side is NaN.
    pub fn partial_cmp_value(&self, other: &Self) -> Option<Ordering> {
        self.0.partial_cmp(&other.0)
    }

    /// Compares against an exact rational; `None` for NaN.
    ///
    /// Magnitudes are told apart from the exponent and the operand bit
    /// lengths first; the exact comparison only runs when they overlap.
    pub fn partial_cmp_rational(&self, other: &BigRational) -> Option<Ordering> {
        if self.is_regular() && !other.is_zero() {
            let negative = self.is_sign_negative();
            if negative == (other.numer().sign() == Sign::Minus) {
                // |other| lies in [2^(k-1), 2^(k+1))
                let k = other.numer().bits() as i64 - other.denom().bits() as i64;
                let e = self.exponent();
                let magnitude = if e - 1 >= k + 1 {
                    Some(Ordering::Greater)
                } else if e <= k - 1 {
                    Some(Ordering::Less)
                } else {
                    None
                };
                if let Some(magnitude) = magnitude {
                    return Some(if negative {
                        magnitude.reverse()
                    } else {
                        magnitude
                    });
                }
            }
        }
        self.0.partial_cmp(&to_rug_rational(other))
    }

    /// Exports the significand left-aligned to a whole number of `limb_bits`
    /// limbs.
    ///
    /// Returns the aligned significand and its total bit width.
    pub fn to_raw_parts(&self, limb_bits: u32) -> (BigUint, u64) {
        let limb_bits = u64::from(limb_bits);
        let precision = u64::from(self.precision());
        let total = precision.div_ceil(limb_bits) * limb_bits;
        if !self.is_regular() {
            return (BigUint::zero(), total);
        }
        let (m, _) = self.dyadic();
        (m << (total - precision), total)
    }

    /// Rebuilds a regular value from an aligned significand of `total_bits`
    /// bits.
    ///
    /// The top bit of the significand must be set and no bit may lie beyond
    /// `precision` significant bits.
    pub fn from_raw_parts(
        negative: bool,
        mantissa: BigUint,
        total_bits: u64,
        exponent: i64,
        precision: u32,
    ) -> BackendResult<Self> {
        let precision = Self::check_precision(u64::from(precision))?;
        if mantissa.bits() != total_bits || total_bits < u64::from(precision) {
            return Err(BackendError::MalformedMantissa {
                message: format!(
                    "expected the top bit of a {total_bits}-bit mantissa to be set, got {} bits",
                    mantissa.bits()
                ),
            });
        }
        let pad = total_bits - u64::from(precision);
        if mantissa.trailing_zeros().unwrap_or(0) < pad {
            return Err(BackendError::MalformedMantissa {
                message: format!("mantissa has significant bits beyond precision {precision}"),
            });
        }
        if !(i64::from(rug::float::exp_min())..=i64::from(rug::float::exp_max())).contains(&exponent)
        {
            return Err(BackendError::exponent_overflow(format!(
                "exponent {exponent} out of range"
            )));
        }
        let significand = to_rug_natural(&(mantissa >> pad));
        let mut value = rug::Float::with_val(precision, &significand);
        // Exact: the significand has `precision` bits and the exponent is in range.
        value <<= clamp_exponent(exponent - i64::from(precision));
        Ok(Self(if negative { -value } else { value }))
    }

    pub(crate) fn as_rug(&self) -> &rug::Float {
        &self.0
    }
}

fn clamp_exponent(exponent: i64) -> i32 {
    exponent.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}

impl PartialEq for BigFloat {
    fn eq(&self, other: &Self) -> bool {
        self.partial_cmp_value(other) == Some(Ordering::Equal)
    }
}

impl PartialOrd for BigFloat {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.partial_cmp_value(other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_traits::One;
    use proptest::prelude::*;

    fn exact(value: f64, precision: u32) -> BigFloat {
        BigFloat::from_f64(value, precision, RoundingMode::Nearest).0
    }

    #[test]
    fn test_dyadic_normalizes_significand() {
        let (f, t) = BigFloat::from_i64(3, 8, RoundingMode::Nearest);
        assert_eq!(t, Ternary::Exact);
        assert_eq!(f.dyadic(), (BigUint::from(0b1100_0000u32), -6));
        assert_eq!(f.exponent(), 2);
        assert_eq!(f.significant_bits(), 2);
        assert_eq!(f.to_f64(), 3.0);
    }

    #[test]
    fn test_ties_and_carry() {
        // 11 to 3 bits: tie, rounds to even 12
        let (f, t) = BigFloat::from_i64(11, 3, RoundingMode::Nearest);
        assert_eq!(f.to_f64(), 12.0);
        assert_eq!(t, Ternary::Greater);

        // -15 to 3 bits carries into a new bit
        let (f, t) = BigFloat::from_i64(-15, 3, RoundingMode::Nearest);
        assert_eq!(f.to_f64(), -16.0);
        assert_eq!(t, Ternary::Less);
        assert_eq!(f.dyadic().0.bits(), 3);
    }

    #[test]
    fn test_directed_rounding_of_third() {
        let one = BigInt::from(1);
        let three = BigInt::from(3);
        let (down, t_down) =
            BigFloat::from_ratio(&one, &three, 10, RoundingMode::TowardZero).unwrap();
        let (up, t_up) =
            BigFloat::from_ratio(&one, &three, 10, RoundingMode::TowardPositive).unwrap();
        assert_eq!(t_down, Ternary::Less);
        assert_eq!(t_up, Ternary::Greater);
        assert!(down < up);
        assert!(BigFloat::from_ratio(&one, &BigInt::zero(), 10, RoundingMode::Nearest).is_err());
    }

    #[test]
    fn test_to_integer_modes() {
        let x = exact(-2.5, 53);
        assert_eq!(x.to_integer(RoundingMode::Nearest), Some(BigInt::from(-2)));
        assert_eq!(x.to_integer(RoundingMode::TowardZero), Some(BigInt::from(-2)));
        assert_eq!(x.to_integer(RoundingMode::TowardNegative), Some(BigInt::from(-3)));
        assert_eq!(x.to_integer(RoundingMode::AwayFromZero), Some(BigInt::from(-3)));
        assert_eq!(BigFloat::nan(53).to_integer(RoundingMode::Nearest), None);
    }

    #[test]
    fn test_comparisons_across_precisions() {
        let a = exact(1.5, 10);
        let b = exact(1.5, 200);
        assert_eq!(a, b);
        assert!(exact(-3.0, 53) < exact(-2.0, 20));
        assert!(BigFloat::infinity(53, true) < exact(-1e300, 53));
        assert_eq!(BigFloat::zero(53), BigFloat::signed_zero(20, true));
        assert!(BigFloat::nan(53).partial_cmp(&BigFloat::nan(53)).is_none());
        assert!(!BigFloat::nan(53).neg().is_sign_negative());
    }

    #[test]
    fn test_rational_comparison_near_exponent_limit() {
        let huge = BigFloat::max_finite(53, EXPONENT_LIMIT, false);
        let one = BigRational::one();
        assert_eq!(huge.partial_cmp_rational(&one), Some(Ordering::Greater));
        assert_eq!(huge.neg().partial_cmp_rational(&one), Some(Ordering::Less));
        assert_eq!(
            huge.neg().partial_cmp_rational(&-one.clone()),
            Some(Ordering::Less)
        );
        let tiny = BigFloat::min_regular(53, -EXPONENT_LIMIT, false);
        assert_eq!(tiny.partial_cmp_rational(&one), Some(Ordering::Less));
        let third = BigRational::new(BigInt::from(1), BigInt::from(3));
        let (x, _) = BigFloat::from_rational(&third, 53, RoundingMode::TowardZero);
        assert_eq!(x.partial_cmp_rational(&third), Some(Ordering::Less));
    }

    #[test]
    fn test_limits_of_exponent_range() {
        let max = BigFloat::max_finite(8, 10, false);
        assert_eq!(max.to_f64(), 1020.0);
        assert_eq!(max.exponent(), 10);
        let min = BigFloat::min_regular(8, -3, true);
        assert_eq!(min.to_f64(), -0.0625);
    }

    #[test]
    fn test_overflow_reported_as_infinity() {
        let max = BigFloat::max_finite(53, EXPONENT_LIMIT, false);
        let four = rug::Float::with_val(53, 4);
        let (clamped, t) = BigFloat::rounded(53, max.as_rug() * &four, RoundingMode::TowardZero);
        assert!(clamped.is_infinite());
        assert_eq!(t, Ternary::Greater);
    }

    #[test]
    fn test_raw_parts_are_limb_aligned() {
        let x = exact(0.1, 53);
        let (m32, bits32) = x.to_raw_parts(32);
        let (m64, bits64) = x.to_raw_parts(64);
        assert_eq!(bits32, 64);
        assert_eq!(bits64, 64);
        assert_eq!(m32, m64);
        let back = BigFloat::from_raw_parts(false, m32, bits32, x.exponent(), 53).unwrap();
        assert_eq!(back, x);

        let y = exact(0.1, 70);
        let (m32, bits32) = y.to_raw_parts(32);
        assert_eq!(bits32, 96);
        let back = BigFloat::from_raw_parts(false, m32, bits32, y.exponent(), 70).unwrap();
        assert_eq!(back, y);
    }

    #[test]
    fn test_raw_parts_reject_malformed() {
        assert!(BigFloat::from_raw_parts(false, BigUint::from(1u32), 64, 0, 53).is_err());
        let m = (BigUint::one() << 63u32) | BigUint::one();
        assert!(BigFloat::from_raw_parts(false, m, 64, 0, 53).is_err());
        let m = BigUint::one() << 63u32;
        assert!(BigFloat::from_raw_parts(false, m, 64, 1 << 40, 53).is_err());
    }

    #[test]
    fn test_subnormal_to_f64() {
        let tiny = exact(f64::from_bits(1), 53);
        assert_eq!(tiny.to_f64(), f64::from_bits(1));
        let huge = BigFloat::min_regular(53, 5001, false);
        assert_eq!(huge.to_f64(), f64::INFINITY);
    }

    proptest! {
        #[test]
        fn f64_roundtrip(x in any::<f64>().prop_filter("finite", |x| x.is_finite())) {
            let f = BigFloat::from_f64(x, 53, RoundingMode::Nearest);
            prop_assert_eq!(f.1, Ternary::Exact);
            prop_assert_eq!(f.0.to_f64(), x);
        }

        #[test]
        fn rounded_precision_is_requested(x in any::<i64>(), p in 2u32..200) {
            let (f, _) = BigFloat::from_i64(x, p, RoundingMode::Nearest);
            prop_assert_eq!(f.precision(), p);
            if x != 0 {
                prop_assert_eq!(f.dyadic().0.bits(), u64::from(p));
            }
        }

        #[test]
        fn bigint_conversion_is_lossless(x in any::<i128>()) {
            let value = BigInt::from(x);
            prop_assert_eq!(from_rug_integer(&to_rug_integer(&value)), value);
        }
    }
}
