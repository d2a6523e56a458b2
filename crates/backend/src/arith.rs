// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

//! Correctly rounded floating point arithmetic.
//!
//! Every function returns the rounded result together with its [`Ternary`]
//! code. The kernels are MPFR's; this module adds the floor semantics and
//! the error cases the tower reports instead of producing NaN.

use crate::errors::{BackendError, BackendResult};
use crate::float::{to_rug_integer, to_rug_natural, BigFloat};
use crate::round::{RoundingMode, Ternary};
use num::BigRational;
use num_bigint::{BigInt, BigUint};
use num_integer::Integer as _;
use num_traits::{Signed, Zero};
use rug::ops::Pow;

/// `a + b` rounded to `precision`.
pub fn add(a: &BigFloat, b: &BigFloat, precision: u32, rnd: RoundingMode) -> (BigFloat, Ternary) {
    BigFloat::rounded(precision, a.as_rug() + b.as_rug(), rnd)
}

pub fn sub(a: &BigFloat, b: &BigFloat, precision: u32, rnd: RoundingMode) -> (BigFloat, Ternary) {
    BigFloat::rounded(precision, a.as_rug() - b.as_rug(), rnd)
}

pub fn mul(a: &BigFloat, b: &BigFloat, precision: u32, rnd: RoundingMode) -> (BigFloat, Ternary) {
    BigFloat::rounded(precision, a.as_rug() * b.as_rug(), rnd)
}

/// `a / b`; a zero divisor gives a signed infinity (or NaN for `0 / 0`).
pub fn div(a: &BigFloat, b: &BigFloat, precision: u32, rnd: RoundingMode) -> (BigFloat, Ternary) {
    BigFloat::rounded(precision, a.as_rug() / b.as_rug(), rnd)
}

/// Square root; negative operands give NaN, `sqrt(-0) = -0`.
pub fn sqrt(a: &BigFloat, precision: u32, rnd: RoundingMode) -> (BigFloat, Ternary) {
    BigFloat::rounded(precision, a.as_rug().sqrt_ref(), rnd)
}

/// `sqrt(a² + b²)` rounded once; an infinite operand wins over NaN.
pub fn hypot(a: &BigFloat, b: &BigFloat, precision: u32, rnd: RoundingMode) -> (BigFloat, Ternary) {
    BigFloat::rounded(precision, a.as_rug().hypot_ref(b.as_rug()), rnd)
}

/// Correctly rounded `sqrt(num / den)`.
pub fn sqrt_ratio(
    num: &BigUint,
    den: &BigUint,
    precision: u32,
    rnd: RoundingMode,
) -> BackendResult<(BigFloat, Ternary)> {
    if den.is_zero() {
        return Err(BackendError::DivisionByZero);
    }
    if num.is_zero() {
        return Ok((BigFloat::zero(precision), Ternary::Exact));
    }
    // sqrt(n/d) = sqrt(n·d·4^k) / (d·2^k), with k large enough that every
    // rounding boundary at `precision` bits is an integer multiple of 1/(d·2^k).
    let wanted = 2 * (u64::from(precision) + 2) + 2 * den.bits();
    let product = to_rug_natural(&(num * den));
    let k = wanted
        .saturating_sub(u64::from(product.significant_bits()))
        .div_ceil(2);
    let k = u32::try_from(k).map_err(|_| BackendError::exponent_overflow("root scale out of range"))?;
    let scaled = product << (2 * k);
    let (root, remainder) = scaled.sqrt_rem(rug::Integer::new());
    // An inexact root is replaced by root + 1/2, which rounds the same way.
    let mut numerator = root << 1u32;
    if !remainder.is_zero() {
        numerator += 1u32;
    }
    let denominator = to_rug_natural(den) << (k + 1);
    let ratio = rug::Rational::from((numerator, denominator));
    Ok(BigFloat::rounded(precision, &ratio, rnd))
}

/// `x^n` for an integer exponent of any size.
///
/// Results beyond the exponent range saturate to infinity or zero with an
/// inexact code, so the context raises overflow or underflow.
pub fn pow_int(
    x: &BigFloat,
    n: &BigInt,
    precision: u32,
    rnd: RoundingMode,
) -> BackendResult<(BigFloat, Ternary)> {
    if x.is_zero() && n.is_negative() {
        return Err(BackendError::DivisionByZero);
    }
    let n = to_rug_integer(n);
    Ok(BigFloat::rounded(precision, x.as_rug().pow(&n), rnd))
}

/// `x^y` for real `y`.
///
/// Integral exponents go through [`pow_int`]. A negative base with a
/// non-integral exponent, and zero raised to a negative power, are errors.
pub fn pow_real(
    x: &BigFloat,
    y: &BigFloat,
    precision: u32,
    rnd: RoundingMode,
) -> BackendResult<(BigFloat, Ternary)> {
    if x.is_nan() || y.is_nan() {
        return Ok((BigFloat::nan(precision), Ternary::Exact));
    }
    if !y.is_finite() {
        return Err(BackendError::NotFinite);
    }
    if y.is_integer() {
        let n = y
            .to_integer(RoundingMode::TowardZero)
            .ok_or(BackendError::NotFinite)?;
        return pow_int(x, &n, precision, rnd);
    }
    if x.is_zero() && y.is_sign_negative() {
        return Err(BackendError::DivisionByZero);
    }
    if x.is_negative_value() {
        return Err(BackendError::invalid_operation(
            "negative base raised to a non-integral power",
        ));
    }
    Ok(BigFloat::rounded(precision, x.as_rug().pow(y.as_rug()), rnd))
}

fn finite_ratio(a: &BigFloat, b: &BigFloat) -> BackendResult<(BigRational, BigRational)> {
    match (a.to_rational(), b.to_rational()) {
        (Some(x), Some(y)) => Ok((x, y)),
        _ => Err(BackendError::NotFinite),
    }
}

/// `floor(a / b)` rounded to `precision`; `b` must be non-zero and both finite.
pub fn floor_div(
    a: &BigFloat,
    b: &BigFloat,
    precision: u32,
    rnd: RoundingMode,
) -> BackendResult<(BigFloat, Ternary)> {
    let (x, y) = finite_ratio(a, b)?;
    if y.is_zero() {
        return Err(BackendError::DivisionByZero);
    }
    let q = x.numer() * y.denom();
    let d = x.denom() * y.numer();
    Ok(BigFloat::from_bigint(&q.div_floor(&d), precision, rnd))
}

/// `a - b · floor(a / b)`: the result takes the sign of `b`.
pub fn modulo(
    a: &BigFloat,
    b: &BigFloat,
    precision: u32,
    rnd: RoundingMode,
) -> BackendResult<(BigFloat, Ternary)> {
    let (x, y) = finite_ratio(a, b)?;
    if y.is_zero() {
        return Err(BackendError::DivisionByZero);
    }
    let q = (&x / &y).floor();
    let r = x - q * &y;
    if r.is_zero() {
        return Ok((
            BigFloat::signed_zero(precision, b.is_sign_negative()),
            Ternary::Exact,
        ));
    }
    Ok(BigFloat::from_rational(&r, precision, rnd))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::float::EXPONENT_LIMIT;

    const N: RoundingMode = RoundingMode::Nearest;

    fn f(value: f64) -> BigFloat {
        BigFloat::from_f64(value, 53, N).0
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() <= 1e-15 * b.abs()
    }

    #[test]
    fn test_add_matches_native_doubles() {
        let (sum, t) = add(&f(0.1), &f(0.2), 53, N);
        assert_eq!(sum.to_f64(), 0.1 + 0.2);
        assert_eq!(t, Ternary::Greater);
        let (sum, t) = add(&f(1.5), &f(2.25), 53, N);
        assert_eq!(sum.to_f64(), 3.75);
        assert!(t.is_exact());
    }

    #[test]
    fn test_add_far_apart_is_directed() {
        let big = f(1.0);
        let tiny = BigFloat::min_regular(53, -499, false);
        let (sum, t) = add(&big, &tiny, 53, N);
        assert_eq!(sum.to_f64(), 1.0);
        assert_eq!(t, Ternary::Less);
        let (up, t) = add(&big, &tiny, 53, RoundingMode::TowardPositive);
        assert_eq!(t, Ternary::Greater);
        assert!(up > big);
        let (down, t) = sub(&big, &tiny, 53, RoundingMode::TowardZero);
        assert_eq!(t, Ternary::Less);
        assert!(down < big);
    }

    #[test]
    fn test_cancellation_gives_signed_zero() {
        let (z, _) = sub(&f(2.0), &f(2.0), 53, N);
        assert!(z.is_zero() && !z.is_sign_negative());
        let (z, _) = sub(&f(2.0), &f(2.0), 53, RoundingMode::TowardNegative);
        assert!(z.is_zero() && z.is_sign_negative());
    }

    #[test]
    fn test_mul_div_specials() {
        assert!(mul(&BigFloat::infinity(53, false), &BigFloat::zero(53), 53, N).0.is_nan());
        let (q, _) = div(&f(1.0), &BigFloat::zero(53), 53, N);
        assert!(q.is_infinite());
        let (q, t) = div(&f(1.0), &f(3.0), 53, N);
        assert_eq!(q.to_f64(), 1.0 / 3.0);
        assert_eq!(t, Ternary::Less);
        let (p, t) = mul(&f(-1.5), &f(4.0), 53, N);
        assert_eq!(p.to_f64(), -6.0);
        assert!(t.is_exact());
    }

    #[test]
    fn test_sqrt() {
        let (r, t) = sqrt(&f(2.0), 53, N);
        assert_eq!(r.to_f64(), 2f64.sqrt());
        assert!(!t.is_exact());
        let (r, t) = sqrt(&f(0.25), 53, N);
        assert_eq!(r.to_f64(), 0.5);
        assert!(t.is_exact());
        assert!(sqrt(&f(-4.0), 53, N).0.is_nan());
        let (r, t) = sqrt_ratio(&BigUint::from(1u32), &BigUint::from(4u32), 53, N).unwrap();
        assert_eq!(r.to_f64(), 0.5);
        assert!(t.is_exact());
        let (r, _) = sqrt_ratio(&BigUint::from(2u32), &BigUint::from(1u32), 53, N).unwrap();
        assert_eq!(r.to_f64(), 2f64.sqrt());
        let (r, _) = sqrt_ratio(&BigUint::from(1u32), &BigUint::from(3u32), 53, N).unwrap();
        assert_eq!(r.to_f64(), (1.0f64 / 3.0).sqrt());
    }

    #[test]
    fn test_hypot() {
        let (h, t) = hypot(&f(3.0), &f(-4.0), 53, N);
        assert_eq!(h.to_f64(), 5.0);
        assert!(t.is_exact());
        let (h, t) = hypot(&f(1.0), &f(1.0), 53, N);
        assert_eq!(h.to_f64(), 2f64.sqrt());
        assert!(!t.is_exact());
        assert!(hypot(&BigFloat::nan(53), &BigFloat::infinity(53, true), 53, N).0.is_infinite());
        let huge = BigFloat::max_finite(53, EXPONENT_LIMIT, false);
        let (h, t) = hypot(&huge, &huge, 53, N);
        assert!(h.is_infinite());
        assert_eq!(t, Ternary::Greater);
    }

    #[test]
    fn test_pow_int() {
        let (p, t) = pow_int(&f(1.5), &BigInt::from(3), 53, N).unwrap();
        assert_eq!(p.to_f64(), 3.375);
        assert!(t.is_exact());
        let (p, _) = pow_int(&f(2.0), &BigInt::from(-3), 53, N).unwrap();
        assert_eq!(p.to_f64(), 0.125);
        let (p, _) = pow_int(&f(3.0), &BigInt::from(-1), 53, N).unwrap();
        assert_eq!(p.to_f64(), 1.0 / 3.0);
        let (p, _) = pow_int(&f(-2.0), &BigInt::from(5), 53, N).unwrap();
        assert_eq!(p.to_f64(), -32.0);
        assert!(pow_int(&BigFloat::zero(53), &BigInt::from(-1), 53, N).is_err());
        let (p, _) = pow_int(&f(1.0000001), &BigInt::from(2_000_000), 53, N).unwrap();
        let expected = 1.0000001f64.powi(2_000_000);
        assert!((p.to_f64() / expected - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_pow_int_saturates_huge_exponents() {
        let huge: BigInt = num_traits::Pow::pow(BigInt::from(10), 30u32);
        let (p, t) = pow_int(&f(10.0), &huge, 53, N).unwrap();
        assert!(p.is_infinite() && !p.is_sign_negative());
        assert_eq!(t, Ternary::Greater);
        let (p, t) = pow_int(&f(0.5), &huge, 53, N).unwrap();
        assert!(p.is_zero());
        assert_eq!(t, Ternary::Less);
        let (p, t) = pow_int(&f(0.5), &-huge.clone(), 53, N).unwrap();
        assert!(p.is_infinite());
        assert_eq!(t, Ternary::Greater);
        // odd exponent keeps the sign
        let odd = &huge + 1;
        let (p, t) = pow_int(&f(-10.0), &odd, 53, N).unwrap();
        assert!(p.is_infinite() && p.is_sign_negative());
        assert_eq!(t, Ternary::Less);
        // directed rounding toward zero still reports the overflow
        let (p, _) = pow_int(&f(10.0), &huge, 53, RoundingMode::TowardZero).unwrap();
        assert!(p.is_infinite());
        let (p, t) = pow_int(&f(1.0), &huge, 53, N).unwrap();
        assert_eq!(p.to_f64(), 1.0);
        assert!(t.is_exact());
    }

    #[test]
    fn test_pow_real() {
        let (r, _) = pow_real(&f(2.0), &f(0.5), 53, N).unwrap();
        assert!(close(r.to_f64(), std::f64::consts::SQRT_2));
        let (r, _) = pow_real(&f(10.0), &f(-1.5), 53, N).unwrap();
        assert!(close(r.to_f64(), 10f64.powf(-1.5)));
        let (r, t) = pow_real(&f(3.0), &f(2.0), 53, N).unwrap();
        assert_eq!(r.to_f64(), 9.0);
        assert!(t.is_exact());
        assert!(pow_real(&f(-2.0), &f(0.5), 53, N).is_err());
        assert!(pow_real(&BigFloat::zero(53), &f(-0.5), 53, N).is_err());
        let (big, t) = pow_real(&f(10.0), &f(1e30), 53, N).unwrap();
        assert!(big.is_infinite());
        assert!(!t.is_exact());
        let (small, t) = pow_real(&f(0.5), &f(1e30), 53, N).unwrap();
        assert!(small.is_zero());
        assert!(!t.is_exact());
        let (r, _) = pow_real(&f(2.0), &f(1e-300), 53, N).unwrap();
        assert_eq!(r.to_f64(), 1.0);
        let max = BigFloat::max_finite(53, EXPONENT_LIMIT, false);
        assert!(pow_real(&max, &f(1.5), 53, N).unwrap().0.is_infinite());
    }

    #[test]
    fn test_floor_div_and_modulo() {
        let (q, _) = floor_div(&f(7.5), &f(-2.0), 53, N).unwrap();
        assert_eq!(q.to_f64(), -4.0);
        let (r, _) = modulo(&f(7.5), &f(-2.0), 53, N).unwrap();
        assert_eq!(r.to_f64(), -0.5);
        let (r, _) = modulo(&f(-4.0), &f(2.0), 53, N).unwrap();
        assert!(r.is_zero() && !r.is_sign_negative());
        assert!(floor_div(&f(1.0), &BigFloat::zero(53), 53, N).is_err());
        assert!(modulo(&BigFloat::infinity(53, false), &f(2.0), 53, N).is_err());
    }
}
