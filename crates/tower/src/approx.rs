// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

//! Best rational approximation of a float (Stern–Brocot search).

use crate::errors::{TowerError, TowerResult};
use crate::value::{BoxedValue, Float, Integer, Rational};
use num::BigRational;
use num_bigint::BigInt;
use num_traits::{One, Signed, Zero};

/// `|x| × 2^-precision`, the default tolerance.
fn relative_bound(x: &BigRational, precision: u32) -> BigRational {
    x.abs() / BigRational::from_integer(BigInt::one() << precision)
}

/// Within `bound` of `target`?
fn close_enough(target: &BigRational, p: &BigInt, q: &BigInt, bound: &BigRational) -> bool {
    let candidate = BigRational::new(p.clone(), q.clone());
    (target - candidate).abs() <= *bound
}

/// Rational with the smallest denominator within the error bound of `x`.
///
/// The bound is `err` when given (absolute), otherwise `|x| × 2^-p` for a
/// float of precision `p`. A result with denominator 1 is an Integer.
pub fn approximate(x: &Float, err: Option<&Float>) -> TowerResult<BoxedValue> {
    let target = x.to_exact_rational().map_err(|e| match e {
        TowerError::Overflow { message } => TowerError::value(message),
        other => other,
    })?;
    let target = target.into_big_rational();
    let bound = match err {
        Some(err) => err
            .to_exact_rational()
            .map_err(|_| TowerError::value("error bound must be finite"))?
            .into_big_rational()
            .abs(),
        None => relative_bound(&target, x.precision()),
    };
    let negative = target.is_negative();
    let magnitude = target.abs();
    let (p, q) = best_approximation(&magnitude, &bound);
    let p = if negative { -p } else { p };
    Ok(if q.is_one() {
        BoxedValue::Integer(Integer::new(p))
    } else {
        BoxedValue::Rational(Rational::new(p, q)?)
    })
}

/// Continued-fraction expansion of a non-negative `x`, with a search over
/// the semiconvergents of the last step for the smallest denominator.
fn best_approximation(x: &BigRational, bound: &BigRational) -> (BigInt, BigInt) {
    let (mut p0, mut q0) = (BigInt::zero(), BigInt::one());
    let (mut p1, mut q1) = (BigInt::one(), BigInt::zero());
    let mut rest = x.clone();
    let mut first = true;
    loop {
        let a = rest.floor().to_integer();
        let p2 = &a * &p1 + &p0;
        let q2 = &a * &q1 + &q0;
        if close_enough(x, &p2, &q2, bound) {
            if first {
                return (p2, q2);
            }
            // Semiconvergents (k·p1 + p0)/(k·q1 + q0) for k in 1..=a move
            // monotonically toward x; find the smallest k that is close enough.
            let (mut lo, mut hi) = (BigInt::one(), a);
            while lo < hi {
                let mid: BigInt = (&lo + &hi) >> 1u32;
                if close_enough(x, &(&mid * &p1 + &p0), &(&mid * &q1 + &q0), bound) {
                    hi = mid;
                } else {
                    lo = mid + 1u32;
                }
            }
            return (&lo * &p1 + &p0, &lo * &q1 + &q0);
        }
        let fraction = &rest - BigRational::from_integer(a);
        if fraction.is_zero() {
            return (p2, q2);
        }
        rest = fraction.recip();
        p0 = std::mem::replace(&mut p1, p2);
        q0 = std::mem::replace(&mut q1, q2);
        first = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mpt_backend::{BigFloat, RoundingMode};
    use proptest::prelude::*;

    fn float(value: f64, precision: u32) -> Float {
        Float::exact(BigFloat::from_f64(value, precision, RoundingMode::Nearest).0)
    }

    fn ratio(v: &BoxedValue) -> (BigInt, BigInt) {
        match v {
            BoxedValue::Integer(i) => (i.value().clone(), BigInt::one()),
            BoxedValue::Rational(r) => (r.numer().clone(), r.denom().clone()),
            other => panic!("unexpected {other}"),
        }
    }

    #[test]
    fn test_recovers_simple_fractions() {
        let third = approximate(&float(1.0 / 3.0, 53), None).unwrap();
        assert_eq!(ratio(&third), (BigInt::from(1), BigInt::from(3)));
        let tenth = approximate(&float(-0.1, 53), None).unwrap();
        assert_eq!(ratio(&tenth), (BigInt::from(-1), BigInt::from(10)));
    }

    #[test]
    fn test_integers_come_back_as_integers() {
        let seven = approximate(&float(7.0, 53), None).unwrap();
        assert!(matches!(seven, BoxedValue::Integer(_)));
        let near = approximate(&float(2.9999, 53), Some(&float(0.001, 53))).unwrap();
        assert_eq!(ratio(&near), (BigInt::from(3), BigInt::one()));
    }

    #[test]
    fn test_explicit_bound_gives_coarser_answers() {
        let pi = float(std::f64::consts::PI, 53);
        let coarse = approximate(&pi, Some(&float(0.01, 53))).unwrap();
        assert_eq!(ratio(&coarse), (BigInt::from(22), BigInt::from(7)));
        let finer = approximate(&pi, Some(&float(1e-6, 53))).unwrap();
        assert_eq!(ratio(&finer), (BigInt::from(355), BigInt::from(113)));
    }

    #[test]
    fn test_non_finite_is_rejected() {
        let inf = Float::exact(BigFloat::infinity(53, false));
        assert!(approximate(&inf, None).is_err());
        let nan = Float::exact(BigFloat::nan(53));
        assert!(approximate(&nan, None).is_err());
    }

    proptest! {
        #[test]
        fn dyadic_values_are_fixed_points(n in -1_000_000i64..1_000_000, shift in 0u32..20) {
            let value = n as f64 / f64::from(1u32 << shift);
            let result = approximate(&float(value, 53), None).unwrap();
            let expected = BigRational::new(BigInt::from(n), BigInt::one() << shift);
            let (p, q) = ratio(&result);
            prop_assert_eq!(BigRational::new(p, q), expected);
        }
    }
}
