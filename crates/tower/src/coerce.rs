// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

//! Conversion of host values into boxed values along the promotion lattice.

use crate::classify::{classify, NumericKind};
use crate::context::{Context, GUARD_BITS, PRECISION_DEFAULT, PRECISION_EXACT};
use crate::errors::{TowerError, TowerResult};
use crate::host::{Decimal, NumericProtocol};
use crate::value::{BoxedValue, Complex, Float, Integer, Rational};
use mpt_backend::radix::MAX_TEXT_EXPONENT;
use mpt_backend::{BigFloat, RoundingMode, Ternary, MAX_PRECISION};
use num::BigRational;
use num_bigint::BigInt;
use num_traits::Pow;

/// Exact real value a conversion starts from.
enum Source {
    Integer(BigInt),
    Ratio(BigRational),
    Dyadic(BigFloat),
}

impl Source {
    /// Bits needed to hold the value exactly, `None` when it is not dyadic.
    fn exact_bits(&self) -> Option<u64> {
        match self {
            Source::Integer(v) => {
                let tz = v.trailing_zeros().unwrap_or(0);
                Some(v.bits() - tz)
            }
            Source::Ratio(r) => {
                let den = r.denom();
                if den.trailing_zeros() != Some(den.bits() - 1) {
                    return None;
                }
                let num = r.numer();
                Some(num.bits() - num.trailing_zeros().unwrap_or(0))
            }
            Source::Dyadic(f) => Some(f.significant_bits()),
        }
    }

    fn round(&self, precision: u32, rnd: RoundingMode) -> (BigFloat, Ternary) {
        match self {
            Source::Integer(v) => BigFloat::from_bigint(v, precision, rnd),
            Source::Ratio(r) => BigFloat::from_rational(r, precision, rnd),
            Source::Dyadic(f) => f.round_to(precision, rnd),
        }
    }
}

/// Exact rational value of a finite decimal.
pub fn decimal_to_rational(decimal: &Decimal) -> TowerResult<BigRational> {
    match decimal {
        Decimal::Finite {
            coefficient,
            exponent,
        } => {
            if exponent.unsigned_abs() > MAX_TEXT_EXPONENT as u64 {
                return Err(TowerError::overflow(format!(
                    "decimal exponent {exponent} out of range"
                )));
            }
            let scale: BigInt = Pow::pow(BigInt::from(10u32), exponent.unsigned_abs());
            Ok(if *exponent >= 0 {
                BigRational::from_integer(coefficient * scale)
            } else {
                BigRational::new(coefficient.clone(), scale)
            })
        }
        Decimal::Infinite { .. } => Err(TowerError::value(
            "cannot convert Infinity to a tower float",
        )),
        Decimal::Nan => Err(TowerError::value("cannot convert NaN to a tower float")),
    }
}

fn finite_f64(value: f64) -> TowerResult<BigFloat> {
    if value.is_nan() {
        return Err(TowerError::value("cannot convert NaN to a tower float"));
    }
    if value.is_infinite() {
        return Err(TowerError::value(
            "cannot convert Infinity to a tower float",
        ));
    }
    Ok(BigFloat::from_f64(value, f64::MANTISSA_DIGITS, RoundingMode::Nearest).0)
}

pub fn to_integer<T: NumericProtocol + ?Sized>(value: &T) -> TowerResult<Integer> {
    if let Some(boxed) = value.as_boxed() {
        return match boxed {
            BoxedValue::Integer(v) => Ok(v.clone()),
            other => Err(TowerError::type_error(format!(
                "cannot convert {} to an integer",
                other.kind()
            ))),
        };
    }
    if let Some(word) = value.as_small_int() {
        return Ok(Integer::from(word));
    }
    value
        .as_index()
        .map(Integer::new)
        .ok_or_else(|| TowerError::type_error("cannot convert value to an integer"))
}

pub fn to_rational<T: NumericProtocol + ?Sized>(value: &T) -> TowerResult<Rational> {
    if let Some(boxed) = value.as_boxed() {
        return match boxed {
            BoxedValue::Integer(v) => Ok(Rational::from_integer(v.value().clone())),
            BoxedValue::Rational(v) => Ok(v.clone()),
            other => Err(TowerError::type_error(format!(
                "cannot convert {} to a rational",
                other.kind()
            ))),
        };
    }
    if let Some(index) = value.as_index() {
        return Ok(Rational::from_integer(index));
    }
    match value.as_ratio() {
        Some((num, den)) => Rational::new(num, den),
        None => Err(TowerError::type_error("cannot convert value to a rational")),
    }
}

/// Exact real value behind any non-complex numeric value.
fn real_source<T: NumericProtocol + ?Sized>(value: &T) -> TowerResult<Source> {
    if let Some(boxed) = value.as_boxed() {
        return match boxed {
            BoxedValue::Integer(v) => Ok(Source::Integer(v.value().clone())),
            BoxedValue::Rational(v) => Ok(Source::Ratio(v.as_big_rational().clone())),
            BoxedValue::Float(v) => Ok(Source::Dyadic(v.value().clone())),
            BoxedValue::Complex(_) => Err(TowerError::type_error(
                "cannot convert complex to a real float",
            )),
        };
    }
    if let Some(index) = value.as_index() {
        return Ok(Source::Integer(index));
    }
    if let Some((num, den)) = value.as_ratio() {
        return Ok(Source::Ratio(Rational::new(num, den)?.into_big_rational()));
    }
    if let Some(decimal) = value.as_decimal() {
        return decimal_to_rational(decimal).map(Source::Ratio);
    }
    if let Some(double) = value.as_f64() {
        return finite_f64(double).map(Source::Dyadic);
    }
    if value.as_complex().is_some() {
        return Err(TowerError::type_error(
            "cannot convert complex to a real float",
        ));
    }
    Err(TowerError::type_error("value is not a number"))
}

/// Precision for a `PRECISION_EXACT` request: the exact width of a dyadic
/// input, otherwise the default plus guard bits.
fn exact_precision(source: &Source, ctx: &Context) -> u32 {
    match source.exact_bits() {
        Some(bits) => {
            let bits = u32::try_from(bits).unwrap_or(MAX_PRECISION);
            bits.clamp(ctx.min_precision(), MAX_PRECISION)
        }
        None => ctx
            .precision()
            .saturating_add(GUARD_BITS)
            .min(MAX_PRECISION),
    }
}

fn round_source(source: &Source, requested: u32, ctx: &mut Context) -> TowerResult<Float> {
    let precision = match requested {
        PRECISION_EXACT => exact_precision(source, ctx),
        other => ctx.resolve_precision(other)?,
    };
    let rounding = ctx.rounding();
    let (value, ternary) = source.round(precision, rounding);
    let (value, ternary) = ctx.check(value, ternary)?;
    Ok(Float::from_parts(value, requested, rounding, ternary))
}

/// Converts to a Float.
///
/// `precision` is `0` for the context default, `1` to keep dyadic inputs
/// exact, or an explicit bit count. A Float input asked for `0` or `1` is
/// returned unchanged.
pub fn to_float<T: NumericProtocol + ?Sized>(
    value: &T,
    precision: u32,
    ctx: &mut Context,
) -> TowerResult<Float> {
    match value.as_boxed() {
        Some(BoxedValue::Float(f)) => reround(f, precision, ctx),
        _ => round_source(&real_source(value)?, precision, ctx),
    }
}

fn reround(value: &Float, precision: u32, ctx: &mut Context) -> TowerResult<Float> {
    if matches!(precision, PRECISION_DEFAULT | PRECISION_EXACT) || precision == value.precision() {
        return Ok(value.clone());
    }
    round_source(&Source::Dyadic(value.value().clone()), precision, ctx)
}

/// Converts to a Complex with independent component precisions.
pub fn to_complex<T: NumericProtocol + ?Sized>(
    value: &T,
    precision: (u32, u32),
    ctx: &mut Context,
) -> TowerResult<Complex> {
    let (re_prec, im_prec) = precision;
    match value.as_boxed() {
        Some(BoxedValue::Complex(c)) => {
            let re = reround(c.real(), re_prec, ctx)?;
            let im = reround(c.imag(), im_prec, ctx)?;
            return Ok(Complex::new(re, im));
        }
        Some(BoxedValue::Float(f)) => {
            let re = reround(f, re_prec, ctx)?;
            let im_prec = match im_prec {
                PRECISION_DEFAULT | PRECISION_EXACT => f.precision(),
                other => other,
            };
            return Ok(Complex::new(re, zero_float(im_prec, ctx)?));
        }
        _ => {}
    }
    if classify(value) == NumericKind::ComplexLike {
        let (re, im) = value
            .as_complex()
            .ok_or_else(|| TowerError::type_error("value is not a complex number"))?;
        let re = round_source(&Source::Dyadic(finite_f64(re)?), re_prec, ctx)?;
        let im = round_source(&Source::Dyadic(finite_f64(im)?), im_prec, ctx)?;
        return Ok(Complex::new(re, im));
    }
    let re = to_float(value, re_prec, ctx)?;
    let im_prec = match im_prec {
        PRECISION_EXACT => re.precision(),
        other => ctx.resolve_precision(other)?,
    };
    Ok(Complex::new(re, zero_float(im_prec, ctx)?))
}

fn zero_float(precision: u32, ctx: &Context) -> TowerResult<Float> {
    let precision = ctx.resolve_precision(precision)?;
    Ok(Float::from_parts(
        BigFloat::zero(precision),
        precision,
        ctx.rounding(),
        Ternary::Exact,
    ))
}

/// Converts to the smallest boxed kind that holds the value.
pub fn to_boxed<T: NumericProtocol + ?Sized>(value: &T, ctx: &mut Context) -> TowerResult<BoxedValue> {
    if let Some(boxed) = value.as_boxed() {
        return Ok(boxed.clone());
    }
    match classify(value) {
        NumericKind::IntegerLike => to_integer(value).map(BoxedValue::from),
        NumericKind::RationalLike => to_rational(value).map(BoxedValue::from),
        NumericKind::FloatLike => to_float(value, PRECISION_DEFAULT, ctx).map(BoxedValue::from),
        NumericKind::ComplexLike => {
            to_complex(value, (PRECISION_DEFAULT, PRECISION_DEFAULT), ctx).map(BoxedValue::from)
        }
        NumericKind::NotANumber => Err(TowerError::type_error("value is not a number")),
    }
}

/// Truncates a Float toward zero.
pub fn float_to_integer(value: &Float) -> TowerResult<Integer> {
    if value.value().is_nan() {
        return Err(TowerError::value("cannot convert NaN to integer"));
    }
    value
        .value()
        .to_integer(RoundingMode::TowardZero)
        .map(Integer::new)
        .ok_or_else(|| TowerError::overflow("cannot convert Infinity to integer"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;
    use crate::host::{Fraction, HostValue};

    #[test]
    fn test_integer_and_rational_coercion() {
        assert_eq!(to_integer(&5i64).unwrap(), Integer::from(5));
        assert_eq!(
            to_integer(&HostValue::Double(1.0)).unwrap_err().kind(),
            ErrorKind::TypeError
        );
        let q = to_rational(&HostValue::Fraction(Fraction::new(2, -4))).unwrap();
        assert_eq!((q.numer(), q.denom()), (&BigInt::from(-1), &BigInt::from(2)));
        assert_eq!(
            to_rational(&HostValue::Fraction(Fraction::new(1, 0)))
                .unwrap_err()
                .kind(),
            ErrorKind::ZeroDivisionError
        );
    }

    #[test]
    fn test_float_precision_resolution() {
        let mut ctx = Context::new();
        let f = to_float(&HostValue::Int(3), 0, &mut ctx).unwrap();
        assert_eq!(f.precision(), 53);
        assert_eq!(f.requested_precision(), 0);

        let f = to_float(&HostValue::Int(3), 100, &mut ctx).unwrap();
        assert_eq!(f.precision(), 100);

        // 3 × 2^40 needs two bits.
        let big = HostValue::BigInt(BigInt::from(3) << 40u32);
        assert_eq!(to_float(&big, PRECISION_EXACT, &mut ctx).unwrap().precision(), 2);

        let third = HostValue::Fraction(Fraction::new(1, 3));
        let f = to_float(&third, PRECISION_EXACT, &mut ctx).unwrap();
        assert_eq!(f.precision(), 53 + GUARD_BITS);
        assert!(!f.result_code().is_exact());
        assert!(ctx.flags().inexact);
    }

    #[test]
    fn test_non_finite_inputs_are_rejected() {
        let mut ctx = Context::new();
        for bad in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let err = to_float(&HostValue::Double(bad), 0, &mut ctx).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::ValueError);
        }
        let err = to_float(&HostValue::Decimal(Decimal::Nan), 0, &mut ctx).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValueError);
        let err = to_float(&HostValue::Str("1.0".into()), 0, &mut ctx).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TypeError);
    }

    #[test]
    fn test_decimal_is_exact_before_rounding() {
        let mut ctx = Context::new();
        let d = HostValue::Decimal(Decimal::new(125, -2));
        let f = to_float(&d, 0, &mut ctx).unwrap();
        assert_eq!(f.value().to_f64(), 1.25);
        assert!(f.result_code().is_exact());
    }

    #[test]
    fn test_complex_coercion() {
        let mut ctx = Context::new();
        let c = to_complex(&HostValue::NativeComplex { re: 1.5, im: -2.0 }, (0, 80), &mut ctx)
            .unwrap();
        assert_eq!(c.precision(), (53, 80));
        assert_eq!(c.imag().value().to_f64(), -2.0);
        let c = to_complex(&HostValue::Int(4), (0, 0), &mut ctx).unwrap();
        assert!(c.imag().is_zero());
    }

    #[test]
    fn test_float_truncation() {
        let mut ctx = Context::new();
        let f = to_float(&HostValue::Double(-2.75), 0, &mut ctx).unwrap();
        assert_eq!(float_to_integer(&f).unwrap(), Integer::from(-2));
        let inf = Float::exact(BigFloat::infinity(53, false));
        assert_eq!(
            float_to_integer(&inf).unwrap_err().kind(),
            ErrorKind::OverflowError
        );
    }
}
