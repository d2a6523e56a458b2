// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

//! Parsing of integers, rationals, floats and complex numbers from text.

use crate::approx::approximate;
use crate::context::{Context, GUARD_BITS, PRECISION_EXACT};
use crate::errors::{TowerError, TowerResult};
use crate::value::{BoxedValue, Complex, Float, Integer, Rational};
use mpt_backend::radix::{self, MAX_TEXT_EXPONENT};
use mpt_backend::{BigFloat, RoundingMode, Ternary, MAX_PRECISION};

/// Upper bound on the bits per digit of any supported base.
const BITS_PER_DIGIT: u64 = 6;

/// Parses an integer in `base`; `0` auto-detects `0b`, `0o` and `0x`.
pub fn parse_integer(s: &str, base: u32) -> TowerResult<Integer> {
    Ok(Integer::new(radix::parse_integer(s, base)?))
}

/// Parses `n/d`, a bare integer, or a decimal such as `1.25`.
///
/// The decimal form is read as a wide float and reduced to the simplest
/// fraction that rounds to it.
pub fn parse_rational(s: &str, base: u32) -> TowerResult<Rational> {
    let text = s.trim();
    if let Some((num, den)) = text.split_once('/') {
        let num = radix::parse_integer(num, base)?;
        let den = radix::parse_integer(den, base)?;
        return Rational::new(num, den);
    }
    if let Ok(value) = radix::parse_integer(text, base) {
        return Ok(Rational::from_integer(value));
    }
    let base = if base == 0 { 10 } else { base };
    let precision = wide_precision(text, base);
    let (value, _) = radix::parse_float(text, base, precision, RoundingMode::Nearest)?;
    match approximate(&Float::exact(value), None)? {
        BoxedValue::Integer(value) => Ok(Rational::from_integer(value.into_inner())),
        BoxedValue::Rational(value) => Ok(value),
        other => Err(TowerError::value(format!(
            "could not convert {s:?} to a rational, got {}",
            other.kind()
        ))),
    }
}

/// Parses a float in base 10, or base 16 when the text has a `0x` prefix.
pub fn parse_float(s: &str, precision: u32, ctx: &mut Context) -> TowerResult<Float> {
    parse_real(s, float_base(s), precision, ctx)
}

/// Parses a float in `base` (2 to 36); the exponent follows `@`.
pub fn parse_float_radix(s: &str, base: u32, precision: u32, ctx: &mut Context) -> TowerResult<Float> {
    parse_real(s, base, precision, ctx)
}

/// Parses `a+bj`, `bj` or `a`, optionally in parentheses.
pub fn parse_complex(s: &str, precision: (u32, u32), ctx: &mut Context) -> TowerResult<Complex> {
    let mut text = s.trim();
    if let Some(inner) = text.strip_prefix('(').and_then(|t| t.strip_suffix(')')) {
        text = inner.trim();
    }
    if text.is_empty() {
        return Err(TowerError::value(format!("could not convert {s:?} to complex")));
    }
    let (re_text, im_text) = match text.strip_suffix(['j', 'J']) {
        Some(body) => match split_point(body) {
            Some(i) => (&body[..i], Some(&body[i..])),
            None => ("0", Some(body)),
        },
        None => (text, None),
    };
    let (re_prec, im_prec) = precision;
    let re = parse_float(re_text, re_prec, ctx)?;
    let im = match im_text {
        Some(im) => {
            let im = match im {
                "" | "+" => "1".to_owned(),
                "-" => "-1".to_owned(),
                other => other.to_owned(),
            };
            parse_float(&im, im_prec, ctx)?
        }
        None => parse_float("0", im_prec, ctx)?,
    };
    Ok(Complex::new(re, im))
}

fn float_base(s: &str) -> u32 {
    let body = s.trim().trim_start_matches(['+', '-']);
    if body.starts_with("0x") || body.starts_with("0X") {
        16
    } else {
        10
    }
}

/// Index of the sign that starts the imaginary part, if any.
fn split_point(body: &str) -> Option<usize> {
    let hex = body.contains("0x") || body.contains("0X");
    let bytes = body.as_bytes();
    (1..bytes.len())
        .rev()
        .find(|&i| matches!(bytes[i], b'+' | b'-') && !is_exponent_marker(bytes[i - 1], hex))
}

fn is_exponent_marker(c: u8, hex: bool) -> bool {
    match c {
        b'p' | b'P' | b'@' => true,
        b'e' | b'E' => !hex,
        _ => false,
    }
}

fn parse_real(s: &str, base: u32, requested: u32, ctx: &mut Context) -> TowerResult<Float> {
    let rounding = ctx.rounding();
    let (value, ternary) = match requested {
        PRECISION_EXACT => parse_exact(s, base, ctx)?,
        other => {
            let precision = ctx.resolve_precision(other)?;
            radix::parse_float(s, base, precision, rounding)?
        }
    };
    let (value, ternary) = ctx.check(value, ternary)?;
    Ok(Float::from_parts(value, requested, rounding, ternary))
}

/// Keeps every bit of a dyadic input; anything else gets the default
/// precision plus guard bits.
fn parse_exact(s: &str, base: u32, ctx: &Context) -> TowerResult<(BigFloat, Ternary)> {
    let rounding = ctx.rounding();
    let (wide, ternary) = radix::parse_float(s, base, wide_precision(s, base), rounding)?;
    if ternary.is_exact() {
        let bits = u32::try_from(wide.significant_bits())
            .unwrap_or(MAX_PRECISION)
            .clamp(ctx.min_precision(), MAX_PRECISION);
        return Ok(wide.round_to(bits, rounding));
    }
    let precision = ctx.precision().saturating_add(GUARD_BITS).min(MAX_PRECISION);
    Ok(radix::parse_float(s, base, precision, rounding)?)
}

/// Precision that holds any dyadic value the text can spell exactly.
fn wide_precision(s: &str, base: u32) -> u32 {
    let digits = s.len() as u64;
    let scale = positive_exponent(s, base).min(MAX_TEXT_EXPONENT as u64);
    let bits = (digits + scale)
        .saturating_mul(BITS_PER_DIGIT)
        .saturating_add(64);
    u32::try_from(bits).unwrap_or(MAX_PRECISION).min(MAX_PRECISION)
}

/// Positive exponent in powers of `base`; binary exponents add no digits.
fn positive_exponent(s: &str, base: u32) -> u64 {
    let s = s.trim();
    let marker = if base == 10 { &['e', 'E', '@'][..] } else { &['@'][..] };
    if base == 16 && float_base(s) == 16 {
        return 0;
    }
    s.rfind(marker)
        .and_then(|i| s[i + 1..].trim().parse::<i64>().ok())
        .map_or(0, |e| e.max(0).unsigned_abs())
}
