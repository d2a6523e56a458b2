// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

//! Conversion between numbers and digit strings in bases 2 through 62.
//!
//! Digits are `0-9`, then `A-Z`, then `a-z`. Up to base 36 letters are case
//! insensitive; above it upper case letters are the digits 10 to 35 and lower
//! case letters 36 to 61.
//!
//! Integer text is handled here on `num-bigint` magnitudes; float text is
//! validated here and converted by MPFR.

use crate::errors::{BackendError, BackendResult};
use crate::float::{magnitude_of, BigFloat};
use crate::round::{RoundingMode, Ternary};
use num_bigint::{BigInt, BigUint, Sign};
use num_traits::Zero;

pub const MIN_BASE: u32 = 2;
pub const MAX_BASE: u32 = 62;

/// Scaling exponents beyond this magnitude are rejected when parsing.
pub const MAX_TEXT_EXPONENT: i64 = 1 << 24;

const DIGITS: &[u8; 62] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

pub fn check_base(base: u32) -> BackendResult<u32> {
    if (MIN_BASE..=MAX_BASE).contains(&base) {
        Ok(base)
    } else {
        Err(BackendError::InvalidBase {
            base,
            max: MAX_BASE,
        })
    }
}

/// Value of one digit character in `base`, if it is a digit there.
pub fn digit_value(c: char, base: u32) -> Option<u32> {
    let value = match c {
        '0'..='9' => c as u32 - '0' as u32,
        'A'..='Z' => c as u32 - 'A' as u32 + 10,
        'a'..='z' if base <= 36 => c as u32 - 'a' as u32 + 10,
        'a'..='z' => c as u32 - 'a' as u32 + 36,
        _ => return None,
    };
    (value < base).then_some(value)
}

/// Splits an optional leading sign.
fn split_sign(s: &str) -> (bool, &str) {
    if let Some(rest) = s.strip_prefix('-') {
        (true, rest)
    } else {
        (false, s.strip_prefix('+').unwrap_or(s))
    }
}

/// Strips a `0b`/`0o`/`0x` prefix and returns the implied base.
fn detect_prefix(s: &str) -> (u32, &str) {
    let lower = s.get(..2).map(str::to_ascii_lowercase);
    match lower.as_deref() {
        Some("0b") => (2, &s[2..]),
        Some("0o") => (8, &s[2..]),
        Some("0x") => (16, &s[2..]),
        _ => (10, s),
    }
}

/// Accumulates a run of digits with `_` separators.
///
/// Returns the number of digits read.
fn accumulate(digits: &str, base: u32, magnitude: &mut BigUint) -> BackendResult<usize> {
    let mut count = 0;
    let mut previous_separator = true;
    for c in digits.chars() {
        if c == '_' {
            if previous_separator {
                return Err(BackendError::invalid_digits(format!(
                    "misplaced separator in {digits:?}"
                )));
            }
            previous_separator = true;
            continue;
        }
        let value = digit_value(c, base).ok_or_else(|| {
            BackendError::invalid_digits(format!("invalid digit {c:?} for base {base}"))
        })?;
        *magnitude *= base;
        *magnitude += value;
        count += 1;
        previous_separator = false;
    }
    if previous_separator && count > 0 {
        return Err(BackendError::invalid_digits(format!(
            "trailing separator in {digits:?}"
        )));
    }
    Ok(count)
}

/// Parses an integer. `base == 0` detects `0b`, `0o` and `0x` prefixes and
/// otherwise reads decimal.
pub fn parse_integer(s: &str, base: u32) -> BackendResult<BigInt> {
    let (negative, body) = split_sign(s.trim());
    let (base, body) = if base == 0 {
        detect_prefix(body)
    } else {
        let base = check_base(base)?;
        match (base, detect_prefix(body)) {
            (2, (2, rest)) | (8, (8, rest)) | (16, (16, rest)) => (base, rest),
            _ => (base, body),
        }
    };
    let mut magnitude = BigUint::zero();
    if accumulate(body, base, &mut magnitude)? == 0 {
        return Err(BackendError::invalid_digits(format!(
            "no digits in {s:?}"
        )));
    }
    let sign = if negative { Sign::Minus } else { Sign::Plus };
    Ok(BigInt::from_biguint(sign, magnitude))
}

/// Digits of a magnitude in `base`, most significant first.
pub fn format_magnitude(value: &BigUint, base: u32, uppercase: bool) -> BackendResult<String> {
    let base = check_base(base)?;
    let digits = value.to_radix_be(base);
    Ok(digits
        .into_iter()
        .map(|d| {
            let c = DIGITS[d as usize] as char;
            if base <= 36 && !uppercase {
                c.to_ascii_lowercase()
            } else {
                c
            }
        })
        .collect())
}

/// Signed integer text in `base`; letters are lower case up to base 36.
pub fn format_integer(value: &BigInt, base: u32) -> BackendResult<String> {
    let digits = format_magnitude(value.magnitude(), base, false)?;
    Ok(match value.sign() {
        Sign::Minus => format!("-{digits}"),
        _ => digits,
    })
}

/// Parses a float in `base`.
///
/// Accepted forms are `[sign]digits[.digits][exponent]`. In base 10 the
/// exponent is introduced by `e` or `@`; in base 16 a `0x` prefix enables a
/// binary exponent introduced by `p`; other bases use `@` with a decimal
/// exponent counted in powers of `base`. `inf` and `nan` are rejected.
///
/// The text is validated here and handed to MPFR in its canonical
/// `digits.digits@exponent` form, which it rounds correctly.
pub fn parse_float(s: &str, base: u32, precision: u32, rnd: RoundingMode) -> BackendResult<(BigFloat, Ternary)> {
    let base = check_base(base)?;
    if base > 36 {
        return Err(BackendError::InvalidBase { base, max: 36 });
    }
    let text = s.trim();
    let (negative, body) = split_sign(text);
    let lowered = body.to_ascii_lowercase();
    if matches!(lowered.as_str(), "inf" | "infinity" | "nan" | "@inf@" | "@nan@") {
        return Err(BackendError::invalid_digits(format!(
            "{s:?} is not a finite number"
        )));
    }

    let (hex_binary, body) = match (base, detect_prefix(body)) {
        (16, (16, rest)) => (true, rest),
        _ => (false, body),
    };

    let markers: &[char] = if hex_binary {
        &['p', 'P']
    } else if base == 10 {
        &['e', 'E', '@']
    } else {
        &['@']
    };
    let (mantissa_text, exponent_text) = match body.find(markers) {
        Some(i) => (&body[..i], Some(&body[i + 1..])),
        None => (body, None),
    };

    let (int_part, frac_part) = match mantissa_text.split_once('.') {
        Some((i, f)) => (i, f),
        None => (mantissa_text, ""),
    };
    let mut magnitude = BigUint::zero();
    let int_digits = accumulate(int_part, base, &mut magnitude)?;
    let frac_digits = accumulate(frac_part, base, &mut magnitude)?;
    if int_digits + frac_digits == 0 {
        return Err(BackendError::invalid_digits(format!("no digits in {s:?}")));
    }

    let exponent = match exponent_text {
        Some(e) => {
            let value = parse_integer(e.trim(), 10)?;
            i64::try_from(&value)
                .ok()
                .filter(|e| e.unsigned_abs() <= MAX_TEXT_EXPONENT as u64)
                .ok_or_else(|| {
                    BackendError::exponent_overflow(format!("exponent {value} out of range"))
                })?
        }
        None => 0,
    };

    if magnitude.is_zero() {
        return Ok((BigFloat::signed_zero(precision, negative), Ternary::Exact));
    }

    if hex_binary {
        // Each hex digit after the point is worth four bits.
        let e2 = exponent - 4 * frac_digits as i64;
        let sign = if negative { Sign::Minus } else { Sign::Plus };
        let (value, ternary) =
            BigFloat::from_bigint(&BigInt::from_biguint(sign, magnitude), precision, rnd);
        return Ok(value.scaled_by_power_of_two(e2, ternary, rnd));
    }

    let digits: String = mantissa_text.chars().filter(|&c| c != '_').collect();
    let canonical = format!("{}{digits}@{exponent}", if negative { "-" } else { "" });
    let parsed = rug::Float::parse_radix(&canonical, base as i32)
        .map_err(|err| BackendError::invalid_digits(format!("{s:?}: {err}")))?;
    Ok(BigFloat::rounded(precision, parsed, rnd))
}

/// Number of `base` digits that always identify a value of `precision` bits.
pub fn digits_for_precision(precision: u32, base: u32) -> usize {
    let per_digit = f64::from(base).log2();
    1 + (f64::from(precision) / per_digit).ceil() as usize
}

/// Significant digits of a finite value.
///
/// Returns `(negative, digits, exponent)` such that the value is
/// approximately `0.d1d2…dn × base^exponent`. `n == 0` selects
/// [`digits_for_precision`]. Zero yields `n` zeros and exponent 0.
pub fn to_digits(x: &BigFloat, base: u32, n: usize, rnd: RoundingMode) -> BackendResult<(bool, String, i64)> {
    let base = check_base(base)?;
    if !x.is_finite() {
        return Err(BackendError::NotFinite);
    }
    let n = if n == 0 {
        digits_for_precision(x.precision(), base)
    } else {
        n
    };
    let negative = x.is_sign_negative();
    if x.is_zero() {
        return Ok((negative, "0".repeat(n), 0));
    }
    let (_, mut digits, exponent) =
        x.as_rug()
            .to_sign_string_exp_round(base as i32, Some(n), rnd.into());
    if base <= 36 {
        digits.make_ascii_lowercase();
    }
    let exponent = exponent.ok_or(BackendError::NotFinite)?;
    Ok((negative, digits, i64::from(exponent)))
}

/// Digits of `|x| × 10^frac_digits` rounded to an integer, for fixed notation.
///
/// The rounding direction follows the sign of `x`.
pub fn to_fixed(x: &BigFloat, frac_digits: usize, rnd: RoundingMode) -> BackendResult<BigUint> {
    if !x.is_finite() {
        return Err(BackendError::NotFinite);
    }
    if x.is_zero() {
        return Ok(BigUint::zero());
    }
    let frac_digits = u32::try_from(frac_digits)
        .map_err(|_| BackendError::exponent_overflow("too many fraction digits"))?;
    let factor = rug::Integer::from(rug::Integer::u_pow_u(10, frac_digits));
    // The product is exact at the sum of both widths.
    let width = BigFloat::check_precision(
        u64::from(x.precision()) + u64::from(factor.significant_bits()),
    )?;
    let scaled = rug::Float::with_val(width, x.as_rug() * &factor);
    let (value, _) = scaled
        .to_integer_round(rnd.into())
        .ok_or(BackendError::NotFinite)?;
    Ok(magnitude_of(&value))
}
