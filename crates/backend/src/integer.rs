// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

//! Integer primitives: machine-word fast paths, floor division and modular
//! arithmetic.

use crate::errors::{BackendError, BackendResult};
use crate::round::RoundingMode;
use num_bigint::{BigInt, BigUint};
use num_integer::Integer;
use num_traits::{One, Signed, Zero};

/// `value += word` in place.
pub fn add_word(value: &mut BigInt, word: i64) {
    *value += word;
}

/// `value -= word` in place.
pub fn sub_word(value: &mut BigInt, word: i64) {
    *value -= word;
}

/// `word - value`, used when the machine word is the left operand.
pub fn word_sub(word: i64, value: &BigInt) -> BigInt {
    BigInt::from(word) - value
}

/// `value *= word` in place.
pub fn mul_word(value: &mut BigInt, word: i64) {
    *value *= word;
}

/// `floor(value / word)`.
pub fn floor_div_word(value: &BigInt, word: i64) -> BackendResult<BigInt> {
    if word == 0 {
        return Err(BackendError::DivisionByZero);
    }
    Ok(value.div_floor(&BigInt::from(word)))
}

/// `value mod word` with the sign of `word`.
pub fn mod_word(value: &BigInt, word: i64) -> BackendResult<i64> {
    if word == 0 {
        return Err(BackendError::DivisionByZero);
    }
    let r = value.mod_floor(&BigInt::from(word));
    // |r| < |word| so the remainder always fits a word.
    i64::try_from(&r).map_err(|_| BackendError::invalid_operation("word remainder out of range"))
}

/// Floor quotient and remainder; the remainder takes the sign of `b`.
pub fn floor_divmod(a: &BigInt, b: &BigInt) -> BackendResult<(BigInt, BigInt)> {
    if b.is_zero() {
        return Err(BackendError::DivisionByZero);
    }
    Ok(a.div_mod_floor(b))
}

pub fn floor_div(a: &BigInt, b: &BigInt) -> BackendResult<BigInt> {
    floor_divmod(a, b).map(|(q, _)| q)
}

pub fn floor_mod(a: &BigInt, b: &BigInt) -> BackendResult<BigInt> {
    if b.is_zero() {
        return Err(BackendError::DivisionByZero);
    }
    Ok(a.mod_floor(b))
}

/// `base^exp` for a non-negative exponent.
pub fn pow(base: &BigInt, exp: u64) -> BigInt {
    num_traits::Pow::pow(base, exp)
}

/// Multiplicative inverse of `a` modulo `m`, in `[0, |m|)`.
pub fn mod_inverse(a: &BigInt, m: &BigInt) -> Option<BigInt> {
    let m = m.abs();
    if m.is_zero() {
        return None;
    }
    let egcd = a.mod_floor(&m).extended_gcd(&m);
    if !egcd.gcd.is_one() {
        return None;
    }
    Some(egcd.x.mod_floor(&m))
}

/// `base^exp mod modulus` with floor semantics: a non-zero result has the
/// sign of `modulus`.
pub fn pow_mod(base: &BigInt, exp: &BigInt, modulus: &BigInt) -> BackendResult<BigInt> {
    if modulus.is_zero() {
        return Err(BackendError::invalid_operation("pow() 3rd argument cannot be 0"));
    }
    let m = modulus.abs();
    let base = if exp.is_negative() {
        mod_inverse(base, &m).ok_or_else(|| {
            BackendError::invalid_operation("base is not invertible for the given modulus")
        })?
    } else {
        base.mod_floor(&m)
    };
    let r = base.modpow(&exp.abs(), &m);
    if modulus.is_negative() && !r.is_zero() {
        Ok(r - m)
    } else {
        Ok(r)
    }
}

/// Rounds the quotient `num / den` of two magnitudes to an integer.
///
/// `negative` is the sign of the exact quotient and only matters for the
/// directed modes.
pub fn round_quotient(num: &BigUint, den: &BigUint, negative: bool, rnd: RoundingMode) -> BackendResult<BigUint> {
    if den.is_zero() {
        return Err(BackendError::DivisionByZero);
    }
    let (mut q, r) = num.div_rem(den);
    if r.is_zero() {
        return Ok(q);
    }
    let twice: BigUint = &r << 1u32;
    let round_bit = &twice >= den;
    let sticky = if round_bit { &twice > den } else { true };
    if rnd.rounds_away(negative, round_bit, sticky, q.bit(0)) {
        q += 1u32;
    }
    Ok(q)
}
