// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

//! Numeric hashing modulo the Mersenne prime `2^61 - 1`.
//!
//! Equal values hash equally whatever their kind: the hash of `p/q` is
//! `p · q^-1 mod M`, and a dyadic float reduces the same way because
//! `2^61 ≡ 1 (mod M)`.

use mpt_backend::{BigFloat, FloatClass};
use num_bigint::{BigInt, BigUint};
use num_traits::{Signed, ToPrimitive};

pub const HASH_BITS: u32 = 61;
pub const HASH_MODULUS: u64 = (1 << HASH_BITS) - 1;
pub const HASH_INF: i64 = 314_159;
pub const HASH_NAN: i64 = 0;
pub const HASH_IMAG: i64 = 1_000_003;

/// Maps the reserved value `-1` to `-2`.
fn finish(negative: bool, residue: u64) -> i64 {
    let h = residue as i64;
    let h = if negative { -h } else { h };
    if h == -1 {
        -2
    } else {
        h
    }
}

fn residue(value: &BigUint) -> u64 {
    (value % HASH_MODULUS).to_u64().unwrap_or(0)
}

fn mul_mod(a: u64, b: u64) -> u64 {
    ((u128::from(a) * u128::from(b)) % u128::from(HASH_MODULUS)) as u64
}

fn pow_mod(mut base: u64, mut exp: u64) -> u64 {
    let mut result = 1u64;
    base %= HASH_MODULUS;
    while exp > 0 {
        if exp & 1 == 1 {
            result = mul_mod(result, base);
        }
        base = mul_mod(base, base);
        exp >>= 1;
    }
    result
}

pub fn hash_integer(value: &BigInt) -> i64 {
    finish(value.is_negative(), residue(value.magnitude()))
}

/// Hash of `num / den` for a positive denominator.
pub fn hash_rational(num: &BigInt, den: &BigInt) -> i64 {
    let den_residue = residue(den.magnitude());
    if den_residue == 0 {
        return if num.is_negative() { -HASH_INF } else { HASH_INF };
    }
    let inverse = pow_mod(den_residue, HASH_MODULUS - 2);
    finish(
        num.is_negative(),
        mul_mod(residue(num.magnitude()), inverse),
    )
}

pub fn hash_float(value: &BigFloat) -> i64 {
    match value.class() {
        FloatClass::Nan => HASH_NAN,
        FloatClass::Infinite if value.is_sign_negative() => -HASH_INF,
        FloatClass::Infinite => HASH_INF,
        FloatClass::Zero => 0,
        FloatClass::Regular => {
            let (m, e2) = value.dyadic();
            // 2^e2 ≡ 2^(e2 mod 61)
            let shift = e2.rem_euclid(i64::from(HASH_BITS)) as u64;
            let h = mul_mod(residue(&m), pow_mod(2, shift));
            finish(value.is_sign_negative(), h)
        }
    }
}

pub fn hash_complex(real: i64, imag: i64) -> i64 {
    let h = real.wrapping_add(HASH_IMAG.wrapping_mul(imag));
    if h == -1 {
        -2
    } else {
        h
    }
}
