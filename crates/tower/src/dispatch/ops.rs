// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

//! Operator strategies.
//!
//! Each binary operator is a zero-sized type implementing [`Operator`]; the
//! dispatch engine picks the common kind of the operands and calls the
//! matching method. Methods receive operands that are already coerced.

use super::Tower;
use crate::context::{GUARD_BITS, PRECISION_DEFAULT};
use crate::errors::{TowerError, TowerResult};
use crate::value::{BoxedValue, Complex, Float, Integer, Rational};
use mpt_backend::integer as backend_int;
use mpt_backend::{arith, BigFloat, RoundingMode, Ternary, MAX_PRECISION, MIN_PRECISION};
use num::BigRational;
use num_bigint::BigInt;
use num_traits::{Signed, ToPrimitive, Zero};

/// A binary operator, one method per kind of the promotion lattice.
pub trait Operator {
    /// Symbol used in error messages.
    const SYMBOL: &'static str;

    fn integer(tower: &mut Tower, a: &BigInt, b: &BigInt) -> TowerResult<BoxedValue>;

    fn rational(tower: &mut Tower, a: &BigRational, b: &BigRational) -> TowerResult<BoxedValue>;

    /// Both operands are floats; the result is rounded to `precision`.
    fn float(tower: &mut Tower, a: &Float, b: &Float, precision: u32) -> TowerResult<BoxedValue>;

    /// Both operands are complex; components round to `precision`.
    fn complex(
        tower: &mut Tower,
        a: &Complex,
        b: &Complex,
        precision: (u32, u32),
    ) -> TowerResult<BoxedValue>;

    /// `Integer ⊕ word` without boxing the word. `None` means no fast path.
    fn integer_word(_tower: &mut Tower, _a: &Integer, _b: i64) -> Option<TowerResult<Integer>> {
        None
    }

    /// `word ⊕ Integer` without boxing the word.
    fn word_integer(_tower: &mut Tower, _a: i64, _b: &Integer) -> Option<TowerResult<Integer>> {
        None
    }

    /// Float left operand with an exact integer right operand.
    fn float_integer(
        _tower: &mut Tower,
        _a: &Float,
        _b: &BigInt,
    ) -> Option<TowerResult<BoxedValue>> {
        None
    }

    /// Complex left operand with an exact integer right operand.
    fn complex_integer(
        _tower: &mut Tower,
        _a: &Complex,
        _b: &BigInt,
    ) -> Option<TowerResult<BoxedValue>> {
        None
    }
}

pub struct Add;
pub struct Sub;
pub struct Mul;
pub struct TrueDiv;
pub struct FloorDiv;
pub struct Mod;
pub struct Pow;

/// Boxes an exact result into a recycled cell.
fn integer(tower: &mut Tower, value: BigInt) -> TowerResult<BoxedValue> {
    let cell = tower.cache_mut().checkout_integer();
    Ok(BoxedValue::Integer(cell.write(&value)))
}

fn rational(tower: &mut Tower, value: BigRational) -> TowerResult<BoxedValue> {
    let cell = tower.cache_mut().checkout_rational();
    Ok(BoxedValue::Rational(cell.write_ratio(&value)))
}

/// Requested precision of a float result: it follows the context when every
/// operand does.
fn requested(a: &Float, b: &Float, precision: u32) -> u32 {
    if a.requested_precision() == PRECISION_DEFAULT && b.requested_precision() == PRECISION_DEFAULT {
        PRECISION_DEFAULT
    } else {
        precision
    }
}

fn requested_pair(a: &Complex, b: &Complex, precision: (u32, u32)) -> (u32, u32) {
    (
        requested(a.real(), b.real(), precision.0),
        requested(a.imag(), b.imag(), precision.1),
    )
}

/// Copies `a` into a recycled cell and applies `op` in place.
fn word_in_place(
    tower: &mut Tower,
    a: &Integer,
    op: impl FnOnce(&mut BigInt),
) -> Option<TowerResult<Integer>> {
    let mut out = tower.cache_mut().checkout_integer().write(a.value());
    op(out.value_mut());
    Some(Ok(out))
}

fn integer_zero_division() -> TowerError {
    TowerError::zero_division("integer division or modulo by zero")
}

/// Exact product of two floats.
fn exact_mul(a: &BigFloat, b: &BigFloat) -> BigFloat {
    let precision = (a.precision() + b.precision()).min(MAX_PRECISION);
    arith::mul(a, b, precision, RoundingMode::Nearest).0
}

fn two() -> BigFloat {
    BigFloat::from_i64(2, MIN_PRECISION, RoundingMode::Nearest).0
}

/// `(a + bi)(c + di)` with exact partial products and one rounding per
/// component.
fn complex_mul_raw(
    (a, b): (&BigFloat, &BigFloat),
    (c, d): (&BigFloat, &BigFloat),
    precision: (u32, u32),
    rnd: RoundingMode,
) -> ((BigFloat, Ternary), (BigFloat, Ternary)) {
    let re = arith::sub(&exact_mul(a, c), &exact_mul(b, d), precision.0, rnd);
    let im = arith::add(&exact_mul(a, d), &exact_mul(b, c), precision.1, rnd);
    (re, im)
}

/// `(a + bi) / (c + di)`; the divisor must be non-zero.
fn complex_div_raw(
    (a, b): (&BigFloat, &BigFloat),
    (c, d): (&BigFloat, &BigFloat),
    precision: (u32, u32),
    rnd: RoundingMode,
) -> ((BigFloat, Ternary), (BigFloat, Ternary)) {
    let work = (precision.0.max(precision.1) + 2 * GUARD_BITS).min(MAX_PRECISION);
    let near = RoundingMode::Nearest;
    let den = arith::add(&exact_mul(c, c), &exact_mul(d, d), work, near).0;
    let re_num = arith::add(&exact_mul(a, c), &exact_mul(b, d), work, near).0;
    let im_num = arith::sub(&exact_mul(b, c), &exact_mul(a, d), work, near).0;
    (
        arith::div(&re_num, &den, precision.0, rnd),
        arith::div(&im_num, &den, precision.1, rnd),
    )
}

fn complex_is_zero(c: &Complex) -> bool {
    c.real().is_zero() && c.imag().is_zero()
}

impl Operator for Add {
    const SYMBOL: &'static str = "+";

    fn integer(tower: &mut Tower, a: &BigInt, b: &BigInt) -> TowerResult<BoxedValue> {
        integer(tower, a + b)
    }

    fn rational(tower: &mut Tower, a: &BigRational, b: &BigRational) -> TowerResult<BoxedValue> {
        rational(tower, a + b)
    }

    fn float(tower: &mut Tower, a: &Float, b: &Float, precision: u32) -> TowerResult<BoxedValue> {
        let result = arith::add(a.value(), b.value(), precision, tower.rounding());
        tower.finish(result, requested(a, b, precision)).map(BoxedValue::from)
    }

    fn complex(
        tower: &mut Tower,
        a: &Complex,
        b: &Complex,
        precision: (u32, u32),
    ) -> TowerResult<BoxedValue> {
        let rnd = tower.rounding();
        let re = arith::add(a.real().value(), b.real().value(), precision.0, rnd);
        let im = arith::add(a.imag().value(), b.imag().value(), precision.1, rnd);
        tower
            .finish_complex(re, im, requested_pair(a, b, precision))
            .map(BoxedValue::from)
    }

    fn integer_word(tower: &mut Tower, a: &Integer, b: i64) -> Option<TowerResult<Integer>> {
        word_in_place(tower, a, |v| backend_int::add_word(v, b))
    }

    fn word_integer(tower: &mut Tower, a: i64, b: &Integer) -> Option<TowerResult<Integer>> {
        word_in_place(tower, b, |v| backend_int::add_word(v, a))
    }
}

impl Operator for Sub {
    const SYMBOL: &'static str = "-";

    fn integer(tower: &mut Tower, a: &BigInt, b: &BigInt) -> TowerResult<BoxedValue> {
        integer(tower, a - b)
    }

    fn rational(tower: &mut Tower, a: &BigRational, b: &BigRational) -> TowerResult<BoxedValue> {
        rational(tower, a - b)
    }

    fn float(tower: &mut Tower, a: &Float, b: &Float, precision: u32) -> TowerResult<BoxedValue> {
        let result = arith::sub(a.value(), b.value(), precision, tower.rounding());
        tower.finish(result, requested(a, b, precision)).map(BoxedValue::from)
    }

    fn complex(
        tower: &mut Tower,
        a: &Complex,
        b: &Complex,
        precision: (u32, u32),
    ) -> TowerResult<BoxedValue> {
        let rnd = tower.rounding();
        let re = arith::sub(a.real().value(), b.real().value(), precision.0, rnd);
        let im = arith::sub(a.imag().value(), b.imag().value(), precision.1, rnd);
        tower
            .finish_complex(re, im, requested_pair(a, b, precision))
            .map(BoxedValue::from)
    }

    fn integer_word(tower: &mut Tower, a: &Integer, b: i64) -> Option<TowerResult<Integer>> {
        word_in_place(tower, a, |v| backend_int::sub_word(v, b))
    }

    fn word_integer(_tower: &mut Tower, a: i64, b: &Integer) -> Option<TowerResult<Integer>> {
        Some(Ok(Integer::new(backend_int::word_sub(a, b.value()))))
    }
}

impl Operator for Mul {
    const SYMBOL: &'static str = "*";

    fn integer(tower: &mut Tower, a: &BigInt, b: &BigInt) -> TowerResult<BoxedValue> {
        integer(tower, a * b)
    }

    fn rational(tower: &mut Tower, a: &BigRational, b: &BigRational) -> TowerResult<BoxedValue> {
        rational(tower, a * b)
    }

    fn float(tower: &mut Tower, a: &Float, b: &Float, precision: u32) -> TowerResult<BoxedValue> {
        let result = arith::mul(a.value(), b.value(), precision, tower.rounding());
        tower.finish(result, requested(a, b, precision)).map(BoxedValue::from)
    }

    fn complex(
        tower: &mut Tower,
        a: &Complex,
        b: &Complex,
        precision: (u32, u32),
    ) -> TowerResult<BoxedValue> {
        let (re, im) = complex_mul_raw(
            (a.real().value(), a.imag().value()),
            (b.real().value(), b.imag().value()),
            precision,
            tower.rounding(),
        );
        tower
            .finish_complex(re, im, requested_pair(a, b, precision))
            .map(BoxedValue::from)
    }

    fn integer_word(tower: &mut Tower, a: &Integer, b: i64) -> Option<TowerResult<Integer>> {
        word_in_place(tower, a, |v| backend_int::mul_word(v, b))
    }

    fn word_integer(tower: &mut Tower, a: i64, b: &Integer) -> Option<TowerResult<Integer>> {
        word_in_place(tower, b, |v| backend_int::mul_word(v, a))
    }
}

impl Operator for TrueDiv {
    const SYMBOL: &'static str = "/";

    /// Never exact: two integers divide into a Float at the default precision.
    fn integer(tower: &mut Tower, a: &BigInt, b: &BigInt) -> TowerResult<BoxedValue> {
        if b.is_zero() {
            return Err(TowerError::zero_division("division by zero"));
        }
        let precision = tower.context().precision();
        let result = BigFloat::from_ratio(a, b, precision, tower.rounding())?;
        tower.finish(result, PRECISION_DEFAULT).map(BoxedValue::from)
    }

    fn rational(tower: &mut Tower, a: &BigRational, b: &BigRational) -> TowerResult<BoxedValue> {
        if b.is_zero() {
            return Err(TowerError::zero_division("division by zero"));
        }
        rational(tower, a / b)
    }

    fn float(tower: &mut Tower, a: &Float, b: &Float, precision: u32) -> TowerResult<BoxedValue> {
        if b.is_zero() {
            return Err(tower.divide_by_zero("float division by zero"));
        }
        let result = arith::div(a.value(), b.value(), precision, tower.rounding());
        tower.finish(result, requested(a, b, precision)).map(BoxedValue::from)
    }

    fn complex(
        tower: &mut Tower,
        a: &Complex,
        b: &Complex,
        precision: (u32, u32),
    ) -> TowerResult<BoxedValue> {
        if complex_is_zero(b) {
            return Err(tower.divide_by_zero("complex division by zero"));
        }
        let (re, im) = complex_div_raw(
            (a.real().value(), a.imag().value()),
            (b.real().value(), b.imag().value()),
            precision,
            tower.rounding(),
        );
        tower
            .finish_complex(re, im, requested_pair(a, b, precision))
            .map(BoxedValue::from)
    }
}

impl Operator for FloorDiv {
    const SYMBOL: &'static str = "//";

    fn integer(tower: &mut Tower, a: &BigInt, b: &BigInt) -> TowerResult<BoxedValue> {
        if b.is_zero() {
            return Err(integer_zero_division());
        }
        integer(tower, backend_int::floor_div(a, b)?)
    }

    fn rational(tower: &mut Tower, a: &BigRational, b: &BigRational) -> TowerResult<BoxedValue> {
        if b.is_zero() {
            return Err(integer_zero_division());
        }
        integer(tower, (a / b).floor().to_integer())
    }

    fn float(tower: &mut Tower, a: &Float, b: &Float, precision: u32) -> TowerResult<BoxedValue> {
        if b.is_zero() {
            return Err(tower.divide_by_zero("float floor division by zero"));
        }
        let result = arith::floor_div(a.value(), b.value(), precision, tower.rounding())?;
        tower.finish(result, requested(a, b, precision)).map(BoxedValue::from)
    }

    fn complex(
        _tower: &mut Tower,
        _a: &Complex,
        _b: &Complex,
        _precision: (u32, u32),
    ) -> TowerResult<BoxedValue> {
        Err(TowerError::type_error("can't take floor of complex number"))
    }

    fn integer_word(_tower: &mut Tower, a: &Integer, b: i64) -> Option<TowerResult<Integer>> {
        if b == 0 {
            return Some(Err(integer_zero_division()));
        }
        Some(
            backend_int::floor_div_word(a.value(), b)
                .map(Integer::new)
                .map_err(TowerError::from),
        )
    }
}

impl Operator for Mod {
    const SYMBOL: &'static str = "%";

    fn integer(tower: &mut Tower, a: &BigInt, b: &BigInt) -> TowerResult<BoxedValue> {
        if b.is_zero() {
            return Err(integer_zero_division());
        }
        integer(tower, backend_int::floor_mod(a, b)?)
    }

    fn rational(tower: &mut Tower, a: &BigRational, b: &BigRational) -> TowerResult<BoxedValue> {
        if b.is_zero() {
            return Err(integer_zero_division());
        }
        let quotient = (a / b).floor();
        rational(tower, a - b * quotient)
    }

    fn float(tower: &mut Tower, a: &Float, b: &Float, precision: u32) -> TowerResult<BoxedValue> {
        if b.is_zero() {
            return Err(tower.divide_by_zero("float modulo by zero"));
        }
        let result = arith::modulo(a.value(), b.value(), precision, tower.rounding())?;
        tower.finish(result, requested(a, b, precision)).map(BoxedValue::from)
    }

    fn complex(
        _tower: &mut Tower,
        _a: &Complex,
        _b: &Complex,
        _precision: (u32, u32),
    ) -> TowerResult<BoxedValue> {
        Err(TowerError::type_error("can't mod complex numbers"))
    }

    fn integer_word(_tower: &mut Tower, a: &Integer, b: i64) -> Option<TowerResult<Integer>> {
        if b == 0 {
            return Some(Err(integer_zero_division()));
        }
        Some(
            backend_int::mod_word(a.value(), b)
                .map(Integer::from)
                .map_err(TowerError::from),
        )
    }
}

fn exponent_u64(n: &BigInt) -> TowerResult<u64> {
    n.abs()
        .to_u64()
        .ok_or_else(|| TowerError::overflow(format!("exponent {n} too large")))
}

/// `x ** y` for floats at `precision`; the result records `requested`.
fn float_pow(
    tower: &mut Tower,
    x: &BigFloat,
    y: &BigFloat,
    precision: u32,
    requested: u32,
) -> TowerResult<Float> {
    let rnd = tower.rounding();
    if y.is_finite() && y.is_integer() {
        if let Some(n) = y.to_integer(RoundingMode::TowardZero) {
            return float_pow_int(tower, x, &n, precision, requested);
        }
    }
    if x.is_zero() && y.is_negative_value() {
        return Err(tower.divide_by_zero("0.0 cannot be raised to a negative power"));
    }
    if x.is_negative_value() {
        return Err(tower.invalid("negative number cannot be raised to a fractional power"));
    }
    let result = arith::pow_real(x, y, precision, rnd)?;
    tower.finish(result, requested)
}

/// Integer powers of any size; results beyond the exponent range saturate
/// and raise overflow or underflow.
fn float_pow_int(
    tower: &mut Tower,
    x: &BigFloat,
    n: &BigInt,
    precision: u32,
    requested: u32,
) -> TowerResult<Float> {
    if x.is_zero() && n.is_negative() {
        return Err(tower.divide_by_zero("0.0 cannot be raised to a negative power"));
    }
    let result = arith::pow_int(x, n, precision, tower.rounding())?;
    tower.finish(result, requested)
}

fn rational_pow(tower: &mut Tower, base: &BigRational, n: &BigInt) -> TowerResult<Rational> {
    if base.is_zero() && n.is_negative() {
        return Err(TowerError::zero_division(
            "0 cannot be raised to a negative power",
        ));
    }
    let k = exponent_u64(n)?;
    let num = backend_int::pow(base.numer(), k);
    let den = backend_int::pow(base.denom(), k);
    let cell = tower.cache_mut().checkout_rational();
    if n.is_negative() {
        cell.write(&den, &num)
    } else {
        cell.write(&num, &den)
    }
}

/// Binary powering of a complex value at a widened precision.
fn complex_pow_int(
    tower: &mut Tower,
    base: &Complex,
    n: &BigInt,
    precision: (u32, u32),
    requested: (u32, u32),
) -> TowerResult<Complex> {
    if complex_is_zero(base) && n.is_negative() {
        return Err(tower.divide_by_zero("0.0 cannot be raised to a negative power"));
    }
    let exponent_bits = u32::try_from(n.bits()).unwrap_or(u32::MAX);
    let work = (precision.0.max(precision.1) + GUARD_BITS + 2 * (u32::BITS - exponent_bits.leading_zeros()))
        .min(MAX_PRECISION);
    let near = RoundingMode::Nearest;
    let mut acc = (
        BigFloat::from_i64(1, work, near).0,
        BigFloat::zero(work),
    );
    let mut square = (
        base.real().value().round_to(work, near).0,
        base.imag().value().round_to(work, near).0,
    );
    let magnitude = n.magnitude();
    let finite_base = square.0.is_finite() && square.1.is_finite();
    let too_wide =
        |pair: &(BigFloat, BigFloat)| finite_base && !(pair.0.is_finite() && pair.1.is_finite());
    for bit in 0..magnitude.bits() {
        if magnitude.bit(bit) {
            let ((re, _), (im, _)) = complex_mul_raw((&acc.0, &acc.1), (&square.0, &square.1), (work, work), near);
            acc = (re, im);
        }
        if bit + 1 < magnitude.bits() {
            let ((re, _), (im, _)) =
                complex_mul_raw((&square.0, &square.1), (&square.0, &square.1), (work, work), near);
            square = (re, im);
        }
        if too_wide(&acc) || too_wide(&square) {
            return Err(TowerError::overflow("complex power exponent out of range"));
        }
    }
    let rnd = tower.rounding();
    let (re, im) = if n.is_negative() {
        let one = BigFloat::from_i64(1, MIN_PRECISION, near).0;
        let zero = BigFloat::zero(MIN_PRECISION);
        complex_div_raw((&one, &zero), (&acc.0, &acc.1), precision, rnd)
    } else {
        (acc.0.round_to(precision.0, rnd), acc.1.round_to(precision.1, rnd))
    };
    tower.finish_complex(re, im, requested)
}

impl Operator for Pow {
    const SYMBOL: &'static str = "**";

    /// A negative exponent produces a Float at the default precision.
    fn integer(tower: &mut Tower, a: &BigInt, b: &BigInt) -> TowerResult<BoxedValue> {
        if !b.is_negative() {
            let k = exponent_u64(b)?;
            return integer(tower, backend_int::pow(a, k));
        }
        if a.is_zero() {
            return Err(TowerError::zero_division(
                "0 cannot be raised to a negative power",
            ));
        }
        let width = u32::try_from(a.bits())
            .unwrap_or(MAX_PRECISION)
            .clamp(MIN_PRECISION, MAX_PRECISION);
        let (base, _) = BigFloat::from_bigint(a, width, RoundingMode::Nearest);
        let precision = tower.context().precision();
        let result = arith::pow_int(&base, b, precision, tower.rounding())?;
        tower.finish(result, PRECISION_DEFAULT).map(BoxedValue::from)
    }

    fn rational(tower: &mut Tower, a: &BigRational, b: &BigRational) -> TowerResult<BoxedValue> {
        if b.is_integer() {
            return rational_pow(tower, a, b.numer()).map(BoxedValue::from);
        }
        let precision = tower.context().precision();
        let rnd = tower.rounding();
        let x = tower.finish(BigFloat::from_rational(a, precision, rnd), PRECISION_DEFAULT)?;
        let y = tower.finish(BigFloat::from_rational(b, precision, rnd), PRECISION_DEFAULT)?;
        float_pow(tower, x.value(), y.value(), precision, PRECISION_DEFAULT).map(BoxedValue::from)
    }

    fn float(tower: &mut Tower, a: &Float, b: &Float, precision: u32) -> TowerResult<BoxedValue> {
        let requested = requested(a, b, precision);
        float_pow(tower, a.value(), b.value(), precision, requested).map(BoxedValue::from)
    }

    fn complex(
        tower: &mut Tower,
        a: &Complex,
        b: &Complex,
        precision: (u32, u32),
    ) -> TowerResult<BoxedValue> {
        let exponent = b.real().value();
        if b.imag().is_zero() && exponent.is_finite() && exponent.is_integer() {
            if let Some(n) = exponent.to_integer(RoundingMode::TowardZero) {
                let requested = requested_pair(a, b, precision);
                return complex_pow_int(tower, a, &n, precision, requested).map(BoxedValue::from);
            }
        }
        Err(TowerError::value(
            "complex power with a non-integral exponent is not supported",
        ))
    }

    fn float_integer(
        tower: &mut Tower,
        a: &Float,
        b: &BigInt,
    ) -> Option<TowerResult<BoxedValue>> {
        let precision = a.precision();
        let requested = requested(a, a, precision);
        Some(float_pow_int(tower, a.value(), b, precision, requested).map(BoxedValue::from))
    }

    fn complex_integer(
        tower: &mut Tower,
        a: &Complex,
        b: &BigInt,
    ) -> Option<TowerResult<BoxedValue>> {
        let precision = a.precision();
        let requested = requested_pair(a, a, precision);
        Some(complex_pow_int(tower, a, b, precision, requested).map(BoxedValue::from))
    }
}

/// `|z|` rounded once; an infinite component gives infinity even beside NaN.
pub(crate) fn complex_modulus(tower: &mut Tower, z: &Complex) -> TowerResult<Float> {
    let (pre, pim) = z.precision();
    let precision = pre.max(pim);
    let result = arith::hypot(z.real().value(), z.imag().value(), precision, tower.rounding());
    tower.finish(result, requested(z.real(), z.imag(), precision))
}

/// Principal square root, `re ≥ 0` and `im` carrying the sign of the input's
/// imaginary part.
pub(crate) fn complex_sqrt(tower: &mut Tower, z: &Complex) -> TowerResult<Complex> {
    let precision = z.precision();
    let (a, b) = (z.real().value(), z.imag().value());
    if !a.is_finite() || !b.is_finite() {
        return Err(TowerError::value(
            "complex square root of a non-finite value",
        ));
    }
    let rnd = tower.rounding();
    if a.is_zero() && b.is_zero() {
        let re = (BigFloat::zero(precision.0), Ternary::Exact);
        let im = (b.round_to(precision.1, rnd).0, Ternary::Exact);
        return tower.finish_complex(re, im, requested_pair(z, z, precision));
    }
    let work = (precision.0.max(precision.1) + 2 * GUARD_BITS).min(MAX_PRECISION);
    let near = RoundingMode::Nearest;
    let modulus = arith::hypot(a, b, work, near).0;
    let half = arith::div(&arith::add(&modulus, &a.abs(), work, near).0, &two(), work, near).0;
    let s = arith::sqrt(&half, work, near).0;
    let t = arith::div(&b.abs(), &arith::mul(&s, &two(), work, near).0, work, near).0;
    let (re, im) = if a.is_negative_value() {
        let im = if b.is_sign_negative() { s.neg() } else { s };
        (t, im)
    } else {
        let t = if b.is_sign_negative() { t.neg() } else { t };
        (s, t)
    };
    tower.finish_complex(
        re.round_to(precision.0, rnd),
        im.round_to(precision.1, rnd),
        requested_pair(z, z, precision),
    )
}
