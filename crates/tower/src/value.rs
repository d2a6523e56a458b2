// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

//! Boxed values: the four kinds of numbers the tower hands out.

use crate::context::PRECISION_DEFAULT;
use crate::errors::{TowerError, TowerResult};
use crate::hash;
use crate::text::format::{float_repr, rational_repr};
use mpt_backend::{BigFloat, FloatClass, RoundingMode, Ternary};
use num::BigRational;
use num_bigint::BigInt;
use num_traits::Zero;
use once_cell::unsync::OnceCell;
use std::borrow::Cow;
use std::cmp::Ordering;
use std::fmt;
use strum::Display;

/// Kind of a boxed value, ordered along the promotion lattice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display)]
pub enum ValueKind {
    Integer,
    Rational,
    Float,
    Complex,
}

/// Arbitrary-precision integer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Integer(BigInt);

impl Integer {
    pub fn new(value: BigInt) -> Self {
        Self(value)
    }

    pub fn value(&self) -> &BigInt {
        &self.0
    }

    pub(crate) fn value_mut(&mut self) -> &mut BigInt {
        &mut self.0
    }

    pub fn into_inner(self) -> BigInt {
        self.0
    }

    pub fn hash_value(&self) -> i64 {
        hash::hash_integer(&self.0)
    }
}

impl From<i64> for Integer {
    fn from(value: i64) -> Self {
        Self(BigInt::from(value))
    }
}

impl From<BigInt> for Integer {
    fn from(value: BigInt) -> Self {
        Self(value)
    }
}

/// Exact rational with a positive denominator, always in lowest terms.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Rational(BigRational);

impl Rational {
    /// Builds `num / den` in canonical form.
    pub fn new(num: BigInt, den: BigInt) -> TowerResult<Self> {
        if den.is_zero() {
            return Err(TowerError::zero_division("rational with a zero denominator"));
        }
        Ok(Self(BigRational::new(num, den)))
    }

    pub fn from_integer(value: BigInt) -> Self {
        Self(BigRational::from_integer(value))
    }

    /// Wraps a ratio produced by `num`'s checked constructors or arithmetic,
    /// which keep it reduced with a positive denominator.
    pub fn from_big_rational(value: BigRational) -> Self {
        Self(value)
    }

    pub fn numer(&self) -> &BigInt {
        self.0.numer()
    }

    pub fn denom(&self) -> &BigInt {
        self.0.denom()
    }

    pub fn as_big_rational(&self) -> &BigRational {
        &self.0
    }

    pub fn into_big_rational(self) -> BigRational {
        self.0
    }

    pub fn is_integer(&self) -> bool {
        self.0.is_integer()
    }

    pub fn hash_value(&self) -> i64 {
        hash::hash_rational(self.numer(), self.denom())
    }
}

/// Binary float with the metadata of the operation that produced it.
#[derive(Debug, Clone)]
pub struct Float {
    value: BigFloat,
    requested_precision: u32,
    rounding: RoundingMode,
    result_code: Ternary,
    hash: OnceCell<i64>,
}

impl Float {
    pub(crate) fn from_parts(
        value: BigFloat,
        requested_precision: u32,
        rounding: RoundingMode,
        result_code: Ternary,
    ) -> Self {
        Self {
            value,
            requested_precision,
            rounding,
            result_code,
            hash: OnceCell::new(),
        }
    }

    /// Wraps an exactly known backend value at its own precision.
    pub fn exact(value: BigFloat) -> Self {
        let precision = value.precision();
        Self::from_parts(value, precision, RoundingMode::Nearest, Ternary::Exact)
    }

    /// Same value, marked as following the context precision.
    pub(crate) fn following_context(self) -> Self {
        Self {
            requested_precision: PRECISION_DEFAULT,
            ..self
        }
    }

    /// Same metadata, new value.
    pub(crate) fn with_value(&self, value: BigFloat, result_code: Ternary) -> Self {
        Self::from_parts(value, self.requested_precision, self.rounding, result_code)
    }

    pub fn value(&self) -> &BigFloat {
        &self.value
    }

    pub fn precision(&self) -> u32 {
        self.value.precision()
    }

    /// Precision asked for at construction; `0` means "follow the context".
    pub fn requested_precision(&self) -> u32 {
        self.requested_precision
    }

    pub fn rounding(&self) -> RoundingMode {
        self.rounding
    }

    pub fn result_code(&self) -> Ternary {
        self.result_code
    }

    pub fn is_finite(&self) -> bool {
        self.value.is_finite()
    }

    pub fn is_zero(&self) -> bool {
        self.value.is_zero()
    }

    pub fn hash_value(&self) -> i64 {
        *self.hash.get_or_init(|| hash::hash_float(&self.value))
    }

    /// Exact value as a ratio of integers.
    pub fn to_exact_rational(&self) -> TowerResult<Rational> {
        match self.value.class() {
            FloatClass::Nan => Err(TowerError::value("cannot convert NaN to integer ratio")),
            FloatClass::Infinite => Err(TowerError::overflow(
                "cannot convert Infinity to integer ratio",
            )),
            _ => self
                .value
                .to_rational()
                .map(Rational::from_big_rational)
                .ok_or_else(|| TowerError::value("value is not finite")),
        }
    }
}

impl PartialEq for Float {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

/// Pair of floats with independent precisions.
#[derive(Debug, Clone, PartialEq)]
pub struct Complex {
    re: Float,
    im: Float,
}

impl Complex {
    pub fn new(re: Float, im: Float) -> Self {
        Self { re, im }
    }

    pub fn real(&self) -> &Float {
        &self.re
    }

    pub fn imag(&self) -> &Float {
        &self.im
    }

    pub fn precision(&self) -> (u32, u32) {
        (self.re.precision(), self.im.precision())
    }

    pub fn hash_value(&self) -> i64 {
        hash::hash_complex(self.re.hash_value(), self.im.hash_value())
    }
}

/// Host-visible number.
#[derive(Debug, Clone)]
pub enum BoxedValue {
    Integer(Integer),
    Rational(Rational),
    Float(Float),
    Complex(Complex),
}

impl BoxedValue {
    pub fn kind(&self) -> ValueKind {
        match self {
            BoxedValue::Integer(_) => ValueKind::Integer,
            BoxedValue::Rational(_) => ValueKind::Rational,
            BoxedValue::Float(_) => ValueKind::Float,
            BoxedValue::Complex(_) => ValueKind::Complex,
        }
    }

    /// Numeric hash; equal values of different kinds hash equally.
    pub fn hash_value(&self) -> i64 {
        match self {
            BoxedValue::Integer(v) => v.hash_value(),
            BoxedValue::Rational(v) => v.hash_value(),
            BoxedValue::Float(v) => v.hash_value(),
            BoxedValue::Complex(v) => v.hash_value(),
        }
    }

    pub fn as_integer(&self) -> Option<&Integer> {
        match self {
            BoxedValue::Integer(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_rational(&self) -> Option<&Rational> {
        match self {
            BoxedValue::Rational(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<&Float> {
        match self {
            BoxedValue::Float(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_complex(&self) -> Option<&Complex> {
        match self {
            BoxedValue::Complex(v) => Some(v),
            _ => None,
        }
    }

    /// Real and imaginary parts as exact or float values.
    pub(crate) fn real_parts(&self) -> (Real<'_>, Real<'_>) {
        match self {
            BoxedValue::Integer(v) => (
                Real::Exact(Cow::Owned(BigRational::from_integer(v.value().clone()))),
                Real::zero(),
            ),
            BoxedValue::Rational(v) => (Real::Exact(Cow::Borrowed(v.as_big_rational())), Real::zero()),
            BoxedValue::Float(v) => (Real::Float(Cow::Borrowed(v.value())), Real::zero()),
            BoxedValue::Complex(v) => (
                Real::Float(Cow::Borrowed(v.real().value())),
                Real::Float(Cow::Borrowed(v.imag().value())),
            ),
        }
    }
}

impl PartialEq for BoxedValue {
    fn eq(&self, other: &Self) -> bool {
        let (ar, ai) = self.real_parts();
        let (br, bi) = other.real_parts();
        ar.partial_cmp(&br) == Some(Ordering::Equal) && ai.partial_cmp(&bi) == Some(Ordering::Equal)
    }
}

impl From<Integer> for BoxedValue {
    fn from(value: Integer) -> Self {
        BoxedValue::Integer(value)
    }
}

impl From<Rational> for BoxedValue {
    fn from(value: Rational) -> Self {
        BoxedValue::Rational(value)
    }
}

impl From<Float> for BoxedValue {
    fn from(value: Float) -> Self {
        BoxedValue::Float(value)
    }
}

impl From<Complex> for BoxedValue {
    fn from(value: Complex) -> Self {
        BoxedValue::Complex(value)
    }
}

/// A real number as seen by comparisons: exact, or a backend float that may
/// be NaN or infinite.
#[derive(Debug, Clone)]
pub(crate) enum Real<'a> {
    Exact(Cow<'a, BigRational>),
    Float(Cow<'a, BigFloat>),
}

impl Real<'_> {
    pub fn zero() -> Self {
        Real::Exact(Cow::Owned(BigRational::zero()))
    }

    /// Comparison by exact value; `None` when a NaN is involved.
    pub fn partial_cmp(&self, other: &Real<'_>) -> Option<Ordering> {
        match (self, other) {
            (Real::Exact(a), Real::Exact(b)) => Some(a.as_ref().cmp(b.as_ref())),
            (Real::Float(a), Real::Exact(b)) => a.partial_cmp_rational(b),
            (Real::Exact(a), Real::Float(b)) => b.partial_cmp_rational(a).map(Ordering::reverse),
            (Real::Float(a), Real::Float(b)) => a.partial_cmp_value(b),
        }
    }
}

impl fmt::Display for Integer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for Rational {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&rational_repr(self.numer(), self.denom()))
    }
}

impl fmt::Display for Float {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&float_repr(&self.value))
    }
}

impl fmt::Display for Complex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let im = float_repr(self.im.value());
        let sign = if im.starts_with('-') || im.starts_with('+') {
            ""
        } else {
            "+"
        };
        write!(f, "({}{}{}j)", float_repr(self.re.value()), sign, im)
    }
}

impl fmt::Display for BoxedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoxedValue::Integer(v) => v.fmt(f),
            BoxedValue::Rational(v) => v.fmt(f),
            BoxedValue::Float(v) => v.fmt(f),
            BoxedValue::Complex(v) => v.fmt(f),
        }
    }
}
