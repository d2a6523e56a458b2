// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

//! Host values and the capability protocol the classifier inspects.

use crate::value::BoxedValue;
use num_bigint::BigInt;
use num_traits::ToPrimitive;

/// Decimal number of an external decimal type: `coefficient × 10^exponent`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decimal {
    Finite { coefficient: BigInt, exponent: i64 },
    Infinite { negative: bool },
    Nan,
}

impl Decimal {
    pub fn new(coefficient: impl Into<BigInt>, exponent: i64) -> Self {
        Decimal::Finite {
            coefficient: coefficient.into(),
            exponent,
        }
    }

    pub fn is_finite(&self) -> bool {
        matches!(self, Decimal::Finite { .. })
    }
}

/// Value of an external fraction type; not necessarily in lowest terms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fraction {
    pub numerator: BigInt,
    pub denominator: BigInt,
}

impl Fraction {
    pub fn new(numerator: impl Into<BigInt>, denominator: impl Into<BigInt>) -> Self {
        Self {
            numerator: numerator.into(),
            denominator: denominator.into(),
        }
    }
}

/// Values the host language may pass to any entry point.
#[derive(Debug, Clone)]
pub enum HostValue {
    Int(i64),
    BigInt(BigInt),
    Bool(bool),
    Double(f64),
    NativeComplex { re: f64, im: f64 },
    Decimal(Decimal),
    Fraction(Fraction),
    Str(String),
    None,
    Boxed(BoxedValue),
}

impl From<BoxedValue> for HostValue {
    fn from(value: BoxedValue) -> Self {
        HostValue::Boxed(value)
    }
}

/// Structural capabilities of a value, in the order the classifier asks
/// for them.
pub trait NumericProtocol {
    /// Already a tower value
    fn as_boxed(&self) -> Option<&BoxedValue> {
        None
    }

    /// Native machine word, eligible for the small-integer fast path
    fn as_small_int(&self) -> Option<i64> {
        None
    }

    /// Exact integer value (`__index__`-like)
    fn as_index(&self) -> Option<BigInt> {
        None
    }

    /// Exact ratio `(numerator, denominator)`
    fn as_ratio(&self) -> Option<(BigInt, BigInt)> {
        None
    }

    fn as_decimal(&self) -> Option<&Decimal> {
        None
    }

    fn as_f64(&self) -> Option<f64> {
        None
    }

    /// Native complex as `(re, im)`
    fn as_complex(&self) -> Option<(f64, f64)> {
        None
    }
}

impl NumericProtocol for HostValue {
    fn as_boxed(&self) -> Option<&BoxedValue> {
        match self {
            HostValue::Boxed(v) => Some(v),
            _ => None,
        }
    }

    fn as_small_int(&self) -> Option<i64> {
        match self {
            HostValue::Int(v) => Some(*v),
            HostValue::Bool(b) => Some(i64::from(*b)),
            HostValue::BigInt(v) => v.to_i64(),
            _ => None,
        }
    }

    fn as_index(&self) -> Option<BigInt> {
        match self {
            HostValue::Int(v) => Some(BigInt::from(*v)),
            HostValue::Bool(b) => Some(BigInt::from(i64::from(*b))),
            HostValue::BigInt(v) => Some(v.clone()),
            _ => None,
        }
    }

    fn as_ratio(&self) -> Option<(BigInt, BigInt)> {
        match self {
            HostValue::Fraction(f) => Some((f.numerator.clone(), f.denominator.clone())),
            _ => None,
        }
    }

    fn as_decimal(&self) -> Option<&Decimal> {
        match self {
            HostValue::Decimal(d) => Some(d),
            _ => None,
        }
    }

    fn as_f64(&self) -> Option<f64> {
        match self {
            HostValue::Double(v) => Some(*v),
            _ => None,
        }
    }

    fn as_complex(&self) -> Option<(f64, f64)> {
        match self {
            HostValue::NativeComplex { re, im } => Some((*re, *im)),
            _ => None,
        }
    }
}

impl NumericProtocol for BoxedValue {
    fn as_boxed(&self) -> Option<&BoxedValue> {
        Some(self)
    }
}

impl NumericProtocol for i64 {
    fn as_small_int(&self) -> Option<i64> {
        Some(*self)
    }

    fn as_index(&self) -> Option<BigInt> {
        Some(BigInt::from(*self))
    }
}

impl NumericProtocol for f64 {
    fn as_f64(&self) -> Option<f64> {
        Some(*self)
    }
}

impl NumericProtocol for BigInt {
    fn as_small_int(&self) -> Option<i64> {
        self.to_i64()
    }

    fn as_index(&self) -> Option<BigInt> {
        Some(self.clone())
    }
}

impl<T: NumericProtocol + ?Sized> NumericProtocol for &T {
    fn as_boxed(&self) -> Option<&BoxedValue> {
        (**self).as_boxed()
    }

    fn as_small_int(&self) -> Option<i64> {
        (**self).as_small_int()
    }

    fn as_index(&self) -> Option<BigInt> {
        (**self).as_index()
    }

    fn as_ratio(&self) -> Option<(BigInt, BigInt)> {
        (**self).as_ratio()
    }

    fn as_decimal(&self) -> Option<&Decimal> {
        (**self).as_decimal()
    }

    fn as_f64(&self) -> Option<f64> {
        (**self).as_f64()
    }

    fn as_complex(&self) -> Option<(f64, f64)> {
        (**self).as_complex()
    }
}
