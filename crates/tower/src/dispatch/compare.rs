// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

//! Rich comparison by exact value across kinds.

use super::Tower;
use crate::classify::{classify, NumericKind};
use crate::coerce::decimal_to_rational;
use crate::errors::{TowerError, TowerResult};
use crate::host::{Decimal, NumericProtocol};
use crate::value::{Rational, Real};
use mpt_backend::{BigFloat, RoundingMode};
use num::BigRational;
use std::borrow::Cow;
use std::cmp::Ordering;
use strum::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum CompareOp {
    #[strum(serialize = "<")]
    Lt,
    #[strum(serialize = "<=")]
    Le,
    #[strum(serialize = "==")]
    Eq,
    #[strum(serialize = "!=")]
    Ne,
    #[strum(serialize = ">")]
    Gt,
    #[strum(serialize = ">=")]
    Ge,
}

impl CompareOp {
    fn is_ordering(self) -> bool {
        !matches!(self, CompareOp::Eq | CompareOp::Ne)
    }

    /// Result for a pair whose order is `ordering`; `None` is unordered (NaN).
    fn holds(self, ordering: Option<Ordering>) -> bool {
        match (self, ordering) {
            (CompareOp::Ne, None) => true,
            (_, None) => false,
            (CompareOp::Lt, Some(o)) => o == Ordering::Less,
            (CompareOp::Le, Some(o)) => o != Ordering::Greater,
            (CompareOp::Eq, Some(o)) => o == Ordering::Equal,
            (CompareOp::Ne, Some(o)) => o != Ordering::Equal,
            (CompareOp::Gt, Some(o)) => o == Ordering::Greater,
            (CompareOp::Ge, Some(o)) => o != Ordering::Less,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Bool(bool),
    NotImplemented,
}

fn native(value: f64) -> Real<'static> {
    Real::Float(Cow::Owned(
        BigFloat::from_f64(value, f64::MANTISSA_DIGITS, RoundingMode::Nearest).0,
    ))
}

/// Real and imaginary parts of any numeric value, exactly.
fn parts<T: NumericProtocol + ?Sized>(value: &T) -> TowerResult<(Real<'_>, Real<'_>)> {
    if let Some(boxed) = value.as_boxed() {
        return Ok(boxed.real_parts());
    }
    if let Some(index) = value.as_index() {
        let exact = BigRational::from_integer(index);
        return Ok((Real::Exact(Cow::Owned(exact)), Real::zero()));
    }
    if let Some((num, den)) = value.as_ratio() {
        let exact = Rational::new(num, den)?.into_big_rational();
        return Ok((Real::Exact(Cow::Owned(exact)), Real::zero()));
    }
    if let Some(decimal) = value.as_decimal() {
        let re = match decimal {
            Decimal::Finite { .. } => Real::Exact(Cow::Owned(decimal_to_rational(decimal)?)),
            Decimal::Infinite { negative } => Real::Float(Cow::Owned(BigFloat::infinity(
                f64::MANTISSA_DIGITS,
                *negative,
            ))),
            Decimal::Nan => Real::Float(Cow::Owned(BigFloat::nan(f64::MANTISSA_DIGITS))),
        };
        return Ok((re, Real::zero()));
    }
    if let Some(double) = value.as_f64() {
        return Ok((native(double), Real::zero()));
    }
    if let Some((re, im)) = value.as_complex() {
        return Ok((native(re), native(im)));
    }
    Err(TowerError::type_error("value is not a number"))
}

impl Tower {
    /// Compares two values. Ordering a Complex is a TypeError; equality is
    /// allowed for every kind.
    pub fn compare<A, B>(&self, op: CompareOp, a: &A, b: &B) -> TowerResult<Comparison>
    where
        A: NumericProtocol + ?Sized,
        B: NumericProtocol + ?Sized,
    {
        let (ka, kb) = (classify(a), classify(b));
        if !ka.is_numeric() || !kb.is_numeric() {
            return Ok(Comparison::NotImplemented);
        }
        if op.is_ordering() && (ka == NumericKind::ComplexLike || kb == NumericKind::ComplexLike) {
            return Err(TowerError::type_error(format!(
                "'{op}' not supported between complex numbers"
            )));
        }
        let (ar, ai) = parts(a)?;
        let (br, bi) = parts(b)?;
        let real = ar.partial_cmp(&br);
        let ordering = match op {
            CompareOp::Eq | CompareOp::Ne => {
                let imag = ai.partial_cmp(&bi);
                match (real, imag) {
                    (Some(Ordering::Equal), Some(Ordering::Equal)) => Some(Ordering::Equal),
                    (None, _) | (_, None) => None,
                    _ => Some(Ordering::Less),
                }
            }
            _ => real,
        };
        Ok(Comparison::Bool(op.holds(ordering)))
    }
}
