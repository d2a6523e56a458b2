// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

//! # Dispatch
//!
//! The hot path behind every operator: classify both operands, coerce them
//! to their common kind on the promotion lattice, call the backend through
//! an [`Operator`] strategy and box the result.
//!
//! A [`Tower`] owns the [`Context`] and the [`ValueCache`] it works with. It
//! is deliberately neither `Send` nor `Sync`: one tower belongs to one
//! thread.

mod compare;
pub mod ops;

pub use compare::{CompareOp, Comparison};
pub use ops::Operator;

use crate::cache::ValueCache;
use crate::classify::{classify, NumericKind};
use crate::coerce::{to_boxed, to_complex, to_float, to_integer, to_rational};
use crate::context::{Context, Flag, PRECISION_DEFAULT};
use crate::errors::{TowerError, TowerResult};
use crate::host::NumericProtocol;
use crate::value::{BoxedValue, Complex, Float, Integer, Rational};
use mpt_backend::integer as backend_int;
use mpt_backend::{arith, BigFloat, RoundingMode, Ternary};
use mpt_config::TowerConfig;
use num_bigint::BigInt;
use num_traits::{Signed, Zero};
use std::borrow::Cow;
use std::marker::PhantomData;
use std::rc::Rc;
use strum::Display;
use tracing::trace;

/// Binary operators reachable through [`Tower::binary_op`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum BinaryOp {
    #[strum(serialize = "+")]
    Add,
    #[strum(serialize = "-")]
    Sub,
    #[strum(serialize = "*")]
    Mul,
    #[strum(serialize = "/")]
    TrueDiv,
    #[strum(serialize = "//")]
    FloorDiv,
    #[strum(serialize = "%")]
    Mod,
    #[strum(serialize = "**")]
    Pow,
}

/// Outcome of an operator-protocol call.
#[derive(Debug, Clone, PartialEq)]
pub enum Dispatched {
    Value(BoxedValue),
    /// Neither operand is numeric; the host should try the reflected operation.
    NotImplemented,
}

impl Dispatched {
    pub fn is_not_implemented(&self) -> bool {
        matches!(self, Dispatched::NotImplemented)
    }
}

/// Context, cache and the operations that use them.
#[derive(Debug, Default)]
pub struct Tower {
    context: Context,
    cache: ValueCache,
    _not_send: PhantomData<Rc<()>>,
}

impl Tower {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_context(context: Context) -> Self {
        Self {
            context,
            cache: ValueCache::default(),
            _not_send: PhantomData,
        }
    }

    pub fn from_config(config: &TowerConfig) -> TowerResult<Self> {
        Ok(Self {
            context: Context::from_config(config)?,
            cache: ValueCache::new(config.cache_size, config.max_cached_limbs),
            _not_send: PhantomData,
        })
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut Context {
        &mut self.context
    }

    pub fn cache(&self) -> &ValueCache {
        &self.cache
    }

    pub fn cache_mut(&mut self) -> &mut ValueCache {
        &mut self.cache
    }

    pub(crate) fn rounding(&self) -> RoundingMode {
        self.context.rounding()
    }

    /// Applies the exponent range and flags to a rounded result and boxes it.
    pub(crate) fn finish(
        &mut self,
        (value, ternary): (BigFloat, Ternary),
        requested: u32,
    ) -> TowerResult<Float> {
        let rounding = self.context.rounding();
        let (value, ternary) = self.context.check(value, ternary)?;
        Ok(Float::from_parts(value, requested, rounding, ternary))
    }

    pub(crate) fn finish_complex(
        &mut self,
        re: (BigFloat, Ternary),
        im: (BigFloat, Ternary),
        requested: (u32, u32),
    ) -> TowerResult<Complex> {
        let re = self.finish(re, requested.0)?;
        let im = self.finish(im, requested.1)?;
        Ok(Complex::new(re, im))
    }

    /// Raises `divide_by_zero` and builds the error to return.
    pub(crate) fn divide_by_zero(&mut self, message: &str) -> TowerError {
        match self.context.raise(Flag::DivideByZero) {
            Err(trapped) => trapped,
            Ok(()) => TowerError::zero_division(message),
        }
    }

    /// Raises `invalid` and builds the error to return.
    pub(crate) fn invalid(&mut self, message: &str) -> TowerError {
        match self.context.raise(Flag::Invalid) {
            Err(trapped) => trapped,
            Ok(()) => TowerError::value(message),
        }
    }

    /// Operator-protocol entry: non-numeric operands give
    /// [`Dispatched::NotImplemented`].
    pub fn binary_op<A, B>(&mut self, op: BinaryOp, a: &A, b: &B) -> TowerResult<Dispatched>
    where
        A: NumericProtocol + ?Sized,
        B: NumericProtocol + ?Sized,
    {
        match op {
            BinaryOp::Add => self.apply::<ops::Add, A, B>(a, b),
            BinaryOp::Sub => self.apply::<ops::Sub, A, B>(a, b),
            BinaryOp::Mul => self.apply::<ops::Mul, A, B>(a, b),
            BinaryOp::TrueDiv => self.apply::<ops::TrueDiv, A, B>(a, b),
            BinaryOp::FloorDiv => self.apply::<ops::FloorDiv, A, B>(a, b),
            BinaryOp::Mod => self.apply::<ops::Mod, A, B>(a, b),
            BinaryOp::Pow => self.apply::<ops::Pow, A, B>(a, b),
        }
    }

    pub fn add<A, B>(&mut self, a: &A, b: &B) -> TowerResult<BoxedValue>
    where
        A: NumericProtocol + ?Sized,
        B: NumericProtocol + ?Sized,
    {
        self.named::<ops::Add, A, B>(a, b)
    }

    pub fn sub<A, B>(&mut self, a: &A, b: &B) -> TowerResult<BoxedValue>
    where
        A: NumericProtocol + ?Sized,
        B: NumericProtocol + ?Sized,
    {
        self.named::<ops::Sub, A, B>(a, b)
    }

    pub fn mul<A, B>(&mut self, a: &A, b: &B) -> TowerResult<BoxedValue>
    where
        A: NumericProtocol + ?Sized,
        B: NumericProtocol + ?Sized,
    {
        self.named::<ops::Mul, A, B>(a, b)
    }

    pub fn true_div<A, B>(&mut self, a: &A, b: &B) -> TowerResult<BoxedValue>
    where
        A: NumericProtocol + ?Sized,
        B: NumericProtocol + ?Sized,
    {
        self.named::<ops::TrueDiv, A, B>(a, b)
    }

    pub fn floor_div<A, B>(&mut self, a: &A, b: &B) -> TowerResult<BoxedValue>
    where
        A: NumericProtocol + ?Sized,
        B: NumericProtocol + ?Sized,
    {
        self.named::<ops::FloorDiv, A, B>(a, b)
    }

    pub fn modulo<A, B>(&mut self, a: &A, b: &B) -> TowerResult<BoxedValue>
    where
        A: NumericProtocol + ?Sized,
        B: NumericProtocol + ?Sized,
    {
        self.named::<ops::Mod, A, B>(a, b)
    }

    pub fn pow<A, B>(&mut self, a: &A, b: &B) -> TowerResult<BoxedValue>
    where
        A: NumericProtocol + ?Sized,
        B: NumericProtocol + ?Sized,
    {
        self.named::<ops::Pow, A, B>(a, b)
    }

    /// `(a // b, a % b)`.
    pub fn divmod<A, B>(&mut self, a: &A, b: &B) -> TowerResult<(BoxedValue, BoxedValue)>
    where
        A: NumericProtocol + ?Sized,
        B: NumericProtocol + ?Sized,
    {
        let quotient = self.floor_div(a, b)?;
        let remainder = self.modulo(a, b)?;
        Ok((quotient, remainder))
    }

    /// `base ** exp mod modulus` over integers only.
    pub fn pow_mod<A, B, C>(&mut self, base: &A, exp: &B, modulus: &C) -> TowerResult<Integer>
    where
        A: NumericProtocol + ?Sized,
        B: NumericProtocol + ?Sized,
        C: NumericProtocol + ?Sized,
    {
        let all_integers = [classify(base), classify(exp), classify(modulus)]
            .iter()
            .all(|kind| *kind == NumericKind::IntegerLike);
        if !all_integers {
            return Err(TowerError::type_error(
                "pow() 3rd argument not allowed unless all arguments are integers",
            ));
        }
        let (base, exp, modulus) = (to_integer(base)?, to_integer(exp)?, to_integer(modulus)?);
        if modulus.value().is_zero() {
            return Err(TowerError::value("pow() 3rd argument cannot be 0"));
        }
        let result = backend_int::pow_mod(base.value(), exp.value(), modulus.value())?;
        Ok(Integer::new(result))
    }

    pub fn neg<T: NumericProtocol + ?Sized>(&mut self, value: &T) -> TowerResult<BoxedValue> {
        Ok(match to_boxed(value, &mut self.context)? {
            BoxedValue::Integer(v) => BoxedValue::Integer(Integer::new(-v.into_inner())),
            BoxedValue::Rational(v) => {
                BoxedValue::Rational(Rational::from_big_rational(-v.into_big_rational()))
            }
            BoxedValue::Float(v) => BoxedValue::Float(negated(&v)),
            BoxedValue::Complex(v) => {
                BoxedValue::Complex(Complex::new(negated(v.real()), negated(v.imag())))
            }
        })
    }

    /// Unary plus: a Float that follows the context is re-rounded to the
    /// current default precision.
    pub fn pos<T: NumericProtocol + ?Sized>(&mut self, value: &T) -> TowerResult<BoxedValue> {
        Ok(match to_boxed(value, &mut self.context)? {
            BoxedValue::Float(v) => BoxedValue::Float(self.follow_context(&v)?),
            BoxedValue::Complex(v) => {
                let re = self.follow_context(v.real())?;
                let im = self.follow_context(v.imag())?;
                BoxedValue::Complex(Complex::new(re, im))
            }
            other => other,
        })
    }

    /// Absolute value; a Complex yields its modulus as a Float.
    pub fn abs<T: NumericProtocol + ?Sized>(&mut self, value: &T) -> TowerResult<BoxedValue> {
        Ok(match to_boxed(value, &mut self.context)? {
            BoxedValue::Integer(v) => BoxedValue::Integer(Integer::new(v.value().abs())),
            BoxedValue::Rational(v) => {
                BoxedValue::Rational(Rational::from_big_rational(v.as_big_rational().abs()))
            }
            BoxedValue::Float(v) if v.value().is_sign_negative() => BoxedValue::Float(negated(&v)),
            BoxedValue::Float(v) => BoxedValue::Float(v),
            BoxedValue::Complex(v) => BoxedValue::Float(ops::complex_modulus(self, &v)?),
        })
    }

    /// Square root. Exact inputs produce a Float at the default precision; a
    /// negative real input produces a Complex when the context allows it.
    pub fn sqrt<T: NumericProtocol + ?Sized>(&mut self, value: &T) -> TowerResult<BoxedValue> {
        let boxed = to_boxed(value, &mut self.context)?;
        let rnd = self.rounding();
        match boxed {
            BoxedValue::Integer(_) | BoxedValue::Rational(_) => {
                let q = to_rational(&boxed)?;
                let precision = self.context.precision();
                let root = arith::sqrt_ratio(
                    q.numer().magnitude(),
                    q.denom().magnitude(),
                    precision,
                    rnd,
                )?;
                if q.numer().is_negative() {
                    return self.imaginary_root(root, precision, 0);
                }
                self.finish(root, 0).map(BoxedValue::from)
            }
            BoxedValue::Float(v) => {
                let precision = v.precision();
                if v.value().is_negative_value() {
                    let root = arith::sqrt(&v.value().abs(), precision, rnd);
                    return self.imaginary_root(root, precision, v.requested_precision());
                }
                let root = arith::sqrt(v.value(), precision, rnd);
                self.finish(root, v.requested_precision()).map(BoxedValue::from)
            }
            BoxedValue::Complex(v) => ops::complex_sqrt(self, &v).map(BoxedValue::from),
        }
    }

    /// `0 + root·i` for the square root of a negative real.
    fn imaginary_root(
        &mut self,
        root: (BigFloat, Ternary),
        precision: u32,
        requested: u32,
    ) -> TowerResult<BoxedValue> {
        if !self.context.allow_complex() {
            return Err(self.invalid("math domain error"));
        }
        let re = self.finish((BigFloat::zero(precision), Ternary::Exact), requested)?;
        let im = self.finish(root, requested)?;
        Ok(BoxedValue::Complex(Complex::new(re, im)))
    }

    fn follow_context(&mut self, value: &Float) -> TowerResult<Float> {
        let precision = self.context.precision();
        if value.requested_precision() != 0 || value.precision() == precision {
            return Ok(value.clone());
        }
        let rounded = value.value().round_to(precision, self.rounding());
        self.finish(rounded, 0)
    }

    fn named<O, A, B>(&mut self, a: &A, b: &B) -> TowerResult<BoxedValue>
    where
        O: Operator,
        A: NumericProtocol + ?Sized,
        B: NumericProtocol + ?Sized,
    {
        match self.apply::<O, A, B>(a, b)? {
            Dispatched::Value(v) => Ok(v),
            Dispatched::NotImplemented => Err(TowerError::type_error(format!(
                "unsupported operand type(s) for {}",
                O::SYMBOL
            ))),
        }
    }

    /// The generic operator body, instantiated once per [`Operator`].
    fn apply<O, A, B>(&mut self, a: &A, b: &B) -> TowerResult<Dispatched>
    where
        O: Operator,
        A: NumericProtocol + ?Sized,
        B: NumericProtocol + ?Sized,
    {
        let (ka, kb) = (classify(a), classify(b));
        if !ka.is_numeric() || !kb.is_numeric() {
            return Ok(Dispatched::NotImplemented);
        }
        if let Some(result) = self.word_fast_path::<O, A, B>(a, b) {
            return result.map(|v| Dispatched::Value(BoxedValue::Integer(v)));
        }
        let value = match ka.join(kb) {
            NumericKind::IntegerLike => {
                let (x, y) = (integer_operand(a)?, integer_operand(b)?);
                O::integer(self, &x, &y)?
            }
            NumericKind::RationalLike => {
                let (x, y) = (to_rational(a)?, to_rational(b)?);
                O::rational(self, x.as_big_rational(), y.as_big_rational())?
            }
            NumericKind::FloatLike => {
                let precision = self.float_precision(a, b);
                let x = self.float_operand(a, precision)?;
                if kb == NumericKind::IntegerLike {
                    let n = integer_operand(b)?;
                    if let Some(result) = O::float_integer(self, &x, &n) {
                        return result.map(Dispatched::Value);
                    }
                }
                let y = self.float_operand(b, precision)?;
                O::float(self, &x, &y, precision)?
            }
            NumericKind::ComplexLike => {
                let precision = self.complex_precision(a, b);
                let x = self.complex_operand(a, precision)?;
                if kb == NumericKind::IntegerLike {
                    let n = integer_operand(b)?;
                    if let Some(result) = O::complex_integer(self, &x, &n) {
                        return result.map(Dispatched::Value);
                    }
                }
                let y = self.complex_operand(b, precision)?;
                O::complex(self, &x, &y, precision)?
            }
            NumericKind::NotANumber => return Ok(Dispatched::NotImplemented),
        };
        Ok(Dispatched::Value(value))
    }

    /// Boxed Integer combined with a native machine word.
    fn word_fast_path<O, A, B>(&mut self, a: &A, b: &B) -> Option<TowerResult<Integer>>
    where
        O: Operator,
        A: NumericProtocol + ?Sized,
        B: NumericProtocol + ?Sized,
    {
        let result = match (a.as_boxed(), b.as_boxed()) {
            (Some(BoxedValue::Integer(x)), None) => {
                let word = b.as_small_int()?;
                O::integer_word(self, x, word)?
            }
            (None, Some(BoxedValue::Integer(y))) => {
                let word = a.as_small_int()?;
                O::word_integer(self, word, y)?
            }
            _ => return None,
        };
        trace!(op = O::SYMBOL, "small-int fast path");
        Some(result)
    }

    /// Minimum of the Float operands' precisions, or the default when
    /// neither operand is a Float.
    fn float_precision<A, B>(&self, a: &A, b: &B) -> u32
    where
        A: NumericProtocol + ?Sized,
        B: NumericProtocol + ?Sized,
    {
        let precision_of = |v: Option<&BoxedValue>| v.and_then(BoxedValue::as_float).map(Float::precision);
        match (precision_of(a.as_boxed()), precision_of(b.as_boxed())) {
            (Some(x), Some(y)) => x.min(y),
            (Some(x), None) | (None, Some(x)) => x,
            (None, None) => self.context.precision(),
        }
    }

    /// Componentwise minimum over the Float and Complex operands.
    fn complex_precision<A, B>(&self, a: &A, b: &B) -> (u32, u32)
    where
        A: NumericProtocol + ?Sized,
        B: NumericProtocol + ?Sized,
    {
        let precision_of = |v: Option<&BoxedValue>| match v {
            Some(BoxedValue::Float(f)) => Some((f.precision(), f.precision())),
            Some(BoxedValue::Complex(c)) => Some(c.precision()),
            _ => None,
        };
        match (precision_of(a.as_boxed()), precision_of(b.as_boxed())) {
            (Some(x), Some(y)) => (x.0.min(y.0), x.1.min(y.1)),
            (Some(x), None) | (None, Some(x)) => x,
            (None, None) => {
                let p = self.context.precision();
                (p, p)
            }
        }
    }

    /// A Float operand is used as is; anything else is rounded to `precision`.
    /// Coerced operands follow the context so that they never pin the
    /// precision of the result.
    fn float_operand<'a, T>(&mut self, value: &'a T, precision: u32) -> TowerResult<Cow<'a, Float>>
    where
        T: NumericProtocol + ?Sized,
    {
        match value.as_boxed() {
            Some(BoxedValue::Float(f)) => Ok(Cow::Borrowed(f)),
            _ => to_float(value, precision, &mut self.context)
                .map(|f| Cow::Owned(f.following_context())),
        }
    }

    fn complex_operand<'a, T>(
        &mut self,
        value: &'a T,
        precision: (u32, u32),
    ) -> TowerResult<Cow<'a, Complex>>
    where
        T: NumericProtocol + ?Sized,
    {
        match value.as_boxed() {
            Some(BoxedValue::Complex(c)) => Ok(Cow::Borrowed(c)),
            Some(BoxedValue::Float(f)) => {
                let c = to_complex(&BoxedValue::Float(f.clone()), (0, 0), &mut self.context)?;
                if f.requested_precision() != PRECISION_DEFAULT {
                    return Ok(Cow::Owned(c));
                }
                Ok(Cow::Owned(Complex::new(
                    c.real().clone(),
                    c.imag().clone().following_context(),
                )))
            }
            _ => {
                let c = to_complex(value, precision, &mut self.context)?;
                Ok(Cow::Owned(Complex::new(
                    c.real().clone().following_context(),
                    c.imag().clone().following_context(),
                )))
            }
        }
    }
}

fn integer_operand<T: NumericProtocol + ?Sized>(value: &T) -> TowerResult<Cow<'_, BigInt>> {
    match value.as_boxed() {
        Some(BoxedValue::Integer(v)) => Ok(Cow::Borrowed(v.value())),
        _ => to_integer(value).map(|v| Cow::Owned(v.into_inner())),
    }
}

fn negated(value: &Float) -> Float {
    value.with_value(value.value().neg(), value.result_code().negate())
}
