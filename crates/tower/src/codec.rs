// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

//! # Binary codec
//!
//! Portable byte layout for boxed values.
//!
//! ```text
//! Integer   1 | sign+width | len | magnitude (LE base 256)
//! Rational  2 | sign+width | len | numerator | len | denominator
//! Float     3 | status | result code | rounding | precision | exponent | limbs
//! Complex   4 | width | len | real record | imaginary record
//! ```
//!
//! Length, precision and exponent fields are 4 bytes wide for a 32-bit limb
//! source and 8 bytes wide for a 64-bit one, always little-endian. A float
//! mantissa is stored as `ceil(precision / limb_bits)` limbs, least
//! significant first, with the top bit of the last limb set. Decoding on a
//! backend of the other limb width realigns the mantissa.

use crate::value::{BoxedValue, Complex, Float, Integer, Rational};
use mpt_backend::{BackendError, BigFloat, RoundingMode, Ternary};
use num_bigint::{BigInt, BigUint, Sign};
use num_traits::Zero;
use thiserror::Error;
use tracing::debug;

const TAG_INTEGER: u8 = 1;
const TAG_RATIONAL: u8 = 2;
const TAG_FLOAT: u8 = 3;
const TAG_COMPLEX: u8 = 4;

const SIGN_MASK: u8 = 0b11;
const SIGN_ZERO: u8 = 0;
const SIGN_POSITIVE: u8 = 1;
const SIGN_NEGATIVE: u8 = 2;
const WIDE_LENGTHS: u8 = 1 << 2;

const FLOAT_REGULAR: u8 = 1;
const FLOAT_NEGATIVE: u8 = 1 << 1;
const FLOAT_SPECIAL_SHIFT: u8 = 2;
const FLOAT_SPECIAL_MASK: u8 = 0b11 << FLOAT_SPECIAL_SHIFT;
const SPECIAL_ZERO: u8 = 1;
const SPECIAL_NAN: u8 = 2;
const SPECIAL_INF: u8 = 3;
const FLOAT_NEGATIVE_EXPONENT: u8 = 1 << 5;
const FLOAT_WIDE_LIMBS: u8 = 1 << 6;

/// Errors raised while decoding, or encoding a value the layout cannot hold.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("binary data is empty")]
    Empty,

    #[error("binary data too short: needed {needed} more bytes, {available} left")]
    Truncated { needed: u64, available: usize },

    #[error("{0} trailing bytes after the encoded value")]
    TrailingBytes(usize),

    #[error("unknown kind tag {0}")]
    UnknownTag(u8),

    #[error("invalid header byte {0:#04x}")]
    InvalidHeader(u8),

    #[error("rational with a zero denominator")]
    ZeroDenominator,

    #[error("invalid result code {0}")]
    InvalidResultCode(u8),

    #[error("invalid rounding mode {0}")]
    InvalidRounding(u8),

    #[error("invalid float record: {0}")]
    InvalidFloat(String),

    #[error("{field} {value} does not fit a {bits}-bit field")]
    FieldOverflow {
        field: &'static str,
        value: u64,
        bits: u32,
    },
}

impl From<BackendError> for CodecError {
    fn from(err: BackendError) -> Self {
        CodecError::InvalidFloat(err.to_string())
    }
}

/// Limb width of the backend that produced or consumes an encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LimbWidth {
    W32,
    W64,
}

impl LimbWidth {
    /// Width of the running platform.
    pub fn native() -> Self {
        if cfg!(target_pointer_width = "64") {
            LimbWidth::W64
        } else {
            LimbWidth::W32
        }
    }

    pub fn bits(self) -> u32 {
        match self {
            LimbWidth::W32 => 32,
            LimbWidth::W64 => 64,
        }
    }

    fn bytes(self) -> usize {
        self.bits() as usize / 8
    }

    fn is_wide(self) -> bool {
        self == LimbWidth::W64
    }
}

pub fn encode(value: &BoxedValue) -> Result<Vec<u8>, CodecError> {
    encode_with(value, LimbWidth::native())
}

pub fn decode(bytes: &[u8]) -> Result<BoxedValue, CodecError> {
    decode_with(bytes, LimbWidth::native())
}

/// Encodes as a backend with `width`-bit limbs would.
pub fn encode_with(value: &BoxedValue, width: LimbWidth) -> Result<Vec<u8>, CodecError> {
    let mut out = Vec::new();
    match value {
        BoxedValue::Integer(v) => {
            out.push(TAG_INTEGER);
            write_signed(&mut out, v.value(), width)?;
        }
        BoxedValue::Rational(v) => {
            out.push(TAG_RATIONAL);
            write_signed(&mut out, v.numer(), width)?;
            if !v.numer().is_zero() {
                write_magnitude(&mut out, v.denom().magnitude(), width)?;
            }
        }
        BoxedValue::Float(v) => write_float(&mut out, v, width)?,
        BoxedValue::Complex(v) => {
            out.push(TAG_COMPLEX);
            out.push(if width.is_wide() { FLOAT_WIDE_LIMBS } else { 0 });
            let mut real = Vec::new();
            write_float(&mut real, v.real(), width)?;
            write_field(&mut out, real.len() as u64, width, "record length")?;
            out.extend_from_slice(&real);
            write_float(&mut out, v.imag(), width)?;
        }
    }
    Ok(out)
}

/// Decodes on a backend with `width`-bit limbs.
pub fn decode_with(bytes: &[u8], width: LimbWidth) -> Result<BoxedValue, CodecError> {
    let mut reader = Reader::new(bytes);
    let value = read_value(&mut reader, width).inspect_err(|err| {
        debug!(%err, len = bytes.len(), "rejected binary value");
    })?;
    if reader.remaining() != 0 {
        debug!(trailing = reader.remaining(), "rejected binary value");
        return Err(CodecError::TrailingBytes(reader.remaining()));
    }
    Ok(value)
}

fn write_field(out: &mut Vec<u8>, value: u64, width: LimbWidth, field: &'static str) -> Result<(), CodecError> {
    match width {
        LimbWidth::W32 => {
            let narrow = u32::try_from(value).map_err(|_| CodecError::FieldOverflow {
                field,
                value,
                bits: 32,
            })?;
            out.extend_from_slice(&narrow.to_le_bytes());
        }
        LimbWidth::W64 => out.extend_from_slice(&value.to_le_bytes()),
    }
    Ok(())
}

fn write_magnitude(out: &mut Vec<u8>, magnitude: &BigUint, width: LimbWidth) -> Result<(), CodecError> {
    let bytes = magnitude.to_bytes_le();
    write_field(out, bytes.len() as u64, width, "length")?;
    out.extend_from_slice(&bytes);
    Ok(())
}

/// Sign+width header, then the magnitude unless the value is zero.
fn write_signed(out: &mut Vec<u8>, value: &BigInt, width: LimbWidth) -> Result<(), CodecError> {
    let sign = match value.sign() {
        Sign::NoSign => SIGN_ZERO,
        Sign::Plus => SIGN_POSITIVE,
        Sign::Minus => SIGN_NEGATIVE,
    };
    let wide = if width.is_wide() { WIDE_LENGTHS } else { 0 };
    out.push(sign | wide);
    if sign != SIGN_ZERO {
        write_magnitude(out, value.magnitude(), width)?;
    }
    Ok(())
}

fn write_float(out: &mut Vec<u8>, value: &Float, width: LimbWidth) -> Result<(), CodecError> {
    let f = value.value();
    let mut status = if width.is_wide() { FLOAT_WIDE_LIMBS } else { 0 };
    if f.is_sign_negative() {
        status |= FLOAT_NEGATIVE;
    }
    if f.is_regular() {
        status |= FLOAT_REGULAR;
        if f.exponent() < 0 {
            status |= FLOAT_NEGATIVE_EXPONENT;
        }
    } else {
        let special = if f.is_zero() {
            SPECIAL_ZERO
        } else if f.is_nan() {
            SPECIAL_NAN
        } else {
            SPECIAL_INF
        };
        status |= special << FLOAT_SPECIAL_SHIFT;
    }
    out.push(TAG_FLOAT);
    out.push(status);
    out.push(value.result_code().to_byte());
    out.push(value.rounding().to_byte());
    write_field(out, u64::from(f.precision()), width, "precision")?;
    if !f.is_regular() {
        return Ok(());
    }
    write_field(out, f.exponent().unsigned_abs(), width, "exponent")?;
    let (mantissa, total_bits) = f.to_raw_parts(width.bits());
    let limbs = (total_bits / u64::from(width.bits())) as usize;
    match width {
        LimbWidth::W32 => {
            let mut digits = mantissa.to_u32_digits();
            digits.resize(limbs, 0);
            for limb in digits {
                out.extend_from_slice(&limb.to_le_bytes());
            }
        }
        LimbWidth::W64 => {
            let mut digits = mantissa.to_u64_digits();
            digits.resize(limbs, 0);
            for limb in digits {
                out.extend_from_slice(&limb.to_le_bytes());
            }
        }
    }
    Ok(())
}

struct Reader<'a> {
    bytes: &'a [u8],
}

impl<'a> Reader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes }
    }

    fn remaining(&self) -> usize {
        self.bytes.len()
    }

    fn take(&mut self, n: u64) -> Result<&'a [u8], CodecError> {
        let available = self.bytes.len();
        let len = usize::try_from(n)
            .ok()
            .filter(|len| *len <= available)
            .ok_or(CodecError::Truncated {
                needed: n,
                available,
            })?;
        let (head, tail) = self.bytes.split_at(len);
        self.bytes = tail;
        Ok(head)
    }

    fn byte(&mut self) -> Result<u8, CodecError> {
        Ok(self.take(1)?[0])
    }

    fn field(&mut self, wide: bool) -> Result<u64, CodecError> {
        if wide {
            let mut buf = [0u8; 8];
            buf.copy_from_slice(self.take(8)?);
            Ok(u64::from_le_bytes(buf))
        } else {
            let mut buf = [0u8; 4];
            buf.copy_from_slice(self.take(4)?);
            Ok(u64::from(u32::from_le_bytes(buf)))
        }
    }

    fn magnitude(&mut self, wide: bool) -> Result<BigUint, CodecError> {
        let len = self.field(wide)?;
        Ok(BigUint::from_bytes_le(self.take(len)?))
    }
}

fn read_value(reader: &mut Reader<'_>, width: LimbWidth) -> Result<BoxedValue, CodecError> {
    let tag = reader.byte().map_err(|_| CodecError::Empty)?;
    match tag {
        TAG_INTEGER => Ok(BoxedValue::Integer(Integer::new(read_signed(reader)?.0))),
        TAG_RATIONAL => {
            let (numer, wide) = read_signed(reader)?;
            if numer.is_zero() {
                return Ok(BoxedValue::Rational(Rational::from_integer(numer)));
            }
            let denom = reader.magnitude(wide)?;
            if denom.is_zero() {
                return Err(CodecError::ZeroDenominator);
            }
            let value = Rational::new(numer, BigInt::from_biguint(Sign::Plus, denom))
                .map_err(|_| CodecError::ZeroDenominator)?;
            Ok(BoxedValue::Rational(value))
        }
        TAG_FLOAT => read_float(reader, width).map(BoxedValue::Float),
        TAG_COMPLEX => {
            let header = reader.byte()?;
            if header & !FLOAT_WIDE_LIMBS != 0 {
                return Err(CodecError::InvalidHeader(header));
            }
            let len = reader.field(header & FLOAT_WIDE_LIMBS != 0)?;
            let mut real_reader = Reader::new(reader.take(len)?);
            let real = expect_float_tag(&mut real_reader, width)?;
            if real_reader.remaining() != 0 {
                return Err(CodecError::InvalidFloat(
                    "real record longer than its contents".into(),
                ));
            }
            let imag = expect_float_tag(reader, width)?;
            Ok(BoxedValue::Complex(Complex::new(real, imag)))
        }
        other => Err(CodecError::UnknownTag(other)),
    }
}

fn expect_float_tag(reader: &mut Reader<'_>, width: LimbWidth) -> Result<Float, CodecError> {
    match reader.byte()? {
        TAG_FLOAT => read_float(reader, width),
        other => Err(CodecError::UnknownTag(other)),
    }
}

/// Reads a sign+width header and the magnitude; returns the value and
/// whether lengths are 64-bit.
fn read_signed(reader: &mut Reader<'_>) -> Result<(BigInt, bool), CodecError> {
    let header = reader.byte()?;
    if header & !(SIGN_MASK | WIDE_LENGTHS) != 0 {
        return Err(CodecError::InvalidHeader(header));
    }
    let wide = header & WIDE_LENGTHS != 0;
    let sign = match header & SIGN_MASK {
        SIGN_ZERO => return Ok((BigInt::zero(), wide)),
        SIGN_POSITIVE => Sign::Plus,
        SIGN_NEGATIVE => Sign::Minus,
        _ => return Err(CodecError::InvalidHeader(header)),
    };
    let magnitude = reader.magnitude(wide)?;
    if magnitude.is_zero() {
        return Err(CodecError::InvalidHeader(header));
    }
    Ok((BigInt::from_biguint(sign, magnitude), wide))
}

fn read_float(reader: &mut Reader<'_>, width: LimbWidth) -> Result<Float, CodecError> {
    let status = reader.byte()?;
    let code = reader.byte()?;
    let result_code = Ternary::from_byte(code).ok_or(CodecError::InvalidResultCode(code))?;
    let mode = reader.byte()?;
    let rounding = RoundingMode::from_byte(mode).ok_or(CodecError::InvalidRounding(mode))?;

    let source = if status & FLOAT_WIDE_LIMBS != 0 {
        LimbWidth::W64
    } else {
        LimbWidth::W32
    };
    let precision = reader.field(source.is_wide())?;
    let precision = BigFloat::check_precision(precision)?;
    let negative = status & FLOAT_NEGATIVE != 0;
    let special = (status & FLOAT_SPECIAL_MASK) >> FLOAT_SPECIAL_SHIFT;
    let known = FLOAT_REGULAR
        | FLOAT_NEGATIVE
        | FLOAT_SPECIAL_MASK
        | FLOAT_NEGATIVE_EXPONENT
        | FLOAT_WIDE_LIMBS;
    if status & !known != 0 {
        return Err(CodecError::InvalidHeader(status));
    }

    let value = if status & FLOAT_REGULAR == 0 {
        match special {
            SPECIAL_ZERO => BigFloat::signed_zero(precision, negative),
            SPECIAL_NAN => BigFloat::nan(precision),
            SPECIAL_INF => BigFloat::infinity(precision, negative),
            _ => return Err(CodecError::InvalidHeader(status)),
        }
    } else {
        if special != 0 {
            return Err(CodecError::InvalidHeader(status));
        }
        let magnitude = reader.field(source.is_wide())?;
        let exponent = i64::try_from(magnitude).map_err(|_| CodecError::FieldOverflow {
            field: "exponent",
            value: magnitude,
            bits: 63,
        })?;
        let exponent = if status & FLOAT_NEGATIVE_EXPONENT != 0 {
            -exponent
        } else {
            exponent
        };
        let source_bits = u64::from(source.bits());
        let limbs = u64::from(precision).div_ceil(source_bits);
        let raw = reader.take(limbs * source.bytes() as u64)?;
        let mantissa = BigUint::from_bytes_le(raw);
        let (mantissa, total_bits) = realign(mantissa, limbs * source_bits, precision, width);
        BigFloat::from_raw_parts(negative, mantissa, total_bits, exponent, precision)?
    };
    Ok(Float::from_parts(value, precision, rounding, result_code))
}

/// Moves a mantissa of `source_total` bits onto whole limbs of the local
/// width. Only zero padding below the precision is added or dropped.
fn realign(mantissa: BigUint, source_total: u64, precision: u32, local: LimbWidth) -> (BigUint, u64) {
    let local_bits = u64::from(local.bits());
    let local_total = u64::from(precision).div_ceil(local_bits) * local_bits;
    if local_total == source_total {
        return (mantissa, source_total);
    }
    debug!(source_total, local_total, "realigning mantissa limbs");
    let mantissa = if local_total > source_total {
        mantissa << (local_total - source_total)
    } else {
        mantissa >> (source_total - local_total)
    };
    (mantissa, local_total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn float(value: f64, precision: u32) -> BoxedValue {
        let (f, t) = BigFloat::from_f64(value, precision, RoundingMode::Nearest);
        BoxedValue::Float(Float::from_parts(f, precision, RoundingMode::Nearest, t))
    }

    #[test]
    fn test_integer_layout() {
        let bytes = encode_with(&BoxedValue::from(Integer::from(-258)), LimbWidth::W32).unwrap();
        assert_eq!(bytes, vec![1, 2, 2, 0, 0, 0, 0x02, 0x01]);
        let zero = encode_with(&BoxedValue::from(Integer::from(0)), LimbWidth::W64).unwrap();
        assert_eq!(zero, vec![1, WIDE_LENGTHS]);
    }

    #[test]
    fn test_float_layout() {
        let bytes = encode_with(&float(1.0, 53), LimbWidth::W64).unwrap();
        assert_eq!(bytes[0], TAG_FLOAT);
        assert_eq!(bytes[1], FLOAT_REGULAR | FLOAT_WIDE_LIMBS);
        assert_eq!(&bytes[4..12], &53u64.to_le_bytes());
        // 1.0 = 0.1b × 2^1
        assert_eq!(&bytes[12..20], &1u64.to_le_bytes());
        assert_eq!(&bytes[20..28], &(1u64 << 63).to_le_bytes());
        assert_eq!(bytes.len(), 28);
    }

    #[test]
    fn test_cross_limb_width() {
        for width in [LimbWidth::W32, LimbWidth::W64] {
            let other = if width == LimbWidth::W32 { LimbWidth::W64 } else { LimbWidth::W32 };
            for value in [float(0.1, 53), float(-3.75, 2), float(1e300, 150), float(-0.0, 40)] {
                let decoded = decode_with(&encode_with(&value, width).unwrap(), other).unwrap();
                assert_eq!(decoded, value);
                assert_eq!(
                    decoded.as_float().unwrap().precision(),
                    value.as_float().unwrap().precision()
                );
            }
        }
    }

    #[test]
    fn test_special_values() {
        let nan = BoxedValue::Float(Float::exact(BigFloat::nan(53)));
        let decoded = decode(&encode(&nan).unwrap()).unwrap();
        assert!(decoded.as_float().unwrap().value().is_nan());
        let inf = BoxedValue::Float(Float::exact(BigFloat::infinity(64, true)));
        let decoded = decode(&encode(&inf).unwrap()).unwrap();
        assert!(decoded.as_float().unwrap().value().is_infinite());
        assert!(decoded.as_float().unwrap().value().is_sign_negative());
    }

    #[test]
    fn test_complex_round_trip() {
        let (re, _) = BigFloat::from_f64(1.5, 53, RoundingMode::Nearest);
        let (im, _) = BigFloat::from_f64(-0.25, 90, RoundingMode::Nearest);
        let value = BoxedValue::Complex(Complex::new(Float::exact(re), Float::exact(im)));
        let decoded = decode_with(&encode_with(&value, LimbWidth::W32).unwrap(), LimbWidth::W64).unwrap();
        assert_eq!(decoded, value);
        assert_eq!(decoded.as_complex().unwrap().precision(), (53, 90));
    }

    #[test]
    fn test_malformed_input_is_rejected() {
        assert_eq!(decode(&[]), Err(CodecError::Empty));
        assert_eq!(decode(&[9]), Err(CodecError::UnknownTag(9)));
        assert!(matches!(decode(&[1, 1, 5, 0, 0, 0, 1]), Err(CodecError::Truncated { .. })));
        assert_eq!(decode(&[1, 0, 0]), Err(CodecError::TrailingBytes(1)));
        assert_eq!(
            decode(&[2, 1, 1, 0, 0, 0, 1, 0, 0, 0, 0]),
            Err(CodecError::ZeroDenominator)
        );
        let mut bytes = encode_with(&float(1.0, 53), LimbWidth::W64).unwrap();
        bytes[2] = 7;
        assert_eq!(decode(&bytes), Err(CodecError::InvalidResultCode(7)));
        // A huge declared length must not be trusted.
        let bytes = [1, 1 | WIDE_LENGTHS, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff];
        assert!(matches!(decode(&bytes), Err(CodecError::Truncated { .. })));
    }

    #[test]
    fn test_malformed_mantissa_is_rejected() {
        let mut bytes = encode_with(&float(1.0, 53), LimbWidth::W64).unwrap();
        let last = bytes.len() - 1;
        bytes[last] = 0;
        assert!(matches!(decode(&bytes), Err(CodecError::InvalidFloat(_))));
    }

    proptest! {
        #[test]
        fn rational_round_trip(n in any::<i64>(), d in 1i64..i64::MAX) {
            let q = BoxedValue::from(Rational::new(BigInt::from(n), BigInt::from(d)).unwrap());
            for width in [LimbWidth::W32, LimbWidth::W64] {
                let decoded = decode_with(&encode_with(&q, width).unwrap(), width).unwrap();
                prop_assert_eq!(decoded.as_rational(), q.as_rational());
            }
        }
    }
}
