// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

//! String forms of boxed values and the format-spec mini-language
//! `[[fill]align][sign][#][0][width][,][.precision][rounding][type]`.

use crate::errors::{TowerError, TowerResult};
use crate::value::{BoxedValue, Complex, Float, Rational};
use mpt_backend::integer::round_quotient;
use mpt_backend::radix;
use mpt_backend::{BigFloat, FloatClass, RoundingMode, MAX_PRECISION, MIN_PRECISION};
use num_bigint::{BigInt, BigUint};
use num_traits::{One, Signed};
use std::str::FromStr;

/// Decimal exponents in `REPR_FIXED_MIN..REPR_FIXED_MAX` print without an exponent.
const REPR_FIXED_MIN: i64 = -4;
const REPR_FIXED_MAX: i64 = 16;

/// Digits after the point when a spec gives no precision.
const DEFAULT_FORMAT_PRECISION: usize = 6;

/// Splits significant digits `0.d × 10^exponent` into integer and fraction digits.
fn place_point(digits: &str, exponent: i64) -> (String, String) {
    if exponent <= 0 {
        let zeros = "0".repeat(exponent.unsigned_abs() as usize);
        return ("0".to_owned(), format!("{zeros}{digits}"));
    }
    let point = exponent as usize;
    if point >= digits.len() {
        let zeros = "0".repeat(point - digits.len());
        return (format!("{digits}{zeros}"), String::new());
    }
    let (int, frac) = digits.split_at(point);
    (int.to_owned(), frac.to_owned())
}

fn exponent_suffix(exponent: i64, upper: bool) -> String {
    let marker = if upper { 'E' } else { 'e' };
    let sign = if exponent < 0 { '-' } else { '+' };
    format!("{marker}{sign}{:02}", exponent.unsigned_abs())
}

/// Shortest text that always identifies a float of its precision.
pub fn float_repr(x: &BigFloat) -> String {
    let negative = x.is_sign_negative();
    match x.class() {
        FloatClass::Nan => return "nan".to_owned(),
        FloatClass::Infinite if negative => return "-inf".to_owned(),
        FloatClass::Infinite => return "inf".to_owned(),
        FloatClass::Zero if negative => return "-0.0".to_owned(),
        FloatClass::Zero => return "0.0".to_owned(),
        FloatClass::Regular => {}
    }
    // Only non-finite values are refused, and those returned above.
    let Ok((_, digits, exponent)) = radix::to_digits(x, 10, 0, RoundingMode::Nearest) else {
        return "nan".to_owned();
    };
    let digits = digits.trim_end_matches('0');
    let sign = if negative { "-" } else { "" };
    let scientific = exponent - 1;
    if (REPR_FIXED_MIN..REPR_FIXED_MAX).contains(&scientific) {
        let (int, frac) = place_point(digits, exponent);
        let frac = if frac.is_empty() { "0" } else { frac.as_str() };
        return format!("{sign}{int}.{frac}");
    }
    let (lead, rest) = digits.split_at(1);
    let rest = if rest.is_empty() { "0" } else { rest };
    format!("{sign}{lead}.{rest}{}", exponent_suffix(scientific, false))
}

pub fn rational_repr(num: &BigInt, den: &BigInt) -> String {
    if den.is_one() {
        num.to_string()
    } else {
        format!("{num}/{den}")
    }
}

impl Float {
    /// Significant digits in `base` with the exponent `e` such that the value
    /// is `±0.d × base^e`; `n == 0` picks enough digits to identify the value.
    pub fn to_digits(&self, base: u32, n: usize) -> TowerResult<(bool, String, i64)> {
        Ok(radix::to_digits(self.value(), base, n, self.rounding())?)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Right,
    Center,
    /// Padding goes between the sign and the digits.
    AfterSign,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SignMode {
    #[default]
    Negative,
    Always,
    Space,
}

/// Parsed format specification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatSpec {
    pub fill: char,
    pub align: Option<Align>,
    pub sign: SignMode,
    pub alternate: bool,
    pub width: usize,
    pub grouping: bool,
    pub precision: Option<usize>,
    pub rounding: Option<RoundingMode>,
    pub kind: Option<char>,
}

impl Default for FormatSpec {
    fn default() -> Self {
        Self {
            fill: ' ',
            align: None,
            sign: SignMode::Negative,
            alternate: false,
            width: 0,
            grouping: false,
            precision: None,
            rounding: None,
            kind: None,
        }
    }
}

fn align_of(c: char) -> Option<Align> {
    match c {
        '<' => Some(Align::Left),
        '>' => Some(Align::Right),
        '^' => Some(Align::Center),
        '=' => Some(Align::AfterSign),
        _ => None,
    }
}

fn sign_of(c: char) -> Option<SignMode> {
    match c {
        '-' => Some(SignMode::Negative),
        '+' => Some(SignMode::Always),
        ' ' => Some(SignMode::Space),
        _ => None,
    }
}

fn rounding_of(c: char) -> Option<RoundingMode> {
    match c {
        'U' => Some(RoundingMode::TowardPositive),
        'D' => Some(RoundingMode::TowardNegative),
        'Y' => Some(RoundingMode::AwayFromZero),
        'Z' => Some(RoundingMode::TowardZero),
        'N' => Some(RoundingMode::Nearest),
        _ => None,
    }
}

const INTEGER_TYPES: &str = "bodxX";
const FLOAT_TYPES: &str = "fFeEgGaA%";

fn read_number(chars: &[char], start: usize) -> TowerResult<(Option<usize>, usize)> {
    let end = chars[start..]
        .iter()
        .position(|c| !c.is_ascii_digit())
        .map_or(chars.len(), |n| start + n);
    if end == start {
        return Ok((None, start));
    }
    let text: String = chars[start..end].iter().collect();
    let value = text
        .parse::<usize>()
        .map_err(|_| TowerError::value("Too many decimal digits in format string"))?;
    Ok((Some(value), end))
}

impl FromStr for FormatSpec {
    type Err = TowerError;

    fn from_str(spec: &str) -> TowerResult<Self> {
        let chars: Vec<char> = spec.chars().collect();
        let mut out = FormatSpec::default();
        let mut i = 0;
        if let Some(align) = chars.get(1).and_then(|&c| align_of(c)) {
            out.fill = chars[0];
            out.align = Some(align);
            i = 2;
        } else if let Some(align) = chars.first().and_then(|&c| align_of(c)) {
            out.align = Some(align);
            i = 1;
        }
        if let Some(sign) = chars.get(i).and_then(|&c| sign_of(c)) {
            out.sign = sign;
            i += 1;
        }
        if chars.get(i) == Some(&'#') {
            out.alternate = true;
            i += 1;
        }
        if chars.get(i) == Some(&'0') {
            if out.align.is_none() {
                out.fill = '0';
                out.align = Some(Align::AfterSign);
            }
            i += 1;
        }
        let (width, next) = read_number(&chars, i)?;
        out.width = width.unwrap_or(0);
        i = next;
        if chars.get(i) == Some(&',') {
            out.grouping = true;
            i += 1;
        }
        if chars.get(i) == Some(&'.') {
            let (precision, next) = read_number(&chars, i + 1)?;
            out.precision =
                Some(precision.ok_or_else(|| TowerError::value("Format specifier missing precision"))?);
            i = next;
        }
        if let Some(rounding) = chars.get(i).and_then(|&c| rounding_of(c)) {
            out.rounding = Some(rounding);
            i += 1;
        }
        if let Some(&c) = chars.get(i) {
            if INTEGER_TYPES.contains(c) || FLOAT_TYPES.contains(c) {
                out.kind = Some(c);
                i += 1;
            }
        }
        if i != chars.len() {
            return Err(TowerError::value(format!("Invalid format specifier {spec:?}")));
        }
        Ok(out)
    }
}

/// Text of a number split for padding: sign, radix prefix, digits.
struct Rendered {
    negative: bool,
    prefix: &'static str,
    body: String,
}

impl FormatSpec {
    fn sign_text(&self, negative: bool) -> &'static str {
        match (negative, self.sign) {
            (true, _) => "-",
            (false, SignMode::Always) => "+",
            (false, SignMode::Space) => " ",
            (false, SignMode::Negative) => "",
        }
    }

    fn pad(&self, head: &str, body: &str) -> String {
        let len = head.chars().count() + body.chars().count();
        if len >= self.width {
            return format!("{head}{body}");
        }
        let gap = self.width - len;
        let fill = |n: usize| self.fill.to_string().repeat(n);
        match self.align.unwrap_or(Align::Right) {
            Align::Left => format!("{head}{body}{}", fill(gap)),
            Align::Right => format!("{}{head}{body}", fill(gap)),
            Align::Center => format!("{}{head}{body}{}", fill(gap / 2), fill(gap - gap / 2)),
            Align::AfterSign => format!("{head}{}{body}", fill(gap)),
        }
    }

    fn render(&self, rendered: &Rendered) -> String {
        let head = format!("{}{}", self.sign_text(rendered.negative), rendered.prefix);
        self.pad(&head, &rendered.body)
    }

    fn float_kind(&self) -> bool {
        self.kind.map_or(false, |c| FLOAT_TYPES.contains(c))
    }
}

/// Inserts `,` every three digits of the leading digit run.
fn group_thousands(body: &str) -> String {
    let end = body.find(|c: char| !c.is_ascii_digit()).unwrap_or(body.len());
    let (int, rest) = body.split_at(end);
    let mut out = String::with_capacity(body.len() + int.len() / 3);
    for (i, c) in int.chars().enumerate() {
        if i > 0 && (int.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out.push_str(rest);
    out
}

fn format_integer(value: &BigInt, spec: &FormatSpec) -> TowerResult<Rendered> {
    if spec.float_kind() {
        let bits = u32::try_from(value.bits())
            .unwrap_or(MAX_PRECISION)
            .clamp(MIN_PRECISION, MAX_PRECISION);
        let (x, _) = BigFloat::from_bigint(value, bits, RoundingMode::Nearest);
        return format_real(&x, RoundingMode::Nearest, spec);
    }
    if spec.precision.is_some() {
        return Err(TowerError::value(
            "Precision not allowed in integer format specifier",
        ));
    }
    if spec.rounding.is_some() {
        return Err(TowerError::value(
            "Rounding not allowed in integer format specifier",
        ));
    }
    let kind = spec.kind.unwrap_or('d');
    let (base, prefix) = match kind {
        'b' => (2, "0b"),
        'o' => (8, "0o"),
        'x' => (16, "0x"),
        'X' => (16, "0X"),
        _ => (10, ""),
    };
    if spec.grouping && base != 10 {
        return Err(TowerError::value(format!("Cannot specify ',' with '{kind}'")));
    }
    let digits = radix::format_magnitude(value.magnitude(), base, kind == 'X')?;
    Ok(Rendered {
        negative: value.is_negative(),
        prefix: if spec.alternate { prefix } else { "" },
        body: if spec.grouping { group_thousands(&digits) } else { digits },
    })
}

fn format_rational(value: &Rational, spec: &FormatSpec) -> TowerResult<Rendered> {
    match spec.kind {
        None if spec.precision.is_none() && spec.rounding.is_none() => Ok(Rendered {
            negative: value.numer().is_negative(),
            prefix: "",
            body: rational_repr(&value.numer().abs(), value.denom()),
        }),
        Some(c) if FLOAT_TYPES.contains(c) => {
            let rounding = spec.rounding.unwrap_or(RoundingMode::Nearest);
            let digits = spec.precision.unwrap_or(DEFAULT_FORMAT_PRECISION) as u64;
            let bits = (value.numer().bits() + value.denom().bits())
                .saturating_add(digits.saturating_mul(4))
                .saturating_add(64);
            let bits = u32::try_from(bits).unwrap_or(MAX_PRECISION).min(MAX_PRECISION);
            let (x, _) = BigFloat::from_rational(value.as_big_rational(), bits, rounding);
            format_real(&x, rounding, spec)
        }
        _ => Err(TowerError::value(format!(
            "Invalid format specifier for rational: {spec:?}"
        ))),
    }
}

/// `|x|` with `digits` fraction digits; `scale` extra powers of ten are
/// folded into the integer part.
fn fixed(x: &BigFloat, digits: usize, scale: usize, rnd: RoundingMode) -> TowerResult<String> {
    let scaled = radix::to_fixed(x, digits + scale, rnd)?.to_string();
    let scaled = if scaled.len() <= digits {
        format!("{}{scaled}", "0".repeat(digits + 1 - scaled.len()))
    } else {
        scaled
    };
    let (int, frac) = scaled.split_at(scaled.len() - digits);
    Ok(format!("{int}.{frac}"))
}

fn scientific(x: &BigFloat, digits: usize, rnd: RoundingMode, upper: bool) -> TowerResult<String> {
    let (_, text, exponent) = radix::to_digits(x, 10, digits + 1, rnd)?;
    let exponent = if x.is_zero() { 0 } else { exponent - 1 };
    let (lead, rest) = text.split_at(1);
    Ok(format!("{lead}.{rest}{}", exponent_suffix(exponent, upper)))
}

fn general(x: &BigFloat, digits: usize, rnd: RoundingMode, upper: bool, keep_zeros: bool) -> TowerResult<String> {
    let digits = digits.max(1);
    let (_, text, exponent) = radix::to_digits(x, 10, digits, rnd)?;
    let exponent = if x.is_zero() { 0 } else { exponent - 1 };
    let (int, frac, suffix) = if (-4..digits as i64).contains(&exponent) {
        let (int, frac) = place_point(&text, exponent + 1);
        (int, frac, String::new())
    } else {
        let (lead, rest) = text.split_at(1);
        (lead.to_owned(), rest.to_owned(), exponent_suffix(exponent, upper))
    };
    let frac = if keep_zeros { frac.as_str() } else { frac.trim_end_matches('0') };
    let frac = if frac.is_empty() { "0" } else { frac };
    Ok(format!("{int}.{frac}{suffix}"))
}

/// `0x1.hhhp±e`, rounded to `digits` hex digits when given, exact otherwise.
fn hexadecimal(x: &BigFloat, digits: Option<usize>, rnd: RoundingMode, upper: bool) -> TowerResult<String> {
    let (prefix, marker) = if upper { ("0X", 'P') } else { ("0x", 'p') };
    if x.is_zero() {
        let frac = "0".repeat(digits.unwrap_or(1));
        return Ok(format!("{prefix}0.{frac}{marker}+0"));
    }
    let (m, _) = x.dyadic();
    let mut top = x.exponent() - 1;
    let frac_bits = m.bits() - 1;
    let (mantissa, count) = match digits {
        Some(count) => {
            let want = 4 * count as u64;
            if want >= frac_bits {
                (m << (want - frac_bits), count)
            } else {
                let unit = BigUint::one() << (frac_bits - want);
                let mut q = round_quotient(&m, &unit, x.is_sign_negative(), rnd)?;
                if q.bits() > want + 1 {
                    q >>= 1u32;
                    top += 1;
                }
                (q, count)
            }
        }
        None => {
            let count = frac_bits.div_ceil(4);
            (m << (4 * count - frac_bits), count as usize)
        }
    };
    let fraction = mantissa - (BigUint::one() << (4 * count as u64));
    let mut hex = if count == 0 {
        String::new()
    } else {
        let hex = radix::format_magnitude(&fraction, 16, upper)?;
        format!("{}{hex}", "0".repeat(count.saturating_sub(hex.len())))
    };
    if digits.is_none() {
        hex.truncate(hex.trim_end_matches('0').len());
        if hex.is_empty() {
            hex.push('0');
        }
    }
    Ok(format!("{prefix}1.{hex}{marker}{top:+}"))
}

fn format_real(x: &BigFloat, rounding: RoundingMode, spec: &FormatSpec) -> TowerResult<Rendered> {
    if spec.kind.map_or(false, |c| INTEGER_TYPES.contains(c)) {
        return Err(TowerError::value(format!(
            "Unknown format code '{}' for float",
            spec.kind.unwrap_or('d')
        )));
    }
    let rnd = spec.rounding.unwrap_or(rounding);
    let upper = spec.kind.map_or(false, |c| c.is_ascii_uppercase());
    let negative = x.is_sign_negative() && !x.is_nan();
    if !x.is_finite() {
        let text = if x.is_nan() { "nan" } else { "inf" };
        let body = if upper { text.to_ascii_uppercase() } else { text.to_owned() };
        return Ok(Rendered {
            negative,
            prefix: "",
            body,
        });
    }
    let precision = spec.precision.unwrap_or(DEFAULT_FORMAT_PRECISION);
    let body = match spec.kind {
        None if spec.precision.is_some() => general(x, precision, rnd, false, spec.alternate)?,
        None => float_repr(&x.abs()),
        Some('f' | 'F') => fixed(x, precision, 0, rnd)?,
        Some('e' | 'E') => scientific(x, precision, rnd, upper)?,
        Some('g' | 'G') => general(x, precision, rnd, upper, spec.alternate)?,
        Some('%') => format!("{}%", fixed(x, precision, 2, rnd)?),
        Some(_) => hexadecimal(x, spec.precision, rnd, upper)?,
    };
    Ok(Rendered {
        negative,
        prefix: "",
        body: if spec.grouping { group_thousands(&body) } else { body },
    })
}

fn format_complex(value: &Complex, spec: &FormatSpec) -> TowerResult<String> {
    if spec.kind.is_none() && spec.precision.is_none() && spec.rounding.is_none() {
        return Ok(spec.pad("", &value.to_string()));
    }
    let part = FormatSpec {
        fill: ' ',
        align: None,
        width: 0,
        ..spec.clone()
    };
    let re = format_real(value.real().value(), value.real().rounding(), &part)?;
    let im_spec = FormatSpec {
        sign: SignMode::Always,
        ..part.clone()
    };
    let im = format_real(value.imag().value(), value.imag().rounding(), &im_spec)?;
    let body = format!("{}{}j", part.render(&re), im_spec.render(&im));
    Ok(spec.pad("", &body))
}

/// Formats a value with a format spec.
///
/// Float output always carries a decimal point; `nan` and `inf` are the
/// only exceptions.
pub fn format_value(value: &BoxedValue, spec: &str) -> TowerResult<String> {
    let spec: FormatSpec = spec.parse()?;
    let rendered = match value {
        BoxedValue::Integer(v) => format_integer(v.value(), &spec)?,
        BoxedValue::Rational(v) => format_rational(v, &spec)?,
        BoxedValue::Float(v) => format_real(v.value(), v.rounding(), &spec)?,
        BoxedValue::Complex(v) => return format_complex(v, &spec),
    };
    Ok(spec.render(&rendered))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Integer;

    fn double(value: f64) -> BigFloat {
        BigFloat::from_f64(value, 53, RoundingMode::Nearest).0
    }

    fn float(value: f64) -> BoxedValue {
        BoxedValue::Float(Float::exact(double(value)))
    }

    fn integer(value: i64) -> BoxedValue {
        BoxedValue::Integer(Integer::from(value))
    }

    #[test]
    fn test_repr() {
        assert_eq!(float_repr(&double(1.5)), "1.5");
        assert_eq!(float_repr(&double(-2.0)), "-2.0");
        assert_eq!(float_repr(&double(0.1)), "0.10000000000000001");
        assert_eq!(float_repr(&double(0.001)), "0.001");
        assert_eq!(float_repr(&double(1e20)), "1.0e+20");
        assert_eq!(float_repr(&double(2f64.powi(-20))), "9.5367431640625e-07");
        assert_eq!(float_repr(&double(-0.0)), "-0.0");
        assert_eq!(float_repr(&BigFloat::nan(53)), "nan");
        assert_eq!(float_repr(&BigFloat::infinity(53, true)), "-inf");
        assert_eq!(rational_repr(&BigInt::from(-1), &BigInt::from(3)), "-1/3");
    }

    #[test]
    fn test_spec_parsing() {
        let spec: FormatSpec = "*^+#012,.3Zf".parse().unwrap();
        assert_eq!(spec.fill, '*');
        assert_eq!(spec.align, Some(Align::Center));
        assert_eq!(spec.sign, SignMode::Always);
        assert!(spec.alternate && spec.grouping);
        assert_eq!(spec.width, 12);
        assert_eq!(spec.precision, Some(3));
        assert_eq!(spec.rounding, Some(RoundingMode::TowardZero));
        assert_eq!(spec.kind, Some('f'));
        assert!("10.q".parse::<FormatSpec>().is_err());
        assert!(".f".parse::<FormatSpec>().is_err());
        assert!("ff".parse::<FormatSpec>().is_err());
    }

    #[test]
    fn test_integer_formats() {
        assert_eq!(format_value(&integer(255), "#x").unwrap(), "0xff");
        assert_eq!(format_value(&integer(255), "#010X").unwrap(), "0X000000FF");
        assert_eq!(format_value(&integer(-5), "b").unwrap(), "-101");
        assert_eq!(format_value(&integer(1234567), ",d").unwrap(), "1,234,567");
        assert_eq!(format_value(&integer(5), "+d").unwrap(), "+5");
        assert_eq!(format_value(&integer(42), "^7").unwrap(), "  42   ");
        assert_eq!(format_value(&integer(3), ".2f").unwrap(), "3.00");
        assert!(format_value(&integer(3), ".2x").is_err());
        assert!(format_value(&integer(3), ",x").is_err());
    }

    #[test]
    fn test_float_formats() {
        assert_eq!(format_value(&float(3.14159), "f").unwrap(), "3.141590");
        assert_eq!(format_value(&float(3.14159), ".2f").unwrap(), "3.14");
        assert_eq!(format_value(&float(2.5), ".0f").unwrap(), "2.");
        assert_eq!(format_value(&float(2.5), ".0Uf").unwrap(), "3.");
        assert_eq!(format_value(&float(-2.5), ".0Zf").unwrap(), "-2.");
        assert_eq!(format_value(&float(1234.5), ".2e").unwrap(), "1.23e+03");
        assert_eq!(format_value(&float(1234.5), ".2E").unwrap(), "1.23E+03");
        assert_eq!(format_value(&float(0.0001), ".3g").unwrap(), "0.0001");
        assert_eq!(format_value(&float(1234567.0), ".3g").unwrap(), "1.23e+06");
        assert_eq!(format_value(&float(100.0), "g").unwrap(), "100.0");
        assert_eq!(format_value(&float(0.25), ".1%").unwrap(), "25.0%");
        assert_eq!(format_value(&float(1234567.5), ",.1f").unwrap(), "1,234,567.5");
        assert_eq!(format_value(&float(1.5), ">8").unwrap(), "     1.5");
        assert_eq!(format_value(&float(-1.5), "=+8.2f").unwrap(), "-   1.50");
        assert!(format_value(&float(1.5), "x").is_err());
    }

    #[test]
    fn test_hex_floats() {
        assert_eq!(format_value(&float(3.0), "a").unwrap(), "0x1.8p+1");
        assert_eq!(format_value(&float(1.0), "a").unwrap(), "0x1.0p+0");
        assert_eq!(format_value(&float(0.5), "A").unwrap(), "0X1.0P-1");
        assert_eq!(format_value(&float(3.0), ".2a").unwrap(), "0x1.80p+1");
        assert_eq!(format_value(&float(0.0), "a").unwrap(), "0x0.0p+0");
        // 1.f8 rounds up past the top digit.
        assert_eq!(format_value(&float(1.96875), ".1a").unwrap(), "0x1.0p+1");
    }

    #[test]
    fn test_specials_and_compound_values() {
        let nan = BoxedValue::Float(Float::exact(BigFloat::nan(53)));
        assert_eq!(format_value(&nan, "f").unwrap(), "nan");
        let inf = BoxedValue::Float(Float::exact(BigFloat::infinity(53, true)));
        assert_eq!(format_value(&inf, "F").unwrap(), "-INF");

        let third = BoxedValue::Rational(Rational::new(BigInt::from(1), BigInt::from(3)).unwrap());
        assert_eq!(format_value(&third, "").unwrap(), "1/3");
        assert_eq!(format_value(&third, ">5").unwrap(), "  1/3");
        assert_eq!(format_value(&third, ".3f").unwrap(), "0.333");
        assert!(format_value(&third, "x").is_err());

        let z = BoxedValue::Complex(Complex::new(
            Float::exact(double(1.0)),
            Float::exact(double(-2.0)),
        ));
        assert_eq!(format_value(&z, "").unwrap(), "(1.0-2.0j)");
        assert_eq!(format_value(&z, ".1f").unwrap(), "1.0-2.0j");
        assert_eq!(format_value(&z, ">12.1f").unwrap(), "    1.0-2.0j");
    }

    #[test]
    fn test_float_to_digits() {
        let x = Float::exact(double(0.75));
        assert_eq!(x.to_digits(10, 3).unwrap(), (false, "750".to_owned(), 0));
        assert_eq!(x.to_digits(2, 2).unwrap(), (false, "11".to_owned(), 0));
        let nan = Float::exact(BigFloat::nan(53));
        assert!(nan.to_digits(10, 0).is_err());
    }
}
