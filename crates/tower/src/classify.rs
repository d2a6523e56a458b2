// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::host::NumericProtocol;
use crate::value::BoxedValue;
use strum::Display;

/// Position of a value on the promotion lattice, or outside of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display)]
pub enum NumericKind {
    IntegerLike,
    RationalLike,
    FloatLike,
    ComplexLike,
    NotANumber,
}

impl NumericKind {
    pub fn is_numeric(self) -> bool {
        self != NumericKind::NotANumber
    }

    /// Least common kind of two numeric kinds.
    pub fn join(self, other: NumericKind) -> NumericKind {
        self.max(other)
    }
}

/// Classifies by capability; never constructs a boxed value.
pub fn classify<T: NumericProtocol + ?Sized>(value: &T) -> NumericKind {
    if let Some(boxed) = value.as_boxed() {
        return match boxed {
            BoxedValue::Integer(_) => NumericKind::IntegerLike,
            BoxedValue::Rational(_) => NumericKind::RationalLike,
            BoxedValue::Float(_) => NumericKind::FloatLike,
            BoxedValue::Complex(_) => NumericKind::ComplexLike,
        };
    }
    if value.as_small_int().is_some() || value.as_index().is_some() {
        NumericKind::IntegerLike
    } else if value.as_ratio().is_some() {
        NumericKind::RationalLike
    } else if value.as_decimal().is_some() || value.as_f64().is_some() {
        NumericKind::FloatLike
    } else if value.as_complex().is_some() {
        NumericKind::ComplexLike
    } else {
        NumericKind::NotANumber
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{Decimal, Fraction, HostValue};
    use crate::value::{Integer, Rational};
    use num_bigint::BigInt;

    #[test]
    fn test_host_values() {
        assert_eq!(classify(&HostValue::Int(3)), NumericKind::IntegerLike);
        assert_eq!(classify(&HostValue::Bool(true)), NumericKind::IntegerLike);
        assert_eq!(
            classify(&HostValue::BigInt(BigInt::from(10).pow(40))),
            NumericKind::IntegerLike
        );
        assert_eq!(
            classify(&HostValue::Fraction(Fraction::new(1, 3))),
            NumericKind::RationalLike
        );
        assert_eq!(classify(&HostValue::Double(0.5)), NumericKind::FloatLike);
        assert_eq!(
            classify(&HostValue::Decimal(Decimal::new(15, -1))),
            NumericKind::FloatLike
        );
        assert_eq!(
            classify(&HostValue::NativeComplex { re: 1.0, im: 2.0 }),
            NumericKind::ComplexLike
        );
        assert_eq!(classify(&HostValue::Str("1".into())), NumericKind::NotANumber);
        assert_eq!(classify(&HostValue::None), NumericKind::NotANumber);
    }

    #[test]
    fn test_boxed_and_native() {
        let q = BoxedValue::from(Rational::new(BigInt::from(1), BigInt::from(2)).unwrap());
        assert_eq!(classify(&q), NumericKind::RationalLike);
        assert_eq!(classify(&HostValue::Boxed(q)), NumericKind::RationalLike);
        assert_eq!(
            classify(&BoxedValue::from(Integer::from(1))),
            NumericKind::IntegerLike
        );
        assert_eq!(classify(&7i64), NumericKind::IntegerLike);
        assert_eq!(classify(&f64::NAN), NumericKind::FloatLike);
        assert_eq!(classify(&BigInt::from(1)), NumericKind::IntegerLike);
    }

    #[test]
    fn test_join_follows_lattice() {
        use NumericKind::*;
        assert_eq!(IntegerLike.join(RationalLike), RationalLike);
        assert_eq!(FloatLike.join(RationalLike), FloatLike);
        assert_eq!(FloatLike.join(ComplexLike), ComplexLike);
    }
}
