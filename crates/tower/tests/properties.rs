// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use anyhow::Result;
use mpt_tower::coerce::to_float;
use mpt_tower::text::parse_float;
use mpt_tower::{
    approximate, decode, decode_with, encode, encode_with, BoxedValue, CacheKind, Context,
    ErrorKind, Float, HostValue, Integer, LimbWidth, Rational, Tower, ValueCache, ValueKind,
};
use num_bigint::BigInt;
use num_traits::{Signed, Zero};
use proptest::prelude::*;
use tracing::subscriber::DefaultGuard;
use tracing_subscriber::{fmt, EnvFilter};

fn init_tracing() -> DefaultGuard {
    let subscriber = fmt()
        .with_env_filter(EnvFilter::new("debug"))
        .with_test_writer()
        .finish();
    tracing::subscriber::set_default(subscriber)
}

fn int(value: impl Into<BigInt>) -> HostValue {
    HostValue::Boxed(BoxedValue::Integer(Integer::new(value.into())))
}

fn ratio(num: i64, den: i64) -> HostValue {
    let value = Rational::new(BigInt::from(num), BigInt::from(den)).expect("non-zero denominator");
    HostValue::Boxed(BoxedValue::Rational(value))
}

fn as_bigint(value: &BoxedValue) -> BigInt {
    value.as_integer().expect("integer result").value().clone()
}

#[test]
fn test_integer_power_is_exact_and_flag_free() -> Result<()> {
    let _guard = init_tracing();
    let mut tower = Tower::new();
    let result = tower.pow(&int(2), &int(10))?;
    assert_eq!(result.kind(), ValueKind::Integer);
    assert_eq!(as_bigint(&result), BigInt::from(1024));
    assert!(tower.context().flags().is_clear());
    Ok(())
}

#[test]
fn test_point_one_plus_point_two() -> Result<()> {
    let _guard = init_tracing();
    let mut ctx = Context::new();
    let a = parse_float("0.1", 53, &mut ctx)?;
    let b = parse_float("0.2", 53, &mut ctx)?;
    let three = parse_float("0.3", 53, &mut ctx)?;

    let mut tower = Tower::new();
    let sum = tower.add(&HostValue::from(BoxedValue::from(a)), &HostValue::from(BoxedValue::from(b)))?;
    assert!(tower.context().flags().inexact);

    let sum = sum.as_float().expect("float result");
    assert_eq!(sum.precision(), 53);
    assert_ne!(sum.value(), three.value());
    assert_eq!(sum.to_digits(10, 1)?, three.to_digits(10, 1)?);
    assert_eq!(sum.to_string(), "0.30000000000000004");
    Ok(())
}

#[test]
fn test_promotion_never_demotes() -> Result<()> {
    let _guard = init_tracing();
    let mut tower = Tower::new();
    let half = ratio(1, 2);
    assert_eq!(tower.add(&int(1), &half)?.kind(), ValueKind::Rational);
    assert_eq!(tower.mul(&half, &int(4))?.kind(), ValueKind::Rational);
    assert_eq!(tower.add(&half, &HostValue::Double(0.5))?.kind(), ValueKind::Float);
    assert_eq!(tower.sub(&HostValue::Double(1.5), &half)?.kind(), ValueKind::Float);
    let z = HostValue::NativeComplex { re: 0.0, im: 1.0 };
    assert_eq!(tower.mul(&half, &z)?.kind(), ValueKind::Complex);
    Ok(())
}

#[test]
fn test_division_by_exact_zero() {
    let _guard = init_tracing();
    let mut tower = Tower::new();
    let err = tower.floor_div(&int(7), &int(0)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ZeroDivisionError);
    let err = tower.true_div(&ratio(1, 2), &ratio(0, 1)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ZeroDivisionError);
    let err = tower.modulo(&int(7), &HostValue::Int(0)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ZeroDivisionError);
}

#[test]
fn test_cache_bound_after_overfilling() {
    let _guard = init_tracing();
    let mut cache = ValueCache::new(5, 64);
    for i in 0..12 {
        cache.checkin_integer(Integer::from(i));
        cache.checkin_rational(Rational::new(BigInt::from(i), BigInt::from(7)).expect("valid"));
    }
    assert_eq!(cache.len(CacheKind::Integer), 5);
    assert_eq!(cache.len(CacheKind::Rational), 5);
}

#[test]
fn test_codec_survives_tower_results() -> Result<()> {
    let _guard = init_tracing();
    let mut tower = Tower::new();
    let values = [
        tower.pow(&int(3), &int(200))?,
        tower.true_div(&ratio(-22, 7), &int(3))?,
        tower.true_div(&int(1), &int(3))?,
        tower.sqrt(&HostValue::Int(2))?,
        tower.mul(&HostValue::NativeComplex { re: 1.5, im: -2.0 }, &int(3))?,
    ];
    for value in &values {
        assert_eq!(&decode(&encode(value)?)?, value);
    }
    Ok(())
}

proptest! {
    #[test]
    fn floor_division_identity(a in any::<i64>(), b in any::<i64>(), wide in 0u32..3) {
        prop_assume!(b != 0);
        let a = BigInt::from(a) << (64 * wide);
        let b = BigInt::from(b);
        let mut tower = Tower::new();
        let (q, r) = tower.divmod(&int(a.clone()), &int(b.clone())).unwrap();
        let (q, r) = (as_bigint(&q), as_bigint(&r));
        prop_assert_eq!(&q * &b + &r, a);
        prop_assert!(r.is_zero() || r.is_negative() == b.is_negative());
        prop_assert!(r.abs() < b.abs());
    }

    #[test]
    fn rational_codec_round_trip(a in -10_000i64..10_000, b in 1i64..10_000, c in -500i64..500) {
        prop_assume!(c != 0);
        let mut tower = Tower::new();
        let q = tower.true_div(&ratio(a, b), &HostValue::Int(c)).unwrap();
        prop_assert_eq!(&decode(&encode(&q).unwrap()).unwrap(), &q);
        let base = BoxedValue::Rational(Rational::new(BigInt::from(a), BigInt::from(b)).unwrap());
        prop_assert_eq!(decode(&encode(&base).unwrap()).unwrap(), base);
    }

    #[test]
    fn requested_precision_is_kept(x in -1e300f64..1e300, p in 2u32..2048) {
        let mut ctx = Context::new();
        let f = to_float(&HostValue::Double(x), p, &mut ctx).unwrap();
        prop_assert_eq!(f.precision(), p);
        prop_assert_eq!(f.requested_precision(), p);
        let text = format!("{x:e}");
        let g = parse_float(&text, p, &mut ctx).unwrap();
        prop_assert_eq!(g.precision(), p);
    }

    #[test]
    fn approximation_is_idempotent(n in -1_000_000i64..1_000_000, shift in 0u32..40) {
        let value = BigInt::from(n);
        let den = BigInt::from(1u64 << shift);
        let exact = Rational::new(value.clone(), den.clone()).unwrap();
        let mut ctx = Context::new();
        let f = to_float(&HostValue::from(BoxedValue::Rational(exact.clone())), 64, &mut ctx).unwrap();
        let back = approximate(&f, None).unwrap();
        if exact.is_integer() {
            prop_assert_eq!(back.kind(), ValueKind::Integer);
        }
        prop_assert_eq!(back, BoxedValue::Rational(exact));
    }

    #[test]
    fn codec_is_limb_width_independent(x in any::<f64>(), p in 2u32..400) {
        prop_assume!(x.is_finite());
        let mut ctx = Context::new();
        let f = BoxedValue::Float(to_float(&HostValue::Double(x), p, &mut ctx).unwrap());
        let wide = encode_with(&f, LimbWidth::W64).unwrap();
        prop_assert_eq!(&decode_with(&wide, LimbWidth::W32).unwrap(), &f);
        let narrow = encode_with(&f, LimbWidth::W32).unwrap();
        prop_assert_eq!(&decode_with(&narrow, LimbWidth::W64).unwrap(), &f);
        let decoded = decode_with(&narrow, LimbWidth::W64).unwrap();
        let decoded: &Float = decoded.as_float().unwrap();
        prop_assert_eq!(decoded.precision(), p);
    }
}
