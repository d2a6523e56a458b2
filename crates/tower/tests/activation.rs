// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use figment::Jail;
use mpt_backend::RoundingMode;
use mpt_tower::{local, HostValue};
use tracing_subscriber::{fmt, EnvFilter};

fn with_tracing<R>(f: impl FnOnce() -> R) -> R {
    let subscriber = fmt()
        .with_env_filter(EnvFilter::new("info"))
        .with_test_writer()
        .finish();
    tracing::subscriber::with_default(subscriber, f)
}

#[test]
fn test_activation_reads_environment() {
    Jail::expect_with(|jail| {
        jail.set_env("MPT_PRECISION", "113");
        jail.set_env("MPT_ROUNDING", "toward_zero");
        jail.set_env("MPT_CACHE_SIZE", "7");
        with_tracing(|| {
            local::reset();
            assert_eq!(local::precision(), 113);
            assert_eq!(local::rounding(), RoundingMode::TowardZero);
            assert_eq!(local::cache_size(), 7);
            local::reset();
        });
        Ok(())
    });
}

#[test]
fn test_bad_configuration_falls_back_to_defaults() {
    Jail::expect_with(|jail| {
        jail.set_env("MPT_PRECISION", "1");
        with_tracing(|| {
            local::reset();
            assert_eq!(local::precision(), 53);
            assert_eq!(local::rounding(), RoundingMode::Nearest);
            local::reset();
        });
        Ok(())
    });
}

#[test]
fn test_thread_tower_follows_its_context() {
    Jail::expect_with(|_| {
        with_tracing(|| {
            local::reset();
            local::set_precision(24).expect("valid precision");
            let third = local::with_tower(|t| t.true_div(&HostValue::Int(1), &HostValue::Int(3)))
                .expect("division");
            assert_eq!(third.as_float().map(|f| f.precision()), Some(24));
            assert!(local::flags().inexact);

            local::set_allow_complex(true);
            let root = local::with_tower(|t| t.sqrt(&HostValue::Int(-4))).expect("complex root");
            assert_eq!(root.to_string(), "(0.0+2.0j)");

            local::clear_flags();
            assert!(local::flags().is_clear());
            local::reset();
        });
        Ok(())
    });
}
