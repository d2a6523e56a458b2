// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use anyhow::bail;
use anyhow::Context;
use anyhow::Result;
use figment::{
    providers::{Env, Format, Serialized, Yaml},
    Figment,
};
use mpt_backend::{RoundingMode, MAX_PRECISION, MIN_PRECISION};
use serde::{Deserialize, Serialize};
use std::{env, path::PathBuf};
use tracing::debug;

/// Environment variable naming an optional YAML configuration file
pub const CONFIG_PATH_VAR: &str = "MPT_CONFIG";
/// Prefix of environment overrides, e.g. `MPT_PRECISION=113`
pub const ENV_PREFIX: &str = "MPT_";

/// Native double mantissa width
pub const DEFAULT_PRECISION: u32 = f64::MANTISSA_DIGITS;
pub const DEFAULT_EMAX: i64 = (1 << 30) - 1;
pub const DEFAULT_EMIN: i64 = -DEFAULT_EMAX;
/// Largest magnitude accepted for either end of the exponent range, the
/// widest range the float backend represents
pub const MAX_EXPONENT_LIMIT: i64 = DEFAULT_EMAX;
pub const DEFAULT_CACHE_SIZE: usize = 100;
pub const MAX_CACHE_SIZE: usize = 1000;
pub const DEFAULT_MAX_CACHED_LIMBS: usize = 128;
pub const MAX_CACHED_LIMBS: usize = 16384;

/// Exceptional conditions that are raised as errors instead of only setting
/// the matching sticky flag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(default)]
#[serde(deny_unknown_fields)]
pub struct Traps {
    pub overflow: bool,
    pub underflow: bool,
    pub inexact: bool,
    pub invalid: bool,
    pub divide_by_zero: bool,
}

impl Traps {
    pub fn none() -> Self {
        Self::default()
    }
}

/// Tunables read when a tower context is activated.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
#[serde(deny_unknown_fields)]
pub struct TowerConfig {
    /// Default float precision in bits
    pub precision: u32,
    /// Floor below which no precision may be requested
    pub min_precision: u32,
    /// Rounding mode used for every rounded result
    pub rounding: RoundingMode,
    /// Smallest binary exponent a regular float may carry
    pub emin: i64,
    /// Largest binary exponent a regular float may carry
    pub emax: i64,
    /// Free-list length per value kind
    pub cache_size: usize,
    /// Values larger than this many 64-bit limbs are never cached
    pub max_cached_limbs: usize,
    /// Real square roots of negative values produce complex results
    pub allow_complex: bool,
    pub traps: Traps,
}

impl Default for TowerConfig {
    fn default() -> Self {
        Self {
            precision: DEFAULT_PRECISION,
            min_precision: MIN_PRECISION,
            rounding: RoundingMode::default(),
            emin: DEFAULT_EMIN,
            emax: DEFAULT_EMAX,
            cache_size: DEFAULT_CACHE_SIZE,
            max_cached_limbs: DEFAULT_MAX_CACHED_LIMBS,
            allow_complex: false,
            traps: Traps::none(),
        }
    }
}

impl TowerConfig {
    /// Loads defaults, then the YAML file named by `MPT_CONFIG` when set, then
    /// `MPT_*` environment overrides. Nested trap keys use `__`, e.g.
    /// `MPT_TRAPS__INEXACT=true`.
    pub fn load() -> Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(TowerConfig::default()));

        if let Some(path) = env::var_os(CONFIG_PATH_VAR).map(PathBuf::from) {
            if !path.exists() {
                bail!("Configuration file not found: {}", path.display());
            }
            figment = figment.merge(Yaml::file(&path));
        }

        let config: TowerConfig = figment
            .merge(Env::prefixed(ENV_PREFIX).ignore(&["config"]).split("__"))
            .extract()
            .context("Could not parse configuration")?;

        config.validate()?;
        debug!(
            precision = config.precision,
            rounding = %config.rounding,
            cache_size = config.cache_size,
            "loaded tower configuration"
        );
        Ok(config)
    }

    /// Checks every field against the bounds the context setters enforce.
    pub fn validate(&self) -> Result<()> {
        validate_min_precision(self.min_precision)?;
        validate_precision(self.precision, self.min_precision)?;
        validate_exponent_range(self.emin, self.emax)?;
        validate_cache_size(self.cache_size)?;
        validate_max_cached_limbs(self.max_cached_limbs)?;
        Ok(())
    }
}

pub fn validate_min_precision(min_precision: u32) -> Result<()> {
    if !(MIN_PRECISION..=MAX_PRECISION).contains(&min_precision) {
        bail!(
            "minimum precision must be in {}..={}, got {}",
            MIN_PRECISION,
            MAX_PRECISION,
            min_precision
        );
    }
    Ok(())
}

pub fn validate_precision(precision: u32, min_precision: u32) -> Result<()> {
    if !(min_precision..=MAX_PRECISION).contains(&precision) {
        bail!(
            "precision must be in {}..={}, got {}",
            min_precision,
            MAX_PRECISION,
            precision
        );
    }
    Ok(())
}

pub fn validate_exponent_range(emin: i64, emax: i64) -> Result<()> {
    if emin >= 0 || emax <= 0 {
        bail!("exponent range must satisfy emin < 0 < emax, got [{emin}, {emax}]");
    }
    if emin < -MAX_EXPONENT_LIMIT || emax > MAX_EXPONENT_LIMIT {
        bail!("exponent range [{emin}, {emax}] exceeds ±{MAX_EXPONENT_LIMIT}");
    }
    Ok(())
}

pub fn validate_cache_size(cache_size: usize) -> Result<()> {
    if cache_size > MAX_CACHE_SIZE {
        bail!("cache size must be at most {MAX_CACHE_SIZE}, got {cache_size}");
    }
    Ok(())
}

pub fn validate_max_cached_limbs(limbs: usize) -> Result<()> {
    if limbs > MAX_CACHED_LIMBS {
        bail!("cached limb ceiling must be at most {MAX_CACHED_LIMBS}, got {limbs}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn test_defaults() {
        let config = TowerConfig::default();
        assert_eq!(config.precision, 53);
        assert_eq!(config.rounding, RoundingMode::Nearest);
        assert_eq!(config.emin, -config.emax);
        assert_eq!(config.traps, Traps::none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_deserialization() -> Result<()> {
        let config: TowerConfig = serde_yaml::from_str(
            r#"
precision: 113
rounding: toward_negative
traps:
  inexact: true
"#,
        )?;
        assert_eq!(config.precision, 113);
        assert_eq!(config.rounding, RoundingMode::TowardNegative);
        assert!(config.traps.inexact);
        assert!(!config.traps.overflow);
        assert_eq!(config.cache_size, DEFAULT_CACHE_SIZE);

        let unknown = serde_yaml::from_str::<TowerConfig>("precison: 10");
        assert!(unknown.is_err());
        Ok(())
    }

    #[test]
    fn test_validation_bounds() {
        let mut config = TowerConfig::default();
        config.precision = 1;
        assert!(config.validate().is_err());

        let mut config = TowerConfig::default();
        config.min_precision = 64;
        assert!(config.validate().is_err());

        let mut config = TowerConfig::default();
        config.emin = 5;
        assert!(config.validate().is_err());

        let mut config = TowerConfig::default();
        config.emax = MAX_EXPONENT_LIMIT + 1;
        assert!(config.validate().is_err());

        let mut config = TowerConfig::default();
        config.cache_size = MAX_CACHE_SIZE + 1;
        assert!(config.validate().is_err());

        let mut config = TowerConfig::default();
        config.max_cached_limbs = MAX_CACHED_LIMBS + 1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_file_and_env() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "mpt.yaml",
                r#"
precision: 200
rounding: toward_zero
cache_size: 10
"#,
            )?;
            jail.set_env(CONFIG_PATH_VAR, "mpt.yaml");
            jail.set_env("MPT_CACHE_SIZE", "20");
            jail.set_env("MPT_TRAPS__OVERFLOW", "true");

            let config = TowerConfig::load().map_err(|e| e.to_string())?;
            assert_eq!(config.precision, 200);
            assert_eq!(config.rounding, RoundingMode::TowardZero);
            assert_eq!(config.cache_size, 20);
            assert!(config.traps.overflow);
            assert_eq!(config.emax, DEFAULT_EMAX);
            Ok(())
        });
    }

    #[test]
    fn test_load_without_file() {
        Jail::expect_with(|jail| {
            jail.set_env("MPT_PRECISION", "64");
            let config = TowerConfig::load().map_err(|e| e.to_string())?;
            assert_eq!(config.precision, 64);
            Ok(())
        });
    }

    #[test]
    fn test_load_rejects_missing_file_and_bad_values() {
        Jail::expect_with(|jail| {
            jail.set_env(CONFIG_PATH_VAR, "/nope/mpt.yaml");
            assert!(TowerConfig::load().is_err());

            jail.clear_env();
            jail.set_env("MPT_CACHE_SIZE", "5000");
            assert!(TowerConfig::load().is_err());
            Ok(())
        });
    }
}
