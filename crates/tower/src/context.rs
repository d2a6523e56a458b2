// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

//! Precision and rounding context with IEEE-style sticky flags.

use crate::errors::{TowerError, TowerResult};
use mpt_backend::{BigFloat, FloatClass, RoundingMode, Ternary, MAX_PRECISION};
use mpt_config::{
    validate_exponent_range, validate_min_precision, validate_precision, TowerConfig, Traps,
    DEFAULT_EMAX, DEFAULT_EMIN, DEFAULT_PRECISION,
};
use strum::Display;
use tracing::debug;

/// Guard bits added when a non-dyadic input asks to keep its full precision.
pub const GUARD_BITS: u32 = 16;

/// Requested precision meaning "use the context default".
pub const PRECISION_DEFAULT: u32 = 0;
/// Requested precision meaning "keep the input exact when it is dyadic".
pub const PRECISION_EXACT: u32 = 1;

/// Exceptional conditions tracked by the context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "snake_case")]
pub enum Flag {
    Overflow,
    Underflow,
    Inexact,
    Invalid,
    DivideByZero,
}

/// Sticky flags; each stays set until [`Context::clear_flags`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Flags {
    pub overflow: bool,
    pub underflow: bool,
    pub inexact: bool,
    pub invalid: bool,
    pub divide_by_zero: bool,
}

impl Flags {
    pub fn is_clear(&self) -> bool {
        *self == Flags::default()
    }

    pub fn contains(&self, flag: Flag) -> bool {
        match flag {
            Flag::Overflow => self.overflow,
            Flag::Underflow => self.underflow,
            Flag::Inexact => self.inexact,
            Flag::Invalid => self.invalid,
            Flag::DivideByZero => self.divide_by_zero,
        }
    }

    fn set(&mut self, flag: Flag) {
        match flag {
            Flag::Overflow => self.overflow = true,
            Flag::Underflow => self.underflow = true,
            Flag::Inexact => self.inexact = true,
            Flag::Invalid => self.invalid = true,
            Flag::DivideByZero => self.divide_by_zero = true,
        }
    }
}

fn is_trapped(traps: &Traps, flag: Flag) -> bool {
    match flag {
        Flag::Overflow => traps.overflow,
        Flag::Underflow => traps.underflow,
        Flag::Inexact => traps.inexact,
        Flag::Invalid => traps.invalid,
        Flag::DivideByZero => traps.divide_by_zero,
    }
}

/// Default precision, rounding, exponent range and flags consulted by every
/// float-producing operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Context {
    precision: u32,
    min_precision: u32,
    rounding: RoundingMode,
    emin: i64,
    emax: i64,
    flags: Flags,
    traps: Traps,
    allow_complex: bool,
}

impl Default for Context {
    fn default() -> Self {
        Self {
            precision: DEFAULT_PRECISION,
            min_precision: mpt_backend::MIN_PRECISION,
            rounding: RoundingMode::Nearest,
            emin: DEFAULT_EMIN,
            emax: DEFAULT_EMAX,
            flags: Flags::default(),
            traps: Traps::none(),
            allow_complex: false,
        }
    }
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &TowerConfig) -> TowerResult<Self> {
        config
            .validate()
            .map_err(|err| TowerError::value(err.to_string()))?;
        Ok(Self {
            precision: config.precision,
            min_precision: config.min_precision,
            rounding: config.rounding,
            emin: config.emin,
            emax: config.emax,
            flags: Flags::default(),
            traps: config.traps,
            allow_complex: config.allow_complex,
        })
    }

    pub fn precision(&self) -> u32 {
        self.precision
    }

    pub fn min_precision(&self) -> u32 {
        self.min_precision
    }

    pub fn rounding(&self) -> RoundingMode {
        self.rounding
    }

    pub fn exponent_range(&self) -> (i64, i64) {
        (self.emin, self.emax)
    }

    pub fn flags(&self) -> Flags {
        self.flags
    }

    pub fn traps(&self) -> Traps {
        self.traps
    }

    pub fn allow_complex(&self) -> bool {
        self.allow_complex
    }

    pub fn set_precision(&mut self, precision: u32) -> TowerResult<()> {
        validate_precision(precision, self.min_precision)
            .map_err(|err| TowerError::value(err.to_string()))?;
        debug!(precision, "set default precision");
        self.precision = precision;
        Ok(())
    }

    /// Raises the default precision to the new floor when it falls below it.
    pub fn set_min_precision(&mut self, min_precision: u32) -> TowerResult<()> {
        validate_min_precision(min_precision).map_err(|err| TowerError::value(err.to_string()))?;
        debug!(min_precision, "set minimum precision");
        self.min_precision = min_precision;
        self.precision = self.precision.max(min_precision);
        Ok(())
    }

    pub fn set_rounding(&mut self, rounding: RoundingMode) {
        debug!(%rounding, "set rounding mode");
        self.rounding = rounding;
    }

    pub fn set_exponent_range(&mut self, emin: i64, emax: i64) -> TowerResult<()> {
        validate_exponent_range(emin, emax).map_err(|err| TowerError::value(err.to_string()))?;
        debug!(emin, emax, "set exponent range");
        self.emin = emin;
        self.emax = emax;
        Ok(())
    }

    pub fn set_traps(&mut self, traps: Traps) {
        debug!(?traps, "set traps");
        self.traps = traps;
    }

    pub fn set_allow_complex(&mut self, allow_complex: bool) {
        debug!(allow_complex, "set allow_complex");
        self.allow_complex = allow_complex;
    }

    pub fn clear_flags(&mut self) {
        debug!(flags = ?self.flags, "clear flags");
        self.flags = Flags::default();
    }

    /// Sets `flag`; a trapped flag is turned into an error.
    pub fn raise(&mut self, flag: Flag) -> TowerResult<()> {
        self.flags.set(flag);
        if !is_trapped(&self.traps, flag) {
            return Ok(());
        }
        debug!(%flag, "trapped flag raised");
        Err(match flag {
            Flag::Overflow => TowerError::overflow("overflow trapped"),
            Flag::DivideByZero => TowerError::zero_division("division by zero trapped"),
            Flag::Underflow => TowerError::value("underflow trapped"),
            Flag::Inexact => TowerError::value("inexact result trapped"),
            Flag::Invalid => TowerError::value("invalid operation trapped"),
        })
    }

    /// Resolves a requested precision: `0` is the default, anything else
    /// must lie in `[min_precision, MAX_PRECISION]`.
    pub fn resolve_precision(&self, requested: u32) -> TowerResult<u32> {
        match requested {
            PRECISION_DEFAULT => Ok(self.precision),
            p if p < self.min_precision || p > MAX_PRECISION => Err(TowerError::value(format!(
                "precision must be in {}..={}, got {}",
                self.min_precision, MAX_PRECISION, p
            ))),
            p => Ok(p),
        }
    }

    /// Brings a freshly rounded result into the exponent range and records
    /// its flags.
    pub fn check(&mut self, value: BigFloat, ternary: Ternary) -> TowerResult<(BigFloat, Ternary)> {
        let (value, ternary) = match value.class() {
            FloatClass::Regular if value.exponent() > self.emax => {
                self.raise(Flag::Overflow)?;
                self.saturate_overflow(&value)
            }
            FloatClass::Regular if value.exponent() < self.emin => {
                self.raise(Flag::Underflow)?;
                self.saturate_underflow(&value)
            }
            FloatClass::Infinite if !ternary.is_exact() => {
                self.raise(Flag::Overflow)?;
                self.saturate_overflow(&value)
            }
            FloatClass::Zero if !ternary.is_exact() => {
                self.raise(Flag::Underflow)?;
                self.saturate_underflow(&value)
            }
            FloatClass::Nan => {
                self.raise(Flag::Invalid)?;
                (value, ternary)
            }
            _ => (value, ternary),
        };
        if !ternary.is_exact() {
            self.raise(Flag::Inexact)?;
        }
        Ok((value, ternary))
    }

    /// Largest finite magnitude or infinity, depending on the rounding mode.
    fn saturate_overflow(&self, value: &BigFloat) -> (BigFloat, Ternary) {
        let negative = value.is_sign_negative();
        let precision = value.precision();
        if self.rounds_outward(negative) {
            let ternary = if negative { Ternary::Less } else { Ternary::Greater };
            return (BigFloat::infinity(precision, negative), ternary);
        }
        let max = BigFloat::max_finite(precision, self.emax, negative);
        let ternary = if negative { Ternary::Greater } else { Ternary::Less };
        (max, ternary)
    }

    /// Zero or the smallest regular magnitude, depending on the rounding mode.
    fn saturate_underflow(&self, value: &BigFloat) -> (BigFloat, Ternary) {
        let negative = value.is_sign_negative();
        let precision = value.precision();
        let away = match self.rounding {
            RoundingMode::Nearest => false,
            _ => self.rounds_outward(negative),
        };
        if away {
            let min = BigFloat::min_regular(precision, self.emin, negative);
            let ternary = if negative { Ternary::Less } else { Ternary::Greater };
            return (min, ternary);
        }
        let ternary = if negative { Ternary::Greater } else { Ternary::Less };
        (BigFloat::signed_zero(precision, negative), ternary)
    }

    /// Whether the rounding mode moves a value of this sign away from zero.
    fn rounds_outward(&self, negative: bool) -> bool {
        match self.rounding {
            RoundingMode::Nearest | RoundingMode::AwayFromZero => true,
            RoundingMode::TowardZero => false,
            RoundingMode::TowardPositive => !negative,
            RoundingMode::TowardNegative => negative,
        }
    }
}
