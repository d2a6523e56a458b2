// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

//! Rounding modes and ternary result codes.

use rug::float::Round;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use strum::{Display, EnumString};

/// Rounding direction applied whenever an exact result does not fit the
/// target precision.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RoundingMode {
    /// Round to nearest, ties to even
    #[default]
    Nearest,
    /// Truncate toward zero
    TowardZero,
    /// Round toward +∞
    TowardPositive,
    /// Round toward −∞
    TowardNegative,
    /// Round away from zero
    AwayFromZero,
}

impl RoundingMode {
    /// Stable byte used by the binary codec.
    pub fn to_byte(self) -> u8 {
        match self {
            RoundingMode::Nearest => 0,
            RoundingMode::TowardZero => 1,
            RoundingMode::TowardPositive => 2,
            RoundingMode::TowardNegative => 3,
            RoundingMode::AwayFromZero => 4,
        }
    }

    pub fn from_byte(byte: u8) -> Option<Self> {
        Some(match byte {
            0 => RoundingMode::Nearest,
            1 => RoundingMode::TowardZero,
            2 => RoundingMode::TowardPositive,
            3 => RoundingMode::TowardNegative,
            4 => RoundingMode::AwayFromZero,
            _ => return None,
        })
    }

    /// Decides whether a truncated magnitude must be incremented.
    ///
    /// * `negative` - sign of the exact value
    /// * `round_bit` - first discarded bit
    /// * `sticky` - any discarded bit below the round bit, or a known inexact tail
    /// * `odd` - parity of the truncated magnitude
    pub fn rounds_away(self, negative: bool, round_bit: bool, sticky: bool, odd: bool) -> bool {
        let inexact = round_bit || sticky;
        match self {
            RoundingMode::Nearest => round_bit && (sticky || odd),
            RoundingMode::TowardZero => false,
            RoundingMode::TowardPositive => inexact && !negative,
            RoundingMode::TowardNegative => inexact && negative,
            RoundingMode::AwayFromZero => inexact,
        }
    }
}

impl From<RoundingMode> for Round {
    fn from(mode: RoundingMode) -> Self {
        match mode {
            RoundingMode::Nearest => Round::Nearest,
            RoundingMode::TowardZero => Round::Zero,
            RoundingMode::TowardPositive => Round::Up,
            RoundingMode::TowardNegative => Round::Down,
            RoundingMode::AwayFromZero => Round::AwayZero,
        }
    }
}

/// Relation between a rounded result and the exact mathematical value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Ternary {
    #[default]
    Exact,
    /// The rounded result is greater than the exact value
    Greater,
    /// The rounded result is less than the exact value
    Less,
}

impl Ternary {
    pub fn is_exact(self) -> bool {
        self == Ternary::Exact
    }

    pub fn negate(self) -> Self {
        match self {
            Ternary::Exact => Ternary::Exact,
            Ternary::Greater => Ternary::Less,
            Ternary::Less => Ternary::Greater,
        }
    }

    /// Byte used by the binary codec: 0 exact, 1 greater, 2 less.
    pub fn to_byte(self) -> u8 {
        match self {
            Ternary::Exact => 0,
            Ternary::Greater => 1,
            Ternary::Less => 2,
        }
    }

    pub fn from_byte(byte: u8) -> Option<Self> {
        Some(match byte {
            0 => Ternary::Exact,
            1 => Ternary::Greater,
            2 => Ternary::Less,
            _ => return None,
        })
    }
}

/// MPFR reports how the rounded result compares with the exact value.
impl From<Ordering> for Ternary {
    fn from(ordering: Ordering) -> Self {
        match ordering {
            Ordering::Equal => Ternary::Exact,
            Ordering::Greater => Ternary::Greater,
            Ordering::Less => Ternary::Less,
        }
    }
}
