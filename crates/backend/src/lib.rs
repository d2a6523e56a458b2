// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

//! # Arithmetic Backend
//!
//! Arbitrary-precision arithmetic primitives used by the numeric tower.
//!
//! ## Features
//!
//! - Uses `num-bigint` for integer magnitudes and `num` rationals for exact values.
//! - [`BigFloat`]: an MPFR float (through `rug`) with an explicit bit precision,
//!   five rounding modes and a ternary result code for every rounded operation.
//! - Machine-word fast paths for integer arithmetic.
//! - Radix conversion for bases 2 through 62.
//!
//! ## Representation
//!
//! A regular `BigFloat` of precision `p` stores a mantissa of exactly `p` bits
//! with the top bit set and an exponent `e` so that its value is `0.m × 2^e`.
//! This is the layout the binary codec exports limb by limb.

pub mod arith;
pub mod errors;
pub mod float;
pub mod integer;
pub mod radix;
pub mod round;

pub use errors::{BackendError, BackendResult};
pub use float::{BigFloat, FloatClass, EXPONENT_LIMIT, MAX_PRECISION, MIN_PRECISION};
pub use round::{RoundingMode, Ternary};
