// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

//! # Numeric Tower
//!
//! Integers, rationals, binary floats and complex numbers for a
//! dynamically typed host, with promotion across mixed-type arithmetic.
//!
//! ## Features
//!
//! - [`Tower`]: owns a [`Context`] and a [`ValueCache`] and dispatches every
//!   binary operator over the promotion lattice Integer ⊂ Rational ⊂ Float ⊂ Complex.
//! - Sticky IEEE-style flags and traps in the [`Context`].
//! - A portable binary codec whose output does not depend on the limb width.
//! - Best rational approximation of floats.
//! - Text parsing and a format-spec mini-language.
//! - A per-thread default tower in [`local`].
//!
//! ## Example
//!
//! ```
//! use mpt_tower::{HostValue, Tower};
//!
//! let mut tower = Tower::new();
//! let third = tower.true_div(&HostValue::Int(1), &HostValue::Int(3)).unwrap();
//! assert!(tower.context().flags().inexact);
//! assert_eq!(third.to_string(), "0.33333333333333331");
//! ```

pub mod approx;
pub mod cache;
pub mod classify;
pub mod codec;
pub mod coerce;
pub mod context;
pub mod dispatch;
pub mod errors;
pub mod hash;
pub mod host;
pub mod local;
pub mod text;
pub mod value;

pub use approx::approximate;
pub use cache::{CacheKind, Uninit, ValueCache};
pub use classify::{classify, NumericKind};
pub use codec::{decode, decode_with, encode, encode_with, CodecError, LimbWidth};
pub use context::{Context, Flag, Flags};
pub use dispatch::{BinaryOp, CompareOp, Comparison, Dispatched, Operator, Tower};
pub use errors::{ErrorKind, TowerError, TowerResult};
pub use host::{Decimal, Fraction, HostValue, NumericProtocol};
pub use value::{BoxedValue, Complex, Float, Integer, Rational, ValueKind};
