// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

//! Conversion between boxed values and text.

pub mod format;
pub mod parse;

pub use format::{format_value, FormatSpec};
pub use parse::{parse_complex, parse_float, parse_float_radix, parse_integer, parse_rational};
