// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

//! Error types for backend operations.

use thiserror::Error;

/// Errors that can occur inside the arithmetic backend.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// Division by an exact zero
    #[error("Division by zero")]
    DivisionByZero,

    /// Radix outside of the supported range
    #[error("Invalid base: {base} (expected 2..={max})")]
    InvalidBase { base: u32, max: u32 },

    /// Malformed digit string
    #[error("Invalid digits: {message}")]
    InvalidDigits { message: String },

    /// Requested precision outside of `MIN_PRECISION..=MAX_PRECISION`
    #[error("Precision out of range: {precision}")]
    PrecisionOutOfRange { precision: u64 },

    /// A finite value was required
    #[error("Value is not finite")]
    NotFinite,

    /// Exponent or shift that cannot be represented
    #[error("Exponent overflow: {message}")]
    ExponentOverflow { message: String },

    /// Operation with no real result (e.g. `sqrt(-1)`)
    #[error("Invalid operation: {message}")]
    InvalidOperation { message: String },

    /// Raw mantissa that does not satisfy the normalization rules
    #[error("Malformed mantissa: {message}")]
    MalformedMantissa { message: String },
}

impl BackendError {
    pub fn invalid_digits(message: impl Into<String>) -> Self {
        BackendError::InvalidDigits {
            message: message.into(),
        }
    }

    pub fn invalid_operation(message: impl Into<String>) -> Self {
        BackendError::InvalidOperation {
            message: message.into(),
        }
    }

    pub fn exponent_overflow(message: impl Into<String>) -> Self {
        BackendError::ExponentOverflow {
            message: message.into(),
        }
    }
}

/// Result type alias for backend operations
pub type BackendResult<T> = Result<T, BackendError>;
