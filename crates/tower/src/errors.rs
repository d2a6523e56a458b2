// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

//! Error types for tower operations.

use crate::codec::CodecError;
use mpt_backend::BackendError;
use strum::Display;
use thiserror::Error;

/// Host-level category of a [`TowerError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum ErrorKind {
    TypeError,
    ValueError,
    ZeroDivisionError,
    OverflowError,
}

/// Errors raised by the tower. Each variant maps onto one host exception kind.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TowerError {
    /// Operand not numeric, or of the wrong kind for an entry point
    #[error("TypeError: {message}")]
    Type { message: String },

    /// Out-of-range argument, malformed encoding or non-finite input
    #[error("ValueError: {message}")]
    Value { message: String },

    /// Division-family operator with an exact zero divisor
    #[error("ZeroDivisionError: {message}")]
    ZeroDivision { message: String },

    /// Exponent or shift beyond what the platform can represent
    #[error("OverflowError: {message}")]
    Overflow { message: String },
}

impl TowerError {
    pub fn type_error(message: impl Into<String>) -> Self {
        TowerError::Type {
            message: message.into(),
        }
    }

    pub fn value(message: impl Into<String>) -> Self {
        TowerError::Value {
            message: message.into(),
        }
    }

    pub fn zero_division(message: impl Into<String>) -> Self {
        TowerError::ZeroDivision {
            message: message.into(),
        }
    }

    pub fn overflow(message: impl Into<String>) -> Self {
        TowerError::Overflow {
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            TowerError::Type { .. } => ErrorKind::TypeError,
            TowerError::Value { .. } => ErrorKind::ValueError,
            TowerError::ZeroDivision { .. } => ErrorKind::ZeroDivisionError,
            TowerError::Overflow { .. } => ErrorKind::OverflowError,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            TowerError::Type { message }
            | TowerError::Value { message }
            | TowerError::ZeroDivision { message }
            | TowerError::Overflow { message } => message,
        }
    }
}

impl From<BackendError> for TowerError {
    fn from(err: BackendError) -> Self {
        let message = err.to_string();
        match err {
            BackendError::DivisionByZero => TowerError::zero_division(message),
            BackendError::ExponentOverflow { .. } => TowerError::overflow(message),
            BackendError::InvalidBase { .. }
            | BackendError::InvalidDigits { .. }
            | BackendError::PrecisionOutOfRange { .. }
            | BackendError::NotFinite
            | BackendError::InvalidOperation { .. }
            | BackendError::MalformedMantissa { .. } => TowerError::value(message),
        }
    }
}

impl From<CodecError> for TowerError {
    fn from(err: CodecError) -> Self {
        TowerError::value(err.to_string())
    }
}

/// Result type alias for tower operations
pub type TowerResult<T> = Result<T, TowerError>;
