//! Error types for labseq.
//!
//! Structured error handling with stable error codes and category
//! classification. Errors fall into two groups: configuration errors
//! (caught before any row or sample is processed) and data validity
//! errors (bad inputs that make a run meaningless). Neither is retried;
//! hook panics during row processing are deliberately not caught here.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for labseq operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error categories for grouping related errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Missing hooks, unsupported metric names, missing parameters.
    Config,
    /// Inputs that cannot produce a meaningful result.
    Data,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCategory::Config => write!(f, "config"),
            ErrorCategory::Data => write!(f, "data"),
        }
    }
}

/// Unified error type for labseq.
///
/// Serializes as an externally tagged enum, so consumers can log or
/// transport the structured form alongside `code()` and `category()`.
#[derive(Error, Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Error {
    // Configuration errors (10-19)
    #[error("configuration error: {0}")]
    Config(String),

    #[error("missing required hook(s): {roles}")]
    MissingHook { roles: String },

    #[error("score metric not supported: {name}")]
    UnsupportedMetric { name: String },

    #[error("metric {metric} requires parameter {name}")]
    MissingParameter { metric: String, name: String },

    // Data validity errors (20-29)
    #[error("empty input: {0}")]
    EmptyInput(String),

    #[error("length mismatch for {field}: expected {expected}, got {actual}")]
    LengthMismatch {
        field: String,
        expected: usize,
        actual: usize,
    },

    #[error("test labels contain samples of only one class: {label}")]
    SingleClass { label: String },

    #[error("invalid probability: {0} (must be in [0, 1])")]
    InvalidProbability(f64),
}

impl Error {
    /// Returns the stable error code for this error.
    ///
    /// Codes are grouped by category:
    /// - 10-19: Configuration errors
    /// - 20-29: Data validity errors
    pub fn code(&self) -> u32 {
        match self {
            Error::Config(_) => 10,
            Error::MissingHook { .. } => 11,
            Error::UnsupportedMetric { .. } => 12,
            Error::MissingParameter { .. } => 13,
            Error::EmptyInput(_) => 20,
            Error::LengthMismatch { .. } => 21,
            Error::SingleClass { .. } => 22,
            Error::InvalidProbability(_) => 23,
        }
    }

    /// Returns the error category for grouping and filtering.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Config(_)
            | Error::MissingHook { .. }
            | Error::UnsupportedMetric { .. }
            | Error::MissingParameter { .. } => ErrorCategory::Config,

            Error::EmptyInput(_)
            | Error::LengthMismatch { .. }
            | Error::SingleClass { .. }
            | Error::InvalidProbability(_) => ErrorCategory::Data,
        }
    }
}
