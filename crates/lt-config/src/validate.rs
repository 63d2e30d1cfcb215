//! Semantic validation errors for scan configurations.
//!
//! Every variant here is fatal: the engine rejects the configuration before
//! any input file is touched.

use thiserror::Error;

/// Errors raised while loading or compiling a scan configuration.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("failed to read configuration: {0}")]
    IoError(String),

    #[error("invalid configuration document: {0}")]
    ParseError(String),

    #[error("unknown comparison operator '{0}' (expected one of >, <, >=, <=, =)")]
    InvalidOperator(String),

    #[error("unknown threshold combine policy '{0}' (expected 'any' or 'all')")]
    InvalidCombinePolicy(String),

    #[error("number_of_days and end_date are mutually exclusive")]
    ConflictingDateOptions,

    #[error("number_of_days must be positive")]
    InvalidDayCount,

    #[error("invalid date or time '{value}': {message}")]
    InvalidDate { value: String, message: String },

    #[error("no input files or directories configured")]
    NoInputs,
}

impl From<ValidationError> for lt_common::Error {
    fn from(err: ValidationError) -> Self {
        lt_common::Error::Config(err.to_string())
    }
}
