//! Error types for Log Triage.

use thiserror::Error;

/// Result type alias for Log Triage operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type for Log Triage.
///
/// Module-level errors (configuration validation, report I/O) fold into
/// these variants at the crate boundaries; `code()` maps them onto the
/// stable CLI error-code range. Per-file ingest errors never surface here:
/// the engine recovers from them and continues the run.
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors (10-19)
    #[error("configuration error: {0}")]
    Config(String),

    // Run outcome (30-39)
    #[error("no abnormalities found in any input file")]
    NoAbnormalitiesFound,

    // Report errors (40-49)
    #[error("report generation failed: {0}")]
    Report(String),
}

impl Error {
    /// Returns the error code for this error type.
    /// Used for detailed error reporting at the CLI boundary.
    pub fn code(&self) -> u32 {
        match self {
            Error::Config(_) => 10,
            Error::NoAbnormalitiesFound => 30,
            Error::Report(_) => 40,
        }
    }
}
