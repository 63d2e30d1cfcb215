//! Exit codes for the lt-core CLI.
//!
//! Exit codes communicate run outcome without requiring output parsing.

use lt_common::Error;

/// Exit codes for lt-core runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Run completed and reports were written
    Ok = 0,

    /// Run completed but no abnormality matched in any file
    NoAbnormalities = 1,

    /// Configuration error
    ConfigError = 10,

    /// Report generation error
    ReportError = 11,

    /// Internal/unknown error
    InternalError = 99,
}

impl ExitCode {
    /// Convert to i32 for process exit.
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Check if this exit code indicates success.
    pub fn is_success(self) -> bool {
        matches!(self, ExitCode::Ok)
    }

    /// Check if this exit code indicates an error requiring attention.
    pub fn is_error(self) -> bool {
        (self as i32) >= 10
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code as i32
    }
}

impl From<&Error> for ExitCode {
    fn from(err: &Error) -> Self {
        match err {
            Error::Config(_) => ExitCode::ConfigError,
            Error::NoAbnormalitiesFound => ExitCode::NoAbnormalities,
            Error::Report(_) => ExitCode::ReportError,
        }
    }
}
