//! Compiled input-selection settings.
//!
//! File discovery itself lives in lt-core; this module only carries the
//! validated parameters it runs with.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Modification-time filter applied to candidate files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DateFilter {
    /// Keep files modified within the trailing N days.
    WithinDays(u32),
    /// Keep files whose modification time falls in `[start, end]`.
    /// `end == None` means "until now", resolved at selection time.
    Range {
        start: NaiveDateTime,
        end: Option<NaiveDateTime>,
    },
}

/// Validated input-selection parameters for one run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Selection {
    /// Explicitly listed input files, in configuration order.
    pub files: Vec<PathBuf>,
    /// Directories searched recursively for `*.csv` files.
    pub directories: Vec<PathBuf>,
    /// Drop files whose basename was already seen (first occurrence wins).
    pub remove_duplicates: bool,
    pub date_filter: Option<DateFilter>,
}
