//! Input file selection.
//!
//! Resolves the configured file list before the engine runs: explicit paths
//! first, then recursive `*.csv` discovery under each input directory, then
//! optional duplicate-basename removal and modification-time filtering.
//! Missing paths are logged and skipped; selection itself never fails.

use chrono::{DateTime, Local, NaiveDateTime};
use lt_config::{DateFilter, Selection};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Resolve the final ordered file list for a run.
pub fn select_files(selection: &Selection) -> Vec<PathBuf> {
    let mut files = Vec::new();

    for path in &selection.files {
        if path.exists() {
            files.push(path.clone());
        } else {
            info!(file = %path.display(), "input file not found, skipping");
        }
    }

    for dir in &selection.directories {
        if !dir.is_dir() {
            info!(directory = %dir.display(), "input directory not found, skipping");
            continue;
        }
        collect_csvs(dir, &mut files);
    }

    if selection.remove_duplicates {
        files = remove_duplicate_basenames(files);
    }

    if let Some(filter) = &selection.date_filter {
        files.retain(|path| within_date_filter(path, filter));
    }

    if files.is_empty() {
        info!("no files found to process");
    }
    files
}

/// Recursively collect `*.csv` files under `dir`, sorted within each
/// directory for a deterministic order.
fn collect_csvs(dir: &Path, out: &mut Vec<PathBuf>) {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(directory = %dir.display(), error = %e, "cannot read directory, skipping");
            return;
        }
    };

    let mut paths: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .collect();
    paths.sort();

    for path in paths {
        if path.is_dir() {
            collect_csvs(&path, out);
        } else if path.extension().and_then(|e| e.to_str()) == Some("csv") {
            out.push(path);
        }
    }
}

/// Drop files whose basename was already seen; the first occurrence wins.
fn remove_duplicate_basenames(files: Vec<PathBuf>) -> Vec<PathBuf> {
    let mut seen: HashSet<std::ffi::OsString> = HashSet::new();
    files
        .into_iter()
        .filter(|path| {
            let Some(name) = path.file_name() else {
                return true;
            };
            let fresh = seen.insert(name.to_os_string());
            if !fresh {
                info!(file = %path.display(), "duplicate basename, discarding");
            }
            fresh
        })
        .collect()
}

fn within_date_filter(path: &Path, filter: &DateFilter) -> bool {
    let Some(modified) = modified_at(path) else {
        warn!(file = %path.display(), "cannot read modification time, discarding");
        return false;
    };

    let keep = match filter {
        DateFilter::WithinDays(days) => {
            let age_days = (Local::now().naive_local() - modified).num_days();
            age_days <= i64::from(*days)
        }
        DateFilter::Range { start, end } => {
            let end = end.unwrap_or_else(|| Local::now().naive_local());
            *start < modified && modified < end
        }
    };

    if keep {
        debug!(file = %path.display(), modified = %modified, "within date filter, keeping");
    } else {
        info!(file = %path.display(), modified = %modified, "outside date filter, discarding");
    }
    keep
}

fn modified_at(path: &Path) -> Option<NaiveDateTime> {
    let modified = std::fs::metadata(path).and_then(|m| m.modified()).ok()?;
    Some(DateTime::<Local>::from(modified).naive_local())
}
