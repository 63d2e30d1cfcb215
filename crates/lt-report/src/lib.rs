//! Log Triage report sink.
//!
//! Serializes a finished [`AggregateResult`] into a timestamped output
//! directory: one CSV per non-empty table (each with the fixed blank
//! preamble prepended, mirroring the input convention), an HTML run
//! summary, and a copy of the input configuration for provenance.

use askama::Template;
use chrono::Local;
use lt_common::{AggregateResult, AggregateTable, OUTPUT_PREAMBLE_LINES};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors from writing run output.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("failed to create output directory {path}: {source}")]
    CreateDir {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV serialization failed for {path}: {source}")]
    Csv {
        path: String,
        #[source]
        source: csv::Error,
    },

    #[error("summary rendering failed: {0}")]
    Template(String),
}

impl From<ReportError> for lt_common::Error {
    fn from(err: ReportError) -> Self {
        lt_common::Error::Report(err.to_string())
    }
}

// ---------------------------------------------------------------------------
// Output layout
// ---------------------------------------------------------------------------

/// The timestamped directory and file stem all run output shares.
#[derive(Debug, Clone)]
pub struct ReportLayout {
    pub dir: PathBuf,
    pub file_stem: String,
}

impl ReportLayout {
    /// Create `<dirname>/<basename>_<YYYY-MM-DD-HH-MM>/` from the configured
    /// output path. An empty dirname means the current directory; an empty
    /// basename falls back to `triage`.
    pub fn prepare(output_directory: &str) -> Result<Self, ReportError> {
        let raw = Path::new(output_directory);
        let base = raw
            .file_name()
            .and_then(|s| s.to_str())
            .filter(|s| !s.is_empty())
            .unwrap_or("triage");
        let parent = match raw.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let stamp = Local::now().format("%Y-%m-%d-%H-%M");
        let file_stem = format!("{base}_{stamp}");
        let dir = parent.join(&file_stem);
        std::fs::create_dir_all(&dir).map_err(|e| ReportError::CreateDir {
            path: dir.display().to_string(),
            source: e,
        })?;

        Ok(Self { dir, file_stem })
    }

    fn path_for(&self, suffix: &str) -> PathBuf {
        self.dir.join(format!("{}_{suffix}", self.file_stem))
    }
}

/// Paths of everything a run wrote.
#[derive(Debug, Clone, Default)]
pub struct WrittenReports {
    pub tables: Vec<PathBuf>,
    pub summary: Option<PathBuf>,
}

// ---------------------------------------------------------------------------
// Writing
// ---------------------------------------------------------------------------

/// Write all output for a finished run.
///
/// `config_source`, when given, is copied into the output directory so the
/// run stays reproducible; a failed copy is logged, never fatal.
pub fn write_reports(
    result: &AggregateResult,
    layout: &ReportLayout,
    config_source: Option<&Path>,
) -> Result<WrittenReports, ReportError> {
    let mut written = WrittenReports::default();

    if let Some(source) = config_source {
        copy_config(source, &layout.dir);
    }

    let tables: [(&str, Option<&AggregateTable>); 4] = [
        ("threshold.csv", Some(&result.threshold)),
        ("state_toggle.csv", Some(&result.state_change)),
        ("threshold_detailed.csv", result.detailed_threshold.as_ref()),
        (
            "state_toggle_detailed.csv",
            result.detailed_state_change.as_ref(),
        ),
    ];

    for (suffix, table) in tables {
        let Some(table) = table else { continue };
        if table.is_empty() {
            continue;
        }
        let path = layout.path_for(suffix);
        write_table(&path, table)?;
        info!(file = %path.display(), rows = table.n_rows(), "output saved");
        written.tables.push(path);
    }

    let summary = layout.path_for("summary.html");
    write_summary(&summary, result, &written)?;
    info!(file = %summary.display(), "summary saved");
    written.summary = Some(summary);

    Ok(written)
}

/// Write one table as CSV, preceded by the fixed blank preamble.
fn write_table(path: &Path, table: &AggregateTable) -> Result<(), ReportError> {
    let mut file = File::create(path).map_err(|e| ReportError::Write {
        path: path.display().to_string(),
        source: e,
    })?;
    for _ in 0..OUTPUT_PREAMBLE_LINES {
        writeln!(file).map_err(|e| ReportError::Write {
            path: path.display().to_string(),
            source: e,
        })?;
    }

    let mut writer = csv::Writer::from_writer(file);
    let csv_err = |e: csv::Error| ReportError::Csv {
        path: path.display().to_string(),
        source: e,
    };
    writer.write_record(table.columns()).map_err(csv_err)?;
    for row in table.rendered_rows() {
        writer.write_record(&row).map_err(csv_err)?;
    }
    writer.flush().map_err(|e| ReportError::Write {
        path: path.display().to_string(),
        source: e,
    })?;
    Ok(())
}

fn copy_config(source: &Path, dir: &Path) {
    let Some(name) = source.file_name() else {
        return;
    };
    let dest = dir.join(name);
    if let Err(e) = std::fs::copy(source, &dest) {
        warn!(
            source = %source.display(),
            error = %e,
            "could not copy configuration into output directory"
        );
    }
}

// ---------------------------------------------------------------------------
// HTML summary
// ---------------------------------------------------------------------------

#[derive(Template)]
#[template(path = "summary.html")]
struct SummaryTemplate<'a> {
    generated_at: String,
    threshold_rows: usize,
    state_change_rows: usize,
    total_toggles: u64,
    stats: &'a [String],
    files: Vec<String>,
}

fn write_summary(
    path: &Path,
    result: &AggregateResult,
    written: &WrittenReports,
) -> Result<(), ReportError> {
    let template = SummaryTemplate {
        generated_at: Local::now().format("%Y-%m-%d %H:%M").to_string(),
        threshold_rows: result.threshold.n_rows(),
        state_change_rows: result.state_change.n_rows(),
        total_toggles: result.total_toggles,
        stats: &result.stats,
        files: written
            .tables
            .iter()
            .map(|p| p.display().to_string())
            .collect(),
    };
    let html = template
        .render()
        .map_err(|e| ReportError::Template(e.to_string()))?;
    std::fs::write(path, html).map_err(|e| ReportError::Write {
        path: path.display().to_string(),
        source: e,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
