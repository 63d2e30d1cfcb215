//! Row table ingestion.
//!
//! One input file becomes one [`RowTable`]: an ordered, 0-indexed,
//! column-major view of the data rows after the fixed preamble. A synthetic
//! `filename` column is inserted first for provenance in reports. Column
//! types are inferred once at ingestion; numeric coercion is best-effort and
//! never aborts a file.

use lt_common::{Value, FILENAME_COLUMN, TIMESTAMP_COLUMN};
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors from ingesting one input file.
///
/// All of these are recovered at run level: the engine skips the file, logs
/// a warning, and continues with the remaining files.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("mandatory column '{column}' not found in {path}")]
    MissingTimestampColumn { path: String, column: String },

    #[error("failed to parse {path}: {message}")]
    Parse { path: String, message: String },

    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

// ---------------------------------------------------------------------------
// RowTable
// ---------------------------------------------------------------------------

/// An ordered, typed tabular view of one file's contents.
///
/// Row indices are contiguous `0..n` in source order. The table is immutable
/// once built; the previous-row view used for transition detection is
/// computed where needed, never stored.
#[derive(Debug, Clone)]
pub struct RowTable {
    columns: Vec<String>,
    index: HashMap<String, usize>,
    data: Vec<Vec<Value>>,
    n_rows: usize,
}

impl RowTable {
    /// Build a table directly from named columns. All columns must have the
    /// same length.
    pub fn from_columns<S: Into<String>>(cols: Vec<(S, Vec<Value>)>) -> Self {
        let mut columns = Vec::with_capacity(cols.len());
        let mut data = Vec::with_capacity(cols.len());
        let mut n_rows = 0;
        for (i, (name, values)) in cols.into_iter().enumerate() {
            if i == 0 {
                n_rows = values.len();
            }
            debug_assert_eq!(values.len(), n_rows, "ragged column set");
            columns.push(name.into());
            data.push(values);
        }
        let index = build_index(&columns);
        Self {
            columns,
            index,
            data,
            n_rows,
        }
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn column(&self, col: usize) -> &[Value] {
        &self.data[col]
    }

    pub fn column_by_name(&self, name: &str) -> Option<&[Value]> {
        self.column_index(name).map(|c| self.column(c))
    }

    pub fn value(&self, col: usize, row: usize) -> &Value {
        &self.data[col][row]
    }

    /// Best-effort numeric view of a column. Cells that do not coerce are
    /// `None` and never satisfy a threshold predicate.
    pub fn numeric_view(&self, col: usize) -> Vec<Option<f64>> {
        self.data[col].iter().map(Value::as_number).collect()
    }

    /// A column is numeric when at least one cell coerces and none fails to.
    pub fn column_is_numeric(&self, col: usize) -> bool {
        let mut any = false;
        for value in &self.data[col] {
            if value.is_missing() {
                continue;
            }
            if value.as_number().is_none() {
                return false;
            }
            any = true;
        }
        any
    }
}

fn build_index(columns: &[String]) -> HashMap<String, usize> {
    columns
        .iter()
        .enumerate()
        .map(|(i, name)| (name.clone(), i))
        .collect()
}

// ---------------------------------------------------------------------------
// Ingestion
// ---------------------------------------------------------------------------

/// Ingest one delimited file, skipping `preamble_lines` leading non-data
/// lines before the header row.
pub fn ingest(path: &Path, preamble_lines: usize) -> Result<RowTable, IngestError> {
    let source = path.display().to_string();
    let content = std::fs::read_to_string(path).map_err(|e| IngestError::Io {
        path: source.clone(),
        source: e,
    })?;
    parse_table(&content, preamble_lines, &source)
}

/// Parse already-loaded file content into a row table.
pub fn parse_table(
    content: &str,
    preamble_lines: usize,
    source: &str,
) -> Result<RowTable, IngestError> {
    let mut rest = content;
    for _ in 0..preamble_lines {
        match rest.find('\n') {
            Some(pos) => rest = &rest[pos + 1..],
            None => {
                rest = "";
                break;
            }
        }
    }

    if rest.trim().is_empty() {
        return Err(IngestError::Parse {
            path: source.to_string(),
            message: "no data after preamble".to_string(),
        });
    }

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(rest.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| IngestError::Parse {
            path: source.to_string(),
            message: e.to_string(),
        })?
        .iter()
        .map(|h| h.to_string())
        .collect();

    if !headers.iter().any(|h| h == TIMESTAMP_COLUMN) {
        return Err(IngestError::MissingTimestampColumn {
            path: source.to_string(),
            column: TIMESTAMP_COLUMN.to_string(),
        });
    }

    let mut raw_rows: Vec<Vec<String>> = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| IngestError::Parse {
            path: source.to_string(),
            message: e.to_string(),
        })?;
        let mut row: Vec<String> = record.iter().map(|c| c.to_string()).collect();
        // Ragged rows: pad short ones, drop cells beyond the header width.
        row.resize(headers.len(), String::new());
        raw_rows.push(row);
    }

    let n_rows = raw_rows.len();
    let mut columns = Vec::with_capacity(headers.len() + 1);
    let mut data = Vec::with_capacity(headers.len() + 1);

    columns.push(FILENAME_COLUMN.to_string());
    data.push(vec![Value::Text(source.to_string()); n_rows]);

    for (c, name) in headers.iter().enumerate() {
        if columns.iter().any(|existing| existing == name) {
            debug!(source, column = %name, "duplicate column name, keeping first");
            continue;
        }
        let cells: Vec<&str> = raw_rows.iter().map(|r| r[c].as_str()).collect();
        data.push(type_column(&cells));
        columns.push(name.clone());
    }

    let index = build_index(&columns);
    Ok(RowTable {
        columns,
        index,
        data,
        n_rows,
    })
}

/// Infer one column's type and build its cells: numeric when every non-empty
/// cell parses as a float, text otherwise. Empty cells are missing.
fn type_column(cells: &[&str]) -> Vec<Value> {
    let mut any_numeric = false;
    let mut all_numeric = true;
    for cell in cells {
        let trimmed = cell.trim();
        if trimmed.is_empty() {
            continue;
        }
        if trimmed.parse::<f64>().is_ok() {
            any_numeric = true;
        } else {
            all_numeric = false;
            break;
        }
    }

    if any_numeric && all_numeric {
        cells
            .iter()
            .map(|cell| {
                cell.trim()
                    .parse::<f64>()
                    .map(Value::Number)
                    .unwrap_or(Value::Missing)
            })
            .collect()
    } else {
        cells
            .iter()
            .map(|cell| {
                if cell.trim().is_empty() {
                    Value::Missing
                } else {
                    Value::Text(cell.to_string())
                }
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
