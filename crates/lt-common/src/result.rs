//! Aggregated output tables.
//!
//! `AggregateTable` is the running cross-file table the aggregator folds
//! window rows into and the report sink serializes. Columns are a
//! first-seen-ordered union: rows appended before a column existed stay
//! short and read back as missing cells.

use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

const MISSING: Value = Value::Missing;

/// A growing table of retained rows, shared by the main and detailed outputs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregateTable {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl AggregateTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Append a column if it is not already present. Existing rows are left
    /// short; their missing tail is padded on read.
    pub fn ensure_column(&mut self, name: &str) {
        if !self.columns.iter().any(|c| c == name) {
            self.columns.push(name.to_string());
        }
    }

    /// Append a row aligned to the current column order.
    pub fn push_row(&mut self, row: Vec<Value>) {
        debug_assert!(row.len() <= self.columns.len());
        self.rows.push(row);
    }

    /// Cell at (row, column index), padding short rows with missing.
    pub fn cell(&self, row: usize, col: usize) -> &Value {
        self.rows[row].get(col).unwrap_or(&MISSING)
    }

    /// One row in its serialized form, padded to the current width.
    pub fn rendered_row(&self, row: usize) -> Vec<String> {
        (0..self.columns.len())
            .map(|col| self.cell(row, col).render())
            .collect()
    }

    /// All rows in serialized form, in retained order.
    pub fn rendered_rows(&self) -> Vec<Vec<String>> {
        (0..self.rows.len()).map(|r| self.rendered_row(r)).collect()
    }

    /// Remove exact-duplicate rows, keeping the first occurrence.
    ///
    /// Rows are compared by their serialized cells over the current column
    /// set, so short rows and explicit missing cells compare equal.
    pub fn dedup(&mut self) {
        let width = self.columns.len();
        let mut seen: HashSet<Vec<String>> = HashSet::with_capacity(self.rows.len());
        let mut kept = Vec::with_capacity(self.rows.len());
        for row in self.rows.drain(..) {
            let key: Vec<String> = (0..width)
                .map(|col| row.get(col).unwrap_or(&MISSING).render())
                .collect();
            if seen.insert(key) {
                kept.push(row);
            }
        }
        self.rows = kept;
    }
}

/// The finished output of a run, handed to the report sink.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregateResult {
    /// Threshold-crossing rows, restricted to the selected columns.
    pub threshold: AggregateTable,
    /// State-change rows, restricted to the selected columns.
    pub state_change: AggregateTable,
    /// All-column variants, present when detailed output is enabled.
    pub detailed_threshold: Option<AggregateTable>,
    pub detailed_state_change: Option<AggregateTable>,
    /// One line per triggered rule per file.
    pub stats: Vec<String>,
    /// Total state transitions over both directions, all rules, all files.
    pub total_toggles: u64,
}

impl AggregateResult {
    /// The run succeeded if at least one main table retained a row.
    pub fn has_matches(&self) -> bool {
        !self.threshold.is_empty() || !self.state_change.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(values: &[&str]) -> Vec<Value> {
        values.iter().map(|v| Value::Text(v.to_string())).collect()
    }

    // === AggregateTable ===

    #[test]
    fn test_ensure_column_is_idempotent() {
        let mut t = AggregateTable::new();
        t.ensure_column("a");
        t.ensure_column("b");
        t.ensure_column("a");
        assert_eq!(t.columns(), ["a", "b"]);
    }

    #[test]
    fn test_short_rows_pad_as_missing() {
        let mut t = AggregateTable::new();
        t.ensure_column("a");
        t.push_row(row(&["1"]));
        t.ensure_column("b");
        t.push_row(row(&["1", "2"]));
        assert_eq!(t.rendered_row(0), vec!["1", ""]);
        assert_eq!(t.rendered_row(1), vec!["1", "2"]);
    }

    #[test]
    fn test_dedup_keeps_first_occurrence() {
        let mut t = AggregateTable::new();
        t.ensure_column("a");
        t.ensure_column("b");
        t.push_row(row(&["1", "x"]));
        t.push_row(row(&["2", "y"]));
        t.push_row(row(&["1", "x"]));
        t.dedup();
        assert_eq!(t.n_rows(), 2);
        assert_eq!(t.rendered_row(0), vec!["1", "x"]);
        assert_eq!(t.rendered_row(1), vec!["2", "y"]);
    }

    #[test]
    fn test_dedup_is_idempotent() {
        let mut t = AggregateTable::new();
        t.ensure_column("a");
        for v in ["1", "2", "1", "3", "2"] {
            t.push_row(row(&[v]));
        }
        t.dedup();
        let once = t.clone();
        t.dedup();
        assert_eq!(t, once);
        assert_eq!(t.n_rows(), 3);
    }

    #[test]
    fn test_dedup_treats_short_row_as_missing() {
        let mut t = AggregateTable::new();
        t.ensure_column("a");
        t.push_row(row(&["1"]));
        t.ensure_column("b");
        t.push_row(vec![Value::Text("1".into()), Value::Missing]);
        t.dedup();
        assert_eq!(t.n_rows(), 1);
    }

    // === AggregateResult ===

    #[test]
    fn test_has_matches_requires_a_main_row() {
        let mut result = AggregateResult::default();
        assert!(!result.has_matches());
        result.state_change.ensure_column("a");
        result.state_change.push_row(row(&["1"]));
        assert!(result.has_matches());
    }
}
