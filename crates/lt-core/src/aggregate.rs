//! Cross-file aggregation.
//!
//! One [`Aggregator`] lives for a whole run. Each file's window rows are
//! folded in via [`Aggregator::fold`]; the column selection and the running
//! tables only ever grow, and duplicates are removed keeping the first
//! occurrence in processing order.

use crate::evaluate::{Evaluation, MatchSet};
use crate::table::RowTable;
use lt_common::{AggregateResult, AggregateTable, Value, FILENAME_COLUMN, TIMESTAMP_COLUMN};
use lt_config::Detection;
use tracing::{debug, warn};

/// The accumulating set of column names retained in the main output tables.
///
/// Seeded with the timestamp and filename columns; configured extra columns
/// join when first seen present in a file, rule columns when their rule
/// first matches. Grow-only: a column is never removed, even if absent from
/// a later file.
#[derive(Debug, Clone)]
pub struct ColumnSelection {
    columns: Vec<String>,
}

impl ColumnSelection {
    pub fn new() -> Self {
        Self {
            columns: vec![TIMESTAMP_COLUMN.to_string(), FILENAME_COLUMN.to_string()],
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn contains(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    /// Append a column if absent; insertion order is preserved.
    pub fn insert(&mut self, name: &str) {
        if !self.contains(name) {
            self.columns.push(name.to_string());
        }
    }
}

impl Default for ColumnSelection {
    fn default() -> Self {
        Self::new()
    }
}

/// Folds per-file window rows into the running run-wide result.
#[derive(Debug)]
pub struct Aggregator {
    selection: ColumnSelection,
    extra_columns: Vec<String>,
    threshold: AggregateTable,
    state_change: AggregateTable,
    detailed_threshold: Option<AggregateTable>,
    detailed_state_change: Option<AggregateTable>,
    stats: Vec<String>,
    total_toggles: u64,
}

impl Aggregator {
    pub fn new(detection: &Detection) -> Self {
        let detailed = detection.detailed;
        Self {
            selection: ColumnSelection::new(),
            extra_columns: detection.extra_columns.clone(),
            threshold: AggregateTable::new(),
            state_change: AggregateTable::new(),
            detailed_threshold: detailed.then(AggregateTable::new),
            detailed_state_change: detailed.then(AggregateTable::new),
            stats: Vec::new(),
            total_toggles: 0,
        }
    }

    pub fn selection(&self) -> &ColumnSelection {
        &self.selection
    }

    /// Fold one file's evaluation and window rows into the running result.
    /// A file with no matches in a category contributes nothing to it.
    pub fn fold(
        &mut self,
        table: &RowTable,
        eval: &Evaluation,
        threshold_rows: &MatchSet,
        state_change_rows: &MatchSet,
        file: &str,
    ) {
        for col in &self.extra_columns {
            if table.column_index(col).is_some() {
                self.selection.insert(col);
            } else {
                warn!(file, column = %col, "extra column not found, skipping for this file");
            }
        }
        for col in &eval.threshold.matched_columns {
            self.selection.insert(col);
        }
        for col in &eval.state_change.matched_columns {
            self.selection.insert(col);
        }

        append_selected(&mut self.threshold, table, threshold_rows, &self.selection);
        append_selected(
            &mut self.state_change,
            table,
            state_change_rows,
            &self.selection,
        );

        if let Some(detailed) = self.detailed_threshold.as_mut() {
            append_all(detailed, table, threshold_rows);
        }
        if let Some(detailed) = self.detailed_state_change.as_mut() {
            append_all(detailed, table, state_change_rows);
        }

        self.stats.extend(eval.threshold.stats.iter().cloned());
        self.stats.extend(eval.state_change.stats.iter().cloned());
        self.total_toggles += eval.toggles;

        debug!(
            file,
            threshold_rows = self.threshold.n_rows(),
            state_change_rows = self.state_change.n_rows(),
            "folded file into running tables"
        );
    }

    /// Finish the run and hand over the immutable result.
    pub fn finish(self) -> AggregateResult {
        AggregateResult {
            threshold: self.threshold,
            state_change: self.state_change,
            detailed_threshold: self.detailed_threshold,
            detailed_state_change: self.detailed_state_change,
            stats: self.stats,
            total_toggles: self.total_toggles,
        }
    }
}

/// Append the given rows restricted to the selected columns, then dedup.
fn append_selected(
    dst: &mut AggregateTable,
    table: &RowTable,
    rows: &MatchSet,
    selection: &ColumnSelection,
) {
    if rows.is_empty() {
        return;
    }
    for name in selection.columns() {
        dst.ensure_column(name);
    }
    push_rows(dst, table, rows);
}

/// Append the given rows over all of the table's columns, then dedup.
fn append_all(dst: &mut AggregateTable, table: &RowTable, rows: &MatchSet) {
    if rows.is_empty() {
        return;
    }
    for name in table.columns() {
        dst.ensure_column(name);
    }
    push_rows(dst, table, rows);
}

fn push_rows(dst: &mut AggregateTable, table: &RowTable, rows: &MatchSet) {
    let columns: Vec<Option<&[Value]>> = dst
        .columns()
        .iter()
        .map(|name| table.column_by_name(name))
        .collect();
    for &row in rows {
        let values = columns
            .iter()
            .map(|col| col.map(|c| c[row].clone()).unwrap_or(Value::Missing))
            .collect();
        dst.push_row(values);
    }
    dst.dedup();
}
