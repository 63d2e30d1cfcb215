//! Condition evaluation over one row table.
//!
//! Two independent passes per file, each yielding a match set: threshold
//! rules compare numeric views against fixed values; state-change rules
//! compare each row against its predecessor. Rules referencing columns the
//! file does not carry are skipped with a log line and contribute nothing.

use crate::table::RowTable;
use lt_config::{CombinePolicy, Detection, StateChangeRule, ThresholdRule};
use lt_common::Value;
use serde::Serialize;
use std::collections::BTreeSet;
use tracing::{debug, info, warn};

/// Row indices satisfying a rule category within one file.
pub type MatchSet = BTreeSet<usize>;

/// Matches and bookkeeping for one rule category in one file.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CategoryMatches {
    /// Combined match set for the category.
    pub rows: MatchSet,
    /// Rule columns that matched at least one row, in first-match order.
    pub matched_columns: Vec<String>,
    /// One statistics line per rule that fired.
    pub stats: Vec<String>,
}

impl CategoryMatches {
    fn mark_column(&mut self, column: &str) {
        if !self.matched_columns.iter().any(|c| c == column) {
            self.matched_columns.push(column.to_string());
        }
    }
}

/// The full evaluation of one file.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Evaluation {
    pub threshold: CategoryMatches,
    pub state_change: CategoryMatches,
    /// Transitions counted over both directions and all rules.
    pub toggles: u64,
}

/// Evaluate every configured rule against one file's table.
pub fn evaluate(table: &RowTable, detection: &Detection, file: &str) -> Evaluation {
    let threshold = evaluate_thresholds(table, &detection.thresholds, detection.combine, file);
    let (state_change, toggles) = evaluate_state_changes(table, &detection.state_changes, file);
    Evaluation {
        threshold,
        state_change,
        toggles,
    }
}

// ---------------------------------------------------------------------------
// Threshold rules
// ---------------------------------------------------------------------------

/// Evaluate threshold rules, combining per-rule match sets under `combine`.
///
/// Under [`CombinePolicy::All`] only rules whose column is present in the
/// file participate in the intersection; an absent column makes its rule
/// inert, never the whole file.
pub fn evaluate_thresholds(
    table: &RowTable,
    rules: &[ThresholdRule],
    combine: CombinePolicy,
    file: &str,
) -> CategoryMatches {
    let mut out = CategoryMatches::default();
    let mut per_rule: Vec<MatchSet> = Vec::new();

    for rule in rules {
        let Some(col) = table.column_index(&rule.column) else {
            info!(file, column = %rule.column, "threshold column not found, skipping rule");
            continue;
        };

        let hits: MatchSet = table
            .numeric_view(col)
            .iter()
            .enumerate()
            .filter(|(_, v)| v.map(|x| rule.op.eval(x, rule.value)).unwrap_or(false))
            .map(|(i, _)| i)
            .collect();

        if hits.is_empty() {
            debug!(file, column = %rule.column, "threshold never crossed");
        } else {
            out.stats.push(format!(
                "Threshold {} {} crossed {} times in file {} for column {}",
                rule.op,
                rule.value,
                hits.len(),
                file,
                rule.column
            ));
            out.mark_column(&rule.column);
        }
        per_rule.push(hits);
    }

    out.rows = match combine {
        CombinePolicy::Any => per_rule.into_iter().flatten().collect(),
        CombinePolicy::All => intersect_all(per_rule),
    };
    out
}

fn intersect_all(sets: Vec<MatchSet>) -> MatchSet {
    let mut iter = sets.into_iter();
    let Some(first) = iter.next() else {
        return MatchSet::new();
    };
    iter.fold(first, |acc, set| acc.intersection(&set).copied().collect())
}

// ---------------------------------------------------------------------------
// State-change rules
// ---------------------------------------------------------------------------

/// Evaluate state-change rules; multiple rules combine with OR.
///
/// A row matches when it and its predecessor form a transition between the
/// rule's two values, in either direction. Row 0 has no predecessor and
/// never matches.
pub fn evaluate_state_changes(
    table: &RowTable,
    rules: &[StateChangeRule],
    file: &str,
) -> (CategoryMatches, u64) {
    let mut out = CategoryMatches::default();
    let mut toggles = 0u64;

    for rule in rules {
        let Some(col) = table.column_index(&rule.column) else {
            info!(file, column = %rule.column, "state change column not found, skipping rule");
            continue;
        };

        let Some(matcher) = CellMatcher::for_rule(table, col, rule, file) else {
            continue;
        };

        let values = table.column(col);
        let mut forward = 0u64;
        let mut backward = 0u64;
        for i in 1..table.n_rows() {
            let prev = &values[i - 1];
            let cur = &values[i];
            if matcher.is_a(prev) && matcher.is_b(cur) {
                forward += 1;
                out.rows.insert(i);
            } else if matcher.is_b(prev) && matcher.is_a(cur) {
                backward += 1;
                out.rows.insert(i);
            }
        }

        info!(
            file,
            column = %rule.column,
            "state change from {} to {}: {} times",
            rule.value_a, rule.value_b, forward
        );
        info!(
            file,
            column = %rule.column,
            "state change from {} to {}: {} times",
            rule.value_b, rule.value_a, backward
        );

        let total = forward + backward;
        if total > 0 {
            out.stats.push(format!(
                "State change between {} and {} toggled {} times in file {} for column {}",
                rule.value_a, rule.value_b, total, file, rule.column
            ));
            out.mark_column(&rule.column);
        }
        toggles += total;
    }

    (out, toggles)
}

/// Typed equality against a rule's two values, resolved once per column.
enum CellMatcher {
    Numeric { a: f64, b: f64 },
    Textual { a: String, b: String },
}

impl CellMatcher {
    /// Numeric columns compare numerically; the rule values are coerced. An
    /// unparseable rule value against a numeric column makes the rule inert.
    fn for_rule(table: &RowTable, col: usize, rule: &StateChangeRule, file: &str) -> Option<Self> {
        if table.column_is_numeric(col) {
            match (rule.value_a.as_number(), rule.value_b.as_number()) {
                (Some(a), Some(b)) => Some(CellMatcher::Numeric { a, b }),
                _ => {
                    warn!(
                        file,
                        column = %rule.column,
                        "state change values are not numeric for a numeric column, skipping rule"
                    );
                    None
                }
            }
        } else {
            Some(CellMatcher::Textual {
                a: rule.value_a.as_text(),
                b: rule.value_b.as_text(),
            })
        }
    }

    fn is_a(&self, value: &Value) -> bool {
        match self {
            CellMatcher::Numeric { a, .. } => value.as_number() == Some(*a),
            CellMatcher::Textual { a, .. } => matches!(value, Value::Text(s) if s == a),
        }
    }

    fn is_b(&self, value: &Value) -> bool {
        match self {
            CellMatcher::Numeric { b, .. } => value.as_number() == Some(*b),
            CellMatcher::Textual { b, .. } => matches!(value, Value::Text(s) if s == b),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
