//! The detection engine orchestrator.
//!
//! Iterates the externally supplied, ordered file list; for each file runs
//! ingest → evaluate → window → fold. Per-file failures are recovered and
//! logged; only an empty run is fatal.

use crate::aggregate::Aggregator;
use crate::{evaluate, table, window};
use lt_common::{AggregateResult, Error, INPUT_PREAMBLE_LINES};
use lt_config::Detection;
use std::path::PathBuf;
use tracing::{info, warn};

/// Run the detection pipeline over every file, in order.
///
/// Fails with [`Error::NoAbnormalitiesFound`] when both main tables are
/// empty after all files were processed; in that case nothing is emitted.
pub fn run(detection: &Detection, files: &[PathBuf]) -> lt_common::Result<AggregateResult> {
    let mut aggregator = Aggregator::new(detection);

    for path in files {
        let file = path.display().to_string();
        info!(file, "analysing file");

        let table = match table::ingest(path, INPUT_PREAMBLE_LINES) {
            Ok(table) => table,
            Err(e) => {
                warn!(file, error = %e, "skipping file");
                continue;
            }
        };

        let eval = evaluate::evaluate(&table, detection, &file);
        let threshold_rows = window::expand(&eval.threshold.rows, table.n_rows(), &detection.window);
        let state_change_rows =
            window::expand(&eval.state_change.rows, table.n_rows(), &detection.window);

        aggregator.fold(&table, &eval, &threshold_rows, &state_change_rows, &file);
    }

    let result = aggregator.finish();
    if !result.has_matches() {
        return Err(Error::NoAbnormalitiesFound);
    }

    info!(
        threshold_rows = result.threshold.n_rows(),
        state_change_rows = result.state_change.n_rows(),
        total_toggles = result.total_toggles,
        "run complete"
    );
    Ok(result)
}
