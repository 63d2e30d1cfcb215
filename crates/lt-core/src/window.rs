//! Evidence-window extraction.
//!
//! Expands a match set into the union of boundary-clipped row ranges.
//! Windows from nearby matches merge into one contiguous block; the result
//! never leaves the file's own index range.

use crate::evaluate::MatchSet;
use lt_config::WindowSpec;

/// Expand every match by `rows_before`/`rows_after`, clipped to `[0, n-1]`.
///
/// With a pass-through window (both sides zero) the match set is returned
/// unchanged: exact rows only.
pub fn expand(matches: &MatchSet, n_rows: usize, window: &WindowSpec) -> MatchSet {
    if window.is_pass_through() || n_rows == 0 {
        return matches.clone();
    }

    let last = n_rows - 1;
    let mut out = MatchSet::new();
    for &idx in matches {
        let start = idx.saturating_sub(window.rows_before);
        let end = idx.saturating_add(window.rows_after).min(last);
        out.extend(start..=end);
    }
    out
}
