//! Standings order.
//!
//! Key precedence, highest first:
//! 1. `periods_passed`, descending.
//! 2. Correctness order: `total_correct` descending, then `total_runtime`
//!    ascending, then `participant_id` ascending.
//!
//! The correctness order is re-derived here rather than taken from the order
//! in which the store returned records.

use std::cmp::Ordering;

use tracing::debug;

use crate::engine::StandingsRow;

/// Correctness order: more solved first, faster first, then lower id.
pub fn correctness_order(a: &StandingsRow, b: &StandingsRow) -> Ordering {
    b.total_correct
        .cmp(&a.total_correct)
        .then_with(|| a.total_runtime.total_cmp(&b.total_runtime))
        .then_with(|| a.participant_id.cmp(&b.participant_id))
}

/// Final order: more periods passed first, ties keep the correctness order.
pub fn standings_order(a: &StandingsRow, b: &StandingsRow) -> Ordering {
    b.periods_passed
        .cmp(&a.periods_passed)
        .then_with(|| a.upstream_index.cmp(&b.upstream_index))
}

/// Sort `rows` into standings order and fill in `upstream_index` and `rank`.
pub fn rank_rows(rows: &mut [StandingsRow]) {
    if !rows.is_sorted_by(|a, b| correctness_order(a, b) != Ordering::Greater) {
        debug!(
            participants = rows.len(),
            "Correctness records were not in correctness order, re-deriving"
        );
    }

    rows.sort_by(correctness_order);
    for (index, row) in rows.iter_mut().enumerate() {
        row.upstream_index = index;
    }

    rows.sort_by(standings_order);
    for (index, row) in rows.iter_mut().enumerate() {
        row.rank = index + 1;
    }
}
