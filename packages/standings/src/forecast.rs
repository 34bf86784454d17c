//! Pass/fail forecasting.
//!
//! The number of periods still in play is estimated once, from the leading
//! participant's total, and applied to everyone: a participant has not failed
//! as long as they could still reach the thresholds at the leader's pace. It
//! is deliberately not a per-participant remaining-periods count, so a
//! participant with no progress at all is not failed while the leader has
//! little progress either.

use serde::Serialize;

/// `total_periods - ceil(max_correct / points_per_period) + 1`, clamped at 0.
///
/// A `points_per_period` of 0 is rejected at configuration load; it is
/// treated as 1 here so the estimate never divides by zero.
pub fn periods_remaining(total_periods: u32, max_correct: u32, points_per_period: u32) -> u32 {
    let periods_spent = max_correct.div_ceil(points_per_period.max(1));
    let remaining = i64::from(total_periods) - i64::from(periods_spent) + 1;
    u32::try_from(remaining.max(0)).unwrap_or(u32::MAX)
}

/// Best case for one participant if every remaining period went perfectly.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Forecast {
    pub max_possible_correct: u32,
    pub max_possible_periods_passed: u32,
    /// The thresholds are out of reach even in the best case.
    pub failed: bool,
}

impl Forecast {
    pub fn new(
        total_correct: u32,
        periods_passed: u32,
        periods_remaining: u32,
        points_per_period: u32,
        min_correct_to_pass: u32,
        min_periods_to_pass: u32,
    ) -> Self {
        let max_possible_correct =
            total_correct.saturating_add(periods_remaining.saturating_mul(points_per_period));
        let max_possible_periods_passed = periods_passed.saturating_add(periods_remaining);
        Self {
            max_possible_correct,
            max_possible_periods_passed,
            failed: max_possible_correct < min_correct_to_pass
                || max_possible_periods_passed < min_periods_to_pass,
        }
    }
}
