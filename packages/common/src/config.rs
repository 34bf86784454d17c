use serde::{Deserialize, Serialize};

use crate::error::ConfigValidationError;

/// Course shape and pass thresholds used by the standings engine.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct ProgressConfig {
    /// Number of scoring periods in the course. Default: 6.
    #[serde(default = "default_total_periods")]
    pub total_periods: u32,
    /// Correct problems needed to pass. Default: 18.
    #[serde(default = "default_min_correct_to_pass")]
    pub min_correct_to_pass: u32,
    /// Periods that must meet the per-period threshold to pass. Default: 5.
    #[serde(default = "default_min_periods_to_pass")]
    pub min_periods_to_pass: u32,
    /// Correct problems within a period for it to count as passed. Default: 2.
    #[serde(default = "default_per_period_correct_threshold")]
    pub per_period_correct_threshold: u32,
    /// Problems that can realistically be solved per period, used only for
    /// the fail forecast. Default: 5.
    #[serde(default = "default_points_per_period")]
    pub points_per_period: u32,
    /// Contest shortname prefix identifying course periods. Default: "week".
    #[serde(default = "default_period_label_prefix")]
    pub period_label_prefix: String,
    /// Zero-padded width of the period number in a label. Default: 2 (`week01`).
    #[serde(default = "default_period_label_width")]
    pub period_label_width: usize,
    /// Team category counted in the standings. Default: 3 (students).
    #[serde(default = "default_participant_category")]
    pub participant_category: i32,
    /// Total problems offered over the course, for display. Default: 30.
    #[serde(default = "default_total_questions")]
    pub total_questions: u32,
    /// Pass mark shown alongside the standings. Default: 60.
    #[serde(default = "default_pass_percentage")]
    pub pass_percentage: u32,
}

fn default_total_periods() -> u32 {
    6
}
fn default_min_correct_to_pass() -> u32 {
    18
}
fn default_min_periods_to_pass() -> u32 {
    5
}
fn default_per_period_correct_threshold() -> u32 {
    2
}
fn default_points_per_period() -> u32 {
    5
}
fn default_period_label_prefix() -> String {
    "week".into()
}
fn default_period_label_width() -> usize {
    2
}
fn default_participant_category() -> i32 {
    3
}
fn default_total_questions() -> u32 {
    30
}
fn default_pass_percentage() -> u32 {
    60
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self {
            total_periods: default_total_periods(),
            min_correct_to_pass: default_min_correct_to_pass(),
            min_periods_to_pass: default_min_periods_to_pass(),
            per_period_correct_threshold: default_per_period_correct_threshold(),
            points_per_period: default_points_per_period(),
            period_label_prefix: default_period_label_prefix(),
            period_label_width: default_period_label_width(),
            participant_category: default_participant_category(),
            total_questions: default_total_questions(),
            pass_percentage: default_pass_percentage(),
        }
    }
}

impl ProgressConfig {
    /// Reject thresholds the engine cannot work with.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.total_periods == 0 {
            return Err(ConfigValidationError::NoPeriods);
        }
        if self.points_per_period == 0 {
            return Err(ConfigValidationError::ZeroPointsPerPeriod);
        }
        if self.min_periods_to_pass > self.total_periods {
            return Err(ConfigValidationError::UnreachablePeriods {
                min: self.min_periods_to_pass,
                total: self.total_periods,
            });
        }
        if self.period_label_prefix.is_empty() {
            return Err(ConfigValidationError::EmptyLabelPrefix);
        }
        if self.pass_percentage > 100 {
            return Err(ConfigValidationError::PassPercentage(self.pass_percentage));
        }
        Ok(())
    }

    /// Label of the 1-based period `number`, e.g. `week03`.
    pub fn period_label(&self, number: u32) -> String {
        format!(
            "{}{:0width$}",
            self.period_label_prefix,
            number,
            width = self.period_label_width
        )
    }

    /// Labels of all periods in course order.
    pub fn period_labels(&self) -> Vec<String> {
        (1..=self.total_periods)
            .map(|n| self.period_label(n))
            .collect()
    }
}
