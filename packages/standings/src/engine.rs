use common::config::ProgressConfig;
use serde::Serialize;
use tracing::debug;

use crate::aggregate::{self, ParticipantTally};
use crate::forecast::{self, Forecast};
use crate::period::PeriodCatalog;
use crate::ranking;
use crate::record::{CorrectnessRecord, ParticipantId};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ProgressStatus {
    Passed,
    Failed,
    /// Neither passed yet nor out of reach.
    Pending,
}

/// One participant's ranked progress summary.
#[derive(Clone, Debug, PartialEq, Serialize, utoipa::ToSchema)]
pub struct StandingsRow {
    /// 1-based position in the standings.
    pub rank: usize,
    /// 0-based position in correctness order.
    pub upstream_index: usize,
    pub participant_id: ParticipantId,
    pub participant_name: String,
    pub total_correct: u32,
    pub per_period_correct: Vec<u32>,
    pub periods_passed: u32,
    pub total_runtime: f64,
    pub passed: bool,
    pub failed: bool,
    pub status: ProgressStatus,
    pub max_possible_correct: u32,
    pub max_possible_periods_passed: u32,
}

/// Scalars rendered alongside the rows.
#[derive(Clone, Debug, PartialEq, Serialize, utoipa::ToSchema)]
pub struct StandingsContext {
    pub max_correct: u32,
    pub periods_remaining: u32,
    pub total_periods: u32,
    pub total_questions: u32,
    pub min_correct_to_pass: u32,
    pub min_periods_to_pass: u32,
    pub per_period_correct_threshold: u32,
    pub points_per_period: u32,
    pub pass_percentage: u32,
    pub period_labels: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, utoipa::ToSchema)]
pub struct Standings {
    pub rows: Vec<StandingsRow>,
    pub context: StandingsContext,
}

impl Standings {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row(&self, participant_id: ParticipantId) -> Option<&StandingsRow> {
        self.rows.iter().find(|r| r.participant_id == participant_id)
    }
}

/// Compute the full standings from one snapshot of correctness records.
///
/// Pure and deterministic: the same records and config always produce the
/// same rows in the same order. Never fails; an empty snapshot yields no rows
/// and a `max_correct` of 0.
pub fn compute_standings(records: &[CorrectnessRecord], config: &ProgressConfig) -> Standings {
    let catalog = PeriodCatalog::from_config(config);
    let tallies = aggregate::tally(records, &catalog);

    let max_correct = tallies.iter().map(|t| t.total_correct).max().unwrap_or(0);
    let periods_remaining = forecast::periods_remaining(
        config.total_periods,
        max_correct,
        config.points_per_period,
    );

    let mut rows: Vec<StandingsRow> = tallies
        .into_iter()
        .map(|tally| build_row(tally, periods_remaining, config))
        .collect();
    ranking::rank_rows(&mut rows);

    debug!(
        participants = rows.len(),
        max_correct, periods_remaining, "Computed standings"
    );

    Standings {
        rows,
        context: StandingsContext {
            max_correct,
            periods_remaining,
            total_periods: config.total_periods,
            total_questions: config.total_questions,
            min_correct_to_pass: config.min_correct_to_pass,
            min_periods_to_pass: config.min_periods_to_pass,
            per_period_correct_threshold: config.per_period_correct_threshold,
            points_per_period: config.points_per_period,
            pass_percentage: config.pass_percentage,
            period_labels: catalog.labels().to_vec(),
        },
    }
}

fn build_row(
    tally: ParticipantTally,
    periods_remaining: u32,
    config: &ProgressConfig,
) -> StandingsRow {
    let periods_passed = tally.periods_passed(config.per_period_correct_threshold);
    let passed = tally.total_correct >= config.min_correct_to_pass
        && periods_passed >= config.min_periods_to_pass;
    let forecast = Forecast::new(
        tally.total_correct,
        periods_passed,
        periods_remaining,
        config.points_per_period,
        config.min_correct_to_pass,
        config.min_periods_to_pass,
    );
    let status = match (passed, forecast.failed) {
        (true, _) => ProgressStatus::Passed,
        (false, true) => ProgressStatus::Failed,
        (false, false) => ProgressStatus::Pending,
    };

    StandingsRow {
        rank: 0,
        upstream_index: 0,
        participant_id: tally.participant_id,
        participant_name: tally.participant_name,
        total_correct: tally.total_correct,
        per_period_correct: tally.per_period_correct,
        periods_passed,
        total_runtime: tally.total_runtime,
        passed,
        failed: forecast.failed,
        status,
        max_possible_correct: forecast.max_possible_correct,
        max_possible_periods_passed: forecast.max_possible_periods_passed,
    }
}
