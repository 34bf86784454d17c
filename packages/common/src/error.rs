use thiserror::Error;

use crate::judging::JudgingId;
use crate::rejudging::RejudgingId;

/// A judging or run that violates the data model. Rejected at the store
/// boundary, never coerced.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DataIntegrityError {
    #[error("Judging {judging_id}: end time precedes start time")]
    EndBeforeStart { judging_id: JudgingId },

    #[error("Judging {judging_id}: verified before it finished")]
    VerifiedWithoutEnd { judging_id: JudgingId },

    #[error("Judging {judging_id}: jury metadata present on an unverified judging")]
    JuryMetadataWithoutVerification { judging_id: JudgingId },

    #[error("Judging {judging_id}: test case rank {testcase_rank} is out of range")]
    InvalidTestcaseRank {
        judging_id: JudgingId,
        testcase_rank: i64,
    },

    #[error("Judging {judging_id}: run {testcase_rank} has invalid runtime {runtime}")]
    InvalidRuntime {
        judging_id: JudgingId,
        testcase_rank: u32,
        runtime: f64,
    },
}

/// A lifecycle transition that is not allowed from the record's current state.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum JudgingError {
    #[error("Judging {0} has already finished")]
    AlreadyFinished(JudgingId),

    #[error("Judging {0} was aborted")]
    Aborted(JudgingId),

    #[error("Judging {0} has no result to finish with")]
    MissingResult(JudgingId),

    #[error("Judging {0} cannot be set to pending")]
    PendingResult(JudgingId),

    #[error("Judging {0} is not finished yet")]
    NotFinished(JudgingId),

    #[error("Judging {0} is not valid")]
    NotValid(JudgingId),

    #[error("Judging {0} is already verified")]
    AlreadyVerified(JudgingId),

    #[error("Judging {0} is already invalidated")]
    AlreadyInvalidated(JudgingId),

    #[error("Judging {0} is already valid")]
    AlreadyValid(JudgingId),

    #[error("Judging {judging_id} already has a run for test case {testcase_rank}")]
    DuplicateRun {
        judging_id: JudgingId,
        testcase_rank: u32,
    },

    #[error(transparent)]
    Integrity(#[from] DataIntegrityError),
}

/// A rejudging batch operation that is not allowed in the batch's state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RejudgingError {
    #[error("Rejudging {0} has already been applied")]
    AlreadyApplied(RejudgingId),

    #[error("Rejudging {0} has been cancelled")]
    Cancelled(RejudgingId),

    #[error("Rejudging {id} still has {unfinished} unfinished judgings")]
    Unfinished { id: RejudgingId, unfinished: usize },
}

/// Invalid progress thresholds, reported once at configuration load.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigValidationError {
    #[error("progress.total_periods must be at least 1")]
    NoPeriods,

    #[error("progress.points_per_period must be at least 1")]
    ZeroPointsPerPeriod,

    #[error("progress.min_periods_to_pass ({min}) exceeds progress.total_periods ({total})")]
    UnreachablePeriods { min: u32, total: u32 },

    #[error("progress.period_label_prefix must not be empty")]
    EmptyLabelPrefix,

    #[error("progress.pass_percentage must be between 0 and 100, got {0}")]
    PassPercentage(u32),
}
