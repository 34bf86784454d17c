//! Persistence boundary for judgings, rejudgings and standings inputs.
//!
//! Every write goes through [`JudgingRecord::apply`] and
//! [`JudgingRecord::validate`] so both implementations enforce the same
//! lifecycle rules. Writes to one judging are serialized: the SeaORM store
//! holds a row lock for the duration of the transaction, the memory store a
//! mutex.

mod memory;
mod sea;

pub use memory::MemoryStore;
pub use sea::SeaOrmStore;

use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::error::{DataIntegrityError, JudgingError, RejudgingError};
use common::judging::{ContestId, SubmissionId};
use common::{JudgingId, JudgingRecord, JudgingTransition, Rejudging, RejudgingId};
use sea_orm::DbErr;
use serde::Serialize;
use standings::CorrectnessRecord;
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0} not found")]
    NotFound(String),

    #[error(transparent)]
    Judging(#[from] JudgingError),

    #[error(transparent)]
    Rejudging(#[from] RejudgingError),

    #[error(transparent)]
    Integrity(#[from] DataIntegrityError),

    #[error("{0}")]
    Conflict(String),

    #[error(transparent)]
    Database(#[from] DbErr),
}

/// A judging about to be started by a judgehost.
#[derive(Debug, Clone)]
pub struct NewJudging {
    pub submission_id: SubmissionId,
    pub contest_id: ContestId,
    pub start_time: DateTime<Utc>,
    pub judgehost: Option<String>,
}

/// Time window of one course period.
#[derive(Debug, Clone, PartialEq, Serialize, utoipa::ToSchema)]
pub struct PeriodBound {
    pub contest_id: ContestId,
    pub label: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

/// A freshly opened rejudging together with the judgings it created.
#[derive(Debug, Clone)]
pub struct RejudgingBatch {
    pub rejudging: Rejudging,
    pub judgings: Vec<JudgingRecord>,
}

#[async_trait]
pub trait ResultStore: Send + Sync {
    /// One snapshot of per-period correctness for teams of `participant_category`
    /// with at least one logged-in member, restricted to contests whose
    /// shortname starts with `period_label_prefix`. Ordered by team id, then
    /// label.
    async fn fetch_correctness_records(
        &self,
        participant_category: i32,
        period_label_prefix: &str,
    ) -> Result<Vec<CorrectnessRecord>, StoreError>;

    /// Course periods ordered by label.
    async fn fetch_period_bounds(
        &self,
        period_label_prefix: &str,
    ) -> Result<Vec<PeriodBound>, StoreError>;

    async fn get_judging(&self, id: JudgingId) -> Result<JudgingRecord, StoreError>;

    async fn get_rejudging(&self, id: RejudgingId) -> Result<Rejudging, StoreError>;

    /// All judgings of a submission, oldest first.
    async fn judgings_for_submission(
        &self,
        submission_id: SubmissionId,
    ) -> Result<Vec<JudgingRecord>, StoreError>;

    async fn get_contest_start(&self, contest_id: ContestId) -> Result<DateTime<Utc>, StoreError>;

    /// Start a judging. Fails with [`StoreError::Conflict`] while the
    /// submission still has a valid judging, including when a concurrent
    /// insert for the same submission wins.
    async fn insert_judging(&self, new: NewJudging) -> Result<JudgingRecord, StoreError>;

    /// Apply one transition atomically and return the updated record.
    async fn apply_transition(
        &self,
        id: JudgingId,
        transition: JudgingTransition,
    ) -> Result<JudgingRecord, StoreError>;

    /// Open a rejudging with one new, invalid judging per distinct submission.
    async fn create_rejudging(
        &self,
        reason: &str,
        submission_ids: &[SubmissionId],
    ) -> Result<RejudgingBatch, StoreError>;

    /// Make the rejudging's judgings authoritative and invalidate the ones
    /// they supersede.
    async fn apply_rejudging(&self, id: RejudgingId) -> Result<Rejudging, StoreError>;

    async fn cancel_rejudging(&self, id: RejudgingId) -> Result<Rejudging, StoreError>;

    /// Submissions violating the one-valid-judging rule, ascending.
    async fn submissions_with_multiple_valid_judgings(
        &self,
    ) -> Result<Vec<SubmissionId>, StoreError>;
}

/// Log a warning when a submission ends up with more than one valid judging.
pub(crate) fn warn_if_inconsistent(submission_id: SubmissionId, judgings: &[JudgingRecord]) {
    let valid = judgings.iter().filter(|j| j.valid).count();
    if valid > 1 {
        warn!(
            submission_id,
            valid_judgings = valid,
            "Submission has more than one valid judging"
        );
    }
}

/// Submission ids that appear more than once in `valid_submission_ids`.
pub(crate) fn duplicated_submissions(
    valid_submission_ids: impl IntoIterator<Item = SubmissionId>,
) -> Vec<SubmissionId> {
    let mut counts = BTreeMap::new();
    for id in valid_submission_ids {
        *counts.entry(id).or_insert(0usize) += 1;
    }
    counts
        .into_iter()
        .filter(|&(_, n)| n > 1)
        .map(|(id, _)| id)
        .collect()
}

/// `submission_ids` without repeats, in first-seen order. A submission listed
/// twice must still get only one rejudging attempt.
pub(crate) fn distinct_submissions(submission_ids: &[SubmissionId]) -> Vec<SubmissionId> {
    let mut seen = BTreeSet::new();
    submission_ids
        .iter()
        .copied()
        .filter(|id| seen.insert(*id))
        .collect()
}

/// The judging a new rejudging attempt supersedes: the newest valid one.
pub(crate) fn current_judging(
    submission_id: SubmissionId,
    judgings: &[JudgingRecord],
) -> Result<&JudgingRecord, StoreError> {
    warn_if_inconsistent(submission_id, judgings);
    judgings
        .iter()
        .filter(|j| j.valid)
        .max_by_key(|j| j.id)
        .ok_or_else(|| StoreError::NotFound(format!("Valid judging for submission {submission_id}")))
}

/// Reject activating `candidate` while a judging other than the one it
/// supersedes is valid, which would leave the submission with two.
pub(crate) fn ensure_replaces_only_original(
    candidate: &JudgingRecord,
    judgings: &[JudgingRecord],
) -> Result<(), StoreError> {
    let other = judgings.iter().find(|j| {
        j.valid && j.id != candidate.id && Some(j.id) != candidate.original_judging_id
    });
    match other {
        Some(other) => Err(StoreError::Conflict(format!(
            "Submission {} already has valid judging {}",
            candidate.submission_id, other.id
        ))),
        None => Ok(()),
    }
}

/// Reject a submission that already takes part in an open rejudging.
pub(crate) fn ensure_not_rejudging(
    submission_id: SubmissionId,
    judgings: &[JudgingRecord],
    open: impl Fn(RejudgingId) -> bool,
) -> Result<(), StoreError> {
    let busy = judgings
        .iter()
        .filter(|j| !j.valid)
        .filter_map(|j| j.rejudging_id)
        .find(|&id| open(id));
    match busy {
        Some(rejudging_id) => Err(StoreError::Conflict(format!(
            "Submission {submission_id} is already part of rejudging {rejudging_id}"
        ))),
        None => Ok(()),
    }
}
