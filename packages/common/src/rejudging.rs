use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::RejudgingError;
use crate::judging::JudgingRecord;

pub type RejudgingId = i32;

/// An administrative batch that re-grades submissions.
///
/// New judgings created by the batch start out invalid. Applying the batch
/// swaps validity with the judgings they supersede; cancelling it marks the
/// batch itself invalid, which turns its unfinished judgings into aborted ones.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Rejudging {
    pub id: RejudgingId,
    pub reason: String,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    /// False once the batch has been cancelled.
    pub valid: bool,
    pub applied: bool,
}

impl Rejudging {
    pub fn new(id: RejudgingId, reason: impl Into<String>, start_time: DateTime<Utc>) -> Self {
        Self {
            id,
            reason: reason.into(),
            start_time,
            end_time: None,
            valid: true,
            applied: false,
        }
    }

    /// Still open: neither applied nor cancelled.
    pub fn is_pending(&self) -> bool {
        self.end_time.is_none()
    }

    fn ensure_open(&self) -> Result<(), RejudgingError> {
        if self.applied {
            return Err(RejudgingError::AlreadyApplied(self.id));
        }
        if !self.valid {
            return Err(RejudgingError::Cancelled(self.id));
        }
        Ok(())
    }

    /// Close the batch as applied. Every judging it created must have finished.
    ///
    /// Only marks the batch; swapping validity between the new judgings and
    /// the ones they supersede is done by the caller.
    pub fn apply(
        &mut self,
        judgings: &[JudgingRecord],
        now: DateTime<Utc>,
    ) -> Result<(), RejudgingError> {
        self.ensure_open()?;
        let unfinished = judgings
            .iter()
            .filter(|j| j.rejudging_id == Some(self.id) && !j.is_finished())
            .count();
        if unfinished > 0 {
            return Err(RejudgingError::Unfinished {
                id: self.id,
                unfinished,
            });
        }
        self.applied = true;
        self.end_time = Some(now);
        Ok(())
    }

    /// Close the batch as cancelled. Its unfinished judgings become aborted.
    pub fn cancel(&mut self, now: DateTime<Utc>) -> Result<(), RejudgingError> {
        self.ensure_open()?;
        self.valid = false;
        self.end_time = Some(now);
        Ok(())
    }
}
