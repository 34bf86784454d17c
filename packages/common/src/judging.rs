use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::JudgingResult;
use crate::error::{DataIntegrityError, JudgingError};
use crate::rejudging::{Rejudging, RejudgingId};
use crate::run::{self, RunRecord};
use crate::time_format::TimeFormatter;

pub type JudgingId = i32;
pub type SubmissionId = i32;
pub type ContestId = i32;

/// Grading state for one attempt at judging a submission.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct JudgingRecord {
    pub id: JudgingId,
    pub submission_id: SubmissionId,
    pub contest_id: ContestId,
    pub start_time: DateTime<Utc>,
    /// Absent while the judging is still running.
    pub end_time: Option<DateTime<Utc>>,
    pub result: JudgingResult,
    pub verified: bool,
    pub jury_member: Option<String>,
    pub verify_comment: Option<String>,
    /// False once superseded by a rejudge or abandoned.
    pub valid: bool,
    /// Whether the owning team has been shown this result.
    pub seen: bool,
    pub judgehost: Option<String>,
    /// Compiler log, once the judgehost reports it.
    pub compile_output: Option<String>,
    pub rejudging_id: Option<RejudgingId>,
    /// The judging this one supersedes.
    pub original_judging_id: Option<JudgingId>,
    /// Append-only, in insertion order.
    pub runs: Vec<RunRecord>,
}

/// Lifecycle state derived from a record's fields.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum JudgingState {
    /// Running, no result yet.
    Pending,
    /// Result committed but the end time is not closed yet.
    Busy,
    Completed,
    Verified,
    /// Created by an open rejudging; not authoritative until it is applied.
    Rejudging,
    /// Superseded.
    Invalidated,
    /// Abandoned mid-run.
    Aborted,
}

/// A mutation of a judging, applied by the result store under a per-record lock.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum JudgingTransition {
    /// Commit the final result before the end time is closed.
    RecordResult { result: JudgingResult },
    /// Compiler or checker log reported by the judgehost while running.
    RecordCompileOutput { output: String },
    AppendRun { run: RunRecord },
    Finish {
        end_time: DateTime<Utc>,
        result: Option<JudgingResult>,
    },
    Verify {
        jury_member: String,
        comment: Option<String>,
    },
    Unverify,
    Invalidate,
    /// Give up on an unfinished judging outside any rejudging.
    Abort,
    MarkSeen,
}

impl JudgingTransition {
    /// Whether the transition can change how many valid judgings a submission has.
    pub fn changes_validity(&self) -> bool {
        matches!(self, Self::Invalidate | Self::Abort)
    }

    /// Tag used in logs, matching the serialized `type`.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::RecordResult { .. } => "record_result",
            Self::RecordCompileOutput { .. } => "record_compile_output",
            Self::AppendRun { .. } => "append_run",
            Self::Finish { .. } => "finish",
            Self::Verify { .. } => "verify",
            Self::Unverify => "unverify",
            Self::Invalidate => "invalidate",
            Self::Abort => "abort",
            Self::MarkSeen => "mark_seen",
        }
    }
}

impl JudgingRecord {
    /// A freshly started judging: running, valid, no result.
    pub fn new(
        id: JudgingId,
        submission_id: SubmissionId,
        contest_id: ContestId,
        start_time: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            submission_id,
            contest_id,
            start_time,
            end_time: None,
            result: JudgingResult::Pending,
            verified: false,
            jury_member: None,
            verify_comment: None,
            valid: true,
            seen: false,
            judgehost: None,
            compile_output: None,
            rejudging_id: None,
            original_judging_id: None,
            runs: Vec::new(),
        }
    }

    /// A new attempt at `original` inside rejudging `rejudging_id`. It stays
    /// invalid until the rejudging is applied.
    pub fn rejudge_from(
        original: &JudgingRecord,
        id: JudgingId,
        rejudging_id: RejudgingId,
        start_time: DateTime<Utc>,
    ) -> Self {
        let mut judging = Self::new(id, original.submission_id, original.contest_id, start_time);
        judging.valid = false;
        judging.rejudging_id = Some(rejudging_id);
        judging.original_judging_id = Some(original.id);
        judging
    }

    /// Make a finished rejudging attempt the authoritative judging.
    pub fn activate(&mut self) -> Result<(), JudgingError> {
        if !self.is_finished() {
            return Err(JudgingError::NotFinished(self.id));
        }
        if self.valid {
            return Err(JudgingError::AlreadyValid(self.id));
        }
        self.valid = true;
        Ok(())
    }

    /// The supplied rejudging, if it is the one this record belongs to.
    fn associated<'a>(&self, rejudging: Option<&'a Rejudging>) -> Option<&'a Rejudging> {
        let id = self.rejudging_id?;
        rejudging.filter(|r| r.id == id)
    }

    /// Unfinished, invalid, and not kept alive by an active rejudging.
    pub fn is_aborted(&self, rejudging: Option<&Rejudging>) -> bool {
        self.end_time.is_none()
            && !self.valid
            && self.associated(rejudging).is_none_or(|r| !r.valid)
    }

    /// The final result is known while the judging is still running, as with
    /// non-lazy evaluation. Callers must poll instead of treating a missing
    /// end time as "no result yet".
    pub fn is_still_busy(&self, rejudging: Option<&Rejudging>) -> bool {
        self.result.is_final() && self.end_time.is_none() && !self.is_aborted(rejudging)
    }

    pub fn is_finished(&self) -> bool {
        self.end_time.is_some()
    }

    pub fn state(&self, rejudging: Option<&Rejudging>) -> JudgingState {
        if self.is_aborted(rejudging) {
            return JudgingState::Aborted;
        }
        if !self.valid {
            return match self.associated(rejudging) {
                Some(r) if r.valid && !r.applied => JudgingState::Rejudging,
                _ => JudgingState::Invalidated,
            };
        }
        match (self.end_time, self.verified) {
            (None, _) if self.result.is_final() => JudgingState::Busy,
            (None, _) => JudgingState::Pending,
            (Some(_), true) => JudgingState::Verified,
            (Some(_), false) => JudgingState::Completed,
        }
    }

    pub fn max_runtime(&self) -> f64 {
        run::max_runtime(&self.runs)
    }

    pub fn sum_runtime(&self) -> f64 {
        run::sum_runtime(&self.runs)
    }

    pub fn absolute_start_time(&self, clock: &dyn TimeFormatter) -> String {
        clock.to_absolute(self.start_time)
    }

    pub fn absolute_end_time(&self, clock: &dyn TimeFormatter) -> Option<String> {
        self.end_time.map(|t| clock.to_absolute(t))
    }

    pub fn relative_start_time(
        &self,
        clock: &dyn TimeFormatter,
        contest_start: DateTime<Utc>,
    ) -> String {
        clock.to_relative(self.start_time, contest_start)
    }

    pub fn relative_end_time(
        &self,
        clock: &dyn TimeFormatter,
        contest_start: DateTime<Utc>,
    ) -> Option<String> {
        self.end_time.map(|t| clock.to_relative(t, contest_start))
    }

    /// Check the record against the data model invariants.
    pub fn validate(&self) -> Result<(), DataIntegrityError> {
        if let Some(end) = self.end_time
            && end < self.start_time
        {
            return Err(DataIntegrityError::EndBeforeStart {
                judging_id: self.id,
            });
        }
        if self.verified && self.end_time.is_none() {
            return Err(DataIntegrityError::VerifiedWithoutEnd {
                judging_id: self.id,
            });
        }
        if !self.verified && (self.jury_member.is_some() || self.verify_comment.is_some()) {
            return Err(DataIntegrityError::JuryMetadataWithoutVerification {
                judging_id: self.id,
            });
        }
        for run in &self.runs {
            run.validate(self.id)?;
        }
        Ok(())
    }

    fn ensure_open(&self, rejudging: Option<&Rejudging>) -> Result<(), JudgingError> {
        if self.is_finished() {
            return Err(JudgingError::AlreadyFinished(self.id));
        }
        if self.is_aborted(rejudging) {
            return Err(JudgingError::Aborted(self.id));
        }
        Ok(())
    }

    /// Apply `transition` in place. Nothing is modified when it is rejected.
    pub fn apply(
        &mut self,
        transition: JudgingTransition,
        rejudging: Option<&Rejudging>,
    ) -> Result<(), JudgingError> {
        match transition {
            JudgingTransition::RecordResult { result } => {
                self.ensure_open(rejudging)?;
                if !result.is_final() {
                    return Err(JudgingError::PendingResult(self.id));
                }
                self.result = result;
            }
            JudgingTransition::RecordCompileOutput { output } => {
                self.ensure_open(rejudging)?;
                self.compile_output = Some(output);
            }
            JudgingTransition::AppendRun { run } => {
                self.ensure_open(rejudging)?;
                run.validate(self.id)?;
                if self.runs.iter().any(|r| r.testcase_rank == run.testcase_rank) {
                    return Err(JudgingError::DuplicateRun {
                        judging_id: self.id,
                        testcase_rank: run.testcase_rank,
                    });
                }
                self.runs.push(run);
            }
            JudgingTransition::Finish { end_time, result } => {
                self.ensure_open(rejudging)?;
                let result = result.unwrap_or(self.result);
                if !result.is_final() {
                    return Err(JudgingError::MissingResult(self.id));
                }
                if end_time < self.start_time {
                    return Err(DataIntegrityError::EndBeforeStart {
                        judging_id: self.id,
                    }
                    .into());
                }
                self.result = result;
                self.end_time = Some(end_time);
            }
            JudgingTransition::Verify {
                jury_member,
                comment,
            } => {
                if !self.is_finished() {
                    return Err(JudgingError::NotFinished(self.id));
                }
                if !self.valid {
                    return Err(JudgingError::NotValid(self.id));
                }
                if self.verified {
                    return Err(JudgingError::AlreadyVerified(self.id));
                }
                self.verified = true;
                self.jury_member = Some(jury_member);
                self.verify_comment = comment;
            }
            JudgingTransition::Unverify => {
                self.verified = false;
                self.jury_member = None;
                self.verify_comment = None;
            }
            JudgingTransition::Invalidate => {
                if !self.valid {
                    return Err(JudgingError::AlreadyInvalidated(self.id));
                }
                self.valid = false;
            }
            JudgingTransition::Abort => {
                if self.is_finished() {
                    return Err(JudgingError::AlreadyFinished(self.id));
                }
                if !self.valid {
                    return Err(JudgingError::AlreadyInvalidated(self.id));
                }
                self.valid = false;
            }
            JudgingTransition::MarkSeen => self.seen = true,
        }
        Ok(())
    }
}
