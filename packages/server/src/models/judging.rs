use chrono::{DateTime, Utc};
use common::time_format::TimeFormatter;
use common::{JudgingRecord, JudgingResult, JudgingState, Rejudging, RunRecord};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Request body for jury verification.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct VerifyJudgingRequest {
    /// Name of the jury member signing off the result.
    #[schema(example = "jury")]
    pub jury_member: String,
    #[schema(example = "Checked against the reference output")]
    pub comment: Option<String>,
}

pub fn validate_verify_judging(req: &VerifyJudgingRequest) -> Result<(), AppError> {
    let name = req.jury_member.trim();
    if name.is_empty() || name.chars().count() > 128 {
        return Err(AppError::Validation(
            "jury_member must be 1-128 characters".into(),
        ));
    }
    Ok(())
}

/// A judging with its derived lifecycle figures.
#[derive(Serialize, utoipa::ToSchema)]
pub struct JudgingDetailResponse {
    #[schema(example = 12)]
    pub id: i32,
    #[schema(example = 7)]
    pub submission_id: i32,
    #[schema(example = 1)]
    pub contest_id: i32,
    pub state: JudgingState,
    pub result: JudgingResult,
    pub valid: bool,
    pub verified: bool,
    pub jury_member: Option<String>,
    pub verify_comment: Option<String>,
    pub seen: bool,
    #[schema(example = "judgehost-3")]
    pub judgehost: Option<String>,
    pub compile_output: Option<String>,
    pub rejudging_id: Option<i32>,
    pub original_judging_id: Option<i32>,
    pub is_aborted: bool,
    /// True while the final result is known but the judging has not closed.
    pub is_still_busy: bool,
    /// Seconds.
    pub max_runtime: f64,
    /// Seconds.
    pub sum_runtime: f64,
    #[schema(example = "2024-04-15T09:00:00.000+00:00")]
    pub start_time: String,
    pub end_time: Option<String>,
    /// Offset from the contest start, `[-]H:MM:SS.mmm`.
    #[schema(example = "0:12:03.250")]
    pub relative_start_time: String,
    pub relative_end_time: Option<String>,
    pub runs: Vec<RunRecord>,
}

impl JudgingDetailResponse {
    pub fn new(
        record: JudgingRecord,
        rejudging: Option<&Rejudging>,
        clock: &dyn TimeFormatter,
        contest_start: DateTime<Utc>,
    ) -> Self {
        Self {
            state: record.state(rejudging),
            is_aborted: record.is_aborted(rejudging),
            is_still_busy: record.is_still_busy(rejudging),
            max_runtime: record.max_runtime(),
            sum_runtime: record.sum_runtime(),
            start_time: record.absolute_start_time(clock),
            end_time: record.absolute_end_time(clock),
            relative_start_time: record.relative_start_time(clock, contest_start),
            relative_end_time: record.relative_end_time(clock, contest_start),
            id: record.id,
            submission_id: record.submission_id,
            contest_id: record.contest_id,
            result: record.result,
            valid: record.valid,
            verified: record.verified,
            jury_member: record.jury_member,
            verify_comment: record.verify_comment,
            seen: record.seen,
            judgehost: record.judgehost,
            compile_output: record.compile_output,
            rejudging_id: record.rejudging_id,
            original_judging_id: record.original_judging_id,
            runs: record.runs,
        }
    }
}
