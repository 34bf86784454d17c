use serde::{Deserialize, Serialize};

use crate::JudgingResult;
use crate::error::DataIntegrityError;
use crate::judging::JudgingId;

pub type RunId = i32;

/// One test-case execution within a judging.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct RunRecord {
    pub id: RunId,
    /// 1-based position of the test case.
    pub testcase_rank: u32,
    pub result: JudgingResult,
    /// Wall time in seconds.
    pub runtime: f64,
}

impl RunRecord {
    pub fn validate(&self, judging_id: JudgingId) -> Result<(), DataIntegrityError> {
        if !self.runtime.is_finite() || self.runtime < 0.0 {
            return Err(DataIntegrityError::InvalidRuntime {
                judging_id,
                testcase_rank: self.testcase_rank,
                runtime: self.runtime,
            });
        }
        Ok(())
    }
}

/// Largest runtime across `runs`, or 0 when there are none.
pub fn max_runtime(runs: &[RunRecord]) -> f64 {
    runs.iter().map(|r| r.runtime).fold(0.0, f64::max)
}

/// Sum of all runtimes in `runs`, or 0 when there are none.
pub fn sum_runtime(runs: &[RunRecord]) -> f64 {
    runs.iter().map(|r| r.runtime).sum()
}
