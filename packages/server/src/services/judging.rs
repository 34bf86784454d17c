use std::sync::Arc;

use chrono::{DateTime, Utc};
use common::judging::SubmissionId;
use common::time_format::TimeFormatter;
use common::{
    JudgingId, JudgingRecord, JudgingResult, JudgingTransition, Rejudging, RejudgingId, RunRecord,
};
use tracing::{info, instrument};

use crate::models::judging::JudgingDetailResponse;
use crate::store::{NewJudging, RejudgingBatch, ResultStore, StoreError};

/// Lifecycle operations on judgings and rejudgings.
#[derive(Clone)]
pub struct JudgingService {
    store: Arc<dyn ResultStore>,
    clock: Arc<dyn TimeFormatter>,
}

impl JudgingService {
    pub fn new(store: Arc<dyn ResultStore>, clock: Arc<dyn TimeFormatter>) -> Self {
        Self { store, clock }
    }

    /// The judging plus the rejudging it belongs to, if any.
    async fn load(
        &self,
        id: JudgingId,
    ) -> Result<(JudgingRecord, Option<Rejudging>), StoreError> {
        let record = self.store.get_judging(id).await?;
        let rejudging = match record.rejudging_id {
            Some(rid) => match self.store.get_rejudging(rid).await {
                Ok(r) => Some(r),
                // A dangling reference counts as no rejudging.
                Err(StoreError::NotFound(_)) => None,
                Err(e) => return Err(e),
            },
            None => None,
        };
        Ok((record, rejudging))
    }

    #[instrument(skip(self))]
    pub async fn detail(&self, id: JudgingId) -> Result<JudgingDetailResponse, StoreError> {
        let (record, rejudging) = self.load(id).await?;
        let contest_start = self.store.get_contest_start(record.contest_id).await?;
        Ok(JudgingDetailResponse::new(
            record,
            rejudging.as_ref(),
            self.clock.as_ref(),
            contest_start,
        ))
    }

    #[instrument(skip(self, new), fields(submission_id = new.submission_id))]
    pub async fn start(&self, new: NewJudging) -> Result<JudgingRecord, StoreError> {
        self.store.insert_judging(new).await
    }

    #[instrument(skip(self, transition))]
    pub async fn transition(
        &self,
        id: JudgingId,
        transition: JudgingTransition,
    ) -> Result<JudgingRecord, StoreError> {
        let kind = transition.kind();
        let record = self.store.apply_transition(id, transition).await?;
        info!(
            judging_id = id,
            submission_id = record.submission_id,
            transition = kind,
            result = %record.result,
            "Applied judging transition"
        );
        Ok(record)
    }

    pub async fn record_result(
        &self,
        id: JudgingId,
        result: JudgingResult,
    ) -> Result<JudgingRecord, StoreError> {
        self.transition(id, JudgingTransition::RecordResult { result })
            .await
    }

    pub async fn record_compile_output(
        &self,
        id: JudgingId,
        output: String,
    ) -> Result<JudgingRecord, StoreError> {
        self.transition(id, JudgingTransition::RecordCompileOutput { output })
            .await
    }

    pub async fn append_run(
        &self,
        id: JudgingId,
        run: RunRecord,
    ) -> Result<JudgingRecord, StoreError> {
        self.transition(id, JudgingTransition::AppendRun { run }).await
    }

    pub async fn finish(
        &self,
        id: JudgingId,
        end_time: DateTime<Utc>,
        result: Option<JudgingResult>,
    ) -> Result<JudgingRecord, StoreError> {
        self.transition(id, JudgingTransition::Finish { end_time, result })
            .await
    }

    pub async fn verify(
        &self,
        id: JudgingId,
        jury_member: String,
        comment: Option<String>,
    ) -> Result<JudgingRecord, StoreError> {
        self.transition(
            id,
            JudgingTransition::Verify {
                jury_member,
                comment,
            },
        )
        .await
    }

    #[instrument(skip(self, reason))]
    pub async fn rejudge(
        &self,
        reason: &str,
        submission_ids: &[SubmissionId],
    ) -> Result<RejudgingBatch, StoreError> {
        self.store.create_rejudging(reason, submission_ids).await
    }

    #[instrument(skip(self))]
    pub async fn apply_rejudging(&self, id: RejudgingId) -> Result<Rejudging, StoreError> {
        self.store.apply_rejudging(id).await
    }

    #[instrument(skip(self))]
    pub async fn cancel_rejudging(&self, id: RejudgingId) -> Result<Rejudging, StoreError> {
        self.store.cancel_rejudging(id).await
    }
}
