use std::collections::{BTreeMap, HashSet};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::judging::{ContestId, SubmissionId};
use common::{JudgingId, JudgingRecord, JudgingTransition, Rejudging, RejudgingId};
use standings::{CorrectnessRecord, ParticipantId};
use tokio::sync::Mutex;
use tracing::info;

use super::{
    NewJudging, PeriodBound, RejudgingBatch, ResultStore, StoreError, current_judging,
    distinct_submissions, duplicated_submissions, ensure_not_rejudging,
    ensure_replaces_only_original, warn_if_inconsistent,
};

#[derive(Debug, Clone)]
struct Contest {
    shortname: String,
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
}

#[derive(Debug, Clone)]
struct Team {
    name: String,
    category_id: i32,
    has_logged_in: bool,
}

#[derive(Debug, Clone)]
struct Score {
    contest_id: ContestId,
    team_id: ParticipantId,
    is_correct: bool,
    runtime: f64,
}

#[derive(Debug, Default)]
struct Inner {
    contests: BTreeMap<ContestId, Contest>,
    teams: BTreeMap<ParticipantId, Team>,
    scores: Vec<Score>,
    judgings: BTreeMap<JudgingId, JudgingRecord>,
    rejudgings: BTreeMap<RejudgingId, Rejudging>,
    next_judging_id: JudgingId,
    next_rejudging_id: RejudgingId,
}

impl Inner {
    fn judging(&self, id: JudgingId) -> Result<&JudgingRecord, StoreError> {
        self.judgings
            .get(&id)
            .ok_or_else(|| StoreError::NotFound(format!("Judging {id}")))
    }

    fn rejudging(&self, id: RejudgingId) -> Result<&Rejudging, StoreError> {
        self.rejudgings
            .get(&id)
            .ok_or_else(|| StoreError::NotFound(format!("Rejudging {id}")))
    }

    fn for_submission(&self, submission_id: SubmissionId) -> Vec<JudgingRecord> {
        self.judgings
            .values()
            .filter(|j| j.submission_id == submission_id)
            .cloned()
            .collect()
    }

    fn is_open(&self, rejudging_id: RejudgingId) -> bool {
        self.rejudgings
            .get(&rejudging_id)
            .is_some_and(|r| r.valid && !r.applied)
    }

    fn allocate_judging_id(&mut self) -> JudgingId {
        self.next_judging_id += 1;
        self.next_judging_id
    }
}

/// A [`ResultStore`] kept entirely in memory. Used by tests and local demos.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_contest(
        &self,
        id: ContestId,
        shortname: &str,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
    ) {
        self.inner.lock().await.contests.insert(
            id,
            Contest {
                shortname: shortname.to_string(),
                start_time,
                end_time,
            },
        );
    }

    /// Register a team; `has_logged_in` stands in for a member's first login.
    pub async fn add_team(
        &self,
        id: ParticipantId,
        name: &str,
        category_id: i32,
        has_logged_in: bool,
    ) {
        self.inner.lock().await.teams.insert(
            id,
            Team {
                name: name.to_string(),
                category_id,
                has_logged_in,
            },
        );
    }

    pub async fn add_score(
        &self,
        contest_id: ContestId,
        team_id: ParticipantId,
        is_correct: bool,
        runtime: f64,
    ) {
        self.inner.lock().await.scores.push(Score {
            contest_id,
            team_id,
            is_correct,
            runtime,
        });
    }

    /// Store an already existing judging verbatim, e.g. when importing history.
    /// The record keeps its id.
    pub async fn import_judging(&self, record: JudgingRecord) -> Result<(), StoreError> {
        record.validate()?;
        let mut inner = self.inner.lock().await;
        if inner.judgings.contains_key(&record.id) {
            return Err(StoreError::Conflict(format!(
                "Judging {} already exists",
                record.id
            )));
        }
        inner.next_judging_id = inner.next_judging_id.max(record.id);
        let submission_id = record.submission_id;
        inner.judgings.insert(record.id, record);
        warn_if_inconsistent(submission_id, &inner.for_submission(submission_id));
        Ok(())
    }
}

#[async_trait]
impl ResultStore for MemoryStore {
    async fn fetch_correctness_records(
        &self,
        participant_category: i32,
        period_label_prefix: &str,
    ) -> Result<Vec<CorrectnessRecord>, StoreError> {
        let inner = self.inner.lock().await;
        let active: HashSet<ParticipantId> = inner
            .teams
            .iter()
            .filter(|(_, t)| t.category_id == participant_category && t.has_logged_in)
            .map(|(&id, _)| id)
            .collect();

        let mut records: Vec<CorrectnessRecord> = inner
            .scores
            .iter()
            .filter(|s| active.contains(&s.team_id))
            .filter_map(|s| {
                let contest = inner.contests.get(&s.contest_id)?;
                let team = inner.teams.get(&s.team_id)?;
                contest.shortname.starts_with(period_label_prefix).then(|| {
                    CorrectnessRecord::new(
                        s.team_id,
                        team.name.clone(),
                        contest.shortname.clone(),
                        s.is_correct,
                        s.runtime,
                    )
                })
            })
            .collect();
        records.sort_by(|a, b| {
            a.participant_id
                .cmp(&b.participant_id)
                .then_with(|| a.period_label.cmp(&b.period_label))
        });
        Ok(records)
    }

    async fn fetch_period_bounds(
        &self,
        period_label_prefix: &str,
    ) -> Result<Vec<PeriodBound>, StoreError> {
        let inner = self.inner.lock().await;
        let mut bounds: Vec<PeriodBound> = inner
            .contests
            .iter()
            .filter(|(_, c)| c.shortname.starts_with(period_label_prefix))
            .map(|(&contest_id, c)| PeriodBound {
                contest_id,
                label: c.shortname.clone(),
                start_time: c.start_time,
                end_time: c.end_time,
            })
            .collect();
        bounds.sort_by(|a, b| a.label.cmp(&b.label));
        Ok(bounds)
    }

    async fn get_judging(&self, id: JudgingId) -> Result<JudgingRecord, StoreError> {
        self.inner.lock().await.judging(id).cloned()
    }

    async fn get_rejudging(&self, id: RejudgingId) -> Result<Rejudging, StoreError> {
        self.inner.lock().await.rejudging(id).cloned()
    }

    async fn judgings_for_submission(
        &self,
        submission_id: SubmissionId,
    ) -> Result<Vec<JudgingRecord>, StoreError> {
        Ok(self.inner.lock().await.for_submission(submission_id))
    }

    async fn get_contest_start(&self, contest_id: ContestId) -> Result<DateTime<Utc>, StoreError> {
        self.inner
            .lock()
            .await
            .contests
            .get(&contest_id)
            .map(|c| c.start_time)
            .ok_or_else(|| StoreError::NotFound(format!("Contest {contest_id}")))
    }

    async fn insert_judging(&self, new: NewJudging) -> Result<JudgingRecord, StoreError> {
        let mut inner = self.inner.lock().await;
        if let Some(existing) = inner
            .judgings
            .values()
            .find(|j| j.submission_id == new.submission_id && j.valid)
        {
            return Err(StoreError::Conflict(format!(
                "Submission {} already has valid judging {}",
                new.submission_id, existing.id
            )));
        }

        let id = inner.allocate_judging_id();
        let mut record = JudgingRecord::new(id, new.submission_id, new.contest_id, new.start_time);
        record.judgehost = new.judgehost;
        record.validate()?;
        inner.judgings.insert(id, record.clone());
        Ok(record)
    }

    async fn apply_transition(
        &self,
        id: JudgingId,
        transition: JudgingTransition,
    ) -> Result<JudgingRecord, StoreError> {
        let mut inner = self.inner.lock().await;
        let mut record = inner.judging(id)?.clone();
        let rejudging = record
            .rejudging_id
            .and_then(|rid| inner.rejudgings.get(&rid).cloned());

        let changes_validity = transition.changes_validity();
        record.apply(transition, rejudging.as_ref())?;
        record.validate()?;
        inner.judgings.insert(id, record.clone());

        if changes_validity {
            warn_if_inconsistent(record.submission_id, &inner.for_submission(record.submission_id));
        }
        Ok(record)
    }

    async fn create_rejudging(
        &self,
        reason: &str,
        submission_ids: &[SubmissionId],
    ) -> Result<RejudgingBatch, StoreError> {
        let mut inner = self.inner.lock().await;
        let now = Utc::now();

        let submission_ids = distinct_submissions(submission_ids);
        let mut originals = Vec::with_capacity(submission_ids.len());
        for submission_id in submission_ids {
            let judgings = inner.for_submission(submission_id);
            ensure_not_rejudging(submission_id, &judgings, |rid| inner.is_open(rid))?;
            originals.push(current_judging(submission_id, &judgings)?.clone());
        }

        inner.next_rejudging_id += 1;
        let rejudging = Rejudging::new(inner.next_rejudging_id, reason, now);
        inner.rejudgings.insert(rejudging.id, rejudging.clone());

        let mut judgings = Vec::with_capacity(originals.len());
        for original in &originals {
            let id = inner.allocate_judging_id();
            let record = JudgingRecord::rejudge_from(original, id, rejudging.id, now);
            inner.judgings.insert(id, record.clone());
            judgings.push(record);
        }

        info!(
            rejudging_id = rejudging.id,
            submissions = judgings.len(),
            "Created rejudging"
        );
        Ok(RejudgingBatch {
            rejudging,
            judgings,
        })
    }

    async fn apply_rejudging(&self, id: RejudgingId) -> Result<Rejudging, StoreError> {
        let mut inner = self.inner.lock().await;
        let mut rejudging = inner.rejudging(id)?.clone();
        let mut candidates: Vec<JudgingRecord> = inner
            .judgings
            .values()
            .filter(|j| j.rejudging_id == Some(id) && !j.valid)
            .cloned()
            .collect();
        rejudging.apply(&candidates, Utc::now())?;
        for candidate in &candidates {
            let siblings = inner.for_submission(candidate.submission_id);
            ensure_replaces_only_original(candidate, &siblings)?;
        }

        let mut originals = Vec::new();
        for candidate in &mut candidates {
            candidate.activate()?;
            if let Some(original_id) = candidate.original_judging_id {
                let mut original = inner.judging(original_id)?.clone();
                if original.valid {
                    original.apply(JudgingTransition::Invalidate, None)?;
                    originals.push(original);
                }
            }
        }

        for record in candidates.iter().chain(&originals) {
            inner.judgings.insert(record.id, record.clone());
        }
        inner.rejudgings.insert(id, rejudging.clone());
        for candidate in &candidates {
            warn_if_inconsistent(
                candidate.submission_id,
                &inner.for_submission(candidate.submission_id),
            );
        }

        info!(
            rejudging_id = id,
            judgings = candidates.len(),
            "Applied rejudging"
        );
        Ok(rejudging)
    }

    async fn cancel_rejudging(&self, id: RejudgingId) -> Result<Rejudging, StoreError> {
        let mut inner = self.inner.lock().await;
        let mut rejudging = inner.rejudging(id)?.clone();
        rejudging.cancel(Utc::now())?;
        inner.rejudgings.insert(id, rejudging.clone());
        info!(rejudging_id = id, "Cancelled rejudging");
        Ok(rejudging)
    }

    async fn submissions_with_multiple_valid_judgings(
        &self,
    ) -> Result<Vec<SubmissionId>, StoreError> {
        let inner = self.inner.lock().await;
        Ok(duplicated_submissions(
            inner
                .judgings
                .values()
                .filter(|j| j.valid)
                .map(|j| j.submission_id),
        ))
    }
}
