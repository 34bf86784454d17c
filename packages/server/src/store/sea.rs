use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::error::DataIntegrityError;
use common::judging::{ContestId, SubmissionId};
use common::{
    JudgingId, JudgingRecord, JudgingTransition, Rejudging, RejudgingId, RunRecord,
};
use sea_orm::sea_query::{LikeExpr, LockType};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    DbErr, QueryFilter, QueryOrder, QuerySelect, Set, SqlErr, TransactionTrait,
};
use standings::{CorrectnessRecord, ParticipantId};
use tracing::info;

use super::{
    NewJudging, PeriodBound, RejudgingBatch, ResultStore, StoreError, current_judging,
    distinct_submissions, duplicated_submissions, ensure_not_rejudging,
    ensure_replaces_only_original, warn_if_inconsistent,
};
use crate::entity::{contest, judging, judging_run, rejudging, scorecache, team, user};

/// [`ResultStore`] backed by the relational schema in [`crate::entity`].
#[derive(Debug, Clone)]
pub struct SeaOrmStore {
    db: DatabaseConnection,
}

impl SeaOrmStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn escape_like(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

fn prefix_pattern(prefix: &str) -> LikeExpr {
    LikeExpr::new(format!("{}%", escape_like(prefix))).escape('\\')
}

/// Map a unique-index violation to [`StoreError::Conflict`].
fn conflict_on_unique(err: DbErr, message: impl FnOnce() -> String) -> StoreError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => StoreError::Conflict(message()),
        _ => StoreError::Database(err),
    }
}

fn rank_from_column(judging_id: JudgingId, rank: i32) -> Result<u32, DataIntegrityError> {
    u32::try_from(rank).map_err(|_| DataIntegrityError::InvalidTestcaseRank {
        judging_id,
        testcase_rank: i64::from(rank),
    })
}

fn rank_to_column(judging_id: JudgingId, rank: u32) -> Result<i32, DataIntegrityError> {
    i32::try_from(rank).map_err(|_| DataIntegrityError::InvalidTestcaseRank {
        judging_id,
        testcase_rank: i64::from(rank),
    })
}

fn run_record(model: judging_run::Model) -> Result<RunRecord, DataIntegrityError> {
    Ok(RunRecord {
        id: model.id,
        testcase_rank: rank_from_column(model.judging_id, model.testcase_rank)?,
        result: model.result,
        runtime: model.runtime,
    })
}

fn judging_record(
    model: judging::Model,
    runs: Vec<judging_run::Model>,
) -> Result<JudgingRecord, DataIntegrityError> {
    Ok(JudgingRecord {
        id: model.id,
        submission_id: model.submission_id,
        contest_id: model.contest_id,
        start_time: model.start_time,
        end_time: model.end_time,
        result: model.result,
        verified: model.verified,
        jury_member: model.jury_member,
        verify_comment: model.verify_comment,
        valid: model.valid,
        seen: model.seen,
        judgehost: model.judgehost,
        compile_output: model.compile_output,
        rejudging_id: model.rejudging_id,
        original_judging_id: model.original_judging_id,
        runs: runs
            .into_iter()
            .map(run_record)
            .collect::<Result<_, _>>()?,
    })
}

fn rejudging_record(model: rejudging::Model) -> Rejudging {
    Rejudging {
        id: model.id,
        reason: model.reason,
        start_time: model.start_time,
        end_time: model.end_time,
        valid: model.valid,
        applied: model.applied,
    }
}

/// Every column except the primary key.
fn judging_columns(record: &JudgingRecord) -> judging::ActiveModel {
    judging::ActiveModel {
        submission_id: Set(record.submission_id),
        contest_id: Set(record.contest_id),
        start_time: Set(record.start_time),
        end_time: Set(record.end_time),
        result: Set(record.result),
        verified: Set(record.verified),
        jury_member: Set(record.jury_member.clone()),
        verify_comment: Set(record.verify_comment.clone()),
        valid: Set(record.valid),
        seen: Set(record.seen),
        judgehost: Set(record.judgehost.clone()),
        compile_output: Set(record.compile_output.clone()),
        rejudging_id: Set(record.rejudging_id),
        original_judging_id: Set(record.original_judging_id),
        ..Default::default()
    }
}

async fn load_runs<C: ConnectionTrait>(
    conn: &C,
    judging_ids: Vec<JudgingId>,
) -> Result<HashMap<JudgingId, Vec<judging_run::Model>>, StoreError> {
    let mut grouped: HashMap<JudgingId, Vec<judging_run::Model>> = HashMap::new();
    if judging_ids.is_empty() {
        return Ok(grouped);
    }
    let runs = judging_run::Entity::find()
        .filter(judging_run::Column::JudgingId.is_in(judging_ids))
        .order_by_asc(judging_run::Column::Id)
        .all(conn)
        .await?;
    for run in runs {
        grouped.entry(run.judging_id).or_default().push(run);
    }
    Ok(grouped)
}

async fn load_judging<C: ConnectionTrait>(
    conn: &C,
    id: JudgingId,
    lock: bool,
) -> Result<JudgingRecord, StoreError> {
    let mut query = judging::Entity::find_by_id(id);
    if lock {
        query = query.lock(LockType::Update);
    }
    let model = query
        .one(conn)
        .await?
        .ok_or_else(|| StoreError::NotFound(format!("Judging {id}")))?;
    let runs = load_runs(conn, vec![id]).await?.remove(&id).unwrap_or_default();
    Ok(judging_record(model, runs)?)
}

async fn load_submission_judgings<C: ConnectionTrait>(
    conn: &C,
    submission_id: SubmissionId,
    lock: bool,
) -> Result<Vec<JudgingRecord>, StoreError> {
    let mut query = judging::Entity::find()
        .filter(judging::Column::SubmissionId.eq(submission_id))
        .order_by_asc(judging::Column::Id);
    if lock {
        query = query.lock(LockType::Update);
    }
    let models = query.all(conn).await?;
    let mut runs = load_runs(conn, models.iter().map(|m| m.id).collect()).await?;
    let records = models
        .into_iter()
        .map(|m| {
            let own = runs.remove(&m.id).unwrap_or_default();
            judging_record(m, own)
        })
        .collect::<Result<_, _>>()?;
    Ok(records)
}

async fn load_rejudging<C: ConnectionTrait>(
    conn: &C,
    id: RejudgingId,
    lock: bool,
) -> Result<Rejudging, StoreError> {
    let mut query = rejudging::Entity::find_by_id(id);
    if lock {
        query = query.lock(LockType::Update);
    }
    query
        .one(conn)
        .await?
        .map(rejudging_record)
        .ok_or_else(|| StoreError::NotFound(format!("Rejudging {id}")))
}

/// Open rejudgings among those referenced by `judgings`.
async fn open_rejudgings<C: ConnectionTrait>(
    conn: &C,
    judgings: &[JudgingRecord],
) -> Result<HashSet<RejudgingId>, StoreError> {
    let referenced: Vec<RejudgingId> = judgings.iter().filter_map(|j| j.rejudging_id).collect();
    if referenced.is_empty() {
        return Ok(HashSet::new());
    }
    let open: Vec<RejudgingId> = rejudging::Entity::find()
        .select_only()
        .column(rejudging::Column::Id)
        .filter(rejudging::Column::Id.is_in(referenced))
        .filter(rejudging::Column::Valid.eq(true))
        .filter(rejudging::Column::Applied.eq(false))
        .into_tuple()
        .all(conn)
        .await?;
    Ok(open.into_iter().collect())
}

async fn set_validity<C: ConnectionTrait>(
    conn: &C,
    id: JudgingId,
    valid: bool,
) -> Result<(), StoreError> {
    judging::ActiveModel {
        id: Set(id),
        valid: Set(valid),
        ..Default::default()
    }
    .update(conn)
    .await
    .map_err(|e| {
        conflict_on_unique(e, || format!("Judging {id} would be a second valid judging"))
    })?;
    Ok(())
}

async fn save_rejudging<C: ConnectionTrait>(
    conn: &C,
    rejudging: &Rejudging,
) -> Result<(), StoreError> {
    rejudging::ActiveModel {
        id: Set(rejudging.id),
        end_time: Set(rejudging.end_time),
        valid: Set(rejudging.valid),
        applied: Set(rejudging.applied),
        ..Default::default()
    }
    .update(conn)
    .await?;
    Ok(())
}

#[async_trait]
impl ResultStore for SeaOrmStore {
    async fn fetch_correctness_records(
        &self,
        participant_category: i32,
        period_label_prefix: &str,
    ) -> Result<Vec<CorrectnessRecord>, StoreError> {
        // One transaction so the four reads see the same snapshot.
        let txn = self.db.begin().await?;

        let contests: HashMap<ContestId, String> = contest::Entity::find()
            .filter(contest::Column::Shortname.like(prefix_pattern(period_label_prefix)))
            .all(&txn)
            .await?
            .into_iter()
            .map(|c| (c.id, c.shortname))
            .collect();

        let teams: HashMap<ParticipantId, String> = team::Entity::find()
            .filter(team::Column::CategoryId.eq(participant_category))
            .all(&txn)
            .await?
            .into_iter()
            .map(|t| (t.id, t.name))
            .collect();

        if contests.is_empty() || teams.is_empty() {
            txn.commit().await?;
            return Ok(Vec::new());
        }

        // Membership is reduced to a set of team ids so that teams with
        // several logged-in users still contribute each score once.
        let active: HashSet<ParticipantId> = user::Entity::find()
            .select_only()
            .column(user::Column::TeamId)
            .filter(user::Column::TeamId.is_in(teams.keys().copied()))
            .filter(user::Column::FirstLogin.is_not_null())
            .into_tuple::<Option<i32>>()
            .all(&txn)
            .await?
            .into_iter()
            .flatten()
            .collect();

        if active.is_empty() {
            txn.commit().await?;
            return Ok(Vec::new());
        }

        let scores = scorecache::Entity::find()
            .filter(scorecache::Column::ContestId.is_in(contests.keys().copied()))
            .filter(scorecache::Column::TeamId.is_in(active.iter().copied()))
            .all(&txn)
            .await?;
        txn.commit().await?;

        let mut records: Vec<CorrectnessRecord> = scores
            .into_iter()
            .filter_map(|s| {
                let label = contests.get(&s.contest_id)?;
                let name = teams.get(&s.team_id)?;
                Some(CorrectnessRecord::new(
                    s.team_id,
                    name.clone(),
                    label.clone(),
                    s.is_correct,
                    s.runtime,
                ))
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
        let contests = contest::Entity::find()
            .filter(contest::Column::Shortname.like(prefix_pattern(period_label_prefix)))
            .order_by_asc(contest::Column::Shortname)
            .all(&self.db)
            .await?;
        Ok(contests
            .into_iter()
            .map(|c| PeriodBound {
                contest_id: c.id,
                label: c.shortname,
                start_time: c.start_time,
                end_time: c.end_time,
            })
            .collect())
    }

    async fn get_judging(&self, id: JudgingId) -> Result<JudgingRecord, StoreError> {
        load_judging(&self.db, id, false).await
    }

    async fn get_rejudging(&self, id: RejudgingId) -> Result<Rejudging, StoreError> {
        load_rejudging(&self.db, id, false).await
    }

    async fn judgings_for_submission(
        &self,
        submission_id: SubmissionId,
    ) -> Result<Vec<JudgingRecord>, StoreError> {
        load_submission_judgings(&self.db, submission_id, false).await
    }

    async fn get_contest_start(&self, contest_id: ContestId) -> Result<DateTime<Utc>, StoreError> {
        contest::Entity::find_by_id(contest_id)
            .one(&self.db)
            .await?
            .map(|c| c.start_time)
            .ok_or_else(|| StoreError::NotFound(format!("Contest {contest_id}")))
    }

    async fn insert_judging(&self, new: NewJudging) -> Result<JudgingRecord, StoreError> {
        let txn = self.db.begin().await?;

        let existing = load_submission_judgings(&txn, new.submission_id, true).await?;
        if let Some(valid) = existing.iter().find(|j| j.valid) {
            return Err(StoreError::Conflict(format!(
                "Submission {} already has valid judging {}",
                new.submission_id, valid.id
            )));
        }

        let mut draft = JudgingRecord::new(0, new.submission_id, new.contest_id, new.start_time);
        draft.judgehost = new.judgehost;
        draft.validate()?;
        // The partial unique index on valid judgings catches a concurrent
        // insert that passed the check above.
        let model = judging_columns(&draft)
            .insert(&txn)
            .await
            .map_err(|e| {
                conflict_on_unique(e, || {
                    format!("Submission {} already has a valid judging", new.submission_id)
                })
            })?;
        txn.commit().await?;

        info!(
            judging_id = model.id,
            submission_id = model.submission_id,
            "Started judging"
        );
        Ok(judging_record(model, Vec::new())?)
    }

    async fn apply_transition(
        &self,
        id: JudgingId,
        transition: JudgingTransition,
    ) -> Result<JudgingRecord, StoreError> {
        let txn = self.db.begin().await?;

        let mut record = load_judging(&txn, id, true).await?;
        let rejudging = match record.rejudging_id {
            Some(rid) => rejudging::Entity::find_by_id(rid)
                .one(&txn)
                .await?
                .map(rejudging_record),
            None => None,
        };

        let appends_run = matches!(transition, JudgingTransition::AppendRun { .. });
        let changes_validity = transition.changes_validity();
        record.apply(transition, rejudging.as_ref())?;
        record.validate()?;

        if appends_run && let Some(run) = record.runs.last_mut() {
            let model = judging_run::ActiveModel {
                judging_id: Set(id),
                testcase_rank: Set(rank_to_column(id, run.testcase_rank)?),
                result: Set(run.result),
                runtime: Set(run.runtime),
                ..Default::default()
            }
            .insert(&txn)
            .await?;
            run.id = model.id;
        }

        let mut update = judging_columns(&record);
        update.id = Set(id);
        update.update(&txn).await?;

        if changes_validity {
            let siblings = load_submission_judgings(&txn, record.submission_id, false).await?;
            warn_if_inconsistent(record.submission_id, &siblings);
        }
        txn.commit().await?;

        Ok(record)
    }

    async fn create_rejudging(
        &self,
        reason: &str,
        submission_ids: &[SubmissionId],
    ) -> Result<RejudgingBatch, StoreError> {
        let txn = self.db.begin().await?;
        let now = Utc::now();

        let submission_ids = distinct_submissions(submission_ids);
        let mut originals = Vec::with_capacity(submission_ids.len());
        for submission_id in submission_ids {
            let judgings = load_submission_judgings(&txn, submission_id, true).await?;
            let open = open_rejudgings(&txn, &judgings).await?;
            ensure_not_rejudging(submission_id, &judgings, |rid| open.contains(&rid))?;
            originals.push(current_judging(submission_id, &judgings)?.clone());
        }

        let rejudging = rejudging::ActiveModel {
            reason: Set(reason.to_string()),
            start_time: Set(now),
            end_time: Set(None),
            valid: Set(true),
            applied: Set(false),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map(rejudging_record)?;

        let mut judgings = Vec::with_capacity(originals.len());
        for original in &originals {
            let draft = JudgingRecord::rejudge_from(original, 0, rejudging.id, now);
            let model = judging_columns(&draft).insert(&txn).await?;
            judgings.push(judging_record(model, Vec::new())?);
        }
        txn.commit().await?;

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
        let txn = self.db.begin().await?;

        let mut rejudging = load_rejudging(&txn, id, true).await?;
        // Runs are irrelevant to the swap, so candidates are loaded without them.
        let mut candidates: Vec<JudgingRecord> = judging::Entity::find()
            .filter(judging::Column::RejudgingId.eq(id))
            .filter(judging::Column::Valid.eq(false))
            .lock(LockType::Update)
            .all(&txn)
            .await?
            .into_iter()
            .map(|m| judging_record(m, Vec::new()))
            .collect::<Result<_, _>>()?;
        rejudging.apply(&candidates, Utc::now())?;

        for candidate in &mut candidates {
            let siblings = load_submission_judgings(&txn, candidate.submission_id, true).await?;
            ensure_replaces_only_original(candidate, &siblings)?;
            candidate.activate()?;

            // Original first: the unique index admits one valid judging at a time.
            if let Some(original) = candidate
                .original_judging_id
                .and_then(|oid| siblings.iter().find(|j| j.id == oid))
                && original.valid
            {
                set_validity(&txn, original.id, false).await?;
            }
            set_validity(&txn, candidate.id, true).await?;
        }
        save_rejudging(&txn, &rejudging).await?;

        for candidate in &candidates {
            let siblings = load_submission_judgings(&txn, candidate.submission_id, false).await?;
            warn_if_inconsistent(candidate.submission_id, &siblings);
        }
        txn.commit().await?;

        info!(
            rejudging_id = id,
            judgings = candidates.len(),
            "Applied rejudging"
        );
        Ok(rejudging)
    }

    async fn cancel_rejudging(&self, id: RejudgingId) -> Result<Rejudging, StoreError> {
        let txn = self.db.begin().await?;
        let mut rejudging = load_rejudging(&txn, id, true).await?;
        rejudging.cancel(Utc::now())?;
        save_rejudging(&txn, &rejudging).await?;
        txn.commit().await?;

        info!(rejudging_id = id, "Cancelled rejudging");
        Ok(rejudging)
    }

    async fn submissions_with_multiple_valid_judgings(
        &self,
    ) -> Result<Vec<SubmissionId>, StoreError> {
        let valid: Vec<SubmissionId> = judging::Entity::find()
            .select_only()
            .column(judging::Column::SubmissionId)
            .filter(judging::Column::Valid.eq(true))
            .into_tuple()
            .all(&self.db)
            .await?;
        Ok(duplicated_submissions(valid))
    }
}
