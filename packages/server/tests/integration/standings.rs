use std::sync::Arc;

use ::common::config::ProgressConfig;
use ::standings::ProgressStatus;
use chrono::Duration;
use server::services::standings::StandingsService;
use server::store::{MemoryStore, ResultStore};

use crate::common::contest_start;

const STUDENTS: i32 = 3;

/// Six weekly contests plus a practice contest outside the course.
async fn course_store() -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new());
    for week in 1..=6 {
        let start = contest_start() + Duration::weeks(week as i64 - 1);
        store
            .add_contest(week, &format!("week{week:02}"), start, start + Duration::days(6))
            .await;
    }
    store
        .add_contest(9, "practice", contest_start(), contest_start() + Duration::days(60))
        .await;
    store
}

async fn add_correct(store: &MemoryStore, contest_id: i32, team_id: i32, count: usize) {
    for _ in 0..count {
        store.add_score(contest_id, team_id, true, 1.5).await;
    }
}

fn service(store: Arc<MemoryStore>) -> StandingsService {
    StandingsService::new(store, ProgressConfig::default())
}

#[tokio::test]
async fn report_ranks_active_students_only() {
    let store = course_store().await;
    store.add_team(10, "alice", STUDENTS, true).await;
    store.add_team(11, "bob", STUDENTS, true).await;
    store.add_team(12, "ghost", STUDENTS, false).await;
    store.add_team(13, "jury", 1, true).await;

    for week in 1..=5 {
        add_correct(&store, week, 10, 3).await;
    }
    add_correct(&store, 9, 10, 4).await;
    add_correct(&store, 1, 11, 2).await;
    add_correct(&store, 2, 11, 1).await;
    store.add_score(2, 11, false, 9.0).await;
    for week in 1..=6 {
        add_correct(&store, week, 12, 5).await;
        add_correct(&store, week, 13, 5).await;
    }

    let report = service(store).report().await.unwrap();
    let standings = &report.standings;

    let names: Vec<_> = standings
        .rows
        .iter()
        .map(|r| r.participant_name.as_str())
        .collect();
    assert_eq!(names, ["alice", "bob"]);

    let alice = standings.row(10).unwrap();
    assert_eq!(alice.rank, 1);
    assert_eq!(alice.total_correct, 15);
    assert_eq!(alice.per_period_correct, [3, 3, 3, 3, 3, 0]);
    assert_eq!(alice.periods_passed, 5);
    assert_eq!(alice.status, ProgressStatus::Pending);

    let bob = standings.row(11).unwrap();
    assert_eq!(bob.rank, 2);
    assert_eq!(bob.total_correct, 3);
    assert_eq!(bob.per_period_correct, [2, 1, 0, 0, 0, 0]);
    assert_eq!(bob.periods_passed, 1);
    assert_eq!(bob.total_runtime, 3.0 * 1.5 + 9.0);

    assert_eq!(standings.context.max_correct, 15);
    assert_eq!(standings.context.periods_remaining, 4);
    assert_eq!(bob.max_possible_correct, 23);
    assert_eq!(bob.max_possible_periods_passed, 5);
    assert!(!bob.failed);

    assert_eq!(report.first_period.as_ref().unwrap().label, "week01");
    assert_eq!(report.last_period.as_ref().unwrap().label, "week06");
}

#[tokio::test]
async fn store_rows_arrive_grouped_by_team_then_period() {
    let store = course_store().await;
    store.add_team(21, "b", STUDENTS, true).await;
    store.add_team(20, "a", STUDENTS, true).await;
    add_correct(&store, 3, 21, 1).await;
    add_correct(&store, 1, 20, 1).await;
    add_correct(&store, 1, 21, 1).await;

    let records = store
        .fetch_correctness_records(STUDENTS, "week")
        .await
        .unwrap();
    let keys: Vec<_> = records
        .iter()
        .map(|r| (r.participant_id, r.period_label.as_str()))
        .collect();
    assert_eq!(keys, [(20, "week01"), (21, "week01"), (21, "week03")]);
}

#[tokio::test]
async fn empty_course_has_no_rows_but_keeps_period_bounds() {
    let store = course_store().await;

    let report = service(store).report().await.unwrap();
    assert!(report.standings.is_empty());
    assert_eq!(report.standings.context.max_correct, 0);
    assert_eq!(report.first_period.unwrap().contest_id, 1);
    assert_eq!(report.last_period.unwrap().contest_id, 6);
}

#[tokio::test]
async fn report_without_any_contest_has_no_bounds() {
    let store = Arc::new(MemoryStore::new());
    let report = service(store).report().await.unwrap();
    assert!(report.standings.is_empty());
    assert!(report.first_period.is_none());
    assert!(report.last_period.is_none());
}
