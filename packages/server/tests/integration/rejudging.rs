use ::common::error::RejudgingError;
use ::common::{JudgingResult, JudgingState, JudgingTransition};
use chrono::{DateTime, Duration, Utc};
use server::services::consistency;
use server::store::{ResultStore, StoreError};

use crate::common::{at, judging_service, memory_store, new_judging};

/// End time for judgings opened by a rejudging, which start at the wall clock.
fn after_now() -> DateTime<Utc> {
    Utc::now() + Duration::minutes(1)
}

/// A finished wrong-answer judging for `submission_id`; returns its id.
async fn judged_submission(store: &dyn ResultStore, submission_id: i32) -> i32 {
    let judging = store
        .insert_judging(new_judging(submission_id, 0))
        .await
        .unwrap();
    store
        .apply_transition(
            judging.id,
            JudgingTransition::Finish {
                end_time: at(10),
                result: Some(JudgingResult::WrongAnswer),
            },
        )
        .await
        .unwrap();
    judging.id
}

#[tokio::test]
async fn applied_rejudging_swaps_validity() {
    let store = memory_store().await;
    let judgings = judging_service(store.clone());
    let original_id = judged_submission(store.as_ref(), 7).await;

    let batch = judgings.rejudge("fixed checker", &[7]).await.unwrap();
    assert_eq!(batch.judgings.len(), 1);
    let candidate = &batch.judgings[0];
    assert_eq!(candidate.original_judging_id, Some(original_id));
    assert!(!candidate.valid);
    assert_eq!(
        candidate.state(Some(&batch.rejudging)),
        JudgingState::Rejudging
    );
    assert!(!candidate.is_aborted(Some(&batch.rejudging)));

    // The original stays authoritative while the batch is open.
    assert!(store.get_judging(original_id).await.unwrap().valid);

    let err = judgings
        .apply_rejudging(batch.rejudging.id)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        StoreError::Rejudging(RejudgingError::Unfinished { unfinished: 1, .. })
    ));

    judgings
        .finish(candidate.id, after_now(), Some(JudgingResult::Correct))
        .await
        .unwrap();
    let applied = judgings.apply_rejudging(batch.rejudging.id).await.unwrap();
    assert!(applied.applied);
    assert!(!applied.is_pending());

    let original = store.get_judging(original_id).await.unwrap();
    let replacement = store.get_judging(candidate.id).await.unwrap();
    assert_eq!(original.state(None), JudgingState::Invalidated);
    assert_eq!(original.result, JudgingResult::WrongAnswer);
    assert_eq!(replacement.state(Some(&applied)), JudgingState::Completed);
    assert_eq!(replacement.result, JudgingResult::Correct);

    assert!(consistency::scan(store.as_ref()).await.unwrap().is_empty());
}

#[tokio::test]
async fn cancelled_rejudging_aborts_unfinished_judgings() {
    let store = memory_store().await;
    let judgings = judging_service(store.clone());
    let original_id = judged_submission(store.as_ref(), 7).await;

    let batch = judgings.rejudge("wrong time limit", &[7]).await.unwrap();
    let candidate_id = batch.judgings[0].id;
    let cancelled = judgings
        .cancel_rejudging(batch.rejudging.id)
        .await
        .unwrap();
    assert!(!cancelled.valid);

    let candidate = store.get_judging(candidate_id).await.unwrap();
    assert!(candidate.is_aborted(Some(&cancelled)));
    assert!(!candidate.is_still_busy(Some(&cancelled)));
    assert!(store.get_judging(original_id).await.unwrap().valid);

    let err = judgings
        .finish(candidate_id, after_now(), Some(JudgingResult::Correct))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Judging(_)));

    let err = judgings
        .apply_rejudging(batch.rejudging.id)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        StoreError::Rejudging(RejudgingError::Cancelled(_))
    ));
}

#[tokio::test]
async fn submission_cannot_join_two_open_rejudgings() {
    let store = memory_store().await;
    let judgings = judging_service(store.clone());
    judged_submission(store.as_ref(), 7).await;
    judged_submission(store.as_ref(), 8).await;

    let first = judgings.rejudge("batch one", &[7]).await.unwrap();
    let err = judgings.rejudge("batch two", &[8, 7]).await.unwrap_err();
    assert!(matches!(err, StoreError::Conflict(_)), "{err:?}");

    // Once the first batch is closed the submission is free again.
    judgings.cancel_rejudging(first.rejudging.id).await.unwrap();
    let second = judgings.rejudge("batch two", &[8, 7]).await.unwrap();
    assert_eq!(second.judgings.len(), 2);
}

#[tokio::test]
async fn rejudging_needs_a_valid_judging() {
    let store = memory_store().await;
    let judgings = judging_service(store);

    let err = judgings.rejudge("nothing to redo", &[99]).await.unwrap_err();
    assert!(matches!(err, StoreError::NotFound(_)));
}

#[tokio::test]
async fn closed_rejudging_cannot_be_cancelled() {
    let store = memory_store().await;
    let judgings = judging_service(store.clone());
    judged_submission(store.as_ref(), 7).await;
    let batch = judgings.rejudge("again", &[7]).await.unwrap();
    judgings
        .finish(batch.judgings[0].id, after_now(), Some(JudgingResult::Correct))
        .await
        .unwrap();
    judgings.apply_rejudging(batch.rejudging.id).await.unwrap();

    let err = judgings
        .cancel_rejudging(batch.rejudging.id)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        StoreError::Rejudging(RejudgingError::AlreadyApplied(_))
    ));
}

#[tokio::test]
async fn repeated_submission_gets_a_single_attempt() {
    let store = memory_store().await;
    let judgings = judging_service(store.clone());
    let original_id = judged_submission(store.as_ref(), 7).await;

    let batch = judgings.rejudge("listed twice", &[7, 7]).await.unwrap();
    assert_eq!(batch.judgings.len(), 1);
    let candidate_id = batch.judgings[0].id;
    judgings
        .finish(candidate_id, after_now(), Some(JudgingResult::Correct))
        .await
        .unwrap();
    judgings.apply_rejudging(batch.rejudging.id).await.unwrap();

    let valid: Vec<_> = store
        .judgings_for_submission(7)
        .await
        .unwrap()
        .into_iter()
        .filter(|j| j.valid)
        .map(|j| j.id)
        .collect();
    assert_eq!(valid, [candidate_id]);
    assert!(!store.get_judging(original_id).await.unwrap().valid);
    assert!(consistency::scan(store.as_ref()).await.unwrap().is_empty());
}

#[tokio::test]
async fn apply_refuses_to_leave_two_valid_judgings() {
    let store = memory_store().await;
    let judgings = judging_service(store.clone());
    let original_id = judged_submission(store.as_ref(), 7).await;
    let batch = judgings.rejudge("slow host", &[7]).await.unwrap();

    // The original is dropped and judged afresh outside the batch.
    judgings
        .transition(original_id, JudgingTransition::Invalidate)
        .await
        .unwrap();
    let fresh = judgings.start(new_judging(7, 60)).await.unwrap();

    judgings
        .finish(batch.judgings[0].id, after_now(), Some(JudgingResult::Correct))
        .await
        .unwrap();
    let err = judgings
        .apply_rejudging(batch.rejudging.id)
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Conflict(_)), "{err:?}");

    assert!(store.get_rejudging(batch.rejudging.id).await.unwrap().is_pending());
    assert!(!store.get_judging(batch.judgings[0].id).await.unwrap().valid);
    assert!(store.get_judging(fresh.id).await.unwrap().valid);
}
