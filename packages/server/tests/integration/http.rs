use std::sync::Arc;

use ::common::{JudgingResult, JudgingTransition, RunRecord};
use chrono::Duration;
use serde_json::json;
use server::store::{MemoryStore, NewJudging, ResultStore};

use crate::common::{TestApp, at, contest_start, memory_store, routes};

/// Judging of submission 7 started 12:03.250 into contest 1.
async fn running_judging(store: &MemoryStore) -> i32 {
    let judging = store
        .insert_judging(NewJudging {
            submission_id: 7,
            contest_id: 1,
            start_time: contest_start() + Duration::milliseconds(723_250),
            judgehost: Some("judgehost-2".into()),
        })
        .await
        .unwrap();
    judging.id
}

async fn finish(store: &MemoryStore, id: i32) {
    store
        .apply_transition(
            id,
            JudgingTransition::AppendRun {
                run: RunRecord {
                    id: 0,
                    testcase_rank: 1,
                    result: JudgingResult::Correct,
                    runtime: 0.5,
                },
            },
        )
        .await
        .unwrap();
    store
        .apply_transition(
            id,
            JudgingTransition::Finish {
                end_time: at(800),
                result: Some(JudgingResult::Correct),
            },
        )
        .await
        .unwrap();
}

mod standings {
    use super::*;

    #[tokio::test]
    async fn returns_ranked_rows_and_period_bounds() {
        let store = memory_store().await;
        store.add_team(10, "alice", 3, true).await;
        store.add_team(11, "bob", 3, true).await;
        store.add_score(1, 11, true, 1.0).await;
        store.add_score(1, 11, true, 1.0).await;
        store.add_score(1, 10, true, 2.0).await;
        let app = TestApp::spawn(store).await;

        let res = app.get(routes::STANDINGS).await;
        assert_eq!(res.status, 200, "{}", res.text);

        let rows = res.body["standings"]["rows"].as_array().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["participant_name"], "bob");
        assert_eq!(rows[0]["rank"], 1);
        assert_eq!(rows[0]["per_period_correct"][0], 2);
        assert_eq!(rows[0]["status"], "pending");
        assert_eq!(rows[1]["participant_name"], "alice");
        assert_eq!(res.body["first_period"]["label"], "week01");
        assert_eq!(res.body["last_period"]["label"], "week01");
    }

    #[tokio::test]
    async fn empty_store_yields_empty_report() {
        let app = TestApp::spawn(Arc::new(MemoryStore::new())).await;

        let res = app.get(routes::STANDINGS).await;
        assert_eq!(res.status, 200);
        assert_eq!(res.body["standings"]["rows"], json!([]));
        assert!(res.body["first_period"].is_null());
    }
}

mod judgings {
    use super::*;

    #[tokio::test]
    async fn detail_renders_state_and_times() {
        let store = memory_store().await;
        let id = running_judging(&store).await;
        let app = TestApp::spawn(store.clone()).await;

        let res = app.get(&routes::judging(id)).await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["state"], "pending");
        assert_eq!(res.body["result"], "pending");
        assert_eq!(res.body["is_still_busy"], false);
        assert_eq!(res.body["relative_start_time"], "0:12:03.250");
        assert_eq!(res.body["start_time"], "2024-04-15T09:12:03.250+00:00");
        assert!(res.body["end_time"].is_null());

        finish(&store, id).await;
        let res = app.get(&routes::judging(id)).await;
        assert_eq!(res.body["state"], "completed");
        assert_eq!(res.body["relative_end_time"], "0:13:20.000");
        assert_eq!(res.body["max_runtime"], 0.5);
        assert_eq!(res.body["runs"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn unknown_judging_is_404() {
        let app = TestApp::spawn(memory_store().await).await;

        let res = app.get(&routes::judging(404)).await;
        assert_eq!(res.status, 404);
        assert_eq!(res.code(), "NOT_FOUND");
    }

    #[tokio::test]
    async fn non_numeric_id_is_a_validation_error() {
        let app = TestApp::spawn(memory_store().await).await;

        let res = app.get("/api/v1/judgings/abc").await;
        assert_eq!(res.status, 400);
        assert_eq!(res.code(), "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn verify_requires_a_finished_judging() {
        let store = memory_store().await;
        let id = running_judging(&store).await;
        let app = TestApp::spawn(store.clone()).await;
        let body = json!({ "jury_member": "jury", "comment": "looks right" });

        let res = app.post(&routes::judging_verify(id), &body).await;
        assert_eq!(res.status, 409, "{}", res.text);
        assert_eq!(res.code(), "CONFLICT");

        finish(&store, id).await;
        let res = app.post(&routes::judging_verify(id), &body).await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["verified"], true);
        assert_eq!(res.body["state"], "verified");
        assert_eq!(res.body["jury_member"], "jury");
        assert_eq!(res.body["verify_comment"], "looks right");

        let res = app.post(&routes::judging_verify(id), &body).await;
        assert_eq!(res.status, 409);
    }

    #[tokio::test]
    async fn verify_rejects_bad_bodies() {
        let store = memory_store().await;
        let id = running_judging(&store).await;
        finish(&store, id).await;
        let app = TestApp::spawn(store).await;

        let res = app
            .post(&routes::judging_verify(id), &json!({ "jury_member": "  " }))
            .await;
        assert_eq!(res.status, 400);
        assert_eq!(res.code(), "VALIDATION_ERROR");

        let res = app.post_raw(&routes::judging_verify(id), "{not json").await;
        assert_eq!(res.status, 400);
        assert_eq!(res.code(), "VALIDATION_ERROR");
    }
}

#[tokio::test]
async fn openapi_document_lists_the_routes() {
    let app = TestApp::spawn(memory_store().await).await;

    let res = app.get(routes::OPENAPI).await;
    assert_eq!(res.status, 200);
    let paths = res.body["paths"].as_object().unwrap();
    assert!(paths.contains_key("/api/v1/course/standings"));
    assert!(paths.contains_key("/api/v1/judgings/{id}"));
    assert!(paths.contains_key("/api/v1/judgings/{id}/verify"));
}
