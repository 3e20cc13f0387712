use std::sync::Arc;

use chrono::NaiveDate;
use poem::{http::StatusCode, test::TestClient};
use serde_json::json;

use khatma_tracker::{
    TrackerSettings,
    api::{self, TrackerRegistry},
    clock::FixedClock,
    storage::MemoryBackend,
};

fn registry() -> Arc<TrackerRegistry> {
    Arc::new(TrackerRegistry::new(
        Arc::new(MemoryBackend::new()),
        Arc::new(FixedClock::at_date(
            NaiveDate::from_ymd_opt(2025, 3, 10).unwrap(),
        )),
        TrackerSettings::default(),
    ))
}

fn client() -> TestClient<impl poem::Endpoint> {
    TestClient::new(api::app(registry(), "http://localhost:3000".to_string()))
}

#[tokio::test]
async fn health_and_juz_table() {
    let cli = client();

    let resp = cli.get("/health").send().await;
    resp.assert_status_is_ok();

    let resp = cli.get("/v1/juz").send().await;
    resp.assert_status_is_ok();
    let body = resp.json().await;
    body.value().array().assert_len(30);

    let resp = cli.get("/v1/juz/30").send().await;
    resp.assert_status_is_ok();
    let body = resp.json().await;
    body.value().object().get("startSurah").assert_i64(78);
    body.value().object().get("totalPages").assert_i64(23);

    cli.get("/v1/juz/31")
        .send()
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn toggling_updates_the_summary() {
    let cli = client();

    let resp = cli.post("/v1/users/amina/khatma/juz/2/toggle").send().await;
    resp.assert_status_is_ok();
    let body = resp.json().await;
    let summary = body.value().object();
    summary.get("completedJuz").assert_i64_array(&[2]);
    summary.get("totalPagesRead").assert_i64(20);
    summary.get("streakDays").assert_i64(1);
    summary.get("isComplete").assert_bool(false);
    summary.get("status").assert_string("in_progress");

    cli.put("/v1/users/amina/khatma/juz/0")
        .send()
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    let resp = cli.get("/v1/users/bilal/khatma").send().await;
    resp.assert_status_is_ok();
    resp.json()
        .await
        .value()
        .object()
        .get("completedJuz")
        .assert_i64_array(&[]);
}

#[tokio::test]
async fn advancing_rounds_over_http() {
    let cli = client();
    cli.put("/v1/users/amina/khatma/juz/5").send().await.assert_status_is_ok();

    let resp = cli.post("/v1/users/amina/khatma/rounds").send().await;
    resp.assert_status_is_ok();
    let body = resp.json().await;
    let summary = body.value().object();
    summary.get("currentRound").assert_i64(2);
    summary.get("completedJuz").assert_i64_array(&[]);
    summary.get("completedRounds").array().assert_len(1);
}

#[tokio::test]
async fn session_gates_reading_positions() {
    let cli = client();

    let resp = cli
        .post("/v1/users/amina/khatma/reading")
        .body_json(&json!({ "surah": 2, "verse": 10 }))
        .send()
        .await;
    resp.assert_status_is_ok();
    cli.get("/v1/users/amina/khatma/juz/1/position")
        .send()
        .await
        .assert_status(StatusCode::NOT_FOUND);

    cli.put("/v1/users/amina/khatma/session")
        .body_json(&json!({ "juz": 1 }))
        .send()
        .await
        .assert_status_is_ok();

    let resp = cli
        .post("/v1/users/amina/khatma/reading")
        .body_json(&json!({ "surah": 2, "verse": 10 }))
        .send()
        .await;
    resp.assert_status_is_ok();
    resp.json()
        .await
        .value()
        .object()
        .get("recordedJuz")
        .assert_i64(1);

    let resp = cli.get("/v1/users/amina/khatma/juz/1/position").send().await;
    resp.assert_status_is_ok();
    resp.json().await.value().object().get("verse").assert_i64(10);

    cli.get("/v1/users/amina/khatma/juz/2/position")
        .send()
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn completed_juz_reject_positions() {
    let cli = client();
    cli.put("/v1/users/amina/khatma/juz/1").send().await.assert_status_is_ok();

    cli.put("/v1/users/amina/khatma/juz/1/position")
        .body_json(&json!({ "surah": 2, "verse": 10 }))
        .send()
        .await
        .assert_status(StatusCode::BAD_REQUEST);
    cli.get("/v1/users/amina/khatma/juz/1/position")
        .send()
        .await
        .assert_status(StatusCode::NOT_FOUND);

    cli.delete("/v1/users/amina/khatma/juz/1").send().await.assert_status_is_ok();
    let resp = cli.get("/v1/users/amina/khatma").send().await;
    resp.assert_status_is_ok();
    resp.json()
        .await
        .value()
        .object()
        .get("positions")
        .array()
        .assert_len(0);
}

#[tokio::test]
async fn user_ids_share_a_tracker_per_namespace() {
    let registry = registry();
    let plain = registry.tracker_for("alice").await;
    let padded = registry.tracker_for(" alice ").await;
    assert!(Arc::ptr_eq(&plain, &padded));

    plain.mark(1).await;
    padded.mark(2).await;
    let state = registry.tracker_for("alice").await.state().await;
    assert_eq!(state.completed_juz.into_iter().collect::<Vec<_>>(), vec![1, 2]);

    let other = registry.tracker_for("bob").await;
    assert!(!Arc::ptr_eq(&plain, &other));
}
