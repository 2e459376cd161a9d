//! Session endpoint integration tests
//!
//! Tests for the ADK session collection endpoints backed by a mocked Goose:
//! - POST /apps/{app}/users/{user}/sessions
//! - GET /apps/{app}/users/{user}/sessions
//! - POST/GET/DELETE /apps/{app}/users/{user}/sessions/{session}

use axum::http::StatusCode;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

use crate::common::{constants, TestHarness};
use crate::mocks::GooseTestData;

#[tokio::test]
async fn test_create_session_starts_goose_agent() {
    let harness = TestHarness::new().await;
    harness.goose.mock_start_agent(constants::GOOSE_SESSION_ID).await;

    let response = harness.server.post(&harness.sessions_path()).await;

    response.assert_status_ok();
    let body: Value = response.json();
    let id = body["id"].as_str().unwrap();
    assert!(id.starts_with("myapp_user1_"));
    assert_eq!(body["appName"], "myapp");
    assert_eq!(body["userId"], "user1");
    assert_eq!(body["state"], json!({}));
    assert_eq!(body["events"], json!([]));

    let starts = harness.goose.requests_to("POST", "/agent/start").await;
    assert_eq!(starts.len(), 1);
    let start_body: Value = serde_json::from_slice(&starts[0].body).unwrap();
    assert_eq!(start_body, json!({"working_dir": "/tmp"}));

    assert_eq!(
        harness.state.sessions.lookup(id).await.as_deref(),
        Some(constants::GOOSE_SESSION_ID)
    );
}

#[tokio::test]
async fn test_reused_goose_session_id_is_rejected() {
    let harness = TestHarness::new().await;
    harness.goose.mock_start_agent(constants::GOOSE_SESSION_ID).await;

    let first: Value = harness.server.post(&harness.sessions_path()).await.json();
    let second = harness.server.post(&harness.sessions_path()).await;

    assert_ne!(first["id"], Value::Null);
    // Goose handed out the same id twice, which the bijection refuses.
    assert_eq!(second.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_create_session_sends_secret_header() {
    let harness = TestHarness::with_overrides(&[("GOOSE_SECRET_KEY", constants::TEST_SECRET)]).await;
    harness
        .goose
        .mock_start_agent_with_secret(constants::GOOSE_SESSION_ID, constants::TEST_SECRET)
        .await;

    let response = harness.server.post(&harness.sessions_path()).await;

    response.assert_status_ok();
}

#[tokio::test]
async fn test_create_session_without_secret_is_rejected_by_goose() {
    let harness = TestHarness::new().await;
    harness
        .goose
        .mock_start_agent_with_secret(constants::GOOSE_SESSION_ID, constants::TEST_SECRET)
        .await;

    let response = harness.server.post(&harness.sessions_path()).await;

    assert_eq!(response.status_code(), StatusCode::BAD_GATEWAY);
    let requests = harness.goose.requests_to("POST", "/agent/start").await;
    assert!(requests[0].headers.get("x-secret-key").is_none());
}

#[tokio::test]
async fn test_create_session_goose_failure_is_bad_gateway() {
    let harness = TestHarness::new().await;
    harness.goose.mock_start_agent_failure(500, "agent crashed").await;

    let response = harness.server.post(&harness.sessions_path()).await;

    assert_eq!(response.status_code(), StatusCode::BAD_GATEWAY);
    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "SESSION_START_FAILED");
    let message = body["error"]["message"].as_str().unwrap();
    assert!(message.contains("unexpected status 500: agent crashed"));
    assert!(harness.state.sessions.is_empty().await);
}

#[tokio::test]
async fn test_create_session_undecodable_goose_body() {
    let harness = TestHarness::new().await;
    harness.goose.mock_start_agent_garbage().await;

    let response = harness.server.post(&harness.sessions_path()).await;

    assert_eq!(response.status_code(), StatusCode::BAD_GATEWAY);
    assert!(harness.state.sessions.is_empty().await);
}

#[tokio::test]
async fn test_list_sessions_sorted_snapshot() {
    let harness = TestHarness::new().await;
    harness.goose.mock_resume_agent("g-b").await;
    harness.goose.mock_resume_agent("g-a").await;

    for (session, goose_id) in [("sess-b", "g-b"), ("sess-a", "g-a")] {
        harness
            .server
            .post(&harness.session_path(session))
            .json(&json!({"gooseSessionId": goose_id}))
            .await
            .assert_status_ok();
    }

    let response = harness.server.get(&harness.sessions_path()).await;

    response.assert_status_ok();
    let body: Value = response.json();
    let ids: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["sess-a", "sess-b"]);
    assert_eq!(body[0], json!({"id": "sess-a", "state": {}, "events": []}));
}

#[tokio::test]
async fn test_list_sessions_does_not_relabel_under_other_app() {
    let harness = TestHarness::new().await;
    harness.goose.mock_start_agent(constants::GOOSE_SESSION_ID).await;
    harness
        .server
        .post(&harness.session_path("mine"))
        .await
        .assert_status_ok();

    let body: Value = harness
        .server
        .get("/apps/otherapp/users/someone/sessions")
        .await
        .json();

    assert_eq!(body, json!([{"id": "mine", "state": {}, "events": []}]));
    assert!(body[0].get("appName").is_none());
    assert!(body[0].get("userId").is_none());
}

#[tokio::test]
async fn test_list_sessions_empty() {
    let harness = TestHarness::new().await;

    let response = harness.server.get(&harness.sessions_path()).await;

    response.assert_status_ok();
    assert_eq!(response.json::<Value>(), json!([]));
}

#[tokio::test]
async fn test_create_with_id_starts_agent_once() {
    let harness = TestHarness::new().await;
    harness.goose.mock_start_agent(constants::GOOSE_SESSION_ID).await;

    harness
        .server
        .post(&harness.session_path("fixed-id"))
        .await
        .assert_status_ok();
    let again = harness.server.post(&harness.session_path("fixed-id")).await;

    again.assert_status_ok();
    assert_eq!(again.json::<Value>()["id"], "fixed-id");
    assert_eq!(harness.goose.requests_to("POST", "/agent/start").await.len(), 1);
}

#[tokio::test]
async fn test_adopting_mapped_goose_session_is_bad_request() {
    let harness = TestHarness::new().await;
    harness.goose.mock_resume_agent("g-1").await;

    harness
        .server
        .post(&harness.session_path("first"))
        .json(&json!({"gooseSessionId": "g-1"}))
        .await
        .assert_status_ok();

    let response = harness
        .server
        .post(&harness.session_path("second"))
        .json(&json!({"gooseSessionId": "g-1"}))
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(harness.goose.requests_to("POST", "/agent/resume").await.len(), 1);
}

#[tokio::test]
async fn test_get_session_replays_history() {
    let harness = TestHarness::new().await;
    harness.goose.mock_start_agent(constants::GOOSE_SESSION_ID).await;
    harness
        .goose
        .mock_session_history(
            constants::GOOSE_SESSION_ID,
            json!([
                GooseTestData::history_message("user", "hello", 100),
                GooseTestData::history_message("assistant", "Hello from Goose!", 101)
            ]),
        )
        .await;

    harness
        .server
        .post(&harness.session_path("with-history"))
        .await
        .assert_status_ok();

    let response = harness.server.get(&harness.session_path("with-history")).await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["id"], "with-history");
    let events = body["events"].as_array().unwrap();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0]["author"], "user");
    assert_eq!(events[0]["content"]["role"], "user");
    assert_eq!(events[0]["time"], 100);
    assert_eq!(events[1]["author"], "goose");
    assert_eq!(events[1]["content"]["role"], "model");
    assert_eq!(events[1]["content"]["parts"][0]["text"], "Hello from Goose!");
    assert_eq!(events[0]["invocationId"], events[1]["invocationId"]);
}

#[tokio::test]
async fn test_get_unknown_session_is_not_found() {
    let harness = TestHarness::new().await;

    let response = harness.server.get(&harness.session_path("nope")).await;

    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
    assert!(harness.goose.requests().await.is_empty());
}

#[tokio::test]
async fn test_delete_session_stops_agent() {
    let harness = TestHarness::new().await;
    harness.goose.mock_start_agent(constants::GOOSE_SESSION_ID).await;
    harness.goose.mock_stop_agent().await;

    harness
        .server
        .post(&harness.session_path("to-delete"))
        .await
        .assert_status_ok();

    let response = harness
        .server
        .delete(&harness.session_path("to-delete"))
        .await;

    response.assert_status_ok();
    let stops = harness.goose.requests_to("POST", "/agent/stop").await;
    assert_eq!(stops.len(), 1);
    let stop_body: Value = serde_json::from_slice(&stops[0].body).unwrap();
    assert_eq!(stop_body, json!({"session_id": constants::GOOSE_SESSION_ID}));

    let list: Value = harness.server.get(&harness.sessions_path()).await.json();
    assert_eq!(list, json!([]));
}

#[tokio::test]
async fn test_delete_unknown_session_is_not_found_without_backend_call() {
    let harness = TestHarness::new().await;
    harness.goose.mock_stop_agent().await;

    let response = harness.server.delete(&harness.session_path("ghost")).await;

    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
    assert_eq!(response.json::<Value>()["error"]["code"], "NOT_FOUND");
    assert!(harness.goose.requests_to("POST", "/agent/stop").await.is_empty());
}

#[tokio::test]
async fn test_delete_with_failing_stop_still_unmaps() {
    let harness = TestHarness::new().await;
    harness.goose.mock_start_agent(constants::GOOSE_SESSION_ID).await;
    harness.goose.mock_stop_agent_failure(500).await;

    harness
        .server
        .post(&harness.session_path("flaky"))
        .await
        .assert_status_ok();

    let response = harness.server.delete(&harness.session_path("flaky")).await;

    assert_eq!(response.status_code(), StatusCode::BAD_GATEWAY);
    assert_eq!(harness.state.sessions.lookup("flaky").await, None);
}
