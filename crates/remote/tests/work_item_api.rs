//! Integration tests for the work item endpoints against a mock service.

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use assert_matches::assert_matches;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use workitem_remote::error::RemoteError;

#[derive(Clone, Default)]
struct MockState {
    hits: Arc<AtomicUsize>,
    /// Statuses answered by `POST /workitems` before it returns 200.
    failures_before_success: usize,
    received: Arc<Mutex<Vec<(Option<String>, Value)>>>,
}

async fn create_work_item(
    State(state): State<MockState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let n = state.hits.fetch_add(1, Ordering::SeqCst);
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    state.received.lock().unwrap().push((auth, body));

    if n < state.failures_before_success {
        return (StatusCode::SERVICE_UNAVAILABLE, Json(json!({"error": "busy"})));
    }
    (StatusCode::OK, Json(json!({"id": "abc123", "status": "pending"})))
}

async fn me() -> Json<Value> {
    Json(json!("mynickname"))
}

async fn delete_activity(Path(name): Path<String>) -> StatusCode {
    match name.as_str() {
        "gone" => StatusCode::NOT_FOUND,
        "present" => StatusCode::NO_CONTENT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn router(state: MockState) -> Router {
    Router::new()
        .route("/workitems", post(create_work_item))
        .route("/forgeapps/me", get(me))
        .route("/activities/{name}", delete(delete_activity))
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Test: submit returns the service-assigned id
// ---------------------------------------------------------------------------

#[tokio::test]
async fn submit_returns_service_assigned_id() -> anyhow::Result<()> {
    let state = MockState::default();
    let base = common::spawn_mock(router(state.clone())).await?;
    let api = common::test_api(&base);

    let payload = json!({"activityId": "nick.ExportToFBX+prod"});
    let submitted = api.submit("tok-1", payload.clone()).await?;

    assert_eq!(submitted.id, "abc123");
    assert_eq!(submitted.payload, payload);
    assert_eq!(state.hits.load(Ordering::SeqCst), 1);

    let received = state.received.lock().unwrap();
    assert_eq!(received[0].0.as_deref(), Some("Bearer tok-1"));
    assert_eq!(received[0].1, payload);
    Ok(())
}

// ---------------------------------------------------------------------------
// Test: submit is retried until the service accepts it
// ---------------------------------------------------------------------------

#[tokio::test]
async fn submit_retries_transient_failures() -> anyhow::Result<()> {
    let state = MockState {
        failures_before_success: 2,
        ..Default::default()
    };
    let base = common::spawn_mock(router(state.clone())).await?;
    let api = common::test_api(&base);

    let submitted = api.submit("tok", json!({})).await?;

    assert_eq!(submitted.id, "abc123");
    assert_eq!(state.hits.load(Ordering::SeqCst), 3);
    Ok(())
}

// ---------------------------------------------------------------------------
// Test: submit surfaces the last status once retries are exhausted
// ---------------------------------------------------------------------------

#[tokio::test]
async fn submit_gives_up_after_retries() -> anyhow::Result<()> {
    let state = MockState {
        failures_before_success: usize::MAX,
        ..Default::default()
    };
    let base = common::spawn_mock(router(state.clone())).await?;
    let api = common::test_api(&base);

    let result = api.submit("tok", json!({})).await;

    assert_matches!(result, Err(RemoteError::ApiError { status: 503, .. }));
    assert_eq!(
        state.hits.load(Ordering::SeqCst),
        common::TEST_RETRIES as usize + 1
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// Test: nickname is decoded from a bare JSON string
// ---------------------------------------------------------------------------

#[tokio::test]
async fn nickname_is_resolved() -> anyhow::Result<()> {
    let base = common::spawn_mock(router(MockState::default())).await?;
    let api = common::test_api(&base);

    assert_eq!(api.nickname("tok").await?, "mynickname");
    Ok(())
}

// ---------------------------------------------------------------------------
// Test: delete accepts 204 and 404, rejects anything else
// ---------------------------------------------------------------------------

#[tokio::test]
async fn delete_treats_missing_resource_as_success() -> anyhow::Result<()> {
    let base = common::spawn_mock(router(MockState::default())).await?;
    let api = common::test_api(&base);

    api.delete("tok", "activities/present").await?;
    api.delete("tok", "/activities/gone").await?;
    assert_matches!(
        api.delete("tok", "activities/broken").await,
        Err(RemoteError::ApiError { status: 500, .. })
    );
    Ok(())
}
