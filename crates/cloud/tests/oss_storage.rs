//! Integration tests for the OSS provider and the two-legged
//! authenticator against a mock storage service.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use assert_matches::assert_matches;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use serde_json::{json, Value};
use workitem_cloud::auth::{AuthError, Authenticator, TwoLeggedAuthenticator};
use workitem_cloud::oss::OssStorage;
use workitem_cloud::storage::{AccessMode, ContainerStatus, StorageError, StorageProvider};

#[derive(Clone)]
struct MockOss {
    /// Status for `GET details`; 200 answers with bucket details.
    details_status: u16,
    /// Status for `POST buckets`; 200 answers with bucket details.
    create_status: u16,
    token_status: u16,
    token_hits: Arc<AtomicUsize>,
    create_hits: Arc<AtomicUsize>,
}

impl MockOss {
    fn new(details_status: u16, create_status: u16) -> Self {
        Self {
            details_status,
            create_status,
            token_status: 200,
            token_hits: Arc::new(AtomicUsize::new(0)),
            create_hits: Arc::new(AtomicUsize::new(0)),
        }
    }
}

fn status(code: u16) -> StatusCode {
    StatusCode::from_u16(code).unwrap()
}

async fn token(
    State(mock): State<MockOss>,
    headers: HeaderMap,
    Form(form): Form<HashMap<String, String>>,
) -> (StatusCode, Json<Value>) {
    mock.token_hits.fetch_add(1, Ordering::SeqCst);
    assert!(headers.contains_key("authorization"), "basic auth expected");
    assert_eq!(form.get("grant_type").map(String::as_str), Some("client_credentials"));
    if mock.token_status != 200 {
        return (status(mock.token_status), Json(json!({"error": "invalid_client"})));
    }
    (
        StatusCode::OK,
        Json(json!({"access_token": "tok-xyz", "token_type": "Bearer", "expires_in": 3599})),
    )
}

async fn details(State(mock): State<MockOss>, Path(bucket): Path<String>) -> (StatusCode, Json<Value>) {
    (
        status(mock.details_status),
        Json(json!({"bucketKey": bucket, "policyKey": "temporary"})),
    )
}

async fn create(State(mock): State<MockOss>, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    mock.create_hits.fetch_add(1, Ordering::SeqCst);
    assert_eq!(body["policyKey"], "temporary");
    (status(mock.create_status), Json(body))
}

async fn signed(
    Path((bucket, object)): Path<(String, String)>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Result<Json<Value>, StatusCode> {
    if object == "unsignable" {
        return Err(StatusCode::FORBIDDEN);
    }
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    Ok(Json(json!({
        "signedUrl": format!(
            "https://signed.example/{bucket}/{object}?access={}&auth={}",
            query.get("access").cloned().unwrap_or_default(),
            auth.replace(' ', "_"),
        )
    })))
}

async fn spawn_oss(mock: MockOss) -> anyhow::Result<(OssStorage, MockOss)> {
    let app = Router::new()
        .route("/token", post(token))
        .route("/buckets", post(create))
        .route("/buckets/{bucket}/details", get(details))
        .route("/buckets/{bucket}/objects/{object}/signed", post(signed))
        .with_state(mock.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    let base = format!("http://{addr}");
    let client = reqwest::Client::new();
    let auth = Arc::new(TwoLeggedAuthenticator::new(
        client.clone(),
        format!("{base}/token"),
        "client-id",
        "client-secret",
    ));
    Ok((OssStorage::new(client, base, "jobs-bucket", auth), mock))
}

// ---------------------------------------------------------------------------
// Test: an existing bucket is reported as such, every time
// ---------------------------------------------------------------------------

#[tokio::test]
async fn existing_bucket_is_idempotent() -> anyhow::Result<()> {
    let (storage, mock) = spawn_oss(MockOss::new(200, 500)).await?;

    for _ in 0..3 {
        let status = storage.ensure_container().await?;
        assert_matches!(status, ContainerStatus::Existing(ref d) if d.bucket_key == "jobs-bucket");
    }
    assert_eq!(mock.create_hits.load(Ordering::SeqCst), 0);
    assert_eq!(mock.token_hits.load(Ordering::SeqCst), 1, "token is cached");
    Ok(())
}

// ---------------------------------------------------------------------------
// Test: a missing bucket is created
// ---------------------------------------------------------------------------

#[tokio::test]
async fn missing_bucket_is_created() -> anyhow::Result<()> {
    let (storage, mock) = spawn_oss(MockOss::new(404, 200)).await?;

    let status = storage.ensure_container().await?;

    assert_matches!(status, ContainerStatus::Created(ref d) if d.bucket_key == "jobs-bucket");
    assert_eq!(mock.create_hits.load(Ordering::SeqCst), 1);
    Ok(())
}

// ---------------------------------------------------------------------------
// Test: create-time classification of 409 / 400 / 403
// ---------------------------------------------------------------------------

#[tokio::test]
async fn concurrent_creation_is_a_conflict() -> anyhow::Result<()> {
    let (storage, _mock) = spawn_oss(MockOss::new(404, 409)).await?;

    let err = storage.ensure_container().await.unwrap_err();

    assert!(err.is_conflict());
    Ok(())
}

#[tokio::test]
async fn illegal_name_is_invalid() -> anyhow::Result<()> {
    let (storage, _mock) = spawn_oss(MockOss::new(404, 400)).await?;

    let err = storage.ensure_container().await.unwrap_err();

    assert_matches!(err, StorageError::InvalidName { ref bucket } if bucket == "jobs-bucket");
    assert!(err.is_fatal_config());
    Ok(())
}

#[tokio::test]
async fn foreign_bucket_is_name_taken() -> anyhow::Result<()> {
    let (storage, _mock) = spawn_oss(MockOss::new(403, 200)).await?;

    let err = storage.ensure_container().await.unwrap_err();

    assert_matches!(err, StorageError::NameTaken { .. });
    Ok(())
}

#[tokio::test]
async fn unexpected_status_is_api_error() -> anyhow::Result<()> {
    let (storage, _mock) = spawn_oss(MockOss::new(502, 200)).await?;

    let err = storage.ensure_container().await.unwrap_err();

    assert_matches!(err, StorageError::Api { status: 502, .. });
    Ok(())
}

// ---------------------------------------------------------------------------
// Test: signed URLs carry the access mode and are requested with the token
// ---------------------------------------------------------------------------

#[tokio::test]
async fn signed_url_requests_access_mode() -> anyhow::Result<()> {
    let (storage, _mock) = spawn_oss(MockOss::new(200, 200)).await?;

    let read = storage.signed_url("output-abc123", AccessMode::Read).await?;
    let write = storage.signed_url("input-abc123", AccessMode::Write).await?;

    assert_eq!(
        read,
        "https://signed.example/jobs-bucket/output-abc123?access=read&auth=Bearer_tok-xyz"
    );
    assert!(write.contains("input-abc123?access=write"));
    Ok(())
}

#[tokio::test]
async fn reserved_characters_stay_in_the_object_name() -> anyhow::Result<()> {
    let (storage, _mock) = spawn_oss(MockOss::new(200, 200)).await?;

    let hash = storage.signed_url("input-run#1", AccessMode::Write).await?;
    let query = storage.signed_url("output-a?b c/d", AccessMode::Read).await?;

    assert!(hash.starts_with("https://signed.example/jobs-bucket/input-run#1?access=write"));
    assert!(query.starts_with("https://signed.example/jobs-bucket/output-a?b c/d?access=read"));
    Ok(())
}

#[tokio::test]
async fn signing_rejection_is_not_a_bucket_name_error() -> anyhow::Result<()> {
    let (storage, _mock) = spawn_oss(MockOss::new(200, 200)).await?;

    let err = storage
        .signed_url("unsignable", AccessMode::Read)
        .await
        .unwrap_err();

    assert_matches!(err, StorageError::Api { status: 403, .. });
    assert!(!err.is_fatal_config());
    Ok(())
}

// ---------------------------------------------------------------------------
// Test: rejected credentials surface as an auth error
// ---------------------------------------------------------------------------

#[tokio::test]
async fn rejected_credentials_fail_storage_calls() -> anyhow::Result<()> {
    let mut mock = MockOss::new(200, 200);
    mock.token_status = 401;
    let (storage, _mock) = spawn_oss(mock).await?;

    let err = storage.ensure_container().await.unwrap_err();

    assert_matches!(err, StorageError::Auth(AuthError::Rejected { status: 401, .. }));
    Ok(())
}

#[tokio::test]
async fn unreachable_token_endpoint_is_a_transport_error() {
    let auth = TwoLeggedAuthenticator::new(
        reqwest::Client::new(),
        "http://127.0.0.1:1/token",
        "id",
        "secret",
    );

    assert_matches!(auth.token().await, Err(AuthError::Request(_)));
}

#[tokio::test]
async fn token_is_fetched_once_and_reused() -> anyhow::Result<()> {
    let (storage, mock) = spawn_oss(MockOss::new(200, 200)).await?;

    storage.ensure_container().await?;
    storage.signed_url("input-1", AccessMode::Write).await?;
    storage.signed_url("output-1", AccessMode::Read).await?;

    assert_eq!(mock.token_hits.load(Ordering::SeqCst), 1);
    Ok(())
}
