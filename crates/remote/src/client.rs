//! Raw request transport for the remote service.
//!
//! [`RemoteClient`] issues the three verbs the engine needs (create,
//! read, delete) with bearer authentication and hands back the raw
//! outcome. It never retries and never decides what counts as success:
//! that is left to the caller-supplied classifier passed to
//! [`BackoffExecutor`](crate::backoff::BackoffExecutor).

use reqwest::header::CONTENT_TYPE;

use crate::error::RemoteError;

/// Status accepted by create and read endpoints.
pub const CREATE_READ_OK: &[u16] = &[200];
/// Statuses accepted by delete endpoints (deleted, or already gone).
pub const DELETE_OK: &[u16] = &[204, 404];

/// Status code and body text of a completed HTTP exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

/// Outcome of one transport call: a transport error, or whatever the
/// server answered.
pub type TransportResult = Result<RawResponse, reqwest::Error>;

/// Stateless HTTP shim for the remote service.
#[derive(Clone)]
pub struct RemoteClient {
    client: reqwest::Client,
}

impl RemoteClient {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    /// Reuse an existing [`reqwest::Client`] so every component shares
    /// one connection pool.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// `POST url` with a JSON body.
    pub async fn create(&self, url: &str, token: &str, body: &serde_json::Value) -> TransportResult {
        let response = self
            .client
            .post(url)
            .bearer_auth(token)
            .json(body)
            .send()
            .await?;
        Self::into_raw(response).await
    }

    /// `GET url`.
    pub async fn read(&self, url: &str, token: &str) -> TransportResult {
        let response = self
            .client
            .get(url)
            .bearer_auth(token)
            .header(CONTENT_TYPE, "application/json")
            .send()
            .await?;
        Self::into_raw(response).await
    }

    /// `DELETE url`.
    pub async fn delete(&self, url: &str, token: &str) -> TransportResult {
        let response = self
            .client
            .delete(url)
            .bearer_auth(token)
            .header(CONTENT_TYPE, "application/json")
            .send()
            .await?;
        Self::into_raw(response).await
    }

    async fn into_raw(response: reqwest::Response) -> TransportResult {
        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok(RawResponse { status, body })
    }
}

impl Default for RemoteClient {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

/// Describe why `result` is a failure for an endpoint that accepts only
/// `expected` statuses, or `None` if it is a success.
pub fn classify(result: &TransportResult, expected: &[u16]) -> Option<String> {
    match result {
        Err(e) => Some(e.to_string()),
        Ok(raw) if !expected.contains(&raw.status) => Some(format!("status code: {}", raw.status)),
        Ok(_) => None,
    }
}

/// Convert a final transport result into the response body, or the
/// matching [`RemoteError`].
pub fn into_body(result: TransportResult, expected: &[u16]) -> Result<String, RemoteError> {
    let raw = result?;
    if expected.contains(&raw.status) {
        Ok(raw.body)
    } else {
        Err(RemoteError::ApiError {
            status: raw.status,
            body: raw.body,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
