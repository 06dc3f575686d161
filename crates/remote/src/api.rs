//! Typed work item endpoints.
//!
//! Wraps [`RemoteClient`] calls in the [`BackoffExecutor`] and decodes
//! the service's JSON responses. Every endpoint here treats `200` as
//! success except [`WorkItemApi::delete`], which accepts `204` or `404`.

use serde::Deserialize;
use workitem_core::status::WorkItemStatus;
use workitem_core::types::Timestamp;

use crate::backoff::{BackoffExecutor, BackoffPolicy};
use crate::client::{classify, into_body, RemoteClient, CREATE_READ_OK, DELETE_OK};
use crate::error::RemoteError;

/// Status document returned by `GET /workitems/{id}`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkItemRecord {
    #[serde(default)]
    pub id: Option<String>,
    pub status: WorkItemStatus,
    /// Location of the remote execution log, once available.
    #[serde(default)]
    pub report_url: Option<String>,
}

/// Response to `POST /workitems`.
#[derive(Debug, Deserialize)]
struct CreatedWorkItem {
    id: String,
}

/// A work item accepted by the remote service.
#[derive(Debug, Clone)]
pub struct SubmittedWorkItem {
    /// Service-assigned work item id.
    pub id: String,
    pub payload: serde_json::Value,
    pub submitted_at: Timestamp,
}

/// Client for the work item service rooted at `base_url`.
#[derive(Clone)]
pub struct WorkItemApi {
    client: RemoteClient,
    base_url: String,
    backoff: BackoffExecutor,
}

impl WorkItemApi {
    pub fn new(client: RemoteClient, base_url: impl Into<String>, policy: BackoffPolicy) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            backoff: BackoffExecutor::new(policy),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Submit a work item. Returns the service-assigned id.
    ///
    /// Retried on failure, so the service may see the payload more than
    /// once.
    pub async fn submit(
        &self,
        token: &str,
        payload: serde_json::Value,
    ) -> Result<SubmittedWorkItem, RemoteError> {
        let url = format!("{}/workitems", self.base_url);
        let result = self
            .backoff
            .execute(
                || self.client.create(&url, token, &payload),
                |r| classify(r, CREATE_READ_OK),
            )
            .await;

        let body = into_body(result, CREATE_READ_OK)?;
        let created: CreatedWorkItem = serde_json::from_str(&body)?;

        tracing::info!(work_item_id = %created.id, "Posted work item");

        Ok(SubmittedWorkItem {
            id: created.id,
            payload,
            submitted_at: chrono::Utc::now(),
        })
    }

    /// Read the current status of a work item.
    pub async fn status(&self, token: &str, work_item_id: &str) -> Result<WorkItemRecord, RemoteError> {
        let url = format!("{}/workitems/{}", self.base_url, work_item_id);
        let result = self
            .backoff
            .execute(
                || self.client.read(&url, token),
                |r| classify(r, CREATE_READ_OK),
            )
            .await;

        let body = into_body(result, CREATE_READ_OK)?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Resolve the owner alias (nickname) the service knows this client
    /// by. The endpoint answers with a bare JSON string.
    pub async fn nickname(&self, token: &str) -> Result<String, RemoteError> {
        let url = format!("{}/forgeapps/me", self.base_url);
        let result = self
            .backoff
            .execute(
                || self.client.read(&url, token),
                |r| classify(r, CREATE_READ_OK),
            )
            .await;

        let body = into_body(result, CREATE_READ_OK)?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Delete a resource under the service root, e.g. `activities/Foo`.
    ///
    /// A `404` counts as success: the resource is already gone.
    pub async fn delete(&self, token: &str, path: &str) -> Result<(), RemoteError> {
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        let result = self
            .backoff
            .execute(
                || self.client.delete(&url, token),
                |r| classify(r, DELETE_OK),
            )
            .await;

        into_body(result, DELETE_OK)?;
        Ok(())
    }
}
