//! Object storage service (OSS) provider.
//!
//! Manages a single bucket over the OSS REST API:
//!
//! - `GET  {base}/buckets/{bucket}/details` checks for the bucket
//! - `POST {base}/buckets` creates it with a `temporary` retention policy
//! - `POST {base}/buckets/{bucket}/objects/{object}/signed?access=..`
//!   issues a signed URL for one object
//!
//! Bucket and object names are percent-encoded as single path segments.
//! Only the bucket endpoints map `400` / `403` / `409` to bucket name
//! errors; the signing endpoint reports every failure as
//! [`StorageError::Api`].

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;

use crate::auth::Authenticator;
use crate::storage::{AccessMode, ContainerDetails, ContainerStatus, StorageError, StorageProvider};

/// Retention policy applied to buckets created by the runner.
pub const DEFAULT_POLICY_KEY: &str = "temporary";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignedResource {
    signed_url: String,
}

/// [`StorageProvider`] backed by the OSS REST API.
pub struct OssStorage {
    client: reqwest::Client,
    base_url: String,
    bucket_key: String,
    auth: Arc<dyn Authenticator>,
}

impl OssStorage {
    pub fn new(
        client: reqwest::Client,
        base_url: impl Into<String>,
        bucket_key: impl Into<String>,
        auth: Arc<dyn Authenticator>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            bucket_key: bucket_key.into(),
            auth,
        }
    }

    pub fn bucket_key(&self) -> &str {
        &self.bucket_key
    }

    /// `{base}/{segments...}` with every segment percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> Result<reqwest::Url, StorageError> {
        let invalid = |reason: String| StorageError::InvalidUrl {
            url: self.base_url.clone(),
            reason,
        };
        let mut url = reqwest::Url::parse(&self.base_url).map_err(|e| invalid(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|()| invalid("cannot be a base URL".to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn bucket_details(&self, token: &str) -> Result<Option<ContainerDetails>, StorageError> {
        let url = self.endpoint(&["buckets", self.bucket_key.as_str(), "details"])?;
        let response = self.client.get(url).bearer_auth(token).send().await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = self.ensure_bucket_success(response).await?;
        Ok(Some(response.json().await?))
    }

    async fn create_bucket(&self, token: &str) -> Result<ContainerDetails, StorageError> {
        let url = self.endpoint(&["buckets"])?;
        let body = serde_json::json!({
            "bucketKey": self.bucket_key,
            "policyKey": DEFAULT_POLICY_KEY,
        });
        let response = self
            .client
            .post(url)
            .bearer_auth(token)
            .json(&body)
            .send()
            .await?;

        let response = self.ensure_bucket_success(response).await?;
        Ok(response.json().await?)
    }

    /// Map non-2xx responses from the bucket endpoints onto bucket name
    /// errors where the status identifies one.
    async fn ensure_bucket_success(
        &self,
        response: reqwest::Response,
    ) -> Result<reqwest::Response, StorageError> {
        if response.status().is_success() {
            return Ok(response);
        }

        let bucket = self.bucket_key.clone();
        match response.status().as_u16() {
            400 => Err(StorageError::InvalidName { bucket }),
            403 => Err(StorageError::NameTaken { bucket }),
            409 => Err(StorageError::Conflict { bucket }),
            _ => Err(api_error(response).await),
        }
    }
}

async fn api_error(response: reqwest::Response) -> StorageError {
    StorageError::Api {
        status: response.status().as_u16(),
        body: response
            .text()
            .await
            .unwrap_or_else(|_| "<unreadable body>".to_string()),
    }
}

#[async_trait]
impl StorageProvider for OssStorage {
    async fn ensure_container(&self) -> Result<ContainerStatus, StorageError> {
        let token = self.auth.token().await?;

        if let Some(details) = self.bucket_details(token.as_str()).await? {
            tracing::debug!(bucket = %self.bucket_key, "Bucket already exists");
            return Ok(ContainerStatus::Existing(details));
        }

        tracing::info!(bucket = %self.bucket_key, "Creating bucket");
        let details = self.create_bucket(token.as_str()).await?;
        Ok(ContainerStatus::Created(details))
    }

    async fn signed_url(&self, object_name: &str, access: AccessMode) -> Result<String, StorageError> {
        let token = self.auth.token().await?;
        let url = self.endpoint(&["buckets", self.bucket_key.as_str(), "objects", object_name, "signed"])?;
        let response = self
            .client
            .post(url)
            .query(&[("access", access.as_str())])
            .bearer_auth(token.as_str())
            .json(&serde_json::json!({}))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(api_error(response).await);
        }
        let signed: SignedResource = response.json().await?;
        tracing::debug!(object = object_name, access = access.as_str(), "Issued signed URL");
        Ok(signed.signed_url)
    }
}
