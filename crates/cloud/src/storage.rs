//! Storage provider abstraction.
//!
//! The runner only needs two things from remote storage: a container
//! (bucket) that exists, and signed URLs for objects inside it.

use async_trait::async_trait;
use serde::Deserialize;

use crate::auth::AuthError;

/// Access granted by a signed URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    Read,
    Write,
    ReadWrite,
}

impl AccessMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Write => "write",
            Self::ReadWrite => "readwrite",
        }
    }
}

/// Bucket metadata returned by the storage service.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerDetails {
    pub bucket_key: String,
    #[serde(default)]
    pub policy_key: Option<String>,
}

/// How [`StorageProvider::ensure_container`] satisfied the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContainerStatus {
    /// The container was already there.
    Existing(ContainerDetails),
    /// The container was created by this call.
    Created(ContainerDetails),
}

/// Errors from the storage provider.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Authentication failed: {0}")]
    Auth(#[from] AuthError),

    /// The container appeared between the existence check and creation.
    #[error("Bucket '{bucket}' already exists")]
    Conflict { bucket: String },

    /// The container name contains illegal characters.
    #[error("Bucket name '{bucket}' is invalid")]
    InvalidName { bucket: String },

    /// The container name is owned by someone else.
    #[error("Bucket '{bucket}' is not accessible with these credentials")]
    NameTaken { bucket: String },

    #[error("Invalid storage URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Storage API error ({status}): {body}")]
    Api { status: u16, body: String },
}

impl StorageError {
    /// Conflicts mean the container exists, which is what the caller
    /// wanted in the first place.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }

    /// Configuration errors that retrying will not fix.
    pub fn is_fatal_config(&self) -> bool {
        matches!(self, Self::InvalidName { .. } | Self::NameTaken { .. })
    }
}

/// Remote storage used for staging inputs and collecting outputs.
#[async_trait]
pub trait StorageProvider: Send + Sync {
    /// Make sure the configured container exists.
    ///
    /// Returns [`StorageError::Conflict`] if another writer created it
    /// concurrently; callers treat that as success.
    async fn ensure_container(&self) -> Result<ContainerStatus, StorageError>;

    /// Issue a time-limited URL granting `access` to `object_name`.
    async fn signed_url(&self, object_name: &str, access: AccessMode) -> Result<String, StorageError>;
}
