//! Cloud collaborators of the work item engine.
//!
//! Defines the [`auth::Authenticator`] and [`storage::StorageProvider`]
//! traits the runner depends on, plus HTTP implementations: a two-legged
//! OAuth client-credentials authenticator and an object storage service
//! (OSS) provider that manages one bucket and issues signed URLs.

pub mod auth;
pub mod oss;
pub mod storage;
