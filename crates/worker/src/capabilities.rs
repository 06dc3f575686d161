//! Job type capabilities.
//!
//! The [`JobRunner`](crate::runner::JobRunner) owns the pipeline order;
//! a job type only supplies what differs between jobs: how storage is
//! prepared, which files go up, what the work item looks like, and
//! which files come back.

use async_trait::async_trait;
use workitem_transfer::queue::TransferQueue;

use crate::error::CapabilityError;

/// Values resolved by the runner just before submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionContext {
    /// Owner alias used to qualify activity ids.
    pub nickname: String,
}

#[async_trait]
pub trait JobCapabilities: Send + Sync {
    /// Prepare remote storage. Must succeed if it is already prepared.
    async fn initialize_storage(&self, job_id: &str) -> Result<(), CapabilityError>;

    /// Enqueue input uploads. Returns the number of tasks enqueued.
    async fn queue_uploads(&self, job_id: &str, queue: &TransferQueue) -> Result<usize, CapabilityError>;

    /// Build the work item submission body.
    async fn work_item_payload(
        &self,
        job_id: &str,
        context: &SubmissionContext,
    ) -> Result<serde_json::Value, CapabilityError>;

    /// Enqueue output downloads. Returns the number of tasks enqueued.
    async fn queue_downloads(&self, job_id: &str, queue: &TransferQueue) -> Result<usize, CapabilityError>;
}
