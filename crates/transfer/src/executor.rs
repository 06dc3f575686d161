use async_trait::async_trait;
use workitem_core::transfer::TransferTask;

use crate::error::TransferError;

/// Performs one transfer task to completion.
///
/// The queue owns admission and ordering; implementations only move
/// bytes. Retrying is not the executor's job either: a failure here is
/// final for the task.
#[async_trait]
pub trait TransferExecutor: Send + Sync {
    async fn execute(&self, task: &TransferTask) -> Result<(), TransferError>;
}
