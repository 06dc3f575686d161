//! Export job type: convert one input file and fetch the result.
//!
//! Storage layout per job:
//!
//! - `input-{job_id}`: the uploaded input file
//! - `output-{job_id}`: written by the work item, downloaded to
//!   `{results_dir}/{job_id}.fbx`

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use workitem_cloud::storage::{AccessMode, ContainerStatus, StorageError, StorageProvider};
use workitem_core::naming::{input_object_name, output_object_name, result_path};
use workitem_core::transfer::TransferTask;
use workitem_transfer::queue::TransferQueue;

use crate::capabilities::{JobCapabilities, SubmissionContext};
use crate::config::RunnerConfig;
use crate::error::CapabilityError;
use crate::template::{qualified_activity_id, work_item_payload, WorkItemOptions};

pub struct ExportJob {
    storage: Arc<dyn StorageProvider>,
    input_file: PathBuf,
    results_dir: PathBuf,
    activity_id: String,
    activity_alias: String,
}

impl ExportJob {
    pub fn new(
        storage: Arc<dyn StorageProvider>,
        input_file: impl Into<PathBuf>,
        results_dir: impl Into<PathBuf>,
        activity_id: impl Into<String>,
        activity_alias: impl Into<String>,
    ) -> Self {
        Self {
            storage,
            input_file: input_file.into(),
            results_dir: results_dir.into(),
            activity_id: activity_id.into(),
            activity_alias: activity_alias.into(),
        }
    }

    /// Export `input_file` using the activity and results directory from
    /// `config`.
    pub fn from_config(
        storage: Arc<dyn StorageProvider>,
        input_file: impl Into<PathBuf>,
        config: &RunnerConfig,
    ) -> Self {
        Self::new(
            storage,
            input_file,
            &config.results_dir,
            &config.activity_id,
            &config.activity_alias,
        )
    }

    pub fn input_file(&self) -> &Path {
        &self.input_file
    }

    /// Where the result of `job_id` is written.
    pub fn result_path(&self, job_id: &str) -> PathBuf {
        result_path(&self.results_dir, job_id)
    }
}

#[async_trait]
impl JobCapabilities for ExportJob {
    async fn initialize_storage(&self, job_id: &str) -> Result<(), CapabilityError> {
        match self.storage.ensure_container().await {
            Ok(ContainerStatus::Existing(details)) => {
                tracing::debug!(job_id, bucket = %details.bucket_key, "Using existing bucket");
                Ok(())
            }
            Ok(ContainerStatus::Created(details)) => {
                tracing::info!(job_id, bucket = %details.bucket_key, "Bucket created");
                Ok(())
            }
            Err(e) if e.is_conflict() => {
                tracing::info!(job_id, error = %e, "Bucket created concurrently, continuing");
                Ok(())
            }
            Err(e) if e.is_fatal_config() => {
                let guidance = match &e {
                    StorageError::InvalidName { .. } => {
                        "Use 3 to 128 characters from [-_.a-z0-9] in OSS_BUCKET_NAME"
                    }
                    _ => "Choose a different OSS_BUCKET_NAME",
                };
                tracing::error!(job_id, error = %e, "{guidance}");
                Err(e.into())
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn queue_uploads(&self, job_id: &str, queue: &TransferQueue) -> Result<usize, CapabilityError> {
        if let Err(e) = tokio::fs::metadata(&self.input_file).await {
            let path = self.input_file.clone();
            return Err(match e.kind() {
                std::io::ErrorKind::NotFound => CapabilityError::MissingInput { path },
                _ => CapabilityError::Io { path, source: e },
            });
        }

        let url = self
            .storage
            .signed_url(&input_object_name(job_id), AccessMode::Write)
            .await?;
        queue.enqueue(vec![TransferTask::upload(url, &self.input_file)]);
        tracing::info!(job_id, input = %self.input_file.display(), "Uploading input");
        Ok(1)
    }

    async fn work_item_payload(
        &self,
        job_id: &str,
        context: &SubmissionContext,
    ) -> Result<serde_json::Value, CapabilityError> {
        let input_url = self
            .storage
            .signed_url(&input_object_name(job_id), AccessMode::Read)
            .await?;
        let output_url = self
            .storage
            .signed_url(&output_object_name(job_id), AccessMode::Write)
            .await?;

        Ok(work_item_payload(&WorkItemOptions {
            activity_id: qualified_activity_id(&context.nickname, &self.activity_id, &self.activity_alias),
            input_url,
            output_url,
        }))
    }

    async fn queue_downloads(&self, job_id: &str, queue: &TransferQueue) -> Result<usize, CapabilityError> {
        let url = self
            .storage
            .signed_url(&output_object_name(job_id), AccessMode::Read)
            .await?;
        let destination = self.result_path(job_id);
        tracing::info!(job_id, destination = %destination.display(), "Downloading output");
        queue.enqueue(vec![TransferTask::download(url, destination)]);
        Ok(1)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
