//! Job runner: drives one job through the fixed phase pipeline.
//!
//! ```text
//! InitializeStorage -> QueueUploads -> WaitForUploads
//!   -> ExecuteWorkItem -> QueueDownloads -> WaitForDownloads
//! ```
//!
//! Each phase starts only after the previous one succeeded. The first
//! failure stops the pipeline and is returned as a [`RunnerError`]
//! tagged with its phase. Nothing already done is rolled back.

use std::sync::Arc;
use std::time::{Duration, Instant};

use workitem_cloud::auth::Authenticator;
use workitem_core::status::WorkItemStatus;
use workitem_core::types::JobId;
use workitem_remote::api::WorkItemApi;
use workitem_remote::backoff::BackoffPolicy;
use workitem_remote::client::RemoteClient;
use workitem_remote::poller::JobStatusPoller;
use workitem_transfer::executor::TransferExecutor;
use workitem_transfer::http::HttpTransfer;
use workitem_transfer::queue::{QueueReport, TransferQueue};

use crate::capabilities::{JobCapabilities, SubmissionContext};
use crate::config::RunnerConfig;
use crate::error::{Phase, PhaseFailure, RunnerError};

/// Summary of a job that completed every phase.
#[derive(Debug, Clone, Default)]
pub struct JobReport {
    pub job_id: JobId,
    pub work_item_id: Option<String>,
    pub final_status: Option<WorkItemStatus>,
    pub report_url: Option<String>,
    pub polls: u32,
    pub uploads: QueueReport,
    pub downloads: QueueReport,
    pub elapsed: Duration,
}

pub struct JobRunner {
    api: WorkItemApi,
    poller: JobStatusPoller,
    auth: Arc<dyn Authenticator>,
    capabilities: Arc<dyn JobCapabilities>,
    uploads: TransferQueue,
    downloads: TransferQueue,
    nickname: Option<String>,
}

impl JobRunner {
    pub fn new(
        api: WorkItemApi,
        poller: JobStatusPoller,
        auth: Arc<dyn Authenticator>,
        capabilities: Arc<dyn JobCapabilities>,
        transfers: Arc<dyn TransferExecutor>,
        concurrency: usize,
    ) -> Self {
        let uploads = TransferQueue::with_error_handler(
            "upload",
            concurrency,
            Arc::clone(&transfers),
            |task, error| tracing::error!(task = %task, error = %error, "Error uploading input"),
        );
        let downloads = TransferQueue::with_error_handler(
            "download",
            concurrency,
            transfers,
            |task, error| tracing::error!(task = %task, error = %error, "Error downloading output"),
        );

        Self {
            api,
            poller,
            auth,
            capabilities,
            uploads,
            downloads,
            nickname: None,
        }
    }

    /// Wire a runner from `config`, sharing `client` between the work
    /// item API and the transfer queues.
    pub fn from_config(
        config: &RunnerConfig,
        client: reqwest::Client,
        auth: Arc<dyn Authenticator>,
        capabilities: Arc<dyn JobCapabilities>,
    ) -> Self {
        let api = WorkItemApi::new(
            RemoteClient::with_client(client.clone()),
            &config.design_automation_url,
            BackoffPolicy::default(),
        );
        let runner = Self::new(
            api,
            JobStatusPoller::new(config.poll_interval),
            auth,
            capabilities,
            Arc::new(HttpTransfer::with_client(client)),
            config.transfer_concurrency,
        );
        match &config.nickname {
            Some(nickname) => runner.with_nickname(nickname),
            None => runner,
        }
    }

    /// Use `nickname` instead of resolving it from the service.
    pub fn with_nickname(mut self, nickname: impl Into<String>) -> Self {
        self.nickname = Some(nickname.into());
        self
    }

    /// Run every phase for `job_id`, stopping at the first failure.
    pub async fn run(&self, job_id: JobId) -> Result<JobReport, RunnerError> {
        let started = Instant::now();
        let mut report = JobReport {
            job_id,
            ..JobReport::default()
        };
        tracing::info!(job_id = %report.job_id, "Starting job");

        for phase in Phase::ALL {
            tracing::debug!(job_id = %report.job_id, phase = %phase, "Entering phase");
            if let Err(source) = self.step(phase, &mut report).await {
                tracing::error!(
                    job_id = %report.job_id,
                    phase = %phase,
                    error = %source,
                    "Job stopped because of error",
                );
                return Err(RunnerError { phase, source });
            }
        }

        report.elapsed = started.elapsed();
        tracing::info!(
            job_id = %report.job_id,
            elapsed_ms = report.elapsed.as_millis() as u64,
            "Job finished",
        );
        Ok(report)
    }

    async fn step(&self, phase: Phase, report: &mut JobReport) -> Result<(), PhaseFailure> {
        let job_id = report.job_id.as_str();
        match phase {
            Phase::InitializeStorage => {
                self.capabilities.initialize_storage(job_id).await?;
            }
            Phase::QueueUploads => {
                let queued = self.capabilities.queue_uploads(job_id, &self.uploads).await?;
                if queued == 0 {
                    // Nothing to wait for; settle the queue for this run.
                    self.uploads.enqueue(Vec::new());
                }
            }
            Phase::WaitForUploads => {
                report.uploads = self.uploads.settled().await?;
                tracing::info!(job_id, completed = report.uploads.completed, "Uploads complete");
            }
            Phase::ExecuteWorkItem => self.execute_work_item(report).await?,
            Phase::QueueDownloads => {
                let queued = self.capabilities.queue_downloads(job_id, &self.downloads).await?;
                if queued == 0 {
                    self.downloads.enqueue(Vec::new());
                }
            }
            Phase::WaitForDownloads => {
                report.downloads = self.downloads.settled().await?;
                tracing::info!(job_id, completed = report.downloads.completed, "Downloads complete");
            }
        }
        Ok(())
    }

    /// Resolve the submission context, submit, and poll to completion.
    async fn execute_work_item(&self, report: &mut JobReport) -> Result<(), PhaseFailure> {
        let token = self.auth.token().await?;
        let context = SubmissionContext {
            nickname: self.resolve_nickname(token.as_str()).await?,
        };

        let payload = self
            .capabilities
            .work_item_payload(&report.job_id, &context)
            .await?;
        let submitted = self.api.submit(token.as_str(), payload).await?;
        tracing::info!(
            job_id = %report.job_id,
            work_item_id = %submitted.id,
            "Work item submitted",
        );
        report.work_item_id = Some(submitted.id.clone());

        let completed = self
            .poller
            .wait_for_completion(&self.api, token.as_str(), &submitted.id)
            .await?;
        report.polls = completed.polls;
        report.final_status = Some(completed.record.status);
        report.report_url = completed.record.report_url;
        Ok(())
    }

    async fn resolve_nickname(&self, token: &str) -> Result<String, PhaseFailure> {
        if let Some(nickname) = &self.nickname {
            return Ok(nickname.clone());
        }
        let nickname = self.api.nickname(token).await?;
        tracing::debug!(nickname = %nickname, "Resolved owner nickname");
        Ok(nickname)
    }
}
