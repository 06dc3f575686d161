//! Work item status polling.
//!
//! [`JobStatusPoller`] waits `interval`, reads the work item status, and
//! repeats while the status is `pending` or `inprogress`. The first
//! other status ends the loop: `success` resolves `Ok`, anything else
//! resolves [`RemoteError::JobFailed`]. A status read that still fails
//! after its retries ends polling at once with that error.
//!
//! There is no timeout: a work item that never leaves `pending` is
//! polled indefinitely.

use std::time::{Duration, Instant};

use workitem_core::status::WorkItemStatus;

use crate::api::{WorkItemApi, WorkItemRecord};
use crate::error::RemoteError;

/// Position of a work item in the polling state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollState {
    /// Accepted by the service, not yet observed.
    Submitted,
    /// Last observed `pending` or `inprogress`.
    Waiting(WorkItemStatus),
    /// Observed `success`.
    Succeeded,
    /// Observed any other terminal status.
    Failed(WorkItemStatus),
}

impl PollState {
    /// State after observing `status`.
    pub fn observe(status: &WorkItemStatus) -> Self {
        if !status.is_terminal() {
            Self::Waiting(status.clone())
        } else if status.is_success() {
            Self::Succeeded
        } else {
            Self::Failed(status.clone())
        }
    }
}

/// A work item that reached `success`.
#[derive(Debug, Clone)]
pub struct CompletedWorkItem {
    pub record: WorkItemRecord,
    /// Status reads issued, including the final one.
    pub polls: u32,
    pub elapsed: Duration,
}

/// Drives a submitted work item to a terminal status.
#[derive(Debug, Clone)]
pub struct JobStatusPoller {
    interval: Duration,
}

impl JobStatusPoller {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Poll until the work item reaches a terminal status.
    pub async fn wait_for_completion(
        &self,
        api: &WorkItemApi,
        token: &str,
        work_item_id: &str,
    ) -> Result<CompletedWorkItem, RemoteError> {
        let started = Instant::now();
        let mut state = PollState::Submitted;
        let mut polls = 0u32;

        loop {
            tokio::time::sleep(self.interval).await;

            let record = match api.status(token, work_item_id).await {
                Ok(record) => record,
                Err(e) => {
                    tracing::error!(work_item_id, error = %e, "Failed to read work item status");
                    return Err(e);
                }
            };
            polls += 1;

            let elapsed = started.elapsed();
            tracing::info!(
                work_item_id,
                status = %record.status,
                elapsed_ms = elapsed.as_millis() as u64,
                "Checking status",
            );
            if let Some(report_url) = &record.report_url {
                tracing::info!(work_item_id, report_url = %report_url, "Log file available");
            }

            let next = PollState::observe(&record.status);
            if next != state {
                tracing::debug!(work_item_id, from = ?state, to = ?next, "Work item state changed");
            }
            state = next;

            match state {
                PollState::Succeeded => {
                    return Ok(CompletedWorkItem {
                        record,
                        polls,
                        elapsed,
                    });
                }
                PollState::Failed(status) => {
                    return Err(RemoteError::JobFailed {
                        status,
                        report_url: record.report_url,
                    });
                }
                PollState::Submitted | PollState::Waiting(_) => {}
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_terminal_statuses_keep_waiting() {
        let state = PollState::observe(&WorkItemStatus::from("pending"));
        assert_eq!(state, PollState::Waiting(WorkItemStatus::from("pending")));

        let state = PollState::observe(&WorkItemStatus::from("inprogress"));
    }

    #[test]
    fn success_is_succeeded() {
        assert_eq!(
            PollState::observe(&WorkItemStatus::from("success")),
            PollState::Succeeded
        );
    }

    #[test]
    fn any_other_status_is_failed() {
        for raw in ["failed", "cancelled", "somethingNew"] {
            let state = PollState::observe(&WorkItemStatus::from(raw));
            assert_eq!(state, PollState::Failed(WorkItemStatus::from(raw)));
        }
    }
}
