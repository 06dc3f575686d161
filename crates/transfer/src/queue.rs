//! Bounded-concurrency transfer queue.
//!
//! Tasks start in FIFO order as worker slots free up; at most `limit`
//! run at once. Completion order is not guaranteed. The queue moves
//! through an explicit state machine:
//!
//! ```text
//! Idle --enqueue--> Running --last task done--> Drained --enqueue--> Running ...
//!                      |
//!                      +--task failed--> Failed --in-flight done--> Drained
//! ```
//!
//! [`TransferQueue::settled`] resolves whenever the queue is not
//! `Running`, so it gives the same answer whether it is awaited before
//! the first worker starts or after the last one has finished. An
//! empty batch drains immediately.
//!
//! The first failed task fails the batch at once: `settled` resolves
//! with the error, pending tasks are dropped without starting, and
//! tasks already in flight run to completion before the queue drains.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::watch;
use workitem_core::transfer::TransferTask;

use crate::error::{QueueError, TransferError};
use crate::executor::TransferExecutor;

/// Default number of concurrent transfer workers per queue.
pub const DEFAULT_CONCURRENCY: usize = 7;

/// Called once per failed task, at the moment it fails.
pub type ErrorHandler = Box<dyn Fn(&TransferTask, &TransferError) + Send + Sync>;

/// Lifecycle state of a [`TransferQueue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueState {
    /// Nothing has been enqueued yet.
    Idle,
    /// Tasks are pending or in flight.
    Running,
    /// A task failed; in-flight tasks are finishing, nothing new starts.
    Failed,
    /// Every enqueued task has finished.
    Drained,
}

/// Outcome counts for a settled queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct QueueReport {
    pub completed: usize,
    pub failed: usize,
    /// Pending tasks dropped after the batch failed.
    pub skipped: usize,
}

/// FIFO queue of transfer tasks executed by a bounded worker pool.
///
/// Cloning is cheap and every clone drives the same queue.
#[derive(Clone)]
pub struct TransferQueue {
    inner: Arc<Inner>,
}

struct Inner {
    name: &'static str,
    limit: usize,
    executor: Arc<dyn TransferExecutor>,
    on_error: Option<ErrorHandler>,
    state_tx: watch::Sender<QueueState>,
    shared: Mutex<Shared>,
}

#[derive(Default)]
struct Shared {
    pending: VecDeque<TransferTask>,
    active: usize,
    report: QueueReport,
    first_failure: Option<(String, Arc<TransferError>)>,
    drain_count: usize,
}

impl TransferQueue {
    /// Create a queue named `name` (used in logs and errors) running at
    /// most `limit` tasks at once. A limit of zero is treated as one.
    pub fn new(name: &'static str, limit: usize, executor: Arc<dyn TransferExecutor>) -> Self {
        Self::build(name, limit, executor, None)
    }

    /// Like [`new`](Self::new), invoking `handler` for every failed task.
    pub fn with_error_handler<H>(
        name: &'static str,
        limit: usize,
        executor: Arc<dyn TransferExecutor>,
        handler: H,
    ) -> Self
    where
        H: Fn(&TransferTask, &TransferError) + Send + Sync + 'static,
    {
        Self::build(name, limit, executor, Some(Box::new(handler)))
    }

    fn build(
        name: &'static str,
        limit: usize,
        executor: Arc<dyn TransferExecutor>,
        on_error: Option<ErrorHandler>,
    ) -> Self {
        let (state_tx, _) = watch::channel(QueueState::Idle);
        Self {
            inner: Arc::new(Inner {
                name,
                limit: limit.max(1),
                executor,
                on_error,
                state_tx,
                shared: Mutex::new(Shared::default()),
            }),
        }
    }

    pub fn name(&self) -> &'static str {
        self.inner.name
    }

    pub fn limit(&self) -> usize {
        self.inner.limit
    }

    pub fn state(&self) -> QueueState {
        *self.inner.state_tx.borrow()
    }

    /// Tasks waiting for a worker.
    pub fn pending(&self) -> usize {
        self.inner.lock().pending.len()
    }

    /// Tasks currently executing.
    pub fn running(&self) -> usize {
        self.inner.lock().active
    }

    /// How many times the queue has transitioned to `Drained`.
    pub fn drain_count(&self) -> usize {
        self.inner.lock().drain_count
    }

    /// Append `tasks` and start as many as free worker slots allow.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn enqueue(&self, tasks: Vec<TransferTask>) {
        let to_start = {
            let mut shared = self.inner.lock();
            if shared.first_failure.is_some() && shared.active > 0 {
                tracing::warn!(
                    queue = self.inner.name,
                    count = tasks.len(),
                    "Failed batch still finishing, dropping new transfers",
                );
                shared.report.skipped += tasks.len();
                return;
            }
            if shared.pending.is_empty() && shared.active == 0 {
                // New batch: forget the previous batch's outcome.
                shared.report = QueueReport::default();
                shared.first_failure = None;
            }

            tracing::debug!(queue = self.inner.name, count = tasks.len(), "Enqueueing transfers");
            shared.pending.extend(tasks);

            if shared.pending.is_empty() && shared.active == 0 {
                self.inner.mark_drained(&mut shared);
                return;
            }

            self.inner.state_tx.send_replace(QueueState::Running);
            self.inner.admit(&mut shared)
        };

        for task in to_start {
            Inner::spawn_worker(Arc::clone(&self.inner), task);
        }
    }

    /// Wait until no task is pending or running, or until a task fails,
    /// then report the batch.
    ///
    /// Resolves immediately for a queue that is `Idle`, `Failed` or
    /// already `Drained`. Returns [`QueueError`] as soon as any task in
    /// the batch has failed.
    pub async fn settled(&self) -> Result<QueueReport, QueueError> {
        let mut rx = self.inner.state_tx.subscribe();
        // The sender lives as long as `self`, so the channel cannot close.
        let _ = rx.wait_for(|state| *state != QueueState::Running).await;

        let shared = self.inner.lock();
        match &shared.first_failure {
            None => Ok(shared.report),
            Some((task, source)) => Err(QueueError {
                queue: self.inner.name,
                task: task.clone(),
                failed: shared.report.failed,
                source: Arc::clone(source),
            }),
        }
    }
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, Shared> {
        // Workers never panic while holding the lock, so a poisoned
        // mutex still holds consistent counters.
        self.shared.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Pop tasks in FIFO order while worker slots are free.
    fn admit(&self, shared: &mut Shared) -> Vec<TransferTask> {
        let mut started = Vec::new();
        while shared.active < self.limit {
            let Some(task) = shared.pending.pop_front() else {
                break;
            };
            shared.active += 1;
            started.push(task);
        }
        started
    }

    fn mark_drained(&self, shared: &mut Shared) {
        shared.drain_count += 1;
        tracing::debug!(
            queue = self.name,
            completed = shared.report.completed,
            failed = shared.report.failed,
            "Transfer queue drained",
        );
        self.state_tx.send_replace(QueueState::Drained);
    }

    /// Drop pending tasks and wake `settled` waiters with the failure.
    fn fail_batch(&self, shared: &mut Shared) {
        let skipped = shared.pending.len();
        shared.pending.clear();
        shared.report.skipped += skipped;
        tracing::warn!(
            queue = self.name,
            skipped,
            in_flight = shared.active,
            "Transfer batch failed",
        );
        self.state_tx.send_replace(QueueState::Failed);
    }

    fn spawn_worker(inner: Arc<Inner>, task: TransferTask) {
        tokio::spawn(async move {
            tracing::debug!(queue = inner.name, task = %task, "Transfer started");
            let result = inner.executor.execute(&task).await;
            inner.finish(task, result);
        });
    }

    fn finish(self: Arc<Self>, task: TransferTask, result: Result<(), TransferError>) {
        let failure = match result {
            Ok(()) => None,
            Err(e) => {
                tracing::error!(queue = self.name, task = %task, error = %e, "Transfer failed");
                if let Some(handler) = &self.on_error {
                    handler(&task, &e);
                }
                Some(Arc::new(e))
            }
        };

        let to_start = {
            let mut shared = self.lock();
            shared.active -= 1;
            match failure {
                None => shared.report.completed += 1,
                Some(error) => {
                    shared.report.failed += 1;
                    if shared.first_failure.is_none() {
                        shared.first_failure = Some((task.to_string(), error));
                        self.fail_batch(&mut shared);
                    }
                }
            }

            let next = if shared.first_failure.is_some() {
                Vec::new()
            } else {
                self.admit(&mut shared)
            };
            if shared.pending.is_empty() && shared.active == 0 {
                self.mark_drained(&mut shared);
            }
            next
        };

        for next in to_start {
            Inner::spawn_worker(Arc::clone(&self), next);
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
