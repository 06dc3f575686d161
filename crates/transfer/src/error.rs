use std::path::PathBuf;
use std::sync::Arc;

/// Failure of a single transfer task.
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    /// Reading the upload source or writing the download destination failed.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The HTTP request itself failed (network, DNS, timeout, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The storage endpoint returned a non-2xx status code.
    #[error("Transfer returned HTTP {0}")]
    HttpStatus(u16),
}

/// A settled queue in which at least one task failed.
#[derive(Debug, thiserror::Error)]
#[error("{failed} {queue} task(s) failed, first on {task}: {source}")]
pub struct QueueError {
    /// Name of the queue, e.g. `upload`.
    pub queue: &'static str,
    /// Display form of the first failed task.
    pub task: String,
    /// Number of failed tasks in the settled batch.
    pub failed: usize,
    #[source]
    pub source: Arc<TransferError>,
}
