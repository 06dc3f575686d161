use std::fmt;
use std::path::PathBuf;

use workitem_cloud::auth::AuthError;
use workitem_cloud::storage::StorageError;
use workitem_remote::error::RemoteError;
use workitem_transfer::error::QueueError;

/// Exit status for a job whose uploads or downloads failed.
pub const EXIT_TRANSFER_FAILURE: i32 = -1;
/// Exit status for every other job failure.
pub const EXIT_FAILURE: i32 = 1;

/// Invalid or missing runner configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable {0}")]
    Missing(&'static str),

    #[error("Invalid value for {var} ({value:?}): {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

/// Failure inside a job type's capability.
#[derive(Debug, thiserror::Error)]
pub enum CapabilityError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Input file {} not found", path.display())]
    MissingInput { path: PathBuf },

    #[error("Cannot read input file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// One step of the job pipeline, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    InitializeStorage,
    QueueUploads,
    WaitForUploads,
    ExecuteWorkItem,
    QueueDownloads,
    WaitForDownloads,
}

impl Phase {
    /// Every phase, in the order the runner executes them.
    pub const ALL: [Phase; 6] = [
        Phase::InitializeStorage,
        Phase::QueueUploads,
        Phase::WaitForUploads,
        Phase::ExecuteWorkItem,
        Phase::QueueDownloads,
        Phase::WaitForDownloads,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::InitializeStorage => "initialize storage",
            Self::QueueUploads => "queue uploads",
            Self::WaitForUploads => "wait for uploads",
            Self::ExecuteWorkItem => "execute work item",
            Self::QueueDownloads => "queue downloads",
            Self::WaitForDownloads => "wait for downloads",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The originating error of a failed phase.
#[derive(Debug, thiserror::Error)]
pub enum PhaseFailure {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Capability(#[from] CapabilityError),

    #[error(transparent)]
    Remote(#[from] RemoteError),

    #[error(transparent)]
    Transfer(#[from] QueueError),
}

/// A job that stopped at `phase`. Later phases never ran.
#[derive(Debug, thiserror::Error)]
#[error("Phase '{phase}' failed: {source}")]
pub struct RunnerError {
    pub phase: Phase,
    #[source]
    pub source: PhaseFailure,
}

impl RunnerError {
    /// Process exit status for this failure.
    pub fn exit_code(&self) -> i32 {
        match self.source {
            PhaseFailure::Transfer(_) => EXIT_TRANSFER_FAILURE,
            _ => EXIT_FAILURE,
        }
    }

    /// `true` when the remote work item ran and finished unsuccessfully.
    pub fn is_job_failure(&self) -> bool {
        matches!(&self.source, PhaseFailure::Remote(e) if e.is_job_failure())
    }
}
