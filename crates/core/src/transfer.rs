//! Transfer tasks executed by the transfer queue.

use std::fmt;
use std::path::PathBuf;

/// Direction of a transfer task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferDirection {
    Upload,
    Download,
}

impl TransferDirection {
    pub fn label(self) -> &'static str {
        match self {
            Self::Upload => "upload",
            Self::Download => "download",
        }
    }
}

/// A single file transfer against a signed URL.
///
/// Immutable once enqueued; the queue owns it until execution ends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferTask {
    /// Read `source` fully into memory and PUT it to `url`.
    Upload { url: String, source: PathBuf },
    /// GET `url` and stream the body into `destination`.
    Download { url: String, destination: PathBuf },
}

impl TransferTask {
    pub fn upload(url: impl Into<String>, source: impl Into<PathBuf>) -> Self {
        Self::Upload {
            url: url.into(),
            source: source.into(),
        }
    }

    pub fn download(url: impl Into<String>, destination: impl Into<PathBuf>) -> Self {
        Self::Download {
            url: url.into(),
            destination: destination.into(),
        }
    }

    pub fn direction(&self) -> TransferDirection {
        match self {
            Self::Upload { .. } => TransferDirection::Upload,
            Self::Download { .. } => TransferDirection::Download,
        }
    }

    pub fn url(&self) -> &str {
        match self {
            Self::Upload { url, .. } | Self::Download { url, .. } => url,
        }
    }

    /// The local file this task reads from or writes to.
    pub fn local_path(&self) -> &PathBuf {
        match self {
            Self::Upload { source, .. } => source,
            Self::Download { destination, .. } => destination,
        }
    }
}

impl fmt::Display for TransferTask {
    // Signed URLs carry credentials in the query string, so only the
    // direction and local path are shown.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}",
            self.direction().label(),
            self.local_path().display()
        )
    }
}
