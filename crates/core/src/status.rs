//! Work item status vocabulary.
//!
//! The remote service owns the full set of status strings, so statuses
//! are kept opaque. Only the two non-terminal values and `success` are
//! recognized; any other value is a terminal failure.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Status constants
// ---------------------------------------------------------------------------

/// Work item is queued on the remote service.
pub const STATUS_PENDING: &str = "pending";
/// Work item is executing.
pub const STATUS_INPROGRESS: &str = "inprogress";
/// Work item finished successfully.
pub const STATUS_SUCCESS: &str = "success";

/// Statuses that keep the poller waiting.
pub const NON_TERMINAL_STATUSES: &[&str] = &[STATUS_PENDING, STATUS_INPROGRESS];

// ---------------------------------------------------------------------------
// WorkItemStatus
// ---------------------------------------------------------------------------

/// Status string reported by the remote service for a work item.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkItemStatus(String);

impl WorkItemStatus {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `true` once the service will no longer change the status.
    pub fn is_terminal(&self) -> bool {
        !NON_TERMINAL_STATUSES.contains(&self.0.as_str())
    }

    /// `true` only for the exact `success` value.
    pub fn is_success(&self) -> bool {
        self.0 == STATUS_SUCCESS
    }
}

impl fmt::Display for WorkItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for WorkItemStatus {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
