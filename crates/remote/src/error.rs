use workitem_core::status::WorkItemStatus;

/// Errors from the remote work item service layer.
#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The service answered with a status the endpoint does not accept.
    #[error("Remote API error ({status}): {body}")]
    ApiError {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },

    /// A success response carried a body that could not be decoded.
    #[error("Malformed response body: {0}")]
    Decode(#[from] serde_json::Error),

    /// The work item reached a terminal status other than `success`.
    #[error("Work item finished with status: {status}")]
    JobFailed {
        status: WorkItemStatus,
        report_url: Option<String>,
    },
}

impl RemoteError {
    /// `true` when the remote job itself failed, as opposed to the
    /// service being unreachable or misbehaving.
    pub fn is_job_failure(&self) -> bool {
        matches!(self, Self::JobFailed { .. })
    }
}
