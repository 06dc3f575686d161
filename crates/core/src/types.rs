/// Locally generated identifier for one job run.
///
/// Distinct from the work item id the remote service assigns at
/// submission time.
pub type JobId = String;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Use the caller-supplied job id, or generate a fresh UUID v4.
pub fn resolve_job_id(forced: Option<&str>) -> JobId {
    match forced.map(str::trim) {
        Some(id) if !id.is_empty() => id.to_string(),
        _ => uuid::Uuid::new_v4().to_string(),
    }
}
