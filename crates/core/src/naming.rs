//! Storage object and result file naming conventions.
//!
//! Every job stages its input under `input-{job_id}` and the remote
//! work item writes its output to `output-{job_id}`, so one bucket can
//! hold many runs without collisions.

use std::path::{Path, PathBuf};

use crate::error::CoreError;

/// Prefix for staged input objects.
pub const INPUT_OBJECT_PREFIX: &str = "input-";
/// Prefix for work item output objects.
pub const OUTPUT_OBJECT_PREFIX: &str = "output-";
/// Extension of the fetched export result.
pub const RESULT_EXTENSION: &str = "fbx";

const BUCKET_NAME_MIN: usize = 3;
const BUCKET_NAME_MAX: usize = 128;

pub fn input_object_name(job_id: &str) -> String {
    format!("{INPUT_OBJECT_PREFIX}{job_id}")
}

pub fn output_object_name(job_id: &str) -> String {
    format!("{OUTPUT_OBJECT_PREFIX}{job_id}")
}

/// Local destination for a job's fetched result: `{results_dir}/{job_id}.fbx`.
pub fn result_path(results_dir: &Path, job_id: &str) -> PathBuf {
    results_dir.join(format!("{job_id}.{RESULT_EXTENSION}"))
}

/// Check a bucket key against the `[-_.a-z0-9]{3,128}` form the storage
/// service accepts.
pub fn validate_bucket_name(name: &str) -> Result<(), CoreError> {
    let len_ok = (BUCKET_NAME_MIN..=BUCKET_NAME_MAX).contains(&name.len());
    let chars_ok = name
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '-' | '_' | '.'));
    if len_ok && chars_ok {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Bucket name '{name}' must match [-_.a-z0-9]{{3,128}}"
        )))
    }
}
