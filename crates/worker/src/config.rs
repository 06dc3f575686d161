use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use workitem_core::naming::validate_bucket_name;
use workitem_transfer::queue::DEFAULT_CONCURRENCY;

use crate::error::ConfigError;

pub const DEFAULT_AUTH_URL: &str = "https://developer.api.autodesk.com/authentication/v2/token";
pub const DEFAULT_OSS_URL: &str = "https://developer.api.autodesk.com/oss/v2";
pub const DEFAULT_DESIGN_AUTOMATION_URL: &str = "https://developer.api.autodesk.com/da/us-east/v3";
pub const DEFAULT_ACTIVITY_ID: &str = "ExportToFBX";
pub const DEFAULT_ACTIVITY_ALIAS: &str = "prod";

/// Runner configuration loaded from environment variables.
///
/// Loaded once at process start and never modified afterwards.
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    pub client_id: String,
    pub client_secret: String,
    /// Owner alias override. When unset, it is resolved remotely.
    pub nickname: Option<String>,
    pub bucket_name: String,
    pub auth_url: String,
    pub oss_url: String,
    pub design_automation_url: String,
    pub activity_id: String,
    pub activity_alias: String,
    /// Wait before each work item status read.
    pub poll_interval: Duration,
    /// Concurrent workers per transfer queue.
    pub transfer_concurrency: usize,
    /// Per-request timeout of the shared HTTP client.
    pub http_timeout: Duration,
    /// Directory downloads are written to.
    pub results_dir: PathBuf,
}

impl RunnerConfig {
    /// Load configuration from the process environment.
    ///
    /// | Env Var                 | Default                                                       |
    /// |-------------------------|---------------------------------------------------------------|
    /// | `FORGE_CLIENT_ID`       | required                                                      |
    /// | `FORGE_CLIENT_SECRET`   | required                                                      |
    /// | `FORGE_NICKNAME`        | resolved remotely                                             |
    /// | `OSS_BUCKET_NAME`       | required                                                      |
    /// | `AUTH_URL`              | `https://developer.api.autodesk.com/authentication/v2/token`  |
    /// | `OSS_URL`               | `https://developer.api.autodesk.com/oss/v2`                   |
    /// | `DESIGN_AUTOMATION_URL` | `https://developer.api.autodesk.com/da/us-east/v3`            |
    /// | `DA_ACTIVITY_ID`        | `ExportToFBX`                                                 |
    /// | `DA_ACTIVITY_ALIAS`     | `prod`                                                        |
    /// | `TIME_BETWEEN_POLLS_MS` | `2000`                                                        |
    /// | `TRANSFER_CONCURRENCY`  | `7`                                                           |
    /// | `HTTP_TIMEOUT_SECS`     | `60`                                                          |
    /// | `RESULTS_DIR`           | `Results`                                                     |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through `lookup` instead of the process
    /// environment. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let required = |key: &'static str| get(key).ok_or(ConfigError::Missing(key));
        let or_default = |key: &str, default: &str| get(key).unwrap_or_else(|| default.to_string());

        let bucket_name = required("OSS_BUCKET_NAME")?;
        validate_bucket_name(&bucket_name).map_err(|e| ConfigError::Invalid {
            var: "OSS_BUCKET_NAME",
            value: bucket_name.clone(),
            reason: e.to_string(),
        })?;

        let poll_ms: u64 = parse(&get, "TIME_BETWEEN_POLLS_MS", 2000)?;
        let transfer_concurrency: usize =
            parse(&get, "TRANSFER_CONCURRENCY", DEFAULT_CONCURRENCY)?;
        if transfer_concurrency == 0 {
            return Err(ConfigError::Invalid {
                var: "TRANSFER_CONCURRENCY",
                value: "0".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        let timeout_secs: u64 = parse(&get, "HTTP_TIMEOUT_SECS", 60)?;

        Ok(Self {
            client_id: required("FORGE_CLIENT_ID")?,
            client_secret: required("FORGE_CLIENT_SECRET")?,
            nickname: get("FORGE_NICKNAME"),
            bucket_name,
            auth_url: or_default("AUTH_URL", DEFAULT_AUTH_URL),
            oss_url: or_default("OSS_URL", DEFAULT_OSS_URL),
            design_automation_url: or_default("DESIGN_AUTOMATION_URL", DEFAULT_DESIGN_AUTOMATION_URL),
            activity_id: or_default("DA_ACTIVITY_ID", DEFAULT_ACTIVITY_ID),
            activity_alias: or_default("DA_ACTIVITY_ALIAS", DEFAULT_ACTIVITY_ALIAS),
            poll_interval: Duration::from_millis(poll_ms),
            transfer_concurrency,
            http_timeout: Duration::from_secs(timeout_secs),
            results_dir: PathBuf::from(or_default("RESULTS_DIR", "Results")),
        })
    }
}

fn parse<T, G>(get: &G, var: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    match get(var) {
        None => Ok(default),
        Some(value) => value.parse().map_err(|e: T::Err| ConfigError::Invalid {
            var,
            reason: e.to_string(),
            value,
        }),
    }
}
