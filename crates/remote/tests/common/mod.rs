#![allow(dead_code)]

use std::time::Duration;

use axum::Router;
use workitem_remote::api::WorkItemApi;
use workitem_remote::backoff::BackoffPolicy;
use workitem_remote::client::RemoteClient;

/// Retries used by every test API: small enough to count requests.
pub const TEST_RETRIES: u32 = 2;

/// Poll interval short enough to keep tests fast.
pub const TEST_POLL_INTERVAL: Duration = Duration::from_millis(5);

/// Serve `app` on an ephemeral local port and return its base URL.
pub async fn spawn_mock(app: Router) -> anyhow::Result<String> {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok(format!("http://{addr}"))
}

/// Work item API against `base_url` with a zero-delay backoff policy.
pub fn test_api(base_url: &str) -> WorkItemApi {
    WorkItemApi::new(
        RemoteClient::new(),
        base_url,
        BackoffPolicy::without_delay(TEST_RETRIES),
    )
}
