//! HTTP transfer executor for signed storage URLs.
//!
//! Uploads read the whole source file into memory and send it as the
//! body of a single `PUT`. Downloads create the destination directory
//! tree, then stream the `GET` response body to disk chunk by chunk.

use std::path::Path;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use workitem_core::transfer::TransferTask;

use crate::error::TransferError;
use crate::executor::TransferExecutor;

/// Moves files to and from signed URLs over HTTP.
#[derive(Clone)]
pub struct HttpTransfer {
    client: reqwest::Client,
}

impl HttpTransfer {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    /// Reuse an existing [`reqwest::Client`] (shared connection pool).
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    async fn upload(&self, url: &str, source: &Path) -> Result<(), TransferError> {
        let body = tokio::fs::read(source)
            .await
            .map_err(|e| io_error(source, e))?;
        let size = body.len();

        let response = self.client.put(url).body(body).send().await?;
        ensure_success(&response)?;

        tracing::debug!(source = %source.display(), bytes = size, "Upload complete");
        Ok(())
    }

    async fn download(&self, url: &str, destination: &Path) -> Result<(), TransferError> {
        if let Some(dir) = destination.parent().filter(|d| !d.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(|e| io_error(dir, e))?;
        }

        let mut response = self.client.get(url).send().await?;
        ensure_success(&response)?;

        let mut file = tokio::fs::File::create(destination)
            .await
            .map_err(|e| io_error(destination, e))?;
        let mut written = 0usize;
        while let Some(chunk) = response.chunk().await? {
            file.write_all(&chunk)
                .await
                .map_err(|e| io_error(destination, e))?;
            written += chunk.len();
        }
        file.flush().await.map_err(|e| io_error(destination, e))?;

        tracing::debug!(destination = %destination.display(), bytes = written, "Download complete");
        Ok(())
    }
}

impl Default for HttpTransfer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TransferExecutor for HttpTransfer {
    async fn execute(&self, task: &TransferTask) -> Result<(), TransferError> {
        match task {
            TransferTask::Upload { url, source } => self.upload(url, source).await,
            TransferTask::Download { url, destination } => self.download(url, destination).await,
        }
    }
}

fn ensure_success(response: &reqwest::Response) -> Result<(), TransferError> {
    let status = response.status();
    if status.is_success() {
        Ok(())
    } else {
        Err(TransferError::HttpStatus(status.as_u16()))
    }
}

fn io_error(path: &Path, source: std::io::Error) -> TransferError {
    TransferError::Io {
        path: path.to_path_buf(),
        source,
    }
}
