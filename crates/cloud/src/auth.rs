//! Bearer token acquisition.
//!
//! [`TwoLeggedAuthenticator`] performs the OAuth client-credentials
//! flow once and reuses the token for the rest of the process. There
//! is no refresh: a run is expected to finish within the token's
//! lifetime.

use std::fmt;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::OnceCell;

/// Scopes needed to submit work items and manage the storage bucket.
pub const DEFAULT_SCOPES: &[&str] = &[
    "code:all",
    "bucket:create",
    "bucket:read",
    "data:read",
    "data:write",
];

/// Opaque bearer token. `Debug` never prints the secret.
#[derive(Clone, PartialEq, Eq)]
pub struct BearerToken(String);

impl BearerToken {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BearerToken(****)")
    }
}

/// Errors from token acquisition.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The HTTP request itself failed, or its body could not be decoded.
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The authorization server refused the credentials.
    #[error("Authentication rejected ({status}): {body}")]
    Rejected { status: u16, body: String },
}

/// Supplies the bearer token used for every remote call.
#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn token(&self) -> Result<BearerToken, AuthError>;
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

/// OAuth client-credentials ("two-legged") authenticator.
pub struct TwoLeggedAuthenticator {
    client: reqwest::Client,
    token_url: String,
    client_id: String,
    client_secret: String,
    scopes: Vec<String>,
    cached: OnceCell<BearerToken>,
}

impl TwoLeggedAuthenticator {
    pub fn new(
        client: reqwest::Client,
        token_url: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        Self {
            client,
            token_url: token_url.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            scopes: DEFAULT_SCOPES.iter().map(|s| s.to_string()).collect(),
            cached: OnceCell::new(),
        }
    }

    async fn fetch(&self) -> Result<BearerToken, AuthError> {
        let scope = self.scopes.join(" ");
        let response = self
            .client
            .post(&self.token_url)
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(&[("grant_type", "client_credentials"), ("scope", scope.as_str())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(AuthError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let token: TokenResponse = response.json().await?;
        tracing::info!(expires_in = ?token.expires_in, "Obtained access token");
        Ok(BearerToken(token.access_token))
    }
}

#[async_trait]
impl Authenticator for TwoLeggedAuthenticator {
    async fn token(&self) -> Result<BearerToken, AuthError> {
        self.cached.get_or_try_init(|| self.fetch()).await.cloned()
    }
}
