//! HTTP fetching with classified failures
//!
//! Every remote source goes through [`HttpFetcher`]. Failures come back as a
//! [`FetchError`] that says whether retrying could help; the fetcher itself
//! retries only transient failures, and only when configured to make more
//! than one attempt.

use gda_common::checksum::compute_sha256;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::{info, warn};

/// Error types for remote fetches
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("Request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: StatusCode },

    #[error("Malformed response body from {url}: {reason}")]
    MalformedBody { url: String, reason: String },
}

impl FetchError {
    /// Whether the same request might succeed if repeated
    pub fn is_transient(&self) -> bool {
        match self {
            FetchError::Transport { .. } => true,
            FetchError::Status { status, .. } => {
                status.is_server_error() || *status == StatusCode::TOO_MANY_REQUESTS
            },
            FetchError::MalformedBody { .. } => false,
        }
    }

    pub fn url(&self) -> &str {
        match self {
            FetchError::Transport { url, .. }
            | FetchError::Status { url, .. }
            | FetchError::MalformedBody { url, .. } => url,
        }
    }
}

/// Longest wait between two attempts
const MAX_BACKOFF_SECS: u64 = 300;

/// Exponential backoff after failed attempt number `attempt`
fn retry_backoff(attempt: u32) -> Duration {
    Duration::from_secs(2u64.saturating_pow(attempt).min(MAX_BACKOFF_SECS))
}

/// A downloaded response body and its SHA-256
#[derive(Debug, Clone)]
pub struct Fetched {
    pub bytes: Vec<u8>,
    pub sha256: String,
}

/// HTTP client for dataset downloads
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    max_attempts: u32,
}

impl HttpFetcher {
    pub fn new(timeout: Duration, max_attempts: u32) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("gda-ingest/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            max_attempts: max_attempts.max(1),
        })
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// GET `url`, retrying transient failures with exponential backoff
    pub async fn fetch(&self, url: &str) -> Result<Fetched, FetchError> {
        let mut attempt = 1;
        loop {
            match self.fetch_once(url).await {
                Ok(fetched) => return Ok(fetched),
                Err(e) if e.is_transient() && attempt < self.max_attempts => {
                    let backoff = retry_backoff(attempt);
                    warn!(
                        url,
                        attempt,
                        max_attempts = self.max_attempts,
                        error = %e,
                        backoff_secs = backoff.as_secs(),
                        "Fetch failed, retrying"
                    );
                    tokio::time::sleep(backoff).await;
                    attempt += 1;
                },
                Err(e) => return Err(e),
            }
        }
    }

    /// GET `url` and decode the body as UTF-8
    pub async fn fetch_text(&self, url: &str) -> Result<(String, String), FetchError> {
        let Fetched { bytes, sha256 } = self.fetch(url).await?;
        let text = String::from_utf8(bytes).map_err(|e| FetchError::MalformedBody {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        Ok((text, sha256))
    }

    async fn fetch_once(&self, url: &str) -> Result<Fetched, FetchError> {
        let transport = |source| FetchError::Transport {
            url: url.to_string(),
            source,
        };

        info!(url, "Downloading");
        let response = self.client.get(url).send().await.map_err(transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status,
            });
        }

        let bytes = response.bytes().await.map_err(transport)?.to_vec();
        let sha256 = compute_sha256(&mut bytes.as_slice())
            .map_err(|e| FetchError::MalformedBody {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        info!(url, bytes = bytes.len(), sha256 = %sha256, "Downloaded");
        Ok(Fetched { bytes, sha256 })
    }
}
