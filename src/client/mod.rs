//! Outbound HTTP client with bounded retries
//!
//! Wraps a shared `reqwest::Client` (rustls, certificate verification on)
//! and retries connect/read failures and a configurable set of status
//! codes with exponential backoff. Once retries are exhausted the caller
//! gets a [`NetworkError`], which is distinct from a response that simply
//! carries a non-200 status.

pub mod retry;

use std::time::Duration;

use anyhow::Context;
use reqwest::{Client, Response};
use thiserror::Error;
use tracing::debug;

pub use retry::RetryPolicy;

#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("request to {url} failed after {attempts} attempt(s): {source}")]
    Transport {
        url: String,
        attempts: u32,
        #[source]
        source: reqwest::Error,
    },
    #[error("request to {url} still returned HTTP {status} after {attempts} attempt(s)")]
    RetriesExhausted {
        url: String,
        status: u16,
        attempts: u32,
    },
    #[error("invalid request URL {url}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

/// HTTP client shared by every resolution task.
///
/// Cloning is cheap: the underlying connection pool is reference counted.
#[derive(Clone)]
pub struct HttpClient {
    inner: Client,
    policy: RetryPolicy,
}

impl HttpClient {
    pub fn new(timeout: Duration, policy: RetryPolicy) -> anyhow::Result<Self> {
        let inner = Client::builder()
            .user_agent(concat!("geotrace/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .context("failed to build HTTP client for geolocation lookups")?;

        Ok(Self::with_client(inner, policy))
    }

    pub fn with_client(inner: Client, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    /// GET `url`, retrying transient failures according to the policy.
    ///
    /// Any response whose status is not in the retry list is returned as-is,
    /// including 4xx and non-retried 5xx responses.
    pub async fn fetch(&self, url: &str) -> Result<Response, NetworkError> {
        let mut retry: u32 = 0;

        loop {
            match self.inner.get(url).send().await {
                Ok(response) if self.policy.retries_status(response.status()) => {
                    let status = response.status();
                    if retry >= self.policy.total {
                        return Err(NetworkError::RetriesExhausted {
                            url: url.to_string(),
                            status: status.as_u16(),
                            attempts: retry + 1,
                        });
                    }
                    debug!(url, status = %status, retry = retry + 1, "retrying on status");
                }
                Ok(response) => return Ok(response),
                Err(err) if err.is_builder() => {
                    return Err(NetworkError::InvalidUrl {
                        url: url.to_string(),
                        source: err,
                    });
                }
                Err(err) => {
                    if retry >= self.policy.total {
                        return Err(NetworkError::Transport {
                            url: url.to_string(),
                            attempts: retry + 1,
                            source: err,
                        });
                    }
                    debug!(url, error = %err, retry = retry + 1, "retrying after transport error");
                }
            }

            retry += 1;
            let delay = self.policy.backoff(retry);
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
        }
    }
}
