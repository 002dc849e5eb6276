//! The fetch capability: one HTTP GET with a streamed body.
//!
//! Everything above this module talks to the network through [`Fetcher`], so
//! the catalog and the updater can be driven by an in-memory fake in tests.
//! [`HttpFetcher`] is the production implementation on top of `reqwest`.
//!
//! Transport trust is not required: [`HttpFetcher`] may skip certificate
//! validation, and a release is only installed after its detached signature
//! has been checked against a trusted key.

use anyhow::Context;
use futures::TryStreamExt;
use reqwest::header::ACCEPT;
use std::future::Future;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio_util::io::StreamReader;
use tracing::debug;

use crate::config::UpgradeConfig;
use crate::core::UpgradeError;

/// `Accept` value for release archive downloads.
pub const ACCEPT_OCTET_STREAM: &str = "application/octet-stream";

/// `Accept` value for release index requests.
pub const ACCEPT_JSON: &str = "application/json";

/// A response body readable as an async byte stream.
pub type ResponseBody = Box<dyn AsyncRead + Send + Unpin>;

/// Status and body of a completed request.
pub struct FetchResponse {
    /// The URL that was requested
    pub url: String,
    /// HTTP status code
    pub status: u16,
    /// The response body, not yet read
    pub body: ResponseBody,
}

impl std::fmt::Debug for FetchResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchResponse")
            .field("url", &self.url)
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}

impl FetchResponse {
    /// Whether the status is in the 2xx range.
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Turn a non-2xx response into [`UpgradeError::FetchStatus`].
    pub fn error_for_status(self) -> Result<Self, UpgradeError> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(UpgradeError::FetchStatus {
                url: self.url,
                status: self.status,
            })
        }
    }

    /// Read the whole body into memory.
    pub async fn bytes(mut self) -> Result<Vec<u8>, UpgradeError> {
        let mut buf = Vec::new();
        self.body.read_to_end(&mut buf).await.map_err(|e| UpgradeError::Fetch {
            url: self.url.clone(),
            reason: e.to_string(),
        })?;
        Ok(buf)
    }
}

/// Performs a GET request and hands back the status and a streaming body.
///
/// Implementations report transport failures as [`UpgradeError::Fetch`] and
/// must not retry; status codes are returned as-is for the caller to judge.
/// Timeouts, if any, are the implementation's business.
pub trait Fetcher: Send + Sync {
    /// GET `url` with the given `Accept` header.
    fn get(
        &self,
        url: &str,
        accept: &str,
    ) -> impl Future<Output = Result<FetchResponse, UpgradeError>> + Send;
}

/// [`Fetcher`] backed by a `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Wrap an already configured client.
    #[must_use]
    pub const fn new(client: reqwest::Client) -> Self {
        Self {
            client,
        }
    }

    /// Build a client from the transport settings in `config`: user agent,
    /// certificate validation and timeout.
    pub fn from_config(config: &UpgradeConfig) -> anyhow::Result<Self> {
        let mut builder = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .danger_accept_invalid_certs(config.accept_invalid_certs);
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().context("Failed to build HTTP client")?;
        Ok(Self::new(client))
    }
}

impl Fetcher for HttpFetcher {
    async fn get(&self, url: &str, accept: &str) -> Result<FetchResponse, UpgradeError> {
        debug!("GET {} (accept: {})", url, accept);

        let response =
            self.client.get(url).header(ACCEPT, accept).send().await.map_err(|e| {
                UpgradeError::Fetch {
                    url: url.to_string(),
                    reason: error_chain(&e),
                }
            })?;

        let status = response.status().as_u16();
        debug!("{} answered HTTP {}", url, status);

        let stream = response.bytes_stream().map_err(std::io::Error::other);
        Ok(FetchResponse {
            url: url.to_string(),
            status,
            body: Box::new(StreamReader::new(Box::pin(stream))),
        })
    }
}

/// Render an error with its sources, `outer: inner: root`.
fn error_chain(error: &dyn std::error::Error) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(status: u16, body: &'static [u8]) -> FetchResponse {
        FetchResponse {
            url: "https://example.com/file".to_string(),
            status,
            body: Box::new(body),
        }
    }

    #[test]
    fn test_error_for_status() {
        assert!(response(200, b"").error_for_status().is_ok());
        assert!(response(204, b"").error_for_status().is_ok());

        let err = response(404, b"").error_for_status().unwrap_err();
        assert!(matches!(err, UpgradeError::FetchStatus { status: 404, .. }));
        let err = response(301, b"").error_for_status().unwrap_err();
        assert!(matches!(err, UpgradeError::FetchStatus { status: 301, .. }));
    }

    #[tokio::test]
    async fn test_bytes_reads_whole_body() {
        let body = response(200, b"hello world").bytes().await.unwrap();
        assert_eq!(body, b"hello world");
    }

    #[test]
    fn test_http_fetcher_from_default_config() {
        assert!(HttpFetcher::from_config(&UpgradeConfig::default()).is_ok());
    }
}
