use crate::feed::parser::{parse_feed, FetchedDocument, ParseError};
use crate::util::{validate_feed_url, UrlValidationError};
use futures::StreamExt;
use std::time::Duration;
use thiserror::Error;

/// Default bound on a single fetch, connect through last body byte
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(30);
/// Default response body limit (10MB)
pub const DEFAULT_MAX_FEED_BYTES: usize = 10 * 1024 * 1024;

/// Errors that can occur while retrieving and decoding a feed document.
///
/// Every variant aborts ingestion for the current cycle; no partially
/// decoded document is ever handed on.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Feed URL is not a fetchable http(s) URL
    #[error("Invalid feed URL: {0}")]
    InvalidUrl(#[from] UrlValidationError),
    /// Network-level error (DNS, connection, TLS, etc.)
    #[error("Request failed: {0}")]
    Network(#[from] reqwest::Error),
    /// HTTP response with non-2xx status code
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    /// The whole retrieval exceeded the configured bound
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),
    /// Body is not an RSS document of the expected shape
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),
    /// Response body exceeded the size limit
    #[error("Response too large")]
    ResponseTooLarge,
    /// Response was incomplete (received fewer bytes than Content-Length)
    #[error("Incomplete response: expected {expected} bytes, received {received}")]
    IncompleteResponse { expected: u64, received: usize },
}

/// Retrieves feed documents over HTTP.
///
/// Holds one shared `reqwest::Client`; cloning a `Fetcher` shares its
/// connection pool.
#[derive(Clone, Debug)]
pub struct Fetcher {
    client: reqwest::Client,
    timeout: Duration,
    max_bytes: usize,
}

impl Fetcher {
    /// Build a fetcher with its own client.
    ///
    /// `timeout` bounds each [`fetch`](Self::fetch) end to end; the client's
    /// own request timeout is set to the same value.
    pub fn new(timeout: Duration, user_agent: &str, max_bytes: usize) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .pool_idle_timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self::with_client(client, timeout, max_bytes))
    }

    /// Wrap an existing client (tests, or callers sharing one client).
    pub fn with_client(client: reqwest::Client, timeout: Duration, max_bytes: usize) -> Self {
        Self {
            client,
            timeout,
            max_bytes,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Fetch `url` and decode it as an RSS document.
    ///
    /// # Errors
    ///
    /// - [`FetchError::InvalidUrl`] - not an http(s) URL; no request is sent
    /// - [`FetchError::Timeout`] - the retrieval did not finish within the bound
    /// - [`FetchError::Network`] - connection or TLS errors
    /// - [`FetchError::HttpStatus`] - non-2xx HTTP response
    /// - [`FetchError::ResponseTooLarge`] / [`FetchError::IncompleteResponse`]
    /// - [`FetchError::Parse`] - body is not the expected RSS schema
    ///
    /// There are no retries: a failing feed waits for its next turn in the
    /// rotation.
    pub async fn fetch(&self, url: &str) -> Result<FetchedDocument, FetchError> {
        let url = validate_feed_url(url)?;

        let bytes = tokio::time::timeout(self.timeout, self.fetch_bytes(url))
            .await
            .map_err(|_| FetchError::Timeout(self.timeout))??;

        let document = parse_feed(&bytes)?;
        tracing::debug!(
            bytes = bytes.len(),
            items = document.items.len(),
            "Decoded feed document"
        );
        Ok(document)
    }

    async fn fetch_bytes(&self, url: url::Url) -> Result<Vec<u8>, FetchError> {
        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout(self.timeout)
            } else {
                FetchError::Network(e)
            }
        })?;

        if !response.status().is_success() {
            return Err(FetchError::HttpStatus(response.status().as_u16()));
        }

        read_limited_bytes(response, self.max_bytes).await
    }
}

async fn read_limited_bytes(
    response: reqwest::Response,
    limit: usize,
) -> Result<Vec<u8>, FetchError> {
    let expected_length = response.content_length();

    // Fast path: check Content-Length header
    if let Some(len) = expected_length {
        if len > limit as u64 {
            return Err(FetchError::ResponseTooLarge);
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(FetchError::Network)?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(FetchError::ResponseTooLarge);
        }
        bytes.extend_from_slice(&chunk);
    }

    if let Some(expected) = expected_length {
        if (bytes.len() as u64) < expected {
            return Err(FetchError::IncompleteResponse {
                expected,
                received: bytes.len(),
            });
        }
    }

    Ok(bytes)
}
