//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building the shared HTTP client with user agent and timeouts
//! - Single-shot GET requests (no retries)
//! - Classification of every failure into a [`FetchErrorKind`]

use crate::config::{CrawlerConfig, UserAgentConfig};
use crate::url::Address;
use reqwest::{header, redirect::Policy, Client};
use std::fmt;
use thiserror::Error;

/// Maximum number of characters kept in a [`FetchError`] detail
pub const DETAIL_LIMIT: usize = 32;

/// Category of a failed fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FetchErrorKind {
    /// Response status was not 2xx
    HttpStatus,
    /// Response `Content-Type` did not contain `text/html`
    UnsupportedContentType,
    /// DNS, connect, TLS, timeout or body transfer failure
    TransportError,
    /// Anything else raised on the fetch path
    UnknownError,
}

impl FetchErrorKind {
    /// Returns the stable label used in logs and summaries
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::HttpStatus => "http_status",
            Self::UnsupportedContentType => "unsupported_content_type",
            Self::TransportError => "transport_error",
            Self::UnknownError => "unknown_error",
        }
    }
}

impl fmt::Display for FetchErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failed fetch: its category plus a short, truncated detail
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {detail}")]
pub struct FetchError {
    pub kind: FetchErrorKind,
    pub detail: String,
}

impl FetchError {
    /// Creates an error, truncating `detail` to [`DETAIL_LIMIT`] characters
    pub fn new(kind: FetchErrorKind, detail: impl AsRef<str>) -> Self {
        Self {
            kind,
            detail: truncate(detail.as_ref(), DETAIL_LIMIT),
        }
    }
}

/// Result of a fetch: the raw HTML on success
pub type FetchOutcome = Result<String, FetchError>;

/// Builds the HTTP client shared by every fetch of a run
///
/// # Arguments
///
/// * `crawler` - Supplies the request and connect timeouts
/// * `user_agent` - Supplies the `User-Agent` header
///
/// # Example
///
/// ```
/// use sumi_scribe::config::{CrawlerConfig, UserAgentConfig};
/// use sumi_scribe::crawler::build_http_client;
///
/// let client = build_http_client(&CrawlerConfig::default(), &UserAgentConfig::default());
/// assert!(client.is_ok());
/// ```
pub fn build_http_client(
    crawler: &CrawlerConfig,
    user_agent: &UserAgentConfig,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent.header_value())
        .timeout(crawler.fetch_timeout())
        .connect_timeout(crawler.connect_timeout())
        .redirect(Policy::limited(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Stateless page fetcher
///
/// Cloning is cheap: clones share one connection pool, so a clone can be
/// handed to every worker of a level.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
}

impl Fetcher {
    /// Wraps an HTTP client
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Fetches an address and returns its HTML
    ///
    /// # Request Flow
    ///
    /// 1. Send one GET (redirects followed by the client, max 10 hops)
    /// 2. Non-2xx status → `HttpStatus` with the status code as detail
    /// 3. `Content-Type` without `text/html` → `UnsupportedContentType`
    ///    with the first 32 characters of the header as detail
    /// 4. Read the body as text
    ///
    /// Transport failures at any step map to `TransportError`; anything the
    /// client reports that is not a transport failure maps to `UnknownError`.
    /// The whole exchange, body included, is bounded by the client timeout.
    pub async fn fetch(&self, address: &Address) -> FetchOutcome {
        let response = self
            .client
            .get(address.as_str())
            .send()
            .await
            .map_err(|e| classify_error(address, &e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::new(
                FetchErrorKind::HttpStatus,
                status.as_u16().to_string(),
            ));
        }

        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_lowercase();

        if !content_type.contains("text/html") {
            return Err(FetchError::new(
                FetchErrorKind::UnsupportedContentType,
                content_type,
            ));
        }

        response
            .text()
            .await
            .map_err(|e| classify_error(address, &e))
    }
}

/// Maps a client error onto the fetch taxonomy
fn classify_error(address: &Address, error: &reqwest::Error) -> FetchError {
    tracing::debug!("Request to {} failed: {}", address, error);

    let kind = if error.is_timeout()
        || error.is_connect()
        || error.is_request()
        || error.is_body()
        || error.is_redirect()
    {
        FetchErrorKind::TransportError
    } else {
        FetchErrorKind::UnknownError
    };

    FetchError::new(kind, error.to_string())
}

/// Keeps at most `limit` characters of `text`
fn truncate(text: &str, limit: usize) -> String {
    text.chars().take(limit).collect()
}
