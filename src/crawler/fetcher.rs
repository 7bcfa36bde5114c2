//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building HTTP clients with the configured identity and timeouts
//! - GET requests to fetch page content
//! - Classifying every response into success, retryable or permanent failure
//!
//! The fetcher never returns an error for HTTP-level problems; they are
//! reported through [`FetchOutcome`] and left to the retry policy.

use crate::config::FetchConfig;
use async_trait::async_trait;
use reqwest::{redirect::Policy, Client, StatusCode};
use thiserror::Error;
use url::Url;

/// Why a fetch attempt did not succeed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// Connection refused, reset, DNS failure or a broken body stream
    #[error("network error: {0}")]
    Network(String),

    /// The request did not complete within the configured timeout
    #[error("request timed out")]
    Timeout,

    /// HTTP 503 or 429: the server asked us to back off
    #[error("throttled (HTTP {status})")]
    Throttled { status: u16 },

    /// Any other HTTP 5xx
    #[error("server error (HTTP {status})")]
    Server { status: u16 },

    /// HTTP 404 or 410
    #[error("not found (HTTP {status})")]
    NotFound { status: u16 },

    /// Other HTTP 4xx, or a 3xx that was not followed
    #[error("client error (HTTP {status})")]
    Client { status: u16 },

    /// The URL could not be parsed or is not http(s)
    #[error("malformed URL: {0}")]
    MalformedUrl(String),
}

impl FetchError {
    /// Returns true if a later attempt might succeed
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Network(_) | Self::Timeout | Self::Throttled { .. } | Self::Server { .. }
        )
    }

    /// HTTP status behind this error, if there was a response
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Throttled { status }
            | Self::Server { status }
            | Self::NotFound { status }
            | Self::Client { status } => Some(*status),
            Self::Network(_) | Self::Timeout | Self::MalformedUrl(_) => None,
        }
    }
}

/// Result of a single fetch attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The page was fetched
    Success {
        /// HTTP status code (2xx)
        status: u16,
        /// Page body, decoded lossily; garbled content is left to the extractor
        body: String,
    },

    /// The attempt failed but may succeed later
    RetryableFailure { error: FetchError },

    /// The attempt failed and retrying will not help
    PermanentFailure { error: FetchError },
}

impl FetchOutcome {
    /// Wraps a fetch error in the matching failure variant
    pub fn from_error(error: FetchError) -> Self {
        if error.is_retryable() {
            Self::RetryableFailure { error }
        } else {
            Self::PermanentFailure { error }
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

/// Something that can fetch a page
///
/// The engine only depends on this trait; [`HttpFetcher`] is the production
/// implementation and tests substitute scripted fetchers.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Performs one request for `url` and classifies the result
    async fn fetch(&self, url: &str) -> FetchOutcome;
}

/// Maps a non-success HTTP status to a fetch error
///
/// | Status | Error | Retryable |
/// |--------|-------|-----------|
/// | 503, 429 | Throttled | yes |
/// | other 5xx | Server | yes |
/// | 404, 410 | NotFound | no |
/// | other 4xx, unfollowed 3xx | Client | no |
pub fn classify_status(status: StatusCode) -> Option<FetchError> {
    let code = status.as_u16();
    if status.is_success() {
        None
    } else if status == StatusCode::SERVICE_UNAVAILABLE || status == StatusCode::TOO_MANY_REQUESTS
    {
        Some(FetchError::Throttled { status: code })
    } else if status.is_server_error() {
        Some(FetchError::Server { status: code })
    } else if status == StatusCode::NOT_FOUND || status == StatusCode::GONE {
        Some(FetchError::NotFound { status: code })
    } else {
        Some(FetchError::Client { status: code })
    }
}

/// Maps a transport-level reqwest error to a fetch error
fn classify_transport_error(error: &reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::Timeout
    } else if error.is_builder() {
        FetchError::MalformedUrl(error.to_string())
    } else if error.is_connect() {
        FetchError::Network(format!("connection failed: {}", error))
    } else {
        FetchError::Network(error.to_string())
    }
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The fetch configuration (identity header and timeouts)
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
///
/// # Example
///
/// ```no_run
/// use listing_harvester::config::FetchConfig;
/// use listing_harvester::crawler::build_http_client;
///
/// let client = build_http_client(&FetchConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &FetchConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.clone())
        .timeout(config.timeout())
        .connect_timeout(config.connect_timeout())
        .redirect(Policy::limited(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches pages over HTTP with reqwest
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Creates a fetcher with a client built from `config`
    pub fn new(config: &FetchConfig) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: build_http_client(config)?,
        })
    }

    /// Wraps an already configured client
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> FetchOutcome {
        fetch_url(&self.client, url).await
    }
}

/// Fetches a URL and classifies the response
///
/// # Request Flow
///
/// 1. Parse the URL; a malformed or non-http(s) URL is a permanent failure
/// 2. Send a GET request (redirects followed up to 10 hops)
/// 3. Classify the status code with [`classify_status`]
/// 4. Read the body; a broken body stream is a retryable network error
///
/// # Arguments
///
/// * `client` - The HTTP client to use
/// * `url` - The URL to fetch
///
/// # Returns
///
/// A FetchOutcome indicating success or the type of failure
pub async fn fetch_url(client: &Client, url: &str) -> FetchOutcome {
    let parsed = match Url::parse(url) {
        Ok(parsed) if parsed.scheme() == "http" || parsed.scheme() == "https" => parsed,
        Ok(parsed) => {
            return FetchOutcome::PermanentFailure {
                error: FetchError::MalformedUrl(format!(
                    "unsupported scheme '{}' in {}",
                    parsed.scheme(),
                    url
                )),
            }
        }
        Err(e) => {
            return FetchOutcome::PermanentFailure {
                error: FetchError::MalformedUrl(format!("{}: {}", url, e)),
            }
        }
    };

    let response = match client.get(parsed).send().await {
        Ok(response) => response,
        Err(e) => return FetchOutcome::from_error(classify_transport_error(&e)),
    };

    let status = response.status();
    if let Some(error) = classify_status(status) {
        return FetchOutcome::from_error(error);
    }

    match response.bytes().await {
        Ok(bytes) => FetchOutcome::Success {
            status: status.as_u16(),
            body: String::from_utf8_lossy(&bytes).into_owned(),
        },
        Err(e) => FetchOutcome::from_error(classify_transport_error(&e)),
    }
}
