//! Network call behind the fetch coordinator.
//!
//! ### Contract
//! - One call per `fetch`, no retries, no caching
//! - A response with any status is `Ok`; only the call itself failing is `Err`
//!
//! ### HTTP transport
//! - Absolute identifiers are requested as-is, relative ones are joined onto
//!   the configured base URL
//! - Max redirects: 5 (configurable)
//! - Max body bytes: 5MB (configurable)

#[cfg(any(test, feature = "test-util"))]
pub mod memory;
pub mod url;

use bytes::Bytes;
use reqwest::{Client, StatusCode, header};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

#[cfg(any(test, feature = "test-util"))]
pub use memory::MemoryTransport;
pub use self::url::{UrlError, parse_base, resolve};

use prefill_core::{AppConfig, Error};

/// Errors from performing the network call itself.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("invalid request URL: {0}")]
    Url(#[from] UrlError),

    #[error("request timeout")]
    Timeout,

    #[error("network error: {0}")]
    Network(String),

    #[error("{len} bytes exceeds {max}")]
    TooLarge { len: usize, max: usize },
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() { TransportError::Timeout } else { TransportError::Network(err.to_string()) }
    }
}

/// Status and raw body of a completed network call.
#[derive(Debug, Clone)]
pub struct Response {
    pub status: StatusCode,
    pub body: Bytes,
}

impl Response {
    pub fn new(status: StatusCode, body: impl Into<Bytes>) -> Self {
        Self { status, body: body.into() }
    }
}

/// Performs the network call for one identifier.
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    async fn fetch(&self, id: &str) -> Result<Response, TransportError>;
}

/// Configuration for the HTTP transport.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Base URL for relative identifiers (default: none)
    pub base_url: Option<String>,

    /// User agent string (default: "prefill/0.1")
    pub user_agent: String,

    /// Maximum response body size in bytes (default: 5MB)
    pub max_bytes: usize,

    /// Request timeout (default: 20s)
    pub timeout: Duration,

    /// Maximum number of redirects to follow (default: 5)
    pub max_redirects: usize,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            user_agent: "prefill/0.1".to_string(),
            max_bytes: 5 * 1024 * 1024,
            timeout: Duration::from_millis(20000),
            max_redirects: 5,
        }
    }
}

impl From<&AppConfig> for TransportConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            base_url: config.base_url.clone(),
            user_agent: config.user_agent.clone(),
            max_bytes: config.max_bytes,
            timeout: config.timeout(),
            max_redirects: config.max_redirects,
        }
    }
}

/// reqwest-backed transport.
pub struct HttpTransport {
    http: Client,
    config: TransportConfig,
    base: Option<::url::Url>,
    requests: AtomicUsize,
}

impl HttpTransport {
    /// Create a new HTTP transport with the given configuration.
    pub fn new(config: TransportConfig) -> Result<Self, Error> {
        let base = config
            .base_url
            .as_deref()
            .map(parse_base)
            .transpose()
            .map_err(|e| Error::InvalidUrl(e.to_string()))?;

        let http = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| Error::HttpClient(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { http, config, base, requests: AtomicUsize::new(0) })
    }

    /// Number of requests this transport has sent.
    pub fn requests_sent(&self) -> usize {
        self.requests.load(Ordering::Relaxed)
    }

    /// Get reference to the configuration.
    pub fn config(&self) -> &TransportConfig {
        &self.config
    }
}

#[async_trait::async_trait]
impl Transport for HttpTransport {
    async fn fetch(&self, id: &str) -> Result<Response, TransportError> {
        let start = Instant::now();
        let url = resolve(id, self.base.as_ref())?;

        self.requests.fetch_add(1, Ordering::Relaxed);
        let response = self
            .http
            .get(url.as_str())
            .header(header::ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();

        if let Some(len) = response.content_length().map(declared_len)
            && len > self.config.max_bytes
        {
            return Err(TransportError::TooLarge { len, max: self.config.max_bytes });
        }

        let body = response.bytes().await?;

        if body.len() > self.config.max_bytes {
            return Err(TransportError::TooLarge { len: body.len(), max: self.config.max_bytes });
        }

        tracing::debug!(
            identifier = id,
            url = %url,
            status = status.as_u16(),
            bytes = body.len(),
            fetch_ms = start.elapsed().as_millis() as u64,
            "fetched resource"
        );

        Ok(Response { status, body })
    }
}

/// Declared body length, saturated where it does not fit a `usize`.
fn declared_len(len: u64) -> usize {
    usize::try_from(len).unwrap_or(usize::MAX)
}
