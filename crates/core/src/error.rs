//! Unified error types for prefill.
//!
//! Every error is prefixed with a stable code so log lines can be grepped
//! independently of the human-readable tail.

use crate::config::ConfigError;

/// Why a single fetch for an identifier did not produce a cached value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchErrorCause {
    /// The network call completed with a non-success status.
    #[error("status {0}")]
    Status(u16),

    /// The network call itself failed (connect, timeout, oversized body, ...).
    #[error("network error: {0}")]
    Transport(String),

    /// The body was received but is not valid JSON.
    #[error("failed to decode body: {0}")]
    Decode(String),

    /// The fetch succeeded but the store was wiped before the value was read back.
    #[error("entry wiped before it could be read")]
    Wiped,

    /// The task driving the fetch went away without settling.
    #[error("fetch ended without settling")]
    Interrupted,
}

/// A failed fetch for one identifier.
///
/// Cloneable so the same failure can be handed to the initiator and to every
/// caller that joined the in-flight fetch.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("FETCH_FAILED: {identifier}: {cause}")]
pub struct FetchError {
    pub identifier: String,
    pub cause: FetchErrorCause,
}

impl FetchError {
    pub fn new(identifier: impl Into<String>, cause: FetchErrorCause) -> Self {
        Self { identifier: identifier.into(), cause }
    }
}

/// A failed preload, carrying the fetch failure as its source.
#[derive(Debug, Clone, thiserror::Error)]
#[error("PRELOAD_FAILED: error fetching data from {}: {}", .source.identifier, .source.cause)]
pub struct PreloadError {
    #[from]
    pub source: FetchError,
}

impl PreloadError {
    pub fn identifier(&self) -> &str {
        &self.source.identifier
    }
}

/// The transfer string was not valid encoded cache data.
#[derive(Debug, thiserror::Error)]
pub enum TransferParseError {
    #[error("TRANSFER_PARSE: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("TRANSFER_PARSE: expected a JSON object, found {0}")]
    NotAnObject(&'static str),
}

/// Unified error type for setting up and driving prefill.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A base URL or identifier could not be turned into a request URL.
    #[error("INVALID_URL: {0}")]
    InvalidUrl(String),

    /// The HTTP client could not be constructed.
    #[error("HTTP_CLIENT: {0}")]
    HttpClient(String),

    #[error(transparent)]
    Preload(#[from] PreloadError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_error_display() {
        let err = FetchError::new("/people", FetchErrorCause::Status(500));
        assert_eq!(err.to_string(), "FETCH_FAILED: /people: status 500");
    }

    #[test]
    fn test_preload_error_wraps_context() {
        let err: PreloadError = FetchError::new("/people", FetchErrorCause::Decode("expected value".into())).into();
        let msg = err.to_string();
        assert!(msg.starts_with("PRELOAD_FAILED: error fetching data from /people"));
        assert!(msg.contains("expected value"));
        assert_eq!(err.identifier(), "/people");
    }

    #[test]
    fn test_preload_error_source_chain() {
        use std::error::Error as _;

        let err: PreloadError = FetchError::new("/people", FetchErrorCause::Status(404)).into();
        let source = err.source().map(|s| s.to_string());
        assert_eq!(source.as_deref(), Some("FETCH_FAILED: /people: status 404"));
    }

    #[test]
    fn test_transfer_error_display() {
        let err = TransferParseError::NotAnObject("array");
        assert!(err.to_string().contains("TRANSFER_PARSE"));
        assert!(err.to_string().contains("array"));
    }

    #[test]
    fn test_umbrella_from_preload() {
        let err: Error = PreloadError::from(FetchError::new("x", FetchErrorCause::Wiped)).into();
        assert!(matches!(err, Error::Preload(_)));
    }
}
