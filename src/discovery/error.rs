//! Error types for the discovery module.
//!
//! None of these abort a discovery batch: fetch errors shrink the result set,
//! extraction errors skip one strategy.

use thiserror::Error;

use crate::media::Strategy;

/// Errors raised while fetching a page or probing a candidate.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// Network-level failure (DNS, connection refused, TLS ...).
    #[error("network error fetching {url}: {source}")]
    Fetch {
        /// The URL that failed.
        url: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// The request did not finish within its timeout.
    #[error("timeout fetching {url}")]
    Timeout {
        /// The URL that timed out.
        url: String,
    },

    /// The server answered with a non-success status.
    #[error("HTTP {status} fetching {url}")]
    HttpStatus {
        /// The URL that returned an error status.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// The seed URL could not be parsed.
    #[error("invalid URL: {url}")]
    InvalidUrl {
        /// The rejected input.
        url: String,
    },
}

impl DiscoveryError {
    /// Creates a fetch error from a reqwest error, mapping timeouts to [`DiscoveryError::Timeout`].
    pub fn fetch(url: impl Into<String>, source: reqwest::Error) -> Self {
        if source.is_timeout() {
            Self::Timeout { url: url.into() }
        } else {
            Self::Fetch {
                url: url.into(),
                source,
            }
        }
    }

    /// Creates a timeout error.
    pub fn timeout(url: impl Into<String>) -> Self {
        Self::Timeout { url: url.into() }
    }

    /// Creates an HTTP status error.
    pub fn http_status(url: impl Into<String>, status: u16) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
        }
    }

    /// Creates an invalid URL error.
    pub fn invalid_url(url: impl Into<String>) -> Self {
        Self::InvalidUrl { url: url.into() }
    }
}

/// A single extraction strategy failed; the others still run.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{strategy} extraction failed: {reason}")]
pub struct ExtractionError {
    /// The strategy that failed.
    pub strategy: Strategy,
    /// What went wrong.
    pub reason: String,
}

impl ExtractionError {
    /// Creates an extraction error for `strategy`.
    pub fn new(strategy: Strategy, reason: impl Into<String>) -> Self {
        Self {
            strategy,
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_display() {
        let error = DiscoveryError::timeout("https://example.com/");
        let msg = error.to_string();
        assert!(msg.contains("timeout"), "Expected 'timeout' in: {msg}");
        assert!(msg.contains("https://example.com/"), "Expected URL in: {msg}");
    }

    #[test]
    fn test_http_status_display() {
        let msg = DiscoveryError::http_status("https://example.com/x", 404).to_string();
        assert!(msg.contains("404"), "Expected '404' in: {msg}");
    }

    #[test]
    fn test_extraction_error_names_strategy() {
        let msg = ExtractionError::new(Strategy::InlineScript, "boom").to_string();
        assert_eq!(msg, "inline_script extraction failed: boom");
    }
}
