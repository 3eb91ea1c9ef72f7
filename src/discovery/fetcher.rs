//! Page fetching and reachability probing.
//!
//! The discovery engine only talks to the network through [`PageFetcher`], so
//! tests and alternative transports can swap the HTTP implementation out.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE, HeaderMap};
use tracing::{debug, instrument};
use url::Url;

use super::error::DiscoveryError;

/// Browser User-Agent; many media hosts refuse obvious bot agents.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

/// Connect timeout for the discovery client.
const CONNECT_TIMEOUT_SECS: u64 = 15;

/// A fetched document.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// URL after redirects; relative references resolve against this.
    pub final_url: Url,
    /// Raw document body.
    pub body: String,
}

/// Outcome of a lightweight existence check.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProbeResponse {
    /// HTTP status after redirects.
    pub status: u16,
    /// `Content-Type` header, if present.
    pub content_type: Option<String>,
    /// `Content-Length` header, if present and numeric.
    pub content_length: Option<u64>,
}

impl ProbeResponse {
    /// True when the content type signals video or a byte stream.
    #[must_use]
    pub fn signals_video(&self) -> bool {
        self.content_type.as_deref().is_some_and(|ct| {
            let ct = ct.to_ascii_lowercase();
            ct.contains("video") || ct.contains("stream")
        })
    }
}

/// Network collaborator used by discovery.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetches a page, following redirects.
    ///
    /// # Errors
    ///
    /// Returns [`DiscoveryError`] on network failure, timeout or non-success status.
    async fn fetch_page(&self, url: &Url, timeout: Duration) -> Result<FetchedPage, DiscoveryError>;

    /// Issues a lightweight existence/type check (HEAD) against `url`.
    ///
    /// A non-success status is NOT an error here; it is reported in the response.
    ///
    /// # Errors
    ///
    /// Returns [`DiscoveryError`] when no response was received at all.
    async fn probe(&self, url: &str, timeout: Duration) -> Result<ProbeResponse, DiscoveryError>;
}

/// `reqwest`-backed [`PageFetcher`].
#[derive(Debug, Clone)]
pub struct HttpPageFetcher {
    client: Client,
}

impl Default for HttpPageFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpPageFetcher {
    /// Creates a fetcher with a browser User-Agent and gzip enabled.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client builder fails with the static configuration.
    /// This should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn new() -> Self {
        let client = Client::builder()
            .user_agent(BROWSER_USER_AGENT)
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .gzip(true)
            .build()
            .expect("failed to build HTTP client with static configuration");
        Self { client }
    }

    /// Wraps an existing client (shares its connection pool).
    #[must_use]
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    #[instrument(level = "debug", skip(self), fields(url = %url))]
    async fn fetch_page(&self, url: &Url, timeout: Duration) -> Result<FetchedPage, DiscoveryError> {
        let response = self
            .client
            .get(url.clone())
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| DiscoveryError::fetch(url.as_str(), e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DiscoveryError::http_status(url.as_str(), status.as_u16()));
        }

        let final_url = response.url().clone();
        let body = response
            .text()
            .await
            .map_err(|e| DiscoveryError::fetch(url.as_str(), e))?;

        debug!(final_url = %final_url, bytes = body.len(), "page fetched");
        Ok(FetchedPage { final_url, body })
    }

    async fn probe(&self, url: &str, timeout: Duration) -> Result<ProbeResponse, DiscoveryError> {
        let response = self
            .client
            .head(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| DiscoveryError::fetch(url, e))?;

        let headers = response.headers();
        Ok(ProbeResponse {
            status: response.status().as_u16(),
            content_type: header_str(headers, CONTENT_TYPE),
            content_length: header_str(headers, CONTENT_LENGTH).and_then(|v| v.parse().ok()),
        })
    }
}

fn header_str(headers: &HeaderMap, name: reqwest::header::HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_signals_video_matches_video_and_stream() {
        let probe = |ct: Option<&str>| ProbeResponse {
            status: 200,
            content_type: ct.map(str::to_string),
            content_length: None,
        };
        assert!(probe(Some("video/mp4")).signals_video());
        assert!(probe(Some("application/octet-stream")).signals_video());
        assert!(probe(Some("Video/WebM; codecs=vp9")).signals_video());
        assert!(!probe(Some("text/html; charset=utf-8")).signals_video());
        assert!(!probe(None).signals_video());
    }

    #[test]
    fn test_header_str_filters_empty_values() {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, "  ".parse().unwrap());
        assert_eq!(header_str(&headers, CONTENT_TYPE), None);
        headers.insert(CONTENT_LENGTH, "42".parse().unwrap());
        assert_eq!(header_str(&headers, CONTENT_LENGTH).as_deref(), Some("42"));
    }
}
