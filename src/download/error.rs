//! Error types for the download module.
//!
//! [`DownloadError`] is task-local: it marks one task failed and never
//! touches its siblings. [`OrchestratorError`] covers construction and
//! registry lookups.

use std::path::PathBuf;

use thiserror::Error;

use super::task::TaskId;
use crate::config::ConfigError;

/// Errors reported by a media fetch collaborator.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// Network-level error (DNS resolution, connection refused, TLS errors, etc.)
    #[error("network error downloading {url}: {source}")]
    Network {
        /// The URL that failed to download.
        url: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// Request timed out before completion.
    #[error("timeout downloading {url}")]
    Timeout {
        /// The URL that timed out.
        url: String,
    },

    /// HTTP error response (4xx client errors, 5xx server errors).
    #[error("HTTP {status} downloading {url}")]
    HttpStatus {
        /// The URL that returned an error status.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// File system error during download (create file, write, etc.)
    #[error("IO error writing to {path}: {source}")]
    Io {
        /// The file path where the error occurred.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The provided URL is malformed or invalid.
    #[error("invalid URL: {url}")]
    InvalidUrl {
        /// The invalid URL string.
        url: String,
    },

    /// The transfer was aborted through its cancellation token.
    #[error("download cancelled: {url}")]
    Cancelled {
        /// The URL whose transfer was aborted.
        url: String,
    },

    /// An external downloader process failed.
    #[error("{program} failed for {url}: {message}")]
    Process {
        /// Program name.
        program: &'static str,
        /// The URL being fetched.
        url: String,
        /// Exit status or the last error line the process printed.
        message: String,
    },

    /// Any other failure, reported verbatim.
    #[error("{message}")]
    Other {
        /// Failure reason.
        message: String,
    },
}

impl DownloadError {
    /// Creates a network error from a reqwest error, mapping timeouts to [`DownloadError::Timeout`].
    pub fn network(url: impl Into<String>, source: reqwest::Error) -> Self {
        if source.is_timeout() {
            return Self::Timeout { url: url.into() };
        }
        Self::Network {
            url: url.into(),
            source,
        }
    }

    /// Creates an HTTP status error.
    pub fn http_status(url: impl Into<String>, status: u16) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
        }
    }

    /// Creates a timeout error.
    pub fn timeout(url: impl Into<String>) -> Self {
        Self::Timeout { url: url.into() }
    }

    /// Creates an IO error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Creates an invalid URL error.
    pub fn invalid_url(url: impl Into<String>) -> Self {
        Self::InvalidUrl { url: url.into() }
    }

    /// Creates a cancellation error.
    pub fn cancelled(url: impl Into<String>) -> Self {
        Self::Cancelled { url: url.into() }
    }

    /// Creates an external process error.
    pub fn process(program: &'static str, url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Process {
            program,
            url: url.into(),
            message: message.into(),
        }
    }

    /// Creates a plain failure carrying only a reason.
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
        }
    }

    /// True if this error came from cancellation rather than a real failure.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }
}

/// Errors raised by the orchestrator itself.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// The concurrency ceiling is outside the accepted range.
    #[error("invalid max_concurrent_downloads {value}: must be between 1 and 100")]
    InvalidConcurrency {
        /// The rejected value.
        value: usize,
    },

    /// Some other configuration value is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The download folder could not be created.
    #[error("cannot create download folder {path}: {source}")]
    DownloadFolder {
        /// The folder that could not be created.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The orchestrator was built outside a Tokio runtime.
    #[error("download orchestrator must be created inside a Tokio runtime")]
    NoRuntime,

    /// No task with this id is registered.
    #[error("task {0} not found")]
    TaskNotFound(TaskId),
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_download_error_timeout_display() {
        let error = DownloadError::timeout("https://example.com/clip.mp4");
        assert!(error.to_string().contains("timeout"));
        assert!(error.to_string().contains("https://example.com/clip.mp4"));
    }

    #[test]
    fn test_download_error_http_status_display() {
        let error = DownloadError::http_status("https://example.com/clip.mp4", 404);
        let msg = error.to_string();
        assert!(msg.contains("404"), "Expected '404' in: {msg}");
        assert!(
            msg.contains("https://example.com/clip.mp4"),
            "Expected URL in: {msg}"
        );
    }

    #[test]
    fn test_download_error_io_display() {
        let io_error = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let error = DownloadError::io(PathBuf::from("/tmp/clip.mp4"), io_error);
        let msg = error.to_string();
        assert!(msg.contains("/tmp/clip.mp4"), "Expected path in: {msg}");
    }

    #[test]
    fn test_download_error_process_display() {
        let error = DownloadError::process("yt-dlp", "https://example.com/v", "exit status 1");
        assert_eq!(
            error.to_string(),
            "yt-dlp failed for https://example.com/v: exit status 1"
        );
    }

    #[test]
    fn test_other_displays_message_verbatim() {
        assert_eq!(DownloadError::other("connection reset").to_string(), "connection reset");
    }

    #[test]
    fn test_is_cancelled() {
        assert!(DownloadError::cancelled("u").is_cancelled());
        assert!(!DownloadError::timeout("u").is_cancelled());
    }

    #[test]
    fn test_task_not_found_display() {
        let msg = OrchestratorError::TaskNotFound(TaskId::new(7)).to_string();
        assert_eq!(msg, "task #7 not found");
    }
}
