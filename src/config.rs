//! Runtime configuration shared by the discovery engine and the orchestrator.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Minimum allowed worker / concurrency value.
pub const MIN_CONCURRENCY: usize = 1;

/// Maximum allowed worker / concurrency value.
pub const MAX_CONCURRENCY: usize = 100;

/// Default number of simultaneous downloads.
pub const DEFAULT_MAX_CONCURRENT_DOWNLOADS: usize = 3;

/// Default width of the discovery validation pool.
pub const DEFAULT_DISCOVERY_WORKERS: usize = 5;

/// Default page fetch timeout in seconds.
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 30;

/// Default reachability probe timeout in seconds.
pub const DEFAULT_VALIDATION_TIMEOUT_SECS: u64 = 10;

/// Default grace period before a cancelled download's slot is force-freed.
pub const DEFAULT_CANCEL_GRACE_SECS: u64 = 5;

const MAX_TIMEOUT_SECS: u64 = 3600;

/// Invalid configuration. These are the only fatal errors in the library.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A worker or concurrency count is out of range.
    #[error("invalid {field} value {value}: must be between {MIN_CONCURRENCY} and {MAX_CONCURRENCY}")]
    OutOfRange {
        /// Name of the offending field.
        field: &'static str,
        /// The rejected value.
        value: usize,
    },

    /// A timeout is zero or unreasonably large.
    #[error("invalid {field} value {secs}s: must be between 1 and {MAX_TIMEOUT_SECS} seconds")]
    InvalidTimeout {
        /// Name of the offending field.
        field: &'static str,
        /// The rejected value in seconds.
        secs: u64,
    },
}

/// Configuration surface for discovery and downloading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarvesterConfig {
    /// Ceiling on tasks in the downloading state.
    pub max_concurrent_downloads: usize,
    /// Where finished files land; created if absent.
    pub download_folder: PathBuf,
    /// Width of the validation / multi-page discovery pool.
    pub discovery_workers: usize,
    /// Timeout for fetching a seed page.
    pub fetch_timeout: Duration,
    /// Timeout for each reachability probe.
    pub validation_timeout: Duration,
    /// How long a cancelled download may keep its slot before it is force-freed.
    pub cancel_grace: Duration,
}

impl Default for HarvesterConfig {
    fn default() -> Self {
        Self {
            max_concurrent_downloads: DEFAULT_MAX_CONCURRENT_DOWNLOADS,
            download_folder: default_download_folder(),
            discovery_workers: DEFAULT_DISCOVERY_WORKERS,
            fetch_timeout: Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS),
            validation_timeout: Duration::from_secs(DEFAULT_VALIDATION_TIMEOUT_SECS),
            cancel_grace: Duration::from_secs(DEFAULT_CANCEL_GRACE_SECS),
        }
    }
}

impl HarvesterConfig {
    /// Validates every field.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_count("max_concurrent_downloads", self.max_concurrent_downloads)?;
        validate_count("discovery_workers", self.discovery_workers)?;
        validate_timeout("fetch_timeout", self.fetch_timeout)?;
        validate_timeout("validation_timeout", self.validation_timeout)?;
        validate_timeout("cancel_grace", self.cancel_grace)?;
        Ok(())
    }
}

/// `~/Downloads/BulkVideos`, or `./downloads` when no home directory is known.
#[must_use]
pub fn default_download_folder() -> PathBuf {
    std::env::var_os("HOME")
        .filter(|home| !home.is_empty())
        .map_or_else(
            || PathBuf::from("downloads"),
            |home| PathBuf::from(home).join("Downloads").join("BulkVideos"),
        )
}

pub(crate) fn validate_count(field: &'static str, value: usize) -> Result<(), ConfigError> {
    if (MIN_CONCURRENCY..=MAX_CONCURRENCY).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange { field, value })
    }
}

fn validate_timeout(field: &'static str, timeout: Duration) -> Result<(), ConfigError> {
    let secs = timeout.as_secs();
    if timeout.is_zero() || secs > MAX_TIMEOUT_SECS {
        return Err(ConfigError::InvalidTimeout { field, secs });
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = HarvesterConfig::default();
        assert_eq!(config.max_concurrent_downloads, 3);
        assert_eq!(config.discovery_workers, 5);
        assert_eq!(config.validation_timeout, Duration::from_secs(10));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        let config = HarvesterConfig {
            max_concurrent_downloads: 0,
            ..HarvesterConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::OutOfRange {
                field: "max_concurrent_downloads",
                value: 0
            })
        );
    }

    #[test]
    fn test_zero_workers_rejected() {
        let config = HarvesterConfig {
            discovery_workers: 0,
            ..HarvesterConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::OutOfRange {
                field: "discovery_workers",
                ..
            })
        ));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let config = HarvesterConfig {
            fetch_timeout: Duration::ZERO,
            ..HarvesterConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("fetch_timeout"));
    }

    #[test]
    fn test_zero_cancel_grace_rejected() {
        let config = HarvesterConfig {
            cancel_grace: Duration::ZERO,
            ..HarvesterConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::InvalidTimeout {
                field: "cancel_grace",
                secs: 0,
            })
        );

        let sub_second = HarvesterConfig {
            cancel_grace: Duration::from_millis(200),
            ..HarvesterConfig::default()
        };
        assert!(sub_second.validate().is_ok());
    }

    #[test]
    fn test_error_display_mentions_bounds() {
        let msg = ConfigError::OutOfRange {
            field: "discovery_workers",
            value: 101,
        }
        .to_string();
        assert!(msg.contains("101"));
        assert!(msg.contains("100"));
    }
}
