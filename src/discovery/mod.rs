//! Media discovery: fetch a page, extract candidates, deduplicate, validate.
//!
//! # Overview
//!
//! [`DiscoveryEngine::discover`] composes the pieces:
//!
//! 1. normalize the seed URL ([`normalize_seed_url`])
//! 2. fetch the page through a [`PageFetcher`]
//! 3. run all seven extraction strategies ([`strategy::extract_candidates`])
//! 4. deduplicate by URL ([`deduplicate`])
//! 5. probe the survivors concurrently ([`ReachabilityValidator`])
//!
//! Nothing here aborts a batch: failures shrink the result set and are logged.

mod error;
mod fetcher;
pub mod patterns;
pub mod strategy;
mod validator;

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use futures_util::stream;
use tracing::{info, instrument, warn};
use url::Url;

pub use error::{DiscoveryError, ExtractionError};
pub use fetcher::{BROWSER_USER_AGENT, FetchedPage, HttpPageFetcher, PageFetcher, ProbeResponse};
pub use validator::{ReachabilityValidator, is_acceptable};

use crate::config::{ConfigError, HarvesterConfig};
use crate::media::MediaRef;

/// Multi-strategy media discovery over one or many seed pages.
pub struct DiscoveryEngine {
    fetcher: Arc<dyn PageFetcher>,
    validator: ReachabilityValidator,
    workers: usize,
    fetch_timeout: Duration,
}

impl DiscoveryEngine {
    /// Creates an engine around `fetcher`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if `config` is invalid.
    pub fn new(fetcher: Arc<dyn PageFetcher>, config: &HarvesterConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            validator: ReachabilityValidator::new(
                Arc::clone(&fetcher),
                config.discovery_workers,
                config.validation_timeout,
            ),
            fetcher,
            workers: config.discovery_workers,
            fetch_timeout: config.fetch_timeout,
        })
    }

    /// Creates an engine backed by [`HttpPageFetcher`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if `config` is invalid.
    pub fn with_http(config: &HarvesterConfig) -> Result<Self, ConfigError> {
        Self::new(Arc::new(HttpPageFetcher::new()), config)
    }

    /// Discovers media on one page, surfacing the fetch failure to the caller.
    ///
    /// # Errors
    ///
    /// Returns [`DiscoveryError`] if the seed is not a usable URL or the page
    /// cannot be fetched. Strategy and probe failures are never errors.
    #[instrument(skip(self), fields(seed = %seed))]
    pub async fn try_discover(&self, seed: &str) -> Result<Vec<MediaRef>, DiscoveryError> {
        let url = normalize_seed_url(seed)?;
        info!(url = %url, "discovering media");

        let page = tokio::time::timeout(
            self.fetch_timeout,
            self.fetcher.fetch_page(&url, self.fetch_timeout),
        )
        .await
        .map_err(|_| DiscoveryError::timeout(url.as_str()))??;

        let candidates = strategy::extract_candidates(&page.body, &page.final_url);
        let found = candidates.len();
        let unique = deduplicate(candidates);
        let unique_count = unique.len();

        let validated = self.validator.validate(unique).await;
        info!(
            url = %page.final_url,
            found,
            unique = unique_count,
            validated = validated.len(),
            "discovery finished"
        );
        Ok(validated)
    }

    /// Discovers media on one page. A fetch failure is logged and yields an
    /// empty list.
    pub async fn discover(&self, seed: &str) -> Vec<MediaRef> {
        match self.try_discover(seed).await {
            Ok(media) => media,
            Err(e) => {
                warn!(seed, error = %e, "discovery failed");
                Vec::new()
            }
        }
    }

    /// Discovers across several seeds, at most `discovery_workers` pages at a
    /// time, deduplicating across pages. Per-page failures are logged and skipped.
    #[instrument(skip_all)]
    pub async fn discover_many<I, S>(&self, seeds: I) -> Vec<MediaRef>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let seeds: Vec<String> = seeds.into_iter().map(Into::into).collect();
        let pages = seeds.len();

        let engine = self;
        let results: Vec<Vec<MediaRef>> = stream::iter(seeds)
            .map(move |seed| async move { engine.discover(&seed).await })
            .buffer_unordered(self.workers)
            .collect()
            .await;

        let merged = deduplicate(results.into_iter().flatten().collect());
        info!(pages, total = merged.len(), "multi-page discovery finished");
        merged
    }
}

/// Trims the seed and prefixes `https://` when no scheme is present.
///
/// # Errors
///
/// Returns [`DiscoveryError::InvalidUrl`] if the result is not an HTTP(S) URL.
pub fn normalize_seed_url(seed: &str) -> Result<Url, DiscoveryError> {
    let trimmed = seed.trim();
    if trimmed.is_empty() {
        return Err(DiscoveryError::invalid_url(seed));
    }

    let lowered = trimmed.to_ascii_lowercase();
    let candidate = if lowered.starts_with("http://") || lowered.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    };

    let url = Url::parse(&candidate).map_err(|_| DiscoveryError::invalid_url(seed))?;
    if url.host().is_none() {
        return Err(DiscoveryError::invalid_url(seed));
    }
    Ok(url)
}

/// Removes entries whose URL was already seen, keeping the first occurrence
/// (and with it the first strategy attribution).
#[must_use]
pub fn deduplicate(media: Vec<MediaRef>) -> Vec<MediaRef> {
    let mut seen = HashSet::with_capacity(media.len());
    media
        .into_iter()
        .filter(|m| seen.insert(m.url().to_string()))
        .collect()
}
