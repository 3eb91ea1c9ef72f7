//! Bounded concurrent reachability validation.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use super::fetcher::{PageFetcher, ProbeResponse};
use crate::media::MediaRef;

/// Probes candidates with at most `workers` requests in flight.
///
/// The permit pool is shared by every call on the same validator, so
/// concurrent discoveries (see `discover_many`) stay within one ceiling.
pub struct ReachabilityValidator {
    fetcher: Arc<dyn PageFetcher>,
    semaphore: Arc<Semaphore>,
    timeout: Duration,
}

impl ReachabilityValidator {
    /// Creates a validator. `workers` must be at least 1 (validated by the caller).
    #[must_use]
    pub fn new(fetcher: Arc<dyn PageFetcher>, workers: usize, timeout: Duration) -> Self {
        Self {
            fetcher,
            semaphore: Arc::new(Semaphore::new(workers)),
            timeout,
        }
    }

    /// Probes every candidate and keeps the acceptable ones.
    ///
    /// Results come back in probe-completion order. A probe error or a
    /// crashed probe task drops that candidate only.
    pub async fn validate(&self, candidates: Vec<MediaRef>) -> Vec<MediaRef> {
        let total = candidates.len();
        let mut probes = JoinSet::new();

        for candidate in candidates {
            // Blocks while all workers are busy
            let Ok(permit) = Arc::clone(&self.semaphore).acquire_owned().await else {
                warn!("validation pool closed, dropping remaining candidates");
                break;
            };

            let fetcher = Arc::clone(&self.fetcher);
            let timeout = self.timeout;
            probes.spawn(async move {
                let _permit = permit;
                check(fetcher.as_ref(), candidate, timeout).await
            });
        }

        let mut accepted = Vec::with_capacity(total);
        while let Some(joined) = probes.join_next().await {
            match joined {
                Ok(Some(media)) => accepted.push(media),
                Ok(None) => {}
                Err(e) => warn!(error = %e, "validation probe task failed"),
            }
        }

        debug!(total, accepted = accepted.len(), "validation finished");
        accepted
    }
}

async fn check(fetcher: &dyn PageFetcher, candidate: MediaRef, timeout: Duration) -> Option<MediaRef> {
    let probe = match tokio::time::timeout(timeout, fetcher.probe(candidate.url(), timeout)).await {
        Ok(Ok(probe)) => probe,
        Ok(Err(e)) => {
            debug!(url = candidate.url(), error = %e, "probe failed");
            return None;
        }
        Err(_) => {
            debug!(url = candidate.url(), "probe timed out");
            return None;
        }
    };

    if is_acceptable(&probe, &candidate) {
        Some(candidate.with_probe_metadata(probe.content_type, probe.content_length))
    } else {
        debug!(
            url = candidate.url(),
            status = probe.status,
            content_type = probe.content_type.as_deref().unwrap_or(""),
            "candidate rejected"
        );
        None
    }
}

/// A candidate survives when the probe answered 200 and either the content type
/// signals video/stream or the candidate already has a known file type.
#[must_use]
pub fn is_acceptable(probe: &ProbeResponse, candidate: &MediaRef) -> bool {
    probe.status == 200 && (probe.signals_video() || candidate.file_type().is_known())
}
