//! Media fetch collaborator.
//!
//! [`MediaFetcher`] is the seam between the orchestrator and the code that
//! actually moves bytes. [`HttpMediaFetcher`] streams a plain HTTP resource to
//! disk; `YtDlpFetcher` (see `ytdlp`) hands platform pages to `yt-dlp`.

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::Client;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};
use url::Url;

use super::error::DownloadError;
use super::task::ProgressUpdate;
use crate::discovery::BROWSER_USER_AGENT;
use crate::discovery::patterns::is_video_platform;

/// HTTP connect timeout (30 seconds).
pub const CONNECT_TIMEOUT_SECS: u64 = 30;

/// Longest silence tolerated mid-transfer (5 minutes).
pub const READ_TIMEOUT_SECS: u64 = 300;

/// Minimum spacing between progress reports.
const PROGRESS_INTERVAL: Duration = Duration::from_millis(250);

/// Receives progress reports from a fetcher.
pub type ProgressCallback = Arc<dyn Fn(ProgressUpdate) + Send + Sync>;

/// Retrieves one media resource to a local path.
#[async_trait]
pub trait MediaFetcher: Send + Sync {
    /// Downloads `url` to `output_path`, reporting progress through `progress`.
    ///
    /// Implementations must stop promptly once `cancel` fires and return
    /// [`DownloadError::Cancelled`]. Partial output should be removed on failure.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError`] describing why the transfer did not finish.
    async fn fetch_media(
        &self,
        url: &str,
        output_path: &Path,
        progress: ProgressCallback,
        cancel: CancellationToken,
    ) -> Result<(), DownloadError>;
}

/// Streams HTTP responses straight to disk.
#[derive(Debug, Clone)]
pub struct HttpMediaFetcher {
    client: Client,
}

impl Default for HttpMediaFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpMediaFetcher {
    /// Creates a fetcher with default timeouts (30s connect, 5min read).
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client builder fails with the static configuration.
    /// This should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn new() -> Self {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .read_timeout(Duration::from_secs(READ_TIMEOUT_SECS))
            .gzip(true)
            .user_agent(BROWSER_USER_AGENT)
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
impl MediaFetcher for HttpMediaFetcher {
    #[instrument(level = "debug", skip(self, progress, cancel), fields(path = %output_path.display()))]
    async fn fetch_media(
        &self,
        url: &str,
        output_path: &Path,
        progress: ProgressCallback,
        cancel: CancellationToken,
    ) -> Result<(), DownloadError> {
        let parsed = Url::parse(url).map_err(|_| DownloadError::invalid_url(url))?;

        let response = tokio::select! {
            () = cancel.cancelled() => return Err(DownloadError::cancelled(url)),
            sent = self.client.get(parsed).send() => sent.map_err(|e| DownloadError::network(url, e))?,
        };

        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::http_status(url, status.as_u16()));
        }

        let total_bytes = response.content_length().unwrap_or(0);
        let mut file = File::create(output_path)
            .await
            .map_err(|e| DownloadError::io(output_path, e))?;

        let result = stream_to_file(
            &mut file,
            response,
            url,
            output_path,
            total_bytes,
            &progress,
            &cancel,
        )
        .await;
        drop(file);

        match result {
            Ok(bytes) => {
                debug!(bytes, "media saved");
                Ok(())
            }
            Err(e) => {
                debug!(error = %e, "cleaning up partial file after error");
                let _ = tokio::fs::remove_file(output_path).await;
                Err(e)
            }
        }
    }
}

/// Streams the body to `file`, reporting progress at most every
/// [`PROGRESS_INTERVAL`] plus once at the end. Returns bytes written.
async fn stream_to_file(
    file: &mut File,
    response: reqwest::Response,
    url: &str,
    file_path: &Path,
    total_bytes: u64,
    progress: &ProgressCallback,
    cancel: &CancellationToken,
) -> Result<u64, DownloadError> {
    let mut writer = BufWriter::new(file);
    let mut stream = response.bytes_stream();
    let mut meter = TransferMeter::new(total_bytes);

    loop {
        let next = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(DownloadError::cancelled(url)),
            next = stream.next() => next,
        };
        let Some(chunk) = next else {
            break;
        };
        let chunk = chunk.map_err(|e| DownloadError::network(url, e))?;

        writer
            .write_all(&chunk)
            .await
            .map_err(|e| DownloadError::io(file_path, e))?;

        if let Some(update) = meter.record(chunk.len() as u64) {
            progress(update);
        }
    }

    writer
        .flush()
        .await
        .map_err(|e| DownloadError::io(file_path, e))?;

    progress(meter.finish());
    Ok(meter.downloaded)
}

/// Tracks bytes and derives speed and ETA.
struct TransferMeter {
    started: Instant,
    last_report: Option<Instant>,
    downloaded: u64,
    total: u64,
}

impl TransferMeter {
    fn new(total: u64) -> Self {
        Self {
            started: Instant::now(),
            last_report: None,
            downloaded: 0,
            total,
        }
    }

    /// Adds `bytes`; returns an update when a report is due.
    fn record(&mut self, bytes: u64) -> Option<ProgressUpdate> {
        self.downloaded += bytes;
        let now = Instant::now();
        if self
            .last_report
            .is_some_and(|last| now.duration_since(last) < PROGRESS_INTERVAL)
        {
            return None;
        }
        self.last_report = Some(now);
        Some(self.snapshot(now))
    }

    /// Final report; an unknown total becomes the byte count.
    fn finish(&mut self) -> ProgressUpdate {
        if self.total == 0 {
            self.total = self.downloaded;
        }
        self.snapshot(Instant::now())
    }

    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn snapshot(&self, now: Instant) -> ProgressUpdate {
        let elapsed = now.duration_since(self.started).as_secs_f64();
        let speed = (elapsed > 0.0).then(|| self.downloaded as f64 / elapsed);
        let eta = match speed {
            Some(speed) if speed > 0.0 && self.total > self.downloaded => {
                Some(((self.total - self.downloaded) as f64 / speed).ceil() as u64)
            }
            Some(_) if self.total > 0 && self.total <= self.downloaded => Some(0),
            _ => None,
        };
        ProgressUpdate {
            downloaded_bytes: self.downloaded,
            total_bytes: self.total,
            speed_bytes_per_sec: speed,
            eta_seconds: eta,
        }
    }
}

/// Sends platform-hosted URLs to one fetcher and everything else to another.
#[derive(Clone)]
pub struct RoutingFetcher {
    direct: Arc<dyn MediaFetcher>,
    platform: Arc<dyn MediaFetcher>,
}

impl RoutingFetcher {
    /// `platform` handles URLs on a known video platform, `direct` the rest.
    pub fn new(direct: Arc<dyn MediaFetcher>, platform: Arc<dyn MediaFetcher>) -> Self {
        Self { direct, platform }
    }

    fn route(&self, url: &str) -> &Arc<dyn MediaFetcher> {
        match Url::parse(url) {
            Ok(parsed) if is_video_platform(&parsed) => &self.platform,
            _ => &self.direct,
        }
    }
}

#[async_trait]
impl MediaFetcher for RoutingFetcher {
    async fn fetch_media(
        &self,
        url: &str,
        output_path: &Path,
        progress: ProgressCallback,
        cancel: CancellationToken,
    ) -> Result<(), DownloadError> {
        self.route(url)
            .fetch_media(url, output_path, progress, cancel)
            .await
    }
}
