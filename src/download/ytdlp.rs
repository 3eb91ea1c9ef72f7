//! `yt-dlp` backed media fetcher.
//!
//! Platform pages (iframe embeds, player URLs) are not plain files, so this
//! fetcher delegates to an external `yt-dlp` process and turns its `--newline`
//! progress lines into [`ProgressUpdate`]s.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, trace};

use super::error::DownloadError;
use super::fetcher::{MediaFetcher, ProgressCallback};
use super::task::ProgressUpdate;

const PROGRAM_NAME: &str = "yt-dlp";

/// Default format selector: best single-file MP4, else best available.
pub const DEFAULT_FORMAT: &str = "best[ext=mp4]/best";

/// `[download]  12.5% of ~ 310.04MiB at  374.36KiB/s ETA 11:59`
#[allow(clippy::expect_used)]
static PROGRESS_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\[download\]\s+(\d+\.?\d*)%\s+of\s+~?\s*(\d+\.?\d*\s*\w+)\s+at\s+(\d+\.?\d*\s*\w+/s)(?:\s+ETA\s+(\S+))?",
    )
    .expect("yt-dlp progress regex is valid") // Static pattern, safe to panic
});

/// Runs `yt-dlp` for each download.
#[derive(Debug, Clone)]
pub struct YtDlpFetcher {
    program: PathBuf,
    format: String,
}

impl Default for YtDlpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl YtDlpFetcher {
    /// Uses `yt-dlp` from `PATH` with [`DEFAULT_FORMAT`].
    #[must_use]
    pub fn new() -> Self {
        Self {
            program: PathBuf::from(PROGRAM_NAME),
            format: DEFAULT_FORMAT.to_string(),
        }
    }

    /// Uses a specific executable.
    #[must_use]
    pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = program.into();
        self
    }

    /// Overrides the `-f` format selector.
    #[must_use]
    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = format.into();
        self
    }

    fn command(&self, url: &str, output_path: &Path) -> Command {
        let mut command = Command::new(&self.program);
        command
            .arg("-f")
            .arg(&self.format)
            .args(["--no-playlist", "--newline", "--no-update", "--force-overwrites"])
            .arg("-o")
            .arg(output_path)
            .arg("--")
            .arg(url)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        command
    }
}

#[async_trait]
impl MediaFetcher for YtDlpFetcher {
    #[instrument(level = "debug", skip(self, progress, cancel), fields(path = %output_path.display()))]
    async fn fetch_media(
        &self,
        url: &str,
        output_path: &Path,
        progress: ProgressCallback,
        cancel: CancellationToken,
    ) -> Result<(), DownloadError> {
        let mut child = self.command(url, output_path).spawn().map_err(|e| {
            DownloadError::process(PROGRAM_NAME, url, format!("failed to start: {e}"))
        })?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| DownloadError::process(PROGRAM_NAME, url, "stdout not captured"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| DownloadError::process(PROGRAM_NAME, url, "stderr not captured"))?;

        let stderr_task = tokio::spawn(async move {
            let mut lines = BufReader::new(stderr).lines();
            let mut last_error = None;
            while let Ok(Some(line)) = lines.next_line().await {
                trace!(line, "yt-dlp stderr");
                let line = line.trim();
                if line.starts_with("ERROR:") || (last_error.is_none() && !line.is_empty()) {
                    last_error = Some(line.to_string());
                }
            }
            last_error
        });

        let mut lines = BufReader::new(stdout).lines();
        loop {
            let line = tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    let _ = child.kill().await;
                    stderr_task.abort();
                    remove_partial(output_path).await;
                    return Err(DownloadError::cancelled(url));
                }
                line = lines.next_line() => line,
            };
            match line {
                Ok(Some(line)) => {
                    if let Some(update) = parse_progress_line(&line) {
                        progress(update);
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    debug!(error = %e, "stopped reading yt-dlp output");
                    break;
                }
            }
        }

        let status = child
            .wait()
            .await
            .map_err(|e| DownloadError::process(PROGRAM_NAME, url, e.to_string()))?;
        let last_error = stderr_task.await.ok().flatten();

        if status.success() {
            Ok(())
        } else {
            remove_partial(output_path).await;
            let message = last_error.unwrap_or_else(|| status.to_string());
            Err(DownloadError::process(PROGRAM_NAME, url, message))
        }
    }
}

async fn remove_partial(output_path: &Path) {
    let mut part = output_path.as_os_str().to_owned();
    part.push(".part");
    let _ = tokio::fs::remove_file(PathBuf::from(part)).await;
    let _ = tokio::fs::remove_file(output_path).await;
}

/// Parses one `yt-dlp --newline` progress line.
#[must_use]
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn parse_progress_line(line: &str) -> Option<ProgressUpdate> {
    let caps = PROGRESS_PATTERN.captures(line)?;
    let percent: f64 = caps.get(1)?.as_str().parse().ok()?;
    let total_bytes = parse_size(caps.get(2)?.as_str()).unwrap_or(0);
    let downloaded_bytes = (total_bytes as f64 * percent.clamp(0.0, 100.0) / 100.0).round() as u64;
    let speed = caps
        .get(3)
        .and_then(|m| parse_size(m.as_str().trim_end_matches("/s")))
        .map(|bytes| bytes as f64);
    let eta = caps.get(4).and_then(|m| parse_eta(m.as_str()));

    Some(ProgressUpdate {
        downloaded_bytes,
        total_bytes,
        speed_bytes_per_sec: speed,
        eta_seconds: eta,
    })
}

/// Parses sizes like `310.04MiB`, `12KB` or `900B` into bytes.
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
fn parse_size(raw: &str) -> Option<u64> {
    let raw = raw.trim();
    let split = raw
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(raw.len());
    let (number, unit) = raw.split_at(split);
    let value: f64 = number.parse().ok()?;
    let multiplier: f64 = match unit.trim() {
        "" | "B" => 1.0,
        "KiB" => 1024.0,
        "MiB" => 1024.0 * 1024.0,
        "GiB" => 1024.0 * 1024.0 * 1024.0,
        "TiB" => 1024.0 * 1024.0 * 1024.0 * 1024.0,
        "KB" | "kB" => 1e3,
        "MB" => 1e6,
        "GB" => 1e9,
        "TB" => 1e12,
        _ => return None,
    };
    Some((value * multiplier).round() as u64)
}

/// Parses `SS`, `MM:SS` or `HH:MM:SS`.
fn parse_eta(raw: &str) -> Option<u64> {
    raw.split(':').try_fold(0_u64, |acc, part| {
        part.parse::<u64>().ok().map(|n| acc * 60 + n)
    })
}
