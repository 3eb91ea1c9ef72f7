//! Progress observer protocol.
//!
//! The orchestrator is the only caller. Callbacks run synchronously while the
//! task registry is locked, so handlers must stay cheap and must not call back
//! into the orchestrator.

use tracing::{debug, info, warn};

use super::task::{DownloadTask, TaskStatus};

/// Receives task lifecycle and progress events.
///
/// Every method has a no-op default so sinks implement only what they need.
pub trait ProgressObserver: Send + Sync {
    /// Progress changed for a downloading task.
    fn on_progress(&self, task: &DownloadTask) {
        let _ = task;
    }

    /// A task finished successfully.
    fn on_complete(&self, task: &DownloadTask) {
        let _ = task;
    }

    /// A task failed; fired exactly once per failure.
    fn on_error(&self, task: &DownloadTask, message: &str) {
        let _ = (task, message);
    }

    /// A task moved from `old` to `new`. `task` already reflects `new`.
    fn on_status_change(&self, task: &DownloadTask, old: TaskStatus, new: TaskStatus) {
        let _ = (task, old, new);
    }
}

/// Observer that ignores every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl ProgressObserver for NoopObserver {}

/// Observer that forwards events to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl ProgressObserver for TracingObserver {
    fn on_progress(&self, task: &DownloadTask) {
        debug!(
            task = %task.id(),
            percent = task.progress_percent(),
            downloaded = task.downloaded_bytes(),
            total = task.total_bytes(),
            "download progress"
        );
    }

    fn on_complete(&self, task: &DownloadTask) {
        info!(
            task = %task.id(),
            path = %task.output_path().map(|p| p.display().to_string()).unwrap_or_default(),
            "download completed"
        );
    }

    fn on_error(&self, task: &DownloadTask, message: &str) {
        warn!(task = %task.id(), url = task.media().url(), error = message, "download failed");
    }

    fn on_status_change(&self, task: &DownloadTask, old: TaskStatus, new: TaskStatus) {
        debug!(task = %task.id(), %old, %new, "status changed");
    }
}
