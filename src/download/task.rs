//! Download task records and their state machine.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::media::MediaRef;

/// Opaque task identifier. Ids are assigned in enqueue order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct TaskId(u64);

impl TaskId {
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Lifecycle state of a download task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Waiting for a slot.
    Pending,
    /// Holding a slot; bytes are moving.
    Downloading,
    /// Interrupted by pause; re-admitted on resume.
    Paused,
    /// Finished successfully.
    Completed,
    /// The fetch collaborator reported an error.
    Failed,
    /// Stopped or removed.
    Cancelled,
}

impl TaskStatus {
    /// Returns the lowercase status name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Downloading => "downloading",
            Self::Paused => "paused",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }

    /// `Completed`, `Failed` and `Cancelled` accept no further transitions.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }

    /// Whether `self -> next` is a legal transition.
    #[must_use]
    pub fn can_transition_to(&self, next: TaskStatus) -> bool {
        use TaskStatus::{Cancelled, Completed, Downloading, Failed, Paused, Pending};
        matches!(
            (self, next),
            (Pending | Paused, Downloading)
                | (Downloading, Paused | Completed | Failed)
                | (Pending | Downloading | Paused, Cancelled)
        )
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Progress report from a fetch collaborator.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ProgressUpdate {
    /// Bytes written so far.
    pub downloaded_bytes: u64,
    /// Expected size; `0` means unknown.
    pub total_bytes: u64,
    /// Current transfer rate, if measured.
    pub speed_bytes_per_sec: Option<f64>,
    /// Estimated seconds remaining, if known.
    pub eta_seconds: Option<u64>,
}

impl ProgressUpdate {
    /// Completion percentage, or `None` when the total size is unknown.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn percent(&self) -> Option<f64> {
        if self.total_bytes == 0 {
            return None;
        }
        let ratio = self.downloaded_bytes as f64 / self.total_bytes as f64;
        Some((ratio * 100.0).clamp(0.0, 100.0))
    }
}

/// One unit of scheduled work.
///
/// Only the orchestrator mutates tasks; callers receive snapshots.
#[derive(Debug, Clone, Serialize)]
pub struct DownloadTask {
    pub(crate) id: TaskId,
    pub(crate) media: Arc<MediaRef>,
    pub(crate) status: TaskStatus,
    pub(crate) progress_percent: f64,
    pub(crate) downloaded_bytes: u64,
    pub(crate) total_bytes: u64,
    pub(crate) speed_bytes_per_sec: Option<f64>,
    pub(crate) eta_seconds: Option<u64>,
    pub(crate) error_message: Option<String>,
    pub(crate) started_at: Option<DateTime<Utc>>,
    pub(crate) finished_at: Option<DateTime<Utc>>,
    pub(crate) output_path: Option<PathBuf>,
}

impl DownloadTask {
    pub(crate) fn new(id: TaskId, media: Arc<MediaRef>) -> Self {
        Self {
            id,
            media,
            status: TaskStatus::Pending,
            progress_percent: 0.0,
            downloaded_bytes: 0,
            total_bytes: 0,
            speed_bytes_per_sec: None,
            eta_seconds: None,
            error_message: None,
            started_at: None,
            finished_at: None,
            output_path: None,
        }
    }

    #[must_use]
    pub fn id(&self) -> TaskId {
        self.id
    }

    /// The media this task downloads.
    #[must_use]
    pub fn media(&self) -> &MediaRef {
        &self.media
    }

    #[must_use]
    pub fn status(&self) -> TaskStatus {
        self.status
    }

    /// 0.0 to 100.0; never decreases within one downloading episode.
    #[must_use]
    pub fn progress_percent(&self) -> f64 {
        self.progress_percent
    }

    #[must_use]
    pub fn downloaded_bytes(&self) -> u64 {
        self.downloaded_bytes
    }

    /// Expected size; `0` means unknown.
    #[must_use]
    pub fn total_bytes(&self) -> u64 {
        self.total_bytes
    }

    #[must_use]
    pub fn speed_bytes_per_sec(&self) -> Option<f64> {
        self.speed_bytes_per_sec
    }

    #[must_use]
    pub fn eta_seconds(&self) -> Option<u64> {
        self.eta_seconds
    }

    /// Set only when the task failed.
    #[must_use]
    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    #[must_use]
    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    #[must_use]
    pub fn finished_at(&self) -> Option<DateTime<Utc>> {
        self.finished_at
    }

    /// Computed on the first transition into downloading.
    #[must_use]
    pub fn output_path(&self) -> Option<&Path> {
        self.output_path.as_deref()
    }

    /// Clears per-episode progress. Percent restarts at zero only when coming
    /// from pending; a resumed task keeps its previous high-water mark.
    pub(crate) fn begin_episode(&mut self, from: TaskStatus) {
        if from == TaskStatus::Pending {
            self.progress_percent = 0.0;
            self.downloaded_bytes = 0;
            self.total_bytes = 0;
        }
        self.speed_bytes_per_sec = None;
        self.eta_seconds = None;
        if self.started_at.is_none() {
            self.started_at = Some(Utc::now());
        }
    }

    /// Folds a progress report into the task, keeping percent non-decreasing.
    pub(crate) fn apply_progress(&mut self, update: &ProgressUpdate) {
        self.downloaded_bytes = update.downloaded_bytes;
        self.total_bytes = update.total_bytes;
        self.speed_bytes_per_sec = update.speed_bytes_per_sec;
        self.eta_seconds = update.eta_seconds;
        if let Some(percent) = update.percent() {
            self.progress_percent = self.progress_percent.max(percent);
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::media::{FileType, Strategy};

    fn task() -> DownloadTask {
        let media = MediaRef::new(
            "https://e.com/a.mp4",
            "a",
            FileType::Extension(".mp4".to_string()),
            "https://e.com/",
            Strategy::MediaTag,
        );
        DownloadTask::new(TaskId::new(1), Arc::new(media))
    }

    #[test]
    fn test_transition_table() {
        use TaskStatus::*;
        assert!(Pending.can_transition_to(Downloading));
        assert!(Paused.can_transition_to(Downloading));
        assert!(Downloading.can_transition_to(Paused));
        assert!(Downloading.can_transition_to(Failed));
        assert!(Pending.can_transition_to(Cancelled));
        assert!(!Pending.can_transition_to(Paused));
        assert!(!Pending.can_transition_to(Completed));
        assert!(!Paused.can_transition_to(Completed));
        for terminal in [Completed, Failed, Cancelled] {
            assert!(terminal.is_terminal());
            for next in [Pending, Downloading, Paused, Completed, Failed, Cancelled] {
                assert!(!terminal.can_transition_to(next));
            }
        }
    }

    #[test]
    fn test_progress_percent_unknown_total() {
        let update = ProgressUpdate {
            downloaded_bytes: 10,
            ..ProgressUpdate::default()
        };
        assert_eq!(update.percent(), None);
    }

    #[test]
    fn test_apply_progress_never_decreases_percent() {
        let mut task = task();
        task.apply_progress(&ProgressUpdate {
            downloaded_bytes: 50,
            total_bytes: 100,
            ..ProgressUpdate::default()
        });
        assert!((task.progress_percent() - 50.0).abs() < f64::EPSILON);

        task.apply_progress(&ProgressUpdate {
            downloaded_bytes: 20,
            total_bytes: 100,
            ..ProgressUpdate::default()
        });
        assert!((task.progress_percent() - 50.0).abs() < f64::EPSILON);
        assert_eq!(task.downloaded_bytes(), 20);
    }

    #[test]
    fn test_begin_episode_from_pending_resets_progress() {
        let mut task = task();
        task.progress_percent = 40.0;
        task.begin_episode(TaskStatus::Paused);
        assert!((task.progress_percent() - 40.0).abs() < f64::EPSILON);
        task.begin_episode(TaskStatus::Pending);
        assert!(task.progress_percent().abs() < f64::EPSILON);
        assert!(task.started_at().is_some());
    }

    #[test]
    fn test_task_id_display() {
        assert_eq!(TaskId::new(3).to_string(), "#3");
    }
}
