//! Bounded-concurrency download scheduling.
//!
//! The orchestrator owns a mutex-guarded registry of tasks. Every state
//! change (admission, completion, pause, stop, removal) happens under that
//! lock, followed by a scheduler step that admits waiting tasks while slots
//! are free. Transfers run on spawned Tokio tasks and only touch the registry
//! through short critical sections, so bookkeeping never waits on I/O.
//!
//! # Slots
//!
//! A slot is held by a running worker. Cancelling a worker (pause, stop,
//! remove) does not free its slot immediately: the slot is released when the
//! fetcher returns, or after the configured grace period, whichever comes
//! first. The number of downloading tasks is therefore always at most the
//! number of held slots, which never exceeds `max_concurrent_downloads`.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use tokio::runtime::Handle;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::error::{DownloadError, OrchestratorError};
use super::fetcher::{MediaFetcher, ProgressCallback};
use super::filename::{output_file_name, resolve_unique_path};
use super::observer::ProgressObserver;
use super::task::{DownloadTask, ProgressUpdate, TaskId, TaskStatus};
use crate::config::{HarvesterConfig, MAX_CONCURRENCY, MIN_CONCURRENCY};
use crate::media::MediaRef;

/// Aggregate registry counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct DownloadStats {
    pub total: usize,
    pub pending: usize,
    pub active: usize,
    pub paused: usize,
    pub completed: usize,
    pub failed: usize,
    pub cancelled: usize,
    /// Mean progress over all tasks, 0 when empty.
    pub overall_progress: f64,
}

/// Identifies one worker run; a task gets a fresh worker on every admission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct WorkerId(u64);

struct TaskEntry {
    task: DownloadTask,
    worker: Option<WorkerId>,
    cancel: Option<CancellationToken>,
}

struct Slot {
    task_id: TaskId,
    handle: Option<JoinHandle<()>>,
    grace: Option<JoinHandle<()>>,
}

#[derive(Default)]
struct Registry {
    /// Ordered by id, which is enqueue order.
    tasks: BTreeMap<TaskId, TaskEntry>,
    slots: HashMap<WorkerId, Slot>,
    next_task: u64,
    next_worker: u64,
    running: bool,
    paused: bool,
}

impl Registry {
    fn snapshot<F>(&self, filter: F) -> Vec<DownloadTask>
    where
        F: Fn(&DownloadTask) -> bool,
    {
        self.tasks
            .values()
            .map(|entry| &entry.task)
            .filter(|task| filter(task))
            .cloned()
            .collect()
    }

    /// First task eligible for admission: paused tasks before pending ones,
    /// each in enqueue order.
    ///
    /// While the oldest paused task's previous worker still holds a slot,
    /// nothing is eligible. Freeing that slot reschedules.
    fn next_admissible(&self) -> Option<TaskId> {
        let first_with = |status: TaskStatus| {
            self.tasks
                .iter()
                .find(|(_, entry)| entry.task.status == status)
                .map(|(id, _)| *id)
        };
        match first_with(TaskStatus::Paused) {
            Some(id) => (!self.holds_slot(id)).then_some(id),
            None => first_with(TaskStatus::Pending),
        }
    }

    fn holds_slot(&self, id: TaskId) -> bool {
        self.slots.values().any(|slot| slot.task_id == id)
    }

    #[allow(clippy::cast_precision_loss)]
    fn overall_progress(&self) -> f64 {
        if self.tasks.is_empty() {
            return 0.0;
        }
        let sum: f64 = self.tasks.values().map(|e| e.task.progress_percent).sum();
        sum / self.tasks.len() as f64
    }
}

struct Inner {
    max_concurrent: usize,
    download_folder: PathBuf,
    cancel_grace: Duration,
    fetcher: Arc<dyn MediaFetcher>,
    observer: Arc<dyn ProgressObserver>,
    registry: Mutex<Registry>,
    runtime: Handle,
    idle: Notify,
}

/// Schedules downloads under a concurrency ceiling.
///
/// Cheap to clone; clones share the same registry. Created stopped: call
/// [`start`](Self::start) to begin admitting tasks.
#[derive(Clone)]
pub struct DownloadOrchestrator {
    inner: Arc<Inner>,
}

impl DownloadOrchestrator {
    /// Creates an orchestrator. Must be called inside a Tokio runtime.
    ///
    /// # Errors
    ///
    /// - [`OrchestratorError::InvalidConcurrency`] if the ceiling is out of range
    /// - [`OrchestratorError::Config`] if any other setting is invalid
    /// - [`OrchestratorError::DownloadFolder`] if the folder cannot be created
    /// - [`OrchestratorError::NoRuntime`] outside a Tokio runtime
    pub fn new(
        config: &HarvesterConfig,
        fetcher: Arc<dyn MediaFetcher>,
        observer: Arc<dyn ProgressObserver>,
    ) -> Result<Self, OrchestratorError> {
        let max_concurrent = config.max_concurrent_downloads;
        if !(MIN_CONCURRENCY..=MAX_CONCURRENCY).contains(&max_concurrent) {
            return Err(OrchestratorError::InvalidConcurrency {
                value: max_concurrent,
            });
        }
        config.validate()?;

        let runtime = Handle::try_current().map_err(|_| OrchestratorError::NoRuntime)?;

        std::fs::create_dir_all(&config.download_folder).map_err(|source| {
            OrchestratorError::DownloadFolder {
                path: config.download_folder.clone(),
                source,
            }
        })?;

        debug!(
            max_concurrent,
            folder = %config.download_folder.display(),
            "download orchestrator created"
        );

        Ok(Self {
            inner: Arc::new(Inner {
                max_concurrent,
                download_folder: config.download_folder.clone(),
                cancel_grace: config.cancel_grace,
                fetcher,
                observer,
                registry: Mutex::new(Registry::default()),
                runtime,
                idle: Notify::new(),
            }),
        })
    }

    /// Folder downloads are written to.
    #[must_use]
    pub fn download_folder(&self) -> &Path {
        &self.inner.download_folder
    }

    /// Starts (or restarts) admission and fills free slots.
    pub fn start(&self) {
        let mut registry = self.inner.lock();
        registry.running = true;
        registry.paused = false;
        info!("download orchestrator started");
        self.inner.schedule(&mut registry);
    }

    /// Stops admitting and pauses every downloading task.
    pub fn pause(&self) {
        let mut registry = self.inner.lock();
        registry.paused = true;
        let downloading: Vec<TaskId> = registry
            .tasks
            .iter()
            .filter(|(_, e)| e.task.status == TaskStatus::Downloading)
            .map(|(id, _)| *id)
            .collect();
        for id in &downloading {
            self.inner.interrupt(&mut registry, *id, TaskStatus::Paused);
        }
        info!(paused = downloading.len(), "downloads paused");
    }

    /// Clears the pause flag and re-admits paused tasks, then pending ones.
    pub fn resume(&self) {
        let mut registry = self.inner.lock();
        registry.paused = false;
        info!("downloads resumed");
        self.inner.schedule(&mut registry);
    }

    /// Cancels every non-terminal task and halts admission until [`start`](Self::start).
    pub fn stop(&self) {
        let mut registry = self.inner.lock();
        registry.running = false;
        let live: Vec<TaskId> = registry
            .tasks
            .iter()
            .filter(|(_, e)| !e.task.status.is_terminal())
            .map(|(id, _)| *id)
            .collect();
        for id in &live {
            self.inner.interrupt(&mut registry, *id, TaskStatus::Cancelled);
        }
        info!(cancelled = live.len(), "download orchestrator stopped");
    }

    /// Registers a pending task and admits it if a slot is free.
    pub fn enqueue(&self, media: impl Into<Arc<MediaRef>>) -> TaskId {
        let mut registry = self.inner.lock();
        let id = self.inner.register(&mut registry, media.into());
        self.inner.schedule(&mut registry);
        id
    }

    /// Enqueues in input order; earlier entries are admitted first.
    pub fn enqueue_many<I>(&self, media: I) -> Vec<TaskId>
    where
        I: IntoIterator,
        I::Item: Into<Arc<MediaRef>>,
    {
        let mut registry = self.inner.lock();
        let ids: Vec<TaskId> = media
            .into_iter()
            .map(|m| self.inner.register(&mut registry, m.into()))
            .collect();
        self.inner.schedule(&mut registry);
        ids
    }

    /// Deregisters a task, cancelling it first if it is still live.
    ///
    /// Returns the task as it was when removed.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestratorError::TaskNotFound`] for an unknown id.
    pub fn remove(&self, id: TaskId) -> Result<DownloadTask, OrchestratorError> {
        let mut registry = self.inner.lock();
        let status = registry
            .tasks
            .get(&id)
            .map(|e| e.task.status)
            .ok_or(OrchestratorError::TaskNotFound(id))?;
        if !status.is_terminal() {
            self.inner.interrupt(&mut registry, id, TaskStatus::Cancelled);
        }
        let entry = registry
            .tasks
            .remove(&id)
            .ok_or(OrchestratorError::TaskNotFound(id))?;
        debug!(task = %id, "task removed");
        self.inner.schedule(&mut registry);
        Ok(entry.task)
    }

    /// Snapshot of one task.
    #[must_use]
    pub fn task(&self, id: TaskId) -> Option<DownloadTask> {
        self.inner.lock().tasks.get(&id).map(|e| e.task.clone())
    }

    #[must_use]
    pub fn all_tasks(&self) -> Vec<DownloadTask> {
        self.inner.lock().snapshot(|_| true)
    }

    /// Tasks currently downloading.
    #[must_use]
    pub fn active_tasks(&self) -> Vec<DownloadTask> {
        self.by_status(TaskStatus::Downloading)
    }

    #[must_use]
    pub fn pending_tasks(&self) -> Vec<DownloadTask> {
        self.by_status(TaskStatus::Pending)
    }

    #[must_use]
    pub fn completed_tasks(&self) -> Vec<DownloadTask> {
        self.by_status(TaskStatus::Completed)
    }

    #[must_use]
    pub fn failed_tasks(&self) -> Vec<DownloadTask> {
        self.by_status(TaskStatus::Failed)
    }

    fn by_status(&self, status: TaskStatus) -> Vec<DownloadTask> {
        self.inner.lock().snapshot(|task| task.status == status)
    }

    /// Mean of every task's progress percent; 0 for an empty registry.
    #[must_use]
    pub fn overall_progress(&self) -> f64 {
        self.inner.lock().overall_progress()
    }

    /// Counts per status plus overall progress.
    #[must_use]
    pub fn stats(&self) -> DownloadStats {
        let registry = self.inner.lock();
        let mut stats = DownloadStats {
            total: registry.tasks.len(),
            overall_progress: registry.overall_progress(),
            ..DownloadStats::default()
        };
        for entry in registry.tasks.values() {
            match entry.task.status {
                TaskStatus::Pending => stats.pending += 1,
                TaskStatus::Downloading => stats.active += 1,
                TaskStatus::Paused => stats.paused += 1,
                TaskStatus::Completed => stats.completed += 1,
                TaskStatus::Failed => stats.failed += 1,
                TaskStatus::Cancelled => stats.cancelled += 1,
            }
        }
        stats
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.inner.lock().running
    }

    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.inner.lock().paused
    }

    /// Resolves once no worker holds a slot.
    ///
    /// While running and not paused this means every task reached a terminal
    /// state (or is paused/pending with admission halted).
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.inner.idle.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            if self.inner.lock().slots.is_empty() {
                return;
            }
            notified.await;
        }
    }
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, Registry> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn register(&self, registry: &mut Registry, media: Arc<MediaRef>) -> TaskId {
        registry.next_task += 1;
        let id = TaskId::new(registry.next_task);
        debug!(task = %id, url = media.url(), "task enqueued");
        registry.tasks.insert(
            id,
            TaskEntry {
                task: DownloadTask::new(id, media),
                worker: None,
                cancel: None,
            },
        );
        id
    }

    /// Admits eligible tasks while slots are free.
    fn schedule(self: &Arc<Self>, registry: &mut Registry) {
        if !registry.running || registry.paused {
            return;
        }
        while registry.slots.len() < self.max_concurrent {
            let Some(id) = registry.next_admissible() else {
                break;
            };
            self.admit(registry, id);
        }
    }

    fn admit(self: &Arc<Self>, registry: &mut Registry, id: TaskId) {
        let output_path = match registry.tasks.get(&id) {
            Some(entry) if entry.task.output_path.is_some() => None,
            Some(entry) => {
                let name = output_file_name(&entry.task.media);
                let tasks = &registry.tasks;
                Some(resolve_unique_path(&self.download_folder, &name, |candidate| {
                    tasks
                        .values()
                        .any(|e| e.task.output_path.as_deref() == Some(candidate))
                }))
            }
            None => return,
        };

        registry.next_worker += 1;
        let worker = WorkerId(registry.next_worker);
        let cancel = CancellationToken::new();

        let Some(entry) = registry.tasks.get_mut(&id) else {
            return;
        };
        if output_path.is_some() {
            entry.task.output_path = output_path;
        }
        let old = entry.task.status;
        entry.task.begin_episode(old);
        entry.task.status = TaskStatus::Downloading;
        entry.worker = Some(worker);
        entry.cancel = Some(cancel.clone());
        self.observer
            .on_status_change(&entry.task, old, TaskStatus::Downloading);

        let url = entry.task.media.url().to_string();
        let path = entry.task.output_path.clone().unwrap_or_default();
        debug!(task = %id, url, path = %path.display(), "download admitted");

        let inner = Arc::clone(self);
        let handle = self.runtime.spawn(async move {
            let reporter = Arc::clone(&inner);
            let progress: ProgressCallback =
                Arc::new(move |update: ProgressUpdate| reporter.on_progress(id, worker, &update));
            let result = inner
                .fetcher
                .fetch_media(&url, &path, progress, cancel)
                .await;
            inner.on_finished(id, worker, result);
        });

        registry.slots.insert(
            worker,
            Slot {
                task_id: id,
                handle: Some(handle),
                grace: None,
            },
        );
    }

    /// Moves a live task to `Paused` or `Cancelled`, signalling its worker.
    fn interrupt(self: &Arc<Self>, registry: &mut Registry, id: TaskId, next: TaskStatus) {
        let Some(entry) = registry.tasks.get_mut(&id) else {
            return;
        };
        let old = entry.task.status;
        if !old.can_transition_to(next) {
            return;
        }

        entry.task.status = next;
        entry.task.speed_bytes_per_sec = None;
        entry.task.eta_seconds = None;
        if next == TaskStatus::Cancelled {
            entry.task.finished_at = Some(Utc::now());
        }
        let worker = entry.worker.take();
        if let Some(cancel) = entry.cancel.take() {
            cancel.cancel();
        }
        self.observer.on_status_change(&entry.task, old, next);

        if let Some(worker) = worker
            && let Some(slot) = registry.slots.get_mut(&worker)
        {
            let inner = Arc::clone(self);
            let grace = self.cancel_grace;
            slot.grace = Some(self.runtime.spawn(async move {
                tokio::time::sleep(grace).await;
                inner.force_free(worker);
            }));
        }
    }

    fn on_progress(&self, id: TaskId, worker: WorkerId, update: &ProgressUpdate) {
        let mut registry = self.lock();
        let Some(entry) = registry.tasks.get_mut(&id) else {
            return;
        };
        if entry.worker != Some(worker) || entry.task.status != TaskStatus::Downloading {
            return;
        }
        entry.task.apply_progress(update);
        self.observer.on_progress(&entry.task);
    }

    fn on_finished(self: &Arc<Self>, id: TaskId, worker: WorkerId, result: Result<(), DownloadError>) {
        let mut registry = self.lock();
        let Some(slot) = registry.slots.remove(&worker) else {
            // Slot already force-freed after the grace period.
            return;
        };
        if let Some(grace) = slot.grace {
            grace.abort();
        }

        if let Some(entry) = registry.tasks.get_mut(&id)
            && entry.worker == Some(worker)
            && entry.task.status == TaskStatus::Downloading
        {
            entry.worker = None;
            entry.cancel = None;
            entry.task.finished_at = Some(Utc::now());
            entry.task.speed_bytes_per_sec = None;
            entry.task.eta_seconds = None;

            match result {
                Ok(()) => {
                    entry.task.status = TaskStatus::Completed;
                    entry.task.progress_percent = 100.0;
                    entry.task.eta_seconds = Some(0);
                    self.observer.on_status_change(
                        &entry.task,
                        TaskStatus::Downloading,
                        TaskStatus::Completed,
                    );
                    self.observer.on_complete(&entry.task);
                }
                Err(e) => {
                    let message = e.to_string();
                    entry.task.status = TaskStatus::Failed;
                    entry.task.error_message = Some(message.clone());
                    self.observer.on_status_change(
                        &entry.task,
                        TaskStatus::Downloading,
                        TaskStatus::Failed,
                    );
                    self.observer.on_error(&entry.task, &message);
                }
            }
        } else if let Err(e) = result
            && !e.is_cancelled()
        {
            debug!(task = %id, error = %e, "ignoring result of interrupted worker");
        }

        self.after_slot_freed(&mut registry);
    }

    /// Releases a slot whose worker ignored cancellation for the whole grace period.
    fn force_free(self: &Arc<Self>, worker: WorkerId) {
        let mut registry = self.lock();
        let Some(slot) = registry.slots.remove(&worker) else {
            return;
        };
        warn!(
            task = %slot.task_id,
            grace_secs = self.cancel_grace.as_secs_f64(),
            "cancelled download did not stop in time, releasing its slot"
        );
        if let Some(handle) = slot.handle {
            handle.abort();
        }
        self.after_slot_freed(&mut registry);
    }

    fn after_slot_freed(self: &Arc<Self>, registry: &mut Registry) {
        self.schedule(registry);
        if registry.slots.is_empty() {
            self.idle.notify_waiters();
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use async_trait::async_trait;
    use tempfile::TempDir;

    use super::*;
    use crate::config::ConfigError;
    use crate::download::observer::NoopObserver;
    use crate::media::{FileType, Strategy};

    /// Completes immediately, or fails when the URL contains "fail".
    struct InstantFetcher;

    #[async_trait]
    impl MediaFetcher for InstantFetcher {
        async fn fetch_media(
            &self,
            url: &str,
            _output_path: &Path,
            progress: ProgressCallback,
            _cancel: CancellationToken,
        ) -> Result<(), DownloadError> {
            if url.contains("fail") {
                return Err(DownloadError::other("connection reset"));
            }
            progress(ProgressUpdate {
                downloaded_bytes: 10,
                total_bytes: 10,
                ..ProgressUpdate::default()
            });
            Ok(())
        }
    }

    fn config(dir: &TempDir, max: usize) -> HarvesterConfig {
        HarvesterConfig {
            max_concurrent_downloads: max,
            download_folder: dir.path().join("out"),
            ..HarvesterConfig::default()
        }
    }

    fn media(name: &str) -> MediaRef {
        MediaRef::new(
            format!("https://e.com/{name}.mp4"),
            name,
            FileType::Extension(".mp4".to_string()),
            "https://e.com/",
            Strategy::DirectLink,
        )
    }

    #[tokio::test]
    async fn test_new_rejects_zero_concurrency() {
        let dir = TempDir::new().unwrap();
        let result = DownloadOrchestrator::new(
            &config(&dir, 0),
            Arc::new(InstantFetcher),
            Arc::new(NoopObserver),
        );
        assert!(matches!(
            result,
            Err(OrchestratorError::InvalidConcurrency { value: 0 })
        ));
    }

    #[tokio::test]
    async fn test_new_rejects_invalid_config() {
        let dir = TempDir::new().unwrap();
        let zero_grace = HarvesterConfig {
            cancel_grace: Duration::ZERO,
            ..config(&dir, 2)
        };
        let result = DownloadOrchestrator::new(
            &zero_grace,
            Arc::new(InstantFetcher),
            Arc::new(NoopObserver),
        );
        assert!(matches!(
            result,
            Err(OrchestratorError::Config(ConfigError::InvalidTimeout {
                field: "cancel_grace",
                ..
            }))
        ));
        assert!(!dir.path().join("out").exists());
    }

    #[test]
    fn test_new_outside_runtime_fails() {
        let dir = TempDir::new().unwrap();
        let result = DownloadOrchestrator::new(
            &config(&dir, 2),
            Arc::new(InstantFetcher),
            Arc::new(NoopObserver),
        );
        assert!(matches!(result, Err(OrchestratorError::NoRuntime)));
    }

    #[tokio::test]
    async fn test_new_creates_download_folder() {
        let dir = TempDir::new().unwrap();
        let orchestrator = DownloadOrchestrator::new(
            &config(&dir, 2),
            Arc::new(InstantFetcher),
            Arc::new(NoopObserver),
        )
        .unwrap();
        assert!(orchestrator.download_folder().is_dir());
        assert!(!orchestrator.is_running());
    }

    #[tokio::test]
    async fn test_enqueue_before_start_stays_pending() {
        let dir = TempDir::new().unwrap();
        let orchestrator = DownloadOrchestrator::new(
            &config(&dir, 2),
            Arc::new(InstantFetcher),
            Arc::new(NoopObserver),
        )
        .unwrap();
        let id = orchestrator.enqueue(media("a"));
        assert_eq!(orchestrator.task(id).unwrap().status(), TaskStatus::Pending);
        assert_eq!(orchestrator.overall_progress(), 0.0);
    }

    #[tokio::test]
    async fn test_runs_everything_to_completion() {
        let dir = TempDir::new().unwrap();
        let orchestrator = DownloadOrchestrator::new(
            &config(&dir, 2),
            Arc::new(InstantFetcher),
            Arc::new(NoopObserver),
        )
        .unwrap();
        orchestrator.start();
        orchestrator.enqueue_many(vec![media("a"), media("b"), media("fail"), media("c")]);
        orchestrator.wait_idle().await;

        let stats = orchestrator.stats();
        assert_eq!(stats.total, 4);
        assert_eq!(stats.completed, 3);
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.pending + stats.active, 0);
        let failed = orchestrator.failed_tasks();
        assert_eq!(failed[0].error_message(), Some("connection reset"));
        assert!((stats.overall_progress - 75.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_duplicate_titles_get_unique_paths() {
        let dir = TempDir::new().unwrap();
        let orchestrator = DownloadOrchestrator::new(
            &config(&dir, 3),
            Arc::new(InstantFetcher),
            Arc::new(NoopObserver),
        )
        .unwrap();
        orchestrator.start();
        let first = orchestrator.enqueue(media("clip"));
        let second = orchestrator.enqueue(media("clip"));
        orchestrator.wait_idle().await;

        let out = dir.path().join("out");
        assert_eq!(
            orchestrator.task(first).unwrap().output_path(),
            Some(out.join("clip.mp4").as_path())
        );
        assert_eq!(
            orchestrator.task(second).unwrap().output_path(),
            Some(out.join("clip (1).mp4").as_path())
        );
    }

    #[tokio::test]
    async fn test_remove_unknown_task_errors() {
        let dir = TempDir::new().unwrap();
        let orchestrator = DownloadOrchestrator::new(
            &config(&dir, 1),
            Arc::new(InstantFetcher),
            Arc::new(NoopObserver),
        )
        .unwrap();
        assert!(matches!(
            orchestrator.remove(TaskId::new(99)),
            Err(OrchestratorError::TaskNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_remove_pending_task_cancels_and_deregisters() {
        let dir = TempDir::new().unwrap();
        let orchestrator = DownloadOrchestrator::new(
            &config(&dir, 1),
            Arc::new(InstantFetcher),
            Arc::new(NoopObserver),
        )
        .unwrap();
        let id = orchestrator.enqueue(media("a"));
        let removed = orchestrator.remove(id).unwrap();
        assert_eq!(removed.status(), TaskStatus::Cancelled);
        assert!(orchestrator.task(id).is_none());
        assert!(orchestrator.all_tasks().is_empty());
    }
}
