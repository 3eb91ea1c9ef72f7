//! Download orchestration: task registry, scheduler and fetch collaborators.
//!
//! # Features
//!
//! - Bounded concurrency with FIFO admission
//! - Pause, resume, stop and per-task removal
//! - Streaming HTTP downloads with speed and ETA reporting
//! - `yt-dlp` delegation for platform pages
//! - Unique, sanitized output filenames
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use harvester_core::HarvesterConfig;
//! use harvester_core::download::{DownloadOrchestrator, HttpMediaFetcher, TracingObserver};
//!
//! # async fn example(media: Vec<harvester_core::MediaRef>) -> Result<(), Box<dyn std::error::Error>> {
//! let orchestrator = DownloadOrchestrator::new(
//!     &HarvesterConfig::default(),
//!     Arc::new(HttpMediaFetcher::new()),
//!     Arc::new(TracingObserver),
//! )?;
//! orchestrator.start();
//! orchestrator.enqueue_many(media);
//! orchestrator.wait_idle().await;
//! println!("{:?}", orchestrator.stats());
//! # Ok(())
//! # }
//! ```

mod error;
mod fetcher;
pub mod filename;
mod observer;
mod orchestrator;
mod task;
mod ytdlp;

pub use error::{DownloadError, OrchestratorError};
pub use fetcher::{HttpMediaFetcher, MediaFetcher, ProgressCallback, RoutingFetcher};
pub use observer::{NoopObserver, ProgressObserver, TracingObserver};
pub use orchestrator::{DownloadOrchestrator, DownloadStats};
pub use task::{DownloadTask, ProgressUpdate, TaskId, TaskStatus};
pub use ytdlp::{DEFAULT_FORMAT, YtDlpFetcher, parse_progress_line};
