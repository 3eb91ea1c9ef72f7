//! Harvester Core Library
//!
//! Finds playable media referenced by web pages and downloads a selected
//! subset under a bounded-concurrency schedule with live progress reporting.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`media`] - The `MediaRef` record shared by discovery and downloading
//! - [`discovery`] - Page fetching, multi-strategy extraction, validation
//! - [`download`] - Task registry, scheduler and media fetchers
//! - [`config`] - Configuration surface and validation

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod discovery;
pub mod download;
pub mod media;

// Re-export commonly used types
pub use config::{ConfigError, HarvesterConfig};
pub use discovery::{DiscoveryEngine, DiscoveryError, HttpPageFetcher, PageFetcher};
pub use download::{
    DownloadError, DownloadOrchestrator, DownloadStats, DownloadTask, HttpMediaFetcher,
    MediaFetcher, OrchestratorError, ProgressObserver, TaskId, TaskStatus, YtDlpFetcher,
};
pub use media::{FileType, MediaRef, Strategy};
