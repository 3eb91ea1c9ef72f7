//! Integration tests for the streaming HTTP media fetcher.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use harvester_core::download::{ProgressCallback, ProgressUpdate, TracingObserver};
use harvester_core::{
    DownloadError, DownloadOrchestrator, FileType, HarvesterConfig, HttpMediaFetcher,
    MediaFetcher, MediaRef, Strategy, TaskStatus,
};
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

mod support;
use support::socket_guard::start_mock_server_or_skip;

fn recording_callback() -> (ProgressCallback, Arc<Mutex<Vec<ProgressUpdate>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let callback: ProgressCallback = Arc::new(move |update: ProgressUpdate| sink.lock().unwrap().push(update));
    (callback, seen)
}

#[tokio::test]
async fn test_fetch_writes_body_and_reports_final_progress() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    let body = vec![7_u8; 64 * 1024];
    Mock::given(method("GET"))
        .and(path("/clip.mp4"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(body.clone()))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let output = dir.path().join("clip.mp4");
    let (progress, seen) = recording_callback();

    HttpMediaFetcher::new()
        .fetch_media(
            &format!("{}/clip.mp4", server.uri()),
            &output,
            progress,
            CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(std::fs::read(&output).unwrap(), body);
    let seen = seen.lock().unwrap();
    let last = seen.last().unwrap();
    assert_eq!(last.downloaded_bytes, body.len() as u64);
    assert_eq!(last.total_bytes, body.len() as u64);
    assert_eq!(last.percent(), Some(100.0));
}

#[tokio::test]
async fn test_fetch_http_error_leaves_no_file() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    Mock::given(method("GET"))
        .and(path("/missing.mp4"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let output = dir.path().join("missing.mp4");
    let (progress, _) = recording_callback();

    let err = HttpMediaFetcher::new()
        .fetch_media(
            &format!("{}/missing.mp4", server.uri()),
            &output,
            progress,
            CancellationToken::new(),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, DownloadError::HttpStatus { status: 404, .. }), "got {err:?}");
    assert!(!output.exists());
}

#[tokio::test]
async fn test_fetch_cancelled_before_response() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    Mock::given(method("GET"))
        .and(path("/slow.mp4"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(vec![1_u8; 1024])
                .set_delay(Duration::from_secs(10)),
        )
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let output = dir.path().join("slow.mp4");
    let (progress, _) = recording_callback();
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        trigger.cancel();
    });

    let err = tokio::time::timeout(
        Duration::from_secs(5),
        HttpMediaFetcher::new().fetch_media(
            &format!("{}/slow.mp4", server.uri()),
            &output,
            progress,
            cancel,
        ),
    )
    .await
    .unwrap()
    .unwrap_err();

    assert!(err.is_cancelled());
    assert!(!output.exists());
}

#[tokio::test]
async fn test_fetch_rejects_invalid_url() {
    let dir = TempDir::new().unwrap();
    let (progress, _) = recording_callback();
    let err = HttpMediaFetcher::new()
        .fetch_media(
            "not a url",
            &dir.path().join("x.mp4"),
            progress,
            CancellationToken::new(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, DownloadError::InvalidUrl { .. }));
}

#[tokio::test]
async fn test_orchestrator_downloads_into_folder() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    for name in ["a", "b"] {
        Mock::given(method("GET"))
            .and(path(format!("/{name}.webm")))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(name.as_bytes().to_vec()))
            .mount(&server)
            .await;
    }

    let dir = TempDir::new().unwrap();
    let config = HarvesterConfig {
        max_concurrent_downloads: 2,
        download_folder: dir.path().join("out"),
        ..HarvesterConfig::default()
    };
    let orchestrator = DownloadOrchestrator::new(
        &config,
        Arc::new(HttpMediaFetcher::new()),
        Arc::new(TracingObserver),
    )
    .unwrap();

    let media: Vec<MediaRef> = ["a", "b"]
        .iter()
        .map(|name| {
            MediaRef::new(
                format!("{}/{name}.webm", server.uri()),
                "Same Title",
                FileType::Extension(".webm".to_string()),
                server.uri(),
                Strategy::DirectLink,
            )
        })
        .collect();

    orchestrator.start();
    orchestrator.enqueue_many(media);
    tokio::time::timeout(Duration::from_secs(10), orchestrator.wait_idle())
        .await
        .unwrap();

    let tasks = orchestrator.all_tasks();
    assert!(tasks.iter().all(|t| t.status() == TaskStatus::Completed));
    let out = dir.path().join("out");
    assert_eq!(std::fs::read(out.join("Same Title.webm")).unwrap(), b"a");
    assert_eq!(std::fs::read(out.join("Same Title (1).webm")).unwrap(), b"b");
}
