//! CLI entry point for the harvester tool.

use std::io::{self, IsTerminal, Read};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::Parser;
use harvester_core::download::{ProgressObserver, RoutingFetcher};
use harvester_core::{
    DiscoveryEngine, DownloadOrchestrator, HttpMediaFetcher, MediaFetcher, MediaRef, YtDlpFetcher,
};
use tracing::{debug, info, warn};

mod app_config;
mod cli;
mod output;

use app_config::{VerbositySetting, load_default_file_config, resolve_runtime_config};
use cli::{Args, FetcherKind, parse_selection};
use output::ProgressDisplay;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    let loaded = load_default_file_config()?;
    let file_config = loaded.config.as_ref();

    // Priority: RUST_LOG env var > quiet flag > verbose flag > config verbosity > default (info)
    let config_verbosity = file_config.and_then(|c| c.verbosity);
    let quiet = args.quiet || (args.verbose == 0 && config_verbosity == Some(VerbositySetting::Quiet));
    let default_level = if quiet {
        "error"
    } else {
        match (args.verbose, config_verbosity) {
            (0, Some(VerbositySetting::Verbose | VerbositySetting::Debug)) | (1, _) => "debug",
            (0, _) => "info",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    debug!(?args, config_path = ?loaded.path, from_file = file_config.is_some(), "CLI arguments parsed");

    let runtime = resolve_runtime_config(&args, file_config)?;

    // Read input: from positional args or stdin
    let input_text = if !args.urls.is_empty() {
        args.urls.join("\n")
    } else if !io::stdin().is_terminal() {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        buffer
    } else {
        output::print_quick_start_guidance(false);
        return Ok(());
    };

    let seeds = parse_seeds(&input_text);
    if seeds.is_empty() {
        output::print_quick_start_guidance(true);
        return Ok(());
    }
    info!(pages = seeds.len(), "Harvester starting");

    let engine = DiscoveryEngine::with_http(&runtime.harvester)?;
    let media = engine.discover_many(seeds).await;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&media)?);
    } else if !quiet {
        output::print_media_list(&media);
    }

    if args.list_only || media.is_empty() {
        return Ok(());
    }

    let selected = select_media(&media, args.select.as_deref())?;
    info!(selected = selected.len(), found = media.len(), "Starting downloads");

    let observer: Arc<dyn ProgressObserver> = Arc::new(ProgressDisplay::new(quiet));
    let orchestrator = DownloadOrchestrator::new(
        &runtime.harvester,
        build_fetcher(runtime.fetcher),
        observer,
    )?;
    orchestrator.start();
    orchestrator.enqueue_many(selected);

    let interrupted = tokio::select! {
        () = orchestrator.wait_idle() => false,
        signal = tokio::signal::ctrl_c() => {
            if let Err(e) = signal {
                warn!(error = %e, "Failed to listen for Ctrl-C");
            }
            warn!("Interrupted, cancelling downloads");
            orchestrator.stop();
            orchestrator.wait_idle().await;
            true
        }
    };

    let stats = orchestrator.stats();
    if !quiet {
        output::print_summary(&stats, &orchestrator.failed_tasks());
    }
    info!(
        completed = stats.completed,
        failed = stats.failed,
        cancelled = stats.cancelled,
        total = stats.total,
        "Download run finished"
    );

    if interrupted {
        bail!("Interrupted before all downloads finished");
    }
    if stats.failed > 0 {
        bail!("{} download(s) failed", stats.failed);
    }
    Ok(())
}

/// One seed per non-empty line or whitespace-separated token; `#` starts a comment line.
fn parse_seeds(input: &str) -> Vec<String> {
    input
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .flat_map(str::split_whitespace)
        .map(str::to_string)
        .collect()
}

fn select_media(media: &[MediaRef], selection: Option<&str>) -> Result<Vec<MediaRef>> {
    let indices = parse_selection(selection.unwrap_or("all"), media.len())
        .context("Invalid --select value")?;
    Ok(indices.into_iter().map(|i| media[i].clone()).collect())
}

fn build_fetcher(kind: FetcherKind) -> Arc<dyn MediaFetcher> {
    match kind {
        FetcherKind::Http => Arc::new(HttpMediaFetcher::new()),
        FetcherKind::YtDlp => Arc::new(YtDlpFetcher::new()),
        FetcherKind::Auto => Arc::new(RoutingFetcher::new(
            Arc::new(HttpMediaFetcher::new()),
            Arc::new(YtDlpFetcher::new()),
        )),
    }
}
