//! CLI argument definitions using clap derive macros.

use std::collections::BTreeSet;
use std::path::PathBuf;

use anyhow::{Result, bail};
use clap::{Parser, ValueEnum};

/// Discover videos on web pages and download them in bulk.
///
/// Pass page URLs as arguments or pipe them via stdin, one per line.
#[derive(Parser, Debug)]
#[command(name = "harvester")]
#[command(author, version, about)]
pub struct Args {
    /// Page URLs to scan (read from stdin when omitted)
    pub urls: Vec<String>,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,

    /// Maximum concurrent downloads (1-100) [default: 3]
    #[arg(short = 'c', long, value_parser = clap::value_parser!(u8).range(1..=100))]
    pub concurrency: Option<u8>,

    /// Parallel validation probes and pages during discovery (1-100) [default: 5]
    #[arg(short = 'w', long, value_parser = clap::value_parser!(u8).range(1..=100))]
    pub workers: Option<u8>,

    /// Download folder [default: ~/Downloads/BulkVideos]
    #[arg(short = 'o', long)]
    pub output_dir: Option<PathBuf>,

    /// Page fetch timeout in seconds (1-3600) [default: 30]
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..=3600))]
    pub fetch_timeout: Option<u64>,

    /// Reachability probe timeout in seconds (1-3600) [default: 10]
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..=3600))]
    pub validation_timeout: Option<u64>,

    /// How media is retrieved [default: auto]
    #[arg(long, value_enum)]
    pub fetcher: Option<FetcherKind>,

    /// Only list discovered media, do not download
    #[arg(long)]
    pub list_only: bool,

    /// Entries to download, 1-based (e.g. `1,3-5`); all when omitted
    #[arg(short = 's', long)]
    pub select: Option<String>,

    /// Print the discovered media as JSON
    #[arg(long)]
    pub json: bool,
}

/// Media retrieval backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FetcherKind {
    /// Plain HTTP for files, yt-dlp for hosting platforms
    Auto,
    /// Plain HTTP streaming only
    Http,
    /// yt-dlp for everything
    #[value(name = "yt-dlp")]
    YtDlp,
}

impl FetcherKind {
    /// Parses the config-file spelling.
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "auto" => Some(Self::Auto),
            "http" => Some(Self::Http),
            "yt-dlp" => Some(Self::YtDlp),
            _ => None,
        }
    }
}

/// Parses a selection like `1,3-5` into sorted, deduplicated zero-based indices.
///
/// `all` (or an empty string) selects everything.
pub fn parse_selection(selection: &str, count: usize) -> Result<Vec<usize>> {
    let selection = selection.trim();
    if selection.is_empty() || selection.eq_ignore_ascii_case("all") {
        return Ok((0..count).collect());
    }

    let mut picked = BTreeSet::new();
    for part in selection.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let (start, end) = match part.split_once('-') {
            Some((a, b)) => (parse_position(a, count)?, parse_position(b, count)?),
            None => {
                let n = parse_position(part, count)?;
                (n, n)
            }
        };
        if start > end {
            bail!("Invalid selection range '{part}': start is after end");
        }
        picked.extend((start..=end).map(|n| n - 1));
    }
    Ok(picked.into_iter().collect())
}

fn parse_position(raw: &str, count: usize) -> Result<usize> {
    let raw = raw.trim();
    let Ok(n) = raw.parse::<usize>() else {
        bail!("Invalid selection entry '{raw}': expected a number");
    };
    if n == 0 || n > count {
        bail!("Selection entry {n} is out of range: expected 1..={count}");
    }
    Ok(n)
}
