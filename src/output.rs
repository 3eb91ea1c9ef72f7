//! CLI output formatting and display helpers.

use std::collections::HashMap;
use std::sync::Mutex;

use harvester_core::download::ProgressObserver;
use harvester_core::{DownloadStats, DownloadTask, MediaRef, TaskId, TaskStatus};
use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};

/// Message when no input was provided at all.
pub const NO_INPUT_GUIDANCE: &str = "No input provided. Pipe page URLs via stdin or pass as arguments.";

/// Message when stdin was piped but empty.
pub const EMPTY_STDIN_GUIDANCE: &str =
    "Received empty stdin input. Pipe page URLs, one per line, or pass them as arguments.";

/// Example for piping input.
pub const INPUT_PIPE_EXAMPLE: &str = "Example: echo 'https://example.com/videos' | harvester";

/// Example for passing URLs as arguments.
pub const INPUT_ARG_EXAMPLE: &str = "Example: harvester --list-only https://example.com/videos";

const BAR_TEMPLATE: &str =
    "{prefix:>4} {wide_msg} [{bar:30}] {bytes}/{total_bytes} {bytes_per_sec} eta {eta}";

/// Returns terminal width from COLUMNS, or 80 if unset/invalid.
pub fn terminal_width() -> usize {
    std::env::var("COLUMNS")
        .ok()
        .and_then(|value| value.parse::<usize>().ok())
        .filter(|width| *width >= 20)
        .unwrap_or(80)
}

/// Truncates text to at most `width` chars, appending ellipsis if truncated.
pub fn truncate_to_width(text: &str, width: usize) -> String {
    let text_len = text.chars().count();
    if text_len <= width {
        return text.to_string();
    }
    if width == 0 {
        return String::new();
    }
    if width == 1 {
        return "…".to_string();
    }

    let mut output: String = text.chars().take(width - 1).collect();
    output.push('…');
    output
}

/// Returns lines for quick-start guidance (headline + examples), truncated to width.
pub fn quick_start_guidance_lines(empty_stdin: bool, width: usize) -> Vec<String> {
    let headline = if empty_stdin {
        EMPTY_STDIN_GUIDANCE
    } else {
        NO_INPUT_GUIDANCE
    };

    vec![
        truncate_to_width(headline, width),
        truncate_to_width(INPUT_PIPE_EXAMPLE, width),
        truncate_to_width(INPUT_ARG_EXAMPLE, width),
    ]
}

/// Prints quick-start guidance to stdout (no input or empty stdin).
pub fn print_quick_start_guidance(empty_stdin: bool) {
    let width = terminal_width().min(80);
    for line in quick_start_guidance_lines(empty_stdin, width) {
        println!("{line}");
    }
}

/// One numbered line per discovered media entry.
pub fn media_list_lines(media: &[MediaRef], width: usize) -> Vec<String> {
    media
        .iter()
        .enumerate()
        .map(|(index, item)| {
            let line = format!(
                "{:>3}. [{}] {} ({}) <{}>",
                index + 1,
                item.file_type().as_str(),
                item.title(),
                item.detected_by().as_str(),
                item.url()
            );
            truncate_to_width(&line, width)
        })
        .collect()
}

/// Prints the discovered media list, or a notice when nothing was found.
pub fn print_media_list(media: &[MediaRef]) {
    if media.is_empty() {
        println!("No videos found.");
        return;
    }
    println!("Found {} video(s):", media.len());
    for line in media_list_lines(media, terminal_width()) {
        println!("{line}");
    }
}

/// Summary lines for a finished download run.
pub fn summary_lines(stats: &DownloadStats, failed: &[DownloadTask]) -> Vec<String> {
    let mut lines = vec![format!(
        "Downloads: {} completed, {} failed, {} cancelled, {} total",
        stats.completed, stats.failed, stats.cancelled, stats.total
    )];
    for task in failed {
        lines.push(format!(
            "  failed {}: {}",
            task.media().title(),
            task.error_message().unwrap_or("unknown error")
        ));
    }
    lines
}

/// Prints the run summary to stdout.
pub fn print_summary(stats: &DownloadStats, failed: &[DownloadTask]) {
    let width = terminal_width();
    for line in summary_lines(stats, failed) {
        println!("{}", truncate_to_width(&line, width));
    }
}

/// Progress observer drawing one indicatif bar per task.
pub struct ProgressDisplay {
    multi: MultiProgress,
    bars: Mutex<HashMap<TaskId, ProgressBar>>,
    style: ProgressStyle,
    title_width: usize,
}

impl ProgressDisplay {
    /// Draws to stderr, or nowhere when `hidden`.
    pub fn new(hidden: bool) -> Self {
        let target = if hidden {
            ProgressDrawTarget::hidden()
        } else {
            ProgressDrawTarget::stderr()
        };
        let style = ProgressStyle::with_template(BAR_TEMPLATE)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> ");
        Self {
            multi: MultiProgress::with_draw_target(target),
            bars: Mutex::new(HashMap::new()),
            style,
            title_width: terminal_width().saturating_sub(60).max(16),
        }
    }

    fn with_bar(&self, task: &DownloadTask, update: impl FnOnce(&ProgressBar)) {
        let mut bars = self
            .bars
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let bar = bars.entry(task.id()).or_insert_with(|| {
            let bar = self.multi.add(ProgressBar::new(task.total_bytes()));
            bar.set_style(self.style.clone());
            bar.set_prefix(task.id().to_string());
            bar.set_message(truncate_to_width(task.media().title(), self.title_width));
            bar
        });
        update(bar);
    }
}

impl ProgressObserver for ProgressDisplay {
    fn on_progress(&self, task: &DownloadTask) {
        self.with_bar(task, |bar| {
            if task.total_bytes() > 0 {
                bar.set_length(task.total_bytes());
            }
            bar.set_position(task.downloaded_bytes());
        });
    }

    fn on_complete(&self, task: &DownloadTask) {
        self.with_bar(task, |bar| {
            bar.set_position(task.total_bytes().max(task.downloaded_bytes()));
            bar.finish_with_message(format!(
                "{} done",
                truncate_to_width(task.media().title(), self.title_width)
            ));
        });
    }

    fn on_error(&self, task: &DownloadTask, message: &str) {
        self.with_bar(task, |bar| {
            bar.abandon_with_message(truncate_to_width(
                &format!("{} failed: {message}", task.media().title()),
                self.title_width,
            ));
        });
    }

    fn on_status_change(&self, task: &DownloadTask, _old: TaskStatus, new: TaskStatus) {
        match new {
            TaskStatus::Downloading => self.with_bar(task, |bar| bar.reset_eta()),
            TaskStatus::Paused | TaskStatus::Cancelled => self.with_bar(task, |bar| {
                bar.set_message(truncate_to_width(
                    &format!("{} ({})", task.media().title(), new.as_str()),
                    self.title_width,
                ));
                if new == TaskStatus::Cancelled {
                    bar.abandon();
                }
            }),
            TaskStatus::Pending | TaskStatus::Completed | TaskStatus::Failed => {}
        }
    }
}
