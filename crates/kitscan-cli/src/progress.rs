//! Scan progress display with progress bars.

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use kitscan_core::Progress;
use std::time::Duration;

/// Page scan progress tracker
pub struct ScanProgress {
    bar: ProgressBar,
}

impl ScanProgress {
    /// Create a tracker; the page count is set once the first page arrives.
    #[must_use]
    pub fn new(visible: bool) -> Self {
        let bar = ProgressBar::new(0);
        if !visible {
            bar.set_draw_target(ProgressDrawTarget::hidden());
        }

        bar.set_style(
            ProgressStyle::default_bar()
                .template("{msg}\n{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] page {pos}/{len}")
                .expect("Invalid progress bar template")
                .progress_chars("#>-"),
        );

        bar.set_message("Waiting for first page");

        Self { bar }
    }

    /// Update from an aggregator progress event
    pub fn update(&self, progress: Progress) {
        self.bar.set_length(u64::from(progress.total_pages));
        self.bar.set_position(progress.scanned as u64);
        self.bar.set_message(page_message(progress));
    }

    /// Print a line above the bar
    pub fn println(&self, msg: impl AsRef<str>) {
        self.bar.println(msg);
    }

    /// Finish with custom message
    pub fn finish_with_message(&self, msg: String) {
        self.bar.finish_with_message(msg);
    }

    /// Abandon the progress bar (for errors)
    pub fn abandon_with_message(&self, msg: String) {
        self.bar.abandon_with_message(msg);
    }
}

/// Describe scan progress the way the scanning screen does
///
/// # Example
///
/// ```text
/// page 1 of 3 scanned
/// ```
#[must_use]
pub fn page_message(progress: Progress) -> String {
    format!(
        "page {} of {} scanned",
        progress.scanned, progress.total_pages
    )
}

/// Format bytes in human-readable format
#[must_use]
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB"];
    let mut size = bytes as f64;
    let mut unit_idx = 0;

    while size >= 1024.0 && unit_idx < UNITS.len() - 1 {
        size /= 1024.0;
        unit_idx += 1;
    }

    format!("{size:.2} {}", UNITS[unit_idx])
}

/// Format duration in human-readable format
#[must_use]
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();

    if secs < 60 {
        format!("{secs}s")
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m", secs / 3600, (secs % 3600) / 60)
    }
}
