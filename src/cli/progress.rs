//! Progress bar and summary reporting for CLI downloads.

use std::path::{Path, PathBuf};

use indicatif::{ProgressBar, ProgressStyle};

use crate::progress::{DownloadProgress, ProgressUpdate};
use crate::{TransferStats, format_bytes, format_duration, format_speed};

const SEPARATOR: &str = "────────────────────────────────────────────────────────────";

/// Creates a percent-based progress bar for one download.
pub fn make_progress_bar() -> ProgressBar {
    let bar = ProgressBar::new(100);
    bar.set_style(
        ProgressStyle::with_template("{spinner:.cyan} [{bar:40.cyan/blue}] {pos:>3}% - {msg}")
            .expect("progress template is valid")
            .progress_chars("━━╌"),
    );
    bar.set_message("Starting...");
    bar
}

/// Drives an indicatif bar from engine progress.
pub struct IndicatifProgress {
    bar: ProgressBar,
}

impl IndicatifProgress {
    pub const fn new(bar: ProgressBar) -> Self {
        Self { bar }
    }
}

impl DownloadProgress for IndicatifProgress {
    fn on_progress(&self, update: &ProgressUpdate) {
        self.bar.set_position(u64::from(update.percent));
        self.bar.set_message(update.status.clone());
    }

    fn on_paused(&self) {
        self.bar.set_message("Paused");
    }

    fn on_file_saved(&self, path: &Path) {
        self.bar.println(format!("  Saved {}", path.display()));
    }
}

/// Prints a summary of the finished download.
pub fn print_summary(files: &[PathBuf], stats: &TransferStats) {
    println!("\n{SEPARATOR}");
    println!("Download Summary");
    println!("{SEPARATOR}");

    for file in files {
        println!("  {}", file.display());
    }
    if stats.bytes > 0 {
        println!("  Total size:        {}", format_bytes(stats.bytes));
    }
    println!("  Total time:        {}", format_duration(stats.elapsed));
    if stats.average_speed > 0 {
        println!("  Average speed:     {}", format_speed(stats.average_speed));
    }

    println!("{SEPARATOR}");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_moves_bar() {
        let bar = ProgressBar::hidden();
        let progress = IndicatifProgress::new(bar.clone());
        progress.on_progress(&ProgressUpdate {
            percent: 42,
            status: "Downloading: 42.0% at 1.00MiB/s - ETA 00:05".to_string(),
        });
        assert_eq!(bar.position(), 42);
        assert_eq!(bar.message(), "Downloading: 42.0% at 1.00MiB/s - ETA 00:05");

        progress.on_paused();
        assert_eq!(bar.message(), "Paused");
    }

    #[test]
    fn bar_is_percent_based() {
        assert_eq!(make_progress_bar().length(), Some(100));
    }
}
