//! Progress events emitted by the engine and their rendering for the UI.

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Prefix identifying a progress record on the engine's stdout.
pub const PROGRESS_MARKER: &str = "YTDLWEB_PROGRESS|";

/// Prefix identifying a saved-file record on the engine's stdout.
pub const SAVED_MARKER: &str = "YTDLWEB_SAVED|";

/// Engine template that prints one progress record per hook call.
pub const PROGRESS_TEMPLATE: &str = "download:YTDLWEB_PROGRESS|%(progress.status)s|%(progress.downloaded_bytes)s|%(progress.total_bytes)s|%(progress.total_bytes_estimate)s|%(progress._percent_str)s|%(progress._speed_str)s|%(progress._eta_str)s";

/// Engine print template reporting each final file path.
pub const SAVED_FILE_TEMPLATE: &str = "after_move:YTDLWEB_SAVED|%(filepath)s";

/// Status line shown once the transfer itself has finished.
pub const FINISHED_STATUS: &str = "Download complete! Processing file...";

static ANSI_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\x1b\[[0-9;]*[A-Za-z]").expect("valid regex"));

/// Transfer status reported by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgressStatus {
    Downloading,
    Finished,
    /// Any other status (`error`, `started`, ...), ignored by the reporter.
    Other(String),
}

impl From<&str> for ProgressStatus {
    fn from(s: &str) -> Self {
        match s {
            "downloading" => Self::Downloading,
            "finished" => Self::Finished,
            other => Self::Other(other.to_string()),
        }
    }
}

/// One progress callback from the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressEvent {
    pub status: ProgressStatus,
    pub downloaded_bytes: Option<u64>,
    pub total_bytes: Option<u64>,
    pub total_bytes_estimate: Option<u64>,
    pub percent_str: String,
    pub speed_str: String,
    pub eta_str: String,
}

impl ProgressEvent {
    /// Creates a `downloading` event with byte counts and empty display strings.
    #[must_use]
    pub const fn downloading(downloaded: u64, total: u64) -> Self {
        Self {
            status: ProgressStatus::Downloading,
            downloaded_bytes: Some(downloaded),
            total_bytes: Some(total),
            total_bytes_estimate: None,
            percent_str: String::new(),
            speed_str: String::new(),
            eta_str: String::new(),
        }
    }

    /// Creates a `finished` event.
    #[must_use]
    pub const fn finished() -> Self {
        Self {
            status: ProgressStatus::Finished,
            downloaded_bytes: None,
            total_bytes: None,
            total_bytes_estimate: None,
            percent_str: String::new(),
            speed_str: String::new(),
            eta_str: String::new(),
        }
    }

    /// Returns the total size used for percentages.
    ///
    /// Falls back to the estimate, and treats a zero or unknown total as 1.
    #[must_use]
    pub fn effective_total(&self) -> u64 {
        self.total_bytes
            .filter(|&t| t > 0)
            .or(self.total_bytes_estimate.filter(|&t| t > 0))
            .unwrap_or(1)
    }
}

/// What the UI should show after a progress event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgressUpdate {
    /// Whole percent, 0..=100.
    pub percent: u8,
    /// Human-readable status line.
    pub status: String,
}

impl ProgressUpdate {
    /// Maps an engine event to a UI update.
    ///
    /// `downloading` yields the byte percentage and a percent/speed/ETA line,
    /// `finished` always yields 100%, and anything else yields `None`.
    #[must_use]
    pub fn from_event(event: &ProgressEvent) -> Option<Self> {
        match event.status {
            ProgressStatus::Downloading => {
                let percent = percent(event.downloaded_bytes.unwrap_or(0), event.effective_total());
                Some(Self {
                    percent,
                    status: format!(
                        "Downloading: {} at {} - ETA {}",
                        display_or(&event.percent_str, &format!("{percent}%")),
                        display_or(&event.speed_str, "Unknown speed"),
                        display_or(&event.eta_str, "Unknown"),
                    ),
                })
            }
            ProgressStatus::Finished => Some(Self {
                percent: 100,
                status: FINISHED_STATUS.to_string(),
            }),
            ProgressStatus::Other(_) => None,
        }
    }
}

fn display_or<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.is_empty() { fallback } else { value }
}

/// Computes `downloaded / total` as a whole percentage, clamped to 100.
///
/// A zero total is treated as 1.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn percent(downloaded: u64, total: u64) -> u8 {
    let total = u128::from(total.max(1));
    let pct = u128::from(downloaded) * 100 / total;
    pct.min(100) as u8
}

/// Parses one engine stdout line produced by [`PROGRESS_TEMPLATE`].
#[must_use]
pub fn parse_progress_line(line: &str) -> Option<ProgressEvent> {
    let rest = line.trim_end().strip_prefix(PROGRESS_MARKER)?;
    let mut fields = rest.splitn(7, '|');

    let status = ProgressStatus::from(fields.next()?.trim());
    let downloaded_bytes = parse_bytes(fields.next()?);
    let total_bytes = parse_bytes(fields.next()?);
    let total_bytes_estimate = parse_bytes(fields.next()?);
    let percent_str = clean_display(fields.next().unwrap_or_default());
    let speed_str = clean_display(fields.next().unwrap_or_default());
    let eta_str = clean_display(fields.next().unwrap_or_default());

    Some(ProgressEvent {
        status,
        downloaded_bytes,
        total_bytes,
        total_bytes_estimate,
        percent_str,
        speed_str,
        eta_str,
    })
}

/// Parses a saved-file record, returning the final path.
#[must_use]
pub fn parse_saved_line(line: &str) -> Option<&Path> {
    let path = line.trim_end().strip_prefix(SAVED_MARKER)?;
    (!path.is_empty()).then(|| Path::new(path))
}

#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
fn parse_bytes(field: &str) -> Option<u64> {
    let field = field.trim();
    if let Ok(n) = field.parse::<u64>() {
        return Some(n);
    }
    // estimates are printed as floats
    field
        .parse::<f64>()
        .ok()
        .filter(|f| f.is_finite() && *f >= 0.0)
        .map(|f| f as u64)
}

fn clean_display(field: &str) -> String {
    let cleaned = ANSI_RE.replace_all(field, "");
    let cleaned = cleaned.trim();
    if cleaned == "NA" {
        String::new()
    } else {
        cleaned.to_string()
    }
}

/// Trait for receiving download progress updates.
///
/// Called from the task driving the engine, never concurrently with itself.
/// All methods have default no-op implementations for convenience.
pub trait DownloadProgress: Send + Sync {
    /// Called for each rendered progress event.
    fn on_progress(&self, _update: &ProgressUpdate) {}

    /// Called when the transfer is suspended.
    fn on_paused(&self) {}

    /// Called when a suspended transfer continues.
    fn on_resumed(&self) {}

    /// Called when the engine reports a final output file.
    fn on_file_saved(&self, _path: &Path) {}
}

/// A null progress implementation that ignores all events.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl DownloadProgress for NoProgress {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quarter_downloaded_is_25_percent() {
        let update = ProgressUpdate::from_event(&ProgressEvent::downloading(50, 200)).unwrap();
        assert_eq!(update.percent, 25);
    }

    #[test]
    fn zero_total_does_not_divide_by_zero() {
        let update = ProgressUpdate::from_event(&ProgressEvent::downloading(0, 0)).unwrap();
        assert_eq!(update.percent, 0);
    }

    #[test]
    fn unknown_total_is_treated_as_one() {
        let event = ProgressEvent {
            total_bytes: None,
            ..ProgressEvent::downloading(0, 0)
        };
        assert_eq!(event.effective_total(), 1);
        assert_eq!(ProgressUpdate::from_event(&event).unwrap().percent, 0);
    }

    #[test]
    fn estimate_used_when_total_missing() {
        let event = ProgressEvent {
            total_bytes: None,
            total_bytes_estimate: Some(1000),
            ..ProgressEvent::downloading(250, 0)
        };
        assert_eq!(ProgressUpdate::from_event(&event).unwrap().percent, 25);
    }

    #[test]
    fn percent_is_clamped() {
        assert_eq!(percent(500, 0), 100);
        assert_eq!(percent(u64::MAX, 1), 100);
    }

    #[test]
    fn finished_is_always_100() {
        let update = ProgressUpdate::from_event(&ProgressEvent::finished()).unwrap();
        assert_eq!(update.percent, 100);
        assert_eq!(update.status, FINISHED_STATUS);
    }

    #[test]
    fn other_status_is_ignored() {
        let event = ProgressEvent {
            status: ProgressStatus::Other("error".to_string()),
            ..ProgressEvent::downloading(10, 20)
        };
        assert!(ProgressUpdate::from_event(&event).is_none());
    }

    #[test]
    fn status_line_shows_percent_speed_eta() {
        let line = "YTDLWEB_PROGRESS|downloading|1048576|4194304|NA| 25.0%|  1.00MiB/s|00:03";
        let event = parse_progress_line(line).unwrap();
        let update = ProgressUpdate::from_event(&event).unwrap();
        assert_eq!(update.percent, 25);
        assert_eq!(update.status, "Downloading: 25.0% at 1.00MiB/s - ETA 00:03");
    }

    #[test]
    fn parse_handles_na_fields() {
        let line = "YTDLWEB_PROGRESS|downloading|2048|NA|8192.5|NA|NA|NA";
        let event = parse_progress_line(line).unwrap();
        assert_eq!(event.downloaded_bytes, Some(2048));
        assert_eq!(event.total_bytes, None);
        assert_eq!(event.total_bytes_estimate, Some(8192));
        assert!(event.percent_str.is_empty());

        let update = ProgressUpdate::from_event(&event).unwrap();
        assert_eq!(update.status, "Downloading: 25% at Unknown speed - ETA Unknown");
    }

    #[test]
    fn parse_strips_ansi_colors() {
        let line = "YTDLWEB_PROGRESS|downloading|1|2|NA|\x1b[0;94m 50.0%\x1b[0m|\x1b[0;32m2.00KiB/s\x1b[0m|\x1b[0;33m00:01\x1b[0m";
        let event = parse_progress_line(line).unwrap();
        assert_eq!(event.percent_str, "50.0%");
        assert_eq!(event.speed_str, "2.00KiB/s");
        assert_eq!(event.eta_str, "00:01");
    }

    #[test]
    fn parse_finished_record() {
        let line = "YTDLWEB_PROGRESS|finished|4194304|4194304|NA|100.0%|NA|NA\n";
        let event = parse_progress_line(line).unwrap();
        assert_eq!(event.status, ProgressStatus::Finished);
    }

    #[test]
    fn parse_rejects_unrelated_lines() {
        assert!(parse_progress_line("[youtube] dQw4w9WgXcQ: Downloading webpage").is_none());
        assert!(parse_progress_line("YTDLWEB_PROGRESS|downloading").is_none());
    }

    #[test]
    fn parse_saved_path() {
        assert_eq!(
            parse_saved_line("YTDLWEB_SAVED|downloads/MyVideo.mp4\n"),
            Some(Path::new("downloads/MyVideo.mp4"))
        );
        assert!(parse_saved_line("YTDLWEB_SAVED|").is_none());
        assert!(parse_saved_line("[Merger] Merging formats").is_none());
    }

    #[test]
    fn templates_use_markers() {
        assert!(PROGRESS_TEMPLATE.starts_with("download:"));
        assert!(PROGRESS_TEMPLATE.contains(PROGRESS_MARKER));
        assert!(SAVED_FILE_TEMPLATE.contains(SAVED_MARKER));
    }

    #[test]
    fn no_progress_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<NoProgress>();
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn percent_never_panics_and_stays_in_range(d in any::<u64>(), t in any::<u64>()) {
                prop_assert!(percent(d, t) <= 100);
            }

            #[test]
            fn percent_matches_ratio(t in 1u64..1_000_000, frac in 0u64..=100) {
                let d = t * frac / 100;
                let expected = d * 100 / t;
                prop_assert_eq!(u64::from(percent(d, t)), expected);
            }

            #[test]
            fn parse_never_panics(s in "\\PC*") {
                let _ = parse_progress_line(&s);
            }
        }
    }
}
