//! Human-readable sizes, speeds, and durations for logs and the CLI summary.

use std::time::Duration;

/// Formats a byte count using binary units (B, KiB, MiB, GiB), as the
/// engine does in its own progress strings.
#[allow(clippy::cast_precision_loss)]
#[must_use]
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["KiB", "MiB", "GiB", "TiB"];

    if bytes < 1024 {
        return format!("{bytes} B");
    }
    let mut value = bytes as f64 / 1024.0;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{value:.2} {}", UNITS[unit])
}

/// Formats a transfer rate in bytes per second.
#[must_use]
pub fn format_speed(bytes_per_sec: u64) -> String {
    format!("{}/s", format_bytes(bytes_per_sec))
}

/// Formats a duration as e.g. "5.0s", "1m 05s", "1h 01m 05s".
#[must_use]
pub fn format_duration(d: Duration) -> String {
    let secs = d.as_secs();
    match secs {
        3600.. => format!(
            "{}h {:02}m {:02}s",
            secs / 3600,
            (secs % 3600) / 60,
            secs % 60
        ),
        60.. => format!("{}m {:02}s", secs / 60, secs % 60),
        _ => format!("{}.{:01}s", secs, d.subsec_millis() / 100),
    }
}
