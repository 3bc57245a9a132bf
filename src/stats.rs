//! Transfer statistics.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use serde::Serialize;

/// Summary of one finished transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TransferStats {
    /// Highest cumulative byte count reported by the engine.
    pub bytes: u64,
    /// Wall-clock time from start to finish.
    pub elapsed: Duration,
    /// Average speed in bytes per second.
    pub average_speed: u64,
}

impl TransferStats {
    /// Creates stats from a byte count and elapsed time.
    #[must_use]
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    pub fn new(bytes: u64, elapsed: Duration) -> Self {
        let secs = elapsed.as_secs_f64();
        let average_speed = if secs > 0.0 {
            (bytes as f64 / secs) as u64
        } else {
            0
        };
        Self {
            bytes,
            elapsed,
            average_speed,
        }
    }
}

/// Tracks cumulative progress reports during a transfer.
///
/// The engine reports *cumulative* bytes per stream, and a video+audio
/// download restarts the count for the second stream, so completed streams
/// are banked whenever the count drops.
pub struct TransferStatsTracker {
    start_time: Instant,
    banked: AtomicU64,
    current: AtomicU64,
}

impl Default for TransferStatsTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl TransferStatsTracker {
    /// Starts tracking now.
    #[must_use]
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            banked: AtomicU64::new(0),
            current: AtomicU64::new(0),
        }
    }

    /// Records a cumulative byte count for the current stream.
    pub fn record_cumulative(&self, bytes: u64) {
        let previous = self.current.fetch_max(bytes, Ordering::Relaxed);
        if bytes < previous / 2 {
            // a new stream started; bank the finished one
            self.banked.fetch_add(previous, Ordering::Relaxed);
            self.current.store(bytes, Ordering::Relaxed);
        }
    }

    /// Returns the total bytes seen so far.
    #[must_use]
    pub fn bytes(&self) -> u64 {
        self.banked.load(Ordering::Relaxed) + self.current.load(Ordering::Relaxed)
    }

    /// Returns the elapsed time since tracking started.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Freezes the tracker into final statistics.
    #[must_use]
    pub fn finish(&self) -> TransferStats {
        TransferStats::new(self.bytes(), self.elapsed())
    }
}
