//! # Sync Metrics
//!
//! Counters over executed sync passes, for diagnostics and the status view.

use std::time::{Duration, Instant};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncMetrics {
    /// Executed passes (no-op passes are not counted)
    pub total_passes: u64,
    /// Records confirmed by the server
    pub records_synced: u64,
    /// Failed create calls, counted per attempt
    pub records_failed: u64,
    /// Records moved to dead letters
    pub records_dead_lettered: u64,
    pub average_pass_duration: Duration,
    pub last_pass_duration: Option<Duration>,
}

impl SyncMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a finished pass that started at `started`
    pub fn record_pass(&mut self, started: Instant, synced: usize, failed: usize, dead: usize) {
        let duration = started.elapsed();
        self.total_passes += 1;
        self.records_synced += synced as u64;
        self.records_failed += failed as u64;
        self.records_dead_lettered += dead as u64;
        self.last_pass_duration = Some(duration);

        // Rolling average
        let previous = self.average_pass_duration * (self.total_passes - 1) as u32;
        self.average_pass_duration = (previous + duration) / self.total_passes as u32;
    }

    /// Share of create calls that succeeded
    pub fn success_rate(&self) -> f64 {
        let attempts = self.records_synced + self.records_failed;
        if attempts == 0 {
            0.0
        } else {
            self.records_synced as f64 / attempts as f64
        }
    }
}
