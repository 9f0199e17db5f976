//! Recording timer
//!
//! Elapsed time is the accumulated time of previous runs plus the time since
//! the current run started, measured on a monotonic clock. The accumulator is
//! only cleared by `reset`, so a stopped timer keeps showing its final value.

use tokio::time::Instant;

/// Display value of a timer that has never run
pub const ZERO_DISPLAY: &str = "00:00:00";

/// Monotonic recording timer
#[derive(Debug, Clone, Default)]
pub struct RecordingTimer {
    started_at: Option<Instant>,
    accumulated_ms: u64,
}

impl RecordingTimer {
    /// Create a stopped timer at zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Start (or resume) counting from `now`. No-op if already running.
    pub fn start(&mut self, now: Instant) {
        if self.started_at.is_none() {
            self.started_at = Some(now);
        }
    }

    /// Stop counting and fold the current run into the accumulator.
    /// Returns the frozen elapsed value.
    pub fn stop(&mut self, now: Instant) -> u64 {
        if let Some(started_at) = self.started_at.take() {
            self.accumulated_ms += now.saturating_duration_since(started_at).as_millis() as u64;
        }
        self.accumulated_ms
    }

    /// Clear the accumulator. Only the transition to Idle does this.
    pub fn reset(&mut self) {
        self.started_at = None;
        self.accumulated_ms = 0;
    }

    /// Check if the timer is running
    pub fn is_running(&self) -> bool {
        self.started_at.is_some()
    }

    /// Elapsed milliseconds as of `now`
    pub fn elapsed_ms(&self, now: Instant) -> u64 {
        let current = self
            .started_at
            .map(|s| now.saturating_duration_since(s).as_millis() as u64)
            .unwrap_or(0);
        self.accumulated_ms + current
    }

    /// Elapsed time as `HH:MM:SS`
    pub fn display(&self, now: Instant) -> String {
        format_elapsed(self.elapsed_ms(now))
    }
}

/// Format milliseconds as zero-padded `HH:MM:SS` (hours are not wrapped)
pub fn format_elapsed(ms: u64) -> String {
    let total_secs = ms / 1000;
    let hours = total_secs / 3600;
    let minutes = (total_secs / 60) % 60;
    let seconds = total_secs % 60;
    format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
}
