//! Periodic status reporting.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Instant;
use tracing::info;

/// Counters for the periodic status line.
///
/// Shared between the stream observers (which count messages) and the
/// orchestrator's interval task (which logs).
pub struct StatusReporter {
    started_at: Instant,
    messages: AtomicU64,
    tracked_markets: AtomicUsize,
}

impl StatusReporter {
    pub fn new() -> Self {
        Self {
            started_at: Instant::now(),
            messages: AtomicU64::new(0),
            tracked_markets: AtomicUsize::new(0),
        }
    }

    /// Count one processed stream message.
    pub fn record_message(&self) {
        self.messages.fetch_add(1, Ordering::Relaxed);
    }

    pub fn set_tracked_markets(&self, count: usize) {
        self.tracked_markets.store(count, Ordering::Relaxed);
    }

    pub fn message_count(&self) -> u64 {
        self.messages.load(Ordering::Relaxed)
    }

    pub fn uptime_secs(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }

    /// Emit the status line.
    pub fn log_status(&self) {
        info!(
            uptime_secs = self.uptime_secs(),
            messages = self.message_count(),
            tracked_markets = self.tracked_markets.load(Ordering::Relaxed),
            "Status"
        );
    }
}

impl Default for StatusReporter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_counter() {
        let reporter = StatusReporter::new();
        assert_eq!(reporter.message_count(), 0);
        reporter.record_message();
        reporter.record_message();
        assert_eq!(reporter.message_count(), 2);
    }

    #[test]
    fn test_tracked_markets_overwrites() {
        let reporter = StatusReporter::new();
        reporter.set_tracked_markets(20);
        reporter.set_tracked_markets(18);
        assert_eq!(reporter.tracked_markets.load(Ordering::Relaxed), 18);
    }
}
