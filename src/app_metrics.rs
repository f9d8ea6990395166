use std::time::{Duration, Instant};
use tracing::info;

/// Application-level counters for the decode pipeline and its consumers.
pub struct AppMetrics {
    /// Number of complete NMEA2000 messages received from the pipeline
    pub nmea_messages: u64,
    /// Messages that fell back to the generic unknown-PGN definition
    pub unknown_pgns: u64,
    /// Messages dropped by the source filter
    pub filtered_messages: u64,
}

impl AppMetrics {
    /// Create a new AppMetrics instance with all counters at zero
    pub fn new() -> Self {
        Self {
            nmea_messages: 0,
            unknown_pgns: 0,
            filtered_messages: 0,
        }
    }

    /// Reset all counters to zero
    pub fn reset(&mut self) {
        self.nmea_messages = 0;
        self.unknown_pgns = 0;
        self.filtered_messages = 0;
    }

    /// Log current metrics to the info log
    pub fn log(&self) {
        info!(
            "[Metrics] NMEA messages: {}, Unknown PGNs: {}, Filtered: {}",
            self.nmea_messages, self.unknown_pgns, self.filtered_messages
        );
    }
}

impl Default for AppMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Manages periodic logging of application metrics
pub struct MetricsLogger {
    last_log: Instant,
    log_interval: Duration,
}

impl MetricsLogger {
    /// Create a new MetricsLogger with the specified logging interval
    pub fn new(log_interval: Duration) -> Self {
        Self {
            last_log: Instant::now(),
            log_interval,
        }
    }

    /// Check if it's time to log metrics, and if so, log them and reset
    /// Returns true if metrics were logged
    pub fn check_and_log(&mut self, metrics: &mut AppMetrics) -> bool {
        if self.last_log.elapsed() >= self.log_interval {
            metrics.log();
            metrics.reset();
            self.last_log = Instant::now();
            true
        } else {
            false
        }
    }
}
