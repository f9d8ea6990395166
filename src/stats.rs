use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use n2k::{MessageHandler, ParsedMessage};
use tracing::info;

/// Tracks how many messages arrived per PGN and logs the tally on a fixed
/// interval, smallest PGN first.
pub struct StatsHandler {
    counts: BTreeMap<u32, u64>,
    interval: Duration,
    last_report: Instant,
}

impl StatsHandler {
    pub fn new(interval: Duration) -> Self {
        Self {
            counts: BTreeMap::new(),
            interval,
            last_report: Instant::now(),
        }
    }

    pub fn count(&self, pgn: u32) -> u64 {
        self.counts.get(&pgn).copied().unwrap_or(0)
    }

    fn report(&self) {
        info!("[Stats] messages per PGN:");
        for (pgn, count) in &self.counts {
            info!("  {pgn} => {count}");
        }
    }

    /// Log the tally if the interval has elapsed. Returns true when a
    /// report was written.
    pub fn check_and_report(&mut self) -> bool {
        if self.last_report.elapsed() >= self.interval {
            self.report();
            self.last_report = Instant::now();
            true
        } else {
            false
        }
    }
}

impl MessageHandler for StatsHandler {
    fn handle_message(&mut self, message: &ParsedMessage) {
        *self.counts.entry(message.header.pgn).or_insert(0) += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use n2k::{PgnCatalog, RawMessage, BROADCAST};

    fn message(pgn: u32) -> ParsedMessage {
        let raw = RawMessage::new(3, pgn, 7, BROADCAST).with_data(vec![0; 8]);
        PgnCatalog::standard().parse_packet(raw)
    }

    #[test]
    fn test_counts_per_pgn() {
        let mut stats = StatsHandler::new(Duration::from_secs(60));
        stats.handle_message(&message(130306));
        stats.handle_message(&message(130306));
        stats.handle_message(&message(129025));
        assert_eq!(stats.count(130306), 2);
        assert_eq!(stats.count(129025), 1);
        assert_eq!(stats.count(127250), 0);
    }

    #[test]
    fn test_report_interval() {
        let mut stats = StatsHandler::new(Duration::from_millis(30));
        assert!(!stats.check_and_report());
        std::thread::sleep(Duration::from_millis(40));
        assert!(stats.check_and_report());
        assert!(!stats.check_and_report());
    }
}
