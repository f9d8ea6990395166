use n2k::{MessageHandler, ParsedMessage};
use tracing::info;

use crate::config::DisplayConfig;

/// Prints each decoded message on one line, optionally restricted to a
/// single PGN or source address.
pub struct DisplayHandler {
    verbose: bool,
    pgn: Option<u32>,
    source: Option<u8>,
    message_count: u64,
}

impl DisplayHandler {
    pub fn new(config: &DisplayConfig) -> Self {
        Self {
            verbose: config.verbose,
            pgn: config.pgn,
            source: config.source,
            message_count: 0,
        }
    }

    pub fn message_count(&self) -> u64 {
        self.message_count
    }

    fn wants(&self, message: &ParsedMessage) -> bool {
        if let Some(pgn) = self.pgn {
            if message.header.pgn != pgn {
                return false;
            }
        }
        if let Some(source) = self.source {
            if message.header.source != source {
                return false;
            }
        }
        true
    }
}

impl MessageHandler for DisplayHandler {
    fn handle_message(&mut self, message: &ParsedMessage) {
        if !self.wants(message) {
            return;
        }
        self.message_count += 1;
        info!("{}", message.print(self.verbose));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use n2k::{PgnCatalog, RawMessage, BROADCAST};

    fn message(pgn: u32, source: u8) -> ParsedMessage {
        let raw = RawMessage::new(3, pgn, source, BROADCAST).with_data(vec![0; 8]);
        PgnCatalog::standard().parse_packet(raw)
    }

    #[test]
    fn test_counts_every_message_without_filters() {
        let mut handler = DisplayHandler::new(&DisplayConfig::default());
        handler.handle_message(&message(130306, 1));
        handler.handle_message(&message(129025, 2));
        assert_eq!(handler.message_count(), 2);
    }

    #[test]
    fn test_pgn_filter_limits_output() {
        let config = DisplayConfig {
            enabled: true,
            verbose: false,
            pgn: Some(130306),
            source: None,
        };
        let mut handler = DisplayHandler::new(&config);
        handler.handle_message(&message(130306, 1));
        handler.handle_message(&message(129025, 1));
        assert_eq!(handler.message_count(), 1);
    }

    #[test]
    fn test_source_filter_limits_output() {
        let config = DisplayConfig {
            enabled: true,
            verbose: false,
            pgn: None,
            source: Some(9),
        };
        let mut handler = DisplayHandler::new(&config);
        handler.handle_message(&message(130306, 9));
        handler.handle_message(&message(130306, 10));
        assert_eq!(handler.message_count(), 1);
    }
}
