use std::fmt;

use chrono::{DateTime, Utc};

/// Broadcast destination address.
pub const BROADCAST: u8 = 255;

/// Largest payload a fast packet train can carry (31 * 7 + 6 bytes).
pub const MAX_FAST_PACKET_LEN: usize = 223;

/// A complete PGN-level message, independent of the adapter it came from.
///
/// Produced either directly from a single physical frame or by the fast
/// packet reassembler once all fragments have arrived. Immutable once it is
/// handed to the decoder.
#[derive(Debug, Clone)]
pub struct RawMessage {
    /// Timestamp of receipt.
    pub timestamp: DateTime<Utc>,
    /// Message priority, 0 is highest.
    pub priority: u8,
    /// Parameter group number.
    pub pgn: u32,
    /// Sender address.
    pub source: u8,
    /// Destination address, [`BROADCAST`] when the PF field is >= 240.
    pub destination: u8,
    /// Declared number of payload bytes.
    pub length: u8,
    /// Payload bytes.
    pub data: Vec<u8>,
}

impl RawMessage {
    /// Header-only constructor; payload is attached by the caller.
    pub fn new(priority: u8, pgn: u32, source: u8, destination: u8) -> Self {
        Self {
            timestamp: Utc::now(),
            priority,
            pgn,
            source,
            destination,
            length: 0,
            data: Vec::new(),
        }
    }

    /// Attach a payload, setting the declared length to match.
    pub fn with_data(mut self, data: Vec<u8>) -> Self {
        self.length = data.len() as u8;
        self.data = data;
        self
    }
}

impl fmt::Display for RawMessage {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        // Timestamp Priority Source Destination Pgn Length: Data
        write!(
            f,
            "{} {} {} {} {} {}:",
            self.timestamp.format("%Y-%m-%d-%H:%M:%S%.3f"),
            self.priority,
            self.source,
            self.destination,
            self.pgn,
            self.length
        )?;
        for b in &self.data {
            write!(f, " {b:02x}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_data_sets_length() {
        let msg = RawMessage::new(6, 130306, 22, BROADCAST).with_data(vec![1, 2, 3]);
        assert_eq!(msg.length, 3);
        assert_eq!(msg.data, vec![1, 2, 3]);
    }

    #[test]
    fn test_display_contains_header_and_hex_data() {
        let msg = RawMessage::new(2, 129025, 5, BROADCAST).with_data(vec![0xAB, 0x01]);
        let s = msg.to_string();
        assert!(s.contains("129025"));
        assert!(s.contains("ab 01"));
    }
}
