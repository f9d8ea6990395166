//! Actisense NGT-1 adapter: a length-prefixed, checksummed, byte-stuffed
//! envelope over a serial byte stream.
//!
//! The envelope is `<DLE><STX><COMMAND><LEN><CMD DATA><CRC><DLE><ETX>`.
//! `LEN` is the length of the unescaped command data, any DLE byte in the
//! data is doubled, and `CRC` makes the unescaped body (command, length,
//! data, checksum) sum to zero modulo 256.

use std::io::{Read, Write};

use tracing::{debug, info};

use crate::catalog::ACTISENSE_BEM;
use crate::error::{FramingError, LengthError, ProtocolError};
use crate::raw_message::{RawMessage, MAX_FAST_PACKET_LEN};

/// Packet start and stop markers.
const STX: u8 = 0x02;
const ETX: u8 = 0x03;
const DLE: u8 = 0x10;

/// N2K commands.
pub const N2K_MSG_RECEIVED: u8 = 0x93;
pub const N2K_MSG_SEND: u8 = 0x94;

/// NGT device commands.
pub const NGT_MSG_RECEIVED: u8 = 0xA0;
pub const NGT_MSG_SEND: u8 = 0xA1;

/* The startup command is reverse engineered from Actisense NMEAreader. It
 * instructs the NGT1 to clear its PGN message TX list, thus it starts
 * sending all PGNs. */
const NGT_STARTUP_SEQ: [u8; 3] = [0x11, 0x02, 0x00];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FramerState {
    Start,
    Escape,
    Message,
}

/// Byte-at-a-time state machine recovering envelopes from the stream.
#[derive(Debug)]
pub struct ActisenseFramer {
    state: FramerState,
    buf: Vec<u8>,
}

impl Default for ActisenseFramer {
    fn default() -> Self {
        Self::new()
    }
}

impl ActisenseFramer {
    pub fn new() -> Self {
        Self {
            state: FramerState::Start,
            buf: Vec::new(),
        }
    }

    /// Feed one byte. Returns a message when an envelope completes and
    /// passes validation; protocol violations discard the buffer and
    /// resynchronize.
    pub fn push(&mut self, byte: u8) -> Option<RawMessage> {
        match self.state {
            FramerState::Escape => {
                if byte == ETX {
                    let result = message_received(&self.buf);
                    self.buf.clear();
                    self.state = FramerState::Start;
                    match result {
                        Ok(msg) => return Some(msg),
                        Err(err) => debug!(%err, "discarding envelope"),
                    }
                } else if byte == STX {
                    // Resynchronization: a new envelope begins, whatever was
                    // accumulated is dropped.
                    self.buf.clear();
                    self.state = FramerState::Message;
                } else if byte == DLE {
                    // Doubled escape, a literal DLE data byte.
                    self.buf.push(byte);
                    self.state = FramerState::Message;
                } else {
                    debug!(
                        err = %FramingError::BadEscape { byte },
                        "discarding partial envelope"
                    );
                    self.buf.clear();
                    self.state = FramerState::Start;
                }
            }
            FramerState::Message => {
                if byte == DLE {
                    self.state = FramerState::Escape;
                } else {
                    self.buf.push(byte);
                }
            }
            FramerState::Start => {
                if byte == DLE {
                    self.state = FramerState::Escape;
                }
            }
        }
        None
    }
}

/// Validate a complete unescaped body and dispatch on its command byte.
fn message_received(body: &[u8]) -> Result<RawMessage, ProtocolError> {
    if body.len() < 3 {
        return Err(FramingError::ShortBody { len: body.len() }.into());
    }

    let residue = body.iter().fold(0u8, |sum, b| sum.wrapping_add(*b));
    if residue != 0 {
        return Err(FramingError::Checksum { residue }.into());
    }

    match body[0] {
        N2K_MSG_RECEIVED => n2k_message_received(&body[1..]),
        NGT_MSG_RECEIVED => ngt_message_received(&body[1..]),
        command => Err(FramingError::UnknownCommand { command }.into()),
    }
}

/// A bus message forwarded by the NGT1: length, priority, 3-byte PGN,
/// destination, source, a 4-byte device timestamp (skipped), payload
/// length, payload.
fn n2k_message_received(msg: &[u8]) -> Result<RawMessage, ProtocolError> {
    if (msg[0] as usize) < 11 || msg.len() < 12 {
        return Err(LengthError::Mismatch {
            declared: msg[0] as usize,
            available: msg.len(),
        }
        .into());
    }

    let payload_len = msg[11] as usize;
    if payload_len > MAX_FAST_PACKET_LEN {
        return Err(LengthError::TooLong {
            declared: payload_len,
            max: MAX_FAST_PACKET_LEN,
        }
        .into());
    }
    if msg.len() < 12 + payload_len {
        return Err(LengthError::Mismatch {
            declared: payload_len,
            available: msg.len() - 12,
        }
        .into());
    }

    let pgn = u32::from(msg[2]) | u32::from(msg[3]) << 8 | u32::from(msg[4]) << 16;
    let mut raw = RawMessage::new(msg[1], pgn, msg[6], msg[5]);
    raw.length = msg[11];
    raw.data = msg[12..12 + payload_len].to_vec();
    Ok(raw)
}

/// A device-internal NGT message, synthesized into the PGN namespace by
/// offsetting its subtype byte.
fn ngt_message_received(msg: &[u8]) -> Result<RawMessage, ProtocolError> {
    let declared = msg[0] as usize;
    if declared < 12 || msg.len() < declared + 1 {
        return Err(LengthError::Mismatch {
            declared,
            available: msg.len(),
        }
        .into());
    }

    let mut raw = RawMessage::new(0, ACTISENSE_BEM + u32::from(msg[1]), 0, 0);
    raw.length = (declared - 1) as u8;
    raw.data = msg[2..declared + 1].to_vec();
    Ok(raw)
}

/// Wrap a command and payload in the NGT envelope: DLE bytes in the payload
/// are doubled and the checksum makes the unescaped body sum to zero.
pub fn encode(command: u8, payload: &[u8]) -> Vec<u8> {
    let mut out = vec![DLE, STX, command, payload.len() as u8];

    let mut crc = command;
    for &b in payload {
        if b == DLE {
            out.push(DLE);
        }
        out.push(b);
        crc = crc.wrapping_add(b);
    }
    crc = crc.wrapping_add(payload.len() as u8);

    out.push(crc.wrapping_neg());
    out.push(DLE);
    out.push(ETX);
    out
}

/// An NGT-1 attached to a byte stream.
pub struct ActisensePort<P: Read + Write> {
    port: P,
    framer: ActisenseFramer,
}

impl<P: Read + Write> ActisensePort<P> {
    /// Open the channel: sends the startup sequence so the device forwards
    /// every PGN.
    pub fn open(mut port: P) -> std::io::Result<Self> {
        port.write_all(&encode(NGT_MSG_SEND, &NGT_STARTUP_SEQ))?;
        info!("Actisense channel open, TX PGN list cleared");
        Ok(Self {
            port,
            framer: ActisenseFramer::new(),
        })
    }

    /// Blocking read loop: consumes bytes until an envelope completes.
    pub fn read_message(&mut self) -> std::io::Result<RawMessage> {
        let mut byte = [0u8; 1];
        loop {
            let n = self.port.read(&mut byte)?;
            if n == 0 {
                return Err(std::io::Error::new(
                    std::io::ErrorKind::UnexpectedEof,
                    "byte source exhausted",
                ));
            }
            if let Some(msg) = self.framer.push(byte[0]) {
                return Ok(msg);
            }
        }
    }

    /// Send a transmit buffer to the bus wrapped as an N2K send command.
    pub fn write_frame(&mut self, payload: &[u8]) -> std::io::Result<usize> {
        self.write_command(N2K_MSG_SEND, payload)
    }

    /// Send an arbitrary command envelope (device configuration uses the
    /// NGT command space).
    pub fn write_command(&mut self, command: u8, payload: &[u8]) -> std::io::Result<usize> {
        let envelope = encode(command, payload);
        self.port.write_all(&envelope)?;
        Ok(envelope.len())
    }
}

impl<P: Read + Write> std::fmt::Debug for ActisensePort<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("ActisensePort").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checksum_of(body: &[u8]) -> u8 {
        body.iter().fold(0u8, |s, b| s.wrapping_add(*b)).wrapping_neg()
    }

    /// Build a receive envelope around an unescaped body (command, length
    /// and payload; the checksum is appended here).
    fn envelope(command: u8, payload: &[u8]) -> Vec<u8> {
        let mut body = vec![command, payload.len() as u8];
        body.extend_from_slice(payload);
        body.push(checksum_of(&body));

        let mut wire = vec![DLE, STX];
        for &b in &body {
            if b == DLE {
                wire.push(DLE);
            }
            wire.push(b);
        }
        wire.extend_from_slice(&[DLE, ETX]);
        wire
    }

    fn push_all(framer: &mut ActisenseFramer, bytes: &[u8]) -> Option<RawMessage> {
        let mut result = None;
        for &b in bytes {
            if let Some(msg) = framer.push(b) {
                result = Some(msg);
            }
        }
        result
    }

    /// N2K receive command data; the envelope's length byte doubles as the
    /// declared length the parser validates.
    fn n2k_payload(priority: u8, pgn: u32, dst: u8, src: u8, data: &[u8]) -> Vec<u8> {
        let mut p = vec![
            priority,
            pgn as u8,
            (pgn >> 8) as u8,
            (pgn >> 16) as u8,
            dst,
            src,
            0,
            0,
            0,
            0, // device timestamp, skipped on receive
            data.len() as u8,
        ];
        p.extend_from_slice(data);
        p
    }

    #[test]
    fn test_encode_checksum_sums_to_zero() {
        for payload in [&[][..], &[1, 2, 3][..], &[0x10, 0x01][..], &[0xFF; 20][..]] {
            let wire = encode(N2K_MSG_SEND, payload);
            // Unescape and drop the framing markers, then sum the body.
            let mut body = Vec::new();
            let mut i = 2;
            while i < wire.len() - 2 {
                if wire[i] == DLE {
                    i += 1;
                }
                body.push(wire[i]);
                i += 1;
            }
            let sum = body.iter().fold(0u8, |s, b| s.wrapping_add(*b));
            assert_eq!(sum, 0, "payload {payload:?}");
        }
    }

    #[test]
    fn test_encode_doubles_escape_bytes() {
        let wire = encode(N2K_MSG_SEND, &[0x10, 0x01]);
        // DLE STX, command, length, doubled DLE, 0x01, CRC, DLE ETX.
        assert_eq!(
            wire,
            vec![0x10, 0x02, 0x94, 0x02, 0x10, 0x10, 0x01, 0x59, 0x10, 0x03]
        );
    }

    #[test]
    fn test_escaped_payload_round_trips_through_framer() {
        // Payload containing the escape value survives encode + decode.
        let data = [0x10, 0x01, 0x10, 0x10, 0x42];
        let wire = envelope(N2K_MSG_RECEIVED, &n2k_payload(2, 127250, 255, 23, &data));

        let mut framer = ActisenseFramer::new();
        let msg = push_all(&mut framer, &wire).expect("message should decode");
        assert_eq!(msg.pgn, 127250);
        assert_eq!(msg.priority, 2);
        assert_eq!(msg.source, 23);
        assert_eq!(msg.destination, 255);
        assert_eq!(msg.data, data);
    }

    #[test]
    fn test_bad_checksum_discards_message() {
        let mut wire = envelope(N2K_MSG_RECEIVED, &n2k_payload(2, 127250, 255, 23, &[1, 2]));
        // Corrupt one payload byte without touching the framing.
        wire[14] ^= 0x04;
        let mut framer = ActisenseFramer::new();
        assert!(push_all(&mut framer, &wire).is_none());

        // The framer has resynchronized and accepts the next envelope.
        let good = envelope(N2K_MSG_RECEIVED, &n2k_payload(2, 127250, 255, 23, &[1, 2]));
        assert!(push_all(&mut framer, &good).is_some());
    }

    #[test]
    fn test_restart_marker_discards_partial_buffer() {
        let mut framer = ActisenseFramer::new();
        // Half an envelope...
        for b in [DLE, STX, 0x93, 0x05, 0x01] {
            assert!(framer.push(b).is_none());
        }
        // ...interrupted by a fresh, complete one.
        let good = envelope(NGT_MSG_RECEIVED, &{
            let mut p = vec![0xf0];
            p.extend_from_slice(&[0; 12]);
            p
        });
        let msg = push_all(&mut framer, &good).expect("second envelope decodes");
        assert_eq!(msg.pgn, ACTISENSE_BEM + 0xf0);
    }

    #[test]
    fn test_unexpected_byte_after_escape_resynchronizes() {
        let mut framer = ActisenseFramer::new();
        for b in [DLE, STX, 0x93, DLE, 0x55] {
            assert!(framer.push(b).is_none());
        }
        let good = envelope(N2K_MSG_RECEIVED, &n2k_payload(1, 60928, 255, 5, &[0; 8]));
        assert!(push_all(&mut framer, &good).is_some());
    }

    #[test]
    fn test_short_body_discarded() {
        let mut framer = ActisenseFramer::new();
        let wire = [DLE, STX, 0x93, 0x6D, DLE, ETX];
        assert!(push_all(&mut framer, &wire).is_none());
    }

    #[test]
    fn test_n2k_message_too_long_discarded() {
        let mut payload = n2k_payload(2, 127250, 255, 23, &[0; 16]);
        payload[10] = 224; // beyond the fast packet maximum
        let wire = envelope(N2K_MSG_RECEIVED, &payload);
        let mut framer = ActisenseFramer::new();
        assert!(push_all(&mut framer, &wire).is_none());
    }

    #[test]
    fn test_ngt_message_synthesizes_pgn() {
        let mut payload = vec![0xf0];
        payload.extend_from_slice(&[0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0A, 0x0B, 0x0C, 0x0D]);
        let wire = envelope(NGT_MSG_RECEIVED, &payload);
        let mut framer = ActisenseFramer::new();
        let msg = push_all(&mut framer, &wire).expect("device message decodes");
        assert_eq!(msg.pgn, ACTISENSE_BEM + 0xf0);
        assert_eq!(msg.priority, 0);
        assert_eq!(msg.source, 0);
        assert_eq!(msg.destination, 0);
        assert_eq!(msg.length, 13);
        assert_eq!(msg.data.len(), 13);
    }

    #[test]
    fn test_ngt_message_shorter_than_minimum_discarded() {
        let wire = envelope(NGT_MSG_RECEIVED, &[0xf0, 1, 2, 3, 4]);
        let mut framer = ActisenseFramer::new();
        assert!(push_all(&mut framer, &wire).is_none());
    }

    struct MockPort {
        input: std::io::Cursor<Vec<u8>>,
        written: Vec<u8>,
    }

    impl Read for MockPort {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            self.input.read(buf)
        }
    }

    impl Write for MockPort {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.written.extend_from_slice(buf);
            Ok(buf.len())
        }
        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_open_sends_startup_sequence_and_reads_stream() {
        let wire = envelope(N2K_MSG_RECEIVED, &n2k_payload(3, 129025, 255, 7, &[0; 8]));
        let mut port = ActisensePort::open(MockPort {
            input: std::io::Cursor::new(wire),
            written: Vec::new(),
        })
        .unwrap();

        let msg = port.read_message().unwrap();
        assert_eq!(msg.pgn, 129025);
        assert_eq!(port.port.written, encode(NGT_MSG_SEND, &NGT_STARTUP_SEQ));

        // Stream exhausted.
        let err = port.read_message().unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::UnexpectedEof);
    }
}
