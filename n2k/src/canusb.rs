//! CANUSB adapter: printable-hex ASCII framing over a serial byte stream.
//!
//! Each frame is a line `<prefix><id-hex><length-nibble><data-hex-pairs>`
//! terminated by a carriage return. The prefix selects standard ('t'/'r',
//! 3 identifier digits) or extended ('T'/'R', 8 digits) frames. Because the
//! adapter surfaces single CAN frames, fast packet PGNs are reassembled
//! here before a message is handed on.

use std::io::{Read, Write};

use tracing::{debug, info};

use crate::error::{FramingError, LengthError, ProtocolError};
use crate::fast_packet::FastPacketAssembler;
use crate::raw_message::{RawMessage, BROADCAST, MAX_FAST_PACKET_LEN};

/// Frame kind, taken from the line prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    Standard,
    Extended,
    StandardRemote,
    ExtendedRemote,
}

/// One physical CAN frame recovered from a line.
#[derive(Debug, Clone)]
pub struct CanFrame {
    pub kind: FrameKind,
    /// Full 29-bit (or 11-bit) identifier.
    pub id: u32,
    pub message: RawMessage,
}

fn hex_field(line: &[u8], part: &'static str) -> Result<u32, ProtocolError> {
    let text = std::str::from_utf8(line).map_err(|_| FramingError::BadHex { part })?;
    u32::from_str_radix(text, 16).map_err(|_| FramingError::BadHex { part }.into())
}

/// Parse one frame line (without the terminating carriage return).
pub fn parse_frame(line: &[u8]) -> Result<CanFrame, ProtocolError> {
    let Some(&prefix) = line.first() else {
        return Err(FramingError::ShortBody { len: 0 }.into());
    };

    let (kind, id_digits) = match prefix {
        b't' => (FrameKind::Standard, 3),
        b'T' => (FrameKind::Extended, 8),
        b'r' => (FrameKind::StandardRemote, 3),
        b'R' => (FrameKind::ExtendedRemote, 8),
        _ => return Err(FramingError::BadPrefix { prefix }.into()),
    };

    if line.len() < 1 + id_digits + 1 {
        return Err(FramingError::ShortBody { len: line.len() }.into());
    }

    let id = hex_field(&line[1..1 + id_digits], "identifier")?;

    // 29-bit identifier: priority in the top 6 bits, source in the low 8,
    // PGN in bits 8-25. The PF byte decides addressing: >= 240 is broadcast
    // and the PS byte belongs to the PGN, otherwise PS is the destination.
    let priority = (id >> 26) as u8;
    let source = id as u8;
    let pf = (id >> 16) & 0xFF;
    let (destination, pgn) = if pf >= 240 {
        (BROADCAST, (id >> 8) & 0x3FFFF)
    } else {
        (((id >> 8) & 0xFF) as u8, (id >> 8) & 0x3FF00)
    };

    let length = hex_field(&line[1 + id_digits..2 + id_digits], "length")?;
    if length > 8 {
        return Err(LengthError::BadFrameLength(length as u8).into());
    }

    let hex = &line[2 + id_digits..];
    if hex.len() % 2 != 0 || hex.len() / 2 != length as usize {
        return Err(LengthError::Mismatch {
            declared: length as usize,
            available: hex.len() / 2,
        }
        .into());
    }

    let mut data = Vec::with_capacity(length as usize);
    for pair in hex.chunks(2) {
        data.push(hex_field(pair, "data")? as u8);
    }

    Ok(CanFrame {
        kind,
        id,
        message: RawMessage::new(priority, pgn, source, destination).with_data(data),
    })
}

/// Render a transmit buffer (`[priority, pgn hi/mid/lo, destination,
/// length, data...]`) into the extended-frame line the adapter expects.
pub fn render_frame(buf: &[u8], source: u8) -> Result<String, ProtocolError> {
    if buf.len() < 6 {
        return Err(FramingError::ShortBody { len: buf.len() }.into());
    }
    let priority = buf[0];
    let mut pgn = [buf[1], buf[2], buf[3]];
    let destination = buf[4];
    let length = buf[5] as usize;

    if length > 8 {
        return Err(LengthError::BadFrameLength(length as u8).into());
    }
    if buf.len() < 6 + length {
        return Err(LengthError::Mismatch {
            declared: length,
            available: buf.len() - 6,
        }
        .into());
    }

    // Addressed PGNs carry the destination in the PS byte.
    if pgn[1] < 240 {
        pgn[2] = destination;
    }

    let mut line = format!(
        "T{:02X}{:02X}{:02X}{:02X}{:1X}",
        (priority << 2) | (pgn[0] & 0x1),
        pgn[1],
        pgn[2],
        source,
        length
    );
    for b in &buf[6..6 + length] {
        line.push_str(&format!("{b:02X}"));
    }
    line.push('\r');
    Ok(line)
}

/// A CANUSB adapter attached to a byte stream. Owns its fast packet
/// reassembly state and the claimed source address.
pub struct CanUsbPort<P: Read + Write> {
    port: P,
    address: u8,
    assembler: FastPacketAssembler,
    line: Vec<u8>,
    in_frame: bool,
    tx_group: u8,
}

impl<P: Read + Write> CanUsbPort<P> {
    /// Open the CAN channel: set the bus speed to 250k, open the bus and
    /// claim the preferred source address.
    pub fn open(mut port: P, address: u8, assembler: FastPacketAssembler) -> std::io::Result<Self> {
        port.write_all(b"S5\r")?; // S5 = 250k
        port.write_all(b"O\r")?;

        let mut this = Self {
            port,
            address,
            assembler,
            line: Vec::new(),
            in_frame: false,
            tx_group: 0,
        };
        this.address_claim()?;
        info!(address, "CANUSB channel open");
        Ok(this)
    }

    /// Close the CAN channel. Must happen before the serial port goes away.
    pub fn close_channel(&mut self) -> std::io::Result<()> {
        self.port.write_all(b"C\r")
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    /// Transmit an ISO Address Claim (PGN 60928) for our address.
    fn address_claim(&mut self) -> std::io::Result<usize> {
        let unique: u32 = 0x1fffff;
        let manufacturer: u32 = 100;
        let function: u32 = 25;
        let class: u32 = 25;
        let industry_code: u32 = 4;
        let arbitrary_address: u32 = 1;

        let name_low = unique | manufacturer << 21;
        let name_high =
            function << 8 | class << 17 | industry_code << 28 | arbitrary_address << 31;

        let mut data = [0u8; 8];
        data[..4].copy_from_slice(&name_low.to_le_bytes());
        data[4..].copy_from_slice(&name_high.to_le_bytes());

        let claim = RawMessage::new(2, 60928, self.address, BROADCAST).with_data(data.to_vec());
        self.send(&claim)
    }

    /// Blocking read loop: accumulates line bytes, parses frames and runs
    /// fast packet reassembly until a complete message is available.
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
            let b = byte[0];

            if matches!(b, b't' | b'T' | b'r' | b'R') {
                self.line.clear();
                self.line.push(b);
                self.in_frame = true;
            } else if b == b'\r' && self.in_frame {
                let line = std::mem::take(&mut self.line);
                self.in_frame = false;
                match parse_frame(&line) {
                    Ok(frame) => {
                        if let Some(msg) = self.assembler.accept(frame.message) {
                            return Ok(msg);
                        }
                    }
                    Err(err) => debug!(%err, "dropping frame line"),
                }
            } else if self.in_frame {
                self.line.push(b);
            }
        }
    }

    /// Write a single-frame transmit buffer.
    pub fn write_frame(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let line = render_frame(buf, self.address)
            .map_err(|err| std::io::Error::new(std::io::ErrorKind::InvalidInput, err))?;
        self.port.write_all(line.as_bytes())?;
        Ok(line.len())
    }

    /// Send a message, splitting payloads beyond one frame into a fast
    /// packet train: frame 0 carries the total length plus the first six
    /// bytes, every later frame a sequence byte plus up to seven more.
    pub fn send(&mut self, msg: &RawMessage) -> std::io::Result<usize> {
        let mut buf = [0u8; 14];
        buf[0] = msg.priority;
        buf[1] = ((msg.pgn & 0xf0000) >> 16) as u8;
        buf[2] = ((msg.pgn & 0xff00) >> 8) as u8;
        buf[3] = msg.pgn as u8;
        buf[4] = msg.destination;

        let data_len = msg.data.len();
        if data_len <= 8 {
            buf[5] = msg.length;
            buf[6..6 + data_len].copy_from_slice(&msg.data);
            return self.write_frame(&buf[..6 + data_len]);
        }
        if data_len > MAX_FAST_PACKET_LEN {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "payload exceeds fast packet maximum",
            ));
        }

        let group = self.tx_group & 0x7;
        self.tx_group = self.tx_group.wrapping_add(1);

        let mut total = 0;
        let mut offset = 0;
        let mut seq: u8 = 0;
        while offset < data_len {
            let mut frame = [0u8; 8];
            frame[0] = (seq & 0x1f) | group << 5;

            let used = if seq == 0 {
                frame[1] = data_len as u8;
                let chunk = data_len.min(6);
                frame[2..2 + chunk].copy_from_slice(&msg.data[..chunk]);
                offset += chunk;
                chunk + 2
            } else {
                let chunk = (data_len - offset).min(7);
                frame[1..1 + chunk].copy_from_slice(&msg.data[offset..offset + chunk]);
                offset += chunk;
                chunk + 1
            };

            buf[5] = used as u8;
            buf[6..6 + used].copy_from_slice(&frame[..used]);
            total += self.write_frame(&buf[..6 + used])?;
            seq += 1;
        }
        Ok(total)
    }
}

impl<P: Read + Write> std::fmt::Debug for CanUsbPort<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("CanUsbPort")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fast_packet::FastPacketRegistry;

    fn assembler_with(pgns: &[u32]) -> FastPacketAssembler {
        let mut registry = FastPacketRegistry::new();
        for &pgn in pgns {
            registry.add(pgn);
        }
        FastPacketAssembler::new(registry)
    }

    #[test]
    fn test_parse_extended_broadcast_frame() {
        // Priority 2, PGN 127250, source 0x0A.
        let frame = parse_frame(b"T09F1120A80102030405060708").unwrap();
        assert_eq!(frame.kind, FrameKind::Extended);
        assert_eq!(frame.message.priority, 2);
        assert_eq!(frame.message.pgn, 127250);
        assert_eq!(frame.message.source, 0x0A);
        assert_eq!(frame.message.destination, BROADCAST);
        assert_eq!(frame.message.length, 8);
        assert_eq!(frame.message.data, vec![1, 2, 3, 4, 5, 6, 7, 8]);
    }

    #[test]
    fn test_parse_extended_addressed_frame() {
        // PGN 59904 (PF 0xEA < 240): PS byte is the destination.
        let frame = parse_frame(b"T18EA2215300EA00").unwrap();
        assert_eq!(frame.message.priority, 6);
        assert_eq!(frame.message.pgn, 59904);
        assert_eq!(frame.message.destination, 0x22);
        assert_eq!(frame.message.source, 0x15);
        assert_eq!(frame.message.data, vec![0x00, 0xEA, 0x00]);
    }

    #[test]
    fn test_parse_standard_frame_prefix() {
        let frame = parse_frame(b"t1230").unwrap();
        assert_eq!(frame.kind, FrameKind::Standard);
        assert_eq!(frame.id, 0x123);
        assert!(frame.message.data.is_empty());
    }

    #[test]
    fn test_parse_rejects_unknown_prefix() {
        assert!(matches!(
            parse_frame(b"X09F1120A80102030405060708"),
            Err(ProtocolError::Framing(FramingError::BadPrefix { prefix: b'X' }))
        ));
    }

    #[test]
    fn test_parse_rejects_length_beyond_frame() {
        assert!(matches!(
            parse_frame(b"T09F1120A9010203040506070809"),
            Err(ProtocolError::Length(LengthError::BadFrameLength(9)))
        ));
    }

    #[test]
    fn test_parse_rejects_data_length_mismatch() {
        // Declares 8 bytes but carries 7.
        assert!(matches!(
            parse_frame(b"T09F1120A801020304050607"),
            Err(ProtocolError::Length(LengthError::Mismatch { .. }))
        ));
    }

    #[test]
    fn test_parse_rejects_bad_hex() {
        assert!(matches!(
            parse_frame(b"T09F1120A8010203040506070G"),
            Err(ProtocolError::Framing(FramingError::BadHex { .. }))
        ));
    }

    #[test]
    fn test_render_frame_addressed_pgn_takes_destination() {
        // ISO request transmit buffer: the PS byte becomes the destination.
        let line = render_frame(&[3, 0x00, 0xEA, 0x00, 0xFF, 3, 0x00, 0xEA, 0x00], 0xDD).unwrap();
        assert_eq!(line, "T0CEAFFDD300EA00\r");
    }

    #[test]
    fn test_render_then_parse_round_trip() {
        let line = render_frame(&[2, 0x01, 0xF1, 0x12, 0xFF, 3, 0xAA, 0xBB, 0xCC], 0x30).unwrap();
        let frame = parse_frame(line.trim_end().as_bytes()).unwrap();
        assert_eq!(frame.message.priority, 2);
        assert_eq!(frame.message.pgn, 127250);
        assert_eq!(frame.message.source, 0x30);
        assert_eq!(frame.message.destination, BROADCAST);
        assert_eq!(frame.message.data, vec![0xAA, 0xBB, 0xCC]);
    }

    struct MockPort {
        input: std::io::Cursor<Vec<u8>>,
        written: Vec<u8>,
    }

    impl MockPort {
        fn new(input: &[u8]) -> Self {
            Self {
                input: std::io::Cursor::new(input.to_vec()),
                written: Vec::new(),
            }
        }
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
    fn test_open_configures_channel_and_claims_address() {
        let port = CanUsbPort::open(MockPort::new(b""), 221, assembler_with(&[])).unwrap();
        let written = String::from_utf8(port.port.written.clone()).unwrap();
        assert!(written.starts_with("S5\rO\r"));
        // The address claim goes out as an extended frame from our address.
        assert!(written[5..].starts_with('T'));
        assert!(written.contains("DD"));
    }

    #[test]
    fn test_read_message_skips_noise_between_frames() {
        let input = b"garbage\rT09F1120A80102030405060708\r";
        let mut port = CanUsbPort::open(MockPort::new(input), 221, assembler_with(&[])).unwrap();
        let msg = port.read_message().unwrap();
        assert_eq!(msg.pgn, 127250);
        assert_eq!(msg.data.len(), 8);
    }

    #[test]
    fn test_read_message_reassembles_fast_packet() {
        // PGN 126996 across two frames: total 10 bytes.
        // id: priority 6, pgn 126996 = 0x1F014, source 0x42.
        let input = b"T19F014428000A010203040506\rT19F0144280107080900000000\r";
        let mut port =
            CanUsbPort::open(MockPort::new(input), 221, assembler_with(&[126996])).unwrap();
        let msg = port.read_message().unwrap();
        assert_eq!(msg.pgn, 126996);
        assert_eq!(msg.length, 10);
        assert_eq!(msg.data, vec![1, 2, 3, 4, 5, 6, 7, 8, 9, 0]);
    }

    #[test]
    fn test_send_splits_fast_packet_train() {
        let mut port = CanUsbPort::open(MockPort::new(b""), 0x10, assembler_with(&[])).unwrap();
        port.port.written.clear();

        let payload: Vec<u8> = (1..=14).collect();
        let msg = RawMessage::new(6, 126996, 0x10, BROADCAST).with_data(payload.clone());
        port.send(&msg).unwrap();

        let written = String::from_utf8(port.port.written.clone()).unwrap();
        let lines: Vec<&str> = written.trim_end_matches('\r').split('\r').collect();
        assert_eq!(lines.len(), 3);

        // Parse our own frames back and reassemble them.
        let mut asm = assembler_with(&[126996]);
        let mut done = None;
        for line in &lines {
            let frame = parse_frame(line.as_bytes()).unwrap();
            assert_eq!(frame.message.pgn, 126996);
            done = asm.accept(frame.message);
        }
        let done = done.expect("train should reassemble");
        assert_eq!(done.data, payload);
    }

    #[test]
    fn test_send_single_frame_uses_plain_write() {
        let mut port = CanUsbPort::open(MockPort::new(b""), 0x10, assembler_with(&[])).unwrap();
        port.port.written.clear();

        let msg = RawMessage::new(2, 127250, 0x10, BROADCAST).with_data(vec![1, 2, 3]);
        port.send(&msg).unwrap();
        let written = String::from_utf8(port.port.written.clone()).unwrap();
        assert_eq!(written.matches('\r').count(), 1);
        assert!(written.starts_with('T'));
    }

    #[test]
    fn test_send_rejects_oversized_payload() {
        let mut port = CanUsbPort::open(MockPort::new(b""), 0x10, assembler_with(&[])).unwrap();
        let msg = RawMessage::new(2, 126996, 0x10, BROADCAST).with_data(vec![0; 224]);
        assert!(port.send(&msg).is_err());
    }
}
