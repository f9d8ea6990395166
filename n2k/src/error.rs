use thiserror::Error;

/// Byte-level framing failures. A framing error always results in the
/// offending envelope being discarded and the framer resynchronizing to its
/// initial state; it is never propagated past the adapter.
#[derive(Debug, Error)]
pub enum FramingError {
    /// An escape byte was followed by something other than a start marker,
    /// end marker or doubled escape.
    #[error("unexpected byte {byte:#04x} after escape")]
    BadEscape { byte: u8 },

    /// The envelope body was shorter than command + length + checksum.
    #[error("command body too short ({len} bytes)")]
    ShortBody { len: usize },

    /// The modulo-256 sum over the unescaped body was not zero.
    #[error("invalid checksum (residue {residue:#04x})")]
    Checksum { residue: u8 },

    /// The command byte is not one of the recognized receive commands.
    #[error("unknown command {command:#04x}")]
    UnknownCommand { command: u8 },

    /// An ASCII frame line did not start with a known prefix character.
    #[error("invalid frame prefix {prefix:#04x}")]
    BadPrefix { prefix: u8 },

    /// An ASCII frame line contained non-hexadecimal characters.
    #[error("invalid hex digits in {part}")]
    BadHex { part: &'static str },
}

/// Declared lengths that disagree with the bytes actually present, or exceed
/// an adapter-specific maximum. The message is discarded.
#[derive(Debug, Error)]
pub enum LengthError {
    #[error("declared length {declared} exceeds maximum {max}")]
    TooLong { declared: usize, max: usize },

    #[error("declared length {declared} disagrees with {available} available bytes")]
    Mismatch { declared: usize, available: usize },

    /// CAN frames carry at most 8 data bytes.
    #[error("frame length {0} exceeds 8")]
    BadFrameLength(u8),
}

/// Fast packet frames arriving out of order or for an unknown reassembly
/// key. The frame is dropped; any pending entry is left as-is.
#[derive(Debug, Error)]
pub enum SequenceError {
    #[error("frame for unknown reassembly key")]
    UnknownKey,

    #[error("out-of-order frame: expected sequence {expected}, got {got}")]
    OutOfOrder { expected: u8, got: u8 },
}

/// Any reason a physical frame or adapter envelope was discarded before it
/// could become a [`crate::RawMessage`].
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error(transparent)]
    Framing(#[from] FramingError),
    #[error(transparent)]
    Length(#[from] LengthError),
    #[error(transparent)]
    Sequence(#[from] SequenceError),
}

/// Per-field decode failures. The field is recorded as absent; decoding of
/// the rest of the message continues unaffected.
#[derive(Debug, Error)]
pub enum FieldDecodeError {
    /// The raw bits carried the "not available" sentinel.
    #[error("data not present")]
    NotPresent,

    /// The payload ends before the field does.
    #[error("need {needed} bytes at offset {offset}, only {available} in payload")]
    OutOfBounds {
        offset: usize,
        needed: usize,
        available: usize,
    },

    /// The field window does not fit the decode rule (e.g. a latitude that
    /// is neither 32 nor 64 bits wide).
    #[error("field width {bits} bits does not fit the decode rule")]
    BadWidth { bits: u32 },

    /// A decode rule this implementation does not support (6-bit ASCII).
    #[error("decode rule not implemented")]
    Unimplemented,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protocol_error_wraps_taxonomy() {
        let e: ProtocolError = FramingError::ShortBody { len: 2 }.into();
        assert!(matches!(e, ProtocolError::Framing(_)));

        let e: ProtocolError = LengthError::TooLong {
            declared: 250,
            max: 223,
        }
        .into();
        assert!(matches!(e, ProtocolError::Length(_)));

        let e: ProtocolError = SequenceError::OutOfOrder {
            expected: 1,
            got: 2,
        }
        .into();
        assert!(matches!(e, ProtocolError::Sequence(_)));
    }

    #[test]
    fn test_error_messages_mention_values() {
        let e = FramingError::Checksum { residue: 0x42 };
        assert!(e.to_string().contains("0x42"));

        let e = LengthError::Mismatch {
            declared: 14,
            available: 9,
        };
        let text = e.to_string();
        assert!(text.contains("14") && text.contains("9"));
    }
}
