//! Catalog-driven field decoder.
//!
//! Turns a [`RawMessage`] into a [`ParsedMessage`] by walking the fields of
//! the catalog definition(s) matching its PGN. When several definitions
//! share the PGN, fields carrying a fixed-value constraint are decoded
//! speculatively and a mismatch slides the decoder to the next candidate in
//! the span. A PGN missing from the catalog falls back to the generic
//! definition at index 0; every message produces a result.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveTime};
use tracing::trace;

use crate::catalog::lookups::COMPANY_CODES;
use crate::catalog::{Field, FieldKind, PgnCatalog, PgnDefinition};
use crate::error::FieldDecodeError;
use crate::raw_message::RawMessage;

/// A decoded field value.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    UInt(u64),
    Int(i64),
    Float(f64),
    Text(String),
    /// A lookup table hit.
    Label(&'static str),
    Date(NaiveDate),
    Time(NaiveTime),
    Bytes(Vec<u8>),
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            FieldValue::UInt(v) => write!(f, "{v}"),
            FieldValue::Int(v) => write!(f, "{v}"),
            FieldValue::Float(v) => write!(f, "{v}"),
            FieldValue::Text(v) => write!(f, "\"{v}\""),
            FieldValue::Label(v) => write!(f, "{v}"),
            FieldValue::Date(v) => write!(f, "{}", v.format("%Y-%m-%d")),
            FieldValue::Time(v) => write!(f, "{}", v.format("%H:%M:%S%.4f")),
            FieldValue::Bytes(v) => {
                write!(f, "[")?;
                for (i, b) in v.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{b:02x}")?;
                }
                write!(f, "]")
            }
        }
    }
}

/// A fully decoded message: the original header, the index of the catalog
/// definition that was selected, and one entry per decoded field position.
/// Absent fields (sentinel value, payload too short, unimplemented rule)
/// are recorded as `None`.
#[derive(Debug, Clone)]
pub struct ParsedMessage {
    pub header: RawMessage,
    /// Index of the selected definition in the catalog.
    pub index: usize,
    pub definition: &'static PgnDefinition,
    /// Decoded values keyed by field position (repeating groups keep
    /// counting past the definition's field list).
    pub values: BTreeMap<usize, Option<FieldValue>>,
}

impl ParsedMessage {
    pub fn value(&self, position: usize) -> Option<&FieldValue> {
        self.values.get(&position).and_then(|v| v.as_ref())
    }

    /// Field name for an output position, wrapping around the trailing
    /// repeating group the way the decoder does.
    pub fn field_name(&self, position: usize) -> &'static str {
        let fields = self.definition.fields;
        let repeat = self.definition.repeating_fields as usize;
        if position < fields.len() {
            return fields[position].name;
        }
        if repeat == 0 || repeat > fields.len() {
            return "";
        }
        let wrapped = (position - (fields.len() - repeat)) % repeat;
        fields[fields.len() - repeat + wrapped].name
    }

    /// One-line rendering:
    /// `timestamp prio src dst pgn name: 0.Field = value; ...`
    /// Absent fields are included only when `verbose` is set.
    pub fn print(&self, verbose: bool) -> String {
        let h = &self.header;
        let mut s = format!(
            "{} {} {} {} {} {}:",
            h.timestamp.format("%Y-%m-%dT%H:%M:%S%.3f"),
            h.priority,
            h.source,
            h.destination,
            h.pgn,
            self.definition.description
        );
        for (position, value) in &self.values {
            match value {
                Some(v) => {
                    s.push_str(&format!(" {}.{} = {};", position, self.field_name(*position), v));
                }
                None if verbose => {
                    s.push_str(&format!(" {}.{} = nil;", position, self.field_name(*position)));
                }
                None => {}
            }
        }
        if s.ends_with(';') {
            s.pop();
        }
        s
    }
}

impl fmt::Display for ParsedMessage {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.print(false))
    }
}

fn mask(bits: u32) -> u64 {
    if bits >= 64 {
        u64::MAX
    } else {
        (1u64 << bits) - 1
    }
}

/// Whether `raw` is the "not available" sentinel for a field of `bits`
/// width: all bits one. One-bit fields are exempt, both of their values
/// are meaningful.
fn not_available(raw: u64, bits: u32) -> bool {
    bits >= 2 && raw == mask(bits)
}

fn sign_extend(raw: u64, bits: u32) -> i64 {
    if bits >= 64 || raw & (1u64 << (bits - 1)) == 0 {
        raw as i64
    } else {
        (raw | !mask(bits)) as i64
    }
}

/// Extract `bits` bits starting `start_bit` bits into the byte at
/// `start_byte`, little-endian, accumulating byte by byte so the window may
/// start and end anywhere within a byte.
pub(crate) fn extract_raw(
    data: &[u8],
    start_byte: usize,
    start_bit: u32,
    bits: u32,
) -> Result<u64, FieldDecodeError> {
    if bits == 0 || bits > 64 {
        return Err(FieldDecodeError::BadWidth { bits });
    }

    let needed = ((start_bit + bits) as usize).div_ceil(8);
    if start_byte + needed > data.len() {
        return Err(FieldDecodeError::OutOfBounds {
            offset: start_byte,
            needed,
            available: data.len().saturating_sub(start_byte),
        });
    }

    let mut value: u64 = 0;
    let mut taken: u32 = 0;
    while taken < bits {
        let cursor = start_bit + taken;
        let byte = data[start_byte + (cursor / 8) as usize];
        let bit_offset = cursor % 8;
        let take = (8 - bit_offset).min(bits - taken);
        let chunk = (byte >> bit_offset) as u64 & mask(take);
        value |= chunk << taken;
        taken += take;
    }
    Ok(value)
}

/// Extract the raw (unscaled, unsigned) value of the field at `index` using
/// offsets computed from the definition alone. Used for sub-lookup keys and
/// for fixed-value constraint checks.
fn extract_field_raw(
    data: &[u8],
    def: &PgnDefinition,
    index: usize,
) -> Result<u64, FieldDecodeError> {
    let (start_byte, _, start_bit, bits) = def.field_offsets(index);
    extract_raw(data, start_byte, start_bit, bits)
}

fn decode_number(field: &Field, raw: u64, scale: f64) -> FieldValue {
    if scale == 1.0 {
        if field.signed {
            FieldValue::Int(sign_extend(raw, field.bits))
        } else {
            FieldValue::UInt(raw)
        }
    } else if field.signed {
        FieldValue::Float(sign_extend(raw, field.bits) as f64 * scale)
    } else {
        FieldValue::Float(raw as f64 * scale)
    }
}

fn decode_field(
    data: &[u8],
    start_byte: usize,
    start_bit: u32,
    field: &Field,
    def: &PgnDefinition,
) -> Result<FieldValue, FieldDecodeError> {
    match field.kind {
        FieldKind::Number(scale) => {
            let raw = extract_raw(data, start_byte, start_bit, field.bits)?;
            if not_available(raw, field.bits) {
                return Err(FieldDecodeError::NotPresent);
            }
            Ok(decode_number(field, raw, scale))
        }
        FieldKind::Lookup(table) => {
            let raw = extract_raw(data, start_byte, start_bit, field.bits)?;
            if not_available(raw, field.bits) {
                return Err(FieldDecodeError::NotPresent);
            }
            Ok(match table.get(raw) {
                Some(name) => FieldValue::Label(name),
                None => FieldValue::UInt(raw),
            })
        }
        FieldKind::SubLookup { table, key_field } => {
            let raw = extract_raw(data, start_byte, start_bit, field.bits)?;
            if not_available(raw, field.bits) {
                return Err(FieldDecodeError::NotPresent);
            }
            let key = extract_field_raw(data, def, key_field)?;
            Ok(match table.get(key, raw) {
                Some(name) => FieldValue::Label(name),
                None => FieldValue::UInt(raw),
            })
        }
        FieldKind::ManufacturerCode => {
            let raw = extract_raw(data, start_byte, start_bit, field.bits)?;
            if not_available(raw, field.bits) {
                return Err(FieldDecodeError::NotPresent);
            }
            Ok(match COMPANY_CODES.get(raw) {
                Some(name) => FieldValue::Label(name),
                None => FieldValue::UInt(raw),
            })
        }
        FieldKind::Latitude | FieldKind::Longitude => match field.bits {
            32 => {
                let raw = extract_raw(data, start_byte, start_bit, 32)? as u32;
                if raw as i32 > 0x7FFF_FFFD {
                    Err(FieldDecodeError::NotPresent)
                } else {
                    Ok(FieldValue::Float(f32::from_bits(raw) as f64))
                }
            }
            64 => {
                let raw = extract_raw(data, start_byte, start_bit, 64)?;
                if raw as i64 > 0x7FFF_FFFF_FFFF_FFFD {
                    Err(FieldDecodeError::NotPresent)
                } else {
                    Ok(FieldValue::Float(f64::from_bits(raw)))
                }
            }
            bits => Err(FieldDecodeError::BadWidth { bits }),
        },
        FieldKind::Date => {
            if field.bits != 16 {
                return Err(FieldDecodeError::BadWidth { bits: field.bits });
            }
            let raw = extract_raw(data, start_byte, start_bit, 16)?;
            if raw == 0xFFFF {
                return Err(FieldDecodeError::NotPresent);
            }
            DateTime::from_timestamp(raw as i64 * 86400, 0)
                .map(|dt| FieldValue::Date(dt.date_naive()))
                .ok_or(FieldDecodeError::NotPresent)
        }
        FieldKind::Time => {
            if field.bits != 32 {
                return Err(FieldDecodeError::BadWidth { bits: field.bits });
            }
            let raw = extract_raw(data, start_byte, start_bit, 32)?;
            if raw == 0xFFFF_FFFF {
                return Err(FieldDecodeError::NotPresent);
            }
            // Ten-thousandths of a second since midnight.
            let seconds = (raw / 10000) as u32;
            let ten_thousandths = (raw % 10000) as u32;
            NaiveTime::from_hms_micro_opt(
                seconds / 3600,
                (seconds / 60) % 60,
                seconds % 60,
                ten_thousandths * 100,
            )
            .map(FieldValue::Time)
            .ok_or(FieldDecodeError::NotPresent)
        }
        FieldKind::Temperature => {
            if field.bits != 16 {
                return Err(FieldDecodeError::BadWidth { bits: field.bits });
            }
            let raw = extract_raw(data, start_byte, start_bit, 16)?;
            if raw >= 0xFFFD {
                return Err(FieldDecodeError::NotPresent);
            }
            Ok(FieldValue::Float(raw as f64 / 100.0))
        }
        FieldKind::Pressure => {
            if field.bits != 16 {
                return Err(FieldDecodeError::BadWidth { bits: field.bits });
            }
            let raw = extract_raw(data, start_byte, start_bit, 16)?;
            if raw >= 0xFFFD {
                return Err(FieldDecodeError::NotPresent);
            }
            Ok(FieldValue::Float(raw as f64 / 1000.0))
        }
        FieldKind::StringFixed => {
            let end = (start_byte + (field.bits / 8) as usize).min(data.len());
            if start_byte >= data.len() || data[start_byte] == 0 {
                return Err(FieldDecodeError::NotPresent);
            }
            let text = &data[start_byte..end];
            let cut = text
                .iter()
                .position(|&b| b == 0 || b == 255)
                .unwrap_or(text.len());
            if cut == 0 {
                return Err(FieldDecodeError::NotPresent);
            }
            Ok(FieldValue::Text(
                String::from_utf8_lossy(&text[..cut]).into_owned(),
            ))
        }
        FieldKind::StringLz => {
            if start_byte >= data.len() {
                return Err(FieldDecodeError::NotPresent);
            }
            let len = data[start_byte] as usize;
            let end = start_byte + 1 + len;
            if len == 0 || end > data.len() {
                return Err(FieldDecodeError::NotPresent);
            }
            Ok(FieldValue::Text(
                String::from_utf8_lossy(&data[start_byte + 1..end]).into_owned(),
            ))
        }
        FieldKind::Ascii6 => Err(FieldDecodeError::Unimplemented),
        FieldKind::Binary => {
            if start_byte > data.len() {
                return Err(FieldDecodeError::OutOfBounds {
                    offset: start_byte,
                    needed: field.bits.div_ceil(8) as usize,
                    available: 0,
                });
            }
            let end = (start_byte + field.bits.div_ceil(8) as usize).min(data.len());
            Ok(FieldValue::Bytes(data[start_byte..end].to_vec()))
        }
    }
}

impl PgnCatalog {
    /// Decode a raw message against the catalog. Never fails: unknown PGNs
    /// select the generic definition at index 0, and fields that cannot be
    /// decoded are recorded as absent.
    pub fn parse_packet(&self, msg: RawMessage) -> ParsedMessage {
        let (first, last) = self.span(msg.pgn).unwrap_or((0, 0));
        let single_solution = first == last;

        let mut index = first;
        let mut def = self.definition(index);
        let mut fields = def.fields;

        let data = &msg.data;
        let mut values: BTreeMap<usize, Option<FieldValue>> = BTreeMap::new();

        let mut start_byte: usize = 0;
        let mut start_bit: u32 = 0;
        let mut idx = 0; // position in the field list
        let mut out = 0; // output position, keeps counting through repeats

        while idx < fields.len() {
            // A fixed-value constraint decides whether this definition
            // applies; on mismatch retry the same field position against
            // the next definition in the span.
            if !single_solution {
                while let Some(expected) = fields[idx].fixed_value() {
                    let raw = extract_raw(data, start_byte, start_bit, fields[idx].bits);
                    match raw {
                        Ok(raw) if raw != expected && !not_available(raw, fields[idx].bits) => {
                            if index >= last {
                                break;
                            }
                            index += 1;
                            def = self.definition(index);
                            fields = def.fields;
                            if idx >= fields.len() {
                                break;
                            }
                        }
                        _ => break,
                    }
                }
                if idx >= fields.len() {
                    break;
                }
            }

            let field = &fields[idx];
            match decode_field(data, start_byte, start_bit, field, def) {
                Ok(value) => {
                    values.insert(out, Some(value));
                }
                Err(err) => {
                    trace!(pgn = msg.pgn, field = field.name, %err, "field absent");
                    values.insert(out, None);
                }
            }

            start_byte += ((field.bits + start_bit) / 8) as usize;
            start_bit = (start_bit + field.bits) % 8;

            // Consume the trailing repeating group while payload remains.
            let repeat = def.repeating_fields as usize;
            if idx == fields.len() - 1
                && repeat > 0
                && repeat <= fields.len()
                && start_byte < data.len()
            {
                let group_bits: u32 = fields[fields.len() - repeat..]
                    .iter()
                    .map(|f| f.bits)
                    .sum();
                if group_bits > 0 {
                    idx = fields.len() - repeat;
                    out += 1;
                    continue;
                }
            }

            idx += 1;
            out += 1;
        }

        ParsedMessage {
            header: msg,
            index,
            definition: def,
            values,
        }
    }
}
