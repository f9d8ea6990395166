//! The PGN catalog: message definitions the generic field decoder runs
//! against. The definitions themselves are data, not logic; they are
//! declared once in [`pgns`] and consumed read-only by the decoder.

pub mod lookups;
pub mod pgns;

/// Offset at which Actisense device-internal messages are synthesized into
/// the PGN namespace (subtype byte + this offset).
pub const ACTISENSE_BEM: u32 = 0x40000;

/// A value-to-name table. Entries are sorted by value so membership checks
/// stay logarithmic even for the large company code table.
#[derive(Debug, Clone, Copy)]
pub struct Lookup(pub &'static [(u32, &'static str)]);

impl Lookup {
    pub fn get(&self, value: u64) -> Option<&'static str> {
        let value = u32::try_from(value).ok()?;
        self.0
            .binary_search_by_key(&value, |&(v, _)| v)
            .ok()
            .map(|i| self.0[i].1)
    }
}

/// A two-level table: the raw value of a key field selects which [`Lookup`]
/// applies to this field's own raw value.
#[derive(Debug, Clone, Copy)]
pub struct SubLookup(pub &'static [(u32, Lookup)]);

impl SubLookup {
    pub fn get(&self, key: u64, value: u64) -> Option<&'static str> {
        let key = u32::try_from(key).ok()?;
        self.0
            .binary_search_by_key(&key, |&(k, _)| k)
            .ok()
            .and_then(|i| self.0[i].1.get(value))
    }
}

/// How a field's raw bits become a typed value.
///
/// `Number` covers every positive linear resolution (a scale of 1.0 yields
/// a plain integer); the remaining variants are the special decode rules the
/// catalog selects per field.
#[derive(Debug, Clone, Copy)]
pub enum FieldKind {
    /// Linear scale factor applied to the raw value.
    Number(f64),
    /// 32- or 64-bit value reinterpreted as an IEEE float.
    Latitude,
    /// 32- or 64-bit value reinterpreted as an IEEE float.
    Longitude,
    /// 16-bit count of days since the Unix epoch.
    Date,
    /// 32-bit count of ten-thousandths of a second since midnight.
    Time,
    /// 16-bit value, hundredths of a Kelvin.
    Temperature,
    /// 16-bit value, thousandths of a bar.
    Pressure,
    /// Six-bit packed ASCII. Not implemented; always decodes as absent.
    Ascii6,
    /// Raw value mapped through a table; falls back to the raw integer when
    /// the table has no entry.
    Lookup(Lookup),
    /// Raw value mapped through a table selected by another field's raw
    /// value. `key_field` is the index of that field in the definition.
    SubLookup { table: SubLookup, key_field: usize },
    /// Raw value mapped through the company code table.
    ManufacturerCode,
    /// Fixed-width string, terminated early by 0x00 or 0xFF.
    StringFixed,
    /// Length-prefixed string.
    StringLz,
    /// Raw bytes passed through untouched.
    Binary,
}

/// Units attached to a field. `Fixed` is not a unit at all: it constrains
/// the field's raw value and is consulted only to disambiguate definitions
/// that share a PGN.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    None,
    Label(&'static str),
    Fixed(u64),
}

/// One field of a PGN definition.
#[derive(Debug, Clone, Copy)]
pub struct Field {
    pub name: &'static str,
    pub bits: u32,
    pub kind: FieldKind,
    pub signed: bool,
    pub unit: Unit,
    pub description: &'static str,
}

impl Field {
    pub const fn new(name: &'static str, bits: u32, kind: FieldKind, signed: bool) -> Self {
        Self {
            name,
            bits,
            kind,
            signed,
            unit: Unit::None,
            description: "",
        }
    }

    /// Unsigned integer, resolution 1.
    pub const fn uint(name: &'static str, bits: u32) -> Self {
        Self::new(name, bits, FieldKind::Number(1.0), false)
    }

    /// Signed integer, resolution 1.
    pub const fn int(name: &'static str, bits: u32) -> Self {
        Self::new(name, bits, FieldKind::Number(1.0), true)
    }

    /// Unsigned value with a linear scale.
    pub const fn scaled(name: &'static str, bits: u32, scale: f64, unit: &'static str) -> Self {
        Self::new(name, bits, FieldKind::Number(scale), false).unit(unit)
    }

    /// Signed value with a linear scale.
    pub const fn scaled_s(name: &'static str, bits: u32, scale: f64, unit: &'static str) -> Self {
        Self::new(name, bits, FieldKind::Number(scale), true).unit(unit)
    }

    pub const fn lookup(name: &'static str, bits: u32, table: Lookup) -> Self {
        Self::new(name, bits, FieldKind::Lookup(table), false)
    }

    pub const fn sub_lookup(
        name: &'static str,
        bits: u32,
        table: SubLookup,
        key_field: usize,
    ) -> Self {
        Self::new(name, bits, FieldKind::SubLookup { table, key_field }, false)
    }

    /// 11-bit manufacturer code, resolved against the company table.
    pub const fn manufacturer(name: &'static str) -> Self {
        Self::new(name, 11, FieldKind::ManufacturerCode, false)
    }

    /// Manufacturer code constrained to one company; the constraint is used
    /// only to pick between definitions sharing a PGN.
    pub const fn manufacturer_eq(name: &'static str, code: u64) -> Self {
        let mut f = Self::manufacturer(name);
        f.unit = Unit::Fixed(code);
        f
    }

    pub const fn binary(name: &'static str, bits: u32) -> Self {
        Self::new(name, bits, FieldKind::Binary, false)
    }

    pub const fn reserved(bits: u32) -> Self {
        Self::binary("Reserved", bits)
    }

    pub const fn date(name: &'static str) -> Self {
        Self::new(name, 16, FieldKind::Date, false).unit("days")
    }

    pub const fn time(name: &'static str) -> Self {
        Self::new(name, 32, FieldKind::Time, false).unit("s")
    }

    pub const fn temperature(name: &'static str) -> Self {
        Self::new(name, 16, FieldKind::Temperature, false).unit("K")
    }

    pub const fn pressure(name: &'static str) -> Self {
        Self::new(name, 16, FieldKind::Pressure, false).unit("bar")
    }

    pub const fn latitude(bits: u32) -> Self {
        Self::new("Latitude", bits, FieldKind::Latitude, true).unit("deg")
    }

    pub const fn longitude(bits: u32) -> Self {
        Self::new("Longitude", bits, FieldKind::Longitude, true).unit("deg")
    }

    pub const fn ascii(name: &'static str, bits: u32) -> Self {
        Self::new(name, bits, FieldKind::StringFixed, false)
    }

    pub const fn string_lz(name: &'static str, bits: u32) -> Self {
        Self::new(name, bits, FieldKind::StringLz, false)
    }

    pub const fn ascii6(name: &'static str, bits: u32) -> Self {
        Self::new(name, bits, FieldKind::Ascii6, false)
    }

    pub const fn unit(mut self, unit: &'static str) -> Self {
        self.unit = Unit::Label(unit);
        self
    }

    pub const fn describe(mut self, description: &'static str) -> Self {
        self.description = description;
        self
    }

    /// The constraint value, when this field disambiguates definitions.
    pub fn fixed_value(&self) -> Option<u64> {
        match self.unit {
            Unit::Fixed(v) => Some(v),
            _ => None,
        }
    }
}

/// One catalog entry. Several entries may carry the same PGN; they are
/// stored contiguously and told apart by [`Unit::Fixed`] constraints on
/// early fields.
#[derive(Debug)]
pub struct PgnDefinition {
    pub description: &'static str,
    pub category: &'static str,
    pub pgn: u32,
    /// Whether the field layout is believed complete and correct.
    pub well_understood: bool,
    /// Minimum size in bytes. <= 8 is single frame, 9..=223 fast packet,
    /// larger multi-packet.
    pub size: u32,
    /// How many trailing fields repeat until the payload is exhausted.
    pub repeating_fields: u32,
    pub fields: &'static [Field],
}

impl PgnDefinition {
    pub const fn new(
        description: &'static str,
        category: &'static str,
        pgn: u32,
        well_understood: bool,
        size: u32,
        repeating_fields: u32,
        fields: &'static [Field],
    ) -> Self {
        Self {
            description,
            category,
            pgn,
            well_understood,
            size,
            repeating_fields,
            fields,
        }
    }

    /// Whether messages of this PGN arrive as fast packet trains.
    pub fn is_fast_packet(&self) -> bool {
        self.size > 8
    }

    /// Byte window and bit position of the field at `index`, computed from
    /// the declared widths of everything before it.
    pub fn field_offsets(&self, index: usize) -> (usize, usize, u32, u32) {
        let bits = self.fields[index].bits;
        let bytes = bits.div_ceil(8) as usize;

        let mut offset: u32 = 0;
        for field in &self.fields[..index] {
            offset += field.bits;
        }

        let low_byte = (offset / 8) as usize;
        (low_byte, low_byte + bytes, offset % 8, bits)
    }
}

/// An ordered, immutable collection of PGN definitions.
///
/// Index 0 is always the generic "Unknown PGN" definition the decoder falls
/// back to when nothing matches.
#[derive(Debug, Clone, Copy)]
pub struct PgnCatalog {
    defs: &'static [PgnDefinition],
}

impl PgnCatalog {
    /// The built-in catalog.
    pub fn standard() -> Self {
        Self {
            defs: pgns::PGN_LIST,
        }
    }

    /// A catalog over caller-supplied definitions. `defs[0]` must be the
    /// fallback definition.
    pub const fn with_definitions(defs: &'static [PgnDefinition]) -> Self {
        Self { defs }
    }

    pub fn len(&self) -> usize {
        self.defs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }

    pub fn definition(&self, index: usize) -> &'static PgnDefinition {
        &self.defs[index]
    }

    pub fn definitions(&self) -> &'static [PgnDefinition] {
        self.defs
    }

    /// Index of the first definition carrying `pgn`.
    pub fn first(&self, pgn: u32) -> Option<usize> {
        self.defs.iter().position(|d| d.pgn == pgn)
    }

    /// Index of the last definition carrying `pgn`.
    pub fn last(&self, pgn: u32) -> Option<usize> {
        self.defs.iter().rposition(|d| d.pgn == pgn)
    }

    /// The contiguous index range of definitions sharing `pgn`.
    pub fn span(&self, pgn: u32) -> Option<(usize, usize)> {
        Some((self.first(pgn)?, self.last(pgn)?))
    }

    /// Sorted, de-duplicated PGNs whose messages need fast packet
    /// reassembly (minimum size beyond a single frame).
    pub fn fast_packet_pgns(&self) -> Vec<u32> {
        let mut pgns: Vec<u32> = self
            .defs
            .iter()
            .filter(|d| d.is_fast_packet())
            .map(|d| d.pgn)
            .collect();
        pgns.sort_unstable();
        pgns.dedup();
        pgns
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_get() {
        const TABLE: Lookup = Lookup(&[(0, "zero"), (4, "four"), (9, "nine")]);
        assert_eq!(TABLE.get(4), Some("four"));
        assert_eq!(TABLE.get(5), None);
        assert_eq!(TABLE.get(u64::MAX), None);
    }

    #[test]
    fn test_sub_lookup_get() {
        const INNER: &[(u32, &str)] = &[(1, "one"), (2, "two")];
        const TABLE: SubLookup = SubLookup(&[(10, Lookup(INNER))]);
        assert_eq!(TABLE.get(10, 2), Some("two"));
        assert_eq!(TABLE.get(10, 3), None);
        assert_eq!(TABLE.get(11, 1), None);
    }

    #[test]
    fn test_field_offsets_across_unaligned_fields() {
        const FIELDS: &[Field] = &[
            Field::uint("Field 0", 8),
            Field::uint("Field 1", 12),
            Field::uint("Field 2", 4),
            Field::uint("Field 3", 21),
            Field::uint("Field 4", 5),
            Field::uint("Field 5", 14),
            Field::uint("Field 6", 3),
            Field::uint("Field 7", 9),
            Field::uint("Field 8", 20),
        ];
        const DEF: PgnDefinition =
            PgnDefinition::new("Test", "Test", 123456, true, 8, 0, FIELDS);

        let expected = [
            (0, 1, 0, 8),
            (1, 3, 0, 12),
            (2, 3, 4, 4),
            (3, 6, 0, 21),
            (5, 6, 5, 5),
            (6, 8, 2, 14),
            (8, 9, 0, 3),
            (8, 10, 3, 9),
            (9, 12, 4, 20),
        ];
        for (i, want) in expected.iter().enumerate() {
            assert_eq!(DEF.field_offsets(i), *want, "field {i}");
        }
    }

    #[test]
    fn test_standard_catalog_starts_with_fallback() {
        let catalog = PgnCatalog::standard();
        assert_eq!(catalog.definition(0).pgn, 0);
        assert!(!catalog.definition(0).well_understood);
    }

    #[test]
    fn test_span_of_shared_pgn() {
        let catalog = PgnCatalog::standard();
        let (first, last) = catalog.span(65285).unwrap();
        assert!(first < last);
        for idx in first..=last {
            assert_eq!(catalog.definition(idx).pgn, 65285);
        }
    }

    #[test]
    fn test_span_of_unknown_pgn_is_none() {
        let catalog = PgnCatalog::standard();
        assert_eq!(catalog.span(1), None);
    }

    #[test]
    fn test_fast_packet_pgns_sorted_and_deduplicated() {
        let catalog = PgnCatalog::standard();
        let pgns = catalog.fast_packet_pgns();
        assert!(pgns.windows(2).all(|w| w[0] < w[1]));
        assert!(pgns.contains(&126996));
        assert!(pgns.contains(&129029));
        assert!(!pgns.contains(&126992));
    }
}
