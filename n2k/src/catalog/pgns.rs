//! The built-in PGN definitions. This is bulk data consumed by the decoder;
//! entries are ordered by PGN, and definitions sharing a PGN sit next to
//! each other so the decoder can walk the span.

use super::lookups::*;
use super::{Field, FieldKind, PgnDefinition, ACTISENSE_BEM};

const DEG_PER_RAD: f64 = 180.0 / std::f64::consts::PI;

/// Heading, course and wind angles arrive in 1e-4 radian steps.
const RES_DEGREES: f64 = 1e-4 * DEG_PER_RAD;

/// Rotation rates arrive in 1e-3/32 radian-per-second steps.
const RES_ROTATION: f64 = 1e-3 / 32.0 * DEG_PER_RAD;

pub static PGN_LIST: &[PgnDefinition] = &[
    // Index 0 is the decoder's fallback for PGNs missing from the catalog.
    PgnDefinition::new(
        "Unknown PGN",
        "Mandatory",
        0,
        false,
        8,
        0,
        &[
            Field::manufacturer("Manufacturer Code"),
            Field::reserved(2),
            Field::lookup("Industry Code", 3, INDUSTRY_CODE),
            Field::binary("Payload", 48),
        ],
    ),
    PgnDefinition::new(
        "ISO Acknowledgement",
        "Mandatory",
        59392,
        true,
        8,
        0,
        &[
            Field::lookup("Control", 8, ISO_ACK_RESULTS),
            Field::uint("Group Function", 8),
            Field::reserved(24).describe("Alignment padding"),
            Field::uint("PGN", 24).describe("Parameter Group Number of requested information"),
        ],
    ),
    PgnDefinition::new(
        "ISO Request",
        "Mandatory",
        59904,
        true,
        3,
        0,
        &[Field::uint("PGN", 24)],
    ),
    PgnDefinition::new(
        "ISO Address Claim",
        "Mandatory",
        60928,
        true,
        8,
        0,
        &[
            Field::binary("Unique Number", 21).describe("ISO Identity Number"),
            Field::manufacturer("Manufacturer Code"),
            Field::uint("Device Instance Lower", 3).describe("ISO ECU Instance"),
            Field::uint("Device Instance Upper", 5).describe("ISO Function Instance"),
            Field::sub_lookup("Device Function", 8, DEVICE_FUNCTION, 6).describe("ISO Function"),
            Field::reserved(1),
            Field::lookup("Device Class", 7, DEVICE_CLASS),
            Field::uint("System Instance", 4).describe("ISO Device Class Instance"),
            Field::lookup("Industry Code", 3, INDUSTRY_CODE),
            Field::uint("Arbitrary Address Capable", 1).describe("ISO Self Configurable"),
        ],
    ),
    PgnDefinition::new(
        "ISO: Manu. Proprietary single-frame addressed",
        "General",
        61184,
        false,
        8,
        0,
        &[
            Field::manufacturer("Manufacturer Code"),
            Field::reserved(2),
            Field::uint("Industry Code", 3),
            Field::binary("Payload", 48),
        ],
    ),
    PgnDefinition::new(
        "ISO: Manu. Proprietary single-frame non-addressed",
        "General",
        65280,
        false,
        8,
        0,
        &[
            Field::manufacturer("Manufacturer Code"),
            Field::reserved(2),
            Field::uint("Industry Code", 3),
            Field::binary("Payload", 48),
        ],
    ),
    PgnDefinition::new(
        "Boot State Acknowledgment",
        "Airmar",
        65285,
        true,
        8,
        0,
        &[
            Field::manufacturer_eq("Manufacturer Code", 135).describe("Airmar"),
            Field::reserved(2),
            Field::lookup("Industry Code", 3, INDUSTRY_CODE).describe("Marine Industry"),
            Field::lookup("Boot State", 4, AIRMAR_BOOT_STATE),
        ],
    ),
    PgnDefinition::new(
        "Temperature",
        "Lowrance",
        65285,
        false,
        8,
        0,
        &[
            Field::manufacturer_eq("Manufacturer Code", 140),
            Field::reserved(2),
            Field::lookup("Industry Code", 3, INDUSTRY_CODE),
            Field::uint("Temperature Instance", 4),
            Field::uint("Temperature Source", 4),
            Field::temperature("Actual Temperature"),
        ],
    ),
    PgnDefinition::new(
        "Boot State Request",
        "Airmar",
        65286,
        true,
        8,
        0,
        &[
            Field::manufacturer_eq("Manufacturer Code", 135).describe("Airmar"),
            Field::reserved(2),
            Field::lookup("Industry Code", 3, INDUSTRY_CODE),
        ],
    ),
    PgnDefinition::new(
        "System Time",
        "General",
        126992,
        true,
        8,
        0,
        &[
            Field::uint("SID", 8),
            Field::lookup("Source", 4, SYSTEM_TIME_SOURCE),
            Field::reserved(4),
            Field::date("Date").describe("Days since January 1, 1970"),
            Field::time("Time").describe("Seconds since midnight"),
        ],
    ),
    PgnDefinition::new(
        "Heartbeat",
        "General",
        126993,
        true,
        8,
        0,
        &[
            Field::scaled("Update Rate", 16, 0.01, "s").describe("Data transmit offset"),
            Field::uint("Heartbeat Sequence Counter", 8),
        ],
    ),
    PgnDefinition::new(
        "Product Information",
        "Mandatory",
        126996,
        false,
        0x86,
        0,
        &[
            Field::uint("NMEA 2000 Version", 16),
            Field::uint("Product Code", 16),
            Field::ascii("Model ID", 256),
            Field::ascii("Software Version Code", 256),
            Field::ascii("Model Version", 256),
            Field::ascii("Model Serial Code", 256),
            Field::uint("Certification Level", 8),
            Field::uint("Load Equivalency", 8),
        ],
    ),
    PgnDefinition::new(
        "Vessel Heading",
        "Steering",
        127250,
        true,
        8,
        0,
        &[
            Field::uint("SID", 8),
            Field::scaled("Heading", 16, RES_DEGREES, "deg"),
            Field::scaled_s("Deviation", 16, RES_DEGREES, "deg"),
            Field::scaled_s("Variation", 16, RES_DEGREES, "deg"),
            Field::lookup("Reference", 2, DIRECTION_REFERENCE),
        ],
    ),
    PgnDefinition::new(
        "Rate of Turn",
        "Steering",
        127251,
        true,
        5,
        0,
        &[
            Field::uint("SID", 8),
            Field::scaled_s("Rate", 32, RES_ROTATION * 0.0001, "deg/s"),
        ],
    ),
    PgnDefinition::new(
        "Attitude",
        "Steering",
        127257,
        true,
        7,
        0,
        &[
            Field::uint("SID", 8),
            Field::scaled_s("Yaw", 16, RES_DEGREES, "deg"),
            Field::scaled_s("Pitch", 16, RES_DEGREES, "deg"),
            Field::scaled_s("Roll", 16, RES_DEGREES, "deg"),
        ],
    ),
    PgnDefinition::new(
        "Engine Parameters, Rapid Update",
        "Propulsion",
        127488,
        true,
        8,
        0,
        &[
            Field::lookup("Engine Instance", 8, ENGINE_INSTANCE),
            Field::uint("Engine Speed", 16).unit("rpm"),
            Field::pressure("Engine Boost Pressure"),
            Field::int("Engine Tilt/Trim", 8),
        ],
    ),
    PgnDefinition::new(
        "Engine Parameters, Dynamic",
        "Propulsion",
        127489,
        true,
        26,
        0,
        &[
            Field::lookup("Engine Instance", 8, ENGINE_INSTANCE),
            Field::pressure("Oil pressure"),
            Field::temperature("Oil temperature"),
            Field::temperature("Temperature"),
            Field::scaled("Alternator Potential", 16, 0.01, "V"),
            Field::scaled_s("Fuel Rate", 16, 0.1, "L/h"),
            Field::uint("Total Engine hours", 32).unit("s"),
            Field::pressure("Coolant Pressure"),
            Field::uint("Fuel Pressure", 16),
            Field::reserved(8),
            Field::uint("Discrete Status 1", 16),
            Field::uint("Discrete Status 2", 16),
            Field::int("Percent Engine Load", 8).unit("%"),
            Field::int("Percent Engine Torque", 8).unit("%"),
        ],
    ),
    PgnDefinition::new(
        "Fluid Level",
        "General",
        127505,
        true,
        7,
        0,
        &[
            Field::uint("Instance", 4),
            Field::lookup("Type", 4, TANK_TYPE),
            Field::scaled("Level", 16, 100.0 / 25000.0, "%"),
            Field::scaled("Capacity", 32, 0.1, "L"),
        ],
    ),
    PgnDefinition::new(
        "Speed",
        "Propulsion",
        128259,
        true,
        6,
        0,
        &[
            Field::uint("SID", 8),
            Field::scaled("Speed Water Referenced", 16, 0.01, "m/s"),
            Field::scaled("Speed Ground Referenced", 16, 0.01, "m/s"),
            Field::lookup("Speed Water Referenced Type", 8, SPEED_REFERENCE),
            Field::lookup("Speed Direction", 4, SPEED_DIRECTION),
            Field::reserved(4),
        ],
    ),
    PgnDefinition::new(
        "Water Depth",
        "Navigation",
        128267,
        true,
        5,
        0,
        &[
            Field::uint("SID", 8),
            Field::scaled("Depth", 32, 0.01, "m").describe("Depth below transducer"),
            Field::scaled_s("Offset", 16, 0.001, "m")
                .describe("Distance between transducer and surface (positive) or keel (negative)"),
        ],
    ),
    PgnDefinition::new(
        "Distance Log",
        "Navigation",
        128275,
        true,
        14,
        0,
        &[
            Field::date("Date").describe("Days since January 1, 1970"),
            Field::time("Time").describe("Seconds since midnight"),
            Field::uint("Log", 32).unit("m").describe("Total cumulative distance"),
            Field::uint("Trip Log", 32).unit("m").describe("Distance since last reset"),
        ],
    ),
    PgnDefinition::new(
        "Position, Rapid Update",
        "Navigation",
        129025,
        true,
        8,
        0,
        &[Field::latitude(32), Field::longitude(32)],
    ),
    PgnDefinition::new(
        "COG & SOG, Rapid Update",
        "Navigation",
        129026,
        true,
        8,
        0,
        &[
            Field::uint("SID", 8),
            Field::lookup("COG Reference", 2, DIRECTION_REFERENCE),
            Field::reserved(6),
            Field::scaled("COG", 16, RES_DEGREES, "deg"),
            Field::scaled("SOG", 16, 0.01, "m/s"),
            Field::reserved(16),
        ],
    ),
    PgnDefinition::new(
        "GNSS Position Data",
        "Navigation",
        129029,
        true,
        51,
        3,
        &[
            Field::uint("SID", 8),
            Field::date("Date").describe("Days since January 1, 1970"),
            Field::time("Time").describe("Seconds since midnight"),
            Field::latitude(64),
            Field::longitude(64),
            Field::scaled_s("Altitude", 64, 1e-6, "m"),
            Field::lookup("GNSS type", 4, GNSS_TYPE),
            Field::lookup("Method", 4, GNSS_METHOD),
            Field::lookup("Integrity", 2, GNSS_INTEGRITY),
            Field::reserved(6),
            Field::uint("Number of SVs", 8).describe("Number of satellites used in solution"),
            Field::new("HDOP", 16, FieldKind::Number(0.01), true)
                .describe("Horizontal dilution of precision"),
            Field::new("PDOP", 16, FieldKind::Number(0.01), true)
                .describe("Probable dilution of precision"),
            Field::scaled("Geoidal Separation", 16, 0.01, "m"),
            Field::uint("Reference Stations", 8).describe("Number of reference stations"),
            Field::lookup("Reference Station Type", 4, GNSS_TYPE),
            Field::uint("Reference Station ID", 12),
            Field::scaled("Age of DGNSS Corrections", 16, 0.01, "s"),
        ],
    ),
    PgnDefinition::new(
        "Time & Date",
        "Navigation",
        129033,
        true,
        8,
        0,
        &[
            Field::date("Date").describe("Days since January 1, 1970"),
            Field::time("Time").describe("Seconds since midnight"),
            Field::int("Local Offset", 16).unit("minutes"),
        ],
    ),
    PgnDefinition::new(
        "AIS Class A Position Report",
        "AIS",
        129038,
        true,
        27,
        0,
        &[
            Field::uint("Message ID", 6),
            Field::lookup("Repeat Indicator", 2, REPEAT_INDICATOR),
            Field::uint("User ID", 32).unit("MMSI"),
            Field::longitude(32),
            Field::latitude(32),
            Field::lookup("Position Accuracy", 1, POSITION_ACCURACY),
            Field::lookup("RAIM", 1, AIS_RAIM),
            Field::lookup("Time Stamp", 6, AIS_TIME_STAMP)
                .describe("0-59 = UTC second when the report was generated"),
            Field::scaled("COG", 16, RES_DEGREES, "deg"),
            Field::scaled("SOG", 16, 0.01, "m/s"),
            Field::binary("Communication State", 19).describe(
                "Information used by the TDMA slot allocation algorithm and synchronization information",
            ),
            Field::lookup("AIS Transceiver information", 5, AIS_TRANSCEIVER),
            Field::scaled("Heading", 16, RES_DEGREES, "deg").describe("True heading"),
            Field::scaled_s("Rate of Turn", 16, RES_ROTATION, "deg/s"),
            Field::lookup("Nav Status", 8, NAV_STATUS),
            Field::uint("Reserved for Regional Applications", 8),
            Field::uint("Spare", 8),
        ],
    ),
    PgnDefinition::new(
        "Wind Data",
        "Environmental",
        130306,
        true,
        6,
        0,
        &[
            Field::uint("SID", 8),
            Field::scaled("Wind Speed", 16, 0.01, "m/s"),
            Field::scaled("Wind Angle", 16, RES_DEGREES, "deg"),
            Field::lookup("Reference", 3, WIND_REFERENCE),
        ],
    ),
    PgnDefinition::new(
        "Environmental Parameters",
        "Environmental",
        130310,
        true,
        7,
        0,
        &[
            Field::uint("SID", 8),
            Field::temperature("Water Temperature"),
            Field::temperature("Outside Ambient Air Temperature"),
            Field::pressure("Atmospheric Pressure"),
        ],
    ),
    PgnDefinition::new(
        "Environmental Parameters",
        "Environmental",
        130311,
        true,
        8,
        0,
        &[
            Field::uint("SID", 8),
            Field::lookup("Temperature Instance", 6, TEMPERATURE_SOURCE),
            Field::lookup("Humidity Instance", 2, HUMIDITY_INSTANCE),
            Field::temperature("Temperature"),
            Field::scaled_s("Humidity", 16, 0.004, "%"),
            Field::pressure("Atmospheric Pressure"),
        ],
    ),
    PgnDefinition::new(
        "Temperature",
        "Environmental",
        130312,
        true,
        8,
        0,
        &[
            Field::uint("SID", 8),
            Field::uint("Temperature Instance", 8),
            Field::lookup("Temperature Source", 8, TEMPERATURE_SOURCE),
            Field::temperature("Actual Temperature"),
            Field::temperature("Set Temperature"),
        ],
    ),
    PgnDefinition::new(
        "Humidity",
        "Environmental",
        130313,
        true,
        8,
        0,
        &[
            Field::uint("SID", 8),
            Field::uint("Humidity Instance", 8),
            Field::uint("Humidity Source", 8),
            Field::scaled_s("Actual Humidity", 16, 100.0 / 25000.0, "%"),
            Field::scaled_s("Set Humidity", 16, 100.0 / 25000.0, "%"),
        ],
    ),
    PgnDefinition::new(
        "Actual Pressure",
        "Environmental",
        130314,
        true,
        8,
        0,
        &[
            Field::uint("SID", 8),
            Field::uint("Pressure Instance", 8),
            Field::lookup("Pressure Source", 8, PRESSURE_SOURCE),
            Field::scaled_s("Pressure", 32, 0.1, "Pa"),
        ],
    ),
    // Device-internal Actisense messages, synthesized above the PGN range.
    PgnDefinition::new(
        "Actisense: Startup status",
        "Actisense",
        ACTISENSE_BEM + 0xf0,
        false,
        0x0f,
        0,
        &[
            Field::uint("SID", 8),
            Field::uint("Model ID", 16),
            Field::uint("Serial ID", 32),
            Field::int("Error ID", 32),
            Field::new("Firmware version", 16, FieldKind::Number(0.001), false),
            Field::uint("Reset status", 8),
            Field::uint("A", 8),
        ],
    ),
    PgnDefinition::new(
        "Actisense: Negative ACK",
        "Actisense",
        ACTISENSE_BEM + 0xf4,
        false,
        17,
        0,
        &[
            Field::uint("SID", 8),
            Field::uint("Model ID", 16),
            Field::uint("Serial ID", 32),
            Field::binary("Error ID", 32),
            Field::binary("Data", 32),
        ],
    ),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_ordered_by_pgn() {
        assert!(PGN_LIST.windows(2).all(|w| w[0].pgn <= w[1].pgn));
    }

    #[test]
    fn test_shared_pgns_are_contiguous() {
        for (i, def) in PGN_LIST.iter().enumerate() {
            if let Some(next) = PGN_LIST.get(i + 1) {
                if def.pgn == next.pgn {
                    continue;
                }
            }
            // Once a PGN ends it must not reappear later in the list.
            assert!(
                PGN_LIST[i + 1..].iter().all(|d| d.pgn != def.pgn || d.pgn == 0),
                "PGN {} not contiguous",
                def.pgn
            );
        }
    }

    #[test]
    fn test_fast_packet_classification() {
        let product_info = PGN_LIST.iter().find(|d| d.pgn == 126996).unwrap();
        assert!(product_info.is_fast_packet());

        let wind = PGN_LIST.iter().find(|d| d.pgn == 130306).unwrap();
        assert!(!wind.is_fast_packet());

        let gnss = PGN_LIST.iter().find(|d| d.pgn == 129029).unwrap();
        assert!(gnss.is_fast_packet());
        assert_eq!(gnss.repeating_fields, 3);
    }

    #[test]
    fn test_disambiguated_entries_carry_constraints() {
        let span: Vec<_> = PGN_LIST.iter().filter(|d| d.pgn == 65285).collect();
        assert_eq!(span.len(), 2);
        assert_eq!(span[0].fields[0].fixed_value(), Some(135));
        assert_eq!(span[1].fields[0].fixed_value(), Some(140));
    }
}
