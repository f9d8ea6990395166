//! Value-to-name tables referenced by catalog fields. Entries are kept
//! sorted by value; [`super::Lookup::get`] binary searches them.

use super::{Lookup, SubLookup};

pub const ISO_ACK_RESULTS: Lookup = Lookup(&[
    (0, "ACK"),
    (1, "NAK"),
    (2, "Access Denied"),
    (3, "Address Busy"),
]);

pub const INDUSTRY_CODE: Lookup = Lookup(&[(4, "Marine")]);

pub const SYSTEM_TIME_SOURCE: Lookup = Lookup(&[
    (0, "GPS"),
    (1, "GLONASS"),
    (2, "Radio Station"),
    (3, "Local Cesium clock"),
    (4, "Local Rubidium clock"),
    (5, "Local Crystal clock"),
]);

pub const DIRECTION_REFERENCE: Lookup = Lookup(&[
    (0, "True"),
    (1, "Magnetic"),
    (2, "Error"),
    (3, "Null"),
]);

pub const WIND_REFERENCE: Lookup = Lookup(&[
    (0, "True (ground referenced to North)"),
    (1, "Magnetic (ground referenced to Magnetic North)"),
    (2, "Apparent"),
    (3, "True (boat referenced)"),
    (4, "True (water referenced)"),
]);

pub const TEMPERATURE_SOURCE: Lookup = Lookup(&[
    (0, "Sea Temperature"),
    (1, "Outside Temperature"),
    (2, "Inside Temperature"),
    (3, "Engine Room Temperature"),
    (4, "Main Cabin Temperature"),
    (5, "Live Well Temperature"),
    (6, "Bait Well Temperature"),
    (7, "Refridgeration Temperature"),
    (8, "Heating System Temperature"),
    (9, "Freezer Temperature"),
]);

pub const HUMIDITY_INSTANCE: Lookup = Lookup(&[(0, "Inside"), (1, "Outside")]);

pub const PRESSURE_SOURCE: Lookup = Lookup(&[
    (0, "Atmospheric"),
    (1, "Water"),
    (2, "Steam"),
    (3, "Compressed Air"),
    (4, "Hydraulic"),
]);

pub const TANK_TYPE: Lookup = Lookup(&[
    (0, "Fuel"),
    (1, "Water"),
    (2, "Gray water"),
    (3, "Live well"),
    (4, "Oil"),
    (5, "Black water"),
]);

pub const GNSS_TYPE: Lookup = Lookup(&[
    (0, "GPS"),
    (1, "GLONASS"),
    (2, "GPS+GLONASS"),
    (3, "GPS+SBAS/WAAS"),
    (4, "GPS+SBAS/WAAS+GLONASS"),
    (5, "Chayka"),
    (6, "Integrated"),
    (7, "Surveyed"),
    (8, "Galileo"),
]);

pub const GNSS_METHOD: Lookup = Lookup(&[
    (0, "No GNSS"),
    (1, "GNSS Fix"),
    (2, "DGNSS Fix"),
    (3, "Precise GNSS"),
    (4, "RTK Fixed Integer"),
    (5, "RTK Float"),
    (6, "Estimated (DR) Mode"),
    (7, "Manual Input"),
    (8, "Simulate Mode"),
]);

pub const GNSS_INTEGRITY: Lookup = Lookup(&[
    (0, "No integrity checking"),
    (1, "Safe"),
    (2, "Caution"),
]);

pub const ENGINE_INSTANCE: Lookup = Lookup(&[
    (0, "Single Engine or Dual Engine Port"),
    (1, "Dual Engine Starboard"),
]);

pub const GEAR_STATUS: Lookup = Lookup(&[
    (0, "Forward"),
    (1, "Neutral"),
    (2, "Reverse"),
    (3, "Unknown"),
]);

pub const SPEED_REFERENCE: Lookup = Lookup(&[
    (0, "Paddle Wheel"),
    (1, "Pitot Tube"),
    (2, "Doppler Log"),
    (3, "Correlation Log"),
    (4, "Electromagnetic"),
    (253, "Not supported"),
]);

pub const SPEED_DIRECTION: Lookup = Lookup(&[(0, "Ahead"), (1, "Astern")]);

pub const REPEAT_INDICATOR: Lookup = Lookup(&[
    (0, "Initial"),
    (1, "First retransmission"),
    (2, "Second retransmission"),
    (3, "Final retransmission"),
]);

pub const POSITION_ACCURACY: Lookup = Lookup(&[(0, "Low"), (1, "High")]);

pub const AIS_RAIM: Lookup = Lookup(&[(0, "not in use"), (1, "in use")]);

pub const AIS_TIME_STAMP: Lookup = Lookup(&[
    (60, "Not available"),
    (61, "Manual input mode"),
    (62, "Dead reckoning mode"),
    (63, "Positioning system is inoperative"),
]);

pub const AIS_TRANSCEIVER: Lookup = Lookup(&[
    (0, "Channel A VDL reception"),
    (1, "Channel B VDL reception"),
    (2, "Channel A VDL transmission"),
    (3, "Channel B VDL transmission"),
    (4, "Own information not broadcast"),
    (5, "Reserved"),
]);

pub const NAV_STATUS: Lookup = Lookup(&[
    (0, "Under way using engine"),
    (1, "At anchor"),
    (2, "Not under command"),
    (3, "Restricted manoeuverability"),
    (4, "Constrained by her draught"),
    (5, "Moored"),
    (6, "Aground"),
    (7, "Engaged in Fishing"),
    (8, "Under way sailing"),
]);

pub const AIRMAR_BOOT_STATE: Lookup = Lookup(&[
    (0, "In Startup Monitor"),
    (1, "Running Bootloader"),
    (2, "Running Application"),
]);

pub const DEVICE_CLASS: Lookup = Lookup(&[
    (0, "Reserved for NMEA 2000 Use"),
    (10, "System Tools"),
    (20, "Safety Systems"),
    (25, "Inter/Intranetwork Device"),
    (30, "Electrical Distribution"),
    (35, "Electrical Generation"),
    (40, "Steering and Control Surfaces"),
    (50, "Propulsion"),
    (60, "Navigation"),
    (70, "Communication"),
    (75, "Sensor Communication Interface"),
    (80, "Instrumentation/General Systems (Deprecated)"),
    (85, "External Environment"),
    (90, "Internal Environment"),
    (100, "Deck, Cargo and Fishing Equipment"),
    (120, "Display"),
    (125, "Entertainment"),
]);

pub const DEVICE_FUNCTION: SubLookup = SubLookup(&[
    (0, Lookup(&[(0, "Reserved for NMEA 2000 Use")])),
    (10, Lookup(&[(130, "Diagnostic"), (140, "Bus Traffic Logger")])),
    (
        20,
        Lookup(&[
            (110, "Alarm Enunciator (Deprecated)"),
            (130, "Emergency Position Indicating Radio Beacon (EPIRB)"),
            (135, "Man Overboard"),
            (140, "Voyage Data Recorder"),
            (150, "Camera"),
        ]),
    ),
    (
        25,
        Lookup(&[
            (130, "PC Gateway"),
            (131, "NMEA 2000 to Analog Gateway"),
            (132, "Analog to NMEA 2000 Gateway"),
            (135, "NMEA 0183 Gateway"),
            (140, "Router"),
            (150, "Bridge"),
            (160, "Repeater"),
        ]),
    ),
    (
        30,
        Lookup(&[
            (130, "Binary Event Monitor"),
            (140, "Load Controller"),
            (141, "AC/DC Input"),
            (150, "Function Controller"),
        ]),
    ),
    (
        40,
        Lookup(&[
            (130, "Follow-up Controller"),
            (140, "Mode Controller"),
            (150, "Autopilot"),
            (155, "Rudder"),
            (160, "Heading Sensors (Deprecated)"),
            (170, "Trim (Tabs)/Interceptors"),
            (180, "Attitude (Pitch, Roll, Yaw) Control"),
        ]),
    ),
    (
        60,
        Lookup(&[
            (130, "Bottom Depth"),
            (135, "Bottom Depth/Speed"),
            (140, "Ownship Attitude"),
            (145, "Ownship Position (GNSS)"),
            (150, "Ownship Position (Loran C)"),
            (155, "Speed"),
            (160, "Turn Rate Indicator"),
            (170, "Integrated Navigation"),
            (200, "Radar and/or Radar Plotting"),
            (205, "Electronic Chart Display & Information System (ECDIS)"),
        ]),
    ),
    (
        70,
        Lookup(&[
            (130, "EPIRB"),
            (140, "AIS"),
            (150, "DSC"),
            (160, "Data Receiver"),
            (170, "Satellite"),
            (180, "Radio-telephone (MF/HF)"),
            (190, "Radiotelephone"),
        ]),
    ),
]);

/// NMEA 2000 company codes, sorted numerically.
pub const COMPANY_CODES: Lookup = Lookup(&[
    (78, "FW Murphy"),
    (85, "Kohler"),
    (88, "Hemisphere GPS"),
    (135, "Airmar"),
    (137, "Maretron"),
    (140, "Lowrance Electronics"),
    (144, "Mercury Marine"),
    (147, "Nautibus Electronic GmbH"),
    (148, "Blue Water Data"),
    (161, "Offshore Systems UK"),
    (163, "Evinrude/BRP Bombardier"),
    (165, "CPac Systems AB"),
    (174, "Volvo Penta"),
    (176, "Carling Technologies"),
    (185, "Beede Electrical"),
    (192, "Floscan Instrument Co Inc"),
    (193, "Nobeltec"),
    (198, "Mystic Valley Communications"),
    (199, "Actia Corporation"),
    (201, "Disenos Y Technologia"),
    (211, "DNA Group, Inc"),
    (215, "Aetna Engineering/Fireboy-Xintex"),
    (224, "EMMI Network"),
    (229, "Garmin"),
    (243, "eRide"),
    (257, "Honda"),
    (272, "Groco"),
    (273, "Actisense"),
    (274, "Amphenol LTW Technology"),
    (275, "Navico"),
    (283, "Hamilton Jet"),
    (286, "Coelmo Srl Italy"),
    (295, "BEP"),
    (304, "Empirbus"),
    (305, "Novatel"),
    (307, "MBW Technologies"),
    (315, "ICOM"),
    (328, "Qwerty"),
    (329, "Dief"),
    (345, "Korea Maritime University"),
    (355, "Mastervolt"),
    (356, "Fischer Panda"),
    (373, "Electronic Design"),
    (374, "Northern Lights"),
    (378, "Glendinning"),
    (381, "B&G"),
    (385, "Geonav"),
    (394, "Capi 2"),
    (396, "Beyond Measure"),
    (400, "Livorsi Marine"),
    (404, "Com Nav"),
    (419, "Fusion"),
    (426, "Egersund Marine Electronics AS"),
    (427, "Em-Trak Marine Electronics Ltd"),
    (437, "Digital Yacht Ltd"),
    (440, "Cummins"),
    (451, "Parker Hannifin"),
    (459, "Alltek Marine Electronics Group"),
    (467, "Hummingbird Marine Electronics"),
    (475, "GME / Standard Communications Pty"),
    (478, "Ocean Sat BV"),
    (499, "LCJ Capteurs"),
    (502, "Attwood Marine"),
    (503, "Naviop"),
    (517, "Noland"),
    (571, "Marinecraft (South Korea)"),
    (573, "Orolia Ltd"),
    (578, "Advansea"),
    (579, "KVH"),
    (1851, "Raymarine, Inc"),
    (1852, "Navionics"),
    (1853, "Japan Radio Co"),
    (1854, "Northstar"),
    (1855, "Furuno USA"),
    (1857, "Simrad"),
    (1858, "Litton"),
    (1859, "Kvasar AB"),
    (1860, "MMP"),
    (1863, "Faria Instruments"),
]);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_company_codes_sorted() {
        assert!(COMPANY_CODES.0.windows(2).all(|w| w[0].0 < w[1].0));
    }

    #[test]
    fn test_company_code_resolution() {
        assert_eq!(COMPANY_CODES.get(135), Some("Airmar"));
        assert_eq!(COMPANY_CODES.get(140), Some("Lowrance Electronics"));
        assert_eq!(COMPANY_CODES.get(1857), Some("Simrad"));
        assert_eq!(COMPANY_CODES.get(2), None);
    }

    #[test]
    fn test_device_function_keyed_by_class() {
        assert_eq!(DEVICE_FUNCTION.get(25, 130), Some("PC Gateway"));
        assert_eq!(DEVICE_FUNCTION.get(60, 145), Some("Ownship Position (GNSS)"));
        assert_eq!(DEVICE_FUNCTION.get(99, 130), None);
    }
}
