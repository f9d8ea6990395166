use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

use n2k::EvictionPolicy;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub adapter: AdapterConfig,
    #[serde(default)]
    pub reassembly: ReassemblyConfig,
    #[serde(default)]
    pub source_filter: SourceFilterConfig,
    #[serde(default)]
    pub logging: LogConfig,
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub statistics: StatisticsConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdapterKind {
    Actisense,
    Canusb,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdapterConfig {
    /// Which framing protocol the device speaks
    pub kind: AdapterKind,
    /// Serial device or capture file to read
    pub device: String,
    /// Source address to claim on the bus (CANUSB only)
    #[serde(default = "default_preferred_address")]
    pub preferred_address: u8,
    /// PGNs to request from the bus right after the channel opens
    #[serde(default)]
    pub startup_requests: Vec<u32>,
}

fn default_preferred_address() -> u8 {
    221
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReassemblyConfig {
    /// Partial fast packet trains older than this are evicted
    pub max_age_ms: u64,
    /// Cap on concurrently pending trains
    pub max_pending: usize,
}

impl Default for ReassemblyConfig {
    fn default() -> Self {
        Self {
            max_age_ms: 5000,
            max_pending: 64,
        }
    }
}

impl ReassemblyConfig {
    pub fn eviction_policy(&self) -> EvictionPolicy {
        EvictionPolicy {
            max_age: Duration::from_millis(self.max_age_ms),
            max_pending: self.max_pending,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SourceFilterConfig {
    /// Map of PGN to allowed source address
    /// If a PGN is present in this map, only messages from the specified source will be accepted
    /// If a PGN is not in the map, all sources are accepted
    #[serde(default)]
    pub pgn_source_map: std::collections::HashMap<u32, u8>,
}

impl SourceFilterConfig {
    /// Check if a message should be accepted based on its PGN and source
    /// Returns true if:
    /// - No filter is configured for this PGN (accept all sources)
    /// - A filter is configured and the source matches
    pub fn should_accept(&self, pgn: u32, source: u8) -> bool {
        match self.pgn_source_map.get(&pgn) {
            Some(&allowed_source) => source == allowed_source,
            None => true, // No filter for this PGN, accept all sources
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Directory where log files will be stored
    pub directory: String,
    /// Log file name prefix (date will be appended)
    pub file_prefix: String,
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            directory: "./logs".to_string(),
            file_prefix: "nmea_gateway".to_string(),
            level: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// Print each decoded message
    pub enabled: bool,
    /// Also print fields that decoded as absent
    pub verbose: bool,
    /// Only print this PGN
    #[serde(default)]
    pub pgn: Option<u32>,
    /// Only print messages from this source address
    #[serde(default)]
    pub source: Option<u8>,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            verbose: false,
            pgn: None,
            source: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatisticsConfig {
    /// Track per-PGN message counts
    pub enabled: bool,
    pub interval_seconds: u64,
}

impl Default for StatisticsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            interval_seconds: 60,
        }
    }
}

impl StatisticsConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_seconds)
    }
}

impl Config {
    /// Load configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&contents)?;
        Ok(config)
    }

    /// Create default configuration
    pub fn default() -> Self {
        Config {
            adapter: AdapterConfig {
                kind: AdapterKind::Actisense,
                device: "/dev/ttyUSB0".to_string(),
                preferred_address: default_preferred_address(),
                startup_requests: Vec::new(),
            },
            reassembly: ReassemblyConfig::default(),
            source_filter: SourceFilterConfig::default(),
            logging: LogConfig::default(),
            display: DisplayConfig::default(),
            statistics: StatisticsConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reassembly_config_default() {
        let config = ReassemblyConfig::default();
        assert_eq!(config.max_age_ms, 5000);
        assert_eq!(config.max_pending, 64);
    }

    #[test]
    fn test_reassembly_eviction_policy() {
        let config = ReassemblyConfig {
            max_age_ms: 250,
            max_pending: 8,
        };
        let policy = config.eviction_policy();
        assert_eq!(policy.max_age, Duration::from_millis(250));
        assert_eq!(policy.max_pending, 8);
    }

    #[test]
    fn test_source_filter_no_filter() {
        let filter = SourceFilterConfig::default();
        // No filters configured, should accept all sources
        assert!(filter.should_accept(129025, 10));
        assert!(filter.should_accept(129025, 22));
        assert!(filter.should_accept(127488, 5));
    }

    #[test]
    fn test_source_filter_with_filter() {
        let mut filter = SourceFilterConfig::default();
        filter.pgn_source_map.insert(129025, 22);
        filter.pgn_source_map.insert(127488, 5);

        // PGN 129025 should only accept source 22
        assert!(filter.should_accept(129025, 22));
        assert!(!filter.should_accept(129025, 10));

        // PGN 127488 should only accept source 5
        assert!(filter.should_accept(127488, 5));
        assert!(!filter.should_accept(127488, 22));

        // PGN 130312 has no filter, should accept all sources
        assert!(filter.should_accept(130312, 10));
    }

    #[test]
    fn test_log_config_default() {
        let log_config = LogConfig::default();
        assert_eq!(log_config.directory, "./logs");
        assert_eq!(log_config.file_prefix, "nmea_gateway");
        assert_eq!(log_config.level, "info");
    }

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.adapter.kind, AdapterKind::Actisense);
        assert_eq!(config.adapter.preferred_address, 221);
        assert!(config.display.enabled);
        assert!(!config.statistics.enabled);
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("actisense"));
        assert!(json.contains("/dev/ttyUSB0"));
    }

    #[test]
    fn test_config_deserialization() {
        let json = r#"{
            "adapter": {
                "kind": "canusb",
                "device": "/dev/ttyUSB1",
                "preferred_address": 35,
                "startup_requests": [60928, 126996]
            },
            "reassembly": {
                "max_age_ms": 2000,
                "max_pending": 16
            },
            "display": {
                "enabled": true,
                "verbose": true,
                "pgn": 130306
            },
            "statistics": {
                "enabled": true,
                "interval_seconds": 30
            }
        }"#;

        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.adapter.kind, AdapterKind::Canusb);
        assert_eq!(config.adapter.device, "/dev/ttyUSB1");
        assert_eq!(config.adapter.preferred_address, 35);
        assert_eq!(config.adapter.startup_requests, vec![60928, 126996]);
        assert_eq!(config.reassembly.max_age_ms, 2000);
        assert!(config.display.verbose);
        assert_eq!(config.display.pgn, Some(130306));
        assert_eq!(config.display.source, None);
        assert_eq!(config.statistics.interval(), Duration::from_secs(30));
        // Sections left out fall back to defaults
        assert_eq!(config.logging.level, "info");
        assert!(config.source_filter.pgn_source_map.is_empty());
    }

    #[test]
    fn test_adapter_kind_rejects_unknown() {
        let json = r#"{"adapter": {"kind": "bluetooth", "device": "x"}}"#;
        assert!(serde_json::from_str::<Config>(json).is_err());
    }
}
