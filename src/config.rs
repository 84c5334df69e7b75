//! Configuration for the energy audit tool.

use crate::metrics::audit::{METADATA_KEY, OVERALL_SUMMARY_KEY};
use crate::series::DEFAULT_TIME_COLUMN;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Name of the elapsed-time column (seconds)
    pub time_column: String,

    /// Channel groups, in report order
    pub groups: Vec<ChannelGroup>,

    /// Rounding applied to the audit record
    pub precision: Precision,

    /// Directory for exported audit records
    pub export_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("energy-audit");

        Self {
            time_column: DEFAULT_TIME_COLUMN.to_string(),
            groups: default_groups(),
            precision: Precision::default(),
            export_path: data_dir.join("exports"),
        }
    }
}

impl Config {
    /// Load configuration from the default location.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_path();

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)
                .map_err(|e| ConfigError::IoError(e.to_string()))?;
            let config: Config = serde_json::from_str(&content)
                .map_err(|e| ConfigError::ParseError(e.to_string()))?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        let config_path = Self::config_path();

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::IoError(e.to_string()))?;
        }

        let content = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        std::fs::write(&config_path, content).map_err(|e| ConfigError::IoError(e.to_string()))?;

        Ok(())
    }

    /// Get the path to the configuration file.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("energy-audit")
            .join("config.json")
    }

    /// Ensure the export directory exists.
    pub fn ensure_directories(&self) -> Result<(), ConfigError> {
        std::fs::create_dir_all(&self.export_path)
            .map_err(|e| ConfigError::IoError(e.to_string()))?;
        Ok(())
    }

    /// Find a group by name.
    pub fn group(&self, name: &str) -> Option<&ChannelGroup> {
        self.groups.iter().find(|g| g.name == name)
    }

    /// Check that group names are unique and do not collide with record keys.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.time_column.trim().is_empty() {
            return Err(ConfigError::ParseError("time column name is empty".to_string()));
        }
        for (i, group) in self.groups.iter().enumerate() {
            if group.name.trim().is_empty() {
                return Err(ConfigError::ParseError(format!("group {} has no name", i + 1)));
            }
            if RESERVED_GROUP_NAMES.contains(&group.name.as_str()) {
                return Err(ConfigError::ParseError(format!(
                    "group name '{}' is reserved",
                    group.name
                )));
            }
            if self.groups[..i].iter().any(|g| g.name == group.name) {
                return Err(ConfigError::ParseError(format!(
                    "group '{}' is defined twice",
                    group.name
                )));
            }
        }
        Ok(())
    }
}

/// Top-level audit record keys a group may not use.
const RESERVED_GROUP_NAMES: &[&str] = &[METADATA_KEY, OVERALL_SUMMARY_KEY];

/// A named set of channels aggregated together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelGroup {
    pub name: String,
    pub channels: Vec<String>,
}

impl ChannelGroup {
    pub fn new<I, S>(name: impl Into<String>, channels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            channels: channels.into_iter().map(Into::into).collect(),
        }
    }

    /// Build a group from a comma-separated channel list.
    pub fn from_csv(name: &str, channels: &str) -> Self {
        Self::new(
            name.trim(),
            channels
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty()),
        )
    }

    /// Parse a `NAME=ch1,ch2,...` group definition.
    pub fn parse_assignment(s: &str) -> Result<Self, ConfigError> {
        let (name, channels) = s
            .split_once('=')
            .ok_or_else(|| ConfigError::ParseError(format!("expected NAME=ch1,ch2 but got '{s}'")))?;

        if name.trim().is_empty() {
            return Err(ConfigError::ParseError(format!("group name missing in '{s}'")));
        }

        Ok(Self::from_csv(name, channels))
    }
}

/// Decimal places used when rounding the audit record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Precision {
    /// Power, time and statistic fields
    pub value_decimals: u32,
    /// Energy fields (kWh, kWh/hour)
    pub energy_decimals: u32,
}

impl Default for Precision {
    fn default() -> Self {
        Self {
            value_decimals: 2,
            energy_decimals: 4,
        }
    }
}

/// The electrical and pneumatic groups of the machining centre test bench.
pub fn default_groups() -> Vec<ChannelGroup> {
    vec![
        ChannelGroup::new(
            "Elektrisch",
            [
                "Hauptversorgung",
                "24V-Versorgung",
                "Antriebe",
                "Bandfilteranlage",
                "Hebepumpe",
                "Kühlung",
                "KühlungSchaltschrank",
                "Späneförderer",
            ],
        ),
        ChannelGroup::new(
            "Pneumatisch",
            [
                "AirPower_Hauptversorgung",
                "AirPower_Blum",
                "AirPower_Hauptventilblock",
                "AirPower_BlasluftKegelreinigung",
                "AirPower_KlemmungTisch",
                "AirPower_NPS",
                "AirPower_Werkzeugkühlung",
                "AirPower_ÖlLuftschmierungSpindel",
                "AirPower_Sperrluft",
                "AirPower_BlasluftSpindelMitte",
            ],
        ),
    ]
}

/// Configuration errors.
#[derive(Debug)]
pub enum ConfigError {
    IoError(String),
    ParseError(String),
    SerializeError(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError(e) => write!(f, "IO error: {e}"),
            ConfigError::ParseError(e) => write!(f, "Parse error: {e}"),
            ConfigError::SerializeError(e) => write!(f, "Serialize error: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}
