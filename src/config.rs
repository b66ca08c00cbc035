use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub dataset: DatasetConfig,
    /// IANA timezone the sweeping schedule is defined in (e.g.
    /// "America/Los_Angeles"). Lookup dates are computed in this zone.
    pub timezone: String,
    /// Allowed CORS origins. Required unless cors_permissive is true.
    #[serde(default)]
    pub cors_origins: Vec<String>,
    /// Explicitly allow all origins (development only). Defaults to false.
    #[serde(default)]
    pub cors_permissive: bool,
    /// Reminder dispatch configuration
    #[serde(default)]
    pub reminders: ReminderConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatasetConfig {
    /// Path to the street sweeping schedule CSV
    pub path: PathBuf,
    /// Interval in seconds between dataset refresh cycles (default: daily)
    #[serde(default = "DatasetConfig::default_refresh_interval_secs")]
    pub refresh_interval_secs: u64,
}

impl DatasetConfig {
    fn default_refresh_interval_secs() -> u64 {
        24 * 60 * 60
    }
}

/// Configuration for the reminder dispatch loop
#[derive(Debug, Clone, Deserialize)]
pub struct ReminderConfig {
    /// Interval in seconds between reminder dispatch cycles (default: 3600)
    #[serde(default = "ReminderConfig::default_interval_secs")]
    pub interval_secs: u64,
    /// SimplePush-compatible send endpoint
    #[serde(default = "ReminderConfig::default_endpoint")]
    pub endpoint: String,
    /// Push key; reminder dispatch is disabled when unset
    #[serde(default)]
    pub push_key: Option<String>,
}

impl Default for ReminderConfig {
    fn default() -> Self {
        Self {
            interval_secs: Self::default_interval_secs(),
            endpoint: Self::default_endpoint(),
            push_key: None,
        }
    }
}

impl ReminderConfig {
    fn default_interval_secs() -> u64 {
        3600
    }
    fn default_endpoint() -> String {
        "https://api.simplepush.io/send".to_string()
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::ReadError(e.to_string()))?;

        serde_yaml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    pub fn parse_timezone(&self) -> Result<chrono_tz::Tz, ConfigError> {
        self.timezone
            .parse()
            .map_err(|_| ConfigError::InvalidTimezone(self.timezone.clone()))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(String),
    #[error("Failed to parse config: {0}")]
    ParseError(String),
    #[error("Unknown timezone: {0}")]
    InvalidTimezone(String),
}
