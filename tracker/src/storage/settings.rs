//! Settings file management

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::logs::LogLevel;

/// Tracker settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,

    /// Log output configuration
    #[serde(default)]
    pub log: LogSettings,

    /// Resource manager endpoint configuration
    #[serde(default)]
    pub arm: ArmSettings,

    /// Delay between poll cycles in milliseconds
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Maximum number of nested deployment levels to follow
    #[serde(default = "default_max_nesting_depth")]
    pub max_nesting_depth: usize,
}

fn default_poll_interval_ms() -> u64 {
    5000
}

fn default_max_nesting_depth() -> usize {
    crate::track::resolver::DEFAULT_MAX_NESTING_DEPTH
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_level: LogLevel::Info,
            log: LogSettings::default(),
            arm: ArmSettings::default(),
            poll_interval_ms: default_poll_interval_ms(),
            max_nesting_depth: default_max_nesting_depth(),
        }
    }
}

/// Log output settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LogSettings {
    /// Emit JSON log lines
    #[serde(default)]
    pub json_format: bool,

    /// Also write daily log files to this directory
    #[serde(default)]
    pub log_dir: Option<PathBuf>,
}

/// Resource manager endpoint settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArmSettings {
    /// Management endpoint
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// `api-version` used for deployment requests
    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// Subscription id
    #[serde(default)]
    pub subscription_id: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    "https://management.azure.com".to_string()
}

fn default_api_version() -> String {
    "2015-11-01".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for ArmSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_version: default_api_version(),
            subscription_id: String::new(),
            timeout_secs: default_timeout_secs(),
        }
    }
}
