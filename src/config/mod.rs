//! Configuration for the report jobs.
//!
//! Loaded with precedence: Env vars > Config file > Defaults
//!
//! # Example config file (opsdash.toml)
//! ```toml
//! [ownership]
//! data_path = "/var/lib/opsdash/ownership_data.json"
//!
//! [warehouse]
//! project = "khanacademy.org:deductive-jet-827"
//!
//! [alerts]
//! webhook_url = "https://hooks.slack.com/services/..."
//! channel = "#infrastructure-sre"
//! ```

mod defaults;

pub use defaults::*;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration for the opsdash jobs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OpsConfig {
    /// Ownership dataset location and refresh policy
    pub ownership: OwnershipConfig,
    /// Warehouse access
    pub warehouse: WarehouseConfig,
    /// Alert delivery
    pub alerts: AlertConfig,
}

impl OpsConfig {
    /// Load configuration with precedence: Env > File > Defaults
    ///
    /// # Arguments
    /// * `config_path` - Optional path to TOML config file
    pub fn load(config_path: Option<&str>) -> Result<Self, ConfigError> {
        let mut figment = Figment::new().merge(Serialized::defaults(OpsConfig::default()));

        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        figment = figment.merge(Env::prefixed("OPSDASH_").split("__"));

        figment.extract().map_err(ConfigError::from)
    }
}

/// Where the ownership dataset lives and how often it refreshes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OwnershipConfig {
    /// Local cache of the dataset file
    pub data_path: PathBuf,
    /// Remote object the dataset is refreshed from
    pub remote_uri: String,
    /// Staleness window in seconds
    pub staleness_secs: u64,
    /// gsutil binary for the remote copy
    pub gsutil_bin: PathBuf,
}

impl OwnershipConfig {
    pub fn staleness(&self) -> Duration {
        Duration::from_secs(self.staleness_secs)
    }
}

impl Default for OwnershipConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from(DEFAULT_DATA_PATH),
            remote_uri: DEFAULT_REMOTE_URI.to_string(),
            staleness_secs: DEFAULT_STALENESS_SECS,
            gsutil_bin: PathBuf::from(DEFAULT_GSUTIL_BIN),
        }
    }
}

/// Warehouse access configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WarehouseConfig {
    /// Project holding the request-log tables
    pub project: String,
    /// bq CLI binary
    pub bq_bin: PathBuf,
}

impl Default for WarehouseConfig {
    fn default() -> Self {
        Self {
            project: DEFAULT_WAREHOUSE_PROJECT.to_string(),
            bq_bin: PathBuf::from(DEFAULT_BQ_BIN),
        }
    }
}

/// Alert delivery configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertConfig {
    /// Incoming-webhook URL alerts are posted to
    pub webhook_url: String,
    /// Channel traffic alerts go to
    pub channel: String,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            webhook_url: String::new(),
            channel: DEFAULT_ALERT_CHANNEL.to_string(),
        }
    }
}

/// Configuration error.
#[derive(Debug)]
pub struct ConfigError {
    pub message: String,
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "configuration error: {}", self.message)
    }
}

impl std::error::Error for ConfigError {}

impl From<figment::Error> for ConfigError {
    fn from(e: figment::Error) -> Self {
        Self {
            message: e.to_string(),
        }
    }
}
