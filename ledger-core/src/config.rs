//! Configuration for the ledger

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Ledger configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Data directory for the durable journal (unused when the
    /// `persistent` feature is off)
    pub data_dir: PathBuf,

    /// Service name
    pub service_name: String,

    /// Actor mailbox capacity (backpressure bound)
    pub mailbox_capacity: usize,

    /// Journal batching configuration
    pub batching: BatchingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data/ledger"),
            service_name: "beanback-ledger".to_string(),
            mailbox_capacity: 1000,
            batching: BatchingConfig::default(),
        }
    }
}

/// Journal batching configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchingConfig {
    /// Maximum batch size (transactions)
    pub max_batch_size: usize,

    /// Batch timeout (milliseconds)
    pub batch_timeout_ms: u64,

    /// Enable batching
    pub enabled: bool,
}

impl Default for BatchingConfig {
    fn default() -> Self {
        Self {
            max_batch_size: 100,
            batch_timeout_ms: 10,
            enabled: true,
        }
    }
}

impl Config {
    /// Load from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| crate::Error::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from environment variables
    pub fn from_env() -> crate::Result<Self> {
        let mut config = Config::default();

        if let Ok(data_dir) = std::env::var("BEANBACK_LEDGER_DATA_DIR") {
            config.data_dir = PathBuf::from(data_dir);
        }

        if let Ok(capacity) = std::env::var("BEANBACK_LEDGER_MAILBOX") {
            config.mailbox_capacity = capacity.parse().map_err(|e| {
                crate::Error::Config(format!("Invalid BEANBACK_LEDGER_MAILBOX: {}", e))
            })?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject values the actor cannot run with
    pub fn validate(&self) -> crate::Result<()> {
        if self.mailbox_capacity == 0 {
            return Err(crate::Error::Config(
                "mailbox_capacity must be positive".to_string(),
            ));
        }
        if self.batching.enabled && self.batching.max_batch_size == 0 {
            return Err(crate::Error::Config(
                "max_batch_size must be positive when batching is enabled".to_string(),
            ));
        }
        if self.batching.enabled && self.batching.batch_timeout_ms == 0 {
            return Err(crate::Error::Config(
                "batch_timeout_ms must be positive when batching is enabled".to_string(),
            ));
        }
        Ok(())
    }
}
