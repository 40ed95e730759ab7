//! Configuration for the settlement engine

use crate::merchants::Merchant;
use beanback_ledger::Cents;
use serde::{Deserialize, Serialize};

/// Settlement engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Service name
    pub service_name: String,

    /// Service version
    pub service_version: String,

    /// Log output format
    pub log_format: LogFormat,

    /// Item cost used when a redemption names none (minor units)
    pub default_item_cost: Cents,

    /// Transactions shown in a wallet projection
    pub history_limit: usize,

    /// Ledger configuration
    pub ledger: beanback_ledger::Config,

    /// Merchants seeded into the registry
    pub merchants: Vec<Merchant>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service_name: "beanback-settlement".to_string(),
            service_version: env!("CARGO_PKG_VERSION").to_string(),
            log_format: LogFormat::default(),
            default_item_cost: Cents::new(500),
            history_limit: 10,
            ledger: beanback_ledger::Config::default(),
            merchants: vec![
                Merchant::new("c1", "Cafe A"),
                Merchant::new("c2", "Cafe B"),
                Merchant::new("c3", "Cafe C"),
            ],
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Pretty,
    /// One JSON object per line
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" | "plain" | "text" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(crate::Error::Config(format!("Unknown log format: {}", other))),
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
        let mut config = Config {
            ledger: beanback_ledger::Config::from_env()?,
            ..Config::default()
        };

        if let Ok(format) = std::env::var("BEANBACK_LOG_FORMAT") {
            config.log_format = format.parse()?;
        }

        if let Ok(cost) = std::env::var("BEANBACK_DEFAULT_ITEM_COST") {
            let cents = cost.parse::<i64>().map_err(|e| {
                crate::Error::Config(format!("Invalid BEANBACK_DEFAULT_ITEM_COST: {}", e))
            })?;
            config.default_item_cost = Cents::new(cents);
        }

        if let Ok(limit) = std::env::var("BEANBACK_HISTORY_LIMIT") {
            config.history_limit = limit.parse().map_err(|e| {
                crate::Error::Config(format!("Invalid BEANBACK_HISTORY_LIMIT: {}", e))
            })?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject values the engine cannot run with
    pub fn validate(&self) -> crate::Result<()> {
        if self.default_item_cost.is_negative() {
            return Err(crate::Error::Config(
                "default_item_cost must not be negative".to_string(),
            ));
        }
        self.ledger
            .validate()
            .map_err(|e| crate::Error::Config(e.to_string()))
    }
}
