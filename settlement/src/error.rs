//! Error types for the settlement engine

use beanback_ledger::{MerchantId, UserId};
use thiserror::Error;

/// Result type for settlement operations
pub type Result<T> = std::result::Result<T, Error>;

/// Settlement errors
#[derive(Error, Debug)]
pub enum Error {
    /// Ledger error
    #[error("Ledger error: {0}")]
    Ledger(#[from] beanback_ledger::Error),

    /// Earn attempted at a merchant missing from the registry
    #[error("Unknown merchant: {0}")]
    UnknownMerchant(MerchantId),

    /// Redeem attempted without a full card
    #[error("Insufficient stamps for {user_id}: balance {balance}, need {required}")]
    InsufficientStamps {
        /// User
        user_id: UserId,
        /// Balance at the time of the attempt
        balance: u64,
        /// Stamps a redemption consumes
        required: u64,
    },

    /// Funding window shorter than a full card (ledger integrity fault)
    #[error("Insufficient paid history for {user_id}: found {found}, need {required}")]
    InsufficientHistory {
        /// User
        user_id: UserId,
        /// Eligible Earn records found
        found: usize,
        /// Records a funding window needs
        required: usize,
    },

    /// Amount outside the accepted range
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Metrics registration error
    #[error("Metrics error: {0}")]
    Metrics(#[from] prometheus::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Short label for metrics and logs
    pub fn reason(&self) -> &'static str {
        match self {
            Error::Ledger(_) => "ledger",
            Error::UnknownMerchant(_) => "unknown_merchant",
            Error::InsufficientStamps { .. } => "insufficient_stamps",
            Error::InsufficientHistory { .. } => "insufficient_history",
            Error::InvalidAmount(_) => "invalid_amount",
            Error::Config(_) => "config",
            Error::Metrics(_) => "metrics",
            Error::Io(_) => "io",
        }
    }
}
