//! Settlement Engine
//!
//! Stamp balances and redemption cost-sharing for the BeanBack loyalty ledger.
//!
//! # Architecture
//!
//! The engine keeps no state of its own; everything lives in the ledger.
//!
//! 1. **Earn**: validate the merchant, append an Earn record
//! 2. **Balance**: `max(0, earns - 8 * redeems)` per user
//! 3. **Redeem**: check the balance, append a Redeem record, split the item cost
//! 4. **Split**: each merchant of the 8 most recent Earn records pays
//!    `round(item_cost * count / 8)`, ties to even
//!
//! Each operation runs inside a single ledger transaction, so concurrent
//! redemptions cannot spend the same card twice.
//!
//! # Example
//!
//! ```no_run
//! use beanback_ledger::{Cents, MerchantId, UserId};
//! use beanback_settlement::{Config, SettlementEngine};
//!
//! #[tokio::main]
//! async fn main() -> beanback_settlement::Result<()> {
//!     let engine = SettlementEngine::new(Config::default()).await?;
//!
//!     for _ in 0..8 {
//!         engine
//!             .earn(UserId::new("u1"), MerchantId::new("c1"), Cents::new(450))
//!             .await?;
//!     }
//!
//!     let receipt = engine
//!         .redeem(UserId::new("u1"), MerchantId::new("c1"), Some(Cents::new(800)))
//!         .await?;
//!     for funder in &receipt.funders {
//!         println!("{} pays {}", funder.merchant_id, funder.share);
//!     }
//!
//!     engine.shutdown().await
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, clippy::all)]

pub mod config;
pub mod engine;
pub mod error;
pub mod funding;
pub mod merchants;
pub mod metrics;
pub mod types;

// Re-exports
pub use config::{Config, LogFormat};
pub use engine::SettlementEngine;
pub use error::{Error, Result};
pub use merchants::{Merchant, MerchantRegistry};
pub use metrics::Metrics;
pub use types::*;
