//! BeanBack Ledger Core
//!
//! Append-only stamp transaction log shared by every loyalty operation.
//!
//! # Architecture
//!
//! - **Append-only**: Records are never modified or deleted
//! - **Single Writer**: One actor task owns the log and linearizes appends
//! - **Per-user index**: Queries touch only the requesting user's records
//! - **Batched journal**: Optional RocksDB journal (feature `persistent`)
//!
//! # Invariants
//!
//! - Ids are assigned at append time, contiguous from 1
//! - The log is totally ordered by id
//! - A query view never mutates the store and can be iterated repeatedly

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    missing_debug_implementations,
    clippy::all
)]

pub mod types;
pub mod store;
pub mod storage;
pub mod ledger;
pub mod error;
pub mod actor;
pub mod config;
pub mod metrics;

// Re-exports
pub use config::{BatchingConfig, Config};
pub use error::{Error, Result};
pub use ledger::Ledger;
pub use metrics::Metrics;
pub use store::{LedgerStore, Query, QueryView};
pub use types::{
    Cents, MerchantId, NewTransaction, Transaction, TransactionId, TransactionKind, UserId,
};
