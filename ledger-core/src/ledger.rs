//! Main ledger orchestration layer
//!
//! This module ties together the store, the journal, and the actor
//! into a high-level API for recording stamp transactions.
//!
//! # Example
//!
//! ```no_run
//! use beanback_ledger::{Cents, Config, Ledger, MerchantId, NewTransaction, Query, UserId};
//!
//! #[tokio::main]
//! async fn main() -> beanback_ledger::Result<()> {
//!     let ledger = Ledger::open(Config::default()).await?;
//!
//!     let record = NewTransaction::earn(UserId::new("u1"), MerchantId::new("c1"), Cents::new(450));
//!     let appended = ledger.append(record).await?;
//!     let history = ledger.query(Query::user(UserId::new("u1"))).await?;
//!     assert_eq!(history.last().map(|t| t.id), Some(appended.id));
//!
//!     ledger.shutdown().await
//! }
//! ```

use crate::{
    actor::{spawn_ledger_actor, LedgerHandle},
    metrics::Metrics,
    storage::Journal,
    store::{LedgerStore, Query},
    types::{NewTransaction, Transaction},
    Config, Result,
};
use tokio::time::Duration;

/// Main ledger interface
#[derive(Clone)]
pub struct Ledger {
    /// Actor handle
    handle: LedgerHandle,

    /// Metrics shared with the actor
    metrics: Metrics,

    /// Configuration
    config: Config,
}

impl std::fmt::Debug for Ledger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ledger")
            .field("handle", &self.handle)
            .field("config", &self.config)
            .finish()
    }
}

impl Ledger {
    /// Open ledger with configuration
    ///
    /// With the `persistent` feature the RocksDB journal under
    /// `config.data_dir` is opened and replayed; otherwise the log lives in
    /// memory only.
    pub async fn open(config: Config) -> Result<Self> {
        let journal = Self::default_journal(&config)?;
        Self::open_with(config, journal, Metrics::new()?).await
    }

    /// Open ledger with an explicit journal and metrics collector
    pub async fn open_with(
        config: Config,
        journal: Option<Box<dyn Journal>>,
        metrics: Metrics,
    ) -> Result<Self> {
        config.validate()?;

        // Replay journal
        let store = match &journal {
            Some(journal) => LedgerStore::from_records(journal.replay()?)?,
            None => LedgerStore::new(),
        };

        tracing::info!(
            service = %config.service_name,
            records = store.len(),
            journaled = journal.is_some(),
            "Ledger opened"
        );

        // Spawn actor
        let handle = spawn_ledger_actor(
            store,
            journal,
            metrics.clone(),
            config.mailbox_capacity,
            config.batching.max_batch_size,
            Duration::from_millis(config.batching.batch_timeout_ms),
            config.batching.enabled,
        );

        Ok(Self {
            handle,
            metrics,
            config,
        })
    }

    #[cfg(feature = "persistent")]
    fn default_journal(config: &Config) -> Result<Option<Box<dyn Journal>>> {
        let journal = crate::storage::RocksJournal::open(config)?;
        Ok(Some(Box::new(journal)))
    }

    #[cfg(not(feature = "persistent"))]
    fn default_journal(_config: &Config) -> Result<Option<Box<dyn Journal>>> {
        Ok(None)
    }

    /// Append a record
    pub async fn append(&self, record: NewTransaction) -> Result<Transaction> {
        self.handle.append(record).await
    }

    /// Query records (owned copy, insertion order)
    pub async fn query(&self, query: Query) -> Result<Vec<Transaction>> {
        self.handle.query(query).await
    }

    /// Run `op` with exclusive access to the store
    pub async fn transact<T, F>(&self, op: F) -> Result<T>
    where
        F: FnOnce(&mut LedgerStore) -> T + Send + 'static,
        T: Send + 'static,
    {
        self.handle.transact(op).await
    }

    /// Actor handle, for callers that only need message passing
    pub fn handle(&self) -> &LedgerHandle {
        &self.handle
    }

    /// Metrics collector
    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// Configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Flush journal batch immediately
    pub async fn flush_batch(&self) -> Result<()> {
        self.handle.flush_batch().await
    }

    /// Shutdown ledger, flushing the journal
    pub async fn shutdown(self) -> Result<()> {
        self.handle.shutdown().await
    }
}
