//! Durable journal behind the in-memory log
//!
//! The in-memory [`LedgerStore`](crate::store::LedgerStore) answers every
//! query. A journal only receives appended records (in batches) and hands
//! them back on startup for replay.
//!
//! # Column Families
//!
//! - `transactions` - Append-only transaction journal (key: big-endian id)

use crate::{error::Result, types::Transaction};
use parking_lot::Mutex;

/// Append-only sink for ledger records
pub trait Journal: Send {
    /// Persist records in id order; the slice is never empty
    fn persist(&mut self, records: &[Transaction]) -> Result<()>;

    /// Every persisted record, ascending id
    fn replay(&self) -> Result<Vec<Transaction>>;
}

#[cfg(feature = "persistent")]
pub use rocks::RocksJournal;

#[cfg(feature = "persistent")]
mod rocks {
    use super::Journal;
    use crate::{
        error::{Error, Result},
        types::Transaction,
        Config,
    };
    use rocksdb::{
        BoundColumnFamily, ColumnFamilyDescriptor, DBCompactionStyle, IteratorMode, Options,
        WriteBatch, DB,
    };
    use std::sync::Arc;

    /// Column family names
    const CF_TRANSACTIONS: &str = "transactions";

    /// RocksDB-backed journal
    pub struct RocksJournal {
        db: DB,
    }

    impl std::fmt::Debug for RocksJournal {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.debug_struct("RocksJournal")
                .field("path", &self.db.path())
                .finish()
        }
    }

    impl RocksJournal {
        /// Open or create the journal under `config.data_dir`
        pub fn open(config: &Config) -> Result<Self> {
            let path = &config.data_dir;
            std::fs::create_dir_all(path)?;

            let mut db_opts = Options::default();
            db_opts.create_if_missing(true);
            db_opts.create_missing_column_families(true);
            // Write-heavy, append-only workload
            db_opts.set_compaction_style(DBCompactionStyle::Universal);

            let mut cf_opts = Options::default();
            cf_opts.set_compression_type(rocksdb::DBCompressionType::Zstd);

            let db = DB::open_cf_descriptors(
                &db_opts,
                path,
                vec![ColumnFamilyDescriptor::new(CF_TRANSACTIONS, cf_opts)],
            )?;

            tracing::info!("Opened RocksDB journal at {:?}", path);

            Ok(Self { db })
        }

        fn cf_handle(&self) -> Result<Arc<BoundColumnFamily<'_>>> {
            self.db
                .cf_handle(CF_TRANSACTIONS)
                .ok_or_else(|| Error::Storage(format!("Column family {} not found", CF_TRANSACTIONS)))
        }
    }

    impl Journal for RocksJournal {
        fn persist(&mut self, records: &[Transaction]) -> Result<()> {
            let cf = self.cf_handle()?;
            let mut batch = WriteBatch::default();

            for record in records {
                let value = bincode::serialize(record)?;
                batch.put_cf(&cf, record.id.get().to_be_bytes(), value);
            }

            // Atomic commit
            self.db.write(batch)?;
            Ok(())
        }

        fn replay(&self) -> Result<Vec<Transaction>> {
            let cf = self.cf_handle()?;
            let mut records = Vec::new();

            for item in self.db.iterator_cf(&cf, IteratorMode::Start) {
                let (_, value) = item?;
                records.push(bincode::deserialize(&value)?);
            }

            Ok(records)
        }
    }

}

/// Journal that keeps records in memory, used by tests
#[derive(Debug, Default, Clone)]
pub struct MemoryJournal {
    records: std::sync::Arc<Mutex<Vec<Transaction>>>,
}

impl MemoryJournal {
    /// Create an empty journal
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of persisted records (shared across clones)
    pub fn persisted(&self) -> usize {
        self.records.lock().len()
    }
}

impl Journal for MemoryJournal {
    fn persist(&mut self, records: &[Transaction]) -> Result<()> {
        self.records.lock().extend_from_slice(records);
        Ok(())
    }

    fn replay(&self) -> Result<Vec<Transaction>> {
        Ok(self.records.lock().clone())
    }
}
