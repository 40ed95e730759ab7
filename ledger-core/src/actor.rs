//! Actor-based concurrency for the ledger
//!
//! This module implements the single-writer pattern using Tokio actors:
//! - One task owns the [`LedgerStore`] and runs every read and append
//! - Check-then-append sequences run as one job, so they are linearized
//! - Journal writes are batched to amortize fsync cost
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │              Settlement engine / callers              │
//! └─────────────────────┬────────────────────────────────┘
//!                       │
//!                       ▼
//! ┌──────────────────────────────────────────────────────┐
//! │               LedgerHandle (Clone)                    │
//! │         Sends messages to actor mailbox              │
//! └─────────────────────┬────────────────────────────────┘
//!                       │
//!                       │ mpsc::channel (bounded)
//!                       ▼
//! ┌──────────────────────────────────────────────────────┐
//! │              LedgerActor (Single Task)                │
//! │  ┌────────────────────────────────────────────────┐  │
//! │  │ LedgerStore (exclusive &mut)                   │  │
//! │  │ Pending: Vec<Transaction>                      │  │
//! │  │ Timer: 10ms or 100 records → flush_batch()    │  │
//! │  └────────────────────────────────────────────────┘  │
//! │                       │                               │
//! │                       ▼                               │
//! │              Journal::persist()                       │
//! └───────────────────────────────────────────────────────┘
//! ```

use crate::{
    metrics::Metrics,
    storage::Journal,
    store::{LedgerStore, Query},
    types::{NewTransaction, Transaction, TransactionId},
    Error, Result,
};
use std::time::Instant;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{interval, Duration};

/// Closure run with exclusive access to the store; returns the reply
pub type Job = Box<dyn FnOnce(&mut LedgerStore) -> Reply + Send + 'static>;

/// Deferred reply, sent once the job's appends are accounted for
pub type Reply = Box<dyn FnOnce() + Send + 'static>;

/// Message sent to the ledger actor
pub enum LedgerMessage {
    /// Append a new record
    Append {
        record: NewTransaction,
        response: oneshot::Sender<Result<Transaction>>,
    },

    /// Query records (owned copy)
    Query {
        query: Query,
        response: oneshot::Sender<Vec<Transaction>>,
    },

    /// Run a job atomically against the store
    Transact { job: Job },

    /// Flush journal batch immediately
    FlushBatch {
        response: oneshot::Sender<Result<()>>,
    },

    /// Flush and stop the actor
    Shutdown {
        response: oneshot::Sender<Result<()>>,
    },
}

/// Actor that processes ledger messages
pub struct LedgerActor {
    /// The log, owned exclusively
    store: LedgerStore,

    /// Optional durable journal
    journal: Option<Box<dyn Journal>>,

    /// Mailbox for incoming messages
    mailbox: mpsc::Receiver<LedgerMessage>,

    /// Records appended but not yet journaled
    pending: Vec<Transaction>,

    /// Last record already accounted for (metrics and pending)
    tracked: Option<TransactionId>,

    /// Metrics
    metrics: Metrics,

    /// Maximum batch size (records)
    max_batch_size: usize,

    /// Batch timeout
    batch_timeout: Duration,

    /// Batching enabled
    batching_enabled: bool,
}

impl LedgerActor {
    /// Create new actor
    pub fn new(
        store: LedgerStore,
        journal: Option<Box<dyn Journal>>,
        mailbox: mpsc::Receiver<LedgerMessage>,
        metrics: Metrics,
        max_batch_size: usize,
        batch_timeout: Duration,
        batching_enabled: bool,
    ) -> Self {
        let tracked = store.last_id();
        metrics.set_records(store.len());

        Self {
            store,
            journal,
            mailbox,
            pending: Vec::with_capacity(max_batch_size),
            tracked,
            metrics,
            max_batch_size,
            batch_timeout,
            batching_enabled,
        }
    }

    /// Run the actor event loop
    pub async fn run(mut self) {
        // interval() rejects a zero period
        let mut batch_timer = interval(self.batch_timeout.max(Duration::from_millis(1)));
        batch_timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                // Process incoming messages
                Some(msg) = self.mailbox.recv() => {
                    if let LedgerMessage::Shutdown { response } = msg {
                        let _ = response.send(self.flush_batch());
                        break;
                    }

                    self.handle_message(msg);

                    // Check if batch is full
                    if self.pending.len() >= self.max_batch_size {
                        if let Err(e) = self.flush_batch() {
                            tracing::error!("Error flushing batch: {}", e);
                        }
                    }
                }

                // Batch timeout expired
                _ = batch_timer.tick(), if self.batching_enabled && !self.pending.is_empty() => {
                    if let Err(e) = self.flush_batch() {
                        tracing::error!("Error flushing batch on timeout: {}", e);
                    }
                }

                // Mailbox closed
                else => {
                    if let Err(e) = self.flush_batch() {
                        tracing::error!("Error flushing batch on close: {}", e);
                    }
                    break;
                }
            }
        }

        tracing::debug!(records = self.store.len(), "Ledger actor stopped");
    }

    /// Handle a single message
    fn handle_message(&mut self, msg: LedgerMessage) {
        let started = Instant::now();

        let op = match msg {
            LedgerMessage::Append { record, response } => {
                let appended = self.store.append(record).clone();
                self.track_appended();
                self.persist_unbatched();
                let _ = response.send(Ok(appended));
                "append"
            }

            LedgerMessage::Query { query, response } => {
                let _ = response.send(self.store.query(&query).to_vec());
                "query"
            }

            LedgerMessage::Transact { job } => {
                let reply = job(&mut self.store);
                let appended = self.track_appended();
                self.persist_unbatched();
                reply();
                if appended > 0 {
                    "transact_write"
                } else {
                    "transact_read"
                }
            }

            LedgerMessage::FlushBatch { response } => {
                let _ = response.send(self.flush_batch());
                "flush"
            }

            LedgerMessage::Shutdown { .. } => {
                // Handled in main loop
                return;
            }
        };

        self.metrics.record_job_duration(op, started.elapsed().as_secs_f64());
    }

    /// Account for records appended since the last call; returns their number
    fn track_appended(&mut self) -> usize {
        let appended = self.store.since(self.tracked);
        let count = appended.len();
        if count == 0 {
            return 0;
        }

        for record in appended {
            self.metrics.record_append(record.kind.as_str());
        }
        if self.journal.is_some() {
            self.pending.extend_from_slice(appended);
        }

        self.tracked = self.store.last_id();
        self.metrics.set_records(self.store.len());
        count
    }

    /// Write through to the journal when batching is off
    ///
    /// A journal failure does not undo the in-memory append: the caller is
    /// answered with the committed record and the batch stays pending for the
    /// next flush.
    fn persist_unbatched(&mut self) {
        if self.batching_enabled {
            return;
        }
        if let Err(e) = self.flush_batch() {
            tracing::error!(pending = self.pending.len(), "Error persisting records: {}", e);
        }
    }

    /// Flush pending records to the journal
    ///
    /// Records stay pending when the journal rejects them and are retried on
    /// the next flush.
    fn flush_batch(&mut self) -> Result<()> {
        if self.pending.is_empty() {
            return Ok(());
        }

        let Some(journal) = self.journal.as_mut() else {
            self.pending.clear();
            return Ok(());
        };

        tracing::debug!("Flushing batch of {} records", self.pending.len());

        journal.persist(&self.pending)?;
        self.metrics.record_batch_flush(self.pending.len());
        self.pending.clear();

        Ok(())
    }
}

/// Handle for sending messages to the actor
#[derive(Clone, Debug)]
pub struct LedgerHandle {
    sender: mpsc::Sender<LedgerMessage>,
}

impl LedgerHandle {
    /// Create new handle
    pub fn new(sender: mpsc::Sender<LedgerMessage>) -> Self {
        Self { sender }
    }

    async fn send(&self, msg: LedgerMessage) -> Result<()> {
        self.sender
            .send(msg)
            .await
            .map_err(|_| Error::Concurrency("Actor mailbox closed".to_string()))
    }

    /// Append a record
    pub async fn append(&self, record: NewTransaction) -> Result<Transaction> {
        let (tx, rx) = oneshot::channel();
        self.send(LedgerMessage::Append {
            record,
            response: tx,
        })
        .await?;

        rx.await
            .map_err(|_| Error::Concurrency("Response channel closed".to_string()))?
    }

    /// Query records
    pub async fn query(&self, query: Query) -> Result<Vec<Transaction>> {
        let (tx, rx) = oneshot::channel();
        self.send(LedgerMessage::Query {
            query,
            response: tx,
        })
        .await?;

        rx.await
            .map_err(|_| Error::Concurrency("Response channel closed".to_string()))
    }

    /// Run `op` with exclusive access to the store
    ///
    /// No other message is processed while `op` runs, so a read followed by
    /// an append inside `op` cannot interleave with any other writer.
    pub async fn transact<T, F>(&self, op: F) -> Result<T>
    where
        F: FnOnce(&mut LedgerStore) -> T + Send + 'static,
        T: Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        let job: Job = Box::new(move |store: &mut LedgerStore| {
            let value = op(store);
            Box::new(move || {
                let _ = tx.send(value);
            }) as Reply
        });
        self.send(LedgerMessage::Transact { job }).await?;

        rx.await
            .map_err(|_| Error::Concurrency("Response channel closed".to_string()))
    }

    /// Flush journal batch immediately
    pub async fn flush_batch(&self) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        self.send(LedgerMessage::FlushBatch { response: tx }).await?;

        rx.await
            .map_err(|_| Error::Concurrency("Response channel closed".to_string()))?
    }

    /// Flush and stop the actor
    pub async fn shutdown(&self) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        self.send(LedgerMessage::Shutdown { response: tx }).await?;

        rx.await
            .map_err(|_| Error::Concurrency("Response channel closed".to_string()))?
    }
}

/// Spawn the ledger actor
pub fn spawn_ledger_actor(
    store: LedgerStore,
    journal: Option<Box<dyn Journal>>,
    metrics: Metrics,
    mailbox_capacity: usize,
    max_batch_size: usize,
    batch_timeout: Duration,
    batching_enabled: bool,
) -> LedgerHandle {
    let (tx, rx) = mpsc::channel(mailbox_capacity); // Bounded channel for backpressure
    let actor = LedgerActor::new(
        store,
        journal,
        rx,
        metrics,
        max_batch_size,
        batch_timeout,
        batching_enabled,
    );

    tokio::spawn(async move {
        actor.run().await;
    });

    LedgerHandle::new(tx)
}
