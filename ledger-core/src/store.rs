//! In-memory append-only transaction log
//!
//! The store is the single source of truth for balances and settlement.
//! Records are kept in insertion order (`id` order) and indexed per user so
//! that per-user queries never scan other users' history.
//!
//! The store is not synchronized. Exclusive ownership is given to the ledger
//! actor (see [`crate::actor`]), which linearizes every append.

use crate::{
    error::{Error, Result},
    types::{NewTransaction, Transaction, TransactionId, TransactionKind, UserId},
};
use chrono::Utc;
use std::collections::HashMap;

/// Append-only transaction log with a per-user index
#[derive(Debug, Default)]
pub struct LedgerStore {
    /// All records, `records[i].id == i + 1`
    records: Vec<Transaction>,

    /// Positions into `records`, per user, ascending
    by_user: HashMap<UserId, Vec<usize>>,
}

impl LedgerStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a store from previously appended records (journal replay)
    ///
    /// Records must be contiguous and in id order starting at 1.
    pub fn from_records(records: Vec<Transaction>) -> Result<Self> {
        let mut store = Self::new();
        for record in records {
            let expected = store.next_id();
            if record.id != expected {
                return Err(Error::Storage(format!(
                    "Journal out of sequence: expected id {}, found {}",
                    expected, record.id
                )));
            }
            store.insert(record);
        }
        Ok(store)
    }

    /// Append a record, assigning the next id and the current time
    pub fn append(&mut self, new: NewTransaction) -> &Transaction {
        let record = Transaction {
            id: self.next_id(),
            user_id: new.user_id,
            merchant_id: new.merchant_id,
            timestamp: Utc::now(),
            kind: new.kind,
            amount: new.amount,
        };

        tracing::debug!(
            transaction_id = %record.id,
            user_id = %record.user_id,
            merchant_id = %record.merchant_id,
            kind = %record.kind,
            "Transaction appended"
        );

        self.insert(record)
    }

    fn insert(&mut self, record: Transaction) -> &Transaction {
        let position = self.records.len();
        self.by_user
            .entry(record.user_id.clone())
            .or_default()
            .push(position);
        self.records.push(record);
        &self.records[position]
    }

    /// Id the next append will receive
    pub fn next_id(&self) -> TransactionId {
        TransactionId::new(self.records.len() as u64 + 1)
    }

    /// Id of the most recent record
    pub fn last_id(&self) -> Option<TransactionId> {
        self.records.last().map(|r| r.id)
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the log is empty
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Look up a record by id
    pub fn get(&self, id: TransactionId) -> Option<&Transaction> {
        let index = usize::try_from(id.get()).ok()?.checked_sub(1)?;
        self.records.get(index)
    }

    /// Records appended after `id` (all records when `id` is `None`)
    pub fn since(&self, id: Option<TransactionId>) -> &[Transaction] {
        let start = id
            .map(|id| (id.get() as usize).min(self.records.len()))
            .unwrap_or(0);
        &self.records[start..]
    }

    /// Lazy view over a user's records
    pub fn query(&self, query: &Query) -> QueryView<'_> {
        let positions = self
            .by_user
            .get(&query.user_id)
            .map(Vec::as_slice)
            .unwrap_or(&[]);

        QueryView::new(&self.records, positions, query.kind, query.limit)
    }

    /// Count a user's records of one kind
    pub fn count(&self, user_id: &UserId, kind: TransactionKind) -> usize {
        self.query(&Query::user(user_id.clone()).kind(kind)).count()
    }
}

/// Query filter: one user, optional kind, optional most-recent limit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    /// User whose records are returned
    pub user_id: UserId,

    /// Restrict to one kind
    pub kind: Option<TransactionKind>,

    /// Keep only the most recent `limit` matches
    pub limit: Option<usize>,
}

impl Query {
    /// All records of a user
    pub fn user(user_id: UserId) -> Self {
        Self {
            user_id,
            kind: None,
            limit: None,
        }
    }

    /// Restrict to one kind
    pub fn kind(mut self, kind: TransactionKind) -> Self {
        self.kind = Some(kind);
        self
    }

    /// Keep only the most recent `limit` matches
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Borrowed, restartable view over matching records in insertion order
///
/// Building the view only locates where iteration starts; records are
/// yielded lazily and the view can be iterated any number of times.
#[derive(Debug, Clone, Copy)]
pub struct QueryView<'a> {
    records: &'a [Transaction],
    positions: &'a [usize],
    kind: Option<TransactionKind>,
}

impl<'a> QueryView<'a> {
    fn new(
        records: &'a [Transaction],
        positions: &'a [usize],
        kind: Option<TransactionKind>,
        limit: Option<usize>,
    ) -> Self {
        let start = match limit {
            None => 0,
            Some(0) => positions.len(),
            Some(limit) => {
                // Walk back from the newest match until `limit` matches are covered
                let mut seen = 0;
                let mut start = 0;
                for (i, &pos) in positions.iter().enumerate().rev() {
                    if kind.map_or(true, |k| records[pos].kind == k) {
                        seen += 1;
                        if seen == limit {
                            start = i;
                            break;
                        }
                    }
                }
                start
            }
        };

        Self {
            records,
            positions: &positions[start..],
            kind,
        }
    }

    /// Iterate matching records, oldest first
    pub fn iter(&self) -> QueryIter<'a> {
        QueryIter {
            records: self.records,
            positions: self.positions.iter(),
            kind: self.kind,
        }
    }

    /// Number of matching records
    pub fn count(&self) -> usize {
        self.iter().count()
    }

    /// Whether nothing matches
    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }

    /// Clone matching records into an owned vector
    pub fn to_vec(&self) -> Vec<Transaction> {
        self.iter().cloned().collect()
    }
}

impl<'a> IntoIterator for QueryView<'a> {
    type Item = &'a Transaction;
    type IntoIter = QueryIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a> IntoIterator for &QueryView<'a> {
    type Item = &'a Transaction;
    type IntoIter = QueryIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator returned by [`QueryView::iter`]
#[derive(Debug, Clone)]
pub struct QueryIter<'a> {
    records: &'a [Transaction],
    positions: std::slice::Iter<'a, usize>,
    kind: Option<TransactionKind>,
}

impl<'a> Iterator for QueryIter<'a> {
    type Item = &'a Transaction;

    fn next(&mut self) -> Option<Self::Item> {
        let records = self.records;
        let kind = self.kind;
        self.positions
            .by_ref()
            .map(|&pos| &records[pos])
            .find(|record| kind.map_or(true, |k| record.kind == k))
    }
}

impl DoubleEndedIterator for QueryIter<'_> {
    fn next_back(&mut self) -> Option<Self::Item> {
        let records = self.records;
        let kind = self.kind;
        self.positions
            .by_ref()
            .rev()
            .map(|&pos| &records[pos])
            .find(|record| kind.map_or(true, |k| record.kind == k))
    }
}
