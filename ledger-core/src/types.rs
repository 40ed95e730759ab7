//! Core types for the stamp ledger
//!
//! All types are designed for:
//! - Deterministic serialization (serde, any format the caller picks)
//! - Fixed record shape (no loosely keyed maps)
//! - Exact arithmetic (integer minor units for money)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Sequence number assigned by the store at append time
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionId(u64);

impl TransactionId {
    /// Create from a raw sequence number
    pub fn new(seq: u64) -> Self {
        Self(seq)
    }

    /// Raw sequence number
    pub fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a stamp-collecting user
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Create new user ID
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get as string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a participating merchant
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MerchantId(String);

impl MerchantId {
    /// Create new merchant ID
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get as string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MerchantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Money in the smallest currency unit
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cents(i64);

impl Cents {
    /// Zero amount
    pub const ZERO: Cents = Cents(0);

    /// Create from minor units
    pub fn new(minor_units: i64) -> Self {
        Self(minor_units)
    }

    /// Minor units
    pub fn get(&self) -> i64 {
        self.0
    }

    /// True when the amount is below zero
    pub fn is_negative(&self) -> bool {
        self.0 < 0
    }
}

impl fmt::Display for Cents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::iter::Sum for Cents {
    fn sum<I: Iterator<Item = Cents>>(iter: I) -> Self {
        Cents(iter.map(|c| c.0).sum())
    }
}

/// Kind of ledger record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum TransactionKind {
    /// Paid purchase, earns one stamp
    Earn = 1,
    /// Free item, consumes a full card of stamps
    Redeem = 2,
}

impl TransactionKind {
    /// Lowercase label, used for metrics and logs
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Earn => "earn",
            TransactionKind::Redeem => "redeem",
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable ledger record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Sequence number, unique and increasing
    pub id: TransactionId,

    /// User who earned or redeemed
    pub user_id: UserId,

    /// Merchant where the event happened
    pub merchant_id: MerchantId,

    /// Append time
    pub timestamp: DateTime<Utc>,

    /// Earn or Redeem
    pub kind: TransactionKind,

    /// Paid amount (always zero for Redeem)
    pub amount: Cents,
}

/// Record contents before the store assigns `id` and `timestamp`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTransaction {
    /// User
    pub user_id: UserId,
    /// Merchant
    pub merchant_id: MerchantId,
    /// Earn or Redeem
    pub kind: TransactionKind,
    /// Paid amount
    pub amount: Cents,
}

impl NewTransaction {
    /// Paid purchase
    pub fn earn(user_id: UserId, merchant_id: MerchantId, amount: Cents) -> Self {
        Self {
            user_id,
            merchant_id,
            kind: TransactionKind::Earn,
            amount,
        }
    }

    /// Redemption; the amount is always zero
    pub fn redeem(user_id: UserId, merchant_id: MerchantId) -> Self {
        Self {
            user_id,
            merchant_id,
            kind: TransactionKind::Redeem,
            amount: Cents::ZERO,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redeem_has_zero_amount() {
        let tx = NewTransaction::redeem(UserId::new("u1"), MerchantId::new("c1"));
        assert_eq!(tx.kind, TransactionKind::Redeem);
        assert_eq!(tx.amount, Cents::ZERO);
    }

    #[test]
    fn test_cents_sum() {
        let total: Cents = [Cents::new(600), Cents::new(200)].into_iter().sum();
        assert_eq!(total, Cents::new(800));
        assert!(Cents::new(-1).is_negative());
    }

    #[test]
    fn test_transaction_json_shape() {
        let tx = Transaction {
            id: TransactionId::new(7),
            user_id: UserId::new("u1"),
            merchant_id: MerchantId::new("c2"),
            timestamp: Utc::now(),
            kind: TransactionKind::Earn,
            amount: Cents::new(350),
        };

        let json = serde_json::to_value(&tx).unwrap();
        assert_eq!(json["id"], 7);
        assert_eq!(json["user_id"], "u1");
        assert_eq!(json["merchant_id"], "c2");
        assert_eq!(json["kind"], "earn");
        assert_eq!(json["amount"], 350);
    }
}
