//! Core types for the settlement engine

use beanback_ledger::{Cents, MerchantId, Transaction, TransactionId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Stamps a redemption consumes, and the size of its funding window
pub const STAMPS_PER_REWARD: usize = 8;

/// Result of a successful earn
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EarnReceipt {
    /// The appended Earn record
    pub transaction_id: TransactionId,

    /// Balance including the new stamp
    pub balance_after: u64,
}

/// Portion of a redeemed item's cost attributed to one merchant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunderShare {
    /// Merchant that funded part of the item
    pub merchant_id: MerchantId,

    /// Funding transactions that happened at this merchant
    pub contributions: u32,

    /// round(item_cost * contributions / 8), half-to-even
    pub share: Cents,
}

/// Result of a successful redemption
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedeemReceipt {
    /// The appended Redeem record
    pub transaction_id: TransactionId,

    /// Balance after the card was consumed
    pub balance_after: u64,

    /// Cost that was split
    pub item_cost: Cents,

    /// Shares in order of each merchant's first funding transaction
    pub funders: Vec<FunderShare>,
}

impl RedeemReceipt {
    /// Sum of all shares
    pub fn total_share(&self) -> Cents {
        self.funders.iter().map(|f| f.share).sum()
    }

    /// `total_share - item_cost`; bounded by the number of funders
    pub fn rounding_drift(&self) -> i64 {
        self.total_share().get() - self.item_cost.get()
    }
}

/// Display projection of a user's card
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wallet {
    /// User
    pub user_id: UserId,

    /// Current balance
    pub stamps: u64,

    /// Most recent transactions, oldest first
    pub recent: Vec<Transaction>,

    /// When the projection was taken
    pub as_of: DateTime<Utc>,
}
