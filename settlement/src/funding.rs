//! Stamp balance and redemption funding
//!
//! Pure functions over the ledger store. They never append; the engine runs
//! them inside a ledger transaction so that the read and the following append
//! are atomic.
//!
//! # Algorithm
//!
//! 1. Balance = max(0, earns - 8 * redeems) for the user
//! 2. Funding window = the 8 most recent Earn records of the user, oldest first
//! 3. Count window records per merchant
//! 4. Each merchant's share = round(item_cost * count / 8), half-to-even
//!
//! # Example
//!
//! ```text
//! Window (ids ascending):
//!   c1 c1 c2 c1 c1 c2 c1 c1
//!
//! Counts:
//!   c1: 6
//!   c2: 2
//!
//! Shares for item_cost = 800:
//!   c1: round(800 * 6 / 8) = 600
//!   c2: round(800 * 2 / 8) = 200
//! ```
//!
//! Rounding drift is not reconciled: shares may sum to `item_cost` plus or
//! minus at most one unit per funding merchant.

use crate::{
    types::{FunderShare, STAMPS_PER_REWARD},
    Error, Result,
};
use beanback_ledger::{
    Cents, LedgerStore, MerchantId, Query, QueryView, Transaction, TransactionKind, UserId,
};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

/// Current unredeemed stamps; zero for unknown users
pub fn compute_balance(store: &LedgerStore, user_id: &UserId) -> u64 {
    let (paid, redeemed) = store
        .query(&Query::user(user_id.clone()))
        .iter()
        .fold((0u64, 0u64), |(paid, redeemed), record| match record.kind {
            TransactionKind::Earn => (paid + 1, redeemed),
            TransactionKind::Redeem => (paid, redeemed + 1),
        });

    paid.saturating_sub(STAMPS_PER_REWARD as u64 * redeemed)
}

/// The user's most recent paid transactions, oldest first
///
/// Redeem records are never part of a window, so a Redeem appended before
/// the window is read cannot fund itself.
pub fn funding_window<'a>(store: &'a LedgerStore, user_id: &UserId) -> QueryView<'a> {
    store.query(
        &Query::user(user_id.clone())
            .kind(TransactionKind::Earn)
            .limit(STAMPS_PER_REWARD),
    )
}

/// Funder shares for a redemption by `user_id`
///
/// Fails with `InsufficientHistory` when fewer than a full card of Earn
/// records exist.
pub fn settle(store: &LedgerStore, user_id: &UserId, item_cost: Cents) -> Result<Vec<FunderShare>> {
    let window = funding_window(store, user_id);
    let found = window.count();
    if found < STAMPS_PER_REWARD {
        return Err(Error::InsufficientHistory {
            user_id: user_id.clone(),
            found,
            required: STAMPS_PER_REWARD,
        });
    }

    funder_split(window, item_cost)
}

/// Split `item_cost` across the merchants of a full funding window
///
/// Shares are listed in order of each merchant's first appearance.
pub fn funder_split<'a, I>(window: I, item_cost: Cents) -> Result<Vec<FunderShare>>
where
    I: IntoIterator<Item = &'a Transaction>,
{
    let mut counts: Vec<(MerchantId, u32)> = Vec::new();
    for record in window {
        match counts.iter_mut().find(|(id, _)| *id == record.merchant_id) {
            Some((_, count)) => *count += 1,
            None => counts.push((record.merchant_id.clone(), 1)),
        }
    }

    counts
        .into_iter()
        .map(|(merchant_id, contributions)| {
            let share = proportional_share(item_cost, contributions)?;
            Ok(FunderShare {
                merchant_id,
                contributions,
                share,
            })
        })
        .collect()
}

/// round(item_cost * contributions / 8), ties to even
pub fn proportional_share(item_cost: Cents, contributions: u32) -> Result<Cents> {
    let exact = Decimal::from(item_cost.get()) * Decimal::from(contributions)
        / Decimal::from(STAMPS_PER_REWARD as u64);

    exact
        .round_dp_with_strategy(0, RoundingStrategy::MidpointNearestEven)
        .to_i64()
        .map(Cents::new)
        .ok_or_else(|| Error::InvalidAmount(format!("Share of {} out of range", item_cost)))
}
