//! Main settlement engine
//!
//! Exposes earn, redeem, balance and history over the ledger. Every operation
//! runs as one ledger transaction, so a balance check and the append that
//! depends on it cannot interleave with another writer.

use crate::{
    config::Config,
    funding,
    merchants::MerchantRegistry,
    metrics::Metrics,
    types::*,
    Error, Result,
};
use beanback_ledger::{Cents, Ledger, MerchantId, NewTransaction, Query, Transaction, UserId};
use chrono::Utc;
use std::sync::Arc;

/// Settlement engine
///
/// The ledger is private to the engine, so no caller can append a record
/// that skipped the merchant or balance checks:
///
/// ```compile_fail
/// # async fn bypass(engine: beanback_settlement::SettlementEngine) {
/// use beanback_ledger::{MerchantId, NewTransaction, UserId};
/// engine
///     .ledger()
///     .append(NewTransaction::redeem(UserId::new("u1"), MerchantId::new("zzz")))
///     .await;
/// # }
/// ```
pub struct SettlementEngine {
    /// Ledger core
    ledger: Ledger,

    /// Merchant registry
    merchants: Arc<MerchantRegistry>,

    /// Metrics collector
    metrics: Metrics,

    /// Configuration
    config: Config,
}

impl std::fmt::Debug for SettlementEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SettlementEngine")
            .field("ledger", &self.ledger)
            .field("merchants", &self.merchants.len())
            .field("config", &self.config)
            .finish()
    }
}

impl SettlementEngine {
    /// Create new settlement engine
    pub async fn new(config: Config) -> Result<Self> {
        let merchants = Arc::new(MerchantRegistry::with_merchants(config.merchants.clone()));
        Self::with_registry(config, merchants).await
    }

    /// Create engine sharing an existing merchant registry
    ///
    /// The engine opens and owns its ledger; appends only happen through
    /// [`earn`](Self::earn) and [`redeem`](Self::redeem).
    pub async fn with_registry(config: Config, merchants: Arc<MerchantRegistry>) -> Result<Self> {
        config.validate()?;

        // Open ledger
        let ledger = Ledger::open(config.ledger.clone()).await?;
        let metrics = Metrics::new()?;

        tracing::info!(
            service = %config.service_name,
            version = %config.service_version,
            merchants = merchants.len(),
            "Settlement engine started"
        );

        Ok(Self {
            ledger,
            merchants,
            metrics,
            config,
        })
    }

    /// Current unredeemed stamps for `user_id`
    pub async fn compute_balance(&self, user_id: &UserId) -> Result<u64> {
        let user_id = user_id.clone();
        let balance = self
            .ledger
            .transact(move |store| funding::compute_balance(store, &user_id))
            .await?;
        Ok(balance)
    }

    /// Record a paid purchase at `merchant_id`
    pub async fn earn(
        &self,
        user_id: UserId,
        merchant_id: MerchantId,
        amount: Cents,
    ) -> Result<EarnReceipt> {
        let result = self.try_earn(user_id.clone(), merchant_id.clone(), amount).await;

        match &result {
            Ok(receipt) => {
                self.metrics.record_earn();
                tracing::info!(
                    user_id = %user_id,
                    merchant_id = %merchant_id,
                    transaction_id = %receipt.transaction_id,
                    balance_after = receipt.balance_after,
                    "Stamp earned"
                );
            }
            Err(e) => self.reject("earn", &user_id, &merchant_id, e),
        }

        result
    }

    async fn try_earn(
        &self,
        user_id: UserId,
        merchant_id: MerchantId,
        amount: Cents,
    ) -> Result<EarnReceipt> {
        if amount.is_negative() {
            return Err(Error::InvalidAmount(format!("Negative amount: {}", amount)));
        }
        if !self.merchants.contains(&merchant_id) {
            return Err(Error::UnknownMerchant(merchant_id));
        }

        let receipt = self
            .ledger
            .transact(move |store| {
                let transaction_id = store
                    .append(NewTransaction::earn(user_id.clone(), merchant_id, amount))
                    .id;
                EarnReceipt {
                    transaction_id,
                    balance_after: funding::compute_balance(store, &user_id),
                }
            })
            .await?;

        Ok(receipt)
    }

    /// Redeem a full card for a free item
    ///
    /// `item_cost` falls back to the configured default when `None`.
    pub async fn redeem(
        &self,
        user_id: UserId,
        merchant_id: MerchantId,
        item_cost: Option<Cents>,
    ) -> Result<RedeemReceipt> {
        let item_cost = item_cost.unwrap_or(self.config.default_item_cost);
        let result = self
            .try_redeem(user_id.clone(), merchant_id.clone(), item_cost)
            .await;

        match &result {
            Ok(receipt) => {
                self.metrics.record_redeem(
                    receipt
                        .funders
                        .iter()
                        .map(|f| (f.merchant_id.as_str(), f.share.get())),
                );
                tracing::info!(
                    user_id = %user_id,
                    merchant_id = %merchant_id,
                    transaction_id = %receipt.transaction_id,
                    balance_after = receipt.balance_after,
                    item_cost = %receipt.item_cost,
                    funders = receipt.funders.len(),
                    drift = receipt.rounding_drift(),
                    "Reward redeemed"
                );
            }
            Err(e) => self.reject("redeem", &user_id, &merchant_id, e),
        }

        result
    }

    async fn try_redeem(
        &self,
        user_id: UserId,
        merchant_id: MerchantId,
        item_cost: Cents,
    ) -> Result<RedeemReceipt> {
        if item_cost.is_negative() {
            return Err(Error::InvalidAmount(format!("Negative item cost: {}", item_cost)));
        }

        self.ledger
            .transact(move |store| {
                let required = STAMPS_PER_REWARD as u64;
                let balance = funding::compute_balance(store, &user_id);
                if balance < required {
                    return Err(Error::InsufficientStamps {
                        user_id,
                        balance,
                        required,
                    });
                }

                // Checked before the append so a failure leaves the log untouched
                let found = funding::funding_window(store, &user_id).count();
                if found < STAMPS_PER_REWARD {
                    return Err(Error::InsufficientHistory {
                        user_id,
                        found,
                        required: STAMPS_PER_REWARD,
                    });
                }

                let transaction_id = store
                    .append(NewTransaction::redeem(user_id.clone(), merchant_id))
                    .id;
                let funders = funding::settle(store, &user_id, item_cost)?;

                Ok(RedeemReceipt {
                    transaction_id,
                    balance_after: funding::compute_balance(store, &user_id),
                    item_cost,
                    funders,
                })
            })
            .await?
    }

    /// Most recent `limit` transactions of `user_id`, oldest first
    pub async fn history(&self, user_id: &UserId, limit: usize) -> Result<Vec<Transaction>> {
        let records = self
            .ledger
            .query(Query::user(user_id.clone()).limit(limit))
            .await?;
        Ok(records)
    }

    /// Balance and recent transactions of `user_id` in one consistent read
    pub async fn wallet(&self, user_id: &UserId) -> Result<Wallet> {
        let limit = self.config.history_limit;
        let user_id = user_id.clone();

        let wallet = self
            .ledger
            .transact(move |store| {
                let recent = store.query(&Query::user(user_id.clone()).limit(limit)).to_vec();
                Wallet {
                    stamps: funding::compute_balance(store, &user_id),
                    user_id,
                    recent,
                    as_of: Utc::now(),
                }
            })
            .await?;

        Ok(wallet)
    }

    /// Merchant registry
    pub fn merchants(&self) -> &Arc<MerchantRegistry> {
        &self.merchants
    }

    /// Metrics collector
    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// Ledger metrics collector
    pub fn ledger_metrics(&self) -> &beanback_ledger::Metrics {
        self.ledger.metrics()
    }

    /// Configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Shutdown engine, flushing the ledger journal
    pub async fn shutdown(self) -> Result<()> {
        tracing::info!(service = %self.config.service_name, "Settlement engine stopping");
        self.ledger.shutdown().await?;
        Ok(())
    }

    fn reject(&self, operation: &str, user_id: &UserId, merchant_id: &MerchantId, error: &Error) {
        self.metrics.record_rejection(error.reason());

        match error {
            Error::InsufficientHistory { .. } | Error::Ledger(_) => tracing::error!(
                operation,
                user_id = %user_id,
                merchant_id = %merchant_id,
                reason = error.reason(),
                error = %error,
                "Ledger integrity fault"
            ),
            _ => tracing::warn!(
                operation,
                user_id = %user_id,
                merchant_id = %merchant_id,
                reason = error.reason(),
                error = %error,
                "Operation rejected"
            ),
        }
    }
}
