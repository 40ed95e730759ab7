//! Merchant registry
//!
//! Key-value lookup of participating merchants. Earns are only accepted at
//! merchants present here.

use beanback_ledger::MerchantId;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Participating merchant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Merchant {
    /// Merchant ID
    pub id: MerchantId,

    /// Display name
    pub name: String,
}

impl Merchant {
    /// Create new merchant
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: MerchantId::new(id),
            name: name.into(),
        }
    }
}

/// Registry of participating merchants
#[derive(Debug, Default)]
pub struct MerchantRegistry {
    merchants: RwLock<HashMap<MerchantId, Merchant>>,
}

impl MerchantRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding `merchants`
    pub fn with_merchants(merchants: impl IntoIterator<Item = Merchant>) -> Self {
        let registry = Self::new();
        for merchant in merchants {
            registry.register(merchant);
        }
        registry
    }

    /// Add or replace a merchant; returns the previous entry
    pub fn register(&self, merchant: Merchant) -> Option<Merchant> {
        tracing::debug!(merchant_id = %merchant.id, name = %merchant.name, "Merchant registered");
        self.merchants.write().insert(merchant.id.clone(), merchant)
    }

    /// Look up a merchant
    pub fn get(&self, id: &MerchantId) -> Option<Merchant> {
        self.merchants.read().get(id).cloned()
    }

    /// Whether `id` is registered
    pub fn contains(&self, id: &MerchantId) -> bool {
        self.merchants.read().contains_key(id)
    }

    /// Number of registered merchants
    pub fn len(&self) -> usize {
        self.merchants.read().len()
    }

    /// Whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.merchants.read().is_empty()
    }
}
