//! Prometheus metrics for the settlement engine
//!
//! - `settlement_stamps_earned_total` - Earn operations accepted
//! - `settlement_redemptions_total` - Redeem operations accepted
//! - `settlement_rejections_total{reason}` - Operations rejected, by error reason
//! - `settlement_funder_share_cents_total{merchant}` - Shares attributed to each merchant

use prometheus::{IntCounter, IntCounterVec, Opts, Registry};
use std::sync::Arc;

/// Metrics collector
#[derive(Clone)]
pub struct Metrics {
    /// Earns accepted
    pub stamps_earned: IntCounter,

    /// Redemptions accepted
    pub redemptions: IntCounter,

    /// Rejections, by reason
    pub rejections: IntCounterVec,

    /// Funder shares, by merchant
    pub funder_share_cents: IntCounterVec,

    /// Prometheus registry
    pub registry: Arc<Registry>,
}

impl Metrics {
    /// Create a collector with its own registry
    pub fn new() -> prometheus::Result<Self> {
        Self::with_registry(Arc::new(Registry::new()))
    }

    /// Create a collector registered into `registry`
    pub fn with_registry(registry: Arc<Registry>) -> prometheus::Result<Self> {
        let stamps_earned = IntCounter::new(
            "settlement_stamps_earned_total",
            "Total number of earn operations accepted",
        )?;
        registry.register(Box::new(stamps_earned.clone()))?;

        let redemptions = IntCounter::new(
            "settlement_redemptions_total",
            "Total number of redemptions accepted",
        )?;
        registry.register(Box::new(redemptions.clone()))?;

        let rejections = IntCounterVec::new(
            Opts::new(
                "settlement_rejections_total",
                "Total number of rejected operations",
            ),
            &["reason"],
        )?;
        registry.register(Box::new(rejections.clone()))?;

        let funder_share_cents = IntCounterVec::new(
            Opts::new(
                "settlement_funder_share_cents_total",
                "Redeemed item cost attributed to each merchant, in minor units",
            ),
            &["merchant"],
        )?;
        registry.register(Box::new(funder_share_cents.clone()))?;

        Ok(Self {
            stamps_earned,
            redemptions,
            rejections,
            funder_share_cents,
            registry,
        })
    }

    /// Record accepted earn
    pub fn record_earn(&self) {
        self.stamps_earned.inc();
    }

    /// Record accepted redemption and its shares
    pub fn record_redeem<'a>(&self, shares: impl IntoIterator<Item = (&'a str, i64)>) {
        self.redemptions.inc();
        for (merchant, cents) in shares {
            if cents > 0 {
                self.funder_share_cents
                    .with_label_values(&[merchant])
                    .inc_by(cents as u64);
            }
        }
    }

    /// Record rejected operation
    pub fn record_rejection(&self, reason: &str) {
        self.rejections.with_label_values(&[reason]).inc();
    }

    /// Prometheus registry
    pub fn registry(&self) -> &Registry {
        &self.registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_creation() {
        let metrics = Metrics::new().unwrap();
        metrics.record_earn();
        metrics.record_redeem([("c1", 600), ("c2", 200)]);
        metrics.record_rejection("insufficient_stamps");

        assert_eq!(metrics.stamps_earned.get(), 1);
        assert_eq!(metrics.redemptions.get(), 1);
        assert_eq!(
            metrics.funder_share_cents.with_label_values(&["c1"]).get(),
            600
        );
        assert_eq!(
            metrics
                .rejections
                .with_label_values(&["insufficient_stamps"])
                .get(),
            1
        );
    }

    #[test]
    fn test_shared_registry() {
        let registry = Arc::new(Registry::new());
        let metrics = Metrics::with_registry(registry.clone()).unwrap();
        metrics.record_earn();
        assert!(!registry.gather().is_empty());
        assert!(Metrics::with_registry(registry).is_err());
    }
}
