//! Metrics collection for observability
//!
//! This module provides Prometheus metrics for monitoring the ledger.
//!
//! # Metrics
//!
//! - `ledger_transactions_total{kind}` - Total number of records appended
//! - `ledger_journal_batch_size` - Histogram of journal batch sizes
//! - `ledger_job_duration_seconds{op}` - Histogram of actor job latencies, by message kind
//! - `ledger_records` - Current number of records in the log

use prometheus::{Histogram, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts, Registry};
use std::sync::Arc;

/// Metrics collector
#[derive(Clone)]
pub struct Metrics {
    /// Records appended, by kind
    pub transactions_total: IntCounterVec,

    /// Journal batch size histogram
    pub batch_size: Histogram,

    /// Job duration histogram, by op
    pub job_duration: HistogramVec,

    /// Records currently in the log
    pub records: IntGauge,

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
        let transactions_total = IntCounterVec::new(
            Opts::new("ledger_transactions_total", "Total number of records appended"),
            &["kind"],
        )?;
        registry.register(Box::new(transactions_total.clone()))?;

        let batch_size = Histogram::with_opts(
            HistogramOpts::new("ledger_journal_batch_size", "Histogram of journal batch sizes")
                .buckets(vec![1.0, 5.0, 10.0, 25.0, 50.0, 100.0, 250.0, 500.0]),
        )?;
        registry.register(Box::new(batch_size.clone()))?;

        let job_duration = HistogramVec::new(
            HistogramOpts::new(
                "ledger_job_duration_seconds",
                "Histogram of ledger actor job latencies",
            )
            .buckets(vec![0.0001, 0.0005, 0.001, 0.005, 0.010, 0.050, 0.100]),
            &["op"],
        )?;
        registry.register(Box::new(job_duration.clone()))?;

        let records = IntGauge::new("ledger_records", "Current number of records in the log")?;
        registry.register(Box::new(records.clone()))?;

        Ok(Self {
            transactions_total,
            batch_size,
            job_duration,
            records,
            registry,
        })
    }

    /// Record one append
    pub fn record_append(&self, kind: &str) {
        self.transactions_total.with_label_values(&[kind]).inc();
    }

    /// Record journal flush
    pub fn record_batch_flush(&self, batch_size: usize) {
        self.batch_size.observe(batch_size as f64);
    }

    /// Record job duration (`append`, `query`, `transact_read`, `transact_write`, `flush`)
    pub fn record_job_duration(&self, op: &str, duration_seconds: f64) {
        self.job_duration
            .with_label_values(&[op])
            .observe(duration_seconds);
    }

    /// Update record count
    pub fn set_records(&self, count: usize) {
        self.records.set(count as i64);
    }

    /// Get metrics registry
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
        assert_eq!(metrics.transactions_total.with_label_values(&["earn"]).get(), 0);
        assert_eq!(metrics.records.get(), 0);
    }

    #[test]
    fn test_record_append() {
        let metrics = Metrics::new().unwrap();
        metrics.record_append("earn");
        metrics.record_append("earn");
        metrics.record_append("redeem");

        assert_eq!(metrics.transactions_total.with_label_values(&["earn"]).get(), 2);
        assert_eq!(metrics.transactions_total.with_label_values(&["redeem"]).get(), 1);
    }

    #[test]
    fn test_shared_registry_rejects_duplicates() {
        let registry = Arc::new(Registry::new());
        Metrics::with_registry(registry.clone()).unwrap();
        assert!(Metrics::with_registry(registry).is_err());
    }

    #[test]
    fn test_set_records() {
        let metrics = Metrics::new().unwrap();
        metrics.set_records(42);
        assert_eq!(metrics.records.get(), 42);
        metrics.record_batch_flush(10);
    }

    #[test]
    fn test_job_duration_by_op() {
        let metrics = Metrics::new().unwrap();
        metrics.record_job_duration("transact_read", 0.0002);
        metrics.record_job_duration("transact_read", 0.0003);
        metrics.record_job_duration("append", 0.0001);

        let reads = metrics.job_duration.with_label_values(&["transact_read"]);
        assert_eq!(reads.get_sample_count(), 2);
        let writes = metrics.job_duration.with_label_values(&["transact_write"]);
        assert_eq!(writes.get_sample_count(), 0);
    }
}
