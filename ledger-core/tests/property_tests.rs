//! Property-based tests for ledger invariants
//!
//! These tests use proptest to verify critical invariants:
//! - Total order: ids are contiguous and increasing in append order
//! - Partitioning: every record belongs to exactly one user's history
//! - Limits: a limited query is the newest suffix of the unlimited one
//! - Linearizability: concurrent appends through the actor never collide

use beanback_ledger::{
    Cents, Config, Ledger, LedgerStore, MerchantId, NewTransaction, Query, TransactionId,
    TransactionKind, UserId,
};
use proptest::prelude::*;
use std::collections::HashSet;

/// Strategy for generating user IDs from a small pool (forces sharing)
fn user_strategy() -> impl Strategy<Value = UserId> {
    prop_oneof![Just("u1"), Just("u2"), Just("u3")].prop_map(UserId::new)
}

/// Strategy for generating merchant IDs
fn merchant_strategy() -> impl Strategy<Value = MerchantId> {
    prop_oneof![Just("c1"), Just("c2"), Just("c3")].prop_map(MerchantId::new)
}

/// Strategy for generating records of either kind
fn record_strategy() -> impl Strategy<Value = NewTransaction> {
    (
        user_strategy(),
        merchant_strategy(),
        0i64..10_000,
        prop::bool::weighted(0.85),
    )
        .prop_map(|(user, merchant, amount, is_earn)| {
            if is_earn {
                NewTransaction::earn(user, merchant, Cents::new(amount))
            } else {
                NewTransaction::redeem(user, merchant)
            }
        })
}

/// Default config with a private data directory
fn scratch_config() -> Config {
    let mut config = Config::default();
    config.data_dir = tempfile::tempdir().unwrap().into_path();
    config
}

fn build_store(records: &[NewTransaction]) -> LedgerStore {
    let mut store = LedgerStore::new();
    for record in records {
        store.append(record.clone());
    }
    store
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Property: ids are 1..=n in append order
    #[test]
    fn prop_ids_contiguous(records in prop::collection::vec(record_strategy(), 0..60)) {
        let mut store = LedgerStore::new();
        for (i, record) in records.iter().enumerate() {
            let id = store.append(record.clone()).id;
            prop_assert_eq!(id, TransactionId::new(i as u64 + 1));
        }
        prop_assert_eq!(store.len(), records.len());
    }

    /// Property: user histories partition the log
    #[test]
    fn prop_users_partition_log(records in prop::collection::vec(record_strategy(), 0..60)) {
        let store = build_store(&records);

        let mut seen = HashSet::new();
        for user in ["u1", "u2", "u3"] {
            let view = store.query(&Query::user(UserId::new(user)));
            let mut last = None;
            for record in view.iter() {
                prop_assert_eq!(record.user_id.as_str(), user);
                prop_assert!(last < Some(record.id));
                last = Some(record.id);
                prop_assert!(seen.insert(record.id));
            }
        }
        prop_assert_eq!(seen.len(), store.len());
    }

    /// Property: a limited query is the newest suffix of the full query
    #[test]
    fn prop_limit_is_suffix(
        records in prop::collection::vec(record_strategy(), 0..60),
        limit in 0usize..20,
        earn_only in any::<bool>(),
    ) {
        let store = build_store(&records);

        let mut query = Query::user(UserId::new("u1"));
        if earn_only {
            query = query.kind(TransactionKind::Earn);
        }

        let full: Vec<TransactionId> = store.query(&query).iter().map(|t| t.id).collect();
        let limited: Vec<TransactionId> = store
            .query(&query.clone().limit(limit))
            .iter()
            .map(|t| t.id)
            .collect();

        let expected_len = full.len().min(limit);
        prop_assert_eq!(limited.len(), expected_len);
        prop_assert_eq!(&limited[..], &full[full.len() - expected_len..]);
    }

    /// Property: counting by kind agrees with the unfiltered history
    #[test]
    fn prop_counts_agree(records in prop::collection::vec(record_strategy(), 0..60)) {
        let store = build_store(&records);
        let user = UserId::new("u2");

        let history = store.query(&Query::user(user.clone())).to_vec();
        let earns = history.iter().filter(|t| t.kind == TransactionKind::Earn).count();
        let redeems = history.len() - earns;

        prop_assert_eq!(store.count(&user, TransactionKind::Earn), earns);
        prop_assert_eq!(store.count(&user, TransactionKind::Redeem), redeems);
    }
}

#[cfg(test)]
mod integration_tests {
    use super::*;

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_appends_are_linearized() {
        let ledger = Ledger::open(scratch_config()).await.unwrap();

        let mut tasks = Vec::new();
        for worker in 0..8 {
            let ledger = ledger.clone();
            tasks.push(tokio::spawn(async move {
                let mut ids = Vec::new();
                for _ in 0..25 {
                    let record = NewTransaction::earn(
                        UserId::new(format!("user-{}", worker)),
                        MerchantId::new("c1"),
                        Cents::new(100),
                    );
                    ids.push(ledger.append(record).await.unwrap().id);
                }
                ids
            }));
        }

        let mut all = HashSet::new();
        for task in tasks {
            let ids = task.await.unwrap();
            // Each worker observes its own appends in increasing order
            assert!(ids.windows(2).all(|w| w[0] < w[1]));
            all.extend(ids);
        }

        assert_eq!(all.len(), 200);
        assert!(all.contains(&TransactionId::new(1)));
        assert!(all.contains(&TransactionId::new(200)));

        ledger.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_transact_sees_its_own_append() {
        let ledger = Ledger::open(scratch_config()).await.unwrap();

        let (before, after) = ledger
            .transact(|store| {
                let user = UserId::new("u1");
                let before = store.count(&user, TransactionKind::Earn);
                store.append(NewTransaction::earn(
                    user.clone(),
                    MerchantId::new("c2"),
                    Cents::new(250),
                ));
                (before, store.count(&user, TransactionKind::Earn))
            })
            .await
            .unwrap();

        assert_eq!((before, after), (0, 1));
        ledger.shutdown().await.unwrap();
    }
}
