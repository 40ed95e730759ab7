//! Property-based tests for settlement invariants
//!
//! - Monotonicity: every earn raises the balance by exactly one
//! - Consumption: a successful redeem lowers the balance by exactly eight
//! - Non-negativity: no sequence of records drives a balance below zero
//! - Completeness: shares sum to the item cost within one unit per funder
//! - Fairness: a merchant's share depends only on its count in the window

use beanback_ledger::{Cents, LedgerStore, MerchantId, NewTransaction, UserId};
use beanback_settlement::{funding, STAMPS_PER_REWARD};
use proptest::prelude::*;

fn merchant_strategy() -> impl Strategy<Value = MerchantId> {
    prop_oneof![Just("c1"), Just("c2"), Just("c3"), Just("c4")].prop_map(MerchantId::new)
}

/// Earn (true) or redeem (false) events for a single user
fn events_strategy() -> impl Strategy<Value = Vec<(MerchantId, bool)>> {
    prop::collection::vec((merchant_strategy(), prop::bool::weighted(0.8)), 0..80)
}

fn full_window_strategy() -> impl Strategy<Value = Vec<MerchantId>> {
    prop::collection::vec(merchant_strategy(), STAMPS_PER_REWARD)
}

fn earn(store: &mut LedgerStore, user: &UserId, merchant: MerchantId) {
    store.append(NewTransaction::earn(user.clone(), merchant, Cents::new(350)));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Property: balance increases by exactly 1 per earn
    #[test]
    fn prop_balance_monotonic(events in events_strategy(), merchant in merchant_strategy()) {
        let user = UserId::new("u1");
        let mut store = LedgerStore::new();
        for (merchant, is_earn) in events {
            if is_earn {
                earn(&mut store, &user, merchant);
            } else if funding::compute_balance(&store, &user) >= STAMPS_PER_REWARD as u64 {
                store.append(NewTransaction::redeem(user.clone(), merchant));
            }
        }

        let before = funding::compute_balance(&store, &user);
        earn(&mut store, &user, merchant);
        prop_assert_eq!(funding::compute_balance(&store, &user), before + 1);
    }

    /// Property: gated redemptions consume exactly 8 stamps and never go negative
    #[test]
    fn prop_redeem_consumes_card(events in events_strategy()) {
        let user = UserId::new("u1");
        let mut store = LedgerStore::new();

        for (merchant, is_earn) in events {
            if is_earn {
                let before = funding::compute_balance(&store, &user);
                earn(&mut store, &user, merchant);
                prop_assert_eq!(funding::compute_balance(&store, &user), before + 1);
            } else {
                let before = funding::compute_balance(&store, &user);
                if before >= STAMPS_PER_REWARD as u64 {
                    store.append(NewTransaction::redeem(user.clone(), merchant));
                    prop_assert_eq!(
                        funding::compute_balance(&store, &user),
                        before - STAMPS_PER_REWARD as u64
                    );
                }
            }
        }
    }

    /// Property: ungated redeems floor the balance at zero
    #[test]
    fn prop_balance_never_negative(events in events_strategy()) {
        let user = UserId::new("u1");
        let mut store = LedgerStore::new();
        let mut earns = 0u64;
        let mut redeems = 0u64;

        for (merchant, is_earn) in events {
            if is_earn {
                earns += 1;
                earn(&mut store, &user, merchant);
            } else {
                redeems += 1;
                store.append(NewTransaction::redeem(user.clone(), merchant));
            }
        }

        let expected = earns.saturating_sub(8 * redeems);
        prop_assert_eq!(funding::compute_balance(&store, &user), expected);
    }

    /// Property: shares sum to item_cost within one unit per funder
    #[test]
    fn prop_split_complete(window in full_window_strategy(), cost in 0i64..100_000) {
        let user = UserId::new("u1");
        let mut store = LedgerStore::new();
        for merchant in window {
            earn(&mut store, &user, merchant);
        }

        let funders = funding::settle(&store, &user, Cents::new(cost)).unwrap();
        let contributions: u32 = funders.iter().map(|f| f.contributions).sum();
        let total: i64 = funders.iter().map(|f| f.share.get()).sum();

        prop_assert_eq!(contributions as usize, STAMPS_PER_REWARD);
        prop_assert!((total - cost).abs() <= funders.len() as i64);
        prop_assert!(funders.iter().all(|f| f.share.get() >= 0));
    }

    /// Property: each share equals the rounded proportion of its count
    #[test]
    fn prop_split_fair(window in full_window_strategy(), cost in 0i64..100_000) {
        let funders = {
            let user = UserId::new("u1");
            let mut store = LedgerStore::new();
            for merchant in &window {
                earn(&mut store, &user, merchant.clone());
            }
            funding::settle(&store, &user, Cents::new(cost)).unwrap()
        };

        for funder in &funders {
            let count = window.iter().filter(|m| **m == funder.merchant_id).count();
            prop_assert_eq!(funder.contributions as usize, count);

            // Shares are within half a unit of the exact proportion
            let exact = cost as f64 * count as f64 / STAMPS_PER_REWARD as f64;
            prop_assert!((funder.share.get() as f64 - exact).abs() <= 0.5);
        }

        // Equal counts get equal shares
        for a in &funders {
            for b in &funders {
                if a.contributions == b.contributions {
                    prop_assert_eq!(a.share, b.share);
                }
            }
        }
    }

    /// Property: other users' records never change a user's balance or window
    #[test]
    fn prop_users_isolated(
        window in full_window_strategy(),
        noise in prop::collection::vec(merchant_strategy(), 0..20),
    ) {
        let user = UserId::new("u1");
        let other = UserId::new("u2");
        let mut store = LedgerStore::new();
        for (i, merchant) in window.iter().enumerate() {
            earn(&mut store, &user, merchant.clone());
            if let Some(extra) = noise.get(i) {
                earn(&mut store, &other, extra.clone());
            }
        }
        for extra in noise.iter().skip(window.len()) {
            earn(&mut store, &other, extra.clone());
        }

        prop_assert_eq!(funding::compute_balance(&store, &user), STAMPS_PER_REWARD as u64);
        let foreign = funding::funding_window(&store, &user)
            .iter()
            .filter(|t| t.user_id != user)
            .count();
        prop_assert_eq!(foreign, 0);
    }
}
