//! Property-Based Tests for Cache Module
//!
//! Uses proptest to check key determinism, budget enforcement, eviction order and hit accounting.

use proptest::prelude::*;
use std::collections::HashSet;
use std::mem::size_of;
use std::time::Duration;

use crate::cache::{build_key, Admission, CacheStore, KeyArg, KeyAtom};

// == Test Configuration ==
const TEST_TTL: Duration = Duration::from_secs(300);
const TEST_CAPACITY: usize = 2000;

fn atoms(values: &[i64]) -> Vec<KeyAtom> {
    values.iter().copied().map(KeyAtom::from).collect()
}

/// A byte vector whose estimated size is exactly `total_bytes`
fn blob(total_bytes: usize) -> Vec<u8> {
    vec![0u8; total_bytes - size_of::<Vec<u8>>()]
}

// == Strategies ==
/// A list of integers together with a shuffled copy of it
fn shuffled_pair_strategy() -> impl Strategy<Value = (Vec<i64>, Vec<i64>)> {
    prop::collection::vec(any::<i64>(), 0..30)
        .prop_flat_map(|values| (Just(values.clone()), Just(values).prop_shuffle()))
}

/// Item sizes that always fit the test budget on their own
fn item_size_strategy() -> impl Strategy<Value = usize> {
    size_of::<Vec<u8>>()..600
}

#[derive(Debug, Clone)]
enum CacheOp {
    Set { key: String, size: usize },
    Get { key: String },
}

fn cache_op_strategy() -> impl Strategy<Value = CacheOp> {
    prop_oneof![
        ("[a-j]", item_size_strategy()).prop_map(|(key, size)| CacheOp::Set { key, size }),
        "[a-j]".prop_map(|key| CacheOp::Get { key }),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // Set member order never changes the key
    #[test]
    fn prop_set_key_ignores_member_order((values, shuffled) in shuffled_pair_strategy()) {
        let a = build_key("op", &[KeyArg::Set(atoms(&values))]).unwrap();
        let b = build_key("op", &[KeyArg::Set(atoms(&shuffled))]).unwrap();
        prop_assert_eq!(a, b);

        let a = build_key("op", &[KeyArg::MappingKeys(atoms(&values))]).unwrap();
        let b = build_key("op", &[KeyArg::MappingKeys(atoms(&shuffled))]).unwrap();
        prop_assert_eq!(a, b);
    }

    // Sequence order always changes the key
    #[test]
    fn prop_sequence_key_keeps_order(distinct in prop::collection::hash_set(any::<i64>(), 2..20)) {
        let values: Vec<i64> = distinct.into_iter().collect();
        let reversed: Vec<i64> = values.iter().rev().copied().collect();

        let a = build_key("op", &[KeyArg::Sequence(atoms(&values))]).unwrap();
        let b = build_key("op", &[KeyArg::Sequence(atoms(&reversed))]).unwrap();
        prop_assert_ne!(a, b);
    }

    // Occupancy stays strictly below the budget after every operation
    #[test]
    fn prop_budget_enforced(ops in prop::collection::vec(cache_op_strategy(), 1..100)) {
        let mut store = CacheStore::new(TEST_TTL, TEST_CAPACITY);

        for op in ops {
            match op {
                CacheOp::Set { key, size } => {
                    store.set_item(key, blob(size)).unwrap();
                }
                CacheOp::Get { key } => {
                    store.get_item(&key);
                }
            }
            prop_assert!(
                store.occupancy_bytes() < TEST_CAPACITY,
                "Occupancy {} reached capacity {}",
                store.occupancy_bytes(),
                TEST_CAPACITY
            );
        }
    }

    // Hits and misses match the observed outcome of every read
    #[test]
    fn prop_statistics_accuracy(ops in prop::collection::vec(cache_op_strategy(), 1..50)) {
        let mut store = CacheStore::new(TEST_TTL, TEST_CAPACITY);
        let mut expected_hits: u64 = 0;
        let mut expected_misses: u64 = 0;

        for op in ops {
            match op {
                CacheOp::Set { key, size } => {
                    store.set_item(key, blob(size)).unwrap();
                }
                CacheOp::Get { key } => match store.get_item(&key) {
                    Some(_) => expected_hits += 1,
                    None => expected_misses += 1,
                },
            }
        }

        let stats = store.stats();
        prop_assert_eq!(stats.hits, expected_hits, "Hits mismatch");
        prop_assert_eq!(stats.misses, expected_misses, "Misses mismatch");
        prop_assert_eq!(stats.total_entries, store.len(), "Total entries mismatch");
    }

    // Items at or above the budget are never stored
    #[test]
    fn prop_oversized_items_rejected(extra in 0usize..10_000) {
        let mut store = CacheStore::new(TEST_TTL, TEST_CAPACITY);

        let admission = store.set_item("big".to_string(), blob(TEST_CAPACITY + extra)).unwrap();

        prop_assert!(!admission.is_stored());
        let rejected = matches!(admission, Admission::TooLarge { .. });
        prop_assert!(rejected);
        prop_assert!(store.get_item("big").is_none());
    }

    // Each live read adds exactly one hit
    #[test]
    fn prop_hit_count_increments_by_one(reads in 1u64..50) {
        let mut store = CacheStore::new(TEST_TTL, TEST_CAPACITY);
        store.set_item("key".to_string(), blob(100)).unwrap();

        let mut previous = store.hit_count("key").unwrap();
        prop_assert_eq!(previous, 0);
        for _ in 0..reads {
            prop_assert!(store.get_item("key").is_some());
            let current = store.hit_count("key").unwrap();
            prop_assert_eq!(current, previous + 1);
            previous = current;
        }
    }

    // With distinct hit counts, eviction removes exactly the least-hit entries
    #[test]
    fn prop_eviction_in_ascending_hit_order(
        hits in Just((0u64..8).collect::<Vec<_>>()).prop_shuffle(),
        to_free in 1usize..8
    ) {
        let mut store = CacheStore::new(TEST_TTL, 10_000);
        for (index, count) in hits.iter().enumerate() {
            let key = format!("k{}", index);
            store.set_item(key.clone(), blob(100)).unwrap();
            for _ in 0..*count {
                store.get_item(&key);
            }
        }

        let evicted = store.evict(to_free * 100).unwrap();
        prop_assert_eq!(evicted, to_free);

        let survivors: HashSet<u64> = hits
            .iter()
            .enumerate()
            .filter(|(index, _)| store.contains_key(&format!("k{}", index)))
            .map(|(_, count)| *count)
            .collect();
        let expected: HashSet<u64> = (to_free as u64..8).collect();
        prop_assert_eq!(survivors, expected);
    }
}
