//! Property-Based Tests for Cache Module
//!
//! Uses proptest to check the cache against a plain map model.

use proptest::prelude::*;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::cache::{ExpiringCache, Timed};

// == Strategies ==
/// Generates keys from a small alphabet so operations collide often
fn key_strategy() -> impl Strategy<Value = String> {
    "[a-e]{1,2}".prop_map(|s| s)
}

fn value_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 ]{1,32}".prop_map(|s| s)
}

/// Generates a sequence of cache operations for testing
#[derive(Debug, Clone)]
enum CacheOp {
    GetWith { key: String, value: String },
    Get { key: String },
    Evict { key: String },
    Invalidate,
}

fn cache_op_strategy() -> impl Strategy<Value = CacheOp> {
    prop_oneof![
        4 => (key_strategy(), value_strategy())
            .prop_map(|(key, value)| CacheOp::GetWith { key, value }),
        4 => key_strategy().prop_map(|key| CacheOp::Get { key }),
        2 => key_strategy().prop_map(|key| CacheOp::Evict { key }),
        1 => Just(CacheOp::Invalidate),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // Non-expiring values behave like a map where get_with only fills gaps:
    // once stored, a value is kept until evicted or invalidated.
    #[test]
    fn prop_matches_map_model(ops in prop::collection::vec(cache_op_strategy(), 1..60)) {
        let cache: ExpiringCache<String> = ExpiringCache::new();
        let mut model: HashMap<String, String> = HashMap::new();

        for op in ops {
            match op {
                CacheOp::GetWith { key, value } => {
                    let expected = model.entry(key.clone()).or_insert_with(|| value.clone()).clone();
                    let actual = cache.get_with(&key, || value);
                    prop_assert_eq!(actual, expected);
                }
                CacheOp::Get { key } => {
                    prop_assert_eq!(cache.get(&key), model.get(&key).cloned());
                }
                CacheOp::Evict { key } => {
                    cache.evict(&key);
                    model.remove(&key);
                }
                CacheOp::Invalidate => {
                    cache.invalidate();
                    model.clear();
                }
            }
            prop_assert_eq!(cache.len(), model.len());
        }
    }

    // The supplier runs exactly once per distinct key while nothing is evicted.
    #[test]
    fn prop_one_load_per_key(keys in prop::collection::vec(key_strategy(), 1..80)) {
        let cache: ExpiringCache<String> = ExpiringCache::new();
        let loads = AtomicUsize::new(0);

        for key in &keys {
            cache.get_with(key, || {
                loads.fetch_add(1, Ordering::SeqCst);
                key.to_uppercase()
            });
        }

        let distinct: std::collections::HashSet<_> = keys.iter().collect();
        prop_assert_eq!(loads.load(Ordering::SeqCst), distinct.len());

        let stats = cache.stats();
        prop_assert_eq!(stats.loads as usize, distinct.len());
        prop_assert_eq!(stats.hits + stats.misses, keys.len() as u64);
    }

    // A value that is already expired is never served by get_with.
    #[test]
    fn prop_expired_always_reloaded(
        key in key_strategy(),
        values in prop::collection::vec(value_strategy(), 1..10)
    ) {
        let cache = ExpiringCache::new();

        for value in values {
            let served = cache.get_with(&key, || Timed::new(value.clone(), Duration::ZERO));
            prop_assert_eq!(served.value(), &value);
        }
    }

    // A forced sweep removes every expired entry and keeps every live one.
    #[test]
    fn prop_sweep_partitions_entries(
        entries in prop::collection::hash_map(key_strategy(), any::<bool>(), 1..20)
    ) {
        let cache = ExpiringCache::new();
        for (key, expired) in &entries {
            let ttl = if *expired { Duration::ZERO } else { Duration::from_secs(3600) };
            cache.get_with(key, || Timed::new(key.clone(), ttl));
        }

        let expected_removed = entries.values().filter(|expired| **expired).count();
        prop_assert_eq!(cache.cleanup_expired(), expected_removed);
        prop_assert_eq!(cache.len(), entries.len() - expected_removed);

        for (key, expired) in &entries {
            prop_assert_eq!(cache.get(key).is_none(), *expired);
        }
    }
}
