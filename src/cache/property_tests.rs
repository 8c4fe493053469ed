//! Property-Based Tests for Cache Module
//!
//! Uses proptest to check the store, statistics and key policy against
//! simple models.

use proptest::prelude::*;
use std::collections::HashMap;

use crate::cache::{build_key, CacheCategory, CacheService, CacheStats, MemoryStore, SetOptions};

// == Strategies ==
/// Generates cache keys
fn key_strategy() -> impl Strategy<Value = String> {
    "[a-z0-9_:]{1,32}".prop_map(|s| s)
}

/// Generates cache values
fn value_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 ]{0,64}".prop_map(|s| s)
}

fn category_strategy() -> impl Strategy<Value = CacheCategory> {
    prop::sample::select(CacheCategory::ALL.to_vec())
}

/// A sequence of store operations for model checking
#[derive(Debug, Clone)]
enum StoreOp {
    Set { key: String, value: String },
    Get { key: String },
    Delete { key: String },
    Clear,
}

fn store_op_strategy() -> impl Strategy<Value = StoreOp> {
    // Small key space so operations collide
    let key = "[abc]{1,2}";
    prop_oneof![
        4 => (key, value_strategy()).prop_map(|(key, value)| StoreOp::Set { key, value }),
        4 => key.prop_map(|key| StoreOp::Get { key }),
        2 => key.prop_map(|key| StoreOp::Delete { key }),
        1 => Just(StoreOp::Clear),
    ]
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // Without TTLs the store behaves exactly like a map.
    #[test]
    fn prop_memory_store_matches_map_model(ops in prop::collection::vec(store_op_strategy(), 1..60)) {
        let mut store = MemoryStore::new();
        let mut model: HashMap<String, String> = HashMap::new();

        for op in ops {
            match op {
                StoreOp::Set { key, value } => {
                    store.set(key.clone(), value.clone(), None);
                    model.insert(key, value);
                }
                StoreOp::Get { key } => {
                    prop_assert_eq!(store.get(&key), model.get(&key).cloned());
                }
                StoreOp::Delete { key } => {
                    prop_assert_eq!(store.delete(&key), model.remove(&key).is_some());
                }
                StoreOp::Clear => {
                    store.clear();
                    model.clear();
                }
            }
            prop_assert_eq!(store.len(), model.len());
        }
    }

    // hit_rate is 100 * h / (h + m), and 0 before any observation.
    #[test]
    fn prop_hit_rate_formula(hits in 0u64..500, misses in 0u64..500) {
        let mut stats = CacheStats::new();
        for _ in 0..hits {
            stats.record_hit();
        }
        for _ in 0..misses {
            stats.record_miss();
        }

        let expected = if hits + misses == 0 {
            0.0
        } else {
            100.0 * hits as f64 / (hits + misses) as f64
        };
        prop_assert!((stats.hit_rate - expected).abs() < 1e-9);
        prop_assert_eq!(stats.hits, hits);
        prop_assert_eq!(stats.misses, misses);
    }

    // Keys are the prefix followed by every part, in order.
    #[test]
    fn prop_build_key_layout(
        category in category_strategy(),
        parts in prop::collection::vec("[a-z0-9]{1,8}", 0..5)
    ) {
        let key = build_key(category, &parts);
        let mut segments = key.split(':');

        prop_assert_eq!(segments.next(), Some(category.prefix()));
        let rest: Vec<&str> = segments.collect();
        prop_assert_eq!(rest, parts.iter().map(String::as_str).collect::<Vec<_>>());
    }

    // set then get returns the value through the full service path.
    #[test]
    fn prop_service_round_trip(key in key_strategy(), value in value_strategy()) {
        let cache = CacheService::in_process();
        let fetched = runtime().block_on(async {
            cache.set(&key, &value, &SetOptions::new()).await;
            cache.get::<String>(&key).await
        });

        prop_assert_eq!(fetched, Some(value));
        prop_assert_eq!(cache.get_stats().hits, 1);
    }
}
