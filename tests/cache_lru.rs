//! Property-based tests for the hot-vector LRU cache.

use embedb::cache::VectorCache;
use proptest::prelude::*;

/// A cache operation for model-based testing.
#[derive(Debug, Clone)]
enum Op {
    Get(u64),
    Put(u64, f32),
}

fn arb_ops() -> impl Strategy<Value = Vec<Op>> {
    prop::collection::vec(
        prop_oneof![
            (0u64..16).prop_map(Op::Get),
            (0u64..16, -100.0f32..100.0).prop_map(|(k, v)| Op::Put(k, v)),
        ],
        1..200,
    )
}

/// Reference model: keys ordered most-recently-touched first.
struct Model {
    capacity: usize,
    order: Vec<u64>,
    values: std::collections::HashMap<u64, f32>,
}

impl Model {
    fn new(capacity: usize) -> Self {
        Self {
            capacity,
            order: Vec::new(),
            values: std::collections::HashMap::new(),
        }
    }

    fn touch(&mut self, key: u64) {
        self.order.retain(|&k| k != key);
        self.order.insert(0, key);
    }

    fn get(&mut self, key: u64) -> Option<f32> {
        if self.values.contains_key(&key) {
            self.touch(key);
            self.values.get(&key).copied()
        } else {
            None
        }
    }

    fn put(&mut self, key: u64, value: f32) {
        self.values.insert(key, value);
        self.touch(key);
        if self.order.len() > self.capacity {
            let victim = self.order.pop().expect("overflow implies a victim");
            self.values.remove(&victim);
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// After any operation sequence, the cache holds exactly the C
    /// most-recently-touched distinct keys with their latest values,
    /// matching a straightforward reference model.
    #[test]
    fn prop_cache_matches_reference_model(capacity in 1usize..8, ops in arb_ops()) {
        let cache = VectorCache::new(capacity);
        let mut model = Model::new(capacity);

        for op in &ops {
            match *op {
                Op::Get(key) => {
                    let got = cache.get(key).map(|v| v[0]);
                    let expected = model.get(key);
                    prop_assert_eq!(got, expected, "get({}) diverged from model", key);
                }
                Op::Put(key, value) => {
                    cache.put(key, vec![value]);
                    model.put(key, value);
                }
            }
        }

        // Final state: same size, same members, same values.
        prop_assert_eq!(cache.len(), model.values.len());
        for (&key, &value) in &model.values {
            prop_assert_eq!(cache.get(key).map(|v| v[0]), Some(value));
        }
    }

    /// The cache never exceeds its capacity.
    #[test]
    fn prop_cache_bounded(capacity in 1usize..8, ops in arb_ops()) {
        let cache = VectorCache::new(capacity);
        for op in &ops {
            if let Op::Put(key, value) = *op {
                cache.put(key, vec![value]);
            }
            prop_assert!(cache.len() <= capacity);
        }
    }
}

/// The worked example: capacity 2, `put(1); put(2); get(1); put(3)`
/// leaves {1, 3} and evicts 2.
#[test]
fn test_eviction_prefers_least_recently_touched() {
    let cache = VectorCache::new(2);
    cache.put(1, vec![0.1]);
    cache.put(2, vec![0.2]);
    assert!(cache.get(1).is_some());
    cache.put(3, vec![0.3]);

    assert!(cache.get(1).is_some());
    assert!(cache.get(2).is_none());
    assert!(cache.get(3).is_some());
    assert_eq!(cache.len(), 2);
}
