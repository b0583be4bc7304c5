// Copyright (c) 2025 EmbeDB Contributors
// Licensed under the EmbeDB License. See LICENSE file for details.

//! Bounded LRU cache for hot vectors.
//!
//! Reads served from the cache skip the store's reader-writer lock and
//! the mmap entirely, which matters for workloads that hammer a small
//! set of keys. The cache holds deep copies of vectors, never views into
//! the mapping: an insert remaps the file, and a cached view into the
//! old mapping would dangle.
//!
//! Entries are keyed by the 64-bit key hash. Capacity is fixed at
//! construction; inserting beyond it evicts the least-recently-used
//! entry. All operations are O(1) and internally synchronized, so the
//! cache can be probed without taking the store lock.

use std::num::NonZeroUsize;

use lru::LruCache;
use parking_lot::Mutex;

/// Mutex-wrapped LRU of (key hash → owned vector).
///
/// # Examples
///
/// ```rust
/// use embedb::cache::VectorCache;
///
/// let cache = VectorCache::new(2);
/// cache.put(1, vec![0.1, 0.2]);
/// cache.put(2, vec![0.3, 0.4]);
/// cache.get(1); // promote 1
/// cache.put(3, vec![0.5, 0.6]); // evicts 2
///
/// assert!(cache.get(1).is_some());
/// assert!(cache.get(2).is_none());
/// assert!(cache.get(3).is_some());
/// ```
pub struct VectorCache {
    inner: Mutex<LruCache<u64, Vec<f32>>>,
    capacity: usize,
}

impl VectorCache {
    /// Creates a cache holding at most `capacity` vectors.
    ///
    /// A capacity of 0 is bumped to 1; the cache always admits at least
    /// one entry.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            inner: Mutex::new(LruCache::new(
                NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN),
            )),
            capacity,
        }
    }

    /// Returns an owned copy of the cached vector and promotes the entry
    /// to most-recently-used. `None` on a miss.
    pub fn get(&self, hash: u64) -> Option<Vec<f32>> {
        self.inner.lock().get(&hash).cloned()
    }

    /// Inserts or replaces the vector for `hash` as most-recently-used,
    /// evicting the least-recently-used entry on overflow.
    pub fn put(&self, hash: u64, vector: Vec<f32>) {
        self.inner.lock().put(hash, vector);
    }

    /// Number of vectors currently cached.
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    /// Returns `true` if nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    /// Maximum number of vectors the cache will hold.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Drops every cached vector. Capacity is unchanged.
    pub fn clear(&self) {
        self.inner.lock().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_get_roundtrip() {
        let cache = VectorCache::new(4);
        cache.put(7, vec![1.0, 2.0, 3.0]);

        assert_eq!(cache.get(7), Some(vec![1.0, 2.0, 3.0]));
        assert_eq!(cache.get(8), None);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_eviction_order() {
        let cache = VectorCache::new(2);
        cache.put(1, vec![0.1]);
        cache.put(2, vec![0.2]);
        cache.get(1); // 1 becomes most-recently-used
        cache.put(3, vec![0.3]); // 2 is the LRU victim

        assert!(cache.get(1).is_some());
        assert!(cache.get(2).is_none());
        assert!(cache.get(3).is_some());
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_put_replaces_and_promotes() {
        let cache = VectorCache::new(2);
        cache.put(1, vec![0.1]);
        cache.put(2, vec![0.2]);
        cache.put(1, vec![9.9]); // replace + promote
        cache.put(3, vec![0.3]); // evicts 2, not 1

        assert_eq!(cache.get(1), Some(vec![9.9]));
        assert!(cache.get(2).is_none());
    }

    #[test]
    fn test_returned_vector_is_owned() {
        let cache = VectorCache::new(2);
        cache.put(1, vec![0.5, 0.5]);

        let mut copy = cache.get(1).unwrap();
        copy[0] = 42.0;

        // Mutating the copy must not affect the cached value.
        assert_eq!(cache.get(1), Some(vec![0.5, 0.5]));
    }

    #[test]
    fn test_clear() {
        let cache = VectorCache::new(3);
        cache.put(1, vec![0.1]);
        cache.put(2, vec![0.2]);
        cache.clear();

        assert!(cache.is_empty());
        assert_eq!(cache.capacity(), 3);
        assert!(cache.get(1).is_none());
    }

    #[test]
    fn test_zero_capacity_bumped_to_one() {
        let cache = VectorCache::new(0);
        cache.put(1, vec![0.1]);
        assert_eq!(cache.capacity(), 1);
        assert_eq!(cache.len(), 1);
    }
}
