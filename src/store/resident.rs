//! Resident-value store.
//!
//! Holds the key/value pairs that currently occupy cache slots. The policy
//! decides *who* is resident; the store only enforces *how many*, refusing
//! a load past capacity with [`StoreFull`] so a missing eviction surfaces
//! immediately instead of letting the cache overfill.
//!
//! Reads are pure. The activity counters (loads, updates, removes,
//! evictions) move only on the `&mut self` write paths, which keeps the
//! store free of interior mutability. Evictions go through [`evict`], a
//! separate entry point from [`remove`], so the counters distinguish the
//! policy reclaiming a slot from a caller deleting a key.
//!
//! [`evict`]: ResidentStore::evict
//! [`remove`]: StoreMut::remove

use std::collections::hash_map::Entry as MapEntry;
use std::hash::Hash;

use rustc_hash::FxHashMap;

use crate::store::traits::{StoreCore, StoreFull, StoreMetrics, StoreMut};

/// Capacity-bounded map from keys to the values resident for them.
///
/// # Example
///
/// ```
/// use lirskit::store::resident::ResidentStore;
/// use lirskit::store::traits::{StoreCore, StoreMut};
///
/// let mut store: ResidentStore<u64, String> = ResidentStore::new(2);
/// store.try_insert(1, "hello".to_string()).unwrap();
/// assert_eq!(store.get(&1), Some(&"hello".to_string()));
/// ```
#[derive(Debug)]
pub struct ResidentStore<K, V> {
    residents: FxHashMap<K, V>,
    capacity: usize,
    metrics: StoreMetrics,
}

impl<K, V> ResidentStore<K, V>
where
    K: Eq + Hash,
{
    /// Creates a store with room for `capacity` residents.
    pub fn new(capacity: usize) -> Self {
        Self {
            residents: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
            capacity,
            metrics: StoreMetrics::default(),
        }
    }

    /// Removes `key` on behalf of the policy's eviction decision.
    ///
    /// Identical to [`StoreMut::remove`] except for which counter moves.
    pub fn evict(&mut self, key: &K) -> Option<V> {
        let value = self.residents.remove(key)?;
        self.metrics.evictions += 1;
        Some(value)
    }

    /// Iterates over `(key, value)` pairs in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.residents.iter()
    }
}

impl<K, V> StoreCore<K, V> for ResidentStore<K, V>
where
    K: Eq + Hash,
{
    fn get(&self, key: &K) -> Option<&V> {
        self.residents.get(key)
    }

    fn contains(&self, key: &K) -> bool {
        self.residents.contains_key(key)
    }

    fn len(&self) -> usize {
        self.residents.len()
    }

    fn capacity(&self) -> usize {
        self.capacity
    }

    fn metrics(&self) -> StoreMetrics {
        self.metrics
    }
}

impl<K, V> StoreMut<K, V> for ResidentStore<K, V>
where
    K: Eq + Hash,
{
    fn try_insert(&mut self, key: K, value: V) -> Result<Option<V>, StoreFull> {
        let at_capacity = self.residents.len() >= self.capacity;
        match self.residents.entry(key) {
            MapEntry::Occupied(mut occupied) => {
                self.metrics.updates += 1;
                Ok(Some(occupied.insert(value)))
            },
            MapEntry::Vacant(_) if at_capacity => Err(StoreFull),
            MapEntry::Vacant(vacant) => {
                vacant.insert(value);
                self.metrics.loads += 1;
                Ok(None)
            },
        }
    }

    fn remove(&mut self, key: &K) -> Option<V> {
        let value = self.residents.remove(key)?;
        self.metrics.removes += 1;
        Some(value)
    }

    fn clear(&mut self) {
        self.residents.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_ops() {
        let mut store = ResidentStore::new(2);
        assert_eq!(store.try_insert("k1", "v1".to_string()), Ok(None));
        assert_eq!(store.get(&"k1"), Some(&"v1".to_string()));
        assert!(store.contains(&"k1"));
        assert_eq!(store.len(), 1);
        assert_eq!(store.capacity(), 2);
        assert_eq!(store.remove(&"k1"), Some("v1".to_string()));
        assert!(!store.contains(&"k1"));
    }

    #[test]
    fn full_store_refuses_loads_but_not_updates() {
        let mut store = ResidentStore::new(1);
        assert_eq!(store.try_insert(1, "a"), Ok(None));
        assert_eq!(store.try_insert(2, "b"), Err(StoreFull));
        assert_eq!(store.len(), 1);

        assert_eq!(store.try_insert(1, "a2"), Ok(Some("a")));
    }

    #[test]
    fn reads_leave_counters_alone() {
        let mut store = ResidentStore::new(2);
        store.try_insert(1, 10).unwrap();

        assert_eq!(store.get(&1), Some(&10));
        assert_eq!(store.get(&9), None);
        assert!(store.contains(&1));
        assert_eq!(
            store.metrics(),
            StoreMetrics {
                loads: 1,
                ..StoreMetrics::default()
            }
        );
    }

    #[test]
    fn eviction_and_removal_count_separately() {
        let mut store = ResidentStore::new(4);
        store.try_insert(1, "a").unwrap();
        store.try_insert(2, "b").unwrap();
        store.try_insert(2, "b2").unwrap();

        assert_eq!(store.evict(&1), Some("a"));
        assert_eq!(store.remove(&2), Some("b2"));
        assert_eq!(store.evict(&7), None, "absent key bumps nothing");

        let metrics = store.metrics();
        assert_eq!(metrics.loads, 2);
        assert_eq!(metrics.updates, 1);
        assert_eq!(metrics.removes, 1);
        assert_eq!(metrics.evictions, 1);
    }

    #[test]
    fn iter_yields_all_entries() {
        let mut store = ResidentStore::new(4);
        store.try_insert(1, "a").unwrap();
        store.try_insert(2, "b").unwrap();

        let mut keys: Vec<_> = store.iter().map(|(k, _)| *k).collect();
        keys.sort_unstable();
        assert_eq!(keys, vec![1, 2]);
    }

    #[test]
    fn clear_empties_store() {
        let mut store = ResidentStore::new(2);
        store.try_insert(1, "a").unwrap();
        store.clear();
        assert!(store.is_empty());
        assert_eq!(store.get(&1), None);
    }
}
