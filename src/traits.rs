//! # Cache Trait Hierarchy
//!
//! Defines the trait surface shared by cache implementations in this crate.
//!
//! ## Trait Summary
//!
//! | Trait           | Extends         | Purpose                             |
//! |-----------------|-----------------|-------------------------------------|
//! | `ReadOnlyCache` | -               | Non-mutating queries                |
//! | `CoreCache`     | `ReadOnlyCache` | Insert / access / clear             |
//!
//! ## Why There Is No `remove`
//!
//! LIRS decides evictions from the bottom of the resident-HIR queue, and its
//! stack encodes inter-reference recency history. Pulling an arbitrary key
//! out of the middle of either sequence would fabricate recency information
//! that no access produced, so the policy deliberately exposes no
//! key-addressed removal. Eviction is the only way an entry loses residency.
//!
//! ## Access Semantics
//!
//! `get` is an *access*: it may reorder internal sequences and reclassify
//! entries. `contains` (and policy-specific `peek` methods) are *queries*:
//! they never change state. Callers that only need existence checks should
//! prefer `contains` so they do not perturb the replacement decisions.

/// Non-mutating cache queries.
///
/// None of these methods count as an access: calling them any number of
/// times leaves the cache byte-for-byte unchanged.
pub trait ReadOnlyCache<K, V> {
    /// Returns `true` if a value is currently resident for `key`.
    ///
    /// Ghost entries (tracked metadata without a value) report `false`.
    fn contains(&self, key: &K) -> bool;

    /// Returns the number of resident entries.
    fn len(&self) -> usize;

    /// Returns `true` if no entries are resident.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the configured maximum number of resident entries.
    fn capacity(&self) -> usize;
}

/// Core cache operations.
///
/// # Example
///
/// ```
/// use lirskit::policy::lirs::LirsCache;
/// use lirskit::traits::{CoreCache, ReadOnlyCache};
///
/// fn warm<C: CoreCache<u64, String>>(cache: &mut C, data: &[(u64, String)]) {
///     for (key, value) in data {
///         cache.insert(*key, value.clone());
///     }
/// }
///
/// let mut cache = LirsCache::new(100);
/// warm(&mut cache, &[(1, "one".to_string()), (2, "two".to_string())]);
/// assert_eq!(cache.len(), 2);
/// ```
pub trait CoreCache<K, V>: ReadOnlyCache<K, V> {
    /// Inserts or overwrites a key-value pair, returning the previous value
    /// if the key was resident.
    ///
    /// Counts as an access. May evict one resident entry if the key is new
    /// (or a revived ghost) and the cache is past its warm-up phase.
    fn insert(&mut self, key: K, value: V) -> Option<V>;

    /// Returns a reference to the value for `key`, if resident.
    ///
    /// Counts as an access and may reorder internal bookkeeping, but never
    /// evicts. Lookups of unknown or non-resident keys return `None` and
    /// leave the cache unchanged.
    fn get(&mut self, key: &K) -> Option<&V>;

    /// Removes all entries and resets the cache to its freshly constructed
    /// state.
    fn clear(&mut self);
}
