//! Storage traits for cache policies.
//!
//! Stores own key/value data and answer lookups; policies own eviction
//! order and per-key metadata. Keeping the two behind a trait boundary
//! means policy logic never depends on how values are actually held.
//!
//! ```text
//!   ┌────────────────────┐            ┌────────────────────┐
//!   │       Policy       │  decides   │        Store       │
//!   │  (eviction order)  ├───────────►│  (key/value data)  │
//!   └────────────────────┘  evictions └────────────────────┘
//! ```
//!
//! A store never evicts on its own: inserting a new key into a full store
//! fails with [`StoreFull`] and the policy is expected to make room first.
//! Reads are pure; the activity counters move only on the write paths, so
//! stores need no interior mutability.

/// Snapshot of store-level activity counters.
///
/// All fields are cumulative since store creation. These are diagnostics
/// for the store itself, not part of the cache's observable state.
///
/// # Example
///
/// ```
/// use lirskit::store::traits::StoreMetrics;
///
/// let metrics = StoreMetrics {
///     loads: 100,
///     updates: 20,
///     removes: 5,
///     evictions: 40,
/// };
///
/// // Loads minus departures leaves the current residents.
/// assert_eq!(metrics.loads - metrics.removes - metrics.evictions, 55);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreMetrics {
    /// Values installed for previously absent keys.
    pub loads: u64,
    /// Value overwrites for keys already present.
    pub updates: u64,
    /// Removals via `remove()`.
    pub removes: u64,
    /// Removals attributed to the policy via the store's eviction entry
    /// point.
    pub evictions: u64,
}

/// Error returned when inserting a new key into a store at capacity.
///
/// Updates to existing keys never produce this error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreFull;

/// Read-only store operations.
pub trait StoreCore<K, V> {
    /// Returns a reference to the value for `key`.
    ///
    /// Pure lookup; no counter or ordering state changes.
    fn get(&self, key: &K) -> Option<&V>;

    /// Returns `true` if `key` is present.
    fn contains(&self, key: &K) -> bool;

    /// Returns the current number of entries.
    fn len(&self) -> usize;

    /// Returns `true` if the store holds no entries.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the maximum number of entries this store can hold.
    fn capacity(&self) -> usize;

    /// Returns a snapshot of the store's counters.
    ///
    /// The default implementation reports zeroes; override to provide
    /// actual tracking.
    fn metrics(&self) -> StoreMetrics {
        StoreMetrics::default()
    }
}

/// Mutable store operations.
pub trait StoreMut<K, V>: StoreCore<K, V> {
    /// Inserts a key-value pair, returning the previous value if the key
    /// existed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreFull`] if the store is at capacity and `key` is new.
    fn try_insert(&mut self, key: K, value: V) -> Result<Option<V>, StoreFull>;

    /// Removes and returns the value for `key`, if present.
    fn remove(&mut self, key: &K) -> Option<V>;

    /// Removes all entries.
    fn clear(&mut self);
}
