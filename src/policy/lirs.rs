//! LIRS (Low Inter-reference Recency Set) cache replacement policy.
//!
//! LIRS ranks keys by their *inter-reference recency* (the number of other
//! distinct keys touched between two consecutive references to the same
//! key) instead of plain recency. Keys with small IRR ("LIR") are protected and
//! always resident; keys with large IRR ("HIR") are the eviction candidates.
//! This beats LRU on scan- and loop-heavy workloads because a one-pass scan
//! never earns LIR status and therefore cannot flush the working set.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────────┐
//! │                        LirsCache<K, V> Layout                        │
//! │                                                                      │
//! │   entries: FxHashMap<K, Entry<K>>                                    │
//! │                                                                      │
//! │   Entry { lir, resident, stack: Option<ChainLinks<K>>,               │
//! │                          queue: Option<ChainLinks<K>> }              │
//! │                                                                      │
//! │   The entry record IS the list node: a ChainLinks names the          │
//! │   neighbouring keys on that sequence, and Some(_) doubles as the     │
//! │   "threaded on that sequence" flag. The sequences themselves are     │
//! │   just top/bottom headers; every hop goes back through the table.    │
//! │                                                                      │
//! │   STACK S (recency among LIR candidates)                             │
//! │     top ─► k9 ─► k7 ─► k5 ─► k2 ◄─ bottom (always LIR after prune)   │
//! │            LIR   HIR   ghost LIR                                     │
//! │                                                                      │
//! │   QUEUE Q (resident HIR)                                             │
//! │     top ─► k7 ─► k3 ◄─ bottom (next eviction victim)                 │
//! │                                                                      │
//! │   values: ResidentStore<K, V>  (resident key/value pairs, ≤ capacity)│
//! └──────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Access Cases
//!
//! ```text
//! GET/PUT on a resident LIR key:
//!   move to the front of S; if it was at the back, prune S.
//!
//! GET/PUT on a resident HIR key still in S:
//!   its reuse distance fits inside the LIR set, so promote:
//!   set LIR, move to front of S, leave Q, demote the back LIR of S
//!   into Q, prune S.
//!
//! GET/PUT on a resident HIR key no longer in S:
//!   refresh only: reappear at the front of S, move to the front of Q.
//!
//! PUT on a ghost (non-resident key still in S):
//!   evict the back of Q, reload the value, then promote as above.
//!
//! GET on a ghost:
//!   plain miss; S and Q are left untouched.
//!
//! PUT on an unknown key:
//!   warm-up (LIR set not yet full): admit as LIR, no eviction.
//!   steady state: evict the back of Q, admit as HIR at the front of
//!   both S and Q.
//! ```
//!
//! ## Operations
//!
//! | Operation   | Time   | Notes                                       |
//! |-------------|--------|---------------------------------------------|
//! | `get`       | O(1)*  | *Amortized; a bottom hit prunes S           |
//! | `insert`    | O(1)*  | *Amortized; evicts at most one entry        |
//! | `contains`  | O(1)   | Residency check only, never an access       |
//! | `peek`      | O(1)   | Value access without reorganisation         |
//! | `len`       | O(1)   | Resident entries                            |
//!
//! Pruning pops each stack position at most once per insertion that
//! threaded it, so sequences of operations stay amortized O(1).
//!
//! ## Ghost Entries
//!
//! Evicting a resident HIR key whose metadata is still in S leaves a
//! *ghost*: the value is gone but the stack position remains, so a prompt
//! re-reference proves a short reuse distance and earns immediate LIR
//! status. Ghosts die when pruning pops them off the back of S. The entry
//! table can therefore temporarily exceed `capacity`; S is compacted
//! opportunistically rather than hard-capped.
//!
//! ## Example Usage
//!
//! ```
//! use lirskit::policy::lirs::LirsCache;
//! use lirskit::traits::{CoreCache, ReadOnlyCache};
//!
//! let mut cache: LirsCache<u64, String> = LirsCache::new(100);
//!
//! cache.insert(1, "working-set".to_string());
//! assert_eq!(cache.get(&1), Some(&"working-set".to_string()));
//!
//! // A long scan churns through the HIR queue without displacing the
//! // protected LIR set.
//! for i in 1_000..2_000 {
//!     cache.insert(i, format!("scan_{i}"));
//! }
//! assert!(cache.contains(&1));
//! ```
//!
//! ## Thread Safety
//!
//! - [`LirsCache`]: not thread-safe, designed for single-threaded use,
//!   and not re-entrant. It is `Send`/`Sync` when `K`/`V` are (no interior
//!   mutability, no raw pointers), so external locking works.
//! - [`ConcurrentLirsCache`]: convenience wrapper that serialises all
//!   operations behind a `parking_lot::RwLock`.
//!
//! ## Implementation Notes
//!
//! - Both sequences are threaded *through* the entry table: an entry's
//!   `ChainLinks` name its neighbouring keys, so membership, position and
//!   the O(1) splice handle are one and the same field. Unthreading an
//!   entry clears its membership in the same step, which is what makes
//!   the ghost lifecycle single-owner (no cursor can go stale).
//! - The engine does not implement `Clone`: the chains run through the
//!   entry records, and duplicating them would alias live bookkeeping.
//! - Promotion runs in a fixed order: set LIR, move in S, leave Q, demote
//!   the back LIR, prune. Reordering those steps corrupts the stack (the
//!   demotion could target the key being promoted).
//! - There is no `remove`; see the crate's trait module for the rationale.
//!
//! ## References
//!
//! - Jiang & Zhang, "LIRS: An Efficient Low Inter-reference Recency Set
//!   Replacement Policy to Improve Buffer Cache Performance",
//!   SIGMETRICS 2002

use std::fmt;
use std::fmt::Write as _;
use std::hash::Hash;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::error::{ConfigError, InvariantError};
use crate::store::resident::ResidentStore;
use crate::store::traits::{StoreCore, StoreMut};
use crate::traits::{CoreCache, ReadOnlyCache};

/// Default fraction of capacity reserved for resident HIR entries.
///
/// The LIRS paper recommends keeping the HIR partition around 1% of the
/// cache; the floor of one slot keeps tiny caches functional.
pub const DEFAULT_HIR_RATIO: f64 = 0.01;

/// How a tracked key is currently classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// Low inter-reference recency: protected, always resident.
    Lir,
    /// High inter-reference recency with a resident value; evictable from
    /// the back of Q.
    HirResident,
    /// High inter-reference recency whose value has been evicted; metadata
    /// only, kept in S to detect a prompt re-reference.
    HirGhost,
}

/// Selects one of the two sequences an entry can be threaded on.
#[derive(Debug, Clone, Copy)]
enum Chain {
    /// The LIRS stack S.
    Stack,
    /// The resident-HIR queue Q.
    Queue,
}

/// Neighbouring keys of an entry within one sequence.
///
/// `above` points toward the top (most recent end), `below` toward the
/// bottom. An entry owns a `ChainLinks` exactly while it is threaded on
/// that sequence.
#[derive(Debug)]
struct ChainLinks<K> {
    above: Option<K>,
    below: Option<K>,
}

/// Top/bottom header of one sequence.
#[derive(Debug)]
struct ChainEnds<K> {
    top: Option<K>,
    bottom: Option<K>,
    len: usize,
}

impl<K> ChainEnds<K> {
    fn new() -> Self {
        Self {
            top: None,
            bottom: None,
            len: 0,
        }
    }

    fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// Per-key bookkeeping record; doubles as the list node for both
/// sequences.
///
/// `stack`/`queue` are `Some` exactly while the key is threaded on S/Q,
/// and every structural change to a sequence rewrites the affected links
/// in the same step.
#[derive(Debug)]
struct Entry<K> {
    lir: bool,
    resident: bool,
    stack: Option<ChainLinks<K>>,
    queue: Option<ChainLinks<K>>,
}

impl<K> Entry<K> {
    fn links(&self, chain: Chain) -> &Option<ChainLinks<K>> {
        match chain {
            Chain::Stack => &self.stack,
            Chain::Queue => &self.queue,
        }
    }

    fn links_mut(&mut self, chain: Chain) -> &mut Option<ChainLinks<K>> {
        match chain {
            Chain::Stack => &mut self.stack,
            Chain::Queue => &mut self.queue,
        }
    }

    fn classification(&self) -> Classification {
        if self.lir {
            Classification::Lir
        } else if self.resident {
            Classification::HirResident
        } else {
            Classification::HirGhost
        }
    }
}

/// Cache implementing the LIRS replacement policy.
///
/// # Type Parameters
///
/// - `K`: Key type, must be `Clone + Eq + Hash`
/// - `V`: Value type, opaque to the policy
///
/// # Example
///
/// ```
/// use lirskit::policy::lirs::LirsCache;
/// use lirskit::traits::{CoreCache, ReadOnlyCache};
///
/// // capacity 5, one slot reserved for resident HIR entries
/// let mut cache = LirsCache::try_with_hir_ratio(5, 0.2).unwrap();
///
/// for (k, v) in [(1, "A"), (2, "B"), (3, "C"), (4, "D")] {
///     cache.insert(k, v);
/// }
/// // warm-up admissions all join the protected LIR set
/// assert_eq!(cache.lir_count(), 4);
///
/// cache.insert(5, "E");
/// cache.insert(6, "F"); // evicts 5 from the HIR queue
/// assert_eq!(cache.get(&5), None);
/// assert_eq!(cache.len(), 5);
/// ```
pub struct LirsCache<K, V>
where
    K: Clone + Eq + Hash,
{
    /// Key → state flags plus the chain links threading it on S / Q.
    entries: FxHashMap<K, Entry<K>>,
    /// Resident key/value pairs, bounded by `capacity`.
    values: ResidentStore<K, V>,
    /// Stack S header: top = most recent reference.
    stack: ChainEnds<K>,
    /// Queue Q header: the bottom is the next eviction victim.
    queue: ChainEnds<K>,
    capacity: usize,
    hir_capacity: usize,
    lir_capacity: usize,
    lir_count: usize,
}

impl<K, V> LirsCache<K, V>
where
    K: Clone + Eq + Hash,
{
    /// Creates a cache with the given capacity and the default HIR ratio.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero. Use [`try_new`](Self::try_new) for a
    /// fallible variant.
    ///
    /// # Example
    ///
    /// ```
    /// use lirskit::policy::lirs::LirsCache;
    /// use lirskit::traits::ReadOnlyCache;
    ///
    /// let cache: LirsCache<u64, String> = LirsCache::new(100);
    /// assert_eq!(cache.capacity(), 100);
    /// assert_eq!(cache.hir_capacity(), 1);
    /// assert_eq!(cache.lir_capacity(), 99);
    /// ```
    pub fn new(capacity: usize) -> Self {
        match Self::try_new(capacity) {
            Ok(cache) => cache,
            Err(err) => panic!("invalid LIRS configuration: {err}"),
        }
    }

    /// Creates a cache with the given capacity and the default HIR ratio,
    /// failing on invalid configuration.
    pub fn try_new(capacity: usize) -> Result<Self, ConfigError> {
        Self::try_with_hir_ratio(capacity, DEFAULT_HIR_RATIO)
    }

    /// Creates a cache with an explicit HIR ratio.
    ///
    /// The resident HIR partition gets `max(1, ⌊capacity · hir_ratio⌋)`
    /// slots; the remainder is the LIR capacity.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ZeroCapacity`] if `capacity == 0`, and
    /// [`ConfigError::HirRatioOutOfRange`] unless `0 < hir_ratio < 1`.
    ///
    /// # Example
    ///
    /// ```
    /// use lirskit::policy::lirs::LirsCache;
    ///
    /// let cache = LirsCache::<u64, u64>::try_with_hir_ratio(5, 0.2).unwrap();
    /// assert_eq!(cache.lir_capacity(), 4);
    /// assert_eq!(cache.hir_capacity(), 1);
    ///
    /// assert!(LirsCache::<u64, u64>::try_with_hir_ratio(0, 0.2).is_err());
    /// assert!(LirsCache::<u64, u64>::try_with_hir_ratio(5, 1.0).is_err());
    /// ```
    pub fn try_with_hir_ratio(capacity: usize, hir_ratio: f64) -> Result<Self, ConfigError> {
        if capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        if !(hir_ratio > 0.0 && hir_ratio < 1.0) {
            return Err(ConfigError::HirRatioOutOfRange(hir_ratio));
        }

        let hir_capacity = ((capacity as f64 * hir_ratio) as usize).max(1);
        let lir_capacity = capacity - hir_capacity;

        Ok(Self {
            entries: FxHashMap::default(),
            values: ResidentStore::new(capacity),
            stack: ChainEnds::new(),
            queue: ChainEnds::new(),
            capacity,
            hir_capacity,
            lir_capacity,
            lir_count: 0,
        })
    }

    /// Returns a reference to the value for `key`, if resident.
    ///
    /// A hit reorders the internal sequences (and may prune ghosts from
    /// the stack) but never evicts, never changes residency, and never
    /// changes the LIR population. Lookups of unknown keys *and of ghosts*
    /// are plain misses that leave the cache untouched.
    ///
    /// # Example
    ///
    /// ```
    /// use lirskit::policy::lirs::LirsCache;
    ///
    /// let mut cache = LirsCache::new(10);
    /// cache.insert(1, "one");
    /// assert_eq!(cache.get(&1), Some(&"one"));
    /// assert_eq!(cache.get(&9), None);
    /// ```
    pub fn get(&mut self, key: &K) -> Option<&V> {
        let (lir, resident) = match self.entries.get(key) {
            Some(entry) => (entry.lir, entry.resident),
            None => return None,
        };
        if !resident {
            // Ghost lookup: a miss, not a reference. S and Q stay as-is.
            return None;
        }

        if lir {
            self.touch_lir(key);
        } else {
            self.touch_hir_resident(key);
        }
        self.values.get(key)
    }

    /// Inserts or overwrites `key`, returning the previous value if the
    /// key was resident.
    ///
    /// Admitting a new key (or reviving a ghost) past warm-up evicts
    /// exactly one resident HIR entry from the back of Q.
    ///
    /// # Example
    ///
    /// ```
    /// use lirskit::policy::lirs::LirsCache;
    ///
    /// let mut cache = LirsCache::new(10);
    /// assert_eq!(cache.insert(1, "first"), None);
    /// assert_eq!(cache.insert(1, "second"), Some("first"));
    /// ```
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        let (known, resident, lir) = match self.entries.get(&key) {
            Some(entry) => (true, entry.resident, entry.lir),
            None => (false, false, false),
        };

        if !known {
            self.admit(key, value);
            return None;
        }

        if resident {
            let previous = self
                .values
                .try_insert(key.clone(), value)
                .expect("resident key already occupies a store slot");
            if lir {
                self.touch_lir(&key);
            } else {
                self.touch_hir_resident(&key);
            }
            return previous;
        }

        self.revive(key, value);
        None
    }

    /// Returns the value for `key` without counting an access.
    pub fn peek(&self, key: &K) -> Option<&V> {
        self.values.get(key)
    }

    /// Returns `true` if a value is resident for `key`.
    ///
    /// Never an access: ghosts report `false` and nothing is reordered.
    pub fn contains(&self, key: &K) -> bool {
        self.values.contains(key)
    }

    /// Returns the number of resident entries.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if no entries are resident.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Returns the configured total capacity.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the number of keys currently classified LIR.
    pub fn lir_count(&self) -> usize {
        self.lir_count
    }

    /// Returns the size of the protected LIR partition.
    pub fn lir_capacity(&self) -> usize {
        self.lir_capacity
    }

    /// Returns the size of the resident HIR partition.
    pub fn hir_capacity(&self) -> usize {
        self.hir_capacity
    }

    /// Returns the current length of stack S (includes ghosts).
    pub fn stack_len(&self) -> usize {
        self.stack.len
    }

    /// Returns the current length of queue Q.
    pub fn queue_len(&self) -> usize {
        self.queue.len
    }

    /// Returns the number of ghost entries (tracked but non-resident).
    pub fn ghost_count(&self) -> usize {
        self.entries.len() - self.values.len()
    }

    /// Iterates stack S from most to least recent, yielding each key with
    /// its classification. Read-only; not an access.
    pub fn iter_stack(&self) -> impl Iterator<Item = (&K, Classification)> {
        self.chain_iter(Chain::Stack).map(|key| {
            let classification = self
                .entries
                .get(key)
                .map_or(Classification::HirGhost, |entry| entry.classification());
            (key, classification)
        })
    }

    /// Iterates queue Q from most recent to the eviction end. Read-only.
    pub fn iter_queue(&self) -> impl Iterator<Item = &K> {
        self.chain_iter(Chain::Queue)
    }

    /// Iterates resident entries in arbitrary order, yielding key, value
    /// and classification. Read-only; not an access.
    pub fn iter_resident(&self) -> impl Iterator<Item = (&K, &V, Classification)> {
        self.values.iter().map(|(key, value)| {
            let classification = self
                .entries
                .get(key)
                .map_or(Classification::HirResident, |entry| entry.classification());
            (key, value, classification)
        })
    }

    /// Removes every entry, ghost and value, returning the cache to its
    /// freshly constructed state (warm-up regime included).
    pub fn clear(&mut self) {
        self.entries.clear();
        self.values.clear();
        self.stack = ChainEnds::new();
        self.queue = ChainEnds::new();
        self.lir_count = 0;
    }

    /// Renders the full cache state as text: capacity block, stack S,
    /// queue Q and resident contents.
    ///
    /// Diagnostic output; the exact layout is not a stability guarantee.
    pub fn dump(&self) -> String
    where
        K: fmt::Display,
        V: fmt::Display,
    {
        let mut out = String::new();

        let _ = writeln!(out, "================== LIRS Cache State ==================");
        let _ = writeln!(out);
        let _ = writeln!(out, "[Capacity]");
        let _ = writeln!(
            out,
            "  Total: {} | LIR: {} | HIR: {}",
            self.capacity, self.lir_capacity, self.hir_capacity
        );
        let _ = writeln!(
            out,
            "  LIR count: {} | Cache size: {}",
            self.lir_count,
            self.values.len()
        );
        let _ = writeln!(out);

        let _ = writeln!(out, "[Stack S - LIRS Stack] (top -> bottom)");
        if self.stack.is_empty() {
            let _ = writeln!(out, "  (empty)");
        } else {
            for (key, classification) in self.iter_stack() {
                let label = match classification {
                    Classification::Lir => "LIR",
                    Classification::HirResident => "HIR-resident",
                    Classification::HirGhost => "HIR-non-resident (ghost)",
                };
                let _ = writeln!(out, "  [{key}] {label}");
            }
        }
        let _ = writeln!(out);

        let _ = writeln!(out, "[Queue Q - HIR Resident] (top -> bottom)");
        if self.queue.is_empty() {
            let _ = writeln!(out, "  (empty)");
        } else {
            for key in self.iter_queue() {
                let _ = writeln!(out, "  [{key}]");
            }
        }
        let _ = writeln!(out);

        let _ = writeln!(out, "[Cache Contents]");
        if self.values.is_empty() {
            let _ = writeln!(out, "  (empty)");
        } else {
            for (key, value, classification) in self.iter_resident() {
                let tag = match classification {
                    Classification::Lir => "[LIR]",
                    _ => "[HIR]",
                };
                let _ = writeln!(out, "  {{{key}: {value}}} {tag}");
            }
        }
        let _ = writeln!(out, "======================================================");

        out
    }

    /// Validates the engine's internal invariants, returning a description
    /// of the first violation found.
    ///
    /// Intended for tests and debugging; it walks every entry and both
    /// chains and is O(n).
    pub fn check_invariants(&self) -> Result<(), InvariantError> {
        if self.values.len() > self.capacity {
            return Err(InvariantError::new(format!(
                "resident count {} exceeds capacity {}",
                self.values.len(),
                self.capacity
            )));
        }
        if self.lir_count > self.lir_capacity {
            return Err(InvariantError::new(format!(
                "lir_count {} exceeds lir_capacity {}",
                self.lir_count, self.lir_capacity
            )));
        }

        let mut lir_seen = 0usize;
        let mut resident_seen = 0usize;
        let mut stack_members = 0usize;
        let mut queue_members = 0usize;

        for (key, entry) in &self.entries {
            if entry.lir {
                lir_seen += 1;
            }
            if entry.resident {
                resident_seen += 1;
            }
            if entry.stack.is_some() {
                stack_members += 1;
            }
            if entry.queue.is_some() {
                queue_members += 1;
            }

            if entry.resident != self.values.contains(key) {
                return Err(InvariantError::new(
                    "residency flag disagrees with the value store",
                ));
            }
            if entry.stack.is_none() && entry.queue.is_none() {
                return Err(InvariantError::new(
                    "entry threaded on neither stack nor queue",
                ));
            }
            if entry.lir && (!entry.resident || entry.stack.is_none()) {
                return Err(InvariantError::new("LIR entry must be resident and in S"));
            }
            if entry.lir && entry.queue.is_some() {
                return Err(InvariantError::new("LIR entry must not be queued"));
            }
            if !entry.resident && (entry.stack.is_none() || entry.queue.is_some()) {
                return Err(InvariantError::new("ghost must live in S and only in S"));
            }
            if entry.queue.is_some() && !entry.resident {
                return Err(InvariantError::new("queued entry must be resident"));
            }
        }

        if lir_seen != self.lir_count {
            return Err(InvariantError::new(format!(
                "lir_count {} but {} LIR entries recorded",
                self.lir_count, lir_seen
            )));
        }
        if resident_seen != self.values.len() {
            return Err(InvariantError::new(
                "resident entry count disagrees with the value store",
            ));
        }
        if stack_members != self.stack.len {
            return Err(InvariantError::new("stack length mismatch"));
        }
        if queue_members != self.queue.len {
            return Err(InvariantError::new("queue length mismatch"));
        }

        self.check_chain(Chain::Stack)?;
        self.check_chain(Chain::Queue)?;

        if self.lir_count > 0 {
            match self.stack.bottom.as_ref() {
                Some(bottom) => {
                    if !self.entries.get(bottom).is_some_and(|e| e.lir) {
                        return Err(InvariantError::new("stack bottom is not LIR"));
                    }
                },
                None => {
                    return Err(InvariantError::new("LIR entries exist but stack is empty"));
                },
            }
        }

        Ok(())
    }

    /// Walks one chain top to bottom, checking that every link pair is
    /// mutual and the header matches what the walk finds.
    fn check_chain(&self, chain: Chain) -> Result<(), InvariantError> {
        let ends = self.ends(chain);
        let mut walked = 0usize;
        let mut previous: Option<&K> = None;
        let mut cursor = ends.top.as_ref();

        while let Some(key) = cursor {
            let Some(links) = self
                .entries
                .get(key)
                .and_then(|entry| entry.links(chain).as_ref())
            else {
                return Err(InvariantError::new("chained key has no link record"));
            };
            if links.above.as_ref() != previous {
                return Err(InvariantError::new("chain upward link mismatch"));
            }
            walked += 1;
            if walked > ends.len {
                return Err(InvariantError::new("chain walk exceeds recorded length"));
            }
            previous = Some(key);
            cursor = links.below.as_ref();
        }

        if walked != ends.len {
            return Err(InvariantError::new("chain length counter mismatch"));
        }
        if ends.bottom.as_ref() != previous {
            return Err(InvariantError::new("chain bottom does not end the walk"));
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Access cases
    // -----------------------------------------------------------------------

    /// Resident LIR reference: hoist to the top of S, pruning when the
    /// reference came from the bottom.
    fn touch_lir(&mut self, key: &K) {
        let was_bottom = self.stack.bottom.as_ref() == Some(key);
        self.hoist(Chain::Stack, key);
        if was_bottom {
            self.prune();
        }
    }

    /// Resident HIR reference: promote if the key is still in S, otherwise
    /// refresh its position in both sequences.
    fn touch_hir_resident(&mut self, key: &K) {
        let on_stack = self.entries.get(key).is_some_and(|e| e.stack.is_some());
        if on_stack {
            // Reused while still on the stack: the reuse distance is short
            // enough to join the LIR set.
            self.promote(key);
        } else {
            self.thread_on_top(Chain::Stack, key);
            self.hoist(Chain::Queue, key);
        }
    }

    /// HIR → LIR transition. Order matters: reclassify, hoist in S, leave
    /// Q, demote the bottom LIR, prune.
    fn promote(&mut self, key: &K) {
        match self.entries.get_mut(key) {
            Some(entry) => entry.lir = true,
            None => return,
        }
        self.lir_count += 1;

        self.hoist(Chain::Stack, key);
        self.unthread(Chain::Queue, key);

        self.demote_bottom_lir();
        self.prune();
    }

    // -----------------------------------------------------------------------
    // Reorganisation routines
    // -----------------------------------------------------------------------

    /// Pairs with a promotion: the LIR key at the bottom of S loses its
    /// status, leaves S, and joins the top of Q.
    fn demote_bottom_lir(&mut self) {
        let Some(bottom) = self.stack.bottom.clone() else {
            return;
        };
        if !self.entries.get(&bottom).is_some_and(|e| e.lir) {
            return;
        }

        self.unthread(Chain::Stack, &bottom);
        self.thread_on_top(Chain::Queue, &bottom);
        if let Some(entry) = self.entries.get_mut(&bottom) {
            entry.lir = false;
        }
        self.lir_count -= 1;
    }

    /// Peels HIR keys off the bottom of S until an LIR key surfaces,
    /// deleting the record of every ghost popped along the way.
    fn prune(&mut self) {
        loop {
            let Some(bottom) = self.stack.bottom.clone() else {
                return;
            };
            let (lir, resident) = match self.entries.get(&bottom) {
                Some(entry) => (entry.lir, entry.resident),
                None => return,
            };
            if lir {
                return;
            }

            // Unthreading clears the stack membership in the same step; a
            // resident HIR key simply falls off S, a ghost dies entirely.
            self.unthread(Chain::Stack, &bottom);
            if !resident {
                self.entries.remove(&bottom);
            }
        }
    }

    /// Frees one resident slot by evicting the bottom of Q. The victim
    /// becomes a ghost if its metadata is still in S, otherwise its record
    /// is dropped entirely. No-op while Q is empty.
    fn evict_hir(&mut self) {
        let Some(victim) = self.unthread_bottom(Chain::Queue) else {
            return;
        };

        let _ = self.values.evict(&victim);

        let drop_record = match self.entries.get_mut(&victim) {
            Some(entry) => {
                entry.resident = false;
                entry.stack.is_none()
            },
            None => false,
        };
        if drop_record {
            self.entries.remove(&victim);
        }
    }

    // -----------------------------------------------------------------------
    // Admission paths
    // -----------------------------------------------------------------------

    /// First-ever insertion of `key`.
    fn admit(&mut self, key: K, value: V) {
        if self.lir_count < self.lir_capacity {
            // Warm-up: admissions fill the LIR set and nothing is evicted.
            let previous = self
                .values
                .try_insert(key.clone(), value)
                .expect("warm-up admission cannot exceed capacity");
            debug_assert!(previous.is_none());
            self.entries.insert(
                key.clone(),
                Entry {
                    lir: true,
                    resident: true,
                    stack: None,
                    queue: None,
                },
            );
            self.thread_on_top(Chain::Stack, &key);
            self.lir_count += 1;
            return;
        }

        self.evict_hir();
        let previous = self
            .values
            .try_insert(key.clone(), value)
            .expect("eviction freed a resident slot");
        debug_assert!(previous.is_none());
        self.entries.insert(
            key.clone(),
            Entry {
                lir: false,
                resident: true,
                stack: None,
                queue: None,
            },
        );
        self.thread_on_top(Chain::Stack, &key);
        self.thread_on_top(Chain::Queue, &key);
    }

    /// Insertion of a key whose ghost record is still tracked.
    fn revive(&mut self, key: K, value: V) {
        self.evict_hir();
        let previous = self
            .values
            .try_insert(key.clone(), value)
            .expect("eviction freed a resident slot");
        debug_assert!(previous.is_none());

        let on_stack = match self.entries.get_mut(&key) {
            Some(entry) => {
                entry.resident = true;
                entry.stack.is_some()
            },
            None => false,
        };

        if on_stack {
            // Ghost hit: the reference interval fits in the stack, so the
            // key comes back straight into the LIR set.
            self.promote(&key);
        } else {
            // Record outlived its stack position; treat like a fresh HIR
            // admission.
            self.thread_on_top(Chain::Stack, &key);
            self.thread_on_top(Chain::Queue, &key);
        }
    }

    // -----------------------------------------------------------------------
    // Chain threading
    // -----------------------------------------------------------------------

    fn ends(&self, chain: Chain) -> &ChainEnds<K> {
        match chain {
            Chain::Stack => &self.stack,
            Chain::Queue => &self.queue,
        }
    }

    fn ends_mut(&mut self, chain: Chain) -> &mut ChainEnds<K> {
        match chain {
            Chain::Stack => &mut self.stack,
            Chain::Queue => &mut self.queue,
        }
    }

    fn chain_iter(&self, chain: Chain) -> ChainIter<'_, K, V> {
        ChainIter {
            cache: self,
            chain,
            cursor: self.ends(chain).top.as_ref(),
        }
    }

    /// Threads `key` above the current top of `chain`. The entry must
    /// exist and must not already be on the chain.
    fn thread_on_top(&mut self, chain: Chain, key: &K) {
        let old_top = self.ends(chain).top.clone();

        if let Some(entry) = self.entries.get_mut(key) {
            *entry.links_mut(chain) = Some(ChainLinks {
                above: None,
                below: old_top.clone(),
            });
        }

        match &old_top {
            Some(neighbour) => {
                if let Some(entry) = self.entries.get_mut(neighbour) {
                    if let Some(links) = entry.links_mut(chain).as_mut() {
                        links.above = Some(key.clone());
                    }
                }
            },
            None => self.ends_mut(chain).bottom = Some(key.clone()),
        }

        let ends = self.ends_mut(chain);
        ends.top = Some(key.clone());
        ends.len += 1;
    }

    /// Unthreads `key` from `chain`, stitching its neighbours together.
    /// Clearing the links is what clears the membership flag. Returns
    /// `false` if the key was not on the chain.
    fn unthread(&mut self, chain: Chain, key: &K) -> bool {
        let links = match self
            .entries
            .get_mut(key)
            .and_then(|entry| entry.links_mut(chain).take())
        {
            Some(links) => links,
            None => return false,
        };

        match &links.above {
            Some(above) => {
                if let Some(entry) = self.entries.get_mut(above) {
                    if let Some(neighbour) = entry.links_mut(chain).as_mut() {
                        neighbour.below = links.below.clone();
                    }
                }
            },
            None => self.ends_mut(chain).top = links.below.clone(),
        }
        match &links.below {
            Some(below) => {
                if let Some(entry) = self.entries.get_mut(below) {
                    if let Some(neighbour) = entry.links_mut(chain).as_mut() {
                        neighbour.above = links.above.clone();
                    }
                }
            },
            None => self.ends_mut(chain).bottom = links.above.clone(),
        }

        self.ends_mut(chain).len -= 1;
        true
    }

    /// Re-threads `key` at the top of `chain`; no-op if it is already the
    /// top or not on the chain at all.
    fn hoist(&mut self, chain: Chain, key: &K) {
        if self.ends(chain).top.as_ref() == Some(key) {
            return;
        }
        if self.unthread(chain, key) {
            self.thread_on_top(chain, key);
        }
    }

    /// Unthreads and returns the bottom key of `chain`, if any.
    fn unthread_bottom(&mut self, chain: Chain) -> Option<K> {
        let bottom = self.ends(chain).bottom.clone()?;
        self.unthread(chain, &bottom);
        Some(bottom)
    }
}

/// Top-to-bottom walk of one chain, hopping through the entry table.
struct ChainIter<'a, K, V>
where
    K: Clone + Eq + Hash,
{
    cache: &'a LirsCache<K, V>,
    chain: Chain,
    cursor: Option<&'a K>,
}

impl<'a, K, V> Iterator for ChainIter<'a, K, V>
where
    K: Clone + Eq + Hash,
{
    type Item = &'a K;

    fn next(&mut self) -> Option<Self::Item> {
        let key = self.cursor?;
        self.cursor = self
            .cache
            .entries
            .get(key)
            .and_then(|entry| entry.links(self.chain).as_ref())
            .and_then(|links| links.below.as_ref());
        Some(key)
    }
}

impl<K, V> ReadOnlyCache<K, V> for LirsCache<K, V>
where
    K: Clone + Eq + Hash,
{
    fn contains(&self, key: &K) -> bool {
        LirsCache::contains(self, key)
    }

    fn len(&self) -> usize {
        LirsCache::len(self)
    }

    fn capacity(&self) -> usize {
        LirsCache::capacity(self)
    }
}

impl<K, V> CoreCache<K, V> for LirsCache<K, V>
where
    K: Clone + Eq + Hash,
{
    fn insert(&mut self, key: K, value: V) -> Option<V> {
        LirsCache::insert(self, key, value)
    }

    fn get(&mut self, key: &K) -> Option<&V> {
        LirsCache::get(self, key)
    }

    fn clear(&mut self) {
        LirsCache::clear(self)
    }
}

impl<K, V> fmt::Debug for LirsCache<K, V>
where
    K: Clone + Eq + Hash,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LirsCache")
            .field("len", &self.len())
            .field("capacity", &self.capacity)
            .field("lir_capacity", &self.lir_capacity)
            .field("hir_capacity", &self.hir_capacity)
            .field("lir_count", &self.lir_count)
            .field("stack_len", &self.stack.len)
            .field("queue_len", &self.queue.len)
            .field("ghosts", &self.ghost_count())
            .finish()
    }
}

/// Thread-safe wrapper around [`LirsCache`] using a `parking_lot::RwLock`.
///
/// The engine itself stays single-threaded; this type is the "callers
/// serialise externally" contract packaged. Every access routine mutates
/// bookkeeping, so `get_with` takes the write lock; only pure queries use
/// the read lock.
#[derive(Debug)]
pub struct ConcurrentLirsCache<K, V>
where
    K: Clone + Eq + Hash,
{
    inner: RwLock<LirsCache<K, V>>,
}

impl<K, V> ConcurrentLirsCache<K, V>
where
    K: Clone + Eq + Hash,
{
    /// Creates a wrapped cache with the default HIR ratio.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: RwLock::new(LirsCache::new(capacity)),
        }
    }

    /// Fallible constructor with the default HIR ratio.
    pub fn try_new(capacity: usize) -> Result<Self, ConfigError> {
        LirsCache::try_new(capacity).map(|cache| Self {
            inner: RwLock::new(cache),
        })
    }

    /// Fallible constructor with an explicit HIR ratio.
    pub fn try_with_hir_ratio(capacity: usize, hir_ratio: f64) -> Result<Self, ConfigError> {
        LirsCache::try_with_hir_ratio(capacity, hir_ratio).map(|cache| Self {
            inner: RwLock::new(cache),
        })
    }

    /// Inserts or overwrites a key, returning the previous resident value.
    pub fn insert(&self, key: K, value: V) -> Option<V> {
        self.inner.write().insert(key, value)
    }

    /// Runs `f` on the value for `key` if resident, counting an access.
    pub fn get_with<R>(&self, key: &K, f: impl FnOnce(&V) -> R) -> Option<R> {
        self.inner.write().get(key).map(f)
    }

    /// Runs `f` on the value for `key` if resident, without counting an
    /// access.
    pub fn peek_with<R>(&self, key: &K, f: impl FnOnce(&V) -> R) -> Option<R> {
        self.inner.read().peek(key).map(f)
    }

    /// Returns `true` if a value is resident for `key`.
    pub fn contains(&self, key: &K) -> bool {
        self.inner.read().contains(key)
    }

    /// Returns the number of resident entries.
    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    /// Returns `true` if no entries are resident.
    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }

    /// Returns the configured total capacity.
    pub fn capacity(&self) -> usize {
        self.inner.read().capacity()
    }

    /// Returns the number of keys currently classified LIR.
    pub fn lir_count(&self) -> usize {
        self.inner.read().lir_count()
    }

    /// Removes every entry and returns to the warm-up regime.
    pub fn clear(&self) {
        self.inner.write().clear()
    }
}
