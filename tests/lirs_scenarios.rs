// ==============================================
// LIRS END-TO-END SCENARIOS (integration)
// ==============================================
//
// Walks the cache through the canonical LIRS lifecycle (warm-up, first
// HIR admission, eviction, pruning, ghost revival) asserting the exact
// stack/queue shapes after each step, plus the behavioural laws the
// policy guarantees (silent ghost misses, idempotent overwrites,
// queue-bottom victim selection).

use lirskit::policy::lirs::{Classification, LirsCache};
use lirskit::prelude::ConfigError;

/// capacity=5, hir_ratio=0.2 → LIR capacity 4, HIR capacity 1.
fn cache_5_02() -> LirsCache<i32, String> {
    LirsCache::try_with_hir_ratio(5, 0.2).unwrap()
}

fn put(cache: &mut LirsCache<i32, String>, key: i32, value: &str) {
    cache.insert(key, value.to_string());
}

fn stack_keys(cache: &LirsCache<i32, String>) -> Vec<i32> {
    cache.iter_stack().map(|(k, _)| *k).collect()
}

fn queue_keys(cache: &LirsCache<i32, String>) -> Vec<i32> {
    cache.iter_queue().copied().collect()
}

fn classification_of(cache: &LirsCache<i32, String>, key: i32) -> Option<Classification> {
    cache.iter_stack().find(|(k, _)| **k == key).map(|(_, c)| c)
}

// ==============================================
// Warm-up fills the LIR set
// ==============================================

#[test]
fn warm_up_admissions_all_become_lir() {
    let mut cache = cache_5_02();
    put(&mut cache, 1, "A");
    put(&mut cache, 2, "B");
    put(&mut cache, 3, "C");
    put(&mut cache, 4, "D");

    assert_eq!(cache.len(), 4);
    assert_eq!(cache.lir_count(), 4);
    assert!(queue_keys(&cache).is_empty());
    assert_eq!(stack_keys(&cache), vec![4, 3, 2, 1]);
    for key in 1..=4 {
        assert_eq!(classification_of(&cache, key), Some(Classification::Lir));
    }
    cache.check_invariants().unwrap();
}

// ==============================================
// First HIR admission and immediate eviction
// ==============================================

#[test]
fn first_hir_admission_then_eviction_leaves_a_ghost() {
    let mut cache = cache_5_02();
    for (k, v) in [(1, "A"), (2, "B"), (3, "C"), (4, "D")] {
        put(&mut cache, k, v);
    }

    put(&mut cache, 5, "E");
    assert_eq!(cache.len(), 5);
    assert_eq!(stack_keys(&cache), vec![5, 4, 3, 2, 1]);
    assert_eq!(
        classification_of(&cache, 5),
        Some(Classification::HirResident)
    );
    assert_eq!(queue_keys(&cache), vec![5]);

    put(&mut cache, 6, "F");
    assert_eq!(cache.len(), 5);
    assert_eq!(cache.get(&5), None);
    assert_eq!(queue_keys(&cache), vec![6]);
    assert_eq!(stack_keys(&cache), vec![6, 5, 4, 3, 2, 1]);
    assert_eq!(classification_of(&cache, 5), Some(Classification::HirGhost));
    assert_eq!(*stack_keys(&cache).last().unwrap(), 1, "stack still ends at an LIR key");
    cache.check_invariants().unwrap();
}

// ==============================================
// Resident LIR access and stack pruning
// ==============================================

#[test]
fn lir_access_hoists_and_bottom_access_prunes() {
    let mut cache = cache_5_02();
    for (k, v) in [(1, "A"), (2, "B"), (3, "C"), (4, "D"), (5, "E"), (6, "F")] {
        put(&mut cache, k, v);
    }

    // Mid-stack LIR hit: hoisted to the top, nothing pruned.
    assert_eq!(cache.get(&4), Some(&"D".to_string()));
    assert_eq!(stack_keys(&cache), vec![4, 6, 5, 3, 2, 1]);

    // Bottom LIR hit: hoisted, then pruning restores an LIR bottom. The
    // new bottom (2) is already LIR so the ghost of 5 higher up survives.
    assert_eq!(cache.get(&1), Some(&"A".to_string()));
    assert_eq!(stack_keys(&cache), vec![1, 4, 6, 5, 3, 2]);
    assert_eq!(classification_of(&cache, 2), Some(Classification::Lir));
    assert_eq!(cache.lir_count(), 4);
    assert_eq!(cache.len(), 5);
    cache.check_invariants().unwrap();
}

// ==============================================
// Ghost hit promotes to LIR
// ==============================================

#[test]
fn ghost_revival_promotes_and_demotes_one_lir() {
    let mut cache = cache_5_02();
    for (k, v) in [(1, "A"), (2, "B"), (3, "C"), (4, "D"), (5, "E"), (6, "F")] {
        put(&mut cache, k, v);
    }
    assert_eq!(classification_of(&cache, 5), Some(Classification::HirGhost));

    // Reloading the ghost evicts the HIR victim (6), revives 5 directly
    // as LIR, and demotes the bottom LIR (1) into the queue.
    put(&mut cache, 5, "E2");
    assert_eq!(cache.get(&5), Some(&"E2".to_string()));
    assert_eq!(cache.lir_count(), 4);
    assert_eq!(cache.len(), 5);
    assert_eq!(classification_of(&cache, 5), Some(Classification::Lir));
    assert!(!cache.contains(&6));
    assert_eq!(queue_keys(&cache), vec![1]);
    cache.check_invariants().unwrap();
}

// ==============================================
// Loop larger than the cache (the LIRS advantage)
// ==============================================

#[test]
fn loop_workload_keeps_a_stable_hit_rate() {
    // capacity=3, hir_ratio≈0.34 → LIR capacity 2, HIR capacity 1.
    let mut cache: LirsCache<i32, String> = LirsCache::try_with_hir_ratio(3, 0.34).unwrap();
    let loop_keys = [1, 2, 3, 4];
    for key in loop_keys {
        cache.insert(key, format!("v{key}"));
    }

    let mut hits = 0usize;
    let mut lookups = 0usize;
    let rounds = 100;
    for _ in 0..rounds {
        for key in loop_keys {
            lookups += 1;
            if cache.get(&key).is_some() {
                hits += 1;
            } else {
                // Model a caller reloading on miss.
                cache.insert(key, format!("v{key}"));
            }
        }
        cache.check_invariants().unwrap();
        // The two low-IRR keys hit on every single round.
        assert!(cache.contains(&1));
        assert!(cache.contains(&2));
    }

    // Strict LRU scores zero hits on a loop one larger than the cache;
    // LIRS pins the reused half of the loop.
    let hit_rate = hits as f64 / lookups as f64;
    assert!(
        hit_rate >= 0.45,
        "expected a stable non-zero hit rate, got {hit_rate:.2}"
    );
}

// ==============================================
// Construction rejection
// ==============================================

#[test]
fn construction_rejects_invalid_parameters() {
    assert_eq!(
        LirsCache::<i32, i32>::try_new(0).unwrap_err(),
        ConfigError::ZeroCapacity
    );
    for ratio in [0.0, 1.0, -0.1, 1.5] {
        let err = LirsCache::<i32, i32>::try_with_hir_ratio(5, ratio).unwrap_err();
        assert_eq!(err, ConfigError::HirRatioOutOfRange(ratio));
    }
}

// ==============================================
// Behavioural laws
// ==============================================

#[test]
fn law_unknown_get_changes_nothing() {
    let mut cache = cache_5_02();
    for (k, v) in [(1, "A"), (2, "B"), (3, "C")] {
        put(&mut cache, k, v);
    }

    let before = cache.dump();
    assert_eq!(cache.get(&42), None);
    assert_eq!(cache.dump(), before);
    assert_eq!(cache.len(), 3);
}

#[test]
fn law_ghost_get_is_absent_without_reordering() {
    let mut cache = cache_5_02();
    for (k, v) in [(1, "A"), (2, "B"), (3, "C"), (4, "D"), (5, "E"), (6, "F")] {
        put(&mut cache, k, v);
    }
    assert_eq!(classification_of(&cache, 5), Some(Classification::HirGhost));

    let before = cache.dump();
    assert_eq!(cache.get(&5), None);
    assert_eq!(cache.dump(), before);
}

#[test]
fn law_successive_puts_collapse_for_settled_keys() {
    // A second put is an access like any other, so the collapse only holds
    // for keys whose classification the extra access cannot change:
    // resident LIR keys, and warm-up admissions. A second put on a freshly
    // admitted steady-state HIR key promotes it instead.
    let mut twice = cache_5_02();
    let mut once = cache_5_02();
    for (k, v) in [(1, "A"), (2, "B"), (3, "C"), (4, "D"), (5, "E"), (6, "F")] {
        put(&mut twice, k, v);
        put(&mut once, k, v);
    }

    // LIR-resident key: the second put finds it already on top of S.
    put(&mut twice, 4, "first");
    put(&mut twice, 4, "second");
    put(&mut once, 4, "second");

    assert_eq!(twice.dump(), once.dump());
    assert_eq!(twice.get(&4), Some(&"second".to_string()));

    // Warm-up admission: same collapse on fresh caches.
    let mut warm_twice = cache_5_02();
    let mut warm_once = cache_5_02();
    put(&mut warm_twice, 1, "v1");
    put(&mut warm_twice, 1, "v2");
    put(&mut warm_once, 1, "v2");
    assert_eq!(warm_twice.dump(), warm_once.dump());
}

#[test]
fn law_full_insert_evicts_exactly_the_queue_bottom() {
    let mut cache = cache_5_02();
    for (k, v) in [(1, "A"), (2, "B"), (3, "C"), (4, "D"), (5, "E")] {
        put(&mut cache, k, v);
    }
    assert_eq!(cache.len(), cache.capacity());
    let victim = *queue_keys(&cache).last().unwrap();
    let resident_before: Vec<i32> = (1..=6).filter(|k| cache.contains(k)).collect();

    put(&mut cache, 7, "G");

    let resident_after: Vec<i32> = (1..=7).filter(|k| cache.contains(k)).collect();
    assert_eq!(cache.len(), cache.capacity());
    assert!(!cache.contains(&victim));
    assert!(cache.contains(&7));
    // Exactly one resident key changed: victim out, new key in.
    let lost: Vec<i32> = resident_before
        .iter()
        .copied()
        .filter(|k| !resident_after.contains(k))
        .collect();
    assert_eq!(lost, vec![victim]);
    cache.check_invariants().unwrap();
}
