//! Versioning Engine Tests
//!
//! Validates causal comparison, merging and conflict resolution.
//!
//! ## Test Scopes
//! - **Clock algebra**: compare/merge/increment behavior, entry pruning.
//! - **Resolution**: dominated-version filtering, sibling preservation,
//!   last-write-wins tie-breaking.

#[cfg(test)]
mod tests {
    use crate::membership::types::NodeId;
    use crate::version::clock::{Causality, MAX_CLOCK_ENTRIES, VectorClock};
    use crate::version::record::VersionedRecord;
    use crate::version::resolve::{last_write_wins, resolve};

    fn vc(entries: &[(&str, u64)]) -> VectorClock {
        VectorClock::from_entries(entries)
    }

    fn record(value: &[u8], entries: &[(&str, u64)]) -> VersionedRecord {
        VersionedRecord::new(value.to_vec(), vc(entries))
    }

    // ============================================================
    // CLOCK COMPARISON
    // ============================================================

    #[test]
    fn test_equal_clocks() {
        let a = vc(&[("a", 1), ("b", 2)]);
        let b = vc(&[("a", 1), ("b", 2)]);
        assert_eq!(a.compare(&b), Causality::Equal);
    }

    #[test]
    fn test_descendant_dominates() {
        let newer = vc(&[("a", 2), ("b", 2)]);
        let older = vc(&[("a", 1), ("b", 2)]);
        assert_eq!(newer.compare(&older), Causality::Descendant);
        assert_eq!(older.compare(&newer), Causality::Ancestor);
    }

    #[test]
    fn test_missing_entry_counts_as_zero() {
        let wide = vc(&[("a", 1), ("b", 1)]);
        let narrow = vc(&[("a", 1)]);
        assert_eq!(wide.compare(&narrow), Causality::Descendant);
        assert_eq!(narrow.compare(&wide), Causality::Ancestor);
    }

    #[test]
    fn test_independent_writes_are_concurrent() {
        // Two coordinators, neither aware of the other's clock.
        let from_a = vc(&[("a", 1)]);
        let from_b = vc(&[("b", 1)]);
        assert_eq!(from_a.compare(&from_b), Causality::Concurrent);
        assert_eq!(from_b.compare(&from_a), Causality::Concurrent);
    }

    #[test]
    fn test_empty_clock_is_ancestor_of_everything() {
        let empty = VectorClock::new();
        let written = vc(&[("a", 1)]);
        assert_eq!(empty.compare(&written), Causality::Ancestor);
        assert_eq!(empty.compare(&VectorClock::new()), Causality::Equal);
    }

    // ============================================================
    // MERGE & INCREMENT
    // ============================================================

    #[test]
    fn test_merge_takes_componentwise_max() {
        let a = vc(&[("a", 3), ("b", 1)]);
        let b = vc(&[("a", 1), ("b", 4), ("c", 2)]);
        let merged = a.merge(&b);
        assert_eq!(merged, vc(&[("a", 3), ("b", 4), ("c", 2)]));
    }

    #[test]
    fn test_merged_clock_dominates_both_inputs_after_increment() {
        // The sibling write-back pattern: merge all siblings, then increment.
        let sibling_a = vc(&[("a", 1)]);
        let sibling_b = vc(&[("b", 1)]);
        let mut merged = sibling_a.merge(&sibling_b);
        merged.increment(&NodeId("c".to_string()));
        assert_eq!(merged.compare(&sibling_a), Causality::Descendant);
        assert_eq!(merged.compare(&sibling_b), Causality::Descendant);
    }

    #[test]
    fn test_increment_bumps_once() {
        let node = NodeId("a".to_string());
        let mut clock = VectorClock::new();
        clock.increment(&node);
        assert_eq!(clock.get(&node), 1);
        clock.increment(&node);
        assert_eq!(clock.get(&node), 2);
    }

    #[test]
    fn test_clock_growth_is_bounded() {
        let mut clock = VectorClock::new();
        for i in 0..(MAX_CLOCK_ENTRIES + 8) {
            clock.increment(&NodeId(format!("node-{}", i)));
        }
        assert!(clock.len() <= MAX_CLOCK_ENTRIES);
        // The most recent contributor must have survived pruning.
        let last = NodeId(format!("node-{}", MAX_CLOCK_ENTRIES + 7));
        assert_eq!(clock.get(&last), 1);
    }

    #[test]
    fn test_digest_is_stable_and_discriminating() {
        let a = vc(&[("a", 1), ("b", 2)]);
        let b = vc(&[("a", 1), ("b", 2)]);
        let c = vc(&[("a", 1), ("b", 3)]);
        assert_eq!(a.digest(), b.digest());
        assert_ne!(a.digest(), c.digest());
    }

    // ============================================================
    // RESOLUTION
    // ============================================================

    #[test]
    fn test_resolve_filters_dominated() {
        let versions = vec![record(b"old", &[("a", 1)]), record(b"new", &[("a", 2)])];
        let frontier = resolve(versions);
        assert_eq!(frontier.len(), 1);
        assert_eq!(frontier[0].value, b"new");
    }

    #[test]
    fn test_resolve_keeps_concurrent_siblings() {
        let versions = vec![
            record(b"x", &[("a", 2), ("b", 1)]),
            record(b"y", &[("a", 1), ("b", 2)]),
        ];
        let frontier = resolve(versions);
        assert_eq!(frontier.len(), 2, "concurrent versions must both survive");
    }

    #[test]
    fn test_resolve_deduplicates_equal_versions() {
        let versions = vec![
            record(b"same", &[("a", 1)]),
            record(b"same", &[("a", 1)]),
            record(b"same", &[("a", 1)]),
        ];
        assert_eq!(resolve(versions).len(), 1);
    }

    #[test]
    fn test_resolve_mixed_frontier() {
        // One stale version plus two concurrent branches.
        let versions = vec![
            record(b"stale", &[("a", 1)]),
            record(b"branch1", &[("a", 2), ("b", 1)]),
            record(b"branch2", &[("a", 1), ("b", 2)]),
        ];
        let frontier = resolve(versions);
        assert_eq!(frontier.len(), 2);
        assert!(!frontier.iter().any(|v| v.value == b"stale"));
    }

    #[test]
    fn test_last_write_wins_picks_later_timestamp() {
        let mut early = record(b"early", &[("a", 1)]);
        let mut late = record(b"late", &[("b", 1)]);
        early.timestamp_ms = 1_000;
        late.timestamp_ms = 2_000;

        let winner = last_write_wins(vec![early, late]).unwrap();
        assert_eq!(winner.value, b"late");
    }

    #[test]
    fn test_last_write_wins_tie_break_is_deterministic() {
        let mut a = record(b"a", &[("a", 1)]);
        let mut b = record(b"b", &[("b", 1)]);
        a.timestamp_ms = 1_000;
        b.timestamp_ms = 1_000;

        let first = last_write_wins(vec![a.clone(), b.clone()]).unwrap();
        let second = last_write_wins(vec![b, a]).unwrap();
        assert_eq!(first, second, "order of input must not change the winner");
    }
}
