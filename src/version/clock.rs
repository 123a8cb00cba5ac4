use crate::membership::types::NodeId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Upper bound on clock entries. A key written by more coordinators than this
/// has its least-advanced entry pruned; pruning can only turn a real ordering
/// into apparent concurrency, never the reverse, so siblings surface instead
/// of silent data loss.
pub const MAX_CLOCK_ENTRIES: usize = 16;

/// Causal relation between two vector clocks, from the perspective of `self`
/// in `self.compare(other)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Causality {
    /// Identical component-wise.
    Equal,
    /// `self` dominates `other`: every component >= and at least one >.
    Descendant,
    /// `other` dominates `self`.
    Ancestor,
    /// Neither dominates; the versions conflict.
    Concurrent,
}

/// Per-node write counters attached to every stored version.
///
/// Kept as a sorted map so serialization and digests are deterministic across
/// nodes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VectorClock {
    entries: BTreeMap<NodeId, u64>,
}

impl VectorClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, node: &NodeId) -> u64 {
        self.entries.get(node).copied().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Bump `node`'s counter by one. Called exactly once per accepted write
    /// by the coordinating node.
    pub fn increment(&mut self, node: &NodeId) {
        if !self.entries.contains_key(node) && self.entries.len() >= MAX_CLOCK_ENTRIES {
            self.prune_smallest();
        }
        *self.entries.entry(node.clone()).or_insert(0) += 1;
    }

    /// Component-wise maximum of the two clocks.
    pub fn merge(&self, other: &VectorClock) -> VectorClock {
        let mut merged = self.entries.clone();
        for (node, &counter) in &other.entries {
            let entry = merged.entry(node.clone()).or_insert(0);
            if counter > *entry {
                *entry = counter;
            }
        }
        VectorClock { entries: merged }
    }

    /// Causal comparison. `Descendant` means `self` has seen everything
    /// `other` has, and more.
    pub fn compare(&self, other: &VectorClock) -> Causality {
        let mut self_greater = false;
        let mut other_greater = false;

        for (node, &counter) in &self.entries {
            match counter.cmp(&other.get(node)) {
                std::cmp::Ordering::Greater => self_greater = true,
                std::cmp::Ordering::Less => other_greater = true,
                std::cmp::Ordering::Equal => {}
            }
        }
        for (node, &counter) in &other.entries {
            if counter > self.get(node) {
                other_greater = true;
            }
        }

        match (self_greater, other_greater) {
            (false, false) => Causality::Equal,
            (true, false) => Causality::Descendant,
            (false, true) => Causality::Ancestor,
            (true, true) => Causality::Concurrent,
        }
    }

    /// Stable hash of the clock, used in Merkle leaves and store scans.
    pub fn digest(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        for (node, counter) in &self.entries {
            node.0.hash(&mut hasher);
            counter.hash(&mut hasher);
        }
        hasher.finish()
    }

    fn prune_smallest(&mut self) {
        if let Some(victim) = self
            .entries
            .iter()
            .min_by_key(|&(_, &counter)| counter)
            .map(|(node, _)| node.clone())
        {
            tracing::debug!("vector clock full, pruning entry for {:?}", victim);
            self.entries.remove(&victim);
        }
    }

    #[cfg(test)]
    pub fn from_entries(entries: &[(&str, u64)]) -> Self {
        Self {
            entries: entries
                .iter()
                .map(|(id, c)| (NodeId(id.to_string()), *c))
                .collect(),
        }
    }
}
