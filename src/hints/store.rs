use crate::membership::types::NodeId;
use crate::version::record::{VersionedRecord, now_ms};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};

/// A write buffered on behalf of an unreachable replica.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Hint {
    /// The replica that was supposed to receive this write.
    pub target: NodeId,
    pub key: String,
    pub record: VersionedRecord,
    pub stored_at_ms: u64,
}

impl Hint {
    pub fn new(target: NodeId, key: String, record: VersionedRecord) -> Self {
        Self {
            target,
            key,
            record,
            stored_at_ms: now_ms(),
        }
    }

    pub fn age_ms(&self) -> u64 {
        now_ms().saturating_sub(self.stored_at_ms)
    }
}

/// Per-node hint buffer, keyed by intended target.
#[derive(Debug, Default)]
pub struct HintStore {
    hints: DashMap<NodeId, Vec<Hint>>,
}

impl HintStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn store(&self, hint: Hint) {
        tracing::debug!("storing hint for {:?} key={}", hint.target, hint.key);
        self.hints.entry(hint.target.clone()).or_default().push(hint);
    }

    pub fn hint_count(&self) -> usize {
        self.hints.iter().map(|entry| entry.value().len()).sum()
    }

    pub fn targets(&self) -> Vec<NodeId> {
        self.hints
            .iter()
            .filter(|entry| !entry.value().is_empty())
            .map(|entry| entry.key().clone())
            .collect()
    }

    pub fn hints_for(&self, target: &NodeId) -> Vec<Hint> {
        self.hints
            .get(target)
            .map(|entry| entry.value().clone())
            .unwrap_or_default()
    }

    /// Remove and return every hint buffered for a target. Redelivery
    /// re-stores any hint that fails to land.
    pub fn take_for(&self, target: &NodeId) -> Vec<Hint> {
        self.hints
            .remove(target)
            .map(|(_, hints)| hints)
            .unwrap_or_default()
    }

    /// Drop hints older than the TTL. Returns the number discarded.
    pub fn expire_older_than(&self, ttl_ms: u64) -> usize {
        let mut dropped = 0;
        for mut entry in self.hints.iter_mut() {
            let before = entry.value().len();
            entry.value_mut().retain(|hint| hint.age_ms() < ttl_ms);
            dropped += before - entry.value().len();
        }
        if dropped > 0 {
            tracing::info!("dropped {} expired hint(s)", dropped);
        }
        dropped
    }
}
