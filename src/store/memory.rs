use super::NodeStore;
use crate::version::clock::Causality;
use crate::version::VersionedRecord;
use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// In-memory sibling-aware store. The reference `NodeStore` implementation;
/// a durable engine would persist the same shape.
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: DashMap<String, Vec<VersionedRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The causal apply rule shared by put and delete.
    fn apply(&self, key: &str, candidate: VersionedRecord) {
        let mut siblings = self.data.entry(key.to_string()).or_default();

        for resident in siblings.iter() {
            match candidate.clock.compare(&resident.clock) {
                // A dominating or identical version is already resident.
                Causality::Ancestor | Causality::Equal => return,
                Causality::Descendant | Causality::Concurrent => {}
            }
        }

        siblings.retain(|resident| {
            resident.clock.compare(&candidate.clock) != Causality::Ancestor
        });
        siblings.push(candidate);
    }
}

#[async_trait]
impl NodeStore for MemoryStore {
    async fn local_put(&self, key: &str, record: VersionedRecord) -> anyhow::Result<()> {
        self.apply(key, record);
        Ok(())
    }

    async fn local_get(&self, key: &str) -> Vec<VersionedRecord> {
        self.data
            .get(key)
            .map(|siblings| siblings.clone())
            .unwrap_or_default()
    }

    async fn local_delete(&self, key: &str, tombstone: VersionedRecord) -> anyhow::Result<()> {
        anyhow::ensure!(tombstone.tombstone, "local_delete requires a tombstone record");
        self.apply(key, tombstone);
        Ok(())
    }

    async fn scan(&self) -> Vec<(String, u64)> {
        self.data
            .iter()
            .map(|entry| (entry.key().clone(), digest_siblings(entry.value())))
            .collect()
    }

    async fn keys(&self) -> Vec<String> {
        self.data.iter().map(|entry| entry.key().clone()).collect()
    }

    async fn evict(&self, key: &str) {
        self.data.remove(key);
    }

    async fn key_count(&self) -> usize {
        self.data.len()
    }
}

/// Order-independent digest over all sibling versions of a key.
fn digest_siblings(siblings: &[VersionedRecord]) -> u64 {
    let mut digests: Vec<u64> = siblings.iter().map(|record| record.digest()).collect();
    digests.sort_unstable();

    let mut hasher = DefaultHasher::new();
    for digest in digests {
        digest.hash(&mut hasher);
    }
    hasher.finish()
}
