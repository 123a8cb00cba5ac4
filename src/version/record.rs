use super::clock::VectorClock;
use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::time::{SystemTime, UNIX_EPOCH};

/// A value plus the vector clock it was written under.
///
/// Immutable once written: an update merges the prior clock, increments the
/// coordinator's counter and stores a new record. Deletions are records too
/// (`tombstone` set, empty value) so they replicate and conflict-resolve like
/// any other write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionedRecord {
    pub value: Vec<u8>,
    pub clock: VectorClock,
    /// Wall-clock write time in milliseconds. Tie-break only, never used for
    /// causal ordering.
    pub timestamp_ms: u64,
    pub tombstone: bool,
}

impl VersionedRecord {
    pub fn new(value: Vec<u8>, clock: VectorClock) -> Self {
        Self {
            value,
            clock,
            timestamp_ms: now_ms(),
            tombstone: false,
        }
    }

    pub fn tombstone(clock: VectorClock) -> Self {
        Self {
            value: Vec::new(),
            clock,
            timestamp_ms: now_ms(),
            tombstone: true,
        }
    }

    /// Stable digest of (clock, tombstone flag) for Merkle comparison. The
    /// value itself is excluded: two replicas holding the same clock hold the
    /// same bytes by construction.
    pub fn digest(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.clock.digest().hash(&mut hasher);
        self.tombstone.hash(&mut hasher);
        hasher.finish()
    }
}

pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
