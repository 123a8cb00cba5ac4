//! Node Store Interface
//!
//! The durable per-node storage engine is an external collaborator; this
//! module defines the contract the replication core consumes, plus an
//! in-memory reference implementation used by tests and single-process
//! clusters.
//!
//! ## Contract
//! - A key maps to one or more sibling versions (mutually concurrent).
//! - **Causal apply rule**: an incoming record never replaces a resident
//!   version that causally dominates or equals it; it displaces residents it
//!   dominates and otherwise lands as an additional sibling. Both the request
//!   path and the background services write through this one rule.
//! - Deletion is a tombstone write; physical removal (`evict`) happens only
//!   after the tombstone retention window.

pub mod memory;


use crate::version::VersionedRecord;
use async_trait::async_trait;

pub use memory::MemoryStore;

#[async_trait]
pub trait NodeStore: Send + Sync {
    /// Apply a versioned record under the causal apply rule.
    async fn local_put(&self, key: &str, record: VersionedRecord) -> anyhow::Result<()>;

    /// All sibling versions currently held for a key. Empty = not found.
    async fn local_get(&self, key: &str) -> Vec<VersionedRecord>;

    /// Tombstone write. The record must carry `tombstone = true`; it flows
    /// through the same causal apply rule as a regular put.
    async fn local_delete(&self, key: &str, tombstone: VersionedRecord) -> anyhow::Result<()>;

    /// `(key, clock digest)` for every resident key, digesting all siblings.
    /// Feeds Merkle-tree construction; never transfers values.
    async fn scan(&self) -> Vec<(String, u64)>;

    /// Every resident key. Used by the tombstone retention sweep.
    async fn keys(&self) -> Vec<String>;

    /// Physically remove a key. Only the retention sweep calls this, and only
    /// when every sibling is an expired tombstone.
    async fn evict(&self, key: &str);

    /// Rough resident key count, gossiped as a load summary.
    async fn key_count(&self) -> usize;
}
