//! Replica Transport Interface
//!
//! The networked RPC layer between nodes is an external collaborator; the
//! replication core talks to replicas only through the `ReplicaTransport`
//! trait. `InProcTransport` wires a set of in-process nodes together with
//! per-node reachability toggles, serving tests and single-process clusters.

pub mod local;

use crate::antientropy::merkle::MerkleTree;
use crate::hints::Hint;
use crate::membership::types::NodeId;
use crate::version::VersionedRecord;
use async_trait::async_trait;

pub use local::InProcTransport;

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("node {0:?} is unreachable")]
    Unreachable(NodeId),
    #[error("replica rpc failed: {0}")]
    Failed(String),
}

#[async_trait]
pub trait ReplicaTransport: Send + Sync {
    /// Apply a versioned record on a remote replica (regular write,
    /// tombstone, read-repair and hint redelivery all use this).
    async fn replica_put(
        &self,
        target: &NodeId,
        key: &str,
        record: VersionedRecord,
    ) -> Result<(), TransportError>;

    /// Fetch all sibling versions a remote replica holds for a key.
    async fn replica_get(
        &self,
        target: &NodeId,
        key: &str,
    ) -> Result<Vec<VersionedRecord>, TransportError>;

    /// Buffer a hint on a standby node.
    async fn store_hint(&self, target: &NodeId, hint: Hint) -> Result<(), TransportError>;

    /// Ask a peer for its Merkle tree over the key range it shares with
    /// `requester`. Only hashes travel.
    async fn merkle_snapshot(
        &self,
        target: &NodeId,
        requester: &NodeId,
    ) -> Result<MerkleTree, TransportError>;

    /// Fetch every record in the given leaf buckets of the shared range.
    async fn fetch_buckets(
        &self,
        target: &NodeId,
        requester: &NodeId,
        buckets: &[usize],
    ) -> Result<Vec<(String, VersionedRecord)>, TransportError>;
}
