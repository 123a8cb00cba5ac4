//! Error taxonomy for the replication core.
//!
//! Transient per-replica failures are absorbed by hinted handoff and
//! anti-entropy; only quorum-level failures reach the caller. Structural
//! misconfiguration is fatal at startup, never per request.

use crate::membership::types::NodeId;

pub type Result<T> = std::result::Result<T, KvError>;

#[derive(Debug, thiserror::Error)]
pub enum KvError {
    /// Fewer than W (write) or R (read) replicas responded before the
    /// deadline. The operation may still have been applied on some replicas.
    #[error("quorum not met: needed {needed}, got {got}")]
    QuorumNotMet { needed: usize, got: usize },

    /// Fewer than N distinct physical nodes exist to form a full replica set.
    #[error("cluster under-replicated: wanted {wanted} replicas, {available} distinct nodes available")]
    UnderReplicated { wanted: usize, available: usize },

    /// No queried replica holds the key (or only expired tombstones remain).
    #[error("key not found")]
    NotFound,

    /// A specific replica could not be reached. Never surfaced to clients
    /// when the quorum is otherwise met; used internally to trigger handoff.
    #[error("replica {0:?} unreachable")]
    NodeUnreachable(NodeId),

    /// Structural misconfiguration detected at startup.
    #[error("invalid cluster configuration: {0}")]
    Config(String),
}
