//! Leaderless Replicated Key-Value Store Library
//!
//! This library crate defines the replication and consistency core of a
//! leaderless distributed key-value store. It serves as the foundation for
//! the node daemon (`main.rs`).
//!
//! ## Architecture Modules
//! The system is composed of loosely coupled subsystems:
//!
//! - **`membership`**: The cluster coordination layer. Uses a UDP-based
//!   Gossip protocol (SWIM-like) for node discovery, failure detection and
//!   topology dissemination; liveness transitions drive the hash ring.
//! - **`ring`**: Consistent hashing with virtual nodes. Decides which N
//!   distinct physical nodes own each key, with copy-on-write snapshots for
//!   lock-free request-path reads.
//! - **`version`**: The versioning engine. Vector clocks, causal comparison
//!   and conflict resolution (sibling preservation or last-write-wins).
//! - **`store`**: The `NodeStore` contract the durable per-node engine must
//!   satisfy, plus the in-memory reference implementation.
//! - **`transport`**: The `ReplicaTransport` contract the RPC layer must
//!   satisfy, plus an in-process implementation for tests and demos.
//! - **`coordinator`**: The quorum protocol. Fans client put/get/delete out
//!   to replicas, enforces W/R, resolves versions and fires read-repair.
//! - **`antientropy`**: Background Merkle-tree reconciliation between
//!   replicas plus tombstone retention.
//! - **`hints`**: Hinted handoff. Buffers writes for unreachable replicas
//!   and redelivers them after recovery.

pub mod antientropy;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod hints;
pub mod membership;
pub mod ring;
pub mod store;
pub mod transport;
pub mod version;

pub use config::ClusterConfig;
pub use coordinator::{Coordinator, GetOutcome, PutOutcome, ReadValue};
pub use error::{KvError, Result};
