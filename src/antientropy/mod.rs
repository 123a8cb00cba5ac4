//! Anti-Entropy Module
//!
//! Background reconciliation of replica divergence, independent of client
//! traffic.
//!
//! ## Core Concepts
//! - **Merkle Exchange**: each round builds a hash tree over the (key, clock
//!   digest) pairs shared with one peer; only hashes travel until a subtree
//!   disagrees, then only the differing buckets' records are exchanged.
//! - **Bidirectional repair**: the initiating node applies the peer's
//!   records and pushes its own, so one round converges both sides.
//! - **Tombstone retention**: the same sweep physically evicts tombstones
//!   older than the retention window, which must exceed the cycle interval.
//!
//! Peer liveness comes from the gossip-driven ring, so the loop never probes
//! dead nodes. Everything flows through the `NodeStore` interface; the client
//! request path is never blocked.

pub mod merkle;
pub mod service;

#[cfg(test)]
mod tests;

pub use merkle::MerkleTree;
pub use service::AntiEntropyService;
