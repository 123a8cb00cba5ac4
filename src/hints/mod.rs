//! Hinted Handoff Module
//!
//! Buffers writes destined for an unreachable replica on a standby node and
//! redelivers them once the original owner is reachable again.
//!
//! ## Core Concepts
//! - **Hint**: a (target node, key, versioned record) tuple created when a
//!   write fan-out could not reach a replica.
//! - **Standby placement**: hints live on the next distinct node clockwise
//!   after the replica set, falling back to the coordinator itself.
//! - **Redelivery**: a background sweep probes the target's gossiped
//!   liveness and replays the record through a normal replicated write.
//! - **TTL**: hints older than the configured window are dropped; repair then
//!   falls to anti-entropy.

pub mod service;
pub mod store;


pub use service::HintService;
pub use store::{Hint, HintStore};
