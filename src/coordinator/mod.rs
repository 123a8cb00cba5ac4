//! Coordinator Module
//!
//! Implements the client-facing quorum protocol. Any node can coordinate any
//! request; there is no leader.
//!
//! ## Core Concepts
//! - **Quorum (N/W/R)**: writes fan out to all N replicas and succeed on W
//!   acks; reads succeed on R responses. `W + R > N` gives read-your-write
//!   safety and is checked (warn-only) at startup.
//! - **Versioning**: every accepted write merges the prior clock and bumps
//!   the coordinator's counter; reads resolve responses down to the causal
//!   frontier.
//! - **Read Repair**: stale responders are repaired asynchronously after the
//!   response is returned.
//! - **Hinted Handoff**: replicas that fail a write get their record buffered
//!   on a ring standby for later redelivery.

pub mod service;
pub mod types;


pub use service::Coordinator;
pub use types::{GetOutcome, PutOutcome, ReadValue};
