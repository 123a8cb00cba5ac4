//! Cluster-wide configuration.
//!
//! All knobs are fixed at bootstrap. Changing N, W, R or the virtual node
//! count on a live cluster would require a full rebalance, so there is no
//! runtime mutation path.

use crate::error::KvError;
use std::time::Duration;

/// Static replication and timing configuration shared by every subsystem.
#[derive(Debug, Clone)]
pub struct ClusterConfig {
    /// Replication factor (N): distinct physical nodes per key.
    pub replication: usize,
    /// Default write quorum (W).
    pub write_quorum: usize,
    /// Default read quorum (R).
    pub read_quorum: usize,
    /// Virtual node positions per physical node (V).
    pub vnodes: usize,
    /// Deadline for a single client-facing put/get/delete.
    pub request_timeout: Duration,
    /// Hints older than this are dropped; anti-entropy takes over.
    pub hint_ttl: Duration,
    /// Tombstones are physically evicted after this window. Must exceed the
    /// anti-entropy cycle time or deleted keys can resurrect.
    pub tombstone_retention: Duration,
    /// Interval between anti-entropy rounds.
    pub anti_entropy_interval: Duration,
    /// Interval between hint redelivery sweeps.
    pub hint_redelivery_interval: Duration,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            replication: 3,
            write_quorum: 2,
            read_quorum: 2,
            vnodes: 128,
            request_timeout: Duration::from_millis(500),
            hint_ttl: Duration::from_secs(3600),
            tombstone_retention: Duration::from_secs(24 * 3600),
            anti_entropy_interval: Duration::from_secs(30),
            hint_redelivery_interval: Duration::from_secs(5),
        }
    }
}

impl ClusterConfig {
    /// Validate at startup. Structural problems are fatal; a W/R choice that
    /// merely weakens read-your-write safety only warns.
    pub fn validate(&self) -> Result<(), KvError> {
        if self.replication == 0 {
            return Err(KvError::Config("replication factor N must be > 0".into()));
        }
        if self.write_quorum == 0 || self.write_quorum > self.replication {
            return Err(KvError::Config(format!(
                "write quorum W={} must be in 1..=N ({})",
                self.write_quorum, self.replication
            )));
        }
        if self.read_quorum == 0 || self.read_quorum > self.replication {
            return Err(KvError::Config(format!(
                "read quorum R={} must be in 1..=N ({})",
                self.read_quorum, self.replication
            )));
        }
        if self.vnodes == 0 {
            return Err(KvError::Config("virtual node count V must be > 0".into()));
        }
        if self.tombstone_retention <= self.anti_entropy_interval {
            return Err(KvError::Config(
                "tombstone retention must exceed the anti-entropy interval".into(),
            ));
        }
        if self.write_quorum + self.read_quorum <= self.replication {
            tracing::warn!(
                "W ({}) + R ({}) <= N ({}): reads are not guaranteed to observe \
                 the latest acknowledged write",
                self.write_quorum,
                self.read_quorum,
                self.replication
            );
        }
        Ok(())
    }
}
