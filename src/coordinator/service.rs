use super::types::{GetOutcome, PutOutcome, ReadValue};
use crate::config::ClusterConfig;
use crate::error::{KvError, Result};
use crate::hints::{Hint, HintStore};
use crate::membership::types::NodeId;
use crate::ring::{HashRing, ReplicaSet};
use crate::store::NodeStore;
use crate::transport::ReplicaTransport;
use crate::version::clock::VectorClock;
use crate::version::record::VersionedRecord;
use crate::version::resolve::{self, ConflictStrategy};
use futures::StreamExt;
use futures::stream::FuturesUnordered;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

/// Stateless request coordinator. One instance per node; every instance can
/// serve any key.
pub struct Coordinator {
    local_id: NodeId,
    ring: Arc<HashRing>,
    store: Arc<dyn NodeStore>,
    transport: Arc<dyn ReplicaTransport>,
    hints: Arc<HintStore>,
    config: ClusterConfig,
    strategy: ConflictStrategy,
}

impl Coordinator {
    pub fn new(
        local_id: NodeId,
        ring: Arc<HashRing>,
        store: Arc<dyn NodeStore>,
        transport: Arc<dyn ReplicaTransport>,
        hints: Arc<HintStore>,
        config: ClusterConfig,
        strategy: ConflictStrategy,
    ) -> Self {
        Self {
            local_id,
            ring,
            store,
            transport,
            hints,
            config,
            strategy,
        }
    }

    pub fn local_id(&self) -> &NodeId {
        &self.local_id
    }

    // -----------------------------------------------------------------------
    // PUT
    // -----------------------------------------------------------------------

    /// Write a value. Merges the caller's context clock (or the latest clock
    /// observable on one reachable replica), bumps our counter, fans out to
    /// all N replicas and returns once W have acknowledged.
    pub async fn put(
        &self,
        key: &str,
        value: Vec<u8>,
        context: Option<VectorClock>,
    ) -> Result<PutOutcome> {
        self.put_with(key, value, context, None, None).await
    }

    /// `put` with per-request quorum/timeout overrides.
    pub async fn put_with(
        &self,
        key: &str,
        value: Vec<u8>,
        context: Option<VectorClock>,
        w_override: Option<usize>,
        timeout_override: Option<Duration>,
    ) -> Result<PutOutcome> {
        let replicas = self.replica_set(key)?;
        let clock = self.next_clock(key, context, &replicas).await;
        let record = VersionedRecord::new(value, clock.clone());

        let acks = self
            .fan_out_write(key, record, &replicas, w_override, timeout_override)
            .await?;

        Ok(PutOutcome {
            version: clock,
            acks,
            degraded: replicas.is_under_replicated(),
        })
    }

    // -----------------------------------------------------------------------
    // DELETE
    // -----------------------------------------------------------------------

    /// Delete a key by replicating a tombstone through the regular write
    /// path, so the deletion is conflict-resolved like any other write.
    pub async fn delete(&self, key: &str, context: Option<VectorClock>) -> Result<PutOutcome> {
        self.delete_with(key, context, None, None).await
    }

    pub async fn delete_with(
        &self,
        key: &str,
        context: Option<VectorClock>,
        w_override: Option<usize>,
        timeout_override: Option<Duration>,
    ) -> Result<PutOutcome> {
        let replicas = self.replica_set(key)?;
        let clock = self.next_clock(key, context, &replicas).await;
        let record = VersionedRecord::tombstone(clock.clone());

        let acks = self
            .fan_out_write(key, record, &replicas, w_override, timeout_override)
            .await?;

        Ok(PutOutcome {
            version: clock,
            acks,
            degraded: replicas.is_under_replicated(),
        })
    }

    // -----------------------------------------------------------------------
    // GET
    // -----------------------------------------------------------------------

    /// Read a key: query all replicas, wait for R responses, resolve to the
    /// causal frontier and trigger async read-repair of stale responders.
    pub async fn get(&self, key: &str) -> Result<GetOutcome> {
        self.get_with(key, None, None).await
    }

    pub async fn get_with(
        &self,
        key: &str,
        r_override: Option<usize>,
        timeout_override: Option<Duration>,
    ) -> Result<GetOutcome> {
        let replicas = self.replica_set(key)?;
        let r = r_override
            .unwrap_or(self.config.read_quorum)
            .min(replicas.nodes.len());

        let deadline = tokio::time::Instant::now()
            + timeout_override.unwrap_or(self.config.request_timeout);
        let mut futs = FuturesUnordered::new();

        for replica in &replicas.nodes {
            if *replica == self.local_id {
                let store = self.store.clone();
                let key = key.to_string();
                let local_id = self.local_id.clone();
                futs.push(tokio::spawn(async move {
                    let versions = store.local_get(&key).await;
                    (local_id, Ok(versions))
                }));
            } else {
                let transport = self.transport.clone();
                let target = replica.clone();
                let key = key.to_string();
                futs.push(tokio::spawn(async move {
                    let result = transport.replica_get(&target, &key).await;
                    (target, result)
                }));
            }
        }

        let mut responses: Vec<(NodeId, Vec<VersionedRecord>)> = Vec::new();

        while let Some(joined) = tokio::time::timeout_at(deadline, futs.next())
            .await
            .ok()
            .flatten()
        {
            if let Ok((node_id, Ok(versions))) = joined {
                responses.push((node_id, versions));
                if responses.len() >= r {
                    break;
                }
            }
            // Unreachable replicas are simply not counted toward R.
        }

        if responses.len() < r {
            return Err(KvError::QuorumNotMet {
                needed: r,
                got: responses.len(),
            });
        }

        let all_versions: Vec<VersionedRecord> = responses
            .iter()
            .flat_map(|(_, versions)| versions.iter().cloned())
            .collect();
        let frontier = resolve::resolve(all_versions);

        if frontier.is_empty() {
            return Err(KvError::NotFound);
        }

        let context = frontier
            .iter()
            .fold(VectorClock::new(), |acc, v| acc.merge(&v.clock));

        self.spawn_read_repair(key.to_string(), frontier.clone(), responses);

        let live: Vec<VersionedRecord> =
            frontier.into_iter().filter(|v| !v.tombstone).collect();
        if live.is_empty() {
            // Only tombstones remain: the key is deleted.
            return Err(KvError::NotFound);
        }

        let value = if live.len() > 1 && self.strategy == ConflictStrategy::KeepSiblings {
            ReadValue::Siblings(live.into_iter().map(|v| v.value).collect())
        } else {
            // A lone survivor, or last-write-wins collapsing the siblings.
            match resolve::last_write_wins(live) {
                Some(winner) => ReadValue::Single(winner.value),
                None => return Err(KvError::NotFound),
            }
        };

        Ok(GetOutcome {
            value,
            context,
            degraded: replicas.is_under_replicated(),
        })
    }

    // -----------------------------------------------------------------------
    // Internal: placement and clock bootstrap
    // -----------------------------------------------------------------------

    fn replica_set(&self, key: &str) -> Result<ReplicaSet> {
        let replicas = self.ring.replica_set_for(key);
        if replicas.nodes.is_empty() {
            return Err(KvError::UnderReplicated {
                wanted: self.config.replication,
                available: 0,
            });
        }
        if replicas.is_under_replicated() {
            tracing::warn!(
                "key {:?} placed on {}/{} replicas (degraded)",
                key,
                replicas.nodes.len(),
                replicas.wanted()
            );
        }
        Ok(replicas)
    }

    /// The clock for a new write: the caller's context if supplied, else the
    /// merged clock of whatever one reachable replica currently holds, then
    /// incremented once for this coordinator.
    async fn next_clock(
        &self,
        key: &str,
        context: Option<VectorClock>,
        replicas: &ReplicaSet,
    ) -> VectorClock {
        let mut clock = match context {
            Some(clock) => clock,
            None => self.observed_clock(key, replicas).await,
        };
        clock.increment(&self.local_id);
        clock
    }

    async fn observed_clock(&self, key: &str, replicas: &ReplicaSet) -> VectorClock {
        if replicas.contains(&self.local_id) {
            return merge_clocks(self.store.local_get(key).await);
        }
        for replica in &replicas.nodes {
            match self.transport.replica_get(replica, key).await {
                Ok(versions) => return merge_clocks(versions),
                Err(e) => {
                    tracing::debug!("clock bootstrap from {:?} failed: {}", replica, e);
                }
            }
        }
        // Fully unreachable replica set: start fresh; resulting siblings are
        // resolved by the normal machinery.
        VectorClock::new()
    }

    // -----------------------------------------------------------------------
    // Internal: write fan-out
    // -----------------------------------------------------------------------

    async fn fan_out_write(
        &self,
        key: &str,
        record: VersionedRecord,
        replicas: &ReplicaSet,
        w_override: Option<usize>,
        timeout_override: Option<Duration>,
    ) -> Result<usize> {
        let w = w_override
            .unwrap_or(self.config.write_quorum)
            .min(replicas.nodes.len());

        let deadline = tokio::time::Instant::now()
            + timeout_override.unwrap_or(self.config.request_timeout);
        let mut futs = FuturesUnordered::new();

        for replica in &replicas.nodes {
            if *replica == self.local_id {
                let store = self.store.clone();
                let key = key.to_string();
                let record = record.clone();
                let local_id = self.local_id.clone();
                futs.push(tokio::spawn(async move {
                    let result = store
                        .local_put(&key, record)
                        .await
                        .map_err(|e| e.to_string());
                    (local_id, result)
                }));
            } else {
                let transport = self.transport.clone();
                let target = replica.clone();
                let key = key.to_string();
                let record = record.clone();
                futs.push(tokio::spawn(async move {
                    let result = transport
                        .replica_put(&target, &key, record)
                        .await
                        .map_err(|e| e.to_string());
                    (target, result)
                }));
            }
        }

        let mut acks = 0usize;
        let mut acked: HashSet<NodeId> = HashSet::new();

        while let Some(joined) = tokio::time::timeout_at(deadline, futs.next())
            .await
            .ok()
            .flatten()
        {
            if let Ok((node_id, result)) = joined {
                match result {
                    Ok(()) => {
                        acks += 1;
                        acked.insert(node_id);
                        if acks >= w {
                            break;
                        }
                    }
                    Err(e) => {
                        tracing::debug!("replica {:?} failed write for {}: {}", node_id, key, e);
                    }
                }
            }
        }

        // Every replica that did not ack in time gets a hint, whether it
        // failed outright or is still lagging. Redelivery is idempotent.
        let unacked: Vec<NodeId> = replicas
            .nodes
            .iter()
            .filter(|node| **node != self.local_id && !acked.contains(node))
            .cloned()
            .collect();
        if !unacked.is_empty() {
            self.stash_hints(key, &record, replicas, unacked).await;
        }

        if acks < w {
            return Err(KvError::QuorumNotMet { needed: w, got: acks });
        }

        Ok(acks)
    }

    /// Buffer the record for each failed replica on the ring standby (the
    /// next distinct node clockwise outside the replica set), falling back to
    /// this node when no standby exists or the standby is down too.
    async fn stash_hints(
        &self,
        key: &str,
        record: &VersionedRecord,
        replicas: &ReplicaSet,
        failed: Vec<NodeId>,
    ) {
        let standby = self.ring.standby_for(key, &replicas.nodes);

        for target in failed {
            let hint = Hint::new(target.clone(), key.to_string(), record.clone());

            match &standby {
                Some(standby_id) if *standby_id != self.local_id => {
                    match self.transport.store_hint(standby_id, hint.clone()).await {
                        Ok(()) => {
                            tracing::debug!(
                                "hint for {:?} key={} stored on standby {:?}",
                                target,
                                key,
                                standby_id
                            );
                            continue;
                        }
                        Err(e) => {
                            tracing::debug!(
                                "standby {:?} rejected hint, keeping locally: {}",
                                standby_id,
                                e
                            );
                        }
                    }
                }
                _ => {}
            }

            self.hints.store(hint);
        }
    }

    // -----------------------------------------------------------------------
    // Internal: read repair
    // -----------------------------------------------------------------------

    /// Push the resolved frontier to any responder that is missing part of
    /// it. Fire-and-forget; never blocks the client response.
    fn spawn_read_repair(
        &self,
        key: String,
        frontier: Vec<VersionedRecord>,
        responses: Vec<(NodeId, Vec<VersionedRecord>)>,
    ) {
        let transport = self.transport.clone();
        let store = self.store.clone();
        let local_id = self.local_id.clone();

        tokio::spawn(async move {
            for (node_id, their_versions) in &responses {
                if !is_stale(their_versions, &frontier) {
                    continue;
                }
                tracing::debug!("read repair: updating {:?} for key {}", node_id, key);

                for version in &frontier {
                    if *node_id == local_id {
                        if let Err(e) = store.local_put(&key, version.clone()).await {
                            tracing::warn!("local read repair failed for {}: {}", key, e);
                        }
                    } else if let Err(e) =
                        transport.replica_put(node_id, &key, version.clone()).await
                    {
                        tracing::debug!("read repair of {:?} failed: {}", node_id, e);
                    }
                }
            }
        });
    }
}

/// Merged clock over a sibling set; empty set yields the empty clock.
fn merge_clocks(versions: Vec<VersionedRecord>) -> VectorClock {
    versions
        .iter()
        .fold(VectorClock::new(), |acc, v| acc.merge(&v.clock))
}

/// A responder is stale when it is missing any frontier version.
fn is_stale(theirs: &[VersionedRecord], frontier: &[VersionedRecord]) -> bool {
    frontier
        .iter()
        .any(|wanted| !theirs.iter().any(|have| have.clock == wanted.clock))
}
