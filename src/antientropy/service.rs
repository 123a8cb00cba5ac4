use super::merkle::{self, MerkleTree, TREE_DEPTH};
use crate::config::ClusterConfig;
use crate::membership::types::NodeId;
use crate::ring::HashRing;
use crate::store::NodeStore;
use crate::transport::ReplicaTransport;
use crate::version::record::now_ms;
use std::sync::Arc;

/// Cap on records exchanged per round so a badly diverged peer cannot stall
/// the loop; the next rounds pick up the remainder.
const MAX_RECORDS_PER_ROUND: usize = 1024;

/// Periodic Merkle-based repair between this node and one random peer per
/// round.
pub struct AntiEntropyService {
    local_id: NodeId,
    ring: Arc<HashRing>,
    store: Arc<dyn NodeStore>,
    transport: Arc<dyn ReplicaTransport>,
    config: ClusterConfig,
}

impl AntiEntropyService {
    pub fn new(
        local_id: NodeId,
        ring: Arc<HashRing>,
        store: Arc<dyn NodeStore>,
        transport: Arc<dyn ReplicaTransport>,
        config: ClusterConfig,
    ) -> Arc<Self> {
        Arc::new(Self {
            local_id,
            ring,
            store,
            transport,
            config,
        })
    }

    pub fn start(self: Arc<Self>) {
        let service = self.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(service.config.anti_entropy_interval);
            loop {
                interval.tick().await;
                service.run_round().await;
            }
        });
        tracing::info!("Anti-entropy service started");
    }

    /// One full round: sync with a random live peer, then sweep tombstones.
    pub async fn run_round(&self) {
        if let Some(peer) = self.pick_peer() {
            if let Err(e) = self.sync_with(&peer).await {
                tracing::debug!("anti-entropy round with {:?} failed: {}", peer, e);
            }
        }
        self.purge_expired_tombstones().await;
    }

    /// A random ring member other than ourselves. The ring only holds nodes
    /// gossip considers live, so dead peers are never probed.
    fn pick_peer(&self) -> Option<NodeId> {
        use rand::seq::SliceRandom;
        let peers: Vec<NodeId> = self
            .ring
            .nodes()
            .into_iter()
            .filter(|node| *node != self.local_id)
            .collect();
        peers.choose(&mut rand::thread_rng()).cloned()
    }

    /// Merkle exchange with one peer over the key range both replicate.
    pub async fn sync_with(&self, peer: &NodeId) -> anyhow::Result<()> {
        let pairs =
            merkle::shared_pairs(self.store.as_ref(), &self.ring, &self.local_id, peer).await;
        let local_tree = MerkleTree::build(&pairs, TREE_DEPTH);

        let remote_tree = self.transport.merkle_snapshot(peer, &self.local_id).await?;

        if local_tree.root() == remote_tree.root() {
            tracing::debug!("in sync with {:?} ({} shared keys)", peer, pairs.len());
            return Ok(());
        }

        let buckets = local_tree.diff(&remote_tree);
        tracing::info!(
            "divergence with {:?}: {}/{} buckets differ",
            peer,
            buckets.len(),
            1usize << TREE_DEPTH
        );

        // Pull the peer's side of the differing buckets and apply through the
        // causal rule; dominated versions are dropped automatically.
        let theirs = self
            .transport
            .fetch_buckets(peer, &self.local_id, &buckets)
            .await?;
        let mut applied = 0usize;
        for (key, record) in theirs.into_iter().take(MAX_RECORDS_PER_ROUND) {
            self.store.local_put(&key, record).await?;
            applied += 1;
        }

        // Push our side of the same buckets so one round heals both replicas.
        let mut pushed = 0usize;
        'outer: for (key, _) in &pairs {
            if !buckets.contains(&merkle::bucket_of(key, TREE_DEPTH)) {
                continue;
            }
            for record in self.store.local_get(key).await {
                if pushed >= MAX_RECORDS_PER_ROUND {
                    tracing::debug!("push cap reached, deferring rest to next round");
                    break 'outer;
                }
                self.transport.replica_put(peer, key, record).await?;
                pushed += 1;
            }
        }

        tracing::info!(
            "repaired divergence with {:?}: applied {}, pushed {}",
            peer,
            applied,
            pushed
        );
        Ok(())
    }

    /// Evict keys whose every sibling is a tombstone older than the retention
    /// window. Keys with any live sibling are untouched.
    pub async fn purge_expired_tombstones(&self) {
        let retention_ms = self.config.tombstone_retention.as_millis() as u64;
        let now = now_ms();
        let mut purged = 0usize;

        for key in self.store.keys().await {
            let versions = self.store.local_get(&key).await;
            if versions.is_empty() {
                continue;
            }
            let all_expired = versions.iter().all(|v| {
                v.tombstone && now.saturating_sub(v.timestamp_ms) > retention_ms
            });
            if all_expired {
                self.store.evict(&key).await;
                purged += 1;
            }
        }

        if purged > 0 {
            tracing::info!("purged {} expired tombstone(s)", purged);
        }
    }
}
