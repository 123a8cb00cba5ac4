use super::{ReplicaTransport, TransportError};
use crate::antientropy::merkle::{self, MerkleTree, TREE_DEPTH};
use crate::hints::{Hint, HintStore};
use crate::membership::types::NodeId;
use crate::ring::HashRing;
use crate::store::NodeStore;
use crate::version::VersionedRecord;
use async_trait::async_trait;
use dashmap::{DashMap, DashSet};
use std::sync::Arc;

/// Everything the transport needs to answer RPCs on a node's behalf.
#[derive(Clone)]
pub struct NodeHandle {
    pub store: Arc<dyn NodeStore>,
    pub hints: Arc<HintStore>,
    pub ring: Arc<HashRing>,
}

/// In-process transport: a registry of node handles with reachability
/// toggles, so tests and single-process clusters can simulate outages
/// without a network.
#[derive(Default)]
pub struct InProcTransport {
    nodes: DashMap<NodeId, NodeHandle>,
    down: DashSet<NodeId>,
}

impl InProcTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, node_id: NodeId, handle: NodeHandle) {
        self.nodes.insert(node_id, handle);
    }

    /// Simulate an outage: every RPC to `node_id` fails until restored.
    pub fn set_down(&self, node_id: &NodeId) {
        self.down.insert(node_id.clone());
    }

    pub fn set_up(&self, node_id: &NodeId) {
        self.down.remove(node_id);
    }

    fn handle_for(&self, target: &NodeId) -> Result<NodeHandle, TransportError> {
        if self.down.contains(target) {
            return Err(TransportError::Unreachable(target.clone()));
        }
        self.nodes
            .get(target)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| TransportError::Unreachable(target.clone()))
    }
}

#[async_trait]
impl ReplicaTransport for InProcTransport {
    async fn replica_put(
        &self,
        target: &NodeId,
        key: &str,
        record: VersionedRecord,
    ) -> Result<(), TransportError> {
        let handle = self.handle_for(target)?;
        handle
            .store
            .local_put(key, record)
            .await
            .map_err(|e| TransportError::Failed(e.to_string()))
    }

    async fn replica_get(
        &self,
        target: &NodeId,
        key: &str,
    ) -> Result<Vec<VersionedRecord>, TransportError> {
        let handle = self.handle_for(target)?;
        Ok(handle.store.local_get(key).await)
    }

    async fn store_hint(&self, target: &NodeId, hint: Hint) -> Result<(), TransportError> {
        let handle = self.handle_for(target)?;
        handle.hints.store(hint);
        Ok(())
    }

    async fn merkle_snapshot(
        &self,
        target: &NodeId,
        requester: &NodeId,
    ) -> Result<MerkleTree, TransportError> {
        let handle = self.handle_for(target)?;
        let pairs =
            merkle::shared_pairs(handle.store.as_ref(), &handle.ring, target, requester).await;
        Ok(MerkleTree::build(&pairs, TREE_DEPTH))
    }

    async fn fetch_buckets(
        &self,
        target: &NodeId,
        requester: &NodeId,
        buckets: &[usize],
    ) -> Result<Vec<(String, VersionedRecord)>, TransportError> {
        let handle = self.handle_for(target)?;
        let pairs =
            merkle::shared_pairs(handle.store.as_ref(), &handle.ring, target, requester).await;

        let mut records = Vec::new();
        for (key, _) in pairs {
            if buckets.contains(&merkle::bucket_of(&key, TREE_DEPTH)) {
                for record in handle.store.local_get(&key).await {
                    records.push((key.clone(), record));
                }
            }
        }
        Ok(records)
    }
}
