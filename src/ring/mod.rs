//! Hash Ring
//!
//! Maps keys to an ordered set of owning nodes via consistent hashing with
//! virtual nodes.
//!
//! ## Core Concepts
//! - **Virtual Nodes**: each physical node contributes V positions hashed
//!   from `"{node_id}:{index}"`, so one membership change remaps only about
//!   1/nodes of the keyspace.
//! - **Replica Set**: the first N distinct physical nodes found walking
//!   clockwise from the key's hash, wrapping once around the ring.
//! - **Copy-on-write reads**: lookups clone an `Arc` snapshot; topology
//!   changes build a new snapshot and swap it in, so the request path never
//!   waits on a join/leave.

use crate::membership::types::NodeId;
use parking_lot::RwLock;
use std::collections::hash_map::DefaultHasher;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::hash::{Hash, Hasher};
use std::sync::Arc;


/// The N distinct physical nodes responsible for a key, in ring order.
#[derive(Debug, Clone)]
pub struct ReplicaSet {
    pub nodes: Vec<NodeId>,
    wanted: usize,
}

impl ReplicaSet {
    /// True when fewer than N distinct nodes exist; callers must treat the
    /// cluster as degraded.
    pub fn is_under_replicated(&self) -> bool {
        self.nodes.len() < self.wanted
    }

    pub fn wanted(&self) -> usize {
        self.wanted
    }

    pub fn contains(&self, node: &NodeId) -> bool {
        self.nodes.contains(node)
    }
}

#[derive(Debug, Default, Clone)]
struct RingState {
    /// Ring position -> owning physical node.
    positions: BTreeMap<u64, NodeId>,
    /// Physical node -> its virtual positions (for cheap removal).
    vnode_index: HashMap<NodeId, Vec<u64>>,
}

/// Consistent-hash ring shared by the coordinator, anti-entropy and hinted
/// handoff. Mutated only on membership changes.
pub struct HashRing {
    vnodes_per_node: usize,
    replication: usize,
    state: RwLock<Arc<RingState>>,
}

impl HashRing {
    pub fn new(vnodes_per_node: usize, replication: usize) -> Self {
        Self {
            vnodes_per_node,
            replication,
            state: RwLock::new(Arc::new(RingState::default())),
        }
    }

    /// Insert a node's virtual positions. Idempotent.
    pub fn add_node(&self, node_id: &NodeId) {
        let mut guard = self.state.write();
        if guard.vnode_index.contains_key(node_id) {
            return;
        }
        let mut next = (**guard).clone();
        let mut owned = Vec::with_capacity(self.vnodes_per_node);
        for i in 0..self.vnodes_per_node {
            let position = hash_position(&format!("{}:{}", node_id.0, i));
            next.positions.insert(position, node_id.clone());
            owned.push(position);
        }
        next.vnode_index.insert(node_id.clone(), owned);
        *guard = Arc::new(next);
        tracing::info!(
            "ring: added {:?} ({} vnodes, {} physical nodes total)",
            node_id,
            self.vnodes_per_node,
            guard.vnode_index.len()
        );
    }

    /// Remove a node and all of its virtual positions. Idempotent.
    pub fn remove_node(&self, node_id: &NodeId) {
        let mut guard = self.state.write();
        if !guard.vnode_index.contains_key(node_id) {
            return;
        }
        let mut next = (**guard).clone();
        if let Some(owned) = next.vnode_index.remove(node_id) {
            for position in owned {
                next.positions.remove(&position);
            }
        }
        *guard = Arc::new(next);
        tracing::info!(
            "ring: removed {:?} ({} physical nodes remain)",
            node_id,
            guard.vnode_index.len()
        );
    }

    /// The first N distinct physical nodes clockwise from the key's hash.
    pub fn replica_set_for(&self, key: &str) -> ReplicaSet {
        let state = self.snapshot();
        let nodes = walk_distinct(
            &state,
            hash_position(key),
            self.replication,
            &HashSet::new(),
        );
        ReplicaSet {
            nodes,
            wanted: self.replication,
        }
    }

    /// The first distinct node clockwise that is NOT in `exclude`; the
    /// standby target for hinted handoff.
    pub fn standby_for(&self, key: &str, exclude: &[NodeId]) -> Option<NodeId> {
        let state = self.snapshot();
        let excluded: HashSet<NodeId> = exclude.iter().cloned().collect();
        walk_distinct(&state, hash_position(key), 1, &excluded)
            .into_iter()
            .next()
    }

    pub fn contains(&self, node_id: &NodeId) -> bool {
        self.snapshot().vnode_index.contains_key(node_id)
    }

    pub fn node_count(&self) -> usize {
        self.snapshot().vnode_index.len()
    }

    pub fn nodes(&self) -> Vec<NodeId> {
        self.snapshot().vnode_index.keys().cloned().collect()
    }

    fn snapshot(&self) -> Arc<RingState> {
        self.state.read().clone()
    }
}

/// Clockwise walk collecting up to `want` distinct physical nodes, skipping
/// `excluded`. Each virtual position is visited at most once (one wrap), so
/// a ring dense with a single node's vnodes still terminates in O(positions).
fn walk_distinct(
    state: &RingState,
    start: u64,
    want: usize,
    excluded: &HashSet<NodeId>,
) -> Vec<NodeId> {
    let mut selected = Vec::with_capacity(want);
    let mut seen: HashSet<&NodeId> = HashSet::new();

    for (_, node) in state
        .positions
        .range(start..)
        .chain(state.positions.range(..start))
    {
        if selected.len() >= want {
            break;
        }
        if excluded.contains(node) || seen.contains(node) {
            continue;
        }
        seen.insert(node);
        selected.push(node.clone());
    }

    selected
}

fn hash_position(input: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    input.hash(&mut hasher);
    hasher.finish()
}
