//! Anti-Entropy Tests
//!
//! Validates Merkle divergence detection and that one sync round converges
//! two replicas.

use super::merkle::{self, MerkleTree, TREE_DEPTH};
use super::service::AntiEntropyService;
use crate::config::ClusterConfig;
use crate::hints::HintStore;
use crate::membership::types::NodeId;
use crate::ring::HashRing;
use crate::store::{MemoryStore, NodeStore};
use crate::transport::local::{InProcTransport, NodeHandle};
use crate::version::{VectorClock, VersionedRecord};
use std::sync::Arc;
use std::time::Duration;

fn node(name: &str) -> NodeId {
    NodeId(name.to_string())
}

fn record(value: &[u8], entries: &[(&str, u64)]) -> VersionedRecord {
    VersionedRecord::new(value.to_vec(), VectorClock::from_entries(entries))
}

// ============================================================
// MERKLE TREE
// ============================================================

#[test]
fn test_identical_pairs_share_a_root() {
    let pairs = vec![("k1".to_string(), 11u64), ("k2".to_string(), 22u64)];
    let a = MerkleTree::build(&pairs, TREE_DEPTH);
    let b = MerkleTree::build(&pairs, TREE_DEPTH);
    assert_eq!(a.root(), b.root());
    assert!(a.diff(&b).is_empty());
}

#[test]
fn test_build_is_order_independent() {
    let forward = vec![("k1".to_string(), 11u64), ("k2".to_string(), 22u64)];
    let backward = vec![("k2".to_string(), 22u64), ("k1".to_string(), 11u64)];
    assert_eq!(
        MerkleTree::build(&forward, TREE_DEPTH).root(),
        MerkleTree::build(&backward, TREE_DEPTH).root()
    );
}

#[test]
fn test_empty_trees_are_equal() {
    let a = MerkleTree::build(&[], TREE_DEPTH);
    let b = MerkleTree::build(&[], TREE_DEPTH);
    assert_eq!(a.root(), 0);
    assert!(a.diff(&b).is_empty());
}

#[test]
fn test_diff_localizes_the_changed_key() {
    let base = vec![
        ("k1".to_string(), 11u64),
        ("k2".to_string(), 22u64),
        ("k3".to_string(), 33u64),
    ];
    let mut changed = base.clone();
    changed[1].1 = 99;

    let a = MerkleTree::build(&base, TREE_DEPTH);
    let b = MerkleTree::build(&changed, TREE_DEPTH);

    assert_ne!(a.root(), b.root());
    let buckets = a.diff(&b);
    assert!(!buckets.is_empty());
    assert!(
        buckets.contains(&merkle::bucket_of("k2", TREE_DEPTH)),
        "diff must include the changed key's bucket"
    );
    // Unchanged keys in other buckets must not be flagged.
    for key in ["k1", "k3"] {
        let bucket = merkle::bucket_of(key, TREE_DEPTH);
        if bucket != merkle::bucket_of("k2", TREE_DEPTH) {
            assert!(!buckets.contains(&bucket));
        }
    }
}

#[test]
fn test_diff_detects_a_missing_key() {
    let full = vec![("k1".to_string(), 11u64), ("k2".to_string(), 22u64)];
    let partial = vec![("k1".to_string(), 11u64)];

    let a = MerkleTree::build(&full, TREE_DEPTH);
    let b = MerkleTree::build(&partial, TREE_DEPTH);
    assert!(a.diff(&b).contains(&merkle::bucket_of("k2", TREE_DEPTH)));
}

// ============================================================
// SYNC SERVICE
// ============================================================

struct TestNode {
    id: NodeId,
    store: Arc<MemoryStore>,
}

/// Two-node cluster sharing one ring; with N=3 every key is replicated on
/// both, so the shared range covers everything.
fn two_nodes() -> (Arc<HashRing>, Arc<InProcTransport>, TestNode, TestNode) {
    let ring = Arc::new(HashRing::new(64, 3));
    let transport = Arc::new(InProcTransport::new());

    let mut nodes = Vec::new();
    for name in ["a", "b"] {
        let id = node(name);
        let store = Arc::new(MemoryStore::new());
        ring.add_node(&id);
        transport.register(
            id.clone(),
            NodeHandle {
                store: store.clone(),
                hints: Arc::new(HintStore::new()),
                ring: ring.clone(),
            },
        );
        nodes.push(TestNode { id, store });
    }
    let b = nodes.pop().unwrap();
    let a = nodes.pop().unwrap();
    (ring, transport, a, b)
}

fn service_on(
    local: &TestNode,
    ring: &Arc<HashRing>,
    transport: &Arc<InProcTransport>,
    config: ClusterConfig,
) -> Arc<AntiEntropyService> {
    AntiEntropyService::new(
        local.id.clone(),
        ring.clone(),
        local.store.clone(),
        transport.clone(),
        config,
    )
}

#[tokio::test]
async fn test_sync_pushes_missing_records_to_peer() {
    let (ring, transport, a, b) = two_nodes();
    a.store.local_put("k1", record(b"v1", &[("a", 1)])).await.unwrap();

    service_on(&a, &ring, &transport, ClusterConfig::default())
        .sync_with(&b.id)
        .await
        .unwrap();

    let on_b = b.store.local_get("k1").await;
    assert_eq!(on_b.len(), 1);
    assert_eq!(on_b[0].value, b"v1");
}

#[tokio::test]
async fn test_sync_pulls_missing_records_from_peer() {
    let (ring, transport, a, b) = two_nodes();
    b.store.local_put("k2", record(b"v2", &[("b", 1)])).await.unwrap();

    service_on(&a, &ring, &transport, ClusterConfig::default())
        .sync_with(&b.id)
        .await
        .unwrap();

    let on_a = a.store.local_get("k2").await;
    assert_eq!(on_a.len(), 1);
    assert_eq!(on_a[0].value, b"v2");
}

#[tokio::test]
async fn test_sync_resolves_stale_version_causally() {
    let (ring, transport, a, b) = two_nodes();
    a.store.local_put("k", record(b"old", &[("a", 1)])).await.unwrap();
    b.store.local_put("k", record(b"new", &[("a", 2)])).await.unwrap();

    service_on(&a, &ring, &transport, ClusterConfig::default())
        .sync_with(&b.id)
        .await
        .unwrap();

    for store in [&a.store, &b.store] {
        let versions = store.local_get("k").await;
        assert_eq!(versions.len(), 1);
        assert_eq!(versions[0].value, b"new", "stale version must not survive");
    }
}

#[tokio::test]
async fn test_in_sync_peers_exchange_nothing_but_roots() {
    let (ring, transport, a, b) = two_nodes();
    let rec = record(b"v", &[("a", 1)]);
    a.store.local_put("k", rec.clone()).await.unwrap();
    b.store.local_put("k", rec).await.unwrap();

    // Converged stores: the round must succeed and change nothing.
    service_on(&a, &ring, &transport, ClusterConfig::default())
        .sync_with(&b.id)
        .await
        .unwrap();

    assert_eq!(a.store.local_get("k").await, b.store.local_get("k").await);
}

// ============================================================
// TOMBSTONE RETENTION
// ============================================================

#[tokio::test]
async fn test_expired_tombstones_are_purged() {
    let (ring, transport, a, _b) = two_nodes();

    let mut tomb = VersionedRecord::tombstone(VectorClock::from_entries(&[("a", 2)]));
    tomb.timestamp_ms -= 60_000;
    a.store.local_delete("dead-key", tomb).await.unwrap();
    a.store.local_put("live-key", record(b"v", &[("a", 1)])).await.unwrap();

    let config = ClusterConfig {
        tombstone_retention: Duration::from_secs(30),
        anti_entropy_interval: Duration::from_secs(1),
        ..Default::default()
    };
    service_on(&a, &ring, &transport, config)
        .purge_expired_tombstones()
        .await;

    assert!(a.store.local_get("dead-key").await.is_empty(), "expired tombstone must be evicted");
    assert_eq!(a.store.local_get("live-key").await.len(), 1);
}

#[tokio::test]
async fn test_fresh_tombstones_survive_the_sweep() {
    let (ring, transport, a, _b) = two_nodes();

    let tomb = VersionedRecord::tombstone(VectorClock::from_entries(&[("a", 2)]));
    a.store.local_delete("k", tomb).await.unwrap();

    service_on(&a, &ring, &transport, ClusterConfig::default())
        .purge_expired_tombstones()
        .await;

    let versions = a.store.local_get("k").await;
    assert_eq!(versions.len(), 1, "fresh tombstone must stay for replication");
    assert!(versions[0].tombstone);
}
