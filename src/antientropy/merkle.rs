use crate::membership::types::NodeId;
use crate::ring::HashRing;
use crate::store::NodeStore;
use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Tree depth: 2^depth leaf buckets. Deep enough that one divergent key
/// localizes to a small bucket, shallow enough that a snapshot stays a few KB.
pub const TREE_DEPTH: usize = 8;

/// Hash tree over the (key, clock-digest) pairs two replicas share.
///
/// Only hashes travel between peers; leaf buckets that compare unequal are
/// then exchanged as records. `levels[0]` is the root, `levels[depth]` holds
/// the `2^depth` leaf bucket hashes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MerkleTree {
    depth: usize,
    levels: Vec<Vec<u64>>,
}

impl MerkleTree {
    /// Build a tree from `(key, clock_digest)` pairs, bucketing by key hash.
    pub fn build(pairs: &[(String, u64)], depth: usize) -> Self {
        let bucket_count = 1usize << depth;
        let mut buckets: Vec<Vec<(u64, u64)>> = vec![Vec::new(); bucket_count];

        for (key, digest) in pairs {
            let key_hash = hash_key(key);
            buckets[(key_hash as usize) & (bucket_count - 1)].push((key_hash, *digest));
        }

        let mut leaves = Vec::with_capacity(bucket_count);
        for bucket in &mut buckets {
            if bucket.is_empty() {
                leaves.push(0);
                continue;
            }
            // Sorted so the leaf hash is independent of scan order.
            bucket.sort_unstable();
            let mut hasher = DefaultHasher::new();
            for (key_hash, digest) in bucket.iter() {
                key_hash.hash(&mut hasher);
                digest.hash(&mut hasher);
            }
            leaves.push(hasher.finish());
        }

        let mut levels = vec![leaves];
        while levels.last().unwrap().len() > 1 {
            let below = levels.last().unwrap();
            let mut above = Vec::with_capacity(below.len() / 2);
            for pair in below.chunks(2) {
                above.push(combine(pair[0], pair[1]));
            }
            levels.push(above);
        }
        levels.reverse();

        Self { depth, levels }
    }

    pub fn root(&self) -> u64 {
        self.levels[0][0]
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Leaf bucket indices where the two trees disagree, found by recursive
    /// descent from the root. Equal subtrees are never entered.
    pub fn diff(&self, other: &MerkleTree) -> Vec<usize> {
        if self.depth != other.depth {
            // Mismatched geometry: every non-trivial bucket is suspect.
            return (0..(1usize << self.depth)).collect();
        }
        let mut divergent = Vec::new();
        self.descend(other, 0, 0, &mut divergent);
        divergent
    }

    fn descend(&self, other: &MerkleTree, level: usize, index: usize, out: &mut Vec<usize>) {
        if self.levels[level][index] == other.levels[level][index] {
            return;
        }
        if level == self.depth {
            out.push(index);
            return;
        }
        self.descend(other, level + 1, index * 2, out);
        self.descend(other, level + 1, index * 2 + 1, out);
    }
}

/// Bucket index a key falls into, consistent with `MerkleTree::build`.
pub fn bucket_of(key: &str, depth: usize) -> usize {
    (hash_key(key) as usize) & ((1usize << depth) - 1)
}

fn hash_key(key: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    key.hash(&mut hasher);
    hasher.finish()
}

fn combine(left: u64, right: u64) -> u64 {
    if left == 0 && right == 0 {
        return 0;
    }
    let mut hasher = DefaultHasher::new();
    left.hash(&mut hasher);
    right.hash(&mut hasher);
    hasher.finish()
}

/// The `(key, clock_digest)` pairs on `store` whose replica sets contain both
/// `local` and `peer`: the key range the two nodes are jointly responsible
/// for, and therefore the range their trees must agree on.
pub async fn shared_pairs(
    store: &dyn NodeStore,
    ring: &HashRing,
    local: &NodeId,
    peer: &NodeId,
) -> Vec<(String, u64)> {
    let mut pairs = Vec::new();
    for (key, digest) in store.scan().await {
        let set = ring.replica_set_for(&key);
        if set.contains(local) && set.contains(peer) {
            pairs.push((key, digest));
        }
    }
    pairs
}
