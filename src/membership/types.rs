use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::time::Instant;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub String);

impl NodeId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

/// Liveness as seen by the local failure detector.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum NodeState {
    Alive,
    Suspect,
    Dead,
}

/// Represents a single member in the cluster.
///
/// Contains identity, gossip addressing and current lifecycle state.
/// The `incarnation` field is a logical clock used to order updates and to
/// refute a false "Suspect" claim. `key_count` is the rough resident key
/// count the node last gossiped, carried only as a load summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub gossip_addr: SocketAddr,
    pub state: NodeState,
    pub incarnation: u64,
    pub key_count: u64,

    #[serde(skip)]
    pub last_seen: Option<Instant>,
}

/// The wire protocol for membership gossip.
///
/// - `Ping/Ack`: liveness checks; the ack piggybacks the full member list so
///   topology and key-count summaries spread epidemically.
/// - `Join`: sent by new nodes to seed nodes to enter the cluster.
/// - `Suspect/Alive`: disseminates disputed node health; `Alive` with a
///   higher incarnation refutes a suspicion.
/// - `Leave`: explicit decommission; removes the node from ring and table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum GossipMessage {
    Ping {
        from: NodeId,
        incarnation: u64,
    },

    Ack {
        from: NodeId,
        incarnation: u64,
        members: Vec<Node>,
    },

    Join {
        node: Node,
    },

    Suspect {
        node_id: NodeId,
        incarnation: u64,
    },

    Alive {
        node_id: NodeId,
        incarnation: u64,
    },

    Leave {
        node_id: NodeId,
    },
}
