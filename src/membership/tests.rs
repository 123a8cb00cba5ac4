//! Membership Module Tests
//!
//! Validates the fundamental components of the cluster membership system.
//!
//! ## Test Scopes
//! - **Data Structures**: Ensures uniqueness of IDs and correct serialization
//!   of wire protocol messages.
//! - **Service Logic**: Verifies initialization, member management and ring
//!   wiring.
//! - **Conflict Resolution**: Tests the logic behind incarnation numbers
//!   (refuting a false Suspect claim).

#[cfg(test)]
mod tests {
    use crate::membership::service::MembershipService;
    use crate::membership::types::{GossipMessage, Node, NodeId, NodeState};
    use crate::ring::HashRing;
    use crate::store::{MemoryStore, NodeStore};
    use std::net::SocketAddr;
    use std::sync::Arc;
    use std::time::Instant;

    async fn new_service() -> Arc<MembershipService> {
        let bind_addr: SocketAddr = "127.0.0.1:0".parse().unwrap();
        let ring = Arc::new(HashRing::new(64, 3));
        let store: Arc<dyn NodeStore> = Arc::new(MemoryStore::new());
        MembershipService::new(bind_addr, vec![], ring, store)
            .await
            .expect("Failed to create service")
    }

    // ============================================================
    // NODE ID TESTS
    // ============================================================

    #[test]
    fn test_node_id_is_unique() {
        let id1 = NodeId::new();
        let id2 = NodeId::new();

        assert_ne!(id1, id2, "Each NodeId should be unique");
    }

    #[test]
    fn test_node_id_equality() {
        let id1 = NodeId("test-123".to_string());
        let id2 = NodeId("test-123".to_string());
        let id3 = NodeId("test-456".to_string());

        assert_eq!(id1, id2);
        assert_ne!(id1, id3);
    }

    #[test]
    fn test_node_id_hash() {
        use std::collections::HashSet;

        let mut set = HashSet::new();
        let id1 = NodeId("node-1".to_string());
        let id2 = NodeId("node-1".to_string());
        let id3 = NodeId("node-2".to_string());

        set.insert(id1.clone());
        set.insert(id2);
        set.insert(id3);

        assert_eq!(set.len(), 2, "HashSet should have 2 unique NodeIds");
    }

    // ============================================================
    // NODE STATE TESTS
    // ============================================================

    #[test]
    fn test_node_state_equality() {
        assert_eq!(NodeState::Alive, NodeState::Alive);
        assert_eq!(NodeState::Suspect, NodeState::Suspect);
        assert_eq!(NodeState::Dead, NodeState::Dead);

        assert_ne!(NodeState::Alive, NodeState::Suspect);
        assert_ne!(NodeState::Alive, NodeState::Dead);
        assert_ne!(NodeState::Suspect, NodeState::Dead);
    }

    // ============================================================
    // WIRE PROTOCOL TESTS
    // ============================================================

    #[test]
    fn test_gossip_message_round_trip() {
        let node = Node {
            id: NodeId::new(),
            gossip_addr: "127.0.0.1:5000".parse().unwrap(),
            state: NodeState::Alive,
            incarnation: 3,
            key_count: 42,
            last_seen: Some(Instant::now()),
        };

        let msg = GossipMessage::Ack {
            from: node.id.clone(),
            incarnation: 3,
            members: vec![node.clone()],
        };

        let encoded = bincode::serialize(&msg).unwrap();
        let decoded: GossipMessage = bincode::deserialize(&encoded).unwrap();

        match decoded {
            GossipMessage::Ack {
                from,
                incarnation,
                members,
            } => {
                assert_eq!(from, node.id);
                assert_eq!(incarnation, 3);
                assert_eq!(members.len(), 1);
                assert_eq!(members[0].key_count, 42);
                // Instant is skipped on the wire.
                assert!(members[0].last_seen.is_none());
            }
            other => panic!("Expected Ack, got {:?}", other),
        }
    }

    #[test]
    fn test_leave_message_round_trip() {
        let msg = GossipMessage::Leave {
            node_id: NodeId("leaver".to_string()),
        };
        let encoded = bincode::serialize(&msg).unwrap();
        let decoded: GossipMessage = bincode::deserialize(&encoded).unwrap();
        assert!(matches!(
            decoded,
            GossipMessage::Leave { node_id } if node_id.0 == "leaver"
        ));
    }

    // ============================================================
    // SERVICE TESTS
    // ============================================================

    #[tokio::test]
    async fn test_membership_creation() {
        let service = new_service().await;

        assert_eq!(service.members.len(), 1);

        let members = service.get_alive_members();
        assert_eq!(members.len(), 1);
        assert_eq!(members[0].state, NodeState::Alive);
    }

    #[tokio::test]
    async fn test_local_node_joins_ring() {
        let bind_addr: SocketAddr = "127.0.0.1:0".parse().unwrap();
        let ring = Arc::new(HashRing::new(64, 3));
        let store: Arc<dyn NodeStore> = Arc::new(MemoryStore::new());
        let service = MembershipService::new(bind_addr, vec![], ring.clone(), store)
            .await
            .unwrap();

        assert!(ring.contains(&service.local_node.id));
        assert_eq!(ring.node_count(), 1);
    }

    #[tokio::test]
    async fn test_is_alive_for_known_and_unknown_nodes() {
        let service = new_service().await;

        assert!(service.is_alive(&service.local_node.id));
        assert!(!service.is_alive(&NodeId("stranger".to_string())));
    }

    #[tokio::test]
    async fn test_get_member() {
        let service = new_service().await;

        let found = service.get_member(&service.local_node.id);
        assert!(found.is_some());
        assert_eq!(found.unwrap().id, service.local_node.id);
    }
}
