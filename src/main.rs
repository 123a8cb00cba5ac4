use quorum_kv::antientropy::AntiEntropyService;
use quorum_kv::config::ClusterConfig;
use quorum_kv::coordinator::Coordinator;
use quorum_kv::hints::{HintService, HintStore};
use quorum_kv::membership::service::MembershipService;
use quorum_kv::ring::HashRing;
use quorum_kv::store::{MemoryStore, NodeStore};
use quorum_kv::transport::local::{InProcTransport, NodeHandle};
use quorum_kv::transport::ReplicaTransport;
use quorum_kv::version::resolve::ConflictStrategy;
use std::net::SocketAddr;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 3 {
        eprintln!(
            "Usage: {} --bind <addr:port> [--seed <addr:port>] [--n <N>] [--w <W>] [--r <R>]",
            args[0]
        );
        eprintln!("Example: {} --bind 127.0.0.1:5000", args[0]);
        eprintln!(
            "Example: {} --bind 127.0.0.1:5001 --seed 127.0.0.1:5000",
            args[0]
        );

        std::process::exit(1);
    }

    let mut bind_addr: Option<SocketAddr> = None;
    let mut seed_nodes: Vec<SocketAddr> = vec![];
    let mut config = ClusterConfig::default();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--bind" => {
                bind_addr = Some(args[i + 1].parse()?);
                i += 2;
            }
            "--seed" => {
                seed_nodes.push(args[i + 1].parse()?);
                i += 2;
            }
            "--n" => {
                config.replication = args[i + 1].parse()?;
                i += 2;
            }
            "--w" => {
                config.write_quorum = args[i + 1].parse()?;
                i += 2;
            }
            "--r" => {
                config.read_quorum = args[i + 1].parse()?;
                i += 2;
            }
            _ => {
                i += 1;
            }
        }
    }

    let bind_addr = bind_addr.expect("--bind is required");

    config.validate()?;

    tracing::info!("Starting node on {}", bind_addr);
    if !seed_nodes.is_empty() {
        tracing::info!("Seed nodes: {:?}", seed_nodes);
    } else {
        tracing::info!("Starting as seed node (founder)");
    }

    // 1. Local state: ring, store, hint buffer.
    let ring = Arc::new(HashRing::new(config.vnodes, config.replication));
    let store: Arc<dyn NodeStore> = Arc::new(MemoryStore::new());
    let hints = Arc::new(HintStore::new());

    // 2. Membership (UDP gossip); liveness transitions drive the ring.
    let membership =
        MembershipService::new(bind_addr, seed_nodes, ring.clone(), store.clone()).await?;
    tracing::info!("Node ID: {:?}", membership.local_node.id);

    // 3. Replica transport. The networked RPC layer is a deployment concern;
    //    the daemon registers itself on the in-process transport so the
    //    background services and any embedded clients share one path.
    let transport = Arc::new(InProcTransport::new());
    transport.register(
        membership.local_node.id.clone(),
        NodeHandle {
            store: store.clone(),
            hints: hints.clone(),
            ring: ring.clone(),
        },
    );
    let transport: Arc<dyn ReplicaTransport> = transport;

    // 4. Request coordinator (embedded client API).
    let _coordinator = Coordinator::new(
        membership.local_node.id.clone(),
        ring.clone(),
        store.clone(),
        transport.clone(),
        hints.clone(),
        config.clone(),
        ConflictStrategy::KeepSiblings,
    );

    // 5. Background services.
    membership.clone().start().await;

    AntiEntropyService::new(
        membership.local_node.id.clone(),
        ring.clone(),
        store.clone(),
        transport.clone(),
        config.clone(),
    )
    .start();

    HintService::new(hints.clone(), ring.clone(), transport.clone(), config.clone()).start();

    // 6. Periodic cluster stats reporter.
    let stats_service = membership.clone();
    let stats_store = store.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(5));

        loop {
            interval.tick().await;
            let alive = stats_service.get_alive_members();
            tracing::info!(
                "Cluster stats: {} alive nodes, {} local keys",
                alive.len(),
                stats_store.key_count().await
            );
            for node in alive {
                tracing::info!(
                    "  - {:?} gossip={} keys={} (inc={})",
                    node.id,
                    node.gossip_addr,
                    node.key_count,
                    node.incarnation
                );
            }
        }
    });

    tracing::info!("Press Ctrl+C to shutdown");
    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutting down");

    Ok(())
}
