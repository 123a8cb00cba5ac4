use super::store::HintStore;
use crate::config::ClusterConfig;
use crate::membership::types::NodeId;
use crate::ring::HashRing;
use crate::transport::ReplicaTransport;
use std::sync::Arc;

/// Background redelivery of buffered hints.
///
/// Reachability comes from the gossip-driven ring: a dead target is absent
/// from the ring and rejoins it once gossip sees the node alive again, so the
/// sweep never probes targets the failure detector still considers down.
pub struct HintService {
    hints: Arc<HintStore>,
    ring: Arc<HashRing>,
    transport: Arc<dyn ReplicaTransport>,
    config: ClusterConfig,
}

impl HintService {
    pub fn new(
        hints: Arc<HintStore>,
        ring: Arc<HashRing>,
        transport: Arc<dyn ReplicaTransport>,
        config: ClusterConfig,
    ) -> Arc<Self> {
        Arc::new(Self {
            hints,
            ring,
            transport,
            config,
        })
    }

    pub fn start(self: Arc<Self>) {
        let service = self.clone();
        tokio::spawn(async move {
            let mut interval =
                tokio::time::interval(service.config.hint_redelivery_interval);
            loop {
                interval.tick().await;
                service.run_sweep().await;
            }
        });
        tracing::info!("Hint redelivery service started");
    }

    /// One sweep: expire stale hints, then replay everything whose target is
    /// reachable again. Failed redeliveries are re-buffered for the next
    /// sweep.
    pub async fn run_sweep(&self) {
        self.hints
            .expire_older_than(self.config.hint_ttl.as_millis() as u64);

        for target in self.hints.targets() {
            if !self.ring.contains(&target) {
                tracing::debug!("hint target {:?} still down, keeping hints", target);
                continue;
            }

            let pending = self.hints.take_for(&target);
            let total = pending.len();
            let mut delivered = 0usize;

            for hint in pending {
                match self
                    .transport
                    .replica_put(&target, &hint.key, hint.record.clone())
                    .await
                {
                    Ok(()) => delivered += 1,
                    Err(e) => {
                        tracing::debug!(
                            "hint redelivery to {:?} failed, re-buffering: {}",
                            target,
                            e
                        );
                        self.hints.store(hint);
                    }
                }
            }

            if delivered > 0 {
                tracing::info!(
                    "redelivered {}/{} hint(s) to recovered node {:?}",
                    delivered,
                    total,
                    target
                );
            }
        }
    }
}
