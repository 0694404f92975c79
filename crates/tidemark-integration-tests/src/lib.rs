//! Shared fixtures for the end-to-end tests in `tests/`.

use std::sync::Arc;
use std::time::Duration;

use tidemark_core::{NodeHandle, Topology};
use tidemark_sim::{SimCluster, SimConfig};
use tidemark_verifier::{CancellationToken, ConvergenceVerifier, VerifierConfig};
use tokio::task::JoinHandle;

/// A simulated cluster with its verifier and, optionally, background gossip.
pub struct Harness {
    pub cluster: SimCluster,
    pub verifier: ConvergenceVerifier,
    pub cancel: CancellationToken,
    gossip: Option<JoinHandle<()>>,
}

impl Harness {
    /// `conductors` single-instance conductors with fast timings.
    pub fn new(conductors: usize, replication_factor: usize) -> Self {
        Self::with_configs(
            Topology::new(1, conductors, 1),
            SimConfig::default()
                .with_replication_factor(replication_factor)
                .with_gossip_interval(Duration::from_millis(50)),
            VerifierConfig::default()
                .with_retries(5)
                .with_retry_delay(Duration::from_millis(500)),
        )
    }

    pub fn with_configs(topology: Topology, sim: SimConfig, verifier: VerifierConfig) -> Self {
        let cancel = CancellationToken::new();
        let cluster = SimCluster::new(topology, sim).expect("valid sim config");
        let verifier = ConvergenceVerifier::new(verifier)
            .expect("valid verifier config")
            .with_cancellation(cancel.child_token());
        Self {
            cluster,
            verifier,
            cancel,
            gossip: None,
        }
    }

    /// Start gossiping in the background until [`Harness::shutdown`].
    pub fn with_gossip(mut self) -> Self {
        self.gossip = Some(self.cluster.spawn_gossip(self.cancel.child_token()));
        self
    }

    pub fn nodes(&self) -> Vec<Arc<dyn NodeHandle>> {
        self.cluster.handles()
    }

    pub async fn shutdown(mut self) {
        self.cancel.cancel();
        if let Some(gossip) = self.gossip.take() {
            gossip.await.expect("gossip task");
        }
    }
}
