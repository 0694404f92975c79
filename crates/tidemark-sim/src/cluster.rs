//! A simulated cluster of app instances sharing one network.

use std::sync::Arc;

use async_trait::async_trait;
use tidemark_core::{AgentId, ConsistencyWait, NodeHandle, Result, Topology};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::config::SimConfig;
use crate::network::NetworkState;
use crate::node::SimNode;

/// Provisions one [`SimNode`] per instance in a [`Topology`].
pub struct SimCluster {
    config: SimConfig,
    topology: Topology,
    network: Arc<RwLock<NetworkState>>,
    nodes: Vec<Arc<SimNode>>,
}

impl SimCluster {
    /// Provision an unstarted cluster.
    pub fn new(topology: Topology, config: SimConfig) -> Result<Self> {
        config.validate()?;
        let names = topology.instance_names();
        let network = Arc::new(RwLock::new(NetworkState::new(&config, &names)));
        let nodes = names
            .into_iter()
            .map(|name| Arc::new(SimNode::new(name, Arc::clone(&network))))
            .collect();

        info!(
            nodes = topology.nodes,
            conductors = topology.conductors,
            instances = topology.instances,
            total = topology.total_instances(),
            "provisioned simulated cluster"
        );

        Ok(Self {
            config,
            topology,
            network,
            nodes,
        })
    }

    pub fn topology(&self) -> Topology {
        self.topology
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Handles in instance order, ready to hand to a verifier.
    pub fn handles(&self) -> Vec<Arc<dyn NodeHandle>> {
        self.nodes
            .iter()
            .map(|n| Arc::clone(n) as Arc<dyn NodeHandle>)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn agent_at(&self, index: usize) -> Option<AgentId> {
        self.nodes.get(index).map(|n| n.agent_id())
    }

    /// Take an instance offline or bring it back.
    pub async fn set_online(&self, index: usize, online: bool) {
        let Some(agent) = self.agent_at(index) else {
            return;
        };
        if let Some(state) = self.network.write().await.agent_mut(&agent) {
            info!(node = %state.name, online, "changing availability");
            state.online = online;
        }
    }

    /// Make an instance's startup fail with `reason`.
    pub async fn fail_start(&self, index: usize, reason: &str) {
        let Some(agent) = self.agent_at(index) else {
            return;
        };
        if let Some(state) = self.network.write().await.agent_mut(&agent) {
            state.start_failure = Some(reason.to_string());
        }
    }

    /// Force an instance's state dumps to fail (or succeed again).
    pub async fn fail_snapshots(&self, index: usize, fail: bool) {
        let Some(agent) = self.agent_at(index) else {
            return;
        };
        if let Some(state) = self.network.write().await.agent_mut(&agent) {
            state.snapshot_failure = fail;
        }
    }

    /// Run one gossip round. Returns the number of new holdings.
    pub async fn gossip_round(&self) -> usize {
        let assigned = self.network.write().await.gossip_round();
        debug!(assigned, "gossip round");
        assigned
    }

    /// Published entries still short of their replication target.
    pub async fn under_replicated(&self) -> usize {
        self.network.read().await.under_replicated()
    }

    /// Gossip on the configured interval until `cancel` fires.
    pub fn spawn_gossip(&self, cancel: CancellationToken) -> JoinHandle<()> {
        let network = Arc::clone(&self.network);
        let interval = self.config.gossip_interval();

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            info!(?interval, "background gossip started");

            loop {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        info!("background gossip stopped");
                        break;
                    }
                    _ = ticker.tick() => {
                        let assigned = network.write().await.gossip_round();
                        if assigned > 0 {
                            debug!(assigned, "background gossip round");
                        }
                    }
                }
            }
        })
    }
}

#[async_trait]
impl ConsistencyWait for SimCluster {
    /// Gossip until nothing is under-replicated or the round limit is hit.
    async fn wait_for_consistency(&self) {
        for round in 1..=self.config.max_settle_rounds {
            tokio::time::sleep(self.config.gossip_interval()).await;
            self.gossip_round().await;
            let pending = self.under_replicated().await;
            if pending == 0 {
                debug!(round, "network settled");
                return;
            }
            debug!(round, pending, "network not settled yet");
        }
        tracing::warn!(
            rounds = self.config.max_settle_rounds,
            "network did not settle within round limit"
        );
    }
}
