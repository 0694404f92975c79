//! Simulation parameters.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tidemark_core::{Error, Result};

/// Configuration for a simulated cluster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SimConfig {
    /// Online agents each published entry is replicated to.
    pub replication_factor: usize,
    /// Milliseconds between gossip rounds.
    pub gossip_interval_ms: u64,
    /// Upper bound on gossip rounds a consistency wait will run.
    pub max_settle_rounds: usize,
    /// Probability (0.0 - 1.0) that any snapshot call fails.
    pub snapshot_failure_rate: f64,
    /// Seed for deterministic fault injection
    pub seed: u64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            replication_factor: 3,
            gossip_interval_ms: 50,
            max_settle_rounds: 20,
            snapshot_failure_rate: 0.0,
            seed: 42,
        }
    }
}

impl SimConfig {
    #[must_use]
    pub fn with_replication_factor(mut self, n: usize) -> Self {
        self.replication_factor = n;
        self
    }

    #[must_use]
    pub fn with_gossip_interval(mut self, interval: Duration) -> Self {
        self.gossip_interval_ms = interval.as_millis() as u64;
        self
    }

    #[must_use]
    pub fn with_snapshot_failure_rate(mut self, rate: f64) -> Self {
        self.snapshot_failure_rate = rate;
        self
    }

    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn gossip_interval(&self) -> Duration {
        Duration::from_millis(self.gossip_interval_ms)
    }

    pub fn validate(&self) -> Result<()> {
        if self.replication_factor == 0 {
            return Err(Error::Config("replicationFactor must be at least 1".into()));
        }
        if self.gossip_interval_ms == 0 {
            return Err(Error::Config("gossipIntervalMs must be at least 1".into()));
        }
        if self.max_settle_rounds == 0 {
            return Err(Error::Config("maxSettleRounds must be at least 1".into()));
        }
        if !(0.0..=1.0).contains(&self.snapshot_failure_rate) {
            return Err(Error::Config(format!(
                "snapshotFailureRate must be within [0, 1], got {}",
                self.snapshot_failure_rate
            )));
        }
        Ok(())
    }
}
