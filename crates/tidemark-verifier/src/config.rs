//! Run configuration.
//!
//! [`VerifierConfig`] is what the verifier consumes. [`StressConfig`] is the
//! on-disk JSON shape (camelCase, millisecond durations) that stress runs are
//! described with, layered with `TIDEMARK_*` environment overrides.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tidemark_core::{Error, Result, Topology};

/// How the cluster is given time to settle after startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarmUp {
    /// Sleep for a fixed duration.
    Delay(Duration),
    /// Block on the network's own consistency signal.
    AwaitConsistency,
}

impl WarmUp {
    /// A zero spin-up delay means "wait for consistency instead".
    pub fn from_spin_up_delay(delay: Duration) -> Self {
        if delay.is_zero() {
            WarmUp::AwaitConsistency
        } else {
            WarmUp::Delay(delay)
        }
    }
}

/// Parameters for one verification run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifierConfig {
    /// Maximum polling attempts.
    pub retries: u32,
    /// Fixed delay between attempts.
    pub retry_delay: Duration,
    /// Settling policy used by `warm_up`.
    pub warm_up: WarmUp,
    /// Commit iterations driven before verification.
    pub commit_count: usize,
    /// Holders each expected entry needs for the cluster to count as converged.
    pub min_holders: usize,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            retries: 3,
            retry_delay: Duration::from_secs(10),
            warm_up: WarmUp::AwaitConsistency,
            commit_count: 0,
            min_holders: 1,
        }
    }
}

impl VerifierConfig {
    /// Set the attempt budget.
    #[must_use]
    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    /// Set the delay between attempts.
    #[must_use]
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Set the warm-up policy.
    #[must_use]
    pub fn with_warm_up(mut self, warm_up: WarmUp) -> Self {
        self.warm_up = warm_up;
        self
    }

    /// Set the number of commit iterations.
    #[must_use]
    pub fn with_commit_count(mut self, count: usize) -> Self {
        self.commit_count = count;
        self
    }

    /// Require each entry to be held by at least `n` agents.
    #[must_use]
    pub fn with_min_holders(mut self, n: usize) -> Self {
        self.min_holders = n;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.retries == 0 {
            return Err(Error::Config("retries must be at least 1".into()));
        }
        if self.min_holders == 0 {
            return Err(Error::Config("minHolders must be at least 1".into()));
        }
        Ok(())
    }
}

/// Stress run description as stored in a JSON config file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StressConfig {
    pub nodes: usize,
    pub conductors: usize,
    pub instances: usize,
    pub retries: u32,
    /// Milliseconds between convergence attempts.
    pub retry_delay: u64,
    /// Milliseconds to sleep after startup; 0 waits for consistency instead.
    pub spin_up_delay: u64,
    pub commit_count: usize,
    pub min_holders: usize,
}

impl Default for StressConfig {
    fn default() -> Self {
        let topology = Topology::default();
        Self {
            nodes: topology.nodes,
            conductors: topology.conductors,
            instances: topology.instances,
            retries: 3,
            retry_delay: 10_000,
            spin_up_delay: 0,
            commit_count: 0,
            min_holders: 1,
        }
    }
}

impl StressConfig {
    /// Load from a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Apply `TIDEMARK_*` overrides from the process environment.
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        fn parse<T: std::str::FromStr>(key: &str, raw: String) -> Result<T> {
            raw.trim()
                .parse()
                .map_err(|_| Error::Config(format!("{} is not a valid number: {:?}", key, raw)))
        }

        if let Some(v) = lookup("TIDEMARK_NODES") {
            self.nodes = parse("TIDEMARK_NODES", v)?;
        }
        if let Some(v) = lookup("TIDEMARK_CONDUCTORS") {
            self.conductors = parse("TIDEMARK_CONDUCTORS", v)?;
        }
        if let Some(v) = lookup("TIDEMARK_INSTANCES") {
            self.instances = parse("TIDEMARK_INSTANCES", v)?;
        }
        if let Some(v) = lookup("TIDEMARK_RETRIES") {
            self.retries = parse("TIDEMARK_RETRIES", v)?;
        }
        if let Some(v) = lookup("TIDEMARK_RETRY_DELAY_MS") {
            self.retry_delay = parse("TIDEMARK_RETRY_DELAY_MS", v)?;
        }
        if let Some(v) = lookup("TIDEMARK_SPIN_UP_DELAY_MS") {
            self.spin_up_delay = parse("TIDEMARK_SPIN_UP_DELAY_MS", v)?;
        }
        if let Some(v) = lookup("TIDEMARK_COMMIT_COUNT") {
            self.commit_count = parse("TIDEMARK_COMMIT_COUNT", v)?;
        }
        if let Some(v) = lookup("TIDEMARK_MIN_HOLDERS") {
            self.min_holders = parse("TIDEMARK_MIN_HOLDERS", v)?;
        }
        Ok(())
    }

    pub fn topology(&self) -> Topology {
        Topology::new(self.nodes, self.conductors, self.instances)
    }

    /// Verifier parameters described by this file.
    pub fn verifier_config(&self) -> VerifierConfig {
        VerifierConfig {
            retries: self.retries,
            retry_delay: Duration::from_millis(self.retry_delay),
            warm_up: WarmUp::from_spin_up_delay(Duration::from_millis(self.spin_up_delay)),
            commit_count: self.commit_count,
            min_holders: self.min_holders,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.topology().total_instances() == 0 {
            return Err(Error::Config(format!(
                "topology {}x{}x{} has no instances",
                self.nodes, self.conductors, self.instances
            )));
        }
        self.verifier_config().validate()
    }
}
