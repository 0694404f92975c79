//! Stress scenarios built on the verifier.
//!
//! Each scenario starts from a freshly provisioned, unstarted cluster and
//! records a list of named checks, much like a tape test records assertions.

mod holding;
mod links;
mod smoke;

use std::fmt::Debug;
use std::str::FromStr;
use std::sync::Arc;

use serde::Serialize;
use tracing::Instrument;
use tidemark_core::{ConsistencyWait, Error, NodeHandle};

use crate::batch::Iteration;
use crate::verifier::ConvergenceVerifier;

/// A named stress scenario.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scenario {
    /// All committed hashes are available somewhere gettable.
    HoldingSanity,
    /// Commit and link one instance at a time, then read links everywhere.
    LinksOneAtATime,
    /// Same as [`Scenario::LinksOneAtATime`] but every fan-out is concurrent.
    LinksAllAtOnce,
    /// Basic commit/get, messaging and linking on a small cluster.
    Smoke,
}

impl Scenario {
    pub const ALL: [Scenario; 4] = [
        Scenario::HoldingSanity,
        Scenario::LinksOneAtATime,
        Scenario::LinksAllAtOnce,
        Scenario::Smoke,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Scenario::HoldingSanity => "holding-sanity",
            Scenario::LinksOneAtATime => "links-one-at-a-time",
            Scenario::LinksAllAtOnce => "links-all-at-once",
            Scenario::Smoke => "smoke",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Scenario::HoldingSanity => "all hashes are available somewhere gettable",
            Scenario::LinksOneAtATime => "commit and link in series, every instance sees every link",
            Scenario::LinksAllAtOnce => "commit and link in parallel, every instance sees every link",
            Scenario::Smoke => "commit then get, send a message, link two entries",
        }
    }

    /// Run the scenario against an unstarted cluster.
    pub async fn run(
        &self,
        verifier: &ConvergenceVerifier,
        nodes: &[Arc<dyn NodeHandle>],
        consistency: &dyn ConsistencyWait,
    ) -> ScenarioReport {
        let span = tracing::info_span!("scenario", name = self.name());
        self.run_steps(verifier, nodes, consistency)
            .instrument(span)
            .await
    }

    async fn run_steps(
        &self,
        verifier: &ConvergenceVerifier,
        nodes: &[Arc<dyn NodeHandle>],
        consistency: &dyn ConsistencyWait,
    ) -> ScenarioReport {
        tracing::info!(instances = nodes.len(), "running scenario");

        let mut report = ScenarioReport::new(self.name());
        match self {
            Scenario::HoldingSanity => holding::run(&mut report, verifier, nodes, consistency).await,
            Scenario::LinksOneAtATime => {
                links::run(&mut report, Iteration::Series, verifier, nodes, consistency).await
            }
            Scenario::LinksAllAtOnce => {
                links::run(&mut report, Iteration::Parallel, verifier, nodes, consistency).await
            }
            Scenario::Smoke => smoke::run(&mut report, verifier, nodes, consistency).await,
        }

        if report.passed() {
            tracing::info!(checks = report.checks.len(), "scenario passed");
        } else {
            tracing::warn!(failed = report.failures().count(), "scenario failed");
        }
        report
    }
}

impl FromStr for Scenario {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Scenario::ALL
            .into_iter()
            .find(|scenario| scenario.name() == s)
            .ok_or_else(|| Error::Config(format!("unknown scenario: {}", s)))
    }
}

impl std::fmt::Display for Scenario {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// One recorded assertion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Check {
    pub name: String,
    pub passed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Assertions recorded by one scenario run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScenarioReport {
    pub scenario: String,
    pub checks: Vec<Check>,
}

impl ScenarioReport {
    pub fn new(scenario: &str) -> Self {
        Self {
            scenario: scenario.to_string(),
            checks: Vec::new(),
        }
    }

    /// Record a boolean check.
    pub fn ok(&mut self, name: &str, passed: bool) -> bool {
        self.record(name, passed, None)
    }

    /// Record a boolean check with a detail line.
    pub fn ok_with(&mut self, name: &str, passed: bool, detail: impl Into<String>) -> bool {
        self.record(name, passed, Some(detail.into()))
    }

    /// Record an equality check; the detail carries both sides on mismatch.
    pub fn equal<T: PartialEq + Debug>(&mut self, name: &str, actual: T, expected: T) -> bool {
        let passed = actual == expected;
        let detail = (!passed).then(|| format!("expected {:?}, got {:?}", expected, actual));
        self.record(name, passed, detail)
    }

    /// Record a failure caused by an error that ended the scenario early.
    pub fn error(&mut self, name: &str, error: &Error) {
        self.record(name, false, Some(error.to_string()));
    }

    fn record(&mut self, name: &str, passed: bool, detail: Option<String>) -> bool {
        if !passed {
            tracing::warn!(check = name, detail = detail.as_deref().unwrap_or(""), "check failed");
        }
        self.checks.push(Check {
            name: name.to_string(),
            passed,
            detail,
        });
        passed
    }

    /// True when at least one check ran and none failed.
    pub fn passed(&self) -> bool {
        !self.checks.is_empty() && self.checks.iter().all(|c| c.passed)
    }

    pub fn failures(&self) -> impl Iterator<Item = &Check> {
        self.checks.iter().filter(|c| !c.passed)
    }
}
