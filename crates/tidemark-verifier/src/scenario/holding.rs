//! All committed hashes are available somewhere gettable.
//!
//! Agent addresses are recorded as a failing check when two instances share
//! one, which is stricter than only logging the agent set.

use std::collections::BTreeSet;
use std::sync::Arc;

use tidemark_core::{AgentId, ConsistencyWait, NodeHandle};

use super::ScenarioReport;
use crate::verifier::ConvergenceVerifier;

pub(super) async fn run(
    report: &mut ScenarioReport,
    verifier: &ConvergenceVerifier,
    nodes: &[Arc<dyn NodeHandle>],
    consistency: &dyn ConsistencyWait,
) {
    if let Err(e) = verifier.start(nodes).await {
        report.error("all nodes start", &e);
        return;
    }
    report.ok("all nodes start", true);

    verifier.warm_up(consistency).await;

    let commit_count = verifier.config().commit_count;
    if commit_count > 0 {
        let commits = verifier.drive_commits(nodes, commit_count).await;
        report.equal("every commit succeeds", commits.failures.len(), 0);
    }

    let agents: Vec<AgentId> = nodes.iter().map(|n| n.agent_id()).collect();
    let distinct: BTreeSet<AgentId> = agents.iter().copied().collect();
    tracing::info!(agents = agents.len(), distinct = distinct.len(), "agent addresses");
    report.equal("agent addresses are distinct", distinct.len(), agents.len());

    let result = verifier.verify_convergence(nodes).await;
    report.ok_with("every hash is held somewhere", result.is_pass(), result.summary());
}
