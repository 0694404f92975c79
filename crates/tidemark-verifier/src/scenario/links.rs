//! Fan-in linking: every instance commits, one instance links everything to a
//! shared base, and every instance must then see the full link set.

use std::sync::Arc;

use futures::future::join_all;
use tidemark_core::{CallResponse, ConsistencyWait, EntryId, NodeCall, NodeHandle, Result};

use super::ScenarioReport;
use crate::batch::{invoke, Batch, Iteration};
use crate::verifier::ConvergenceVerifier;

pub(super) async fn run(
    report: &mut ScenarioReport,
    iteration: Iteration,
    verifier: &ConvergenceVerifier,
    nodes: &[Arc<dyn NodeHandle>],
    consistency: &dyn ConsistencyWait,
) {
    let total = nodes.len();
    let Some(first) = nodes.first() else {
        report.ok_with("cluster has instances", false, "no instances provisioned");
        return;
    };

    if let Err(e) = verifier.start(nodes).await {
        report.error("all nodes start", &e);
        return;
    }

    let batch = Batch::new(nodes).iteration(iteration);

    // Every instance of every conductor commits an entry.
    let commit_results = batch
        .map_instances(|node| async move {
            let content = format!("entry-{}", node.name());
            invoke(node, NodeCall::commit(content))
                .await
                .and_then(CallResponse::into_committed)
        })
        .await;
    let hashes: Vec<EntryId> = commit_results.iter().filter_map(|r| r.as_ref().ok().copied()).collect();
    report.equal("every commit succeeds", hashes.len(), total);

    consistency.wait_for_consistency().await;

    let base = match invoke(first.as_ref(), NodeCall::commit("base"))
        .await
        .and_then(CallResponse::into_committed)
    {
        Ok(base) => base,
        Err(e) => {
            report.error("base entry commits", &e);
            return;
        }
    };

    let link_results = link_all(first.as_ref(), base, &hashes, iteration).await;
    consistency.wait_for_consistency().await;

    let link_failures = link_results.iter().filter(|r| r.is_err()).count();
    report.equal("every link succeeds", link_failures, 0);
    report.equal("one link per instance", link_results.len(), total);

    let link_counts: Vec<Option<usize>> = batch
        .map_instances(|node| async move {
            invoke(node, NodeCall::GetLinks { base })
                .await
                .and_then(CallResponse::into_links)
                .map(|links| links.len())
                .ok()
        })
        .await;
    report.equal(
        "every instance sees the full link set",
        link_counts,
        vec![Some(total); total],
    );
}

async fn link_all(
    node: &dyn NodeHandle,
    base: EntryId,
    targets: &[EntryId],
    iteration: Iteration,
) -> Vec<Result<EntryId>> {
    let link = |target: EntryId| async move {
        invoke(node, NodeCall::LinkEntries { base, target })
            .await
            .and_then(CallResponse::into_linked)
    };

    match iteration {
        Iteration::Series => {
            let mut results = Vec::with_capacity(targets.len());
            for target in targets {
                results.push(link(*target).await);
            }
            results
        }
        Iteration::Parallel => join_all(targets.iter().map(|t| link(*t))).await,
    }
}
