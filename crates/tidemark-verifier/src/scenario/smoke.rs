//! Basic behaviour of a small cluster.

use std::sync::Arc;

use tidemark_core::{CallResponse, ConsistencyWait, NodeCall, NodeHandle, Result};

use super::ScenarioReport;
use crate::batch::invoke;
use crate::verifier::ConvergenceVerifier;

const CONTENT: &str = "entry content ...";
const PAYLOAD: &str = "message payload ..";

pub(super) async fn run(
    report: &mut ScenarioReport,
    verifier: &ConvergenceVerifier,
    nodes: &[Arc<dyn NodeHandle>],
    consistency: &dyn ConsistencyWait,
) {
    let Some(alice) = nodes.first() else {
        report.ok_with("cluster has instances", false, "no instances provisioned");
        return;
    };
    if let Err(e) = verifier.start(nodes).await {
        report.error("all nodes start", &e);
        return;
    }
    let alice = alice.as_ref();

    match commit_then_get(alice, consistency).await {
        Ok(content) => {
            report.equal("commit then get returns the content", content.as_deref(), Some(CONTENT));
        }
        Err(e) => report.error("commit then get returns the content", &e),
    }

    match nodes.get(1) {
        Some(bob) => {
            let sent = invoke(
                alice,
                NodeCall::Send {
                    to_agent: bob.agent_id(),
                    payload: PAYLOAD.into(),
                },
            )
            .await
            .and_then(CallResponse::into_sent);
            match sent {
                Ok(ack) => {
                    report.equal("message is acknowledged", ack.as_str(), "success");
                }
                Err(e) => report.error("message is acknowledged", &e),
            }
        }
        None => tracing::info!("single instance, skipping message check"),
    }

    match link_pair(alice, consistency).await {
        Ok(links) => {
            report.equal("two linked entries yield one link", links, 1);
        }
        Err(e) => report.error("two linked entries yield one link", &e),
    }
}

async fn commit_then_get(node: &dyn NodeHandle, consistency: &dyn ConsistencyWait) -> Result<Option<String>> {
    let address = invoke(node, NodeCall::commit(CONTENT))
        .await?
        .into_committed()?;
    consistency.wait_for_consistency().await;
    invoke(node, NodeCall::GetEntry { address })
        .await?
        .into_entry()
}

async fn link_pair(node: &dyn NodeHandle, consistency: &dyn ConsistencyWait) -> Result<usize> {
    let base = invoke(node, NodeCall::commit("1 - entry content ..."))
        .await?
        .into_committed()?;
    let target = invoke(node, NodeCall::commit("2 - entry content ..."))
        .await?
        .into_committed()?;
    consistency.wait_for_consistency().await;

    invoke(node, NodeCall::LinkEntries { base, target })
        .await?
        .into_linked()?;
    consistency.wait_for_consistency().await;

    let links = invoke(node, NodeCall::GetLinks { base })
        .await?
        .into_links()?;
    Ok(links.len())
}
