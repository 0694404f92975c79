//! Node handles into the simulated network.

use std::sync::Arc;

use async_trait::async_trait;
use tidemark_core::{AgentId, CallResponse, Error, NodeCall, NodeHandle, Result, StateSnapshot};
use tokio::sync::RwLock;

use crate::network::NetworkState;

/// One simulated app instance.
pub struct SimNode {
    name: String,
    agent: AgentId,
    network: Arc<RwLock<NetworkState>>,
}

impl SimNode {
    pub(crate) fn new(name: String, network: Arc<RwLock<NetworkState>>) -> Self {
        let agent = AgentId::for_name(&name);
        Self {
            name,
            agent,
            network,
        }
    }

    fn call_error(&self, call: &NodeCall, reason: impl Into<String>) -> Error {
        Error::Call {
            node: self.name.clone(),
            call: call.name(),
            reason: reason.into(),
        }
    }
}

impl std::fmt::Debug for SimNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimNode")
            .field("name", &self.name)
            .field("agent", &self.agent)
            .finish()
    }
}

#[async_trait]
impl NodeHandle for SimNode {
    fn name(&self) -> &str {
        &self.name
    }

    fn agent_id(&self) -> AgentId {
        self.agent
    }

    async fn start(&self) -> Result<()> {
        let mut network = self.network.write().await;
        let state = network.agent(&self.agent).ok_or_else(|| Error::Start {
            node: self.name.clone(),
            reason: "unknown agent".into(),
        })?;
        if let Some(reason) = &state.start_failure {
            return Err(Error::Start {
                node: self.name.clone(),
                reason: reason.clone(),
            });
        }
        if !state.online {
            return Err(Error::Start {
                node: self.name.clone(),
                reason: "offline".into(),
            });
        }

        network.genesis(&self.agent);
        tracing::debug!(node = %self.name, agent = %self.agent, "instance started");
        Ok(())
    }

    async fn invoke(&self, call: NodeCall) -> Result<CallResponse> {
        call.validate()?;
        let mut network = self.network.write().await;
        match network.agent(&self.agent) {
            Some(state) if !state.online => return Err(self.call_error(&call, "offline")),
            Some(state) if !state.started => return Err(self.call_error(&call, "not started")),
            Some(_) => {}
            None => return Err(self.call_error(&call, "unknown agent")),
        }

        let response = match &call {
            NodeCall::CommitEntry { content } => network
                .commit(&self.agent, content.clone())
                .map(CallResponse::Committed),
            NodeCall::GetEntry { address } => {
                Some(CallResponse::Entry(network.get_entry(&self.agent, address)))
            }
            NodeCall::LinkEntries { base, target } => network
                .link(&self.agent, *base, *target)
                .map(CallResponse::Linked),
            NodeCall::GetLinks { base } => Some(CallResponse::Links(network.get_links(base))),
            NodeCall::Send { to_agent, .. } => match network.agent(to_agent) {
                Some(recipient) if recipient.is_live() => Some(CallResponse::Sent("success".into())),
                Some(_) => return Err(self.call_error(&call, "recipient unreachable")),
                None => return Err(self.call_error(&call, format!("no such agent {}", to_agent))),
            },
        };
        response.ok_or_else(|| self.call_error(&call, "unknown agent"))
    }

    async fn snapshot(&self) -> Result<StateSnapshot> {
        let mut network = self.network.write().await;
        network.snapshot(&self.agent).ok_or_else(|| Error::Snapshot {
            node: self.name.clone(),
            reason: "state dump unavailable".into(),
        })
    }
}
