//! Collaborator contracts the verifier drives.

use async_trait::async_trait;

use crate::error::Result;
use crate::{AgentId, CallResponse, NodeCall, StateSnapshot};

/// A capability bound to one participant in the cluster under test.
///
/// Handles are owned by whatever provisioned the cluster; the verifier only
/// borrows them and never mutates them.
#[async_trait]
pub trait NodeHandle: Send + Sync {
    /// Human-readable instance label, e.g. `"3:0"`.
    fn name(&self) -> &str;

    /// Agent address of this participant.
    fn agent_id(&self) -> AgentId;

    /// Run the node's startup lifecycle.
    async fn start(&self) -> Result<()>;

    /// Issue a call to the node.
    async fn invoke(&self, call: NodeCall) -> Result<CallResponse>;

    /// Dump the node's local state.
    async fn snapshot(&self) -> Result<StateSnapshot>;
}

/// Blocks until the network under test reports that it has settled.
#[async_trait]
pub trait ConsistencyWait: Send + Sync {
    async fn wait_for_consistency(&self);
}
