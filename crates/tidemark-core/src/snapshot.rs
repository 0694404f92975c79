//! Per-node state snapshots.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::{AgentId, ChainEntry, EntryId};

/// One node's view of its own state, captured at a single instant.
///
/// Never mutated after capture; a fresh snapshot is taken on every poll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateSnapshot {
    /// The agent this snapshot belongs to.
    pub agent: AgentId,
    /// Entries this node authored, in commit order.
    pub source_chain: Vec<ChainEntry>,
    /// Entries this node currently stores on behalf of the network.
    pub held: BTreeSet<EntryId>,
}

impl StateSnapshot {
    pub fn new(agent: AgentId, source_chain: Vec<ChainEntry>, held: BTreeSet<EntryId>) -> Self {
        Self {
            agent,
            source_chain,
            held,
        }
    }

    /// Snapshot standing in for a node that could not be reached.
    pub fn empty(agent: AgentId) -> Self {
        Self::new(agent, Vec::new(), BTreeSet::new())
    }

    /// Authored entries that are expected to be replicated.
    pub fn replicated_entries(&self) -> impl Iterator<Item = &EntryId> {
        self.source_chain
            .iter()
            .filter(|e| !e.kind.is_system())
            .map(|e| &e.address)
    }

    /// Check whether this node holds an entry.
    pub fn holds(&self, id: &EntryId) -> bool {
        self.held.contains(id)
    }
}
