//! Cluster-wide aggregation of node snapshots.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::{AgentId, EntryId, StateSnapshot};

/// Aggregate view of the cluster for one polling attempt.
///
/// Built fresh from snapshots on every poll. The expected set is the union of
/// every replicated entry authored by any node (plus any ids carried over from
/// earlier polls in the same run), and each expected id maps to the agents
/// whose snapshot claims to hold it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterView {
    expected: BTreeSet<EntryId>,
    held_by: BTreeMap<EntryId, BTreeSet<AgentId>>,
    unreachable: Vec<AgentId>,
}

impl ClusterView {
    /// Build a view from one snapshot per node.
    ///
    /// `carried` ids are kept in the expected set even if no snapshot in this
    /// attempt authored them; their holders still come from these snapshots.
    pub fn build(snapshots: &[StateSnapshot], carried: &BTreeSet<EntryId>) -> Self {
        let mut expected = carried.clone();
        for snapshot in snapshots {
            expected.extend(snapshot.replicated_entries().copied());
        }

        let held_by = expected
            .iter()
            .map(|id| {
                let holders = snapshots
                    .iter()
                    .filter(|s| s.holds(id))
                    .map(|s| s.agent)
                    .collect();
                (*id, holders)
            })
            .collect();

        Self {
            expected,
            held_by,
            unreachable: Vec::new(),
        }
    }

    /// Record agents whose snapshot could not be collected this attempt.
    pub fn with_unreachable(mut self, unreachable: Vec<AgentId>) -> Self {
        self.unreachable = unreachable;
        self
    }

    /// Every id the cluster is expected to hold.
    pub fn expected(&self) -> &BTreeSet<EntryId> {
        &self.expected
    }

    /// Holder sets keyed by expected id.
    pub fn held_by(&self) -> &BTreeMap<EntryId, BTreeSet<AgentId>> {
        &self.held_by
    }

    /// Agents that did not answer this attempt.
    pub fn unreachable(&self) -> &[AgentId] {
        &self.unreachable
    }

    /// Number of agents holding an id (0 for ids outside the expected set).
    pub fn holder_count(&self, id: &EntryId) -> usize {
        self.held_by.get(id).map_or(0, BTreeSet::len)
    }

    /// Expected ids with fewer than `min_holders` holders.
    pub fn missing(&self, min_holders: usize) -> BTreeSet<EntryId> {
        self.expected
            .iter()
            .filter(|id| self.holder_count(id) < min_holders)
            .copied()
            .collect()
    }

    /// Whether every expected id has at least `min_holders` holders.
    pub fn is_converged(&self, min_holders: usize) -> bool {
        self.expected
            .iter()
            .all(|id| self.holder_count(id) >= min_holders)
    }

    /// Smallest holder count across the expected set, if any.
    pub fn min_holders(&self) -> Option<usize> {
        self.expected.iter().map(|id| self.holder_count(id)).min()
    }
}
