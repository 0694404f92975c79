//! Cluster shape descriptor.

use serde::{Deserialize, Serialize};

/// Shape of a cluster: machines, conductors per machine, instances per conductor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topology {
    /// Machines in the cluster.
    pub nodes: usize,
    /// Conductor processes per machine.
    pub conductors: usize,
    /// App instances per conductor.
    pub instances: usize,
}

impl Default for Topology {
    fn default() -> Self {
        Self {
            nodes: 1,
            conductors: 10,
            instances: 1,
        }
    }
}

impl Topology {
    pub const fn new(nodes: usize, conductors: usize, instances: usize) -> Self {
        Self {
            nodes,
            conductors,
            instances,
        }
    }

    /// Total conductor processes (N*C).
    pub const fn total_conductors(&self) -> usize {
        self.nodes * self.conductors
    }

    /// Total app instances (N*C*I).
    pub const fn total_instances(&self) -> usize {
        self.nodes * self.conductors * self.instances
    }

    /// Instance labels in `"{conductor}:{instance}"` form, sorted by conductor.
    pub fn instance_names(&self) -> Vec<String> {
        (0..self.total_conductors())
            .flat_map(|c| (0..self.instances).map(move |i| format!("{}:{}", c, i)))
            .collect()
    }
}
