//! Tidemark Simulation
//!
//! An in-memory stand-in for a real peer-to-peer cluster, so verification
//! logic can be exercised deterministically.
//!
//! # Model
//!
//! - **Instances**: one [`SimNode`] per instance of a [`Topology`](tidemark_core::Topology)
//! - **Genesis**: starting writes `Dna`, `AgentId` and `CapTokenGrant`
//!   entries; only the agent entry is published
//! - **Gossip**: published entries are unheld until a gossip round replicates
//!   them to the closest live agents by XOR distance
//! - **Faults**: instances can go offline, fail to start, or fail state dumps,
//!   either on demand or at a configured random rate

mod cluster;
mod config;
mod network;
mod node;

pub use cluster::SimCluster;
pub use config::SimConfig;
pub use node::SimNode;
