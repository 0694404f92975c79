//! Tidemark Core
//!
//! Data model and collaborator contracts for checking that a cluster of
//! independent nodes has converged on the entries it committed.
//!
//! # Model
//!
//! - **NodeHandle**: one participant; accepts typed [`NodeCall`]s and dumps
//!   its local state as a [`StateSnapshot`]
//! - **StateSnapshot**: a node's source chain plus the entries it holds
//! - **ClusterView**: all snapshots for one poll, folded into an expected set
//!   and a holder map
//!
//! Entries of system kinds (`Dna`, `CapTokenGrant`) are private to their
//! author and never count towards the expected set.

mod call;
mod entry;
pub mod error;
mod handle;
mod snapshot;
mod topology;
mod view;

pub use call::{CallResponse, NodeCall, MAX_CONTENT_LEN};
pub use entry::{AgentId, ChainEntry, EntryId, EntryKind};
pub use error::{Error, Result};
pub use handle::{ConsistencyWait, NodeHandle};
pub use snapshot::StateSnapshot;
pub use topology::Topology;
pub use view::ClusterView;
