//! Error types for Tidemark.

use thiserror::Error;

/// Result type for Tidemark operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while driving or inspecting a cluster.
#[derive(Debug, Error)]
pub enum Error {
    /// A single node failed its startup lifecycle.
    #[error("node {node} failed to start: {reason}")]
    Start { node: String, reason: String },

    /// One or more nodes failed to start. Carries every individual failure.
    #[error("{} of {total} nodes failed to start", failures.len())]
    Startup { total: usize, failures: Vec<Error> },

    /// A remote call was rejected or could not be delivered.
    #[error("call `{call}` on {node} failed: {reason}")]
    Call {
        node: String,
        call: &'static str,
        reason: String,
    },

    /// A node could not produce a state snapshot.
    #[error("snapshot of {node} failed: {reason}")]
    Snapshot { node: String, reason: String },

    /// A call was rejected at the boundary before reaching any node.
    #[error("invalid call: {0}")]
    InvalidCall(String),

    /// A node answered with a response of the wrong shape.
    #[error("unexpected response to `{call}`: got {got}")]
    UnexpectedResponse {
        call: &'static str,
        got: &'static str,
    },

    /// Invalid run configuration.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Number of individual node failures this error represents.
    pub fn failure_count(&self) -> usize {
        match self {
            Error::Startup { failures, .. } => failures.len(),
            _ => 1,
        }
    }
}
