//! Tidemark Verifier
//!
//! Drives a cluster of independent nodes and decides whether it has
//! converged on the entries it committed.
//!
//! # Flow
//!
//! 1. **Start**: every node's startup lifecycle runs concurrently
//! 2. **Warm up**: a fixed spin-up delay, or the network's consistency signal
//! 3. **Commit**: each node commits entries, one concurrent round per iteration
//! 4. **Verify**: poll snapshots until every committed entry is held
//!
//! # Example
//!
//! ```rust,ignore
//! use tidemark_verifier::{ConvergenceVerifier, VerifierConfig};
//!
//! let verifier = ConvergenceVerifier::new(VerifierConfig::default().with_commit_count(5))?;
//! verifier.start(&nodes).await?;
//! verifier.warm_up(&cluster).await;
//! let commits = verifier.drive_commits(&nodes, 5).await;
//! let result = verifier.verify_convergence(&nodes).await;
//! assert!(result.is_pass(), "{}", result.summary());
//! ```

pub mod batch;
pub mod config;
pub mod scenario;
pub mod verifier;

#[cfg(test)]
mod testing;

pub use batch::{Batch, Iteration};
pub use config::{StressConfig, VerifierConfig, WarmUp};
pub use scenario::{Check, Scenario, ScenarioReport};
pub use verifier::{CommitReport, ConvergenceResult, ConvergenceVerifier};
pub use tokio_util::sync::CancellationToken;
