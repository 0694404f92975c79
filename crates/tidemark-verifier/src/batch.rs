//! Fan-out over every instance in a cluster.

use std::future::Future;
use std::sync::Arc;

use futures::future::join_all;
use tidemark_core::{CallResponse, NodeCall, NodeHandle, Result};

/// How a batch visits its instances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Iteration {
    /// One instance at a time, in handle order.
    Series,
    /// All instances concurrently; waits for every call.
    #[default]
    Parallel,
}

/// A borrowed set of node handles plus an iteration mode.
///
/// Results are always returned in handle order, whatever the iteration mode.
#[derive(Clone, Copy)]
pub struct Batch<'a> {
    nodes: &'a [Arc<dyn NodeHandle>],
    iteration: Iteration,
}

impl<'a> Batch<'a> {
    pub fn new(nodes: &'a [Arc<dyn NodeHandle>]) -> Self {
        Self {
            nodes,
            iteration: Iteration::default(),
        }
    }

    /// Set the iteration mode.
    #[must_use]
    pub fn iteration(mut self, iteration: Iteration) -> Self {
        self.iteration = iteration;
        self
    }

    pub fn nodes(&self) -> &'a [Arc<dyn NodeHandle>] {
        self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Run `f` against every instance and collect the outputs.
    pub async fn map_instances<F, Fut, T>(&self, f: F) -> Vec<T>
    where
        F: Fn(&'a dyn NodeHandle) -> Fut,
        Fut: Future<Output = T>,
    {
        match self.iteration {
            Iteration::Series => {
                let mut out = Vec::with_capacity(self.nodes.len());
                for node in self.nodes {
                    out.push(f(node.as_ref()).await);
                }
                out
            }
            Iteration::Parallel => join_all(self.nodes.iter().map(|node| f(node.as_ref()))).await,
        }
    }

    /// Issue a call built per instance and collect the raw responses.
    pub async fn call_all<F>(&self, make_call: F) -> Vec<Result<CallResponse>>
    where
        F: Fn(&dyn NodeHandle) -> NodeCall,
    {
        self.map_instances(|node| {
            let call = make_call(node);
            invoke(node, call)
        })
        .await
    }
}

/// Validate a call at the boundary, then issue it.
pub async fn invoke(node: &dyn NodeHandle, call: NodeCall) -> Result<CallResponse> {
    call.validate()?;
    tracing::trace!(node = node.name(), call = call.name(), "invoking");
    node.invoke(call).await
}
