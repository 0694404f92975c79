//! The convergence verifier.
//!
//! Drives a borrowed set of node handles through startup, warm-up and a
//! commit workload, then polls their state until every committed entry is
//! held somewhere or the attempt budget runs out.
//!
//! # Polling contract
//!
//! - Every attempt collects fresh snapshots from every node concurrently
//! - `Pass` is only ever produced from the attempt that just ran
//! - `Fail` reports the final attempt's missing set, never an earlier one
//! - The expected set only grows within a run: ids seen in earlier attempts
//!   stay expected, but their holders are always recomputed

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use serde::Serialize;
use tidemark_core::{
    AgentId, CallResponse, ClusterView, ConsistencyWait, EntryId, Error, NodeCall, NodeHandle,
    Result, StateSnapshot,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::batch::{invoke, Batch, Iteration};
use crate::config::{VerifierConfig, WarmUp};

/// Outcome of a commit workload.
#[derive(Debug, Default)]
pub struct CommitReport {
    /// Addresses of every successful commit, iteration-major, handle order within.
    pub ids: Vec<EntryId>,
    /// Every failed commit call.
    pub failures: Vec<Error>,
}

impl CommitReport {
    pub fn attempted(&self) -> usize {
        self.ids.len() + self.failures.len()
    }

    pub fn all_succeeded(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Outcome of a verification run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum ConvergenceResult {
    /// The latest attempt saw every expected entry held.
    Pass { attempts: u32, view: ClusterView },
    /// Attempts exhausted; diagnostics from the final attempt.
    Fail {
        attempts: u32,
        missing: BTreeSet<EntryId>,
        held_by: BTreeMap<EntryId, BTreeSet<AgentId>>,
    },
    /// Stopped by the cancellation token; diagnostics from the last completed attempt.
    Cancelled {
        attempts: u32,
        missing: BTreeSet<EntryId>,
        held_by: BTreeMap<EntryId, BTreeSet<AgentId>>,
    },
}

impl ConvergenceResult {
    pub fn is_pass(&self) -> bool {
        matches!(self, ConvergenceResult::Pass { .. })
    }

    pub fn attempts(&self) -> u32 {
        match self {
            ConvergenceResult::Pass { attempts, .. }
            | ConvergenceResult::Fail { attempts, .. }
            | ConvergenceResult::Cancelled { attempts, .. } => *attempts,
        }
    }

    /// Entries still unheld; always empty for `Pass`.
    pub fn missing(&self) -> BTreeSet<EntryId> {
        match self {
            ConvergenceResult::Pass { .. } => BTreeSet::new(),
            ConvergenceResult::Fail { missing, .. } | ConvergenceResult::Cancelled { missing, .. } => {
                missing.clone()
            }
        }
    }

    /// One-line summary for logs and reports.
    pub fn summary(&self) -> String {
        match self {
            ConvergenceResult::Pass { attempts, view } => format!(
                "all {} entries held after {} attempt(s)",
                view.expected().len(),
                attempts
            ),
            ConvergenceResult::Fail {
                attempts, missing, ..
            } => format!("{} entries unheld after {} attempt(s)", missing.len(), attempts),
            ConvergenceResult::Cancelled {
                attempts, missing, ..
            } => format!(
                "cancelled after {} attempt(s) with {} entries unheld",
                attempts,
                missing.len()
            ),
        }
    }
}

/// Verifies that a cluster converges on the entries it committed.
///
/// Stateless between calls: each method takes the node handles it should
/// drive, and nothing is cached across runs. The only shared counter is the
/// commit round, so repeated workloads never reuse entry content.
#[derive(Debug, Clone)]
pub struct ConvergenceVerifier {
    config: VerifierConfig,
    cancel: CancellationToken,
    commit_round: Arc<AtomicU64>,
}

impl ConvergenceVerifier {
    /// Create a verifier after validating its configuration.
    pub fn new(config: VerifierConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            cancel: CancellationToken::new(),
            commit_round: Arc::new(AtomicU64::new(0)),
        })
    }

    /// Abort polling when `token` is cancelled.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn config(&self) -> &VerifierConfig {
        &self.config
    }

    /// Token that cancels this verifier's waits.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Start every node concurrently and wait for all of them.
    ///
    /// Failures are aggregated into a single [`Error::Startup`].
    pub async fn start(&self, nodes: &[Arc<dyn NodeHandle>]) -> Result<()> {
        let results = join_all(nodes.iter().map(|node| async move {
            node.start().await.map_err(|e| match e {
                e @ Error::Start { .. } => e,
                other => Error::Start {
                    node: node.name().to_string(),
                    reason: other.to_string(),
                },
            })
        }))
        .await;

        let failures: Vec<Error> = results.into_iter().filter_map(|r| r.err()).collect();
        if failures.is_empty() {
            info!(nodes = nodes.len(), "all nodes have started");
            Ok(())
        } else {
            for failure in &failures {
                warn!(error = %failure, "node failed to start");
            }
            Err(Error::Startup {
                total: nodes.len(),
                failures,
            })
        }
    }

    /// Give the cluster time to settle according to the configured policy.
    pub async fn warm_up(&self, consistency: &dyn ConsistencyWait) {
        match self.config.warm_up {
            WarmUp::Delay(delay) => {
                info!(?delay, "spin-up delay");
                self.pause(delay).await;
            }
            WarmUp::AwaitConsistency => {
                info!("no spin-up delay given, waiting for consistency");
                tokio::select! {
                    _ = self.cancel.cancelled() => {}
                    _ = consistency.wait_for_consistency() => {}
                }
            }
        }
    }

    /// Have every node commit `count` entries.
    ///
    /// Iterations run in sequence; within an iteration every node commits
    /// concurrently. Failed commits are recorded and never stop the workload.
    pub async fn drive_commits(&self, nodes: &[Arc<dyn NodeHandle>], count: usize) -> CommitReport {
        let mut report = CommitReport::default();
        if count > 0 {
            info!(count, nodes = nodes.len(), "asking all nodes to commit entries");
        }

        let batch = Batch::new(nodes).iteration(Iteration::Parallel);
        for iteration in 1..=count {
            let round = self.commit_round.fetch_add(1, Ordering::Relaxed) + 1;
            let results = batch
                .map_instances(|node| async move {
                    let content = format!("entry-{}-{}", node.name(), round);
                    invoke(node, NodeCall::commit(content))
                        .await
                        .and_then(CallResponse::into_committed)
                })
                .await;

            for result in results {
                match result {
                    Ok(id) => report.ids.push(id),
                    Err(e) => {
                        warn!(iteration, error = %e, "commit failed");
                        report.failures.push(e);
                    }
                }
            }
            debug!(
                iteration,
                committed = report.ids.len(),
                failed = report.failures.len(),
                "commit iteration done"
            );
        }
        report
    }

    /// Snapshot every node concurrently and fold the results into a view.
    ///
    /// A node that fails to answer contributes an empty snapshot and is listed
    /// as unreachable.
    pub async fn collect_state(&self, nodes: &[Arc<dyn NodeHandle>]) -> ClusterView {
        self.collect_with(nodes, &BTreeSet::new()).await
    }

    async fn collect_with(
        &self,
        nodes: &[Arc<dyn NodeHandle>],
        carried: &BTreeSet<EntryId>,
    ) -> ClusterView {
        let results = join_all(nodes.iter().map(|node| async move {
            debug!(node = node.name(), agent = %node.agent_id(), "calling state dump");
            (node.name(), node.agent_id(), node.snapshot().await)
        }))
        .await;

        let mut snapshots = Vec::with_capacity(results.len());
        let mut unreachable = Vec::new();
        for (name, agent, result) in results {
            match result {
                Ok(snapshot) => snapshots.push(snapshot),
                Err(e) => {
                    warn!(node = name, error = %e, "state dump failed, treating as empty");
                    snapshots.push(StateSnapshot::empty(agent));
                    unreachable.push(agent);
                }
            }
        }

        ClusterView::build(&snapshots, carried).with_unreachable(unreachable)
    }

    /// Poll until every expected entry is held or the attempt budget is spent.
    pub async fn verify_convergence(&self, nodes: &[Arc<dyn NodeHandle>]) -> ConvergenceResult {
        let retries = self.config.retries;
        let min_holders = self.config.min_holders;
        let mut carried = BTreeSet::new();
        let mut last: Option<(BTreeSet<EntryId>, ClusterView)> = None;

        for attempt in 1..=retries {
            if self.cancel.is_cancelled() {
                return Self::cancelled(attempt - 1, last);
            }

            info!(attempt, retries, "checking holding");
            let view = tokio::select! {
                _ = self.cancel.cancelled() => return Self::cancelled(attempt - 1, last),
                view = self.collect_with(nodes, &carried) => view,
            };
            debug!(
                entries = view.expected().len(),
                unreachable = view.unreachable().len(),
                "entries returned by state dumps"
            );
            for (id, holders) in view.held_by() {
                debug!(entry = %id, holders = holders.len(), "held by agents");
            }

            let missing = view.missing(min_holders);
            if missing.is_empty() {
                info!(attempt, entries = view.expected().len(), "all are held");
                return ConvergenceResult::Pass {
                    attempts: attempt,
                    view,
                };
            }

            info!(attempt, missing = missing.len(), "not all held");
            carried = view.expected().clone();
            last = Some((missing, view));

            if attempt < retries && !self.pause(self.config.retry_delay).await {
                return Self::cancelled(attempt, last);
            }
        }

        let (missing, view) = last.unwrap_or_default();
        warn!(attempts = retries, missing = missing.len(), "cluster did not converge");
        ConvergenceResult::Fail {
            attempts: retries,
            missing,
            held_by: view.held_by().clone(),
        }
    }

    /// Sleep unless cancelled first. Returns false on cancellation.
    async fn pause(&self, delay: Duration) -> bool {
        tokio::select! {
            _ = self.cancel.cancelled() => false,
            _ = tokio::time::sleep(delay) => true,
        }
    }

    fn cancelled(attempts: u32, last: Option<(BTreeSet<EntryId>, ClusterView)>) -> ConvergenceResult {
        info!(attempts, "verification cancelled");
        let (missing, view) = last.unwrap_or_default();
        ConvergenceResult::Cancelled {
            attempts,
            missing,
            held_by: view.held_by().clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{id, CallEvent, CallTracker, CountingConsistency, ScriptedNode, Step};
    use proptest::prelude::*;
    use tokio::time::Instant;

    fn handles(nodes: Vec<ScriptedNode>) -> Vec<Arc<dyn NodeHandle>> {
        nodes
            .into_iter()
            .map(|n| Arc::new(n) as Arc<dyn NodeHandle>)
            .collect()
    }

    fn verifier(retries: u32, delay_ms: u64) -> ConvergenceVerifier {
        ConvergenceVerifier::new(
            VerifierConfig::default()
                .with_retries(retries)
                .with_retry_delay(Duration::from_millis(delay_ms)),
        )
        .unwrap()
    }

    #[test]
    fn rejects_invalid_config() {
        assert!(ConvergenceVerifier::new(VerifierConfig::default().with_retries(0)).is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn empty_cluster_passes_first_attempt() {
        let result = verifier(3, 1000).verify_convergence(&[]).await;
        assert!(result.is_pass());
        assert_eq!(result.attempts(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn passes_after_second_attempt() {
        let (e1, e2, e3) = (id("e1"), id("e2"), id("e3"));
        let nodes = handles(vec![
            ScriptedNode::new("0:0").with_script(vec![Step::report(&[e1], &[e1])]),
            ScriptedNode::new("1:0").with_script(vec![Step::report(&[e2], &[e2])]),
            ScriptedNode::new("2:0").with_script(vec![
                Step::report(&[e3], &[]),
                Step::report(&[e3], &[e3]),
            ]),
        ]);

        let start = Instant::now();
        let result = verifier(2, 500).verify_convergence(&nodes).await;

        assert!(result.is_pass(), "{}", result.summary());
        assert_eq!(result.attempts(), 2);
        assert_eq!(start.elapsed(), Duration::from_millis(500));
        if let ConvergenceResult::Pass { view, .. } = result {
            assert_eq!(view.expected().len(), 3);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn fail_reports_final_attempt_missing_set() {
        let (a, b) = (id("a"), id("b"));
        // Attempt 1: a and b unheld. Attempts 2 and 3: only b unheld.
        let nodes = handles(vec![ScriptedNode::new("0:0").with_script(vec![
            Step::report(&[a, b], &[]),
            Step::report(&[a, b], &[a]),
        ])]);

        let result = verifier(3, 100).verify_convergence(&nodes).await;
        assert!(!result.is_pass());
        assert_eq!(result.attempts(), 3);
        assert_eq!(result.missing(), [b].into_iter().collect());
        if let ConvergenceResult::Fail { held_by, .. } = &result {
            assert_eq!(held_by[&a].len(), 1);
            assert!(held_by[&b].is_empty());
        } else {
            panic!("expected Fail, got {:?}", result);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn exact_attempt_count_and_no_trailing_sleep() {
        let x = id("x");
        let node = Arc::new(ScriptedNode::new("0:0").with_script(vec![Step::report(&[x], &[])]));
        let nodes: Vec<Arc<dyn NodeHandle>> = vec![node.clone() as Arc<dyn NodeHandle>];

        let start = Instant::now();
        let result = verifier(4, 1000).verify_convergence(&nodes).await;

        assert_eq!(result.attempts(), 4);
        assert_eq!(node.snapshot_calls(), 4);
        assert_eq!(start.elapsed(), Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn unreachable_sole_holder_surfaces_as_missing() {
        let e4 = id("e4");
        let nodes = handles(vec![
            ScriptedNode::new("0:0").with_script(vec![Step::report(&[e4], &[])]),
            ScriptedNode::new("1:0").with_script(vec![Step::Unreachable]),
        ]);

        let verifier = verifier(1, 0);
        let view = verifier.collect_state(&nodes).await;
        assert_eq!(view.unreachable(), &[AgentId::for_name("1:0")]);
        assert!(view.missing(1).contains(&e4));

        let result = verifier.verify_convergence(&nodes).await;
        assert_eq!(result.missing(), [e4].into_iter().collect());
    }

    #[tokio::test(start_paused = true)]
    async fn expected_set_is_carried_across_attempts() {
        let e = id("authored-by-flaky-node");
        // The author reports its entry once, then goes dark.
        let nodes = handles(vec![
            ScriptedNode::new("0:0").with_script(vec![Step::report(&[e], &[]), Step::Unreachable]),
            ScriptedNode::new("1:0").with_script(vec![Step::report(&[], &[])]),
        ]);

        let result = verifier(2, 10).verify_convergence(&nodes).await;
        assert!(!result.is_pass());
        assert!(result.missing().contains(&e));
    }

    #[tokio::test(start_paused = true)]
    async fn stricter_holder_threshold() {
        let e = id("e");
        let nodes = handles(vec![
            ScriptedNode::new("0:0").with_script(vec![Step::report(&[e], &[e])]),
            ScriptedNode::new("1:0").with_script(vec![Step::report(&[], &[])]),
        ]);
        let strict = ConvergenceVerifier::new(
            VerifierConfig::default()
                .with_retries(1)
                .with_min_holders(2),
        )
        .unwrap();
        assert!(!strict.verify_convergence(&nodes).await.is_pass());
        assert!(verifier(1, 0).verify_convergence(&nodes).await.is_pass());
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_interrupts_retry_sleep() {
        let x = id("x");
        let nodes = handles(vec![ScriptedNode::new("0:0").with_script(vec![Step::report(&[x], &[])])]);
        let verifier = verifier(10, 60_000);
        let token = verifier.cancellation_token();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(90)).await;
            token.cancel();
        });

        let result = verifier.verify_convergence(&nodes).await;
        assert!(matches!(result, ConvergenceResult::Cancelled { attempts: 2, .. }));
        assert!(result.missing().contains(&x));
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_before_first_attempt() {
        let token = CancellationToken::new();
        token.cancel();
        let verifier = verifier(3, 10).with_cancellation(token);
        let result = verifier.verify_convergence(&[]).await;
        assert!(matches!(result, ConvergenceResult::Cancelled { attempts: 0, .. }));
    }

    #[tokio::test]
    async fn start_aggregates_all_failures() {
        let ok = Arc::new(ScriptedNode::new("0:0"));
        let nodes: Vec<Arc<dyn NodeHandle>> = vec![
            ok.clone() as Arc<dyn NodeHandle>,
            Arc::new(ScriptedNode::new("1:0").failing_start("port in use")),
            Arc::new(ScriptedNode::new("2:0").failing_start("bad dna")),
        ];

        let err = verifier(1, 0).start(&nodes).await.unwrap_err();
        match err {
            Error::Startup { total, failures } => {
                assert_eq!(total, 3);
                assert_eq!(failures.len(), 2);
            }
            other => panic!("expected Startup, got {:?}", other),
        }
        // Healthy nodes still ran their lifecycle.
        assert!(ok.is_started());
    }

    #[tokio::test(start_paused = true)]
    async fn warm_up_sleeps_for_fixed_delay() {
        let consistency = CountingConsistency::default();
        let verifier = ConvergenceVerifier::new(
            VerifierConfig::default().with_warm_up(WarmUp::Delay(Duration::from_secs(5))),
        )
        .unwrap();

        let start = Instant::now();
        verifier.warm_up(&consistency).await;
        assert_eq!(start.elapsed(), Duration::from_secs(5));
        assert_eq!(consistency.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn warm_up_awaits_consistency() {
        let consistency = CountingConsistency::default();
        let verifier = ConvergenceVerifier::new(VerifierConfig::default()).unwrap();

        let start = Instant::now();
        verifier.warm_up(&consistency).await;
        assert_eq!(start.elapsed(), Duration::ZERO);
        assert_eq!(consistency.calls(), 1);
    }

    #[tokio::test]
    async fn commit_failures_do_not_stop_the_workload() {
        let nodes = handles(vec![
            ScriptedNode::new("0:0"),
            ScriptedNode::new("1:0").failing_commits(),
            ScriptedNode::new("2:0"),
        ]);

        let report = verifier(1, 0).drive_commits(&nodes, 3).await;
        assert_eq!(report.attempted(), 9);
        assert_eq!(report.ids.len(), 6);
        assert_eq!(report.failures.len(), 3);
        assert!(!report.all_succeeded());
    }

    #[tokio::test]
    async fn committed_entries_converge_when_self_held() {
        let nodes = handles(vec![ScriptedNode::new("0:0"), ScriptedNode::new("1:0")]);
        let verifier = verifier(1, 0);
        let report = verifier.drive_commits(&nodes, 2).await;
        let result = verifier.verify_convergence(&nodes).await;

        assert!(result.is_pass());
        if let ConvergenceResult::Pass { view, .. } = result {
            let expected: BTreeSet<_> = report.ids.iter().copied().collect();
            assert_eq!(view.expected(), &expected);
        }
    }

    fn tracked_cluster(n: usize, delay_ms: u64) -> (Vec<Arc<dyn NodeHandle>>, Arc<CallTracker>) {
        let tracker = Arc::new(CallTracker::default());
        let nodes = (0..n)
            .map(|i| {
                ScriptedNode::new(&format!("{}:0", i))
                    .tracked(Duration::from_millis(delay_ms), Arc::clone(&tracker))
            })
            .collect();
        (handles(nodes), tracker)
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_interrupts_a_hung_state_dump() {
        let x = id("x");
        let nodes = handles(vec![
            ScriptedNode::new("0:0").with_script(vec![Step::report(&[x], &[]), Step::Hang]),
        ]);
        let verifier = verifier(5, 10_000);
        let token = verifier.cancellation_token();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(15)).await;
            token.cancel();
        });

        let start = Instant::now();
        let result = verifier.verify_convergence(&nodes).await;
        assert_eq!(start.elapsed(), Duration::from_secs(15));
        assert!(matches!(result, ConvergenceResult::Cancelled { attempts: 1, .. }));
        assert!(result.missing().contains(&x));
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_during_first_state_dump() {
        let nodes = handles(vec![ScriptedNode::new("0:0").with_script(vec![Step::Hang])]);
        let verifier = verifier(3, 1000);
        let token = verifier.cancellation_token();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            token.cancel();
        });

        let result = verifier.verify_convergence(&nodes).await;
        assert!(matches!(result, ConvergenceResult::Cancelled { attempts: 0, .. }));
        assert!(result.missing().is_empty());
    }

    #[tokio::test]
    async fn repeated_workloads_commit_distinct_entries() {
        let nodes = handles(vec![ScriptedNode::new("0:0"), ScriptedNode::new("1:0")]);
        let verifier = verifier(1, 0);

        let first = verifier.drive_commits(&nodes, 1).await;
        let second = verifier.drive_commits(&nodes, 2).await;
        let all: BTreeSet<EntryId> = first.ids.iter().chain(&second.ids).copied().collect();
        assert_eq!(all.len(), 6);

        let view = verifier.collect_state(&nodes).await;
        assert_eq!(view.expected(), &all);
    }

    #[tokio::test(start_paused = true)]
    async fn start_runs_every_node_concurrently() {
        let (nodes, tracker) = tracked_cluster(4, 100);

        let start = Instant::now();
        verifier(1, 0).start(&nodes).await.unwrap();
        assert_eq!(start.elapsed(), Duration::from_millis(100));
        assert_eq!(tracker.peak(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn collect_state_snapshots_every_node_concurrently() {
        let (nodes, tracker) = tracked_cluster(4, 100);

        let start = Instant::now();
        let view = verifier(1, 0).collect_state(&nodes).await;
        assert_eq!(start.elapsed(), Duration::from_millis(100));
        assert_eq!(tracker.peak(), 4);
        assert!(view.unreachable().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn commit_iterations_overlap_within_and_never_across() {
        let (nodes, tracker) = tracked_cluster(3, 100);

        let start = Instant::now();
        let report = verifier(1, 0).drive_commits(&nodes, 3).await;
        assert_eq!(report.ids.len(), 9);
        assert_eq!(start.elapsed(), Duration::from_millis(300));
        assert_eq!(tracker.peak(), 3);

        // Commit content ends in its round number.
        let round = |label: &str| -> u64 { label.rsplit('-').next().unwrap().parse().unwrap() };
        let events = tracker.events();
        for r in 1..3u64 {
            let last_end = events
                .iter()
                .rposition(|e| matches!(e, CallEvent::End(l) if round(l) == r))
                .unwrap();
            let next_begin = events
                .iter()
                .position(|e| matches!(e, CallEvent::Begin(l) if round(l) == r + 1))
                .unwrap();
            assert!(last_end < next_begin, "round {} overlapped round {}", r, r + 1);
        }
    }

    proptest! {
        #[test]
        fn expected_size_matches_successful_commits(
            healthy in 0usize..5,
            failing in 0usize..3,
            count in 0usize..4,
        ) {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .unwrap();

            let mut nodes = Vec::new();
            for i in 0..healthy {
                nodes.push(ScriptedNode::new(&format!("{}:0", i)));
            }
            for i in 0..failing {
                nodes.push(ScriptedNode::new(&format!("{}:0", healthy + i)).failing_commits());
            }
            let nodes = handles(nodes);

            let verifier = verifier(1, 0);
            let (report, view) = runtime.block_on(async {
                let report = verifier.drive_commits(&nodes, count).await;
                let view = verifier.collect_state(&nodes).await;
                (report, view)
            });

            prop_assert_eq!(report.ids.len(), healthy * count);
            prop_assert_eq!(report.failures.len(), failing * count);
            prop_assert_eq!(view.expected().len(), report.ids.len());
        }
    }
}
