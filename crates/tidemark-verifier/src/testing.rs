//! Scripted node doubles for verifier tests.

use std::collections::{BTreeSet, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tidemark_core::{
    AgentId, CallResponse, ChainEntry, ConsistencyWait, EntryId, Error, NodeCall, NodeHandle,
    Result, StateSnapshot,
};

/// What a scripted node reports for one snapshot call.
#[derive(Debug, Clone)]
pub(crate) enum Step {
    /// Report these authored and held entries.
    Report {
        authored: Vec<EntryId>,
        held: Vec<EntryId>,
    },
    /// Fail the snapshot call.
    Unreachable,
    /// Never answer.
    Hang,
}

impl Step {
    pub(crate) fn report(authored: &[EntryId], held: &[EntryId]) -> Self {
        Step::Report {
            authored: authored.to_vec(),
            held: held.to_vec(),
        }
    }
}

pub(crate) fn id(content: &str) -> EntryId {
    EntryId::for_content(content)
}

/// One call observed by a [`CallTracker`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum CallEvent {
    Begin(String),
    End(String),
}

/// Records call boundaries and peak concurrency across a set of nodes.
#[derive(Default)]
pub(crate) struct CallTracker {
    in_flight: AtomicUsize,
    peak: AtomicUsize,
    events: Mutex<Vec<CallEvent>>,
}

impl CallTracker {
    fn enter(&self, label: &str) {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        self.events.lock().unwrap().push(CallEvent::Begin(label.to_string()));
    }

    fn exit(&self, label: &str) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.events.lock().unwrap().push(CallEvent::End(label.to_string()));
    }

    pub(crate) fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    pub(crate) fn events(&self) -> Vec<CallEvent> {
        self.events.lock().unwrap().clone()
    }
}

/// A node that answers from a script instead of a network.
///
/// Without a script, snapshots report every committed entry as authored and
/// held by this node. With a script, steps are consumed one per snapshot call
/// and the final step repeats once the script runs out.
pub(crate) struct ScriptedNode {
    name: String,
    agent: AgentId,
    start_error: Option<String>,
    fail_commits: bool,
    started: AtomicBool,
    commits: Mutex<Vec<EntryId>>,
    script: Mutex<VecDeque<Step>>,
    last_step: Mutex<Option<Step>>,
    snapshot_calls: AtomicUsize,
    delay: Duration,
    tracker: Option<Arc<CallTracker>>,
}

impl ScriptedNode {
    pub(crate) fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            agent: AgentId::for_name(name),
            start_error: None,
            fail_commits: false,
            started: AtomicBool::new(false),
            commits: Mutex::new(Vec::new()),
            script: Mutex::new(VecDeque::new()),
            last_step: Mutex::new(None),
            snapshot_calls: AtomicUsize::new(0),
            delay: Duration::ZERO,
            tracker: None,
        }
    }

    /// Take `delay` to answer every call, reporting each one to `tracker`.
    pub(crate) fn tracked(mut self, delay: Duration, tracker: Arc<CallTracker>) -> Self {
        self.delay = delay;
        self.tracker = Some(tracker);
        self
    }

    pub(crate) fn failing_start(mut self, reason: &str) -> Self {
        self.start_error = Some(reason.to_string());
        self
    }

    pub(crate) fn failing_commits(mut self) -> Self {
        self.fail_commits = true;
        self
    }

    pub(crate) fn with_script(self, steps: Vec<Step>) -> Self {
        *self.script.lock().unwrap() = steps.into();
        self
    }

    pub(crate) fn is_started(&self) -> bool {
        self.started.load(Ordering::SeqCst)
    }

    pub(crate) fn commits_received(&self) -> usize {
        self.commits.lock().unwrap().len()
    }

    pub(crate) fn snapshot_calls(&self) -> usize {
        self.snapshot_calls.load(Ordering::SeqCst)
    }

    fn next_step(&self) -> Option<Step> {
        let mut script = self.script.lock().unwrap();
        let mut last = self.last_step.lock().unwrap();
        if let Some(step) = script.pop_front() {
            *last = Some(step);
        }
        last.clone()
    }

    async fn respond(&self, label: String) {
        if let Some(tracker) = &self.tracker {
            tracker.enter(&label);
        }
        if self.delay.is_zero() {
            tokio::task::yield_now().await;
        } else {
            tokio::time::sleep(self.delay).await;
        }
        if let Some(tracker) = &self.tracker {
            tracker.exit(&label);
        }
    }

    fn answer(call: NodeCall) -> CallResponse {
        match call {
            NodeCall::CommitEntry { content } => CallResponse::Committed(EntryId::for_content(&content)),
            NodeCall::GetEntry { .. } => CallResponse::Entry(None),
            NodeCall::LinkEntries { base, target } => CallResponse::Linked(EntryId::for_content(
                &format!("{}->{}", base.to_hex(), target.to_hex()),
            )),
            NodeCall::GetLinks { .. } => CallResponse::Links(Vec::new()),
            NodeCall::Send { .. } => CallResponse::Sent("success".into()),
        }
    }
}

#[async_trait]
impl NodeHandle for ScriptedNode {
    fn name(&self) -> &str {
        &self.name
    }

    fn agent_id(&self) -> AgentId {
        self.agent
    }

    async fn start(&self) -> Result<()> {
        self.respond(format!("start:{}", self.name)).await;
        if let Some(reason) = &self.start_error {
            return Err(Error::Start {
                node: self.name.clone(),
                reason: reason.clone(),
            });
        }
        self.started.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn invoke(&self, call: NodeCall) -> Result<CallResponse> {
        match call {
            NodeCall::CommitEntry { content } => {
                self.respond(format!("commit:{}", content)).await;
                if self.fail_commits {
                    return Err(Error::Call {
                        node: self.name.clone(),
                        call: "commit_entry",
                        reason: "source chain locked".into(),
                    });
                }
                let address = EntryId::for_content(&content);
                self.commits.lock().unwrap().push(address);
                Ok(CallResponse::Committed(address))
            }
            other => {
                self.respond(other.name().to_string()).await;
                Ok(Self::answer(other))
            }
        }
    }

    async fn snapshot(&self) -> Result<StateSnapshot> {
        self.respond(format!("snapshot:{}", self.name)).await;
        self.snapshot_calls.fetch_add(1, Ordering::SeqCst);
        match self.next_step() {
            Some(Step::Hang) => std::future::pending().await,
            Some(Step::Unreachable) => Err(Error::Snapshot {
                node: self.name.clone(),
                reason: "connection reset".into(),
            }),
            Some(Step::Report { authored, held }) => Ok(StateSnapshot::new(
                self.agent,
                authored.into_iter().map(ChainEntry::app).collect(),
                held.into_iter().collect(),
            )),
            None => {
                let commits = self.commits.lock().unwrap().clone();
                let held: BTreeSet<_> = commits.iter().copied().collect();
                Ok(StateSnapshot::new(
                    self.agent,
                    commits.into_iter().map(ChainEntry::app).collect(),
                    held,
                ))
            }
        }
    }
}

/// Consistency signal that returns immediately and counts how often it was awaited.
#[derive(Default)]
pub(crate) struct CountingConsistency {
    calls: AtomicUsize,
}

impl CountingConsistency {
    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ConsistencyWait for CountingConsistency {
    async fn wait_for_consistency(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}
