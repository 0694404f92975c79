//! Shared state of the simulated network.
//!
//! Every agent's source chain and held set live here, together with the
//! content and links that have been published. Replication happens only in
//! [`NetworkState::gossip_round`]: a published entry is assigned to the online
//! agents closest to it by XOR distance until it reaches the replication
//! factor.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tidemark_core::{AgentId, ChainEntry, EntryId, EntryKind, StateSnapshot};

use crate::config::SimConfig;

/// Per-agent state.
#[derive(Debug, Clone)]
pub(crate) struct AgentState {
    pub name: String,
    pub started: bool,
    pub online: bool,
    /// Startup fails with this reason when set.
    pub start_failure: Option<String>,
    /// Every snapshot fails while set.
    pub snapshot_failure: bool,
    pub chain: Vec<ChainEntry>,
    pub held: BTreeSet<EntryId>,
}

impl AgentState {
    fn new(name: String) -> Self {
        Self {
            name,
            started: false,
            online: true,
            start_failure: None,
            snapshot_failure: false,
            chain: Vec::new(),
            held: BTreeSet::new(),
        }
    }

    /// Able to serve reads and receive gossip.
    pub fn is_live(&self) -> bool {
        self.started && self.online
    }
}

/// A link from a base entry, tagged with the address of its `LinkAdd` entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Link {
    pub link: EntryId,
    pub target: EntryId,
}

#[derive(Debug)]
pub(crate) struct NetworkState {
    pub agents: BTreeMap<AgentId, AgentState>,
    /// App entry content by address.
    contents: HashMap<EntryId, String>,
    links: HashMap<EntryId, Vec<Link>>,
    /// Every entry that has been published for replication.
    published: BTreeSet<EntryId>,
    replication_factor: usize,
    snapshot_failure_rate: f64,
    rng: StdRng,
}

/// Shared Dna entry; identical on every chain in the network.
pub(crate) fn dna_entry() -> EntryId {
    EntryId::for_content("dna")
}

impl NetworkState {
    pub fn new(config: &SimConfig, names: &[String]) -> Self {
        let agents = names
            .iter()
            .map(|name| (AgentId::for_name(name), AgentState::new(name.clone())))
            .collect();
        Self {
            agents,
            contents: HashMap::new(),
            links: HashMap::new(),
            published: BTreeSet::new(),
            replication_factor: config.replication_factor,
            snapshot_failure_rate: config.snapshot_failure_rate,
            rng: StdRng::seed_from_u64(config.seed),
        }
    }

    pub fn agent(&self, agent: &AgentId) -> Option<&AgentState> {
        self.agents.get(agent)
    }

    pub fn agent_mut(&mut self, agent: &AgentId) -> Option<&mut AgentState> {
        self.agents.get_mut(agent)
    }

    /// Write the genesis entries for an agent. Only the agent entry is published.
    pub fn genesis(&mut self, agent: &AgentId) {
        let Some(state) = self.agents.get_mut(agent) else {
            return;
        };
        if state.started {
            return;
        }
        let agent_entry = EntryId::for_content(&format!("agent:{}", agent.to_hex()));
        let grant = EntryId::for_content(&format!("cap-grant:{}", agent.to_hex()));
        state.chain.extend([
            ChainEntry::new(dna_entry(), EntryKind::Dna),
            ChainEntry::new(agent_entry, EntryKind::AgentId),
            ChainEntry::new(grant, EntryKind::CapTokenGrant),
        ]);
        state.started = true;
        self.published.insert(agent_entry);
    }

    /// Author an app entry and publish it.
    pub fn commit(&mut self, agent: &AgentId, content: String) -> Option<EntryId> {
        let state = self.agents.get_mut(agent)?;
        let address = EntryId::for_content(&content);
        state.chain.push(ChainEntry::app(address));
        self.contents.insert(address, content);
        self.published.insert(address);
        Some(address)
    }

    /// Author a `LinkAdd` entry from `base` to `target` and publish it.
    pub fn link(&mut self, agent: &AgentId, base: EntryId, target: EntryId) -> Option<EntryId> {
        let state = self.agents.get_mut(agent)?;
        let link = EntryId::for_content(&format!("link:{}:{}", base.to_hex(), target.to_hex()));
        state.chain.push(ChainEntry::new(link, EntryKind::LinkAdd));
        let links = self.links.entry(base).or_default();
        if !links.iter().any(|l| l.link == link) {
            links.push(Link { link, target });
        }
        self.published.insert(link);
        Some(link)
    }

    /// Whether some live agent holds `id`.
    pub fn is_available(&self, id: &EntryId) -> bool {
        self.agents.values().any(|a| a.is_live() && a.held.contains(id))
    }

    /// Content of `address` as seen by `reader`: its own entries, or anything
    /// a live agent holds.
    pub fn get_entry(&self, reader: &AgentId, address: &EntryId) -> Option<String> {
        let authored = self
            .agents
            .get(reader)
            .is_some_and(|a| a.chain.iter().any(|e| e.address == *address));
        if authored || self.is_available(address) {
            self.contents.get(address).cloned()
        } else {
            None
        }
    }

    /// Link targets of `base` whose `LinkAdd` entry is available.
    pub fn get_links(&self, base: &EntryId) -> Vec<EntryId> {
        self.links
            .get(base)
            .map(|links| {
                links
                    .iter()
                    .filter(|l| self.is_available(&l.link))
                    .map(|l| l.target)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Snapshot of an agent, or `None` if the call should fail.
    pub fn snapshot(&mut self, agent: &AgentId) -> Option<StateSnapshot> {
        let rate = self.snapshot_failure_rate;
        let roll_failed = rate > 0.0 && self.rng.gen_bool(rate);
        let state = self.agents.get(agent)?;
        if !state.online || state.snapshot_failure || roll_failed {
            return None;
        }
        Some(StateSnapshot::new(*agent, state.chain.clone(), state.held.clone()))
    }

    fn live_agents(&self) -> Vec<AgentId> {
        self.agents
            .iter()
            .filter(|(_, a)| a.is_live())
            .map(|(id, _)| *id)
            .collect()
    }

    fn target_holders(&self, live: usize) -> usize {
        self.replication_factor.min(live)
    }

    /// Published entries with fewer live holders than they should have.
    pub fn under_replicated(&self) -> usize {
        let live = self.live_agents();
        let target = self.target_holders(live.len());
        self.published
            .iter()
            .filter(|id| self.live_holder_count(id) < target)
            .count()
    }

    fn live_holder_count(&self, id: &EntryId) -> usize {
        self.agents
            .values()
            .filter(|a| a.is_live() && a.held.contains(id))
            .count()
    }

    /// Replicate every under-replicated entry to its closest live agents.
    /// Returns the number of new (agent, entry) holdings created.
    pub fn gossip_round(&mut self) -> usize {
        let live = self.live_agents();
        let target = self.target_holders(live.len());
        let mut assigned = 0;

        for id in &self.published {
            let mut closest = live.clone();
            closest.sort_by_key(|agent| agent.distance(id.as_bytes()));

            let mut holders = closest
                .iter()
                .filter(|a| self.agents[*a].held.contains(id))
                .count();
            for agent in &closest {
                if holders >= target {
                    break;
                }
                if let Some(state) = self.agents.get_mut(agent) {
                    if state.held.insert(*id) {
                        holders += 1;
                        assigned += 1;
                    }
                }
            }
        }
        assigned
    }
}
