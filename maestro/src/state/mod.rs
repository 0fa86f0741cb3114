//! Shared state: the [`Workpad`] every agent reads and the [`AgentRegistry`] the planner reads.
//!
//! The workpad maps each agent id to an append-only list of [`AgentResult`]s. Nothing
//! outside this crate can append: the only write path is
//! [`Agent::write_to_state`](crate::agent::Agent::write_to_state), which always targets the
//! calling agent's own key.

mod registry;

pub use registry::AgentRegistry;

use serde::{Deserialize, Serialize};

/// One turn's output, attributed to the agent that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentResult {
    pub content: String,
    pub producer: String,
    /// Workpad-wide append counter; orders results across agents.
    pub sequence: u64,
}

/// Per-agent result log, keyed in registration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Workpad {
    entries: Vec<(String, Vec<AgentResult>)>,
    next_sequence: u64,
}

impl Workpad {
    pub fn new() -> Self {
        Self::default()
    }

    fn position(&self, agent: &str) -> Option<usize> {
        self.entries.iter().position(|(k, _)| k == agent)
    }

    /// Creates an empty list for `agent` unless one exists. Returns whether it was created.
    pub(crate) fn ensure_key(&mut self, agent: &str) -> bool {
        if self.position(agent).is_some() {
            return false;
        }
        self.entries.push((agent.to_string(), Vec::new()));
        true
    }

    /// Appends under `agent`, creating the key when missing.
    pub(crate) fn append(&mut self, agent: &str, content: String) -> &AgentResult {
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        let idx = match self.position(agent) {
            Some(idx) => idx,
            None => {
                self.entries.push((agent.to_string(), Vec::new()));
                self.entries.len() - 1
            }
        };
        let results = &mut self.entries[idx].1;
        results.push(AgentResult {
            content,
            producer: agent.to_string(),
            sequence,
        });
        &results[results.len() - 1]
    }

    pub fn contains_key(&self, agent: &str) -> bool {
        self.position(agent).is_some()
    }

    /// All results of `agent`, oldest first. `None` when the key was never registered.
    pub fn results(&self, agent: &str) -> Option<&[AgentResult]> {
        self.position(agent).map(|i| self.entries[i].1.as_slice())
    }

    /// Most recent result of `agent`.
    pub fn latest(&self, agent: &str) -> Option<&AgentResult> {
        self.results(agent).and_then(|r| r.last())
    }

    /// `(agent, results)` pairs in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[AgentResult])> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Number of registered keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Results across all agents.
    pub fn total_results(&self) -> usize {
        self.entries.iter().map(|(_, v)| v.len()).sum()
    }

    /// Highest sequence among results not produced by `agent`.
    pub fn latest_sequence_excluding(&self, agent: &str) -> Option<u64> {
        self.entries
            .iter()
            .filter(|(k, _)| k != agent)
            .filter_map(|(_, v)| v.last().map(|r| r.sequence))
            .max()
    }
}
