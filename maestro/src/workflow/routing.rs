//! Routing after a planner turn: parse its latest artifact and pick the named agent's node.

use std::collections::HashMap;

use crate::agent::Decision;
use crate::graph::END;
use crate::state::Workpad;

use super::node::node_id;

/// What to do when the planner's output cannot be routed (unparseable or unknown agent).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RoutingFailurePolicy {
    /// End the run.
    #[default]
    End,
    /// Run the planner again while it has failed at most `max_attempts` times in a row.
    Replan { max_attempts: usize },
}

impl RoutingFailurePolicy {
    /// `None` keeps [`RoutingFailurePolicy::End`]; `Some(n)` allows `n` replans.
    pub fn from_retries(retries: Option<usize>) -> Self {
        match retries {
            Some(max_attempts) => RoutingFailurePolicy::Replan { max_attempts },
            None => RoutingFailurePolicy::End,
        }
    }
}

/// Maps planner decisions to node ids. Accepts agent names and node ids.
#[derive(Debug, Clone)]
pub(crate) struct PlannerRouter {
    planner: String,
    targets: HashMap<String, String>,
    policy: RoutingFailurePolicy,
}

impl PlannerRouter {
    pub(crate) fn new<'a>(
        planner: &str,
        agents: impl IntoIterator<Item = &'a str>,
        policy: RoutingFailurePolicy,
    ) -> Self {
        let mut targets = HashMap::new();
        for name in agents {
            let id = node_id(name);
            targets.insert(name.to_string(), id.clone());
            targets.insert(id.clone(), id);
        }
        Self {
            planner: planner.to_string(),
            targets,
            policy,
        }
    }

    /// Next node id, or [`END`].
    pub(crate) fn route(&self, state: &Workpad) -> String {
        let Some(latest) = state.latest(&self.planner) else {
            tracing::warn!(planner = %self.planner, "no planner output to route on");
            return END.to_string();
        };
        let reason = match Decision::read(&latest.content) {
            Ok(decision) => match self.targets.get(decision.agent.trim()) {
                Some(target) => {
                    tracing::debug!(agent = %decision.agent, %target, "routing to agent");
                    return target.clone();
                }
                None => format!("unknown agent '{}'", decision.agent),
            },
            Err(e) => format!("unparseable decision: {e}"),
        };
        self.on_failure(state, &reason)
    }

    /// Planner results since the last result of any other agent.
    fn consecutive_planner_turns(&self, state: &Workpad) -> usize {
        let since = state.latest_sequence_excluding(&self.planner);
        state
            .results(&self.planner)
            .map(|results| {
                results
                    .iter()
                    .filter(|r| since.map_or(true, |s| r.sequence > s))
                    .count()
            })
            .unwrap_or(0)
    }

    fn on_failure(&self, state: &Workpad, reason: &str) -> String {
        match self.policy {
            RoutingFailurePolicy::End => {
                tracing::warn!(reason, "routing failed; ending run");
                END.to_string()
            }
            RoutingFailurePolicy::Replan { max_attempts } => {
                let failures = self.consecutive_planner_turns(state);
                if failures <= max_attempts {
                    tracing::warn!(reason, failures, max_attempts, "routing failed; asking the planner again");
                    node_id(&self.planner)
                } else {
                    tracing::warn!(reason, failures, max_attempts, "routing failed too often; ending run");
                    END.to_string()
                }
            }
        }
    }
}
