//! Agents: the planner, the reporter and tool-calling workers behind one [`Agent`] trait.
//!
//! Every agent reads the whole [`Workpad`] and writes only under its own name. Workers take
//! their instructions from the planner's latest [`DecisionArtifact`] (`step_4.final_draft`);
//! the planner takes its instructions from the prompt set.

mod decision;
mod planner;
mod reporter;
mod tool_calling;
mod workers;

pub use decision::{AgentAlignment, Decision, DecisionArtifact, DecisionError, Drafting, Review, WorkpadReview};
pub use planner::PlannerAgent;
pub use reporter::ReporterAgent;
pub use tool_calling::{ToolCallable, ToolCallingAgent};
pub use workers::{
    RagParams, RagTool, ScholarParams, ScholarSearch, ScrapeParams, SearchParams, SerperSearch,
    ShoppingSearch, TavilyParams, TavilySearch, WebScraper, DEFAULT_LOCATION,
};

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::AgentError;
use crate::state::{AgentRegistry, Workpad};

/// Name the planner registers under unless configured otherwise.
pub const DEFAULT_PLANNER_NAME: &str = "meta_agent";
/// Name the reporter registers under unless configured otherwise.
pub const DEFAULT_REPORTER_NAME: &str = "reporter_agent";

/// Where an agent gets the instructions for its turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstructionSource {
    /// From outside the workpad (the planner's prompt).
    External,
    /// From the planner's latest artifact in the workpad.
    SharedState,
}

/// Position of an agent in the dispatch graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentRole {
    Planner,
    Worker,
    Reporter,
}

/// Result of one [`Agent::invoke`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    /// Content to append under the agent's key.
    Produced(String),
    /// Nothing to do this turn; state stays unchanged.
    NoOp,
}

/// Read-only inputs of a turn besides the workpad.
#[derive(Debug, Clone)]
pub struct TurnContext {
    /// User requirements for this run.
    pub requirements: String,
    /// Worker descriptions, frozen after registration.
    pub registry: Arc<AgentRegistry>,
    /// Name of the roster's planner; workers read instructions from its key.
    pub planner: String,
}

impl TurnContext {
    pub fn new(requirements: impl Into<String>, registry: Arc<AgentRegistry>, planner: impl Into<String>) -> Self {
        Self {
            requirements: requirements.into(),
            registry,
            planner: planner.into(),
        }
    }
}

/// One participant of the orchestration loop.
///
/// Implementors provide identity and [`invoke`](Agent::invoke); registration, state
/// writes and the full turn are provided.
///
/// # Interaction
///
/// - **Workflow**: calls [`register`](Agent::register) once per agent at build time, then
///   [`run_turn`](Agent::run_turn) from the agent's graph node.
/// - **Workpad**: `invoke` only gets `&Workpad`; [`write_to_state`](Agent::write_to_state)
///   is the only write path and always targets `self.name()`.
/// - **AgentRegistry**: every non-planner agent's description is shown to the planner.
#[async_trait]
pub trait Agent: Send + Sync {
    /// Unique name in the roster; also the workpad key.
    fn name(&self) -> &str;

    /// Capability description shown to the planner.
    fn description(&self) -> &str;

    fn instruction_source(&self) -> InstructionSource {
        InstructionSource::SharedState
    }

    fn role(&self) -> AgentRole {
        AgentRole::Worker
    }

    /// Ensures the agent's workpad key and, except for the planner, its registry entry.
    fn register(&self, state: &mut Workpad, registry: &mut AgentRegistry) {
        state.ensure_key(self.name());
        if self.role() != AgentRole::Planner {
            registry.record(self.name(), self.description());
        }
        tracing::debug!(agent = self.name(), role = ?self.role(), "agent registered");
    }

    /// Runs the agent's logic against a read-only view of the state.
    async fn invoke(&self, state: &Workpad, ctx: &TurnContext) -> Result<TurnOutcome, AgentError>;

    /// Appends `content` under this agent's key.
    fn write_to_state(&self, state: &mut Workpad, content: String) {
        if state.ensure_key(self.name()) {
            tracing::warn!(agent = self.name(), "workpad key was missing, initialized before write");
        }
        let written = state.append(self.name(), content);
        tracing::debug!(agent = self.name(), sequence = written.sequence, "wrote to workpad");
    }

    /// `invoke`, then write on [`TurnOutcome::Produced`].
    async fn run_turn(&self, state: &mut Workpad, ctx: &TurnContext) -> Result<TurnOutcome, AgentError> {
        let outcome = self.invoke(state, ctx).await?;
        match &outcome {
            TurnOutcome::Produced(content) => {
                self.write_to_state(state, content.clone());
                tracing::info!(agent = self.name(), bytes = content.len(), "turn produced output");
            }
            TurnOutcome::NoOp => tracing::info!(agent = self.name(), "turn produced nothing"),
        }
        Ok(outcome)
    }
}

/// `step_4.final_draft` of the planner's most recent artifact, or `""` when there is none.
pub fn read_instructions(state: &Workpad, planner: &str) -> String {
    let Some(latest) = state.latest(planner) else {
        tracing::info!(planner, "no planner output in workpad; nothing to read");
        return String::new();
    };
    match Decision::read(&latest.content) {
        Ok(decision) => decision.final_draft,
        Err(e) => {
            tracing::warn!(planner, error = %e, "latest planner output is not a decision artifact");
            String::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Echo {
        role: AgentRole,
    }

    #[async_trait]
    impl Agent for Echo {
        fn name(&self) -> &str {
            match self.role {
                AgentRole::Planner => "meta_agent",
                _ => "echo_agent",
            }
        }

        fn description(&self) -> &str {
            "Echoes the planner's instructions."
        }

        fn role(&self) -> AgentRole {
            self.role
        }

        async fn invoke(&self, state: &Workpad, ctx: &TurnContext) -> Result<TurnOutcome, AgentError> {
            let text = read_instructions(state, &ctx.planner);
            Ok(if text.is_empty() {
                TurnOutcome::NoOp
            } else {
                TurnOutcome::Produced(text)
            })
        }
    }

    fn ctx() -> TurnContext {
        TurnContext::new("req", Arc::new(AgentRegistry::new()), "meta_agent")
    }

    /// **Scenario**: the planner gets a key but no registry entry; workers get both.
    #[test]
    fn register_skips_planner_in_registry() {
        let mut pad = Workpad::new();
        let mut reg = AgentRegistry::new();
        Echo { role: AgentRole::Planner }.register(&mut pad, &mut reg);
        Echo { role: AgentRole::Worker }.register(&mut pad, &mut reg);
        assert!(pad.contains_key("meta_agent"));
        assert!(pad.contains_key("echo_agent"));
        assert!(!reg.contains("meta_agent"));
        assert_eq!(reg.description("echo_agent"), Some("Echoes the planner's instructions."));
    }

    /// **Scenario**: with no planner key the turn is a no-op and the workpad is unchanged.
    #[tokio::test]
    async fn run_turn_without_instructions_is_noop() {
        let mut pad = Workpad::new();
        pad.ensure_key("echo_agent");
        let before = pad.clone();
        let outcome = Echo { role: AgentRole::Worker }.run_turn(&mut pad, &ctx()).await.unwrap();
        assert_eq!(outcome, TurnOutcome::NoOp);
        assert_eq!(pad, before);
    }

    /// **Scenario**: a produced turn appends exactly one result, under the agent's own key.
    #[tokio::test]
    async fn run_turn_writes_once_to_own_key() {
        let mut pad = Workpad::new();
        pad.append("meta_agent", DecisionArtifact::new("echo_agent", "say hi").to_json());
        let total = pad.total_results();
        Echo { role: AgentRole::Worker }.run_turn(&mut pad, &ctx()).await.unwrap();
        assert_eq!(pad.total_results(), total + 1);
        assert_eq!(pad.latest("echo_agent").unwrap().content, "say hi");
        assert_eq!(pad.results("meta_agent").unwrap().len(), 1);
    }

    /// **Scenario**: writing after the key vanished re-creates it first.
    #[test]
    fn write_to_state_initializes_missing_key() {
        let mut pad = Workpad::new();
        Echo { role: AgentRole::Worker }.write_to_state(&mut pad, "late".into());
        assert_eq!(pad.results("echo_agent").map(|r| r.len()), Some(1));
    }

    #[test]
    fn read_instructions_tolerates_garbage() {
        let mut pad = Workpad::new();
        assert_eq!(read_instructions(&pad, "meta_agent"), "");
        pad.append("meta_agent", "not json".into());
        assert_eq!(read_instructions(&pad, "meta_agent"), "");
        pad.append("meta_agent", DecisionArtifact::new("x", "do it").to_json());
        assert_eq!(read_instructions(&pad, "meta_agent"), "do it");
    }
}
