//! Orchestrator: builds the dispatch graph from a roster and drives it.
//!
//! Graph shape: START → planner; planner → (router) → any agent or END; every worker →
//! planner; reporter → END. The workpad and the agent registry are created here, once per
//! workflow.

mod build_error;
mod node;
mod routing;

pub use build_error::WorkflowBuildError;
pub use node::node_id;
pub use routing::RoutingFailurePolicy;

use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::StreamExt;

use crate::agent::{Agent, AgentRole, Decision, TurnContext};
use crate::error::AgentError;
use crate::graph::{
    CompiledStateGraph, ConditionalRouterFn, GraphEvent, RunConfig, StateGraph, DEFAULT_RECURSION_LIMIT,
    END, START,
};
use crate::state::{AgentRegistry, Workpad};

use node::AgentNode;
use routing::PlannerRouter;

/// Final message when the planner's last output has no readable final draft.
pub const NO_FINAL_DRAFT: &str = "No final draft available.";
/// Final message when neither the reporter nor the planner produced anything.
pub const NO_RESPONSE: &str = "No response from ReporterAgent";

/// Knobs for one workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkflowOptions {
    /// Maximum node executions per run.
    pub recursion_limit: usize,
    pub routing_failure: RoutingFailurePolicy,
}

impl Default for WorkflowOptions {
    fn default() -> Self {
        Self {
            recursion_limit: DEFAULT_RECURSION_LIMIT,
            routing_failure: RoutingFailurePolicy::End,
        }
    }
}

/// Result of one run. `result` is `Err` for hard failures and the recursion cap; `state`
/// always holds everything committed before the run stopped.
#[derive(Debug)]
pub struct WorkflowOutcome {
    pub state: Workpad,
    pub final_message: String,
    pub result: Result<(), AgentError>,
}

/// Event of a streamed run; [`WorkflowEvent::Finished`] is always last.
#[derive(Debug)]
pub enum WorkflowEvent {
    /// `Meta Agent asked {agent} to: {first 50 chars}`, each distinct text once.
    Progress(String),
    /// A node finished its turn.
    Step { node_id: String },
    Finished(WorkflowOutcome),
}

/// A compiled dispatch graph plus its initial workpad.
#[derive(Clone)]
pub struct Workflow {
    graph: CompiledStateGraph<Workpad>,
    initial: Workpad,
    registry: Arc<AgentRegistry>,
    planner: String,
    reporter: String,
    config: RunConfig,
}

fn validate_roster(roster: &[Arc<dyn Agent>]) -> Result<(String, String), WorkflowBuildError> {
    let mut seen = HashSet::new();
    for agent in roster {
        if !seen.insert(agent.name()) {
            return Err(WorkflowBuildError::DuplicateAgent(agent.name().to_string()));
        }
    }
    let with_role = |role: AgentRole| -> Vec<String> {
        roster
            .iter()
            .filter(|a| a.role() == role)
            .map(|a| a.name().to_string())
            .collect()
    };
    let mut planners = with_role(AgentRole::Planner);
    let mut reporters = with_role(AgentRole::Reporter);
    let planner = match planners.len() {
        0 => return Err(WorkflowBuildError::MissingPlanner),
        1 => planners.remove(0),
        _ => return Err(WorkflowBuildError::DuplicatePlanner(planners)),
    };
    let reporter = match reporters.len() {
        0 => return Err(WorkflowBuildError::MissingReporter),
        1 => reporters.remove(0),
        _ => return Err(WorkflowBuildError::DuplicateReporter(reporters)),
    };
    Ok((planner, reporter))
}

/// Validates the roster, registers every agent and compiles the dispatch graph.
///
/// The roster needs exactly one planner and one reporter, and unique names.
pub fn build_workflow(
    roster: Vec<Arc<dyn Agent>>,
    requirements: impl Into<String>,
    options: WorkflowOptions,
) -> Result<Workflow, WorkflowBuildError> {
    let (planner, reporter) = validate_roster(&roster)?;

    let mut initial = Workpad::new();
    let mut registry = AgentRegistry::new();
    for agent in &roster {
        agent.register(&mut initial, &mut registry);
    }
    let registry = Arc::new(registry);
    let ctx = TurnContext::new(requirements, Arc::clone(&registry), planner.clone());

    let planner_node = node_id(&planner);
    let router = PlannerRouter::new(&planner, roster.iter().map(|a| a.name()), options.routing_failure);
    let route: ConditionalRouterFn<Workpad> = Arc::new(move |state: &Workpad| router.route(state));

    let mut graph = StateGraph::<Workpad>::new();
    for agent in &roster {
        graph.add_node(node_id(agent.name()), Arc::new(AgentNode::new(Arc::clone(agent), ctx.clone())));
    }
    graph.add_edge(START, planner_node.clone());
    graph.add_conditional_edges(planner_node.clone(), route, None);
    for agent in &roster {
        match agent.role() {
            AgentRole::Planner => {}
            AgentRole::Reporter => {
                graph.add_edge(node_id(agent.name()), END);
            }
            AgentRole::Worker => {
                graph.add_edge(node_id(agent.name()), planner_node.clone());
            }
        }
    }
    let graph = graph.compile()?;

    tracing::info!(
        agents = roster.len(),
        planner = %planner,
        reporter = %reporter,
        recursion_limit = options.recursion_limit,
        "workflow built"
    );
    Ok(Workflow {
        graph,
        initial,
        registry,
        planner,
        reporter,
        config: RunConfig::with_recursion_limit(options.recursion_limit),
    })
}

impl Workflow {
    /// The workpad a run starts from: one empty key per agent.
    pub fn initial_state(&self) -> &Workpad {
        &self.initial
    }

    pub fn registry(&self) -> &AgentRegistry {
        &self.registry
    }

    pub fn planner_name(&self) -> &str {
        &self.planner
    }

    pub fn reporter_name(&self) -> &str {
        &self.reporter
    }

    pub fn recursion_limit(&self) -> usize {
        self.config.recursion_limit
    }

    /// Runs to completion from the initial workpad.
    pub async fn run(&self) -> WorkflowOutcome {
        let mut state = self.initial.clone();
        let result = self
            .graph
            .invoke_in_place(&mut state, &self.config)
            .await
            .map(|_| ());
        self.finish(state, result)
    }

    /// Runs on a background task, publishing progress and step events.
    pub fn stream(&self) -> ReceiverStream<WorkflowEvent> {
        let (tx, rx) = mpsc::channel(64);
        let workflow = self.clone();
        let mut graph_events = self.graph.stream(self.initial.clone(), self.config.clone());

        tokio::spawn(async move {
            let mut seen = HashSet::new();
            while let Some(event) = graph_events.next().await {
                match event {
                    GraphEvent::TaskStart { .. } => {}
                    GraphEvent::Updates { node_id, state } => {
                        if let Some(progress) = workflow.progress_message(&node_id, &state) {
                            if seen.insert(progress.clone()) {
                                let _ = tx.send(WorkflowEvent::Progress(progress)).await;
                            }
                        }
                        let _ = tx.send(WorkflowEvent::Step { node_id }).await;
                    }
                    GraphEvent::Finished { state, outcome } => {
                        let _ = tx.send(WorkflowEvent::Finished(workflow.finish(state, outcome))).await;
                    }
                }
            }
        });

        ReceiverStream::new(rx)
    }

    fn finish(&self, state: Workpad, result: Result<(), AgentError>) -> WorkflowOutcome {
        if let Err(e) = &result {
            tracing::error!(error = %e, "workflow run failed");
        }
        let final_message = self.final_message(&state);
        WorkflowOutcome {
            state,
            final_message,
            result,
        }
    }

    /// The reporter's last output, else the planner's last final draft, else a placeholder.
    pub fn final_message(&self, state: &Workpad) -> String {
        if let Some(report) = state.latest(&self.reporter) {
            return report.content.clone();
        }
        match state.latest(&self.planner) {
            Some(plan) => Decision::read(&plan.content)
                .map(|d| d.final_draft)
                .unwrap_or_else(|_| NO_FINAL_DRAFT.to_string()),
            None => NO_RESPONSE.to_string(),
        }
    }

    /// Describes the planner's current request; after the reporter ran, shows the report.
    fn progress_message(&self, node: &str, state: &Workpad) -> Option<String> {
        let plan = state.latest(&self.planner)?;
        let decision = Decision::read(&plan.content).ok()?;
        let message = if node == node_id(&self.reporter) {
            state
                .latest(&self.reporter)
                .map(|r| r.content.clone())
                .unwrap_or(decision.final_draft)
        } else {
            decision.final_draft
        };
        let truncated: String = message.chars().take(50).collect();
        Some(format!("Meta Agent asked {} to: {}", decision.agent, truncated))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::{DecisionArtifact, PlannerAgent, ReporterAgent};
    use crate::llm::MockLlm;
    use crate::prompts::Prompts;

    fn planner(name: &str) -> Arc<dyn Agent> {
        Arc::new(PlannerAgent::new(name, Arc::new(MockLlm::new("{}")), &Prompts::new("p", "c")))
    }

    fn reporter(name: &str) -> Arc<dyn Agent> {
        Arc::new(ReporterAgent::new(name))
    }

    /// **Scenario**: rosters without exactly one planner and one reporter are rejected.
    #[test]
    fn roster_invariants() {
        let err = build_workflow(vec![reporter("reporter_agent")], "r", WorkflowOptions::default());
        assert!(matches!(err, Err(WorkflowBuildError::MissingPlanner)));

        let err = build_workflow(vec![planner("meta_agent")], "r", WorkflowOptions::default());
        assert!(matches!(err, Err(WorkflowBuildError::MissingReporter)));

        let err = build_workflow(
            vec![planner("a"), planner("b"), reporter("reporter_agent")],
            "r",
            WorkflowOptions::default(),
        );
        assert!(matches!(err, Err(WorkflowBuildError::DuplicatePlanner(names)) if names == ["a", "b"]));

        let err = build_workflow(
            vec![planner("meta_agent"), reporter("x"), reporter("y")],
            "r",
            WorkflowOptions::default(),
        );
        assert!(matches!(err, Err(WorkflowBuildError::DuplicateReporter(_))));

        let err = build_workflow(
            vec![planner("meta_agent"), reporter("meta_agent")],
            "r",
            WorkflowOptions::default(),
        );
        assert!(matches!(err, Err(WorkflowBuildError::DuplicateAgent(n)) if n == "meta_agent"));
    }

    /// **Scenario**: every agent gets an empty key; only non-planners are in the registry.
    #[test]
    fn build_registers_agents() {
        let wf = build_workflow(
            vec![planner("meta_agent"), reporter("reporter_agent")],
            "r",
            WorkflowOptions::default(),
        )
        .unwrap();
        assert_eq!(wf.initial_state().len(), 2);
        assert_eq!(wf.initial_state().total_results(), 0);
        assert!(wf.registry().contains("reporter_agent"));
        assert!(!wf.registry().contains("meta_agent"));
        assert_eq!(wf.recursion_limit(), 50);
    }

    #[test]
    fn final_message_precedence() {
        let wf = build_workflow(
            vec![planner("meta_agent"), reporter("reporter_agent")],
            "r",
            WorkflowOptions::default(),
        )
        .unwrap();
        let mut pad = wf.initial_state().clone();
        assert_eq!(wf.final_message(&pad), NO_RESPONSE);
        pad.append("meta_agent", "garbage".into());
        assert_eq!(wf.final_message(&pad), NO_FINAL_DRAFT);
        pad.append("meta_agent", DecisionArtifact::new("reporter_agent", "draft").to_json());
        assert_eq!(wf.final_message(&pad), "draft");
        pad.append("reporter_agent", "reported".into());
        assert_eq!(wf.final_message(&pad), "reported");
    }

    #[test]
    fn progress_message_truncates_to_fifty_chars() {
        let wf = build_workflow(
            vec![planner("meta_agent"), reporter("reporter_agent")],
            "r",
            WorkflowOptions::default(),
        )
        .unwrap();
        let mut pad = wf.initial_state().clone();
        let long = "x".repeat(80);
        pad.append("meta_agent", DecisionArtifact::new("serper_agent", long).to_json());
        let msg = wf.progress_message("meta_agent_node", &pad).unwrap();
        assert_eq!(msg, format!("Meta Agent asked serper_agent to: {}", "x".repeat(50)));
    }
}
