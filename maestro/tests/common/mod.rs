//! Shared fixtures: scripted planner replies, fake tools and an observing worker.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use maestro::agent::{SerperSearch, DEFAULT_PLANNER_NAME, DEFAULT_REPORTER_NAME};
use maestro::tools::{SearchHit, SearchTool, ToolError};
use maestro::{
    Agent, AgentError, AgentRegistry, DecisionArtifact, MockLlm, PlannerAgent, Prompts, ReporterAgent, ToolCallingAgent,
    TurnContext, TurnOutcome, Workpad,
};

pub const PLANNER: &str = DEFAULT_PLANNER_NAME;
pub const REPORTER: &str = DEFAULT_REPORTER_NAME;
pub const SEARCHER: &str = "serper_agent";

/// Planner reply directing `agent` with `final_draft`.
pub fn decision(agent: &str, final_draft: &str) -> String {
    DecisionArtifact::new(agent, final_draft).to_json()
}

pub fn prompts() -> Prompts {
    Prompts::new("You are the planner.", "You are the chat front end.")
}

/// Search backend that answers every query with one Paris hit, except the `failing` ones.
pub struct FakeSearch {
    pub failing: Vec<String>,
}

impl FakeSearch {
    pub fn ok() -> Self {
        Self { failing: Vec::new() }
    }

    pub fn failing(queries: &[&str]) -> Self {
        Self {
            failing: queries.iter().map(|q| q.to_string()).collect(),
        }
    }
}

#[async_trait]
impl SearchTool for FakeSearch {
    async fn search(&self, query: &str, _locale: &str) -> Result<Vec<SearchHit>, ToolError> {
        if self.failing.iter().any(|f| f == query) {
            return Err(ToolError::Api(format!("backend refused '{query}'")));
        }
        Ok(vec![SearchHit {
            query: query.to_string(),
            title: "Paris - Wikipedia".to_string(),
            link: "https://en.wikipedia.org/wiki/Paris".to_string(),
            sitelinks: vec![],
            snippet: Some("Paris is the capital of France.".to_string()),
        }])
    }
}

pub fn planner(llm: Arc<MockLlm>) -> Arc<dyn Agent> {
    Arc::new(PlannerAgent::new(PLANNER, llm, &prompts()))
}

pub fn searcher(llm: Arc<MockLlm>, search: FakeSearch) -> Arc<dyn Agent> {
    Arc::new(ToolCallingAgent::new(SEARCHER, llm, SerperSearch::new(Arc::new(search))))
}

pub fn reporter() -> Arc<dyn Agent> {
    Arc::new(ReporterAgent::new(REPORTER))
}

/// Worker that records the workpad it sees on every turn and replies with fixed text.
pub struct Observer {
    pub name: String,
    pub reply: String,
    pub seen: Arc<Mutex<Vec<Workpad>>>,
}

impl Observer {
    pub fn new(name: &str, reply: &str) -> (Arc<Self>, Arc<Mutex<Vec<Workpad>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let observer = Arc::new(Self {
            name: name.to_string(),
            reply: reply.to_string(),
            seen: Arc::clone(&seen),
        });
        (observer, seen)
    }
}

#[async_trait]
impl Agent for Observer {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        "Records the workpad."
    }

    async fn invoke(&self, state: &Workpad, _ctx: &TurnContext) -> Result<TurnOutcome, AgentError> {
        self.seen.lock().unwrap().push(state.clone());
        Ok(TurnOutcome::Produced(self.reply.clone()))
    }
}

/// Registers a planner that replies with `planner_reply` plus `workers`, and runs the
/// planner's turn so the workers have instructions to read.
pub async fn after_planner_turn(workers: &[Arc<dyn Agent>], planner_reply: String) -> (Workpad, TurnContext) {
    let planner = planner(Arc::new(MockLlm::new(planner_reply)));
    let mut registry = AgentRegistry::new();
    let mut pad = Workpad::new();
    planner.register(&mut pad, &mut registry);
    for worker in workers {
        worker.register(&mut pad, &mut registry);
    }
    let ctx = TurnContext::new("r", Arc::new(registry), PLANNER);
    planner
        .run_turn(&mut pad, &ctx)
        .await
        .expect("planner turn");
    (pad, ctx)
}
