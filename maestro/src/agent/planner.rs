//! The planner ("meta agent"): reads the whole workpad and decides who acts next.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::AgentError;
use crate::llm::LlmClient;
use crate::message::Message;
use crate::prompts::Prompts;
use crate::state::{AgentRegistry, Workpad};

use super::{Agent, AgentRole, Decision, DecisionArtifact, InstructionSource, TurnContext, TurnOutcome};

const DESCRIPTION: &str = "Plans the work, reviews the workpad and instructs one agent per turn.";

/// Produces one [`DecisionArtifact`] per turn; the raw provider reply is stored verbatim.
pub struct PlannerAgent {
    name: String,
    llm: Arc<dyn LlmClient>,
    instructions: String,
}

impl PlannerAgent {
    pub fn new(name: impl Into<String>, llm: Arc<dyn LlmClient>, prompts: &Prompts) -> Self {
        Self {
            name: name.into(),
            llm,
            instructions: prompts.planner().to_string(),
        }
    }

    /// `"{key}: [..contents..]"` per agent other than the planner, or `No previous state.`.
    pub fn workpad_text(&self, state: &Workpad) -> String {
        let lines: Vec<String> = state
            .iter()
            .filter(|(key, _)| *key != self.name)
            .map(|(key, results)| {
                let contents: Vec<&str> = results.iter().map(|r| r.content.as_str()).collect();
                let value = serde_json::to_string(&contents).unwrap_or_default();
                format!("{key}: {value}")
            })
            .collect();
        if lines.is_empty() {
            "No previous state.".to_string()
        } else {
            lines.join("\n")
        }
    }

    pub fn registry_text(registry: &AgentRegistry) -> String {
        if registry.is_empty() {
            return "No previous agent registry.".to_string();
        }
        registry
            .iter()
            .map(|(key, description)| format!("{key}: {description}"))
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn messages(&self, state: &Workpad, ctx: &TurnContext, schema: &str) -> Vec<Message> {
        let system = format!(
            "{}\n\n<agent_registry>\n{}\n</agent_registry>\n\n You must respond in the following JSON format: {}",
            self.instructions,
            Self::registry_text(&ctx.registry),
            schema
        );
        let user = format!(
            "<user_requirements>\n{}\n</user_requirements>\n<workpad>\n{}\n</workpad>",
            ctx.requirements,
            self.workpad_text(state)
        );
        vec![Message::system(system), Message::user(user)]
    }
}

#[async_trait]
impl Agent for PlannerAgent {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        DESCRIPTION
    }

    fn instruction_source(&self) -> InstructionSource {
        InstructionSource::External
    }

    fn role(&self) -> AgentRole {
        AgentRole::Planner
    }

    async fn invoke(&self, state: &Workpad, ctx: &TurnContext) -> Result<TurnOutcome, AgentError> {
        let schema = DecisionArtifact::schema();
        let schema_text = serde_json::to_string(&schema).unwrap_or_default();
        let messages = self.messages(state, ctx, &schema_text);
        let reply = self.llm.invoke(&messages, Some(&schema)).await?;
        match Decision::read(&reply) {
            Ok(decision) => tracing::info!(planner = %self.name, next = %decision.agent, "planner decided"),
            Err(e) => tracing::warn!(planner = %self.name, error = %e, "planner reply is not a decision artifact"),
        }
        Ok(TurnOutcome::Produced(reply))
    }
}
