//! The reporter: relays the planner's final draft to the user verbatim.

use async_trait::async_trait;

use crate::error::AgentError;
use crate::state::Workpad;

use super::{read_instructions, Agent, AgentRole, TurnContext, TurnOutcome};

const DESCRIPTION: &str = "\
# Functionality:
Delivers the final response to the user exactly as provided, without modifications or
commentary. Use this agent when you have the final response.

## Inputs:
- The complete final response, delivered verbatim.

## Important Notes:
- This agent does not generate or change content; it only relays your final draft.
- Make sure the final draft is the fully prepared answer.";

pub struct ReporterAgent {
    name: String,
}

impl ReporterAgent {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[async_trait]
impl Agent for ReporterAgent {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        DESCRIPTION
    }

    fn role(&self) -> AgentRole {
        AgentRole::Reporter
    }

    async fn invoke(&self, state: &Workpad, ctx: &TurnContext) -> Result<TurnOutcome, AgentError> {
        let draft = read_instructions(state, &ctx.planner);
        if draft.is_empty() {
            tracing::info!(agent = %self.name, "no final draft to report");
            return Ok(TurnOutcome::NoOp);
        }
        Ok(TurnOutcome::Produced(draft))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::DecisionArtifact;
    use crate::state::AgentRegistry;
    use std::sync::Arc;

    #[tokio::test]
    async fn relays_final_draft_verbatim() {
        let mut pad = Workpad::new();
        pad.append(
            "meta_agent",
            DecisionArtifact::new("reporter_agent", "The capital of France is Paris.").to_json(),
        );
        let ctx = TurnContext::new("r", Arc::new(AgentRegistry::new()), "meta_agent");
        let outcome = ReporterAgent::new("reporter_agent").invoke(&pad, &ctx).await.unwrap();
        assert_eq!(outcome, TurnOutcome::Produced("The capital of France is Paris.".into()));
    }

    #[tokio::test]
    async fn empty_draft_is_noop() {
        let mut pad = Workpad::new();
        pad.append("meta_agent", DecisionArtifact::new("reporter_agent", "").to_json());
        let ctx = TurnContext::new("r", Arc::new(AgentRegistry::new()), "meta_agent");
        let outcome = ReporterAgent::new("reporter_agent").invoke(&pad, &ctx).await.unwrap();
        assert_eq!(outcome, TurnOutcome::NoOp);
    }
}
