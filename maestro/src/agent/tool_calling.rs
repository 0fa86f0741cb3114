//! Workers that turn planner instructions into structured tool parameters, then run the tool.

use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::AgentError;
use crate::llm::{parse_error_envelope, LlmClient};
use crate::message::Message;
use crate::state::Workpad;
use crate::tools::ToolError;

use super::{read_instructions, Agent, TurnContext, TurnOutcome};

/// A capability a [`ToolCallingAgent`] can drive.
///
/// The provider fills [`Params`](ToolCallable::Params) from the planner's instructions
/// using [`guided_schema`](ToolCallable::guided_schema); `execute` runs the capability and
/// returns the text stored in the workpad. Per-unit failures belong inline in that text;
/// `Err` is for parameters the tool cannot act on at all.
#[async_trait]
pub trait ToolCallable: Send + Sync {
    type Params: DeserializeOwned + Send;

    /// Capability description shown to the planner.
    fn description(&self) -> &str;

    /// JSON Schema of [`Params`](ToolCallable::Params).
    fn guided_schema(&self) -> Value;

    async fn execute(&self, params: Self::Params) -> Result<String, ToolError>;
}

/// Generic worker: instructions → provider → `T::Params` → `T::execute`.
pub struct ToolCallingAgent<T> {
    name: String,
    llm: Arc<dyn LlmClient>,
    tool: T,
}

impl<T: ToolCallable> ToolCallingAgent<T> {
    pub fn new(name: impl Into<String>, llm: Arc<dyn LlmClient>, tool: T) -> Self {
        Self {
            name: name.into(),
            llm,
            tool,
        }
    }

    pub fn tool(&self) -> &T {
        &self.tool
    }

    fn tool_input_error(&self, message: impl Into<String>) -> AgentError {
        AgentError::ToolInput {
            agent: self.name.clone(),
            message: message.into(),
        }
    }
}

#[async_trait]
impl<T: ToolCallable> Agent for ToolCallingAgent<T> {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        self.tool.description()
    }

    async fn invoke(&self, state: &Workpad, ctx: &TurnContext) -> Result<TurnOutcome, AgentError> {
        let instructions = read_instructions(state, &ctx.planner);
        if instructions.is_empty() {
            tracing::info!(agent = %self.name, "no instructions from the planner");
            return Ok(TurnOutcome::NoOp);
        }

        let schema = self.tool.guided_schema();
        let messages = [
            Message::system(format!(
                "Take the following instructions and return the specified JSON: {}",
                serde_json::to_string(&schema).unwrap_or_default()
            )),
            Message::user(instructions),
        ];
        let reply = self.llm.invoke(&messages, Some(&schema)).await?;

        let params: T::Params = serde_json::from_str(reply.trim()).map_err(|e| {
            let message = match parse_error_envelope(&reply) {
                Some(provider_error) => format!("provider returned an error: {provider_error}"),
                None => format!("invalid JSON for tool parameters: {e}"),
            };
            tracing::error!(agent = %self.name, %message, "tool parameters could not be parsed");
            self.tool_input_error(message)
        })?;

        let text = self.tool.execute(params).await.map_err(|e| match e {
            ToolError::InvalidInput(message) => self.tool_input_error(message),
            other => AgentError::ExecutionFailed(format!("{}: {other}", self.name)),
        })?;
        Ok(TurnOutcome::Produced(text))
    }
}
