//! Host-facing conversation: chat turns with the front-end model, and a workflow run when the
//! user sends `/end`.
//!
//! The chat model collects requirements; on `/end` its reply carries them in ```` ```python ````
//! fences. Those are handed to a fresh [`Workflow`] built from the conversation's roster. The
//! reporter's answer of the previous run is shown to the chat model on later turns.

use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use tokio_stream::StreamExt;

use crate::agent::Agent;
use crate::llm::{parse_error_envelope, LlmClient};
use crate::message::Message;
use crate::prompts::Prompts;
use crate::state::Workpad;
use crate::workflow::{build_workflow, WorkflowEvent, WorkflowOptions, NO_RESPONSE};

/// Sent as the first user message to get a greeting.
pub const START_COMMAND: &str = "/start";
/// Ends requirement gathering and runs the agents.
pub const END_COMMAND: &str = "/end";
/// First progress line of every run.
pub const RUN_STARTED_NOTICE: &str = "This will take some time, probably a good time for a coffee break...";

static PYTHON_FENCE: Lazy<Regex> = Lazy::new(|| Regex::new(r"```python\s*([\s\S]*?)\s*```").unwrap());

/// Contents of all ```` ```python ```` blocks in `reply`, joined by a blank line.
pub fn extract_requirements(reply: &str) -> String {
    PYTHON_FENCE
        .captures_iter(reply)
        .map(|c| c[1].to_string())
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// What the agents did on `/end`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub requirements: String,
    pub progress: Vec<String>,
    /// Text to show the user; includes the failure when the run stopped on an error.
    pub final_message: String,
    pub error: Option<String>,
}

/// Reply to one [`Conversation::send`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationReply {
    /// The chat model's answer (or a readable error).
    pub chat: String,
    /// Present when the message was `/end`.
    pub run: Option<RunSummary>,
}

/// One conversation: chat history, the roster, and the state of the last run.
pub struct Conversation {
    chat: Arc<dyn LlmClient>,
    roster: Vec<Arc<dyn Agent>>,
    prompts: Prompts,
    options: WorkflowOptions,
    history: Vec<Message>,
    last_run: Option<(String, Workpad)>,
}

impl Conversation {
    pub fn new(chat: Arc<dyn LlmClient>, roster: Vec<Arc<dyn Agent>>, prompts: Prompts, options: WorkflowOptions) -> Self {
        Self {
            chat,
            roster,
            prompts,
            options,
            history: Vec::new(),
            last_run: None,
        }
    }

    pub fn history(&self) -> &[Message] {
        &self.history
    }

    /// Workpad at the end of the last run.
    pub fn last_state(&self) -> Option<&Workpad> {
        self.last_run.as_ref().map(|(_, state)| state)
    }

    /// Greeting from the chat model.
    pub async fn start(&mut self) -> String {
        self.chat_turn(START_COMMAND).await.unwrap_or_else(|failure| failure)
    }

    /// Chat turn; on `/end` also runs the workflow. Progress lines are discarded.
    pub async fn send(&mut self, text: &str) -> ConversationReply {
        self.send_with_progress(text, |_| {}).await
    }

    /// Like [`send`](Self::send), calling `on_progress` for each progress line as it arrives.
    pub async fn send_with_progress<F>(&mut self, text: &str, mut on_progress: F) -> ConversationReply
    where
        F: FnMut(&str) + Send,
    {
        let is_end = text.trim() == END_COMMAND;
        let chat = match self.chat_turn(text).await {
            Ok(chat) => chat,
            Err(failure) => {
                let run = is_end.then(|| {
                    tracing::warn!("chat model failed on /end; not starting the agents");
                    RunSummary {
                        requirements: String::new(),
                        progress: Vec::new(),
                        final_message: failure.clone(),
                        error: Some(failure.clone()),
                    }
                });
                return ConversationReply { chat: failure, run };
            }
        };
        if !is_end {
            return ConversationReply { chat, run: None };
        }

        let mut requirements = extract_requirements(&chat);
        if requirements.is_empty() {
            tracing::warn!("no fenced requirements in the chat reply; using the whole reply");
            requirements = chat.clone();
        }
        let run = self.run_workflow(requirements, &mut on_progress).await;
        ConversationReply { chat, run: Some(run) }
    }

    fn system_prompt(&self) -> String {
        let mut prompt = self.prompts.chat().to_string();
        if let Some((reporter, state)) = &self.last_run {
            let previous = state
                .latest(reporter)
                .map(|r| r.content.as_str())
                .unwrap_or(NO_RESPONSE);
            prompt.push_str(&format!("\n\nLast message from the agent:\n<prev_work>{previous}</prev_work>"));
        }
        prompt
    }

    /// The chat model's reply, or a readable failure. A failed turn leaves no trace in the
    /// history, so the next turn does not send two user messages in a row.
    async fn chat_turn(&mut self, text: &str) -> Result<String, String> {
        self.history.push(Message::user(text));
        let mut messages = Vec::with_capacity(self.history.len() + 1);
        messages.push(Message::system(self.system_prompt()));
        messages.extend(self.history.iter().cloned());

        let error = match self.chat.invoke(&messages, None).await {
            Ok(reply) => match parse_error_envelope(&reply) {
                Some(error) => error,
                None => {
                    self.history.push(Message::assistant(reply.clone()));
                    return Ok(reply);
                }
            },
            Err(e) => e.to_string(),
        };
        tracing::error!(%error, "chat model failed");
        self.history.pop();
        Err(format!("The chat model could not answer: {error}"))
    }

    async fn run_workflow<F>(&mut self, requirements: String, on_progress: &mut F) -> RunSummary
    where
        F: FnMut(&str) + Send,
    {
        tracing::info!(requirements = %requirements, "running agents");
        let workflow = match build_workflow(self.roster.clone(), requirements.clone(), self.options) {
            Ok(workflow) => workflow,
            Err(e) => {
                tracing::error!(error = %e, "could not build the workflow");
                return RunSummary {
                    requirements,
                    progress: Vec::new(),
                    final_message: format!("The agents could not be started: {e}"),
                    error: Some(e.to_string()),
                };
            }
        };

        let mut progress = vec![RUN_STARTED_NOTICE.to_string()];
        on_progress(RUN_STARTED_NOTICE);
        let mut finished = None;
        let mut events = workflow.stream();
        while let Some(event) = events.next().await {
            match event {
                WorkflowEvent::Progress(line) => {
                    on_progress(&line);
                    progress.push(line);
                }
                WorkflowEvent::Step { node_id } => tracing::debug!(%node_id, "step finished"),
                WorkflowEvent::Finished(outcome) => finished = Some(outcome),
            }
        }

        let Some(outcome) = finished else {
            tracing::error!("workflow stream ended without a final event");
            return RunSummary {
                requirements,
                progress,
                final_message: NO_RESPONSE.to_string(),
                error: Some("workflow stopped unexpectedly".into()),
            };
        };

        let error = outcome.result.as_ref().err().map(|e| e.to_string());
        let final_message = match &error {
            Some(e) => format!("{}\n\n(The agents stopped early: {e})", outcome.final_message),
            None => outcome.final_message.clone(),
        };
        self.last_run = Some((workflow.reporter_name().to_string(), outcome.state));
        RunSummary {
            requirements,
            progress,
            final_message,
            error,
        }
    }
}
