//! Prompt text for the planner and the chat front end.
//!
//! Defaults live in `maestro/prompts/maestro.yaml` and are embedded at compile time.
//! [`load`] reads `maestro.yaml` from a directory instead, and `MAESTRO_PLANNER_PROMPT` /
//! `MAESTRO_CHAT_PROMPT` override single entries either way.

mod load;

pub use load::{default_from_embedded, load, load_or_default, LoadError};

use serde::Deserialize;

/// Shape of `maestro.yaml`. Missing entries keep the embedded default.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PromptsFile {
    pub planner_prompt: Option<String>,
    pub chat_prompt: Option<String>,
}

/// Resolved prompt set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompts {
    planner: String,
    chat: String,
}

impl Prompts {
    pub fn new(planner: impl Into<String>, chat: impl Into<String>) -> Self {
        Self {
            planner: planner.into(),
            chat: chat.into(),
        }
    }

    /// Planner system instructions.
    pub fn planner(&self) -> &str {
        &self.planner
    }

    /// Chat front-end system prompt.
    pub fn chat(&self) -> &str {
        &self.chat
    }

    /// Replaces the entries present in `file`.
    pub(crate) fn merged(mut self, file: PromptsFile) -> Self {
        if let Some(p) = file.planner_prompt {
            self.planner = p;
        }
        if let Some(c) = file.chat_prompt {
            self.chat = c;
        }
        self
    }
}

impl Default for Prompts {
    fn default() -> Self {
        default_from_embedded()
    }
}
