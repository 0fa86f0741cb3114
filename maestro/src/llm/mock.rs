//! Scripted provider for tests and offline demos.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::AgentError;
use crate::message::Message;

use super::LlmClient;

/// One recorded `invoke` call.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub messages: Vec<Message>,
    pub schema: Option<Value>,
}

/// Replays canned replies and records every call.
///
/// [`MockLlm::new`] answers every call with the same text; [`MockLlm::scripted`] answers
/// with the given replies in order and fails once they run out.
pub struct MockLlm {
    fixed: Option<String>,
    script: Mutex<VecDeque<String>>,
    calls: Mutex<Vec<RecordedCall>>,
    call_count: AtomicUsize,
}

impl MockLlm {
    /// Always replies with `content`.
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            fixed: Some(content.into()),
            script: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
            call_count: AtomicUsize::new(0),
        }
    }

    /// Replies with `replies` in order.
    pub fn scripted<I, T>(replies: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self {
            fixed: None,
            script: Mutex::new(replies.into_iter().map(Into::into).collect()),
            calls: Mutex::new(Vec::new()),
            call_count: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Snapshot of all calls so far.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls
            .lock()
            .map(|c| c.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl LlmClient for MockLlm {
    async fn invoke(&self, messages: &[Message], schema: Option<&Value>) -> Result<String, AgentError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(RecordedCall {
                messages: messages.to_vec(),
                schema: schema.cloned(),
            });
        }
        if let Some(fixed) = &self.fixed {
            return Ok(fixed.clone());
        }
        let next = self
            .script
            .lock()
            .map_err(|_| AgentError::ExecutionFailed("mock script poisoned".into()))?
            .pop_front();
        next.ok_or_else(|| AgentError::ExecutionFailed("mock script exhausted".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn scripted_replays_in_order_then_fails() {
        let llm = MockLlm::scripted(["one", "two"]);
        assert_eq!(llm.invoke(&[Message::user("a")], None).await.unwrap(), "one");
        assert_eq!(llm.invoke(&[Message::user("b")], None).await.unwrap(), "two");
        assert!(llm.invoke(&[Message::user("c")], None).await.is_err());
        assert_eq!(llm.call_count(), 3);
        assert_eq!(llm.calls()[1].messages, vec![Message::user("b")]);
    }

    #[tokio::test]
    async fn fixed_reply_records_schema() {
        let llm = MockLlm::new("{}");
        let schema = serde_json::json!({ "type": "object" });
        llm.invoke(&[Message::user("x")], Some(&schema)).await.unwrap();
        assert_eq!(llm.calls()[0].schema.as_ref(), Some(&schema));
    }
}
