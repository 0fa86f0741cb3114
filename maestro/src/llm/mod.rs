//! Capability providers: "given messages and an optional output schema, return text".
//!
//! [`LlmClient`] is the single seam agents depend on. Backends: [`ChatOpenAI`] (any
//! OpenAI-compatible chat-completions endpoint), [`ChatAnthropic`] (messages API), and
//! [`MockLlm`] for tests.
//!
//! Transport failures are retried per [`RetryPolicy`]. What happens after the last retry is
//! fixed per provider by its [`ErrorPolicy`]: by default the provider answers with a JSON
//! error envelope `{"error": "..."}` instead of failing.

mod anthropic;
mod mock;
mod openai;
mod retry;

pub use anthropic::ChatAnthropic;
pub use mock::{MockLlm, RecordedCall};
pub use openai::{ChatOpenAI, SchemaMode};
pub use retry::RetryPolicy;

use std::future::Future;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::AgentError;
use crate::message::Message;

/// Appended to user messages when a backend cannot enforce a schema natively.
pub const JSON_MODE_HINT: &str = "\nYou must respond in JSON format.";

/// Text-generation backend.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Sends `messages`; with `schema`, the reply must be a JSON document conforming to it.
    ///
    /// Providers with [`ErrorPolicy::Envelope`] report failures as `Ok({"error": ...})`.
    async fn invoke(&self, messages: &[Message], schema: Option<&Value>) -> Result<String, AgentError>;
}

/// What a provider does once its retries are exhausted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ErrorPolicy {
    /// Return `{"error": "<message>"}` as the reply text.
    #[default]
    Envelope,
    /// Return `Err(AgentError::Provider)`.
    Propagate,
}

/// `{"error": message}` as compact JSON text.
pub fn error_envelope(message: impl std::fmt::Display) -> String {
    serde_json::json!({ "error": message.to_string() }).to_string()
}

/// The message of an error envelope, when `text` is one.
pub fn parse_error_envelope(text: &str) -> Option<String> {
    let value: Value = serde_json::from_str(text).ok()?;
    let obj = value.as_object()?;
    if obj.len() != 1 {
        return None;
    }
    obj.get("error")?.as_str().map(str::to_string)
}

/// A provider failure before policy is applied.
#[derive(Debug)]
pub(crate) enum ProviderFailure {
    /// Retries exhausted on transport or HTTP status errors.
    Transport { attempts: usize, message: String },
    /// A 2xx body that did not have the expected shape.
    Response(String),
}

impl ErrorPolicy {
    pub(crate) fn apply(self, provider: &str, failure: ProviderFailure) -> Result<String, AgentError> {
        let message = match failure {
            ProviderFailure::Transport { attempts, message } => {
                format!("Error in invoking model after {attempts} retries: {message}")
            }
            ProviderFailure::Response(message) => format!("Error processing response: {message}"),
        };
        tracing::warn!(provider, error = %message, "provider call failed");
        match self {
            ErrorPolicy::Envelope => Ok(error_envelope(message)),
            ErrorPolicy::Propagate => Err(AgentError::Provider(message)),
        }
    }
}

/// With a schema, `text` must be a JSON document; it is returned re-serialized compactly.
pub(crate) fn ensure_structured(text: String, schema: Option<&Value>) -> Result<String, ProviderFailure> {
    if schema.is_none() {
        return Ok(text);
    }
    serde_json::from_str::<Value>(text.trim())
        .map(|value| value.to_string())
        .map_err(|e| ProviderFailure::Response(format!("reply is not JSON: {e}")))
}

/// Runs `call` until it succeeds or `policy` gives up; the last error becomes
/// [`ProviderFailure::Transport`].
pub(crate) async fn call_with_retry<T, E, F, Fut>(
    policy: &RetryPolicy,
    provider: &str,
    mut call: F,
) -> Result<T, ProviderFailure>
where
    E: std::fmt::Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut attempt = 0;
    loop {
        let message = match call().await {
            Ok(value) => return Ok(value),
            Err(e) => e.to_string(),
        };
        tracing::debug!(provider, attempt, error = %message, "provider request failed");
        if !policy.should_retry(attempt) {
            return Err(ProviderFailure::Transport {
                attempts: attempt + 1,
                message,
            });
        }
        tokio::time::sleep(policy.delay()).await;
        attempt += 1;
    }
}

/// POSTs the JSON request built by `request`, retrying transport errors and non-2xx statuses.
/// A 2xx body that is not JSON is a [`ProviderFailure::Response`].
pub(crate) async fn post_json_with_retry<F>(
    policy: &RetryPolicy,
    provider: &str,
    request: F,
) -> Result<Value, ProviderFailure>
where
    F: Fn() -> reqwest::RequestBuilder,
{
    let request = &request;
    let response = call_with_retry(policy, provider, || async move {
        request().send().await?.error_for_status()
    })
    .await?;
    response
        .json::<Value>()
        .await
        .map_err(|e| ProviderFailure::Response(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_envelope_round_trips() {
        let text = error_envelope("boom");
        assert_eq!(text, r#"{"error":"boom"}"#);
        assert_eq!(parse_error_envelope(&text).as_deref(), Some("boom"));
        assert_eq!(parse_error_envelope(r#"{"error":"x","Agent":"y"}"#), None);
        assert_eq!(parse_error_envelope("plain text"), None);
    }

    /// **Scenario**: Envelope turns failures into text; Propagate returns Provider errors.
    #[test]
    fn error_policy_apply() {
        let text = ErrorPolicy::Envelope
            .apply(
                "test",
                ProviderFailure::Transport {
                    attempts: 3,
                    message: "connection refused".into(),
                },
            )
            .unwrap();
        let msg = parse_error_envelope(&text).unwrap();
        assert!(msg.starts_with("Error in invoking model after 3 retries"), "{}", msg);

        let err = ErrorPolicy::Propagate
            .apply("test", ProviderFailure::Response("no choices".into()))
            .unwrap_err();
        assert!(matches!(err, AgentError::Provider(m) if m.contains("Error processing response")));
    }

    /// **Scenario**: under a schema, prose is a response failure and JSON is compacted.
    #[test]
    fn structured_replies_must_be_json() {
        let schema = serde_json::json!({ "type": "object" });
        let failure = ensure_structured("Sure! Here you go.".into(), Some(&schema)).unwrap_err();
        assert!(matches!(failure, ProviderFailure::Response(m) if m.contains("not JSON")));
        assert_eq!(
            ensure_structured(" { \"a\": 1 }\n".into(), Some(&schema)).unwrap(),
            r#"{"a":1}"#
        );
        assert_eq!(ensure_structured("plain".into(), None).unwrap(), "plain");
    }

    /// **Scenario**: call_with_retry stops after the policy's attempts and counts them.
    #[tokio::test]
    async fn call_with_retry_counts_attempts() {
        let policy = RetryPolicy::fixed(3, std::time::Duration::from_millis(1));
        let mut calls = 0;
        let failure = call_with_retry(&policy, "test", || {
            calls += 1;
            async { Err::<(), _>("refused") }
        })
        .await
        .unwrap_err();
        assert_eq!(calls, 3);
        assert!(matches!(failure, ProviderFailure::Transport { attempts: 3, message } if message == "refused"));
    }
}
