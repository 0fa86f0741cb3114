//! Anthropic Messages API client.
//!
//! The messages API has no schema-constrained output mode, so with a schema the request
//! gets the schema appended to the system prompt and the JSON hint on user messages.

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::error::AgentError;
use crate::message::Message;

use super::{
    ensure_structured, post_json_with_retry, ErrorPolicy, LlmClient, ProviderFailure, RetryPolicy, JSON_MODE_HINT,
};

const ANTHROPIC_VERSION: &str = "2023-06-01";
const DEFAULT_MAX_TOKENS: u32 = 4096;

pub struct ChatAnthropic {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
    temperature: Option<f32>,
    max_tokens: u32,
    retry: RetryPolicy,
    error_policy: ErrorPolicy,
}

impl ChatAnthropic {
    /// Client for `model`, key from `ANTHROPIC_API_KEY`.
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: "https://api.anthropic.com".to_string(),
            api_key: std::env::var("ANTHROPIC_API_KEY").ok(),
            model: model.into(),
            temperature: None,
            max_tokens: DEFAULT_MAX_TOKENS,
            retry: RetryPolicy::default(),
            error_policy: ErrorPolicy::default(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_error_policy(mut self, policy: ErrorPolicy) -> Self {
        self.error_policy = policy;
        self
    }

    fn request_body(&self, messages: &[Message], schema: Option<&Value>) -> Value {
        let mut system: Vec<&str> = Vec::new();
        let mut wire = Vec::new();
        for m in messages {
            match m {
                Message::System(s) => system.push(s),
                Message::User(c) if schema.is_some() => {
                    wire.push(json!({ "role": "user", "content": format!("{c}{JSON_MODE_HINT}") }))
                }
                other => wire.push(json!({ "role": other.role(), "content": other.content() })),
            }
        }
        let mut system = system.join("\n\n");
        if let Some(schema) = schema {
            system.push_str(&format!("\n\nRespond with a single JSON object matching this schema: {schema}"));
        }

        let mut body = json!({
            "model": self.model,
            "max_tokens": self.max_tokens,
            "messages": wire,
        });
        if !system.is_empty() {
            body["system"] = json!(system);
        }
        if let Some(t) = self.temperature {
            body["temperature"] = json!(t);
        }
        body
    }

    fn extract_text(response: &Value) -> Result<String, ProviderFailure> {
        let blocks = response
            .get("content")
            .and_then(Value::as_array)
            .ok_or_else(|| ProviderFailure::Response("missing content blocks".into()))?;
        let text: String = blocks
            .iter()
            .filter(|b| b.get("type").and_then(Value::as_str) == Some("text"))
            .filter_map(|b| b.get("text").and_then(Value::as_str))
            .collect();
        if text.is_empty() {
            return Err(ProviderFailure::Response("no text content".into()));
        }
        Ok(text)
    }
}

#[async_trait]
impl LlmClient for ChatAnthropic {
    async fn invoke(&self, messages: &[Message], schema: Option<&Value>) -> Result<String, AgentError> {
        let url = format!("{}/v1/messages", self.base_url.trim_end_matches('/'));
        let body = self.request_body(messages, schema);
        tracing::debug!(model = %self.model, structured = schema.is_some(), "anthropic request");

        let response = post_json_with_retry(&self.retry, "anthropic", || {
            let req = self
                .client
                .post(&url)
                .header("anthropic-version", ANTHROPIC_VERSION)
                .json(&body);
            match &self.api_key {
                Some(key) => req.header("x-api-key", key),
                None => req,
            }
        })
        .await;

        match response
            .and_then(|v| Self::extract_text(&v))
            .and_then(|text| ensure_structured(text, schema))
        {
            Ok(text) => Ok(text),
            Err(failure) => self.error_policy.apply("anthropic", failure),
        }
    }
}
