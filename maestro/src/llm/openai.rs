//! OpenAI-compatible Chat Completions client on `async_openai`.
//!
//! Works with any server exposing `/v1/chat/completions` (OpenAI, Groq, Mistral, vLLM,
//! Ollama). The API base comes from the builder, else `OPENAI_BASE_URL` / `OPENAI_API_BASE`,
//! else `https://api.openai.com`; `/v1` is appended when missing.

use async_openai::{
    config::{Config, OpenAIConfig},
    error::OpenAIError,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessage, ChatCompletionRequestUserMessage,
        CreateChatCompletionRequest, CreateChatCompletionRequestArgs, ResponseFormat, ResponseFormatJsonSchema,
    },
    Client,
};
use async_trait::async_trait;
use serde_json::Value;

use crate::error::AgentError;
use crate::message::Message;

use super::{
    call_with_retry, ensure_structured, ErrorPolicy, LlmClient, ProviderFailure, RetryPolicy, JSON_MODE_HINT,
};

const DEFAULT_API_BASE: &str = "https://api.openai.com";

/// How an output schema is passed to the server.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SchemaMode {
    /// `response_format: {type: json_schema, json_schema: {name, strict: true, schema}}`.
    #[default]
    JsonSchema,
    /// `response_format: {type: json_object}` plus a JSON hint on user messages, for
    /// servers without structured outputs.
    JsonObject,
}

pub struct ChatOpenAI {
    client: Client<OpenAIConfig>,
    config: OpenAIConfig,
    model: String,
    temperature: Option<f32>,
    schema_mode: SchemaMode,
    retry: RetryPolicy,
    error_policy: ErrorPolicy,
}

/// `base` with a trailing `/v1`, which is where `async_openai` expects the API root.
fn api_base(base: &str) -> String {
    let base = base.trim_end_matches('/');
    if base.ends_with("/v1") {
        base.to_string()
    } else {
        format!("{base}/v1")
    }
}

fn env_api_base() -> String {
    let base = std::env::var("OPENAI_BASE_URL")
        .or_else(|_| std::env::var("OPENAI_API_BASE"))
        .unwrap_or_else(|_| DEFAULT_API_BASE.to_string());
    api_base(&base)
}

impl ChatOpenAI {
    /// Client for `model`; key from `OPENAI_API_KEY`, base from the environment.
    pub fn new(model: impl Into<String>) -> Self {
        Self::with_config(OpenAIConfig::new().with_api_base(env_api_base()), model)
    }

    /// Client with an explicit `async_openai` config (key, base URL, organization).
    pub fn with_config(config: OpenAIConfig, model: impl Into<String>) -> Self {
        Self {
            client: Client::with_config(config.clone()),
            config,
            model: model.into(),
            temperature: None,
            schema_mode: SchemaMode::default(),
            retry: RetryPolicy::default(),
            error_policy: ErrorPolicy::default(),
        }
    }

    fn reconfigure(mut self, config: OpenAIConfig) -> Self {
        self.client = Client::with_config(config.clone());
        self.config = config;
        self
    }

    pub fn with_base_url(self, base_url: impl AsRef<str>) -> Self {
        let config = self.config.clone().with_api_base(api_base(base_url.as_ref()));
        self.reconfigure(config)
    }

    pub fn with_api_key(self, api_key: impl Into<String>) -> Self {
        let config = self.config.clone().with_api_key(api_key.into());
        self.reconfigure(config)
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_schema_mode(mut self, mode: SchemaMode) -> Self {
        self.schema_mode = mode;
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

    pub fn model(&self) -> &str {
        &self.model
    }

    fn messages_to_request(&self, messages: &[Message], json_hint: bool) -> Vec<ChatCompletionRequestMessage> {
        messages
            .iter()
            .map(|m| match m {
                Message::System(s) => {
                    ChatCompletionRequestMessage::System(ChatCompletionRequestSystemMessage::from(s.as_str()))
                }
                Message::User(s) if json_hint => ChatCompletionRequestMessage::User(
                    ChatCompletionRequestUserMessage::from(format!("{s}{JSON_MODE_HINT}").as_str()),
                ),
                Message::User(s) => {
                    ChatCompletionRequestMessage::User(ChatCompletionRequestUserMessage::from(s.as_str()))
                }
                Message::Assistant(s) => ChatCompletionRequestMessage::Assistant(s.as_str().into()),
            })
            .collect()
    }

    fn request(&self, messages: &[Message], schema: Option<&Value>) -> Result<CreateChatCompletionRequest, OpenAIError> {
        let json_hint = schema.is_some() && self.schema_mode == SchemaMode::JsonObject;
        let mut args = CreateChatCompletionRequestArgs::default();
        args.model(self.model.clone());
        args.messages(self.messages_to_request(messages, json_hint));
        if let Some(t) = self.temperature {
            args.temperature(t);
        }
        if let Some(schema) = schema {
            args.response_format(match self.schema_mode {
                SchemaMode::JsonSchema => ResponseFormat::JsonSchema {
                    json_schema: ResponseFormatJsonSchema {
                        description: None,
                        name: "open_ai_agent".to_string(),
                        schema: Some(schema.clone()),
                        strict: Some(true),
                    },
                },
                SchemaMode::JsonObject => ResponseFormat::JsonObject,
            });
        }
        args.build()
    }
}

#[async_trait]
impl LlmClient for ChatOpenAI {
    async fn invoke(&self, messages: &[Message], schema: Option<&Value>) -> Result<String, AgentError> {
        let request = self
            .request(messages, schema)
            .map_err(|e| AgentError::ExecutionFailed(format!("OpenAI request build failed: {e}")))?;
        tracing::debug!(
            model = %self.model,
            api_base = %self.config.api_base(),
            message_count = messages.len(),
            structured = schema.is_some(),
            "openai chat create"
        );

        let chat = self.client.chat();
        let chat = &chat;
        let response = call_with_retry(&self.retry, "openai", move || chat.create(request.clone())).await;

        let content = response.and_then(|r| {
            r.choices
                .into_iter()
                .next()
                .and_then(|choice| choice.message.content)
                .ok_or_else(|| ProviderFailure::Response("missing choices[0].message.content".into()))
        });
        match content.and_then(|text| ensure_structured(text, schema)) {
            Ok(text) => Ok(text),
            Err(failure) => self.error_policy.apply("openai", failure),
        }
    }
}
