//! Runtime configuration read from the environment, and the default roster built from it.
//!
//! `config::load_and_apply` (in the host) has already merged `.env` and the XDG config file
//! into the process env, so everything here is a plain env read with a default.

use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use thiserror::Error;

use crate::agent::{
    Agent, PlannerAgent, RagTool, ReporterAgent, ScholarSearch, SerperSearch, ShoppingSearch, TavilySearch,
    ToolCallingAgent, WebScraper, DEFAULT_PLANNER_NAME, DEFAULT_REPORTER_NAME,
};
use crate::fanout::DEFAULT_FAN_OUT_LIMIT;
use crate::graph::DEFAULT_RECURSION_LIMIT;
use crate::llm::{ChatAnthropic, ChatOpenAI, LlmClient};
use crate::prompts::{load_or_default, Prompts};
use crate::tools::{HttpScraper, LexicalRetriever, SerperClient, TavilyClient};
use crate::workflow::{RoutingFailurePolicy, WorkflowOptions};

pub const DEFAULT_PLANNER_MODEL: &str = "gpt-4o";
pub const DEFAULT_WORKER_MODEL: &str = "gpt-4o-mini";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("unknown provider '{0}' (expected 'openai' or 'anthropic')")]
    UnknownProvider(String),
    #[error("{var} must be a non-negative integer, got '{value}'")]
    InvalidNumber { var: String, value: String },
}

/// Capability provider backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Provider {
    /// Any OpenAI-compatible chat-completions server.
    #[default]
    OpenAi,
    Anthropic,
}

impl FromStr for Provider {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" | "open_ai" => Ok(Provider::OpenAi),
            "anthropic" | "claude" => Ok(Provider::Anthropic),
            other => Err(ConfigError::UnknownProvider(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaestroConfig {
    pub provider: Provider,
    pub openai_api_key: Option<String>,
    pub openai_base_url: Option<String>,
    pub anthropic_api_key: Option<String>,
    pub planner_model: String,
    pub worker_model: String,
    pub serper_api_key: Option<String>,
    pub tavily_api_key: Option<String>,
    pub recursion_limit: usize,
    pub fan_out_limit: usize,
    /// `None` ends the run on an unroutable planner output.
    pub routing_retries: Option<usize>,
    pub prompts_dir: Option<PathBuf>,
}

impl Default for MaestroConfig {
    fn default() -> Self {
        Self {
            provider: Provider::default(),
            openai_api_key: None,
            openai_base_url: None,
            anthropic_api_key: None,
            planner_model: DEFAULT_PLANNER_MODEL.to_string(),
            worker_model: DEFAULT_WORKER_MODEL.to_string(),
            serper_api_key: None,
            tavily_api_key: None,
            recursion_limit: DEFAULT_RECURSION_LIMIT,
            fan_out_limit: DEFAULT_FAN_OUT_LIMIT,
            routing_retries: None,
            prompts_dir: None,
        }
    }
}

fn number(var: &str, value: Option<String>) -> Result<Option<usize>, ConfigError> {
    value
        .filter(|v| !v.trim().is_empty())
        .map(|v| {
            v.trim().parse::<usize>().map_err(|_| ConfigError::InvalidNumber {
                var: var.to_string(),
                value: v,
            })
        })
        .transpose()
}

impl MaestroConfig {
    /// Reads the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads variables through `lookup`; unset or empty values keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();
        Ok(Self {
            provider: get("MAESTRO_PROVIDER")
                .map(|p| p.parse::<Provider>())
                .transpose()?
                .unwrap_or_default(),
            openai_api_key: get("OPENAI_API_KEY"),
            openai_base_url: get("OPENAI_BASE_URL").or_else(|| get("OPENAI_API_BASE")),
            anthropic_api_key: get("ANTHROPIC_API_KEY"),
            planner_model: get("MAESTRO_PLANNER_MODEL").unwrap_or(defaults.planner_model),
            worker_model: get("MAESTRO_WORKER_MODEL").unwrap_or(defaults.worker_model),
            serper_api_key: get("SERPER_API_KEY"),
            tavily_api_key: get("TAVILY_API_KEY"),
            recursion_limit: number("MAESTRO_RECURSION_LIMIT", get("MAESTRO_RECURSION_LIMIT"))?
                .unwrap_or(defaults.recursion_limit),
            fan_out_limit: number("MAESTRO_FAN_OUT_LIMIT", get("MAESTRO_FAN_OUT_LIMIT"))?
                .unwrap_or(defaults.fan_out_limit),
            routing_retries: number("MAESTRO_ROUTING_RETRIES", get("MAESTRO_ROUTING_RETRIES"))?,
            prompts_dir: get("PROMPTS_DIR").map(PathBuf::from),
        })
    }

    pub fn workflow_options(&self) -> WorkflowOptions {
        WorkflowOptions {
            recursion_limit: self.recursion_limit,
            routing_failure: RoutingFailurePolicy::from_retries(self.routing_retries),
        }
    }

    /// Prompts from `prompts_dir` when it loads, else the embedded defaults.
    pub fn prompts(&self) -> Prompts {
        load_or_default(self.prompts_dir.as_deref())
    }

    /// Provider client for `model` on the configured backend.
    pub fn llm(&self, model: &str) -> Arc<dyn LlmClient> {
        match self.provider {
            Provider::OpenAi => {
                let mut client = ChatOpenAI::new(model).with_temperature(0.0);
                if let Some(key) = &self.openai_api_key {
                    client = client.with_api_key(key.clone());
                }
                if let Some(url) = &self.openai_base_url {
                    client = client.with_base_url(url.clone());
                }
                Arc::new(client)
            }
            Provider::Anthropic => {
                let mut client = ChatAnthropic::new(model).with_temperature(0.0);
                if let Some(key) = &self.anthropic_api_key {
                    client = client.with_api_key(key.clone());
                }
                Arc::new(client)
            }
        }
    }

    /// Planner, Serper web/shopping/scholar search, scraper, retrieval, Tavily (when a key is
    /// set) and reporter.
    pub fn roster(&self, prompts: &Prompts) -> Vec<Arc<dyn Agent>> {
        let worker_llm = self.llm(&self.worker_model);
        let mut serper = SerperClient::from_env();
        if let Some(key) = &self.serper_api_key {
            serper = serper.with_api_key(key.clone());
        }
        let serper = Arc::new(serper);
        let scraper = Arc::new(HttpScraper::new());
        let limit = self.fan_out_limit;

        let mut roster: Vec<Arc<dyn Agent>> = vec![
            Arc::new(PlannerAgent::new(DEFAULT_PLANNER_NAME, self.llm(&self.planner_model), prompts)),
            Arc::new(ToolCallingAgent::new(
                "serper_agent",
                Arc::clone(&worker_llm),
                SerperSearch::new(serper.clone()).with_fan_out_limit(limit),
            )),
            Arc::new(ToolCallingAgent::new(
                "serper_shopping_agent",
                Arc::clone(&worker_llm),
                ShoppingSearch::new(serper.clone()).with_fan_out_limit(limit),
            )),
            Arc::new(ToolCallingAgent::new(
                "serper_scholar_agent",
                Arc::clone(&worker_llm),
                ScholarSearch::new(serper).with_fan_out_limit(limit),
            )),
            Arc::new(ToolCallingAgent::new(
                "web_scraper_agent",
                Arc::clone(&worker_llm),
                WebScraper::new(scraper).with_fan_out_limit(limit),
            )),
            Arc::new(ToolCallingAgent::new(
                "rag_agent",
                Arc::clone(&worker_llm),
                RagTool::new(Arc::new(LexicalRetriever::new(HttpScraper::new()).with_fan_out_limit(limit))),
            )),
        ];
        if let Some(key) = &self.tavily_api_key {
            roster.push(Arc::new(ToolCallingAgent::new(
                "tavily_agent",
                Arc::clone(&worker_llm),
                TavilySearch::new(Arc::new(TavilyClient::from_env().with_api_key(key.clone()))),
            )));
        }
        roster.push(Arc::new(ReporterAgent::new(DEFAULT_REPORTER_NAME)));
        roster
    }
}
