//! Tavily search worker: one query, results as JSON.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::agent::ToolCallable;
use crate::llm::error_envelope;
use crate::tools::{SearchTool, ToolError};

const DESCRIPTION: &str = "\
# Functionality:
Runs a single web search through Tavily and returns the results as JSON with query, title,
url and a content excerpt for each result.

## Inputs:
- **query**: the search query string.";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TavilyParams {
    pub query: String,
}

pub struct TavilySearch {
    tool: Arc<dyn SearchTool>,
}

impl TavilySearch {
    pub fn new(tool: Arc<dyn SearchTool>) -> Self {
        Self { tool }
    }
}

#[async_trait]
impl ToolCallable for TavilySearch {
    type Params = TavilyParams;

    fn description(&self) -> &str {
        DESCRIPTION
    }

    fn guided_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": { "type": "string", "description": "The search query string." }
            },
            "required": ["query"],
            "additionalProperties": false
        })
    }

    /// A JSON array of `{query, title, url, content}`, or `{"error": msg}` when the search failed.
    async fn execute(&self, params: TavilyParams) -> Result<String, ToolError> {
        if params.query.trim().is_empty() {
            return Err(ToolError::InvalidInput("search query missing from the tool parameters".into()));
        }
        match self.tool.search(&params.query, "").await {
            Ok(hits) => {
                let results: Vec<Value> = hits
                    .into_iter()
                    .map(|h| {
                        json!({
                            "query": h.query,
                            "title": h.title,
                            "url": h.link,
                            "content": h.snippet.unwrap_or_default(),
                        })
                    })
                    .collect();
                Ok(Value::Array(results).to_string())
            }
            Err(e) => {
                tracing::warn!(query = %params.query, error = %e, "tavily search failed");
                Ok(error_envelope(e))
            }
        }
    }
}
