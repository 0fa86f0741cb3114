//! Retrieval worker: answers a query from the relevant passages of a set of pages.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::agent::ToolCallable;
use crate::tools::{RagMode, Retriever, ToolError};

use super::require_units;

const DESCRIPTION: &str = "\
# Functionality:
Retrieves the passages of a set of web pages that are most relevant to a query. Use it
when you need specific facts from pages rather than their full content.

## Inputs:
- **urls**: the pages to retrieve from, usually taken from search results.
- **query**: what you are looking for in those pages.
- **mode**: 'Dense' (default) or 'Hybrid'.

## Outputs:
- Numbered entries with the passage text and its source URL.";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RagParams {
    pub urls: Vec<String>,
    pub query: String,
    #[serde(default)]
    pub mode: RagMode,
}

pub struct RagTool {
    retriever: Arc<dyn Retriever>,
}

impl RagTool {
    pub fn new(retriever: Arc<dyn Retriever>) -> Self {
        Self { retriever }
    }
}

#[async_trait]
impl ToolCallable for RagTool {
    type Params = RagParams;

    fn description(&self) -> &str {
        DESCRIPTION
    }

    fn guided_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "urls": {
                    "type": "array",
                    "items": { "type": "string", "description": "A URL to retrieve from." },
                    "description": "The pages to retrieve from."
                },
                "query": { "type": "string", "description": "The information to look for." },
                "mode": {
                    "type": "string",
                    "enum": ["Dense", "Hybrid"],
                    "description": "Retrieval mode; use 'Dense' unless told otherwise."
                }
            },
            "required": ["urls", "query", "mode"],
            "additionalProperties": false
        })
    }

    async fn execute(&self, params: RagParams) -> Result<String, ToolError> {
        require_units(&params.urls, "URLs")?;
        if params.query.trim().is_empty() {
            return Err(ToolError::InvalidInput("retrieval query missing from the tool parameters".into()));
        }
        tracing::info!(urls = ?params.urls, query = %params.query, mode = ?params.mode, "retrieving");
        match self.retriever.retrieve(&params.urls, &params.query, params.mode).await {
            Ok(text) => Ok(text),
            Err(ToolError::InvalidInput(m)) => Err(ToolError::InvalidInput(m)),
            Err(e) => {
                tracing::warn!(error = %e, "retrieval failed");
                Ok(format!("Error for query '{}': {}", params.query, e))
            }
        }
    }
}
