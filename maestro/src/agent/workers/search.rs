//! Web search worker (Serper organic results).

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::agent::ToolCallable;
use crate::fanout::DEFAULT_FAN_OUT_LIMIT;
use crate::tools::{format_search_results, SearchTool, ToolError};

use super::{default_location, require_units, search_each};

const DESCRIPTION: &str = "\
# Functionality:
Performs Google web searches for a list of queries and returns the organic results: query,
title, link and sitelinks for each result.

## Inputs:
- **queries**: a list of search query strings.
- **location**: country code for the search (e.g. 'us', 'gb', 'nl', 'ca'). Defaults to 'us'.

## Important Notes:
- Returns result summaries only; it does not read the linked pages.
- To get page content, pass the URLs to the web scraper or the retrieval agent.";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SearchParams {
    pub queries: Vec<String>,
    #[serde(default = "default_location")]
    pub location: String,
}

/// Shared `queries` + `location` schema for the Serper workers.
pub(crate) fn queries_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "queries": {
                "type": "array",
                "items": { "type": "string", "description": "A search query string." },
                "description": "A list of search query strings."
            },
            "location": {
                "type": "string",
                "description": "Country code for the search results: 'us' (United States), 'gb' (United Kingdom), 'nl' (The Netherlands), 'ca' (Canada)."
            }
        },
        "required": ["queries", "location"],
        "additionalProperties": false
    })
}

pub struct SerperSearch {
    tool: Arc<dyn SearchTool>,
    fan_out_limit: usize,
}

impl SerperSearch {
    pub fn new(tool: Arc<dyn SearchTool>) -> Self {
        Self {
            tool,
            fan_out_limit: DEFAULT_FAN_OUT_LIMIT,
        }
    }

    pub fn with_fan_out_limit(mut self, limit: usize) -> Self {
        self.fan_out_limit = limit;
        self
    }
}

#[async_trait]
impl ToolCallable for SerperSearch {
    type Params = SearchParams;

    fn description(&self) -> &str {
        DESCRIPTION
    }

    fn guided_schema(&self) -> Value {
        queries_schema()
    }

    async fn execute(&self, params: SearchParams) -> Result<String, ToolError> {
        require_units(&params.queries, "search queries")?;
        tracing::info!(queries = ?params.queries, location = %params.location, "searching");
        let tool = Arc::clone(&self.tool);
        let location = params.location;
        Ok(search_each(
            params.queries,
            self.fan_out_limit,
            move |query: String| {
                let tool = Arc::clone(&tool);
                let location = location.clone();
                async move { tool.search(&query, &location).await }
            },
            format_search_results,
        )
        .await)
    }
}
