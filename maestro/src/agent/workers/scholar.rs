//! Scholarly search worker (Serper `/scholar`).

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use crate::agent::ToolCallable;
use crate::fanout::DEFAULT_FAN_OUT_LIMIT;
use crate::tools::{format_scholar_results, ScholarTool, ToolError};

use super::search::queries_schema;
use super::{default_location, require_units, search_each};

const DESCRIPTION: &str = "\
# Functionality:
Searches Google Scholar for a list of queries and returns papers with title, publication
info, year, citation count and link.

## Inputs:
- **queries**: a list of research query strings.
- **location**: country code for the search. Defaults to 'us'.

## Important Notes:
- Returns bibliographic summaries only; use the retrieval agent on the links for content.";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ScholarParams {
    pub queries: Vec<String>,
    #[serde(default = "default_location")]
    pub location: String,
}

pub struct ScholarSearch {
    tool: Arc<dyn ScholarTool>,
    fan_out_limit: usize,
}

impl ScholarSearch {
    pub fn new(tool: Arc<dyn ScholarTool>) -> Self {
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
impl ToolCallable for ScholarSearch {
    type Params = ScholarParams;

    fn description(&self) -> &str {
        DESCRIPTION
    }

    fn guided_schema(&self) -> Value {
        queries_schema()
    }

    async fn execute(&self, params: ScholarParams) -> Result<String, ToolError> {
        require_units(&params.queries, "scholar queries")?;
        let tool = Arc::clone(&self.tool);
        let location = params.location;
        Ok(search_each(
            params.queries,
            self.fan_out_limit,
            move |query: String| {
                let tool = Arc::clone(&tool);
                let location = location.clone();
                async move { tool.scholar(&query, &location).await }
            },
            format_scholar_results,
        )
        .await)
    }
}
