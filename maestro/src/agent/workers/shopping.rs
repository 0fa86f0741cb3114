//! Shopping search worker (Serper `/shopping`).

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::agent::ToolCallable;
use crate::fanout::DEFAULT_FAN_OUT_LIMIT;
use crate::tools::{format_shopping_results, ShoppingTool, ToolError};

use super::search::{queries_schema, SearchParams};
use super::{require_units, search_each};

const DESCRIPTION: &str = "\
# Functionality:
Searches Google Shopping for a list of product queries and returns title, source, price,
rating, delivery and link for each product found.

## Inputs:
- **queries**: a list of product search strings.
- **location**: country code for the search (e.g. 'us', 'gb', 'nl', 'ca'). Defaults to 'us'.

## When to Use:
- Comparing prices or finding where a product is sold.";

pub struct ShoppingSearch {
    tool: Arc<dyn ShoppingTool>,
    fan_out_limit: usize,
}

impl ShoppingSearch {
    pub fn new(tool: Arc<dyn ShoppingTool>) -> Self {
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
impl ToolCallable for ShoppingSearch {
    type Params = SearchParams;

    fn description(&self) -> &str {
        DESCRIPTION
    }

    fn guided_schema(&self) -> Value {
        queries_schema()
    }

    async fn execute(&self, params: SearchParams) -> Result<String, ToolError> {
        require_units(&params.queries, "shopping queries")?;
        let tool = Arc::clone(&self.tool);
        let location = params.location;
        Ok(search_each(
            params.queries,
            self.fan_out_limit,
            move |query: String| {
                let tool = Arc::clone(&tool);
                let location = location.clone();
                async move { tool.shopping(&query, &location).await }
            },
            format_shopping_results,
        )
        .await)
    }
}
