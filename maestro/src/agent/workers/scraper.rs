//! Full-page scraping worker.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Map, Value};

use crate::agent::ToolCallable;
use crate::fanout::{fan_out, DEFAULT_FAN_OUT_LIMIT};
use crate::tools::{ScrapeTool, ToolError};

use super::require_units;

const DESCRIPTION: &str = "\
# Functionality:
Scrapes the entire text content of the web pages at a list of URLs. Use it when you need
comprehensive information or the global context of pages.

## Inputs:
- **urls**: a list of URLs to scrape.

## Outputs:
- A JSON object mapping each URL to its scraped content, or to an error.

## Important Notes:
- Returns all available text; for specific facts prefer the retrieval agent.";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ScrapeParams {
    pub urls: Vec<String>,
}

pub struct WebScraper {
    tool: Arc<dyn ScrapeTool>,
    fan_out_limit: usize,
}

impl WebScraper {
    pub fn new(tool: Arc<dyn ScrapeTool>) -> Self {
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
impl ToolCallable for WebScraper {
    type Params = ScrapeParams;

    fn description(&self) -> &str {
        DESCRIPTION
    }

    fn guided_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "urls": {
                    "type": "array",
                    "items": { "type": "string", "description": "A valid URL to scrape." },
                    "description": "A list of URLs to scrape."
                }
            },
            "required": ["urls"],
            "additionalProperties": false
        })
    }

    /// `{url: {source, content}}`, with `{url: {"error": msg}}` for pages that failed.
    async fn execute(&self, params: ScrapeParams) -> Result<String, ToolError> {
        require_units(&params.urls, "URLs")?;
        tracing::info!(urls = ?params.urls, "scraping");
        let tool = Arc::clone(&self.tool);
        let outcomes = fan_out(params.urls, self.fan_out_limit, move |url: String| {
            let tool = Arc::clone(&tool);
            async move { tool.scrape(&url).await }
        })
        .await;

        let mut pages = Map::new();
        for outcome in outcomes {
            let value = match outcome.result {
                Ok(page) => json!({ "source": page.source, "content": page.content }),
                Err(e) => {
                    tracing::warn!(url = %outcome.unit, error = %e, "scrape failed");
                    json!({ "error": e.to_string() })
                }
            };
            pages.insert(outcome.unit, value);
        }
        serde_json::to_string(&Value::Object(pages)).map_err(|e| ToolError::Api(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::ScrapedPage;

    struct FakeScraper;

    #[async_trait]
    impl ScrapeTool for FakeScraper {
        async fn scrape(&self, url: &str) -> Result<ScrapedPage, ToolError> {
            if url.contains("down") {
                return Err(ToolError::Transport("connection refused".into()));
            }
            Ok(ScrapedPage { source: url.into(), content: "Paris is the capital.".into() })
        }
    }

    /// **Scenario**: each URL maps to its page or an error object; one failure does not hide the rest.
    #[tokio::test]
    async fn maps_each_url_to_page_or_error() {
        let worker = WebScraper::new(Arc::new(FakeScraper));
        let text = worker
            .execute(ScrapeParams { urls: vec!["https://ok".into(), "https://down".into()] })
            .await
            .unwrap();
        let value: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["https://ok"]["content"], "Paris is the capital.");
        assert_eq!(value["https://ok"]["source"], "https://ok");
        assert_eq!(value["https://down"]["error"], "transport error: connection refused");
    }
}
