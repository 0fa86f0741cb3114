//! Tavily search client.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use super::{SearchHit, SearchTool, ToolError};

const TAVILY_BASE_URL: &str = "https://api.tavily.com";

pub struct TavilyClient {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

#[derive(Deserialize)]
struct TavilyBody {
    #[serde(default)]
    results: Vec<TavilyEntry>,
}

#[derive(Deserialize)]
struct TavilyEntry {
    title: Option<String>,
    url: Option<String>,
    content: Option<String>,
}

impl TavilyClient {
    /// Client with key from `TAVILY_API_KEY`.
    pub fn from_env() -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: TAVILY_BASE_URL.to_string(),
            api_key: std::env::var("TAVILY_API_KEY").ok(),
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl SearchTool for TavilyClient {
    /// Tavily has no locale parameter; `_locale` is ignored.
    async fn search(&self, query: &str, _locale: &str) -> Result<Vec<SearchHit>, ToolError> {
        let key = self
            .api_key
            .as_deref()
            .ok_or_else(|| ToolError::MissingCredentials("TAVILY_API_KEY is not set".into()))?;
        let url = format!("{}/search", self.base_url.trim_end_matches('/'));
        let resp = self
            .client
            .post(url)
            .json(&json!({ "api_key": key, "query": query }))
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(ToolError::Api(format!("tavily returned {status}")));
        }
        let body: TavilyBody = resp
            .json()
            .await
            .map_err(|e| ToolError::Api(format!("tavily body: {e}")))?;
        Ok(body
            .results
            .into_iter()
            .map(|r| SearchHit {
                query: query.to_string(),
                title: r.title.unwrap_or_else(|| "No Title".into()),
                link: r.url.unwrap_or_else(|| "#".into()),
                sitelinks: Vec::new(),
                snippet: Some(r.content.unwrap_or_else(|| "No Content".into())),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn search_maps_results_with_content() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "results": [ { "title": "Paris", "url": "https://p", "content": "Capital of France" }, { } ]
            })))
            .mount(&server)
            .await;

        let client = TavilyClient::from_env().with_api_key("t").with_base_url(server.uri());
        let hits = client.search("capital", "us").await.unwrap();
        assert_eq!(hits[0].snippet.as_deref(), Some("Capital of France"));
        assert_eq!(hits[1].title, "No Title");
        assert_eq!(hits[1].snippet.as_deref(), Some("No Content"));
    }
}
