//! Serper (google.serper.dev) client: web, shopping and scholar search.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use super::{
    ScholarHit, ScholarTool, SearchHit, SearchTool, ShoppingHit, ShoppingTool, Sitelink, ToolError,
};

const SERPER_BASE_URL: &str = "https://google.serper.dev";

pub struct SerperClient {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

#[derive(Deserialize)]
struct SearchBody {
    #[serde(default)]
    organic: Vec<OrganicEntry>,
}

#[derive(Deserialize)]
struct OrganicEntry {
    title: Option<String>,
    link: Option<String>,
    snippet: Option<String>,
    #[serde(default)]
    sitelinks: Vec<SitelinkEntry>,
}

#[derive(Deserialize)]
struct SitelinkEntry {
    #[serde(default)]
    title: String,
    #[serde(default)]
    link: String,
}

#[derive(Deserialize)]
struct ShoppingBody {
    #[serde(default)]
    shopping: Vec<ShoppingHit>,
}

#[derive(Deserialize)]
struct ScholarBody {
    #[serde(default)]
    organic: Vec<ScholarHit>,
}

impl SerperClient {
    /// Client with key from `SERPER_API_KEY`.
    pub fn from_env() -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: SERPER_BASE_URL.to_string(),
            api_key: std::env::var("SERPER_API_KEY").ok(),
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

    async fn post<T: for<'de> Deserialize<'de>>(
        &self,
        endpoint: &str,
        query: &str,
        locale: &str,
    ) -> Result<T, ToolError> {
        let key = self
            .api_key
            .as_deref()
            .ok_or_else(|| ToolError::MissingCredentials("SERPER_API_KEY is not set".into()))?;
        let url = format!("{}/{}", self.base_url.trim_end_matches('/'), endpoint);
        tracing::debug!(endpoint, query, locale, "serper request");
        let resp = self
            .client
            .post(url)
            .header("X-API-KEY", key)
            .json(&json!({ "q": query, "gl": locale }))
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ToolError::Api(format!("serper {endpoint} returned {status}: {body}")));
        }
        resp.json::<T>()
            .await
            .map_err(|e| ToolError::Api(format!("serper {endpoint} body: {e}")))
    }
}

#[async_trait]
impl SearchTool for SerperClient {
    async fn search(&self, query: &str, locale: &str) -> Result<Vec<SearchHit>, ToolError> {
        let body: SearchBody = self.post("search", query, locale).await?;
        Ok(body
            .organic
            .into_iter()
            .map(|entry| SearchHit {
                query: query.to_string(),
                title: entry.title.unwrap_or_else(|| "No Title".into()),
                link: entry.link.unwrap_or_else(|| "#".into()),
                sitelinks: entry
                    .sitelinks
                    .into_iter()
                    .map(|s| Sitelink {
                        title: s.title,
                        link: s.link,
                    })
                    .collect(),
                snippet: entry.snippet,
            })
            .collect())
    }
}

#[async_trait]
impl ShoppingTool for SerperClient {
    async fn shopping(&self, query: &str, locale: &str) -> Result<Vec<ShoppingHit>, ToolError> {
        let body: ShoppingBody = self.post("shopping", query, locale).await?;
        Ok(body.shopping)
    }
}

#[async_trait]
impl ScholarTool for SerperClient {
    async fn scholar(&self, query: &str, locale: &str) -> Result<Vec<ScholarHit>, ToolError> {
        let body: ScholarBody = self.post("scholar", query, locale).await?;
        Ok(body.organic)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// **Scenario**: search posts {q, gl} with X-API-KEY and maps organic entries.
    #[tokio::test]
    async fn search_maps_organic_results() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/search"))
            .and(header("X-API-KEY", "serper-key"))
            .and(body_json(json!({ "q": "capital of France", "gl": "fr" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "organic": [
                    { "title": "Paris - Wikipedia", "link": "https://en.wikipedia.org/wiki/Paris",
                      "sitelinks": [ { "title": "History", "link": "https://h" } ] },
                    { "link": "https://paris.fr" }
                ]
            })))
            .mount(&server)
            .await;

        let client = SerperClient::from_env()
            .with_api_key("serper-key")
            .with_base_url(server.uri());
        let hits = client.search("capital of France", "fr").await.unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].title, "Paris - Wikipedia");
        assert_eq!(hits[0].sitelinks[0].title, "History");
        assert_eq!(hits[1].title, "No Title");
        assert_eq!(hits[1].query, "capital of France");
    }

    #[tokio::test]
    async fn missing_key_is_reported() {
        let client = SerperClient {
            client: reqwest::Client::new(),
            base_url: "http://127.0.0.1:9".into(),
            api_key: None,
        };
        let err = client.search("q", "us").await.unwrap_err();
        assert!(matches!(err, ToolError::MissingCredentials(_)));
    }

    #[tokio::test]
    async fn http_error_is_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/shopping"))
            .respond_with(ResponseTemplate::new(403).set_body_string("bad key"))
            .mount(&server)
            .await;
        let client = SerperClient::from_env()
            .with_api_key("k")
            .with_base_url(server.uri());
        let err = client.shopping("kettle", "us").await.unwrap_err();
        assert!(matches!(err, ToolError::Api(m) if m.contains("403")));
    }

    #[tokio::test]
    async fn scholar_reads_organic_papers() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/scholar"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "organic": [
                    { "title": "Attention Is All You Need", "publicationInfo": "A Vaswani - 2017",
                      "citedBy": 120000, "year": 2017, "link": "https://arxiv.org/abs/1706.03762" }
                ]
            })))
            .mount(&server)
            .await;
        let client = SerperClient::from_env()
            .with_api_key("k")
            .with_base_url(server.uri());
        let hits = client.scholar("transformers", "us").await.unwrap();
        assert_eq!(hits[0].cited_by, Some(120000));
        assert_eq!(hits[0].publication_info.as_deref(), Some("A Vaswani - 2017"));
    }
}
