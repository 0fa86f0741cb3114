//! External capabilities wrapped by worker agents: web search, shopping search, page
//! scraping and retrieval over scraped pages.
//!
//! Each capability is a trait so workers can be driven by HTTP clients in production
//! and by scripted fakes in tests.

mod retrieval;
mod scraper;
mod serper;
mod tavily;

pub use retrieval::{format_retrieved_context, LexicalRetriever, RetrievedChunk};
pub use scraper::{extract_paragraphs, HttpScraper};
pub use serper::SerperClient;
pub use tavily::TavilyClient;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure of one external tool call. Converted to an inline marker by the fan-out harness.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("missing credentials: {0}")]
    MissingCredentials(String),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("api error: {0}")]
    Api(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// The unit's task panicked or was cancelled.
    #[error("task failed: {0}")]
    Join(String),
}

impl From<reqwest::Error> for ToolError {
    fn from(e: reqwest::Error) -> Self {
        ToolError::Transport(e.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sitelink {
    pub title: String,
    pub link: String,
}

/// One organic search result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub query: String,
    pub title: String,
    pub link: String,
    #[serde(default)]
    pub sitelinks: Vec<Sitelink>,
    /// Page excerpt, when the backend returns one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snippet: Option<String>,
}

/// One shopping result; absent fields stay `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShoppingHit {
    pub title: Option<String>,
    pub link: Option<String>,
    pub price: Option<String>,
    pub source: Option<String>,
    pub rating: Option<f64>,
    pub rating_count: Option<u64>,
    pub delivery: Option<String>,
}

/// One scholarly result.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScholarHit {
    pub title: Option<String>,
    pub link: Option<String>,
    pub publication_info: Option<String>,
    pub cited_by: Option<u64>,
    pub year: Option<u32>,
}

/// Scraped page text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrapedPage {
    pub source: String,
    pub content: String,
}

/// Retrieval strategy requested by the planner.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RagMode {
    /// Knowledge-graph plus dense retrieval.
    Hybrid,
    #[default]
    Dense,
}

#[async_trait]
pub trait SearchTool: Send + Sync {
    /// Organic results for `query` in `locale` (country code such as `us`).
    async fn search(&self, query: &str, locale: &str) -> Result<Vec<SearchHit>, ToolError>;
}

#[async_trait]
pub trait ShoppingTool: Send + Sync {
    async fn shopping(&self, query: &str, locale: &str) -> Result<Vec<ShoppingHit>, ToolError>;
}

#[async_trait]
pub trait ScholarTool: Send + Sync {
    async fn scholar(&self, query: &str, locale: &str) -> Result<Vec<ScholarHit>, ToolError>;
}

#[async_trait]
pub trait ScrapeTool: Send + Sync {
    async fn scrape(&self, url: &str) -> Result<ScrapedPage, ToolError>;
}

#[async_trait]
pub trait Retriever: Send + Sync {
    /// Passages from `urls` relevant to `query`, formatted as text.
    async fn retrieve(&self, urls: &[String], query: &str, mode: RagMode) -> Result<String, ToolError>;
}

/// `Query/Title/Link` blocks with sitelinks, each followed by a 40-dash rule.
pub fn format_search_results(hits: &[SearchHit]) -> String {
    hits.iter()
        .map(|hit| {
            let mut block = format!("Query: {}\nTitle: {}\nLink: {}", hit.query, hit.title, hit.link);
            if hit.sitelinks.is_empty() {
                block.push_str("\nSitelinks: None");
            } else {
                block.push_str("\nSitelinks:");
                for s in &hit.sitelinks {
                    block.push_str(&format!("\n    - {}: {}", s.title, s.link));
                }
            }
            if let Some(snippet) = &hit.snippet {
                block.push_str(&format!("\nSnippet: {snippet}"));
            }
            block.push('\n');
            block.push_str(&"-".repeat(40));
            block
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// One block per product, separated by `---`.
pub fn format_shopping_results(hits: &[ShoppingHit]) -> String {
    hits.iter()
        .map(|h| {
            let rating = h
                .rating
                .map(|r| r.to_string())
                .unwrap_or_else(|| "No rating".into());
            let count = h
                .rating_count
                .map(|c| c.to_string())
                .unwrap_or_else(|| "No rating count".into());
            format!(
                "Title: {}\nSource: {}\nPrice: {}\nRating: {} ({} reviews)\nDelivery: {}\nLink: {}\n---",
                h.title.as_deref().unwrap_or("No Title"),
                h.source.as_deref().unwrap_or("Source not available"),
                h.price.as_deref().unwrap_or("Price not available"),
                rating,
                count,
                h.delivery
                    .as_deref()
                    .unwrap_or("Delivery information not available"),
                h.link.as_deref().unwrap_or("#"),
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// One block per paper, separated by `---`.
pub fn format_scholar_results(hits: &[ScholarHit]) -> String {
    hits.iter()
        .map(|h| {
            format!(
                "Title: {}\nPublication: {}\nYear: {}\nCited by: {}\nLink: {}\n---",
                h.title.as_deref().unwrap_or("No Title"),
                h.publication_info.as_deref().unwrap_or("Publication info not available"),
                h.year.map(|y| y.to_string()).unwrap_or_else(|| "Unknown".into()),
                h.cited_by.unwrap_or(0),
                h.link.as_deref().unwrap_or("#"),
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}
