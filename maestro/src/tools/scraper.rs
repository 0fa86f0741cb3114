//! HTTP page scraper: fetches a URL and keeps the text of its `<p>` elements.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;

use super::{ScrapeTool, ScrapedPage, ToolError};

static PARAGRAPH: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)<p\b[^>]*>(.*?)</p\s*>").unwrap());
static TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<[^>]+>").unwrap());
static SCRIPT_OR_STYLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<(script|style)\b[^>]*>.*?</(script|style)\s*>").unwrap());
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

const UNSUPPORTED: &str = "Unsupported document type, supported types are 'html' and 'text'.";

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

/// Paragraph texts of an HTML document, one per line, tags stripped and whitespace collapsed.
pub fn extract_paragraphs(html: &str) -> String {
    let cleaned = SCRIPT_OR_STYLE.replace_all(html, "");
    PARAGRAPH
        .captures_iter(&cleaned)
        .filter_map(|cap| {
            let inner = TAG.replace_all(&cap[1], "");
            let text = decode_entities(WHITESPACE.replace_all(&inner, " ").trim());
            (!text.is_empty()).then_some(text)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub struct HttpScraper {
    client: reqwest::Client,
}

impl HttpScraper {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .user_agent(concat!("maestro/", env!("CARGO_PKG_VERSION")))
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .unwrap_or_default();
        Self { client }
    }
}

impl Default for HttpScraper {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ScrapeTool for HttpScraper {
    async fn scrape(&self, url: &str) -> Result<ScrapedPage, ToolError> {
        let parsed = reqwest::Url::parse(url).map_err(|e| ToolError::InvalidInput(format!("{url}: {e}")))?;
        tracing::debug!(url, "scraping");
        let resp = self.client.get(parsed).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(ToolError::Api(format!("GET {url} returned {status}")));
        }
        let content_type = resp
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("text/html")
            .to_ascii_lowercase();
        let body = resp.text().await?;

        let content = if content_type.contains("html") {
            extract_paragraphs(&body)
        } else if content_type.starts_with("text/") {
            body
        } else {
            tracing::warn!(url, content_type = %content_type, "unsupported document type");
            UNSUPPORTED.to_string()
        };
        Ok(ScrapedPage {
            source: url.to_string(),
            content,
        })
    }
}
