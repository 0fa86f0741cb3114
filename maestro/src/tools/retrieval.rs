//! Retrieval over scraped pages: scrape each URL, split pages into passages, rank the
//! passages against the query by term overlap and keep the best share.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;

use super::{RagMode, Retriever, ScrapeTool, ToolError};
use crate::fanout::{fan_out, DEFAULT_FAN_OUT_LIMIT};

/// Passages longer than this many words are split.
const DEFAULT_CHUNK_WORDS: usize = 120;
const DEFAULT_TOP_PERCENT: usize = 50;

/// One ranked passage.
#[derive(Debug, Clone, PartialEq)]
pub struct RetrievedChunk {
    pub text: String,
    pub source: String,
    pub score: f64,
}

/// `---` / `Entry i` / `Text:` / `Source:` blocks, numbered from 1.
pub fn format_retrieved_context(chunks: &[RetrievedChunk]) -> String {
    chunks
        .iter()
        .enumerate()
        .map(|(i, c)| format!("---\nEntry {}\nText:\n{}\nSource:\n{}\n\n", i + 1, c.text, c.source))
        .collect()
}

fn terms(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.chars().count() > 2)
        .map(|t| t.to_lowercase())
        .collect()
}

/// Groups lines into passages of at most `max_words` words; an oversized line is split on its own.
fn chunk_text(content: &str, max_words: usize) -> Vec<String> {
    let max_words = max_words.max(1);
    let mut chunks = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    for line in content.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let words: Vec<&str> = line.split_whitespace().collect();
        if current.len() + words.len() > max_words && !current.is_empty() {
            chunks.push(current.join(" "));
            current.clear();
        }
        for piece in words.chunks(max_words) {
            if piece.len() == max_words {
                if !current.is_empty() {
                    chunks.push(current.join(" "));
                    current.clear();
                }
                chunks.push(piece.join(" "));
            } else {
                current.extend_from_slice(piece);
            }
        }
    }
    if !current.is_empty() {
        chunks.push(current.join(" "));
    }
    chunks
}

fn score(query_terms: &HashSet<String>, passage: &str) -> f64 {
    let words = terms(passage);
    if words.is_empty() || query_terms.is_empty() {
        return 0.0;
    }
    let hits = words.iter().filter(|w| query_terms.contains(*w)).count();
    let distinct = query_terms.iter().filter(|q| words.contains(q)).count();
    distinct as f64 + hits as f64 / (words.len() as f64).sqrt()
}

/// [`Retriever`] that ranks passages of scraped pages by lexical overlap with the query.
pub struct LexicalRetriever<S> {
    scraper: Arc<S>,
    chunk_words: usize,
    top_percent: usize,
    fan_out_limit: usize,
}

impl<S: ScrapeTool + 'static> LexicalRetriever<S> {
    pub fn new(scraper: S) -> Self {
        Self {
            scraper: Arc::new(scraper),
            chunk_words: DEFAULT_CHUNK_WORDS,
            top_percent: DEFAULT_TOP_PERCENT,
            fan_out_limit: DEFAULT_FAN_OUT_LIMIT,
        }
    }

    pub fn with_chunk_words(mut self, words: usize) -> Self {
        self.chunk_words = words.max(1);
        self
    }

    /// Share of ranked passages kept, in percent (clamped to 1..=100).
    pub fn with_top_percent(mut self, percent: usize) -> Self {
        self.top_percent = percent.clamp(1, 100);
        self
    }

    pub fn with_fan_out_limit(mut self, limit: usize) -> Self {
        self.fan_out_limit = limit.max(1);
        self
    }

    /// Ranked passages for `query`, best first, plus the URLs that could not be scraped.
    pub async fn rank(&self, urls: &[String], query: &str) -> (Vec<RetrievedChunk>, Vec<(String, ToolError)>) {
        let scraper = Arc::clone(&self.scraper);
        let outcomes = fan_out(urls.to_vec(), self.fan_out_limit, move |url: String| {
            let scraper = Arc::clone(&scraper);
            async move { scraper.scrape(&url).await }
        })
        .await;

        let query_terms: HashSet<String> = terms(query).into_iter().collect();
        let mut seen = HashSet::new();
        let mut chunks = Vec::new();
        let mut failures = Vec::new();
        for outcome in outcomes {
            match outcome.result {
                Ok(page) => {
                    for text in chunk_text(&page.content, self.chunk_words) {
                        if seen.insert((text.clone(), page.source.clone())) {
                            let score = score(&query_terms, &text);
                            chunks.push(RetrievedChunk { text, source: page.source.clone(), score });
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!(url = %outcome.unit, error = %e, "retrieval scrape failed");
                    failures.push((outcome.unit, e));
                }
            }
        }

        chunks.sort_by(|a, b| b.score.total_cmp(&a.score));
        let keep = (chunks.len() * self.top_percent).div_ceil(100);
        chunks.truncate(keep);
        (chunks, failures)
    }
}

#[async_trait]
impl<S: ScrapeTool + 'static> Retriever for LexicalRetriever<S> {
    async fn retrieve(&self, urls: &[String], query: &str, mode: RagMode) -> Result<String, ToolError> {
        if urls.is_empty() {
            return Err(ToolError::InvalidInput("no urls to retrieve from".into()));
        }
        if mode == RagMode::Hybrid {
            tracing::warn!("hybrid retrieval has no graph index here; ranking passages lexically");
        }
        let (chunks, failures) = self.rank(urls, query).await;
        if chunks.is_empty() && !failures.is_empty() {
            let detail = failures
                .iter()
                .map(|(url, e)| format!("{url}: {e}"))
                .collect::<Vec<_>>()
                .join("; ");
            return Err(ToolError::Api(format!("no page could be retrieved ({detail})")));
        }
        let mut text = format_retrieved_context(&chunks);
        for (url, e) in &failures {
            text.push_str(&format!("---\nFailed source: {url}\nError: {e}\n\n"));
        }
        Ok(text)
    }
}
