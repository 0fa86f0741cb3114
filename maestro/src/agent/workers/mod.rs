//! Concrete workers: each is a [`ToolCallable`](super::ToolCallable) wrapped in a
//! [`ToolCallingAgent`](super::ToolCallingAgent).

mod rag;
mod scholar;
mod scraper;
mod search;
mod shopping;
mod tavily;

pub use rag::{RagParams, RagTool};
pub use scholar::{ScholarParams, ScholarSearch};
pub use scraper::{ScrapeParams, WebScraper};
pub use search::{SearchParams, SerperSearch};
pub use shopping::ShoppingSearch;
pub use tavily::{TavilyParams, TavilySearch};

use std::future::Future;

use crate::fanout::fan_out;
use crate::tools::ToolError;

/// Search locale used when the provider leaves `location` out.
pub const DEFAULT_LOCATION: &str = "us";

pub(crate) fn default_location() -> String {
    DEFAULT_LOCATION.to_string()
}

/// Runs one search per query and joins the formatted results with `"\n"`.
///
/// A failed query contributes `Error for query '{q}': {msg}` in its place.
pub(crate) async fn search_each<T, F, Fut>(
    queries: Vec<String>,
    limit: usize,
    search: F,
    format: fn(&[T]) -> String,
) -> String
where
    T: Send + 'static,
    F: Fn(String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Vec<T>, ToolError>> + Send + 'static,
{
    fan_out(queries, limit, search)
        .await
        .into_iter()
        .map(|outcome| match outcome.result {
            Ok(hits) => format(&hits),
            Err(e) => {
                tracing::warn!(query = %outcome.unit, error = %e, "search query failed");
                format!("Error for query '{}': {}", outcome.unit, e)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Rejects an empty unit list before any request is made.
pub(crate) fn require_units(units: &[String], what: &str) -> Result<(), ToolError> {
    if units.iter().all(|u| u.trim().is_empty()) {
        return Err(ToolError::InvalidInput(format!("{what} missing from the tool parameters")));
    }
    Ok(())
}
