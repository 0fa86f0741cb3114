//! Single worker turns against fake backends: what lands in the workpad and under whose key.

mod common;

use std::sync::Arc;

use async_trait::async_trait;
use common::{after_planner_turn, decision, reporter, REPORTER};
use maestro::agent::{RagTool, TavilySearch, WebScraper};
use maestro::llm::parse_error_envelope;
use maestro::tools::{LexicalRetriever, ScrapeTool, ScrapedPage, SearchHit, SearchTool};
use maestro::{Agent, AgentError, DecisionArtifact, MockLlm, ToolCallingAgent, ToolError, TurnOutcome};
use serde_json::Value;

struct Pages;

#[async_trait]
impl ScrapeTool for Pages {
    async fn scrape(&self, url: &str) -> Result<ScrapedPage, ToolError> {
        match url {
            "https://paris.example" => Ok(ScrapedPage {
                source: url.to_string(),
                content: "Paris is the capital and largest city of France. The Seine flows through it."
                    .to_string(),
            }),
            "https://bread.example" => Ok(ScrapedPage {
                source: url.to_string(),
                content: "Sourdough needs a starter, flour, water and salt.".to_string(),
            }),
            _ => Err(ToolError::Transport(format!("connection refused: {url}"))),
        }
    }
}

struct DownSearch;

#[async_trait]
impl SearchTool for DownSearch {
    async fn search(&self, _query: &str, _locale: &str) -> Result<Vec<SearchHit>, ToolError> {
        Err(ToolError::Api("quota exceeded".into()))
    }
}

/// **Scenario**: the scraper keeps good pages and records an error entry for the dead one.
#[tokio::test]
async fn scraper_turn_maps_each_url() {
    let llm = Arc::new(MockLlm::new(r#"{"urls": ["https://paris.example", "https://dead.example"]}"#));
    let agent: Arc<dyn Agent> = Arc::new(ToolCallingAgent::new(
        "web_scraper_agent",
        llm,
        WebScraper::new(Arc::new(Pages)),
    ));
    let (mut pad, ctx) = after_planner_turn(&[agent.clone()], decision("web_scraper_agent", "read these")).await;

    agent.run_turn(&mut pad, &ctx).await.unwrap();
    let written = &pad.latest("web_scraper_agent").unwrap().content;
    let pages: Value = serde_json::from_str(written).unwrap();
    assert_eq!(pages["https://paris.example"]["source"], "https://paris.example");
    assert!(pages["https://paris.example"]["content"].as_str().unwrap().contains("capital"));
    assert!(pages["https://dead.example"]["error"]
        .as_str()
        .unwrap()
        .contains("connection refused"));
}

/// **Scenario**: retrieval ranks the relevant page first and drops the unrelated one.
#[tokio::test]
async fn rag_turn_returns_relevant_passages() {
    let llm = Arc::new(MockLlm::new(
        r#"{"urls": ["https://paris.example", "https://bread.example"], "query": "capital of France"}"#,
    ));
    let retriever = LexicalRetriever::new(Pages);
    let agent: Arc<dyn Agent> = Arc::new(ToolCallingAgent::new(
        "rag_agent",
        llm,
        RagTool::new(Arc::new(retriever)),
    ));
    let (mut pad, ctx) = after_planner_turn(&[agent.clone()], decision("rag_agent", "find the capital")).await;

    agent.run_turn(&mut pad, &ctx).await.unwrap();
    let text = &pad.latest("rag_agent").unwrap().content;
    assert!(text.starts_with("---\nEntry 1\nText:\nParis is the capital"));
    assert!(text.contains("Source:\nhttps://paris.example"));
    assert!(!text.contains("Sourdough"));
}

/// **Scenario**: retrieval with no usable page reports the failure inline instead of halting.
#[tokio::test]
async fn rag_turn_reports_unreachable_pages_inline() {
    let llm = Arc::new(MockLlm::new(r#"{"urls": ["https://dead.example"], "query": "anything"}"#));
    let agent: Arc<dyn Agent> = Arc::new(ToolCallingAgent::new(
        "rag_agent",
        llm,
        RagTool::new(Arc::new(LexicalRetriever::new(Pages))),
    ));
    let (mut pad, ctx) = after_planner_turn(&[agent.clone()], decision("rag_agent", "look")).await;

    agent.run_turn(&mut pad, &ctx).await.unwrap();
    let text = &pad.latest("rag_agent").unwrap().content;
    assert!(text.starts_with("Error for query 'anything':"), "{text}");
}

/// **Scenario**: an empty URL list is a tool-input error, and nothing is written.
#[tokio::test]
async fn rag_turn_without_urls_is_tool_input_error() {
    let llm = Arc::new(MockLlm::new(r#"{"urls": [], "query": "capital"}"#));
    let agent: Arc<dyn Agent> = Arc::new(ToolCallingAgent::new(
        "rag_agent",
        llm,
        RagTool::new(Arc::new(LexicalRetriever::new(Pages))),
    ));
    let (mut pad, ctx) = after_planner_turn(&[agent.clone()], decision("rag_agent", "look")).await;

    let err = agent.run_turn(&mut pad, &ctx).await.unwrap_err();
    assert!(matches!(err, AgentError::ToolInput { agent, .. } if agent == "rag_agent"));
    assert!(pad.results("rag_agent").unwrap().is_empty());
}

/// **Scenario**: a failing Tavily backend yields an error envelope as the worker's output.
#[tokio::test]
async fn tavily_failure_becomes_error_envelope() {
    let llm = Arc::new(MockLlm::new(r#"{"query": "capital of France"}"#));
    let agent: Arc<dyn Agent> = Arc::new(ToolCallingAgent::new(
        "tavily_agent",
        llm,
        TavilySearch::new(Arc::new(DownSearch)),
    ));
    let (mut pad, ctx) = after_planner_turn(&[agent.clone()], decision("tavily_agent", "search")).await;

    agent.run_turn(&mut pad, &ctx).await.unwrap();
    let text = &pad.latest("tavily_agent").unwrap().content;
    assert!(parse_error_envelope(text).unwrap().contains("quota exceeded"));
}

/// **Scenario**: the reporter relays the planner's final draft verbatim.
#[tokio::test]
async fn reporter_relays_final_draft() {
    let agent = reporter();
    let (mut pad, ctx) = after_planner_turn(&[agent.clone()], decision(REPORTER, "The capital of France is Paris.")).await;

    let outcome = agent.run_turn(&mut pad, &ctx).await.unwrap();
    assert_eq!(outcome, TurnOutcome::Produced("The capital of France is Paris.".into()));
    assert_eq!(pad.latest(REPORTER).unwrap().producer, REPORTER);
}

/// **Scenario**: a decision artifact survives serialization; extra fields are rejected.
#[test]
fn decision_artifact_round_trips() {
    let artifact = DecisionArtifact::new("serper_agent", "Search for the capital of France");
    let parsed = DecisionArtifact::parse(&artifact.to_json()).unwrap();
    assert_eq!(parsed, artifact);
    assert_eq!(parsed.agent, "serper_agent");

    let mut value: Value = serde_json::from_str(&artifact.to_json()).unwrap();
    value["step_4"]["extra"] = Value::from(1);
    assert!(DecisionArtifact::parse(&value.to_string()).is_err());
}
