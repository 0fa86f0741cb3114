//! # Maestro
//!
//! A planner agent ("meta agent") dispatching specialized workers over a shared workpad.
//!
//! Each run starts at the planner. The planner reads the requirements, the agent registry and
//! everything the workers wrote so far, then returns a [`DecisionArtifact`] naming the next
//! agent and its instructions. Workers (web search, shopping, scholar search, scraping,
//! retrieval, Tavily) turn those instructions into tool parameters, run the tool (fanning out
//! over queries or URLs) and append the result. The loop ends when the reporter relays the
//! planner's final answer, when the planner's output cannot be routed, or at the recursion limit.
//!
//! ## Main modules
//!
//! - [`workflow`]: [`build_workflow`], [`Workflow::run`], [`Workflow::stream`], [`RoutingFailurePolicy`].
//! - [`agent`]: [`Agent`] trait, [`PlannerAgent`], [`ReporterAgent`], [`ToolCallingAgent`] and the workers.
//! - [`state`]: [`Workpad`] (append-only per agent) and [`AgentRegistry`].
//! - [`graph`]: [`StateGraph`], [`CompiledStateGraph`], conditional routing, step limit.
//! - [`llm`]: [`LlmClient`] with [`ChatOpenAI`], [`ChatAnthropic`] and [`MockLlm`].
//! - [`tools`]: Serper, Tavily, page scraping and lexical retrieval.
//! - [`fanout`]: bounded concurrent fan-out with per-unit failure isolation.
//! - [`conversation`]: chat front end that runs the workflow on `/end`.
//! - [`config`]: [`MaestroConfig`] from the environment, default roster.
//! - [`prompts`]: planner and chat prompts (embedded YAML, directory and env overrides).

pub mod agent;
pub mod config;
pub mod conversation;
pub mod error;
pub mod fanout;
pub mod graph;
pub mod llm;
pub mod message;
pub mod prompts;
pub mod state;
pub mod tools;
pub mod workflow;

pub use agent::{
    read_instructions, Agent, AgentRole, Decision, DecisionArtifact, DecisionError, InstructionSource, PlannerAgent,
    ReporterAgent, ToolCallable, ToolCallingAgent, TurnContext, TurnOutcome,
};
pub use config::{ConfigError, MaestroConfig, Provider};
pub use conversation::{extract_requirements, Conversation, ConversationReply, RunSummary};
pub use error::AgentError;
pub use fanout::{fan_out, UnitOutcome, DEFAULT_FAN_OUT_LIMIT};
pub use graph::{CompilationError, CompiledStateGraph, Next, Node, RunConfig, StateGraph, END, START};
pub use llm::{ChatAnthropic, ChatOpenAI, ErrorPolicy, LlmClient, MockLlm, RetryPolicy};
pub use message::Message;
pub use prompts::Prompts;
pub use state::{AgentRegistry, AgentResult, Workpad};
pub use tools::ToolError;
pub use workflow::{
    build_workflow, RoutingFailurePolicy, Workflow, WorkflowBuildError, WorkflowEvent, WorkflowOptions,
    WorkflowOutcome,
};

/// When running `cargo test -p maestro`, initializes tracing from `RUST_LOG` so unit tests
/// in `src/**` can print logs with `--nocapture`.
#[cfg(test)]
mod test_logging {
    use ctor::ctor;
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;
    use tracing_subscriber::EnvFilter;
    use tracing_subscriber::Layer;

    #[ctor]
    fn init() {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
        let _ = tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .with_test_writer()
                    .with_filter(filter),
            )
            .try_init();
    }
}
