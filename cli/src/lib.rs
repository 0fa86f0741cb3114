//! Library side of the `maestro` binary: resolves configuration from the environment, the
//! XDG `[run]` table and command-line flags, then builds a [`Conversation`] or drives a
//! one-shot workflow run while forwarding progress lines.
//!
//! Precedence for every setting: flag > process env (including `.env` and XDG `[env]`, already
//! applied by `config::load_and_apply`) > `[run]` table > library default.

mod display;

use config::RunSettings;
use maestro::{
    build_workflow, ConfigError, Conversation, MaestroConfig, Provider, Workflow, WorkflowBuildError, WorkflowEvent,
    WorkflowOutcome,
};
use thiserror::Error;
use tokio_stream::StreamExt;

pub use display::{format_outcome_json, format_progress, format_run_footer, truncate_display};

/// Application name used for the XDG config directory.
pub const APP_NAME: &str = "maestro";

#[derive(Debug, Error)]
pub enum RunError {
    #[error("config: {0}")]
    Config(#[from] ConfigError),
    #[error("settings: {0}")]
    Settings(#[from] config::LoadError),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("workflow: {0}")]
    Build(#[from] WorkflowBuildError),
    #[error("no requirement given")]
    EmptyRequirement,
    #[error("workflow stream ended without an outcome")]
    Interrupted,
}

/// Values given on the command line; `None` leaves the configured value alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides {
    pub provider: Option<String>,
    pub planner_model: Option<String>,
    pub worker_model: Option<String>,
    pub recursion_limit: Option<usize>,
}

fn from_settings(settings: &RunSettings, key: &str) -> Option<String> {
    let value = match key {
        "MAESTRO_RECURSION_LIMIT" => settings.recursion_limit,
        "MAESTRO_FAN_OUT_LIMIT" => settings.fan_out_limit,
        "MAESTRO_ROUTING_RETRIES" => settings.routing_retries,
        _ => None,
    };
    value.map(|v| v.to_string())
}

/// Builds the config from `lookup` (normally the process env), falling back to `settings`,
/// then applies `overrides`.
pub fn resolve_config(
    lookup: impl Fn(&str) -> Option<String>,
    settings: &RunSettings,
    overrides: &Overrides,
) -> Result<MaestroConfig, RunError> {
    let mut cfg = MaestroConfig::from_lookup(|key| {
        lookup(key)
            .filter(|v| !v.trim().is_empty())
            .or_else(|| from_settings(settings, key))
    })?;

    if let Some(provider) = &overrides.provider {
        cfg.provider = provider.parse::<Provider>()?;
    }
    if let Some(model) = &overrides.planner_model {
        cfg.planner_model = model.clone();
    }
    if let Some(model) = &overrides.worker_model {
        cfg.worker_model = model.clone();
    }
    if let Some(limit) = overrides.recursion_limit {
        cfg.recursion_limit = limit;
    }
    tracing::debug!(
        provider = ?cfg.provider,
        planner_model = %cfg.planner_model,
        worker_model = %cfg.worker_model,
        recursion_limit = cfg.recursion_limit,
        "configuration resolved"
    );
    Ok(cfg)
}

/// Process env over the XDG `[run]` table, then `overrides`.
pub fn load_config(overrides: &Overrides) -> Result<MaestroConfig, RunError> {
    let settings = config::load_settings(APP_NAME)?;
    resolve_config(|key| std::env::var(key).ok(), &settings, overrides)
}

/// Chat front end on the planner model, with the full roster behind it.
pub fn build_conversation(cfg: &MaestroConfig) -> Conversation {
    let prompts = cfg.prompts();
    let roster = cfg.roster(&prompts);
    Conversation::new(cfg.llm(&cfg.planner_model), roster, prompts, cfg.workflow_options())
}

/// Workflow for one requirement text, with the configured roster.
pub fn build_run(cfg: &MaestroConfig, requirements: &str) -> Result<Workflow, RunError> {
    let requirements = requirements.trim();
    if requirements.is_empty() {
        return Err(RunError::EmptyRequirement);
    }
    let prompts = cfg.prompts();
    Ok(build_workflow(cfg.roster(&prompts), requirements, cfg.workflow_options())?)
}

/// Streams `workflow`, calling `on_progress` for each progress line, and returns its outcome.
pub async fn drive<F>(workflow: &Workflow, mut on_progress: F) -> Result<WorkflowOutcome, RunError>
where
    F: FnMut(&str),
{
    let mut events = workflow.stream();
    while let Some(event) = events.next().await {
        match event {
            WorkflowEvent::Progress(line) => on_progress(&line),
            WorkflowEvent::Step { node_id } => tracing::debug!(%node_id, "step finished"),
            WorkflowEvent::Finished(outcome) => return Ok(outcome),
        }
    }
    Err(RunError::Interrupted)
}
