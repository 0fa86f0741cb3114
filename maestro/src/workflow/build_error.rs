//! Roster validation and graph build errors.

use thiserror::Error;

use crate::graph::CompilationError;

/// Why a roster could not be turned into a workflow.
#[derive(Debug, Error)]
pub enum WorkflowBuildError {
    #[error("roster has no planner agent")]
    MissingPlanner,

    #[error("roster has no reporter agent")]
    MissingReporter,

    /// More than one agent has the planner role; holds their names.
    #[error("roster has more than one planner: {}", .0.join(", "))]
    DuplicatePlanner(Vec<String>),

    #[error("roster has more than one reporter: {}", .0.join(", "))]
    DuplicateReporter(Vec<String>),

    /// Two agents share a name (and therefore a workpad key).
    #[error("agent name used more than once: {0}")]
    DuplicateAgent(String),

    #[error("dispatch graph: {0}")]
    Compile(#[from] CompilationError),
}
