//! Per-run settings for a compiled graph.

/// Default maximum node executions per run.
pub const DEFAULT_RECURSION_LIMIT: usize = 50;

/// Settings for one `invoke`/`stream` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    /// Maximum node executions before the run fails with `AgentError::RecursionLimit`.
    pub recursion_limit: usize,
}

impl RunConfig {
    pub fn with_recursion_limit(recursion_limit: usize) -> Self {
        Self { recursion_limit }
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            recursion_limit: DEFAULT_RECURSION_LIMIT,
        }
    }
}
