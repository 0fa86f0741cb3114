//! Error types for agent turns and workflow runs.
//!
//! Soft failures (missing planner instructions, unparseable routing decisions, one failed
//! unit in a fan-out) never surface here; they are logged and folded into state or routing.

use thiserror::Error;

/// Failure of one agent turn or of a whole workflow run.
#[derive(Debug, Error)]
pub enum AgentError {
    /// Execution failed with a message (graph misuse, join failure, host-side error).
    #[error("execution failed: {0}")]
    ExecutionFailed(String),

    /// The provider's reply could not be parsed into the worker's tool parameters.
    ///
    /// A worker cannot proceed without structured parameters, so the run halts.
    #[error("invalid tool input for {agent}: {message}")]
    ToolInput { agent: String, message: String },

    /// A capability provider gave up after its retries and is configured to propagate.
    #[error("provider error: {0}")]
    Provider(String),

    /// The run used up its step budget without reaching the end.
    #[error("recursion limit of {0} steps reached without termination")]
    RecursionLimit(usize),
}

#[cfg(test)]
mod tests {
    use super::*;

    /// **Scenario**: Display of ToolInput names the agent and the parse message.
    #[test]
    fn tool_input_display_names_agent() {
        let err = AgentError::ToolInput {
            agent: "serper_agent".into(),
            message: "expected value at line 1".into(),
        };
        let s = err.to_string();
        assert!(s.contains("serper_agent"), "{}", s);
        assert!(s.contains("expected value"), "{}", s);
    }

    /// **Scenario**: RecursionLimit is distinct from ExecutionFailed and carries the limit.
    #[test]
    fn recursion_limit_display_contains_limit() {
        let err = AgentError::RecursionLimit(50);
        assert!(err.to_string().contains("50"));
        assert!(!matches!(err, AgentError::ExecutionFailed(_)));
    }
}
