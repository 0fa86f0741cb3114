//! Structured log lines for graph execution.

use crate::error::AgentError;

use super::Next;

pub fn log_graph_start(first_node: &str, recursion_limit: usize) {
    tracing::info!(first_node, recursion_limit, "Starting graph execution");
}

pub fn log_node_start(node_id: &str, step: usize) {
    tracing::debug!(node_id, step, "Starting node execution");
}

pub fn log_node_complete(node_id: &str, next: &Next) {
    tracing::debug!(node_id, ?next, "Node execution complete");
}

/// Conditional routing decision.
pub fn log_route(from: &str, to: &str) {
    tracing::debug!(from, to, "conditional routing");
}

pub fn log_graph_complete(steps: usize) {
    tracing::info!(steps, "Graph execution complete");
}

pub fn log_graph_error(error: &AgentError) {
    tracing::error!(%error, "Graph execution error");
}
