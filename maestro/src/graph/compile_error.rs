//! Graph compilation error.

use thiserror::Error;

/// Returned by [`StateGraph::compile`](super::StateGraph::compile) when the edges do not
/// describe a runnable graph.
#[derive(Debug, Error)]
pub enum CompilationError {
    /// An edge references an id that was never added (and is not START/END).
    #[error("node not found: {0}")]
    NodeNotFound(String),

    /// No edge leaves START.
    #[error("graph must have exactly one edge from START")]
    MissingStart,

    /// No edge or conditional target reaches END.
    #[error("graph must have a path to END")]
    MissingEnd,

    /// Branching plain edges or a cycle in a graph without conditional edges.
    #[error("invalid edge structure: {0}")]
    InvalidChain(String),

    /// A node has both an outgoing edge and conditional edges.
    #[error("node has both edge and conditional edges: {0}")]
    NodeHasBothEdgeAndConditional(String),

    /// A conditional path_map value is neither a node id nor END.
    #[error("conditional path_map invalid target: {0}")]
    InvalidConditionalPathMap(String),
}
