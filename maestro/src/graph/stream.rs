//! Events emitted by [`CompiledStateGraph::stream`](super::CompiledStateGraph::stream).

use crate::error::AgentError;

/// One event of a streamed run. `Finished` is always the last event.
#[derive(Debug)]
pub enum GraphEvent<S> {
    /// A node is about to run.
    TaskStart { node_id: String },
    /// A node finished; `state` is the state after its update.
    Updates { node_id: String, state: S },
    /// The run ended. `state` is the last committed state, also when `outcome` is an error.
    Finished {
        state: S,
        outcome: Result<(), AgentError>,
    },
}
