//! Graph runtime: [`StateGraph`] builder, [`CompiledStateGraph`] runner, conditional routing.
//!
//! The workflow builds one graph per conversation with a node per agent; the runner is
//! generic over the state type so it can be tested on its own.

mod compile_error;
mod compiled;
mod conditional;
mod logging;
mod next;
mod node;
mod run_config;
mod state_graph;
mod stream;

pub use compile_error::CompilationError;
pub use compiled::CompiledStateGraph;
pub use conditional::{ConditionalRouter, ConditionalRouterFn, NextEntry};
pub use next::Next;
pub use node::Node;
pub use run_config::{RunConfig, DEFAULT_RECURSION_LIMIT};
pub use state_graph::{StateGraph, END, START};
pub use stream::GraphEvent;
