//! Graph node running one agent turn.

use std::sync::Arc;

use async_trait::async_trait;

use crate::agent::{Agent, TurnContext};
use crate::error::AgentError;
use crate::graph::{Next, Node};
use crate::state::Workpad;

/// Node id of `agent` in the dispatch graph.
pub fn node_id(agent: &str) -> String {
    format!("{agent}_node")
}

/// Adapts an [`Agent`] to a [`Node<Workpad>`]; successors come from the graph's edges.
pub(crate) struct AgentNode {
    id: String,
    agent: Arc<dyn Agent>,
    ctx: TurnContext,
}

impl AgentNode {
    pub(crate) fn new(agent: Arc<dyn Agent>, ctx: TurnContext) -> Self {
        Self {
            id: node_id(agent.name()),
            agent,
            ctx,
        }
    }
}

#[async_trait]
impl Node<Workpad> for AgentNode {
    fn id(&self) -> &str {
        &self.id
    }

    async fn run(&self, state: Workpad) -> Result<(Workpad, Next), AgentError> {
        let mut state = state;
        self.agent.run_turn(&mut state, &self.ctx).await?;
        Ok((state, Next::Continue))
    }
}
