//! Compiled state graph: immutable, runs from the START node until END or the step limit.

use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use crate::error::AgentError;

use super::logging::{
    log_graph_complete, log_graph_error, log_graph_start, log_node_complete, log_node_start,
    log_route,
};
use super::state_graph::END;
use super::{GraphEvent, Next, NextEntry, Node, RunConfig};

/// Executable graph produced by [`StateGraph::compile`](super::StateGraph::compile).
///
/// After each node the successor comes from the node's router when it has conditional
/// edges, otherwise from the node's returned [`Next`] and its fixed edge. Every node
/// execution counts as one step against [`RunConfig::recursion_limit`].
#[derive(Clone)]
pub struct CompiledStateGraph<S> {
    pub(super) nodes: HashMap<String, Arc<dyn Node<S>>>,
    pub(super) first_node_id: String,
    pub(super) next_map: HashMap<String, NextEntry<S>>,
}

impl<S> CompiledStateGraph<S>
where
    S: Clone + Send + Sync + Debug + 'static,
{
    /// Node reached from START.
    pub fn first_node_id(&self) -> &str {
        &self.first_node_id
    }

    pub fn contains_node(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    fn successor(&self, current_id: &str, state: &S, next: Next) -> Option<String> {
        match self.next_map.get(current_id) {
            Some(NextEntry::Conditional(router)) => {
                let target = router.resolve_next(state);
                log_route(current_id, &target);
                Some(target)
            }
            entry => match next {
                Next::End => None,
                Next::Node(id) => Some(id),
                Next::Continue => match entry {
                    Some(NextEntry::Unconditional(id)) => Some(id.clone()),
                    _ => None,
                },
            },
        }
    }

    /// Shared run loop for `invoke_in_place` and `stream`. `state` always holds the last
    /// committed state, including when an error stops the run.
    async fn run_loop(
        &self,
        state: &mut S,
        config: &RunConfig,
        events: Option<&mpsc::Sender<GraphEvent<S>>>,
    ) -> Result<usize, AgentError> {
        let mut current_id = self.first_node_id.clone();
        let mut steps = 0usize;
        log_graph_start(&current_id, config.recursion_limit);

        loop {
            if steps >= config.recursion_limit {
                let err = AgentError::RecursionLimit(config.recursion_limit);
                log_graph_error(&err);
                return Err(err);
            }
            let node = match self.nodes.get(&current_id) {
                Some(node) => Arc::clone(node),
                None => {
                    let err = AgentError::ExecutionFailed(format!("node not found: {current_id}"));
                    log_graph_error(&err);
                    return Err(err);
                }
            };

            log_node_start(&current_id, steps);
            if let Some(tx) = events {
                let _ = tx
                    .send(GraphEvent::TaskStart {
                        node_id: current_id.clone(),
                    })
                    .await;
            }

            let (new_state, next) = match node.run(state.clone()).await {
                Ok(output) => output,
                Err(e) => {
                    log_graph_error(&e);
                    return Err(e);
                }
            };
            steps += 1;
            *state = new_state;
            log_node_complete(&current_id, &next);

            if let Some(tx) = events {
                let _ = tx
                    .send(GraphEvent::Updates {
                        node_id: current_id.clone(),
                        state: state.clone(),
                    })
                    .await;
            }

            match self.successor(&current_id, state, next) {
                Some(id) if id != END => current_id = id,
                _ => {
                    log_graph_complete(steps);
                    return Ok(steps);
                }
            }
        }
    }

    /// Runs the graph, updating `state` in place after every node.
    ///
    /// On error `state` keeps everything committed before the failing step, so callers
    /// can still inspect partial work. Returns the number of executed steps.
    pub async fn invoke_in_place(&self, state: &mut S, config: &RunConfig) -> Result<usize, AgentError> {
        if !self.nodes.contains_key(&self.first_node_id) {
            return Err(AgentError::ExecutionFailed("empty graph".into()));
        }
        self.run_loop(state, config, None).await
    }

    /// Runs the graph and returns the final state.
    pub async fn invoke(&self, state: S, config: &RunConfig) -> Result<S, AgentError> {
        let mut state = state;
        self.invoke_in_place(&mut state, config).await?;
        Ok(state)
    }

    /// Runs the graph on a background task, emitting a [`GraphEvent`] per node start and
    /// update; the stream ends with [`GraphEvent::Finished`].
    pub fn stream(&self, state: S, config: RunConfig) -> ReceiverStream<GraphEvent<S>> {
        let (tx, rx) = mpsc::channel(128);
        let graph = self.clone();

        tokio::spawn(async move {
            let mut state = state;
            let outcome = graph.run_loop(&mut state, &config, Some(&tx)).await;
            let _ = tx
                .send(GraphEvent::Finished {
                    state,
                    outcome: outcome.map(|_| ()),
                })
                .await;
        });

        ReceiverStream::new(rx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use async_trait::async_trait;
    use tokio_stream::StreamExt;

    use crate::graph::{StateGraph, START};

    type Trace = Vec<String>;

    /// Appends its id to the trace and returns a fixed `Next`.
    struct StepNode {
        id: &'static str,
        next: Next,
    }

    #[async_trait]
    impl Node<Trace> for StepNode {
        fn id(&self) -> &str {
            self.id
        }
        async fn run(&self, mut state: Trace) -> Result<(Trace, Next), AgentError> {
            state.push(self.id.to_string());
            Ok((state, self.next.clone()))
        }
    }

    struct FailNode;

    #[async_trait]
    impl Node<Trace> for FailNode {
        fn id(&self) -> &str {
            "fail"
        }
        async fn run(&self, _state: Trace) -> Result<(Trace, Next), AgentError> {
            Err(AgentError::ExecutionFailed("boom".into()))
        }
    }

    fn step(id: &'static str) -> Arc<dyn Node<Trace>> {
        Arc::new(StepNode {
            id,
            next: Next::Continue,
        })
    }

    /// **Scenario**: a linear chain runs every node once, in edge order.
    #[tokio::test]
    async fn invoke_runs_linear_chain_in_order() {
        let mut g = StateGraph::<Trace>::new();
        g.add_node("a", step("a")).add_node("b", step("b"));
        g.add_edge(START, "a").add_edge("a", "b").add_edge("b", END);
        let out = g
            .compile()
            .unwrap()
            .invoke(vec![], &RunConfig::default())
            .await
            .unwrap();
        assert_eq!(out, vec!["a", "b"]);
    }

    /// **Scenario**: Next::End stops before the fixed successor; Next::Node jumps.
    #[tokio::test]
    async fn node_next_end_and_jump_are_respected() {
        let mut g = StateGraph::<Trace>::new();
        g.add_node(
            "a",
            Arc::new(StepNode {
                id: "a",
                next: Next::Node("c".into()),
            }),
        )
        .add_node("b", step("b"))
        .add_node(
            "c",
            Arc::new(StepNode {
                id: "c",
                next: Next::End,
            }),
        );
        g.add_edge(START, "a")
            .add_edge("a", "b")
            .add_edge("b", "c")
            .add_edge("c", END);
        let out = g
            .compile()
            .unwrap()
            .invoke(vec![], &RunConfig::default())
            .await
            .unwrap();
        assert_eq!(out, vec!["a", "c"]);
    }

    /// **Scenario**: the router picks the successor from the state after the source node ran.
    #[tokio::test]
    async fn conditional_edges_route_from_state() {
        let mut g = StateGraph::<Trace>::new();
        g.add_node("planner", step("planner"))
            .add_node("worker", step("worker"));
        g.add_edge(START, "planner").add_edge("worker", "planner");
        g.add_conditional_edges(
            "planner",
            Arc::new(|s: &Trace| {
                if s.iter().any(|x| x == "worker") {
                    END.to_string()
                } else {
                    "worker".to_string()
                }
            }),
            None,
        );
        let out = g
            .compile()
            .unwrap()
            .invoke(vec![], &RunConfig::default())
            .await
            .unwrap();
        assert_eq!(out, vec!["planner", "worker", "planner"]);
    }

    /// **Scenario**: a router that never ends stops with RecursionLimit after exactly `limit` steps.
    #[tokio::test]
    async fn recursion_limit_stops_endless_loop() {
        let mut g = StateGraph::<Trace>::new();
        g.add_node("planner", step("planner"))
            .add_node("worker", step("worker"));
        g.add_edge(START, "planner").add_edge("worker", "planner");
        g.add_conditional_edges("planner", Arc::new(|_: &Trace| "worker".to_string()), None);
        let compiled = g.compile().unwrap();

        let mut state = vec![];
        let err = compiled
            .invoke_in_place(&mut state, &RunConfig::with_recursion_limit(7))
            .await
            .unwrap_err();
        assert!(matches!(err, AgentError::RecursionLimit(7)));
        assert_eq!(state.len(), 7, "committed steps survive the error");
    }

    /// **Scenario**: a node error aborts the run and keeps earlier state.
    #[tokio::test]
    async fn node_error_propagates() {
        let mut g = StateGraph::<Trace>::new();
        g.add_node("a", step("a")).add_node("fail", Arc::new(FailNode));
        g.add_edge(START, "a").add_edge("a", "fail").add_edge("fail", END);
        let mut state = vec![];
        let err = g
            .compile()
            .unwrap()
            .invoke_in_place(&mut state, &RunConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AgentError::ExecutionFailed(m) if m == "boom"));
        assert_eq!(state, vec!["a"]);
    }

    /// **Scenario**: stream emits TaskStart/Updates per node and Finished last.
    #[tokio::test]
    async fn stream_emits_updates_then_finished() {
        let mut g = StateGraph::<Trace>::new();
        g.add_node("a", step("a")).add_node("b", step("b"));
        g.add_edge(START, "a").add_edge("a", "b").add_edge("b", END);
        let events: Vec<_> = g
            .compile()
            .unwrap()
            .stream(vec![], RunConfig::default())
            .collect()
            .await;

        let updated: Vec<_> = events
            .iter()
            .filter_map(|e| match e {
                GraphEvent::Updates { node_id, .. } => Some(node_id.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(updated, vec!["a", "b"]);
        match events.last() {
            Some(GraphEvent::Finished { state, outcome }) => {
                assert!(outcome.is_ok());
                assert_eq!(state, &vec!["a".to_string(), "b".to_string()]);
            }
            other => panic!("expected Finished last, got {:?}", other),
        }
    }
}
