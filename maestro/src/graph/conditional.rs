//! Conditional edges: pick the next node from state after the source node runs.
//!
//! The router returns a key; the key is looked up in the optional path map, falling
//! back to the key itself as a node id (or `END`).

use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::Arc;

/// Router function: state → routing key.
pub type ConditionalRouterFn<S> = Arc<dyn Fn(&S) -> String + Send + Sync>;

/// Routing function plus optional key → node id map.
#[derive(Clone)]
pub struct ConditionalRouter<S> {
    pub(super) path: ConditionalRouterFn<S>,
    pub(super) path_map: Option<HashMap<String, String>>,
}

impl<S> ConditionalRouter<S>
where
    S: Clone + Send + Sync + Debug + 'static,
{
    pub fn new(path: ConditionalRouterFn<S>, path_map: Option<HashMap<String, String>>) -> Self {
        Self { path, path_map }
    }

    /// Next node id (or `END`) for the current state.
    pub fn resolve_next(&self, state: &S) -> String {
        let key = (self.path)(state);
        self.path_map
            .as_ref()
            .and_then(|m| m.get(&key))
            .cloned()
            .unwrap_or(key)
    }
}

/// How the compiled graph finds the successor of a node.
#[derive(Clone)]
pub enum NextEntry<S> {
    /// Fixed successor (or `END`); the node's own `Next` is still respected.
    Unconditional(String),
    /// Successor decided by the router; the node's `Next` is ignored.
    Conditional(ConditionalRouter<S>),
}

#[cfg(test)]
mod tests {
    use super::*;

    /// **Scenario**: a key found in the path map resolves to the mapped id; unknown keys pass through.
    #[test]
    fn resolve_next_uses_map_then_key() {
        let router: ConditionalRouter<u8> = ConditionalRouter::new(
            Arc::new(|s: &u8| if *s == 0 { "zero".into() } else { "other_node".into() }),
            Some([("zero".to_string(), "zero_node".to_string())].into_iter().collect()),
        );
        assert_eq!(router.resolve_next(&0), "zero_node");
        assert_eq!(router.resolve_next(&1), "other_node");
    }
}
