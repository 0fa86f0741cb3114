//! What a node asks the runner to do after it finishes.

/// Next step after running a node.
///
/// Ignored for nodes that own conditional edges; the router decides there.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Next {
    /// Follow the node's outgoing edge (or end if it has none).
    Continue,
    /// Run the node with the given id next.
    Node(String),
    /// Stop and return the current state.
    End,
}
