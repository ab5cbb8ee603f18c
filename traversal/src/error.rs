use std::fmt;

use container::ContainerError;

/// The error recorded against a single node in the shared error map.
#[derive(Debug, Clone)]
pub enum NodeError {
    /// A dependency (start) or dependent (stop/remove) of this node failed;
    /// this node's own action was never attempted.
    DependencyFailed,
    /// Start-time only: at least one dependency was not in a running-
    /// equivalent state when checked. Per the traversal's literal step
    /// order, the container action is skipped for this node, but descent
    /// into its dependents still happens (see `DESIGN.md`).
    DependencyNotRunning(Vec<String>),
    /// The action callback itself returned an error.
    Action(ContainerError),
}

impl fmt::Display for NodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeError::DependencyFailed => {
                write!(f, "a dependency of this container failed")
            }
            NodeError::DependencyNotRunning(ids) => {
                write!(f, "dependencies not running: {}", ids.join(", "))
            }
            NodeError::Action(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for NodeError {}

/// Failures at the level of a whole traversal operation, as opposed to a
/// single node.
#[derive(Debug, Clone)]
pub enum TraversalError {
    /// Inward traversal (stop/remove) found no entry nodes. Only reachable
    /// if the caller hands the engine a corrupted graph, since `Build`
    /// rejects any input whose every node is part of a cycle.
    NoEntryNodes,
    /// `StartAll`'s aggregate: at least one container in the errors map
    /// failed to start, directly or by viral propagation. The per-node
    /// detail lives in `StartOutcome::errors`; this is the single sentinel
    /// a caller can surface without inspecting the map itself.
    SomeContainersFailedToStart,
}

impl fmt::Display for TraversalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TraversalError::NoEntryNodes => {
                write!(f, "no entry nodes available for inward traversal")
            }
            TraversalError::SomeContainersFailedToStart => {
                write!(f, "one or more containers failed to start")
            }
        }
    }
}

impl std::error::Error for TraversalError {}
