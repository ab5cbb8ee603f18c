use std::fmt;

/// Failures `Graph::build` can report. Build never returns a partial graph:
/// on either variant the caller gets nothing usable back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildError {
    /// A container declared a dependency ID that is not present among the
    /// containers handed to `build`.
    UnknownDependency { node: String, dependency: String },
    /// The graph induced by `dependsOn` edges contains a cycle (including a
    /// single self-loop).
    CyclicGraph,
}

impl fmt::Display for BuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildError::UnknownDependency { node, dependency } => write!(
                f,
                "container {node} declares a dependency on unknown container {dependency}"
            ),
            BuildError::CyclicGraph => write!(f, "container dependency graph contains a cycle"),
        }
    }
}

impl std::error::Error for BuildError {}
