//! Error types for graph construction and evaluation.

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T, E = GraphError> = std::result::Result<T, E>;

/// Everything that can go wrong while building, writing to or evaluating a
/// [`Graph`](crate::Graph).
///
/// Every error is fatal to the call that produced it. None of them leave a
/// node with a half-updated cache.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    /// A cell or node name was declared twice.
    #[error("name `{0}` is declared more than once")]
    DuplicateName(String),

    /// A cell or node name was empty.
    #[error("cell and node names must not be empty")]
    EmptyName,

    /// A cell was read before it was ever written and it has no default.
    #[error("cell `{0}` has no value and no default")]
    UnknownCell(String),

    /// A node name that was never registered.
    #[error("no node named `{0}`")]
    UnknownNode(String),

    /// A write targeted a name that belongs to a node.
    #[error("`{0}` is a node and cannot be written")]
    NotACell(String),

    /// A node read itself, directly or through other nodes.
    ///
    /// The path starts and ends with the node that was re-entered.
    #[error("cyclic dependency: {}", .cycle.join(" -> "))]
    CyclicDependency { cycle: Vec<String> },

    /// Nested evaluation went deeper than the configured limit.
    #[error("evaluation of `{node}` exceeds the maximum depth of {max_depth}")]
    DepthExceeded { node: String, max_depth: usize },

    /// A node body reported a failure of its own.
    #[error("node `{node}` failed: {reason}")]
    BodyFailed { node: String, reason: String },

    /// Configuration could not be parsed.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl GraphError {
    /// Whether this error came from a dependency cycle.
    pub fn is_cycle(&self) -> bool {
        matches!(self, GraphError::CyclicDependency { .. })
    }
}

impl From<serde_json::Error> for GraphError {
    fn from(err: serde_json::Error) -> Self {
        GraphError::Config(err.to_string())
    }
}
