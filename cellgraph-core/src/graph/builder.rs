//! Graph construction.
//!
//! All name validation happens here, once, before the graph exists: names
//! must be non-empty and unique across cells and nodes combined. A graph that
//! was built successfully never fails with [`GraphError::DuplicateName`].

use indexmap::IndexMap;

use super::node::{body, NodeBody};
use super::registry::NodeRegistry;
use crate::config::GraphConfig;
use crate::error::{GraphError, Result};
use crate::reactive::{CellStore, EvalContext, Graph};

/// Fluent construction of a [`Graph`].
///
/// Errors are remembered and reported by [`build`](GraphBuilder::build), so
/// declarations can be chained without intermediate `?`.
///
/// ```
/// use cellgraph_core::Graph;
///
/// let mut graph = Graph::<i64>::builder()
///     .cell("x", 42)
///     .argument("y")
///     .node("a", |ctx| Ok(ctx.cell("x")? + 1))
///     .node("b", |ctx| Ok(ctx.cell("y")? + 1))
///     .node("ans", |ctx| Ok(ctx.node("a")? + ctx.node("b")?))
///     .build()?;
///
/// assert_eq!(graph.call([("x", 6), ("y", 9)])?, 17);
/// # Ok::<(), cellgraph_core::GraphError>(())
/// ```
pub struct GraphBuilder<V> {
    /// Cells in declaration order, with their optional defaults.
    cells: IndexMap<String, Option<V>>,
    nodes: Vec<(String, NodeBody<V>)>,
    config: GraphConfig,
    error: Option<GraphError>,
}

impl<V: Clone> GraphBuilder<V> {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self {
            cells: IndexMap::new(),
            nodes: Vec::new(),
            config: GraphConfig::default(),
            error: None,
        }
    }

    /// Declare a cell with a default value.
    pub fn cell(self, name: impl Into<String>, default: V) -> Self {
        self.declare(name.into(), Some(default))
    }

    /// Declare a cell without a default.
    ///
    /// Reading it fails with [`GraphError::UnknownCell`] until it is written.
    pub fn argument(self, name: impl Into<String>) -> Self {
        self.declare(name.into(), None)
    }

    /// Register a node. The last node registered is the result node.
    pub fn node<F>(self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&mut EvalContext<'_, V>) -> Result<V> + Send + Sync + 'static,
    {
        self.node_body(name, body(f))
    }

    /// Register a node from an already boxed body.
    pub fn node_body(mut self, name: impl Into<String>, body: NodeBody<V>) -> Self {
        self.nodes.push((name.into(), body));
        self
    }

    /// Use a specific configuration.
    pub fn config(mut self, config: GraphConfig) -> Self {
        self.config = config;
        self
    }

    /// Validate every name and build the graph.
    pub fn build(self) -> Result<Graph<V>> {
        if let Some(err) = self.error {
            return Err(err);
        }

        let mut cells = CellStore::new();
        for (name, default) in self.cells {
            cells.declare(name, default);
        }

        let mut nodes = NodeRegistry::new();
        for (name, body) in self.nodes {
            if cells.contains(&name) {
                return Err(GraphError::DuplicateName(name));
            }
            nodes.register(name, body)?;
        }

        Ok(Graph::from_parts(cells, nodes, self.config))
    }

    fn declare(mut self, name: String, default: Option<V>) -> Self {
        if self.error.is_none() {
            if name.is_empty() {
                self.error = Some(GraphError::EmptyName);
            } else if self.cells.contains_key(&name) {
                self.error = Some(GraphError::DuplicateName(name));
            } else {
                self.cells.insert(name, default);
            }
        }
        self
    }
}

impl<V: Clone> Default for GraphBuilder<V> {
    fn default() -> Self {
        Self::new()
    }
}
