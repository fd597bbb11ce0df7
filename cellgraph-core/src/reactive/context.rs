//! Evaluation Context
//!
//! The evaluation context is how a node body sees the rest of the graph.
//! Every cell or node read made through it is recorded. When the body
//! returns, the recorded reads become the node's new dependency set.
//!
//! # Implementation
//!
//! The context is an explicit value handed to the body, not ambient
//! thread-local state. It borrows the graph mutably for the duration of the
//! body, so a node read can evaluate that node on the spot. Nested reads
//! create nested contexts, one per running body, each collecting its own
//! reads.

use smallvec::SmallVec;

use super::engine;
use super::revision::Revision;
use super::runtime::Graph;
use crate::error::{GraphError, Result};
use crate::graph::{Dependencies, Dependency, NodeId};

/// Tracking handle passed to a running node body.
pub struct EvalContext<'g, V> {
    graph: &'g mut Graph<V>,

    /// The node whose body is running.
    node: NodeId,

    /// Distinct reads so far, in first-read order.
    reads: Dependencies,
}

impl<'g, V: Clone> EvalContext<'g, V> {
    pub(crate) fn new(graph: &'g mut Graph<V>, node: NodeId) -> Self {
        Self {
            graph,
            node,
            reads: SmallVec::new(),
        }
    }

    /// Name of the node being evaluated.
    pub fn node_name(&self) -> &str {
        self.graph.nodes.name(self.node)
    }

    /// The revision this evaluation runs at.
    pub fn revision(&self) -> Revision {
        self.graph.cells.revision()
    }

    /// Read a cell.
    ///
    /// The read is recorded even when it fails, so that a later write to the
    /// cell invalidates this node.
    pub fn cell(&mut self, name: &str) -> Result<V> {
        if name.is_empty() {
            return Err(GraphError::EmptyName);
        }
        if self.graph.nodes.contains(name) {
            return Err(GraphError::UnknownCell(name.to_string()));
        }

        let id = self.graph.cells.slot(name);
        self.track(Dependency::Cell(id));
        self.graph.cells.read_id(id).cloned()
    }

    /// Read another node, evaluating it first if it is not fresh.
    pub fn node(&mut self, name: &str) -> Result<V> {
        let id = self.graph.nodes.require(name)?;
        self.track(Dependency::Node(id));
        engine::evaluate(self.graph, id)
    }

    /// Read a name that may be either a node or a cell.
    pub fn read(&mut self, name: &str) -> Result<V> {
        if self.graph.nodes.contains(name) {
            self.node(name)
        } else {
            self.cell(name)
        }
    }

    /// Build the error a body returns to report its own failure.
    pub fn fail(&self, reason: impl Into<String>) -> GraphError {
        GraphError::BodyFailed {
            node: self.node_name().to_string(),
            reason: reason.into(),
        }
    }

    /// Names read so far.
    pub fn reads(&self) -> Vec<&str> {
        self.reads
            .iter()
            .map(|&dependency| self.graph.dependency_name(dependency))
            .collect()
    }

    fn track(&mut self, dependency: Dependency) {
        if !self.reads.contains(&dependency) {
            self.reads.push(dependency);
        }
    }

    /// End the evaluation and hand back what was read.
    pub(crate) fn finish(self) -> Dependencies {
        self.reads
    }
}
