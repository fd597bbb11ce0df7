//! Graph Nodes
//!
//! This module defines the derived nodes that live in the dependency graph
//! and the edges between them.

use std::fmt;
use std::sync::Arc;

use smallvec::SmallVec;

use crate::error::Result;
use crate::reactive::{CellId, EvalContext, Revision};

/// The computation behind a node.
///
/// Bodies read cells and other nodes through the [`EvalContext`] they are
/// handed; those reads become the node's dependency set.
pub type NodeBody<V> = Arc<dyn Fn(&mut EvalContext<'_, V>) -> Result<V> + Send + Sync>;

/// Wrap a closure as a [`NodeBody`].
///
/// Passing the closure through this function lets the compiler infer the
/// context parameter's type.
pub fn body<V, F>(f: F) -> NodeBody<V>
where
    F: Fn(&mut EvalContext<'_, V>) -> Result<V> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Stable index of a node inside its registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

impl NodeId {
    /// Get the raw index.
    pub fn index(self) -> usize {
        self.0
    }
}

impl From<usize> for NodeId {
    fn from(index: usize) -> Self {
        Self(index)
    }
}

/// One edge of the dependency graph: something a node read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dependency {
    /// An input cell.
    Cell(CellId),
    /// Another derived node.
    Node(NodeId),
}

/// The dependency set of a node, in first-read order.
pub type Dependencies = SmallVec<[Dependency; 4]>;

/// A derived computation with its cache.
pub struct Node<V> {
    /// Name of the node, unique across cells and nodes.
    name: String,

    /// The computation.
    body: NodeBody<V>,

    /// Result of the last successful execution. `None` until the first one.
    cached: Option<V>,

    /// Revision at which `cached` was last known to be correct.
    validated_at: Revision,

    /// Revision at which the body last produced `cached`.
    ///
    /// Dependents compare this against their own `validated_at`.
    changed_at: Revision,

    /// What the last execution read. Replaced wholesale on every execution.
    dependencies: Dependencies,

    /// Number of successful body executions.
    executions: u64,
}

impl<V> Node<V> {
    /// Create a node that has never been evaluated.
    pub fn new(name: impl Into<String>, body: NodeBody<V>) -> Self {
        Self {
            name: name.into(),
            body,
            cached: None,
            validated_at: Revision::ZERO,
            changed_at: Revision::ZERO,
            dependencies: Dependencies::new(),
            executions: 0,
        }
    }

    /// Get the node's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get a handle to the node's body.
    pub fn body(&self) -> NodeBody<V> {
        Arc::clone(&self.body)
    }

    /// The cached value, if the node was ever evaluated successfully.
    pub fn cached(&self) -> Option<&V> {
        self.cached.as_ref()
    }

    /// Check if the node has a cached value.
    pub fn has_value(&self) -> bool {
        self.cached.is_some()
    }

    /// Revision at which the cached value was last validated.
    pub fn validated_at(&self) -> Revision {
        self.validated_at
    }

    /// Revision at which the cached value was last produced.
    pub fn changed_at(&self) -> Revision {
        self.changed_at
    }

    /// The dependency set recorded by the last execution.
    pub fn dependencies(&self) -> &[Dependency] {
        &self.dependencies
    }

    /// Check whether the last execution read `dependency`.
    pub fn depends_on(&self, dependency: Dependency) -> bool {
        self.dependencies.contains(&dependency)
    }

    /// Number of times the body ran to completion.
    pub fn executions(&self) -> u64 {
        self.executions
    }

    /// The cached value, if it was validated at `current`.
    pub fn fresh_value(&self, current: Revision) -> Option<&V> {
        self.cached
            .as_ref()
            .filter(|_| self.validated_at == current)
    }

    /// Record a successful execution.
    pub(crate) fn store(&mut self, value: V, dependencies: Dependencies, current: Revision) {
        self.cached = Some(value);
        self.dependencies = dependencies;
        self.validated_at = current;
        self.changed_at = current;
        self.executions += 1;
    }

    /// Confirm the cached value at `current` without executing.
    pub(crate) fn mark_validated(&mut self, current: Revision) -> Option<&V> {
        if self.cached.is_some() {
            self.validated_at = current;
        }
        self.cached.as_ref()
    }

    /// Drop the cached value so that the next evaluation executes the body.
    ///
    /// The dependency set is kept so that dependents still appear in
    /// dependent queries until they re-execute.
    pub(crate) fn invalidate(&mut self) {
        self.cached = None;
    }
}

impl<V: fmt::Debug> fmt::Debug for Node<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("name", &self.name)
            .field("cached", &self.cached)
            .field("validated_at", &self.validated_at)
            .field("changed_at", &self.changed_at)
            .field("dependencies", &self.dependencies)
            .field("executions", &self.executions)
            .finish()
    }
}
