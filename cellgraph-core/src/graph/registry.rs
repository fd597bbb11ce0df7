//! Node Registry
//!
//! The registry owns every derived node of a graph, in registration order.
//! Nodes are registered once, at construction, and never removed.
//!
//! Edges are not stored separately: each node keeps the dependency set of its
//! last execution, and reverse lookups scan those sets. This keeps a single
//! source of truth, so a dependency dropped by a re-execution disappears from
//! reverse lookups at the same moment.
//!
//! # Propagation
//!
//! [`NodeRegistry::affected_by`] walks reverse edges breadth first:
//!
//! 1. Start with the direct dependents of the changed cell or node
//! 2. Visit each dependent once, queueing its own dependents
//! 3. Return the visited nodes in the order they were reached

use std::collections::{HashSet, VecDeque};

use indexmap::IndexMap;

use super::node::{Dependency, Node, NodeBody, NodeId};
use crate::error::{GraphError, Result};

/// All derived nodes of one graph.
pub struct NodeRegistry<V> {
    nodes: IndexMap<String, Node<V>>,
}

impl<V> NodeRegistry<V> {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            nodes: IndexMap::new(),
        }
    }

    /// Register a node.
    ///
    /// Fails if the name is empty or already registered. Checking against cell
    /// names is the caller's job.
    pub fn register(&mut self, name: impl Into<String>, body: NodeBody<V>) -> Result<NodeId> {
        let name = name.into();
        if name.is_empty() {
            return Err(GraphError::EmptyName);
        }
        if self.nodes.contains_key(&name) {
            return Err(GraphError::DuplicateName(name));
        }

        let node = Node::new(name.clone(), body);
        let (index, _) = self.nodes.insert_full(name, node);
        Ok(NodeId::from(index))
    }

    /// Look up a node by name.
    pub fn id_of(&self, name: &str) -> Option<NodeId> {
        self.nodes.get_index_of(name).map(NodeId::from)
    }

    /// Look up a node by name, failing with [`GraphError::UnknownNode`].
    pub fn require(&self, name: &str) -> Result<NodeId> {
        self.id_of(name)
            .ok_or_else(|| GraphError::UnknownNode(name.to_string()))
    }

    /// Get a node by id.
    pub fn get(&self, id: NodeId) -> &Node<V> {
        &self.nodes[id.index()]
    }

    /// Get a mutable node by id.
    pub fn get_mut(&mut self, id: NodeId) -> &mut Node<V> {
        &mut self.nodes[id.index()]
    }

    /// Name of a node.
    pub fn name(&self, id: NodeId) -> &str {
        self.get(id).name()
    }

    /// The most recently registered node.
    pub fn last(&self) -> Option<NodeId> {
        self.nodes.len().checked_sub(1).map(NodeId::from)
    }

    /// Check whether a node with this name exists.
    pub fn contains(&self, name: &str) -> bool {
        self.nodes.contains_key(name)
    }

    /// Iterate over nodes in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Node<V>)> {
        self.nodes
            .values()
            .enumerate()
            .map(|(index, node)| (NodeId::from(index), node))
    }

    /// Nodes whose last execution read `dependency`.
    pub fn dependents_of(&self, dependency: Dependency) -> Vec<NodeId> {
        self.iter()
            .filter(|(_, node)| node.depends_on(dependency))
            .map(|(id, _)| id)
            .collect()
    }

    /// Every node that transitively depends on `dependency`.
    pub fn affected_by(&self, dependency: Dependency) -> Vec<NodeId> {
        let mut affected = Vec::new();
        let mut visited = HashSet::new();
        let mut queue: VecDeque<NodeId> = self.dependents_of(dependency).into();

        while let Some(id) = queue.pop_front() {
            if !visited.insert(id) {
                continue;
            }
            affected.push(id);
            queue.extend(self.dependents_of(Dependency::Node(id)));
        }

        affected
    }

    /// Total number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check whether the registry has no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl<V> Default for NodeRegistry<V> {
    fn default() -> Self {
        Self::new()
    }
}
