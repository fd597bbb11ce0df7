//! Graph Runtime
//!
//! The [`Graph`] is the central coordinator. It owns the cell store, the node
//! registry and the revision counter, and exposes the operations callers use:
//! writing cells, evaluating nodes and resetting call arguments.
//!
//! # How It Works
//!
//! 1. Construction registers cells (with optional defaults) and nodes. Names
//!    are validated once, up front.
//!
//! 2. A cell write advances the revision. No node is touched.
//!
//! 3. Evaluating a node pulls it up to date through the engine, which
//!    re-executes only what changed since the node was last validated.
//!
//! # Thread Safety
//!
//! A graph has a single owner. Embedders that need to share one across threads
//! wrap it in a [`SharedGraph`](super::SharedGraph).

use indexmap::IndexMap;
use smallvec::SmallVec;
use tracing::debug;

use super::cell::CellStore;
use super::engine;
use super::revision::Revision;
use super::stats::EvalStats;
use crate::config::GraphConfig;
use crate::error::{GraphError, Result};
use crate::graph::{Dependency, GraphBuilder, NodeBody, NodeId, NodeRegistry};

/// A graph of input cells and lazily evaluated, cached nodes.
pub struct Graph<V> {
    pub(crate) cells: CellStore<V>,
    pub(crate) nodes: NodeRegistry<V>,

    /// Nodes currently being evaluated, outermost first.
    pub(crate) in_progress: SmallVec<[NodeId; 16]>,

    pub(crate) stats: EvalStats,
    pub(crate) config: GraphConfig,
}

impl<V: Clone> Graph<V> {
    /// Start building a graph.
    pub fn builder() -> GraphBuilder<V> {
        GraphBuilder::new()
    }

    /// Construct a graph from cell defaults and node bodies.
    ///
    /// The last node body becomes the [result node](Graph::result_node).
    pub fn construct<C, N, K, L>(cell_defaults: C, node_bodies: N) -> Result<Self>
    where
        C: IntoIterator<Item = (K, V)>,
        N: IntoIterator<Item = (L, NodeBody<V>)>,
        K: Into<String>,
        L: Into<String>,
    {
        let builder = cell_defaults
            .into_iter()
            .fold(GraphBuilder::new(), |builder, (name, default)| {
                builder.cell(name, default)
            });
        node_bodies
            .into_iter()
            .fold(builder, |builder, (name, body)| builder.node_body(name, body))
            .build()
    }

    /// Evaluate a node, re-executing whatever is out of date.
    pub fn evaluate(&mut self, name: &str) -> Result<V> {
        let id = self.nodes.require(name)?;
        self.in_progress.clear();
        engine::evaluate(self, id)
    }

    /// Evaluate the result node.
    pub fn evaluate_result(&mut self) -> Result<V> {
        let id = self
            .nodes
            .last()
            .ok_or_else(|| GraphError::UnknownNode("<result>".to_string()))?;
        self.in_progress.clear();
        engine::evaluate(self, id)
    }

    /// Reset the argument cells and evaluate the result node.
    ///
    /// This is what one call of the function the graph represents does.
    pub fn call<I, K>(&mut self, assignments: I) -> Result<V>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: PartialEq,
    {
        self.reset_argument_cells(assignments)?;
        self.evaluate_result()
    }

    /// Write the given cells and restore every omitted cell to its default.
    ///
    /// A cell is only written when its value actually differs, so repeating a
    /// call with the same arguments keeps every cache valid. Cells without a
    /// default keep their value when omitted.
    ///
    /// Names are checked before anything is written. Returns the number of
    /// writes performed.
    pub fn reset_argument_cells<I, K>(&mut self, assignments: I) -> Result<usize>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: PartialEq,
    {
        let assignments: IndexMap<String, V> = assignments
            .into_iter()
            .map(|(name, value)| (name.into(), value))
            .collect();
        for name in assignments.keys() {
            self.check_writable(name)?;
        }

        let fallbacks: Vec<(String, V)> = self
            .cells
            .defaults()
            .filter(|(name, _)| !assignments.contains_key(*name))
            .map(|(name, default)| (name.to_string(), default.clone()))
            .collect();

        let mut writes = 0;
        for (name, value) in assignments.into_iter().chain(fallbacks) {
            if self.cells.write_if_changed(&name, value) {
                writes += 1;
            }
        }

        debug!(writes, revision = %self.revision(), "argument cells reset");
        Ok(writes)
    }
}

impl<V> Graph<V> {
    pub(crate) fn from_parts(
        cells: CellStore<V>,
        nodes: NodeRegistry<V>,
        config: GraphConfig,
    ) -> Self {
        Self {
            cells,
            nodes,
            in_progress: SmallVec::new(),
            stats: EvalStats::default(),
            config,
        }
    }

    /// Write a cell, creating it if it does not exist.
    ///
    /// Every write counts as a change, even if the value is the same as
    /// before. Returns the new revision.
    pub fn write_cell(&mut self, name: &str, value: V) -> Result<Revision> {
        self.check_writable(name)?;
        self.cells.write(name, value);
        Ok(self.revision())
    }

    /// Write a cell unless it already holds an equal value.
    ///
    /// Returns whether a write happened.
    pub fn write_cell_if_changed(&mut self, name: &str, value: V) -> Result<bool>
    where
        V: PartialEq,
    {
        self.check_writable(name)?;
        Ok(self.cells.write_if_changed(name, value))
    }

    /// Read a cell's current value.
    pub fn read_cell(&self, name: &str) -> Result<&V> {
        self.cells.read(name).map(|(value, _)| value)
    }

    /// The current revision.
    pub fn revision(&self) -> Revision {
        self.cells.revision()
    }

    /// Name of the result node: the last one registered.
    pub fn result_node(&self) -> Option<&str> {
        self.nodes.last().map(|id| self.nodes.name(id))
    }

    /// Names of the nodes whose last execution read `name`.
    ///
    /// Names that are neither a cell nor a node have no dependents.
    pub fn get_dependents(&self, name: &str) -> Vec<&str> {
        self.dependency_of(name)
            .map(|dependency| self.node_names_of(self.nodes.dependents_of(dependency)))
            .unwrap_or_default()
    }

    /// Names of every node that transitively depends on `name`.
    pub fn affected_by(&self, name: &str) -> Vec<&str> {
        self.dependency_of(name)
            .map(|dependency| self.node_names_of(self.nodes.affected_by(dependency)))
            .unwrap_or_default()
    }

    /// Names read by the last execution of a node, in first-read order.
    pub fn dependencies(&self, name: &str) -> Result<Vec<&str>> {
        let id = self.nodes.require(name)?;
        Ok(self
            .nodes
            .get(id)
            .dependencies()
            .iter()
            .map(|&dependency| self.dependency_name(dependency))
            .collect())
    }

    /// A node's cached value, without evaluating it.
    pub fn cached_value(&self, name: &str) -> Result<Option<&V>> {
        let id = self.nodes.require(name)?;
        Ok(self.nodes.get(id).cached())
    }

    /// How many times a node's body ran to completion.
    pub fn execution_count(&self, name: &str) -> Result<u64> {
        let id = self.nodes.require(name)?;
        Ok(self.nodes.get(id).executions())
    }

    /// Discard the cached value of a node and of everything that reads it.
    ///
    /// The next evaluation of any of them runs the body again. Returns the
    /// number of nodes invalidated.
    pub fn invalidate(&mut self, name: &str) -> Result<usize> {
        let id = self.nodes.require(name)?;
        let mut targets = self.nodes.affected_by(Dependency::Node(id));
        targets.push(id);

        for &target in &targets {
            self.nodes.get_mut(target).invalidate();
        }
        debug!(node = name, count = targets.len(), "nodes invalidated");
        Ok(targets.len())
    }

    /// Node names in registration order.
    pub fn node_names(&self) -> impl Iterator<Item = &str> {
        self.nodes.iter().map(|(_, node)| node.name())
    }

    /// Cell names in declaration order.
    pub fn cell_names(&self) -> impl Iterator<Item = &str> {
        self.cells.names()
    }

    /// Evaluation counters.
    pub fn stats(&self) -> &EvalStats {
        &self.stats
    }

    /// Reset the evaluation counters.
    pub fn reset_stats(&mut self) {
        self.stats.reset();
    }

    /// The graph's configuration.
    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    pub(crate) fn record(&mut self, update: impl FnOnce(&mut EvalStats)) {
        if self.config.record_stats {
            update(&mut self.stats);
        }
    }

    pub(crate) fn dependency_of(&self, name: &str) -> Option<Dependency> {
        self.nodes
            .id_of(name)
            .map(Dependency::Node)
            .or_else(|| self.cells.id_of(name).map(Dependency::Cell))
    }

    pub(crate) fn dependency_name(&self, dependency: Dependency) -> &str {
        match dependency {
            Dependency::Cell(id) => self.cells.name(id),
            Dependency::Node(id) => self.nodes.name(id),
        }
    }

    fn node_names_of(&self, ids: Vec<NodeId>) -> Vec<&str> {
        ids.into_iter().map(|id| self.nodes.name(id)).collect()
    }

    fn check_writable(&self, name: &str) -> Result<()> {
        if name.is_empty() {
            return Err(GraphError::EmptyName);
        }
        if self.nodes.contains(name) {
            return Err(GraphError::NotACell(name.to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::body;

    fn sum_graph() -> Graph<i32> {
        Graph::<i32>::builder()
            .cell("x", 42)
            .argument("y")
            .node("a", |ctx| Ok(ctx.cell("x")? + 1))
            .node("b", |ctx| Ok(ctx.cell("y")? + 1))
            .node("ans", |ctx| Ok(ctx.node("a")? + ctx.node("b")?))
            .build()
            .unwrap()
    }

    #[test]
    fn construct_keeps_node_order() {
        let double: NodeBody<i32> = body(|ctx| Ok(ctx.cell("x")? * 2));
        let answer: NodeBody<i32> = body(|ctx| Ok(ctx.node("double")? + 1));
        let graph = Graph::construct([("x", 1)], [("double", double), ("answer", answer)]).unwrap();

        assert_eq!(graph.result_node(), Some("answer"));
        assert_eq!(graph.node_names().collect::<Vec<_>>(), vec!["double", "answer"]);
        assert_eq!(graph.cell_names().collect::<Vec<_>>(), vec!["x"]);
    }

    #[test]
    fn write_cell_rejects_node_names() {
        let mut graph = sum_graph();
        assert_eq!(
            graph.write_cell("a", 1).unwrap_err(),
            GraphError::NotACell("a".into())
        );
        assert_eq!(graph.write_cell("", 1).unwrap_err(), GraphError::EmptyName);
        assert_eq!(graph.revision(), Revision::ZERO);
    }

    #[test]
    fn write_cell_creates_new_cells() {
        let mut graph = sum_graph();
        assert_eq!(graph.write_cell("z", 3).unwrap(), Revision::from(1));
        assert_eq!(graph.read_cell("z").unwrap(), &3);
    }

    #[test]
    fn reset_restores_defaults_and_skips_equal_values() {
        let mut graph = sum_graph();

        assert_eq!(graph.reset_argument_cells([("x", 6), ("y", 9)]).unwrap(), 2);
        assert_eq!(graph.reset_argument_cells([("x", 6), ("y", 9)]).unwrap(), 0);

        assert_eq!(graph.reset_argument_cells([("y", 9)]).unwrap(), 1);
        assert_eq!(graph.read_cell("x").unwrap(), &42);
        assert_eq!(graph.read_cell("y").unwrap(), &9);
    }

    #[test]
    fn omitted_argument_without_default_keeps_its_value() {
        let mut graph = sum_graph();
        assert_eq!(graph.call([("x", 6), ("y", 9)]).unwrap(), 17);

        // `y` has no default to fall back to, so the previous call's 9 stays.
        assert_eq!(graph.call([("x", 1)]).unwrap(), 12);
        assert_eq!(graph.read_cell("y").unwrap(), &9);
        assert_eq!(graph.execution_count("b").unwrap(), 1);
    }

    #[test]
    fn reset_checks_names_before_writing() {
        let mut graph = sum_graph();
        let err = graph
            .reset_argument_cells([("y", 1), ("ans", 2)])
            .unwrap_err();

        assert_eq!(err, GraphError::NotACell("ans".into()));
        assert_eq!(graph.revision(), Revision::ZERO);
        assert!(graph.read_cell("y").is_err());
    }

    #[test]
    fn missing_argument_surfaces_as_unknown_cell() {
        let mut graph = sum_graph();
        assert_eq!(
            graph.evaluate("ans").unwrap_err(),
            GraphError::UnknownCell("y".into())
        );

        graph.write_cell("y", 0).unwrap();
        assert_eq!(graph.evaluate("ans").unwrap(), 44);
    }

    #[test]
    fn dependents_and_closure() {
        let mut graph = sum_graph();
        graph.call([("y", 1)]).unwrap();

        assert_eq!(graph.get_dependents("x"), vec!["a"]);
        assert_eq!(graph.get_dependents("a"), vec!["ans"]);
        assert!(graph.get_dependents("ans").is_empty());
        assert!(graph.get_dependents("nobody").is_empty());
        assert_eq!(graph.affected_by("y"), vec!["b", "ans"]);
        assert_eq!(graph.dependencies("ans").unwrap(), vec!["a", "b"]);
    }

    #[test]
    fn invalidate_forces_execution_downstream() {
        let mut graph = sum_graph();
        graph.call([("y", 1)]).unwrap();
        assert_eq!(graph.invalidate("a").unwrap(), 2);
        assert!(graph.cached_value("ans").unwrap().is_none());
        assert_eq!(graph.cached_value("b").unwrap(), Some(&2));

        assert_eq!(graph.evaluate("ans").unwrap(), 45);
        assert_eq!(graph.execution_count("a").unwrap(), 2);
        assert_eq!(graph.execution_count("b").unwrap(), 1);
        assert_eq!(graph.execution_count("ans").unwrap(), 2);
    }

    #[test]
    fn evaluate_result_needs_a_node() {
        let mut graph = Graph::<i32>::builder().cell("x", 1).build().unwrap();
        assert!(graph.result_node().is_none());
        assert!(matches!(
            graph.evaluate_result(),
            Err(GraphError::UnknownNode(_))
        ));
    }

    #[test]
    fn stats_can_be_disabled() {
        let mut graph = Graph::<i32>::builder()
            .config(GraphConfig::default().with_stats(false))
            .cell("x", 1)
            .node("a", |ctx| ctx.cell("x"))
            .build()
            .unwrap();

        graph.evaluate("a").unwrap();
        graph.evaluate("a").unwrap();
        assert_eq!(graph.stats(), &EvalStats::default());
    }

    #[test]
    fn reset_stats_clears_counters() {
        let mut graph = sum_graph();
        graph.call([("y", 1)]).unwrap();
        assert_eq!(graph.stats().executions, 3);

        graph.reset_stats();
        assert_eq!(graph.stats(), &EvalStats::default());

        graph.evaluate("ans").unwrap();
        assert_eq!(graph.stats().cache_hits, 1);
        assert_eq!(graph.stats().executions, 0);
    }
}
