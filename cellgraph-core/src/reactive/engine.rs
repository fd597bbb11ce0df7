//! Evaluation Engine
//!
//! Pull-based evaluation of derived nodes.
//!
//! # Algorithm
//!
//! Evaluating a node goes through three checks, cheapest first:
//!
//! 1. **Cache hit.** The node was validated at the current revision: return
//!    the cached value.
//!
//! 2. **Revalidation.** The node has a cached value from an older revision.
//!    Walk the dependency set recorded by its last execution, in read order.
//!    Cells are compared by write revision; nodes are brought up to date
//!    first and compared by the revision at which their value last changed.
//!    If nothing is newer than the node's own validation, stamp it with the
//!    current revision and keep the cached value. The walk stops at the first
//!    newer dependency, so branches the body no longer takes are not visited.
//!
//! 3. **Execution.** Run the body inside an [`EvalContext`], replace the
//!    dependency set with what the body read and cache the result.
//!
//! A node only ever re-checks what it actually read last time. Dependencies
//! are dynamic, so the previous execution is the only reliable record of what
//! can affect the cached value.
//!
//! # Cycles
//!
//! The graph keeps a stack of nodes under evaluation. Entering a node already
//! on the stack is a cycle and fails with
//! [`GraphError::CyclicDependency`]. The stack is also bounded by
//! [`GraphConfig::max_depth`](crate::GraphConfig::max_depth).
//!
//! # Failure
//!
//! A node's cache, dependency set and revisions are written only after its
//! body returns successfully. A failed evaluation leaves the node exactly as
//! it was.

use std::iter;

use tracing::{debug, trace};

use super::context::EvalContext;
use super::revision::Revision;
use super::runtime::Graph;
use crate::error::{GraphError, Result};
use crate::graph::{Dependencies, Dependency, NodeId};

/// Bring a node up to date and return its value.
pub(crate) fn evaluate<V: Clone>(graph: &mut Graph<V>, id: NodeId) -> Result<V> {
    ensure_fresh(graph, id)?;
    graph
        .nodes
        .get(id)
        .cached()
        .cloned()
        .ok_or_else(|| GraphError::UnknownNode(graph.nodes.name(id).to_string()))
}

/// Bring a node up to date without cloning its value.
pub(crate) fn ensure_fresh<V: Clone>(graph: &mut Graph<V>, id: NodeId) -> Result<()> {
    let current = graph.cells.revision();

    if graph.nodes.get(id).fresh_value(current).is_some() {
        graph.record(|stats| stats.cache_hits += 1);
        trace!(node = graph.nodes.name(id), "cache hit");
        return Ok(());
    }

    enter(graph, id)?;
    let result = refresh(graph, id, current);
    graph.in_progress.pop();

    if let Err(err) = &result {
        graph.record(|stats| stats.failures += 1);
        debug!(node = graph.nodes.name(id), error = %err, "evaluation failed");
    }
    result
}

/// Push a node onto the in-progress stack.
fn enter<V>(graph: &mut Graph<V>, id: NodeId) -> Result<()> {
    if let Some(start) = graph.in_progress.iter().position(|&n| n == id) {
        let cycle: Vec<String> = graph.in_progress[start..]
            .iter()
            .chain(iter::once(&id))
            .map(|&n| graph.nodes.name(n).to_string())
            .collect();

        graph.record(|stats| stats.cycles_detected += 1);
        debug!(cycle = ?cycle, "cyclic dependency");
        return Err(GraphError::CyclicDependency { cycle });
    }

    let max_depth = graph.config.max_depth;
    if graph.in_progress.len() >= max_depth {
        return Err(GraphError::DepthExceeded {
            node: graph.nodes.name(id).to_string(),
            max_depth,
        });
    }

    graph.in_progress.push(id);
    Ok(())
}

fn refresh<V: Clone>(graph: &mut Graph<V>, id: NodeId, current: Revision) -> Result<()> {
    if graph.nodes.get(id).has_value() && dependencies_unchanged(graph, id)? {
        graph.nodes.get_mut(id).mark_validated(current);
        graph.record(|stats| stats.revalidations += 1);
        trace!(node = graph.nodes.name(id), revision = %current, "revalidated");
        return Ok(());
    }

    execute(graph, id, current)
}

/// Check the dependencies recorded by the last execution.
fn dependencies_unchanged<V: Clone>(graph: &mut Graph<V>, id: NodeId) -> Result<bool> {
    let node = graph.nodes.get(id);
    let validated_at = node.validated_at();
    let dependencies: Dependencies = node.dependencies().iter().copied().collect();

    for dependency in dependencies {
        let changed_at = match dependency {
            Dependency::Cell(cell) => graph.cells.get(cell).written_at(),
            Dependency::Node(dep) => {
                ensure_fresh(graph, dep)?;
                graph.nodes.get(dep).changed_at()
            }
        };

        if changed_at > validated_at {
            trace!(
                node = graph.nodes.name(id),
                dependency = graph.dependency_name(dependency),
                "dependency changed"
            );
            return Ok(false);
        }
    }

    Ok(true)
}

/// Run the body and record what it read.
fn execute<V: Clone>(graph: &mut Graph<V>, id: NodeId, current: Revision) -> Result<()> {
    let body = graph.nodes.get(id).body();
    debug!(node = graph.nodes.name(id), revision = %current, "executing node");

    let mut context = EvalContext::new(graph, id);
    let outcome = body(&mut context);
    let reads = context.finish();
    let value = outcome?;

    graph.nodes.get_mut(id).store(value, reads, current);
    graph.record(|stats| stats.executions += 1);
    Ok(())
}
