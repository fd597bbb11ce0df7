//! Invalidation Tracker
//!
//! Invalidation is lazy. A cell write only advances the revision; no node is
//! marked, visited or recomputed. Whether a node is stale is decided when
//! somebody asks, by comparing revisions along the dependency set recorded by
//! its last execution.
//!
//! The engine does this as part of evaluation. The tracker answers the same
//! question without running anything, which is what the queries here are for:
//! predicting which bodies the next evaluation will execute.

use std::collections::HashMap;

use serde::Serialize;

use super::runtime::Graph;
use crate::error::Result;
use crate::graph::{Dependency, NodeId};

/// How a node stands relative to the current revision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Freshness {
    /// The node has no cached value. Evaluating it runs the body.
    Unevaluated,

    /// The cached value was validated at the current revision.
    Fresh,

    /// The cached value is older than the current revision, but nothing the
    /// node read has changed since. Evaluating it only re-checks dependencies.
    Verifiable,

    /// Something the node read has changed. Evaluating it runs the body.
    Stale,
}

impl Freshness {
    /// Whether evaluating the node would execute its body.
    pub fn would_execute(self) -> bool {
        matches!(self, Freshness::Unevaluated | Freshness::Stale)
    }
}

impl<V> Graph<V> {
    /// Classify a node without evaluating anything.
    pub fn freshness(&self, name: &str) -> Result<Freshness> {
        let id = self.nodes.require(name)?;
        Ok(self.freshness_of(id, &mut HashMap::new()))
    }

    /// Whether evaluating the node now would execute its body.
    pub fn is_stale(&self, name: &str) -> Result<bool> {
        self.freshness(name).map(Freshness::would_execute)
    }

    /// Every node whose body would execute if it were evaluated now.
    pub fn stale_nodes(&self) -> Vec<&str> {
        let mut seen = HashMap::new();
        self.nodes
            .iter()
            .filter(|&(id, _)| self.freshness_of(id, &mut seen).would_execute())
            .map(|(_, node)| node.name())
            .collect()
    }

    fn freshness_of(&self, id: NodeId, seen: &mut HashMap<NodeId, Freshness>) -> Freshness {
        if let Some(&known) = seen.get(&id) {
            return known;
        }
        // Provisional answer in case recorded edges ever loop back here.
        seen.insert(id, Freshness::Stale);

        let freshness = self.classify(id, seen);
        seen.insert(id, freshness);
        freshness
    }

    fn classify(&self, id: NodeId, seen: &mut HashMap<NodeId, Freshness>) -> Freshness {
        let node = self.nodes.get(id);
        if !node.has_value() {
            return Freshness::Unevaluated;
        }
        if node.validated_at() == self.revision() {
            return Freshness::Fresh;
        }

        let validated_at = node.validated_at();
        for &dependency in node.dependencies() {
            let changed = match dependency {
                Dependency::Cell(cell) => self.cells.get(cell).written_at() > validated_at,
                // A dependency that re-executes gets a new changed-at revision,
                // which is necessarily newer than `validated_at`.
                Dependency::Node(dep) => {
                    self.freshness_of(dep, seen).would_execute()
                        || self.nodes.get(dep).changed_at() > validated_at
                }
            };
            if changed {
                return Freshness::Stale;
            }
        }

        Freshness::Verifiable
    }
}
