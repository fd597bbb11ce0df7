//! Evaluation counters.

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Counters for what evaluation did, updated when
/// [`GraphConfig::record_stats`](crate::GraphConfig::record_stats) is set.
///
/// Every node visited during an evaluation counts, not only the node that was
/// asked for. A failure deep in a chain is counted once per node it aborts.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvalStats {
    /// Nodes served from cache without looking at their dependencies.
    pub cache_hits: u64,
    /// Nodes confirmed fresh by checking their dependencies.
    pub revalidations: u64,
    /// Node bodies that ran to completion.
    pub executions: u64,
    /// Node evaluations that returned an error.
    pub failures: u64,
    /// Cycles detected.
    pub cycles_detected: u64,
}

impl EvalStats {
    /// Total number of node lookups that did not fail.
    pub fn lookups(&self) -> u64 {
        self.cache_hits + self.revalidations + self.executions
    }

    /// Reset all counters to zero.
    pub fn reset(&mut self) {
        *self = EvalStats::default();
    }

    /// Serialize the counters as a JSON object.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}
