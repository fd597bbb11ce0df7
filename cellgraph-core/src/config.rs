//! Graph configuration.
//!
//! Configuration is plain data. It can be built in code or loaded from JSON,
//! with every field optional:
//!
//! ```json
//! { "max_depth": 128, "record_stats": false }
//! ```

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Default bound on nested node evaluation.
pub const DEFAULT_MAX_DEPTH: usize = 512;

/// Tunables for a [`Graph`](crate::Graph).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    /// Maximum number of nodes that may be under evaluation at once.
    ///
    /// Deep chains fail with [`GraphError::DepthExceeded`](crate::GraphError::DepthExceeded)
    /// instead of overflowing the thread's stack.
    pub max_depth: usize,

    /// Whether [`EvalStats`](crate::EvalStats) counters are updated.
    pub record_stats: bool,
}

impl GraphConfig {
    /// Parse a configuration from a JSON document.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Set the maximum evaluation depth.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Enable or disable statistics.
    pub fn with_stats(mut self, record_stats: bool) -> Self {
        self.record_stats = record_stats;
        self
    }
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            record_stats: true,
        }
    }
}
