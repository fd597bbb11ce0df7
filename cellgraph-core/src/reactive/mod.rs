//! Reactive Evaluation
//!
//! This module implements the evaluation side of a graph: cells, the
//! revision counter, the tracking context handed to node bodies, the
//! pull-based engine and the invalidation tracker.
//!
//! # Concepts
//!
//! ## Cells
//!
//! A cell is a named mutable input. Writing a cell advances the graph's
//! revision and stamps the cell with it. Writing never touches a node.
//!
//! ## Nodes
//!
//! A node is a named derived value. Its body reads cells and other nodes
//! through an [`EvalContext`]; whatever it reads becomes its dependency set.
//! Dependencies are rediscovered on every execution, so a body that branches
//! on a cell only depends on the branch it actually took.
//!
//! ## Revisions
//!
//! Every node remembers the revision at which it was last validated and the
//! revision at which its value last changed. A node is up to date when nothing
//! it read has changed after its validation. Checking that is the only
//! invalidation work there is, and it happens at read time.
//!
//! # Implementation Notes
//!
//! Evaluation is synchronous recursion on the caller's thread. There is no
//! scheduler and nothing runs eagerly: a node that is never read never
//! executes.

mod cell;
mod context;
mod engine;
mod revision;
mod runtime;
mod shared;
mod stats;
mod tracker;

pub use cell::{Cell, CellId, CellStore};
pub use context::EvalContext;
pub use revision::Revision;
pub use runtime::Graph;
pub use shared::SharedGraph;
pub use stats::EvalStats;
pub use tracker::Freshness;
