//! Cellgraph Core
//!
//! This crate provides a lazy, memoized dataflow engine. A computation is
//! split into named sub-computations ("nodes") over named inputs ("cells").
//! It implements:
//!
//! - Cells with optional defaults and a global revision counter
//! - Derived nodes with dynamically discovered dependencies
//! - Pull-based evaluation that caches every node and re-executes only what
//!   a changed cell actually reaches
//! - Cycle detection and bounded evaluation depth
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - `graph`: Nodes, dependency edges and validated construction
//! - `reactive`: Cells, revisions, the evaluation engine and staleness queries
//! - `config`: Graph tunables, loadable from JSON
//! - `error`: The error type shared by every operation
//!
//! # Example
//!
//! ```rust
//! use cellgraph_core::Graph;
//!
//! let mut graph = Graph::<i64>::builder()
//!     .cell("x", 42)
//!     .argument("y")
//!     .node("a", |ctx| Ok(ctx.cell("x")? + 1))
//!     .node("b", |ctx| Ok(ctx.cell("y")? + 1))
//!     .node("ans", |ctx| Ok(ctx.node("a")? + ctx.node("b")?))
//!     .build()?;
//!
//! // Omitted arguments fall back to their defaults.
//! assert_eq!(graph.call([("y", 9)])?, 53);
//!
//! // Only `b` and `ans` depend on `y`.
//! assert_eq!(graph.call([("y", 7)])?, 51);
//! assert_eq!(graph.execution_count("a")?, 1);
//! # Ok::<(), cellgraph_core::GraphError>(())
//! ```

pub mod config;
pub mod error;
pub mod graph;
pub mod reactive;

pub use config::GraphConfig;
pub use error::{GraphError, Result};
pub use graph::{body, GraphBuilder, NodeBody};
pub use reactive::{EvalContext, EvalStats, Freshness, Graph, Revision, SharedGraph};
