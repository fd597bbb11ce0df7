//! Dependency Graph
//!
//! This module implements the structure of a graph: the derived nodes, the
//! edges between them and the validated construction of both.
//!
//! # Overview
//!
//! - Nodes are derived computations registered at construction, keyed by name
//! - Edges are "reads": node A has an edge to B if A's last execution read B
//!
//! Edges are discovered, not declared. They are replaced every time a node
//! executes, so the graph always describes the most recent execution of each
//! node and nothing older.
//!
//! # Design Decisions
//!
//! 1. Nodes refer to cells and nodes by stable index, never by pointer. The
//!    registry owns every node; a dependency is a lookup, not ownership.
//!
//! 2. Insertion order is preserved. The last registered node is the graph's
//!    result.
//!
//! 3. Only forward edges are stored. Reverse lookups scan them, which keeps
//!    the two directions from ever disagreeing.

mod builder;
mod node;
mod registry;

pub use builder::GraphBuilder;
pub use node::{body, Dependencies, Dependency, Node, NodeBody, NodeId};
pub use registry::NodeRegistry;
