//! Shared Graph
//!
//! A graph is single-owner: evaluation updates a node's cached value,
//! dependency set and revisions together, and nothing else may observe the
//! node halfway through. To use one graph from several threads, wrap it in a
//! [`SharedGraph`]. Every operation holds one lock around the whole graph for
//! its full duration.

use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};

use super::revision::Revision;
use super::runtime::Graph;
use crate::error::Result;

/// A graph behind a single mutex.
pub struct SharedGraph<V> {
    inner: Arc<Mutex<Graph<V>>>,
}

impl<V: Clone> SharedGraph<V> {
    /// Wrap a graph.
    pub fn new(graph: Graph<V>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(graph)),
        }
    }

    /// Write a cell.
    pub fn write_cell(&self, name: &str, value: V) -> Result<Revision> {
        self.inner.lock().write_cell(name, value)
    }

    /// Evaluate a node.
    pub fn evaluate(&self, name: &str) -> Result<V> {
        self.inner.lock().evaluate(name)
    }

    /// Reset the argument cells. See [`Graph::reset_argument_cells`].
    pub fn reset_argument_cells<I, K>(&self, assignments: I) -> Result<usize>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: PartialEq,
    {
        self.inner.lock().reset_argument_cells(assignments)
    }

    /// Reset the argument cells and evaluate the result node, atomically.
    pub fn call<I, K>(&self, assignments: I) -> Result<V>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: PartialEq,
    {
        self.inner.lock().call(assignments)
    }

    /// Run several operations under one lock.
    pub fn with<R>(&self, f: impl FnOnce(&mut Graph<V>) -> R) -> R {
        f(&mut self.inner.lock())
    }

    /// Lock the graph directly.
    pub fn lock(&self) -> MutexGuard<'_, Graph<V>> {
        self.inner.lock()
    }
}

impl<V> Clone for SharedGraph<V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}
