//! Cell Store
//!
//! Cells are the mutable inputs of a graph. Each cell holds its current value
//! and the revision at which it was last written.
//!
//! # How Cells Work
//!
//! 1. A cell is created on its first declaration or its first write. Cells
//!    are never removed, so a [`CellId`] stays valid for the lifetime of the
//!    store.
//!
//! 2. Every write advances the store's revision and stamps the cell with it.
//!    Writes are unconditional: writing the value a cell already holds still
//!    counts as a change.
//!
//! 3. A declared default counts as a write at [`Revision::ZERO`].
//!
//! Reading a name that was never declared or written leaves an undeclared
//! slot behind, so the reader can depend on it. Slots are not cells: they
//! are hidden from [`CellStore::names`], [`CellStore::contains`] and
//! [`CellStore::len`] until their first write.
//!
//! The store does not know who reads its cells. Dependents find out a cell
//! changed by comparing its write revision against their own validation
//! revision.

use indexmap::IndexMap;
use tracing::debug;

use super::revision::Revision;
use crate::error::{GraphError, Result};

/// Stable index of a cell inside its store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellId(usize);

impl CellId {
    /// Get the raw index.
    pub fn index(self) -> usize {
        self.0
    }
}

/// A named mutable input.
#[derive(Debug, Clone)]
pub struct Cell<V> {
    /// Current value. `None` for an argument declared without a default that
    /// has not been written yet.
    value: Option<V>,

    /// Declared default, restored by argument resets.
    default: Option<V>,

    /// Revision of the last write.
    written_at: Revision,

    /// False for a slot created by a read, until the first write.
    declared: bool,
}

impl<V> Cell<V> {
    fn empty() -> Self {
        Self {
            value: None,
            default: None,
            written_at: Revision::ZERO,
            declared: false,
        }
    }

    /// Whether the cell was declared or written, as opposed to only read.
    pub fn is_declared(&self) -> bool {
        self.declared
    }

    /// The current value, if the cell has one.
    pub fn value(&self) -> Option<&V> {
        self.value.as_ref()
    }

    /// The declared default, if any.
    pub fn default_value(&self) -> Option<&V> {
        self.default.as_ref()
    }

    /// Revision of the last write.
    pub fn written_at(&self) -> Revision {
        self.written_at
    }
}

/// All cells of one graph, plus the graph's revision counter.
#[derive(Debug, Clone)]
pub struct CellStore<V> {
    cells: IndexMap<String, Cell<V>>,
    revision: Revision,
}

impl<V> CellStore<V> {
    /// Create an empty store at [`Revision::ZERO`].
    pub fn new() -> Self {
        Self {
            cells: IndexMap::new(),
            revision: Revision::ZERO,
        }
    }

    /// The current global revision.
    pub fn revision(&self) -> Revision {
        self.revision
    }

    /// Declare a cell, optionally with a default.
    ///
    /// The default is the cell's value at revision zero. Re-declaring a name
    /// replaces its default; callers validate uniqueness beforehand.
    pub fn declare(&mut self, name: impl Into<String>, default: Option<V>) -> CellId
    where
        V: Clone,
    {
        let cell = Cell {
            value: default.clone(),
            default,
            written_at: Revision::ZERO,
            declared: true,
        };
        let (index, _) = self.cells.insert_full(name.into(), cell);
        CellId(index)
    }

    /// Look up a cell by name.
    pub fn id_of(&self, name: &str) -> Option<CellId> {
        self.cells.get_index_of(name).map(CellId)
    }

    /// Get the id for `name`, creating an undeclared slot if there is none.
    ///
    /// Reads of a cell that does not exist yet still need something to depend
    /// on, so that a later write invalidates the reader.
    pub fn slot(&mut self, name: &str) -> CellId {
        match self.cells.get_index_of(name) {
            Some(index) => CellId(index),
            None => CellId(self.cells.insert_full(name.to_string(), Cell::empty()).0),
        }
    }

    /// Get a cell by id.
    pub fn get(&self, id: CellId) -> &Cell<V> {
        &self.cells[id.0]
    }

    /// Name of a cell.
    pub fn name(&self, id: CellId) -> &str {
        self.cells
            .get_index(id.0)
            .map(|(name, _)| name.as_str())
            .unwrap_or_default()
    }

    /// Write a value, creating the cell if needed.
    ///
    /// Advances the global revision and stamps the cell with it, whether or
    /// not the value is different from the current one.
    pub fn write(&mut self, name: &str, value: V) -> CellId {
        let id = self.slot(name);
        self.revision = self.revision.next();

        let cell = &mut self.cells[id.0];
        cell.value = Some(value);
        cell.written_at = self.revision;
        cell.declared = true;

        debug!(cell = name, revision = %self.revision, "cell written");
        id
    }

    /// Write a value unless the cell already holds an equal one.
    ///
    /// Returns whether a write happened.
    pub fn write_if_changed(&mut self, name: &str, value: V) -> bool
    where
        V: PartialEq,
    {
        let unchanged = self
            .id_of(name)
            .and_then(|id| self.get(id).value())
            .is_some_and(|current| *current == value);

        if unchanged {
            return false;
        }
        self.write(name, value);
        true
    }

    /// Read a cell's value and last write revision.
    pub fn read(&self, name: &str) -> Result<(&V, Revision)> {
        let id = self
            .id_of(name)
            .ok_or_else(|| GraphError::UnknownCell(name.to_string()))?;
        let value = self.read_id(id)?;
        Ok((value, self.get(id).written_at))
    }

    /// Read a cell's value by id.
    pub fn read_id(&self, id: CellId) -> Result<&V> {
        match self.cells.get_index(id.0) {
            Some((_, cell)) => cell
                .value
                .as_ref()
                .ok_or_else(|| GraphError::UnknownCell(self.name(id).to_string())),
            None => Err(GraphError::UnknownCell(format!("#{}", id.0))),
        }
    }

    /// Cells that carry a declared default, with that default.
    pub fn defaults(&self) -> impl Iterator<Item = (&str, &V)> {
        self.cells
            .iter()
            .filter_map(|(name, cell)| cell.default.as_ref().map(|v| (name.as_str(), v)))
    }

    /// All cell names in declaration order. Undeclared slots are skipped.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.cells
            .iter()
            .filter(|(_, cell)| cell.declared)
            .map(|(name, _)| name.as_str())
    }

    /// Check whether a declared cell with this name exists.
    pub fn contains(&self, name: &str) -> bool {
        self.cells.get(name).is_some_and(|cell| cell.declared)
    }

    /// Number of declared cells.
    pub fn len(&self) -> usize {
        self.cells.values().filter(|cell| cell.declared).count()
    }

    /// Check whether the store has no declared cells.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<V> Default for CellStore<V> {
    fn default() -> Self {
        Self::new()
    }
}
