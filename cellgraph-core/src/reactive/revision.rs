//! Revisions timestamp every write and every validation.
//!
//! A graph owns exactly one revision counter. It starts at zero (declared
//! defaults live at revision zero) and moves forward by one on every cell
//! write. Nodes remember the revision at which they were last validated and
//! the revision at which their value last changed; comparing those against
//! their dependencies is all the invalidation machinery there is.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A point in a graph's write history.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Revision(u64);

impl Revision {
    /// The revision of a freshly constructed graph.
    pub const ZERO: Revision = Revision(0);

    /// The revision that follows this one.
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }

    /// Get the raw counter value.
    pub fn raw(self) -> u64 {
        self.0
    }
}

impl From<u64> for Revision {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "r{}", self.0)
    }
}
