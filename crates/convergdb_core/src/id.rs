//! Arena identifiers for IR nodes.
//!
//! A node id is the node's position in its tree's arena. Parents are always
//! inserted before their children, so a parent's id is strictly smaller than
//! the ids of everything beneath it.

use serde::{Deserialize, Serialize};

/// Node identifier - index of a node within its tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(u32);

impl NodeId {
    /// The root of every tree
    pub const ROOT: Self = Self(0);

    /// Create from an arena index
    #[must_use]
    pub const fn from_index(index: u32) -> Self {
        Self(index)
    }

    /// Get the arena index
    #[must_use]
    pub const fn index(&self) -> usize {
        self.0 as usize
    }

    /// True for the root id
    #[must_use]
    pub const fn is_root(&self) -> bool {
        self.0 == 0
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "node_{}", self.0)
    }
}
