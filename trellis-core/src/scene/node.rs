//! Node handles and the tree contract.
//!
//! Scripts never own nodes. They hold a [`NodeId`], a plain handle into
//! whatever store the tree uses, and ask the tree about it through
//! [`SceneTree`].

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Unique identifier for a node in a scene tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(u64);

impl NodeId {
    /// Generate a new unique node ID.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<u64> for NodeId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node#{}", self.0)
    }
}

/// What a script needs from the tree that hosts it.
///
/// Path syntax belongs to the implementor. The reference [`NodeTree`]
/// understands absolute (`/Root/Child`), relative (`Child/Grandchild`),
/// parent (`..`) and self (`.`) segments.
///
/// [`NodeTree`]: super::NodeTree
pub trait SceneTree {
    /// The node's parent, or `None` for a root or an unknown node.
    fn parent_of(&self, node: NodeId) -> Option<NodeId>;

    /// Whether the node is reachable from the live root.
    fn is_in_live_tree(&self, node: NodeId) -> bool;

    /// Resolve `path` relative to `from`. `None` if any segment misses.
    fn resolve(&self, from: NodeId, path: &str) -> Option<NodeId>;
}
