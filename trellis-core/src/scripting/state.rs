//! Script lifecycle states.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Where a script is in its lifecycle.
///
/// `Detached -> Ready -> Active <-> Disabled`. Every state but `Detached`
/// implies a bound node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScriptState {
    /// Not bound to any node.
    #[default]
    Detached,
    /// Bound, waiting for its node to enter the live tree.
    Ready,
    /// Initialized; the tree runs its frame hooks.
    Active,
    /// Initialized but switched off by its owner.
    Disabled,
}

impl ScriptState {
    /// Whether the state implies a bound node.
    pub fn is_bound(self) -> bool {
        !matches!(self, Self::Detached)
    }

    /// Whether the readiness hook has already run for the current binding.
    pub fn is_initialized(self) -> bool {
        matches!(self, Self::Active | Self::Disabled)
    }
}

impl fmt::Display for ScriptState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Detached => write!(f, "detached"),
            Self::Ready => write!(f, "ready"),
            Self::Active => write!(f, "active"),
            Self::Disabled => write!(f, "disabled"),
        }
    }
}
