//! Error types.
//!
//! Nothing in this crate is fatal. Observer failures are reported, never
//! propagated; lookups that can miss return `Option`; lifecycle misuse is a
//! no-op. The enums here cover the remaining fallible surfaces.

use thiserror::Error;

use crate::scene::NodeId;

/// Failure raised by an observer while a signal is being delivered.
///
/// These never escape `Signal::emit`; they are handed to the signal's
/// [`ErrorReporter`](crate::signals::ErrorReporter).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ObserverError {
    /// The observer returned an error.
    #[error("observer failed: {0}")]
    Failed(String),

    /// The observer panicked. Holds the panic message when it was a string.
    #[error("observer panicked: {0}")]
    Panicked(String),
}

impl ObserverError {
    /// Build a `Failed` error from anything printable.
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }
}

/// Errors from the per-instance signal registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignalError {
    /// The name is already bound to a signal with a different argument type.
    #[error("signal `{name}` carries `{found}`, requested as `{requested}`")]
    TypeMismatch {
        name: String,
        requested: &'static str,
        found: &'static str,
    },
}

/// Errors from structural edits on [`NodeTree`](crate::scene::NodeTree).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    #[error("unknown node {0:?}")]
    UnknownNode(NodeId),

    #[error("node {child:?} already has parent {parent:?}")]
    AlreadyParented { child: NodeId, parent: NodeId },

    #[error("node {child:?} is not a child of {parent:?}")]
    NotAChild { parent: NodeId, child: NodeId },

    #[error("adding {child:?} under {parent:?} would create a cycle")]
    Cycle { parent: NodeId, child: NodeId },

    #[error("the root node cannot be reparented")]
    RootReparent,
}

/// Errors from building inspector property descriptors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PropertyError {
    #[error("property `{name}`: min {min} exceeds max {max}")]
    InvalidRange { name: String, min: f64, max: f64 },

    #[error("property `{name}`: step must be positive, got {step}")]
    InvalidStep { name: String, step: f64 },

    #[error("property `{0}` is declared twice")]
    Duplicate(String),
}
