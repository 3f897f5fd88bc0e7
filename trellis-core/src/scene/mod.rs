//! Scene Tree
//!
//! Scripts and signals live on nodes, but the tree that owns those nodes is
//! a collaborator, not part of the core. This module defines what the core
//! needs from a tree ([`SceneTree`]) and a reference implementation
//! ([`NodeTree`]) used by the tests and by hosts that do not bring their
//! own.
//!
//! # Contract
//!
//! - Scripts refer to nodes through [`NodeId`] handles and never keep a
//!   node alive.
//! - The tree tells a script when its node enters the live tree.
//! - The tree calls frame hooks only on scripts whose state is `Active`.

mod node;
mod tree;

pub use node::{NodeId, SceneTree};
pub use tree::NodeTree;
