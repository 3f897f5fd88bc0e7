//! Trellis Core
//!
//! This crate provides the reactive backbone of the Trellis scene-graph
//! runtime. It implements:
//!
//! - Signals: typed, ordered, reentrant-safe publish/subscribe channels
//! - Per-instance signal registries, filled lazily by name
//! - The script lifecycle state machine that binds behaviors to nodes
//! - A reference scene tree that drives scripts and owns node signals
//!
//! Everything runs on one thread and is synchronous. Re-entrant emission is
//! handled by queueing, not recursion.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - `signals`: signals, callbacks, registries and failure reporting
//! - `scripting`: script components, lifecycle states, exposed properties
//! - `scene`: node handles, the tree contract, and `NodeTree`
//! - `error`: error types shared by the modules above
//!
//! # Example
//!
//! ```rust
//! use trellis_core::scene::NodeTree;
//! use trellis_core::scripting::{Script, ScriptComponent, ScriptContext, ScriptState};
//!
//! #[derive(Default)]
//! struct Spinner {
//!     angle: f64,
//! }
//!
//! impl Script for Spinner {
//!     fn process(&mut self, _ctx: &ScriptContext<'_>, delta: f64) {
//!         self.angle += 90.0 * delta;
//!     }
//! }
//!
//! let mut tree = NodeTree::new("Root");
//! let wheel = tree.create_node("Wheel");
//! tree.add_child(tree.root(), wheel).unwrap();
//!
//! tree.set_script(wheel, Box::new(ScriptComponent::new(Spinner::default())))
//!     .unwrap();
//! assert_eq!(tree.script(wheel).unwrap().state(), ScriptState::Active);
//!
//! tree.process(0.5);
//! ```

pub mod error;
pub mod scene;
pub mod scripting;
pub mod signals;

pub use error::{ObserverError, PropertyError, SignalError, TreeError};
