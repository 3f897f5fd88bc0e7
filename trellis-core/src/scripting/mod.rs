//! Scripting
//!
//! Scripts are behavior objects bound to tree nodes. This module holds the
//! lifecycle state machine that keeps a script's activation in step with
//! its owner's enable switch and its node's membership in the live tree,
//! plus the declarative property tables editors use to expose script
//! fields.
//!
//! # Lifecycle
//!
//! ```text
//!            attach             tree entry / attach to live node
//! Detached --------> Ready ------------------------------------> Active
//!    ^                 |                                          |  ^
//!    |     detach      |                        set_enabled(false)|  |set_enabled(true)
//!    +-----------------+------------------------------------------v--+
//!                                                               Disabled
//! ```
//!
//! `detach` is valid from every state and always lands in `Detached`.

mod component;
mod expose;
mod state;

pub use component::{Script, ScriptComponent, ScriptContext, ScriptLifecycle};
pub use expose::{Inspectable, PropertyDescriptor, PropertyKind, PropertyTable};
pub use state::ScriptState;
