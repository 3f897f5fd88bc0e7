//! Signals
//!
//! This module implements typed, synchronous publish/subscribe channels.
//! Any object (usually a node or a script) exposes named signals; other
//! objects connect observers to them and are called back, in connection
//! order, whenever the signal is emitted.
//!
//! # Concepts
//!
//! ## Signals
//!
//! A [`Signal<T>`] owns an ordered list of observers and a queue of pending
//! emissions. Emitting from inside an observer never recurses: the nested
//! emission is queued and delivered after the current one completes.
//!
//! ## Callbacks
//!
//! Observers are wrapped in a [`Callback<T>`], whose [`CallbackId`] is the
//! identity used for deduplication and disconnection.
//!
//! ## Registries
//!
//! A [`SignalRegistry`] is the per-instance map from declared name to
//! signal, filled lazily on first access.
//!
//! ## Failure reporting
//!
//! Observer failures are caught at the emission boundary and handed to an
//! [`ErrorReporter`]; they never reach the caller of `emit`.

mod callback;
mod registry;
mod report;
mod signal;

pub use callback::{Callback, CallbackId, ObserverResult};
pub use registry::{SignalDecl, SignalEmitter, SignalRegistry};
pub use report::{CollectingReporter, ErrorReporter, ObserverFailure, TracingReporter};
pub use signal::{Signal, WeakSignal};
