//! Observer callbacks and their identities.
//!
//! A Signal deduplicates observers by identity. Rust closures have no
//! identity of their own, so every observer is wrapped in a [`Callback`]
//! that carries a unique [`CallbackId`]. Clones of a `Callback` share the id
//! and therefore count as the same observer.

use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::ObserverError;

/// Outcome of a single observer invocation.
pub type ObserverResult = Result<(), ObserverError>;

/// Unique identifier for an observer callback.
///
/// Ids come from a process-wide atomic counter, so two callbacks created
/// independently never compare equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CallbackId(u64);

impl CallbackId {
    /// Generate a new unique callback ID.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl Default for CallbackId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CallbackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cb#{}", self.0)
    }
}

/// An observer that can be connected to a [`Signal<T>`](super::Signal).
///
/// The callback receives the emitted argument tuple by reference.
pub struct Callback<T> {
    id: CallbackId,
    func: Rc<dyn Fn(&T) -> ObserverResult>,
}

impl<T> Callback<T> {
    /// Wrap an infallible observer.
    pub fn new<F>(func: F) -> Self
    where
        F: Fn(&T) + 'static,
    {
        Self::fallible(move |args: &T| {
            func(args);
            Ok(())
        })
    }

    /// Wrap an observer that can report failure.
    ///
    /// An `Err` is reported through the signal's reporter and delivery moves
    /// on to the next observer.
    pub fn fallible<F>(func: F) -> Self
    where
        F: Fn(&T) -> ObserverResult + 'static,
    {
        Self {
            id: CallbackId::new(),
            func: Rc::new(func),
        }
    }

    /// Get the callback's identity.
    pub fn id(&self) -> CallbackId {
        self.id
    }

    /// Invoke the callback directly, bypassing any signal.
    pub fn call(&self, args: &T) -> ObserverResult {
        (self.func)(args)
    }
}

impl<T> Clone for Callback<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            func: Rc::clone(&self.func),
        }
    }
}

impl<T> PartialEq for Callback<T> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<T> Eq for Callback<T> {}

impl<T> fmt::Debug for Callback<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callback").field("id", &self.id).finish()
    }
}
