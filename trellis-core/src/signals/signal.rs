//! Signal Implementation
//!
//! A Signal is a typed publish/subscribe channel. Observers are connected
//! in order and invoked synchronously, in that order, every time the signal
//! is emitted.
//!
//! # Delivery Rules
//!
//! 1. The observer list is snapshotted when a delivery starts. Observers
//!    connected during the delivery wait for the next one; observers
//!    disconnected during the delivery still run if they were in the
//!    snapshot.
//!
//! 2. An `emit` made while a delivery is in progress does not recurse. The
//!    arguments are queued and delivered, FIFO, after the current delivery
//!    finishes.
//!
//! 3. A failing observer (an `Err` or a panic) is reported and skipped.
//!    The remaining observers still run and `emit` never fails.
//!
//! 4. One-shot observers in the snapshot are disconnected once the whole
//!    snapshot has been invoked.
//!
//! # Sharing
//!
//! `Signal` is a handle. Clones share the same observer list and queue,
//! which is what lets an observer capture the signal and re-emit, connect
//! or disconnect from inside a delivery. Everything is single-threaded
//! (`Rc` + `Cell`/`RefCell`).

use std::any::Any;
use std::borrow::Cow;
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::rc::{Rc, Weak};

use smallvec::SmallVec;

use super::callback::{Callback, CallbackId};
use super::report::{default_reporter, ErrorReporter, ObserverFailure};
use crate::error::ObserverError;

/// One connected observer.
struct Registration<T> {
    callback: Callback<T>,
    once: bool,
}

impl<T> Clone for Registration<T> {
    fn clone(&self) -> Self {
        Self {
            callback: self.callback.clone(),
            once: self.once,
        }
    }
}

/// Observers captured at the start of a delivery.
type Snapshot<T> = SmallVec<[Registration<T>; 4]>;

struct Shared<T> {
    name: Option<Cow<'static, str>>,

    /// Connected observers, in connection order. No two share an id.
    observers: RefCell<Vec<Registration<T>>>,

    /// True exactly while a delivery is running.
    emitting: Cell<bool>,

    /// Arguments of re-entrant emits awaiting delivery.
    pending: RefCell<VecDeque<T>>,

    reporter: RefCell<Rc<dyn ErrorReporter>>,
}

/// Marks a delivery in progress. Dropping it ends the emission: the flag is
/// cleared and any queued arguments are discarded, so a reporter that
/// unwinds out of the delivery loop leaves nothing behind for the next
/// `emit`.
struct EmissionGuard<'a, T> {
    shared: &'a Shared<T>,
}

impl<'a, T> EmissionGuard<'a, T> {
    fn enter(shared: &'a Shared<T>) -> Self {
        shared.emitting.set(true);
        Self { shared }
    }
}

impl<T> Drop for EmissionGuard<'_, T> {
    fn drop(&mut self) {
        // Empty after a normal drain.
        self.shared.pending.borrow_mut().clear();
        self.shared.emitting.set(false);
    }
}

/// A typed, reentrant-safe event channel.
///
/// # Type Parameters
///
/// - `T`: the argument tuple delivered on emission. Observers receive `&T`.
///
/// # Example
///
/// ```rust
/// use trellis_core::signals::Signal;
///
/// let health_changed: Signal<(i32, i32)> = Signal::named("health_changed");
/// let observer = health_changed.connect_fn(|(old, new)| {
///     println!("health {old} -> {new}");
/// });
///
/// health_changed.emit((100, 80));
/// health_changed.disconnect(&observer);
/// ```
pub struct Signal<T> {
    shared: Rc<Shared<T>>,
}

impl<T> Signal<T> {
    /// Create an anonymous signal.
    pub fn new() -> Self {
        Self::build(None)
    }

    /// Create a signal with a name used in failure reports.
    pub fn named(name: impl Into<Cow<'static, str>>) -> Self {
        Self::build(Some(name.into()))
    }

    fn build(name: Option<Cow<'static, str>>) -> Self {
        Self {
            shared: Rc::new(Shared {
                name,
                observers: RefCell::new(Vec::new()),
                emitting: Cell::new(false),
                pending: RefCell::new(VecDeque::new()),
                reporter: RefCell::new(default_reporter()),
            }),
        }
    }

    /// Replace the failure sink, builder style.
    pub fn with_reporter(self, reporter: Rc<dyn ErrorReporter>) -> Self {
        self.set_reporter(reporter);
        self
    }

    /// Replace the failure sink.
    pub fn set_reporter(&self, reporter: Rc<dyn ErrorReporter>) {
        *self.shared.reporter.borrow_mut() = reporter;
    }

    /// The signal's name, if it was given one.
    pub fn name(&self) -> Option<&str> {
        self.shared.name.as_deref()
    }

    /// Connect an observer.
    ///
    /// Returns `false` without changing anything if the same callback is
    /// already connected; its original `once` flag is kept.
    pub fn connect(&self, callback: &Callback<T>) -> bool {
        self.connect_with(callback, false)
    }

    /// Connect an observer that is removed after its first delivery.
    pub fn connect_one_shot(&self, callback: &Callback<T>) -> bool {
        self.connect_with(callback, true)
    }

    /// Connect an observer with an explicit `once` flag.
    pub fn connect_with(&self, callback: &Callback<T>, once: bool) -> bool {
        let mut observers = self.shared.observers.borrow_mut();
        if observers.iter().any(|r| r.callback.id() == callback.id()) {
            return false;
        }
        observers.push(Registration {
            callback: callback.clone(),
            once,
        });
        true
    }

    /// Wrap `func` in a new callback, connect it and hand back the handle
    /// needed to disconnect it later.
    pub fn connect_fn<F>(&self, func: F) -> Callback<T>
    where
        F: Fn(&T) + 'static,
    {
        let callback = Callback::new(func);
        self.connect(&callback);
        callback
    }

    /// Disconnect an observer. Returns `false` if it was not connected.
    pub fn disconnect(&self, callback: &Callback<T>) -> bool {
        self.disconnect_id(callback.id())
    }

    /// Disconnect an observer by id.
    pub fn disconnect_id(&self, id: CallbackId) -> bool {
        let mut observers = self.shared.observers.borrow_mut();
        match observers.iter().position(|r| r.callback.id() == id) {
            Some(index) => {
                observers.remove(index);
                true
            }
            None => false,
        }
    }

    /// Whether `callback` is currently connected.
    pub fn is_connected(&self, callback: &Callback<T>) -> bool {
        self.shared
            .observers
            .borrow()
            .iter()
            .any(|r| r.callback.id() == callback.id())
    }

    /// Number of connected observers.
    pub fn observer_count(&self) -> usize {
        self.shared.observers.borrow().len()
    }

    /// Whether a delivery is in progress.
    pub fn is_emitting(&self) -> bool {
        self.shared.emitting.get()
    }

    /// Number of queued re-entrant emissions.
    pub fn pending_count(&self) -> usize {
        self.shared.pending.borrow().len()
    }

    /// Deliver `args` to every connected observer.
    ///
    /// Called from inside a delivery, this only queues `args`.
    pub fn emit(&self, args: T) {
        if self.shared.emitting.get() {
            self.shared.pending.borrow_mut().push_back(args);
            tracing::trace!(
                target: "trellis::signal",
                signal = self.name().unwrap_or("<anonymous>"),
                queued = self.pending_count(),
                "re-entrant emit queued"
            );
            return;
        }

        let _guard = EmissionGuard::enter(&self.shared);
        self.deliver(&args);

        while let Some(next) = self.pop_pending() {
            self.deliver(&next);
        }
    }

    /// Remove all observers.
    ///
    /// A delivery already in flight keeps going with its snapshot.
    pub fn clear(&self) {
        self.shared.observers.borrow_mut().clear();
    }

    /// Create a non-owning handle, for observers that need to reach the
    /// signal they are connected to without keeping it alive.
    pub fn downgrade(&self) -> WeakSignal<T> {
        WeakSignal {
            shared: Rc::downgrade(&self.shared),
        }
    }

    /// Whether both handles refer to the same channel.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.shared, &other.shared)
    }

    fn pop_pending(&self) -> Option<T> {
        self.shared.pending.borrow_mut().pop_front()
    }

    fn deliver(&self, args: &T) {
        // The borrow must end before any observer runs.
        let snapshot: Snapshot<T> = self.shared.observers.borrow().iter().cloned().collect();

        for registration in &snapshot {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| registration.callback.call(args)));
            let error = match outcome {
                Ok(Ok(())) => continue,
                Ok(Err(error)) => error,
                Err(payload) => ObserverError::Panicked(panic_message(payload.as_ref())),
            };
            self.report(registration.callback.id(), error);
        }

        for registration in snapshot.iter().filter(|r| r.once) {
            self.disconnect_id(registration.callback.id());
        }
    }

    fn report(&self, callback: CallbackId, error: ObserverError) {
        let reporter = Rc::clone(&self.shared.reporter.borrow());
        reporter.report(&ObserverFailure {
            signal: self.shared.name.as_ref().map(|n| n.to_string()),
            callback,
            error,
        });
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

impl<T> Default for Signal<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for Signal<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Rc::clone(&self.shared),
        }
    }
}

impl<T> fmt::Debug for Signal<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal")
            .field("name", &self.name())
            .field("observer_count", &self.observer_count())
            .field("emitting", &self.is_emitting())
            .field("pending", &self.pending_count())
            .finish()
    }
}

/// Non-owning handle to a [`Signal`].
pub struct WeakSignal<T> {
    shared: Weak<Shared<T>>,
}

impl<T> WeakSignal<T> {
    /// Get the signal back, if it is still alive.
    pub fn upgrade(&self) -> Option<Signal<T>> {
        self.shared.upgrade().map(|shared| Signal { shared })
    }
}

impl<T> Clone for WeakSignal<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Weak::clone(&self.shared),
        }
    }
}

impl<T> fmt::Debug for WeakSignal<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakSignal")
            .field("alive", &(self.shared.strong_count() > 0))
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
