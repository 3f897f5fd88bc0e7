//! Per-instance signal registry.
//!
//! Any type that declares signals owns a `SignalRegistry`. The registry maps
//! a declared name to its [`Signal`] and creates the entry on first access,
//! so an instance only pays for the signals somebody actually touches.
//! Registries are never shared: two instances of the same type get two
//! independent sets of channels.

use std::any::{type_name, Any};
use std::cell::RefCell;
use std::fmt;
use std::marker::PhantomData;
use std::rc::Rc;

use indexmap::IndexMap;

use super::report::ErrorReporter;
use super::signal::Signal;
use crate::error::SignalError;

/// Type-erased view of a `Signal<T>` so signals with different argument
/// types can live in one map.
trait ErasedSignal {
    fn as_any(&self) -> &dyn Any;
    fn clear(&self);
    fn observer_count(&self) -> usize;
    fn type_name(&self) -> &'static str;
}

impl<T: 'static> ErasedSignal for Signal<T> {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn clear(&self) {
        Signal::clear(self);
    }

    fn observer_count(&self) -> usize {
        Signal::observer_count(self)
    }

    fn type_name(&self) -> &'static str {
        type_name::<T>()
    }
}

/// A declared signal: a name paired with its argument type.
///
/// ```rust
/// use trellis_core::signals::{SignalDecl, SignalRegistry};
///
/// const HEALTH_CHANGED: SignalDecl<(i32,)> = SignalDecl::new("health_changed");
///
/// let registry = SignalRegistry::new();
/// let signal = registry.get(&HEALTH_CHANGED).unwrap();
/// signal.emit((10,));
/// ```
pub struct SignalDecl<T> {
    name: &'static str,
    _marker: PhantomData<fn(T)>,
}

impl<T> SignalDecl<T> {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            _marker: PhantomData,
        }
    }

    pub const fn name(&self) -> &'static str {
        self.name
    }
}

impl<T> Clone for SignalDecl<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for SignalDecl<T> {}

impl<T> fmt::Debug for SignalDecl<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignalDecl")
            .field("name", &self.name)
            .field("args", &type_name::<T>())
            .finish()
    }
}

/// Lazily populated map from signal name to signal.
///
/// Lookups take `&self`; the map uses interior mutability so that reading
/// a signal accessor can create the entry.
#[derive(Default)]
pub struct SignalRegistry {
    /// Entries in first-access order.
    signals: RefCell<IndexMap<String, Box<dyn ErasedSignal>>>,

    /// Injected into every signal this registry creates.
    reporter: Option<Rc<dyn ErrorReporter>>,
}

impl SignalRegistry {
    /// Create an empty registry. Signals it creates log failures.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty registry whose signals report to `reporter`.
    pub fn with_reporter(reporter: Rc<dyn ErrorReporter>) -> Self {
        Self {
            signals: RefCell::new(IndexMap::new()),
            reporter: Some(reporter),
        }
    }

    /// Look up the signal registered under `name`, creating it on first
    /// access.
    ///
    /// Every call with the same name returns a handle to the same channel.
    /// Fails if `name` was first accessed with a different argument type.
    pub fn signal<T: 'static>(&self, name: &str) -> Result<Signal<T>, SignalError> {
        let mut signals = self.signals.borrow_mut();

        if let Some(existing) = signals.get(name) {
            return existing
                .as_any()
                .downcast_ref::<Signal<T>>()
                .cloned()
                .ok_or_else(|| SignalError::TypeMismatch {
                    name: name.to_string(),
                    requested: type_name::<T>(),
                    found: existing.type_name(),
                });
        }

        let mut signal = Signal::named(name.to_string());
        if let Some(reporter) = &self.reporter {
            signal = signal.with_reporter(Rc::clone(reporter));
        }
        signals.insert(name.to_string(), Box::new(signal.clone()));
        tracing::trace!(target: "trellis::signal", signal = name, "signal created");
        Ok(signal)
    }

    /// Look up a declared signal, creating it on first access.
    pub fn get<T: 'static>(&self, decl: &SignalDecl<T>) -> Result<Signal<T>, SignalError> {
        self.signal(decl.name())
    }

    /// Whether `name` has been accessed yet.
    pub fn contains(&self, name: &str) -> bool {
        self.signals.borrow().contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.signals.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.signals.borrow().is_empty()
    }

    /// Names of the signals created so far, in first-access order.
    pub fn names(&self) -> Vec<String> {
        self.signals.borrow().keys().cloned().collect()
    }

    /// Observer count of the named signal, if it exists.
    pub fn observer_count(&self, name: &str) -> Option<usize> {
        self.signals.borrow().get(name).map(|s| s.observer_count())
    }

    /// Disconnect every observer from every signal.
    ///
    /// The signals themselves stay registered, so handles held elsewhere
    /// remain the live channels for this instance.
    pub fn clear_all(&self) {
        for signal in self.signals.borrow().values() {
            signal.clear();
        }
        tracing::trace!(target: "trellis::signal", count = self.len(), "registry cleared");
    }
}

impl fmt::Debug for SignalRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignalRegistry")
            .field("signals", &self.names())
            .field("custom_reporter", &self.reporter.is_some())
            .finish()
    }
}

/// Implemented by types that declare signals.
pub trait SignalEmitter {
    /// The instance's own registry.
    fn signals(&self) -> &SignalRegistry;

    /// Accessor for a declared signal on this instance.
    fn signal<T: 'static>(&self, decl: &SignalDecl<T>) -> Result<Signal<T>, SignalError>
    where
        Self: Sized,
    {
        self.signals().get(decl)
    }
}
