//! Observer failure reporting.
//!
//! A failing observer must never abort an emission, but the failure still
//! has to go somewhere. Signals hand every failure to an [`ErrorReporter`].
//! The default reporter logs through `tracing`; tests inject a
//! [`CollectingReporter`] and assert on what it captured.

use std::cell::RefCell;
use std::rc::Rc;

use super::callback::CallbackId;
use crate::error::ObserverError;

/// A single observer failure, as seen by a reporter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObserverFailure {
    /// Name of the signal being emitted, if it has one.
    pub signal: Option<String>,
    /// The observer that failed.
    pub callback: CallbackId,
    /// What went wrong.
    pub error: ObserverError,
}

/// Sink for observer failures.
pub trait ErrorReporter {
    fn report(&self, failure: &ObserverFailure);
}

/// Logs failures at `error` level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl ErrorReporter for TracingReporter {
    fn report(&self, failure: &ObserverFailure) {
        tracing::error!(
            target: "trellis::signal",
            signal = failure.signal.as_deref().unwrap_or("<anonymous>"),
            callback = %failure.callback,
            error = %failure.error,
            "observer failed during emission"
        );
    }
}

/// Keeps every failure in memory, in report order.
///
/// Clones share the same buffer, so one handle can be injected into a
/// signal while another is kept for inspection.
#[derive(Debug, Default, Clone)]
pub struct CollectingReporter {
    failures: Rc<RefCell<Vec<ObserverFailure>>>,
}

impl CollectingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all failures reported so far.
    pub fn failures(&self) -> Vec<ObserverFailure> {
        self.failures.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.failures.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.failures.borrow().is_empty()
    }

    /// Drain the buffer.
    pub fn take(&self) -> Vec<ObserverFailure> {
        std::mem::take(&mut *self.failures.borrow_mut())
    }
}

impl ErrorReporter for CollectingReporter {
    fn report(&self, failure: &ObserverFailure) {
        self.failures.borrow_mut().push(failure.clone());
    }
}

/// The reporter used when none is injected.
pub(crate) fn default_reporter() -> Rc<dyn ErrorReporter> {
    Rc::new(TracingReporter)
}
