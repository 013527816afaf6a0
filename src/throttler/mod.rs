//! # Admission control.
//!
//! A [`Throttler`] restricts how many times an operation may happen inside a
//! rolling time window. Callers either poll ([`Throttler::should_proceed`])
//! or subscribe for a push notification when capacity returns
//! ([`Throttler::notify_when_can_proceed`]).
//!
//! A wakeup callback is advisory: it says capacity is likely available, it
//! does not grant anything. Only a successful `should_proceed` consumes an
//! admission.

mod rolling;

pub use rolling::RollingWindowThrottler;

use std::sync::Arc;
use std::time::Duration;

/// Outcome of an admission poll.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ThrottleDecision {
    /// Capacity was available; one admission has been consumed.
    Proceed,
    /// The window is saturated; try again later or wait for a callback.
    DoNotProceed,
}

/// Listener invoked when a throttler believes capacity has returned.
///
/// Implemented for any `Fn() + Send + Sync` closure, so
/// `Arc::new(|| { ... })` registers directly.
pub trait ThrottleCallback: Send + Sync + 'static {
    /// Called when the throttled operation can likely proceed.
    fn on_can_proceed(&self);
}

impl<F> ThrottleCallback for F
where
    F: Fn() + Send + Sync + 'static,
{
    fn on_can_proceed(&self) {
        self()
    }
}

/// Rate gate with poll and push interfaces.
pub trait Throttler: Send + Sync {
    /// Polls for admission, consuming one unit of capacity on success.
    fn should_proceed(&self) -> ThrottleDecision;

    /// Registers a callback fired when capacity returns. If capacity is
    /// available right now the callback runs immediately, in the caller's
    /// context. Callbacks stay registered until removed.
    fn notify_when_can_proceed(&self, callback: Arc<dyn ThrottleCallback>);

    /// Removes one occurrence of a previously registered callback.
    fn remove_callback(&self, callback: &Arc<dyn ThrottleCallback>);

    /// Admissions currently counted inside the window.
    fn current_operation_count(&self) -> usize;

    /// Zero when capacity is available, otherwise the time until the oldest
    /// admission leaves the window.
    fn time_until_next_operation(&self) -> Duration;
}
