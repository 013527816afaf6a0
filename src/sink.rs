//! # Error sink.
//!
//! Handler failures, callback failures, and shutdown overruns are reported
//! here instead of propagating to publishers. The default [`LogSink`] routes
//! messages through the `log` facade; embedders wire a custom sink when they
//! need structured capture.

/// Destination for fault messages swallowed at a bus or throttler boundary.
pub trait ErrorSink: Send + Sync + 'static {
    /// Records one error message.
    fn error(&self, message: &str);
}

/// Default sink, forwards to [`log::error!`].
pub struct LogSink;

impl ErrorSink for LogSink {
    fn error(&self, message: &str) {
        log::error!(target: "fluxgate", "{message}");
    }
}

/// Best-effort text of a caught panic payload.
pub(crate) fn panic_reason(payload: &(dyn std::any::Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "non-string panic payload"
    }
}
