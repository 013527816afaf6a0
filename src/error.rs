//! # Error types.
//!
//! Two error surfaces exist:
//!
//! - [`ConfigError`] is the only error surfaced to callers, at construction
//!   time. Nothing else in the core returns an error to a publisher.
//! - [`HandleError`] is returned by subscribers and swallowed at the bus
//!   boundary (logged, never propagated).
//!
//! Both provide `as_label` for stable log/metric labels.

use std::time::Duration;

use thiserror::Error;

/// Invalid construction parameters.
///
/// Construction fails before any background task is spawned, so no partially
/// built object leaks.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The admission limit must allow at least one operation per window.
    #[error("max_ops must be positive (got {value})")]
    InvalidMaxOps {
        /// The rejected limit.
        value: usize,
    },
    /// The rolling window must be non-zero.
    #[error("window must be positive (got {value:?})")]
    InvalidWindow {
        /// The rejected window.
        value: Duration,
    },
}

impl ConfigError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            ConfigError::InvalidMaxOps { .. } => "config_invalid_max_ops",
            ConfigError::InvalidWindow { .. } => "config_invalid_window",
        }
    }
}

/// Failure raised by a [`Subscriber`](crate::Subscriber) handler.
#[derive(Error, Debug)]
#[error("{reason}")]
pub struct HandleError {
    reason: String,
}

impl HandleError {
    /// Wraps a failure reason.
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}
