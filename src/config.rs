//! # Asynchronous bus configuration.
//!
//! [`BusConfig`] controls the worker pool, per-type coalescing, and the
//! shutdown grace period of the [`AsyncBus`](crate::AsyncBus).
//!
//! # Example
//! ```
//! use std::time::Duration;
//! use fluxgate::BusConfig;
//!
//! let mut cfg = BusConfig::default();
//! cfg.workers = 4;
//! cfg.coalesce = true;
//! cfg.grace = Duration::from_secs(2);
//!
//! assert_eq!(cfg.workers, 4);
//! ```

use std::time::Duration;

/// Configuration for the asynchronous bus.
#[derive(Clone, Debug)]
pub struct BusConfig {
    /// Maximum number of handler invocations running concurrently
    /// (0 = unlimited, the pool grows with demand).
    pub workers: usize,
    /// Collapse queued publications per event tag, delivering only the most
    /// recent value each time the drainer reaches that tag.
    pub coalesce: bool,
    /// Maximum time to wait for in-flight handlers after shutdown.
    pub grace: Duration,
}

impl Default for BusConfig {
    /// Provides a default configuration:
    /// - `workers = 0` (unlimited)
    /// - `coalesce = false`
    /// - `grace = 5s`
    fn default() -> Self {
        Self {
            workers: 0,
            coalesce: false,
            grace: Duration::from_secs(5),
        }
    }
}
