//! # Event subscriber trait.
//!
//! [`Subscriber`] is the extension point for consuming events from any bus.
//!
//! ## Rules
//! - A failed or panicking handler never aborts dispatch: the bus catches
//!   the fault, reports it to the [`ErrorSink`](crate::ErrorSink), and moves
//!   on to the next subscriber.
//! - On the synchronous bus, `handle` runs inline in the publisher's task.
//! - On the asynchronous bus, `handle` runs on a pool worker and must be
//!   re-entrant safe: several workers may call the same subscriber at once.
//!
//! ## Example
//! ```no_run
//! use async_trait::async_trait;
//! use fluxgate::{EventRef, HandleError, Subscriber};
//!
//! struct Audit;
//!
//! #[async_trait]
//! impl Subscriber for Audit {
//!     async fn handle(&self, event: &EventRef) -> Result<(), HandleError> {
//!         println!("saw {}", event.tag().name());
//!         Ok(())
//!     }
//!
//!     fn name(&self) -> &'static str {
//!         "audit"
//!     }
//! }
//! ```

use async_trait::async_trait;

use crate::error::HandleError;
use crate::event::EventRef;

/// Consumer of published events.
#[async_trait]
pub trait Subscriber: Send + Sync + 'static {
    /// Processes a single event.
    ///
    /// Returning `Err` (or panicking) is reported to the bus error sink and
    /// isolated from every other subscriber.
    async fn handle(&self, event: &EventRef) -> Result<(), HandleError>;

    /// Name used when reporting this subscriber's failures.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}
