//! # Event buses.
//!
//! Two delivery disciplines over one [`SubscriberRegistry`](crate::SubscriberRegistry):
//!
//! - [`SyncBus`]: dispatches inline in the publisher's task; when `publish`
//!   returns, every matched handler has run.
//! - [`AsyncBus`]: enqueues publications; a drainer task fans each one out to
//!   a pool of worker tasks, optionally coalescing per event tag.
//!
//! Both present the same [`EventBus`] interface, so the throttled adapter
//! (or application code) can treat them interchangeably.

mod async_bus;
mod sync_bus;

pub use async_bus::AsyncBus;
pub use sync_bus::SyncBus;

use std::sync::Arc;

use async_trait::async_trait;
use futures::FutureExt;

use crate::event::EventRef;
use crate::sink::{panic_reason, ErrorSink};
use crate::subscriber::Subscriber;
use crate::tag::Tag;

/// Fire-and-forget publication plus append-only subscription management.
#[async_trait]
pub trait EventBus: Send + Sync {
    /// Publishes an event. Never returns an error; after shutdown this is a
    /// silent no-op.
    async fn publish(&self, event: EventRef);

    /// Registers a subscriber that receives every event.
    fn add_universal(&self, subscriber: Arc<dyn Subscriber>);

    /// Registers a subscriber for events tagged `tag` or a descendant of it.
    fn add_typed(&self, tag: Tag, subscriber: Arc<dyn Subscriber>);
}

/// Runs one handler with fault isolation.
///
/// An `Err` or a panic is reported to the sink and contained; the caller
/// continues with the next delivery.
pub(crate) async fn deliver(subscriber: &dyn Subscriber, event: &EventRef, sink: &dyn ErrorSink) {
    match std::panic::AssertUnwindSafe(subscriber.handle(event))
        .catch_unwind()
        .await
    {
        Ok(Ok(())) => {}
        Ok(Err(error)) => sink.error(&format!(
            "subscriber '{}' failed: {error}",
            subscriber.name()
        )),
        Err(payload) => sink.error(&format!(
            "subscriber '{}' panicked: {}",
            subscriber.name(),
            panic_reason(payload.as_ref())
        )),
    }
}
