//! # Synchronous bus: in-caller dispatch.
//!
//! [`SyncBus`] has no queue and no background tasks. `publish` resolves the
//! matching subscribers and awaits each handler inline, in dispatch order,
//! so the publisher observes completion of the whole chain. A failing
//! handler is logged and skipped; it never hides later subscribers.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use crate::bus::{deliver, EventBus};
use crate::event::EventRef;
use crate::registry::SubscriberRegistry;
use crate::sink::{ErrorSink, LogSink};
use crate::subscriber::Subscriber;
use crate::tag::Tag;

/// Bus that runs handlers in the publisher's own task.
pub struct SyncBus {
    registry: SubscriberRegistry,
    sink: Arc<dyn ErrorSink>,
    closed: AtomicBool,
}

impl SyncBus {
    /// Creates a bus reporting handler faults through [`LogSink`].
    pub fn new() -> Self {
        Self::with_sink(Arc::new(LogSink))
    }

    /// Creates a bus with a custom error sink.
    pub fn with_sink(sink: Arc<dyn ErrorSink>) -> Self {
        Self {
            registry: SubscriberRegistry::new(),
            sink,
            closed: AtomicBool::new(false),
        }
    }

    /// Stops the bus. Idempotent; later publishes are dropped silently.
    pub fn shutdown(&self) {
        self.closed.store(true, Ordering::Release);
    }

    /// Number of universal subscribers.
    pub fn universal_count(&self) -> usize {
        self.registry.universal_count()
    }

    /// Number of subscribers registered for exactly `tag`.
    pub fn typed_count(&self, tag: Tag) -> usize {
        self.registry.typed_count(tag)
    }
}

impl Default for SyncBus {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventBus for SyncBus {
    async fn publish(&self, event: EventRef) {
        if self.closed.load(Ordering::Acquire) {
            return;
        }
        for subscriber in self.registry.matching(event.tag()) {
            deliver(subscriber.as_ref(), &event, self.sink.as_ref()).await;
        }
    }

    fn add_universal(&self, subscriber: Arc<dyn Subscriber>) {
        self.registry.add_universal(subscriber);
    }

    fn add_typed(&self, tag: Tag, subscriber: Arc<dyn Subscriber>) {
        self.registry.add_typed(tag, subscriber);
    }
}
