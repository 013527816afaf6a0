//! # Subscriber registry.
//!
//! Holds the two subscription collections shared by both buses and resolves
//! which subscribers match a published event.
//!
//! ## Dispatch order
//! For an event tagged `T`, [`SubscriberRegistry::matching`] returns:
//! 1. every universal subscriber, in registration order;
//! 2. subscribers registered for exactly `T`;
//! 3. subscribers for each strict ancestor of `T`, walking from the
//!    immediate parent up to and including [`ROOT`](crate::ROOT);
//! 4. subscribers for each interface tag `T` implements directly, in
//!    declaration order.
//!
//! A subscriber registered under several matching tags is invoked once per
//! matching subscription.
//!
//! ## Consistency
//! Reads dominate writes, so the collections sit behind one read-biased
//! lock. `matching` clones the relevant `Arc`s into an owned snapshot under
//! the read lock; a registration racing with a dispatch is either fully
//! visible to that dispatch or not at all, never partially.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::subscriber::Subscriber;
use crate::tag::Tag;

#[derive(Default)]
struct Subscriptions {
    universal: Vec<Arc<dyn Subscriber>>,
    typed: HashMap<Tag, Vec<Arc<dyn Subscriber>>>,
}

/// Append-only store of universal and typed subscriptions.
#[derive(Default)]
pub struct SubscriberRegistry {
    inner: RwLock<Subscriptions>,
}

impl SubscriberRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a subscriber that matches every event.
    pub fn add_universal(&self, subscriber: Arc<dyn Subscriber>) {
        self.inner.write().universal.push(subscriber);
    }

    /// Registers a subscriber for `tag` and its descendants.
    pub fn add_typed(&self, tag: Tag, subscriber: Arc<dyn Subscriber>) {
        self.inner
            .write()
            .typed
            .entry(tag)
            .or_default()
            .push(subscriber);
    }

    /// Snapshot of the subscribers matching `tag`, in dispatch order.
    pub fn matching(&self, tag: Tag) -> Vec<Arc<dyn Subscriber>> {
        let inner = self.inner.read();
        let mut matched: Vec<Arc<dyn Subscriber>> = Vec::with_capacity(inner.universal.len());
        matched.extend(inner.universal.iter().cloned());
        if let Some(exact) = inner.typed.get(&tag) {
            matched.extend(exact.iter().cloned());
        }
        for ancestor in tag.ancestors() {
            if let Some(inherited) = inner.typed.get(&ancestor) {
                matched.extend(inherited.iter().cloned());
            }
        }
        for interface in tag.implements() {
            if let Some(implementors) = inner.typed.get(&interface) {
                matched.extend(implementors.iter().cloned());
            }
        }
        matched
    }

    /// Number of universal subscribers.
    pub fn universal_count(&self) -> usize {
        self.inner.read().universal.len()
    }

    /// Number of subscribers registered for exactly `tag`.
    pub fn typed_count(&self, tag: Tag) -> usize {
        self.inner
            .read()
            .typed
            .get(&tag)
            .map_or(0, |subscribers| subscribers.len())
    }
}
