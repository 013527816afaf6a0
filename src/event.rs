//! # The event contract.
//!
//! An event is an opaque value with a [`Tag`]. The buses never inspect or
//! mutate event contents; they only resolve the tag to decide which
//! subscribers match. Events travel as [`EventRef`], an `Arc`, so fanning one
//! publication out to many workers is a pointer bump per delivery.

use std::any::Any;
use std::sync::Arc;

use crate::tag::Tag;

/// A value publishable on a bus.
///
/// Implementations are expected to be immutable once published; every
/// subscriber sees the same shared instance.
pub trait Event: Any + Send + Sync {
    /// The type tag used for subscription matching.
    fn tag(&self) -> Tag;
}

/// Shared handle to a published event.
pub type EventRef = Arc<dyn Event>;

impl dyn Event {
    /// Borrows the concrete event type back out of a trait object.
    ///
    /// Handlers that care about contents downcast; handlers that only count
    /// or forward never need to.
    pub fn downcast_ref<T: Event>(&self) -> Option<&T> {
        (self as &dyn Any).downcast_ref()
    }
}
