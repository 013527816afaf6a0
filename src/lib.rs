//! # fluxgate
//!
//! **Fluxgate** is an in-process event distribution and admission-control
//! core for latency-sensitive services.
//!
//! It answers two coupled questions: when a producer publishes a value,
//! which consumers receive it, in what order and on what task; and how a
//! rolling-window rate limit gates a stream of operations while waking
//! waiters the moment capacity returns.
//!
//! ## Features
//!
//! | Area            | Description                                                        | Key types / traits                          |
//! |-----------------|--------------------------------------------------------------------|---------------------------------------------|
//! | **Typed events**| Tag hierarchy with covariant subscriber matching.                  | [`Event`], [`Tag`], [`TagInfo`]             |
//! | **Sync bus**    | Dispatch inline in the publisher's task.                           | [`SyncBus`]                                 |
//! | **Async bus**   | Queued dispatch onto a worker pool, optional per-tag coalescing.   | [`AsyncBus`], [`BusConfig`]                 |
//! | **Throttling**  | Rolling-window admission with poll and push interfaces.            | [`Throttler`], [`RollingWindowThrottler`]   |
//! | **Composition** | Any bus behind a throttler, buffering while blocked.               | [`ThrottledBus`]                            |
//! | **Isolation**   | Handler faults logged through a pluggable sink, never propagated.  | [`Subscriber`], [`ErrorSink`]               |
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use async_trait::async_trait;
//! use fluxgate::{
//!     AsyncBus, BusConfig, Event, EventBus, EventRef, HandleError, RollingWindowThrottler,
//!     Subscriber, Tag, TagInfo, ThrottledBus,
//! };
//!
//! static TICK: TagInfo = TagInfo::new("tick");
//!
//! struct Tick {
//!     price: f64,
//! }
//!
//! impl Event for Tick {
//!     fn tag(&self) -> Tag {
//!         TICK.tag()
//!     }
//! }
//!
//! struct Printer;
//!
//! #[async_trait]
//! impl Subscriber for Printer {
//!     async fn handle(&self, event: &EventRef) -> Result<(), HandleError> {
//!         if let Some(tick) = event.downcast_ref::<Tick>() {
//!             println!("tick @ {}", tick.price);
//!         }
//!         Ok(())
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     // Coalescing bus: a burst of ticks collapses to the latest value.
//!     let bus = Arc::new(AsyncBus::new(BusConfig {
//!         coalesce: true,
//!         ..BusConfig::default()
//!     }));
//!     bus.add_typed(TICK.tag(), Arc::new(Printer));
//!
//!     // At most 100 publications per rolling second.
//!     let throttler = RollingWindowThrottler::new(100, Duration::from_secs(1))
//!         .expect("limits are positive");
//!     let throttled = ThrottledBus::new(bus.clone(), throttler);
//!
//!     throttled.publish(Arc::new(Tick { price: 101.25 })).await;
//!
//!     throttled.shutdown().await;
//!     bus.shutdown().await;
//! }
//! ```
//!
//! ---

mod bus;
mod config;
mod error;
mod event;
mod registry;
mod sink;
mod subscriber;
mod tag;
mod throttled;
mod throttler;

// ---- Public re-exports ----

pub use bus::{AsyncBus, EventBus, SyncBus};
pub use config::BusConfig;
pub use error::{ConfigError, HandleError};
pub use event::{Event, EventRef};
pub use registry::SubscriberRegistry;
pub use sink::{ErrorSink, LogSink};
pub use subscriber::Subscriber;
pub use tag::{Ancestors, Tag, TagInfo, ROOT};
pub use throttled::ThrottledBus;
pub use throttler::{RollingWindowThrottler, ThrottleCallback, ThrottleDecision, Throttler};
