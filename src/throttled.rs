//! # Throttled bus adapter.
//!
//! [`ThrottledBus`] puts any [`EventBus`] behind a [`Throttler`]: a publish
//! is forwarded immediately when the throttler grants admission and buffered
//! otherwise. Buffered events drain in FIFO order as capacity returns.
//!
//! ```text
//!   publish ──► should_proceed? ──yes──► delegate.publish
//!                     │no
//!                     ▼
//!                 [pending] ◄─── drainer (wakeup callback + poll tick)
//! ```
//!
//! The adapter registers a wakeup callback with the throttler at
//! construction; the drainer also ticks every 100 ms so a missed wakeup
//! only delays delivery, never loses it. Each forwarded event is preceded
//! by exactly one successful admission poll, so rate accounting stays
//! exact. The one exception is shutdown, which flushes whatever is still
//! pending straight to the delegate: delivery wins over rate fidelity when
//! the adapter is going away.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time;
use tokio_util::sync::CancellationToken;

use crate::bus::EventBus;
use crate::event::EventRef;
use crate::subscriber::Subscriber;
use crate::tag::Tag;
use crate::throttler::{ThrottleCallback, ThrottleDecision, Throttler};

/// Fallback interval between drain attempts when no wakeup arrives.
const PENDING_POLL: Duration = Duration::from_millis(100);

/// Upper bound on joining the drainer task during shutdown.
const DRAINER_JOIN: Duration = Duration::from_secs(1);

/// Rate-limited front for another bus.
///
/// Must be created inside a Tokio runtime; construction spawns the drainer
/// and registers the wakeup callback.
pub struct ThrottledBus {
    delegate: Arc<dyn EventBus>,
    throttler: Arc<dyn Throttler>,
    pending: Mutex<VecDeque<EventRef>>,
    wakeup: Arc<Notify>,
    wake_callback: Mutex<Option<Arc<dyn ThrottleCallback>>>,
    running: AtomicBool,
    token: CancellationToken,
    drainer: Mutex<Option<JoinHandle<()>>>,
}

impl ThrottledBus {
    /// Wraps `delegate` behind `throttler`.
    pub fn new(delegate: Arc<dyn EventBus>, throttler: Arc<dyn Throttler>) -> Arc<Self> {
        let wakeup = Arc::new(Notify::new());
        let bus = Arc::new(Self {
            delegate,
            throttler,
            pending: Mutex::new(VecDeque::new()),
            wakeup: Arc::clone(&wakeup),
            wake_callback: Mutex::new(None),
            running: AtomicBool::new(true),
            token: CancellationToken::new(),
            drainer: Mutex::new(None),
        });

        let callback: Arc<dyn ThrottleCallback> = Arc::new(move || wakeup.notify_one());
        bus.throttler.notify_when_can_proceed(Arc::clone(&callback));
        *bus.wake_callback.lock() = Some(callback);

        let handle = tokio::spawn(Arc::clone(&bus).drain_loop());
        *bus.drainer.lock() = Some(handle);
        bus
    }

    /// Number of events buffered behind the throttler.
    pub fn pending_event_count(&self) -> usize {
        self.pending.lock().len()
    }

    /// Stops the adapter and flushes.
    ///
    /// The drainer is joined first; everything still pending is then
    /// forwarded directly to the delegate without consulting the throttler.
    /// Idempotent; later publishes are dropped silently.
    pub async fn shutdown(&self) {
        if !self.running.swap(false, Ordering::AcqRel) {
            return;
        }
        self.token.cancel();
        let handle = self.drainer.lock().take();
        if let Some(handle) = handle {
            let _ = time::timeout(DRAINER_JOIN, handle).await;
        }
        if let Some(callback) = self.wake_callback.lock().take() {
            self.throttler.remove_callback(&callback);
        }
        loop {
            let next = self.pending.lock().pop_front();
            match next {
                Some(event) => self.delegate.publish(event).await,
                None => break,
            }
        }
    }

    async fn drain_loop(self: Arc<Self>) {
        loop {
            tokio::select! {
                _ = self.token.cancelled() => break,
                _ = self.wakeup.notified() => {}
                _ = time::sleep(PENDING_POLL) => {}
            }
            self.flush_pending().await;
        }
    }

    /// Forwards pending events while the throttler keeps granting.
    ///
    /// Admission is polled before dequeuing, so a denied poll leaves the
    /// queue untouched and the deny itself re-arms the throttler's wakeup.
    async fn flush_pending(&self) {
        loop {
            if !self.running.load(Ordering::Acquire) {
                return;
            }
            let next = {
                let mut pending = self.pending.lock();
                if pending.is_empty() {
                    return;
                }
                if self.throttler.should_proceed() != ThrottleDecision::Proceed {
                    return;
                }
                pending.pop_front()
            };
            match next {
                Some(event) => self.delegate.publish(event).await,
                None => return,
            }
        }
    }
}

#[async_trait]
impl EventBus for ThrottledBus {
    async fn publish(&self, event: EventRef) {
        if !self.running.load(Ordering::Acquire) {
            return;
        }
        if self.throttler.should_proceed() == ThrottleDecision::Proceed {
            self.delegate.publish(event).await;
        } else {
            self.pending.lock().push_back(event);
        }
    }

    fn add_universal(&self, subscriber: Arc<dyn Subscriber>) {
        self.delegate.add_universal(subscriber);
    }

    fn add_typed(&self, tag: Tag, subscriber: Arc<dyn Subscriber>) {
        self.delegate.add_typed(tag, subscriber);
    }
}
