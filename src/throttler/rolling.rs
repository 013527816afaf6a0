//! # Rolling-window throttler.
//!
//! Admissions are timestamps in a FIFO. A poll evicts everything older than
//! the window from the head, then admits if fewer than `max_ops` remain.
//! The window rolls continuously; there is no bucket boundary to game.
//!
//! ```text
//!   should_proceed ──► evict expired ──► len < max_ops ? admit : deny
//!                                                           │
//!   callbacks ◄── scheduler task ◄───────── arm (CAS) ◄──────┘
//! ```
//!
//! One scheduler task per throttler handles push notifications: a denied
//! poll (or a callback registration while saturated) arms it, it sleeps
//! until the oldest admission expires, re-checks, and fires every registered
//! callback once capacity is really back. The arming flag is compare-and-set
//! so at most one wakeup is ever in flight.

use std::collections::VecDeque;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;

use crate::error::ConfigError;
use crate::sink::{panic_reason, ErrorSink, LogSink};
use crate::throttler::{ThrottleCallback, ThrottleDecision, Throttler};

/// Upper bound on joining the scheduler task during shutdown.
const SCHEDULER_JOIN: Duration = Duration::from_secs(1);

/// Throttler admitting at most `max_ops` operations per rolling `window`.
///
/// Must be created inside a Tokio runtime; construction spawns the
/// notification scheduler.
pub struct RollingWindowThrottler {
    max_ops: usize,
    window: Duration,
    admissions: Mutex<VecDeque<Instant>>,
    callbacks: Mutex<Vec<Arc<dyn ThrottleCallback>>>,
    notify_armed: AtomicBool,
    rearm: Notify,
    sink: Arc<dyn ErrorSink>,
    token: CancellationToken,
    scheduler: Mutex<Option<JoinHandle<()>>>,
    closed: AtomicBool,
}

impl RollingWindowThrottler {
    /// Creates a throttler reporting callback faults through [`LogSink`].
    ///
    /// Fails with [`ConfigError`] when `max_ops` is zero or `window` is
    /// zero.
    pub fn new(max_ops: usize, window: Duration) -> Result<Arc<Self>, ConfigError> {
        Self::with_sink(max_ops, window, Arc::new(LogSink))
    }

    /// Creates a throttler with a custom error sink.
    pub fn with_sink(
        max_ops: usize,
        window: Duration,
        sink: Arc<dyn ErrorSink>,
    ) -> Result<Arc<Self>, ConfigError> {
        if max_ops == 0 {
            return Err(ConfigError::InvalidMaxOps { value: max_ops });
        }
        if window.is_zero() {
            return Err(ConfigError::InvalidWindow { value: window });
        }

        let throttler = Arc::new(Self {
            max_ops,
            window,
            admissions: Mutex::new(VecDeque::new()),
            callbacks: Mutex::new(Vec::new()),
            notify_armed: AtomicBool::new(false),
            rearm: Notify::new(),
            sink,
            token: CancellationToken::new(),
            scheduler: Mutex::new(None),
            closed: AtomicBool::new(false),
        });
        let handle = tokio::spawn(Arc::clone(&throttler).scheduler_loop());
        *throttler.scheduler.lock() = Some(handle);
        Ok(throttler)
    }

    /// Stops the scheduler and denies all further admissions. Idempotent.
    pub async fn shutdown(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        self.token.cancel();
        let handle = self.scheduler.lock().take();
        if let Some(handle) = handle {
            if time::timeout(SCHEDULER_JOIN, handle).await.is_err() {
                self.sink.error("throttler scheduler did not stop within 1s");
            }
        }
    }

    /// Drops admissions older than the window from the head of the FIFO.
    ///
    /// An admission exactly `window` old is expired, so a caller blocked by
    /// the Nth admission is re-admitted once the full window has elapsed.
    fn evict(&self, admissions: &mut VecDeque<Instant>, now: Instant) {
        while let Some(&oldest) = admissions.front() {
            if now.duration_since(oldest) >= self.window {
                admissions.pop_front();
            } else {
                break;
            }
        }
    }

    fn capacity_available(&self) -> bool {
        let now = Instant::now();
        let mut admissions = self.admissions.lock();
        self.evict(&mut admissions, now);
        admissions.len() < self.max_ops
    }

    /// Requests a scheduler wakeup unless one is already in flight.
    fn arm(&self) {
        if self.callbacks.lock().is_empty() {
            return;
        }
        if self
            .notify_armed
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            self.rearm.notify_one();
        }
    }

    async fn scheduler_loop(self: Arc<Self>) {
        loop {
            tokio::select! {
                _ = self.token.cancelled() => break,
                _ = self.rearm.notified() => {}
            }
            loop {
                let delay = self.time_until_next_operation();
                if delay.is_zero() {
                    self.notify_armed.store(false, Ordering::Release);
                    self.fire_all();
                    break;
                }
                tokio::select! {
                    _ = self.token.cancelled() => return,
                    _ = time::sleep(delay) => {}
                }
            }
        }
    }

    fn fire_all(&self) {
        let callbacks = self.callbacks.lock().clone();
        for callback in callbacks {
            self.invoke(callback.as_ref());
        }
    }

    fn invoke(&self, callback: &dyn ThrottleCallback) {
        if let Err(payload) =
            std::panic::catch_unwind(AssertUnwindSafe(|| callback.on_can_proceed()))
        {
            self.sink.error(&format!(
                "throttle callback panicked: {}",
                panic_reason(payload.as_ref())
            ));
        }
    }
}

impl Throttler for RollingWindowThrottler {
    fn should_proceed(&self) -> ThrottleDecision {
        if self.closed.load(Ordering::Acquire) {
            return ThrottleDecision::DoNotProceed;
        }
        let now = Instant::now();
        let mut admissions = self.admissions.lock();
        self.evict(&mut admissions, now);
        if admissions.len() < self.max_ops {
            admissions.push_back(now);
            ThrottleDecision::Proceed
        } else {
            drop(admissions);
            self.arm();
            ThrottleDecision::DoNotProceed
        }
    }

    fn notify_when_can_proceed(&self, callback: Arc<dyn ThrottleCallback>) {
        if self.closed.load(Ordering::Acquire) {
            return;
        }
        self.callbacks.lock().push(Arc::clone(&callback));
        if self.capacity_available() {
            self.invoke(callback.as_ref());
        } else {
            self.arm();
        }
    }

    fn remove_callback(&self, callback: &Arc<dyn ThrottleCallback>) {
        let mut callbacks = self.callbacks.lock();
        if let Some(index) = callbacks
            .iter()
            .position(|registered| Arc::ptr_eq(registered, callback))
        {
            callbacks.remove(index);
        }
    }

    fn current_operation_count(&self) -> usize {
        let now = Instant::now();
        let mut admissions = self.admissions.lock();
        self.evict(&mut admissions, now);
        admissions.len()
    }

    fn time_until_next_operation(&self) -> Duration {
        let now = Instant::now();
        let mut admissions = self.admissions.lock();
        self.evict(&mut admissions, now);
        if admissions.len() < self.max_ops {
            return Duration::ZERO;
        }
        match admissions.front() {
            Some(&oldest) => self.window.saturating_sub(now.duration_since(oldest)),
            None => Duration::ZERO,
        }
    }
}
