//! # Asynchronous bus: queued dispatch with optional coalescing.
//!
//! ```text
//!   publish ──► [event queue] ──► drainer ──► worker ──► handle()
//!                                    │   └──► worker ──► handle()
//!                 coalescer ◄────────┘
//!            (latest per tag)
//! ```
//!
//! Publishers enqueue and return immediately. A single drainer task pops
//! entries in FIFO order and fans each one out to one worker task per
//! matching subscriber. The pool is elastic by default and capped by a
//! semaphore when [`BusConfig::workers`](crate::BusConfig) is non-zero.
//!
//! ## Coalescing
//! With `coalesce = true` the bus keeps at most one queue slot per event
//! tag. A publish overwrites `latest[tag]` and only enqueues when the tag
//! holds no slot yet; the drainer delivers whatever `latest[tag]` says at
//! drain time and releases the slot. Under a burst of same-tag publications
//! subscribers see the most recent value instead of the whole backlog.
//!
//! The `latest` map and the queued-tag set are one state machine behind one
//! mutex, which keeps the slot invariant (one slot per queued tag) exact.
//!
//! ## Ordering
//! Per-publisher order is preserved into the queue and through the drainer,
//! but workers run concurrently, so delivery order out of the pool is not
//! guaranteed. Subscribers needing strict order serialize internally.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use crate::bus::{deliver, EventBus};
use crate::config::BusConfig;
use crate::event::EventRef;
use crate::registry::SubscriberRegistry;
use crate::sink::{ErrorSink, LogSink};
use crate::subscriber::Subscriber;
use crate::tag::Tag;

/// Upper bound on joining the drainer task during shutdown.
const DRAINER_JOIN: Duration = Duration::from_secs(5);

#[derive(Clone)]
struct Entry {
    event: EventRef,
    at: Instant,
}

#[derive(Default)]
struct CoalesceSlots {
    latest: HashMap<Tag, Entry>,
    queued: HashSet<Tag>,
}

#[derive(Default)]
struct Coalescer {
    slots: Mutex<CoalesceSlots>,
}

/// Bus that dispatches from a queue onto a worker pool.
///
/// Must be created inside a Tokio runtime; construction spawns the drainer.
pub struct AsyncBus {
    registry: Arc<SubscriberRegistry>,
    sink: Arc<dyn ErrorSink>,
    tx: mpsc::UnboundedSender<Entry>,
    coalescer: Option<Arc<Coalescer>>,
    depth: Arc<AtomicUsize>,
    workers: TaskTracker,
    grace: Duration,
    token: CancellationToken,
    drainer: Mutex<Option<JoinHandle<()>>>,
    closed: AtomicBool,
}

impl AsyncBus {
    /// Creates a bus reporting handler faults through [`LogSink`].
    pub fn new(config: BusConfig) -> Self {
        Self::with_sink(config, Arc::new(LogSink))
    }

    /// Creates a bus with a custom error sink.
    pub fn with_sink(config: BusConfig, sink: Arc<dyn ErrorSink>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let registry = Arc::new(SubscriberRegistry::new());
        let coalescer = config.coalesce.then(|| Arc::new(Coalescer::default()));
        let depth = Arc::new(AtomicUsize::new(0));
        let workers = TaskTracker::new();
        let token = CancellationToken::new();

        let drainer = Drainer {
            rx,
            registry: Arc::clone(&registry),
            sink: Arc::clone(&sink),
            coalescer: coalescer.clone(),
            depth: Arc::clone(&depth),
            workers: workers.clone(),
            limiter: match config.workers {
                0 => None,
                bound => Some(Arc::new(Semaphore::new(bound))),
            },
            token: token.clone(),
        };
        let handle = tokio::spawn(drainer.run());

        Self {
            registry,
            sink,
            tx,
            coalescer,
            depth,
            workers,
            grace: config.grace,
            token,
            drainer: Mutex::new(Some(handle)),
            closed: AtomicBool::new(false),
        }
    }

    /// Stops the bus: the drainer exits, undrained events are discarded, and
    /// already-dispatched handlers get up to the configured grace period.
    ///
    /// Idempotent; later publishes are dropped silently.
    pub async fn shutdown(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        self.token.cancel();
        let handle = self.drainer.lock().take();
        if let Some(handle) = handle {
            if time::timeout(DRAINER_JOIN, handle).await.is_err() {
                self.sink.error("event drainer did not stop within 5s");
            }
        }
        self.workers.close();
        if time::timeout(self.grace, self.workers.wait()).await.is_err() {
            self.sink
                .error("subscriber workers still running after shutdown grace");
        }
    }

    /// Number of events waiting in the queue (monitoring only).
    pub fn queued_event_count(&self) -> usize {
        self.depth.load(Ordering::Relaxed)
    }

    /// Number of universal subscribers.
    pub fn universal_count(&self) -> usize {
        self.registry.universal_count()
    }

    /// Number of subscribers registered for exactly `tag`.
    pub fn typed_count(&self, tag: Tag) -> usize {
        self.registry.typed_count(tag)
    }

    fn enqueue(&self, entry: Entry) {
        if self.tx.send(entry).is_ok() {
            self.depth.fetch_add(1, Ordering::Relaxed);
        }
    }
}

#[async_trait]
impl EventBus for AsyncBus {
    async fn publish(&self, event: EventRef) {
        if self.closed.load(Ordering::Acquire) {
            return;
        }
        let entry = Entry {
            at: Instant::now(),
            event,
        };
        match &self.coalescer {
            Some(coalescer) => {
                let tag = entry.event.tag();
                let mut slots = coalescer.slots.lock();
                slots.latest.insert(tag, entry.clone());
                // Only the first publish for an unqueued tag takes a slot;
                // later ones just refreshed `latest`.
                if slots.queued.insert(tag) {
                    self.enqueue(entry);
                }
            }
            None => self.enqueue(entry),
        }
    }

    fn add_universal(&self, subscriber: Arc<dyn Subscriber>) {
        self.registry.add_universal(subscriber);
    }

    fn add_typed(&self, tag: Tag, subscriber: Arc<dyn Subscriber>) {
        self.registry.add_typed(tag, subscriber);
    }
}

struct Drainer {
    rx: mpsc::UnboundedReceiver<Entry>,
    registry: Arc<SubscriberRegistry>,
    sink: Arc<dyn ErrorSink>,
    coalescer: Option<Arc<Coalescer>>,
    depth: Arc<AtomicUsize>,
    workers: TaskTracker,
    limiter: Option<Arc<Semaphore>>,
    token: CancellationToken,
}

impl Drainer {
    async fn run(mut self) {
        loop {
            let entry = tokio::select! {
                _ = self.token.cancelled() => break,
                next = self.rx.recv() => match next {
                    Some(entry) => entry,
                    None => break,
                },
            };
            self.depth.fetch_sub(1, Ordering::Relaxed);
            let entry = self.resolve(entry);
            self.fan_out(entry).await;
        }
    }

    /// Swaps a coalesced slot for the freshest value and releases the slot.
    fn resolve(&self, entry: Entry) -> Entry {
        let Some(coalescer) = &self.coalescer else {
            return entry;
        };
        let tag = entry.event.tag();
        let mut slots = coalescer.slots.lock();
        slots.queued.remove(&tag);
        match slots.latest.remove(&tag) {
            Some(latest) if latest.at >= entry.at => latest,
            _ => entry,
        }
    }

    async fn fan_out(&self, entry: Entry) {
        for subscriber in self.registry.matching(entry.event.tag()) {
            let permit = match &self.limiter {
                Some(limiter) => match Arc::clone(limiter).acquire_owned().await {
                    Ok(permit) => Some(permit),
                    Err(_) => return,
                },
                None => None,
            };
            let event = entry.event.clone();
            let sink = Arc::clone(&self.sink);
            self.workers.spawn(async move {
                let _permit = permit;
                deliver(subscriber.as_ref(), &event, sink.as_ref()).await;
            });
        }
    }
}
