//! Shared fixtures: a small market-data tag hierarchy, events, counting and
//! misbehaving subscribers, and a capturing error sink.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use fluxgate::{ErrorSink, Event, EventRef, HandleError, Subscriber, Tag, TagInfo};

// ---- Tag hierarchy ----
//
//   event (root)
//   ├── base_market
//   │   └── market_data   (implements priced)
//   ├── trade             (implements priced)
//   ├── text
//   └── num

pub static PRICED: TagInfo = TagInfo::new("priced");
pub static BASE_MARKET: TagInfo = TagInfo::new("base_market");
pub static MARKET_DATA: TagInfo =
    TagInfo::child_of("market_data", &BASE_MARKET).implementing(&[&PRICED]);
pub static TRADE: TagInfo = TagInfo::new("trade").implementing(&[&PRICED]);
pub static TEXT: TagInfo = TagInfo::new("text");
pub static NUM: TagInfo = TagInfo::new("num");

// ---- Events ----

pub struct MarketData {
    pub symbol: &'static str,
    pub price: f64,
    pub volume: u64,
}

impl Event for MarketData {
    fn tag(&self) -> Tag {
        MARKET_DATA.tag()
    }
}

pub fn market_data(symbol: &'static str, price: f64, volume: u64) -> EventRef {
    Arc::new(MarketData {
        symbol,
        price,
        volume,
    })
}

pub struct Trade {
    pub trade_id: &'static str,
    pub symbol: &'static str,
    pub price: f64,
    pub quantity: u64,
    pub side: &'static str,
}

impl Event for Trade {
    fn tag(&self) -> Tag {
        TRADE.tag()
    }
}

pub fn trade(trade_id: &'static str, symbol: &'static str, price: f64, quantity: u64) -> EventRef {
    Arc::new(Trade {
        trade_id,
        symbol,
        price,
        quantity,
        side: "BUY",
    })
}

pub struct Text(pub &'static str);

impl Event for Text {
    fn tag(&self) -> Tag {
        TEXT.tag()
    }
}

pub fn text(value: &'static str) -> EventRef {
    Arc::new(Text(value))
}

pub struct Num(pub i64);

impl Event for Num {
    fn tag(&self) -> Tag {
        NUM.tag()
    }
}

pub fn num(value: i64) -> EventRef {
    Arc::new(Num(value))
}

// ---- Subscribers ----

/// Counts deliveries.
#[derive(Default)]
pub struct Counting {
    received: AtomicUsize,
}

impl Counting {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn count(&self) -> usize {
        self.received.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Subscriber for Counting {
    async fn handle(&self, _event: &EventRef) -> Result<(), HandleError> {
        self.received.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "counting"
    }
}

/// Records the price of every market-data delivery.
#[derive(Default)]
pub struct RecordingPrices {
    prices: Mutex<Vec<f64>>,
}

impl RecordingPrices {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn prices(&self) -> Vec<f64> {
        self.prices.lock().clone()
    }
}

#[async_trait]
impl Subscriber for RecordingPrices {
    async fn handle(&self, event: &EventRef) -> Result<(), HandleError> {
        if let Some(data) = event.downcast_ref::<MarketData>() {
            self.prices.lock().push(data.price);
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "recording_prices"
    }
}

/// Always returns an error.
pub struct Failing;

#[async_trait]
impl Subscriber for Failing {
    async fn handle(&self, _event: &EventRef) -> Result<(), HandleError> {
        Err(HandleError::new("boom"))
    }

    fn name(&self) -> &'static str {
        "failing"
    }
}

/// Always panics.
pub struct Panicking;

#[async_trait]
impl Subscriber for Panicking {
    async fn handle(&self, _event: &EventRef) -> Result<(), HandleError> {
        panic!("kaboom");
    }

    fn name(&self) -> &'static str {
        "panicking"
    }
}

// ---- Sink ----

/// Captures sink messages for assertions.
#[derive(Default)]
pub struct CaptureSink {
    messages: Mutex<Vec<String>>,
}

impl CaptureSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().clone()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.messages.lock().iter().any(|m| m.contains(needle))
    }
}

impl ErrorSink for CaptureSink {
    fn error(&self, message: &str) {
        self.messages.lock().push(message.to_string());
    }
}

// ---- Helpers ----

/// Polls `condition` until it holds, failing the test after five seconds.
pub async fn wait_until(condition: impl Fn() -> bool) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}
