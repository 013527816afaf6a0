mod common;

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use fluxgate::{EventBus, RollingWindowThrottler, SyncBus, ThrottledBus};

use common::{market_data, text, wait_until, Counting, RecordingPrices};

#[tokio::test(start_paused = true)]
async fn high_volume_is_paced_by_the_rolling_window() {
    let delegate = Arc::new(SyncBus::new());
    let counter = Counting::new();
    delegate.add_universal(counter.clone());

    let throttler = RollingWindowThrottler::new(10, Duration::from_secs(1)).expect("valid");
    let bus = ThrottledBus::new(delegate, Arc::clone(&throttler) as Arc<dyn fluxgate::Throttler>);

    let started = Instant::now();
    for i in 0..50 {
        bus.publish(market_data("AAPL", 150.0 + f64::from(i), 1000))
            .await;
    }

    wait_until(|| counter.count() == 50).await;

    // Ten per window: batches land at 0s, 1s, 2s, 3s, and 4s.
    assert!(started.elapsed() >= Duration::from_millis(4000));
    assert_eq!(bus.pending_event_count(), 0);
    bus.shutdown().await;
    throttler.shutdown().await;
}

#[tokio::test]
async fn publishes_forward_directly_while_capacity_lasts() {
    let delegate = Arc::new(SyncBus::new());
    let counter = Counting::new();
    delegate.add_universal(counter.clone());

    let throttler = RollingWindowThrottler::new(10, Duration::from_secs(1)).expect("valid");
    let bus = ThrottledBus::new(delegate, throttler);

    bus.publish(text("one")).await;
    bus.publish(text("two")).await;
    bus.publish(text("three")).await;

    // Forwarded inline; nothing buffered, nothing to wait for.
    assert_eq!(counter.count(), 3);
    assert_eq!(bus.pending_event_count(), 0);
    bus.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn blocked_publishes_buffer_and_drain_in_order() {
    let delegate = Arc::new(SyncBus::new());
    let recording = RecordingPrices::new();
    delegate.add_universal(recording.clone());

    let throttler = RollingWindowThrottler::new(1, Duration::from_millis(100)).expect("valid");
    let bus = ThrottledBus::new(delegate, throttler);

    for i in 0..5 {
        bus.publish(market_data("AAPL", f64::from(i), 1000)).await;
    }
    assert_eq!(bus.pending_event_count(), 4);

    wait_until(|| recording.prices().len() == 5).await;
    assert_eq!(recording.prices(), vec![0.0, 1.0, 2.0, 3.0, 4.0]);
    bus.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn shutdown_flushes_pending_without_rate_limits() {
    let delegate = Arc::new(SyncBus::new());
    let counter = Counting::new();
    delegate.add_universal(counter.clone());

    let throttler = RollingWindowThrottler::new(1, Duration::from_secs(60)).expect("valid");
    let bus = ThrottledBus::new(delegate, throttler);

    for i in 0..5 {
        bus.publish(market_data("AAPL", f64::from(i), 1000)).await;
    }
    assert_eq!(counter.count(), 1);
    assert_eq!(bus.pending_event_count(), 4);

    bus.shutdown().await;

    assert_eq!(counter.count(), 5);
    assert_eq!(bus.pending_event_count(), 0);

    bus.publish(text("dropped")).await;
    assert_eq!(counter.count(), 5);
}

#[tokio::test(start_paused = true)]
async fn shutdown_is_idempotent() {
    let delegate = Arc::new(SyncBus::new());
    let throttler = RollingWindowThrottler::new(1, Duration::from_secs(1)).expect("valid");
    let bus = ThrottledBus::new(delegate, throttler);

    bus.shutdown().await;
    bus.shutdown().await;
    assert_eq!(bus.pending_event_count(), 0);
}
