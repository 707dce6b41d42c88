// Refresh engine tests: ticking, backpressure, idempotent start/stop

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use sysmetrics::aggregator::{Aggregator, TickSamples};
use sysmetrics::engine::{MAX_INTERVAL_SECS, MIN_INTERVAL_SECS, Refresher, RefreshEngine, clamp_interval};
use sysmetrics::models::CpuSample;

struct CountingRefresher {
    refreshes: Arc<AtomicU64>,
    busy_for: Duration,
    in_flight: Arc<AtomicBool>,
    overlaps: Arc<AtomicU64>,
}

impl CountingRefresher {
    fn new(busy_for: Duration) -> Self {
        Self {
            refreshes: Arc::new(AtomicU64::new(0)),
            busy_for,
            in_flight: Arc::new(AtomicBool::new(false)),
            overlaps: Arc::new(AtomicU64::new(0)),
        }
    }
}

impl Refresher for CountingRefresher {
    fn refresh_all(&mut self) -> TickSamples {
        if self.in_flight.swap(true, Ordering::SeqCst) {
            self.overlaps.fetch_add(1, Ordering::SeqCst);
        }
        if !self.busy_for.is_zero() {
            std::thread::sleep(self.busy_for);
        }
        let n = self.refreshes.fetch_add(1, Ordering::SeqCst) + 1;
        self.in_flight.store(false, Ordering::SeqCst);
        TickSamples {
            cpu: Some(CpuSample {
                usage_percent: n as f64,
                ..Default::default()
            }),
            ..Default::default()
        }
    }
}

#[test]
fn test_clamp_interval_bounds() {
    assert_eq!(clamp_interval(1.0), Duration::from_secs(1));
    assert_eq!(clamp_interval(0.05), Duration::from_secs_f64(MIN_INTERVAL_SECS));
    assert_eq!(clamp_interval(1000.0), Duration::from_secs_f64(MAX_INTERVAL_SECS));
    assert_eq!(clamp_interval(f64::NAN), Duration::from_secs_f64(MIN_INTERVAL_SECS));
    assert_eq!(
        clamp_interval(f64::INFINITY),
        Duration::from_secs_f64(MAX_INTERVAL_SECS)
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn test_engine_ticks_and_publishes_snapshots() {
    let aggregator = Arc::new(Aggregator::new(16, 16));
    let mut rx = aggregator.subscribe();
    let refresher = CountingRefresher::new(Duration::ZERO);
    let refreshes = refresher.refreshes.clone();

    let mut engine = RefreshEngine::new(refresher, aggregator.clone(), 0.2, 3600);
    engine.start();
    assert!(engine.is_running());

    let first = tokio::time::timeout(Duration::from_secs(2), rx.recv())
        .await
        .expect("first snapshot in time")
        .expect("channel open");
    assert_eq!(first.cpu.as_ref().map(|c| c.usage_percent), Some(1.0));

    let second = tokio::time::timeout(Duration::from_secs(2), rx.recv())
        .await
        .expect("second snapshot in time")
        .expect("channel open");
    assert_eq!(second.cpu.as_ref().map(|c| c.usage_percent), Some(2.0));

    engine.stop().await;
    assert!(!engine.is_running());
    assert!(refreshes.load(Ordering::SeqCst) >= 2);
    assert!(engine.ticks_total() >= 2);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_engine_overrunning_tick_never_overlaps() {
    let aggregator = Arc::new(Aggregator::new(16, 16));
    // each pass takes longer than the minimum interval
    let refresher = CountingRefresher::new(Duration::from_millis(350));
    let refreshes = refresher.refreshes.clone();
    let overlaps = refresher.overlaps.clone();

    let mut engine = RefreshEngine::new(refresher, aggregator, 0.2, 3600);
    engine.start();
    tokio::time::sleep(Duration::from_millis(1200)).await;
    engine.stop().await;

    assert!(refreshes.load(Ordering::SeqCst) >= 2, "engine should keep ticking");
    assert_eq!(overlaps.load(Ordering::SeqCst), 0, "ticks must never run in parallel");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_engine_start_is_idempotent() {
    let aggregator = Arc::new(Aggregator::new(16, 16));
    let mut engine = RefreshEngine::new(
        CountingRefresher::new(Duration::ZERO),
        aggregator,
        0.2,
        3600,
    );
    engine.start();
    engine.start();
    assert!(engine.is_running());
    engine.stop().await;
    assert!(!engine.is_running());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_engine_stop_is_idempotent_and_restartable() {
    let aggregator = Arc::new(Aggregator::new(16, 16));
    let mut engine = RefreshEngine::new(
        CountingRefresher::new(Duration::ZERO),
        aggregator.clone(),
        0.2,
        3600,
    );
    engine.stop().await;
    engine.start();
    engine.stop().await;
    engine.stop().await;
    assert!(!engine.is_running());

    let mut rx = aggregator.subscribe();
    engine.start();
    let snapshot = tokio::time::timeout(Duration::from_secs(2), rx.recv())
        .await
        .expect("snapshot after restart")
        .expect("channel open");
    assert!(snapshot.cpu.is_some());
    engine.stop().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_engine_set_interval_clamps_and_reschedules_while_running() {
    let aggregator = Arc::new(Aggregator::new(16, 16));
    let mut engine = RefreshEngine::new(
        CountingRefresher::new(Duration::ZERO),
        aggregator.clone(),
        30.0,
        3600,
    );
    assert_eq!(engine.interval(), Duration::from_secs(30));

    engine.set_interval(1000.0);
    assert_eq!(engine.interval(), Duration::from_secs_f64(MAX_INTERVAL_SECS));
    engine.set_interval(0.01);
    assert_eq!(engine.interval(), Duration::from_secs_f64(MIN_INTERVAL_SECS));

    // reschedule from a long interval to a short one while running; the
    // engine must pick up the new cadence without being restarted
    engine.set_interval(60.0);
    let mut rx = aggregator.subscribe();
    engine.start();
    // consume the immediate startup tick
    let _ = tokio::time::timeout(Duration::from_secs(2), rx.recv())
        .await
        .expect("startup snapshot")
        .expect("channel open");
    engine.set_interval(0.2);
    let rescheduled = tokio::time::timeout(Duration::from_secs(2), rx.recv()).await;
    assert!(rescheduled.is_ok(), "tick should fire on the new schedule");
    assert!(engine.is_running());
    engine.stop().await;
}
