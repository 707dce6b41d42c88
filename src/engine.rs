// Refresh engine: a single periodic scheduler drives every collector on one
// dedicated worker context.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::aggregator::{Aggregator, TickSamples};
use crate::collectors::{
    BatteryCollector, CpuCollector, DiskCollector, GpuCollector, MemoryCollector,
    NetworkCollector, SensorCollector,
};
use crate::smc::SmcClient;

pub const MIN_INTERVAL_SECS: f64 = 0.2;
pub const MAX_INTERVAL_SECS: f64 = 60.0;

pub fn clamp_interval(secs: f64) -> Duration {
    let secs = if secs.is_nan() {
        MIN_INTERVAL_SECS
    } else {
        secs.clamp(MIN_INTERVAL_SECS, MAX_INTERVAL_SECS)
    };
    Duration::from_secs_f64(secs)
}

/// One refresh pass over every collector. Implemented by [`Collectors`];
/// kept as a seam so the engine can be driven by test doubles.
pub trait Refresher: Send + 'static {
    fn refresh_all(&mut self) -> TickSamples;
}

/// The full collector set, refreshed in a fixed order each tick.
pub struct Collectors {
    cpu: CpuCollector,
    memory: MemoryCollector,
    disk: DiskCollector,
    network: NetworkCollector,
    gpu: GpuCollector,
    battery: BatteryCollector,
    sensors: SensorCollector,
}

impl Collectors {
    pub fn new(smc: SmcClient) -> Self {
        Self {
            cpu: CpuCollector::new(smc.clone()),
            memory: MemoryCollector::new(),
            disk: DiskCollector::new(),
            network: NetworkCollector::new(),
            gpu: GpuCollector::new(smc.clone()),
            battery: BatteryCollector::new(),
            sensors: SensorCollector::new(smc),
        }
    }
}

impl Refresher for Collectors {
    fn refresh_all(&mut self) -> TickSamples {
        TickSamples {
            cpu: Some(self.cpu.refresh()),
            memory: Some(self.memory.refresh()),
            disk: Some(self.disk.refresh()),
            network: Some(self.network.refresh()),
            gpu: self.gpu.refresh(),
            battery: self.battery.refresh(),
            sensors: self.sensors.refresh(),
        }
    }
}

/// Periodic scheduler. `start`/`stop` are idempotent; `set_interval` clamps
/// to [0.2, 60.0] seconds and reschedules in place while running. The next
/// tick never overlaps a still-running one: an overrunning pass delays the
/// following tick instead of queueing it.
pub struct RefreshEngine<R: Refresher> {
    collectors: Arc<Mutex<R>>,
    aggregator: Arc<Aggregator>,
    interval_tx: watch::Sender<Duration>,
    stats_log_interval: Duration,
    ticks_total: Arc<AtomicU64>,
    shutdown_tx: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl<R: Refresher> RefreshEngine<R> {
    pub fn new(
        collectors: R,
        aggregator: Arc<Aggregator>,
        interval_secs: f64,
        stats_log_interval_secs: u64,
    ) -> Self {
        let (interval_tx, _) = watch::channel(clamp_interval(interval_secs));
        Self {
            collectors: Arc::new(Mutex::new(collectors)),
            aggregator,
            interval_tx,
            stats_log_interval: Duration::from_secs(stats_log_interval_secs.max(1)),
            ticks_total: Arc::new(AtomicU64::new(0)),
            shutdown_tx: None,
            handle: None,
        }
    }

    /// Begins periodic ticking; a second call while running is a no-op.
    pub fn start(&mut self) {
        if self.is_running() {
            return;
        }
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel();
        self.shutdown_tx = Some(shutdown_tx);

        let collectors = self.collectors.clone();
        let aggregator = self.aggregator.clone();
        let mut interval_rx = self.interval_tx.subscribe();
        let ticks_total = self.ticks_total.clone();
        let stats_log_interval = self.stats_log_interval;

        self.handle = Some(tokio::spawn(async move {
            let mut tick = tokio::time::interval(*interval_rx.borrow());
            tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
            let mut stats_tick = tokio::time::interval(stats_log_interval);
            stats_tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = tick.tick() => {
                        // Awaiting the pass inline is the backpressure: the
                        // next tick cannot fire while this one is running.
                        let collectors = collectors.clone();
                        match tokio::task::spawn_blocking(move || {
                            collectors.lock().ok().map(|mut c| c.refresh_all())
                        })
                        .await
                        {
                            Ok(Some(samples)) => {
                                aggregator.publish_tick(samples);
                                ticks_total.fetch_add(1, Ordering::Relaxed);
                            }
                            Ok(None) => {
                                tracing::warn!(
                                    operation = "refresh_tick",
                                    "collector state lock poisoned"
                                );
                            }
                            Err(e) => {
                                tracing::warn!(
                                    error = %e,
                                    operation = "refresh_tick",
                                    "refresh task join failed"
                                );
                            }
                        }
                    }
                    changed = interval_rx.changed() => {
                        // The sender lives in the engine; a closed channel
                        // means the engine itself is gone.
                        if changed.is_err() {
                            break;
                        }
                        let next = *interval_rx.borrow();
                        tick = tokio::time::interval_at(
                            tokio::time::Instant::now() + next,
                            next,
                        );
                        tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
                        tracing::debug!(
                            interval_ms = next.as_millis() as u64,
                            operation = "set_interval",
                            "tick rescheduled"
                        );
                    }
                    _ = &mut shutdown_rx => {
                        tracing::debug!("Refresh engine shutting down");
                        break;
                    }
                    _ = stats_tick.tick() => {
                        tracing::info!(
                            ticks_total = ticks_total.load(Ordering::Relaxed),
                            subscribers = aggregator.subscriber_count(),
                            "app stats"
                        );
                    }
                }
            }
        }));
    }

    /// Clamps to [0.2, 60.0] seconds. When running, the schedule changes
    /// atomically without dropping the running state.
    pub fn set_interval(&self, secs: f64) {
        self.interval_tx.send_replace(clamp_interval(secs));
    }

    pub fn interval(&self) -> Duration {
        *self.interval_tx.borrow()
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    pub fn ticks_total(&self) -> u64 {
        self.ticks_total.load(Ordering::Relaxed)
    }

    /// Halts ticking; safe to call at any time and repeatedly. No in-flight
    /// pass is aborted: the current tick finishes, then no further ticks
    /// are scheduled.
    pub async fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take()
            && let Err(e) = handle.await
        {
            tracing::warn!(error = %e, operation = "engine_stop", "engine task join failed");
        }
    }
}
