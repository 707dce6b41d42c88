// Latest-value aggregation and snapshot publication.

use std::sync::Mutex;
use std::time::Instant;
use tokio::sync::broadcast;
use tokio::time::Duration;

use crate::history::SampleWindow;
use crate::models::{
    BatterySample, CpuSample, DiskSample, GpuSample, MemorySample, MetricSnapshot, NetworkSample,
    SensorSample,
};

/// Rate limit for the "no receivers" note (avoid logging it every tick when
/// nothing is subscribed).
const NO_RECEIVERS_NOTE_INTERVAL: Duration = Duration::from_secs(60);

/// One tick's output from the full collector pass.
#[derive(Debug, Clone, Default)]
pub struct TickSamples {
    pub cpu: Option<CpuSample>,
    pub memory: Option<MemorySample>,
    pub disk: Option<DiskSample>,
    pub gpu: Option<GpuSample>,
    pub network: Option<NetworkSample>,
    pub battery: Option<BatterySample>,
    pub sensors: Option<SensorSample>,
}

#[derive(Default)]
struct Latest {
    cpu: Option<CpuSample>,
    memory: Option<MemorySample>,
    disk: Option<DiskSample>,
    gpu: Option<GpuSample>,
    network: Option<NetworkSample>,
    battery: Option<BatterySample>,
    sensors: Option<SensorSample>,
    // Refreshed on their own cadence, carried across refresh ticks.
    ping_ms: Option<f64>,
    public_address: Option<String>,
    fps: Option<f64>,
}

/// Holds the latest sample from every collector and republishes a combined
/// snapshot whenever any of them changes. Snapshots are immutable;
/// subscribers receive clones in publication order.
pub struct Aggregator {
    latest: Mutex<Latest>,
    window: Mutex<SampleWindow<MetricSnapshot>>,
    tx: broadcast::Sender<MetricSnapshot>,
    last_no_receivers_note: Mutex<Option<Instant>>,
}

impl Aggregator {
    pub fn new(broadcast_capacity: usize, history_capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(broadcast_capacity.max(1));
        Self {
            latest: Mutex::new(Latest::default()),
            window: Mutex::new(SampleWindow::new(history_capacity)),
            tx,
            last_no_receivers_note: Mutex::new(None),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<MetricSnapshot> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// One self-consistent snapshot per completed tick.
    pub fn publish_tick(&self, samples: TickSamples) {
        let snapshot = {
            let Ok(mut latest) = self.latest.lock() else {
                return;
            };
            latest.cpu = samples.cpu;
            latest.memory = samples.memory;
            latest.disk = samples.disk;
            latest.gpu = samples.gpu;
            latest.network = samples.network;
            latest.battery = samples.battery;
            latest.sensors = samples.sensors;
            assemble(&latest)
        };
        self.publish(snapshot);
    }

    /// Replaces only the ping field of the current aggregate sample. Callers
    /// skip this entirely on probe failure, so a stale reading persists
    /// until the next successful probe.
    pub fn merge_ping(&self, rtt_ms: f64) {
        self.merge(|latest| latest.ping_ms = Some(rtt_ms));
    }

    pub fn merge_public_address(&self, address: String) {
        self.merge(|latest| latest.public_address = Some(address));
    }

    /// FPS is produced by the external display-refresh sampler.
    pub fn merge_fps(&self, fps: f64) {
        self.merge(|latest| latest.fps = Some(fps));
    }

    /// Combined snapshot of the current latest values, without publishing.
    pub fn latest(&self) -> MetricSnapshot {
        self.latest
            .lock()
            .map(|latest| assemble(&latest))
            .unwrap_or_default()
    }

    /// The retained sample window, oldest to newest.
    pub fn recent(&self) -> Vec<MetricSnapshot> {
        self.window.lock().map(|w| w.values()).unwrap_or_default()
    }

    fn merge(&self, update: impl FnOnce(&mut Latest)) {
        let snapshot = {
            let Ok(mut latest) = self.latest.lock() else {
                return;
            };
            update(&mut latest);
            assemble(&latest)
        };
        self.publish(snapshot);
    }

    fn publish(&self, snapshot: MetricSnapshot) {
        if let Ok(mut window) = self.window.lock() {
            window.push(snapshot.clone());
        }
        if self.tx.send(snapshot).is_err()
            && let Ok(mut last) = self.last_no_receivers_note.lock()
        {
            let should_note = last.is_none_or(|at| at.elapsed() >= NO_RECEIVERS_NOTE_INTERVAL);
            if should_note {
                tracing::debug!(
                    operation = "publish_snapshot",
                    "no subscribers; snapshot dropped from broadcast"
                );
                *last = Some(Instant::now());
            }
        }
    }
}

fn assemble(latest: &Latest) -> MetricSnapshot {
    let mut network = latest.network.clone();
    if let Some(net) = network.as_mut() {
        net.ping_ms = latest.ping_ms;
        net.public_address = latest.public_address.clone();
    }
    let mut gpu = latest.gpu.clone();
    if let Some(gpu) = gpu.as_mut() {
        gpu.fps = latest.fps;
    }
    MetricSnapshot {
        timestamp_ms: now_ms(),
        cpu: latest.cpu.clone(),
        memory: latest.memory.clone(),
        disk: latest.disk.clone(),
        gpu,
        network,
        battery: latest.battery.clone(),
        sensors: latest.sensors.clone(),
    }
}

fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_else(|e| {
            tracing::warn!(error = %e, operation = "get_timestamp", "system time error");
            0
        })
}
