// Disk collector: root volume space plus clamped cumulative I/O deltas.

use std::time::Instant;

use crate::models::DiskSample;
use crate::probes::{self, DiskIoTotals, VolumeProbe};

pub struct DiskCollector {
    volume: VolumeProbe,
    prev: Option<(DiskIoTotals, Instant)>,
}

impl Default for DiskCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl DiskCollector {
    pub fn new() -> Self {
        Self {
            volume: VolumeProbe::new(),
            prev: None,
        }
    }

    pub fn refresh(&mut self) -> DiskSample {
        let space = self.volume.root_space();
        let io = match probes::disk_io_totals() {
            Ok(io) => Some(io),
            Err(e) => {
                tracing::warn!(error = %e, operation = "disk_io_totals", "I/O counter query failed");
                None
            }
        };

        let now = Instant::now();
        let (read_bps, write_bps) = match (&self.prev, &io) {
            (Some((prev, at)), Some(current)) => {
                Self::rates(prev, current, now.duration_since(*at).as_secs_f64())
            }
            // First tick after (re)start: no baseline yet.
            _ => (0.0, 0.0),
        };
        if let Some(io) = io {
            self.prev = Some((io, now));
        }

        let (total, available) = space.map(|s| (s.total, s.available)).unwrap_or((0, 0));
        let used = total.saturating_sub(available);
        DiskSample {
            total,
            used,
            usage_percent: if total > 0 {
                used as f64 / total as f64 * 100.0
            } else {
                0.0
            },
            read_bytes_per_sec: read_bps,
            write_bytes_per_sec: write_bps,
        }
    }

    /// Counters are not assumed monotonic across device hot-plug: a
    /// decrease clamps to a zero delta, never negative or wrapped.
    pub fn rates(prev: &DiskIoTotals, current: &DiskIoTotals, elapsed_secs: f64) -> (f64, f64) {
        if elapsed_secs <= 0.0 {
            return (0.0, 0.0);
        }
        (
            current.read_bytes.saturating_sub(prev.read_bytes) as f64 / elapsed_secs,
            current.write_bytes.saturating_sub(prev.write_bytes) as f64 / elapsed_secs,
        )
    }
}
