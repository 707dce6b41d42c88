// Memory collector: page statistics, swap, pressure.

use crate::models::{MemorySample, PressureLevel};
use crate::probes::{self, SwapUsage, VmPages};

#[derive(Default)]
pub struct MemoryCollector;

impl MemoryCollector {
    pub fn new() -> Self {
        Self
    }

    pub fn refresh(&mut self) -> MemorySample {
        let pages = probes::vm_pages()
            .map_err(|e| {
                tracing::warn!(error = %e, operation = "vm_pages", "memory query failed");
            })
            .ok();
        let swap = probes::swap_usage()
            .map_err(|e| {
                tracing::warn!(error = %e, operation = "swap_usage", "swap query failed");
            })
            .ok();
        Self::compose(pages, swap)
    }

    /// A failed page query yields the all-zero sample at level normal
    /// (unknown, not alarming).
    pub fn compose(pages: Option<VmPages>, swap: Option<SwapUsage>) -> MemorySample {
        let Some(pages) = pages else {
            return MemorySample::default();
        };
        let swap = swap.unwrap_or_default();
        let used = pages.active + pages.inactive + pages.wired + pages.compressed;
        let total = used + pages.free;
        let usage_percent = if total > 0 {
            used as f64 / total as f64 * 100.0
        } else {
            0.0
        };
        // Swap counts toward pressure so the figure tracks system-level
        // demand, not just physical occupancy.
        let pressure_percent = if total > 0 {
            ((used + swap.used) as f64 / total as f64 * 100.0).min(100.0)
        } else {
            0.0
        };
        MemorySample {
            total,
            used,
            usage_percent,
            wired: pages.wired,
            compressed: pages.compressed,
            swap_used: swap.used,
            swap_total: swap.total,
            pressure_percent,
            pressure_level: pressure_level(pressure_percent),
        }
    }
}

pub fn pressure_level(pressure_percent: f64) -> PressureLevel {
    if pressure_percent < 60.0 {
        PressureLevel::Normal
    } else if pressure_percent < 80.0 {
        PressureLevel::Warning
    } else {
        PressureLevel::Critical
    }
}
