// CPU collector: per-core tick deltas, performance/efficiency groups.

use crate::models::CpuSample;
use crate::probes::{self, CoreTicks, CoreTopology, FrequencyProbe};
use crate::smc::{SmcClient, keys, proto::Encoding};

pub struct CpuCollector {
    prev: Option<Vec<CoreTicks>>,
    topology: CoreTopology,
    frequency: FrequencyProbe,
    smc: SmcClient,
}

impl CpuCollector {
    pub fn new(smc: SmcClient) -> Self {
        Self::with_topology(smc, probes::core_topology())
    }

    /// Constructor with a fixed topology instead of the probed one.
    pub fn with_topology(smc: SmcClient, topology: CoreTopology) -> Self {
        Self {
            prev: None,
            topology,
            frequency: FrequencyProbe::new(),
            smc,
        }
    }

    pub fn refresh(&mut self) -> CpuSample {
        let ticks = match probes::cpu_ticks() {
            Ok(t) => Some(t),
            Err(e) => {
                tracing::warn!(error = %e, operation = "cpu_ticks", "tick counter query failed");
                None
            }
        };
        let frequency_mhz = self.frequency.nominal_mhz();
        let temperature = self.smc.read_first(keys::CPU_TEMP_KEYS, Encoding::Sp78);
        self.ingest(ticks, frequency_mhz, temperature)
    }

    /// State transition for one tick's raw readings. A failed tick query
    /// (`None`) degrades usage to zero but keeps topology, frequency and
    /// temperature valid.
    pub fn ingest(
        &mut self,
        ticks: Option<Vec<CoreTicks>>,
        frequency_mhz: u64,
        temperature: Option<f64>,
    ) -> CpuSample {
        let mut sample = CpuSample {
            performance_core_count: self.topology.performance,
            efficiency_core_count: self.topology.efficiency,
            frequency_mhz,
            temperature,
            ..Default::default()
        };

        let Some(current) = ticks else {
            sample.core_count = self.prev.as_ref().map(|p| p.len() as u32).unwrap_or(0);
            return sample;
        };
        sample.core_count = current.len() as u32;

        let first_sample = self.prev.is_none();
        let core_values: Vec<f64>;
        match self.prev.as_ref() {
            Some(prev) if prev.len() == current.len() => {
                core_values = prev
                    .iter()
                    .zip(current.iter())
                    .map(|(p, c)| delta_usage(p, c))
                    .collect();
                let used: u64 = sum_delta(prev, &current, CoreTicks::used);
                let total: u64 = used + sum_delta(prev, &current, |t| t.idle);
                sample.usage_percent = ratio_percent(used, total);
                sample.user_percent =
                    ratio_percent(sum_delta(prev, &current, |t| t.user + t.nice), total);
                sample.system_percent =
                    ratio_percent(sum_delta(prev, &current, |t| t.system), total);
            }
            _ => {
                // No baseline, or the topology changed under us: fall back
                // to an instantaneous used/total snapshot per core.
                core_values = current.iter().map(snapshot_usage).collect();
                let used: u64 = current.iter().map(CoreTicks::used).sum();
                let total: u64 = current.iter().map(CoreTicks::total).sum();
                sample.usage_percent = ratio_percent(used, total);
                sample.user_percent =
                    ratio_percent(current.iter().map(|t| t.user + t.nice).sum(), total);
                sample.system_percent =
                    ratio_percent(current.iter().map(|t| t.system).sum(), total);
            }
        }

        let (perf, eff) = group_usage(&core_values, self.topology);
        sample.performance_usage_percent = perf;
        sample.efficiency_usage_percent = eff;
        // No previous tick to delta against: the per-core list stays empty.
        if !first_sample {
            sample.per_core_usage = core_values;
        }
        self.prev = Some(current);
        sample
    }
}

fn sum_delta(prev: &[CoreTicks], current: &[CoreTicks], field: impl Fn(&CoreTicks) -> u64) -> u64 {
    prev.iter()
        .zip(current.iter())
        .map(|(p, c)| field(c).saturating_sub(field(p)))
        .sum()
}

fn delta_usage(prev: &CoreTicks, current: &CoreTicks) -> f64 {
    let used = current.used().saturating_sub(prev.used());
    let total = used + current.idle.saturating_sub(prev.idle);
    ratio_percent(used, total)
}

fn snapshot_usage(ticks: &CoreTicks) -> f64 {
    ratio_percent(ticks.used(), ticks.total())
}

fn ratio_percent(used: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (used as f64 / total as f64 * 100.0).clamp(0.0, 100.0)
}

/// Mean usage of the `[0, P)` performance and `[P, P+E)` efficiency core
/// groups; zeros when the topology has a single performance level.
fn group_usage(core_values: &[f64], topology: CoreTopology) -> (f64, f64) {
    let p = topology.performance as usize;
    let e = topology.efficiency as usize;
    if p == 0 || core_values.len() < p + e {
        return (0.0, 0.0);
    }
    (mean(&core_values[..p]), mean(&core_values[p..p + e]))
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}
