// CPU and memory sample models

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CpuSample {
    pub usage_percent: f64,
    pub user_percent: f64,
    pub system_percent: f64,
    /// One entry per core. Empty on the very first sample, when no previous
    /// tick exists to delta against.
    pub per_core_usage: Vec<f64>,
    pub performance_usage_percent: f64,
    pub efficiency_usage_percent: f64,
    pub core_count: u32,
    /// Zero on topologies with a single performance level.
    pub performance_core_count: u32,
    pub efficiency_core_count: u32,
    pub frequency_mhz: u64,
    pub temperature: Option<f64>,
}

/// Memory pressure bands over (used + swap) / total.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PressureLevel {
    #[default]
    Normal,
    Warning,
    Critical,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemorySample {
    pub total: u64,
    pub used: u64,
    pub usage_percent: f64,
    pub wired: u64,
    pub compressed: u64,
    pub swap_used: u64,
    pub swap_total: u64,
    pub pressure_percent: f64,
    pub pressure_level: PressureLevel,
}
