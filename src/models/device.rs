// Battery, GPU and sensor sample models

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatterySample {
    pub percentage: f64,
    pub health: String,
    pub cycle_count: u32,
    pub is_charging: bool,
    /// Watts; positive while charging, negative while discharging.
    pub charge_rate_watts: f64,
    /// Minutes to full while charging, minutes to empty otherwise.
    pub minutes_remaining: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GpuSample {
    pub utilization_percent: Option<f64>,
    pub frequency_mhz: Option<u64>,
    pub temperature: Option<f64>,
    /// Supplied by an external display-refresh sampler, merged by the
    /// aggregator.
    pub fps: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SensorReading {
    pub name: String,
    pub value: f64,
}

/// Empty lists mean the sensor subsystem answered but no key produced a
/// valid reading; total absence is reported by the capability probe.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SensorSample {
    pub temperatures: Vec<SensorReading>,
    pub fans: Vec<SensorReading>,
}
