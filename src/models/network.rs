// Network sample models

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterfaceRate {
    pub name: String,
    pub received_bytes_per_sec: f64,
    pub transmitted_bytes_per_sec: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkSample {
    /// Sum of the per-interface rates for the same tick.
    pub received_bytes_per_sec: f64,
    pub transmitted_bytes_per_sec: f64,
    pub interfaces: Vec<InterfaceRate>,
    /// Last successful round-trip time; refreshed on the ping worker's own
    /// cadence and carried across refresh ticks.
    pub ping_ms: Option<f64>,
    pub public_address: Option<String>,
}
