// Disk sample model

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiskSample {
    pub total: u64,
    pub used: u64,
    pub usage_percent: f64,
    /// Throughput over the last tick; zero on the first tick after (re)start.
    pub read_bytes_per_sec: f64,
    pub write_bytes_per_sec: f64,
}
