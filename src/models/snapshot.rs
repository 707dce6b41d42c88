// Combined snapshot model

use serde::{Deserialize, Serialize};

use super::{
    BatterySample, CpuSample, DiskSample, GpuSample, MemorySample, NetworkSample, SensorSample,
};

/// One sample from each domain at a point in time. A domain is `None` until
/// its collector has produced a sample, or while its hardware is unavailable.
/// Immutable once published; subscribers receive clones.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricSnapshot {
    pub timestamp_ms: u64,
    pub cpu: Option<CpuSample>,
    pub memory: Option<MemorySample>,
    pub disk: Option<DiskSample>,
    pub gpu: Option<GpuSample>,
    pub network: Option<NetworkSample>,
    pub battery: Option<BatterySample>,
    pub sensors: Option<SensorSample>,
}
