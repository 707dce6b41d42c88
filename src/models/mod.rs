// Domain models published to subscribers

mod device;
mod network;
mod snapshot;
mod storage;
mod system;

pub use device::{BatterySample, GpuSample, SensorReading, SensorSample};
pub use network::{InterfaceRate, NetworkSample};
pub use snapshot::MetricSnapshot;
pub use storage::DiskSample;
pub use system::{CpuSample, MemorySample, PressureLevel};
