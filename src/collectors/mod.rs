// Per-domain collectors. Each owns its private previous-sample state and
// exposes a single refresh() entry point driven by the engine.

mod battery;
mod cpu;
mod disk;
mod gpu;
mod memory;
mod network;
mod sensor;

pub use battery::{BatteryCollector, health_text};
pub use cpu::CpuCollector;
pub use disk::DiskCollector;
pub use gpu::GpuCollector;
pub use memory::{MemoryCollector, pressure_level};
pub use network::NetworkCollector;
pub use sensor::SensorCollector;
