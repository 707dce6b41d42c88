// Known sensor keys and their display names.

use super::proto::Encoding;

#[derive(Debug, Clone, Copy)]
pub struct SensorKey {
    pub code: &'static str,
    pub name: &'static str,
    pub encoding: Encoding,
}

const fn thermal(code: &'static str, name: &'static str) -> SensorKey {
    SensorKey {
        code,
        name,
        encoding: Encoding::Sp78,
    }
}

const fn fan(code: &'static str, name: &'static str) -> SensorKey {
    SensorKey {
        code,
        name,
        encoding: Encoding::Fpe2,
    }
}

pub const THERMAL_KEYS: &[SensorKey] = &[
    thermal("TC0P", "CPU package"),
    thermal("TC0D", "CPU diode"),
    thermal("TG0P", "GPU"),
    thermal("TG0D", "GPU diode"),
    thermal("TB0T", "Battery"),
    thermal("Tm0P", "Memory"),
    thermal("TN0P", "Northbridge"),
];

pub const FAN_KEYS: &[SensorKey] = &[
    fan("F0Ac", "Fan 0"),
    fan("F0Mn", "Fan 0 min"),
    fan("F1Ac", "Fan 1"),
    fan("F1Mn", "Fan 1 min"),
];

/// Ordered candidates for the CPU package temperature.
pub const CPU_TEMP_KEYS: &[&str] = &["TC0P", "TC0D"];

/// Ordered candidates for the GPU temperature.
pub const GPU_TEMP_KEYS: &[&str] = &["TG0P", "TG0D"];
