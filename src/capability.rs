// Capability probe: why a metric domain is empty.

use serde::Serialize;

use crate::smc::SmcClient;

pub const NO_BATTERY_HINT: &str = "no battery";
pub const SENSORS_UNAVAILABLE_HINT: &str = "sensors unavailable";

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Capabilities {
    pub has_battery: bool,
    pub sensors_available: bool,
}

impl Capabilities {
    /// User-visible hints for the unavailable domains.
    pub fn hints(&self) -> Vec<&'static str> {
        let mut hints = Vec::new();
        if !self.has_battery {
            hints.push(NO_BATTERY_HINT);
        }
        if !self.sensors_available {
            hints.push(SENSORS_UNAVAILABLE_HINT);
        }
        hints
    }
}

/// Re-invokable; every call probes the hardware afresh.
pub fn probe(smc: &SmcClient) -> Capabilities {
    Capabilities {
        has_battery: battery_present(),
        sensors_available: smc.available(),
    }
}

fn battery_present() -> bool {
    let Ok(manager) = battery::Manager::new() else {
        return false;
    };
    let Ok(mut batteries) = manager.batteries() else {
        return false;
    };
    batteries.next().is_some_and(|b| b.is_ok())
}
