// Sensor collector: thermal and fan read groups over the service protocol.

use crate::models::{SensorReading, SensorSample};
use crate::smc::{SmcClient, SmcError, keys};

pub struct SensorCollector {
    smc: SmcClient,
}

impl SensorCollector {
    pub fn new(smc: SmcClient) -> Self {
        Self { smc }
    }

    /// `None` when the service is unreachable for both groups; empty lists
    /// when it answered but no key produced a valid reading.
    pub fn refresh(&mut self) -> Option<SensorSample> {
        let temperatures = self.smc.read_group(keys::THERMAL_KEYS);
        let fans = self.smc.read_group(keys::FAN_KEYS);
        if let (Err(e), Err(_)) = (&temperatures, &fans) {
            tracing::debug!(error = %e, operation = "sensor_refresh", "thermal service unreachable");
            return None;
        }
        Some(SensorSample {
            temperatures: readings(temperatures),
            fans: readings(fans),
        })
    }
}

fn readings(group: Result<Vec<(String, Option<f64>)>, SmcError>) -> Vec<SensorReading> {
    group
        .unwrap_or_default()
        .into_iter()
        .filter_map(|(name, value)| value.map(|value| SensorReading { name, value }))
        .collect()
}
