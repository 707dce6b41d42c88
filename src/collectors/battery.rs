// Battery collector: first enumerated power source.

use battery::units::power::watt;
use battery::units::ratio::percent;
use battery::units::time::second;

use crate::models::BatterySample;

pub struct BatteryCollector {
    manager: Option<battery::Manager>,
}

impl Default for BatteryCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl BatteryCollector {
    pub fn new() -> Self {
        Self {
            manager: battery::Manager::new().ok(),
        }
    }

    /// `None` when no battery is present (capability probe explains why).
    pub fn refresh(&mut self) -> Option<BatterySample> {
        let manager = self.manager.as_ref()?;
        let battery = manager.batteries().ok()?.next()?.ok()?;

        let charge = f64::from(battery.state_of_charge().get::<percent>());
        let percentage = if charge.is_finite() {
            charge.clamp(0.0, 100.0)
        } else {
            0.0
        };

        let is_charging = battery.state() == battery::State::Charging;
        let rate = f64::from(battery.energy_rate().get::<watt>()).abs();
        let charge_rate_watts = match battery.state() {
            battery::State::Charging => rate,
            battery::State::Discharging => -rate,
            _ => 0.0,
        };

        let minutes_remaining = if is_charging {
            battery.time_to_full()
        } else {
            battery.time_to_empty()
        }
        .map(|t| (f64::from(t.get::<second>()) / 60.0).round() as u64);

        Some(BatterySample {
            percentage,
            health: health_text(f64::from(battery.state_of_health().get::<percent>())).to_string(),
            cycle_count: battery.cycle_count().unwrap_or(0),
            is_charging,
            charge_rate_watts,
            minutes_remaining,
        })
    }
}

/// Health banding over the state-of-health percentage; "Unknown" when the
/// power source does not report one.
pub fn health_text(state_of_health_percent: f64) -> &'static str {
    if !state_of_health_percent.is_finite() {
        "Unknown"
    } else if state_of_health_percent >= 80.0 {
        "Good"
    } else if state_of_health_percent >= 50.0 {
        "Fair"
    } else {
        "Poor"
    }
}
