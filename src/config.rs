use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub monitoring: MonitoringConfig,
    pub ping: PingSettings,
    pub sensors: SensorsConfig,
    pub publishing: PublishingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MonitoringConfig {
    /// Refresh cadence; the engine clamps to [0.2, 60.0] seconds.
    pub refresh_interval_secs: f64,
    /// Snapshots retained in the in-memory sample window.
    pub history_capacity: usize,
    /// How often to log app stats (ticks, subscribers) at INFO level.
    pub stats_log_interval_secs: u64,
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            refresh_interval_secs: 1.0,
            history_capacity: 300,
            stats_log_interval_secs: 300,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PingSettings {
    /// Probe target; omit to disable ping.
    pub host: Option<String>,
    pub interval_secs: u64,
    pub timeout_ms: u64,
    /// Plain-text endpoint returning the caller's public address; omit to
    /// disable the lookup.
    pub public_address_url: Option<String>,
}

impl Default for PingSettings {
    fn default() -> Self {
        Self {
            host: None,
            interval_secs: 10,
            timeout_ms: 1000,
            public_address_url: Some("https://api.ipify.org".into()),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SensorsConfig {
    /// Thermal-management service socket.
    pub service_path: String,
    pub read_timeout_ms: u64,
}

impl Default for SensorsConfig {
    fn default() -> Self {
        Self {
            service_path: "/var/run/smc.sock".into(),
            read_timeout_ms: 250,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PublishingConfig {
    /// Max snapshots kept in the broadcast channel (slow subscribers may lag).
    pub broadcast_capacity: usize,
}

impl Default for PublishingConfig {
    fn default() -> Self {
        Self {
            broadcast_capacity: 16,
        }
    }
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var("CONFIG_FILE").unwrap_or_else(|_| "config.toml".into());
        let s = std::fs::read_to_string(&path)?;
        Self::load_from_str(&s)
    }

    /// Parse and validate config from a string (e.g. for tests).
    pub fn load_from_str(s: &str) -> anyhow::Result<Self> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.monitoring.refresh_interval_secs.is_finite()
                && self.monitoring.refresh_interval_secs > 0.0,
            "monitoring.refresh_interval_secs must be > 0, got {}",
            self.monitoring.refresh_interval_secs
        );
        anyhow::ensure!(
            self.monitoring.history_capacity > 0,
            "monitoring.history_capacity must be > 0, got {}",
            self.monitoring.history_capacity
        );
        anyhow::ensure!(
            self.monitoring.stats_log_interval_secs > 0,
            "monitoring.stats_log_interval_secs must be > 0, got {}",
            self.monitoring.stats_log_interval_secs
        );
        anyhow::ensure!(
            self.ping.interval_secs > 0,
            "ping.interval_secs must be > 0, got {}",
            self.ping.interval_secs
        );
        anyhow::ensure!(
            self.ping.timeout_ms > 0,
            "ping.timeout_ms must be > 0, got {}",
            self.ping.timeout_ms
        );
        if let Some(host) = &self.ping.host {
            anyhow::ensure!(!host.is_empty(), "ping.host must be non-empty when set");
        }
        anyhow::ensure!(
            !self.sensors.service_path.is_empty(),
            "sensors.service_path must be non-empty"
        );
        anyhow::ensure!(
            self.sensors.read_timeout_ms > 0,
            "sensors.read_timeout_ms must be > 0, got {}",
            self.sensors.read_timeout_ms
        );
        anyhow::ensure!(
            self.publishing.broadcast_capacity > 0,
            "publishing.broadcast_capacity must be > 0, got {}",
            self.publishing.broadcast_capacity
        );
        Ok(())
    }
}
