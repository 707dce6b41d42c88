use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use sysmetrics::*;
use tokio::sync::broadcast;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::FormatTime;

struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(
            w,
            "{}",
            chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z")
        )
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_timer(LocalTimer)
        .with_env_filter(filter)
        .init();

    let app_config = match config::AppConfig::load() {
        Ok(c) => c,
        Err(e) => {
            tracing::warn!(error = %e, "config load failed; using defaults");
            config::AppConfig::default()
        }
    };
    tracing::info!(version = version::VERSION, "starting {}", version::NAME);

    let smc = smc::SmcClient::new(
        &app_config.sensors.service_path,
        Duration::from_millis(app_config.sensors.read_timeout_ms),
    );

    let caps = capability::probe(&smc);
    for hint in caps.hints() {
        tracing::info!(operation = "capability_probe", "{hint}");
    }

    let aggregator = Arc::new(aggregator::Aggregator::new(
        app_config.publishing.broadcast_capacity,
        app_config.monitoring.history_capacity,
    ));

    let mut engine = engine::RefreshEngine::new(
        engine::Collectors::new(smc),
        aggregator.clone(),
        app_config.monitoring.refresh_interval_secs,
        app_config.monitoring.stats_log_interval_secs,
    );
    engine.start();

    let mut ping_worker = ping::spawn(
        aggregator.clone(),
        ping::PingConfig {
            host: app_config.ping.host.clone(),
            interval_secs: app_config.ping.interval_secs,
            timeout_ms: app_config.ping.timeout_ms,
            public_address_url: app_config.ping.public_address_url.clone(),
        },
    );

    // Stand-in for the presentation layer: consume snapshots in publication
    // order and log a one-line summary.
    let mut rx = aggregator.subscribe();
    let log_task = tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(snapshot) => {
                    tracing::debug!(
                        operation = "snapshot",
                        timestamp_ms = snapshot.timestamp_ms,
                        cpu_percent = snapshot.cpu.as_ref().map(|c| c.usage_percent).unwrap_or(0.0),
                        memory_percent = snapshot
                            .memory
                            .as_ref()
                            .map(|m| m.usage_percent)
                            .unwrap_or(0.0),
                        ping_ms = snapshot.network.as_ref().and_then(|n| n.ping_ms).unwrap_or(0.0),
                        "snapshot published"
                    );
                    if tracing::enabled!(tracing::Level::TRACE)
                        && let Ok(json) = serde_json::to_string(&snapshot)
                    {
                        tracing::trace!(operation = "snapshot", payload = %json, "snapshot payload");
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!("snapshot subscriber lagged, skipped {} messages", n);
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    #[cfg(unix)]
    {
        let mut sigterm = match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!(error = %e, "SIGTERM handler failed; ctrl-c only");
                tokio::signal::ctrl_c().await?;
                shutdown(engine, ping_worker, log_task).await;
                return Ok(());
            }
        };
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = sigterm.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await?;
    }

    tracing::info!("Received shutdown signal");
    shutdown(engine, ping_worker, log_task).await;
    Ok(())
}

async fn shutdown(
    mut engine: engine::RefreshEngine<engine::Collectors>,
    mut ping_worker: ping::PingWorker,
    log_task: tokio::task::JoinHandle<()>,
) {
    engine.stop().await;
    ping_worker.stop().await;
    log_task.abort();
}
