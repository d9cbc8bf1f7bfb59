// Main entry point - Dependency injection, monitor loop and server setup
mod application;
mod domain;
mod infrastructure;
mod presentation;

use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::{routing::get, Router};
use tokio::sync::{mpsc, watch};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use crate::application::engine::TelemetryEngine;
use crate::application::monitor_service::MonitorService;
use crate::application::persistence_worker::spawn_persistence_worker;
use crate::application::telemetry_sink::TelemetrySink;
use crate::infrastructure::config::load_monitor_config;
use crate::infrastructure::influx_sink::InfluxSink;
use crate::infrastructure::log_sink::TracingSink;
use crate::infrastructure::simulator::SimulatedSensorSource;
use crate::presentation::app_state::AppState;
use crate::presentation::handlers::{
    current_alerts, current_telemetry, health_check, stream_telemetry,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load and validate configuration
    let config = load_monitor_config().context("Invalid monitor configuration")?;

    // Persistence sink (infrastructure layer)
    let sink: Arc<dyn TelemetrySink> = match &config.influx {
        Some(influx) => {
            tracing::info!(
                host = %influx.host,
                database = %influx.database,
                "Persisting telemetry to InfluxDB"
            );
            Arc::new(InfluxSink::new(influx))
        }
        None => {
            tracing::info!("No database configured, telemetry records are only logged");
            Arc::new(TracingSink)
        }
    };
    let (records_tx, records_rx) = mpsc::channel(config.persistence.queue_capacity);
    let persistence = spawn_persistence_worker(sink, records_rx);

    // Engine and monitor loop (application layer)
    let source = SimulatedSensorSource::new(&config.simulation);
    let engine = TelemetryEngine::new(&config, Box::new(source));
    let (monitor, dashboards) =
        MonitorService::new(engine, config.engine.tick_interval(), records_tx);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let monitor_task = tokio::spawn(monitor.run(shutdown_rx.clone()));

    // Build router (presentation layer)
    let state = Arc::new(AppState { dashboards });
    let router = Router::new()
        .route("/healthz", get(health_check))
        .route("/telemetry", get(current_telemetry))
        .route("/telemetry/alerts", get(current_alerts))
        .route("/telemetry/stream", get(stream_telemetry))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start server
    let addr: SocketAddr = config
        .server
        .bind
        .parse()
        .with_context(|| format!("Invalid bind address {}", config.server.bind))?;
    tracing::info!(%addr, "Starting robot-telemetry service");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    let server = tokio::spawn(async move {
        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_requested(shutdown_rx))
            .await
    });

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutdown requested");
    shutdown_tx.send_replace(true);

    monitor_task.await?;
    server.await??;
    // The monitor held the last record sender; the worker drains and exits.
    let persisted = persistence.await?;
    tracing::info!(persisted, "Telemetry service stopped");

    Ok(())
}

async fn shutdown_requested(mut shutdown: watch::Receiver<bool>) {
    loop {
        if *shutdown.borrow_and_update() {
            break;
        }
        if shutdown.changed().await.is_err() {
            break;
        }
    }
}
