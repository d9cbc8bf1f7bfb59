// HTTP request handlers
use crate::domain::dashboard::{AlertSelection, Dashboard};
use crate::presentation::app_state::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use futures::stream::{Stream, StreamExt};
use std::sync::Arc;
use tokio_stream::wrappers::WatchStream;

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

fn latest(state: &AppState) -> Result<Arc<Dashboard>, StatusCode> {
    state
        .dashboards
        .borrow()
        .clone()
        .ok_or(StatusCode::SERVICE_UNAVAILABLE)
}

/// Latest dashboard projection; 503 until the first tick has completed
pub async fn current_telemetry(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Dashboard>, StatusCode> {
    let dashboard = latest(&state)?;
    Ok(Json(dashboard.as_ref().clone()))
}

/// Currently displayed alerts and the audible flag
pub async fn current_alerts(
    State(state): State<Arc<AppState>>,
) -> Result<Json<AlertSelection>, StatusCode> {
    let dashboard = latest(&state)?;
    Ok(Json(dashboard.alerts.clone()))
}

/// One server-sent event per published dashboard
pub async fn stream_telemetry(
    State(state): State<Arc<AppState>>,
) -> Sse<impl Stream<Item = Result<Event, axum::Error>>> {
    let stream = WatchStream::new(state.dashboards.clone())
        .filter_map(|dashboard| async move { dashboard })
        .map(|dashboard| Event::default().event("dashboard").json_data(dashboard.as_ref()));

    Sse::new(stream).keep_alive(KeepAlive::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::engine::tests::ScriptedSource;
    use crate::application::monitor_service::MonitorService;
    use crate::application::engine::TelemetryEngine;
    use crate::domain::telemetry::tests::level_frame;
    use crate::infrastructure::config::MonitorConfig;
    use std::time::Duration;
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn test_telemetry_unavailable_before_first_tick() {
        let engine = TelemetryEngine::new(
            &MonitorConfig::default(),
            Box::new(ScriptedSource::constant(level_frame())),
        );
        let (tx, _records) = mpsc::channel(4);
        let (service, dashboards) = MonitorService::new(engine, Duration::from_secs(1), tx);
        let state = Arc::new(AppState { dashboards });

        let response = current_telemetry(State(state.clone())).await;
        assert_eq!(response.err(), Some(StatusCode::SERVICE_UNAVAILABLE));

        service.tick_once().await.unwrap();

        let Json(dashboard) = current_telemetry(State(state.clone())).await.unwrap();
        assert_eq!(dashboard.tick, 1);
        let Json(alerts) = current_alerts(State(state)).await.unwrap();
        assert_eq!(alerts.alerts.len(), 1);
        assert!(!alerts.audible_critical);

        let body = serde_json::to_value(&alerts).unwrap();
        assert_eq!(body["alerts"][0]["level"], "normal");
        assert_eq!(body["alerts"][0]["style"]["accent"], "success");
        assert_eq!(body["audible_critical"], false);

        let body = serde_json::to_value(&dashboard).unwrap();
        assert_eq!(body["statuses"][0]["metric"], "temperature");
        assert_eq!(body["history"][0]["metric"], "temperature");
        assert_eq!(body["readings"]["motor_load"], 50.0);
    }
}
