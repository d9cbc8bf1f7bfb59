// Monitor service - drives the engine on a fixed tick and fans out results
use crate::application::engine::TelemetryEngine;
use crate::domain::dashboard::Dashboard;
use crate::domain::telemetry::TelemetryRecord;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch, Mutex};
use tokio::time::MissedTickBehavior;

pub type DashboardReceiver = watch::Receiver<Option<Arc<Dashboard>>>;

pub struct MonitorService {
    engine: Mutex<TelemetryEngine>,
    tick_interval: Duration,
    dashboards: watch::Sender<Option<Arc<Dashboard>>>,
    records: mpsc::Sender<TelemetryRecord>,
}

impl MonitorService {
    pub fn new(
        engine: TelemetryEngine,
        tick_interval: Duration,
        records: mpsc::Sender<TelemetryRecord>,
    ) -> (Self, DashboardReceiver) {
        let (dashboards, rx) = watch::channel(None);
        let service = Self {
            engine: Mutex::new(engine),
            tick_interval,
            dashboards,
            records,
        };
        (service, rx)
    }

    /// Runs one tick under the engine lock and publishes its results.
    ///
    /// Returns `None` when the sample was rejected. The record hand-off never
    /// waits: a full queue drops the record.
    pub async fn tick_once(&self) -> Option<Arc<Dashboard>> {
        let dt = self.tick_interval.as_secs_f64();
        let mut engine = self.engine.lock().await;

        let report = match engine.tick(dt) {
            Ok(report) => report,
            Err(e) => {
                tracing::warn!(error = %e, "Skipping tick");
                return None;
            }
        };

        match self.records.try_send(report.record) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(record)) => {
                tracing::warn!(
                    timestamp = %record.timestamp,
                    "Persistence queue full, dropping telemetry record"
                );
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                tracing::warn!("Persistence queue closed, telemetry is no longer persisted");
            }
        }

        let dashboard = Arc::new(report.dashboard);
        self.dashboards.send_replace(Some(dashboard.clone()));
        Some(dashboard)
    }

    /// Ticks until `shutdown` flips to `true` or its sender is dropped.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let mut interval = tokio::time::interval(self.tick_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!(
            interval_ms = self.tick_interval.as_millis() as u64,
            "Monitor loop started"
        );

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    self.tick_once().await;
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        tracing::info!("Monitor loop stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::engine::tests::ScriptedSource;
    use crate::domain::telemetry::tests::level_frame;
    use crate::domain::telemetry::SampleError;
    use crate::infrastructure::config::MonitorConfig;

    fn service(
        source: ScriptedSource,
        tick_interval: Duration,
        queue: usize,
    ) -> (MonitorService, DashboardReceiver, mpsc::Receiver<TelemetryRecord>) {
        let engine = TelemetryEngine::new(&MonitorConfig::default(), Box::new(source));
        let (tx, records) = mpsc::channel(queue);
        let (service, dashboards) = MonitorService::new(engine, tick_interval, tx);
        (service, dashboards, records)
    }

    #[tokio::test]
    async fn test_tick_publishes_dashboard_and_record() {
        let (service, dashboards, mut records) =
            service(ScriptedSource::constant(level_frame()), Duration::from_secs(1), 4);

        assert!(dashboards.borrow().is_none());
        let dashboard = service.tick_once().await.unwrap();

        assert_eq!(dashboard.tick, 1);
        assert_eq!(dashboards.borrow().as_ref().map(|d| d.tick), Some(1));
        let record = records.recv().await.unwrap();
        assert_eq!(record.motor_load, 50.0);
    }

    #[tokio::test]
    async fn test_rejected_tick_publishes_nothing() {
        let source = ScriptedSource::constant(level_frame())
            .then(Err(SampleError::Missing("battery.voltage")));
        let (service, dashboards, mut records) = service(source, Duration::from_secs(1), 4);

        assert!(service.tick_once().await.is_none());
        assert!(dashboards.borrow().is_none());
        assert!(records.try_recv().is_err());

        let dashboard = service.tick_once().await.unwrap();
        assert_eq!(dashboard.tick, 2);
    }

    #[tokio::test]
    async fn test_full_queue_does_not_block_ticks() {
        let (service, _dashboards, mut records) =
            service(ScriptedSource::constant(level_frame()), Duration::from_secs(1), 1);

        for expected in 1..=3 {
            let dashboard = service.tick_once().await.unwrap();
            assert_eq!(dashboard.tick, expected);
        }

        assert!(records.try_recv().is_ok());
        assert!(records.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_run_ticks_until_shutdown() {
        let (service, mut dashboards, mut records) = service(
            ScriptedSource::constant(level_frame()),
            Duration::from_millis(5),
            64,
        );
        let (stop_tx, stop_rx) = watch::channel(false);
        let handle = tokio::spawn(service.run(stop_rx));

        for _ in 0..3 {
            dashboards.changed().await.unwrap();
        }
        stop_tx.send(true).unwrap();
        handle.await.unwrap();

        let last_tick = dashboards.borrow().as_ref().map(|d| d.tick).unwrap();
        assert!(last_tick >= 3);

        let mut ticks = Vec::new();
        while let Ok(record) = records.try_recv() {
            ticks.push(record.timestamp);
        }
        assert_eq!(ticks.len() as u64, last_tick);
        assert!(ticks.windows(2).all(|w| w[0] <= w[1]));
    }
}
