// Persistence worker - drains the record queue into a sink, in tick order
use crate::application::telemetry_sink::TelemetrySink;
use crate::domain::telemetry::TelemetryRecord;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Spawns the single consumer of the record queue.
///
/// Sink failures are logged and the record is dropped; the worker keeps
/// going. It exits once every sender is gone and returns how many records
/// were persisted.
pub fn spawn_persistence_worker(
    sink: Arc<dyn TelemetrySink>,
    mut rx: mpsc::Receiver<TelemetryRecord>,
) -> JoinHandle<u64> {
    tokio::spawn(async move {
        let mut persisted = 0u64;
        while let Some(record) = rx.recv().await {
            match sink.append(&record).await {
                Ok(()) => persisted += 1,
                Err(e) => {
                    tracing::warn!(
                        timestamp = %record.timestamp,
                        error = %e,
                        "Telemetry record not persisted, durability degraded"
                    );
                }
            }
        }
        tracing::info!(persisted, "Persistence worker stopped");
        persisted
    })
}
