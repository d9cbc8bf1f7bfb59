// Sink trait for finalized telemetry records
use crate::domain::telemetry::TelemetryRecord;
use async_trait::async_trait;

/// Append-only destination for per-tick records.
///
/// Records arrive in tick order; implementations that write concurrently
/// must keep tick N durable no later than tick N+1.
#[async_trait]
pub trait TelemetrySink: Send + Sync {
    async fn append(&self, record: &TelemetryRecord) -> anyhow::Result<()>;
}
