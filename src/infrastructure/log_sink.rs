// Tracing sink - used when no database is configured
use crate::application::telemetry_sink::TelemetrySink;
use crate::domain::telemetry::TelemetryRecord;
use async_trait::async_trait;

#[derive(Debug, Clone, Default)]
pub struct TracingSink;

#[async_trait]
impl TelemetrySink for TracingSink {
    async fn append(&self, record: &TelemetryRecord) -> anyhow::Result<()> {
        tracing::debug!(
            timestamp = %record.timestamp,
            temperature = record.temperature,
            vibration = record.vibration,
            voltage = record.voltage,
            current = record.current,
            energy = record.energy,
            speed = record.speed,
            motor_load = record.motor_load,
            pitch = record.pitch,
            roll = record.roll,
            "telemetry"
        );
        Ok(())
    }
}
