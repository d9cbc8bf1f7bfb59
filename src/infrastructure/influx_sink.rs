// InfluxDB sink implementation - line protocol writes over HTTP
use crate::application::telemetry_sink::TelemetrySink;
use crate::domain::telemetry::TelemetryRecord;
use crate::infrastructure::config::InfluxSettings;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct InfluxSink {
    client: reqwest::Client,
    host: String,
    token: String,
    database: String,
    retention_policy: String,
    measurement: String,
    max_retries: u32,
    retry_backoff: Duration,
}

impl InfluxSink {
    pub fn new(settings: &InfluxSettings) -> Self {
        Self {
            client: reqwest::Client::new(),
            host: settings.host.trim_end_matches('/').to_string(),
            token: settings.token.clone(),
            database: settings.database.clone(),
            retention_policy: settings.retention_policy.clone(),
            measurement: settings.measurement.clone(),
            max_retries: settings.max_retries,
            retry_backoff: Duration::from_millis(settings.retry_backoff_ms),
        }
    }

    fn build_write_url(&self) -> String {
        format!(
            "{}/write?db={}&rp={}&precision=ns",
            self.host,
            urlencoding::encode(&self.database),
            urlencoding::encode(&self.retention_policy)
        )
    }

    fn to_line(&self, record: &TelemetryRecord) -> Result<String> {
        let timestamp = record
            .timestamp
            .timestamp_nanos_opt()
            .context("Record timestamp out of range for nanosecond precision")?;

        let fields = [
            ("temperature", record.temperature),
            ("vibration", record.vibration),
            ("voltage", record.voltage),
            ("current", record.current),
            ("energy", record.energy),
            ("speed", record.speed),
            ("motor_load", record.motor_load),
            ("pitch", record.pitch),
            ("roll", record.roll),
        ]
        .iter()
        .map(|(name, value)| format!("{}={}", name, value))
        .collect::<Vec<_>>()
        .join(",");

        Ok(format!("{} {} {}", escape_measurement(&self.measurement), fields, timestamp))
    }

    async fn write_line(&self, line: String) -> Result<()> {
        let response = self
            .client
            .post(self.build_write_url())
            .header("Authorization", format!("Token {}", self.token))
            .header("Content-Type", "text/plain; charset=utf-8")
            .body(line)
            .send()
            .await
            .context("Failed to send write to InfluxDB")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("InfluxDB write failed with status {}: {}", status, body);
        }

        Ok(())
    }
}

fn escape_measurement(name: &str) -> String {
    name.replace(',', "\\,").replace(' ', "\\ ")
}

#[async_trait]
impl TelemetrySink for InfluxSink {
    async fn append(&self, record: &TelemetryRecord) -> Result<()> {
        let line = self.to_line(record)?;
        let mut backoff = self.retry_backoff;
        let mut attempt = 0;

        loop {
            match self.write_line(line.clone()).await {
                Ok(()) => return Ok(()),
                Err(e) if attempt < self.max_retries => {
                    attempt += 1;
                    tracing::debug!(attempt, error = %e, "Retrying InfluxDB write");
                    tokio::time::sleep(backoff).await;
                    backoff *= 2;
                }
                Err(e) => {
                    return Err(e.context(format!("Giving up after {} attempts", attempt + 1)));
                }
            }
        }
    }
}
