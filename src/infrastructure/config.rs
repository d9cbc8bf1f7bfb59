// Configuration - monitor settings from file and environment
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;

use crate::domain::alert::{
    AlertRule, AudibleScope, Direction, MetricKind, PriorityWeights, ThresholdSpec,
};

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct MonitorConfig {
    pub engine: EngineSettings,
    pub thresholds: ThresholdSettings,
    pub priorities: PrioritySettings,
    pub slip_detection: SlipDetectionSettings,
    pub simulation: SimulationSettings,
    pub persistence: PersistenceSettings,
    pub server: ServerSettings,
    pub influx: Option<InfluxSettings>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct EngineSettings {
    pub tick_interval_ms: u64,
    pub history_capacity: usize,
    pub peak_window: usize,
    pub top_k: usize,
    pub i_max: f64,
    pub wheel_speed_scale: f64,
    pub audible_scope: AudibleScope,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            tick_interval_ms: 1000,
            history_capacity: 20,
            peak_window: 20,
            top_k: 3,
            i_max: 5.5,
            wheel_speed_scale: 0.1,
            audible_scope: AudibleScope::Displayed,
        }
    }
}

impl EngineSettings {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ThresholdSettings {
    pub temperature: ThresholdSpec,
    pub vibration: ThresholdSpec,
    pub voltage: ThresholdSpec,
    pub current: ThresholdSpec,
    pub wheel_slip: ThresholdSpec,
}

impl Default for ThresholdSettings {
    fn default() -> Self {
        Self {
            temperature: ThresholdSpec::above(70.0, 85.0),
            vibration: ThresholdSpec::above(0.15, 0.25),
            voltage: ThresholdSpec::below(22.0, 20.0),
            current: ThresholdSpec::above(5.0, 7.0),
            wheel_slip: ThresholdSpec::above(0.2, 0.3),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct PrioritySettings {
    pub temperature: PriorityWeights,
    pub vibration: PriorityWeights,
    pub voltage: PriorityWeights,
    pub current: PriorityWeights,
    pub wheel_slip: PriorityWeights,
}

impl Default for PrioritySettings {
    fn default() -> Self {
        Self {
            temperature: PriorityWeights::new(30, 50),
            vibration: PriorityWeights::new(25, 45),
            voltage: PriorityWeights::new(20, 40),
            current: PriorityWeights::new(20, 40),
            wheel_slip: PriorityWeights::new(35, 55),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SlipDetectionSettings {
    pub wheel_speed_threshold: f64,
    pub low_motion_accel: f64,
}

impl Default for SlipDetectionSettings {
    fn default() -> Self {
        Self {
            wheel_speed_threshold: 8.0,
            low_motion_accel: 0.2,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SimulationSettings {
    pub seed: Option<u64>,
    pub current_idle: f64,
    pub current_span: f64,
    pub initial_capacity_mah: f64,
    pub max_capacity_mah: f64,
    pub nominal_voltage: f64,
    pub voltage_drop: f64,
    pub accel_noise: f64,
    pub gravity: f64,
    pub angular_rate_limit: f64,
    pub wheel_speed_min: f64,
    pub wheel_speed_max: f64,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            seed: None,
            current_idle: 2.0,
            current_span: 3.0,
            initial_capacity_mah: 5000.0,
            max_capacity_mah: 5000.0,
            nominal_voltage: 25.2,
            voltage_drop: 0.4,
            accel_noise: 1.5,
            gravity: 10.0,
            angular_rate_limit: 300.0,
            wheel_speed_min: 5.0,
            wheel_speed_max: 15.0,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct PersistenceSettings {
    pub queue_capacity: usize,
}

impl Default for PersistenceSettings {
    fn default() -> Self {
        Self { queue_capacity: 256 }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerSettings {
    pub bind: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8080".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct InfluxSettings {
    pub host: String,
    pub token: String,
    pub database: String,
    pub retention_policy: String,
    #[serde(default = "default_measurement")]
    pub measurement: String,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
}

fn default_measurement() -> String {
    "robot_telemetry".to_string()
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_backoff_ms() -> u64 {
    250
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("{0} must be greater than zero")]
    NotPositive(&'static str),
    #[error("{field} must be a finite, non-negative number (got {value})")]
    InvalidNumber { field: &'static str, value: f64 },
    #[error("{metric} thresholds warn={warn} critical={critical} are inconsistent ({direction})")]
    InconsistentThreshold {
        metric: MetricKind,
        warn: f64,
        critical: f64,
        direction: Direction,
    },
    #[error("{0}")]
    Invalid(String),
}

impl MonitorConfig {
    pub fn alert_rules(&self) -> HashMap<MetricKind, AlertRule> {
        let t = &self.thresholds;
        let p = &self.priorities;
        [
            (MetricKind::Temperature, t.temperature, p.temperature),
            (MetricKind::Vibration, t.vibration, p.vibration),
            (MetricKind::Voltage, t.voltage, p.voltage),
            (MetricKind::Current, t.current, p.current),
            (MetricKind::WheelSlip, t.wheel_slip, p.wheel_slip),
        ]
        .into_iter()
        .map(|(metric, threshold, priority)| (metric, AlertRule { threshold, priority }))
        .collect()
    }

    /// Checks everything the engine relies on, before the first tick.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let engine = &self.engine;
        for (field, value) in [
            ("engine.tick_interval_ms", engine.tick_interval_ms as usize),
            ("engine.history_capacity", engine.history_capacity),
            ("engine.peak_window", engine.peak_window),
            ("engine.top_k", engine.top_k),
            ("persistence.queue_capacity", self.persistence.queue_capacity),
        ] {
            if value == 0 {
                return Err(ConfigError::NotPositive(field));
            }
        }

        if !(engine.i_max.is_finite() && engine.i_max > 0.0) {
            return Err(ConfigError::NotPositive("engine.i_max"));
        }

        let sim = &self.simulation;
        for (field, value) in [
            ("engine.wheel_speed_scale", engine.wheel_speed_scale),
            ("slip_detection.wheel_speed_threshold", self.slip_detection.wheel_speed_threshold),
            ("slip_detection.low_motion_accel", self.slip_detection.low_motion_accel),
            ("simulation.current_idle", sim.current_idle),
            ("simulation.current_span", sim.current_span),
            ("simulation.initial_capacity_mah", sim.initial_capacity_mah),
            ("simulation.nominal_voltage", sim.nominal_voltage),
            ("simulation.voltage_drop", sim.voltage_drop),
            ("simulation.accel_noise", sim.accel_noise),
            ("simulation.gravity", sim.gravity),
            ("simulation.angular_rate_limit", sim.angular_rate_limit),
            ("simulation.wheel_speed_min", sim.wheel_speed_min),
            ("simulation.wheel_speed_max", sim.wheel_speed_max),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(ConfigError::InvalidNumber { field, value });
            }
        }

        if !(sim.max_capacity_mah.is_finite() && sim.max_capacity_mah > 0.0) {
            return Err(ConfigError::NotPositive("simulation.max_capacity_mah"));
        }
        if sim.initial_capacity_mah > sim.max_capacity_mah {
            return Err(ConfigError::Invalid(format!(
                "simulation.initial_capacity_mah ({}) exceeds max_capacity_mah ({})",
                sim.initial_capacity_mah, sim.max_capacity_mah
            )));
        }
        if sim.wheel_speed_min > sim.wheel_speed_max {
            return Err(ConfigError::Invalid(format!(
                "simulation.wheel_speed_min ({}) exceeds wheel_speed_max ({})",
                sim.wheel_speed_min, sim.wheel_speed_max
            )));
        }

        for (metric, rule) in self.alert_rules() {
            let threshold = rule.threshold;
            if !threshold.is_consistent() {
                return Err(ConfigError::InconsistentThreshold {
                    metric,
                    warn: threshold.warn,
                    critical: threshold.critical,
                    direction: threshold.direction,
                });
            }
        }

        Ok(())
    }
}

/// Loads `config/monitor.{toml,...}` if present, then `ROBOT__SECTION__KEY`
/// environment overrides (e.g. `ROBOT__ENGINE__TOP_K=5`).
pub fn load_monitor_config() -> anyhow::Result<MonitorConfig> {
    load_layered(
        config::File::with_name("config/monitor").required(false),
        environment(),
    )
}

fn environment() -> config::Environment {
    config::Environment::with_prefix("ROBOT")
        .separator("__")
        .try_parsing(true)
}

/// File values first, environment overrides on top.
fn load_layered<F>(file: F, environment: config::Environment) -> anyhow::Result<MonitorConfig>
where
    F: config::Source + Send + Sync + 'static,
{
    let settings = config::Config::builder()
        .add_source(file)
        .add_source(environment)
        .build()?;

    finish(settings)
}

/// Parses an inline TOML document with the same defaults and validation.
pub fn parse_monitor_config(toml: &str) -> anyhow::Result<MonitorConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::from_str(toml, config::FileFormat::Toml))
        .build()?;

    finish(settings)
}

fn finish(settings: config::Config) -> anyhow::Result<MonitorConfig> {
    let config: MonitorConfig = settings.try_deserialize()?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = MonitorConfig::default();
        assert_eq!(config.validate(), Ok(()));
        assert_eq!(config.engine.history_capacity, 20);
        assert_eq!(config.engine.top_k, 3);
        assert_eq!(config.engine.tick_interval(), Duration::from_secs(1));
        assert_eq!(config.alert_rules().len(), 5);
    }

    #[test]
    fn test_parse_overrides_and_keeps_defaults() {
        let config = parse_monitor_config(
            r#"
            [engine]
            tick_interval_ms = 2000
            top_k = 5
            audible_scope = "any_active"

            [thresholds.temperature]
            warn = 60.0
            critical = 80.0
            direction = "above"

            [influx]
            host = "http://localhost:8086/"
            token = "secret"
            database = "robot"
            retention_policy = "autogen"
            "#,
        )
        .unwrap();

        assert_eq!(config.engine.tick_interval_ms, 2000);
        assert_eq!(config.engine.top_k, 5);
        assert_eq!(config.engine.audible_scope, AudibleScope::AnyActive);
        assert_eq!(config.engine.history_capacity, 20);
        assert_eq!(config.thresholds.temperature, ThresholdSpec::above(60.0, 80.0));
        assert_eq!(config.thresholds.voltage, ThresholdSpec::below(22.0, 20.0));

        let influx = config.influx.unwrap();
        assert_eq!(influx.measurement, "robot_telemetry");
        assert_eq!(influx.max_retries, 3);
    }

    #[test]
    fn test_environment_overrides_file() {
        let file = config::File::from_str(
            r#"
            [engine]
            top_k = 3

            [thresholds.temperature]
            warn = 60.0
            critical = 80.0
            direction = "above"
            "#,
            config::FileFormat::Toml,
        );
        let vars: config::Map<String, String> = [
            ("ROBOT__ENGINE__TOP_K", "5"),
            ("ROBOT__THRESHOLDS__TEMPERATURE__WARN", "65.5"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        let config = load_layered(file, environment().source(Some(vars))).unwrap();

        assert_eq!(config.engine.top_k, 5);
        assert_eq!(config.thresholds.temperature, ThresholdSpec::above(65.5, 80.0));
        assert_eq!(config.engine.history_capacity, 20);
    }

    #[test]
    fn test_shipped_config_matches_defaults() {
        let config = parse_monitor_config(include_str!("../../config/monitor.toml")).unwrap();
        let rules = config.alert_rules();
        assert_eq!(rules, MonitorConfig::default().alert_rules());
        assert_eq!(config.simulation.seed, None);
        assert!(config.influx.is_none());
    }

    #[test]
    fn test_zero_capacity_fails_fast() {
        let mut config = MonitorConfig::default();
        config.engine.history_capacity = 0;
        assert_eq!(
            config.validate(),
            Err(ConfigError::NotPositive("engine.history_capacity"))
        );
    }

    #[test]
    fn test_inverted_thresholds_are_rejected() {
        let mut config = MonitorConfig::default();
        config.thresholds.voltage = ThresholdSpec::below(20.0, 22.0);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InconsistentThreshold {
                metric: MetricKind::Voltage,
                ..
            })
        ));

        let err = parse_monitor_config(
            r#"
            [thresholds.current]
            warn = 7.0
            critical = 5.0
            direction = "above"
            "#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("current thresholds"));
    }

    #[test]
    fn test_non_positive_i_max_is_rejected() {
        let mut config = MonitorConfig::default();
        config.engine.i_max = 0.0;
        assert_eq!(config.validate(), Err(ConfigError::NotPositive("engine.i_max")));
    }
}
