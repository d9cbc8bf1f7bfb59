// Telemetry engine - per-tick sampling, derivation, history and alerting
use chrono::Utc;
use thiserror::Error;

use crate::application::alert_service::{AlertEvaluator, AlertPrioritizer};
use crate::application::sensor_source::SensorSource;
use crate::domain::alert::{MetricKind, MonitoredReading, Status};
use crate::domain::dashboard::{CurrentReadings, Dashboard, MetricStatus};
use crate::domain::history::{HistoryMetric, HistoryStore};
use crate::domain::metrics::{CumulativeTotals, MetricsCalculator, SlipHeuristic};
use crate::domain::telemetry::{
    SampleError, SensorFrame, TelemetryRecord, TelemetrySample, TimeSeriesPoint,
};
use crate::infrastructure::config::MonitorConfig;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum TickError {
    #[error("sample for tick {tick} rejected: {source}")]
    SampleRejected {
        tick: u64,
        #[source]
        source: SampleError,
    },
}

/// Everything a single accepted tick produced.
#[derive(Debug, Clone)]
pub struct TickReport {
    pub sample: TelemetrySample,
    pub record: TelemetryRecord,
    pub dashboard: Dashboard,
}

/// Single owner of all mutable monitoring state.
///
/// `tick` must not run concurrently with itself; callers that share the
/// engine wrap the whole tick in one lock.
pub struct TelemetryEngine {
    source: Box<dyn SensorSource>,
    calculator: MetricsCalculator,
    evaluator: AlertEvaluator,
    prioritizer: AlertPrioritizer,
    history: HistoryStore,
    totals: CumulativeTotals,
    peak_window: usize,
}

impl TelemetryEngine {
    pub fn new(config: &MonitorConfig, source: Box<dyn SensorSource>) -> Self {
        let engine = &config.engine;
        let slip = SlipHeuristic {
            wheel_speed_threshold: config.slip_detection.wheel_speed_threshold,
            low_motion_accel: config.slip_detection.low_motion_accel,
        };

        Self {
            source,
            calculator: MetricsCalculator::new(engine.i_max, engine.wheel_speed_scale, slip),
            evaluator: AlertEvaluator::new(config.alert_rules()),
            prioritizer: AlertPrioritizer::new(engine.top_k, engine.audible_scope),
            history: HistoryStore::new(engine.history_capacity),
            totals: CumulativeTotals::default(),
            peak_window: engine.peak_window,
        }
    }

    pub fn distance_m(&self) -> f64 {
        self.totals.distance_m()
    }

    pub fn ticks(&self) -> u64 {
        self.totals.ticks()
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    /// Runs one tick of `dt` seconds.
    ///
    /// The tick clock advances even when the sample is rejected; nothing else
    /// changes in that case.
    pub fn tick(&mut self, dt: f64) -> Result<TickReport, TickError> {
        let tick = self.totals.advance_clock();

        let frame = self
            .source
            .sample(dt)
            .and_then(|frame| frame.validate().map(|()| frame))
            .map_err(|source| TickError::SampleRejected { tick, source })?;

        let derived = self.calculator.derive(&frame, dt);
        self.totals.integrate(derived.speed, dt);

        let sample = TelemetrySample {
            tick,
            timestamp: Utc::now(),
            temperature: frame.motor.temperature,
            vibration: frame.motor.vibration,
            voltage: frame.battery.voltage,
            current: frame.motor.current,
            energy: derived.energy,
            speed: derived.speed,
            motor_load: derived.motor_load,
            pitch: derived.orientation.pitch,
            roll: derived.orientation.roll,
        };

        self.record_history(&sample, &frame);

        let readings = monitored_readings(&frame);
        let statuses = readings
            .iter()
            .map(|r| {
                let status = Status::from(self.evaluator.classify(r));
                MetricStatus {
                    metric: r.metric,
                    source: r.source,
                    status,
                    style: status.style(),
                }
            })
            .collect();
        let alerts = self.prioritizer.select(self.evaluator.evaluate(&readings));

        if alerts.audible_critical {
            tracing::warn!(tick, "Critical alert raised");
        }
        tracing::debug!(
            tick,
            temperature = sample.temperature,
            voltage = sample.voltage,
            motor_load = sample.motor_load,
            alerts = alerts.alerts.len(),
            "Tick processed"
        );

        let dashboard = Dashboard {
            tick,
            timestamp: sample.timestamp,
            readings: CurrentReadings {
                temperature: sample.temperature,
                vibration: sample.vibration,
                voltage: sample.voltage,
                current: sample.current,
                charge_percent: frame.battery.charge_percent,
                motor_load: sample.motor_load,
                speed: sample.speed,
                energy: sample.energy,
                pitch: sample.pitch,
                roll: sample.roll,
                angular_rate: frame.imu.angular_rate,
                left_slip: frame.motor.left_slip,
                right_slip: frame.motor.right_slip,
            },
            distance_m: self.totals.distance_m(),
            peak_vibration: self
                .history
                .peak(HistoryMetric::Vibration, self.peak_window)
                .unwrap_or(sample.vibration),
            slipping_wheels: derived.slipping_wheels,
            statuses,
            alerts,
            history: self.history.series(),
        };

        Ok(TickReport {
            record: TelemetryRecord::from(&sample),
            sample,
            dashboard,
        })
    }

    fn record_history(&mut self, sample: &TelemetrySample, frame: &SensorFrame) {
        let time_ms = sample.timestamp.timestamp_millis();
        for (metric, value) in [
            (HistoryMetric::Temperature, sample.temperature),
            (HistoryMetric::Vibration, sample.vibration),
            (HistoryMetric::Voltage, sample.voltage),
            (HistoryMetric::Current, sample.current),
            (HistoryMetric::AngularRate, frame.imu.angular_rate),
            (HistoryMetric::AccX, frame.imu.acc_x),
            (HistoryMetric::AccY, frame.imu.acc_y),
            (HistoryMetric::AccZ, frame.imu.acc_z),
            (HistoryMetric::Wheel1, frame.wheel_speeds[0]),
            (HistoryMetric::Wheel2, frame.wheel_speeds[1]),
            (HistoryMetric::Wheel3, frame.wheel_speeds[2]),
            (HistoryMetric::Wheel4, frame.wheel_speeds[3]),
            (HistoryMetric::Speed, sample.speed),
            (HistoryMetric::Pitch, sample.pitch),
            (HistoryMetric::Roll, sample.roll),
        ] {
            self.history.append(metric, TimeSeriesPoint::new(time_ms, value));
        }
    }
}

/// Quantities checked against thresholds, in evaluation order.
fn monitored_readings(frame: &SensorFrame) -> [MonitoredReading; 6] {
    [
        MonitoredReading {
            metric: MetricKind::Temperature,
            source: "motor_temperature",
            label: "temperature",
            value: frame.motor.temperature,
        },
        MonitoredReading {
            metric: MetricKind::Vibration,
            source: "vibration",
            label: "vibration",
            value: frame.motor.vibration,
        },
        MonitoredReading {
            metric: MetricKind::Voltage,
            source: "battery_voltage",
            label: "voltage",
            value: frame.battery.voltage,
        },
        MonitoredReading {
            metric: MetricKind::Current,
            source: "current",
            label: "current",
            value: frame.motor.current,
        },
        MonitoredReading {
            metric: MetricKind::WheelSlip,
            source: "left_slip",
            label: "left wheel slip",
            value: frame.motor.left_slip,
        },
        MonitoredReading {
            metric: MetricKind::WheelSlip,
            source: "right_slip",
            label: "right wheel slip",
            value: frame.motor.right_slip,
        },
    ]
}
