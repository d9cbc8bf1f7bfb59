// Telemetry data domain models
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TimeSeriesPoint {
    pub time_ms: i64,
    pub value: f64,
}

impl TimeSeriesPoint {
    pub fn new(time_ms: i64, value: f64) -> Self {
        Self { time_ms, value }
    }
}

/// One tick of motor output: thermal, mechanical and electrical readings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotorReading {
    pub temperature: f64,
    pub vibration: f64,
    pub load: f64,
    pub current: f64,
    pub left_slip: f64,
    pub right_slip: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BatteryReading {
    pub voltage: f64,
    pub capacity_mah: f64,
    pub charge_percent: f64,
}

/// Accelerations in m/s², angular rate in °/s.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImuReading {
    pub acc_x: f64,
    pub acc_y: f64,
    pub acc_z: f64,
    pub angular_rate: f64,
}

/// Raw sample set produced by a sensor source for a single tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorFrame {
    pub motor: MotorReading,
    pub battery: BatteryReading,
    pub imu: ImuReading,
    pub wheel_speeds: [f64; 4],
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SampleError {
    /// Returned by hardware drivers when a channel does not report.
    #[error("channel {0} did not report a value")]
    Missing(&'static str),
    #[error("channel {channel} reported a non-finite value ({value})")]
    NonFinite { channel: &'static str, value: f64 },
    #[error("channel {channel} reported {value}, expected a non-negative value")]
    Negative { channel: &'static str, value: f64 },
}

impl SensorFrame {
    /// Rejects frames that would push NaN or impossible values downstream.
    pub fn validate(&self) -> Result<(), SampleError> {
        let channels = [
            ("motor.temperature", self.motor.temperature),
            ("motor.vibration", self.motor.vibration),
            ("motor.load", self.motor.load),
            ("motor.current", self.motor.current),
            ("motor.left_slip", self.motor.left_slip),
            ("motor.right_slip", self.motor.right_slip),
            ("battery.voltage", self.battery.voltage),
            ("battery.capacity", self.battery.capacity_mah),
            ("battery.charge_percent", self.battery.charge_percent),
            ("imu.acc_x", self.imu.acc_x),
            ("imu.acc_y", self.imu.acc_y),
            ("imu.acc_z", self.imu.acc_z),
            ("imu.angular_rate", self.imu.angular_rate),
            ("wheel.1", self.wheel_speeds[0]),
            ("wheel.2", self.wheel_speeds[1]),
            ("wheel.3", self.wheel_speeds[2]),
            ("wheel.4", self.wheel_speeds[3]),
        ];

        for (channel, value) in channels {
            if !value.is_finite() {
                return Err(SampleError::NonFinite { channel, value });
            }
        }

        for (channel, value) in [
            ("motor.vibration", self.motor.vibration),
            ("motor.current", self.motor.current),
        ] {
            if value < 0.0 {
                return Err(SampleError::Negative { channel, value });
            }
        }

        Ok(())
    }
}

/// Raw and derived readings of one accepted tick.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TelemetrySample {
    pub tick: u64,
    pub timestamp: DateTime<Utc>,
    pub temperature: f64,
    pub vibration: f64,
    pub voltage: f64,
    pub current: f64,
    pub energy: f64,
    pub speed: f64,
    pub motor_load: f64,
    pub pitch: f64,
    pub roll: f64,
}

/// Row handed to the persistence sink, one per accepted tick.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TelemetryRecord {
    pub timestamp: DateTime<Utc>,
    pub temperature: f64,
    pub vibration: f64,
    pub voltage: f64,
    pub current: f64,
    pub energy: f64,
    pub speed: f64,
    pub motor_load: f64,
    pub pitch: f64,
    pub roll: f64,
}

impl From<&TelemetrySample> for TelemetryRecord {
    fn from(sample: &TelemetrySample) -> Self {
        Self {
            timestamp: sample.timestamp,
            temperature: sample.temperature,
            vibration: sample.vibration,
            voltage: sample.voltage,
            current: sample.current,
            energy: sample.energy,
            speed: sample.speed,
            motor_load: sample.motor_load,
            pitch: sample.pitch,
            roll: sample.roll,
        }
    }
}
