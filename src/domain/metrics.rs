// Derived metrics - orientation, load, speed and slip from raw readings
use serde::Serialize;

use super::telemetry::{ImuReading, SensorFrame};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Orientation {
    pub pitch: f64,
    pub roll: f64,
}

/// Tilt from a single accelerometer sample, in degrees.
///
/// No filtering across ticks: the estimate is as noisy as the accelerometer.
pub fn orientation(imu: &ImuReading) -> Orientation {
    let pitch = imu.acc_x.atan2((imu.acc_y.powi(2) + imu.acc_z.powi(2)).sqrt());
    let roll = imu.acc_y.atan2((imu.acc_x.powi(2) + imu.acc_z.powi(2)).sqrt());
    Orientation {
        pitch: pitch.to_degrees(),
        roll: roll.to_degrees(),
    }
}

/// Motor load as a rounded percentage of `i_max`.
///
/// Not clamped: a current above `i_max` yields more than 100 %.
pub fn motor_load_percent(current: f64, i_max: f64) -> f64 {
    (current / i_max * 100.0).round()
}

pub fn average_speed(wheel_speeds: &[f64; 4], scale: f64) -> f64 {
    wheel_speeds.iter().sum::<f64>() / wheel_speeds.len() as f64 * scale
}

pub fn tick_energy(voltage: f64, current: f64, dt: f64) -> f64 {
    voltage * current * dt
}

/// Loss-of-traction heuristic: a wheel reports high speed while the body
/// is barely accelerating in the horizontal plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlipHeuristic {
    pub wheel_speed_threshold: f64,
    pub low_motion_accel: f64,
}

impl SlipHeuristic {
    /// Returns 1-based numbers of the wheels flagged as slipping.
    pub fn slipping_wheels(&self, wheel_speeds: &[f64; 4], imu: &ImuReading) -> Vec<u8> {
        let planar_accel = (imu.acc_x.powi(2) + imu.acc_y.powi(2)).sqrt();
        if planar_accel >= self.low_motion_accel {
            return Vec::new();
        }

        wheel_speeds
            .iter()
            .zip(1u8..)
            .filter(|(speed, _)| **speed > self.wheel_speed_threshold)
            .map(|(_, wheel)| wheel)
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DerivedMetrics {
    pub orientation: Orientation,
    pub motor_load: f64,
    pub speed: f64,
    pub energy: f64,
    pub slipping_wheels: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct MetricsCalculator {
    i_max: f64,
    wheel_speed_scale: f64,
    slip: SlipHeuristic,
}

impl MetricsCalculator {
    pub fn new(i_max: f64, wheel_speed_scale: f64, slip: SlipHeuristic) -> Self {
        Self {
            i_max,
            wheel_speed_scale,
            slip,
        }
    }

    pub fn derive(&self, frame: &SensorFrame, dt: f64) -> DerivedMetrics {
        DerivedMetrics {
            orientation: orientation(&frame.imu),
            motor_load: motor_load_percent(frame.motor.current, self.i_max),
            speed: average_speed(&frame.wheel_speeds, self.wheel_speed_scale),
            energy: tick_energy(frame.battery.voltage, frame.motor.current, dt),
            slipping_wheels: self.slip.slipping_wheels(&frame.wheel_speeds, &frame.imu),
        }
    }
}

/// Process-wide running totals, owned by the engine.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CumulativeTotals {
    distance_m: f64,
    ticks: u64,
}

impl CumulativeTotals {
    /// Advances the tick clock and returns the new tick index.
    pub fn advance_clock(&mut self) -> u64 {
        self.ticks += 1;
        self.ticks
    }

    pub fn integrate(&mut self, speed: f64, dt: f64) {
        self.distance_m += (speed * dt).max(0.0);
    }

    pub fn distance_m(&self) -> f64 {
        self.distance_m
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }
}
