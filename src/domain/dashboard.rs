// Dashboard domain model - read-only projection published after each tick
use chrono::{DateTime, Utc};
use serde::Serialize;

use super::alert::{DisplayStyle, DisplayedAlert, MetricKind, Status};
use super::history::SeriesData;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurrentReadings {
    pub temperature: f64,
    pub vibration: f64,
    pub voltage: f64,
    pub current: f64,
    pub charge_percent: f64,
    pub motor_load: f64,
    pub speed: f64,
    pub energy: f64,
    pub pitch: f64,
    pub roll: f64,
    pub angular_rate: f64,
    pub left_slip: f64,
    pub right_slip: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricStatus {
    pub metric: MetricKind,
    pub source: &'static str,
    pub status: Status,
    pub style: DisplayStyle,
}

/// Top-K alert list plus the audible cue flag.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlertSelection {
    pub alerts: Vec<DisplayedAlert>,
    pub audible_critical: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub tick: u64,
    pub timestamp: DateTime<Utc>,
    pub readings: CurrentReadings,
    pub distance_m: f64,
    pub peak_vibration: f64,
    pub slipping_wheels: Vec<u8>,
    pub statuses: Vec<MetricStatus>,
    pub alerts: AlertSelection,
    pub history: Vec<SeriesData>,
}
