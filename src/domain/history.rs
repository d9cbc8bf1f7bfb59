// Rolling history - bounded per-metric buffers for short-term trends
use serde::Serialize;
use std::collections::{HashMap, VecDeque};

use super::telemetry::TimeSeriesPoint;

/// Fixed-capacity FIFO buffer. The oldest entry is evicted first.
#[derive(Debug, Clone)]
pub struct RollingWindow<T> {
    capacity: usize,
    items: VecDeque<T>,
}

impl<T> RollingWindow<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            items: VecDeque::with_capacity(capacity + 1),
        }
    }

    pub fn push(&mut self, item: T) {
        self.items.push_back(item);
        while self.items.len() > self.capacity {
            self.items.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// The newest `n` entries, oldest first.
    pub fn last_n(&self, n: usize) -> impl Iterator<Item = &T> {
        self.items.iter().skip(self.items.len().saturating_sub(n))
    }
}

impl<T: Clone> RollingWindow<T> {
    pub fn to_vec(&self) -> Vec<T> {
        self.items.iter().cloned().collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryMetric {
    Temperature,
    Vibration,
    Voltage,
    Current,
    AngularRate,
    AccX,
    AccY,
    AccZ,
    Wheel1,
    Wheel2,
    Wheel3,
    Wheel4,
    Speed,
    Pitch,
    Roll,
}

impl HistoryMetric {
    pub const ALL: [HistoryMetric; 15] = [
        HistoryMetric::Temperature,
        HistoryMetric::Vibration,
        HistoryMetric::Voltage,
        HistoryMetric::Current,
        HistoryMetric::AngularRate,
        HistoryMetric::AccX,
        HistoryMetric::AccY,
        HistoryMetric::AccZ,
        HistoryMetric::Wheel1,
        HistoryMetric::Wheel2,
        HistoryMetric::Wheel3,
        HistoryMetric::Wheel4,
        HistoryMetric::Speed,
        HistoryMetric::Pitch,
        HistoryMetric::Roll,
    ];

    pub fn unit(&self) -> &'static str {
        match self {
            HistoryMetric::Temperature => "°C",
            HistoryMetric::Vibration => "g",
            HistoryMetric::Voltage => "V",
            HistoryMetric::Current => "A",
            HistoryMetric::AngularRate => "°/s",
            HistoryMetric::AccX | HistoryMetric::AccY | HistoryMetric::AccZ => "m/s²",
            HistoryMetric::Wheel1
            | HistoryMetric::Wheel2
            | HistoryMetric::Wheel3
            | HistoryMetric::Wheel4 => "rad/s",
            HistoryMetric::Speed => "m/s",
            HistoryMetric::Pitch | HistoryMetric::Roll => "°",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SeriesData {
    pub metric: HistoryMetric,
    pub unit: &'static str,
    pub points: Vec<TimeSeriesPoint>,
}

/// One rolling window per charted metric, all sharing the same capacity.
#[derive(Debug, Clone)]
pub struct HistoryStore {
    windows: HashMap<HistoryMetric, RollingWindow<TimeSeriesPoint>>,
}

impl HistoryStore {
    pub fn new(capacity: usize) -> Self {
        let windows = HistoryMetric::ALL
            .into_iter()
            .map(|metric| (metric, RollingWindow::new(capacity)))
            .collect();
        Self { windows }
    }

    pub fn append(&mut self, metric: HistoryMetric, point: TimeSeriesPoint) {
        if let Some(window) = self.windows.get_mut(&metric) {
            window.push(point);
        }
    }

    /// Maximum over the newest `last_n` values, `None` while empty.
    pub fn peak(&self, metric: HistoryMetric, last_n: usize) -> Option<f64> {
        let window = self.windows.get(&metric)?;
        if window.is_empty() {
            return None;
        }
        window
            .last_n(last_n)
            .map(|p| p.value)
            .reduce(f64::max)
    }

    pub fn snapshot(&self, metric: HistoryMetric) -> Vec<TimeSeriesPoint> {
        self.windows
            .get(&metric)
            .map(RollingWindow::to_vec)
            .unwrap_or_default()
    }

    /// Snapshots of every charted metric, in a stable order.
    pub fn series(&self) -> Vec<SeriesData> {
        HistoryMetric::ALL
            .into_iter()
            .map(|metric| SeriesData {
                metric,
                unit: metric.unit(),
                points: self.snapshot(metric),
            })
            .collect()
    }
}
