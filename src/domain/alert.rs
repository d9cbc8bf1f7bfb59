// Alert domain model - thresholds, severities and display styling
use serde::{Deserialize, Serialize};
use std::fmt;

/// Monitored quantity classes. Both wheel-slip channels share `WheelSlip`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    Temperature,
    Vibration,
    Voltage,
    Current,
    WheelSlip,
}

impl MetricKind {
    pub fn unit(&self) -> &'static str {
        match self {
            MetricKind::Temperature => "°C",
            MetricKind::Vibration => "g",
            MetricKind::Voltage => "V",
            MetricKind::Current => "A",
            MetricKind::WheelSlip => "",
        }
    }

    pub fn precision(&self) -> usize {
        match self {
            MetricKind::Vibration | MetricKind::WheelSlip => 2,
            _ => 1,
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MetricKind::Temperature => "temperature",
            MetricKind::Vibration => "vibration",
            MetricKind::Voltage => "voltage",
            MetricKind::Current => "current",
            MetricKind::WheelSlip => "wheel_slip",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Alert when the value rises above the boundary.
    Above,
    /// Alert when the value falls below the boundary.
    Below,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Above => f.write_str("above"),
            Direction::Below => f.write_str("below"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Warning,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdSpec {
    pub warn: f64,
    pub critical: f64,
    pub direction: Direction,
}

impl ThresholdSpec {
    pub fn above(warn: f64, critical: f64) -> Self {
        Self {
            warn,
            critical,
            direction: Direction::Above,
        }
    }

    pub fn below(warn: f64, critical: f64) -> Self {
        Self {
            warn,
            critical,
            direction: Direction::Below,
        }
    }

    /// Critical is checked first, so a value is never both.
    pub fn classify(&self, value: f64) -> Option<Severity> {
        let beyond = |boundary: f64| match self.direction {
            Direction::Above => value > boundary,
            Direction::Below => value < boundary,
        };

        if beyond(self.critical) {
            Some(Severity::Critical)
        } else if beyond(self.warn) {
            Some(Severity::Warning)
        } else {
            None
        }
    }

    /// The warn boundary must be reached before the critical one.
    pub fn is_consistent(&self) -> bool {
        if !self.warn.is_finite() || !self.critical.is_finite() {
            return false;
        }
        match self.direction {
            Direction::Above => self.warn < self.critical,
            Direction::Below => self.warn > self.critical,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriorityWeights {
    pub warning: u32,
    pub critical: u32,
}

impl PriorityWeights {
    pub fn new(warning: u32, critical: u32) -> Self {
        Self { warning, critical }
    }

    pub fn for_severity(&self, severity: Severity) -> u32 {
        match severity {
            Severity::Warning => self.warning,
            Severity::Critical => self.critical,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AlertRule {
    pub threshold: ThresholdSpec,
    pub priority: PriorityWeights,
}

/// Which alerts feed the audible-critical flag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AudibleScope {
    /// Only alerts that made it into the displayed selection.
    #[default]
    Displayed,
    /// Any alert raised this tick, displayed or not.
    AnyActive,
}

/// A quantity sampled this tick, ready for classification.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonitoredReading {
    pub metric: MetricKind,
    pub source: &'static str,
    pub label: &'static str,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlertEvent {
    pub metric: MetricKind,
    pub source: &'static str,
    pub message: String,
    pub severity: Severity,
    pub priority: u32,
}

impl AlertEvent {
    pub fn new(reading: &MonitoredReading, rule: &AlertRule, severity: Severity) -> Self {
        Self {
            metric: reading.metric,
            source: reading.source,
            message: alert_message(reading, rule.threshold.direction, severity),
            severity,
            priority: rule.priority.for_severity(severity),
        }
    }
}

fn alert_message(reading: &MonitoredReading, direction: Direction, severity: Severity) -> String {
    let prefix = match (severity, direction) {
        (Severity::Critical, _) => "CRITICAL",
        (Severity::Warning, Direction::Above) => "High",
        (Severity::Warning, Direction::Below) => "Low",
    };
    format!(
        "{} {}: {:.*}{}",
        prefix,
        reading.label,
        reading.metric.precision(),
        reading.value,
        reading.metric.unit()
    )
}

/// Display level of a metric or an alert entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Normal,
    Warning,
    Critical,
}

impl From<Option<Severity>> for Status {
    fn from(severity: Option<Severity>) -> Self {
        match severity {
            None => Status::Normal,
            Some(Severity::Warning) => Status::Warning,
            Some(Severity::Critical) => Status::Critical,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DisplayStyle {
    pub color: &'static str,
    pub accent: &'static str,
    pub emphasis: bool,
}

const DISPLAY_STYLES: [(Status, DisplayStyle); 3] = [
    (
        Status::Normal,
        DisplayStyle {
            color: "#00ff99",
            accent: "success",
            emphasis: false,
        },
    ),
    (
        Status::Warning,
        DisplayStyle {
            color: "orange",
            accent: "warning",
            emphasis: false,
        },
    ),
    (
        Status::Critical,
        DisplayStyle {
            color: "red",
            accent: "danger",
            emphasis: true,
        },
    ),
];

impl Status {
    pub fn style(&self) -> DisplayStyle {
        DISPLAY_STYLES
            .iter()
            .find(|(status, _)| status == self)
            .map(|(_, style)| *style)
            .unwrap_or(DISPLAY_STYLES[0].1)
    }
}

/// Entry of the operator-facing alert list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplayedAlert {
    pub metric: Option<MetricKind>,
    pub source: Option<&'static str>,
    pub message: String,
    pub level: Status,
    pub priority: u32,
    pub style: DisplayStyle,
}

pub const ALL_NORMAL_MESSAGE: &str = "All systems normal";

impl DisplayedAlert {
    pub fn all_normal() -> Self {
        Self {
            metric: None,
            source: None,
            message: ALL_NORMAL_MESSAGE.to_string(),
            level: Status::Normal,
            priority: 0,
            style: Status::Normal.style(),
        }
    }
}

impl From<AlertEvent> for DisplayedAlert {
    fn from(event: AlertEvent) -> Self {
        let level = Status::from(Some(event.severity));
        Self {
            metric: Some(event.metric),
            source: Some(event.source),
            message: event.message,
            level,
            priority: event.priority,
            style: level.style(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_temperature_boundaries() {
        let spec = ThresholdSpec::above(70.0, 85.0);
        assert_eq!(spec.classify(84.9), Some(Severity::Warning));
        assert_eq!(spec.classify(85.1), Some(Severity::Critical));
        assert_eq!(spec.classify(69.9), None);
        assert_eq!(spec.classify(70.0), None);
    }

    #[test]
    fn test_voltage_falls_below() {
        let spec = ThresholdSpec::below(22.0, 20.0);
        assert_eq!(spec.classify(24.8), None);
        assert_eq!(spec.classify(21.5), Some(Severity::Warning));
        assert_eq!(spec.classify(19.0), Some(Severity::Critical));
    }

    #[test]
    fn test_consistency_depends_on_direction() {
        assert!(ThresholdSpec::above(70.0, 85.0).is_consistent());
        assert!(!ThresholdSpec::above(85.0, 70.0).is_consistent());
        assert!(ThresholdSpec::below(22.0, 20.0).is_consistent());
        assert!(!ThresholdSpec::below(20.0, 22.0).is_consistent());
        assert!(!ThresholdSpec::above(f64::NAN, 1.0).is_consistent());
    }

    #[test]
    fn test_messages_follow_direction() {
        let rule = AlertRule {
            threshold: ThresholdSpec::below(22.0, 20.0),
            priority: PriorityWeights::new(20, 40),
        };
        let reading = MonitoredReading {
            metric: MetricKind::Voltage,
            source: "battery_voltage",
            label: "voltage",
            value: 21.46,
        };
        let event = AlertEvent::new(&reading, &rule, Severity::Warning);
        assert_eq!(event.message, "Low voltage: 21.5V");
        assert_eq!(event.priority, 20);

        let event = AlertEvent::new(&reading, &rule, Severity::Critical);
        assert_eq!(event.message, "CRITICAL voltage: 21.5V");
        assert_eq!(event.priority, 40);
    }

    #[test]
    fn test_style_table_covers_every_status() {
        assert_eq!(Status::Normal.style().accent, "success");
        assert_eq!(Status::Warning.style().color, "orange");
        assert!(Status::Critical.style().emphasis);
        assert_eq!(Status::from(None), Status::Normal);
    }
}
