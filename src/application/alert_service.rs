// Alert service - threshold evaluation and top-K prioritization
use std::collections::HashMap;

use crate::domain::alert::{
    AlertEvent, AlertRule, AudibleScope, DisplayedAlert, MetricKind, MonitoredReading, Severity,
};
use crate::domain::dashboard::AlertSelection;

#[derive(Debug, Clone)]
pub struct AlertEvaluator {
    rules: HashMap<MetricKind, AlertRule>,
}

impl AlertEvaluator {
    pub fn new(rules: HashMap<MetricKind, AlertRule>) -> Self {
        Self { rules }
    }

    pub fn classify(&self, reading: &MonitoredReading) -> Option<Severity> {
        self.rules.get(&reading.metric)?.threshold.classify(reading.value)
    }

    /// At most one event per reading; output keeps the readings' order.
    pub fn evaluate(&self, readings: &[MonitoredReading]) -> Vec<AlertEvent> {
        readings
            .iter()
            .filter_map(|reading| {
                let rule = self.rules.get(&reading.metric)?;
                let severity = rule.threshold.classify(reading.value)?;
                Some(AlertEvent::new(reading, rule, severity))
            })
            .collect()
    }
}

#[derive(Debug, Clone)]
pub struct AlertPrioritizer {
    top_k: usize,
    audible_scope: AudibleScope,
}

impl AlertPrioritizer {
    pub fn new(top_k: usize, audible_scope: AudibleScope) -> Self {
        Self {
            top_k,
            audible_scope,
        }
    }

    /// Ranks by descending weight and keeps the first `top_k`.
    ///
    /// The sort is stable, so equal weights keep evaluation order. With no
    /// alerts the selection is a single "all systems normal" entry.
    pub fn select(&self, mut alerts: Vec<AlertEvent>) -> AlertSelection {
        alerts.sort_by(|a, b| b.priority.cmp(&a.priority));

        let any_critical = alerts.iter().any(|a| a.severity == Severity::Critical);

        alerts.truncate(self.top_k);
        let displayed_critical = alerts.iter().any(|a| a.severity == Severity::Critical);

        let audible_critical = match self.audible_scope {
            AudibleScope::Displayed => displayed_critical,
            AudibleScope::AnyActive => any_critical,
        };

        let alerts: Vec<DisplayedAlert> = if alerts.is_empty() {
            vec![DisplayedAlert::all_normal()]
        } else {
            alerts.into_iter().map(DisplayedAlert::from).collect()
        };

        AlertSelection {
            alerts,
            audible_critical,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::alert::{ALL_NORMAL_MESSAGE, Status};
    use crate::infrastructure::config::MonitorConfig;

    fn evaluator() -> AlertEvaluator {
        AlertEvaluator::new(MonitorConfig::default().alert_rules())
    }

    fn reading(metric: MetricKind, source: &'static str, value: f64) -> MonitoredReading {
        MonitoredReading {
            metric,
            source,
            label: source,
            value,
        }
    }

    fn event(source: &'static str, severity: Severity, priority: u32) -> AlertEvent {
        AlertEvent {
            metric: MetricKind::Current,
            source,
            message: source.to_string(),
            severity,
            priority,
        }
    }

    fn all_quiet() -> Vec<MonitoredReading> {
        vec![
            reading(MetricKind::Temperature, "temperature", 40.0),
            reading(MetricKind::Vibration, "vibration", 0.1),
            reading(MetricKind::Voltage, "voltage", 24.0),
            reading(MetricKind::Current, "current", 3.0),
            reading(MetricKind::WheelSlip, "left_slip", 0.05),
            reading(MetricKind::WheelSlip, "right_slip", 0.1),
        ]
    }

    #[test]
    fn test_one_alert_per_reading_and_exclusive_tiers() {
        let evaluator = evaluator();
        for value in [60.0, 70.5, 84.9, 85.0, 85.1, 95.0] {
            let alerts =
                evaluator.evaluate(&[reading(MetricKind::Temperature, "temperature", value)]);
            assert!(alerts.len() <= 1);
        }

        let r = reading(MetricKind::Temperature, "temperature", 84.9);
        assert_eq!(evaluator.classify(&r), Some(Severity::Warning));
        let r = reading(MetricKind::Temperature, "temperature", 85.1);
        assert_eq!(evaluator.classify(&r), Some(Severity::Critical));
        let r = reading(MetricKind::Temperature, "temperature", 69.9);
        assert_eq!(evaluator.classify(&r), None);
    }

    #[test]
    fn test_quiet_tick_yields_normal_fallback() {
        let alerts = evaluator().evaluate(&all_quiet());
        assert!(alerts.is_empty());

        let selection = AlertPrioritizer::new(3, AudibleScope::Displayed).select(alerts);
        assert_eq!(selection.alerts.len(), 1);
        assert_eq!(selection.alerts[0].message, ALL_NORMAL_MESSAGE);
        assert_eq!(selection.alerts[0].level, Status::Normal);
        assert!(!selection.audible_critical);
    }

    #[test]
    fn test_slip_outranks_temperature_at_same_tier() {
        let mut readings = all_quiet();
        readings[0].value = 90.0; // critical temperature
        readings[5].value = 0.32; // critical right slip

        let alerts = evaluator().evaluate(&readings);
        let selection = AlertPrioritizer::new(3, AudibleScope::Displayed).select(alerts);

        let sources: Vec<_> = selection.alerts.iter().map(|a| a.source).collect();
        assert_eq!(sources, vec![Some("right_slip"), Some("temperature")]);
        assert!(selection.audible_critical);
    }

    #[test]
    fn test_top_k_is_bounded_and_sorted() {
        let mut readings = all_quiet();
        readings[0].value = 75.0; // warn 30
        readings[1].value = 0.3; // critical 45
        readings[2].value = 21.0; // warn 20
        readings[3].value = 6.0; // warn 20
        readings[4].value = 0.25; // warn 35
        readings[5].value = 0.22; // warn 35

        let alerts = evaluator().evaluate(&readings);
        assert_eq!(alerts.len(), 6);

        let selection = AlertPrioritizer::new(3, AudibleScope::Displayed).select(alerts);
        assert_eq!(selection.alerts.len(), 3);
        let priorities: Vec<u32> = selection.alerts.iter().map(|a| a.priority).collect();
        assert_eq!(priorities, vec![45, 35, 35]);
        // Equal weights keep evaluation order.
        assert_eq!(selection.alerts[1].source, Some("left_slip"));
        assert_eq!(selection.alerts[2].source, Some("right_slip"));
    }

    #[test]
    fn test_critical_below_cutoff_is_silent_when_displayed_only() {
        let alerts = vec![
            event("a", Severity::Warning, 60),
            event("b", Severity::Warning, 59),
            event("c", Severity::Warning, 58),
            event("d", Severity::Critical, 10),
        ];

        let displayed = AlertPrioritizer::new(3, AudibleScope::Displayed).select(alerts.clone());
        assert!(!displayed.audible_critical);
        assert!(displayed.alerts.iter().all(|a| a.level == Status::Warning));

        let any = AlertPrioritizer::new(3, AudibleScope::AnyActive).select(alerts);
        assert!(any.audible_critical);
        assert_eq!(any.alerts.len(), 3);
    }

    #[test]
    fn test_audible_iff_selection_has_critical() {
        let prioritizer = AlertPrioritizer::new(3, AudibleScope::Displayed);

        let selection = prioritizer.select(vec![event("a", Severity::Warning, 30)]);
        assert!(!selection.audible_critical);

        let selection = prioritizer.select(vec![
            event("a", Severity::Warning, 30),
            event("b", Severity::Critical, 40),
        ]);
        assert!(selection.audible_critical);
        assert_eq!(selection.alerts[0].level, Status::Critical);
    }
}
