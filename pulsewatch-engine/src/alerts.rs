//! Threshold alerts over component summaries.

use std::collections::BTreeMap;

use pulsewatch_types::{Alert, AlertKind, AlertSeverity, AnomalySeverity, ComponentSummary, Timestamp};
use uuid::Uuid;

use crate::analyzer::Analyzer;
use crate::config::HealthThresholds;
use crate::error::Result;
use crate::overview;

/// Generate alerts from summaries, optionally keeping a single severity.
///
/// Alerts are ordered by severity (critical first), then newest first.
pub fn alerts_from_summaries<'a>(
    summaries: impl IntoIterator<Item = &'a ComponentSummary>,
    thresholds: &HealthThresholds,
    now: Timestamp,
    severity_filter: Option<AlertSeverity>,
) -> Vec<Alert> {
    let mut alerts = Vec::new();

    for summary in summaries {
        if let Some(alert) = health_alert(summary, thresholds, now) {
            alerts.push(alert);
        }

        for analysis in summary.metric_analyses.values() {
            let Some(anomaly) = analysis.latest_anomaly_at(AnomalySeverity::High) else {
                continue;
            };
            let high_count = analysis.anomaly_count_at(AnomalySeverity::High);

            let mut details = BTreeMap::new();
            details.insert("value".to_string(), format!("{:.3}", anomaly.value));
            details.insert("deviation".to_string(), format!("{:.3}", anomaly.deviation));
            details.insert(
                "expected_range".to_string(),
                format!("{:.3}..{:.3}", anomaly.expected_range.0, anomaly.expected_range.1),
            );
            details.insert("high_anomalies".to_string(), high_count.to_string());

            alerts.push(Alert {
                id: Uuid::new_v4().to_string(),
                kind: AlertKind::Anomaly,
                severity: AlertSeverity::High,
                component: summary.component.clone(),
                metric: Some(analysis.metric_name.clone()),
                message: format!(
                    "High-severity anomaly in {}/{}: value {:.2} deviates {:.2} from average {:.2}",
                    summary.component,
                    analysis.metric_name,
                    anomaly.value,
                    anomaly.deviation,
                    analysis.average
                ),
                timestamp_ms: anomaly.timestamp_ms,
                details,
            });
        }
    }

    if let Some(filter) = severity_filter {
        alerts.retain(|alert| alert.severity == filter);
    }

    alerts.sort_by(|a, b| {
        b.severity
            .cmp(&a.severity)
            .then_with(|| b.timestamp_ms.cmp(&a.timestamp_ms))
    });
    alerts
}

fn health_alert(
    summary: &ComponentSummary,
    thresholds: &HealthThresholds,
    now: Timestamp,
) -> Option<Alert> {
    let score = summary.health_score;
    let severity = if score < thresholds.fair_score {
        AlertSeverity::Critical
    } else if score < thresholds.good_score {
        AlertSeverity::High
    } else {
        return None;
    };

    let mut details = BTreeMap::new();
    details.insert("health_score".to_string(), format!("{score:.1}"));
    details.insert("status".to_string(), summary.status.to_string());
    details.insert(
        "anomalous_metrics".to_string(),
        summary.anomalous_metrics.to_string(),
    );
    if !summary.problematic_metrics.is_empty() {
        details.insert(
            "problematic_metrics".to_string(),
            summary.problematic_metrics.join(","),
        );
    }

    Some(Alert {
        id: Uuid::new_v4().to_string(),
        kind: AlertKind::HealthScore,
        severity,
        component: summary.component.clone(),
        metric: None,
        message: format!("{} health score is {score:.1}", summary.component),
        timestamp_ms: now,
        details,
    })
}

/// Alerts for every component with data in the last `hours`.
pub async fn alerts(
    analyzer: &Analyzer,
    hours: u64,
    severity_filter: Option<AlertSeverity>,
) -> Result<Vec<Alert>> {
    let summaries = overview::component_summaries(analyzer, hours).await?;
    let alerts = alerts_from_summaries(
        summaries.values(),
        analyzer.thresholds(),
        analyzer.clock().now_ms(),
        severity_filter,
    );
    if !alerts.is_empty() {
        tracing::info!(count = alerts.len(), hours, "alerts generated");
    }
    Ok(alerts)
}

#[cfg(test)]
mod tests {
    use pulsewatch_types::{AnalysisResult, Anomaly};

    use super::*;

    fn summary(component: &str, score: f64, anomaly_times: &[(&str, Vec<(Timestamp, AnomalySeverity)>)]) -> ComponentSummary {
        let thresholds = HealthThresholds::default();
        let metric_analyses = anomaly_times
            .iter()
            .map(|(metric, anomalies)| {
                let mut analysis = AnalysisResult::empty(component, *metric, 24, 0);
                analysis.anomalies = anomalies
                    .iter()
                    .map(|(ts, severity)| Anomaly {
                        timestamp_ms: *ts,
                        value: 500.0,
                        expected_range: (0.0, 100.0),
                        deviation: 450.0,
                        severity: *severity,
                    })
                    .collect();
                (metric.to_string(), analysis)
            })
            .collect();
        ComponentSummary {
            component: component.to_string(),
            window_hours: 24,
            health_score: score,
            status: thresholds.status_for(score),
            metric_analyses,
            recommendations: Vec::new(),
            anomalous_metrics: 0,
            stable_metrics: 0,
            trending_metrics: 0,
            problematic_metrics: Vec::new(),
        }
    }

    fn generate(summaries: &[ComponentSummary], filter: Option<AlertSeverity>) -> Vec<Alert> {
        alerts_from_summaries(summaries, &HealthThresholds::default(), 1_000, filter)
    }

    #[test]
    fn health_score_bands() {
        let alerts = generate(
            &[
                summary("a", 49.9, &[]),
                summary("b", 50.0, &[]),
                summary("c", 69.9, &[]),
                summary("d", 70.0, &[]),
            ],
            None,
        );

        let by_component: Vec<(&str, AlertSeverity)> = alerts
            .iter()
            .map(|a| (a.component.as_str(), a.severity))
            .collect();
        assert_eq!(by_component.len(), 3);
        assert_eq!(by_component[0], ("a", AlertSeverity::Critical));
        assert!(by_component.contains(&("b", AlertSeverity::High)));
        assert!(by_component.contains(&("c", AlertSeverity::High)));
        assert!(alerts.iter().all(|a| a.kind == AlertKind::HealthScore && a.metric.is_none()));
    }

    #[test]
    fn anomaly_alert_references_latest_high_anomaly() {
        let alerts = generate(
            &[summary(
                "api",
                95.0,
                &[
                    (
                        "response_time",
                        vec![
                            (100, AnomalySeverity::High),
                            (300, AnomalySeverity::High),
                            (400, AnomalySeverity::Medium),
                        ],
                    ),
                    ("cpu_usage", vec![(500, AnomalySeverity::Medium)]),
                ],
            )],
            None,
        );

        assert_eq!(alerts.len(), 1);
        let alert = &alerts[0];
        assert_eq!(alert.kind, AlertKind::Anomaly);
        assert_eq!(alert.severity, AlertSeverity::High);
        assert_eq!(alert.metric.as_deref(), Some("response_time"));
        assert_eq!(alert.timestamp_ms, 300);
        assert_eq!(alert.details.get("high_anomalies").map(String::as_str), Some("2"));
    }

    #[test]
    fn sorted_by_severity_then_newest() {
        let alerts = generate(
            &[
                summary("old", 90.0, &[("latency", vec![(10, AnomalySeverity::High)])]),
                summary("new", 90.0, &[("latency", vec![(20, AnomalySeverity::High)])]),
                summary("down", 10.0, &[]),
            ],
            None,
        );

        let order: Vec<&str> = alerts.iter().map(|a| a.component.as_str()).collect();
        assert_eq!(order, vec!["down", "new", "old"]);
    }

    #[test]
    fn severity_filter_keeps_only_matching() {
        let summaries = [
            summary("a", 10.0, &[("latency", vec![(10, AnomalySeverity::High)])]),
            summary("b", 60.0, &[]),
            summary("c", 20.0, &[]),
        ];

        let critical = generate(&summaries, Some(AlertSeverity::Critical));
        assert_eq!(critical.len(), 2);
        assert!(critical.iter().all(|a| a.severity == AlertSeverity::Critical));

        let low = generate(&summaries, Some(AlertSeverity::Low));
        assert!(low.is_empty());
    }

    #[test]
    fn ids_are_unique() {
        let alerts = generate(&[summary("a", 10.0, &[]), summary("b", 10.0, &[])], None);
        assert_ne!(alerts[0].id, alerts[1].id);
    }
}
