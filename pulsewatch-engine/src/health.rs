//! Per-component health scoring.

use std::collections::BTreeMap;

use pulsewatch_types::{window_start, AnalysisResult, ComponentSummary, Trend};

use crate::analyzer::Analyzer;
use crate::config::HealthThresholds;
use crate::error::{Result, ValidationError};
use crate::policy::{self, ComponentKind};

/// Score a single metric analysis from 0 to 100.
///
/// Anomalies cost `anomaly_penalty` each up to `max_anomaly_penalty`; a trend
/// in the metric's bad direction costs `trend_penalty`; a stable series
/// without anomalies earns back up to `stability_bonus`.
pub fn metric_health_score(analysis: &AnalysisResult, thresholds: &HealthThresholds) -> f64 {
    let mut score = 100.0;

    let anomaly_penalty = analysis.anomalies.len() as f64 * thresholds.anomaly_penalty;
    score -= anomaly_penalty.min(thresholds.max_anomaly_penalty);

    if policy::is_concerning(&analysis.metric_name, analysis.trend) {
        score -= thresholds.trend_penalty;
    }

    if analysis.trend == Trend::Stable && analysis.anomalies.is_empty() {
        score = (score + thresholds.stability_bonus).min(100.0);
    }

    score.clamp(0.0, 100.0)
}

/// Score given to a component without metrics in the window.
pub const NEUTRAL_HEALTH_SCORE: f64 = 50.0;

/// Roll per-metric analyses up into a component summary.
pub fn build_summary(
    component: &str,
    window_hours: u64,
    metric_analyses: BTreeMap<String, AnalysisResult>,
    thresholds: &HealthThresholds,
) -> ComponentSummary {
    let health_score = if metric_analyses.is_empty() {
        NEUTRAL_HEALTH_SCORE
    } else {
        let total: f64 = metric_analyses
            .values()
            .map(|analysis| metric_health_score(analysis, thresholds))
            .sum();
        total / metric_analyses.len() as f64
    };

    let anomalous_metrics = metric_analyses.values().filter(|a| a.has_anomalies()).count();
    let stable_metrics = metric_analyses
        .values()
        .filter(|a| a.trend == Trend::Stable)
        .count();
    let trending_metrics = metric_analyses
        .values()
        .filter(|a| a.trend.is_directional())
        .count();

    let mut problematic: Vec<&AnalysisResult> = metric_analyses
        .values()
        .filter(|a| a.has_anomalies() || a.trend.is_directional())
        .collect();
    problematic.sort_by(|a, b| {
        b.anomalies
            .len()
            .cmp(&a.anomalies.len())
            .then_with(|| a.metric_name.cmp(&b.metric_name))
    });
    let problematic_metrics: Vec<String> =
        problematic.iter().map(|a| a.metric_name.clone()).collect();

    let status = thresholds.status_for(health_score);
    let mut recommendations = vec![band_message(component, health_score, thresholds)];

    if metric_analyses.is_empty() {
        recommendations.push(format!(
            "No metrics recorded for {component} in the last {window_hours}h."
        ));
    }

    if !problematic_metrics.is_empty() {
        recommendations.push(format!(
            "Most problematic metrics: {}.",
            problematic_metrics.join(", ")
        ));
    }

    if health_score < thresholds.good_score {
        if let Some(hint) = strategic_hint(component) {
            recommendations.push(hint);
        }
    }

    ComponentSummary {
        component: component.to_string(),
        window_hours,
        health_score,
        status,
        metric_analyses,
        recommendations,
        anomalous_metrics,
        stable_metrics,
        trending_metrics,
        problematic_metrics,
    }
}

fn band_message(component: &str, score: f64, thresholds: &HealthThresholds) -> String {
    if score >= thresholds.excellent_score {
        format!("{component} is in excellent health ({score:.1}).")
    } else if score >= thresholds.good_score {
        format!("{component} is in good health ({score:.1}).")
    } else if score >= thresholds.fair_score {
        format!("{component} needs attention ({score:.1}).")
    } else {
        format!("{component} requires immediate investigation ({score:.1}).")
    }
}

fn strategic_hint(component: &str) -> Option<String> {
    match ComponentKind::of(component) {
        ComponentKind::Database => Some(format!(
            "Review slow queries, missing indexes and connection pool sizing for {component}."
        )),
        ComponentKind::Api => Some(format!(
            "Review endpoint latency, error handling and rate limits for {component}."
        )),
        ComponentKind::Cache => Some(format!(
            "Review eviction policy, TTLs and key distribution for {component}."
        )),
        ComponentKind::Other => None,
    }
}

/// Analyze every metric `component` recorded in the last `hours` and summarize.
pub async fn summarize(analyzer: &Analyzer, component: &str, hours: u64) -> Result<ComponentSummary> {
    if hours == 0 {
        return Err(ValidationError::InvalidWindow { hours }.into());
    }

    let since = window_start(analyzer.clock().now_ms(), hours);
    let metric_names = analyzer
        .store()
        .distinct_metric_names(component, since)
        .await
        .map_err(|err| {
            tracing::warn!(component, error = %err, "failed to list component metrics");
            err
        })?;

    let mut analyses = BTreeMap::new();
    for metric_name in metric_names {
        let analysis = analyzer.analyze(component, &metric_name, hours).await?;
        analyses.insert(metric_name, analysis);
    }

    let summary = build_summary(component, hours, analyses, analyzer.thresholds());
    tracing::debug!(
        component,
        score = summary.health_score,
        metrics = summary.metric_count(),
        "component summarized"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use pulsewatch_types::{Anomaly, AnomalySeverity, HealthStatus};

    use super::*;

    fn analysis(metric: &str, trend: Trend, anomalies: usize) -> AnalysisResult {
        let mut result = AnalysisResult::empty("api", metric, 24, 0);
        result.trend = trend;
        result.sample_count = 20;
        result.recommendations.clear();
        result.anomalies = (0..anomalies)
            .map(|i| Anomaly {
                timestamp_ms: i as u64,
                value: 100.0,
                expected_range: (0.0, 10.0),
                deviation: 90.0,
                severity: AnomalySeverity::High,
            })
            .collect();
        result
    }

    fn analyses(items: Vec<AnalysisResult>) -> BTreeMap<String, AnalysisResult> {
        items
            .into_iter()
            .map(|a| (a.metric_name.clone(), a))
            .collect()
    }

    #[test]
    fn stable_clean_metric_scores_full() {
        let t = HealthThresholds::default();
        assert_eq!(metric_health_score(&analysis("cpu_usage", Trend::Stable, 0), &t), 100.0);
    }

    #[test]
    fn anomaly_penalty_is_capped() {
        let t = HealthThresholds::default();
        assert_eq!(metric_health_score(&analysis("x", Trend::InsufficientData, 2), &t), 80.0);
        assert_eq!(metric_health_score(&analysis("x", Trend::InsufficientData, 5), &t), 50.0);
        assert_eq!(metric_health_score(&analysis("x", Trend::InsufficientData, 12), &t), 50.0);
    }

    #[test]
    fn concerning_trend_costs_twenty() {
        let t = HealthThresholds::default();
        assert_eq!(metric_health_score(&analysis("cpu_usage", Trend::Increasing, 0), &t), 80.0);
        assert_eq!(metric_health_score(&analysis("cpu_usage", Trend::Decreasing, 0), &t), 100.0);
        assert_eq!(metric_health_score(&analysis("throughput", Trend::Decreasing, 0), &t), 80.0);
        assert_eq!(
            metric_health_score(&analysis("response_time", Trend::Increasing, 5), &t),
            30.0
        );
    }

    #[test]
    fn empty_component_is_neutral() {
        let summary = build_summary("api", 24, BTreeMap::new(), &HealthThresholds::default());
        assert_eq!(summary.health_score, 50.0);
        assert_eq!(summary.status, HealthStatus::Fair);
        assert!(summary.metric_analyses.is_empty());
        assert!(summary.recommendations.iter().any(|r| r.contains("No metrics recorded")));
    }

    #[test]
    fn component_score_is_mean_of_metric_scores() {
        let summary = build_summary(
            "worker",
            24,
            analyses(vec![
                analysis("cpu_usage", Trend::Stable, 0),
                analysis("memory_usage", Trend::Increasing, 3),
            ]),
            &HealthThresholds::default(),
        );
        // 100 and 100 - 30 - 20 = 50
        assert_eq!(summary.health_score, 75.0);
        assert_eq!(summary.status, HealthStatus::Good);
        assert_eq!(summary.anomalous_metrics, 1);
        assert_eq!(summary.stable_metrics, 1);
        assert_eq!(summary.trending_metrics, 1);
        assert_eq!(summary.problematic_metrics, vec!["memory_usage".to_string()]);
        assert!(summary.recommendations[0].contains("good health"));
    }

    #[test]
    fn problematic_metrics_ordered_by_anomaly_count() {
        let summary = build_summary(
            "api",
            24,
            analyses(vec![
                analysis("a_metric", Trend::Increasing, 0),
                analysis("b_metric", Trend::InsufficientData, 4),
                analysis("c_metric", Trend::Stable, 1),
                analysis("d_metric", Trend::Stable, 0),
            ]),
            &HealthThresholds::default(),
        );
        assert_eq!(
            summary.problematic_metrics,
            vec!["b_metric".to_string(), "c_metric".to_string(), "a_metric".to_string()]
        );
    }

    #[test]
    fn unhealthy_components_get_strategic_hints() {
        let poor = analyses(vec![analysis("response_time", Trend::Increasing, 5)]);

        let summary = build_summary("database", 24, poor.clone(), &HealthThresholds::default());
        assert_eq!(summary.status, HealthStatus::Poor);
        assert!(summary.recommendations[0].contains("immediate investigation"));
        assert!(summary.recommendations.iter().any(|r| r.contains("missing indexes")));

        let summary = build_summary("worker", 24, poor, &HealthThresholds::default());
        assert!(!summary.recommendations.iter().any(|r| r.contains("Review")));

        let healthy = analyses(vec![analysis("response_time", Trend::Stable, 0)]);
        let summary = build_summary("database", 24, healthy, &HealthThresholds::default());
        assert!(!summary.recommendations.iter().any(|r| r.contains("missing indexes")));
    }
}
