//! Statistical analysis of a single series.

use std::sync::Arc;

use pulsewatch_types::{
    window_start, AnalysisResult, Anomaly, AnomalySeverity, MetricSample, SeriesKey, Timestamp,
    Trend,
};

use crate::cache::AnalysisCache;
use crate::clock::Clock;
use crate::config::HealthThresholds;
use crate::error::{Result, ValidationError};
use crate::policy::{self, ComponentKind, Polarity};
use crate::stats;
use crate::store::MetricStore;

/// Computes and caches [`AnalysisResult`]s.
#[derive(Debug)]
pub struct Analyzer {
    store: Arc<dyn MetricStore>,
    cache: Arc<AnalysisCache>,
    clock: Arc<dyn Clock>,
    thresholds: HealthThresholds,
}

impl Analyzer {
    pub fn new(
        store: Arc<dyn MetricStore>,
        cache: Arc<AnalysisCache>,
        clock: Arc<dyn Clock>,
        thresholds: HealthThresholds,
    ) -> Self {
        Self {
            store,
            cache,
            clock,
            thresholds,
        }
    }

    pub fn thresholds(&self) -> &HealthThresholds {
        &self.thresholds
    }

    pub(crate) fn store(&self) -> &dyn MetricStore {
        self.store.as_ref()
    }

    pub(crate) fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    /// Analyze the last `hours` of one series.
    ///
    /// Served from cache while fresh. Store failures are propagated.
    pub async fn analyze(
        &self,
        component: &str,
        metric_name: &str,
        hours: u64,
    ) -> Result<AnalysisResult> {
        if hours == 0 {
            return Err(ValidationError::InvalidWindow { hours }.into());
        }

        let key = SeriesKey::new(component, metric_name);
        if let Some(cached) = self.cache.get(&key, hours) {
            tracing::debug!(series = %key, hours, "analysis cache hit");
            return Ok(cached);
        }
        tracing::debug!(series = %key, hours, "analysis cache miss");

        let ticket = self.cache.ticket(&key);
        let now = self.clock.now_ms();
        let samples = self
            .store
            .select_range(component, metric_name, window_start(now, hours))
            .await
            .map_err(|err| {
                tracing::warn!(series = %key, error = %err, "failed to load series history");
                err
            })?;

        let result = analyze_samples(component, metric_name, hours, &samples, &self.thresholds, now);
        if !self.cache.insert(result.clone(), &ticket) {
            tracing::debug!(series = %key, "series changed during analysis, not caching");
        }
        Ok(result)
    }
}

/// Analyze a set of samples from one series.
///
/// Samples are sorted by timestamp first, so callers may pass them in any order.
pub fn analyze_samples(
    component: &str,
    metric_name: &str,
    window_hours: u64,
    samples: &[MetricSample],
    thresholds: &HealthThresholds,
    computed_at: Timestamp,
) -> AnalysisResult {
    if samples.is_empty() {
        return AnalysisResult::empty(component, metric_name, window_hours, computed_at);
    }

    let mut ordered: Vec<&MetricSample> = samples.iter().collect();
    ordered.sort_by_key(|s| s.timestamp_ms);
    let values: Vec<f64> = ordered.iter().map(|s| s.value).collect();

    let summary = stats::describe(&values);
    let (slope, trend) = classify_trend(&values, summary.average, thresholds);
    let anomalies = detect_anomalies(&ordered, summary.average, summary.std_deviation, thresholds);

    let mut result = AnalysisResult {
        component: component.to_string(),
        metric_name: metric_name.to_string(),
        window_hours,
        sample_count: summary.count,
        average: summary.average,
        min: summary.min,
        max: summary.max,
        median: summary.median,
        std_deviation: summary.std_deviation,
        slope,
        trend,
        anomalies,
        recommendations: Vec::new(),
        computed_at,
    };
    result.recommendations = recommendations(&result, thresholds);
    result
}

fn classify_trend(values: &[f64], mean: f64, thresholds: &HealthThresholds) -> (f64, Trend) {
    if values.len() < thresholds.trend_min_points {
        return (0.0, Trend::InsufficientData);
    }

    let slope = stats::ols_slope(values);
    let trend = if slope == 0.0 || slope.abs() < thresholds.trend_stability_ratio * mean.abs() {
        Trend::Stable
    } else if slope > 0.0 {
        Trend::Increasing
    } else {
        Trend::Decreasing
    };
    (slope, trend)
}

fn detect_anomalies(
    ordered: &[&MetricSample],
    mean: f64,
    std_deviation: f64,
    thresholds: &HealthThresholds,
) -> Vec<Anomaly> {
    if std_deviation == 0.0 {
        return Vec::new();
    }

    let threshold = thresholds.anomaly_sigma * std_deviation;
    let high_threshold = thresholds.high_anomaly_sigma * std_deviation;

    ordered
        .iter()
        .filter_map(|sample| {
            let deviation = (sample.value - mean).abs();
            if deviation <= threshold {
                return None;
            }
            let severity = if deviation > high_threshold {
                AnomalySeverity::High
            } else {
                AnomalySeverity::Medium
            };
            Some(Anomaly {
                timestamp_ms: sample.timestamp_ms,
                value: sample.value,
                expected_range: (mean - threshold, mean + threshold),
                deviation,
                severity,
            })
        })
        .collect()
}

fn recommendations(result: &AnalysisResult, thresholds: &HealthThresholds) -> Vec<String> {
    let metric = result.metric_name.as_str();
    let mut out = Vec::new();

    if policy::is_concerning(metric, result.trend) {
        let direction = match policy::polarity_of(metric) {
            Some(Polarity::FallingIsBad) => "downward",
            _ => "upward",
        };
        out.push(format!(
            "{metric} is trending {direction} on {}; investigate before it degrades further.",
            result.component
        ));
    }

    match ComponentKind::of(&result.component) {
        ComponentKind::Database
            if policy::is_response_time_metric(metric)
                && result.average > thresholds.slow_response_time =>
        {
            out.push(format!(
                "Database {metric} averages {:.1}; consider query optimization or indexing.",
                result.average
            ));
        }
        ComponentKind::Cache
            if policy::is_hit_rate_metric(metric) && result.average < thresholds.min_cache_hit_rate =>
        {
            out.push(format!(
                "Cache {metric} averages {:.1}; review the caching strategy and key expiry.",
                result.average
            ));
        }
        _ => {}
    }

    if result.has_anomalies() {
        out.push(format!(
            "{} anomalies detected in {metric}; review recent changes and incidents.",
            result.anomalies.len()
        ));
        let high = result.anomaly_count_at(AnomalySeverity::High);
        if high > 0 {
            out.push(format!(
                "{high} high-severity anomalies in {metric} need immediate attention."
            ));
        }
    }

    if out.is_empty() {
        out.push(format!("{metric} is stable and healthy."));
    }
    out
}
