//! Per-series analysis results.

use std::fmt;

use crate::Timestamp;

/// Coarse direction of a series over a window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Trend {
    Increasing,
    Decreasing,
    Stable,
    InsufficientData,
}

impl Trend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Trend::Increasing => "increasing",
            Trend::Decreasing => "decreasing",
            Trend::Stable => "stable",
            Trend::InsufficientData => "insufficient_data",
        }
    }

    /// True for `Increasing` or `Decreasing`.
    pub fn is_directional(&self) -> bool {
        matches!(self, Trend::Increasing | Trend::Decreasing)
    }
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Severity of a single anomalous sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum AnomalySeverity {
    Medium,
    High,
}

impl AnomalySeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnomalySeverity::Medium => "medium",
            AnomalySeverity::High => "high",
        }
    }
}

impl fmt::Display for AnomalySeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A sample whose deviation from the window mean crossed the anomaly threshold.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Anomaly {
    pub timestamp_ms: Timestamp,
    pub value: f64,
    /// `[mean - threshold, mean + threshold]`.
    pub expected_range: (f64, f64),
    /// Absolute distance from the window mean.
    pub deviation: f64,
    pub severity: AnomalySeverity,
}

/// Analysis of one series over one trailing window.
///
/// Results are cached by the engine; a cached result is returned as an exact
/// clone, so two reads without an intervening write compare equal.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AnalysisResult {
    pub component: String,
    pub metric_name: String,
    pub window_hours: u64,
    pub sample_count: usize,
    pub average: f64,
    pub min: f64,
    pub max: f64,
    pub median: f64,
    pub std_deviation: f64,
    /// Least-squares slope per sample index. Zero when no trend was fitted.
    pub slope: f64,
    pub trend: Trend,
    /// Anomalies in chronological order.
    pub anomalies: Vec<Anomaly>,
    pub recommendations: Vec<String>,
    /// When this result was computed.
    pub computed_at: Timestamp,
}

impl AnalysisResult {
    /// Recommendation emitted for a window with no samples.
    pub const NO_DATA_RECOMMENDATION: &'static str = "Insufficient data for analysis.";

    /// Result for a window without any samples.
    pub fn empty(
        component: impl Into<String>,
        metric_name: impl Into<String>,
        window_hours: u64,
        computed_at: Timestamp,
    ) -> Self {
        Self {
            component: component.into(),
            metric_name: metric_name.into(),
            window_hours,
            sample_count: 0,
            average: 0.0,
            min: 0.0,
            max: 0.0,
            median: 0.0,
            std_deviation: 0.0,
            slope: 0.0,
            trend: Trend::InsufficientData,
            anomalies: Vec::new(),
            recommendations: vec![Self::NO_DATA_RECOMMENDATION.to_string()],
            computed_at,
        }
    }

    /// Number of anomalies at the given severity.
    pub fn anomaly_count_at(&self, severity: AnomalySeverity) -> usize {
        self.anomalies.iter().filter(|a| a.severity == severity).count()
    }

    /// Most recent anomaly at the given severity.
    pub fn latest_anomaly_at(&self, severity: AnomalySeverity) -> Option<&Anomaly> {
        self.anomalies
            .iter()
            .filter(|a| a.severity == severity)
            .max_by_key(|a| a.timestamp_ms)
    }

    pub fn has_anomalies(&self) -> bool {
        !self.anomalies.is_empty()
    }
}

/// Descriptive statistics over a set of values.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SeriesStatistics {
    pub count: usize,
    pub average: f64,
    pub min: f64,
    pub max: f64,
    pub median: f64,
    pub std_deviation: f64,
}
