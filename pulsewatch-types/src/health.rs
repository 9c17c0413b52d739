//! Component and system health summaries.

use std::collections::BTreeMap;
use std::fmt;

use crate::{AnalysisResult, Timestamp};

/// Health band derived from a 0-100 score.
///
/// Ordered from worst to best so `min()` yields the worst status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum HealthStatus {
    Poor,
    Fair,
    Good,
    Excellent,
}

impl HealthStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            HealthStatus::Excellent => "excellent",
            HealthStatus::Good => "good",
            HealthStatus::Fair => "fair",
            HealthStatus::Poor => "poor",
        }
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Aggregate over all metrics of one component within a window.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ComponentSummary {
    pub component: String,
    pub window_hours: u64,
    /// 0-100; 50.0 when the component has no metrics in the window.
    pub health_score: f64,
    pub status: HealthStatus,
    pub metric_analyses: BTreeMap<String, AnalysisResult>,
    pub recommendations: Vec<String>,
    /// Metrics with at least one anomaly.
    pub anomalous_metrics: usize,
    /// Metrics whose trend is `stable`.
    pub stable_metrics: usize,
    /// Metrics whose trend is `increasing` or `decreasing`.
    pub trending_metrics: usize,
    /// Metrics with anomalies or a non-stable trend, worst first.
    pub problematic_metrics: Vec<String>,
}

impl ComponentSummary {
    /// Total anomalies across every metric analysis.
    pub fn total_anomalies(&self) -> usize {
        self.metric_analyses.values().map(|a| a.anomalies.len()).sum()
    }

    pub fn metric_count(&self) -> usize {
        self.metric_analyses.len()
    }
}

/// Aggregate over all components with data in a window.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SystemOverview {
    pub window_hours: u64,
    /// Mean of component scores; 0 when there are no components.
    pub overall_health_score: f64,
    pub health_status: HealthStatus,
    pub component_summaries: BTreeMap<String, ComponentSummary>,
    pub total_anomalies: usize,
    pub system_recommendations: Vec<String>,
    pub generated_at: Timestamp,
}

impl SystemOverview {
    /// Components sorted by ascending health score.
    pub fn worst_components(&self) -> Vec<&ComponentSummary> {
        let mut summaries: Vec<&ComponentSummary> = self.component_summaries.values().collect();
        summaries.sort_by(|a, b| {
            a.health_score
                .total_cmp(&b.health_score)
                .then_with(|| a.component.cmp(&b.component))
        });
        summaries
    }
}
