//! Metric samples and series identity.

use std::collections::BTreeMap;
use std::fmt;

use crate::Timestamp;

/// Free-form sample tags.
pub type Tags = BTreeMap<String, String>;

/// Identity of a series: one `(component, metric_name)` pair.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SeriesKey {
    pub component: String,
    pub metric_name: String,
}

impl SeriesKey {
    pub fn new(component: impl Into<String>, metric_name: impl Into<String>) -> Self {
        Self {
            component: component.into(),
            metric_name: metric_name.into(),
        }
    }
}

impl fmt::Display for SeriesKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.component, self.metric_name)
    }
}

/// One observation of a metric.
///
/// Samples are immutable once stored. Within a series they may arrive out
/// of order; consumers sort by `timestamp_ms` before analysis.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MetricSample {
    /// Unix timestamp in milliseconds when the sample was recorded.
    pub timestamp_ms: Timestamp,

    /// Subsystem being measured (e.g. "database", "api").
    pub component: String,

    /// Measured quantity (e.g. "response_time", "cpu_usage").
    pub metric_name: String,

    /// The measurement.
    pub value: f64,

    /// Open-ended tags, e.g. `benchmark_id`.
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "BTreeMap::is_empty"))]
    pub tags: Tags,
}

impl MetricSample {
    /// Create a sample with no tags.
    pub fn new(
        timestamp_ms: Timestamp,
        component: impl Into<String>,
        metric_name: impl Into<String>,
        value: f64,
    ) -> Self {
        Self {
            timestamp_ms,
            component: component.into(),
            metric_name: metric_name.into(),
            value,
            tags: Tags::new(),
        }
    }

    /// Create a builder for a sample.
    pub fn builder(
        component: impl Into<String>,
        metric_name: impl Into<String>,
        value: f64,
    ) -> MetricSampleBuilder {
        MetricSampleBuilder::new(component, metric_name, value)
    }

    /// The series this sample belongs to.
    pub fn series(&self) -> SeriesKey {
        SeriesKey::new(self.component.clone(), self.metric_name.clone())
    }

    /// Check whether this sample belongs to the given series.
    pub fn is_in(&self, component: &str, metric_name: &str) -> bool {
        self.component == component && self.metric_name == metric_name
    }

    /// Get a tag value.
    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(String::as_str)
    }
}

/// Builder for `MetricSample`.
#[derive(Debug)]
pub struct MetricSampleBuilder {
    timestamp_ms: Timestamp,
    component: String,
    metric_name: String,
    value: f64,
    tags: Tags,
}

impl MetricSampleBuilder {
    /// Create a new builder. The timestamp defaults to zero.
    pub fn new(component: impl Into<String>, metric_name: impl Into<String>, value: f64) -> Self {
        Self {
            timestamp_ms: 0,
            component: component.into(),
            metric_name: metric_name.into(),
            value,
            tags: Tags::new(),
        }
    }

    /// Set the timestamp (milliseconds since Unix epoch).
    pub fn timestamp_ms(mut self, ts: Timestamp) -> Self {
        self.timestamp_ms = ts;
        self
    }

    /// Add a single tag.
    pub fn tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    /// Merge a set of tags.
    pub fn tags(mut self, tags: Tags) -> Self {
        self.tags.extend(tags);
        self
    }

    /// Build the sample.
    pub fn build(self) -> MetricSample {
        MetricSample {
            timestamp_ms: self.timestamp_ms,
            component: self.component,
            metric_name: self.metric_name,
            value: self.value,
            tags: self.tags,
        }
    }
}
