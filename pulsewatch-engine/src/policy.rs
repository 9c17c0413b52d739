//! Which direction of change is bad for a metric.
//!
//! This is the only place metric names are matched against keywords.

use pulsewatch_types::Trend;

/// Direction in which a metric degrades.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polarity {
    RisingIsBad,
    FallingIsBad,
}

/// Keyword table, checked in order against the lowercased metric name.
pub const KEYWORD_POLARITY: &[(&str, Polarity)] = &[
    ("cpu", Polarity::RisingIsBad),
    ("memory", Polarity::RisingIsBad),
    ("response_time", Polarity::RisingIsBad),
    ("latency", Polarity::RisingIsBad),
    ("error", Polarity::RisingIsBad),
    ("throughput", Polarity::FallingIsBad),
    ("hit_rate", Polarity::FallingIsBad),
    ("success", Polarity::FallingIsBad),
];

/// Polarity of a metric, or `None` when no keyword matches.
pub fn polarity_of(metric_name: &str) -> Option<Polarity> {
    let name = metric_name.to_ascii_lowercase();
    KEYWORD_POLARITY
        .iter()
        .find(|(keyword, _)| name.contains(keyword))
        .map(|(_, polarity)| *polarity)
}

/// True when `trend` moves the metric in its bad direction.
pub fn is_concerning(metric_name: &str, trend: Trend) -> bool {
    matches!(
        (polarity_of(metric_name), trend),
        (Some(Polarity::RisingIsBad), Trend::Increasing)
            | (Some(Polarity::FallingIsBad), Trend::Decreasing)
    )
}

/// Metric looks like a resource gauge (cpu or memory).
pub fn is_resource_metric(metric_name: &str) -> bool {
    let name = metric_name.to_ascii_lowercase();
    name.contains("cpu") || name.contains("memory")
}

pub fn is_response_time_metric(metric_name: &str) -> bool {
    metric_name.to_ascii_lowercase().contains("response_time")
}

pub fn is_hit_rate_metric(metric_name: &str) -> bool {
    metric_name.to_ascii_lowercase().contains("hit_rate")
}

/// Coarse component category used for strategic hints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentKind {
    Database,
    Api,
    Cache,
    Other,
}

impl ComponentKind {
    pub fn of(component: &str) -> Self {
        let name = component.to_ascii_lowercase();
        if name.contains("database") {
            ComponentKind::Database
        } else if name.contains("cache") {
            ComponentKind::Cache
        } else if name.contains("api") {
            ComponentKind::Api
        } else {
            ComponentKind::Other
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_lookup() {
        assert_eq!(polarity_of("cpu_usage"), Some(Polarity::RisingIsBad));
        assert_eq!(polarity_of("Memory_Usage"), Some(Polarity::RisingIsBad));
        assert_eq!(polarity_of("response_time"), Some(Polarity::RisingIsBad));
        assert_eq!(polarity_of("error_rate"), Some(Polarity::RisingIsBad));
        assert_eq!(polarity_of("throughput"), Some(Polarity::FallingIsBad));
        assert_eq!(polarity_of("cache_hit_rate"), Some(Polarity::FallingIsBad));
        assert_eq!(polarity_of("success_rate"), Some(Polarity::FallingIsBad));
        assert_eq!(polarity_of("connection_count"), None);
    }

    #[test]
    fn concerning_only_in_bad_direction() {
        assert!(is_concerning("cpu_usage", Trend::Increasing));
        assert!(!is_concerning("cpu_usage", Trend::Decreasing));
        assert!(is_concerning("throughput", Trend::Decreasing));
        assert!(!is_concerning("throughput", Trend::Increasing));
        assert!(!is_concerning("cpu_usage", Trend::Stable));
        assert!(!is_concerning("cpu_usage", Trend::InsufficientData));
        assert!(!is_concerning("connection_count", Trend::Increasing));
    }

    #[test]
    fn component_kinds() {
        assert_eq!(ComponentKind::of("database"), ComponentKind::Database);
        assert_eq!(ComponentKind::of("orders-database"), ComponentKind::Database);
        assert_eq!(ComponentKind::of("redis-cache"), ComponentKind::Cache);
        assert_eq!(ComponentKind::of("public-api"), ComponentKind::Api);
        assert_eq!(ComponentKind::of("worker"), ComponentKind::Other);
    }
}
