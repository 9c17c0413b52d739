//! Engine configuration.
//!
//! Every field has a default, so an empty config file (or none at all) gives
//! the standard behaviour. Durations accept either humane strings ("5m") or
//! whole seconds.

use std::time::Duration;

use pulsewatch_types::HealthStatus;
use serde::{Deserialize, Serialize};

use crate::benchmark::DEFAULT_MAX_FINISHED_RUNS;
use crate::duration;
use crate::error::EngineError;

/// Top-level engine settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Recent samples kept in memory per series.
    pub ring_buffer_capacity: usize,

    /// How long a computed analysis stays valid.
    #[serde(with = "duration")]
    pub cache_ttl: Duration,

    /// Upper bound on cached analyses across all series and windows.
    pub cache_max_entries: usize,

    /// Default retention horizon for `cleanup_default`.
    pub retention_days: u64,

    pub thresholds: HealthThresholds,

    pub benchmark: BenchmarkConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            ring_buffer_capacity: 1000,
            cache_ttl: Duration::from_secs(300),
            cache_max_entries: 10_000,
            retention_days: 30,
            thresholds: HealthThresholds::default(),
            benchmark: BenchmarkConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Create a builder for configuring the engine.
    pub fn builder() -> EngineConfigBuilder {
        EngineConfigBuilder::default()
    }

    /// Reject settings that would make analysis meaningless.
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.ring_buffer_capacity == 0 {
            return Err(EngineError::Config("ring_buffer_capacity must be > 0".into()));
        }
        if self.cache_max_entries == 0 {
            return Err(EngineError::Config("cache_max_entries must be > 0".into()));
        }
        if self.retention_days == 0 {
            return Err(EngineError::Config("retention_days must be > 0".into()));
        }
        if self.benchmark.sample_interval.is_zero() {
            return Err(EngineError::Config("benchmark.sample_interval must be > 0".into()));
        }
        self.thresholds.validate()
    }
}

/// Numeric policy for analysis and health scoring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthThresholds {
    /// Deviation in standard deviations that flags an anomaly.
    pub anomaly_sigma: f64,
    /// Deviation in standard deviations that makes an anomaly `high`.
    pub high_anomaly_sigma: f64,
    /// Minimum samples before a trend is fitted.
    pub trend_min_points: usize,
    /// `|slope| < ratio * |mean|` is considered stable.
    pub trend_stability_ratio: f64,

    pub anomaly_penalty: f64,
    pub max_anomaly_penalty: f64,
    pub trend_penalty: f64,
    pub stability_bonus: f64,

    pub excellent_score: f64,
    pub good_score: f64,
    pub fair_score: f64,

    /// Average above which cpu/memory metrics suggest scaling.
    pub resource_saturation: f64,
    /// Average response time considered slow.
    pub slow_response_time: f64,
    /// Cache hit rate below which the cache strategy needs review.
    pub min_cache_hit_rate: f64,
}

impl Default for HealthThresholds {
    fn default() -> Self {
        Self {
            anomaly_sigma: 2.0,
            high_anomaly_sigma: 4.0,
            trend_min_points: 10,
            trend_stability_ratio: 0.01,
            anomaly_penalty: 10.0,
            max_anomaly_penalty: 50.0,
            trend_penalty: 20.0,
            stability_bonus: 10.0,
            excellent_score: 90.0,
            good_score: 70.0,
            fair_score: 50.0,
            resource_saturation: 80.0,
            slow_response_time: 1000.0,
            min_cache_hit_rate: 80.0,
        }
    }
}

impl HealthThresholds {
    /// Band a 0-100 score.
    pub fn status_for(&self, score: f64) -> HealthStatus {
        if score >= self.excellent_score {
            HealthStatus::Excellent
        } else if score >= self.good_score {
            HealthStatus::Good
        } else if score >= self.fair_score {
            HealthStatus::Fair
        } else {
            HealthStatus::Poor
        }
    }

    fn validate(&self) -> Result<(), EngineError> {
        if !(self.anomaly_sigma > 0.0 && self.high_anomaly_sigma >= self.anomaly_sigma) {
            return Err(EngineError::Config(
                "anomaly_sigma must be > 0 and <= high_anomaly_sigma".into(),
            ));
        }
        if self.trend_min_points < 2 {
            return Err(EngineError::Config("trend_min_points must be >= 2".into()));
        }
        if !(self.excellent_score >= self.good_score && self.good_score >= self.fair_score) {
            return Err(EngineError::Config(
                "score bands must satisfy excellent >= good >= fair".into(),
            ));
        }
        Ok(())
    }
}

/// Settings for the benchmark harness.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BenchmarkConfig {
    /// Time between synthetic sample batches.
    #[serde(with = "duration")]
    pub sample_interval: Duration,
    /// Finished runs remembered for status queries before the oldest are dropped.
    pub max_finished_runs: usize,
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        Self {
            sample_interval: Duration::from_secs(10),
            max_finished_runs: DEFAULT_MAX_FINISHED_RUNS,
        }
    }
}

/// Builder for `EngineConfig`.
#[derive(Debug, Default)]
pub struct EngineConfigBuilder {
    config: EngineConfig,
}

impl EngineConfigBuilder {
    pub fn ring_buffer_capacity(mut self, capacity: usize) -> Self {
        self.config.ring_buffer_capacity = capacity;
        self
    }

    pub fn cache_ttl(mut self, ttl: Duration) -> Self {
        self.config.cache_ttl = ttl;
        self
    }

    pub fn cache_max_entries(mut self, max: usize) -> Self {
        self.config.cache_max_entries = max;
        self
    }

    pub fn retention_days(mut self, days: u64) -> Self {
        self.config.retention_days = days;
        self
    }

    pub fn thresholds(mut self, thresholds: HealthThresholds) -> Self {
        self.config.thresholds = thresholds;
        self
    }

    pub fn benchmark_interval(mut self, interval: Duration) -> Self {
        self.config.benchmark.sample_interval = interval;
        self
    }

    pub fn build(self) -> EngineConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = EngineConfig::default();
        assert_eq!(config.ring_buffer_capacity, 1000);
        assert_eq!(config.cache_ttl, Duration::from_secs(300));
        assert_eq!(config.retention_days, 30);
        assert_eq!(config.benchmark.sample_interval, Duration::from_secs(10));
        assert_eq!(config.benchmark.max_finished_runs, 100);
        assert_eq!(config.thresholds.trend_min_points, 10);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn status_banding() {
        let t = HealthThresholds::default();
        assert_eq!(t.status_for(100.0), HealthStatus::Excellent);
        assert_eq!(t.status_for(90.0), HealthStatus::Excellent);
        assert_eq!(t.status_for(89.9), HealthStatus::Good);
        assert_eq!(t.status_for(70.0), HealthStatus::Good);
        assert_eq!(t.status_for(50.0), HealthStatus::Fair);
        assert_eq!(t.status_for(49.9), HealthStatus::Poor);
        assert_eq!(t.status_for(0.0), HealthStatus::Poor);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config: EngineConfig = toml::from_str(
            r#"
            cache_ttl = "1m"
            retention_days = 7

            [benchmark]
            sample_interval = 2

            [thresholds]
            slow_response_time = 500.0
            "#,
        )
        .unwrap();

        assert_eq!(config.cache_ttl, Duration::from_secs(60));
        assert_eq!(config.retention_days, 7);
        assert_eq!(config.benchmark.sample_interval, Duration::from_secs(2));
        assert_eq!(config.thresholds.slow_response_time, 500.0);
        assert_eq!(config.thresholds.anomaly_sigma, 2.0);
        assert_eq!(config.ring_buffer_capacity, 1000);
    }

    #[test]
    fn builder_overrides() {
        let config = EngineConfig::builder()
            .ring_buffer_capacity(5)
            .cache_ttl(Duration::from_secs(1))
            .benchmark_interval(Duration::from_millis(100))
            .build();
        assert_eq!(config.ring_buffer_capacity, 5);
        assert_eq!(config.cache_ttl, Duration::from_secs(1));
        assert_eq!(config.benchmark.sample_interval, Duration::from_millis(100));
    }

    #[test]
    fn validate_rejects_zero_capacity_and_inverted_bands() {
        let config = EngineConfig::builder().ring_buffer_capacity(0).build();
        assert!(config.validate().is_err());

        let thresholds = HealthThresholds {
            good_score: 95.0,
            ..HealthThresholds::default()
        };
        let config = EngineConfig::builder().thresholds(thresholds).build();
        assert!(config.validate().is_err());
    }
}
