//! Benchmark run metadata and reports.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::{MetricSample, SeriesStatistics, Timestamp, UnknownVariant};

/// Synthetic traffic mix driven by a benchmark run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum BenchmarkProfile {
    Load,
    Stress,
    Endurance,
}

impl BenchmarkProfile {
    pub fn as_str(&self) -> &'static str {
        match self {
            BenchmarkProfile::Load => "load",
            BenchmarkProfile::Stress => "stress",
            BenchmarkProfile::Endurance => "endurance",
        }
    }

    /// Metrics emitted on every tick of this profile.
    pub fn metrics(&self) -> [&'static str; 3] {
        match self {
            BenchmarkProfile::Load => ["response_time", "throughput", "cpu_usage"],
            BenchmarkProfile::Stress => ["response_time", "error_rate", "memory_usage"],
            BenchmarkProfile::Endurance => ["response_time", "memory_usage", "connection_count"],
        }
    }
}

impl fmt::Display for BenchmarkProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BenchmarkProfile {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "load" => Ok(BenchmarkProfile::Load),
            "stress" => Ok(BenchmarkProfile::Stress),
            "endurance" => Ok(BenchmarkProfile::Endurance),
            _ => Err(UnknownVariant {
                kind: "benchmark profile",
                value: s.to_string(),
            }),
        }
    }
}

/// Lifecycle of a benchmark run.
///
/// `started -> running -> completed | failed | cancelled`
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum BenchmarkStatus {
    Started,
    Running,
    Completed,
    Failed(String),
    Cancelled,
}

impl BenchmarkStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BenchmarkStatus::Started => "started",
            BenchmarkStatus::Running => "running",
            BenchmarkStatus::Completed => "completed",
            BenchmarkStatus::Failed(_) => "failed",
            BenchmarkStatus::Cancelled => "cancelled",
        }
    }

    /// Value of the `benchmark_status` bookkeeping sample for this transition.
    pub fn sample_value(&self) -> f64 {
        match self {
            BenchmarkStatus::Started | BenchmarkStatus::Running => 1.0,
            BenchmarkStatus::Completed | BenchmarkStatus::Cancelled => 0.0,
            BenchmarkStatus::Failed(_) => -1.0,
        }
    }

    /// True once the run can no longer change state.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            BenchmarkStatus::Completed | BenchmarkStatus::Failed(_) | BenchmarkStatus::Cancelled
        )
    }
}

impl fmt::Display for BenchmarkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BenchmarkStatus::Failed(reason) => write!(f, "failed: {}", reason),
            other => f.write_str(other.as_str()),
        }
    }
}

/// Metadata for one benchmark execution.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BenchmarkRun {
    pub id: String,
    pub component: String,
    pub profile: BenchmarkProfile,
    pub duration_ms: u64,
    pub started_at: Timestamp,
    pub status: BenchmarkStatus,
}

/// Samples and per-metric statistics for one benchmark run.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BenchmarkReport {
    pub benchmark_id: String,
    /// Every sample tagged with the run id, including bookkeeping samples.
    pub raw_samples: Vec<MetricSample>,
    /// Statistics per metric, excluding `benchmark_status`.
    pub statistics: BTreeMap<String, SeriesStatistics>,
}
