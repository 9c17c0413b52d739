//! # pulsewatch-engine
//!
//! Analytics core for component telemetry: ingest scalar metrics, keep
//! recent history, and turn it into trends, anomalies, health scores,
//! recommendations and alerts.
//!
//! Durable storage is not owned here. The engine talks to anything that
//! implements [`MetricStore`]; [`MemoryStore`] is bundled for tests and
//! short-lived processes.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pulsewatch_engine::{Engine, EngineConfig};
//! use pulsewatch_types::{AlertSeverity, BenchmarkProfile, Tags};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), pulsewatch_engine::EngineError> {
//!     let engine = Engine::builder()
//!         .config(EngineConfig::default())
//!         .build()?;
//!
//!     // Producers record samples as they observe them
//!     engine.record_metric("response_time", 182.0, "api", Tags::new()).await?;
//!     engine.record_metric("cpu_usage", 64.0, "api", Tags::new()).await?;
//!
//!     // Readers ask for analysis over a window in hours
//!     let overview = engine.system_overview(24).await?;
//!     println!("system health: {:.1}", overview.overall_health_score);
//!
//!     let critical = engine.alerts(24, Some(AlertSeverity::Critical)).await?;
//!     println!("{} critical alerts", critical.len());
//!
//!     // Exercise the pipeline with synthetic traffic
//!     let id = engine.start_benchmark("api", BenchmarkProfile::Load, 1).await?;
//!     engine.wait_for_benchmark(&id).await?;
//!     let report = engine.benchmark_results(&id).await?;
//!     println!("{:?}", report.statistics.keys().collect::<Vec<_>>());
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Per-series locking**: ring buffers and cached analyses each have their
//!   own lock; recordings to different series share only read locks on lookups
//! - **Cached analysis**: results live for a TTL and are dropped on new data
//! - **Explicit policy**: keyword polarity lives in one table ([`policy`])
//! - **Cancellable benchmarks**: background runs report status over a channel

mod alerts;
mod analyzer;
mod benchmark;
mod cache;
mod clock;
mod config;
mod duration;
mod engine;
mod error;
mod export;
mod health;
mod overview;
mod recorder;
mod stats;
mod store;

pub mod policy;

pub use alerts::alerts_from_summaries;
pub use analyzer::{analyze_samples, Analyzer};
pub use benchmark::{is_status_sample, synthesize, BenchmarkHarness, DEFAULT_MAX_FINISHED_RUNS};
pub use cache::{AnalysisCache, CacheTicket};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{BenchmarkConfig, EngineConfig, EngineConfigBuilder, HealthThresholds};
pub use duration::{format_duration, parse_duration};
pub use engine::{Engine, EngineBuilder};
pub use error::{EngineError, Result, StoreError, ValidationError};
pub use export::{export_samples, ExportFormat, CSV_HEADER};
pub use health::{build_summary, metric_health_score, NEUTRAL_HEALTH_SCORE};
pub use overview::build_overview;
pub use recorder::{Recorder, SeriesBuffer};
pub use stats::describe;
pub use store::{MemoryStore, MetricStore};

// Re-export types for convenience
pub use pulsewatch_types::{
    AnalysisResult, Anomaly, AnomalySeverity, BenchmarkProfile, BenchmarkReport, BenchmarkStatus,
    ComponentSummary, MetricSample, SystemOverview, Tags, Trend,
};
