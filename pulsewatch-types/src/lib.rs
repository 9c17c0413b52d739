//! # pulsewatch-types
//!
//! Core types for component health analytics. This crate defines the schema
//! shared between the pulsewatch engine, the stores that persist samples, and
//! whatever transport layer exposes results to callers.
//!
//! ## Design Goals
//!
//! - **Zero required dependencies**: Core types work without any serialization framework
//! - **Optional serialization**: Enable the `serde` feature as needed
//! - **Explicit tags**: Sample tags are a flat `String -> String` map, nothing nested
//! - **Ergonomic builders**: Fluent API for constructing samples
//!
//! ## Features
//!
//! - `serde`: JSON/TOML/etc. serialization via serde
//!
//! ## Example
//!
//! ```rust
//! use pulsewatch_types::{MetricSample, SeriesKey};
//!
//! let sample = MetricSample::builder("api", "response_time", 182.5)
//!     .timestamp_ms(1_703_160_000_000)
//!     .tag("region", "eu-west-1")
//!     .build();
//!
//! assert_eq!(sample.series(), SeriesKey::new("api", "response_time"));
//! assert_eq!(sample.tags.get("region").map(String::as_str), Some("eu-west-1"));
//! ```

mod alert;
mod analysis;
mod benchmark;
mod health;
mod sample;
mod time;

pub use alert::*;
pub use analysis::*;
pub use benchmark::*;
pub use health::*;
pub use sample::*;
pub use time::*;

/// Tag key that links a sample to the benchmark run that produced it.
pub const BENCHMARK_ID_TAG: &str = "benchmark_id";

/// Bookkeeping metric recorded at benchmark state transitions.
///
/// Excluded from benchmark statistics.
pub const BENCHMARK_STATUS_METRIC: &str = "benchmark_status";
