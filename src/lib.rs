//! # pulsewatch
//!
//! Command-line front end for [`pulsewatch_engine`]. It replays recorded
//! metric samples into an in-memory engine and prints analyses, component
//! summaries, system overviews, alerts and exports as JSON or CSV. It can
//! also drive synthetic benchmarks against a component.
//!
//! ## Usage
//!
//! ```bash
//! # System overview over the last 24 hours of a capture
//! pulsewatch --file samples.jsonl overview
//!
//! # One series, last 6 hours
//! pulsewatch --file samples.jsonl --hours 6 analyze api response_time
//!
//! # Critical alerts only
//! pulsewatch --file samples.jsonl alerts --severity critical
//!
//! # Re-export as CSV
//! pulsewatch --file samples.jsonl export --format csv --output samples.csv
//!
//! # Two minute load benchmark
//! pulsewatch bench --component api --profile load --duration 2m
//! ```
//!
//! Settings come from an optional `--config` file and `PULSEWATCH_*`
//! environment variables; see [`settings`].

pub mod settings;
pub mod source;

pub use source::{parse_samples, read_samples, replay};
