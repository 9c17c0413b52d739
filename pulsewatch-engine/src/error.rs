//! Error types for the engine.

use thiserror::Error;

/// Malformed input rejected before anything is written or queried.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// Metric name was empty or whitespace.
    #[error("metric name must not be empty")]
    EmptyMetricName,

    /// Component was empty or whitespace.
    #[error("component must not be empty")]
    EmptyComponent,

    /// Value was NaN or infinite.
    #[error("value for {metric} must be finite, got {value}")]
    NonFiniteValue { metric: String, value: f64 },

    /// Analysis window of zero hours.
    #[error("window must cover at least one hour, got {hours}")]
    InvalidWindow { hours: u64 },

    /// Retention horizon of zero days.
    #[error("retention must be at least one day, got {days}")]
    InvalidRetention { days: u64 },

    /// Benchmark duration of zero.
    #[error("benchmark duration must be non-zero")]
    InvalidDuration,
}

/// Failures reported by a `MetricStore`.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    /// The backing store cannot be reached.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// A read query failed.
    #[error("query failed: {0}")]
    Query(String),

    /// An insert or delete failed.
    #[error("write failed: {0}")]
    Write(String),
}

/// The main error type for engine operations.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Lookup for an unknown identifier.
    #[error("{what} not found: {id}")]
    NotFound { what: &'static str, id: String },

    /// Serializing exported data failed.
    #[error("export failed: {0}")]
    Export(#[from] serde_json::Error),

    /// Writing CSV output failed.
    #[error("csv export failed: {0}")]
    Csv(#[from] csv::Error),

    /// Invalid configuration value.
    #[error("configuration error: {0}")]
    Config(String),
}

impl EngineError {
    pub fn is_validation(&self) -> bool {
        matches!(self, EngineError::Validation(_))
    }

    pub fn is_store(&self) -> bool {
        matches!(self, EngineError::Store(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, EngineError::NotFound { .. })
    }
}

/// Result alias for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;
