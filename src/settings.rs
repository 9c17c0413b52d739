//! Engine settings from file and environment.
//!
//! Sources are layered: built-in defaults, then an optional config file
//! (TOML or JSON, picked by extension), then `PULSEWATCH_*` environment
//! variables. Nested keys use a double underscore, e.g.
//! `PULSEWATCH_THRESHOLDS__GOOD_SCORE=75`.
//!
//! ```toml
//! ring_buffer_capacity = 500
//! cache_ttl = "1m"
//! retention_days = 7
//!
//! [thresholds]
//! slow_response_time = 800.0
//!
//! [benchmark]
//! sample_interval = "250ms"
//! ```

use std::path::Path;

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use pulsewatch_engine::EngineConfig;

pub const ENV_PREFIX: &str = "PULSEWATCH";

/// Load settings from `path` (if any) and the process environment.
pub fn load(path: Option<&Path>) -> Result<EngineConfig> {
    load_with_env(path, None)
}

/// Like [`load`], but reads environment overrides from `env` instead of the
/// process environment when it is given.
pub fn load_with_env(
    path: Option<&Path>,
    env: Option<config::Map<String, String>>,
) -> Result<EngineConfig> {
    let mut builder = Config::builder();
    if let Some(path) = path {
        builder = builder.add_source(File::from(path).required(true));
    }
    builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true)
            .source(env),
    );

    let config: EngineConfig = builder
        .build()
        .context("failed to read configuration")?
        .try_deserialize()
        .context("invalid configuration")?;

    config.validate()?;
    tracing::debug!(?config, "configuration loaded");
    Ok(config)
}
