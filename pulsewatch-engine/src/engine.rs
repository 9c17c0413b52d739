//! The engine facade.

use std::sync::Arc;
use std::time::Duration;

use pulsewatch_types::{
    retention_cutoff, window_start, Alert, AlertSeverity, AnalysisResult, BenchmarkProfile,
    BenchmarkReport, BenchmarkRun, BenchmarkStatus, ComponentSummary, MetricSample, SystemOverview,
    Tags,
};

use crate::alerts;
use crate::analyzer::Analyzer;
use crate::benchmark::BenchmarkHarness;
use crate::cache::AnalysisCache;
use crate::clock::{Clock, SystemClock};
use crate::config::EngineConfig;
use crate::error::{Result, ValidationError};
use crate::export::{export_samples, ExportFormat};
use crate::health;
use crate::overview;
use crate::recorder::Recorder;
use crate::store::{MemoryStore, MetricStore};

/// Metric ingestion, analysis, alerting and benchmarks over one store.
///
/// Each engine owns its own buffers and cache, so several engines can run
/// side by side.
///
/// # Example
///
/// ```
/// use pulsewatch_engine::Engine;
/// use pulsewatch_types::Tags;
///
/// # tokio_test::block_on(async {
/// let engine = Engine::builder().build().unwrap();
///
/// engine.record_metric("response_time", 120.0, "api", Tags::new()).await.unwrap();
/// let summary = engine.component_summary("api", 1).await.unwrap();
/// assert_eq!(summary.metric_count(), 1);
/// # });
/// ```
#[derive(Debug)]
pub struct Engine {
    config: EngineConfig,
    store: Arc<dyn MetricStore>,
    clock: Arc<dyn Clock>,
    cache: Arc<AnalysisCache>,
    recorder: Arc<Recorder>,
    analyzer: Analyzer,
    harness: BenchmarkHarness,
}

impl Engine {
    /// Create a builder for configuring the engine.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::new()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn MetricStore> {
        &self.store
    }

    pub fn cache(&self) -> &AnalysisCache {
        &self.cache
    }

    /// Record one observation stamped with the current time.
    pub async fn record_metric(
        &self,
        metric_name: &str,
        value: f64,
        component: &str,
        tags: Tags,
    ) -> Result<MetricSample> {
        self.recorder.record(metric_name, value, component, tags).await
    }

    /// Record a sample that already carries its timestamp, e.g. when replaying.
    pub async fn ingest(&self, sample: MetricSample) -> Result<MetricSample> {
        self.recorder.ingest(sample).await
    }

    /// Record several samples; nothing is written if any is invalid.
    pub async fn record_batch(&self, samples: Vec<MetricSample>) -> Result<usize> {
        self.recorder.record_batch(samples).await
    }

    /// Newest buffered samples of a series, oldest first, without a store read.
    pub fn recent_values(&self, component: &str, metric_name: &str, limit: usize) -> Vec<MetricSample> {
        self.recorder.recent(component, metric_name, limit)
    }

    pub fn latest_value(&self, component: &str, metric_name: &str) -> Option<f64> {
        self.recorder.latest(component, metric_name)
    }

    /// Stored samples of a series from the last `hours`, oldest first.
    pub async fn get_history(
        &self,
        component: &str,
        metric_name: &str,
        hours: u64,
    ) -> Result<Vec<MetricSample>> {
        let since = self.since(hours)?;
        Ok(self.store.select_range(component, metric_name, since).await?)
    }

    pub async fn analyze(
        &self,
        component: &str,
        metric_name: &str,
        hours: u64,
    ) -> Result<AnalysisResult> {
        self.analyzer.analyze(component, metric_name, hours).await
    }

    pub async fn component_summary(&self, component: &str, hours: u64) -> Result<ComponentSummary> {
        health::summarize(&self.analyzer, component, hours).await
    }

    pub async fn system_overview(&self, hours: u64) -> Result<SystemOverview> {
        overview::overview(&self.analyzer, hours).await
    }

    pub async fn alerts(&self, hours: u64, severity: Option<AlertSeverity>) -> Result<Vec<Alert>> {
        alerts::alerts(&self.analyzer, hours, severity).await
    }

    /// Start a benchmark lasting `duration_minutes` and return its id.
    ///
    /// Must be called from within a tokio runtime.
    pub async fn start_benchmark(
        &self,
        component: &str,
        profile: BenchmarkProfile,
        duration_minutes: u64,
    ) -> Result<String> {
        let duration = Duration::from_secs(duration_minutes.saturating_mul(60));
        self.harness.start(component, profile, duration).await
    }

    /// Start a benchmark with an arbitrary duration.
    pub async fn start_benchmark_for(
        &self,
        component: &str,
        profile: BenchmarkProfile,
        duration: Duration,
    ) -> Result<String> {
        self.harness.start(component, profile, duration).await
    }

    pub async fn benchmark_results(&self, benchmark_id: &str) -> Result<BenchmarkReport> {
        self.harness.results(benchmark_id).await
    }

    pub fn benchmark_status(&self, benchmark_id: &str) -> Option<BenchmarkStatus> {
        self.harness.status(benchmark_id)
    }

    pub fn benchmark_runs(&self) -> Vec<BenchmarkRun> {
        self.harness.runs()
    }

    pub async fn wait_for_benchmark(&self, benchmark_id: &str) -> Result<BenchmarkStatus> {
        self.harness.wait(benchmark_id).await
    }

    /// Ask a running benchmark to stop. Returns `false` if it already finished.
    pub fn cancel_benchmark(&self, benchmark_id: &str) -> Result<bool> {
        self.harness.cancel(benchmark_id)
    }

    /// Delete samples older than `older_than_days` and sweep expired analyses.
    pub async fn cleanup(&self, older_than_days: u64) -> Result<usize> {
        if older_than_days == 0 {
            return Err(ValidationError::InvalidRetention {
                days: older_than_days,
            }
            .into());
        }

        let cutoff = retention_cutoff(self.clock.now_ms(), older_than_days);
        let deleted = self.store.delete_older_than(cutoff).await.map_err(|err| {
            tracing::error!(error = %err, "retention cleanup failed");
            err
        })?;
        let swept = self.cache.sweep_expired();
        let pruned_runs = self.harness.prune_finished(cutoff);
        tracing::info!(
            deleted,
            swept,
            pruned_runs,
            older_than_days,
            "retention cleanup finished"
        );
        Ok(deleted)
    }

    /// [`cleanup`](Self::cleanup) with the configured retention horizon.
    pub async fn cleanup_default(&self) -> Result<usize> {
        self.cleanup(self.config.retention_days).await
    }

    /// Export samples from the last `hours`, optionally narrowed to a
    /// component and/or metric.
    pub async fn export(
        &self,
        component: Option<&str>,
        metric_name: Option<&str>,
        hours: u64,
        format: ExportFormat,
    ) -> Result<String> {
        let since = self.since(hours)?;
        let samples = match (component, metric_name) {
            (Some(component), Some(metric_name)) => {
                self.store.select_range(component, metric_name, since).await?
            }
            (component, metric_name) => {
                let mut samples = self.store.select_all(since).await?;
                samples.retain(|s| {
                    component.map_or(true, |c| s.component == c)
                        && metric_name.map_or(true, |m| s.metric_name == m)
                });
                samples
            }
        };
        tracing::debug!(rows = samples.len(), %format, "exporting samples");
        export_samples(&samples, format)
    }

    fn since(&self, hours: u64) -> Result<u64> {
        if hours == 0 {
            return Err(ValidationError::InvalidWindow { hours }.into());
        }
        Ok(window_start(self.clock.now_ms(), hours))
    }
}

/// Builder for [`Engine`].
#[derive(Debug, Default)]
pub struct EngineBuilder {
    store: Option<Arc<dyn MetricStore>>,
    clock: Option<Arc<dyn Clock>>,
    config: Option<EngineConfig>,
}

impl EngineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use this store. Defaults to a fresh [`MemoryStore`].
    pub fn store(mut self, store: Arc<dyn MetricStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Use this clock. Defaults to [`SystemClock`].
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Validate the configuration and wire the engine together.
    pub fn build(self) -> Result<Engine> {
        let config = self.config.unwrap_or_default();
        config.validate()?;

        let store = self
            .store
            .unwrap_or_else(|| Arc::new(MemoryStore::new()) as Arc<dyn MetricStore>);
        let clock = self
            .clock
            .unwrap_or_else(|| Arc::new(SystemClock) as Arc<dyn Clock>);
        let cache = Arc::new(AnalysisCache::new(config.cache_ttl, config.cache_max_entries));

        let recorder = Arc::new(Recorder::new(
            store.clone(),
            cache.clone(),
            clock.clone(),
            config.ring_buffer_capacity,
        ));
        let analyzer = Analyzer::new(
            store.clone(),
            cache.clone(),
            clock.clone(),
            config.thresholds.clone(),
        );
        let harness = BenchmarkHarness::new(
            recorder.clone(),
            store.clone(),
            clock.clone(),
            config.benchmark.sample_interval,
        )
        .with_max_finished_runs(config.benchmark.max_finished_runs);

        Ok(Engine {
            config,
            store,
            clock,
            cache,
            recorder,
            analyzer,
            harness,
        })
    }
}
