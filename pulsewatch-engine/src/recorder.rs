//! Validated metric ingestion with per-series ring buffers.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use pulsewatch_types::{MetricSample, SeriesKey, Tags};

use crate::cache::AnalysisCache;
use crate::clock::Clock;
use crate::error::{EngineError, Result, ValidationError};
use crate::store::MetricStore;

/// Bounded buffer of the most recent samples of one series.
#[derive(Debug)]
pub struct SeriesBuffer {
    samples: Mutex<VecDeque<MetricSample>>,
    capacity: usize,
}

impl SeriesBuffer {
    fn new(capacity: usize) -> Self {
        Self {
            samples: Mutex::new(VecDeque::with_capacity(capacity.min(64))),
            capacity,
        }
    }

    fn push(&self, sample: MetricSample) {
        let mut samples = self.samples.lock();
        if samples.len() == self.capacity {
            samples.pop_front();
        }
        samples.push_back(sample);
    }

    /// Up to `limit` newest samples, oldest first.
    pub fn recent(&self, limit: usize) -> Vec<MetricSample> {
        let samples = self.samples.lock();
        let skip = samples.len().saturating_sub(limit);
        samples.iter().skip(skip).cloned().collect()
    }

    pub fn latest(&self) -> Option<MetricSample> {
        self.samples.lock().back().cloned()
    }

    pub fn len(&self) -> usize {
        self.samples.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.lock().is_empty()
    }
}

/// Validates, stamps and writes samples.
///
/// Every accepted sample goes to the series ring buffer, then to the store,
/// then invalidates cached analyses of that series. Recordings to different
/// series never share a lock beyond the brief map lookup.
#[derive(Debug)]
pub struct Recorder {
    store: Arc<dyn MetricStore>,
    cache: Arc<AnalysisCache>,
    clock: Arc<dyn Clock>,
    capacity: usize,
    buffers: RwLock<HashMap<SeriesKey, Arc<SeriesBuffer>>>,
}

impl Recorder {
    pub fn new(
        store: Arc<dyn MetricStore>,
        cache: Arc<AnalysisCache>,
        clock: Arc<dyn Clock>,
        capacity: usize,
    ) -> Self {
        Self {
            store,
            cache,
            clock,
            capacity: capacity.max(1),
            buffers: RwLock::new(HashMap::new()),
        }
    }

    /// Record one observation stamped with the current time.
    pub async fn record(
        &self,
        metric_name: &str,
        value: f64,
        component: &str,
        tags: Tags,
    ) -> Result<MetricSample> {
        let sample = MetricSample::builder(component, metric_name, value)
            .timestamp_ms(self.clock.now_ms())
            .tags(tags)
            .build();
        self.ingest(sample).await
    }

    /// Record a sample that already carries its timestamp.
    pub async fn ingest(&self, sample: MetricSample) -> Result<MetricSample> {
        validate(&sample)?;
        self.write(sample).await
    }

    /// Record several samples. Nothing is written unless every sample is valid.
    ///
    /// Writes stop at the first store failure; earlier samples stay written.
    pub async fn record_batch(&self, samples: Vec<MetricSample>) -> Result<usize> {
        for sample in &samples {
            validate(sample)?;
        }
        let count = samples.len();
        for sample in samples {
            self.write(sample).await?;
        }
        Ok(count)
    }

    async fn write(&self, sample: MetricSample) -> Result<MetricSample> {
        self.buffer(&sample.component, &sample.metric_name)
            .push(sample.clone());

        if let Err(err) = self.store.insert(sample.clone()).await {
            tracing::error!(
                component = %sample.component,
                metric = %sample.metric_name,
                error = %err,
                "failed to write metric sample"
            );
            return Err(EngineError::Store(err));
        }

        self.cache
            .invalidate_series(&sample.component, &sample.metric_name);
        Ok(sample)
    }

    /// Get or create the ring buffer of a series.
    fn buffer(&self, component: &str, metric_name: &str) -> Arc<SeriesBuffer> {
        let key = SeriesKey::new(component, metric_name);

        // Fast path: check if it exists
        {
            let buffers = self.buffers.read();
            if let Some(buffer) = buffers.get(&key) {
                return buffer.clone();
            }
        }

        // Slow path: create it
        let mut buffers = self.buffers.write();
        buffers
            .entry(key)
            .or_insert_with(|| Arc::new(SeriesBuffer::new(self.capacity)))
            .clone()
    }

    fn existing(&self, component: &str, metric_name: &str) -> Option<Arc<SeriesBuffer>> {
        self.buffers
            .read()
            .get(&SeriesKey::new(component, metric_name))
            .cloned()
    }

    /// Up to `limit` newest buffered samples of a series, oldest first.
    pub fn recent(&self, component: &str, metric_name: &str, limit: usize) -> Vec<MetricSample> {
        self.existing(component, metric_name)
            .map(|buffer| buffer.recent(limit))
            .unwrap_or_default()
    }

    /// Newest buffered value of a series.
    pub fn latest(&self, component: &str, metric_name: &str) -> Option<f64> {
        self.existing(component, metric_name)
            .and_then(|buffer| buffer.latest())
            .map(|sample| sample.value)
    }

    /// Number of series with a ring buffer.
    pub fn series_count(&self) -> usize {
        self.buffers.read().len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

fn validate(sample: &MetricSample) -> std::result::Result<(), ValidationError> {
    if sample.metric_name.trim().is_empty() {
        return Err(ValidationError::EmptyMetricName);
    }
    if sample.component.trim().is_empty() {
        return Err(ValidationError::EmptyComponent);
    }
    if !sample.value.is_finite() {
        return Err(ValidationError::NonFiniteValue {
            metric: sample.metric_name.clone(),
            value: sample.value,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::clock::ManualClock;
    use crate::store::MemoryStore;

    struct Fixture {
        store: Arc<MemoryStore>,
        cache: Arc<AnalysisCache>,
        clock: Arc<ManualClock>,
        recorder: Recorder,
    }

    fn fixture(capacity: usize) -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let cache = Arc::new(AnalysisCache::new(Duration::from_secs(300), 100));
        let clock = Arc::new(ManualClock::new(1_000));
        let recorder = Recorder::new(store.clone(), cache.clone(), clock.clone(), capacity);
        Fixture {
            store,
            cache,
            clock,
            recorder,
        }
    }

    #[tokio::test]
    async fn record_stamps_and_stores() {
        let f = fixture(10);
        let sample = f
            .recorder
            .record("response_time", 120.0, "api", Tags::new())
            .await
            .unwrap();

        assert_eq!(sample.timestamp_ms, 1_000);
        assert_eq!(f.store.len(), 1);
        assert_eq!(f.recorder.latest("api", "response_time"), Some(120.0));
    }

    #[tokio::test]
    async fn validation_rejects_before_writing() {
        let f = fixture(10);

        let err = f.recorder.record("", 1.0, "api", Tags::new()).await.unwrap_err();
        assert!(matches!(err, EngineError::Validation(ValidationError::EmptyMetricName)));

        let err = f.recorder.record("cpu", 1.0, "  ", Tags::new()).await.unwrap_err();
        assert!(matches!(err, EngineError::Validation(ValidationError::EmptyComponent)));

        for value in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let err = f.recorder.record("cpu", value, "api", Tags::new()).await.unwrap_err();
            assert!(err.is_validation());
        }

        assert!(f.store.is_empty());
        assert_eq!(f.recorder.series_count(), 0);
    }

    #[tokio::test]
    async fn ring_buffer_evicts_oldest() {
        let f = fixture(3);
        for i in 0..5 {
            f.clock.advance_ms(1);
            f.recorder
                .record("cpu_usage", i as f64, "api", Tags::new())
                .await
                .unwrap();
        }

        let values: Vec<f64> = f
            .recorder
            .recent("api", "cpu_usage", 10)
            .iter()
            .map(|s| s.value)
            .collect();
        assert_eq!(values, vec![2.0, 3.0, 4.0]);

        let newest_two: Vec<f64> = f
            .recorder
            .recent("api", "cpu_usage", 2)
            .iter()
            .map(|s| s.value)
            .collect();
        assert_eq!(newest_two, vec![3.0, 4.0]);

        // The store keeps everything
        assert_eq!(f.store.len(), 5);
    }

    #[tokio::test]
    async fn series_are_buffered_independently() {
        let f = fixture(10);
        f.recorder.record("cpu_usage", 1.0, "api", Tags::new()).await.unwrap();
        f.recorder.record("cpu_usage", 2.0, "db", Tags::new()).await.unwrap();
        f.recorder.record("memory_usage", 3.0, "api", Tags::new()).await.unwrap();

        assert_eq!(f.recorder.series_count(), 3);
        assert_eq!(f.recorder.latest("db", "cpu_usage"), Some(2.0));
        assert!(f.recorder.recent("cache", "hit_rate", 5).is_empty());
        assert_eq!(f.recorder.latest("cache", "hit_rate"), None);
    }

    #[tokio::test]
    async fn successful_write_invalidates_cached_analysis() {
        let f = fixture(10);
        let key = SeriesKey::new("api", "cpu_usage");
        let ticket = f.cache.ticket(&key);
        assert!(f.cache.insert(
            pulsewatch_types::AnalysisResult::empty("api", "cpu_usage", 24, 0),
            &ticket,
        ));
        assert!(f.cache.get(&key, 24).is_some());

        f.recorder.record("cpu_usage", 1.0, "api", Tags::new()).await.unwrap();
        assert!(f.cache.get(&key, 24).is_none());
    }

    #[tokio::test]
    async fn recording_unanalyzed_series_leaves_cache_untouched() {
        let f = fixture(10);
        for i in 0..100 {
            f.recorder
                .record("cpu_usage", i as f64, &format!("worker-{i}"), Tags::new())
                .await
                .unwrap();
        }
        assert_eq!(f.recorder.series_count(), 100);
        assert_eq!(f.cache.series_count(), 0);
    }

    #[tokio::test]
    async fn store_failure_is_surfaced() {
        let f = fixture(10);
        f.store.set_unavailable(true);

        let err = f
            .recorder
            .record("cpu_usage", 1.0, "api", Tags::new())
            .await
            .unwrap_err();
        assert!(err.is_store());
    }

    #[tokio::test]
    async fn batch_is_all_or_nothing_on_validation() {
        let f = fixture(10);
        let batch = vec![
            MetricSample::new(1, "api", "cpu_usage", 1.0),
            MetricSample::new(2, "api", "cpu_usage", f64::NAN),
        ];
        assert!(f.recorder.record_batch(batch).await.is_err());
        assert!(f.store.is_empty());

        let batch = vec![
            MetricSample::new(1, "api", "cpu_usage", 1.0),
            MetricSample::new(2, "api", "cpu_usage", 2.0),
        ];
        assert_eq!(f.recorder.record_batch(batch).await.unwrap(), 2);
        assert_eq!(f.store.len(), 2);
    }

    #[tokio::test]
    async fn concurrent_recordings_to_same_series_are_all_kept() {
        let f = fixture(1000);
        let recorder = Arc::new(f.recorder);

        let mut handles = Vec::new();
        for task in 0..10 {
            let recorder = recorder.clone();
            handles.push(tokio::spawn(async move {
                for i in 0..50 {
                    recorder
                        .record("throughput", (task * 100 + i) as f64, "api", Tags::new())
                        .await
                        .unwrap();
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(recorder.recent("api", "throughput", 1000).len(), 500);
        assert_eq!(f.store.len(), 500);
    }
}
