//! Metric store abstraction.
//!
//! The engine never owns durable storage. It talks to a `MetricStore`, which
//! can be backed by a time-series database, SQL, or the bundled
//! [`MemoryStore`].

use std::collections::BTreeSet;
use std::fmt::Debug;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use parking_lot::RwLock;
use pulsewatch_types::{MetricSample, Timestamp};

use crate::error::StoreError;

/// Read/write contract for a metric store.
///
/// All `since` bounds are inclusive. Range results are ordered by timestamp
/// ascending; implementations must sort if rows can arrive out of order.
///
/// # Example
///
/// ```
/// use pulsewatch_engine::{MemoryStore, MetricStore};
/// use pulsewatch_types::MetricSample;
///
/// # tokio_test::block_on(async {
/// let store = MemoryStore::new();
/// store.insert(MetricSample::new(10, "api", "response_time", 120.0)).await.unwrap();
///
/// let rows = store.select_range("api", "response_time", 0).await.unwrap();
/// assert_eq!(rows.len(), 1);
/// # });
/// ```
#[async_trait]
pub trait MetricStore: Send + Sync + Debug {
    /// Append one sample.
    async fn insert(&self, sample: MetricSample) -> Result<(), StoreError>;

    /// Samples of one series at or after `since`, oldest first.
    async fn select_range(
        &self,
        component: &str,
        metric_name: &str,
        since: Timestamp,
    ) -> Result<Vec<MetricSample>, StoreError>;

    /// Every sample at or after `since`, oldest first.
    async fn select_all(&self, since: Timestamp) -> Result<Vec<MetricSample>, StoreError>;

    /// Every sample carrying `tags[key] == value`, oldest first.
    async fn select_tagged(&self, key: &str, value: &str) -> Result<Vec<MetricSample>, StoreError>;

    /// Components with at least one sample at or after `since`.
    async fn distinct_components(&self, since: Timestamp) -> Result<BTreeSet<String>, StoreError>;

    /// Metric names of `component` with at least one sample at or after `since`.
    async fn distinct_metric_names(
        &self,
        component: &str,
        since: Timestamp,
    ) -> Result<BTreeSet<String>, StoreError>;

    /// Remove samples strictly older than `cutoff`, returning how many were removed.
    async fn delete_older_than(&self, cutoff: Timestamp) -> Result<usize, StoreError>;
}

/// In-process store backed by a vector.
///
/// Suitable for tests, demos, and short-lived processes. It can be switched
/// into an unavailable state to exercise failure paths.
#[derive(Debug, Default)]
pub struct MemoryStore {
    rows: RwLock<Vec<MetricSample>>,
    unavailable: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with samples.
    pub fn with_samples(samples: impl IntoIterator<Item = MetricSample>) -> Self {
        Self {
            rows: RwLock::new(samples.into_iter().collect()),
            unavailable: AtomicBool::new(false),
        }
    }

    /// Make every subsequent call fail (or succeed again).
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Number of stored rows.
    pub fn len(&self) -> usize {
        self.rows.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.read().is_empty()
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(StoreError::Unavailable("memory store switched off".into()))
        } else {
            Ok(())
        }
    }

    fn collect_sorted<F>(&self, filter: F) -> Vec<MetricSample>
    where
        F: Fn(&MetricSample) -> bool,
    {
        let mut rows: Vec<MetricSample> =
            self.rows.read().iter().filter(|s| filter(s)).cloned().collect();
        // Stable sort keeps insertion order for equal timestamps
        rows.sort_by_key(|s| s.timestamp_ms);
        rows
    }
}

#[async_trait]
impl MetricStore for MemoryStore {
    async fn insert(&self, sample: MetricSample) -> Result<(), StoreError> {
        self.check()?;
        self.rows.write().push(sample);
        Ok(())
    }

    async fn select_range(
        &self,
        component: &str,
        metric_name: &str,
        since: Timestamp,
    ) -> Result<Vec<MetricSample>, StoreError> {
        self.check()?;
        Ok(self.collect_sorted(|s| s.timestamp_ms >= since && s.is_in(component, metric_name)))
    }

    async fn select_all(&self, since: Timestamp) -> Result<Vec<MetricSample>, StoreError> {
        self.check()?;
        Ok(self.collect_sorted(|s| s.timestamp_ms >= since))
    }

    async fn select_tagged(&self, key: &str, value: &str) -> Result<Vec<MetricSample>, StoreError> {
        self.check()?;
        Ok(self.collect_sorted(|s| s.tag(key) == Some(value)))
    }

    async fn distinct_components(&self, since: Timestamp) -> Result<BTreeSet<String>, StoreError> {
        self.check()?;
        Ok(self
            .rows
            .read()
            .iter()
            .filter(|s| s.timestamp_ms >= since)
            .map(|s| s.component.clone())
            .collect())
    }

    async fn distinct_metric_names(
        &self,
        component: &str,
        since: Timestamp,
    ) -> Result<BTreeSet<String>, StoreError> {
        self.check()?;
        Ok(self
            .rows
            .read()
            .iter()
            .filter(|s| s.timestamp_ms >= since && s.component == component)
            .map(|s| s.metric_name.clone())
            .collect())
    }

    async fn delete_older_than(&self, cutoff: Timestamp) -> Result<usize, StoreError> {
        self.check()?;
        let mut rows = self.rows.write();
        let before = rows.len();
        rows.retain(|s| s.timestamp_ms >= cutoff);
        Ok(before - rows.len())
    }
}
