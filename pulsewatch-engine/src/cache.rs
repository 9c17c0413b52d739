//! TTL cache for computed analyses.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use pulsewatch_types::{AnalysisResult, SeriesKey};
use tokio::time::Instant;

#[derive(Debug)]
struct CachedAnalysis {
    result: AnalysisResult,
    inserted_at: Instant,
}

/// Cached windows of one series.
#[derive(Debug, Default)]
struct SeriesSlot {
    /// Bumped on every invalidation, always while `windows` is locked.
    generation: AtomicU64,
    windows: Mutex<HashMap<u64, CachedAnalysis>>,
}

/// Claim on a series taken before its history is read.
///
/// A ticket keeps the series slot alive, so an invalidation that lands
/// while the analysis runs is always seen by [`AnalysisCache::insert`].
#[derive(Debug, Clone)]
pub struct CacheTicket {
    slot: Arc<SeriesSlot>,
    generation: u64,
}

impl CacheTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Analysis results keyed by `(component, metric, window_hours)`.
///
/// Entries expire after `ttl`. Recording into a series drops every window
/// cached for it. Each series has its own lock; the shared map is only
/// written when a series is first analyzed or when empty slots are pruned.
/// The total number of cached windows is capped; when full, expired entries
/// are swept first and then the oldest entry is evicted.
#[derive(Debug)]
pub struct AnalysisCache {
    ttl: Duration,
    max_entries: usize,
    entries: AtomicUsize,
    series: RwLock<HashMap<SeriesKey, Arc<SeriesSlot>>>,
}

impl AnalysisCache {
    pub fn new(ttl: Duration, max_entries: usize) -> Self {
        Self {
            ttl,
            max_entries: max_entries.max(1),
            entries: AtomicUsize::new(0),
            series: RwLock::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn slot(&self, key: &SeriesKey) -> Option<Arc<SeriesSlot>> {
        self.series.read().get(key).cloned()
    }

    fn slot_or_create(&self, key: &SeriesKey) -> Arc<SeriesSlot> {
        // Fast path: check if it exists
        if let Some(slot) = self.slot(key) {
            return slot;
        }

        // Slow path: create it
        self.series.write().entry(key.clone()).or_default().clone()
    }

    fn slots(&self) -> Vec<Arc<SeriesSlot>> {
        self.series.read().values().cloned().collect()
    }

    /// Fresh cached result for a series window, if any.
    pub fn get(&self, key: &SeriesKey, window_hours: u64) -> Option<AnalysisResult> {
        let slot = self.slot(key)?;
        let windows = slot.windows.lock();
        let cached = windows.get(&window_hours)?;
        if cached.inserted_at.elapsed() < self.ttl {
            Some(cached.result.clone())
        } else {
            None
        }
    }

    /// Take a ticket for a series. Take it before reading the series
    /// history and pass it to [`insert`](Self::insert).
    pub fn ticket(&self, key: &SeriesKey) -> CacheTicket {
        let slot = self.slot_or_create(key);
        let generation = slot.generation.load(Ordering::Acquire);
        CacheTicket { slot, generation }
    }

    /// Cache a result computed under `ticket`.
    ///
    /// Returns `false` if the series was invalidated since the ticket was
    /// taken, in which case the result is not stored.
    pub fn insert(&self, result: AnalysisResult, ticket: &CacheTicket) -> bool {
        let hours = result.window_hours;

        let needs_room = {
            let windows = ticket.slot.windows.lock();
            if ticket.slot.generation.load(Ordering::Acquire) != ticket.generation {
                return false;
            }
            !windows.contains_key(&hours) && self.len() >= self.max_entries
        };
        if needs_room {
            self.make_room();
        }

        let mut windows = ticket.slot.windows.lock();
        if ticket.slot.generation.load(Ordering::Acquire) != ticket.generation {
            return false;
        }
        let previous = windows.insert(
            hours,
            CachedAnalysis {
                result,
                inserted_at: Instant::now(),
            },
        );
        if previous.is_none() {
            self.entries.fetch_add(1, Ordering::AcqRel);
        }
        true
    }

    /// Drop every cached window for a series. Returns how many were dropped.
    ///
    /// Series that were never analyzed have no slot and cost one map lookup.
    pub fn invalidate_series(&self, component: &str, metric_name: &str) -> usize {
        let Some(slot) = self.slot(&SeriesKey::new(component, metric_name)) else {
            return 0;
        };

        let mut windows = slot.windows.lock();
        slot.generation.fetch_add(1, Ordering::AcqRel);
        let dropped = windows.len();
        windows.clear();
        self.entries.fetch_sub(dropped, Ordering::AcqRel);
        dropped
    }

    /// Remove expired entries and the slots left empty. Returns how many
    /// entries were removed.
    pub fn sweep_expired(&self) -> usize {
        let mut removed = 0;
        for slot in self.slots() {
            let mut windows = slot.windows.lock();
            let before = windows.len();
            windows.retain(|_, cached| cached.inserted_at.elapsed() < self.ttl);
            let dropped = before - windows.len();
            self.entries.fetch_sub(dropped, Ordering::AcqRel);
            removed += dropped;
        }
        self.prune_empty_slots();
        removed
    }

    /// Slots held by a ticket stay, so their generation is never lost.
    fn prune_empty_slots(&self) {
        self.series
            .write()
            .retain(|_, slot| Arc::strong_count(slot) > 1 || !slot.windows.lock().is_empty());
    }

    fn make_room(&self) {
        self.sweep_expired();
        if self.len() >= self.max_entries {
            self.evict_oldest();
        }
    }

    fn evict_oldest(&self) {
        let slots = self.slots();
        let oldest = slots
            .iter()
            .filter_map(|slot| {
                let windows = slot.windows.lock();
                let (hours, cached) = windows.iter().min_by_key(|(_, cached)| cached.inserted_at)?;
                Some((cached.inserted_at, *hours, slot))
            })
            .min_by_key(|(inserted_at, _, _)| *inserted_at);

        if let Some((inserted_at, hours, slot)) = oldest {
            let mut windows = slot.windows.lock();
            // Another thread may have replaced or dropped it meanwhile
            if windows.get(&hours).is_some_and(|cached| cached.inserted_at == inserted_at) {
                windows.remove(&hours);
                self.entries.fetch_sub(1, Ordering::AcqRel);
            }
        }
    }

    /// Number of cached windows, expired or not.
    pub fn len(&self) -> usize {
        self.entries.load(Ordering::Acquire)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of series with a slot.
    pub fn series_count(&self) -> usize {
        self.series.read().len()
    }

    pub fn clear(&self) {
        for slot in self.slots() {
            let mut windows = slot.windows.lock();
            slot.generation.fetch_add(1, Ordering::AcqRel);
            self.entries.fetch_sub(windows.len(), Ordering::AcqRel);
            windows.clear();
        }
        self.prune_empty_slots();
    }
}
