//! Synthetic benchmark runs that drive the recorder.
//!
//! Each run is a spawned tokio task. It ticks on a fixed interval, records
//! one sample per profile metric per tick, and tags everything with the run
//! id so results can be pulled back out of the store afterwards.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use pulsewatch_types::{
    BenchmarkProfile, BenchmarkReport, BenchmarkRun, BenchmarkStatus, MetricSample, Tags,
    Timestamp, BENCHMARK_ID_TAG, BENCHMARK_STATUS_METRIC,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::sync::watch;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use uuid::Uuid;

use crate::clock::Clock;
use crate::error::{EngineError, Result, ValidationError};
use crate::recorder::Recorder;
use crate::stats;
use crate::store::MetricStore;

const PROFILE_TAG: &str = "profile";
const STATUS_TAG: &str = "status";
const ERROR_TAG: &str = "error";

/// Finished runs kept in memory unless configured otherwise.
pub const DEFAULT_MAX_FINISHED_RUNS: usize = 100;

#[derive(Debug)]
struct RunEntry {
    seq: u64,
    run: BenchmarkRun,
    status_rx: watch::Receiver<BenchmarkStatus>,
    stop_tx: watch::Sender<bool>,
}

/// Starts, tracks and cancels benchmark runs.
#[derive(Debug)]
pub struct BenchmarkHarness {
    recorder: Arc<Recorder>,
    store: Arc<dyn MetricStore>,
    clock: Arc<dyn Clock>,
    interval: Duration,
    max_finished: usize,
    next_seq: AtomicU64,
    runs: RwLock<HashMap<String, RunEntry>>,
}

/// How a worker loop ended without error.
enum Finish {
    Completed,
    Cancelled,
}

impl BenchmarkHarness {
    pub fn new(
        recorder: Arc<Recorder>,
        store: Arc<dyn MetricStore>,
        clock: Arc<dyn Clock>,
        interval: Duration,
    ) -> Self {
        Self {
            recorder,
            store,
            clock,
            interval,
            max_finished: DEFAULT_MAX_FINISHED_RUNS,
            next_seq: AtomicU64::new(0),
            runs: RwLock::new(HashMap::new()),
        }
    }

    /// Cap on finished runs kept for `status`/`runs`. The oldest finished
    /// runs are forgotten when a new run starts; their samples stay in the
    /// store and `results` keeps working.
    pub fn with_max_finished_runs(mut self, max: usize) -> Self {
        self.max_finished = max;
        self
    }

    /// Start a run in the background and return its id.
    ///
    /// The `started` bookkeeping sample is written before returning, so a
    /// failing store is reported here. Failures after that are captured in
    /// the run's status instead.
    pub async fn start(
        &self,
        component: &str,
        profile: BenchmarkProfile,
        duration: Duration,
    ) -> Result<String> {
        if component.trim().is_empty() {
            return Err(ValidationError::EmptyComponent.into());
        }
        if duration.is_zero() {
            return Err(ValidationError::InvalidDuration.into());
        }

        let id = Uuid::new_v4().to_string();
        let mut tags = Tags::new();
        tags.insert(BENCHMARK_ID_TAG.to_string(), id.clone());
        tags.insert(PROFILE_TAG.to_string(), profile.as_str().to_string());

        let mut started_tags = tags.clone();
        started_tags.insert(
            STATUS_TAG.to_string(),
            BenchmarkStatus::Started.as_str().to_string(),
        );
        self.recorder
            .record(
                BENCHMARK_STATUS_METRIC,
                BenchmarkStatus::Started.sample_value(),
                component,
                started_tags,
            )
            .await?;

        let (stop_tx, stop_rx) = watch::channel(false);
        let (status_tx, status_rx) = watch::channel(BenchmarkStatus::Started);

        let run = BenchmarkRun {
            id: id.clone(),
            component: component.to_string(),
            profile,
            duration_ms: u64::try_from(duration.as_millis()).unwrap_or(u64::MAX),
            started_at: self.clock.now_ms(),
            status: BenchmarkStatus::Started,
        };
        {
            let mut runs = self.runs.write();
            let evicted = evict_finished(&mut runs, self.max_finished);
            if evicted > 0 {
                tracing::debug!(evicted, "forgot oldest finished benchmark runs");
            }
            runs.insert(
                id.clone(),
                RunEntry {
                    seq: self.next_seq.fetch_add(1, Ordering::Relaxed),
                    run,
                    status_rx,
                    stop_tx,
                },
            );
        }

        let worker = Worker {
            recorder: self.recorder.clone(),
            component: component.to_string(),
            profile,
            duration,
            interval: self.interval,
            tags,
        };
        tokio::spawn(worker.run(stop_rx, status_tx));

        tracing::info!(
            benchmark_id = %id,
            component,
            profile = %profile,
            duration_ms = duration.as_millis() as u64,
            "benchmark started"
        );
        Ok(id)
    }

    /// Current status of a run.
    pub fn status(&self, benchmark_id: &str) -> Option<BenchmarkStatus> {
        self.runs
            .read()
            .get(benchmark_id)
            .map(|entry| entry.status_rx.borrow().clone())
    }

    /// Metadata of one run with its current status.
    pub fn run(&self, benchmark_id: &str) -> Option<BenchmarkRun> {
        self.runs.read().get(benchmark_id).map(current_run)
    }

    /// Every run this harness started, oldest first.
    pub fn runs(&self) -> Vec<BenchmarkRun> {
        let mut runs: Vec<BenchmarkRun> = self.runs.read().values().map(current_run).collect();
        runs.sort_by(|a, b| a.started_at.cmp(&b.started_at).then_with(|| a.id.cmp(&b.id)));
        runs
    }

    /// Wait until a run reaches a terminal status.
    pub async fn wait(&self, benchmark_id: &str) -> Result<BenchmarkStatus> {
        let mut status_rx = self
            .runs
            .read()
            .get(benchmark_id)
            .map(|entry| entry.status_rx.clone())
            .ok_or_else(|| not_found(benchmark_id))?;

        let terminal = status_rx
            .wait_for(BenchmarkStatus::is_terminal)
            .await
            .map(|status| status.clone());
        match terminal {
            Ok(status) => Ok(status),
            // Worker dropped its sender; report whatever it left behind
            Err(_) => Ok(status_rx.borrow().clone()),
        }
    }

    /// Ask a run to stop.
    ///
    /// Returns `false` if the run had already finished.
    pub fn cancel(&self, benchmark_id: &str) -> Result<bool> {
        let runs = self.runs.read();
        let entry = runs.get(benchmark_id).ok_or_else(|| not_found(benchmark_id))?;
        if entry.status_rx.borrow().is_terminal() {
            return Ok(false);
        }
        let _ = entry.stop_tx.send(true);
        tracing::info!(benchmark_id, "benchmark cancellation requested");
        Ok(true)
    }

    /// Forget finished runs whose scheduled end falls before `cutoff`.
    ///
    /// Runs still in progress are kept whatever their age. Returns how many
    /// runs were removed.
    pub fn prune_finished(&self, cutoff: Timestamp) -> usize {
        let mut runs = self.runs.write();
        let before = runs.len();
        runs.retain(|_, entry| {
            !(entry.status_rx.borrow().is_terminal() && scheduled_end(&entry.run) < cutoff)
        });
        before - runs.len()
    }

    /// Every sample tagged with the run id plus per-metric statistics.
    ///
    /// The bookkeeping status metric is left out of the statistics.
    pub async fn results(&self, benchmark_id: &str) -> Result<BenchmarkReport> {
        let raw_samples = self
            .store
            .select_tagged(BENCHMARK_ID_TAG, benchmark_id)
            .await?;
        if raw_samples.is_empty() {
            return Err(not_found(benchmark_id));
        }

        let mut grouped: BTreeMap<String, Vec<f64>> = BTreeMap::new();
        for sample in raw_samples
            .iter()
            .filter(|s| s.metric_name != BENCHMARK_STATUS_METRIC)
        {
            grouped
                .entry(sample.metric_name.clone())
                .or_default()
                .push(sample.value);
        }
        let statistics = grouped
            .into_iter()
            .map(|(metric, values)| (metric, stats::describe(&values)))
            .collect();

        Ok(BenchmarkReport {
            benchmark_id: benchmark_id.to_string(),
            raw_samples,
            statistics,
        })
    }
}

fn scheduled_end(run: &BenchmarkRun) -> Timestamp {
    run.started_at.saturating_add(run.duration_ms)
}

/// Drop the oldest finished runs until at most `keep` remain.
fn evict_finished(runs: &mut HashMap<String, RunEntry>, keep: usize) -> usize {
    let mut finished: Vec<(u64, String)> = runs
        .iter()
        .filter(|(_, entry)| entry.status_rx.borrow().is_terminal())
        .map(|(id, entry)| (entry.seq, id.clone()))
        .collect();
    if finished.len() <= keep {
        return 0;
    }
    finished.sort_unstable();
    let excess = finished.len() - keep;
    for (_, id) in finished.into_iter().take(excess) {
        runs.remove(&id);
    }
    excess
}

fn current_run(entry: &RunEntry) -> BenchmarkRun {
    BenchmarkRun {
        status: entry.status_rx.borrow().clone(),
        ..entry.run.clone()
    }
}

fn not_found(benchmark_id: &str) -> EngineError {
    EngineError::NotFound {
        what: "benchmark",
        id: benchmark_id.to_string(),
    }
}

/// State moved into the spawned task.
struct Worker {
    recorder: Arc<Recorder>,
    component: String,
    profile: BenchmarkProfile,
    duration: Duration,
    interval: Duration,
    tags: Tags,
}

impl Worker {
    async fn run(
        self,
        mut stop_rx: watch::Receiver<bool>,
        status_tx: watch::Sender<BenchmarkStatus>,
    ) {
        let _ = status_tx.send(BenchmarkStatus::Running);

        let status = match self.drive(&mut stop_rx).await {
            Ok(Finish::Completed) => BenchmarkStatus::Completed,
            Ok(Finish::Cancelled) => BenchmarkStatus::Cancelled,
            Err(err) => BenchmarkStatus::Failed(err.to_string()),
        };

        let mut tags = self.tags.clone();
        tags.insert(STATUS_TAG.to_string(), status.as_str().to_string());
        if let BenchmarkStatus::Failed(reason) = &status {
            tags.insert(ERROR_TAG.to_string(), reason.clone());
        }
        if let Err(err) = self
            .recorder
            .record(
                BENCHMARK_STATUS_METRIC,
                status.sample_value(),
                &self.component,
                tags,
            )
            .await
        {
            tracing::error!(
                component = %self.component,
                error = %err,
                "failed to record final benchmark status"
            );
        }

        match &status {
            BenchmarkStatus::Failed(reason) => {
                tracing::error!(component = %self.component, %reason, "benchmark failed")
            }
            other => tracing::info!(component = %self.component, status = %other, "benchmark finished"),
        }
        let _ = status_tx.send(status);
    }

    async fn drive(&self, stop_rx: &mut watch::Receiver<bool>) -> Result<Finish> {
        let interval = self.interval.max(Duration::from_millis(1));
        let ticks = (self.duration.as_nanos() / interval.as_nanos()).max(1);

        let mut ticker = interval_at(Instant::now() + interval, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut rng = StdRng::from_entropy();

        let mut tick: u64 = 0;
        while u128::from(tick) < ticks {
            tokio::select! {
                biased;

                changed = stop_rx.changed() => {
                    if changed.is_err() || *stop_rx.borrow() {
                        return Ok(Finish::Cancelled);
                    }
                }
                _ = ticker.tick() => {
                    for (metric, value) in synthesize(self.profile, tick, &mut rng) {
                        self.recorder
                            .record(metric, value, &self.component, self.tags.clone())
                            .await?;
                    }
                    tick += 1;
                }
            }
        }
        Ok(Finish::Completed)
    }
}

/// One tick of synthetic values for a profile, in `profile.metrics()` order.
pub fn synthesize<R: Rng>(
    profile: BenchmarkProfile,
    tick: u64,
    rng: &mut R,
) -> [(&'static str, f64); 3] {
    let [first, second, third] = profile.metrics();
    match profile {
        BenchmarkProfile::Load => [
            (first, rng.gen_range(50.0..200.0)),
            (second, rng.gen_range(800.0..1200.0)),
            (third, rng.gen_range(30.0..70.0)),
        ],
        BenchmarkProfile::Stress => [
            (first, rng.gen_range(200.0..800.0)),
            (second, rng.gen_range(0.0..5.0)),
            (third, rng.gen_range(60.0..95.0)),
        ],
        BenchmarkProfile::Endurance => {
            // Memory creeps up over a long run
            let drift = (tick as f64 * 0.5).min(50.0);
            [
                (first, rng.gen_range(80.0..150.0)),
                (second, 40.0 + drift + rng.gen_range(0.0..5.0)),
                (third, rng.gen_range(50u32..150).into()),
            ]
        }
    }
}

/// Whether a sample is the bookkeeping status of a run.
pub fn is_status_sample(sample: &MetricSample) -> bool {
    sample.metric_name == BENCHMARK_STATUS_METRIC && sample.tags.contains_key(BENCHMARK_ID_TAG)
}
