// src/ingest/scheduler.rs
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use metrics::{counter, gauge, histogram};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::ingest::error::IngestError;
use crate::ingest::registry::SourceRegistry;
use crate::ingest::sink::SnapshotSink;
use crate::ingest::transport::Fetcher;
use crate::ingest::types::SourceSpec;
use crate::store::Store;

/// Refresh cadence used when none (or garbage) is configured.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(10 * 60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Refreshing,
}

/// Outcome of one pass over every source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub refreshed: usize,
    pub failed: Vec<String>,
    /// Set when shutdown was requested before every source was attempted.
    pub interrupted: bool,
}

/// Drives fetch -> extract -> `Store::put` for every source, then sleeps.
///
/// The scheduler is the only writer of the store. Sources are processed
/// sequentially; a failure in one is logged and leaves that source's
/// previous entry untouched.
#[derive(Clone)]
pub struct Scheduler {
    registry: Arc<SourceRegistry>,
    fetcher: Arc<dyn Fetcher>,
    store: Store,
    sink: Option<Arc<dyn SnapshotSink>>,
    interval: Duration,
    state: Arc<AtomicU8>,
}

impl Scheduler {
    pub fn new(
        registry: Arc<SourceRegistry>,
        fetcher: Arc<dyn Fetcher>,
        store: Store,
        interval: Duration,
    ) -> Self {
        let interval = if interval.is_zero() {
            DEFAULT_INTERVAL
        } else {
            interval
        };
        Self {
            registry,
            fetcher,
            store,
            sink: None,
            interval,
            state: Arc::new(AtomicU8::new(0)),
        }
    }

    /// Flush the snapshot to `sink` after every cycle.
    pub fn with_sink(mut self, sink: Arc<dyn SnapshotSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn state(&self) -> SchedulerState {
        match self.state.load(Ordering::Acquire) {
            0 => SchedulerState::Idle,
            _ => SchedulerState::Refreshing,
        }
    }

    fn set_state(&self, s: SchedulerState) {
        let v = match s {
            SchedulerState::Idle => 0,
            SchedulerState::Refreshing => 1,
        };
        self.state.store(v, Ordering::Release);
    }

    /// Fetch, extract and publish one source. Returns the number of records stored.
    pub async fn refresh_source(&self, spec: &SourceSpec) -> Result<usize, IngestError> {
        let t0 = Instant::now();
        let result = crate::ingest::probe_source(self.fetcher.as_ref(), spec).await?;
        histogram!("hotspot_fetch_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);

        let n = result.records.len();
        self.store.put(&result.source_key, result.records);
        Ok(n)
    }

    /// One full pass over the registry.
    pub async fn run_cycle(&self) -> CycleReport {
        let (_tx, mut rx) = watch::channel(false);
        self.cycle(&mut rx).await
    }

    async fn cycle(&self, shutdown: &mut watch::Receiver<bool>) -> CycleReport {
        crate::ingest::ensure_metrics_described();
        self.set_state(SchedulerState::Refreshing);

        let mut report = CycleReport::default();
        for spec in self.registry.iter() {
            if *shutdown.borrow() {
                report.interrupted = true;
                break;
            }
            match self.refresh_source(spec).await {
                Ok(n) => {
                    report.refreshed += 1;
                    counter!("hotspot_fetch_total", "source" => spec.key.clone(), "outcome" => "ok")
                        .increment(1);
                    gauge!("hotspot_records", "source" => spec.key.clone()).set(n as f64);
                    tracing::debug!(target: "ingest", source = %spec.key, records = n, "source refreshed");
                }
                Err(e) => {
                    report.failed.push(spec.key.clone());
                    counter!("hotspot_fetch_total", "source" => spec.key.clone(), "outcome" => e.kind())
                        .increment(1);
                    tracing::warn!(
                        target: "ingest",
                        source = %spec.key,
                        kind = spec.extractor.kind(),
                        error = %e,
                        "source skipped this cycle"
                    );
                }
            }
        }

        if let Some(sink) = &self.sink {
            if let Err(e) = sink.flush(&self.store.snapshot()).await {
                tracing::warn!(target: "ingest", error = ?e, "snapshot flush failed");
            }
        }

        counter!("hotspot_cycles_total").increment(1);
        gauge!("hotspot_last_cycle_ts").set(chrono::Utc::now().timestamp() as f64);
        self.set_state(SchedulerState::Idle);
        report
    }

    /// Refresh immediately, then every `interval`, until `shutdown` flips to
    /// `true` or its sender is dropped. Stops only between two sources.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        tracing::info!(
            target: "ingest",
            sources = self.registry.len(),
            interval_secs = self.interval.as_secs(),
            "scheduler started"
        );
        loop {
            let report = self.cycle(&mut shutdown).await;
            tracing::info!(
                target: "ingest",
                refreshed = report.refreshed,
                failed = report.failed.len(),
                "refresh cycle done"
            );
            if report.interrupted || *shutdown.borrow() {
                break;
            }

            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {}
                res = shutdown.changed() => {
                    if res.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }
        tracing::info!(target: "ingest", "scheduler stopped");
    }

    pub fn spawn(self, shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(self.run(shutdown))
    }
}
