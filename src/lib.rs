// src/lib.rs
// Public library surface for integration tests (and potential reuse).

pub mod api;
pub mod config;
pub mod ingest;
pub mod metrics;
pub mod store;

// ---- Re-exports for stable public API ----
pub use crate::api::{router, AppState};
pub use crate::ingest::{Record, Scheduler, SourceRegistry};
pub use crate::store::{Snapshot, Store};

use anyhow::Result;
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::ingest::sink::{JsonFileSink, SnapshotSink};
use crate::ingest::transport::HttpFetcher;

/// Build the store and scheduler from configuration.
///
/// When a snapshot path is configured the store is warmed from the last
/// persisted snapshot, so readers get stale-but-valid data until the first
/// cycle finishes.
pub async fn build_pipeline(cfg: &AppConfig, registry: SourceRegistry) -> Result<(Store, Scheduler)> {
    let fetcher = HttpFetcher::new(cfg.fetch_timeout)?;
    info!(timeout_ms = fetcher.timeout().as_millis() as u64, "http fetcher ready");

    let (store, sink) = match &cfg.snapshot_path {
        Some(path) => {
            let sink = JsonFileSink::new(path.clone());
            let store = match sink.load().await {
                Ok(Some(snap)) => {
                    info!(
                        path = %sink.path().display(),
                        sources = snap.sources.len(),
                        "warm start from snapshot"
                    );
                    Store::from_snapshot(snap)
                }
                Ok(None) => Store::new(),
                Err(e) => {
                    warn!(error = ?e, "ignoring unreadable snapshot");
                    Store::new()
                }
            };
            (store, Some(Arc::new(sink) as Arc<dyn SnapshotSink>))
        }
        None => (Store::new(), None),
    };

    let mut scheduler = Scheduler::new(
        Arc::new(registry),
        Arc::new(fetcher),
        store.clone(),
        cfg.interval,
    );
    if let Some(sink) = sink {
        scheduler = scheduler.with_sink(sink);
    }
    Ok((store, scheduler))
}
