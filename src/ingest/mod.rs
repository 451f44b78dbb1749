// src/ingest/mod.rs
pub mod encoding;
pub mod error;
pub mod extract;
pub mod registry;
pub mod scheduler;
pub mod sink;
pub mod transport;
pub mod types;

pub use error::IngestError;
pub use registry::SourceRegistry;
pub use scheduler::{CycleReport, Scheduler, SchedulerState};
pub use types::{FetchOptions, Record, SourceResult, SourceSpec};

use metrics::{describe_counter, describe_gauge, describe_histogram};
use once_cell::sync::OnceCell;

/// One-time metrics registration (so series show up on /metrics).
pub(crate) fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "hotspot_fetch_total",
            "Source refresh attempts by outcome (ok/transport/extract)."
        );
        describe_counter!("hotspot_cycles_total", "Completed refresh cycles.");
        describe_gauge!("hotspot_records", "Records published by the last successful refresh.");
        describe_gauge!(
            "hotspot_last_cycle_ts",
            "Unix ts when the last refresh cycle finished."
        );
        describe_histogram!(
            "hotspot_fetch_ms",
            "Fetch + extract time of successful refreshes in milliseconds."
        );
    });
}

/// Refresh a single source outside the scheduler loop and hand back its result.
/// The store is not touched; useful for probing a registry entry.
pub async fn probe_source(
    fetcher: &dyn transport::Fetcher,
    spec: &SourceSpec,
) -> Result<SourceResult, IngestError> {
    let body = fetcher.fetch(&spec.target, spec.fetch).await?;
    let records = spec.extractor.extract(&spec.key, &body)?;
    Ok(SourceResult {
        source_key: spec.key.clone(),
        records,
    })
}
