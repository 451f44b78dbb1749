//! Hotspot — Binary Entrypoint
//! Boots the refresh scheduler and the read-only Axum server over the shared store.

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::sync::watch;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use hotspot::api::{self, AppState};
use hotspot::config::AppConfig;
use hotspot::metrics::Metrics;
use hotspot::SourceRegistry;

const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

/// Compact logs by default; `HOTSPOT_LOG_FORMAT=json` for structured output.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("hotspot=info,ingest=info,warn"));
    let json = std::env::var("HOTSPOT_LOG_FORMAT")
        .ok()
        .is_some_and(|v| v.eq_ignore_ascii_case("json"));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer().compact()).init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "cannot listen for ctrl-c");
        std::future::pending::<()>().await;
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cfg = AppConfig::from_env();
    let registry = SourceRegistry::load_default().context("loading source registry")?;
    tracing::info!(
        port = cfg.port,
        interval_secs = cfg.interval.as_secs(),
        timeout_secs = cfg.fetch_timeout.as_secs(),
        sources = registry.len(),
        "starting hotspot"
    );

    let metrics = Metrics::init()?;
    let (store, scheduler) = hotspot::build_pipeline(&cfg, registry).await?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let mut refresher = scheduler.spawn(shutdown_rx);

    let app = api::router(AppState::new(store)).merge(metrics.router());
    let addr = SocketAddr::from(([0, 0, 0, 0], cfg.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    tracing::info!(%addr, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("http server")?;

    // Each put is complete on its own, so an in-flight fetch can simply be dropped.
    let _ = shutdown_tx.send(true);
    match tokio::time::timeout(SHUTDOWN_GRACE, &mut refresher).await {
        Ok(Err(e)) => tracing::warn!(error = %e, "scheduler task ended abnormally"),
        Ok(Ok(())) => {}
        Err(_) => refresher.abort(),
    }
    Ok(())
}
