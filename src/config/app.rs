// src/config/app.rs
use std::path::PathBuf;
use std::time::Duration;

pub const ENV_HTTP_PORT: &str = "HOTSPOT_HTTP_PORT";
pub const ENV_TIMER_MINUTES: &str = "HOTSPOT_TIMER_DURATION";
pub const ENV_FETCH_TIMEOUT_SECS: &str = "HOTSPOT_FETCH_TIMEOUT_SECS";
pub const ENV_SNAPSHOT_PATH: &str = "HOTSPOT_SNAPSHOT_PATH";

fn default_port() -> u16 {
    80
}
fn default_interval_minutes() -> u64 {
    10
}
fn default_fetch_timeout_secs() -> u64 {
    15
}

/// Process-level settings, all environment-supplied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub port: u16,
    /// Pause between two refresh cycles.
    pub interval: Duration,
    /// Deadline for a single outbound request.
    pub fetch_timeout: Duration,
    /// Where to persist the snapshot after each cycle. `None` disables the sink.
    pub snapshot_path: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            interval: Duration::from_secs(default_interval_minutes() * 60),
            fetch_timeout: Duration::from_secs(default_fetch_timeout_secs()),
            snapshot_path: None,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    /// Build from any key lookup. Missing, non-numeric or zero values fall
    /// back to the defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let positive = |key: &str| -> Option<u64> {
            lookup(key)
                .and_then(|v| v.trim().parse::<u64>().ok())
                .filter(|v| *v > 0)
        };

        let port = lookup(ENV_HTTP_PORT)
            .and_then(|v| v.trim().parse::<u16>().ok())
            .filter(|p| *p > 0)
            .unwrap_or_else(default_port);
        let minutes = positive(ENV_TIMER_MINUTES).unwrap_or_else(default_interval_minutes);
        let timeout = positive(ENV_FETCH_TIMEOUT_SECS).unwrap_or_else(default_fetch_timeout_secs);
        let snapshot_path = lookup(ENV_SNAPSHOT_PATH)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);

        Self {
            port,
            interval: Duration::from_secs(minutes.saturating_mul(60)),
            fetch_timeout: Duration::from_secs(timeout),
            snapshot_path,
        }
    }
}
