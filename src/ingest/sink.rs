// src/ingest/sink.rs
use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Mutex;

use crate::store::Snapshot;

#[async_trait::async_trait]
pub trait SnapshotSink: Send + Sync {
    /// Persist the whole snapshot (best-effort; failures never touch the store).
    async fn flush(&self, snapshot: &Snapshot) -> Result<()>;
}

/// Writes the snapshot as JSON, replacing the file atomically via a temp file + rename.
#[derive(Debug, Clone)]
pub struct JsonFileSink {
    path: PathBuf,
}

impl JsonFileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    /// Read a previously flushed snapshot. A missing file is `Ok(None)`.
    pub async fn load(&self) -> Result<Option<Snapshot>> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(e).with_context(|| format!("reading {}", self.path.display()))
            }
        };
        let snap = serde_json::from_slice(&bytes)
            .with_context(|| format!("parsing snapshot {}", self.path.display()))?;
        Ok(Some(snap))
    }
}

#[async_trait::async_trait]
impl SnapshotSink for JsonFileSink {
    async fn flush(&self, snapshot: &Snapshot) -> Result<()> {
        let json = serde_json::to_vec_pretty(snapshot).context("encoding snapshot")?;
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        tokio::fs::write(&tmp, &json)
            .await
            .with_context(|| format!("writing {}", tmp.display()))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .with_context(|| format!("renaming onto {}", self.path.display()))?;
        Ok(())
    }
}

// --- Test helper ---
pub struct MockSink {
    pub calls: Mutex<Vec<Snapshot>>,
}

impl MockSink {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(vec![]),
        }
    }
}

impl Default for MockSink {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl SnapshotSink for MockSink {
    async fn flush(&self, snapshot: &Snapshot) -> Result<()> {
        self.calls.lock().unwrap().push(snapshot.clone());
        Ok(())
    }
}
