// src/ingest/types.rs
use serde::{Deserialize, Serialize};

use crate::ingest::extract::Extractor;

/// One trending-topic entry as published.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Record {
    pub title: String,
    pub link: String,
}

impl Record {
    pub fn new(title: impl Into<String>, link: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            link: link.into(),
        }
    }
}

/// Normalized output of one refresh of one source, in site presentation order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceResult {
    pub source_key: String,
    pub records: Vec<Record>,
}

/// Per-source request policy handed to the transport.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FetchOptions {
    /// Skip TLS certificate validation (some targets ship broken chains).
    pub insecure_tls: bool,
    /// Send User-Agent / Accept / Host like a desktop browser.
    pub browser_headers: bool,
}

/// Static description of how to fetch and extract one source.
#[derive(Debug, Clone)]
pub struct SourceSpec {
    pub key: String,
    pub target: String,
    pub fetch: FetchOptions,
    pub extractor: Extractor,
}
