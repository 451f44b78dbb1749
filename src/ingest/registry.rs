// src/ingest/registry.rs
use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::Path;

use crate::ingest::encoding;
use crate::ingest::error::IngestError;
use crate::ingest::extract::{Extractor, MarkupExtractor, StructuredExtractor};
use crate::ingest::types::{FetchOptions, SourceSpec};

const ENV_PATH: &str = "HOTSPOT_SOURCES_PATH";

/// Source list compiled into the binary.
pub const EMBEDDED_SOURCES: &str = include_str!("../../config/sources.toml");

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
enum Kind {
    Structured,
    Markup,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawSource {
    key: String,
    url: String,
    kind: Kind,
    selector: Option<String>,
    encoding: Option<String>,
    link_prefix: Option<String>,
    link_attr: Option<String>,
    #[serde(default)]
    insecure_tls: bool,
    #[serde(default)]
    browser_headers: bool,
}

#[derive(Debug, Deserialize)]
struct RawRegistry {
    #[serde(default, rename = "source")]
    sources: Vec<RawSource>,
}

/// Ordered, immutable list of sources. Order is refresh order.
#[derive(Debug, Clone)]
pub struct SourceRegistry {
    sources: Vec<SourceSpec>,
}

impl SourceRegistry {
    /// The registry shipped in `config/sources.toml`.
    pub fn embedded() -> Result<Self, IngestError> {
        Self::from_toml_str(EMBEDDED_SOURCES)
    }

    pub fn from_toml_str(s: &str) -> Result<Self, IngestError> {
        let raw: RawRegistry =
            toml::from_str(s).map_err(|e| IngestError::Config(format!("parsing sources: {e}")))?;
        let mut seen = HashSet::new();
        let mut sources = Vec::with_capacity(raw.sources.len());
        for r in raw.sources {
            let spec = build_spec(r)?;
            if !seen.insert(spec.key.clone()) {
                return Err(IngestError::Config(format!("duplicate source key '{}'", spec.key)));
            }
            sources.push(spec);
        }
        if sources.is_empty() {
            return Err(IngestError::Config("no sources configured".into()));
        }
        Ok(Self { sources })
    }

    /// Build directly from already-constructed specs (tests, embedding apps).
    pub fn from_specs(sources: Vec<SourceSpec>) -> Self {
        Self { sources }
    }

    /// Load an override file.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading sources from {}", path.display()))?;
        Self::from_toml_str(&content).with_context(|| format!("validating {}", path.display()))
    }

    /// $HOTSPOT_SOURCES_PATH if set, otherwise the embedded list.
    pub fn load_default() -> Result<Self> {
        if let Ok(p) = std::env::var(ENV_PATH) {
            let path = Path::new(&p);
            if !path.exists() {
                return Err(anyhow!("{ENV_PATH} points to non-existent path {p}"));
            }
            return Self::load_from(path);
        }
        Ok(Self::embedded()?)
    }

    pub fn sources(&self) -> &[SourceSpec] {
        &self.sources
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SourceSpec> {
        self.sources.iter()
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

fn build_spec(r: RawSource) -> Result<SourceSpec, IngestError> {
    let key = r.key.trim().to_string();
    if key.is_empty() {
        return Err(IngestError::Config(format!("source for {} has an empty key", r.url)));
    }
    match reqwest::Url::parse(&r.url) {
        Ok(u) if matches!(u.scheme(), "http" | "https") => {}
        _ => {
            return Err(IngestError::Config(format!(
                "source '{key}': url must be http(s), got '{}'",
                r.url
            )))
        }
    }

    let extractor = match r.kind {
        Kind::Structured => {
            if r.selector.is_some()
                || r.encoding.is_some()
                || r.link_prefix.is_some()
                || r.link_attr.is_some()
            {
                return Err(IngestError::Config(format!(
                    "source '{key}': structured sources take no extraction parameters"
                )));
            }
            Extractor::Structured(StructuredExtractor::new())
        }
        Kind::Markup => {
            let selector = r.selector.ok_or_else(|| {
                IngestError::Config(format!("source '{key}': markup sources need a selector"))
            })?;
            let mut x = MarkupExtractor::new(selector)?;
            if let Some(prefix) = r.link_prefix {
                x = x.with_link_prefix(prefix);
            }
            if let Some(attr) = r.link_attr {
                x = x.with_link_attr(attr);
            }
            if let Some(label) = r.encoding {
                x = x.with_encoding(encoding::resolve(&label)?);
            }
            Extractor::Markup(x)
        }
    };

    Ok(SourceSpec {
        key,
        target: r.url,
        fetch: FetchOptions {
            insecure_tls: r.insecure_tls,
            browser_headers: r.browser_headers,
        },
        extractor,
    })
}
