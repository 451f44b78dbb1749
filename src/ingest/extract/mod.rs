// src/ingest/extract/mod.rs
pub mod markup;
pub mod structured;

pub use markup::MarkupExtractor;
pub use structured::StructuredExtractor;

use crate::ingest::error::IngestError;
use crate::ingest::types::Record;

/// Per-source extraction strategy.
#[derive(Debug, Clone)]
pub enum Extractor {
    /// JSON envelope `{ data: [ { target: { title, url } } ] }`.
    Structured(StructuredExtractor),
    /// CSS selector over an HTML document.
    Markup(MarkupExtractor),
}

impl Extractor {
    /// Turn a raw response body into records, in document order.
    pub fn extract(&self, source_key: &str, body: &[u8]) -> Result<Vec<Record>, IngestError> {
        match self {
            Extractor::Structured(x) => x.extract(source_key, body),
            Extractor::Markup(x) => x.extract(source_key, body),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Extractor::Structured(_) => "structured",
            Extractor::Markup(_) => "markup",
        }
    }
}
