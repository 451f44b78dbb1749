// src/ingest/extract/markup.rs
use encoding_rs::Encoding;
use scraper::{Html, Selector};

use crate::ingest::encoding;
use crate::ingest::error::IngestError;
use crate::ingest::types::Record;

/// Marker used by some sites for decorative / ad anchors that lead nowhere.
pub const PLACEHOLDER_LINK: &str = "javascript:void(0)";

/// Selector-driven extractor for HTML listing pages.
#[derive(Debug, Clone)]
pub struct MarkupExtractor {
    selector: String,
    link_attr: String,
    link_prefix: String,
    encoding: Option<&'static Encoding>,
}

impl MarkupExtractor {
    /// Fails if `selector` is not a valid CSS selector.
    pub fn new(selector: impl Into<String>) -> Result<Self, IngestError> {
        let selector = selector.into();
        compile(&selector).map_err(IngestError::Config)?;
        Ok(Self {
            selector,
            link_attr: "href".to_string(),
            link_prefix: String::new(),
            encoding: None,
        })
    }

    /// Prefix prepended to every raw link value (for relative hrefs).
    pub fn with_link_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.link_prefix = prefix.into();
        self
    }

    /// Mark the source as legacy-encoded; the body is decoded before parsing.
    pub fn with_encoding(mut self, encoding: &'static Encoding) -> Self {
        self.encoding = Some(encoding);
        self
    }

    pub fn with_link_attr(mut self, attr: impl Into<String>) -> Self {
        self.link_attr = attr.into();
        self
    }

    pub fn selector(&self) -> &str {
        &self.selector
    }

    pub fn link_prefix(&self) -> &str {
        &self.link_prefix
    }

    pub fn encoding(&self) -> Option<&'static Encoding> {
        self.encoding
    }

    pub fn extract(&self, source_key: &str, body: &[u8]) -> Result<Vec<Record>, IngestError> {
        let text = match self.encoding {
            Some(enc) => encoding::decode_lenient(body, enc),
            None => String::from_utf8_lossy(body).into_owned(),
        };
        let selector = compile(&self.selector).map_err(|e| IngestError::extract(source_key, e))?;
        let doc = Html::parse_document(&text);

        let mut out = Vec::new();
        for el in doc.select(&selector) {
            let Some(raw_link) = el.value().attr(&self.link_attr) else {
                continue;
            };
            if raw_link.contains(PLACEHOLDER_LINK) {
                continue;
            }
            let title = el.text().collect::<String>();
            out.push(Record::new(
                title.trim(),
                format!("{}{}", self.link_prefix, raw_link),
            ));
        }

        tracing::debug!(
            target: "ingest",
            source = source_key,
            matched = out.len(),
            "markup extracted"
        );
        Ok(out)
    }
}

fn compile(selector: &str) -> Result<Selector, String> {
    Selector::parse(selector).map_err(|e| format!("invalid selector '{selector}': {e}"))
}
