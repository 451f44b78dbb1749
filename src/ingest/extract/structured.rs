// src/ingest/extract/structured.rs
use once_cell::sync::OnceCell;
use regex::Regex;
use serde::Deserialize;

use crate::ingest::error::IngestError;
use crate::ingest::types::Record;

#[derive(Debug, Deserialize)]
struct Envelope {
    data: Vec<Entry>,
}

#[derive(Debug, Deserialize)]
struct Entry {
    #[serde(default)]
    target: Target,
}

/// Null or missing fields read as empty; only the envelope shape is strict.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Target {
    title: Option<String>,
    url: Option<String>,
}

/// Extractor for the hot-list JSON API. Field paths are fixed by the envelope shape.
#[derive(Debug, Clone, Default)]
pub struct StructuredExtractor;

impl StructuredExtractor {
    pub fn new() -> Self {
        Self
    }

    pub fn extract(&self, source_key: &str, body: &[u8]) -> Result<Vec<Record>, IngestError> {
        let env: Envelope = serde_json::from_slice(body)
            .map_err(|e| IngestError::extract(source_key, format!("bad envelope: {e}")))?;

        Ok(env
            .data
            .into_iter()
            .map(|e| {
                let url = e.target.url.unwrap_or_default();
                Record::new(e.target.title.unwrap_or_default(), rewrite_api_url(&url))
            })
            .collect())
    }
}

/// `https://api.<domain>/questions/<id>` -> `https://www.<domain>/question/<id>`.
/// Anything else is returned unchanged.
pub fn rewrite_api_url(url: &str) -> String {
    static RE_API_QUESTION: OnceCell<Regex> = OnceCell::new();
    let re = RE_API_QUESTION.get_or_init(|| {
        Regex::new(r"^(?P<scheme>https?://)api\.(?P<domain>[^/]+)/questions/(?P<id>\d+)")
            .unwrap()
    });
    re.replace(url, "${scheme}www.${domain}/question/${id}")
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rewrites_api_question_urls() {
        assert_eq!(
            rewrite_api_url("https://api.example.com/questions/123"),
            "https://www.example.com/question/123"
        );
        assert_eq!(
            rewrite_api_url("https://api.zhihu.com/questions/451966718?utm=x"),
            "https://www.zhihu.com/question/451966718?utm=x"
        );
    }

    #[test]
    fn leaves_unrelated_urls_alone() {
        for u in [
            "https://www.example.com/question/123",
            "https://api.example.com/articles/9",
            "https://example.com/api.example.com/questions/1",
            "",
        ] {
            assert_eq!(rewrite_api_url(u), u);
        }
    }

    #[test]
    fn maps_envelope_in_order() {
        let body = br#"{
            "fresh_text": "ignored",
            "data": [
                {"id": "a", "target": {"id": 1, "title": "First <b>", "url": "https://api.example.com/questions/1"}},
                {"id": "b", "target": {"id": 2, "title": "Second", "url": "https://www.example.com/zvideo/2"}}
            ]
        }"#;
        let out = StructuredExtractor::new().extract("zhihu", body).unwrap();
        assert_eq!(
            out,
            vec![
                Record::new("First <b>", "https://www.example.com/question/1"),
                Record::new("Second", "https://www.example.com/zvideo/2"),
            ]
        );
    }

    #[test]
    fn malformed_envelope_is_extract_error() {
        let x = StructuredExtractor::new();
        for body in [
            &b"<html>"[..],
            &br#"{"data": 3}"#[..],
            &br#"{"items": []}"#[..],
        ] {
            let err = x.extract("zhihu", body).unwrap_err();
            assert!(matches!(err, IngestError::Extract { .. }), "{err}");
        }
    }

    #[test]
    fn null_or_missing_fields_read_as_empty() {
        let body = br#"{"data": [
            {"target": {"title": "Good", "url": "https://api.example.com/questions/7"}},
            {"target": {"title": null, "url": "https://www.example.com/zvideo/8"}},
            {"target": {"title": "No url"}},
            {"target": {"title": "Last", "url": "https://www.example.com/p/9"}}
        ]}"#;
        let out = StructuredExtractor::new().extract("zhihu", body).unwrap();
        assert_eq!(
            out,
            vec![
                Record::new("Good", "https://www.example.com/question/7"),
                Record::new("", "https://www.example.com/zvideo/8"),
                Record::new("No url", ""),
                Record::new("Last", "https://www.example.com/p/9"),
            ]
        );
    }

    #[test]
    fn empty_data_is_ok() {
        let out = StructuredExtractor::new()
            .extract("zhihu", br#"{"data": []}"#)
            .unwrap();
        assert!(out.is_empty());
    }
}
