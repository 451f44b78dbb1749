// src/ingest/encoding.rs
//! Conversion of legacy national encodings (GBK / GB18030 family) into UTF-8.

use encoding_rs::{DecoderResult, Encoding};

use crate::ingest::error::IngestError;

/// Resolve a WHATWG encoding label (`"gb18030"`, `"gbk"`, ...).
pub fn resolve(label: &str) -> Result<&'static Encoding, IngestError> {
    Encoding::for_label(label.trim().as_bytes())
        .ok_or_else(|| IngestError::Config(format!("unknown encoding label '{label}'")))
}

/// Strictly decode `raw` from `encoding` into UTF-8.
///
/// The output buffer is allocated once with the decoder's worst-case bound;
/// malformed sequences are an error rather than U+FFFD replacements.
pub fn decode(raw: &[u8], encoding: &'static Encoding) -> Result<String, IngestError> {
    let mut decoder = encoding.new_decoder_without_bom_handling();
    let cap = decoder
        .max_utf8_buffer_length_without_replacement(raw.len())
        .unwrap_or_else(|| raw.len().saturating_mul(3));
    let mut out = String::with_capacity(cap.max(raw.len() * 2));

    let (result, read) = decoder.decode_to_string_without_replacement(raw, &mut out, true);
    match result {
        DecoderResult::InputEmpty => Ok(out),
        DecoderResult::Malformed(bad, _) => Err(IngestError::Encoding {
            encoding: encoding.name(),
            message: format!(
                "malformed sequence of {bad} byte(s) ending at offset {read}"
            ),
        }),
        DecoderResult::OutputFull => Err(IngestError::Encoding {
            encoding: encoding.name(),
            message: format!("output buffer of {cap} bytes exhausted at offset {read}"),
        }),
    }
}

/// Decode, replacing only the malformed sequences with U+FFFD on failure.
/// Well-formed text around a bad byte still decodes normally.
pub fn decode_lenient(raw: &[u8], encoding: &'static Encoding) -> String {
    match decode(raw, encoding) {
        Ok(s) => s,
        Err(e) => {
            tracing::warn!(target: "ingest", error = %e, "legacy decode failed, replacing bad sequences");
            let (text, _) = encoding.decode_without_bom_handling(raw);
            text.into_owned()
        }
    }
}
