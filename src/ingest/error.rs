// src/ingest/error.rs
use thiserror::Error;

/// Per-source failure taxonomy. None of these are fatal to the scheduler.
#[derive(Debug, Error)]
pub enum IngestError {
    /// Connection failure, timeout, or non-2xx status.
    #[error("transport error for {target}: {message}")]
    Transport {
        target: String,
        status: Option<u16>,
        message: String,
    },

    /// Malformed envelope or unusable document.
    #[error("extract error for {source_key}: {message}")]
    Extract { source_key: String, message: String },

    /// Legacy-encoding decode failure; callers degrade to replacement characters.
    #[error("cannot decode {encoding} input: {message}")]
    Encoding {
        encoding: &'static str,
        message: String,
    },

    /// Invalid registry entry, raised at startup only.
    #[error("invalid source configuration: {0}")]
    Config(String),
}

impl IngestError {
    pub fn transport(target: impl Into<String>, message: impl Into<String>) -> Self {
        IngestError::Transport {
            target: target.into(),
            status: None,
            message: message.into(),
        }
    }

    pub fn status(target: impl Into<String>, code: u16, reason: &str) -> Self {
        IngestError::Transport {
            target: target.into(),
            status: Some(code),
            message: format!("status code error: {code} {reason}"),
        }
    }

    pub fn extract(source_key: impl Into<String>, message: impl Into<String>) -> Self {
        IngestError::Extract {
            source_key: source_key.into(),
            message: message.into(),
        }
    }

    /// Short label used for the `outcome` metric dimension.
    pub fn kind(&self) -> &'static str {
        match self {
            IngestError::Transport { .. } => "transport",
            IngestError::Extract { .. } => "extract",
            IngestError::Encoding { .. } => "encoding",
            IngestError::Config(_) => "config",
        }
    }

    pub fn status_code(&self) -> Option<u16> {
        match self {
            IngestError::Transport { status, .. } => *status,
            _ => None,
        }
    }
}
