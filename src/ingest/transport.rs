// src/ingest/transport.rs
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, HOST, USER_AGENT};
use reqwest::{Client, Url};

use crate::ingest::error::IngestError;
use crate::ingest::types::FetchOptions;

pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/90.0.4430.212 Safari/537.36";
pub const BROWSER_ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,image/apng,*/*;q=0.8,application/signed-exchange;v=b3;q=0.9";

/// Outbound GET returning the fully drained response body.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, target: &str, opts: FetchOptions) -> Result<Vec<u8>, IngestError>;
}

/// reqwest-backed fetcher. Holds one verifying and one non-verifying client,
/// both bounded by the same per-request deadline.
#[derive(Clone)]
pub struct HttpFetcher {
    strict: Client,
    insecure: Client,
    timeout: Duration,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self, IngestError> {
        let build = |insecure: bool| {
            Client::builder()
                .timeout(timeout)
                .connect_timeout(timeout)
                .danger_accept_invalid_certs(insecure)
                .build()
                .map_err(|e| IngestError::Config(format!("http client: {e}")))
        };
        Ok(Self {
            strict: build(false)?,
            insecure: build(true)?,
            timeout,
        })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, target: &str, opts: FetchOptions) -> Result<Vec<u8>, IngestError> {
        let client = if opts.insecure_tls {
            &self.insecure
        } else {
            &self.strict
        };

        let mut req = client.get(target);
        if opts.browser_headers {
            req = req
                .header(USER_AGENT, BROWSER_USER_AGENT)
                .header(ACCEPT, BROWSER_ACCEPT);
            if let Some(host) = host_header(target) {
                req = req.header(HOST, host);
            }
        }

        let resp = req.send().await.map_err(|e| {
            if e.is_timeout() {
                IngestError::transport(target, format!("timed out after {:?}", self.timeout))
            } else {
                IngestError::transport(target, format!("request failed: {e}"))
            }
        })?;

        let status = resp.status();
        if !status.is_success() {
            // Drain so the connection can be reused.
            let _ = resp.bytes().await;
            return Err(IngestError::status(
                target,
                status.as_u16(),
                status.canonical_reason().unwrap_or("unknown"),
            ));
        }

        let body = resp
            .bytes()
            .await
            .map_err(|e| IngestError::transport(target, format!("read body failed: {e}")))?;
        Ok(body.to_vec())
    }
}

/// `host[:port]` of the target, as a browser would send it.
fn host_header(target: &str) -> Option<String> {
    let url = Url::parse(target).ok()?;
    let host = url.host_str()?;
    Some(match url.port() {
        Some(p) => format!("{host}:{p}"),
        None => host.to_string(),
    })
}

// --- Test helper ---

/// Canned responses keyed by target. Unknown targets fail with a transport error.
pub struct MockFetcher {
    responses: Mutex<HashMap<String, Result<Vec<u8>, u16>>>,
    pub calls: Mutex<Vec<String>>,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(HashMap::new()),
            calls: Mutex::new(vec![]),
        }
    }

    /// Serve `body` with a 200 for `target`.
    pub fn ok(&self, target: &str, body: impl Into<Vec<u8>>) {
        self.responses
            .lock()
            .unwrap()
            .insert(target.to_string(), Ok(body.into()));
    }

    /// Fail `target` with the given HTTP status.
    pub fn fail(&self, target: &str, status: u16) {
        self.responses
            .lock()
            .unwrap()
            .insert(target.to_string(), Err(status));
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

impl Default for MockFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Fetcher for MockFetcher {
    async fn fetch(&self, target: &str, _opts: FetchOptions) -> Result<Vec<u8>, IngestError> {
        self.calls.lock().unwrap().push(target.to_string());
        match self.responses.lock().unwrap().get(target) {
            Some(Ok(body)) => Ok(body.clone()),
            Some(Err(code)) => Err(IngestError::status(target, *code, "mock")),
            None => Err(IngestError::transport(target, "connection refused")),
        }
    }
}
