//! Transport capability consumed by the cache
//!
//! The cache only needs three things from a client: set request headers,
//! send GET, send HEAD. Everything here is backend-neutral; the pooled
//! reqwest implementation lives in [`http`].
//!
//! - `config`: client tuning and backend selection
//! - `http`: pooled reqwest backend with rate limiting and retry

use std::collections::BTreeMap;
use std::io;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{self, BoxStream, StreamExt};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::auth::CredentialsProvider;
use crate::errors::TransportResult;

pub mod config;
pub mod http;

pub use config::ClientConfig;
pub use http::ReqwestTransport;

/// Streaming response body
pub type ResponseBody = BoxStream<'static, io::Result<Bytes>>;

/// Outgoing request: target URI plus headers
#[derive(Debug, Clone)]
pub struct TransportRequest {
    url: Url,
    headers: Vec<(String, String)>,
}

impl TransportRequest {
    /// Create a request without headers
    pub fn new(url: Url) -> Self {
        Self {
            url,
            headers: Vec::new(),
        }
    }

    /// Set a header, replacing any value with the same case-insensitive name
    pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        self.headers
            .retain(|(existing, _)| !existing.eq_ignore_ascii_case(&name));
        self.headers.push((name, value.into()));
    }

    /// Value of a header, case-insensitive
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// All headers in insertion order
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Target URI
    pub fn url(&self) -> &Url {
        &self.url
    }
}

/// Response to a GET or HEAD
///
/// Dropping the response drops the body stream, which closes the
/// underlying connection or returns it to the pool.
pub struct TransportResponse {
    /// Numeric status code
    pub status: u16,
    /// Status line, e.g. `HTTP/1.1 200 OK`
    pub status_line: String,
    /// Response headers in wire order, names as received
    pub headers: Vec<(String, String)>,
    body: Option<ResponseBody>,
}

impl std::fmt::Debug for TransportResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransportResponse")
            .field("status", &self.status)
            .field("status_line", &self.status_line)
            .field("headers", &self.headers)
            .field("has_body", &self.body.is_some())
            .finish()
    }
}

impl TransportResponse {
    /// Create a bodyless response with a canonical status line
    pub fn new(status: u16) -> Self {
        let reason = reqwest::StatusCode::from_u16(status)
            .ok()
            .and_then(|code| code.canonical_reason())
            .unwrap_or("");
        Self {
            status,
            status_line: format!("HTTP/1.1 {} {}", status, reason).trim_end().to_string(),
            headers: Vec::new(),
            body: None,
        }
    }

    /// Override the status line
    pub fn with_status_line(mut self, status_line: impl Into<String>) -> Self {
        self.status_line = status_line.into();
        self
    }

    /// Append a header
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Attach a streaming body
    pub fn with_body_stream(mut self, body: ResponseBody) -> Self {
        self.body = Some(body);
        self
    }

    /// Attach an in-memory body
    pub fn with_body(self, body: impl Into<Bytes>) -> Self {
        let chunk: io::Result<Bytes> = Ok(body.into());
        self.with_body_stream(stream::iter(vec![chunk]).boxed())
    }

    /// First value of a header, case-insensitive
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Headers keyed by lower-cased name, repeated values joined with `,`
    pub fn header_map(&self) -> BTreeMap<String, String> {
        let mut map: BTreeMap<String, String> = BTreeMap::new();
        for (name, value) in &self.headers {
            map.entry(name.to_ascii_lowercase())
                .and_modify(|existing| {
                    existing.push(',');
                    existing.push_str(value);
                })
                .or_insert_with(|| value.clone());
        }
        map
    }

    /// Take the body stream; an absent body yields an empty stream
    pub fn into_body(self) -> ResponseBody {
        self.body.unwrap_or_else(|| stream::empty().boxed())
    }
}

/// Client capability used by cache lines
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send a GET and return status, headers and body stream
    async fn get(&self, request: TransportRequest) -> TransportResult<TransportResponse>;

    /// Send a HEAD and return status and headers
    async fn head(&self, request: TransportRequest) -> TransportResult<TransportResponse>;
}

/// Network backend selected by configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportBackend {
    /// Pooled, rate limited reqwest client
    #[default]
    Pooled,
}

impl TransportBackend {
    /// Build the configured backend
    pub fn build(
        self,
        config: &ClientConfig,
        credentials: Arc<dyn CredentialsProvider>,
    ) -> TransportResult<Arc<dyn Transport>> {
        match self {
            TransportBackend::Pooled => Ok(Arc::new(ReqwestTransport::new(config, credentials)?)),
        }
    }
}
