//! HTTP transport for the politeness governor
//!
//! This module provides the raw page transport used for both pages and
//! robots.txt files:
//! - [`HttpTransport`] - the seam the governor fetches through
//! - [`ReqwestTransport`] - `reqwest` implementation with bounded connect/read timeouts
//!   and an optional body size cap
//! - [`decode_body`] - charset-aware body decoding
//!
//! The transport performs exactly one request per call. There is no retry or
//! backoff at this layer or any other.

use async_trait::async_trait;
use encoding_rs::{Encoding, UTF_8};
use reqwest::{header::CONTENT_TYPE, Client};
use std::time::Duration;
use thiserror::Error;

use crate::config::PolitenessConfig;
use crate::utils::error::FetchError;

/// Raw HTTP response
#[derive(Debug, Clone, Default)]
pub struct HttpResponse {
    /// Status code
    pub status: u16,

    /// `Content-Type` header, if present
    pub content_type: Option<String>,

    /// Response body bytes, possibly cut short by the transport's body limit
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Transport-level failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// Connect or read timeout elapsed
    #[error("timed out")]
    Timeout,

    /// DNS, connect, TLS or protocol failure
    #[error("{0}")]
    Network(String),
}

impl From<TransportError> for FetchError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Timeout => FetchError::Timeout,
            TransportError::Network(msg) => FetchError::Network(msg),
        }
    }
}

/// Single-request HTTP GET
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Fetch `url`, returning the response whatever its status
    async fn get(&self, url: &str) -> Result<HttpResponse, TransportError>;
}

/// `reqwest`-backed transport
pub struct ReqwestTransport {
    /// HTTP client with configured timeouts and user agent
    client: Client,

    /// Stop reading a body once it is longer than this many bytes
    body_limit: Option<u64>,
}

impl ReqwestTransport {
    /// Create a transport from politeness settings
    ///
    /// # Arguments
    ///
    /// * `user_agent` - Identity string sent with every request
    /// * `config` - Connect and read timeouts, and the per-host byte quota
    ///
    /// No host may receive more than its quota, so bodies are cut one byte past
    /// it: enough to trip the breaker without buffering the rest.
    ///
    /// # Errors
    ///
    /// Returns `reqwest::Error` if the HTTP client cannot be created
    pub fn new(user_agent: &str, config: &PolitenessConfig) -> Result<Self, reqwest::Error> {
        let transport =
            Self::with_timeouts(user_agent, config.connect_timeout(), config.read_timeout())?;
        Ok(transport.with_body_limit(config.per_host_byte_quota.saturating_add(1)))
    }

    /// Create a transport with explicit timeouts and no body limit
    ///
    /// `read_timeout` bounds each socket read, so a slow body that keeps
    /// arriving is never cut off.
    pub fn with_timeouts(
        user_agent: &str,
        connect_timeout: Duration,
        read_timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent(user_agent)
            .connect_timeout(connect_timeout)
            .read_timeout(read_timeout)
            .gzip(true)
            .build()?;

        Ok(Self {
            client,
            body_limit: None,
        })
    }

    /// Stop reading bodies once they exceed `limit` bytes
    #[must_use]
    pub fn with_body_limit(mut self, limit: u64) -> Self {
        self.body_limit = Some(limit);
        self
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn get(&self, url: &str) -> Result<HttpResponse, TransportError> {
        let mut response = self.client.get(url).send().await.map_err(classify)?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await.map_err(classify)? {
            body.extend_from_slice(&chunk);
            if let Some(limit) = self.body_limit.filter(|&limit| body.len() as u64 > limit) {
                tracing::debug!(url, limit, "Body limit reached, truncating");
                break;
            }
        }

        Ok(HttpResponse {
            status,
            content_type,
            body,
        })
    }
}

fn classify(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout
    } else {
        TransportError::Network(err.to_string())
    }
}

/// Decode a body using the charset named in `content_type`
///
/// Unknown or missing charsets fall back to UTF-8; undecodable sequences become
/// replacement characters rather than errors.
pub fn decode_body(bytes: &[u8], content_type: Option<&str>) -> String {
    let encoding = content_type
        .and_then(charset_label)
        .and_then(|label| Encoding::for_label(label.as_bytes()))
        .unwrap_or(UTF_8);

    let (cow, _encoding, _had_errors) = encoding.decode(bytes);
    cow.into_owned()
}

fn charset_label(content_type: &str) -> Option<String> {
    content_type.split(';').skip(1).find_map(|param| {
        let (key, value) = param.split_once('=')?;
        key.trim()
            .eq_ignore_ascii_case("charset")
            .then(|| value.trim().trim_matches('"').to_ascii_lowercase())
    })
}
