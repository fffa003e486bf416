//! Per-host politeness governor
//!
//! Every page fetch goes through [`PolitenessGovernor::attempt_fetch`], which
//! enforces, in order:
//! 1. robots.txt rules (resolved lazily once per host, fail-open)
//! 2. the per-host byte quota circuit breaker
//! 3. the minimum inter-request gap (`throttle_interval`)
//!
//! Each host's record sits behind its own async mutex which is held for the
//! whole attempt, so at most one fetch per host is in flight and the throttle
//! holds across concurrent callers.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::config::PolitenessConfig;
use crate::crawler::fetcher::{decode_body, HttpTransport};
use crate::crawler::robots::RobotsRules;
use crate::crawler::url::{CanonicalUrl, HostKey};
use crate::utils::error::FetchError;

/// Politeness state of one host
#[derive(Debug, Default)]
pub struct PolitenessRecord {
    /// Rules resolved on first access
    robots: Option<RobotsRules>,

    /// Start time of the most recent fetch attempt
    last_fetch_at: Option<Instant>,

    /// Body bytes received from this host this session
    bytes_fetched: u64,
}

/// Read-only copy of a host's politeness state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolitenessSnapshot {
    pub robots_resolved: bool,
    pub last_fetch_at: Option<Instant>,
    pub bytes_fetched: u64,
}

/// Successfully fetched page
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// URL that was requested
    pub url: CanonicalUrl,

    /// Status code (always 2xx)
    pub status: u16,

    /// `Content-Type` header, empty when absent
    pub content_type: String,

    /// Decoded body
    pub body: String,

    /// Raw body length counted against the host quota
    pub bytes: u64,
}

/// Session-scoped robots, throttle and byte-quota enforcement
pub struct PolitenessGovernor<T: HttpTransport> {
    transport: Arc<T>,
    user_agent: String,
    throttle_interval: Duration,
    byte_quota: u64,
    records: std::sync::Mutex<HashMap<HostKey, Arc<Mutex<PolitenessRecord>>>>,
}

impl<T: HttpTransport> PolitenessGovernor<T> {
    /// Create a governor with empty per-host state
    pub fn new(
        transport: Arc<T>,
        user_agent: impl Into<String>,
        config: &PolitenessConfig,
    ) -> Self {
        Self {
            transport,
            user_agent: user_agent.into(),
            throttle_interval: config.throttle_interval(),
            byte_quota: config.per_host_byte_quota,
            records: std::sync::Mutex::new(HashMap::new()),
        }
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// Record for `host`, created on first access
    fn record(&self, host: &HostKey) -> Arc<Mutex<PolitenessRecord>> {
        let mut records = self
            .records
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        records.entry(host.clone()).or_default().clone()
    }

    /// Current state of `host`, if it has been touched this session
    pub async fn snapshot(&self, host: &HostKey) -> Option<PolitenessSnapshot> {
        let record = {
            let records = self
                .records
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            records.get(host)?.clone()
        };

        let record = record.lock().await;
        Some(PolitenessSnapshot {
            robots_resolved: record.robots.is_some(),
            last_fetch_at: record.last_fetch_at,
            bytes_fetched: record.bytes_fetched,
        })
    }

    /// Number of hosts with a politeness record
    pub fn host_count(&self) -> usize {
        self.records
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .len()
    }

    /// Gate, throttle and fetch `url`
    ///
    /// # Errors
    ///
    /// - `RobotsDisallowed` before any network access; no state changes
    /// - `QuotaExceeded` once the host's breaker has tripped; no network access
    /// - `Timeout`, `HttpStatus`, `Network` from the fetch itself; the attempt
    ///   time is still recorded
    pub async fn attempt_fetch(&self, url: &CanonicalUrl) -> Result<FetchedPage, FetchError> {
        let host = url.host();
        let record = self.record(host);
        let mut record = record.lock().await;

        if record.robots.is_none() {
            record.robots = Some(self.resolve_robots(url).await);
        }
        let allowed = record
            .robots
            .as_ref()
            .map_or(true, |rules| rules.can_fetch(&self.user_agent, url.as_str()));
        if !allowed {
            tracing::debug!(url = %url, "Disallowed by robots.txt");
            return Err(FetchError::RobotsDisallowed(url.to_string()));
        }

        if record.bytes_fetched > self.byte_quota {
            return Err(self.quota_error(host, record.bytes_fetched));
        }

        if let Some(last) = record.last_fetch_at {
            let elapsed = last.elapsed();
            if elapsed < self.throttle_interval {
                let wait = self.throttle_interval - elapsed;
                tracing::trace!(host = %host, wait_ms = wait.as_millis() as u64, "Throttling");
                tokio::time::sleep(wait).await;
            }
        }

        record.last_fetch_at = Some(Instant::now());
        tracing::debug!(url = %url, "Fetching URL");

        let response = self.transport.get(url.as_str()).await?;
        if !response.is_success() {
            return Err(FetchError::HttpStatus(response.status));
        }

        let bytes = response.body.len() as u64;
        record.bytes_fetched = record.bytes_fetched.saturating_add(bytes);
        if record.bytes_fetched > self.byte_quota {
            tracing::warn!(
                host = %host,
                bytes_fetched = record.bytes_fetched,
                quota = self.byte_quota,
                "Byte quota tripped"
            );
        }

        let content_type = response.content_type.unwrap_or_default();
        let body = decode_body(&response.body, Some(content_type.as_str()));

        Ok(FetchedPage {
            url: url.clone(),
            status: response.status,
            content_type,
            body,
            bytes,
        })
    }

    /// Fetch and parse robots.txt; any failure allows everything
    async fn resolve_robots(&self, url: &CanonicalUrl) -> RobotsRules {
        let robots_url = url.robots_url();

        match self.transport.get(&robots_url).await {
            Ok(response) if response.is_success() => {
                let body = decode_body(&response.body, response.content_type.as_deref());
                tracing::debug!(robots_url = %robots_url, "Loaded robots.txt");
                RobotsRules::from_body(body)
            }
            Ok(response) => {
                tracing::debug!(
                    robots_url = %robots_url,
                    status = response.status,
                    "No robots.txt, allowing all"
                );
                RobotsRules::allow_all()
            }
            Err(e) => {
                tracing::debug!(
                    robots_url = %robots_url,
                    error = %e,
                    "robots.txt unreachable, allowing all"
                );
                RobotsRules::allow_all()
            }
        }
    }

    fn quota_error(&self, host: &HostKey, fetched: u64) -> FetchError {
        FetchError::QuotaExceeded {
            host: host.to_string(),
            fetched,
            quota: self.byte_quota,
        }
    }
}
