//! Common test utilities

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;

use pathcrawl::config::Config;
use pathcrawl::crawler::fetcher::{HttpResponse, HttpTransport, TransportError};
use pathcrawl::crawler::url::CanonicalUrl;
use pathcrawl::frontier::Strategy;

/// Canned reply for one URL
#[derive(Debug, Clone)]
pub enum Reply {
    Response(HttpResponse),
    Fail(TransportError),
}

/// One recorded request
#[derive(Debug, Clone)]
pub struct Call {
    pub url: String,
    pub at: Instant,
}

/// In-memory transport serving canned replies; unknown URLs get a 404
#[derive(Default)]
pub struct FakeTransport {
    replies: HashMap<String, Reply>,
    delay: Duration,
    calls: Mutex<Vec<Call>>,
    active: Mutex<HashMap<String, usize>>,
    max_active: Mutex<HashMap<String, usize>>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Time every reply takes to arrive
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn reply(mut self, url: &str, reply: Reply) -> Self {
        self.replies.insert(url.to_string(), reply);
        self
    }

    pub fn page(self, url: &str, status: u16, content_type: &str, body: &str) -> Self {
        self.reply(
            url,
            Reply::Response(HttpResponse {
                status,
                content_type: Some(content_type.to_string()),
                body: body.as_bytes().to_vec(),
            }),
        )
    }

    pub fn html(self, url: &str, body: &str) -> Self {
        self.page(url, 200, "text/html; charset=utf-8", body)
    }

    /// Serve `body` as `{origin}/robots.txt`
    pub fn robots(self, origin: &str, body: &str) -> Self {
        self.page(&format!("{origin}/robots.txt"), 200, "text/plain", body)
    }

    pub fn fail(self, url: &str, err: TransportError) -> Self {
        self.reply(url, Reply::Fail(err))
    }

    /// Every request in arrival order
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    /// Page requests only, robots.txt excluded
    pub fn page_calls(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|call| !call.url.ends_with("/robots.txt"))
            .collect()
    }

    pub fn count(&self, url: &str) -> usize {
        self.calls().iter().filter(|call| call.url == url).count()
    }

    /// Highest number of simultaneous requests seen for `host`
    pub fn max_concurrent(&self, host: &str) -> usize {
        self.max_active
            .lock()
            .unwrap()
            .get(host)
            .copied()
            .unwrap_or(0)
    }
}

fn host_of(raw: &str) -> String {
    let parsed = url::Url::parse(raw).unwrap();
    let host = parsed.host_str().unwrap_or_default().to_string();
    match parsed.port() {
        Some(port) => format!("{host}:{port}"),
        None => host,
    }
}

#[async_trait]
impl HttpTransport for FakeTransport {
    async fn get(&self, url: &str) -> Result<HttpResponse, TransportError> {
        let host = host_of(url);
        self.calls.lock().unwrap().push(Call {
            url: url.to_string(),
            at: Instant::now(),
        });

        {
            let mut active = self.active.lock().unwrap();
            let now_active = active.entry(host.clone()).or_insert(0);
            *now_active += 1;
            let mut max_active = self.max_active.lock().unwrap();
            let max = max_active.entry(host.clone()).or_insert(0);
            *max = (*max).max(*now_active);
        }

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        if let Some(now_active) = self.active.lock().unwrap().get_mut(&host) {
            *now_active -= 1;
        }

        match self.replies.get(url) {
            Some(Reply::Response(response)) => Ok(response.clone()),
            Some(Reply::Fail(err)) => Err(err.clone()),
            None => Ok(HttpResponse {
                status: 404,
                content_type: Some("text/plain".to_string()),
                body: b"not found".to_vec(),
            }),
        }
    }
}

pub fn url(s: &str) -> CanonicalUrl {
    CanonicalUrl::parse(s).unwrap()
}

/// Minimal HTML page with a title and anchors
pub fn page_html(title: &str, links: &[&str]) -> String {
    let anchors: String = links
        .iter()
        .map(|href| format!("<a href=\"{href}\">link</a>"))
        .collect();
    format!("<html><head><title>{title}</title></head><body>{anchors}</body></html>")
}

/// Config with no throttle and a fixed frontier seed
pub fn test_config(strategy: Strategy, max_pages: usize) -> Config {
    let mut config = Config::default();
    config.crawler.strategy = strategy;
    config.crawler.max_pages = max_pages;
    config.crawler.rng_seed = Some(42);
    config.crawler.user_agent = "pathcrawl-test/1.0".to_string();
    config.politeness.throttle_interval_secs = 0.0;
    config
}
