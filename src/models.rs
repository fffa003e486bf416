//! Core data structures shared across the crawler

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use crate::crawler::url::CanonicalUrl;
use crate::parser::PageSummary;

/// One output row per successfully fetched HTML page
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OutputRecord {
    pub url: String,
    pub keywords: String,
    pub description: String,
    pub title: String,
}

impl OutputRecord {
    pub fn new(url: &CanonicalUrl, summary: &PageSummary) -> Self {
        Self {
            url: url.to_string(),
            keywords: summary.keywords.clone(),
            description: summary.description.clone(),
            title: summary.title.clone(),
        }
    }

    /// Fields in output column order
    pub fn fields(&self) -> [&str; 4] {
        [&self.url, &self.keywords, &self.description, &self.title]
    }
}

/// Live counters updated by crawl workers
#[derive(Debug, Default)]
pub struct CrawlCounters {
    pub pages_fetched: AtomicU64,
    pub records_written: AtomicU64,
    pub robots_denied: AtomicU64,
    pub quota_denied: AtomicU64,
    pub fetch_errors: AtomicU64,
    pub duplicates_skipped: AtomicU64,
    pub bytes_fetched: AtomicU64,
}

impl CrawlCounters {
    pub fn incr(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self, duration: Duration) -> CrawlStats {
        CrawlStats {
            pages_fetched: self.pages_fetched.load(Ordering::Relaxed),
            records_written: self.records_written.load(Ordering::Relaxed),
            robots_denied: self.robots_denied.load(Ordering::Relaxed),
            quota_denied: self.quota_denied.load(Ordering::Relaxed),
            fetch_errors: self.fetch_errors.load(Ordering::Relaxed),
            duplicates_skipped: self.duplicates_skipped.load(Ordering::Relaxed),
            bytes_fetched: self.bytes_fetched.load(Ordering::Relaxed),
            duration,
        }
    }
}

/// Crawl statistics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CrawlStats {
    pub pages_fetched: u64,
    pub records_written: u64,
    pub robots_denied: u64,
    pub quota_denied: u64,
    pub fetch_errors: u64,
    pub duplicates_skipped: u64,
    pub bytes_fetched: u64,
    pub duration: Duration,
}

impl CrawlStats {
    /// URLs dropped by the governor or transport
    pub fn total_dropped(&self) -> u64 {
        self.robots_denied + self.quota_denied + self.fetch_errors
    }

    /// Calculate error rate as percentage of fetch attempts
    pub fn error_rate(&self) -> f64 {
        let attempts = self.pages_fetched + self.total_dropped();
        if attempts == 0 {
            0.0
        } else {
            (self.total_dropped() as f64 / attempts as f64) * 100.0
        }
    }

    /// Calculate crawl rate (pages per minute)
    pub fn crawl_rate(&self) -> f64 {
        let secs = self.duration.as_secs_f64();
        if secs == 0.0 {
            0.0
        } else {
            (self.pages_fetched as f64 / secs) * 60.0
        }
    }
}
