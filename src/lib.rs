//! pathcrawl - polite web crawler with pluggable frontier strategies
//!
//! A single-host crawler whose frontier picks the next URL with one of six
//! physics-inspired traversal strategies, behind a per-host politeness governor
//! (robots.txt, throttling, byte quotas).
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - [`config`] - Configuration management and settings
//! - [`crawler`] - Crawl orchestration, politeness governor, transport and URL identity
//! - [`frontier`] - Pending queue and traversal strategies
//! - [`parser`] - HTML link and metadata extraction
//! - [`models`] - Output records and crawl statistics
//! - [`storage`] - Output sinks (CSV)
//! - [`utils`] - Common utilities and helpers
//!
//! # Example
//!
//! ```no_run
//! use pathcrawl::config::Config;
//! use pathcrawl::crawler::url::load_seeds;
//! use pathcrawl::crawler::Crawler;
//! use pathcrawl::storage::CsvWriter;
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!     let crawler = Crawler::new(config)?;
//!     let seeds = load_seeds("https://example.com/\n")?;
//!     let mut sink = CsvWriter::create(Path::new("crawl_output.csv"))?;
//!     crawler.run(seeds, &mut sink).await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod crawler;
pub mod error;
pub mod frontier;
pub mod models;
pub mod parser;
pub mod storage;
pub mod utils;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::crawler::url::{CanonicalUrl, HostKey};
    pub use crate::crawler::{CrawlReport, Crawler, ShutdownHandle};
    pub use crate::error::{CrawlErrorTrait, Error, ErrorCategory, Result};
    pub use crate::frontier::{Frontier, Strategy};
    pub use crate::models::{CrawlStats, OutputRecord};
    pub use crate::storage::{CsvWriter, RecordSink};
}

// Direct re-exports for convenience
pub use frontier::Strategy;
pub use models::{CrawlStats, OutputRecord};
