//! Error types for the pathcrawl crawler
//!
//! This module defines custom error types used throughout the application.

use thiserror::Error;

/// Errors that can occur while a URL passes through the politeness governor
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// robots.txt denies the URL for our user agent
    #[error("Disallowed by robots.txt: {0}")]
    RobotsDisallowed(String),

    /// Per-host byte quota tripped
    #[error("Byte quota exceeded for {host}: {fetched} > {quota} bytes")]
    QuotaExceeded {
        host: String,
        fetched: u64,
        quota: u64,
    },

    /// Connect or read timeout
    #[error("Request timeout")]
    Timeout,

    /// Non-2xx response status
    #[error("HTTP status error: {0}")]
    HttpStatus(u16),

    /// DNS, connect or other transport-level failure
    #[error("Network error: {0}")]
    Network(String),

    /// URL that cannot be crawled (unparsable, no host, unsupported scheme)
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

/// Errors that can occur during HTML parsing
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Selector could not be compiled
    #[error("Invalid selector: {0}")]
    InvalidSelector(String),
}

/// Frontier errors
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrontierError {
    /// No pending URLs are left
    #[error("Frontier is empty")]
    Empty,
}

/// Fatal configuration errors, raised before the crawl loop starts
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Strategy name is not one of the supported traversal strategies
    #[error("Unknown strategy: {0}")]
    UnknownStrategy(String),

    /// Seed list is empty after filtering
    #[error("No seeds")]
    NoSeeds,

    /// Any other invalid setting
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
