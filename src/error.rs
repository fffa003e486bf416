//! Unified error handling for the pathcrawl crate
//!
//! This module provides a unified error type that consolidates all domain-specific
//! errors into a single `Error` enum, while maintaining the ability to use
//! domain-specific errors when needed.
//!
//! # Architecture
//!
//! - [`CrawlErrorTrait`] - Common interface implemented by all error types
//! - [`ErrorCategory`] - Classification of errors for handling strategies
//! - [`Error`] - Unified error enum wrapping all domain-specific errors
//!
//! # Usage
//!
//! ```rust,ignore
//! use pathcrawl::error::{CrawlErrorTrait, Error, ErrorCategory};
//!
//! fn handle_error(err: Error) {
//!     match err.category() {
//!         ErrorCategory::Politeness => println!("Skipped: {err}"),
//!         category => eprintln!("{} error: {err}", category.as_str()),
//!     }
//! }
//! ```

use std::io;
use thiserror::Error;

pub use crate::utils::error::{ConfigError, FetchError, FrontierError, ParseError};

/// Common trait for all pathcrawl error types
pub trait CrawlErrorTrait: std::error::Error {
    /// Get the error category for handling strategies
    fn category(&self) -> ErrorCategory;
}

/// Classification of errors for handling strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// robots.txt denial or byte quota
    Politeness,
    /// Network-related errors (HTTP status, timeout, transport)
    Network,
    /// Parsing and data extraction errors
    Parsing,
    /// Frontier exhaustion
    Frontier,
    /// Configuration and validation errors
    Config,
    /// Output and I/O errors
    Storage,
    /// Other/unknown errors
    Other,
}

impl ErrorCategory {
    /// Short label used in log fields
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Politeness => "politeness",
            Self::Network => "network",
            Self::Parsing => "parsing",
            Self::Frontier => "frontier",
            Self::Config => "config",
            Self::Storage => "storage",
            Self::Other => "other",
        }
    }
}

impl CrawlErrorTrait for FetchError {
    fn category(&self) -> ErrorCategory {
        match self {
            Self::RobotsDisallowed(_) | Self::QuotaExceeded { .. } => ErrorCategory::Politeness,
            Self::Timeout | Self::HttpStatus(_) | Self::Network(_) => ErrorCategory::Network,
            Self::InvalidUrl(_) => ErrorCategory::Parsing,
        }
    }
}

impl CrawlErrorTrait for ConfigError {
    fn category(&self) -> ErrorCategory {
        ErrorCategory::Config
    }
}

/// Unified error type for the pathcrawl crate
#[derive(Error, Debug)]
pub enum Error {
    /// Fetch-path errors (governor and transport)
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// Parse-specific errors
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    /// Frontier errors
    #[error("Frontier error: {0}")]
    Frontier(#[from] FrontierError),

    /// Configuration errors
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// HTTP client construction errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Generic error with context
    #[error("{context}")]
    Other { context: String },
}

impl CrawlErrorTrait for Error {
    fn category(&self) -> ErrorCategory {
        match self {
            Self::Fetch(e) => e.category(),
            Self::Parse(_) => ErrorCategory::Parsing,
            Self::Frontier(_) => ErrorCategory::Frontier,
            Self::Config(_) => ErrorCategory::Config,
            Self::Io(_) => ErrorCategory::Storage,
            Self::Http(_) => ErrorCategory::Network,
            Self::Other { .. } => ErrorCategory::Other,
        }
    }
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(ConfigError::Invalid(msg.into()))
    }
}

// Conversion from anyhow::Error
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other {
            context: format!("{err:#}"),
        }
    }
}

/// Result type alias using the unified Error type
pub type Result<T> = std::result::Result<T, Error>;
