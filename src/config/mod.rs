//! Configuration management for pathcrawl
//!
//! This module handles loading and validating configuration from environment variables,
//! files, and command-line arguments.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::frontier::Strategy;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Crawl loop configuration
    pub crawler: CrawlerConfig,

    /// Per-host etiquette configuration
    pub politeness: PolitenessConfig,

    /// Seed and output file locations
    pub output: OutputConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Crawl loop configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Frontier traversal strategy
    pub strategy: Strategy,

    /// Page budget (successful fetches)
    pub max_pages: usize,

    /// Number of concurrent crawl workers
    pub workers: usize,

    /// Identity string sent as User-Agent and used for robots.txt
    pub user_agent: String,

    /// Seed for the frontier RNG; random when absent
    pub rng_seed: Option<u64>,
}

/// Per-host politeness configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PolitenessConfig {
    /// DNS + TCP handshake timeout in seconds
    pub connect_timeout_secs: f64,

    /// Socket read timeout in seconds
    pub read_timeout_secs: f64,

    /// Minimum gap between fetches to the same host in seconds
    pub throttle_interval_secs: f64,

    /// Bytes a single host may serve before its circuit breaker trips
    pub per_host_byte_quota: u64,
}

/// Seed and output file locations
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Seed list, one URL per line
    pub seeds_path: PathBuf,

    /// CSV output path
    pub csv_path: PathBuf,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (text, json)
    pub format: String,
}

/// Default identity string
pub fn default_user_agent() -> String {
    format!("pathcrawl/{} (polite crawler)", env!("CARGO_PKG_VERSION"))
}

/// Upper bound for any timeout or throttle setting (one day)
pub const MAX_INTERVAL_SECS: f64 = 86_400.0;

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            strategy: Strategy::Quantum,
            max_pages: 100,
            workers: 1,
            user_agent: default_user_agent(),
            rng_seed: None,
        }
    }
}

impl Default for PolitenessConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 2.0,
            read_timeout_secs: 3.0,
            throttle_interval_secs: 1.0,
            per_host_byte_quota: 1_000_000,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            seeds_path: PathBuf::from("seeds.txt"),
            csv_path: PathBuf::from("crawl_output.csv"),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: String::from("info"),
            format: String::from("text"),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            crawler: CrawlerConfig::default(),
            politeness: PolitenessConfig::default(),
            output: OutputConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse::<T>().ok())
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// Unset or unparsable numeric variables keep their defaults; an unknown
    /// strategy name is an error.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(name) = std::env::var("PATHCRAWL_STRATEGY") {
            config.crawler.strategy = name
                .parse()
                .with_context(|| format!("Invalid PATHCRAWL_STRATEGY: {name}"))?;
        }
        if let Some(max_pages) = env_parse("PATHCRAWL_MAX_PAGES") {
            config.crawler.max_pages = max_pages;
        }
        if let Some(workers) = env_parse("PATHCRAWL_WORKERS") {
            config.crawler.workers = workers;
        }
        if let Ok(user_agent) = std::env::var("PATHCRAWL_USER_AGENT") {
            config.crawler.user_agent = user_agent;
        }
        config.crawler.rng_seed = env_parse("PATHCRAWL_RNG_SEED");

        if let Some(secs) = env_parse("PATHCRAWL_CONNECT_TIMEOUT") {
            config.politeness.connect_timeout_secs = secs;
        }
        if let Some(secs) = env_parse("PATHCRAWL_READ_TIMEOUT") {
            config.politeness.read_timeout_secs = secs;
        }
        if let Some(secs) = env_parse("PATHCRAWL_THROTTLE") {
            config.politeness.throttle_interval_secs = secs;
        }
        if let Some(quota) = env_parse("PATHCRAWL_BYTE_QUOTA") {
            config.politeness.per_host_byte_quota = quota;
        }

        if let Ok(level) = std::env::var("PATHCRAWL_LOG_LEVEL") {
            config.logging.level = level;
        }
        if let Ok(format) = std::env::var("PATHCRAWL_LOG_FORMAT") {
            config.logging.format = format;
        }

        Ok(config)
    }

    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML config file: {}", path.display()))?;

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.crawler.max_pages == 0 {
            anyhow::bail!("max_pages must be greater than 0");
        }

        if self.crawler.workers == 0 {
            anyhow::bail!("workers must be greater than 0");
        }

        if self.crawler.user_agent.trim().is_empty() {
            anyhow::bail!("user_agent must not be empty");
        }

        self.politeness.validate()
    }
}

impl PolitenessConfig {
    /// Validate timeout and throttle values
    ///
    /// Timeouts must lie in `(0, MAX_INTERVAL_SECS]`; the throttle may also be zero.
    pub fn validate(&self) -> Result<()> {
        check_interval("connect_timeout_secs", self.connect_timeout_secs)?;
        check_interval("read_timeout_secs", self.read_timeout_secs)?;
        check_interval("throttle_interval_secs", self.throttle_interval_secs)?;

        if self.connect_timeout_secs == 0.0 {
            anyhow::bail!("connect_timeout_secs must be positive");
        }

        if self.read_timeout_secs == 0.0 {
            anyhow::bail!("read_timeout_secs must be positive");
        }

        Ok(())
    }

    // The Duration getters panic on values `validate` rejects.

    /// Get connect timeout as Duration
    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs_f64(self.connect_timeout_secs)
    }

    /// Get read timeout as Duration
    #[must_use]
    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs_f64(self.read_timeout_secs)
    }

    /// Get per-host throttle interval as Duration
    #[must_use]
    pub fn throttle_interval(&self) -> Duration {
        Duration::from_secs_f64(self.throttle_interval_secs)
    }
}

fn check_interval(name: &str, secs: f64) -> Result<()> {
    let interval = Duration::try_from_secs_f64(secs)
        .with_context(|| format!("{name} must be a non-negative number of seconds, got {secs}"))?;

    if interval.as_secs_f64() > MAX_INTERVAL_SECS {
        anyhow::bail!("{name} must be at most {MAX_INTERVAL_SECS} seconds, got {secs}");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.crawler.strategy, Strategy::Quantum);
        assert_eq!(config.crawler.max_pages, 100);
        assert_eq!(config.politeness.per_host_byte_quota, 1_000_000);
    }

    #[test]
    fn test_invalid_max_pages() {
        let mut config = Config::default();
        config.crawler.max_pages = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_workers() {
        let mut config = Config::default();
        config.crawler.workers = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_timeouts() {
        let mut config = Config::default();
        config.politeness.read_timeout_secs = 0.0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.politeness.throttle_interval_secs = -1.0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.politeness.throttle_interval_secs = 0.0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_out_of_range_intervals() {
        let cases: [fn(&mut PolitenessConfig); 5] = [
            |p| p.connect_timeout_secs = -1.0,
            |p| p.read_timeout_secs = f64::NAN,
            |p| p.connect_timeout_secs = f64::INFINITY,
            |p| p.throttle_interval_secs = 1e30,
            |p| p.read_timeout_secs = MAX_INTERVAL_SECS + 1.0,
        ];
        for set in cases {
            let mut config = PolitenessConfig::default();
            set(&mut config);
            assert!(config.validate().is_err(), "{config:?}");
        }

        let mut config = PolitenessConfig::default();
        config.throttle_interval_secs = MAX_INTERVAL_SECS;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_duration_conversion() {
        let config = PolitenessConfig::default();
        assert_eq!(config.throttle_interval(), Duration::from_secs(1));
        assert_eq!(config.connect_timeout(), Duration::from_secs(2));
        assert_eq!(config.read_timeout(), Duration::from_secs(3));
    }

    #[test]
    fn test_partial_toml() {
        let config: Config = toml::from_str(
            r#"
            [crawler]
            strategy = "levy"
            max_pages = 5

            [politeness]
            per_host_byte_quota = 100
            "#,
        )
        .unwrap();

        assert_eq!(config.crawler.strategy, Strategy::Flight);
        assert_eq!(config.crawler.max_pages, 5);
        assert_eq!(config.crawler.workers, 1);
        assert_eq!(config.politeness.per_host_byte_quota, 100);
        assert_eq!(config.politeness.throttle_interval_secs, 1.0);
    }

    #[test]
    fn test_unknown_strategy_in_toml() {
        let result: std::result::Result<Config, _> = toml::from_str(
            r#"
            [crawler]
            strategy = "teleport"
            "#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pathcrawl.toml");
        std::fs::write(&path, "[crawler]\nstrategy = \"field\"\nworkers = 4\n").unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.crawler.strategy, Strategy::Field);
        assert_eq!(config.crawler.workers, 4);
    }
}
