//! Canonical URL identity and host keys
//!
//! Every frontier, visited-set and cluster operation compares URLs through
//! [`CanonicalUrl`], so two spellings of the same page collapse to one entry.

use std::fmt;
use url::Url;

use crate::utils::error::{ConfigError, FetchError};

/// Lower-cased network authority (`host[:port]`) of a canonical URL
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HostKey(String);

impl HostKey {
    fn from_url(url: &Url) -> Option<Self> {
        let host = url.host_str()?.to_ascii_lowercase();
        Some(match url.port() {
            Some(port) => Self(format!("{host}:{port}")),
            None => Self(host),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HostKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// URL normalized by dropping the fragment and lower-casing scheme and host
///
/// Only `http` and `https` URLs with a host are crawlable. Normalization is
/// idempotent: parsing the string form of a `CanonicalUrl` yields an equal value.
///
/// # Examples
///
/// ```
/// use pathcrawl::crawler::url::CanonicalUrl;
///
/// let a = CanonicalUrl::parse("HTTP://Example.com/x#frag").unwrap();
/// let b = CanonicalUrl::parse("http://example.com/x").unwrap();
/// assert_eq!(a, b);
/// assert_eq!(a.host().as_str(), "example.com");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CanonicalUrl {
    url: Url,
    host: HostKey,
}

impl CanonicalUrl {
    /// Parse and canonicalize an absolute URL
    ///
    /// # Errors
    ///
    /// Returns `FetchError::InvalidUrl` for unparsable input, hostless URLs and
    /// schemes other than `http`/`https`.
    pub fn parse(input: &str) -> Result<Self, FetchError> {
        let url = Url::parse(input.trim())
            .map_err(|e| FetchError::InvalidUrl(format!("{input}: {e}")))?;
        Self::from_url(url)
    }

    /// Resolve `href` against `base` and canonicalize the result
    pub fn join(base: &CanonicalUrl, href: &str) -> Result<Self, FetchError> {
        let url = base
            .url
            .join(href.trim())
            .map_err(|e| FetchError::InvalidUrl(format!("{href}: {e}")))?;
        Self::from_url(url)
    }

    fn from_url(mut url: Url) -> Result<Self, FetchError> {
        if !matches!(url.scheme(), "http" | "https") {
            return Err(FetchError::InvalidUrl(format!(
                "unsupported scheme: {}",
                url.scheme()
            )));
        }
        url.set_fragment(None);

        let host = HostKey::from_url(&url)
            .ok_or_else(|| FetchError::InvalidUrl(format!("no host: {url}")))?;

        Ok(Self { url, host })
    }

    pub fn as_str(&self) -> &str {
        self.url.as_str()
    }

    pub fn host(&self) -> &HostKey {
        &self.host
    }

    pub fn scheme(&self) -> &str {
        self.url.scheme()
    }

    /// Location of the robots exclusion file for this URL's host
    pub fn robots_url(&self) -> String {
        format!("{}://{}/robots.txt", self.url.scheme(), self.host)
    }
}

impl fmt::Display for CanonicalUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for CanonicalUrl {
    type Err = FetchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Read a seed list: one URL per line, empty lines ignored
///
/// Lines that are not crawlable URLs are skipped with a warning.
///
/// # Errors
///
/// Returns `ConfigError::NoSeeds` when no usable seed remains.
pub fn load_seeds(text: &str) -> Result<Vec<CanonicalUrl>, ConfigError> {
    let mut seeds = Vec::new();

    for (lineno, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match CanonicalUrl::parse(line) {
            Ok(seed) => seeds.push(seed),
            Err(e) => {
                tracing::warn!(line = lineno + 1, error = %e, "Skipping seed");
            }
        }
    }

    if seeds.is_empty() {
        return Err(ConfigError::NoSeeds);
    }

    Ok(seeds)
}
