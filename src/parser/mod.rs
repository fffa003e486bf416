//! HTML parsing and metadata extraction
//!
//! This module turns a fetched HTML page into the links it points to and the
//! metadata written to the output: keywords, description and title.
//! html5ever recovers from any malformed markup, so parsing a page never fails;
//! missing fields come back as empty strings.

use scraper::{Html, Selector};
use std::collections::HashSet;

use crate::crawler::url::CanonicalUrl;
use crate::utils::error::ParseError;
use crate::utils::normalize_whitespace;

/// Links and metadata extracted from one HTML page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageSummary {
    /// Absolute, canonical http(s) links
    pub links: HashSet<CanonicalUrl>,

    /// `keywords` meta content
    pub keywords: String,

    /// `description` meta content
    pub description: String,

    /// `<title>` text
    pub title: String,
}

/// Meta names tried in order for each field
const KEYWORD_NAMES: &[&str] = &["keywords", "og:keywords"];
const DESCRIPTION_NAMES: &[&str] = &["description", "og:description"];

/// HTML page parser with pre-compiled selectors
pub struct PageParser {
    anchor: Selector,
    title: Selector,
    meta: Selector,
}

fn compile(selector: &str) -> Result<Selector, ParseError> {
    Selector::parse(selector)
        .map_err(|e| ParseError::InvalidSelector(format!("{selector}: {e:?}")))
}

impl PageParser {
    /// Compile the selectors used for extraction
    ///
    /// # Errors
    ///
    /// Returns `ParseError::InvalidSelector` if a selector fails to compile
    pub fn new() -> Result<Self, ParseError> {
        Ok(Self {
            anchor: compile("a[href]")?,
            title: compile("title")?,
            meta: compile("meta[content]")?,
        })
    }

    /// Parse `html` fetched from `base`
    pub fn parse(&self, html: &str, base: &CanonicalUrl) -> PageSummary {
        let document = Html::parse_document(html);

        PageSummary {
            links: self.extract_links(&document, base),
            keywords: self.meta_content(&document, KEYWORD_NAMES),
            description: self.meta_content(&document, DESCRIPTION_NAMES),
            title: self.extract_title(&document),
        }
    }

    /// Every `a[href]` resolved against `base`; non-http(s) targets are dropped
    fn extract_links(&self, document: &Html, base: &CanonicalUrl) -> HashSet<CanonicalUrl> {
        document
            .select(&self.anchor)
            .filter_map(|element| element.value().attr("href"))
            .filter_map(|href| CanonicalUrl::join(base, href).ok())
            .collect()
    }

    /// First non-empty `content` of a meta tag whose `name` or `property` matches
    fn meta_content(&self, document: &Html, names: &[&str]) -> String {
        for name in names {
            let found = document
                .select(&self.meta)
                .filter(|element| {
                    let value = element.value();
                    [value.attr("name"), value.attr("property")]
                        .into_iter()
                        .flatten()
                        .any(|attr| attr.trim().eq_ignore_ascii_case(name))
                })
                .filter_map(|element| element.value().attr("content"))
                .map(str::trim)
                .find(|content| !content.is_empty());

            if let Some(content) = found {
                return content.to_string();
            }
        }

        String::new()
    }

    fn extract_title(&self, document: &Html) -> String {
        document
            .select(&self.title)
            .next()
            .map(|element| normalize_whitespace(&element.text().collect::<String>()))
            .unwrap_or_default()
    }
}

/// Whether a `Content-Type` value denotes an HTML document
pub fn is_html(content_type: &str) -> bool {
    let media_type = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    media_type == "text/html" || media_type == "application/xhtml+xml"
}
