//! robots.txt rules evaluated with the Google robots matcher

use robotstxt::DefaultMatcher;

/// Parsed robots exclusion rules for one host
#[derive(Debug, Clone, Default)]
pub struct RobotsRules {
    /// Raw robots.txt body; `None` means every path is allowed
    body: Option<String>,
}

impl RobotsRules {
    /// Rules from a fetched robots.txt body
    pub fn from_body(body: impl Into<String>) -> Self {
        Self {
            body: Some(body.into()),
        }
    }

    /// Fail-open rules used when robots.txt cannot be fetched
    pub fn allow_all() -> Self {
        Self { body: None }
    }

    pub fn is_allow_all(&self) -> bool {
        self.body.is_none()
    }

    /// Check whether `user_agent` may fetch `url`
    ///
    /// `user_agent` may be a full identity string; only its product token
    /// takes part in matching.
    pub fn can_fetch(&self, user_agent: &str, url: &str) -> bool {
        match &self.body {
            None => true,
            Some(body) => DefaultMatcher::default().one_agent_allowed_by_robots(
                body,
                product_token(user_agent),
                url,
            ),
        }
    }
}

/// Product token of an identity string (`name/1.0 (+info)` -> `name`)
pub fn product_token(user_agent: &str) -> &str {
    let token = user_agent
        .split(|c: char| c == '/' || c.is_whitespace())
        .next()
        .unwrap_or_default();

    if token.is_empty() {
        user_agent
    } else {
        token
    }
}
