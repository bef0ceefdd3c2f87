//! Robots.txt parser implementation
//!
//! This module evaluates robots.txt content using the robotstxt crate.

use robotstxt::DefaultMatcher;

/// Parsed robots.txt data
///
/// This is a thin wrapper around the robotstxt crate's matcher, which parses
/// the content on every check. Each category target is checked once, so the
/// content is never re-evaluated in a hot path.
#[derive(Debug, Clone)]
pub struct ParsedRobots {
    /// Raw robots.txt content
    content: String,
}

impl ParsedRobots {
    /// Creates a new ParsedRobots from raw robots.txt content
    pub fn from_content(content: &str) -> Self {
        Self {
            content: content.to_string(),
        }
    }

    /// Checks if a URL is allowed for the given user agent
    ///
    /// The user agent may be a full header value such as
    /// `seed-collector/0.1 (+https://example.com)`; only its product token is
    /// matched against `User-agent` lines.
    ///
    /// # Arguments
    ///
    /// * `url` - The absolute URL (or path) to check
    /// * `user_agent` - The user agent string
    ///
    /// # Returns
    ///
    /// * `true` - If the URL is allowed
    /// * `false` - If the URL is disallowed
    pub fn is_allowed(&self, url: &str, user_agent: &str) -> bool {
        if self.content.trim().is_empty() {
            return true;
        }

        let mut matcher = DefaultMatcher::default();
        matcher.one_agent_allowed_by_robots(&self.content, product_token(user_agent), url)
    }
}

/// Returns the product token of a user agent (`name` in `name/1.0 (...)`)
pub fn product_token(user_agent: &str) -> &str {
    let token = user_agent
        .split(|c: char| c == '/' || c.is_whitespace())
        .next()
        .unwrap_or("");
    if token.is_empty() {
        "*"
    } else {
        token
    }
}
