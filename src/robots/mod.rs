//! Robots.txt handling module
//!
//! A category target is checked once against its site's robots.txt before
//! any list page is fetched. A missing or unreachable robots.txt never
//! blocks crawling.

mod parser;

pub use parser::{product_token, ParsedRobots};

use crate::crawler::Fetcher;
use url::{Position, Url};

/// Outcome of a robots.txt check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RobotsVerdict {
    /// Whether the target URL may be crawled
    pub allowed: bool,

    /// Non-fatal problem encountered while obtaining robots.txt
    pub advisory: Option<String>,
}

impl RobotsVerdict {
    fn allow_with(advisory: String) -> Self {
        Self {
            allowed: true,
            advisory: Some(advisory),
        }
    }
}

/// Returns the robots.txt URL for the origin of `url`
///
/// # Example
///
/// ```
/// use seed_collector::robots::robots_url;
///
/// assert_eq!(
///     robots_url("https://shop.example.com/product/list.html?cate_no=1").as_deref(),
///     Some("https://shop.example.com/robots.txt")
/// );
/// ```
pub fn robots_url(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    parsed.host_str()?;
    Some(format!("{}/robots.txt", &parsed[..Position::BeforePath]))
}

/// Checks whether `url` may be crawled by `user_agent`
///
/// Fetches `{scheme}://{host}/robots.txt` through the fetcher on every call.
///
/// # Returns
///
/// | robots.txt fetch | Verdict |
/// |------------------|---------|
/// | Transport failure | allowed, with the error as advisory |
/// | HTTP status >= 400 | allowed, with the status as advisory |
/// | Success | the directive's verdict for `url` |
pub async fn check_robots(fetcher: &Fetcher, url: &str, user_agent: &str) -> RobotsVerdict {
    let Some(robots_url) = robots_url(url) else {
        return RobotsVerdict::allow_with(format!("Cannot derive robots.txt location from {}", url));
    };

    let response = match fetcher.fetch(&robots_url).await {
        Ok(response) => response,
        Err(e) => return RobotsVerdict::allow_with(e.to_string()),
    };

    if response.status_code >= 400 {
        return RobotsVerdict::allow_with(format!(
            "{} returned HTTP {}",
            robots_url, response.status_code
        ));
    }

    let robots = ParsedRobots::from_content(&response.body);
    RobotsVerdict {
        allowed: robots.is_allowed(url, user_agent),
        advisory: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CollectConfig;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fetcher() -> Fetcher {
        let config = CollectConfig {
            rate_limit_rps: 0.0,
            retry_count: 0,
            ..CollectConfig::default()
        };
        Fetcher::new(&config).unwrap()
    }

    #[test]
    fn test_robots_url_keeps_port() {
        assert_eq!(
            robots_url("http://127.0.0.1:8080/list?page=1").as_deref(),
            Some("http://127.0.0.1:8080/robots.txt")
        );
        assert_eq!(robots_url("not a url"), None);
    }

    #[tokio::test]
    async fn test_disallow_verdict() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/robots.txt"))
            .respond_with(ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /private"))
            .mount(&server)
            .await;

        let fetcher = fetcher();
        let blocked = check_robots(&fetcher, &format!("{}/private/list", server.uri()), "seed-collector/0.1").await;
        assert!(!blocked.allowed);
        assert_eq!(blocked.advisory, None);

        let open = check_robots(&fetcher, &format!("{}/list", server.uri()), "seed-collector/0.1").await;
        assert!(open.allowed);
    }

    #[tokio::test]
    async fn test_missing_robots_allows_with_advisory() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/robots.txt"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let verdict = check_robots(&fetcher(), &format!("{}/list", server.uri()), "seed-collector/0.1").await;
        assert!(verdict.allowed);
        assert!(verdict.advisory.unwrap().contains("404"));
    }

    #[tokio::test]
    async fn test_unreachable_robots_allows_with_advisory() {
        let verdict = check_robots(&fetcher(), "http://127.0.0.1:9/list", "seed-collector/0.1").await;
        assert!(verdict.allowed);
        assert!(verdict.advisory.is_some());
    }
}
