use url::Url;

/// Extracts the lowercase `host[:port]` of a URL
///
/// This is the key used for per-host rate limiting and for same-origin
/// checks during category discovery. The port is kept so that two services
/// on one machine are paced independently.
///
/// # Arguments
///
/// * `url` - The URL to extract the host from
///
/// # Returns
///
/// * `Some(String)` - The lowercase host, with `:port` when one is explicit
/// * `None` - If the URL has no host
///
/// # Examples
///
/// ```
/// use url::Url;
/// use seed_collector::url::extract_host;
///
/// let url = Url::parse("https://SHOP.example.com/list").unwrap();
/// assert_eq!(extract_host(&url), Some("shop.example.com".to_string()));
///
/// let url = Url::parse("http://127.0.0.1:8080/list").unwrap();
/// assert_eq!(extract_host(&url), Some("127.0.0.1:8080".to_string()));
/// ```
pub fn extract_host(url: &Url) -> Option<String> {
    let host = url.host_str()?.to_lowercase();
    Some(match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host,
    })
}

/// Same as [`extract_host`] for a URL string; unparseable input yields `None`
pub fn host_of(url: &str) -> Option<String> {
    Url::parse(url).ok().as_ref().and_then(extract_host)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_simple_host() {
        let url = Url::parse("https://example.com/").unwrap();
        assert_eq!(extract_host(&url), Some("example.com".to_string()));
    }

    #[test]
    fn test_extract_subdomain() {
        let url = Url::parse("https://m.shop.example.com/product/list.html").unwrap();
        assert_eq!(extract_host(&url), Some("m.shop.example.com".to_string()));
    }

    #[test]
    fn test_extract_with_port() {
        let url = Url::parse("https://example.com:8443/").unwrap();
        assert_eq!(extract_host(&url), Some("example.com:8443".to_string()));
    }

    #[test]
    fn test_default_port_is_dropped() {
        let url = Url::parse("https://example.com:443/").unwrap();
        assert_eq!(extract_host(&url), Some("example.com".to_string()));
    }

    #[test]
    fn test_extract_mixed_case() {
        let url = Url::parse("https://Example.COM/").unwrap();
        assert_eq!(extract_host(&url), Some("example.com".to_string()));
    }

    #[test]
    fn test_host_of_string() {
        assert_eq!(host_of("https://a.example.com/x?y=1"), Some("a.example.com".to_string()));
        assert_eq!(host_of("not a url"), None);
        assert_eq!(host_of("mailto:a@example.com"), None);
    }
}
