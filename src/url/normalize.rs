use crate::UrlError;
use url::{Position, Url};

/// Prefix of marketing query parameters removed by the generic normalizer
const UTM_PREFIX: &str = "utm_";

/// Normalizes a product URL whose platform is unknown
///
/// # Normalization Steps
///
/// 1. Remove the fragment
/// 2. Remove every query parameter whose key starts with `utm_` (any case)
/// 3. Sort remaining query pairs by key, then value
/// 4. Drop the query string entirely when nothing is left
///
/// Strings that do not parse as absolute URLs are returned with only the
/// fragment removed.
///
/// # Examples
///
/// ```
/// use seed_collector::url::normalize_unknown_url;
///
/// let url = normalize_unknown_url("https://shop.example.com/product/alpha?utm_source=ad&b=2&a=1#section");
/// assert_eq!(url, "https://shop.example.com/product/alpha?a=1&b=2");
/// ```
pub fn normalize_unknown_url(url_str: &str) -> String {
    let mut url = match Url::parse(url_str) {
        Ok(url) => url,
        Err(_) => return strip_fragment(url_str).to_string(),
    };

    url.set_fragment(None);

    if url.query().is_some() {
        let mut params: Vec<(String, String)> = url
            .query_pairs()
            .filter(|(key, _)| !is_utm_param(key))
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        params.sort();

        if params.is_empty() {
            url.set_query(None);
        } else {
            url.query_pairs_mut().clear().extend_pairs(&params);
        }
    }

    url.into()
}

/// Builds the URL of one list page by setting the page parameter
///
/// Any existing occurrence of `page_param` is replaced; other query pairs
/// keep their order and the fragment is removed.
///
/// # Examples
///
/// ```
/// use seed_collector::url::build_page_url;
///
/// let url = build_page_url("https://shop.example.com/list?cate_no=10&page=2", "page", 5).unwrap();
/// assert_eq!(url, "https://shop.example.com/list?cate_no=10&page=5");
/// ```
pub fn build_page_url(url_str: &str, page_param: &str, page_number: u32) -> Result<String, UrlError> {
    let mut url = Url::parse(url_str).map_err(|e| UrlError::Parse(e.to_string()))?;

    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| key.as_ref() != page_param)
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    url.set_fragment(None);
    url.query_pairs_mut()
        .clear()
        .extend_pairs(&kept)
        .append_pair(page_param, &page_number.to_string());

    Ok(url.into())
}

/// Returns the `scheme://host[:port]` origin a product URL belongs to
///
/// # Examples
///
/// ```
/// use seed_collector::url::shop_base_url;
///
/// assert_eq!(shop_base_url("https://shop.example.com/products/tee?x=1"), "https://shop.example.com");
/// ```
pub fn shop_base_url(url_str: &str) -> String {
    Url::parse(url_str)
        .map(|url| url[..Position::BeforePath].to_string())
        .unwrap_or_default()
}

/// Checks if a query parameter is a utm tracking parameter
fn is_utm_param(key: &str) -> bool {
    key.get(..UTM_PREFIX.len())
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case(UTM_PREFIX))
}

fn strip_fragment(url_str: &str) -> &str {
    url_str.split('#').next().unwrap_or(url_str)
}
