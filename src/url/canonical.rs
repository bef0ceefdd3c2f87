//! Platform-aware product URL canonicalization
//!
//! The canonical URL produced here is the run-wide deduplication key, so
//! every function in this module is pure and idempotent on its own output.

use crate::url::normalize::normalize_unknown_url;
use crate::url::{Platform, PlatformHint};
use once_cell::sync::Lazy;
use regex::Regex;
use url::{Position, Url};

static CAFE24_DETAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)/product/detail\.html").expect("valid cafe24 pattern"));
static SHOPIFY_PRODUCT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)/products/([^/?#]+)").expect("valid shopify pattern"));
static CUSTOM_PHP_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)/detail\.php").expect("valid detail script pattern"));

/// Query keys carrying a custom PHP product id, in priority order
pub const CUSTOM_PHP_ID_KEYS: [&str; 3] = ["pno", "goodsno", "product_no"];

/// Outcome of canonicalizing one candidate URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalizationResult {
    /// Dedup key for the product
    pub canonical_url: String,

    /// Platform-specific product id, when the platform defines one
    pub external_product_id: Option<String>,

    /// Platform the URL was canonicalized under
    pub platform: Platform,
}

/// Canonicalizes a raw product URL under the given platform hint
///
/// | Hint | Behavior |
/// |------|----------|
/// | `Auto` | Detect the platform from the URL shape, generic normalizer if none matches |
/// | concrete platform | Try that platform, then auto-detection, then the generic normalizer |
/// | `Unknown` | Generic normalizer only |
///
/// # Examples
///
/// ```
/// use seed_collector::url::{canonicalize, Platform, PlatformHint};
///
/// let result = canonicalize(
///     "https://shop.example.com/product/detail.html?product_no=123&cate_no=9",
///     PlatformHint::Auto,
/// );
/// assert_eq!(result.canonical_url, "https://shop.example.com/product/detail.html?product_no=123");
/// assert_eq!(result.external_product_id.as_deref(), Some("123"));
/// assert_eq!(result.platform, Platform::Cafe24);
/// ```
pub fn canonicalize(url: &str, hint: PlatformHint) -> CanonicalizationResult {
    let parsed = Url::parse(url).ok();
    let attempt =
        |platform: Platform| parsed.as_ref().and_then(|u| canonicalize_as(u, platform));
    let detected = || parsed.as_ref().map_or(Platform::Unknown, detect_platform);

    let result = match hint {
        PlatformHint::Unknown => None,
        PlatformHint::Auto => attempt(detected()),
        PlatformHint::Cafe24 => attempt(Platform::Cafe24).or_else(|| attempt(detected())),
        PlatformHint::Shopify => attempt(Platform::Shopify).or_else(|| attempt(detected())),
        PlatformHint::CustomPhp => attempt(Platform::CustomPhp).or_else(|| attempt(detected())),
    };

    result.unwrap_or_else(|| CanonicalizationResult {
        canonical_url: normalize_unknown_url(url),
        external_product_id: None,
        platform: Platform::Unknown,
    })
}

/// Guesses the storefront platform from a URL's path and query shape
pub fn detect_platform(url: &Url) -> Platform {
    let path = url.path();

    if CAFE24_DETAIL_RE.is_match(path)
        && first_query_value(url, "product_no").is_some_and(|v| v.bytes().all(|b| b.is_ascii_digit()))
    {
        return Platform::Cafe24;
    }
    if SHOPIFY_PRODUCT_RE.is_match(path) {
        return Platform::Shopify;
    }
    if CUSTOM_PHP_RE.is_match(path)
        && CUSTOM_PHP_ID_KEYS
            .iter()
            .any(|key| first_query_value(url, key).is_some())
    {
        return Platform::CustomPhp;
    }

    Platform::Unknown
}

fn canonicalize_as(url: &Url, platform: Platform) -> Option<CanonicalizationResult> {
    url.host_str()?;

    match platform {
        Platform::Cafe24 => canonicalize_cafe24(url),
        Platform::Shopify => canonicalize_shopify(url),
        Platform::CustomPhp => canonicalize_custom_php(url),
        Platform::Unknown => None,
    }
}

/// `scheme://host/product/detail.html?product_no=<n>`
fn canonicalize_cafe24(url: &Url) -> Option<CanonicalizationResult> {
    if !CAFE24_DETAIL_RE.is_match(url.path()) {
        return None;
    }
    let product_no = first_query_value(url, "product_no")?;

    let mut canonical = url.clone();
    canonical.set_path("/product/detail.html");
    canonical.set_fragment(None);
    canonical.set_query(None);
    canonical.query_pairs_mut().append_pair("product_no", &product_no);

    Some(CanonicalizationResult {
        canonical_url: canonical.into(),
        external_product_id: Some(product_no),
        platform: Platform::Cafe24,
    })
}

/// `scheme://host/products/<handle>`
fn canonicalize_shopify(url: &Url) -> Option<CanonicalizationResult> {
    let handle = SHOPIFY_PRODUCT_RE
        .captures(url.path())
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())?;

    Some(CanonicalizationResult {
        canonical_url: format!("{}/products/{}", &url[..Position::BeforePath], handle),
        external_product_id: Some(handle),
        platform: Platform::Shopify,
    })
}

/// `scheme://host<path>?<key>=<value>` for the first id key present
fn canonicalize_custom_php(url: &Url) -> Option<CanonicalizationResult> {
    if !CUSTOM_PHP_RE.is_match(url.path()) {
        return None;
    }

    let (key, value) = CUSTOM_PHP_ID_KEYS
        .iter()
        .find_map(|key| first_query_value(url, key).map(|value| (*key, value)))?;

    let mut canonical = url.clone();
    canonical.set_fragment(None);
    canonical.set_query(None);
    canonical.query_pairs_mut().append_pair(key, &value);

    Some(CanonicalizationResult {
        canonical_url: canonical.into(),
        external_product_id: Some(value),
        platform: Platform::CustomPhp,
    })
}

/// First non-empty value of a query key
fn first_query_value(url: &Url, key: &str) -> Option<String> {
    url.query_pairs()
        .find(|(k, v)| k == key && !v.is_empty())
        .map(|(_, v)| v.into_owned())
}
