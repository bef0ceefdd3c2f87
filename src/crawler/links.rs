//! Product link and next-page link detection on list pages

use crate::crawler::analyzer::{class_attr, element_text, resolve_href, LinkCandidate, ANCHOR_SELECTOR, ALL_ELEMENTS_SELECTOR};
use crate::url::{Platform, PlatformHint};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use url::Url;

static CAFE24_DETAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)/product/detail\.html").expect("valid cafe24 pattern"));
static CAFE24_PRODUCT_NO_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(?:^|&)product_no=\d+").expect("valid product_no pattern"));
static SHOPIFY_PRODUCT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)/products/[^/?#]+").expect("valid shopify pattern"));
static CUSTOM_PHP_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)/detail\.php").expect("valid detail script pattern"));
static CUSTOM_PHP_ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(?:^|&)(pno|goodsno|product_no)=[^&]+").expect("valid id key pattern"));
static GENERIC_PRODUCT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)/product/([^/?#]+)").expect("valid product slug pattern"));
static NAVIGATION_WORD_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?:^|[-_.])(category|categories|search|board|event|editorial|collection|collections|brand|notice|policy|terms|about|member|account|login|register|join)(?:$|[-_.])",
    )
    .expect("valid navigation word pattern")
});

static CAFE24_LIST_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(".xans-product-listnormal, .xans-product-normalpackage, .xans-product-listcategory")
        .expect("valid cafe24 list selector")
});

/// Paths under `/product/` that are listings, not products
const LISTING_PATHS: [&str; 8] = [
    "/product/list",
    "/product/search",
    "/product/category",
    "/product/categories",
    "/product/collection",
    "/product/collections",
    "/product/board",
    "/product/brand",
];

const IMAGE_SUFFIXES: [&str; 5] = [".jpg", ".jpeg", ".png", ".gif", ".webp"];

/// Class fragments of carousels and ranking widgets whose links are not
/// part of the category listing
const EXCLUDED_LIST_CLASSES: [&str; 3] = ["menu-ranking", "listmain", "swiper"];

const NEXT_WORDS: [&str; 2] = ["next", "다음"];
const NEXT_SYMBOLS: [&str; 4] = [">", ">>", "›", "»"];

/// Classifies an absolute URL as a product detail link
///
/// # Returns
///
/// * `Some(platform)` - A platform-specific product URL
/// * `Some(Platform::Unknown)` - A generic `/product/<slug>` detail URL
/// * `None` - Not a product detail URL
///
/// # Examples
///
/// ```
/// use seed_collector::crawler::classify_product_url;
/// use seed_collector::Platform;
/// use url::Url;
///
/// let url = Url::parse("https://shop.example.com/products/sample-tee").unwrap();
/// assert_eq!(classify_product_url(&url), Some(Platform::Shopify));
///
/// let url = Url::parse("https://shop.example.com/product/list.html?cate_no=1").unwrap();
/// assert_eq!(classify_product_url(&url), None);
/// ```
pub fn classify_product_url(url: &Url) -> Option<Platform> {
    let path = url.path();
    let query = url.query().unwrap_or("");

    if CAFE24_DETAIL_RE.is_match(path) && CAFE24_PRODUCT_NO_RE.is_match(query) {
        return Some(Platform::Cafe24);
    }
    if SHOPIFY_PRODUCT_RE.is_match(path) {
        return Some(Platform::Shopify);
    }
    if CUSTOM_PHP_RE.is_match(path) && CUSTOM_PHP_ID_RE.is_match(query) {
        return Some(Platform::CustomPhp);
    }
    if is_generic_product_path(path) {
        return Some(Platform::Unknown);
    }
    None
}

fn is_generic_product_path(path: &str) -> bool {
    let Some(slug) = GENERIC_PRODUCT_RE.captures(path).and_then(|caps| caps.get(1)) else {
        return false;
    };

    let path_lower = path.to_lowercase();
    if LISTING_PATHS.iter().any(|p| path_lower.contains(p)) {
        return false;
    }

    let slug = slug.as_str().to_lowercase();
    if slug == "detail" || slug == "detail.html" {
        return false;
    }
    if IMAGE_SUFFIXES.iter().any(|ext| slug.ends_with(ext)) {
        return false;
    }
    !NAVIGATION_WORD_RE.is_match(&slug)
}

/// Collects product links from a list page
///
/// Under the `auto` and `cafe24` hints, anchors are taken from the Cafe24
/// product list containers when the page has any; otherwise the whole
/// document is scanned.
pub fn extract_product_links(document: &Html, base: &Url, hint: PlatformHint) -> Vec<LinkCandidate> {
    let roots = anchor_roots(document, hint);

    let mut seen = HashSet::new();
    let mut candidates = Vec::new();

    for root in roots {
        for anchor in root.select(&ANCHOR_SELECTOR) {
            let Some(absolute) = resolve_href(&anchor, base) else {
                continue;
            };
            let Some(matched) = classify_product_url(&absolute) else {
                continue;
            };
            if !hint.accepts(matched) {
                continue;
            }

            let url = String::from(absolute);
            if !seen.insert(url.clone()) {
                continue;
            }

            let text = element_text(&anchor);
            candidates.push(LinkCandidate {
                url,
                anchor_text: (!text.is_empty()).then_some(text),
            });
        }
    }

    candidates
}

fn anchor_roots(document: &Html, hint: PlatformHint) -> Vec<ElementRef<'_>> {
    if matches!(hint, PlatformHint::Auto | PlatformHint::Cafe24) {
        let roots = cafe24_list_roots(document);
        if !roots.is_empty() {
            return roots;
        }
    }
    vec![document.root_element()]
}

fn cafe24_list_roots(document: &Html) -> Vec<ElementRef<'_>> {
    let roots: Vec<_> = document.select(&CAFE24_LIST_SELECTOR).collect();
    if !roots.is_empty() {
        return roots;
    }

    document
        .select(&ALL_ELEMENTS_SELECTOR)
        .filter(|el| el.value().classes().any(|class| class.contains("prdList")))
        .filter(|el| !in_excluded_widget(el))
        .collect()
}

/// True if the element or one of its ancestors belongs to a carousel or
/// ranking widget
fn in_excluded_widget(element: &ElementRef<'_>) -> bool {
    std::iter::once(*element)
        .chain(element.ancestors().filter_map(ElementRef::wrap))
        .any(|el| {
            let classes = class_attr(&el);
            EXCLUDED_LIST_CLASSES.iter().any(|hint| classes.contains(hint))
        })
}

/// Finds the link to the following list page
///
/// The first anchor that has `rel="next"`, mentions a next word in its text
/// or `aria-label`, or consists only of an arrow symbol is used.
pub fn extract_next_link(document: &Html, base: &Url) -> Option<String> {
    for anchor in document.select(&ANCHOR_SELECTOR) {
        let Some(absolute) = resolve_href(&anchor, base) else {
            continue;
        };

        let rel = anchor.value().attr("rel").unwrap_or("").to_lowercase();
        if rel.split_whitespace().any(|value| value == "next") {
            return Some(absolute.into());
        }

        let text = element_text(&anchor).to_lowercase();
        let aria = anchor.value().attr("aria-label").unwrap_or("").to_lowercase();
        let combined = format!("{} {}", text, aria);
        let combined = combined.trim();

        if NEXT_WORDS.iter().any(|word| combined.contains(word)) || NEXT_SYMBOLS.contains(&combined) {
            return Some(absolute.into());
        }
    }

    None
}
