//! Page analysis seam between fetched markup and the crawl state machine
//!
//! The [`Coordinator`](super::Coordinator) only sees the owned results
//! produced here. [`HtmlAnalyzer`] is the heuristic implementation used by
//! the binary; tests may substitute any other [`PageAnalyzer`].

use crate::crawler::{category, links};
use crate::url::PlatformHint;
use crate::SeedError;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use url::Url;

pub(crate) static ANCHOR_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a[href]").expect("valid anchor selector"));
pub(crate) static ALL_ELEMENTS_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("*").expect("valid universal selector"));

/// A raw product link found on a list page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkCandidate {
    /// Absolute URL
    pub url: String,

    /// Whitespace-collapsed anchor text, `None` when empty
    pub anchor_text: Option<String>,
}

/// Analysis of one list page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingPage {
    /// Product links, unique by exact URL, in document order
    pub candidates: Vec<LinkCandidate>,

    /// Absolute URL of the following list page, if the page links one
    pub next_link: Option<String>,
}

/// A same-site link to a category listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryLink {
    /// Absolute URL without fragment
    pub url: String,

    /// Cleaned anchor text
    pub label: String,
}

/// Analysis of a category page used during discovery
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryPage {
    /// Breadcrumb labels, outermost first
    pub breadcrumbs: Vec<String>,

    /// Sub-category links in document order
    pub subcategories: Vec<CategoryLink>,

    /// Label of the sub-category marked as current, if any
    pub active_label: Option<String>,
}

/// Extracts crawl-relevant structure from fetched markup
///
/// Implementations are synchronous and return owned data, so they can be
/// called from any task without holding a parsed document across `.await`.
pub trait PageAnalyzer: Send + Sync {
    /// Finds product links and the next-page link of a list page
    ///
    /// # Errors
    ///
    /// Returns `SeedError::HtmlParse` when the page cannot be analyzed,
    /// for example when `base_url` cannot be used to resolve links.
    fn analyze_listing(&self, html: &str, base_url: &str, hint: PlatformHint) -> Result<ListingPage, SeedError>;

    /// Finds breadcrumbs, sub-category links and the active sub-category
    fn analyze_category(&self, html: &str, base_url: &str) -> Result<CategoryPage, SeedError>;
}

/// Heuristic analyzer for server-rendered storefront markup
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlAnalyzer;

impl HtmlAnalyzer {
    pub fn new() -> Self {
        Self
    }
}

impl PageAnalyzer for HtmlAnalyzer {
    fn analyze_listing(&self, html: &str, base_url: &str, hint: PlatformHint) -> Result<ListingPage, SeedError> {
        let base = parse_base(base_url)?;
        let document = Html::parse_document(html);

        Ok(ListingPage {
            candidates: links::extract_product_links(&document, &base, hint),
            next_link: links::extract_next_link(&document, &base),
        })
    }

    fn analyze_category(&self, html: &str, base_url: &str) -> Result<CategoryPage, SeedError> {
        let base = parse_base(base_url)?;
        let document = Html::parse_document(html);

        Ok(CategoryPage {
            breadcrumbs: category::extract_breadcrumbs(&document),
            subcategories: category::extract_subcategory_links(&document, &base),
            active_label: category::detect_active_label(&document, &base),
        })
    }
}

fn parse_base(base_url: &str) -> Result<Url, SeedError> {
    Url::parse(base_url).map_err(|e| SeedError::HtmlParse {
        url: base_url.to_string(),
        message: format!("cannot resolve links against base URL: {}", e),
    })
}

/// Text of an element with each text node trimmed, joined by single spaces
pub(crate) fn element_text(element: &ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Fragment-only and non-navigational hrefs
pub(crate) fn is_skippable_href(href: &str) -> bool {
    let lower = href.to_lowercase();
    lower.starts_with('#')
        || lower.starts_with("javascript:")
        || lower.starts_with("mailto:")
        || lower.starts_with("tel:")
}

/// Resolves an anchor's href against the page URL
///
/// Empty and skippable hrefs yield `None`.
pub(crate) fn resolve_href(anchor: &ElementRef<'_>, base: &Url) -> Option<Url> {
    let href = anchor.value().attr("href")?.trim();
    if href.is_empty() || is_skippable_href(href) {
        return None;
    }
    base.join(href).ok()
}

/// Lowercased `class` attribute of an element
pub(crate) fn class_attr(element: &ElementRef<'_>) -> String {
    element.value().attr("class").unwrap_or("").to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listing_analysis() {
        let html = r#"
            <ul class="prdList">
                <li><a href="/product/detail.html?product_no=1&cate_no=4">  Linen
                    Shirt </a></li>
                <li><a href="/product/detail.html?product_no=2">Wool Coat</a></li>
            </ul>
            <a href="?page=2" rel="next">2</a>
        "#;
        let page = HtmlAnalyzer::new()
            .analyze_listing(html, "https://shop.example.com/product/list.html?cate_no=4", PlatformHint::Auto)
            .unwrap();

        assert_eq!(page.candidates.len(), 2);
        assert_eq!(
            page.candidates[0].url,
            "https://shop.example.com/product/detail.html?product_no=1&cate_no=4"
        );
        assert_eq!(page.candidates[0].anchor_text.as_deref(), Some("Linen Shirt"));
        assert_eq!(
            page.next_link.as_deref(),
            Some("https://shop.example.com/product/list.html?page=2")
        );
    }

    #[test]
    fn test_unusable_base_url_is_a_parse_failure() {
        let err = HtmlAnalyzer::new()
            .analyze_listing("<a href='/products/x'>x</a>", "not a url", PlatformHint::Auto)
            .unwrap_err();
        assert!(matches!(err, SeedError::HtmlParse { .. }));

        let err = HtmlAnalyzer::new().analyze_category("", "").unwrap_err();
        assert!(matches!(err, SeedError::HtmlParse { .. }));
    }

    #[test]
    fn test_malformed_markup_is_tolerated() {
        let page = HtmlAnalyzer::new()
            .analyze_listing("<div><a href='/products/hat'>Hat<div></span>", "https://a.example.com/", PlatformHint::Auto)
            .unwrap();
        assert_eq!(page.candidates.len(), 1);
        assert_eq!(page.candidates[0].url, "https://a.example.com/products/hat");
    }

    #[test]
    fn test_skippable_hrefs() {
        assert!(is_skippable_href("#top"));
        assert!(is_skippable_href("JavaScript:void(0)"));
        assert!(is_skippable_href("mailto:a@example.com"));
        assert!(is_skippable_href("tel:010"));
        assert!(!is_skippable_href("/product/list.html"));
    }
}
