//! Breadcrumb and sub-category detection on category pages

use crate::crawler::analyzer::{class_attr, element_text, resolve_href, CategoryLink, ALL_ELEMENTS_SELECTOR, ANCHOR_SELECTOR};
use crate::crawler::links::classify_product_url;
use crate::url::extract_host;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use url::Url;

static LABEL_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a, span, li").expect("valid label selector"));

const BREADCRUMB_HINTS: [&str; 4] = ["breadcrumb", "bread", "path", "location"];
const CATEGORY_CONTAINER_HINTS: [&str; 8] = ["category", "cate", "sub", "tabs", "tab", "menu", "lnb", "gnb"];
const ACTIVE_CLASSES: [&str; 4] = ["active", "on", "selected", "current"];
const ARIA_CURRENT_VALUES: [&str; 2] = ["page", "true"];
const ARIA_SELECTED_VALUES: [&str; 2] = ["true", "1"];
const CATEGORY_QUERY_KEYS: [&str; 8] = ["cate_no", "category", "category_id", "cat", "c", "scate", "pcate", "mcat"];
const CATEGORY_PATH_HINTS: [&str; 7] = [
    "/product/list",
    "/category",
    "/categories",
    "/collections",
    "/collection",
    "/list",
    "/shop",
];
const ROOT_LABELS: [&str; 2] = ["home", "main"];

/// Extracts the breadcrumb trail of a category page
///
/// Among all breadcrumb-like containers, the one with the most labels wins.
/// Labels are cleaned, `home`/`main` entries dropped, and duplicates removed.
pub fn extract_breadcrumbs(document: &Html) -> Vec<String> {
    let aria_containers = document.select(&ALL_ELEMENTS_SELECTOR).filter(|el| {
        el.value()
            .attr("aria-label")
            .is_some_and(|aria| aria.to_lowercase().contains("breadcrumb"))
    });
    let containers = aria_containers.chain(find_by_hint(document, &BREADCRUMB_HINTS));

    let mut best: Vec<String> = Vec::new();
    for container in containers {
        let labels: Vec<String> = container
            .select(&LABEL_SELECTOR)
            .map(|el| element_text(&el))
            .filter(|text| !text.is_empty())
            .collect();
        if labels.len() > best.len() {
            best = labels;
        }
    }

    let mut seen = HashSet::new();
    best.iter()
        .map(|label| clean_label(label))
        .filter(|label| !label.is_empty() && !ROOT_LABELS.contains(&label.to_lowercase().as_str()))
        .filter(|label| seen.insert(label.clone()))
        .collect()
}

/// Finds same-site category links inside navigation containers
///
/// Product links, other hosts and unlabelled anchors are skipped. Links are
/// returned without fragment, unique by URL, in document order.
pub fn extract_subcategory_links(document: &Html, base: &Url) -> Vec<CategoryLink> {
    let mut seen = HashSet::new();

    category_anchors(document, base)
        .filter_map(|(_, mut url, label)| {
            url.set_fragment(None);
            let url = String::from(url);
            seen.insert(url.clone()).then_some(CategoryLink { url, label })
        })
        .collect()
}

/// Returns the label of the sub-category link marked as current
///
/// An anchor is current when it carries `aria-current="page"`,
/// `aria-selected="true"`, or when it, its parent or its grandparent has an
/// `active`, `on`, `selected` or `current` class.
pub fn detect_active_label(document: &Html, base: &Url) -> Option<String> {
    category_anchors(document, base)
        .find(|(anchor, _, _)| is_active_anchor(anchor))
        .map(|(_, _, label)| label)
}

/// Category-shaped anchors of the navigation containers with their resolved
/// URL and label
fn category_anchors<'a>(
    document: &'a Html,
    base: &'a Url,
) -> impl Iterator<Item = (ElementRef<'a>, Url, String)> + 'a {
    let mut containers: Vec<ElementRef<'a>> = find_by_hint(document, &CATEGORY_CONTAINER_HINTS).collect();
    if containers.is_empty() {
        containers.push(document.root_element());
    }
    let base_host = extract_host(base);

    containers
        .into_iter()
        .flat_map(|container| container.select(&ANCHOR_SELECTOR))
        .filter_map(move |anchor| {
            let label = clean_label(&element_text(&anchor));
            if label.is_empty() {
                return None;
            }
            let url = resolve_href(&anchor, base)?;
            if extract_host(&url) != base_host {
                return None;
            }
            if classify_product_url(&url).is_some() || !looks_like_category_url(&url) {
                return None;
            }
            Some((anchor, url, label))
        })
}

fn looks_like_category_url(url: &Url) -> bool {
    if url
        .query_pairs()
        .any(|(key, value)| !value.is_empty() && CATEGORY_QUERY_KEYS.contains(&key.as_ref()))
    {
        return true;
    }
    let path = url.path().to_lowercase();
    CATEGORY_PATH_HINTS.iter().any(|hint| path.contains(hint))
}

/// Elements whose class or id contains one of the hints
fn find_by_hint<'a>(document: &'a Html, hints: &'a [&'a str]) -> impl Iterator<Item = ElementRef<'a>> + 'a {
    document.select(&ALL_ELEMENTS_SELECTOR).filter(move |el| {
        let classes = class_attr(el);
        let id = el.value().id().unwrap_or("").to_lowercase();
        hints.iter().any(|hint| classes.contains(hint) || id.contains(hint))
    })
}

fn is_active_anchor(anchor: &ElementRef<'_>) -> bool {
    let attr_in = |name: &str, values: &[&str]| {
        anchor
            .value()
            .attr(name)
            .is_some_and(|v| values.contains(&v.to_lowercase().as_str()))
    };
    if attr_in("aria-current", &ARIA_CURRENT_VALUES) || attr_in("aria-selected", &ARIA_SELECTED_VALUES) {
        return true;
    }

    std::iter::once(*anchor)
        .chain(anchor.ancestors().filter_map(ElementRef::wrap).take(2))
        .any(|el| has_active_class(&el))
}

fn has_active_class(element: &ElementRef<'_>) -> bool {
    element
        .value()
        .classes()
        .any(|class| ACTIVE_CLASSES.contains(&class.to_lowercase().as_str()))
}

/// Collapses whitespace and trims separator characters from both ends
fn clean_label(text: &str) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed
        .trim_matches(|c: char| matches!(c, '>' | '/' | '|') || c.is_whitespace())
        .to_string()
}
