//! Record types written by a collect run

use crate::url::Platform;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Value of `discovery_method` for links found on category list pages
pub const DISCOVERY_METHOD_CATEGORY_LIST: &str = "category_list";

pub const DETAIL_URLS_FILE: &str = "detail_urls.jsonl";
pub const SEED_FAILURES_FILE: &str = "seed_failures.jsonl";
pub const SEED_MANIFEST_FILE: &str = "seed_manifest.json";

/// Classification of a terminal page or category problem
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FailureCategory {
    /// Transport failure after retries, or an HTTP error other than 403/429
    #[serde(rename = "FETCH_FAILED")]
    FetchFailed,

    /// HTTP 403 or 429
    #[serde(rename = "HTTP_BLOCKED_403_429")]
    HttpBlocked,

    /// The page could not be analyzed
    #[serde(rename = "PARSE_FAILED")]
    ParseFailed,

    /// A list page yielded no product links
    #[serde(rename = "PRODUCT_URLS_NOT_FOUND")]
    ProductUrlsNotFound,

    /// robots.txt disallows the category target
    #[serde(rename = "ROBOTS_DISALLOW")]
    RobotsDisallow,
}

impl FailureCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FetchFailed => "FETCH_FAILED",
            Self::HttpBlocked => "HTTP_BLOCKED_403_429",
            Self::ParseFailed => "PARSE_FAILED",
            Self::ProductUrlsNotFound => "PRODUCT_URLS_NOT_FOUND",
            Self::RobotsDisallow => "ROBOTS_DISALLOW",
        }
    }

    /// Maps an HTTP error status (>= 400) to its failure category
    pub fn for_status(status_code: u16) -> Self {
        match status_code {
            403 | 429 => Self::HttpBlocked,
            _ => Self::FetchFailed,
        }
    }
}

impl fmt::Display for FailureCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One persisted product detail URL
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetailRecord {
    pub seed_run_id: String,
    pub shop_base_url: String,
    /// Platform the URL was canonicalized under
    pub platform_hint: Platform,
    pub category_url: String,
    pub category_target_url: String,
    pub category_path: Vec<String>,
    pub category_leaf: Option<String>,
    pub list_page_url: String,
    pub discovery_method: String,
    pub discovered_at: DateTime<Utc>,
    /// Raw link as found on the list page
    pub detail_url: String,
    pub canonical_url: String,
    pub external_product_id: Option<String>,
    pub anchor_text: Option<String>,
    /// Status of the list page the link came from
    pub http_status: Option<u16>,
    pub notes: Vec<String>,
}

/// One terminal page-level or category-level problem
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureRecord {
    pub seed_run_id: String,
    pub category_url: String,
    pub category_target_url: String,
    pub list_page_url: String,
    pub failure_category: FailureCategory,
    pub message: String,
    pub status_code: Option<u16>,
    pub created_at: DateTime<Utc>,
}

/// Locations of the three output files of a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputPaths {
    pub detail_urls: PathBuf,
    pub seed_failures: PathBuf,
    pub seed_manifest: PathBuf,
}

impl OutputPaths {
    /// Standard file layout under an output directory
    pub fn in_dir(out_dir: &Path) -> Self {
        Self {
            detail_urls: out_dir.join(DETAIL_URLS_FILE),
            seed_failures: out_dir.join(SEED_FAILURES_FILE),
            seed_manifest: out_dir.join(SEED_MANIFEST_FILE),
        }
    }
}

/// Final summary of a run, written once as `seed_manifest.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunManifest {
    pub seed_run_id: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub input_category_urls: Vec<String>,
    pub total_list_pages_fetched: u64,
    /// Product links seen, duplicates included
    pub total_detail_urls: u64,
    /// Distinct canonical URLs persisted
    pub total_canonical_urls: u64,
    pub failures_count: u64,
    /// SHA-256 of the effective configuration
    pub config_hash: String,
    pub output_paths: OutputPaths,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_category_wire_names() {
        let categories = [
            (FailureCategory::FetchFailed, "FETCH_FAILED"),
            (FailureCategory::HttpBlocked, "HTTP_BLOCKED_403_429"),
            (FailureCategory::ParseFailed, "PARSE_FAILED"),
            (FailureCategory::ProductUrlsNotFound, "PRODUCT_URLS_NOT_FOUND"),
            (FailureCategory::RobotsDisallow, "ROBOTS_DISALLOW"),
        ];
        for (category, name) in categories {
            assert_eq!(category.as_str(), name);
            assert_eq!(serde_json::to_string(&category).unwrap(), format!("\"{}\"", name));
        }
    }

    #[test]
    fn test_failure_category_for_status() {
        assert_eq!(FailureCategory::for_status(403), FailureCategory::HttpBlocked);
        assert_eq!(FailureCategory::for_status(429), FailureCategory::HttpBlocked);
        assert_eq!(FailureCategory::for_status(404), FailureCategory::FetchFailed);
        assert_eq!(FailureCategory::for_status(503), FailureCategory::FetchFailed);
    }

    #[test]
    fn test_output_paths_layout() {
        let paths = OutputPaths::in_dir(Path::new("out"));
        assert_eq!(paths.detail_urls, Path::new("out/detail_urls.jsonl"));
        assert_eq!(paths.seed_failures, Path::new("out/seed_failures.jsonl"));
        assert_eq!(paths.seed_manifest, Path::new("out/seed_manifest.json"));
    }
}
