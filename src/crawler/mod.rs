//! Crawler module for list page fetching and analysis
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with retries and per-host rate limiting
//! - Product link, next link and sub-category detection
//! - Pagination strategies and overall run coordination

mod analyzer;
mod category;
mod coordinator;
mod fetcher;
mod links;
mod rate_limit;

pub use analyzer::{CategoryLink, CategoryPage, HtmlAnalyzer, LinkCandidate, ListingPage, PageAnalyzer};
pub use coordinator::Coordinator;
pub use fetcher::{backoff_delay, retry_after, FetchError, FetchResponse, Fetcher, RETRY_STATUSES};
pub use links::classify_product_url;
pub use rate_limit::RateLimiter;

use crate::config::CollectConfig;
use crate::output::RunManifest;
use crate::SeedError;

/// Runs a complete collection
///
/// This is the main entry point for a `collect` run. It will:
/// 1. Prepare the output directory and files
/// 2. Expand every input category into crawl targets
/// 3. Paginate each target and persist new product URLs
/// 4. Write the run manifest
///
/// # Arguments
///
/// * `config` - A validated collect configuration
///
/// # Returns
///
/// * `Ok(RunManifest)` - The run finished and its manifest was written
/// * `Err(SeedError)` - Output setup or manifest writing failed
pub async fn crawl(config: CollectConfig) -> Result<RunManifest, SeedError> {
    Coordinator::new(config)?.run().await
}
