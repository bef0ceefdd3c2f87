//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the state machine that turns input category URLs
//! into persisted product detail URLs:
//! - Expanding each input category into crawl targets (sub-category discovery)
//! - Checking robots.txt once per target
//! - Walking list pages with the page-parameter, next-link or auto strategy
//! - Canonicalizing candidates and reporting them to the shared run state
//! - Writing the manifest once every category task has finished

use crate::config::{compute_config_hash, CollectConfig, PagingMode, SubcategoryMode};
use crate::crawler::{CategoryPage, Fetcher, HtmlAnalyzer, ListingPage, PageAnalyzer};
use crate::output::{
    prepare_output_dir, write_manifest, DetailRecord, FailureCategory, FailureRecord, OutputPaths, RunManifest,
    DISCOVERY_METHOD_CATEGORY_LIST,
};
use crate::robots::check_robots;
use crate::state::{CrawlTarget, RunState};
use crate::url::{build_page_url, canonicalize, shop_base_url};
use crate::SeedError;
use chrono::Utc;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::task::JoinSet;

/// Message of the failure recorded for a list page without product links
const NO_PRODUCT_LINKS_MESSAGE: &str = "No product detail links found";

/// Message of the failure recorded for a target blocked by robots.txt
const ROBOTS_DISALLOW_MESSAGE: &str = "Robots.txt disallows crawling";

/// A list page that was fetched with a non-error status and analyzed
#[derive(Debug)]
struct FetchedPage {
    status_code: u16,
    listing: ListingPage,
}

/// Main crawl coordinator
///
/// Cloning is cheap; every category task owns a clone sharing the same
/// fetcher, analyzer and run state.
#[derive(Clone)]
pub struct Coordinator {
    config: Arc<CollectConfig>,
    fetcher: Arc<Fetcher>,
    analyzer: Arc<dyn PageAnalyzer>,
    state: Arc<RunState>,
    output_paths: Arc<OutputPaths>,
    config_hash: Arc<str>,
}

impl Coordinator {
    /// Creates a coordinator and opens the run's output files
    ///
    /// # Arguments
    ///
    /// * `config` - A validated collect configuration
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Output directory and files are ready
    /// * `Err(SeedError)` - The output directory or files could not be
    ///   prepared, or the HTTP client could not be built
    pub fn new(config: CollectConfig) -> Result<Self, SeedError> {
        let config_hash = compute_config_hash(&config)?;
        let output_paths = prepare_output_dir(&config.out_dir)?;
        let state = RunState::create(&output_paths, config.product_cap())?;
        let fetcher = Fetcher::new(&config)?;

        Ok(Self {
            config: Arc::new(config),
            fetcher: Arc::new(fetcher),
            analyzer: Arc::new(HtmlAnalyzer::new()),
            state: Arc::new(state),
            output_paths: Arc::new(output_paths),
            config_hash: config_hash.into(),
        })
    }

    /// Replaces the page analyzer
    pub fn with_analyzer(mut self, analyzer: Arc<dyn PageAnalyzer>) -> Self {
        self.analyzer = analyzer;
        self
    }

    /// Shared state of this run
    pub fn state(&self) -> &RunState {
        &self.state
    }

    pub fn output_paths(&self) -> &OutputPaths {
        &self.output_paths
    }

    /// Runs the collection and writes the manifest
    ///
    /// One task is spawned per input category; each discovers its targets
    /// and crawls them concurrently. Page and category failures are recorded
    /// and never abort the run. A panicking category task is logged and
    /// counted as a failure.
    ///
    /// # Returns
    ///
    /// * `Ok(RunManifest)` - The manifest that was written
    /// * `Err(SeedError)` - The manifest could not be written
    pub async fn run(&self) -> Result<RunManifest, SeedError> {
        tracing::info!(
            "Starting seed run {} with {} input categories",
            self.state.seed_run_id(),
            self.config.category_urls.len()
        );

        let mut tasks = JoinSet::new();
        for input_url in self.config.category_urls.iter().cloned() {
            let coordinator = self.clone();
            tasks.spawn(async move { coordinator.collect_category(&input_url).await });
        }
        self.join_all(tasks).await;

        let manifest = self
            .state
            .manifest(&self.config.category_urls, &self.config_hash, &self.output_paths);
        write_manifest(&self.output_paths.seed_manifest, &manifest)?;

        tracing::info!(
            "Seed run {} complete: {} list pages, {} detail URLs, {} canonical URLs, {} failures",
            manifest.seed_run_id,
            manifest.total_list_pages_fetched,
            manifest.total_detail_urls,
            manifest.total_canonical_urls,
            manifest.failures_count
        );

        Ok(manifest)
    }

    async fn join_all(&self, mut tasks: JoinSet<()>) {
        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined {
                tracing::error!("{}", SeedError::Task(e));
                self.state.count_unrecorded_failure();
            }
        }
    }

    /// Discovers the targets of one input category and crawls them concurrently
    async fn collect_category(&self, input_url: &str) {
        let targets = self.discover_targets(input_url).await;
        tracing::info!("{}: {} crawl target(s)", input_url, targets.len());

        let mut tasks = JoinSet::new();
        for target in targets {
            let coordinator = self.clone();
            tasks.spawn(async move { coordinator.process_target(&target).await });
        }
        self.join_all(tasks).await;
    }

    /// Expands an input category into crawl targets
    ///
    /// The input itself is the single target when discovery is off or the
    /// run is already stopped, when the discovery page cannot be fetched or
    /// analyzed, or when it has no sub-category links other than the input
    /// itself.
    pub async fn discover_targets(&self, input_url: &str) -> Vec<CrawlTarget> {
        if self.config.subcategory_mode == SubcategoryMode::Off || self.state.is_stopped() {
            return vec![CrawlTarget::unlabeled(input_url)];
        }

        let discovery_url = match self.config.paging_mode {
            PagingMode::NextLink => input_url.to_string(),
            PagingMode::Auto | PagingMode::PageParam => {
                build_page_url(input_url, &self.config.page_param, self.config.start_page)
                    .unwrap_or_else(|_| input_url.to_string())
            }
        };

        let Some(page) = self.fetch_category_page(&discovery_url).await else {
            return vec![CrawlTarget::unlabeled(input_url)];
        };

        let input_key = input_url.trim_end_matches('/');
        let subcategories: Vec<_> = page
            .subcategories
            .into_iter()
            .filter(|link| link.url.trim_end_matches('/') != input_key)
            .collect();

        if subcategories.is_empty() {
            tracing::debug!("{}: no sub-categories, breadcrumbs {:?}", input_url, page.breadcrumbs);
            let target = CrawlTarget::new(input_url, input_url, page.breadcrumbs);
            return match target.category_leaf {
                Some(_) => vec![target],
                None => vec![target.with_leaf(page.active_label)],
            };
        }

        subcategories
            .into_iter()
            .map(|link| {
                let mut path = page.breadcrumbs.clone();
                let duplicates_last = path
                    .last()
                    .is_some_and(|last| last.to_lowercase() == link.label.to_lowercase());
                if !duplicates_last {
                    path.push(link.label);
                }
                CrawlTarget::new(input_url, &link.url, path)
            })
            .collect()
    }

    async fn fetch_category_page(&self, url: &str) -> Option<CategoryPage> {
        let response = match self.fetcher.fetch(url).await {
            Ok(response) => response,
            Err(e) => {
                tracing::debug!("Discovery fetch failed for {}: {}", url, e);
                return None;
            }
        };
        if response.status_code >= 400 {
            tracing::debug!("Discovery fetch for {} returned HTTP {}", url, response.status_code);
            return None;
        }

        self.analyzer
            .analyze_category(&response.body, url)
            .map_err(|e| tracing::debug!("Discovery analysis failed for {}: {}", url, e))
            .ok()
    }

    /// Crawls one target: robots check, then the configured pagination strategy
    pub async fn process_target(&self, target: &CrawlTarget) {
        if self.state.is_stopped() {
            return;
        }

        let verdict = check_robots(&self.fetcher, &target.target_category_url, &self.config.user_agent).await;
        if !verdict.allowed {
            self.record_failure(
                target,
                &target.target_category_url,
                FailureCategory::RobotsDisallow,
                ROBOTS_DISALLOW_MESSAGE.to_string(),
                None,
            );
            return;
        }
        if let Some(advisory) = verdict.advisory {
            tracing::info!("Robots.txt fetch issue for {}: {}", target.target_category_url, advisory);
        }

        tracing::debug!(
            "Crawling {} ({:?} pagination)",
            target.target_category_url,
            self.config.paging_mode
        );

        let mut category_seen = HashSet::new();
        match self.config.paging_mode {
            PagingMode::PageParam => {
                self.crawl_page_param(target, &mut category_seen, self.config.start_page, 0)
                    .await
            }
            PagingMode::NextLink => self.crawl_next_link(target, &mut category_seen, None, 0).await,
            PagingMode::Auto => self.crawl_auto(target, &mut category_seen).await,
        }
    }

    /// Page-parameter strategy
    ///
    /// Stops at the page cap, on a failed page, or on a page that adds no
    /// canonical URL not already seen in this target.
    async fn crawl_page_param(
        &self,
        target: &CrawlTarget,
        category_seen: &mut HashSet<String>,
        start_page: u32,
        mut pages_fetched: u32,
    ) {
        let mut page = start_page;

        while !self.state.is_stopped() {
            if self.page_cap_reached(pages_fetched) {
                break;
            }

            let Some(list_page_url) = self.page_url(target, page) else {
                break;
            };
            let Some(fetched) = self.fetch_page(target, &list_page_url).await else {
                break;
            };
            pages_fetched += 1;

            if self.process_candidates(target, &fetched, &list_page_url, category_seen) == 0 {
                tracing::debug!("No new product URLs on {}, stopping", list_page_url);
                break;
            }
            page = page.saturating_add(1);
        }
    }

    /// Next-link strategy
    ///
    /// Starts at `start_url` (the target URL when `None`) and follows the
    /// analyzer's next link. Stops at the page cap, on a failed page, on a
    /// revisited URL, on a page without new canonical URLs, or when there is
    /// no next link.
    async fn crawl_next_link(
        &self,
        target: &CrawlTarget,
        category_seen: &mut HashSet<String>,
        start_url: Option<String>,
        mut pages_fetched: u32,
    ) {
        let mut next = Some(start_url.unwrap_or_else(|| target.target_category_url.clone()));
        let mut visited = HashSet::new();

        while let Some(list_page_url) = next.take() {
            if self.state.is_stopped() {
                break;
            }
            if visited.contains(&list_page_url) {
                tracing::debug!("Next link cycle at {}, stopping", list_page_url);
                break;
            }
            if self.page_cap_reached(pages_fetched) {
                break;
            }
            visited.insert(list_page_url.clone());

            let Some(fetched) = self.fetch_page(target, &list_page_url).await else {
                break;
            };
            pages_fetched += 1;

            if self.process_candidates(target, &fetched, &list_page_url, category_seen) == 0 {
                tracing::debug!("No new product URLs on {}, stopping", list_page_url);
                break;
            }
            next = fetched.listing.next_link;
        }
    }

    /// Auto strategy
    ///
    /// Probes the first page-parameter URL once. A probe without new
    /// canonical URLs switches to the next-link strategy from the reported
    /// next link, or stops when there is none. Otherwise page-parameter
    /// pagination continues from the following page.
    async fn crawl_auto(&self, target: &CrawlTarget, category_seen: &mut HashSet<String>) {
        let Some(first_url) = self.page_url(target, self.config.start_page) else {
            return;
        };
        let Some(fetched) = self.fetch_page(target, &first_url).await else {
            return;
        };
        let pages_fetched = 1;

        if self.process_candidates(target, &fetched, &first_url, category_seen) == 0 {
            if let Some(next_link) = fetched.listing.next_link {
                tracing::debug!(
                    "{} ignores the page parameter, following next links from {}",
                    target.target_category_url,
                    next_link
                );
                self.crawl_next_link(target, category_seen, Some(next_link), pages_fetched)
                    .await;
            }
            return;
        }

        self.crawl_page_param(
            target,
            category_seen,
            self.config.start_page.saturating_add(1),
            pages_fetched,
        )
        .await;
    }

    /// Fetches and analyzes one list page, recording any failure
    ///
    /// Returns `None` when the run is stopped or the page failed. A page
    /// without product links records `PRODUCT_URLS_NOT_FOUND` but is still
    /// returned.
    async fn fetch_page(&self, target: &CrawlTarget, list_page_url: &str) -> Option<FetchedPage> {
        if self.state.is_stopped() {
            return None;
        }

        let response = match self.fetcher.fetch(list_page_url).await {
            Ok(response) => response,
            Err(e) => {
                self.record_failure(target, list_page_url, FailureCategory::FetchFailed, e.to_string(), None);
                return None;
            }
        };

        self.state.increment_pages_fetched();
        let status_code = response.status_code;
        if response.final_url == list_page_url {
            tracing::debug!("Fetched {} (HTTP {})", list_page_url, status_code);
        } else {
            tracing::debug!(
                "Fetched {} (HTTP {}) after redirect to {}",
                list_page_url,
                status_code,
                response.final_url
            );
        }

        if status_code >= 400 {
            self.record_failure(
                target,
                list_page_url,
                FailureCategory::for_status(status_code),
                format!("HTTP {}", status_code),
                Some(status_code),
            );
            return None;
        }

        let listing = match self
            .analyzer
            .analyze_listing(&response.body, list_page_url, self.config.platform_hint)
        {
            Ok(listing) => listing,
            Err(e) => {
                self.record_failure(
                    target,
                    list_page_url,
                    FailureCategory::ParseFailed,
                    e.to_string(),
                    Some(status_code),
                );
                return None;
            }
        };

        if listing.candidates.is_empty() {
            self.record_failure(
                target,
                list_page_url,
                FailureCategory::ProductUrlsNotFound,
                NO_PRODUCT_LINKS_MESSAGE.to_string(),
                Some(status_code),
            );
        }

        Some(FetchedPage { status_code, listing })
    }

    /// Canonicalizes and reports every candidate of a page
    ///
    /// Returns the number of canonical URLs not previously seen in this
    /// target. Stops early once the run is stopped.
    fn process_candidates(
        &self,
        target: &CrawlTarget,
        page: &FetchedPage,
        list_page_url: &str,
        category_seen: &mut HashSet<String>,
    ) -> usize {
        let mut page_new = 0;

        for candidate in &page.listing.candidates {
            if self.state.is_stopped() {
                break;
            }

            let result = canonicalize(&candidate.url, self.config.platform_hint);
            if category_seen.insert(result.canonical_url.clone()) {
                page_new += 1;
            }

            let record = DetailRecord {
                seed_run_id: self.state.seed_run_id().to_string(),
                shop_base_url: shop_base_url(&result.canonical_url),
                platform_hint: result.platform,
                category_url: target.input_category_url.clone(),
                category_target_url: target.target_category_url.clone(),
                category_path: target.category_path.clone(),
                category_leaf: target.category_leaf.clone(),
                list_page_url: list_page_url.to_string(),
                discovery_method: DISCOVERY_METHOD_CATEGORY_LIST.to_string(),
                discovered_at: Utc::now(),
                detail_url: candidate.url.clone(),
                canonical_url: result.canonical_url,
                external_product_id: result.external_product_id,
                anchor_text: candidate.anchor_text.clone(),
                http_status: Some(page.status_code),
                notes: Vec::new(),
            };
            self.state.record_detail(&record);
        }

        page_new
    }

    fn page_url(&self, target: &CrawlTarget, page: u32) -> Option<String> {
        match build_page_url(&target.target_category_url, &self.config.page_param, page) {
            Ok(url) => Some(url),
            Err(e) => {
                self.record_failure(
                    target,
                    &target.target_category_url,
                    FailureCategory::FetchFailed,
                    e.to_string(),
                    None,
                );
                None
            }
        }
    }

    fn page_cap_reached(&self, pages_fetched: u32) -> bool {
        self.config.page_cap().is_some_and(|cap| pages_fetched >= cap)
    }

    fn record_failure(
        &self,
        target: &CrawlTarget,
        list_page_url: &str,
        failure_category: FailureCategory,
        message: String,
        status_code: Option<u16>,
    ) {
        self.state.record_failure(&FailureRecord {
            seed_run_id: self.state.seed_run_id().to_string(),
            category_url: target.input_category_url.clone(),
            category_target_url: target.target_category_url.clone(),
            list_page_url: list_page_url.to_string(),
            failure_category,
            message,
            status_code,
            created_at: Utc::now(),
        });
    }
}
