use crate::url::PlatformHint;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default user agent sent with every request and used for robots.txt matching
pub const DEFAULT_USER_AGENT: &str = "seed-collector/0.1";

/// Effective configuration for one `collect` run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct CollectConfig {
    /// Category/list page URLs to start from
    pub category_urls: Vec<String>,

    /// Directory receiving the JSONL files and the manifest
    pub out_dir: PathBuf,

    /// Maximum list pages fetched per category target (0 = unlimited)
    pub max_pages_per_category: u32,

    /// Maximum distinct canonical URLs persisted per run (0 = unlimited)
    pub max_products: u64,

    /// Per-host request ceiling; values <= 0 disable throttling
    pub rate_limit_rps: f64,

    /// Maximum number of in-flight HTTP requests across all hosts
    pub concurrency: usize,

    /// Per-request timeout in seconds
    pub timeout_sec: u64,

    /// Retries after the first attempt for transport errors and retryable statuses
    pub retry_count: u32,

    /// How list pages of a category are walked
    pub paging_mode: PagingMode,

    /// Query parameter carrying the page number
    pub page_param: String,

    /// First page number used by the page-parameter strategies
    pub start_page: u32,

    /// Storefront platform assumption for link extraction and canonicalization
    pub platform_hint: PlatformHint,

    /// Whether input categories are expanded into their sub-categories
    pub subcategory_mode: SubcategoryMode,

    /// User agent header and robots.txt agent
    pub user_agent: String,
}

impl Default for CollectConfig {
    fn default() -> Self {
        Self {
            category_urls: Vec::new(),
            out_dir: PathBuf::from("seed_output"),
            max_pages_per_category: 20,
            max_products: 0,
            rate_limit_rps: 1.0,
            concurrency: 5,
            timeout_sec: 15,
            retry_count: 2,
            paging_mode: PagingMode::Auto,
            page_param: "page".to_string(),
            start_page: 1,
            platform_hint: PlatformHint::Auto,
            subcategory_mode: SubcategoryMode::Auto,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl CollectConfig {
    /// Page cap per category target, `None` when unlimited
    pub fn page_cap(&self) -> Option<u32> {
        (self.max_pages_per_category > 0).then_some(self.max_pages_per_category)
    }

    /// Global product cap, `None` when unlimited
    pub fn product_cap(&self) -> Option<usize> {
        (self.max_products > 0).then_some(self.max_products as usize)
    }

    /// Applies command-line overrides on top of this configuration
    ///
    /// Scalar settings given on the command line replace file values.
    /// Category URLs are appended to the ones listed in the file.
    pub fn with_overrides(mut self, overrides: CollectOverrides) -> Self {
        self.category_urls.extend(overrides.category_urls);

        if let Some(v) = overrides.out_dir {
            self.out_dir = v;
        }
        if let Some(v) = overrides.max_pages_per_category {
            self.max_pages_per_category = v;
        }
        if let Some(v) = overrides.max_products {
            self.max_products = v;
        }
        if let Some(v) = overrides.rate_limit_rps {
            self.rate_limit_rps = v;
        }
        if let Some(v) = overrides.concurrency {
            self.concurrency = v;
        }
        if let Some(v) = overrides.timeout_sec {
            self.timeout_sec = v;
        }
        if let Some(v) = overrides.retry_count {
            self.retry_count = v;
        }
        if let Some(v) = overrides.paging_mode {
            self.paging_mode = v;
        }
        if let Some(v) = overrides.page_param {
            self.page_param = v;
        }
        if let Some(v) = overrides.start_page {
            self.start_page = v;
        }
        if let Some(v) = overrides.platform_hint {
            self.platform_hint = v;
        }
        if let Some(v) = overrides.subcategory_mode {
            self.subcategory_mode = v;
        }
        if let Some(v) = overrides.user_agent {
            self.user_agent = v;
        }

        self
    }
}

/// Pagination strategy selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum PagingMode {
    /// Probe the page parameter once, fall back to next links
    Auto,

    /// Increment a page-number query parameter
    #[value(name = "page_param")]
    PageParam,

    /// Follow the page's "next" link
    #[value(name = "next_link")]
    NextLink,
}

/// Sub-category discovery toggle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum SubcategoryMode {
    Auto,
    Off,
}

/// Command-line settings for the `collect` subcommand
///
/// Every field is optional so that unset flags leave the configuration
/// file (or the built-in defaults) untouched.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct CollectOverrides {
    /// Category/list page URL (repeatable)
    #[arg(long = "category-url", value_name = "URL")]
    pub category_urls: Vec<String>,

    /// Output directory [default: seed_output]
    #[arg(long)]
    pub out_dir: Option<PathBuf>,

    /// List pages per category target, 0 for unlimited [default: 20]
    #[arg(long)]
    pub max_pages_per_category: Option<u32>,

    /// Distinct products per run, 0 for unlimited [default: 0]
    #[arg(long)]
    pub max_products: Option<u64>,

    /// Requests per second per host, <= 0 disables throttling [default: 1.0]
    #[arg(long, allow_negative_numbers = true)]
    pub rate_limit_rps: Option<f64>,

    /// Concurrent requests across all hosts [default: 5]
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Request timeout in seconds [default: 15]
    #[arg(long)]
    pub timeout_sec: Option<u64>,

    /// Retries for transport errors and 429/5xx responses [default: 2]
    #[arg(long)]
    pub retry_count: Option<u32>,

    /// Pagination strategy [default: auto]
    #[arg(long, value_enum)]
    pub paging_mode: Option<PagingMode>,

    /// Page-number query parameter [default: page]
    #[arg(long)]
    pub page_param: Option<String>,

    /// First page number [default: 1]
    #[arg(long)]
    pub start_page: Option<u32>,

    /// Storefront platform [default: auto]
    #[arg(long, value_enum)]
    pub platform_hint: Option<PlatformHint>,

    /// Sub-category discovery [default: auto]
    #[arg(long, value_enum)]
    pub subcategory_mode: Option<SubcategoryMode>,

    /// User agent string [default: seed-collector/0.1]
    #[arg(long)]
    pub user_agent: Option<String>,
}
