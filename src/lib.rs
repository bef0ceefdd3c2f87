//! Seed Collector: product detail URL discovery for e-commerce category pages
//!
//! This crate walks merchant category/listing pages, follows their pagination,
//! and emits a deduplicated stream of canonical product detail URLs while
//! respecting robots.txt and per-host rate limits.

pub mod config;
pub mod crawler;
pub mod output;
pub mod robots;
pub mod state;
pub mod url;

use thiserror::Error;

/// Main error type for Seed Collector operations
#[derive(Debug, Error)]
pub enum SeedError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("HTML analysis error for {url}: {message}")]
    HtmlParse { url: String, message: String },

    #[error("Failed to prepare output at {path}: {source}")]
    OutputSetup {
        path: String,
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Category task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),
}

/// Result type alias for Seed Collector operations
pub type Result<T> = std::result::Result<T, SeedError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::CollectConfig;
pub use crawler::{Coordinator, Fetcher, HtmlAnalyzer, PageAnalyzer, RateLimiter};
pub use state::{CrawlTarget, RunState};
pub use url::{canonicalize, CanonicalizationResult, Platform, PlatformHint};
