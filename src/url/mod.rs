//! URL handling module for Seed Collector
//!
//! This module provides product URL canonicalization, the generic URL
//! normalizer, list-page URL construction, and host extraction.

mod canonical;
mod domain;
mod normalize;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;

// Re-export main functions
pub use canonical::{canonicalize, detect_platform, CanonicalizationResult, CUSTOM_PHP_ID_KEYS};
pub use domain::{extract_host, host_of};
pub use normalize::{build_page_url, normalize_unknown_url, shop_base_url};

/// Operator-supplied assumption about the storefront platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum PlatformHint {
    /// Detect the platform per URL
    Auto,
    Cafe24,
    Shopify,
    #[value(name = "custom_php")]
    CustomPhp,
    /// Skip platform rules, always use the generic normalizer
    Unknown,
}

/// Platform a URL was resolved to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    Cafe24,
    Shopify,
    CustomPhp,
    Unknown,
}

impl Platform {
    /// Returns the wire name used in output records
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cafe24 => "cafe24",
            Self::Shopify => "shopify",
            Self::CustomPhp => "custom_php",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl PlatformHint {
    /// Returns true if a product link classified as `matched` should be
    /// collected under this hint
    ///
    /// Generic product links are always accepted; platform-specific links
    /// must agree with a concrete hint.
    pub fn accepts(&self, matched: Platform) -> bool {
        match self {
            Self::Auto | Self::Unknown => true,
            Self::Cafe24 => matches!(matched, Platform::Cafe24 | Platform::Unknown),
            Self::Shopify => matches!(matched, Platform::Shopify | Platform::Unknown),
            Self::CustomPhp => matches!(matched, Platform::CustomPhp | Platform::Unknown),
        }
    }
}
