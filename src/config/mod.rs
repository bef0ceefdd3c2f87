//! Configuration module for Seed Collector
//!
//! Settings come from an optional TOML file and the `collect` command-line
//! flags, with flags taking precedence.
//!
//! # Example
//!
//! ```no_run
//! use seed_collector::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("collect.toml")).unwrap();
//! println!("Page parameter: {}", config.page_param);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{CollectConfig, CollectOverrides, PagingMode, SubcategoryMode, DEFAULT_USER_AGENT};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, resolve_config};
