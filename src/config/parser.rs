use crate::config::types::{CollectConfig, CollectOverrides};
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Loads a configuration file from the given path
///
/// Missing keys fall back to the built-in defaults. The result is not
/// validated yet because command-line overrides may still complete it.
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(CollectConfig)` - Successfully loaded configuration
/// * `Err(ConfigError)` - Failed to read or parse the file
pub fn load_config(path: &Path) -> Result<CollectConfig, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config: CollectConfig = toml::from_str(&content)?;
    Ok(config)
}

/// Builds the effective configuration for a run
///
/// Starts from the file at `path` (or the defaults when no file is given),
/// applies the command-line overrides, then validates the result.
///
/// # Example
///
/// ```no_run
/// use seed_collector::config::{resolve_config, CollectOverrides};
///
/// let overrides = CollectOverrides {
///     category_urls: vec!["https://shop.example.com/product/list.html?cate_no=1".to_string()],
///     ..CollectOverrides::default()
/// };
/// let config = resolve_config(None, overrides).unwrap();
/// assert_eq!(config.page_param, "page");
/// ```
pub fn resolve_config(
    path: Option<&Path>,
    overrides: CollectOverrides,
) -> Result<CollectConfig, ConfigError> {
    let base = match path {
        Some(path) => load_config(path)?,
        None => CollectConfig::default(),
    };

    let config = base.with_overrides(overrides);
    validate(&config)?;
    Ok(config)
}

/// Computes a SHA-256 hash of the effective configuration
///
/// The hash is recorded in the run manifest so that output files can be
/// traced back to the exact settings that produced them.
pub fn compute_config_hash(config: &CollectConfig) -> Result<String, ConfigError> {
    let canonical = serde_json::to_vec(config)?;
    let mut hasher = Sha256::new();
    hasher.update(&canonical);
    Ok(hex::encode(hasher.finalize()))
}
