use crate::config::types::CollectConfig;
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &CollectConfig) -> Result<(), ConfigError> {
    validate_category_urls(&config.category_urls)?;
    validate_fetch_settings(config)?;
    validate_paging_settings(config)?;
    Ok(())
}

/// Validates the input category URLs
fn validate_category_urls(urls: &[String]) -> Result<(), ConfigError> {
    if urls.is_empty() {
        return Err(ConfigError::Validation(
            "at least one category URL is required".to_string(),
        ));
    }

    for raw in urls {
        let url = Url::parse(raw).map_err(|e| {
            ConfigError::InvalidUrl(format!("Invalid category URL '{}': {}", raw, e))
        })?;

        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(ConfigError::InvalidUrl(format!(
                "Category URL '{}' must use http or https",
                raw
            )));
        }

        if url.host_str().is_none() {
            return Err(ConfigError::InvalidUrl(format!(
                "Category URL '{}' has no host",
                raw
            )));
        }
    }

    Ok(())
}

/// Validates HTTP client settings
fn validate_fetch_settings(config: &CollectConfig) -> Result<(), ConfigError> {
    if config.concurrency < 1 {
        return Err(ConfigError::Validation(format!(
            "concurrency must be >= 1, got {}",
            config.concurrency
        )));
    }

    if config.timeout_sec < 1 {
        return Err(ConfigError::Validation(format!(
            "timeout_sec must be >= 1, got {}",
            config.timeout_sec
        )));
    }

    if !config.rate_limit_rps.is_finite() {
        return Err(ConfigError::Validation(format!(
            "rate_limit_rps must be a finite number, got {}",
            config.rate_limit_rps
        )));
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates pagination settings
fn validate_paging_settings(config: &CollectConfig) -> Result<(), ConfigError> {
    if config.page_param.trim().is_empty() {
        return Err(ConfigError::Validation(
            "page_param cannot be empty".to_string(),
        ));
    }

    Ok(())
}
