use crate::config::types::{ApiConfig, Config, OutputConfig, SyncLimits};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_api_config(&config.api)?;
    validate_sync_limits(&config.sync)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates the remote API configuration
fn validate_api_config(config: &ApiConfig) -> Result<(), ConfigError> {
    let url = Url::parse(&config.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base-url: {}", e)))?;

    if url.scheme() != "https" && url.scheme() != "http" {
        return Err(ConfigError::InvalidUrl(format!(
            "base-url '{}' must use http or https",
            config.base_url
        )));
    }

    if url.host_str().is_none() {
        return Err(ConfigError::InvalidUrl(format!(
            "base-url '{}' has no host",
            config.base_url
        )));
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    if config.page_size < 1 {
        return Err(ConfigError::Validation(format!(
            "page-size must be >= 1, got {}",
            config.page_size
        )));
    }

    if config.request_timeout_secs < 1 || config.connect_timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "request and connect timeouts must be >= 1 second".to_string(),
        ));
    }

    Ok(())
}

/// Validates per-round budgets
fn validate_sync_limits(limits: &SyncLimits) -> Result<(), ConfigError> {
    if limits.max_concurrent < 1 || limits.max_concurrent > 50 {
        return Err(ConfigError::Validation(format!(
            "max-concurrent must be between 1 and 50, got {}",
            limits.max_concurrent
        )));
    }

    let at_least_one = [
        ("new-thread-page-cap", limits.new_thread_page_cap as u64),
        ("new-thread-cap", limits.new_thread_cap as u64),
        ("reply-page-cap", limits.reply_page_cap as u64),
        ("reply-update-budget", limits.reply_update_budget as u64),
        ("comment-page-cap", limits.comment_page_cap as u64),
        ("max-rounds", limits.max_rounds as u64),
    ];

    for (name, value) in at_least_one {
        if value < 1 {
            return Err(ConfigError::Validation(format!(
                "{} must be >= 1, got {}",
                name, value
            )));
        }
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database-path cannot be empty".to_string(),
        ));
    }

    Ok(())
}
