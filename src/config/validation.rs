use crate::config::types::{Config, CrawlerConfig, OutputConfig, SupervisorConfig, UserAgentConfig};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_supervisor_config(&config.supervisor, &config.crawler)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.workers < 1 {
        return Err(ConfigError::Validation(format!(
            "workers must be >= 1, got {}",
            config.workers
        )));
    }

    if config.idle_backoff_ms < 1 {
        return Err(ConfigError::Validation(
            "idle_backoff_ms must be >= 1ms".to_string(),
        ));
    }

    if config.max_run_time_secs == Some(0) {
        return Err(ConfigError::Validation(
            "max_run_time_secs must be >= 1 when set".to_string(),
        ));
    }

    Ok(())
}

/// Validates supervisor configuration against the initial worker count
fn validate_supervisor_config(
    config: &SupervisorConfig,
    crawler: &CrawlerConfig,
) -> Result<(), ConfigError> {
    if config.sample_interval_ms < 1 {
        return Err(ConfigError::Validation(
            "sample_interval_ms must be >= 1ms".to_string(),
        ));
    }

    if config.stagnation_rounds < 1 {
        return Err(ConfigError::Validation(
            "stagnation_rounds must be >= 1".to_string(),
        ));
    }

    if config.max_workers < crawler.workers {
        return Err(ConfigError::Validation(format!(
            "max_workers ({}) must be >= workers ({})",
            config.max_workers, crawler.workers
        )));
    }

    if config.stagnation_window() <= crawler.crawl_delay() {
        return Err(ConfigError::Validation(format!(
            "stagnation window ({}ms x {} rounds) must exceed crawl_delay_ms ({})",
            config.sample_interval_ms, config.stagnation_rounds, crawler.crawl_delay_ms
        )));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    if let Some(ua) = &config.override_string {
        if ua.trim().is_empty() {
            return Err(ConfigError::Validation(
                "user agent override cannot be empty".to_string(),
            ));
        }
        return Ok(());
    }

    // Validate crawler name: non-empty, alphanumeric + hyphens only
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler_name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    if let Some(contact_url) = &config.contact_url {
        Url::parse(contact_url)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.docs_dir.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "docs_dir cannot be empty".to_string(),
        ));
    }

    Ok(())
}
