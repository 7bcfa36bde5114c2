use crate::config::types::{
    Config, CrawlConfig, ExtractConfig, FetchConfig, OutputConfig, RetryConfig,
};
use crate::ConfigError;
use scraper::Selector;
use url::Url;

/// Upper bound on the worker pool size
pub const MAX_WORKERS: usize = 64;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawl_config(&config.crawl)?;
    validate_fetch_config(&config.fetch)?;
    validate_retry_config(&config.retry)?;
    validate_extract_config(&config.extract)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates crawl scope and concurrency settings
fn validate_crawl_config(config: &CrawlConfig) -> Result<(), ConfigError> {
    if config.seed_url.is_empty() {
        return Err(ConfigError::Validation(
            "seed-url must be set (in the config file or with --seed)".to_string(),
        ));
    }

    let seed = Url::parse(&config.seed_url).map_err(|e| {
        ConfigError::InvalidUrl(format!("Invalid seed-url '{}': {}", config.seed_url, e))
    })?;

    if seed.scheme() != "http" && seed.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "seed-url '{}' must use http or https",
            config.seed_url
        )));
    }

    if config.workers < 1 || config.workers > MAX_WORKERS {
        return Err(ConfigError::Validation(format!(
            "workers must be between 1 and {}, got {}",
            MAX_WORKERS, config.workers
        )));
    }

    if config.max_pages < 1 {
        return Err(ConfigError::Validation(format!(
            "max-pages must be >= 1, got {}",
            config.max_pages
        )));
    }

    if config.max_products < 1 {
        return Err(ConfigError::Validation(format!(
            "max-products must be >= 1, got {}",
            config.max_products
        )));
    }

    if config.page_param.is_empty() {
        return Err(ConfigError::Validation(
            "page-param cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates HTTP fetch settings
fn validate_fetch_config(config: &FetchConfig) -> Result<(), ConfigError> {
    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    if config.timeout_ms < 100 {
        return Err(ConfigError::Validation(format!(
            "timeout-ms must be >= 100ms, got {}ms",
            config.timeout_ms
        )));
    }

    if config.connect_timeout_ms == 0 {
        return Err(ConfigError::Validation(
            "connect-timeout-ms must be > 0".to_string(),
        ));
    }

    Ok(())
}

/// Validates retry settings
fn validate_retry_config(config: &RetryConfig) -> Result<(), ConfigError> {
    if config.max_backoff_ms < config.base_delay_ms {
        return Err(ConfigError::Validation(format!(
            "max-backoff-ms ({}) must be >= base-delay-ms ({})",
            config.max_backoff_ms, config.base_delay_ms
        )));
    }

    Ok(())
}

/// Validates that every configured selector parses and labels are present
fn validate_extract_config(config: &ExtractConfig) -> Result<(), ConfigError> {
    parse_selector(&config.detail_link_selector)?;
    parse_selector(&config.title_selector)?;

    // An empty next-page selector means "continue while products are found"
    if !config.next_page_selector.trim().is_empty() {
        parse_selector(&config.next_page_selector)?;
    }

    if config.description_meta.is_empty() {
        return Err(ConfigError::Validation(
            "description-meta cannot be empty".to_string(),
        ));
    }

    if config.asin_label.is_empty() || config.manufacturer_label.is_empty() {
        return Err(ConfigError::Validation(
            "asin-label and manufacturer-label cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates output settings
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.csv_path.is_empty() {
        return Err(ConfigError::Validation(
            "csv-path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Parses a CSS selector, mapping failures to a configuration error
pub fn parse_selector(selector: &str) -> Result<Selector, ConfigError> {
    Selector::parse(selector).map_err(|e| ConfigError::InvalidSelector {
        selector: selector.to_string(),
        message: format!("{:?}", e),
    })
}
