use crate::config::types::{
    CheckpointConfig, Config, CrawlConfig, OutputConfig, SourceConfig, TimingConfig,
};
use crate::ConfigError;
use scraper::Selector;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawl_config(&config.crawl)?;
    validate_timing_config(&config.timing)?;
    validate_output_config(&config.output)?;
    validate_checkpoint_config(&config.checkpoint)?;
    if let Some(source) = &config.source {
        validate_source_config(source)?;
    }
    Ok(())
}

fn validate_crawl_config(config: &CrawlConfig) -> Result<(), ConfigError> {
    if config.max_pages < 1 {
        return Err(ConfigError::Validation(format!(
            "max_pages must be >= 1, got {}",
            config.max_pages
        )));
    }
    Ok(())
}

fn validate_timing_config(config: &TimingConfig) -> Result<(), ConfigError> {
    if config.min_delay > config.max_delay {
        return Err(ConfigError::Validation(format!(
            "min_delay ({}ms) must not exceed max_delay ({}ms)",
            config.min_delay, config.max_delay
        )));
    }

    if config.coffee_break_interval < 1 {
        return Err(ConfigError::Validation(
            "coffee_break_interval must be >= 1".to_string(),
        ));
    }

    Ok(())
}

fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.path.is_empty() {
        return Err(ConfigError::Validation(
            "output path cannot be empty".to_string(),
        ));
    }
    Ok(())
}

fn validate_checkpoint_config(config: &CheckpointConfig) -> Result<(), ConfigError> {
    if config.save_interval < 1 {
        return Err(ConfigError::Validation(format!(
            "save_interval must be >= 1, got {}",
            config.save_interval
        )));
    }

    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database_path cannot be empty".to_string(),
        ));
    }

    if config.session_key.is_empty() {
        return Err(ConfigError::Validation(
            "session_key cannot be empty".to_string(),
        ));
    }

    Ok(())
}

fn validate_source_config(config: &SourceConfig) -> Result<(), ConfigError> {
    let url = Url::parse(&config.listing_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid listing_url: {}", e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "listing_url '{}' must use http or https",
            config.listing_url
        )));
    }

    if config.page_param.is_empty() {
        return Err(ConfigError::Validation(
            "page_param cannot be empty".to_string(),
        ));
    }

    if config.page_step < 1 {
        return Err(ConfigError::Validation(
            "page_step must be >= 1".to_string(),
        ));
    }

    let selectors = &config.selectors;
    let required = [
        &selectors.item,
        &selectors.detail_link,
        &selectors.title,
        &selectors.description,
    ];
    let optional = [
        &selectors.card_title,
        &selectors.card_organization,
        &selectors.next_page,
        &selectors.organization,
        &selectors.location,
        &selectors.posted_date,
        &selectors.application_count,
        &selectors.skills_match,
        &selectors.insights,
    ];

    for selector in required.into_iter().chain(optional.into_iter().flatten()) {
        validate_selector(selector)?;
    }

    Ok(())
}

fn validate_selector(selector: &str) -> Result<(), ConfigError> {
    if selector.trim().is_empty() {
        return Err(ConfigError::InvalidSelector {
            selector: selector.to_string(),
            message: "selector cannot be empty".to_string(),
        });
    }

    Selector::parse(selector).map_err(|e| ConfigError::InvalidSelector {
        selector: selector.to_string(),
        message: format!("{:?}", e),
    })?;

    Ok(())
}
