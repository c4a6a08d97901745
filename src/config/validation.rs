use crate::config::types::{Config, CrawlerConfig, LinkConfig, OutputConfig, ProjectConfig};
use crate::ConfigError;
use std::collections::HashSet;
use std::path::PathBuf;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_project_config(&config.project)?;
    validate_output_config(&config.output)?;
    validate_crawler_config(&config.crawler)?;
    validate_link_config(&config.links)?;
    Ok(())
}

/// Validates the project identity and crawl scope
fn validate_project_config(config: &ProjectConfig) -> Result<(), ConfigError> {
    if config.name.is_empty() {
        return Err(ConfigError::Validation(
            "project name cannot be empty".to_string(),
        ));
    }

    let url = Url::parse(&config.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base-url '{}': {}", config.base_url, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
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

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    for (name, path) in [
        ("records-path", &config.records_path),
        ("unreachable-path", &config.unreachable_path),
        ("external-links-path", &config.external_links_path),
    ] {
        if path.is_empty() {
            return Err(ConfigError::Validation(format!("{} cannot be empty", name)));
        }
    }

    if config.unextractable_path.as_deref() == Some("") {
        return Err(ConfigError::Validation(
            "unextractable-path cannot be empty".to_string(),
        ));
    }

    let streams = [
        PathBuf::from(&config.records_path),
        PathBuf::from(&config.unreachable_path),
        PathBuf::from(&config.external_links_path),
        config.resolved_unextractable_path(),
    ];
    if streams.iter().collect::<HashSet<_>>().len() != streams.len() {
        return Err(ConfigError::Validation(
            "records, unreachable, external-links and unextractable paths must be distinct"
                .to_string(),
        ));
    }

    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.max_retries < 1 {
        return Err(ConfigError::Validation(format!(
            "max-retries must be >= 1, got {}",
            config.max_retries
        )));
    }

    if config.fetch_timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "fetch-timeout-secs must be >= 1, got {}",
            config.fetch_timeout_secs
        )));
    }

    if config.workers < 1 || config.workers > 64 {
        return Err(ConfigError::Validation(format!(
            "workers must be between 1 and 64, got {}",
            config.workers
        )));
    }

    if config.progress_interval < 1 {
        return Err(ConfigError::Validation(
            "progress-interval must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates the link classification tables
fn validate_link_config(config: &LinkConfig) -> Result<(), ConfigError> {
    for ext in config
        .ignored_extensions
        .iter()
        .chain(config.external_extensions.iter())
    {
        validate_extension(ext)?;
    }

    for host in &config.external_hosts {
        if host.is_empty() || host.contains('/') || host.contains(char::is_whitespace) {
            return Err(ConfigError::Validation(format!(
                "external host '{}' must be a bare host name",
                host
            )));
        }
    }

    if config.pseudo_extension_keyword.trim().is_empty() {
        return Err(ConfigError::Validation(
            "pseudo-extension-keyword cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Extensions are written with their leading dot, e.g. ".png"
fn validate_extension(ext: &str) -> Result<(), ConfigError> {
    let Some(rest) = ext.strip_prefix('.') else {
        return Err(ConfigError::Validation(format!(
            "extension '{}' must start with '.'",
            ext
        )));
    };

    if rest.is_empty() || !rest.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(ConfigError::Validation(format!(
            "extension '{}' must be a dot followed by alphanumerics",
            ext
        )));
    }

    Ok(())
}
