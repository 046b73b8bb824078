use crate::config::types::{
    Config, CrawlerConfig, OutputConfig, SourceEntry, SummarizerConfig, UserAgentConfig,
};
use crate::sites::{adapter_for, is_board_url};
use crate::ConfigError;
use std::collections::HashSet;
use url::Url;

/// Upper bound of the pause between detail fetches
const MAX_PACING_MS: u64 = 600_000;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_output_config(&config.output)?;
    if let Some(summarizer) = &config.summarizer {
        validate_summarizer_config(summarizer)?;
    }
    validate_sources(&config.sources)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.request_budget < 1 || config.request_budget > 10_000 {
        return Err(ConfigError::Validation(format!(
            "request_budget must be between 1 and 10000, got {}",
            config.request_budget
        )));
    }

    if config.pacing_min_ms > config.pacing_max_ms {
        return Err(ConfigError::Validation(format!(
            "pacing_min_ms ({}) must not exceed pacing_max_ms ({})",
            config.pacing_min_ms, config.pacing_max_ms
        )));
    }

    if config.pacing_max_ms > MAX_PACING_MS {
        return Err(ConfigError::Validation(format!(
            "pacing_max_ms must be <= {}ms, got {}ms",
            MAX_PACING_MS, config.pacing_max_ms
        )));
    }

    if config.staleness_days < 1 {
        return Err(ConfigError::Validation(
            "staleness_days must be >= 1".to_string(),
        ));
    }

    if config.request_timeout_secs < 1 || config.request_timeout_secs > 300 {
        return Err(ConfigError::Validation(format!(
            "request_timeout_secs must be between 1 and 300, got {}",
            config.request_timeout_secs
        )));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
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

    if config.crawler_version.trim().is_empty() {
        return Err(ConfigError::Validation(
            "crawler_version cannot be empty".to_string(),
        ));
    }

    Url::parse(&config.contact_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;

    validate_email(&config.contact_email)?;

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database_path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

fn validate_summarizer_config(config: &SummarizerConfig) -> Result<(), ConfigError> {
    validate_http_url(&config.endpoint, "summarizer endpoint")?;

    if config.model.trim().is_empty() {
        return Err(ConfigError::Validation(
            "summarizer model cannot be empty".to_string(),
        ));
    }

    if config.api_key_env.trim().is_empty() {
        return Err(ConfigError::Validation(
            "summarizer api_key_env cannot be empty".to_string(),
        ));
    }

    if config.max_tokens < 1 || config.max_tokens > 16_000 {
        return Err(ConfigError::Validation(format!(
            "summarizer max_tokens must be between 1 and 16000, got {}",
            config.max_tokens
        )));
    }

    Ok(())
}

/// Validates source entries: known identifiers, no repeats, usable seeds and
/// a fetcher this build provides
fn validate_sources(sources: &[SourceEntry]) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();

    for entry in sources {
        let id = entry.source_id()?;
        if !seen.insert(id) {
            return Err(ConfigError::Validation(format!(
                "Source '{}' is configured more than once",
                id
            )));
        }

        let adapter = adapter_for(id);
        for seed in &entry.seeds {
            validate_http_url(seed, "seed URL")?;
            if let Ok(url) = Url::parse(seed) {
                if !is_board_url(adapter.as_ref(), &url) {
                    tracing::warn!(
                        source = %id,
                        "Seed {} is not on {} ({})",
                        seed,
                        id.display_name(),
                        adapter.base_url()
                    );
                }
            }
        }

        if entry.enabled && !entry.resolve()?.fetcher.is_available() {
            return Err(ConfigError::Validation(format!(
                "Source '{}' needs the browser fetcher; build with --features browser \
                 or set fetcher = \"http\"",
                id
            )));
        }
    }

    Ok(())
}

/// Accepts absolute http(s) URLs with a host
fn validate_http_url(raw: &str, what: &str) -> Result<(), ConfigError> {
    let url = Url::parse(raw)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid {} '{}': {}", what, raw, e)))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::Validation(format!(
            "{} '{}' must use http or https",
            what, raw
        )));
    }

    if url.host_str().is_none() {
        return Err(ConfigError::InvalidUrl(format!(
            "{} '{}' has no host",
            what, raw
        )));
    }

    Ok(())
}

/// Basic email validation
fn validate_email(email: &str) -> Result<(), ConfigError> {
    if email.is_empty() {
        return Err(ConfigError::Validation(
            "contact_email cannot be empty".to_string(),
        ));
    }

    let Some((local, domain)) = email.split_once('@') else {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    };

    if local.is_empty() || domain.is_empty() || domain.contains('@') {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    }

    if !domain.contains('.') {
        return Err(ConfigError::Validation(format!(
            "Invalid email domain: '{}'",
            email
        )));
    }

    Ok(())
}
