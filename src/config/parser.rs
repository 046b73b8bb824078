use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Loads and parses a configuration file from the given path
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&content)?;
    validate(&config)?;
    Ok(config)
}

/// Computes a SHA-256 hash of the configuration file content
///
/// Stored with every run so runs can be traced to the settings they used.
///
/// # Returns
///
/// * `Ok(String)` - Hex-encoded SHA-256 hash of the file content
/// * `Err(ConfigError)` - Failed to read the file
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read(path)?;
    let mut hasher = Sha256::new();
    hasher.update(&content);
    Ok(hex::encode(hasher.finalize()))
}

/// Loads a configuration and returns both the config and its hash
pub fn load_config_with_hash(path: &Path) -> Result<(Config, String), ConfigError> {
    let config = load_config(path)?;
    let hash = compute_config_hash(path)?;
    Ok((config, hash))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FetcherKind;
    use crate::sites::SourceId;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const BASE: &str = r#"
[crawler]
request-budget = 25
pacing-min-ms = 2000
pacing-max-ms = 5000

[user-agent]
crawler-name = "JobHarvest"
crawler-version = "1.0"
contact-url = "https://example.com/about"
contact-email = "admin@example.com"

[output]
database-path = "./jobs.db"
"#;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_load_minimal_config_uses_defaults() {
        let file = create_temp_config(BASE);
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.crawler.request_budget, 25);
        assert_eq!(config.crawler.staleness_days, 30);
        assert_eq!(config.crawler.request_timeout_secs, 30);
        assert!(config.summarizer.is_none());

        let sources = config.resolved_sources().unwrap();
        let justjoin = sources.iter().find(|s| s.id == SourceId::JustJoinIt);
        if cfg!(feature = "browser") {
            assert_eq!(sources.len(), SourceId::all().len());
            assert_eq!(justjoin.unwrap().fetcher, FetcherKind::Browser);
        } else {
            // Client-rendered boards are left out of the defaults
            assert_eq!(sources.len(), SourceId::all().len() - 1);
            assert!(justjoin.is_none());
            assert!(sources.iter().all(|s| s.fetcher == FetcherKind::Http));
        }
    }

    #[test]
    fn test_load_config_with_sources() {
        let content = format!(
            r#"{}
[summarizer]
model = "gpt-4o-mini"

[[source]]
id = "nofluffjobs"
seeds = ["https://nofluffjobs.com/pl/Rust"]

[[source]]
id = "pracuj"
enabled = false

[[source]]
id = "justjoinit"
fetcher = "http"
"#,
            BASE
        );
        let file = create_temp_config(&content);
        let config = load_config(file.path()).unwrap();

        let summarizer = config.summarizer.as_ref().unwrap();
        assert_eq!(summarizer.api_key_env, "OPENAI_API_KEY");
        assert_eq!(summarizer.max_tokens, 1500);

        let sources = config.resolved_sources().unwrap();
        assert_eq!(sources.len(), 2);
        assert_eq!(sources[0].id, SourceId::NoFluffJobs);
        assert_eq!(sources[0].seeds, vec!["https://nofluffjobs.com/pl/Rust"]);
        assert_eq!(sources[1].id, SourceId::JustJoinIt);
        assert_eq!(sources[1].fetcher, FetcherKind::Http);
        assert_eq!(sources[1].seeds.len(), 1);
    }

    #[test]
    fn test_load_config_with_invalid_path() {
        let result = load_config(Path::new("/nonexistent/config.toml"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_load_config_with_invalid_toml() {
        let file = create_temp_config("this is not valid TOML {{{");
        let result = load_config(file.path());
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_load_config_with_validation_error() {
        let content = BASE.replace("request-budget = 25", "request-budget = 0");
        let file = create_temp_config(&content);
        let result = load_config(file.path());
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_unknown_source_rejected() {
        let content = format!("{}\n[[source]]\nid = \"monster\"\n", BASE);
        let file = create_temp_config(&content);
        let result = load_config(file.path());
        assert!(matches!(result, Err(ConfigError::UnknownSource(_))));
    }

    #[test]
    fn test_compute_config_hash() {
        let file = create_temp_config("test content");

        let hash1 = compute_config_hash(file.path()).unwrap();
        let hash2 = compute_config_hash(file.path()).unwrap();

        assert_eq!(hash1, hash2);
        assert_eq!(hash1.len(), 64);
    }

    #[test]
    fn test_different_content_different_hash() {
        let file1 = create_temp_config("content 1");
        let file2 = create_temp_config("content 2");

        let hash1 = compute_config_hash(file1.path()).unwrap();
        let hash2 = compute_config_hash(file2.path()).unwrap();

        assert_ne!(hash1, hash2);
    }

    #[test]
    fn test_load_config_with_hash() {
        let file = create_temp_config(BASE);
        let (config, hash) = load_config_with_hash(file.path()).unwrap();
        assert_eq!(config.output.database_path, "./jobs.db");
        assert_eq!(hash, compute_config_hash(file.path()).unwrap());
    }
}
