use crate::sites::{adapter_for, SourceId};
use crate::ConfigError;
use serde::Deserialize;

/// Main configuration structure for JobHarvest
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub output: OutputConfig,
    #[serde(default)]
    pub summarizer: Option<SummarizerConfig>,
    /// Boards to crawl; every supported board with its defaults when empty
    #[serde(default, rename = "source")]
    pub sources: Vec<SourceEntry>,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Maximum number of detail pages fetched per source per run
    #[serde(rename = "request-budget")]
    pub request_budget: u32,

    /// Lower bound of the random pause before each detail fetch (milliseconds)
    #[serde(rename = "pacing-min-ms")]
    pub pacing_min_ms: u64,

    /// Upper bound of the random pause before each detail fetch (milliseconds)
    #[serde(rename = "pacing-max-ms")]
    pub pacing_max_ms: u64,

    /// Age after which a re-seen posting gets its scrape time refreshed
    #[serde(rename = "staleness-days", default = "default_staleness_days")]
    pub staleness_days: u32,

    #[serde(rename = "request-timeout-secs", default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_staleness_days() -> u32 {
    30
}

fn default_request_timeout_secs() -> u64 {
    30
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,
}

/// OpenAI-compatible chat-completions summarizer
#[derive(Debug, Clone, Deserialize)]
pub struct SummarizerConfig {
    #[serde(default = "default_summarizer_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_summarizer_model")]
    pub model: String,

    /// Environment variable holding the API key
    #[serde(rename = "api-key-env", default = "default_api_key_env")]
    pub api_key_env: String,

    #[serde(rename = "max-tokens", default = "default_max_tokens")]
    pub max_tokens: u32,
}

fn default_summarizer_endpoint() -> String {
    "https://api.openai.com/v1/chat/completions".to_string()
}

fn default_summarizer_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

fn default_max_tokens() -> u32 {
    1500
}

/// How pages of a source are retrieved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FetcherKind {
    /// Plain HTTP GET
    Http,
    /// Headless browser, for client-rendered pages
    Browser,
}

impl FetcherKind {
    /// Whether this build can construct the fetcher
    ///
    /// The browser fetcher needs the `browser` feature.
    pub fn is_available(&self) -> bool {
        match self {
            Self::Http => true,
            Self::Browser => cfg!(feature = "browser"),
        }
    }
}

/// One `[[source]]` entry
#[derive(Debug, Clone, Deserialize)]
pub struct SourceEntry {
    /// Board identifier, e.g. "nofluffjobs"
    pub id: String,

    /// Listing pages; the board's defaults when empty
    #[serde(default)]
    pub seeds: Vec<String>,

    /// Transport override; the board's default when absent
    #[serde(default)]
    pub fetcher: Option<FetcherKind>,

    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

/// A source entry with defaults filled in from its adapter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSource {
    pub id: SourceId,
    pub seeds: Vec<String>,
    pub fetcher: FetcherKind,
}

impl SourceEntry {
    pub fn source_id(&self) -> Result<SourceId, ConfigError> {
        self.id.parse()
    }

    pub fn resolve(&self) -> Result<ResolvedSource, ConfigError> {
        let id = self.source_id()?;
        let adapter = adapter_for(id);
        let seeds = if self.seeds.is_empty() {
            adapter.default_seeds().iter().map(|s| s.to_string()).collect()
        } else {
            self.seeds.clone()
        };

        Ok(ResolvedSource {
            id,
            seeds,
            fetcher: self.fetcher.unwrap_or_else(|| adapter.default_fetcher()),
        })
    }
}

impl Config {
    /// Enabled sources in configuration order
    ///
    /// With no `[[source]]` entries every supported board is crawled with its
    /// default seeds and fetcher, except boards whose fetcher this build
    /// cannot construct.
    pub fn resolved_sources(&self) -> Result<Vec<ResolvedSource>, ConfigError> {
        if self.sources.is_empty() {
            let mut resolved = Vec::new();
            for id in SourceId::all() {
                let source = SourceEntry {
                    id: id.as_str().to_string(),
                    seeds: Vec::new(),
                    fetcher: None,
                    enabled: true,
                }
                .resolve()?;

                if !source.fetcher.is_available() {
                    tracing::warn!(
                        source = %id,
                        "Skipping {}: it needs the browser fetcher, which this build lacks",
                        id.display_name()
                    );
                    continue;
                }
                resolved.push(source);
            }
            return Ok(resolved);
        }

        self.sources
            .iter()
            .filter(|entry| entry.enabled)
            .map(SourceEntry::resolve)
            .collect()
    }
}
