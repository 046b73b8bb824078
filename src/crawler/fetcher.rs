//! Page fetchers
//!
//! This module handles retrieving listing and detail pages:
//! - Building HTTP clients with proper user agent strings
//! - Plain HTTP GET fetching with error classification
//! - Headless-browser rendering for client-rendered boards (feature `browser`)
//!
//! Both transports sit behind the [`Fetcher`] trait so the orchestrator never
//! knows which one a source uses.

use crate::config::{FetcherKind, UserAgentConfig};
use async_trait::async_trait;
use reqwest::{redirect::Policy, Client};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Errors from a single page retrieval
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Request to {url} timed out")]
    Timeout { url: String },

    #[error("HTTP {status} from {url}")]
    Status { url: String, status: u16 },

    #[error("Network error for {url}: {message}")]
    Network { url: String, message: String },

    #[error("Browser error for {url}: {message}")]
    Browser { url: String, message: String },

    #[error("Fetcher unavailable: {0}")]
    Unavailable(String),
}

/// Result type for fetch operations
pub type FetchResult<T> = Result<T, FetchError>;

/// Retrieves one page as markup
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetches `url` and returns its HTML
    ///
    /// `wait_for` names an element a rendering fetcher waits for before
    /// capturing the page; plain HTTP ignores it.
    async fn fetch(&self, url: &Url, wait_for: Option<&str>) -> FetchResult<String>;
}

/// Builds an HTTP client with proper configuration
///
/// The user agent reads `CrawlerName/Version (+ContactURL; ContactEmail)`.
///
/// # Example
///
/// ```no_run
/// use jobharvest::config::UserAgentConfig;
/// use jobharvest::crawler::build_http_client;
/// use std::time::Duration;
///
/// let config = UserAgentConfig {
///     crawler_name: "JobHarvest".to_string(),
///     crawler_version: "1.0".to_string(),
///     contact_url: "https://example.com/about".to_string(),
///     contact_email: "admin@example.com".to_string(),
/// };
///
/// let client = build_http_client(&config, Duration::from_secs(30)).unwrap();
/// ```
pub fn build_http_client(
    config: &UserAgentConfig,
    timeout: Duration,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent_string(config))
        .timeout(timeout)
        .connect_timeout(Duration::from_secs(10))
        .redirect(Policy::limited(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Formats the crawler's user agent
pub fn user_agent_string(config: &UserAgentConfig) -> String {
    format!(
        "{}/{} (+{}; {})",
        config.crawler_name, config.crawler_version, config.contact_url, config.contact_email
    )
}

/// Plain HTTP GET fetcher
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &Url, _wait_for: Option<&str>) -> FetchResult<String> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| classify_reqwest_error(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response
            .text()
            .await
            .map_err(|e| classify_reqwest_error(url, e))
    }
}

fn classify_reqwest_error(url: &Url, error: reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
        }
    } else if error.is_connect() {
        FetchError::Network {
            url: url.to_string(),
            message: "Connection refused".to_string(),
        }
    } else {
        FetchError::Network {
            url: url.to_string(),
            message: error.to_string(),
        }
    }
}

#[cfg(feature = "browser")]
pub use browser::BrowserFetcher;

#[cfg(feature = "browser")]
mod browser {
    use super::{FetchError, FetchResult, Fetcher};
    use async_trait::async_trait;
    use headless_chrome::{Browser, LaunchOptions};
    use std::time::Duration;
    use url::Url;

    /// Headless Chrome fetcher
    ///
    /// Every fetch launches its own browser on the blocking pool and returns
    /// the rendered DOM.
    pub struct BrowserFetcher {
        timeout: Duration,
    }

    impl BrowserFetcher {
        pub fn new(timeout: Duration) -> Self {
            Self { timeout }
        }
    }

    #[async_trait]
    impl Fetcher for BrowserFetcher {
        async fn fetch(&self, url: &Url, wait_for: Option<&str>) -> FetchResult<String> {
            let target = url.to_string();
            let wait_for = wait_for.map(str::to_string);
            let timeout = self.timeout;

            let rendered = tokio::task::spawn_blocking(move || {
                render_page(&target, wait_for.as_deref(), timeout)
            })
            .await
            .map_err(|e| FetchError::Browser {
                url: url.to_string(),
                message: e.to_string(),
            })?;

            rendered.map_err(|e| FetchError::Browser {
                url: url.to_string(),
                message: e.to_string(),
            })
        }
    }

    fn render_page(url: &str, wait_for: Option<&str>, timeout: Duration) -> anyhow::Result<String> {
        let options = LaunchOptions::default_builder()
            .headless(true)
            .idle_browser_timeout(timeout * 2)
            .build()
            .map_err(|e| anyhow::anyhow!(e.to_string()))?;

        let browser = Browser::new(options)?;
        let tab = browser.new_tab()?;
        tab.set_default_timeout(timeout);
        tab.navigate_to(url)?;
        tab.wait_until_navigated()?;

        if let Some(css) = wait_for {
            if let Err(e) = tab.wait_for_element(css) {
                tracing::debug!("Element {} never appeared on {}: {}", css, url, e);
            }
        }

        tab.get_content()
    }
}

/// Builds the fetcher for a source's transport
///
/// Fails for [`FetcherKind::Browser`] when the crate is built without the
/// `browser` feature.
pub fn build_fetcher(
    kind: FetcherKind,
    user_agent: &UserAgentConfig,
    timeout: Duration,
) -> Result<Arc<dyn Fetcher>, crate::HarvestError> {
    match kind {
        FetcherKind::Http => Ok(Arc::new(HttpFetcher::new(build_http_client(
            user_agent, timeout,
        )?))),
        #[cfg(feature = "browser")]
        FetcherKind::Browser => Ok(Arc::new(BrowserFetcher::new(timeout))),
        #[cfg(not(feature = "browser"))]
        FetcherKind::Browser => Err(FetchError::Unavailable(
            "browser fetching requires the `browser` feature".to_string(),
        )
        .into()),
    }
}
