//! Description summaries
//!
//! Summaries are a best-effort enrichment: a failed call leaves the posting's
//! summary empty and never blocks persistence.

use crate::config::SummarizerConfig;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

const SYSTEM_PROMPT: &str = "\
Create a concise job summary of at most 200 words.
Start with a short overview paragraph (2-3 sentences) of the core responsibilities.
Then add two HTML sections:
<strong>Necessary skills:</strong> followed by a <ul> list of at most 6 required skills,
<strong>Nice-to-have skills:</strong> followed by a <ul> list of at most 4 preferred skills.
Wrap technical skills in <strong> tags and keep each point brief.
Leave out salary, location, company, benefits and perks.
Answer in the language of the input when it is English or Polish, otherwise in English.";

const TEMPERATURE: f32 = 0.7;

/// Summarizer errors
#[derive(Debug, Error)]
pub enum SummaryError {
    #[error("Summarizer configuration error: {0}")]
    Config(String),

    #[error("Summarizer request failed: {0}")]
    Network(String),

    #[error("Summarizer API error: {0}")]
    Api(String),

    #[error("Invalid summarizer response: {0}")]
    Parse(String),
}

pub type SummaryResult<T> = Result<T, SummaryError>;

/// Produces a short summary of a posting description
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, description: &str) -> SummaryResult<String>;
}

/// Summarizer used when none is configured; always returns an empty summary
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSummarizer;

#[async_trait]
impl Summarizer for NoopSummarizer {
    async fn summarize(&self, _description: &str) -> SummaryResult<String> {
        Ok(String::new())
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Client for an OpenAI-compatible chat-completions endpoint
pub struct OpenAiSummarizer {
    http_client: Client,
    endpoint: String,
    model: String,
    api_key: String,
    max_tokens: u32,
}

impl OpenAiSummarizer {
    pub fn new(config: &SummarizerConfig, api_key: impl Into<String>, timeout: Duration) -> Self {
        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            http_client,
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            api_key: api_key.into(),
            max_tokens: config.max_tokens,
        }
    }

    /// Reads the API key from the environment variable named in the config
    pub fn from_env(config: &SummarizerConfig, timeout: Duration) -> SummaryResult<Self> {
        let api_key = std::env::var(&config.api_key_env)
            .map_err(|_| SummaryError::Config(format!("{} not set", config.api_key_env)))?;
        Ok(Self::new(config, api_key, timeout))
    }
}

#[async_trait]
impl Summarizer for OpenAiSummarizer {
    async fn summarize(&self, description: &str) -> SummaryResult<String> {
        let start = std::time::Instant::now();
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                Message {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                Message {
                    role: "user",
                    content: description,
                },
            ],
            max_tokens: self.max_tokens,
            temperature: TEMPERATURE,
        };

        let response = self
            .http_client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| SummaryError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SummaryError::Api(format!("HTTP {}: {}", status, body)));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| SummaryError::Parse(e.to_string()))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| SummaryError::Parse("no choices in response".to_string()))?;

        tracing::debug!(
            model = %self.model,
            duration_ms = start.elapsed().as_millis() as u64,
            "Summary generated"
        );

        Ok(content.trim().to_string())
    }
}

/// Builds the configured summarizer
///
/// Falls back to [`NoopSummarizer`] when no summarizer is configured or its
/// API key is missing.
pub fn build_summarizer(config: Option<&SummarizerConfig>, timeout: Duration) -> Arc<dyn Summarizer> {
    let Some(config) = config else {
        return Arc::new(NoopSummarizer);
    };

    match OpenAiSummarizer::from_env(config, timeout) {
        Ok(summarizer) => Arc::new(summarizer),
        Err(e) => {
            tracing::warn!("Summaries disabled: {}", e);
            Arc::new(NoopSummarizer)
        }
    }
}

/// Summarizes a description, yielding an empty string on any failure
pub async fn summarize_or_empty(summarizer: &dyn Summarizer, description: &str) -> String {
    if description.trim().is_empty() {
        return String::new();
    }

    match summarizer.summarize(description).await {
        Ok(summary) => summary,
        Err(e) => {
            tracing::warn!("Summary failed: {}", e);
            String::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(endpoint: String) -> SummarizerConfig {
        SummarizerConfig {
            endpoint,
            model: "gpt-4o-mini".to_string(),
            api_key_env: "JOBHARVEST_TEST_KEY_UNSET".to_string(),
            max_tokens: 200,
        }
    }

    #[tokio::test]
    async fn test_openai_summarizer_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": {"role": "assistant", "content": "  <p>Builds APIs</p>\n"}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let summarizer = OpenAiSummarizer::new(
            &config(format!("{}/v1/chat/completions", server.uri())),
            "test-key",
            Duration::from_secs(5),
        );

        let summary = summarizer.summarize("We build APIs in Rust").await.unwrap();
        assert_eq!(summary, "<p>Builds APIs</p>");
    }

    #[tokio::test]
    async fn test_api_error_yields_empty_summary() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_string("rate limited"))
            .mount(&server)
            .await;

        let summarizer = OpenAiSummarizer::new(
            &config(format!("{}/v1/chat/completions", server.uri())),
            "test-key",
            Duration::from_secs(5),
        );

        assert!(matches!(
            summarizer.summarize("text").await,
            Err(SummaryError::Api(_))
        ));
        assert_eq!(summarize_or_empty(&summarizer, "text").await, "");
    }

    #[tokio::test]
    async fn test_empty_description_skips_call() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let summarizer = OpenAiSummarizer::new(
            &config(format!("{}/v1/chat/completions", server.uri())),
            "test-key",
            Duration::from_secs(5),
        );

        assert_eq!(summarize_or_empty(&summarizer, "   ").await, "");
    }

    #[tokio::test]
    async fn test_missing_key_falls_back_to_noop() {
        let summarizer = build_summarizer(
            Some(&config("https://api.openai.com/v1/chat/completions".to_string())),
            Duration::from_secs(5),
        );
        assert_eq!(summarizer.summarize("anything").await.unwrap(), "");
    }

    #[tokio::test]
    async fn test_noop_summarizer() {
        assert_eq!(NoopSummarizer.summarize("text").await.unwrap(), "");
    }
}
