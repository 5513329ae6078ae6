//! Gemini-family provider speaking the generateContent wire format.
//!
//! Gemini replies carry no usage block on every code path, so the router
//! falls back to character-based token estimation for this family.

use crate::provider::{Completion, LlmProvider};
use async_trait::async_trait;
use insight_core::{EngineError, EngineResult};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Gemini-family provider configuration.
#[derive(Debug, Clone)]
pub struct GoogleConfig {
    /// API key.
    pub api_key: SecretString,
    /// API base URL, overridable for proxies and tests.
    pub base_url: String,
    /// Socket-level HTTP timeout.
    pub timeout: Duration,
}

impl GoogleConfig {
    /// Create a configuration with the default endpoint.
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: SecretString::new(api_key.into()),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(120),
        }
    }

    /// Builder: override the base URL.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Builder: override the HTTP timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct GenerationConfig {
    #[serde(rename = "maxOutputTokens")]
    max_output_tokens: u32,
    temperature: f32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Deserialize)]
struct CandidateContent {
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

/// Gemini-family provider.
pub struct GoogleProvider {
    config: GoogleConfig,
    client: Client,
}

impl GoogleProvider {
    /// Create a provider.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(config: GoogleConfig) -> EngineResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| EngineError::internal(format!("Failed to create HTTP client: {e}")))?;
        Ok(Self { config, client })
    }
}

#[async_trait]
impl LlmProvider for GoogleProvider {
    fn name(&self) -> &str {
        "google"
    }

    async fn complete(
        &self,
        model: &str,
        prompt: &str,
        max_output_tokens: u32,
        temperature: f32,
    ) -> EngineResult<Completion> {
        let body = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
            generation_config: GenerationConfig {
                max_output_tokens,
                temperature,
            },
        };

        debug!(model, "calling google generateContent");
        let response = self
            .client
            .post(format!(
                "{}/models/{}:generateContent?key={}",
                self.config.base_url,
                model,
                self.config.api_key.expose_secret()
            ))
            .json(&body)
            .send()
            .await
            .map_err(|e| EngineError::provider("google", e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(EngineError::provider(
                "google",
                format!("HTTP {status}: {text}"),
            ));
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| EngineError::parse(format!("google response: {e}")))?;

        let text = parsed
            .candidates
            .first()
            .and_then(|c| c.content.parts.first())
            .and_then(|p| p.text.clone())
            .ok_or_else(|| EngineError::parse("google response had no candidates"))?;

        Ok(Completion {
            text,
            input_tokens: None,
            output_tokens: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path_regex};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_successful_completion_estimates_tokens() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path_regex(r"^/models/gemini.*:generateContent$"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{"content": {"parts": [{"text": "Summary ready."}]}}]
            })))
            .mount(&server)
            .await;

        let provider = GoogleProvider::new(
            GoogleConfig::new("test-key").with_base_url(server.uri()),
        )
        .unwrap();

        let completion = provider
            .complete("gemini-2.5-pro", "hello there", 100, 0.7)
            .await
            .unwrap();
        assert_eq!(completion.text, "Summary ready.");
        assert!(!completion.has_token_split());
        assert!(completion.total_tokens("hello there") > 0);
    }
}
