//! Provider registry: family → provider instance, built once at startup.

use crate::anthropic::{AnthropicConfig, AnthropicProvider};
use crate::google::{GoogleConfig, GoogleProvider};
use crate::mock::MockProvider;
use crate::openai::{OpenAiConfig, OpenAiProvider};
use crate::provider::{LlmProvider, ProviderFamily};
use insight_core::{EngineError, EngineResult};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

/// Environment variable forcing the deterministic mock provider.
pub const ROUTER_MODE_ENV: &str = "PHASE3_MODEL_ROUTER_MODE";

/// Registry of configured providers, keyed by family.
///
/// Absence of a provider is represented by omitting the implementation; when
/// no real provider is configured at all, the registry transparently serves
/// the mock provider for every family.
pub struct ProviderRegistry {
    providers: HashMap<ProviderFamily, Arc<dyn LlmProvider>>,
    mock: Arc<dyn LlmProvider>,
    mock_only: bool,
}

impl ProviderRegistry {
    /// Build an empty registry that serves only the mock provider.
    #[must_use]
    pub fn mock_only() -> Self {
        info!("model router running in mock mode");
        Self {
            providers: HashMap::new(),
            mock: Arc::new(MockProvider::new()),
            mock_only: true,
        }
    }

    /// Build a registry from provider API keys in the environment
    /// (`OPENAI_API_KEY`, `ANTHROPIC_API_KEY`, `GOOGLE_API_KEY`).
    ///
    /// The `PHASE3_MODEL_ROUTER_MODE=mock` override, or the absence of every
    /// key, yields a mock-only registry.
    #[must_use]
    pub fn from_env() -> Self {
        let mode = std::env::var(ROUTER_MODE_ENV)
            .unwrap_or_default()
            .to_ascii_lowercase();
        if mode == "mock" {
            return Self::mock_only();
        }

        let mut builder = Self::builder();
        if let Ok(key) = std::env::var("OPENAI_API_KEY") {
            if !key.is_empty() {
                builder = builder.with_openai(OpenAiConfig::new(key));
            }
        }
        if let Ok(key) = std::env::var("ANTHROPIC_API_KEY") {
            if !key.is_empty() {
                builder = builder.with_anthropic(AnthropicConfig::new(key));
            }
        }
        if let Ok(key) = std::env::var("GOOGLE_API_KEY") {
            if !key.is_empty() {
                builder = builder.with_google(GoogleConfig::new(key));
            }
        }
        builder.build()
    }

    /// Start building a registry from explicit configurations.
    #[must_use]
    pub fn builder() -> ProviderRegistryBuilder {
        ProviderRegistryBuilder::default()
    }

    /// Whether the registry serves only the mock provider.
    #[must_use]
    pub fn is_mock_only(&self) -> bool {
        self.mock_only
    }

    /// Resolve the provider for a model label.
    ///
    /// # Errors
    /// Fails when the label maps to no known family, or the family has no
    /// configured client (and the registry is not mock-only).
    pub fn provider_for(&self, model: &str) -> EngineResult<Arc<dyn LlmProvider>> {
        if self.mock_only {
            return Ok(Arc::clone(&self.mock));
        }

        let family = ProviderFamily::for_model(model).ok_or_else(|| {
            EngineError::provider("unknown", format!("Unknown model family: {model}"))
        })?;

        if family == ProviderFamily::Mock {
            return Ok(Arc::clone(&self.mock));
        }

        self.providers.get(&family).cloned().ok_or_else(|| {
            EngineError::provider(
                family.as_str(),
                format!("{} client not initialized", family.as_str()),
            )
        })
    }
}

/// Builder assembling a [`ProviderRegistry`] from explicit configurations.
#[derive(Default)]
pub struct ProviderRegistryBuilder {
    providers: HashMap<ProviderFamily, Arc<dyn LlmProvider>>,
}

impl ProviderRegistryBuilder {
    /// Register a GPT-family provider.
    #[must_use]
    pub fn with_openai(mut self, config: OpenAiConfig) -> Self {
        match OpenAiProvider::new(config) {
            Ok(provider) => {
                info!("openai client initialized");
                self.providers
                    .insert(ProviderFamily::OpenAi, Arc::new(provider));
            }
            Err(e) => warn!("failed to initialize openai client: {e}"),
        }
        self
    }

    /// Register a Claude-family provider.
    #[must_use]
    pub fn with_anthropic(mut self, config: AnthropicConfig) -> Self {
        match AnthropicProvider::new(config) {
            Ok(provider) => {
                info!("anthropic client initialized");
                self.providers
                    .insert(ProviderFamily::Anthropic, Arc::new(provider));
            }
            Err(e) => warn!("failed to initialize anthropic client: {e}"),
        }
        self
    }

    /// Register a Gemini-family provider.
    #[must_use]
    pub fn with_google(mut self, config: GoogleConfig) -> Self {
        match GoogleProvider::new(config) {
            Ok(provider) => {
                info!("google client initialized");
                self.providers
                    .insert(ProviderFamily::Google, Arc::new(provider));
            }
            Err(e) => warn!("failed to initialize google client: {e}"),
        }
        self
    }

    /// Register a custom provider under a family (used by tests to script
    /// replies without HTTP).
    #[must_use]
    pub fn with_provider(
        mut self,
        family: ProviderFamily,
        provider: Arc<dyn LlmProvider>,
    ) -> Self {
        self.providers.insert(family, provider);
        self
    }

    /// Finish building. When no provider is configured the registry falls
    /// back to mock-only mode.
    #[must_use]
    pub fn build(self) -> ProviderRegistry {
        if self.providers.is_empty() {
            warn!("no LLM clients configured; falling back to mock provider");
            return ProviderRegistry::mock_only();
        }
        ProviderRegistry {
            providers: self.providers,
            mock: Arc::new(MockProvider::new()),
            mock_only: false,
        }
    }
}
