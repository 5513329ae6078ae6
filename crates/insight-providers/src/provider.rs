//! The provider abstraction shared by every LLM backend.

use async_trait::async_trait;
use insight_core::EngineResult;

/// Which provider family serves a model label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderFamily {
    /// GPT-family models (`gpt-*`).
    OpenAi,
    /// Claude-family models (`claude-*`).
    Anthropic,
    /// Gemini-family models (`gemini-*`).
    Google,
    /// The deterministic mock provider.
    Mock,
}

impl ProviderFamily {
    /// Resolve the family for a model label by prefix.
    #[must_use]
    pub fn for_model(model: &str) -> Option<Self> {
        if model.starts_with("gpt") {
            Some(Self::OpenAi)
        } else if model.starts_with("claude") {
            Some(Self::Anthropic)
        } else if model.starts_with("gemini") {
            Some(Self::Google)
        } else if model.starts_with("mock") {
            Some(Self::Mock)
        } else {
            None
        }
    }

    /// Human-readable family name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Anthropic => "anthropic",
            Self::Google => "google",
            Self::Mock => "mock",
        }
    }
}

/// A completed LLM call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    /// Generated text.
    pub text: String,
    /// Input token count, when the provider reports one.
    pub input_tokens: Option<u64>,
    /// Output token count, when the provider reports one.
    pub output_tokens: Option<u64>,
}

impl Completion {
    /// Total tokens: the reported sum when both counts are present, or a
    /// character-based estimate (1 token ≈ 4 characters) otherwise.
    #[must_use]
    pub fn total_tokens(&self, prompt: &str) -> u64 {
        match (self.input_tokens, self.output_tokens) {
            (Some(input), Some(output)) => input + output,
            _ => ((prompt.len() + self.text.len()) / 4) as u64,
        }
    }

    /// Whether the provider reported a separate input/output split.
    #[must_use]
    pub fn has_token_split(&self) -> bool {
        self.input_tokens.is_some() && self.output_tokens.is_some()
    }
}

/// A chat-completion-like LLM backend.
///
/// Implementations must permit concurrent calls; the router treats each
/// provider as a thread-safe singleton.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Provider family name, used in logs and error messages.
    fn name(&self) -> &str;

    /// Run one completion against the given upstream model id.
    async fn complete(
        &self,
        model: &str,
        prompt: &str,
        max_output_tokens: u32,
        temperature: f32,
    ) -> EngineResult<Completion>;
}
