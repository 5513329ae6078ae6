//! Deterministic mock provider for CI, tests and keyless deployments.

use crate::provider::{Completion, LlmProvider};
use async_trait::async_trait;
use insight_core::EngineResult;

/// A provider returning a short synthetic reply derived from the first line
/// of the prompt. Token counts are nominal and cost is zero (the pricing
/// table has no entry for mock models).
#[derive(Debug, Clone, Default)]
pub struct MockProvider;

impl MockProvider {
    /// Create a mock provider.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl LlmProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn complete(
        &self,
        model: &str,
        prompt: &str,
        _max_output_tokens: u32,
        _temperature: f32,
    ) -> EngineResult<Completion> {
        let first_line: String = prompt
            .trim()
            .lines()
            .next()
            .unwrap_or("")
            .chars()
            .take(160)
            .collect();
        let text = format!("[mock:{model}] {first_line}");
        let tokens = ((prompt.len() / 4) as u64).max(32);

        Ok(Completion {
            text,
            input_tokens: Some(tokens),
            output_tokens: Some(0),
        })
    }
}
