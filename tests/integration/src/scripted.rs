//! Scripted test doubles: deterministic LLM stand-ins keyed on prompt
//! content, and a latency-injecting retrieval wrapper.

use async_trait::async_trait;
use insight_core::{Document, EngineError, EngineResult};
use insight_providers::{Completion, LlmProvider};
use insight_retrieval::{RetrievalClient, RetrievalRequest, StaticRetrievalClient};
use std::time::Duration;

/// A provider answering from prompt-substring rules, with optional per-model
/// failure injection and a fixed token count per call.
pub struct ScriptedProvider {
    /// Models that always fail (to exercise fallback chains).
    pub fail_models: Vec<String>,
    /// `(prompt substring, reply)` rules, first match wins.
    pub rules: Vec<(String, String)>,
    /// Reply when no rule matches.
    pub default_reply: String,
    /// Total tokens reported per call (split 70/30 input/output).
    pub tokens_per_call: u64,
}

impl Default for ScriptedProvider {
    fn default() -> Self {
        Self {
            fail_models: Vec::new(),
            rules: Vec::new(),
            default_reply: "Adoption is progressing steadily across sectors [1].".to_string(),
            tokens_per_call: 300,
        }
    }
}

impl ScriptedProvider {
    /// A provider scripted for the iterative happy path: the self-check
    /// reports sufficiency and the synthesis writes the final answer.
    #[must_use]
    pub fn happy_path() -> Self {
        Self {
            rules: vec![
                (
                    "Is the information sufficient".to_string(),
                    "SUFFICIENT: yes".to_string(),
                ),
                (
                    "Synthesize the results".to_string(),
                    "AI adoption is accelerating across enterprise sectors [1][2].".to_string(),
                ),
            ],
            ..Default::default()
        }
    }

    /// Builder: make the given model fail deterministically.
    #[must_use]
    pub fn with_failing_model(mut self, model: impl Into<String>) -> Self {
        self.fail_models.push(model.into());
        self
    }

    /// Builder: set the per-call token count.
    #[must_use]
    pub fn with_tokens_per_call(mut self, tokens: u64) -> Self {
        self.tokens_per_call = tokens;
        self
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(
        &self,
        model: &str,
        prompt: &str,
        _max_output_tokens: u32,
        _temperature: f32,
    ) -> EngineResult<Completion> {
        if self.fail_models.iter().any(|m| m == model) {
            return Err(EngineError::provider("scripted", format!("{model} is down")));
        }

        let text = self
            .rules
            .iter()
            .find(|(needle, _)| prompt.contains(needle.as_str()))
            .map_or(self.default_reply.clone(), |(_, reply)| reply.clone());

        let input_tokens = self.tokens_per_call * 7 / 10;
        Ok(Completion {
            text,
            input_tokens: Some(input_tokens),
            output_tokens: Some(self.tokens_per_call - input_tokens),
        })
    }
}

/// Retrieval wrapper that injects a fixed delay before answering, to drive
/// the time dimension of the budget ledger in degradation tests.
pub struct SlowRetrievalClient {
    inner: StaticRetrievalClient,
    delay: Duration,
}

impl SlowRetrievalClient {
    /// Create a delayed client over a fixed corpus.
    #[must_use]
    pub fn new(documents: Vec<Document>, delay: Duration) -> Self {
        Self {
            inner: StaticRetrievalClient::new(documents),
            delay,
        }
    }
}

#[async_trait]
impl RetrievalClient for SlowRetrievalClient {
    async fn retrieve(&self, request: RetrievalRequest) -> EngineResult<Vec<Document>> {
        tokio::time::sleep(self.delay).await;
        self.inner.retrieve(request).await
    }
}
