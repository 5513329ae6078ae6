//! The model router: fallback chains, per-call timeouts, cost accounting.

use crate::context::build_context;
use crate::cost::PricingTable;
use insight_core::{Document, EngineError, EngineResult};
use insight_providers::ProviderRegistry;
use insight_telemetry::record_model_router_call;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Options for a single routed call.
#[derive(Debug, Clone, Copy)]
pub struct CallOptions {
    /// Per-attempt timeout.
    pub timeout: Duration,
    /// Maximum output tokens.
    pub max_output_tokens: u32,
    /// Sampling temperature.
    pub temperature: f32,
}

impl Default for CallOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(15),
            max_output_tokens: 2000,
            temperature: 0.7,
        }
    }
}

impl CallOptions {
    /// Builder: set the per-attempt timeout in seconds.
    #[must_use]
    pub fn with_timeout_s(mut self, seconds: u64) -> Self {
        self.timeout = Duration::from_secs(seconds);
        self
    }

    /// Builder: set the output token cap.
    #[must_use]
    pub fn with_max_output_tokens(mut self, tokens: u32) -> Self {
        self.max_output_tokens = tokens;
        self
    }

    /// Builder: set the sampling temperature.
    #[must_use]
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }
}

/// The successful content of a routed call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelReply {
    /// Generated text.
    pub content: String,
    /// Label of the model that answered.
    pub model: String,
}

/// Usage metadata for a routed call.
#[derive(Debug, Clone, PartialEq)]
pub struct CallUsage {
    /// Total tokens consumed.
    pub tokens_used: u64,
    /// Cost in cents.
    pub cost_cents: f64,
    /// Wall-clock latency in milliseconds.
    pub latency_ms: u64,
    /// Whether a fallback model (not the primary) answered.
    pub fallback_used: bool,
}

impl CallUsage {
    /// Latency in seconds, for budget recording.
    #[must_use]
    pub fn latency_s(&self) -> f64 {
        self.latency_ms as f64 / 1000.0
    }
}

/// Routes calls to LLM providers with automatic fallback handling.
///
/// Holds no per-call mutable state; a single instance serves concurrent
/// callers. Budget recording happens at the call site, not here.
pub struct ModelRouter {
    registry: Arc<ProviderRegistry>,
    pricing: PricingTable,
}

impl ModelRouter {
    /// Create a router over a provider registry with the default pricing.
    #[must_use]
    pub fn new(registry: Arc<ProviderRegistry>) -> Self {
        Self {
            registry,
            pricing: PricingTable::default(),
        }
    }

    /// Builder: replace the pricing table.
    #[must_use]
    pub fn with_pricing(mut self, pricing: PricingTable) -> Self {
        self.pricing = pricing;
        self
    }

    /// Whether the router is serving the deterministic mock provider.
    #[must_use]
    pub fn is_mock(&self) -> bool {
        self.registry.is_mock_only()
    }

    /// Call the primary model, falling back through `fallback` in order.
    ///
    /// Each attempt is cancelled after `opts.timeout`; timeouts and provider
    /// errors advance the chain. When the chain is exhausted the call fails
    /// with MODEL_UNAVAILABLE carrying the last error and the attempted list.
    pub async fn call_with_fallback(
        &self,
        prompt: &str,
        docs: &[Document],
        primary: &str,
        fallback: &[String],
        opts: CallOptions,
    ) -> EngineResult<(ModelReply, CallUsage)> {
        let mut models_to_try = Vec::with_capacity(1 + fallback.len());
        models_to_try.push(primary.to_string());
        models_to_try.extend(fallback.iter().cloned());

        let context = build_context(docs);
        let full_prompt = format!("{prompt}\n\nContext:\n{context}");

        let mut last_error = String::from("no models configured");

        for model in &models_to_try {
            info!(model, timeout_s = opts.timeout.as_secs(), "trying model");
            let started = Instant::now();

            let provider = match self.registry.provider_for(model) {
                Ok(provider) => provider,
                Err(e) => {
                    warn!(model, error = %e, "provider unavailable");
                    last_error = e.to_string();
                    continue;
                }
            };

            let attempt = tokio::time::timeout(
                opts.timeout,
                provider.complete(model, &full_prompt, opts.max_output_tokens, opts.temperature),
            )
            .await;

            match attempt {
                Err(_) => {
                    warn!(model, timeout_s = opts.timeout.as_secs(), "model timed out");
                    last_error = EngineError::Timeout {
                        model: model.clone(),
                        seconds: opts.timeout.as_secs(),
                    }
                    .to_string();
                }
                Ok(Err(e)) => {
                    warn!(model, error = %e, "model failed");
                    last_error = e.to_string();
                }
                Ok(Ok(completion)) => {
                    let latency_ms = started.elapsed().as_millis() as u64;
                    let tokens_used = completion.total_tokens(&full_prompt);

                    // Providers reporting both directions are billed as-is;
                    // otherwise the total is split 70/30 for estimation.
                    let cost_cents = if completion.has_token_split() {
                        self.pricing.cost_cents(
                            model,
                            completion.input_tokens.unwrap_or(0),
                            completion.output_tokens.unwrap_or(0),
                        )
                    } else {
                        self.pricing.cost_cents_estimated(model, tokens_used)
                    };

                    let fallback_used = model != primary;
                    record_model_router_call(model, fallback_used, latency_ms as f64, cost_cents);

                    info!(
                        model,
                        tokens = tokens_used,
                        cost_cents = format!("{cost_cents:.3}"),
                        latency_ms,
                        fallback_used,
                        "model call succeeded"
                    );

                    return Ok((
                        ModelReply {
                            content: completion.text,
                            model: model.clone(),
                        },
                        CallUsage {
                            tokens_used,
                            cost_cents,
                            latency_ms,
                            fallback_used,
                        },
                    ));
                }
            }
        }

        Err(EngineError::ModelUnavailable {
            last_error,
            attempted: models_to_try,
        })
    }
}
