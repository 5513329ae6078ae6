//! Shared fixtures: document corpora and engine assembly helpers.

use insight_config::{BudgetConfig, EngineConfig};
use insight_core::Document;
use insight_orchestrator::{EngineBuilder, Orchestrator};
use insight_providers::{LlmProvider, ProviderFamily, ProviderRegistry};
use insight_retrieval::StaticRetrievalClient;
use std::sync::Arc;

/// Three whitelisted documents about AI adoption (ids `d1`, `d2`, `d3`).
#[must_use]
pub fn ai_corpus() -> Vec<Document> {
    vec![
        Document::new("AI adoption accelerates", "2025-06-01")
            .with_article_id("d1")
            .with_url("https://reuters.com/d1")
            .with_snippet("Enterprise AI adoption grew 40% year over year")
            .with_score(0.9),
        Document::new("AI chips in demand", "2025-06-03")
            .with_article_id("d2")
            .with_url("https://bloomberg.com/d2")
            .with_snippet("AI chip makers report strong demand and record orders")
            .with_score(0.8),
        Document::new("AI policy debate intensifies", "2025-06-05")
            .with_article_id("d3")
            .with_url("https://bbc.com/d3")
            .with_snippet("Regulators weigh new AI rules after industry growth")
            .with_score(0.7),
    ]
}

/// Budget caps used by the happy-path scenarios.
#[must_use]
pub fn default_budget() -> BudgetConfig {
    BudgetConfig {
        max_tokens: 8000,
        budget_cents: 50.0,
        timeout_s: 30.0,
    }
}

/// Wire an engine over a static corpus, with the same provider serving the
/// GPT and Claude families.
#[must_use]
pub fn engine_with(provider: Arc<dyn LlmProvider>, docs: Vec<Document>) -> Orchestrator {
    let registry = ProviderRegistry::builder()
        .with_provider(ProviderFamily::OpenAi, Arc::clone(&provider))
        .with_provider(ProviderFamily::Anthropic, Arc::clone(&provider))
        .with_provider(ProviderFamily::Google, provider)
        .build();

    EngineBuilder::new(EngineConfig::default())
        .with_provider_registry(Arc::new(registry))
        .with_retrieval_client(Arc::new(StaticRetrievalClient::new(docs)))
        .build()
        .expect("engine wiring")
}

/// Wire an engine with the deterministic mock provider.
#[must_use]
pub fn mock_engine(docs: Vec<Document>) -> Orchestrator {
    EngineBuilder::new(EngineConfig::default())
        .with_provider_registry(Arc::new(ProviderRegistry::mock_only()))
        .with_retrieval_client(Arc::new(StaticRetrievalClient::new(docs)))
        .build()
        .expect("engine wiring")
}
