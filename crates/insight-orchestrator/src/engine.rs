//! Process-level engine wiring.
//!
//! The builder assembles the orchestrator's collaborators once at startup;
//! everything downstream receives them as constructor arguments. Tests swap
//! any collaborator for a fake through the `with_*` methods.

use crate::orchestrator::Orchestrator;
use insight_config::EngineConfig;
use insight_core::EngineResult;
use insight_experiments::{predefined_experiments, ExperimentRouter};
use insight_memory::{HashingEmbeddings, InMemoryMemoryStore, MemoryStore};
use insight_policy::{DomainPolicy, EvidenceSanitizer, PolicyValidator};
use insight_providers::ProviderRegistry;
use insight_retrieval::{HttpRetrievalClient, RetrievalClient, StaticRetrievalClient};
use insight_routing::ModelRouter;
use std::sync::Arc;
use tracing::info;

/// Builder for a fully wired engine.
pub struct EngineBuilder {
    config: EngineConfig,
    registry: Option<Arc<ProviderRegistry>>,
    retrieval: Option<Arc<dyn RetrievalClient>>,
    memory: Option<Arc<dyn MemoryStore>>,
    experiments: Option<Arc<ExperimentRouter>>,
}

impl EngineBuilder {
    /// Start building from a configuration.
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            registry: None,
            retrieval: None,
            memory: None,
            experiments: None,
        }
    }

    /// Builder: supply a provider registry (tests: scripted providers).
    #[must_use]
    pub fn with_provider_registry(mut self, registry: Arc<ProviderRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Builder: supply a retrieval client.
    #[must_use]
    pub fn with_retrieval_client(mut self, retrieval: Arc<dyn RetrievalClient>) -> Self {
        self.retrieval = Some(retrieval);
        self
    }

    /// Builder: supply a memory store.
    #[must_use]
    pub fn with_memory_store(mut self, memory: Arc<dyn MemoryStore>) -> Self {
        self.memory = Some(memory);
        self
    }

    /// Builder: supply an experiment router.
    #[must_use]
    pub fn with_experiment_router(mut self, experiments: Arc<ExperimentRouter>) -> Self {
        self.experiments = Some(experiments);
        self
    }

    /// Finish wiring.
    ///
    /// Defaults: provider registry from the environment (mock when keyless),
    /// HTTP retrieval against the configured base URL (an empty static
    /// corpus without one), the in-process memory store, the predefined
    /// draft experiments, and a domain policy extending the built-in lists
    /// with the configured suffixes.
    ///
    /// # Errors
    /// Fails when the configured retrieval endpoint yields no usable client.
    pub fn build(self) -> EngineResult<Orchestrator> {
        let config = self.config;

        let registry = self
            .registry
            .unwrap_or_else(|| Arc::new(ProviderRegistry::from_env()));
        let router = Arc::new(ModelRouter::new(Arc::clone(&registry)));

        let retrieval: Arc<dyn RetrievalClient> = match self.retrieval {
            Some(retrieval) => retrieval,
            None => match &config.retrieval.base_url {
                Some(base_url) => Arc::new(HttpRetrievalClient::new(base_url.clone())?),
                None => {
                    info!("no retrieval endpoint configured; using empty static corpus");
                    Arc::new(StaticRetrievalClient::default())
                }
            },
        };

        let memory: Arc<dyn MemoryStore> = self.memory.unwrap_or_else(|| {
            Arc::new(InMemoryMemoryStore::new(Arc::new(
                HashingEmbeddings::default(),
            )))
        });

        let experiments = self
            .experiments
            .unwrap_or_else(|| Arc::new(ExperimentRouter::with_experiments(predefined_experiments())));

        let mut domains = DomainPolicy::default();
        for suffix in &config.blacklist_domains {
            domains = domains.with_blacklisted(suffix.clone());
        }
        for suffix in &config.whitelist_domains {
            domains = domains.with_whitelisted(suffix.clone());
        }

        let validator = Arc::new(PolicyValidator::new(domains.clone()));
        let sanitizer = Arc::new(EvidenceSanitizer::new(domains));

        info!(
            primary_model = %config.primary_model,
            mock = router.is_mock(),
            "engine wired"
        );

        Ok(Orchestrator::new(
            config,
            router,
            retrieval,
            memory,
            experiments,
            validator,
            sanitizer,
        ))
    }
}
