//! The per-command orchestrator.

use crate::builders::{
    build_evidence, build_insights_from_docs, build_insights_from_events,
    build_insights_from_graph,
};
use crate::request::CommandRequest;
use insight_agents::{
    causality::{fallback_causal_links, fallback_timeline},
    graph::GraphLimits,
    run_analysis, AnalysisToggles, CausalityReasoner, CompetitorAgent, EventExtractor,
    ForecastAgent, GraphAgent, IterativeAgent, IterativeRequest, MemoryAgent, ModelChain,
    SynthesisAgent,
};
use insight_budget::{apply_degradation, BudgetCaps, BudgetLedger};
use insight_config::EngineConfig;
use insight_core::{
    trim_chars, Action, AnalysisResponse, Command, CommandParams, CommandResult, Document,
    EngineError, EngineResponse, ErrorResponse, EventsResult, EvidenceRef, Insight, InsightKind,
    Lang, Meta, SynthesisResult,
};
use insight_experiments::{AppliedExperiment, ExperimentRouter};
use insight_policy::{EvidenceSanitizer, PolicyValidator};
use insight_retrieval::{RetrievalClient, RetrievalRequest};
use insight_routing::ModelRouter;
use insight_telemetry::{
    record_orchestrator_error, record_orchestrator_start, record_orchestrator_success,
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

/// Cap on extracted events and causal links per request.
const MAX_EVENTS: usize = 20;

/// Default per-command confidence before trust weighting.
fn base_confidence(command: Command) -> f64 {
    match command {
        Command::Ask => 0.78,
        Command::Events => 0.76,
        Command::Graph => 0.74,
        Command::Memory => 0.70,
        Command::Synthesize | Command::Reports | Command::Dashboard => 0.77,
        Command::Trends | Command::Predict => 0.72,
        Command::Competitors => 0.73,
        Command::Analyze => 0.75,
    }
}

/// The request context after experiment overrides and cap resolution.
struct ResolvedContext {
    correlation_id: String,
    lang: Lang,
    window: String,
    chain: ModelChain,
    params: CommandParams,
    caps: BudgetCaps,
    applied: Option<AppliedExperiment>,
}

/// What a command handler hands back to the shared envelope assembly.
struct CommandOutcome {
    result: CommandResult,
    header: String,
    tldr: String,
    insights: Vec<Insight>,
    iterations: Option<u32>,
    warnings: Vec<String>,
    /// Documents backing the evidence list (may differ from the retrieval
    /// set, e.g. after iterative re-retrieval).
    evidence_docs: Vec<Document>,
    /// Label of the model that actually answered, when an LLM was involved.
    /// `None` keeps the chain's primary label in the metadata.
    model_used: Option<String>,
}

/// The per-command orchestrator. All collaborators arrive through the
/// constructor; tests supply fakes.
pub struct Orchestrator {
    config: EngineConfig,
    retrieval: Arc<dyn RetrievalClient>,
    experiments: Arc<ExperimentRouter>,
    validator: Arc<PolicyValidator>,
    sanitizer: Arc<EvidenceSanitizer>,
    iterative: IterativeAgent,
    extractor: EventExtractor,
    causality: CausalityReasoner,
    graph: GraphAgent,
    memory: MemoryAgent,
    synthesis: SynthesisAgent,
    forecast: ForecastAgent,
    competitors: CompetitorAgent,
}

impl Orchestrator {
    /// Wire an orchestrator from its collaborators.
    #[allow(clippy::too_many_arguments)]
    #[must_use]
    pub fn new(
        config: EngineConfig,
        router: Arc<ModelRouter>,
        retrieval: Arc<dyn RetrievalClient>,
        memory_store: Arc<dyn insight_memory::MemoryStore>,
        experiments: Arc<ExperimentRouter>,
        validator: Arc<PolicyValidator>,
        sanitizer: Arc<EvidenceSanitizer>,
    ) -> Self {
        Self {
            iterative: IterativeAgent::new(Arc::clone(&router), Arc::clone(&retrieval)),
            extractor: EventExtractor::new(),
            causality: CausalityReasoner::new(Arc::clone(&router)),
            graph: GraphAgent::new(),
            memory: MemoryAgent::new(memory_store),
            synthesis: SynthesisAgent::new(Arc::clone(&router)),
            forecast: ForecastAgent::new(),
            competitors: CompetitorAgent::new(),
            config,
            retrieval,
            experiments,
            validator,
            sanitizer,
        }
    }

    /// The experiment router, for operator surfaces (register/activate).
    #[must_use]
    pub fn experiments(&self) -> &Arc<ExperimentRouter> {
        &self.experiments
    }

    /// Execute one command. Never panics or errors across this boundary;
    /// every fault is converted into an error envelope.
    pub async fn execute(&self, request: CommandRequest) -> EngineResponse {
        let command = request.command;
        let context = self.resolve_context(&request);
        let correlation_id = context.correlation_id.clone();
        let started = Instant::now();

        record_orchestrator_start(command.as_str());
        info!(
            correlation_id = %correlation_id,
            command = %command,
            "executing command"
        );

        let deadline = Duration::from_secs_f64(context.caps.timeout_s.max(1.0));
        let outcome = tokio::time::timeout(
            deadline,
            self.execute_inner(&request, &context, started),
        )
        .await;

        match outcome {
            Ok(response) => response,
            Err(_) => {
                warn!(correlation_id = %correlation_id, "request deadline exceeded");
                record_orchestrator_error(command.as_str(), "internal");
                self.error_envelope(
                    &EngineError::internal(format!(
                        "request deadline of {:.0}s exceeded",
                        context.caps.timeout_s
                    )),
                    &context,
                )
            }
        }
    }

    async fn execute_inner(
        &self,
        request: &CommandRequest,
        context: &ResolvedContext,
        started: Instant,
    ) -> EngineResponse {
        let command = request.command;

        // Feature gates.
        if command == Command::Dashboard && !self.config.features.enable_dashboard {
            record_orchestrator_error(command.as_str(), "feature_disabled");
            return self.error_envelope(
                &EngineError::FeatureDisabled {
                    feature: "/dashboard".to_string(),
                },
                context,
            );
        }
        if command == Command::Reports && !self.config.features.enable_reports {
            record_orchestrator_error(command.as_str(), "feature_disabled");
            return self.error_envelope(
                &EngineError::FeatureDisabled {
                    feature: "/reports".to_string(),
                },
                context,
            );
        }

        // Retrieval. The ledger owns the request's spend; retrieval latency
        // counts against its time dimension.
        let mut ledger = BudgetLedger::new(context.caps);
        let retrieval_started = Instant::now();
        let docs = match self
            .retrieval
            .retrieve(
                RetrievalRequest::new(request.effective_query())
                    .with_window(context.window.clone())
                    .with_lang(request.lang.clone())
                    .with_k_final(context.params.k_final)
                    .with_rerank(context.params.use_rerank)
                    .with_sources(request.sources.clone().unwrap_or_default()),
            )
            .await
        {
            Ok(docs) => docs,
            Err(e) => {
                error!(correlation_id = %context.correlation_id, error = %e, "retrieval failed");
                record_orchestrator_error(command.as_str(), "retrieval");
                return self.error_envelope(&e, context);
            }
        };
        ledger.record_usage(0, 0.0, retrieval_started.elapsed().as_secs_f64());

        if docs.is_empty() && command.requires_documents(Some(context.params.memory_op)) {
            record_orchestrator_error(command.as_str(), "no_data");
            return self.error_envelope(&EngineError::NoData, context);
        }

        // First degradation checkpoint: a slow retrieval can already push a
        // budget dimension under the 30% floor. The degraded k_final trims
        // the working set the agents see.
        let mut docs = docs;
        let mut params = context.params.clone();
        if ledger.should_degrade() {
            params = apply_degradation(&mut ledger, command, params);
            docs.truncate(params.k_final);
        }

        // Agent dispatch.
        let outcome = match self
            .dispatch(request, context, &params, docs.clone(), &mut ledger)
            .await
        {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(correlation_id = %context.correlation_id, error = %e, "command failed");
                record_orchestrator_error(command.as_str(), error_reason(&e));
                return self.error_envelope(&e, context);
            }
        };

        // Envelope assembly.
        let model_label = outcome
            .model_used
            .clone()
            .unwrap_or_else(|| context.chain.primary.clone());
        let mut meta = Meta::new(
            base_confidence(command),
            model_label,
            self.config.version.clone(),
            context.correlation_id.clone(),
        );
        if let Some(applied) = &context.applied {
            meta = meta.with_experiment(applied.experiment_id.clone(), applied.arm_id.clone());
        }
        if let Some(iterations) = outcome.iterations {
            meta = meta.with_iterations(iterations);
        }

        let mut warnings = ledger.take_warnings();
        warnings.extend(outcome.warnings);

        let evidence = build_evidence(&outcome.evidence_docs);
        let mut response = AnalysisResponse {
            header: trim_chars(&outcome.header, 100),
            tldr: trim_chars(&outcome.tldr, 220),
            insights: outcome.insights,
            evidence,
            result: outcome.result,
            meta,
            warnings,
        };

        // Sanitization, then trust-weighted confidence.
        response.evidence = self.sanitizer.sanitize(response.evidence);
        let multiplier = self.sanitizer.confidence_multiplier(&response.evidence);
        response.meta.scale_confidence(multiplier);

        // Policy validation.
        if let Err(violation) = self.validator.validate_response(&response) {
            warn!(
                correlation_id = %context.correlation_id,
                violation = %violation,
                "response failed validation"
            );
            record_orchestrator_error(command.as_str(), "validation");
            return self.error_envelope(
                &EngineError::validation(violation.tech_message),
                context,
            );
        }
        if let Err(violation) = self.validator.validate_result_shape(&response.result) {
            warn!(
                correlation_id = %context.correlation_id,
                violation = %violation,
                "result failed shape validation"
            );
            record_orchestrator_error(command.as_str(), "validation");
            return self.error_envelope(
                &EngineError::validation(violation.tech_message),
                context,
            );
        }

        let elapsed_ms = started.elapsed().as_millis() as f64;
        record_orchestrator_success(
            command.as_str(),
            elapsed_ms,
            response.evidence.len(),
            docs.len(),
        );
        if let Some(applied) = &context.applied {
            self.experiments.record(
                &applied.experiment_id,
                &applied.arm_id,
                "latency_ms",
                elapsed_ms,
                None,
            );
        }

        info!(
            correlation_id = %context.correlation_id,
            elapsed_ms,
            evidence = response.evidence.len(),
            "command completed"
        );
        EngineResponse::Success(Box::new(response))
    }

    async fn dispatch(
        &self,
        request: &CommandRequest,
        context: &ResolvedContext,
        params: &CommandParams,
        docs: Vec<Document>,
        ledger: &mut BudgetLedger,
    ) -> Result<CommandOutcome, EngineError> {
        let lang = context.lang;
        match request.command {
            Command::Ask => self.handle_ask(request, context, params, docs, ledger).await,
            Command::Events => self.handle_events(context, params, docs, ledger).await,
            Command::Graph => Ok(self.handle_graph(request, context, params, &docs)),
            Command::Memory => Ok(self.handle_memory(request, context, params, &docs).await),
            Command::Synthesize | Command::Reports | Command::Dashboard => {
                self.handle_synthesis(request, context, docs, ledger).await
            }
            Command::Trends | Command::Predict => Ok(self.handle_forecast(request, context, &docs)),
            Command::Analyze => self.handle_analyze(context, docs).await,
            Command::Competitors => {
                let focus = request.domains.clone().unwrap_or_default();
                let result = self.competitors.run(&docs, &focus, lang);
                Ok(CommandOutcome {
                    result: CommandResult::Competitors(result),
                    header: lang.pick("Competitive Landscape", "Конкурентный ландшафт").to_string(),
                    tldr: lang
                        .pick(
                            "Coverage share, positioning and overlap across competing sources.",
                            "Доли покрытия, позиционирование и пересечения источников.",
                        )
                        .to_string(),
                    insights: build_insights_from_docs(&docs, lang),
                    iterations: None,
                    warnings: Vec::new(),
                    evidence_docs: docs,
                    model_used: None,
                })
            }
        }
    }

    async fn handle_ask(
        &self,
        request: &CommandRequest,
        context: &ResolvedContext,
        params: &CommandParams,
        docs: Vec<Document>,
        ledger: &mut BudgetLedger,
    ) -> Result<CommandOutcome, EngineError> {
        let lang = context.lang;
        let (result, all_docs, model_used) = self
            .iterative
            .run(
                IterativeRequest {
                    query: request.effective_query(),
                    initial_docs: docs,
                    depth: params.depth.clamp(1, 3),
                    self_check: params.self_check,
                    chain: context.chain.clone(),
                    lang,
                    window: context.window.clone(),
                    use_rerank: params.use_rerank,
                },
                ledger,
            )
            .await;

        let iterations = result.steps.len() as u32;
        Ok(CommandOutcome {
            header: lang.pick("Deep Dive", "Глубокий разбор").to_string(),
            tldr: lang
                .pick(
                    "Iterative analysis with query refinement and self-check.",
                    "Многоходовой анализ с проверкой и уточнением запроса.",
                )
                .to_string(),
            insights: build_insights_from_docs(&all_docs, lang),
            iterations: Some(iterations),
            warnings: Vec::new(),
            result: CommandResult::Iterative(result),
            evidence_docs: all_docs,
            model_used,
        })
    }

    async fn handle_events(
        &self,
        context: &ResolvedContext,
        params: &CommandParams,
        docs: Vec<Document>,
        ledger: &mut BudgetLedger,
    ) -> Result<CommandOutcome, EngineError> {
        let lang = context.lang;

        let events = self.extractor.extract_events(&docs, &context.window, MAX_EVENTS);
        let (mut timeline, mut causal_links) = self
            .causality
            .infer_causality(&events, &docs, ledger, lang, &context.chain, MAX_EVENTS)
            .await;

        if timeline.is_empty() {
            timeline = fallback_timeline(&events);
        }
        if causal_links.is_empty() {
            causal_links = fallback_causal_links(&events, &docs);
        }

        // Causal inference spends budget; re-check the table before
        // committing to the alternatives hypothesis.
        let params = if params.include_alternatives && ledger.should_degrade() {
            apply_degradation(ledger, Command::Events, params.clone())
        } else {
            params.clone()
        };

        let mut insights = build_insights_from_events(&events, lang);
        if params.include_alternatives && events.len() >= 2 && insights.len() < 5 {
            insights.push(Insight {
                kind: InsightKind::Hypothesis,
                text: trim_chars(
                    lang.pick(
                        "The linked events may be coincidental rather than causal.",
                        "Связанные события могут быть совпадением, а не причинной связью.",
                    ),
                    180,
                ),
                evidence_refs: vec![EvidenceRef::new(
                    events[0].docs.first().cloned(),
                    None,
                    events[0].ts_range[0].clone(),
                )],
            });
        }

        Ok(CommandOutcome {
            header: lang.pick("Linked Events", "Связанные события").to_string(),
            tldr: lang
                .pick(
                    "Events arranged chronologically with causal relationships detected.",
                    "События выстроены в хронологию с причинно-следственными связями.",
                )
                .to_string(),
            insights,
            iterations: None,
            warnings: Vec::new(),
            result: CommandResult::Events(EventsResult {
                events,
                timeline,
                causal_links,
            }),
            evidence_docs: docs,
            model_used: None,
        })
    }

    fn handle_graph(
        &self,
        request: &CommandRequest,
        context: &ResolvedContext,
        params: &CommandParams,
        docs: &[Document],
    ) -> CommandOutcome {
        let lang = context.lang;
        let limits = GraphLimits {
            hop_limit: params.hop_limit,
            max_nodes: params.max_nodes,
            max_edges: params.max_edges,
        };

        let result = self.graph.run(&request.effective_query(), docs, limits, lang);
        let insights =
            build_insights_from_graph(result.subgraph.nodes.len(), result.subgraph.edges.len(), lang);

        CommandOutcome {
            header: lang.pick("Knowledge Graph", "Граф знаний").to_string(),
            tldr: lang
                .pick(
                    "Graph links key entities and documents related to query.",
                    "Граф связывает ключевые сущности и документы по теме запроса.",
                )
                .to_string(),
            insights,
            iterations: None,
            warnings: Vec::new(),
            result: CommandResult::Graph(result),
            evidence_docs: docs.to_vec(),
            model_used: None,
        }
    }

    async fn handle_memory(
        &self,
        request: &CommandRequest,
        context: &ResolvedContext,
        params: &CommandParams,
        docs: &[Document],
    ) -> CommandOutcome {
        let lang = context.lang;
        let (result, status) = self
            .memory
            .run(
                params.memory_op,
                docs,
                &request.query.clone().unwrap_or_default(),
                request.user_id.as_deref(),
                lang,
            )
            .await;

        CommandOutcome {
            header: lang.pick("Long-term Memory", "Долгая память").to_string(),
            tldr: status,
            insights: build_insights_from_docs(docs, lang),
            iterations: None,
            warnings: Vec::new(),
            result: CommandResult::Memory(result),
            evidence_docs: docs.to_vec(),
            model_used: None,
        }
    }

    async fn handle_synthesis(
        &self,
        request: &CommandRequest,
        context: &ResolvedContext,
        docs: Vec<Document>,
        ledger: &mut BudgetLedger,
    ) -> Result<CommandOutcome, EngineError> {
        let lang = context.lang;
        let outputs = request
            .agent_outputs
            .clone()
            .unwrap_or_else(|| serde_json::Value::Object(serde_json::Map::new()));

        let (result, model_used) = self
            .synthesis
            .run(&outputs, &docs, ledger, lang, &context.chain)
            .await;

        Ok(CommandOutcome {
            header: lang.pick("Synthesis Report", "Сводный отчёт").to_string(),
            tldr: lang
                .pick(
                    "Unified analysis with conflict detection and recommendations.",
                    "Объединённый анализ с выявлением конфликтов и рекомендациями.",
                )
                .to_string(),
            insights: build_insights_from_docs(&docs, lang),
            iterations: None,
            warnings: Vec::new(),
            result: CommandResult::Synthesis(result),
            evidence_docs: docs,
            model_used,
        })
    }

    fn handle_forecast(
        &self,
        request: &CommandRequest,
        context: &ResolvedContext,
        docs: &[Document],
    ) -> CommandOutcome {
        let lang = context.lang;
        let topic = request
            .topic
            .clone()
            .or_else(|| request.query.clone())
            .unwrap_or_else(|| "general".to_string());
        let result = self.forecast.run(&topic, docs, &context.window);

        CommandOutcome {
            header: lang.pick("Trend Forecast", "Прогноз трендов").to_string(),
            tldr: lang
                .pick(
                    "Coverage momentum projected per topic with evidence-backed drivers.",
                    "Динамика покрытия спроецирована по темам с подтверждёнными драйверами.",
                )
                .to_string(),
            insights: build_insights_from_docs(docs, lang),
            iterations: None,
            warnings: Vec::new(),
            result: CommandResult::Forecast(result),
            evidence_docs: docs.to_vec(),
            model_used: None,
        }
    }

    async fn handle_analyze(
        &self,
        context: &ResolvedContext,
        docs: Vec<Document>,
    ) -> Result<CommandOutcome, EngineError> {
        let lang = context.lang;
        let toggles = AnalysisToggles {
            keywords: self.config.features.enable_analyze_keywords,
            sentiment: self.config.features.enable_analyze_sentiment,
            topics: self.config.features.enable_analyze_topics,
        };
        if !toggles.keywords && !toggles.sentiment && !toggles.topics {
            return Err(EngineError::FeatureDisabled {
                feature: "/analyze".to_string(),
            });
        }

        let findings = run_analysis(&docs, toggles, lang).await;
        let summary = trim_chars(
            &findings
                .iter()
                .map(|f| f.finding.as_str())
                .collect::<Vec<_>>()
                .join(" "),
            400,
        );

        let actions: Vec<Action> = findings
            .iter()
            .enumerate()
            .map(|(idx, finding)| Action {
                recommendation: trim_chars(&finding.finding, 180),
                impact: if idx == 0 { "high" } else { "medium" }.to_string(),
                evidence_refs: docs
                    .get(idx % docs.len().max(1))
                    .map(|d| {
                        vec![EvidenceRef::new(
                            d.article_id.clone(),
                            d.url.clone(),
                            d.date.clone(),
                        )]
                    })
                    .unwrap_or_default(),
            })
            .filter(|action| !action.evidence_refs.is_empty())
            .collect();

        Ok(CommandOutcome {
            header: lang.pick("Coverage Analysis", "Анализ покрытия").to_string(),
            tldr: summary.clone(),
            insights: build_insights_from_docs(&docs, lang),
            iterations: None,
            warnings: Vec::new(),
            result: CommandResult::Synthesis(SynthesisResult {
                summary,
                conflicts: Vec::new(),
                actions,
            }),
            evidence_docs: docs,
            model_used: None,
        })
    }

    fn resolve_context(&self, request: &CommandRequest) -> ResolvedContext {
        let correlation_id = request.correlation_id.clone().unwrap_or_else(|| {
            format!(
                "{}-{}",
                request.command.as_str().trim_start_matches('/'),
                &uuid::Uuid::new_v4().simple().to_string()[..8]
            )
        });

        let mut params = CommandParams {
            use_rerank: self.config.retrieval.enable_rerank,
            ..CommandParams::default()
        };
        if let Some(depth) = request.depth {
            params.depth = depth.clamp(1, 3);
        }
        if let Some(k_final) = request.k_final {
            params.k_final = k_final;
        }
        if let Some(op) = request.memory_op {
            params.memory_op = op;
        }

        let mut chain = ModelChain::new(
            self.config.primary_model.clone(),
            self.config.fallback_models.clone(),
        );

        let applied = self
            .experiments
            .arm_config_override(
                request.command.as_str(),
                request.user_id.as_deref(),
                request.experiment_id.as_deref(),
            )
            .map(|(applied, arm)| {
                let overrides = arm.config;
                if let Some(primary) = overrides.primary_model {
                    chain.primary = primary;
                }
                if let Some(fallback) = overrides.fallback_models {
                    chain.fallback = fallback;
                }
                if let Some(depth) = overrides.depth {
                    params.depth = depth.clamp(1, 3);
                }
                if let Some(use_rerank) = overrides.use_rerank {
                    params.use_rerank = use_rerank;
                }
                if let Some(k_final) = overrides.k_final {
                    params.k_final = k_final;
                }
                if let Some(self_check) = overrides.self_check {
                    params.self_check = self_check;
                }
                applied
            });

        let budget = request.budget.unwrap_or(self.config.budget);
        let caps = BudgetCaps {
            max_tokens: budget.max_tokens,
            budget_cents: budget.budget_cents,
            timeout_s: budget.timeout_s,
        };

        ResolvedContext {
            correlation_id,
            lang: Lang::parse(&request.lang),
            window: request.effective_window(),
            chain,
            params,
            caps,
            applied,
        }
    }

    fn error_envelope(&self, err: &EngineError, context: &ResolvedContext) -> EngineResponse {
        let mut meta = Meta::new(
            0.0,
            context.chain.primary.clone(),
            self.config.version.clone(),
            context.correlation_id.clone(),
        );
        if let Some(applied) = &context.applied {
            meta = meta.with_experiment(applied.experiment_id.clone(), applied.arm_id.clone());
        }

        EngineResponse::Error(ErrorResponse {
            error: err.code(),
            user_message: err.user_message(),
            tech_message: err.to_string(),
            retryable: err.retryable(),
            meta,
        })
    }
}

fn error_reason(err: &EngineError) -> &'static str {
    match err {
        EngineError::Retrieval { .. } => "retrieval",
        EngineError::NoData => "no_data",
        EngineError::Validation { .. } => "validation",
        EngineError::BudgetExceeded { .. } => "budget",
        EngineError::ModelUnavailable { .. } => "model_unavailable",
        EngineError::FeatureDisabled { .. } => "feature_disabled",
        _ => "internal",
    }
}
