//! End-to-end command flows against scripted providers and a static corpus.

use crate::fixtures::{ai_corpus, default_budget, engine_with, mock_engine};
use crate::scripted::{ScriptedProvider, SlowRetrievalClient};
use insight_config::{BudgetConfig, EngineConfig};
use insight_core::{Command, CommandResult, Document, EngineResponse, ErrorCode, MemoryOp, Stance};
use insight_experiments::{ArmConfig, ArmOverrides, Experiment, ExperimentStatus};
use insight_memory::{HashingEmbeddings, InMemoryMemoryStore, MemoryStore};
use insight_orchestrator::{CommandRequest, EngineBuilder};
use insight_providers::ProviderRegistry;
use insight_retrieval::StaticRetrievalClient;
use std::sync::Arc;

fn ask_request(depth: u32) -> CommandRequest {
    CommandRequest::new(Command::Ask)
        .with_query("How is AI adoption progressing?")
        .with_depth(depth)
        .with_budget(default_budget())
}

#[tokio::test]
async fn happy_path_iterative_qa() {
    let engine = engine_with(Arc::new(ScriptedProvider::happy_path()), ai_corpus());
    let response = engine.execute(ask_request(2)).await;

    let success = response.success().expect("success envelope");
    assert!(!success.header.is_empty());
    assert_eq!(success.meta.iterations, Some(2));
    assert!(success.warnings.is_empty());
    assert!(!success.evidence.is_empty());
    assert!(success.meta.confidence > 0.0);

    let CommandResult::Iterative(result) = &success.result else {
        panic!("expected iterative result");
    };
    assert_eq!(result.steps.len(), 2);
    for step in &result.steps {
        assert!(step.iteration == 1 || step.iteration == 2);
        assert!(step.n_docs >= 1);
    }
    assert!(!result.answer.is_empty());
    assert!(result.answer.chars().count() <= 600);
}

#[tokio::test]
async fn budget_driven_degradation_stops_second_iteration() {
    let provider = ScriptedProvider::happy_path().with_tokens_per_call(1200);
    let engine = engine_with(Arc::new(provider), ai_corpus());

    let request = CommandRequest::new(Command::Ask)
        .with_query("How is AI adoption progressing?")
        .with_depth(2)
        .with_budget(BudgetConfig {
            max_tokens: 1500,
            budget_cents: 10.0,
            timeout_s: 30.0,
        });
    let response = engine.execute(request).await;

    let success = response.success().expect("success envelope");
    let CommandResult::Iterative(result) = &success.result else {
        panic!("expected iterative result");
    };
    assert_eq!(result.steps.len(), 1);
    assert!(success
        .warnings
        .iter()
        .any(|w| w.contains("Stopped at iteration")));
}

#[tokio::test]
async fn fallback_chain_surfaces_fallback_model() {
    let provider = ScriptedProvider::happy_path().with_failing_model("gpt-5");
    let engine = engine_with(Arc::new(provider), ai_corpus());

    let response = engine.execute(ask_request(1)).await;
    let success = response.success().expect("success envelope");
    assert_eq!(success.meta.model, "claude-4.5");

    let metrics = insight_telemetry::render();
    assert!(metrics.contains("model_router_latency_ms"));
    assert!(metrics.contains("fallback_used=\"true\""));
}

#[tokio::test]
async fn pii_in_generated_text_is_rejected() {
    // A poisoned title flows into the insight templates; the policy gate
    // must refuse the whole response.
    let poisoned = vec![Document::new("Contact user@example.com for more", "2025-06-01")
        .with_article_id("p1")
        .with_url("https://reuters.com/p1")
        .with_snippet("Clean snippet text")
        .with_score(0.9)];
    let engine = mock_engine(poisoned);

    let response = engine
        .execute(CommandRequest::new(Command::Ask).with_query("contact"))
        .await;
    let error = response.error().expect("error envelope");
    assert_eq!(error.error, ErrorCode::ValidationFailed);
    assert!(!error.retryable);
}

#[tokio::test]
async fn empty_retrieval_is_no_data() {
    let engine = mock_engine(Vec::new());
    let response = engine
        .execute(CommandRequest::new(Command::Events).with_topic("mergers"))
        .await;
    let error = response.error().expect("error envelope");
    assert_eq!(error.error, ErrorCode::NoData);
    assert!(error.retryable);
    assert!(!error.meta.correlation_id.is_empty());
}

#[tokio::test]
async fn experiment_assignment_is_deterministic_and_tagged() {
    let engine = mock_engine(ai_corpus());
    engine
        .experiments()
        .register(
            Experiment::new(
                "E",
                "A vs B",
                vec![
                    ArmConfig::new("A", "Arm A", 0.5),
                    ArmConfig::new("B", "Arm B", 0.5),
                ],
            )
            .with_targets(vec!["/ask".into()])
            .with_status(ExperimentStatus::Active),
        )
        .expect("register");

    let (_, first) = engine
        .experiments()
        .arm_for_request("/ask", Some("alice"), Some("E"))
        .expect("arm");
    let (_, second) = engine
        .experiments()
        .arm_for_request("/ask", Some("alice"), Some("E"))
        .expect("arm");
    assert_eq!(first.arm_id, second.arm_id);

    let response = engine
        .execute(ask_request(1).with_user_id("alice"))
        .await;
    let success = response.success().expect("success envelope");
    assert_eq!(success.meta.experiment.as_deref(), Some("E"));
    assert_eq!(success.meta.arm.as_deref(), Some(first.arm_id.as_str()));
}

#[tokio::test]
async fn experiment_overrides_change_the_model_chain() {
    let engine = mock_engine(ai_corpus());
    engine
        .experiments()
        .register(
            Experiment::new(
                "M",
                "Gemini primary",
                vec![ArmConfig::new("only", "Only", 1.0).with_config(ArmOverrides {
                    primary_model: Some("gemini-2.5-pro".into()),
                    ..Default::default()
                })],
            )
            .with_targets(vec!["/ask".into()])
            .with_status(ExperimentStatus::Active),
        )
        .expect("register");

    let response = engine
        .execute(ask_request(1).with_user_id("bob"))
        .await;
    let success = response.success().expect("success envelope");
    assert_eq!(success.meta.model, "gemini-2.5-pro");
}

#[tokio::test]
async fn events_flow_produces_timeline_and_links() {
    let engine = mock_engine(ai_corpus());
    let response = engine
        .execute(
            CommandRequest::new(Command::Events)
                .with_topic("AI")
                .with_budget(default_budget()),
        )
        .await;
    let success = response.success().expect("success envelope");

    let CommandResult::Events(result) = &success.result else {
        panic!("expected events result");
    };
    assert!(!result.events.is_empty());
    assert!(!result.timeline.is_empty());
    assert!(!result.causal_links.is_empty());
    for link in &result.causal_links {
        assert!((0.0..=1.0).contains(&link.confidence));
        assert!(!link.evidence_refs.is_empty());
    }
}

#[tokio::test]
async fn graph_flow_produces_subgraph() {
    let engine = mock_engine(ai_corpus());
    let response = engine
        .execute(CommandRequest::new(Command::Graph).with_query("AI adoption"))
        .await;
    let success = response.success().expect("success envelope");

    let CommandResult::Graph(result) = &success.result else {
        panic!("expected graph result");
    };
    assert!(!result.subgraph.nodes.is_empty());
    assert!(!result.answer.is_empty());
    assert!(result
        .subgraph
        .edges
        .iter()
        .all(|e| (0.0..=1.0).contains(&e.weight)));
}

#[tokio::test]
async fn memory_store_then_recall() {
    let memory: Arc<dyn MemoryStore> = Arc::new(InMemoryMemoryStore::new(Arc::new(
        HashingEmbeddings::default(),
    )));
    let engine = EngineBuilder::new(EngineConfig::default())
        .with_provider_registry(Arc::new(ProviderRegistry::mock_only()))
        .with_retrieval_client(Arc::new(StaticRetrievalClient::new(ai_corpus())))
        .with_memory_store(Arc::clone(&memory))
        .build()
        .expect("engine wiring");

    let response = engine
        .execute(
            CommandRequest::new(Command::Memory)
                .with_query("AI adoption")
                .with_memory_op(MemoryOp::Store),
        )
        .await;
    let success = response.success().expect("store succeeds");
    let CommandResult::Memory(result) = &success.result else {
        panic!("expected memory result");
    };
    assert_eq!(result.operation, "store");
    assert!(!result.to_store.is_empty());

    let response = engine
        .execute(
            CommandRequest::new(Command::Memory)
                .with_query("Enterprise AI adoption grew 40% year over year")
                .with_memory_op(MemoryOp::Recall),
        )
        .await;
    let success = response.success().expect("recall succeeds");
    let CommandResult::Memory(result) = &success.result else {
        panic!("expected memory result");
    };
    assert_eq!(result.operation, "recall");
    assert!(!result.records.is_empty());
}

#[tokio::test]
async fn slow_retrieval_degrades_memory_to_recall() {
    // Retrieval eats 80% of the time budget, pushing the ledger under the
    // 30% floor before dispatch; the degradation table must then force the
    // recall-only memory operation.
    let engine = EngineBuilder::new(EngineConfig::default())
        .with_provider_registry(Arc::new(ProviderRegistry::mock_only()))
        .with_retrieval_client(Arc::new(SlowRetrievalClient::new(
            ai_corpus(),
            std::time::Duration::from_millis(400),
        )))
        .build()
        .expect("engine wiring");

    let response = engine
        .execute(
            CommandRequest::new(Command::Memory)
                .with_query("AI adoption")
                .with_memory_op(MemoryOp::Suggest)
                .with_budget(BudgetConfig {
                    max_tokens: 8000,
                    budget_cents: 50.0,
                    timeout_s: 0.5,
                }),
        )
        .await;

    let success = response.success().expect("success envelope");
    let CommandResult::Memory(result) = &success.result else {
        panic!("expected memory result");
    };
    assert_eq!(result.operation, "recall");
    assert!(result.suggestions.is_empty());
    assert!(success
        .warnings
        .iter()
        .any(|w| w.contains("recall-only")));
}

#[tokio::test]
async fn synthesize_consumes_agent_outputs() {
    let engine = mock_engine(ai_corpus());
    let response = engine
        .execute(
            CommandRequest::new(Command::Synthesize)
                .with_topic("AI")
                .with_agent_outputs(serde_json::json!({
                    "trends": {"topics": ["ai"]},
                    "sentiment": {"overall": 0.4}
                })),
        )
        .await;
    let success = response.success().expect("success envelope");

    let CommandResult::Synthesis(result) = &success.result else {
        panic!("expected synthesis result");
    };
    assert!(!result.summary.is_empty());
    assert!(result.summary.chars().count() <= 400);
    assert!(!result.actions.is_empty());
    for conflict in &result.conflicts {
        assert!(conflict.evidence_refs.len() >= 2);
    }
}

#[tokio::test]
async fn predict_flow_produces_ordered_intervals() {
    let engine = mock_engine(ai_corpus());
    let response = engine
        .execute(CommandRequest::new(Command::Predict).with_topic("AI"))
        .await;
    let success = response.success().expect("success envelope");

    let CommandResult::Forecast(result) = &success.result else {
        panic!("expected forecast result");
    };
    assert!(!result.forecast.is_empty());
    for item in &result.forecast {
        assert!(item.confidence_interval.lower <= item.confidence_interval.upper);
        assert!(!item.drivers.is_empty());
        assert_eq!(item.horizon, "1w");
    }
}

#[tokio::test]
async fn competitors_flow_produces_positioning() {
    let engine = mock_engine(ai_corpus());
    let response = engine
        .execute(CommandRequest::new(Command::Competitors).with_topic("AI"))
        .await;
    let success = response.success().expect("success envelope");

    let CommandResult::Competitors(result) = &success.result else {
        panic!("expected competitors result");
    };
    assert!(!result.positioning.is_empty());
    assert!(!result.top_domains.is_empty());
    for positioning in &result.positioning {
        assert!(matches!(
            positioning.stance,
            Stance::Leader | Stance::FastFollower | Stance::Niche
        ));
    }
}

#[tokio::test]
async fn analyze_flow_folds_sub_analyses() {
    let engine = mock_engine(ai_corpus());
    let response = engine
        .execute(CommandRequest::new(Command::Analyze).with_topic("AI"))
        .await;
    let success = response.success().expect("success envelope");

    let CommandResult::Synthesis(result) = &success.result else {
        panic!("expected synthesis-family result");
    };
    assert!(!result.summary.is_empty());
    assert!(!result.actions.is_empty());
}

#[tokio::test]
async fn dashboard_is_feature_gated() {
    let engine = mock_engine(ai_corpus());
    let response = engine
        .execute(CommandRequest::new(Command::Dashboard))
        .await;
    let error = response.error().expect("error envelope");
    assert_eq!(error.error, ErrorCode::Internal);
    assert!(!error.retryable);
    assert!(error.user_message.contains("disabled"));
}

#[tokio::test]
async fn successful_envelope_round_trips_through_json() {
    let engine = engine_with(Arc::new(ScriptedProvider::happy_path()), ai_corpus());
    let response = engine.execute(ask_request(2)).await;
    assert!(response.success().is_some());

    let json = serde_json::to_string(&response).expect("serialize");
    assert!(!json.contains("\"error\""));
    let back: EngineResponse = serde_json::from_str(&json).expect("deserialize");
    assert_eq!(response, back);
}

#[tokio::test]
async fn error_envelope_serializes_error_code() {
    let engine = mock_engine(Vec::new());
    let response = engine
        .execute(CommandRequest::new(Command::Graph).with_query("anything"))
        .await;
    let json = serde_json::to_string(&response).expect("serialize");
    assert!(json.contains("\"NO_DATA\""));
    let back: EngineResponse = serde_json::from_str(&json).expect("deserialize");
    assert_eq!(back.error().expect("error").error, ErrorCode::NoData);
}
