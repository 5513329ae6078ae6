//! Prometheus metric definitions.
//!
//! Bounded label sets only: `command`, `reason`, `model` and `fallback_used`
//! are labels; elapsed time, evidence counts and document counts are
//! histogram observations.

use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec_with_registry, register_histogram_vec_with_registry, CounterVec,
    HistogramVec, Registry, TextEncoder,
};

/// The engine's metric registry.
pub static REGISTRY: Lazy<Registry> = Lazy::new(Registry::new);

#[allow(clippy::expect_used)]
static ORCHESTRATOR_START: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec_with_registry!(
        "orchestrator_start_total",
        "Commands accepted by the orchestrator",
        &["command"],
        *REGISTRY
    )
    .expect("metric registration")
});

#[allow(clippy::expect_used)]
static ORCHESTRATOR_SUCCESS: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec_with_registry!(
        "orchestrator_success_total",
        "Commands completed with a valid envelope",
        &["command"],
        *REGISTRY
    )
    .expect("metric registration")
});

#[allow(clippy::expect_used)]
static ORCHESTRATOR_ERROR: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec_with_registry!(
        "orchestrator_error_total",
        "Commands that returned an error envelope",
        &["command", "reason"],
        *REGISTRY
    )
    .expect("metric registration")
});

#[allow(clippy::expect_used)]
static ORCHESTRATOR_ELAPSED_MS: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec_with_registry!(
        "orchestrator_elapsed_ms",
        "End-to-end command latency in milliseconds",
        &["command"],
        vec![50.0, 100.0, 250.0, 500.0, 1000.0, 2500.0, 5000.0, 10000.0, 30000.0],
        *REGISTRY
    )
    .expect("metric registration")
});

#[allow(clippy::expect_used)]
static ORCHESTRATOR_EVIDENCE_COUNT: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec_with_registry!(
        "orchestrator_evidence_count",
        "Evidence entries per successful response",
        &["command"],
        vec![1.0, 2.0, 3.0, 5.0, 8.0, 10.0],
        *REGISTRY
    )
    .expect("metric registration")
});

#[allow(clippy::expect_used)]
static ORCHESTRATOR_DOC_COUNT: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec_with_registry!(
        "orchestrator_doc_count",
        "Retrieved documents per successful response",
        &["command"],
        vec![1.0, 3.0, 5.0, 10.0, 20.0, 50.0],
        *REGISTRY
    )
    .expect("metric registration")
});

#[allow(clippy::expect_used)]
static MODEL_ROUTER_LATENCY_MS: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec_with_registry!(
        "model_router_latency_ms",
        "Per-call model latency in milliseconds",
        &["model", "fallback_used"],
        vec![50.0, 100.0, 250.0, 500.0, 1000.0, 2500.0, 5000.0, 15000.0],
        *REGISTRY
    )
    .expect("metric registration")
});

#[allow(clippy::expect_used)]
static MODEL_ROUTER_COST_CENTS: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec_with_registry!(
        "model_router_cost_cents_total",
        "Accumulated model cost in cents",
        &["model"],
        *REGISTRY
    )
    .expect("metric registration")
});

/// Record a command being accepted.
pub fn record_orchestrator_start(command: &str) {
    ORCHESTRATOR_START.with_label_values(&[command]).inc();
}

/// Record a successfully completed command with its dimensions.
pub fn record_orchestrator_success(
    command: &str,
    elapsed_ms: f64,
    evidence_count: usize,
    doc_count: usize,
) {
    ORCHESTRATOR_SUCCESS.with_label_values(&[command]).inc();
    ORCHESTRATOR_ELAPSED_MS
        .with_label_values(&[command])
        .observe(elapsed_ms);
    ORCHESTRATOR_EVIDENCE_COUNT
        .with_label_values(&[command])
        .observe(evidence_count as f64);
    ORCHESTRATOR_DOC_COUNT
        .with_label_values(&[command])
        .observe(doc_count as f64);
}

/// Record a command failure with its reason.
pub fn record_orchestrator_error(command: &str, reason: &str) {
    ORCHESTRATOR_ERROR
        .with_label_values(&[command, reason])
        .inc();
}

/// Record a completed model-router call.
pub fn record_model_router_call(model: &str, fallback_used: bool, latency_ms: f64, cost_cents: f64) {
    let fallback = if fallback_used { "true" } else { "false" };
    MODEL_ROUTER_LATENCY_MS
        .with_label_values(&[model, fallback])
        .observe(latency_ms);
    MODEL_ROUTER_COST_CENTS
        .with_label_values(&[model])
        .inc_by(cost_cents.max(0.0));
}

/// Render the registry in the prometheus text exposition format.
#[must_use]
pub fn render() -> String {
    let encoder = TextEncoder::new();
    encoder
        .encode_to_string(&REGISTRY.gather())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_accumulate() {
        record_orchestrator_start("/ask");
        record_orchestrator_start("/ask");
        record_orchestrator_success("/ask", 120.0, 3, 5);
        record_orchestrator_error("/events", "retrieval");
        record_model_router_call("gpt-5", false, 80.0, 0.5);
        record_model_router_call("claude-4.5", true, 200.0, 0.3);

        let rendered = render();
        assert!(rendered.contains("orchestrator_start_total"));
        assert!(rendered.contains("orchestrator_success_total"));
        assert!(rendered.contains("orchestrator_error_total"));
        assert!(rendered.contains("model_router_latency_ms"));
        assert!(rendered.contains("model_router_cost_cents_total"));
        assert!(rendered.contains("fallback_used=\"true\""));
        assert!(rendered.contains("reason=\"retrieval\""));
    }
}
