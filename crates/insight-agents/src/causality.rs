//! Causality inference: temporal timeline plus LLM-checked cause-effect
//! links with a temporal-proximity heuristic fallback.

use crate::ModelChain;
use chrono::NaiveDate;
use insight_budget::BudgetLedger;
use insight_core::{
    CausalLink, Document, EventRecord, EvidenceRef, Lang, TimelinePosition, TimelineRelation,
};
use insight_routing::{CallOptions, ModelRouter};
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;
use tracing::{info, warn};

static CONFIDENCE_REGEX: Lazy<Regex> = Lazy::new(|| {
    #[allow(clippy::unwrap_used)]
    Regex::new(r"CONFIDENCE:\s*(0?\.\d+|1\.0|0|1)").unwrap()
});

/// Confidence floor below which a causal link is not recorded.
const LINK_CONFIDENCE_FLOOR: f64 = 0.3;
/// Token estimate gating each causal check.
const CHECK_EST_TOKENS: u64 = 300;
/// Cost estimate (cents) gating each causal check.
const CHECK_EST_CENTS: f64 = 0.3;

/// Infers cause-effect relationships between events.
pub struct CausalityReasoner {
    router: Arc<ModelRouter>,
}

impl CausalityReasoner {
    /// Create a reasoner over the model router.
    #[must_use]
    pub fn new(router: Arc<ModelRouter>) -> Self {
        Self { router }
    }

    /// Infer the timeline and causal links for a set of events.
    pub async fn infer_causality(
        &self,
        events: &[EventRecord],
        docs: &[Document],
        ledger: &mut BudgetLedger,
        lang: Lang,
        chain: &ModelChain,
        max_links: usize,
    ) -> (Vec<TimelineRelation>, Vec<CausalLink>) {
        info!(events = events.len(), "inferring causality");

        let mut timeline = build_timeline(events);
        let mut causal_links = self
            .detect_causal_links(events, &timeline, docs, ledger, lang, chain)
            .await;

        timeline.truncate(20);
        causal_links.truncate(max_links);

        info!(
            timeline = timeline.len(),
            causal_links = causal_links.len(),
            "causality inferred"
        );
        (timeline, causal_links)
    }

    async fn detect_causal_links(
        &self,
        events: &[EventRecord],
        timeline: &[TimelineRelation],
        docs: &[Document],
        ledger: &mut BudgetLedger,
        lang: Lang,
        chain: &ModelChain,
    ) -> Vec<CausalLink> {
        let mut causal_links = Vec::new();

        for relation in timeline {
            // Reverse temporal order cannot be causal.
            if relation.position == TimelinePosition::Before {
                continue;
            }

            if !ledger.can_afford(CHECK_EST_TOKENS, CHECK_EST_CENTS, 0.0) {
                warn!("budget insufficient for causal reasoning, stopping early");
                ledger.push_warning("Causal reasoning stopped early due to budget".to_string());
                break;
            }

            let Some(cause) = events.iter().find(|e| e.id == relation.ref_event_id) else {
                continue;
            };
            let Some(effect) = events.iter().find(|e| e.id == relation.event_id) else {
                continue;
            };

            let (is_causal, confidence) = self
                .check_causality(cause, effect, docs, ledger, lang, chain)
                .await;

            if is_causal && confidence > LINK_CONFIDENCE_FLOOR {
                causal_links.push(CausalLink {
                    cause_event_id: cause.id.clone(),
                    effect_event_id: effect.id.clone(),
                    confidence: (confidence * 100.0).round() / 100.0,
                    evidence_refs: find_evidence(cause, effect, docs),
                });
            }
        }

        causal_links
    }

    /// One LLM causal check; on failure fall back to the temporal-proximity
    /// heuristic (effect starting within a week of the cause ending scores
    /// a weak 0.4 link).
    async fn check_causality(
        &self,
        cause: &EventRecord,
        effect: &EventRecord,
        docs: &[Document],
        ledger: &mut BudgetLedger,
        lang: Lang,
        chain: &ModelChain,
    ) -> (bool, f64) {
        let prompt = match lang {
            Lang::Ru => format!(
                "Проанализируй, могло ли событие A вызвать событие B.\n\n\
                 Событие A (причина?): {}\nДата A: {:?}\n\n\
                 Событие B (следствие?): {}\nДата B: {:?}\n\n\
                 Ответь в формате:\nCAUSAL: yes|no\nCONFIDENCE: 0.0-1.0\n\
                 REASONING: <краткое обоснование>",
                cause.title, cause.ts_range, effect.title, effect.ts_range
            ),
            Lang::En => format!(
                "Analyze if event A could have caused event B.\n\n\
                 Event A (cause?): {}\nDate A: {:?}\n\n\
                 Event B (effect?): {}\nDate B: {:?}\n\n\
                 Answer in format:\nCAUSAL: yes|no\nCONFIDENCE: 0.0-1.0\n\
                 REASONING: <brief reasoning>",
                cause.title, cause.ts_range, effect.title, effect.ts_range
            ),
        };

        let doc_ids: std::collections::HashSet<&str> = cause
            .docs
            .iter()
            .chain(effect.docs.iter())
            .map(String::as_str)
            .collect();
        let context_docs: Vec<Document> = docs
            .iter()
            .filter(|d| {
                d.article_id
                    .as_deref()
                    .is_some_and(|id| doc_ids.contains(id))
            })
            .take(3)
            .cloned()
            .collect();

        let opts = CallOptions::default()
            .with_timeout_s(12)
            .with_max_output_tokens(300)
            .with_temperature(0.3);

        match self
            .router
            .call_with_fallback(&prompt, &context_docs, &chain.primary, &chain.fallback, opts)
            .await
        {
            Ok((reply, usage)) => {
                ledger.record_usage(usage.tokens_used, usage.cost_cents, usage.latency_s());
                let content = reply.content;
                let is_causal = content.contains("CAUSAL: yes");
                let confidence = CONFIDENCE_REGEX
                    .captures(&content)
                    .and_then(|c| c.get(1))
                    .and_then(|m| m.as_str().parse::<f64>().ok())
                    .unwrap_or(0.5);
                (is_causal, confidence)
            }
            Err(e) => {
                warn!(error = %e, "causal check failed, using temporal heuristic");
                temporal_proximity_heuristic(cause, effect)
            }
        }
    }
}

/// Weak causal link when the effect starts within a week of the cause ending.
fn temporal_proximity_heuristic(cause: &EventRecord, effect: &EventRecord) -> (bool, f64) {
    let cause_end = NaiveDate::parse_from_str(&cause.ts_range[1], "%Y-%m-%d");
    let effect_start = NaiveDate::parse_from_str(&effect.ts_range[0], "%Y-%m-%d");
    match (cause_end, effect_start) {
        (Ok(end), Ok(start)) => {
            let days = start.signed_duration_since(end).num_days();
            if (0..=7).contains(&days) {
                (true, 0.4)
            } else {
                (false, 0.0)
            }
        }
        _ => (false, 0.0),
    }
}

/// Temporal ordering of events by start date: each event gets a relation to
/// its predecessor (after/overlap/before by range comparison).
#[must_use]
pub fn build_timeline(events: &[EventRecord]) -> Vec<TimelineRelation> {
    let mut sorted: Vec<&EventRecord> = events.iter().collect();
    sorted.sort_by_key(|event| event.ts_range[0].clone());

    let mut timeline = Vec::new();
    for window in sorted.windows(2) {
        let previous = window[0];
        let current = window[1];

        let position = match (
            NaiveDate::parse_from_str(&previous.ts_range[0], "%Y-%m-%d"),
            NaiveDate::parse_from_str(&previous.ts_range[1], "%Y-%m-%d"),
            NaiveDate::parse_from_str(&current.ts_range[0], "%Y-%m-%d"),
            NaiveDate::parse_from_str(&current.ts_range[1], "%Y-%m-%d"),
        ) {
            (Ok(prev_start), Ok(prev_end), Ok(curr_start), Ok(curr_end)) => {
                if curr_start > prev_end {
                    TimelinePosition::After
                } else if curr_end < prev_start {
                    TimelinePosition::Before
                } else {
                    TimelinePosition::Overlap
                }
            }
            _ => TimelinePosition::After,
        };

        timeline.push(TimelineRelation {
            event_id: current.id.clone(),
            position,
            ref_event_id: previous.id.clone(),
        });
    }
    timeline
}

/// Up to three supporting references from the documents of either event.
/// Always yields at least one reference.
fn find_evidence(cause: &EventRecord, effect: &EventRecord, docs: &[Document]) -> Vec<EvidenceRef> {
    let doc_ids: std::collections::HashSet<&str> = cause
        .docs
        .iter()
        .chain(effect.docs.iter())
        .map(String::as_str)
        .collect();

    let mut refs: Vec<EvidenceRef> = docs
        .iter()
        .filter(|d| {
            d.article_id
                .as_deref()
                .is_some_and(|id| doc_ids.contains(id))
        })
        .take(3)
        .map(|d| EvidenceRef::new(d.article_id.clone(), d.url.clone(), d.date.clone()))
        .collect();

    if refs.is_empty() {
        refs.push(EvidenceRef::new(None, None, effect.ts_range[0].clone()));
    }
    refs
}

/// Deterministic chain timeline used when inference produced nothing.
#[must_use]
pub fn fallback_timeline(events: &[EventRecord]) -> Vec<TimelineRelation> {
    events
        .windows(2)
        .map(|window| TimelineRelation {
            event_id: window[1].id.clone(),
            position: TimelinePosition::After,
            ref_event_id: window[0].id.clone(),
        })
        .collect()
}

/// Deterministic chained causal links used when inference produced nothing.
/// Confidence decays along the chain but never below the recording floor.
#[must_use]
pub fn fallback_causal_links(events: &[EventRecord], docs: &[Document]) -> Vec<CausalLink> {
    events
        .windows(2)
        .enumerate()
        .map(|(idx, window)| {
            let previous = &window[0];
            let current = &window[1];
            CausalLink {
                cause_event_id: previous.id.clone(),
                effect_event_id: current.id.clone(),
                confidence: (0.8 - (idx + 1) as f64 * 0.1).max(0.3),
                evidence_refs: find_evidence(previous, current, docs),
            }
        })
        .collect()
}
