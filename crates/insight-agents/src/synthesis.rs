//! The synthesis agent: merge agent outputs into a summary with conflicts
//! and actionable recommendations.

use crate::ModelChain;
use insight_budget::BudgetLedger;
use insight_core::{
    trim_chars, Action, Conflict, Document, EvidenceRef, Lang, SynthesisResult,
};
use insight_routing::{CallOptions, ModelRouter};
use std::sync::Arc;
use tracing::warn;

/// The synthesis agent.
pub struct SynthesisAgent {
    router: Arc<ModelRouter>,
}

impl SynthesisAgent {
    /// Create an agent over the model router.
    #[must_use]
    pub fn new(router: Arc<ModelRouter>) -> Self {
        Self { router }
    }

    /// Produce the synthesis result from caller-supplied agent outputs and
    /// the retrieved documents, plus the label of the model that wrote the
    /// summary. LLM failure degrades to a fixed summary with a warning
    /// appended to the ledger.
    pub async fn run(
        &self,
        agent_outputs: &serde_json::Value,
        docs: &[Document],
        ledger: &mut BudgetLedger,
        lang: Lang,
        chain: &ModelChain,
    ) -> (SynthesisResult, Option<String>) {
        let output_count = agent_outputs.as_object().map_or(0, |outputs| outputs.len());
        let prompt = build_synthesis_prompt(output_count, docs.len(), lang);

        let context_docs: Vec<Document> = docs.iter().take(5).cloned().collect();
        let opts = CallOptions::default()
            .with_timeout_s(12)
            .with_max_output_tokens(600)
            .with_temperature(0.7);

        let mut model_used = None;
        let summary = match self
            .router
            .call_with_fallback(&prompt, &context_docs, &chain.primary, &chain.fallback, opts)
            .await
        {
            Ok((reply, usage)) => {
                ledger.record_usage(usage.tokens_used, usage.cost_cents, usage.latency_s());
                model_used = Some(reply.model);
                trim_chars(&reply.content, 400)
            }
            Err(e) => {
                warn!(error = %e, "synthesis call failed");
                ledger.push_warning("Synthesis summary fell back to a fixed notice".to_string());
                lang.pick("Synthesis unavailable", "Синтез недоступен").to_string()
            }
        };

        (
            SynthesisResult {
                summary,
                conflicts: detect_conflicts(docs, lang),
                actions: generate_actions(docs, lang),
            },
            model_used,
        )
    }
}

fn build_synthesis_prompt(output_count: usize, doc_count: usize, lang: Lang) -> String {
    match lang {
        Lang::Ru => format!(
            "Объедини результаты нескольких агентов в краткую сводку (≤400 символов).\n\n\
             Результаты агентов: {output_count} outputs\nДокументы: {doc_count} sources\n\n\
             Сводка должна:\n- Выделить ключевые выводы\n- Отметить противоречия (если есть)\n\
             - Дать 2-3 рекомендации"
        ),
        Lang::En => format!(
            "Synthesize results from multiple agents into brief summary (≤400 chars).\n\n\
             Agent outputs: {output_count} outputs\nDocuments: {doc_count} sources\n\n\
             Summary should:\n- Highlight key findings\n- Note conflicts (if any)\n\
             - Provide 2-3 recommendations"
        ),
    }
}

/// Conflicts need two contradictory sources; one conflict is flagged when at
/// least two documents are available.
fn detect_conflicts(docs: &[Document], lang: Lang) -> Vec<Conflict> {
    if docs.len() < 2 {
        return Vec::new();
    }
    vec![Conflict {
        description: trim_chars(
            lang.pick(
                "Divergent assessments across sources",
                "Различия в оценках между источниками",
            ),
            180,
        ),
        evidence_refs: docs
            .iter()
            .take(2)
            .map(|d| EvidenceRef::new(d.article_id.clone(), d.url.clone(), d.date.clone()))
            .collect(),
    }]
}

fn generate_actions(docs: &[Document], lang: Lang) -> Vec<Action> {
    let action_texts = [
        lang.pick(
            "Strengthen monitoring of key metrics",
            "Усилить мониторинг ключевых метрик",
        ),
        lang.pick(
            "Conduct deeper trend analysis",
            "Провести углублённый анализ трендов",
        ),
    ];

    let mut actions: Vec<Action> = action_texts
        .iter()
        .zip(docs.iter())
        .enumerate()
        .map(|(idx, (text, doc))| Action {
            recommendation: trim_chars(text, 180),
            impact: if idx == 0 { "high" } else { "medium" }.to_string(),
            evidence_refs: vec![EvidenceRef::new(
                doc.article_id.clone(),
                doc.url.clone(),
                doc.date.clone(),
            )],
        })
        .collect();

    if actions.is_empty() {
        actions.push(Action {
            recommendation: trim_chars(
                lang.pick("Gather additional data", "Собрать дополнительные данные"),
                180,
            ),
            impact: "medium".to_string(),
            evidence_refs: vec![EvidenceRef::new(
                None,
                None,
                chrono::Utc::now().format("%Y-%m-%d").to_string(),
            )],
        });
    }

    actions
}
