//! The iterative agent: multi-hop retrieval with self-check and query
//! reformulation.

use crate::ModelChain;
use insight_budget::{apply_degradation, BudgetLedger};
use insight_core::{
    merge_documents, trim_chars, Command, CommandParams, Document, IterativeResult, IterativeStep,
    Lang,
};
use insight_retrieval::{RetrievalClient, RetrievalRequest};
use insight_routing::{CallOptions, ModelRouter};
use std::sync::Arc;
use tracing::{info, warn};

/// Maximum query length carried into a step record.
const MAX_QUERY: usize = 180;
/// Maximum reason length carried into a step record.
const MAX_REASON: usize = 200;
/// Token estimate gating each iteration.
const ITERATION_EST_TOKENS: u64 = 500;
/// Cost estimate (cents) gating each iteration.
const ITERATION_EST_CENTS: f64 = 0.5;

/// Inputs for one iterative run.
#[derive(Debug, Clone)]
pub struct IterativeRequest {
    /// The user question.
    pub query: String,
    /// Documents from the initial retrieval.
    pub initial_docs: Vec<Document>,
    /// Iteration count; the caller clamps and the budget may reduce it.
    pub depth: u32,
    /// Run the sufficiency self-check between iterations.
    pub self_check: bool,
    /// Model chain for every call.
    pub chain: ModelChain,
    /// Response language.
    pub lang: Lang,
    /// Retrieval window for re-retrieval.
    pub window: String,
    /// Rerank flag passed to re-retrieval.
    pub use_rerank: bool,
}

/// Agent for iterative deep-dive question answering.
pub struct IterativeAgent {
    router: Arc<ModelRouter>,
    retrieval: Arc<dyn RetrievalClient>,
}

impl IterativeAgent {
    /// Create an agent over its collaborators.
    #[must_use]
    pub fn new(router: Arc<ModelRouter>, retrieval: Arc<dyn RetrievalClient>) -> Self {
        Self { router, retrieval }
    }

    /// Execute the retrieve-reason-refine loop.
    ///
    /// Returns the result payload, every document consulted (for the
    /// evidence builder), and the label of the model that produced the last
    /// successful call (for response metadata). The degradation table is
    /// re-evaluated between iterations as spend accumulates, shrinking the
    /// remaining depth and disabling the self-check and rerank; exhaustion
    /// of any dimension stops the loop early with a warning. The
    /// accumulated answer is still synthesized.
    pub async fn run(
        &self,
        request: IterativeRequest,
        ledger: &mut BudgetLedger,
    ) -> (IterativeResult, Vec<Document>, Option<String>) {
        let mut steps: Vec<IterativeStep> = Vec::new();
        let mut all_docs = request.initial_docs.clone();
        let mut current_query = request.query.clone();
        let mut answer_parts: Vec<String> = Vec::new();
        let mut model_used: Option<String> = None;

        let mut depth = request.depth;
        let mut self_check = request.self_check;
        let mut use_rerank = request.use_rerank;

        info!(
            query = %request.query,
            depth,
            lang = ?request.lang,
            "starting iterative run"
        );

        let mut iteration = 1;
        while iteration <= depth {
            if !ledger.can_afford(ITERATION_EST_TOKENS, ITERATION_EST_CENTS, 0.0) {
                warn!(iteration, "budget insufficient, stopping early");
                ledger.push_warning(format!(
                    "Stopped at iteration {}/{} due to budget",
                    iteration - 1,
                    depth
                ));
                break;
            }

            // Earlier calls may have pushed a budget dimension under its
            // threshold; re-apply the table to the remaining work.
            if iteration > 1 && ledger.should_degrade() {
                let degraded = apply_degradation(
                    ledger,
                    Command::Ask,
                    CommandParams {
                        depth,
                        self_check,
                        use_rerank,
                        ..CommandParams::default()
                    },
                );
                depth = degraded.depth.min(depth);
                self_check = degraded.self_check;
                use_rerank = degraded.use_rerank;
                if iteration > depth {
                    break;
                }
            }

            let (docs_for_iter, reason) = if iteration == 1 {
                (
                    request.initial_docs.clone(),
                    request
                        .lang
                        .pick("Initial retrieval and analysis", "Первоначальный поиск и анализ")
                        .to_string(),
                )
            } else {
                let (needs_reformulation, reformulated) = if self_check {
                    self.check_sufficiency(
                        &current_query,
                        &all_docs,
                        &answer_parts.join(" "),
                        &request.chain,
                        request.lang,
                        ledger,
                        &mut model_used,
                    )
                    .await
                } else {
                    (false, current_query.clone())
                };

                if needs_reformulation {
                    current_query = trim_chars(&reformulated, MAX_QUERY);
                    info!(iteration, query = %current_query, "query reformulated");
                    let new_docs = self
                        .retrieval
                        .retrieve(
                            RetrievalRequest::new(current_query.clone())
                                .with_window(request.window.clone())
                                .with_k_final(5)
                                .with_rerank(use_rerank),
                        )
                        .await
                        .unwrap_or_else(|e| {
                            warn!(error = %e, "re-retrieval failed, continuing on accumulated docs");
                            Vec::new()
                        });
                    all_docs = merge_documents(all_docs, new_docs.clone());
                    let docs = if new_docs.is_empty() {
                        all_docs.iter().take(10).cloned().collect()
                    } else {
                        new_docs
                    };
                    (
                        docs,
                        request
                            .lang
                            .pick(
                                "Query reformulated for deeper evidence",
                                "Запрос переформулирован для углубления",
                            )
                            .to_string(),
                    )
                } else {
                    (
                        all_docs.iter().take(10).cloned().collect(),
                        request
                            .lang
                            .pick("Self-check and refinement", "Самопроверка и уточнение")
                            .to_string(),
                    )
                }
            };

            let iter_answer = self
                .generate_answer(
                    &current_query,
                    &docs_for_iter,
                    iteration,
                    &request.chain,
                    request.lang,
                    ledger,
                    &mut model_used,
                )
                .await;
            answer_parts.push(iter_answer);

            steps.push(IterativeStep {
                iteration,
                query: trim_chars(&current_query, MAX_QUERY),
                n_docs: docs_for_iter.len(),
                reason: trim_chars(&reason, MAX_REASON),
            });

            info!(iteration, docs = docs_for_iter.len(), "iteration complete");
            iteration += 1;
        }

        let final_answer = self
            .synthesize_answer(
                &request.query,
                &answer_parts,
                &all_docs,
                &request.chain,
                request.lang,
                ledger,
                &mut model_used,
            )
            .await;
        let followups = generate_followups(&final_answer, request.lang);

        let result = IterativeResult {
            steps,
            answer: trim_chars(&final_answer, 600),
            followups: followups.into_iter().take(5).collect(),
        };

        (result, all_docs, model_used)
    }

    /// Sufficiency self-check: classify whether the accumulated evidence
    /// answers the question, optionally reformulating the query.
    ///
    /// Returns `(needs_reformulation, query)`. A failed call counts as
    /// sufficient so the loop proceeds on what it has.
    #[allow(clippy::too_many_arguments)]
    async fn check_sufficiency(
        &self,
        query: &str,
        docs: &[Document],
        answer_so_far: &str,
        chain: &ModelChain,
        lang: Lang,
        ledger: &mut BudgetLedger,
        model_used: &mut Option<String>,
    ) -> (bool, String) {
        let prompt = match lang {
            Lang::Ru => format!(
                "Вопрос: {query}\n\nТекущий ответ: {answer_so_far}\n\nДоступные источники: {}\n\n\
                 Достаточно ли информации для полного ответа? Если нет, переформулируй запрос \
                 для более глубокого поиска.\n\nОтветь в формате:\nSUFFICIENT: yes|no\n\
                 REFORMULATED_QUERY: <новый запрос если no>",
                docs.len()
            ),
            Lang::En => format!(
                "Question: {query}\n\nCurrent answer: {answer_so_far}\n\nAvailable sources: {}\n\n\
                 Is the information sufficient for a complete answer? If not, reformulate the \
                 query for deeper search.\n\nAnswer in format:\nSUFFICIENT: yes|no\n\
                 REFORMULATED_QUERY: <new query if no>",
                docs.len()
            ),
        };

        let context_docs: Vec<Document> = docs.iter().take(3).cloned().collect();
        let opts = CallOptions::default()
            .with_timeout_s(10)
            .with_max_output_tokens(200)
            .with_temperature(0.3);

        match self
            .router
            .call_with_fallback(&prompt, &context_docs, &chain.primary, &chain.fallback, opts)
            .await
        {
            Ok((reply, usage)) => {
                ledger.record_usage(usage.tokens_used, usage.cost_cents, usage.latency_s());
                *model_used = Some(reply.model);
                let content = reply.content;
                if content.contains("SUFFICIENT: yes") {
                    (false, query.to_string())
                } else if content.contains("REFORMULATED_QUERY:") {
                    let tail = content
                        .rsplit("REFORMULATED_QUERY:")
                        .next()
                        .unwrap_or_default();
                    (true, trim_chars(tail.trim(), MAX_QUERY))
                } else {
                    // Unparseable reply: assume the evidence is insufficient.
                    (true, format!("{query} (detailed evidence)"))
                }
            }
            Err(e) => {
                warn!(error = %e, "sufficiency check failed");
                (false, query.to_string())
            }
        }
    }

    /// Generate the answer fragment for one iteration.
    #[allow(clippy::too_many_arguments)]
    async fn generate_answer(
        &self,
        query: &str,
        docs: &[Document],
        iteration: u32,
        chain: &ModelChain,
        lang: Lang,
        ledger: &mut BudgetLedger,
        model_used: &mut Option<String>,
    ) -> String {
        let prompt = match lang {
            Lang::Ru => format!(
                "На основе источников ниже, ответь на вопрос (итерация {iteration}):\n\n\
                 Вопрос: {query}\n\nВажно: опирайся только на факты из источников. \
                 Укажи номера источников [1], [2] и т.д."
            ),
            Lang::En => format!(
                "Based on the sources below, answer the question (iteration {iteration}):\n\n\
                 Question: {query}\n\nImportant: use only facts from sources. \
                 Cite source numbers [1], [2] etc."
            ),
        };

        let context_docs: Vec<Document> = docs.iter().take(10).cloned().collect();
        let opts = CallOptions::default()
            .with_timeout_s(15)
            .with_max_output_tokens(400)
            .with_temperature(0.7);

        match self
            .router
            .call_with_fallback(&prompt, &context_docs, &chain.primary, &chain.fallback, opts)
            .await
        {
            Ok((reply, usage)) => {
                ledger.record_usage(usage.tokens_used, usage.cost_cents, usage.latency_s());
                *model_used = Some(reply.model);
                trim_chars(&reply.content, 500)
            }
            Err(e) => {
                warn!(error = %e, iteration, "answer generation failed");
                format!("Unable to generate answer for iteration {iteration}: {e}")
            }
        }
    }

    /// Merge the per-iteration fragments into the final answer.
    #[allow(clippy::too_many_arguments)]
    async fn synthesize_answer(
        &self,
        query: &str,
        answer_parts: &[String],
        docs: &[Document],
        chain: &ModelChain,
        lang: Lang,
        ledger: &mut BudgetLedger,
        model_used: &mut Option<String>,
    ) -> String {
        let combined = answer_parts.join("\n\n");

        let prompt = match lang {
            Lang::Ru => format!(
                "Объедини результаты нескольких итераций анализа в финальный ответ на вопрос:\n\n\
                 Вопрос: {query}\n\nРезультаты итераций:\n{combined}\n\n\
                 Дай связный итоговый ответ (≤600 символов), указывая номера источников."
            ),
            Lang::En => format!(
                "Synthesize the results of multiple analysis iterations into a final answer:\n\n\
                 Question: {query}\n\nIteration results:\n{combined}\n\n\
                 Provide a coherent final answer (≤600 chars), citing source numbers."
            ),
        };

        let context_docs: Vec<Document> = docs.iter().take(5).cloned().collect();
        let opts = CallOptions::default()
            .with_timeout_s(12)
            .with_max_output_tokens(600)
            .with_temperature(0.7);

        match self
            .router
            .call_with_fallback(&prompt, &context_docs, &chain.primary, &chain.fallback, opts)
            .await
        {
            Ok((reply, usage)) => {
                ledger.record_usage(usage.tokens_used, usage.cost_cents, usage.latency_s());
                *model_used = Some(reply.model);
                trim_chars(&reply.content, 600)
            }
            Err(e) => {
                warn!(error = %e, "answer synthesis failed, concatenating fragments");
                trim_chars(&combined, 600)
            }
        }
    }
}

/// Up to five follow-up questions seeded by keyword heuristics.
fn generate_followups(answer: &str, lang: Lang) -> Vec<String> {
    let mut followups: Vec<String> = match lang {
        Lang::Ru => vec![
            "Нужно ли углубиться в конкретные метрики?".into(),
            "Какие дополнительные источники могут помочь?".into(),
            "Есть ли альтернативные точки зрения?".into(),
        ],
        Lang::En => vec![
            "Should we dive deeper into specific metrics?".into(),
            "What additional sources might help?".into(),
            "Are there alternative perspectives to consider?".into(),
        ],
    };

    if answer.contains("AI") || answer.to_lowercase().contains("artificial intelligence") {
        followups.insert(
            0,
            lang.pick(
                "What are the regulatory implications?",
                "Каковы регуляторные последствия?",
            )
            .to_string(),
        );
    }

    followups
}
