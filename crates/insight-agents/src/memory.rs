//! The memory agent: suggest/store/recall against the memory store.

use insight_core::{
    trim_chars, Document, Lang, MemoryOp, MemoryRecord, MemoryResult, MemoryStoreItem,
    MemorySuggestion,
};
use insight_memory::MemoryStore;
use insight_policy::contains_pii;
use std::sync::Arc;
use tracing::warn;

/// The memory agent.
pub struct MemoryAgent {
    store: Arc<dyn MemoryStore>,
}

impl MemoryAgent {
    /// Create an agent over a memory store.
    #[must_use]
    pub fn new(store: Arc<dyn MemoryStore>) -> Self {
        Self { store }
    }

    /// Run one memory operation. Returns the result payload and a short
    /// status line for the response tldr.
    pub async fn run(
        &self,
        operation: MemoryOp,
        docs: &[Document],
        query: &str,
        user_id: Option<&str>,
        lang: Lang,
    ) -> (MemoryResult, String) {
        match operation {
            MemoryOp::Suggest => self.suggest(docs, lang).await,
            MemoryOp::Store => self.store_from_docs(docs, user_id, lang).await,
            MemoryOp::Recall => self.recall(query, user_id, lang).await,
        }
    }

    async fn suggest(&self, docs: &[Document], lang: Lang) -> (MemoryResult, String) {
        let mut suggestions = Vec::new();
        match self.store.suggest(docs, 5).await {
            Ok(candidates) => {
                for candidate in candidates {
                    // PII never enters long-term memory, not even as a proposal.
                    if contains_pii(&candidate.content) {
                        warn!("dropping memory suggestion containing PII");
                        continue;
                    }
                    suggestions.push(MemorySuggestion {
                        memory_type: candidate.memory_type,
                        content: trim_chars(&candidate.content, 200),
                        importance: candidate.importance,
                        ttl_days: candidate.ttl_days,
                    });
                }
            }
            Err(e) => warn!(error = %e, "memory suggest failed"),
        }

        let status = match lang {
            Lang::Ru => format!("Найдено {} кандидатов для сохранения", suggestions.len()),
            Lang::En => format!("Found {} candidates for storage", suggestions.len()),
        };
        (
            MemoryResult {
                operation: "suggest".to_string(),
                suggestions,
                to_store: Vec::new(),
                records: Vec::new(),
            },
            status,
        )
    }

    async fn store_from_docs(
        &self,
        docs: &[Document],
        user_id: Option<&str>,
        lang: Lang,
    ) -> (MemoryResult, String) {
        let mut to_store = Vec::new();

        for doc in docs.iter().take(3) {
            let content = if doc.snippet.is_empty() {
                doc.title.clone()
            } else {
                doc.snippet.clone()
            };
            if content.is_empty() || contains_pii(&content) {
                continue;
            }

            let importance = doc.score.clamp(0.5, 1.0);
            let memory_type = if doc.date.is_empty() { "semantic" } else { "episodic" };
            let ttl_days = if memory_type == "episodic" { 90 } else { 180 };
            let reference = doc
                .article_id
                .clone()
                .or_else(|| doc.url.clone())
                .unwrap_or_default();

            match self
                .store
                .store(
                    &trim_chars(&content, 500),
                    memory_type,
                    importance,
                    ttl_days,
                    vec![reference.clone()],
                    user_id,
                )
                .await
            {
                Ok(_) => to_store.push(MemoryStoreItem {
                    memory_type: memory_type.to_string(),
                    content: trim_chars(&content, 240),
                    refs: vec![reference],
                    ttl_days,
                }),
                Err(e) => warn!(error = %e, "memory store failed"),
            }
        }

        let status = match lang {
            Lang::Ru => format!("Сохранено {} воспоминаний в БД", to_store.len()),
            Lang::En => format!("Stored {} memories in database", to_store.len()),
        };
        (
            MemoryResult {
                operation: "store".to_string(),
                suggestions: Vec::new(),
                to_store,
                records: Vec::new(),
            },
            status,
        )
    }

    async fn recall(&self, query: &str, user_id: Option<&str>, lang: Lang) -> (MemoryResult, String) {
        let effective_query = if query.is_empty() { "recent memories" } else { query };
        let mut records = Vec::new();

        match self.store.recall(effective_query, user_id, 10, 0.5).await {
            Ok(recalled) => {
                for memory in recalled {
                    records.push(MemoryRecord {
                        id: memory.id,
                        memory_type: memory.memory_type,
                        content: trim_chars(&memory.content, 240),
                        ts: memory.created_at.format("%Y-%m-%d").to_string(),
                        refs: memory.refs,
                    });
                }
            }
            Err(e) => warn!(error = %e, "memory recall failed"),
        }

        let status = match lang {
            Lang::Ru => format!("Извлечено {} воспоминаний (similarity ≥ 0.5)", records.len()),
            Lang::En => format!("Retrieved {} memories (similarity ≥ 0.5)", records.len()),
        };
        (
            MemoryResult {
                operation: "recall".to_string(),
                suggestions: Vec::new(),
                to_store: Vec::new(),
                records,
            },
            status,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use insight_memory::{HashingEmbeddings, InMemoryMemoryStore};

    fn agent_and_store() -> (MemoryAgent, Arc<InMemoryMemoryStore>) {
        let store = Arc::new(InMemoryMemoryStore::new(Arc::new(
            HashingEmbeddings::default(),
        )));
        (MemoryAgent::new(Arc::clone(&store) as Arc<dyn MemoryStore>), store)
    }

    fn docs() -> Vec<Document> {
        vec![
            Document::new("AI briefing", "2025-06-01")
                .with_article_id("d1")
                .with_snippet("AI spending rose sharply this quarter")
                .with_score(0.9),
            Document::new("Leak report", "2025-06-02")
                .with_article_id("d2")
                .with_snippet("Contact tipline at leaks@example.com")
                .with_score(0.8),
        ]
    }

    #[tokio::test]
    async fn test_suggest_filters_pii() {
        let (agent, _) = agent_and_store();
        let (result, status) = agent
            .run(MemoryOp::Suggest, &docs(), "", None, Lang::En)
            .await;
        assert_eq!(result.operation, "suggest");
        // The PII-bearing snippet is dropped.
        assert_eq!(result.suggestions.len(), 1);
        assert!(status.contains("1 candidates"));
    }

    #[tokio::test]
    async fn test_store_persists_and_reports() {
        let (agent, store) = agent_and_store();
        let (result, _) = agent.run(MemoryOp::Store, &docs(), "", None, Lang::En).await;
        assert_eq!(result.operation, "store");
        assert_eq!(result.to_store.len(), 1);
        assert_eq!(result.to_store[0].memory_type, "episodic");
        assert_eq!(result.to_store[0].ttl_days, 90);
        assert_eq!(result.to_store[0].refs, vec!["d1".to_string()]);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_recall_roundtrip() {
        let (agent, _) = agent_and_store();
        agent.run(MemoryOp::Store, &docs(), "", None, Lang::En).await;
        let (result, status) = agent
            .run(MemoryOp::Recall, &docs(), "AI spending", None, Lang::En)
            .await;
        assert_eq!(result.operation, "recall");
        assert_eq!(result.records.len(), 1);
        assert!(result.records[0].content.contains("AI spending"));
        assert!(status.contains("Retrieved 1"));
    }

    #[tokio::test]
    async fn test_recall_empty_store() {
        let (agent, _) = agent_and_store();
        let (result, _) = agent.run(MemoryOp::Recall, &[], "", None, Lang::En).await;
        assert!(result.records.is_empty());
    }
}
