//! Memory store trait and the in-process implementation.

use crate::embeddings::{cosine_similarity, EmbeddingsService};
use async_trait::async_trait;
use insight_core::{Document, EngineResult};
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::debug;

/// A stored memory record.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredMemory {
    /// Record id.
    pub id: String,
    /// Memory type: `episodic` or `semantic`.
    pub memory_type: String,
    /// Record content.
    pub content: String,
    /// Importance in `[0.0, 1.0]`.
    pub importance: f64,
    /// Time-to-live in days.
    pub ttl_days: u32,
    /// Source references (article ids or URLs).
    pub refs: Vec<String>,
    /// Owning user, when scoped.
    pub user_id: Option<String>,
    /// Creation timestamp, UTC.
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// A storage suggestion derived from retrieved documents.
#[derive(Debug, Clone, PartialEq)]
pub struct SuggestedMemory {
    /// Memory type: `episodic` or `semantic`.
    pub memory_type: String,
    /// Proposed content.
    pub content: String,
    /// Importance in `[0.0, 1.0]`.
    pub importance: f64,
    /// Proposed time-to-live in days.
    pub ttl_days: u32,
}

/// The long-term memory backend contract.
#[async_trait]
pub trait MemoryStore: Send + Sync {
    /// Persist one memory; returns its id.
    #[allow(clippy::too_many_arguments)]
    async fn store(
        &self,
        content: &str,
        memory_type: &str,
        importance: f64,
        ttl_days: u32,
        refs: Vec<String>,
        user_id: Option<&str>,
    ) -> EngineResult<String>;

    /// Semantic recall: records ranked by similarity to the query, filtered
    /// by user scope and a similarity floor.
    async fn recall(
        &self,
        query: &str,
        user_id: Option<&str>,
        limit: usize,
        min_similarity: f32,
    ) -> EngineResult<Vec<StoredMemory>>;

    /// Propose up to `max` memories worth storing from retrieved documents.
    async fn suggest(&self, docs: &[Document], max: usize) -> EngineResult<Vec<SuggestedMemory>>;
}

/// In-process memory store over an embeddings service.
pub struct InMemoryMemoryStore {
    embeddings: Arc<dyn EmbeddingsService>,
    records: RwLock<Vec<(StoredMemory, Vec<f32>)>>,
}

impl InMemoryMemoryStore {
    /// Create a store over the given embeddings backend.
    #[must_use]
    pub fn new(embeddings: Arc<dyn EmbeddingsService>) -> Self {
        Self {
            embeddings,
            records: RwLock::new(Vec::new()),
        }
    }

    /// Number of stored records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    /// Whether the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

#[async_trait]
impl MemoryStore for InMemoryMemoryStore {
    async fn store(
        &self,
        content: &str,
        memory_type: &str,
        importance: f64,
        ttl_days: u32,
        refs: Vec<String>,
        user_id: Option<&str>,
    ) -> EngineResult<String> {
        let vectors = self.embeddings.embed(&[content.to_string()]).await?;
        let vector = vectors.into_iter().next().unwrap_or_default();

        let id = format!("mem_{}", uuid::Uuid::new_v4().simple());
        let record = StoredMemory {
            id: id.clone(),
            memory_type: memory_type.to_string(),
            content: content.to_string(),
            importance: importance.clamp(0.0, 1.0),
            ttl_days,
            refs,
            user_id: user_id.map(String::from),
            created_at: chrono::Utc::now(),
        };

        debug!(id = %id, memory_type, "stored memory");
        self.records.write().push((record, vector));
        Ok(id)
    }

    async fn recall(
        &self,
        query: &str,
        user_id: Option<&str>,
        limit: usize,
        min_similarity: f32,
    ) -> EngineResult<Vec<StoredMemory>> {
        let vectors = self.embeddings.embed(&[query.to_string()]).await?;
        let query_vector = vectors.into_iter().next().unwrap_or_default();

        let records = self.records.read();
        let mut scored: Vec<(f32, StoredMemory)> = records
            .iter()
            .filter(|(record, _)| match (user_id, &record.user_id) {
                (Some(requested), Some(owner)) => requested == owner,
                (Some(_), None) | (None, _) => true,
            })
            .map(|(record, vector)| (cosine_similarity(&query_vector, vector), record.clone()))
            .filter(|(similarity, _)| *similarity >= min_similarity)
            .collect();

        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        Ok(scored
            .into_iter()
            .take(limit)
            .map(|(_, record)| record)
            .collect())
    }

    async fn suggest(&self, docs: &[Document], max: usize) -> EngineResult<Vec<SuggestedMemory>> {
        let mut suggestions = Vec::new();
        for doc in docs.iter().take(max) {
            let content = if doc.snippet.is_empty() {
                doc.title.clone()
            } else {
                doc.snippet.clone()
            };
            if content.is_empty() {
                continue;
            }
            // Dated coverage is episodic; undated context is semantic.
            let memory_type = if doc.date.is_empty() { "semantic" } else { "episodic" };
            suggestions.push(SuggestedMemory {
                memory_type: memory_type.to_string(),
                content,
                importance: doc.score.clamp(0.5, 1.0),
                ttl_days: if memory_type == "episodic" { 90 } else { 180 },
            });
        }
        Ok(suggestions)
    }
}
