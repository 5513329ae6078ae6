//! Embeddings interface and the deterministic in-process fallback.

use async_trait::async_trait;
use insight_core::EngineResult;

/// Text embedding backend.
#[async_trait]
pub trait EmbeddingsService: Send + Sync {
    /// Embed a batch of texts into fixed-size vectors.
    async fn embed(&self, texts: &[String]) -> EngineResult<Vec<Vec<f32>>>;
}

/// Deterministic feature-hashing embedder.
///
/// Tokens are hashed into a fixed number of buckets and the resulting counts
/// are L2-normalized. Not semantically meaningful, but stable and good
/// enough to rank exact and near-exact token overlap for recall.
#[derive(Debug, Clone)]
pub struct HashingEmbeddings {
    dimensions: usize,
}

impl Default for HashingEmbeddings {
    fn default() -> Self {
        Self { dimensions: 256 }
    }
}

impl HashingEmbeddings {
    /// Create an embedder with the given vector size.
    #[must_use]
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions: dimensions.max(8),
        }
    }

    fn embed_one(&self, text: &str) -> Vec<f32> {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let mut vector = vec![0.0f32; self.dimensions];
        for token in text.to_lowercase().split(|c: char| !c.is_alphanumeric()) {
            if token.is_empty() {
                continue;
            }
            let mut hasher = DefaultHasher::new();
            token.hash(&mut hasher);
            let bucket = (hasher.finish() as usize) % self.dimensions;
            vector[bucket] += 1.0;
        }

        let norm: f32 = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for value in &mut vector {
                *value /= norm;
            }
        }
        vector
    }
}

#[async_trait]
impl EmbeddingsService for HashingEmbeddings {
    async fn embed(&self, texts: &[String]) -> EngineResult<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|text| self.embed_one(text)).collect())
    }
}

/// Cosine similarity between two vectors of equal length.
#[must_use]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_deterministic() {
        let embedder = HashingEmbeddings::default();
        let a = embedder.embed(&["market update".to_string()]).await.unwrap();
        let b = embedder.embed(&["market update".to_string()]).await.unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn test_identical_texts_similarity_one() {
        let embedder = HashingEmbeddings::default();
        let vectors = embedder
            .embed(&["ai chips rally".to_string(), "ai chips rally".to_string()])
            .await
            .unwrap();
        let sim = cosine_similarity(&vectors[0], &vectors[1]);
        assert!((sim - 1.0).abs() < 1e-5);
    }

    #[tokio::test]
    async fn test_disjoint_texts_low_similarity() {
        let embedder = HashingEmbeddings::default();
        let vectors = embedder
            .embed(&["alpha beta gamma".to_string(), "delta epsilon zeta".to_string()])
            .await
            .unwrap();
        let sim = cosine_similarity(&vectors[0], &vectors[1]);
        assert!(sim < 0.5);
    }
}
