//! Retrieval client trait and implementations.

use async_trait::async_trait;
use insight_core::{Document, EngineError, EngineResult};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A retrieval query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalRequest {
    /// Search query.
    pub query: String,
    /// Time window, e.g. `24h`, `7d`, `1w`.
    pub window: String,
    /// Language filter tag.
    pub lang: String,
    /// Number of documents to return after fusion.
    pub k_final: usize,
    /// Whether to rerank the fused results.
    pub use_rerank: bool,
    /// Optional source filter (domain list).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sources: Option<Vec<String>>,
}

impl RetrievalRequest {
    /// Create a request with the given query and defaults elsewhere.
    #[must_use]
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            window: "24h".to_string(),
            lang: "en".to_string(),
            k_final: 10,
            use_rerank: true,
            sources: None,
        }
    }

    /// Builder: set the time window.
    #[must_use]
    pub fn with_window(mut self, window: impl Into<String>) -> Self {
        self.window = window.into();
        self
    }

    /// Builder: set the language tag.
    #[must_use]
    pub fn with_lang(mut self, lang: impl Into<String>) -> Self {
        self.lang = lang.into();
        self
    }

    /// Builder: set the final document count.
    #[must_use]
    pub fn with_k_final(mut self, k_final: usize) -> Self {
        self.k_final = k_final;
        self
    }

    /// Builder: toggle reranking.
    #[must_use]
    pub fn with_rerank(mut self, use_rerank: bool) -> Self {
        self.use_rerank = use_rerank;
        self
    }

    /// Builder: set the source filter.
    #[must_use]
    pub fn with_sources(mut self, sources: Vec<String>) -> Self {
        self.sources = Some(sources);
        self
    }
}

/// The retrieval backend contract.
#[async_trait]
pub trait RetrievalClient: Send + Sync {
    /// Run one retrieval and return scored documents, best first.
    async fn retrieve(&self, request: RetrievalRequest) -> EngineResult<Vec<Document>>;
}

/// HTTP-backed retrieval client.
pub struct HttpRetrievalClient {
    base_url: String,
    client: reqwest::Client,
}

impl HttpRetrievalClient {
    /// Create a client against the given retrieval service URL.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(base_url: impl Into<String>) -> EngineResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| EngineError::internal(format!("Failed to create HTTP client: {e}")))?;
        Ok(Self {
            base_url: base_url.into(),
            client,
        })
    }
}

#[async_trait]
impl RetrievalClient for HttpRetrievalClient {
    async fn retrieve(&self, request: RetrievalRequest) -> EngineResult<Vec<Document>> {
        debug!(query = %request.query, k_final = request.k_final, "retrieving documents");
        let response = self
            .client
            .post(format!("{}/retrieve", self.base_url))
            .json(&request)
            .send()
            .await
            .map_err(|e| EngineError::retrieval(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(EngineError::retrieval(format!("HTTP {status}")));
        }

        response
            .json::<Vec<Document>>()
            .await
            .map_err(|e| EngineError::retrieval(format!("invalid response body: {e}")))
    }
}

/// In-memory retrieval backed by a fixed document set; used by tests and by
/// offline evaluation runs. Documents whose title or snippet contain any
/// query term (case-insensitive) rank first; ties keep insertion order.
#[derive(Debug, Clone, Default)]
pub struct StaticRetrievalClient {
    documents: Vec<Document>,
}

impl StaticRetrievalClient {
    /// Create a client over a fixed corpus.
    #[must_use]
    pub fn new(documents: Vec<Document>) -> Self {
        Self { documents }
    }
}

#[async_trait]
impl RetrievalClient for StaticRetrievalClient {
    async fn retrieve(&self, request: RetrievalRequest) -> EngineResult<Vec<Document>> {
        let terms: Vec<String> = request
            .query
            .to_lowercase()
            .split_whitespace()
            .map(String::from)
            .collect();

        let mut matched: Vec<Document> = Vec::new();
        let mut rest: Vec<Document> = Vec::new();
        for doc in &self.documents {
            let haystack = format!("{} {}", doc.title, doc.snippet).to_lowercase();
            if terms.iter().any(|t| haystack.contains(t.as_str())) {
                matched.push(doc.clone());
            } else {
                rest.push(doc.clone());
            }
        }
        matched.extend(rest);
        matched.truncate(request.k_final);
        Ok(matched)
    }
}
