//! The retrieval document contract.

use serde::{Deserialize, Serialize};

/// A document as returned by the retrieval backend.
///
/// This is the narrow contract the engine consumes; ingestion, chunking and
/// indexing live behind the retrieval service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Stable article identifier, when the index provides one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub article_id: Option<String>,

    /// Article title.
    pub title: String,

    /// Canonical article URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Publication date in `YYYY-MM-DD` form.
    pub date: String,

    /// Short excerpt selected by the retriever.
    pub snippet: String,

    /// Relevance score assigned by the retriever.
    #[serde(default)]
    pub score: f64,
}

impl Document {
    /// Create a document with the given title and date, empty otherwise.
    #[must_use]
    pub fn new(title: impl Into<String>, date: impl Into<String>) -> Self {
        Self {
            article_id: None,
            title: title.into(),
            url: None,
            date: date.into(),
            snippet: String::new(),
            score: 0.0,
        }
    }

    /// Builder: set the article id.
    #[must_use]
    pub fn with_article_id(mut self, id: impl Into<String>) -> Self {
        self.article_id = Some(id.into());
        self
    }

    /// Builder: set the URL.
    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Builder: set the snippet.
    #[must_use]
    pub fn with_snippet(mut self, snippet: impl Into<String>) -> Self {
        self.snippet = snippet.into();
        self
    }

    /// Builder: set the relevance score.
    #[must_use]
    pub fn with_score(mut self, score: f64) -> Self {
        self.score = score;
        self
    }

    /// Identity key used for deduplication: `(article_id, url)`, first
    /// non-empty component wins.
    #[must_use]
    pub fn dedup_key(&self) -> (Option<&str>, Option<&str>) {
        (self.article_id.as_deref(), self.url.as_deref())
    }
}

/// Merge `new` into `existing`, deduplicated by article id or URL.
/// First-seen documents win; order is preserved.
#[must_use]
pub fn merge_documents(existing: Vec<Document>, new: Vec<Document>) -> Vec<Document> {
    let mut seen_ids: std::collections::HashSet<String> = existing
        .iter()
        .filter_map(|d| d.article_id.clone())
        .collect();
    let mut seen_urls: std::collections::HashSet<String> =
        existing.iter().filter_map(|d| d.url.clone()).collect();

    let mut merged = existing;
    for doc in new {
        if let Some(id) = &doc.article_id {
            if seen_ids.contains(id) {
                continue;
            }
        }
        if let Some(url) = &doc.url {
            if seen_urls.contains(url) {
                continue;
            }
        }
        if let Some(id) = &doc.article_id {
            seen_ids.insert(id.clone());
        }
        if let Some(url) = &doc.url {
            seen_urls.insert(url.clone());
        }
        merged.push(doc);
    }
    merged
}
