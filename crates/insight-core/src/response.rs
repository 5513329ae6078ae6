//! Response and error envelopes.
//!
//! The success envelope is built once per request, mutated only by the
//! response builder and the evidence sanitizer, and immutable after
//! validation. Length limits are enforced by the policy layer; the constants
//! live here next to the types they constrain.

use crate::error::ErrorCode;
use crate::result::CommandResult;
use serde::{Deserialize, Serialize};

/// Maximum header length in characters.
pub const MAX_HEADER: usize = 100;
/// Maximum tldr length in characters.
pub const MAX_TLDR: usize = 220;
/// Maximum insight text length in characters.
pub const MAX_INSIGHT: usize = 180;
/// Maximum evidence snippet length in characters.
pub const MAX_SNIPPET: usize = 240;
/// Maximum evidence title length in characters.
pub const MAX_TITLE: usize = 200;
/// Minimum number of insights.
pub const MIN_INSIGHTS: usize = 1;
/// Maximum number of insights.
pub const MAX_INSIGHTS: usize = 5;

/// Kind of an insight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightKind {
    /// A statement directly supported by evidence.
    Fact,
    /// A plausible but unconfirmed interpretation.
    Hypothesis,
    /// A suggested course of action.
    Recommendation,
    /// A contradiction between sources.
    Conflict,
}

/// A reference from an insight (or action, driver, conflict) to evidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceRef {
    /// Referenced article id, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub article_id: Option<String>,
    /// Referenced URL; must be http(s) when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Publication date, `YYYY-MM-DD`.
    pub date: String,
}

impl EvidenceRef {
    /// Build a reference from optional id/url and a date.
    #[must_use]
    pub fn new(article_id: Option<String>, url: Option<String>, date: impl Into<String>) -> Self {
        Self {
            article_id,
            url,
            date: date.into(),
        }
    }
}

/// A single insight with its supporting references.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insight {
    /// Insight kind tag.
    #[serde(rename = "type")]
    pub kind: InsightKind,
    /// Insight text, at most [`MAX_INSIGHT`] characters.
    pub text: String,
    /// Supporting references; at least one is required.
    pub evidence_refs: Vec<EvidenceRef>,
}

/// A supporting document entry in the envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evidence {
    /// Source title, at most [`MAX_TITLE`] characters.
    pub title: String,
    /// Article id, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub article_id: Option<String>,
    /// Source URL; must be http(s) when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Publication date, `YYYY-MM-DD`.
    pub date: String,
    /// Excerpt, at most [`MAX_SNIPPET`] characters.
    pub snippet: String,
}

/// Response metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meta {
    /// Overall confidence in `[0.0, 1.0]`, already trust-weighted.
    pub confidence: f64,
    /// Label of the model that produced the primary content.
    pub model: String,
    /// Engine version string.
    pub version: String,
    /// Request correlation id; never empty.
    pub correlation_id: String,
    /// Experiment id when an arm was applied.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub experiment: Option<String>,
    /// Arm id when an arm was applied.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arm: Option<String>,
    /// Iteration count for iterative commands.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iterations: Option<u32>,
}

impl Meta {
    /// Build metadata with confidence clamped into `[0.0, 1.0]`.
    #[must_use]
    pub fn new(
        confidence: f64,
        model: impl Into<String>,
        version: impl Into<String>,
        correlation_id: impl Into<String>,
    ) -> Self {
        Self {
            confidence: confidence.clamp(0.0, 1.0),
            model: model.into(),
            version: version.into(),
            correlation_id: correlation_id.into(),
            experiment: None,
            arm: None,
            iterations: None,
        }
    }

    /// Builder: attach the applied experiment and arm.
    #[must_use]
    pub fn with_experiment(mut self, experiment: impl Into<String>, arm: impl Into<String>) -> Self {
        self.experiment = Some(experiment.into());
        self.arm = Some(arm.into());
        self
    }

    /// Builder: record the iteration count.
    #[must_use]
    pub fn with_iterations(mut self, iterations: u32) -> Self {
        self.iterations = Some(iterations);
        self
    }

    /// Re-clamp confidence after applying a multiplier.
    pub fn scale_confidence(&mut self, multiplier: f64) {
        self.confidence = (self.confidence * multiplier).clamp(0.0, 1.0);
    }
}

/// The success envelope returned for every completed command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResponse {
    /// Short header, at most [`MAX_HEADER`] characters.
    pub header: String,
    /// One-paragraph summary, at most [`MAX_TLDR`] characters.
    pub tldr: String,
    /// One to five insights.
    pub insights: Vec<Insight>,
    /// At least one evidence entry.
    pub evidence: Vec<Evidence>,
    /// Command-specific result payload.
    pub result: CommandResult,
    /// Response metadata.
    pub meta: Meta,
    /// Warnings accumulated by degradation and fallbacks; possibly empty.
    #[serde(default)]
    pub warnings: Vec<String>,
}

/// The error envelope returned when a command cannot produce a valid response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code from the closed set.
    pub error: ErrorCode,
    /// Short non-technical sentence for end users.
    pub user_message: String,
    /// Developer-oriented detail with the last fault's text.
    pub tech_message: String,
    /// Whether retrying the identical request may succeed.
    pub retryable: bool,
    /// Response metadata (confidence 0.0).
    pub meta: Meta,
}

/// Either envelope, serialized untagged: the error envelope is recognized by
/// its `error` field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EngineResponse {
    /// A failed command.
    Error(ErrorResponse),
    /// A completed command.
    Success(Box<AnalysisResponse>),
}

impl EngineResponse {
    /// The success envelope, when present.
    #[must_use]
    pub fn success(&self) -> Option<&AnalysisResponse> {
        match self {
            Self::Success(resp) => Some(resp),
            Self::Error(_) => None,
        }
    }

    /// The error envelope, when present.
    #[must_use]
    pub fn error(&self) -> Option<&ErrorResponse> {
        match self {
            Self::Error(err) => Some(err),
            Self::Success(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::{IterativeResult, IterativeStep};

    fn sample_response() -> AnalysisResponse {
        AnalysisResponse {
            header: "Deep Dive".into(),
            tldr: "Iterative analysis with query refinement.".into(),
            insights: vec![Insight {
                kind: InsightKind::Fact,
                text: "Adoption keeps accelerating.".into(),
                evidence_refs: vec![EvidenceRef::new(
                    Some("a1".into()),
                    Some("https://reuters.com/a1".into()),
                    "2025-06-01",
                )],
            }],
            evidence: vec![Evidence {
                title: "AI adoption report".into(),
                article_id: Some("a1".into()),
                url: Some("https://reuters.com/a1".into()),
                date: "2025-06-01".into(),
                snippet: "Enterprise adoption grew 40% year over year.".into(),
            }],
            result: CommandResult::Iterative(IterativeResult {
                steps: vec![IterativeStep {
                    iteration: 1,
                    query: "How is AI adoption progressing?".into(),
                    n_docs: 3,
                    reason: "Initial retrieval and analysis".into(),
                }],
                answer: "Adoption is progressing quickly [1].".into(),
                followups: vec!["What about regulation?".into()],
            }),
            meta: Meta::new(0.78, "gpt-5", "insight-v0.1", "ask-abc12345")
                .with_iterations(1),
            warnings: vec![],
        }
    }

    #[test]
    fn test_envelope_json_roundtrip() {
        let response = sample_response();
        let json = serde_json::to_string(&response).unwrap();
        let back: AnalysisResponse = serde_json::from_str(&json).unwrap();
        assert_eq!(response, back);
    }

    #[test]
    fn test_engine_response_untagged() {
        let success = EngineResponse::Success(Box::new(sample_response()));
        let json = serde_json::to_string(&success).unwrap();
        assert!(!json.contains("\"error\""));
        let back: EngineResponse = serde_json::from_str(&json).unwrap();
        assert!(back.success().is_some());

        let error = EngineResponse::Error(ErrorResponse {
            error: ErrorCode::NoData,
            user_message: "No matching articles were found".into(),
            tech_message: "retrieval returned 0 docs".into(),
            retryable: true,
            meta: Meta::new(0.0, "unknown", "insight-v0.1", "events-dead0000"),
        });
        let json = serde_json::to_string(&error).unwrap();
        assert!(json.contains("\"NO_DATA\""));
        let back: EngineResponse = serde_json::from_str(&json).unwrap();
        assert!(back.error().is_some());
    }

    #[test]
    fn test_meta_confidence_clamped() {
        let meta = Meta::new(1.4, "gpt-5", "v", "c");
        assert!((meta.confidence - 1.0).abs() < f64::EPSILON);
        let mut meta = Meta::new(0.8, "gpt-5", "v", "c");
        meta.scale_confidence(0.5);
        assert!((meta.confidence - 0.4).abs() < 1e-9);
        meta.scale_confidence(10.0);
        assert!((meta.confidence - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_insight_kind_tag() {
        let insight = Insight {
            kind: InsightKind::Recommendation,
            text: "Do the thing.".into(),
            evidence_refs: vec![EvidenceRef::new(None, None, "2025-06-01")],
        };
        let json = serde_json::to_string(&insight).unwrap();
        assert!(json.contains("\"type\":\"recommendation\""));
    }
}
