//! Post-hoc validation of complete response envelopes and result shapes.
//!
//! Checks fail fast and report the first violated invariant. The validator
//! holds only the domain policy; it is cheap to share behind an `Arc` and is
//! re-entrant after construction.

use crate::domains::DomainPolicy;
use crate::pii::contains_pii;
use insight_core::response::{
    AnalysisResponse, Evidence, Insight, MAX_HEADER, MAX_INSIGHT, MAX_INSIGHTS, MAX_SNIPPET,
    MAX_TITLE, MAX_TLDR, MIN_INSIGHTS,
};
use insight_core::result::{CommandResult, MAX_ANSWER, MAX_SUMMARY};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::warn;

static DATE_REGEX: Lazy<Regex> = Lazy::new(|| {
    #[allow(clippy::unwrap_used)]
    Regex::new(r"^\d{4}-\d{2}-\d{2}$").unwrap()
});

/// A violated policy invariant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyViolation {
    /// Short non-technical sentence for end users.
    pub user_message: String,
    /// Developer-oriented detail naming the violated invariant.
    pub tech_message: String,
}

impl PolicyViolation {
    fn new(user: impl Into<String>, tech: impl Into<String>) -> Self {
        Self {
            user_message: user.into(),
            tech_message: tech.into(),
        }
    }
}

impl std::fmt::Display for PolicyViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.tech_message)
    }
}

/// Centralized validator for every response the engine emits.
#[derive(Debug, Clone, Default)]
pub struct PolicyValidator {
    domains: DomainPolicy,
}

impl PolicyValidator {
    /// Create a validator with the given domain policy.
    #[must_use]
    pub fn new(domains: DomainPolicy) -> Self {
        Self { domains }
    }

    /// Validate a complete success envelope against all policies.
    ///
    /// Check order: lengths, evidence-required, PII, domain safety,
    /// required fields. The first failure is returned.
    pub fn validate_response(&self, response: &AnalysisResponse) -> Result<(), PolicyViolation> {
        self.check_lengths(response)?;
        self.check_evidence_required(&response.insights)?;
        self.check_pii(response)?;
        self.check_domains(&response.evidence)?;
        self.check_required_fields(response)?;
        Ok(())
    }

    fn check_lengths(&self, response: &AnalysisResponse) -> Result<(), PolicyViolation> {
        if response.header.chars().count() > MAX_HEADER {
            return Err(PolicyViolation::new(
                "Response header too long",
                format!(
                    "Header length {} exceeds {MAX_HEADER}",
                    response.header.chars().count()
                ),
            ));
        }
        if response.tldr.chars().count() > MAX_TLDR {
            return Err(PolicyViolation::new(
                "Summary too long",
                format!(
                    "TL;DR length {} exceeds {MAX_TLDR}",
                    response.tldr.chars().count()
                ),
            ));
        }
        if response.insights.len() < MIN_INSIGHTS {
            return Err(PolicyViolation::new(
                "Insufficient insights",
                format!("Need at least {MIN_INSIGHTS} insight"),
            ));
        }
        if response.insights.len() > MAX_INSIGHTS {
            return Err(PolicyViolation::new(
                "Too many insights",
                format!("Max {MAX_INSIGHTS} insights allowed"),
            ));
        }
        for (i, insight) in response.insights.iter().enumerate() {
            if insight.text.chars().count() > MAX_INSIGHT {
                return Err(PolicyViolation::new(
                    format!("Insight {} too long", i + 1),
                    format!(
                        "Insight text length {} exceeds {MAX_INSIGHT}",
                        insight.text.chars().count()
                    ),
                ));
            }
        }
        for (i, ev) in response.evidence.iter().enumerate() {
            if ev.snippet.chars().count() > MAX_SNIPPET {
                return Err(PolicyViolation::new(
                    format!("Evidence snippet {} too long", i + 1),
                    format!(
                        "Snippet length {} exceeds {MAX_SNIPPET}",
                        ev.snippet.chars().count()
                    ),
                ));
            }
            if ev.title.chars().count() > MAX_TITLE {
                return Err(PolicyViolation::new(
                    format!("Evidence title {} too long", i + 1),
                    format!(
                        "Title length {} exceeds {MAX_TITLE}",
                        ev.title.chars().count()
                    ),
                ));
            }
        }
        Ok(())
    }

    fn check_evidence_required(&self, insights: &[Insight]) -> Result<(), PolicyViolation> {
        for (i, insight) in insights.iter().enumerate() {
            if insight.evidence_refs.is_empty() {
                let preview: String = insight.text.chars().take(50).collect();
                return Err(PolicyViolation::new(
                    format!("Insight {} missing evidence", i + 1),
                    format!("Insight '{preview}...' has no evidence_refs (required)"),
                ));
            }
            for evidence_ref in &insight.evidence_refs {
                if evidence_ref.date.is_empty() {
                    return Err(PolicyViolation::new(
                        "Evidence reference missing date",
                        format!("Evidence ref in insight {} missing required date field", i + 1),
                    ));
                }
                if !DATE_REGEX.is_match(&evidence_ref.date) {
                    return Err(PolicyViolation::new(
                        "Invalid evidence date format",
                        format!("Date {} must be YYYY-MM-DD format", evidence_ref.date),
                    ));
                }
            }
        }
        Ok(())
    }

    fn check_pii(&self, response: &AnalysisResponse) -> Result<(), PolicyViolation> {
        if contains_pii(&response.tldr) {
            return Err(PolicyViolation::new(
                "Response contains sensitive information",
                "PII detected in TL;DR",
            ));
        }
        for (i, insight) in response.insights.iter().enumerate() {
            if contains_pii(&insight.text) {
                return Err(PolicyViolation::new(
                    "Insight contains sensitive information",
                    format!("PII detected in insight {}", i + 1),
                ));
            }
        }
        for (i, ev) in response.evidence.iter().enumerate() {
            if contains_pii(&ev.snippet) {
                return Err(PolicyViolation::new(
                    "Evidence contains sensitive information",
                    format!("PII detected in evidence snippet {}", i + 1),
                ));
            }
        }
        Ok(())
    }

    fn check_domains(&self, evidence: &[Evidence]) -> Result<(), PolicyViolation> {
        for (i, ev) in evidence.iter().enumerate() {
            if !self.domains.is_safe(ev.url.as_deref()) {
                warn!(url = ?ev.url, "evidence from blacklisted domain");
                return Err(PolicyViolation::new(
                    "Evidence from untrusted source",
                    format!("Evidence {} from blacklisted domain: {:?}", i + 1, ev.url),
                ));
            }
            if let Some(url) = &ev.url {
                if !url.starts_with("http://") && !url.starts_with("https://") {
                    return Err(PolicyViolation::new(
                        "Invalid evidence URL",
                        format!("Evidence {} URL must start with http:// or https://", i + 1),
                    ));
                }
            }
        }
        Ok(())
    }

    fn check_required_fields(&self, response: &AnalysisResponse) -> Result<(), PolicyViolation> {
        if response.header.is_empty() {
            return Err(PolicyViolation::new(
                "Missing response header",
                "header field is required",
            ));
        }
        if response.tldr.is_empty() {
            return Err(PolicyViolation::new("Missing summary", "tldr field is required"));
        }
        if response.insights.is_empty() {
            return Err(PolicyViolation::new(
                "Missing insights",
                "At least 1 insight is required",
            ));
        }
        if response.evidence.is_empty() {
            return Err(PolicyViolation::new(
                "Missing evidence",
                "At least 1 evidence item is required",
            ));
        }
        if response.meta.model.is_empty() {
            return Err(PolicyViolation::new(
                "Missing model information",
                "meta.model is required",
            ));
        }
        if response.meta.correlation_id.is_empty() {
            return Err(PolicyViolation::new(
                "Missing correlation ID",
                "meta.correlation_id is required",
            ));
        }
        Ok(())
    }

    /// Validate command-specific result invariants, dispatching on the tag.
    pub fn validate_result_shape(&self, result: &CommandResult) -> Result<(), PolicyViolation> {
        match result {
            CommandResult::Iterative(iterative) => {
                if iterative.steps.is_empty() {
                    return Err(PolicyViolation::new(
                        "Empty analysis steps",
                        "At least one step required",
                    ));
                }
                if iterative.answer.is_empty() {
                    return Err(PolicyViolation::new(
                        "Missing answer",
                        "answer required in iterative result",
                    ));
                }
                if iterative.answer.chars().count() > MAX_ANSWER {
                    return Err(PolicyViolation::new(
                        "Answer too long",
                        format!(
                            "answer length {} exceeds {MAX_ANSWER}",
                            iterative.answer.chars().count()
                        ),
                    ));
                }
            }
            CommandResult::Events(events) => {
                if events.events.is_empty() {
                    return Err(PolicyViolation::new(
                        "No events found",
                        "events list cannot be empty",
                    ));
                }
                for link in &events.causal_links {
                    if !(0.0..=1.0).contains(&link.confidence) {
                        return Err(PolicyViolation::new(
                            "Invalid causal confidence",
                            format!("causal confidence {} must be in [0, 1]", link.confidence),
                        ));
                    }
                    if link.evidence_refs.is_empty() {
                        return Err(PolicyViolation::new(
                            "Causal link missing evidence",
                            "All causal links must have at least 1 evidence_ref",
                        ));
                    }
                }
            }
            CommandResult::Graph(graph) => {
                if graph.answer.is_empty() {
                    return Err(PolicyViolation::new(
                        "Missing graph answer",
                        "answer required in graph result",
                    ));
                }
                for edge in &graph.subgraph.edges {
                    if !(0.0..=1.0).contains(&edge.weight) {
                        return Err(PolicyViolation::new(
                            "Invalid edge weight",
                            format!("edge weight {} must be in [0, 1]", edge.weight),
                        ));
                    }
                }
            }
            CommandResult::Memory(memory) => {
                if memory.operation.is_empty() {
                    return Err(PolicyViolation::new(
                        "Missing memory operation",
                        "operation field required in memory result",
                    ));
                }
            }
            CommandResult::Synthesis(synthesis) => {
                if synthesis.summary.chars().count() > MAX_SUMMARY {
                    return Err(PolicyViolation::new(
                        "Synthesis summary too long",
                        format!(
                            "summary length {} exceeds {MAX_SUMMARY}",
                            synthesis.summary.chars().count()
                        ),
                    ));
                }
                if synthesis.actions.is_empty() {
                    return Err(PolicyViolation::new(
                        "No actions generated",
                        "actions list must have at least 1 recommendation",
                    ));
                }
                for (i, action) in synthesis.actions.iter().enumerate() {
                    if action.evidence_refs.is_empty() {
                        return Err(PolicyViolation::new(
                            format!("Action {} missing evidence", i + 1),
                            "All actions must have at least 1 evidence_ref",
                        ));
                    }
                    if !matches!(action.impact.as_str(), "low" | "medium" | "high") {
                        return Err(PolicyViolation::new(
                            "Invalid action impact",
                            format!("impact must be low/medium/high, got '{}'", action.impact),
                        ));
                    }
                }
                for (i, conflict) in synthesis.conflicts.iter().enumerate() {
                    if conflict.evidence_refs.len() < 2 {
                        return Err(PolicyViolation::new(
                            format!("Conflict {} needs more evidence", i + 1),
                            "Conflicts require at least 2 evidence_refs (contradictory sources)",
                        ));
                    }
                }
            }
            CommandResult::Forecast(forecast) => {
                if forecast.forecast.is_empty() {
                    return Err(PolicyViolation::new(
                        "Empty forecast",
                        "forecast list cannot be empty",
                    ));
                }
                for (i, item) in forecast.forecast.iter().enumerate() {
                    if item.confidence_interval.lower > item.confidence_interval.upper {
                        return Err(PolicyViolation::new(
                            "Invalid confidence interval",
                            format!(
                                "forecast[{i}] interval [{}, {}] is not ordered",
                                item.confidence_interval.lower, item.confidence_interval.upper
                            ),
                        ));
                    }
                    if item.drivers.is_empty() {
                        return Err(PolicyViolation::new(
                            "No forecast drivers",
                            format!("forecast[{i}] must have at least 1 driver"),
                        ));
                    }
                }
            }
            CommandResult::Competitors(competitors) => {
                if competitors.positioning.is_empty() {
                    return Err(PolicyViolation::new(
                        "No competitive positioning",
                        "positioning list cannot be empty",
                    ));
                }
                if competitors.top_domains.is_empty() {
                    return Err(PolicyViolation::new(
                        "No domains found",
                        "top_domains list cannot be empty",
                    ));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use insight_core::response::{Evidence, EvidenceRef, Insight, InsightKind, Meta};
    use insight_core::result::{
        Action, CommandResult, ConfidenceInterval, Conflict, ForecastDirection, ForecastDriver,
        ForecastItem, ForecastResult, IterativeResult, IterativeStep, SynthesisResult,
    };

    fn evidence_ref() -> EvidenceRef {
        EvidenceRef::new(Some("a1".into()), Some("https://reuters.com/a1".into()), "2025-06-01")
    }

    fn valid_response() -> AnalysisResponse {
        AnalysisResponse {
            header: "Deep Dive".into(),
            tldr: "Iterative analysis with refinement.".into(),
            insights: vec![Insight {
                kind: InsightKind::Fact,
                text: "Adoption accelerated through the quarter.".into(),
                evidence_refs: vec![evidence_ref()],
            }],
            evidence: vec![Evidence {
                title: "AI adoption report".into(),
                article_id: Some("a1".into()),
                url: Some("https://reuters.com/a1".into()),
                date: "2025-06-01".into(),
                snippet: "Enterprise adoption grew 40%.".into(),
            }],
            result: CommandResult::Iterative(IterativeResult {
                steps: vec![IterativeStep {
                    iteration: 1,
                    query: "q".into(),
                    n_docs: 3,
                    reason: "Initial retrieval and analysis".into(),
                }],
                answer: "It grew [1].".into(),
                followups: vec![],
            }),
            meta: Meta::new(0.78, "gpt-5", "insight-v0.1", "ask-abc12345"),
            warnings: vec![],
        }
    }

    #[test]
    fn test_valid_response_passes() {
        let validator = PolicyValidator::default();
        assert!(validator.validate_response(&valid_response()).is_ok());
    }

    #[test]
    fn test_validation_idempotent() {
        let validator = PolicyValidator::default();
        let response = valid_response();
        let first = validator.validate_response(&response);
        let second = validator.validate_response(&response);
        assert_eq!(first.is_ok(), second.is_ok());
    }

    #[test]
    fn test_insight_length_boundary() {
        let validator = PolicyValidator::default();
        let mut response = valid_response();

        response.insights[0].text = "a".repeat(180);
        assert!(validator.validate_response(&response).is_ok());

        response.insights[0].text = "a".repeat(181);
        let violation = validator.validate_response(&response).unwrap_err();
        assert!(violation.tech_message.contains("exceeds 180"));
    }

    #[test]
    fn test_tldr_length_boundary() {
        let validator = PolicyValidator::default();
        let mut response = valid_response();

        response.tldr = "a".repeat(220);
        assert!(validator.validate_response(&response).is_ok());

        response.tldr = "a".repeat(221);
        assert!(validator.validate_response(&response).is_err());
    }

    #[test]
    fn test_header_length() {
        let validator = PolicyValidator::default();
        let mut response = valid_response();
        response.header = "h".repeat(101);
        assert!(validator.validate_response(&response).is_err());
    }

    #[test]
    fn test_too_many_insights() {
        let validator = PolicyValidator::default();
        let mut response = valid_response();
        let insight = response.insights[0].clone();
        response.insights = vec![insight; 6];
        let violation = validator.validate_response(&response).unwrap_err();
        assert!(violation.tech_message.contains("Max 5"));
    }

    #[test]
    fn test_missing_evidence_ref() {
        let validator = PolicyValidator::default();
        let mut response = valid_response();
        response.insights[0].evidence_refs.clear();
        let violation = validator.validate_response(&response).unwrap_err();
        assert!(violation.tech_message.contains("no evidence_refs"));
    }

    #[test]
    fn test_bad_date_format() {
        let validator = PolicyValidator::default();
        let mut response = valid_response();
        response.insights[0].evidence_refs[0].date = "06/01/2025".into();
        let violation = validator.validate_response(&response).unwrap_err();
        assert!(violation.tech_message.contains("YYYY-MM-DD"));
    }

    #[test]
    fn test_pii_in_tldr_rejected() {
        let validator = PolicyValidator::default();
        let mut response = valid_response();
        response.tldr = "Contact user@example.com for more".into();
        let violation = validator.validate_response(&response).unwrap_err();
        assert!(violation.tech_message.contains("TL;DR"));
    }

    #[test]
    fn test_pii_in_snippet_rejected() {
        let validator = PolicyValidator::default();
        let mut response = valid_response();
        response.evidence[0].snippet = "Call 555-123-4567 now".into();
        assert!(validator.validate_response(&response).is_err());
    }

    #[test]
    fn test_blacklisted_domain_rejected() {
        let validator = PolicyValidator::default();
        let mut response = valid_response();
        response.evidence[0].url = Some("https://spam.com/a1".into());
        let violation = validator.validate_response(&response).unwrap_err();
        assert!(violation.tech_message.contains("blacklisted"));
    }

    #[test]
    fn test_non_http_url_rejected() {
        let validator = PolicyValidator::default();
        let mut response = valid_response();
        response.evidence[0].url = Some("ftp://reuters.com/a1".into());
        assert!(validator.validate_response(&response).is_err());
    }

    #[test]
    fn test_missing_correlation_id() {
        let validator = PolicyValidator::default();
        let mut response = valid_response();
        response.meta.correlation_id = String::new();
        let violation = validator.validate_response(&response).unwrap_err();
        assert!(violation.tech_message.contains("correlation_id"));
    }

    #[test]
    fn test_result_shape_synthesis() {
        let validator = PolicyValidator::default();

        let valid = CommandResult::Synthesis(SynthesisResult {
            summary: "Summary".into(),
            conflicts: vec![Conflict {
                description: "Sources disagree".into(),
                evidence_refs: vec![evidence_ref(), evidence_ref()],
            }],
            actions: vec![Action {
                recommendation: "Monitor closely".into(),
                impact: "high".into(),
                evidence_refs: vec![evidence_ref()],
            }],
        });
        assert!(validator.validate_result_shape(&valid).is_ok());

        let no_actions = CommandResult::Synthesis(SynthesisResult {
            summary: "Summary".into(),
            conflicts: vec![],
            actions: vec![],
        });
        assert!(validator.validate_result_shape(&no_actions).is_err());

        let thin_conflict = CommandResult::Synthesis(SynthesisResult {
            summary: "Summary".into(),
            conflicts: vec![Conflict {
                description: "Sources disagree".into(),
                evidence_refs: vec![evidence_ref()],
            }],
            actions: vec![Action {
                recommendation: "Monitor".into(),
                impact: "low".into(),
                evidence_refs: vec![evidence_ref()],
            }],
        });
        assert!(validator.validate_result_shape(&thin_conflict).is_err());
    }

    #[test]
    fn test_result_shape_forecast() {
        let validator = PolicyValidator::default();

        let item = ForecastItem {
            topic: "AI chips".into(),
            direction: ForecastDirection::Up,
            confidence_interval: ConfidenceInterval { lower: 0.4, upper: 0.8 },
            drivers: vec![ForecastDriver {
                signal: "capacity expansion".into(),
                evidence_ref: evidence_ref(),
            }],
            horizon: "1w".into(),
        };
        let valid = CommandResult::Forecast(ForecastResult {
            forecast: vec![item.clone()],
        });
        assert!(validator.validate_result_shape(&valid).is_ok());

        let mut inverted = item;
        inverted.confidence_interval = ConfidenceInterval { lower: 0.9, upper: 0.2 };
        let invalid = CommandResult::Forecast(ForecastResult {
            forecast: vec![inverted],
        });
        assert!(validator.validate_result_shape(&invalid).is_err());
    }
}
