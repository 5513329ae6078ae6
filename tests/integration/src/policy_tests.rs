//! Policy boundary tests: exact length limits, PII set, idempotence.

use insight_core::{
    AnalysisResponse, CommandResult, Evidence, EvidenceRef, Insight, InsightKind, IterativeResult,
    IterativeStep, Meta,
};
use insight_policy::{
    confidence_multiplier, contains_pii, mask_pii, sanitize_evidence, DomainPolicy,
    PolicyValidator,
};

fn valid_response() -> AnalysisResponse {
    AnalysisResponse {
        header: "Deep Dive".into(),
        tldr: "Iterative analysis with refinement.".into(),
        insights: vec![Insight {
            kind: InsightKind::Fact,
            text: "Adoption accelerated.".into(),
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
fn insight_boundary_180_passes_181_fails() {
    let validator = PolicyValidator::default();
    let mut response = valid_response();

    response.insights[0].text = "x".repeat(180);
    assert!(validator.validate_response(&response).is_ok());

    response.insights[0].text = "x".repeat(181);
    assert!(validator.validate_response(&response).is_err());
}

#[test]
fn tldr_boundary_220_passes_221_fails() {
    let validator = PolicyValidator::default();
    let mut response = valid_response();

    response.tldr = "x".repeat(220);
    assert!(validator.validate_response(&response).is_ok());

    response.tldr = "x".repeat(221);
    assert!(validator.validate_response(&response).is_err());
}

#[test]
fn snippet_boundary_240_passes_241_fails() {
    let validator = PolicyValidator::default();
    let mut response = valid_response();

    response.evidence[0].snippet = "x".repeat(240);
    assert!(validator.validate_response(&response).is_ok());

    response.evidence[0].snippet = "x".repeat(241);
    assert!(validator.validate_response(&response).is_err());
}

#[test]
fn validator_is_idempotent() {
    let validator = PolicyValidator::default();
    let response = valid_response();
    let first = validator.validate_response(&response).is_ok();
    let second = validator.validate_response(&response).is_ok();
    let third = validator.validate_response(&response).is_ok();
    assert!(first && second && third);

    let mut broken = valid_response();
    broken.tldr = "Contact user@example.com".into();
    let first = validator.validate_response(&broken).unwrap_err();
    let second = validator.validate_response(&broken).unwrap_err();
    assert_eq!(first, second);
}

#[test]
fn pii_pattern_set_matches_the_contract() {
    for (text, should_match) in [
        ("write to user@example.com today", true),
        ("call 555-123-4567", true),
        ("ssn 123-45-6789 leaked", true),
        ("card 4111111111111111 charged", true),
        ("card 4111-1111-1111-1111 charged", true),
        ("server at 10.0.0.1 rebooted", true),
        ("passport AB1234567 flagged", true),
        ("published 2025-06-01 in print", false),
        ("revenue grew 40% to $1.2B", false),
    ] {
        assert_eq!(contains_pii(text), should_match, "{text}");
    }
}

#[test]
fn masking_uses_tagged_placeholders() {
    let masked = mask_pii("Email user@example.com or call 555-123-4567");
    assert!(masked.contains("[REDACTED_EMAIL]"));
    assert!(masked.contains("[REDACTED_PHONE]"));
    assert!(!masked.contains("user@example.com"));
}

#[test]
fn sanitizer_drops_blacklisted_and_masks_pii() {
    let domains = DomainPolicy::default();
    let evidence = vec![
        Evidence {
            title: "Good".into(),
            article_id: None,
            url: Some("https://reuters.com/a".into()),
            date: "2025-06-01".into(),
            snippet: "Reach us at tips@example.com".into(),
        },
        Evidence {
            title: "Bad".into(),
            article_id: None,
            url: Some("https://spam.com/b".into()),
            date: "2025-06-01".into(),
            snippet: "clean".into(),
        },
    ];

    let sanitized = sanitize_evidence(evidence, &domains);
    assert_eq!(sanitized.len(), 1);
    assert!(sanitized[0].snippet.contains("[REDACTED_EMAIL]"));
}

#[test]
fn trust_multiplier_averages_scores() {
    let domains = DomainPolicy::default();
    let entry = |url: &str| Evidence {
        title: "T".into(),
        article_id: None,
        url: Some(url.into()),
        date: "2025-06-01".into(),
        snippet: "s".into(),
    };

    // whitelisted (1.0) + unknown (0.7) averages to 0.85
    let list = vec![entry("https://reuters.com/a"), entry("https://blog.example/b")];
    assert!((confidence_multiplier(&list, &domains) - 0.85).abs() < 1e-9);

    // no evidence scores 0.5
    assert!((confidence_multiplier(&[], &domains) - 0.5).abs() < f64::EPSILON);
}
