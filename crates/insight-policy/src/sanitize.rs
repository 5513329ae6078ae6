//! Evidence sanitization: blacklist filtering, PII masking, trust scoring.
//!
//! Runs on the evidence list before validation so that recoverable problems
//! (maskable PII, banned sources) never reach the validator as hard failures.

use crate::domains::DomainPolicy;
use crate::pii::{contains_pii, mask_pii};
use insight_core::response::Evidence;
use tracing::warn;

/// Sanitizer over a domain policy; cheap to share behind an `Arc`.
#[derive(Debug, Clone, Default)]
pub struct EvidenceSanitizer {
    domains: DomainPolicy,
}

impl EvidenceSanitizer {
    /// Create a sanitizer with the given domain policy.
    #[must_use]
    pub fn new(domains: DomainPolicy) -> Self {
        Self { domains }
    }

    /// Drop blacklisted entries and mask PII in titles and snippets.
    #[must_use]
    pub fn sanitize(&self, evidence: Vec<Evidence>) -> Vec<Evidence> {
        sanitize_evidence(evidence, &self.domains)
    }

    /// Trust-weighted confidence multiplier for the (sanitized) evidence.
    #[must_use]
    pub fn confidence_multiplier(&self, evidence: &[Evidence]) -> f64 {
        confidence_multiplier(evidence, &self.domains)
    }
}

/// Drop entries from blacklisted domains and mask PII in the survivors.
#[must_use]
pub fn sanitize_evidence(evidence: Vec<Evidence>, domains: &DomainPolicy) -> Vec<Evidence> {
    let mut sanitized = Vec::with_capacity(evidence.len());

    for mut entry in evidence {
        if !domains.is_safe(entry.url.as_deref()) {
            warn!(url = ?entry.url, "dropping evidence from blacklisted domain");
            continue;
        }

        if contains_pii(&entry.snippet) {
            warn!(title = %entry.title, "PII detected in snippet, masking");
            entry.snippet = mask_pii(&entry.snippet).into_owned();
        }
        if contains_pii(&entry.title) {
            warn!(title = %entry.title, "PII detected in title, masking");
            entry.title = mask_pii(&entry.title).into_owned();
        }

        sanitized.push(entry);
    }

    sanitized
}

/// Average per-URL trust score of the evidence list.
///
/// Whitelisted sources score 1.0, blacklisted 0.0, everything else 0.7.
/// An empty list scores 0.5 (low confidence without evidence).
#[must_use]
pub fn confidence_multiplier(evidence: &[Evidence], domains: &DomainPolicy) -> f64 {
    if evidence.is_empty() {
        return 0.5;
    }
    let total: f64 = evidence
        .iter()
        .map(|ev| domains.trust_score(ev.url.as_deref()))
        .sum();
    total / evidence.len() as f64
}
