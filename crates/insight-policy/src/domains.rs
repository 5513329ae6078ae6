//! Domain trust policy: blacklist suffixes, whitelist suffixes, trust scores.

use serde::{Deserialize, Serialize};
use url::Url;

/// Trust score for an unknown (neither whitelisted nor blacklisted) domain.
pub const UNKNOWN_DOMAIN_TRUST: f64 = 0.7;

/// Domain suffix sets that gate evidence URLs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainPolicy {
    /// Trusted source suffixes; evidence from these scores 1.0.
    pub whitelist: Vec<String>,
    /// Banned source suffixes; evidence from these is dropped.
    pub blacklist: Vec<String>,
}

impl Default for DomainPolicy {
    fn default() -> Self {
        Self {
            whitelist: [
                "techcrunch.com",
                "wired.com",
                "theverge.com",
                "arstechnica.com",
                "reuters.com",
                "bloomberg.com",
                "wsj.com",
                "nytimes.com",
                "bbc.com",
                "cnn.com",
                "tass.ru",
                "rbc.ru",
                "vedomosti.ru",
                "kommersant.ru",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            blacklist: ["spam.com", "phishing.net", "malware.org", "scam.com"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

impl DomainPolicy {
    /// Create an empty policy (everything scores as unknown).
    #[must_use]
    pub fn empty() -> Self {
        Self {
            whitelist: Vec::new(),
            blacklist: Vec::new(),
        }
    }

    /// Builder: add a blacklist suffix.
    #[must_use]
    pub fn with_blacklisted(mut self, domain: impl Into<String>) -> Self {
        self.blacklist.push(domain.into());
        self
    }

    /// Builder: add a whitelist suffix.
    #[must_use]
    pub fn with_whitelisted(mut self, domain: impl Into<String>) -> Self {
        self.whitelist.push(domain.into());
        self
    }

    /// True iff the URL is absent or not from a blacklisted domain.
    #[must_use]
    pub fn is_safe(&self, url: Option<&str>) -> bool {
        match url {
            None => true,
            Some(url) => !matches_any(url, &self.blacklist),
        }
    }

    /// Trust score: 1.0 whitelisted, 0.0 blacklisted, 0.7 otherwise.
    /// Missing URLs score as unknown.
    #[must_use]
    pub fn trust_score(&self, url: Option<&str>) -> f64 {
        let Some(url) = url else {
            return UNKNOWN_DOMAIN_TRUST;
        };
        if matches_any(url, &self.blacklist) {
            return 0.0;
        }
        if matches_any(url, &self.whitelist) {
            return 1.0;
        }
        UNKNOWN_DOMAIN_TRUST
    }
}

/// Suffix-match the URL's host against a domain list. Falls back to a
/// substring check when the URL does not parse.
fn matches_any(url: &str, domains: &[String]) -> bool {
    let lowered = url.to_ascii_lowercase();
    if let Ok(parsed) = Url::parse(&lowered) {
        if let Some(host) = parsed.host_str() {
            return domains
                .iter()
                .any(|d| host == d.as_str() || host.ends_with(&format!(".{d}")));
        }
    }
    domains.iter().any(|d| lowered.contains(d.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blacklist_suffix_match() {
        let policy = DomainPolicy::default();
        assert!(!policy.is_safe(Some("https://spam.com/article")));
        assert!(!policy.is_safe(Some("https://news.spam.com/article")));
        assert!(policy.is_safe(Some("https://reuters.com/article")));
        assert!(policy.is_safe(None));
    }

    #[test]
    fn test_no_partial_host_match() {
        let policy = DomainPolicy::empty().with_blacklisted("spam.com");
        // "notspam.com" is not a subdomain of spam.com
        assert!(policy.is_safe(Some("https://notspam.com/a")));
    }

    #[test]
    fn test_trust_scores() {
        let policy = DomainPolicy::default();
        assert!((policy.trust_score(Some("https://reuters.com/a")) - 1.0).abs() < f64::EPSILON);
        assert!(policy.trust_score(Some("https://scam.com/a")).abs() < f64::EPSILON);
        assert!(
            (policy.trust_score(Some("https://smallblog.example/a")) - UNKNOWN_DOMAIN_TRUST).abs()
                < f64::EPSILON
        );
        assert!((policy.trust_score(None) - UNKNOWN_DOMAIN_TRUST).abs() < f64::EPSILON);
    }

    #[test]
    fn test_blacklist_beats_whitelist() {
        let policy = DomainPolicy::empty()
            .with_whitelisted("example.com")
            .with_blacklisted("example.com");
        assert!(policy.trust_score(Some("https://example.com/a")).abs() < f64::EPSILON);
    }
}
