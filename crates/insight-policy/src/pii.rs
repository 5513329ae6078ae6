//! PII (Personally Identifiable Information) detection and masking.
//!
//! The pattern set covers email addresses, phone numbers, SSNs, credit card
//! numbers (16 contiguous digits or four hyphen/space-separated groups),
//! IPv4 addresses, and passport-like alphanumeric identifiers. Any match in
//! a validated text field is a hard policy failure; the sanitizer masks
//! matches in evidence instead of rejecting.

use once_cell::sync::Lazy;
use regex::Regex;
use std::borrow::Cow;

/// The kinds of PII the engine detects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PiiKind {
    /// Email address.
    Email,
    /// Phone number.
    Phone,
    /// Social Security Number.
    Ssn,
    /// Credit card number.
    CreditCard,
    /// IPv4 address.
    Ipv4,
    /// Passport-like alphanumeric identifier.
    Passport,
}

impl PiiKind {
    /// The tagged placeholder substituted for a match of this kind.
    #[must_use]
    pub fn placeholder(&self) -> &'static str {
        match self {
            Self::Email => "[REDACTED_EMAIL]",
            Self::Phone => "[REDACTED_PHONE]",
            Self::Ssn => "[REDACTED_SSN]",
            Self::CreditCard => "[REDACTED_CREDIT_CARD]",
            Self::Ipv4 => "[REDACTED_IP_ADDRESS]",
            Self::Passport => "[REDACTED_PASSPORT]",
        }
    }
}

// Pre-compiled patterns. Masking order matters: the credit-card pattern must
// run before SSN and phone so grouped card numbers are not partially eaten,
// and email before phone so digits inside addresses are not re-matched.
static EMAIL_REGEX: Lazy<Regex> = Lazy::new(|| {
    #[allow(clippy::unwrap_used)]
    Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}").unwrap()
});

static CREDIT_CARD_REGEX: Lazy<Regex> = Lazy::new(|| {
    #[allow(clippy::unwrap_used)]
    Regex::new(r"\b\d{16}\b|\b\d{4}[-\s]\d{4}[-\s]\d{4}[-\s]\d{4}\b").unwrap()
});

static SSN_REGEX: Lazy<Regex> = Lazy::new(|| {
    #[allow(clippy::unwrap_used)]
    Regex::new(r"\b\d{3}-\d{2}-\d{4}\b").unwrap()
});

static PHONE_REGEX: Lazy<Regex> = Lazy::new(|| {
    // +1-555-123-4567, (555) 123-4567, 555.123.4567, 5551234567
    #[allow(clippy::unwrap_used)]
    Regex::new(r"(?:\+?\d{1,3}[-.\s]?)?\(?\d{3}\)?[-.\s]?\d{3}[-.\s]?\d{4}\b").unwrap()
});

static IPV4_REGEX: Lazy<Regex> = Lazy::new(|| {
    #[allow(clippy::unwrap_used)]
    Regex::new(r"\b(?:(?:25[0-5]|2[0-4]\d|[01]?\d\d?)\.){3}(?:25[0-5]|2[0-4]\d|[01]?\d\d?)\b")
        .unwrap()
});

static PASSPORT_REGEX: Lazy<Regex> = Lazy::new(|| {
    #[allow(clippy::unwrap_used)]
    Regex::new(r"\b[A-Z]{1,2}\d{6,9}\b").unwrap()
});

const ORDERED_PATTERNS: [(PiiKind, &Lazy<Regex>); 6] = [
    (PiiKind::Email, &EMAIL_REGEX),
    (PiiKind::CreditCard, &CREDIT_CARD_REGEX),
    (PiiKind::Ssn, &SSN_REGEX),
    (PiiKind::Phone, &PHONE_REGEX),
    (PiiKind::Ipv4, &IPV4_REGEX),
    (PiiKind::Passport, &PASSPORT_REGEX),
];

/// Check whether `text` contains any PII.
#[must_use]
pub fn contains_pii(text: &str) -> bool {
    if text.is_empty() {
        return false;
    }
    ORDERED_PATTERNS
        .iter()
        .any(|(_, regex)| regex.is_match(text))
}

/// List the PII kinds present in `text`.
#[must_use]
pub fn detect_pii_kinds(text: &str) -> Vec<PiiKind> {
    ORDERED_PATTERNS
        .iter()
        .filter(|(_, regex)| regex.is_match(text))
        .map(|(kind, _)| *kind)
        .collect()
}

/// Replace every PII match in `text` with its tagged placeholder.
///
/// Returns a borrowed `Cow` when nothing matched.
#[must_use]
pub fn mask_pii(text: &str) -> Cow<'_, str> {
    if text.is_empty() {
        return Cow::Borrowed(text);
    }

    let mut result: Option<String> = None;
    for (kind, regex) in &ORDERED_PATTERNS {
        let current = result.as_deref().unwrap_or(text);
        if regex.is_match(current) {
            let replaced = regex.replace_all(current, kind.placeholder()).into_owned();
            result = Some(replaced);
        }
    }

    match result {
        Some(owned) => Cow::Owned(owned),
        None => Cow::Borrowed(text),
    }
}
