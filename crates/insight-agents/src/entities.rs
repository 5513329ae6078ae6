//! Lightweight entity extraction shared by the event and graph agents.

use once_cell::sync::Lazy;
use regex::Regex;

static CAPITALIZED_SEQUENCE: Lazy<Regex> = Lazy::new(|| {
    #[allow(clippy::unwrap_used)]
    Regex::new(r"\b[A-Z][a-z]+(?:\s+[A-Z][a-z]+)*\b").unwrap()
});

const STOPWORDS: &[&str] = &[
    "the", "this", "that", "there", "these", "those", "a", "an", "it", "its", "his", "her",
];

/// Extract candidate entities as capitalized word sequences, deduplicated in
/// first-seen order, capped at `max`.
#[must_use]
pub fn extract_entities(text: &str, max: usize) -> Vec<String> {
    let mut entities = Vec::new();
    let mut seen = std::collections::HashSet::new();

    for candidate in CAPITALIZED_SEQUENCE.find_iter(text) {
        let normalized = candidate.as_str().trim().to_string();
        if STOPWORDS.contains(&normalized.to_lowercase().as_str()) {
            continue;
        }
        if seen.insert(normalized.clone()) {
            entities.push(normalized);
            if entities.len() >= max {
                break;
            }
        }
    }
    entities
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_capitalized_sequences() {
        let entities = extract_entities("OpenAI and Deep Mind announced a pact in San Francisco", 10);
        assert!(entities.iter().any(|e| e == "Deep Mind"));
        assert!(entities.iter().any(|e| e == "San Francisco"));
    }

    #[test]
    fn test_filters_stopwords() {
        let entities = extract_entities("The announcement. This matters. There was news.", 10);
        assert!(!entities.iter().any(|e| e == "The" || e == "This" || e == "There"));
    }

    #[test]
    fn test_dedup_and_cap() {
        let entities = extract_entities("Apple beat Apple while Apple and Samsung watched", 1);
        assert_eq!(entities.len(), 1);
    }
}
