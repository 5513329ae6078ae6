//! The competitor agent: coverage share, positioning, topic overlap and
//! sentiment movement per source domain.

use crate::entities::extract_entities;
use insight_core::{
    trim_chars, CompetitorsResult, Document, Lang, OverlapEntry, Positioning, SentimentDelta,
    Stance,
};
use std::collections::HashMap;
use tracing::info;
use url::Url;

const POSITIVE_WORDS: &[&str] = &[
    "growth", "record", "surge", "beat", "gain", "strong", "expand", "win", "rally",
];
const NEGATIVE_WORDS: &[&str] = &[
    "loss", "drop", "decline", "miss", "weak", "cut", "lawsuit", "recall", "fall",
];

/// The competitor agent. Deterministic: works from evidence URLs and text.
#[derive(Debug, Clone, Default)]
pub struct CompetitorAgent;

impl CompetitorAgent {
    /// Create an agent.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Analyze competing coverage across the documents' source domains.
    /// Restricts to `focus_domains` when the caller names them.
    #[must_use]
    pub fn run(&self, docs: &[Document], focus_domains: &[String], lang: Lang) -> CompetitorsResult {
        let mut by_domain: HashMap<String, Vec<&Document>> = HashMap::new();
        for doc in docs {
            let Some(domain) = doc.url.as_deref().and_then(extract_domain) else {
                continue;
            };
            if !focus_domains.is_empty()
                && !focus_domains.iter().any(|f| domain == f.to_lowercase())
            {
                continue;
            }
            by_domain.entry(domain).or_default().push(doc);
        }

        let total: usize = by_domain.values().map(Vec::len).sum();
        let mut ranked: Vec<(String, usize)> = by_domain
            .iter()
            .map(|(domain, domain_docs)| (domain.clone(), domain_docs.len()))
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

        let top_domains: Vec<String> = ranked.iter().map(|(domain, _)| domain.clone()).collect();

        let positioning: Vec<Positioning> = ranked
            .iter()
            .map(|(domain, count)| {
                let share = *count as f64 / total.max(1) as f64;
                let stance = if share >= 0.4 {
                    Stance::Leader
                } else if share >= 0.15 {
                    Stance::FastFollower
                } else {
                    Stance::Niche
                };
                let notes = match lang {
                    Lang::Ru => format!("{count} материалов, доля {:.0}%", share * 100.0),
                    Lang::En => format!("{count} articles, {:.0}% coverage share", share * 100.0),
                };
                Positioning {
                    domain: domain.clone(),
                    stance,
                    notes: trim_chars(&notes, 180),
                }
            })
            .collect();

        let overlap = topic_overlap(&by_domain);
        let sentiment_delta = sentiment_deltas(&by_domain);

        info!(
            domains = top_domains.len(),
            overlap = overlap.len(),
            "competitor analysis complete"
        );

        CompetitorsResult {
            overlap,
            positioning,
            sentiment_delta,
            top_domains,
        }
    }
}

/// Host with a leading `www.` stripped, lowercased.
fn extract_domain(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let host = parsed.host_str()?.to_lowercase();
    Some(host.strip_prefix("www.").unwrap_or(&host).to_string())
}

/// Entities covered by two or more domains.
fn topic_overlap(by_domain: &HashMap<String, Vec<&Document>>) -> Vec<OverlapEntry> {
    let mut entity_domains: HashMap<String, Vec<String>> = HashMap::new();
    for (domain, domain_docs) in by_domain {
        for doc in domain_docs {
            let text = format!("{} {}", doc.title, doc.snippet);
            for entity in extract_entities(&text, 10) {
                let domains = entity_domains.entry(entity).or_default();
                if !domains.contains(domain) {
                    domains.push(domain.clone());
                }
            }
        }
    }

    let mut overlap: Vec<OverlapEntry> = entity_domains
        .into_iter()
        .filter(|(_, domains)| domains.len() >= 2)
        .map(|(topic, mut domains)| {
            domains.sort();
            OverlapEntry { topic, domains }
        })
        .collect();
    overlap.sort_by(|a, b| a.topic.cmp(&b.topic));
    overlap.truncate(10);
    overlap
}

/// Lexicon-scored sentiment per domain, in `[-1, 1]`.
fn sentiment_deltas(by_domain: &HashMap<String, Vec<&Document>>) -> Option<Vec<SentimentDelta>> {
    if by_domain.is_empty() {
        return None;
    }

    let mut deltas: Vec<SentimentDelta> = by_domain
        .iter()
        .map(|(domain, domain_docs)| {
            let mut positive = 0i64;
            let mut negative = 0i64;
            for doc in domain_docs {
                let text = format!("{} {}", doc.title, doc.snippet).to_lowercase();
                positive += POSITIVE_WORDS.iter().filter(|w| text.contains(*w)).count() as i64;
                negative += NEGATIVE_WORDS.iter().filter(|w| text.contains(*w)).count() as i64;
            }
            let total = positive + negative;
            let delta = if total == 0 {
                0.0
            } else {
                (positive - negative) as f64 / total as f64
            };
            SentimentDelta {
                domain: domain.clone(),
                delta: (delta * 100.0).round() / 100.0,
            }
        })
        .collect();
    deltas.sort_by(|a, b| a.domain.cmp(&b.domain));
    Some(deltas)
}
