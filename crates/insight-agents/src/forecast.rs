//! The forecast agent: per-topic trend direction from dated document
//! momentum, with ordered confidence intervals and evidence-backed drivers.

use crate::entities::extract_entities;
use insight_core::{
    trim_chars, ConfidenceInterval, Document, EvidenceRef, ForecastDirection, ForecastDriver,
    ForecastItem, ForecastResult,
};
use std::collections::HashMap;
use tracing::info;

/// Maximum forecast items produced per request.
const MAX_ITEMS: usize = 3;

/// The forecast agent. Fully deterministic: direction comes from coverage
/// momentum (late-half vs early-half document counts), the interval from
/// retrieval scores.
#[derive(Debug, Clone, Default)]
pub struct ForecastAgent;

impl ForecastAgent {
    /// Create an agent.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Forecast up to [`MAX_ITEMS`] topics over the given horizon.
    ///
    /// The request topic always yields an item; the most-mentioned entities
    /// fill the remaining slots.
    #[must_use]
    pub fn run(&self, topic: &str, docs: &[Document], horizon: &str) -> ForecastResult {
        let mut topics: Vec<(String, Vec<&Document>)> = Vec::new();
        topics.push((topic.to_string(), docs.iter().collect()));

        for entity in top_entities(docs, MAX_ITEMS - 1) {
            let entity_docs: Vec<&Document> = docs
                .iter()
                .filter(|d| {
                    d.title.contains(&entity) || d.snippet.contains(&entity)
                })
                .collect();
            if !entity_docs.is_empty() {
                topics.push((entity, entity_docs));
            }
        }

        let forecast: Vec<ForecastItem> = topics
            .into_iter()
            .take(MAX_ITEMS)
            .filter_map(|(name, topic_docs)| forecast_item(&name, &topic_docs, horizon))
            .collect();

        info!(items = forecast.len(), "forecast produced");
        ForecastResult { forecast }
    }
}

fn forecast_item(topic: &str, docs: &[&Document], horizon: &str) -> Option<ForecastItem> {
    if docs.is_empty() {
        return None;
    }

    // Coverage momentum: split the covered time span at its midpoint and
    // compare document counts in each half.
    let parsed: Vec<chrono::NaiveDate> = docs
        .iter()
        .filter_map(|d| chrono::NaiveDate::parse_from_str(&d.date, "%Y-%m-%d").ok())
        .collect();
    let direction = match (parsed.iter().min(), parsed.iter().max()) {
        (Some(&min), Some(&max)) if min < max => {
            let span_days = max.signed_duration_since(min).num_days();
            let mid = min + chrono::Duration::days(span_days / 2);
            let early = parsed.iter().filter(|&&d| d <= mid).count();
            let late = parsed.len() - early;
            match late.cmp(&early) {
                std::cmp::Ordering::Greater => ForecastDirection::Up,
                std::cmp::Ordering::Less => ForecastDirection::Down,
                std::cmp::Ordering::Equal => ForecastDirection::Flat,
            }
        }
        _ => ForecastDirection::Flat,
    };

    let avg_score = docs.iter().map(|d| d.score).sum::<f64>() / docs.len() as f64;
    let base = avg_score.clamp(0.2, 0.9);
    let lower = (base * 0.6 * 100.0).round() / 100.0;
    let upper = ((base * 1.1).min(1.0) * 100.0).round() / 100.0;

    let drivers: Vec<ForecastDriver> = docs
        .iter()
        .take(2)
        .map(|d| ForecastDriver {
            signal: trim_chars(&d.title, 120),
            evidence_ref: EvidenceRef::new(d.article_id.clone(), d.url.clone(), d.date.clone()),
        })
        .collect();

    Some(ForecastItem {
        topic: trim_chars(topic, 120),
        direction,
        confidence_interval: ConfidenceInterval { lower, upper },
        drivers,
        horizon: horizon.to_string(),
    })
}

fn top_entities(docs: &[Document], max: usize) -> Vec<String> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    let mut order: Vec<String> = Vec::new();

    for doc in docs {
        let text = format!("{} {}", doc.title, doc.snippet);
        for entity in extract_entities(&text, 10) {
            if !counts.contains_key(&entity) {
                order.push(entity.clone());
            }
            *counts.entry(entity).or_insert(0) += 1;
        }
    }

    let mut ranked: Vec<String> = order;
    ranked.sort_by(|a, b| counts[b].cmp(&counts[a]).then_with(|| a.cmp(b)));
    ranked.truncate(max);
    ranked
}
