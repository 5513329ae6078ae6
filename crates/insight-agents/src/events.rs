//! Event extraction: one raw event per document, clustered by time window,
//! enriched with entities.

use crate::entities::extract_entities;
use chrono::{Duration, NaiveDate};
use insight_core::{Document, EventRecord};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::info;

static WINDOW_REGEX: Lazy<Regex> = Lazy::new(|| {
    #[allow(clippy::unwrap_used)]
    Regex::new(r"^(\d+)([hdwm])$").unwrap()
});

/// Parse a window string (`6h`, `12h`, `24h`, `1d`, `3d`, `1w`, `1m`) into a
/// duration. Months approximate to 30 days. Unknown grammar yields `None`
/// (no clustering).
#[must_use]
pub fn parse_window(window: &str) -> Option<Duration> {
    let window_lower = window.to_lowercase();
    let captures = WINDOW_REGEX.captures(&window_lower)?;
    let value: i64 = captures.get(1)?.as_str().parse().ok()?;
    match captures.get(2)?.as_str() {
        "h" => Some(Duration::hours(value)),
        "d" => Some(Duration::days(value)),
        "w" => Some(Duration::weeks(value)),
        "m" => Some(Duration::days(value * 30)),
        _ => None,
    }
}

#[derive(Debug, Clone)]
struct RawEvent {
    title: String,
    date: NaiveDate,
    doc_ids: Vec<String>,
    text: String,
}

#[derive(Debug, Clone)]
struct ClusteredEvent {
    title: String,
    start: NaiveDate,
    end: NaiveDate,
    doc_ids: Vec<String>,
    text: String,
}

/// Extracts and clusters events from documents.
#[derive(Debug, Clone, Default)]
pub struct EventExtractor;

impl EventExtractor {
    /// Create an extractor.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Extract up to `max_events` clustered events from `docs`.
    #[must_use]
    pub fn extract_events(&self, docs: &[Document], window: &str, max_events: usize) -> Vec<EventRecord> {
        info!(docs = docs.len(), window, "extracting events");

        let raw_events: Vec<RawEvent> = docs.iter().filter_map(raw_event_from_doc).collect();
        let clustered = cluster_by_time(raw_events, parse_window(window));

        let mut events: Vec<EventRecord> = clustered
            .into_iter()
            .enumerate()
            .map(|(idx, cluster)| EventRecord {
                id: format!("evt_{idx}"),
                title: cluster.title,
                ts_range: [
                    cluster.start.format("%Y-%m-%d").to_string(),
                    cluster.end.format("%Y-%m-%d").to_string(),
                ],
                entities: extract_entities(&cluster.text, 10),
                docs: cluster.doc_ids,
            })
            .collect();

        events.truncate(max_events);
        info!(events = events.len(), "events extracted");
        events
    }
}

fn raw_event_from_doc(doc: &Document) -> Option<RawEvent> {
    if doc.title.is_empty() && doc.snippet.is_empty() {
        return None;
    }

    let date = NaiveDate::parse_from_str(&doc.date, "%Y-%m-%d")
        .unwrap_or_else(|_| chrono::Utc::now().date_naive());

    let title = if doc.title.is_empty() {
        doc.snippet
            .split('.')
            .next()
            .unwrap_or("")
            .chars()
            .take(160)
            .collect()
    } else {
        doc.title.clone()
    };

    let text: String = format!("{} {}", doc.title, doc.snippet)
        .chars()
        .take(500)
        .collect();

    Some(RawEvent {
        title,
        date,
        doc_ids: doc.article_id.iter().cloned().collect(),
        text,
    })
}

fn cluster_by_time(events: Vec<RawEvent>, window: Option<Duration>) -> Vec<ClusteredEvent> {
    let mut sorted = events;
    sorted.sort_by_key(|event| event.date);

    let Some(window) = window else {
        // No clustering grammar: one cluster per event.
        return sorted.into_iter().map(single_cluster).collect();
    };

    let mut clusters: Vec<Vec<RawEvent>> = Vec::new();
    let mut current: Vec<RawEvent> = Vec::new();
    let mut cluster_start: Option<NaiveDate> = None;

    for event in sorted {
        match cluster_start {
            Some(start) if event.date.signed_duration_since(start) <= window => {
                current.push(event);
            }
            Some(_) => {
                clusters.push(std::mem::take(&mut current));
                cluster_start = Some(event.date);
                current.push(event);
            }
            None => {
                cluster_start = Some(event.date);
                current.push(event);
            }
        }
    }
    if !current.is_empty() {
        clusters.push(current);
    }

    clusters.into_iter().map(merge_cluster).collect()
}

fn single_cluster(event: RawEvent) -> ClusteredEvent {
    ClusteredEvent {
        title: event.title,
        start: event.date,
        end: event.date,
        doc_ids: event.doc_ids,
        text: event.text,
    }
}

fn merge_cluster(cluster: Vec<RawEvent>) -> ClusteredEvent {
    let fallback_date = chrono::Utc::now().date_naive();
    let title = cluster.first().map(|e| e.title.clone()).unwrap_or_default();
    let start = cluster.iter().map(|e| e.date).min().unwrap_or(fallback_date);
    let end = cluster.iter().map(|e| e.date).max().unwrap_or(fallback_date);

    let mut doc_ids = Vec::new();
    let mut seen = std::collections::HashSet::new();
    for event in &cluster {
        for id in &event.doc_ids {
            if seen.insert(id.clone()) {
                doc_ids.push(id.clone());
            }
        }
    }

    let text = cluster
        .iter()
        .take(3)
        .map(|e| e.text.as_str())
        .collect::<Vec<_>>()
        .join(" | ");

    ClusteredEvent {
        title,
        start,
        end,
        doc_ids,
        text,
    }
}
