//! Response-envelope builders: evidence, insights, metadata.

use insight_core::{
    trim_chars, Document, EventRecord, Evidence, EvidenceRef, Insight, InsightKind, Lang,
};

/// Today's date in `YYYY-MM-DD`, used when a document carries no date.
#[must_use]
pub fn today() -> String {
    chrono::Utc::now().format("%Y-%m-%d").to_string()
}

/// Build the evidence list from the top documents.
#[must_use]
pub fn build_evidence(docs: &[Document]) -> Vec<Evidence> {
    docs.iter()
        .take(10)
        .map(|doc| Evidence {
            title: trim_chars(if doc.title.is_empty() { "Untitled" } else { &doc.title }, 200),
            article_id: doc.article_id.clone(),
            url: doc.url.clone(),
            date: if doc.date.is_empty() { today() } else { doc.date.clone() },
            snippet: trim_chars(&doc.snippet, 240),
        })
        .collect()
}

fn doc_ref(doc: &Document) -> EvidenceRef {
    EvidenceRef::new(
        doc.article_id.clone(),
        doc.url.clone(),
        if doc.date.is_empty() { today() } else { doc.date.clone() },
    )
}

/// Build up to three templated insights from the top documents. Always
/// yields at least one insight so the envelope stays valid on thin corpora.
#[must_use]
pub fn build_insights_from_docs(docs: &[Document], lang: Lang) -> Vec<Insight> {
    let templates_en = [
        "{title} highlights key developments.",
        "{title} provides supporting evidence.",
        "{title} offers context.",
    ];
    let templates_ru = [
        "{title} подчёркивает ключевые изменения.",
        "{title} предоставляет подтверждающие данные.",
        "{title} даёт контекст.",
    ];
    let templates: &[&str] = match lang {
        Lang::Ru => &templates_ru,
        Lang::En => &templates_en,
    };

    let insights: Vec<Insight> = docs
        .iter()
        .take(3)
        .enumerate()
        .map(|(idx, doc)| {
            let title = trim_chars(if doc.title.is_empty() { "Source" } else { &doc.title }, 60);
            let text = templates[idx % templates.len()].replace("{title}", &title);
            Insight {
                kind: InsightKind::Fact,
                text: trim_chars(&text, 180),
                evidence_refs: vec![doc_ref(doc)],
            }
        })
        .collect();

    if insights.is_empty() {
        return vec![Insight {
            kind: InsightKind::Fact,
            text: lang.pick("No sources available", "Нет источников").to_string(),
            evidence_refs: vec![EvidenceRef::new(None, None, today())],
        }];
    }
    insights
}

/// Build insights from extracted events.
#[must_use]
pub fn build_insights_from_events(events: &[EventRecord], lang: Lang) -> Vec<Insight> {
    let insights: Vec<Insight> = events
        .iter()
        .take(3)
        .map(|event| {
            let text = match lang {
                Lang::Ru => format!("Событие: {}", event.title),
                Lang::En => format!("Event: {}", event.title),
            };
            Insight {
                kind: InsightKind::Fact,
                text: trim_chars(&text, 180),
                evidence_refs: vec![EvidenceRef::new(
                    event.docs.first().cloned(),
                    None,
                    event.ts_range[0].clone(),
                )],
            }
        })
        .collect();

    if insights.is_empty() {
        return build_insights_from_docs(&[], lang);
    }
    insights
}

/// Build the single structural insight for graph responses.
#[must_use]
pub fn build_insights_from_graph(node_count: usize, edge_count: usize, lang: Lang) -> Vec<Insight> {
    let text = match lang {
        Lang::Ru => format!("Граф содержит {node_count} узлов и {edge_count} связей"),
        Lang::En => format!("Graph contains {node_count} nodes and {edge_count} edges"),
    };
    vec![Insight {
        kind: InsightKind::Fact,
        text: trim_chars(&text, 180),
        evidence_refs: vec![EvidenceRef::new(None, None, today())],
    }]
}
