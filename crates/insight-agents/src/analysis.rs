//! Sub-analyses for the `/analyze` command: keywords, sentiment and topics,
//! run concurrently and folded into a synthesis-family result by the
//! orchestrator.

use crate::entities::extract_entities;
use insight_core::{trim_chars, Document, Lang};
use std::collections::HashMap;

const ANALYSIS_STOPWORDS: &[&str] = &[
    "the", "and", "for", "with", "that", "this", "from", "are", "was", "has", "have", "its",
    "will", "but", "not", "all", "can", "new",
];

const POSITIVE_WORDS: &[&str] = &[
    "growth", "record", "surge", "beat", "gain", "strong", "expand", "win", "rally",
];
const NEGATIVE_WORDS: &[&str] = &[
    "loss", "drop", "decline", "miss", "weak", "cut", "lawsuit", "recall", "fall",
];

/// Which sub-analyses run, from the feature flags.
#[derive(Debug, Clone, Copy)]
pub struct AnalysisToggles {
    /// Keyword mining.
    pub keywords: bool,
    /// Lexicon sentiment.
    pub sentiment: bool,
    /// Topic extraction.
    pub topics: bool,
}

/// One sub-analysis outcome.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisFinding {
    /// Sub-analysis name: `keywords`, `sentiment`, or `topics`.
    pub name: String,
    /// One-line finding, already length-capped for insight use.
    pub finding: String,
}

/// Run the enabled sub-analyses concurrently over the documents.
///
/// Every sub-analysis is CPU-bound and deterministic; they still run as
/// separate tasks so the `/analyze` flow mirrors the parallel-agent shape
/// used with LLM-backed analyzers.
pub async fn run_analysis(
    docs: &[Document],
    toggles: AnalysisToggles,
    lang: Lang,
) -> Vec<AnalysisFinding> {
    let keywords_docs = toggles.keywords.then(|| docs.to_vec());
    let sentiment_docs = toggles.sentiment.then(|| docs.to_vec());
    let topics_docs = toggles.topics.then(|| docs.to_vec());

    let keywords_task = tokio::task::spawn_blocking(move || {
        keywords_docs.map(|docs| keyword_finding(&docs, lang))
    });
    let sentiment_task = tokio::task::spawn_blocking(move || {
        sentiment_docs.map(|docs| sentiment_finding(&docs, lang))
    });
    let topics_task =
        tokio::task::spawn_blocking(move || topics_docs.map(|docs| topic_finding(&docs, lang)));

    let (keywords, sentiment, topics) =
        tokio::join!(keywords_task, sentiment_task, topics_task);

    [keywords, sentiment, topics]
        .into_iter()
        .filter_map(std::result::Result::ok)
        .flatten()
        .collect()
}

fn keyword_finding(docs: &[Document], lang: Lang) -> AnalysisFinding {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for doc in docs {
        let text = format!("{} {}", doc.title, doc.snippet).to_lowercase();
        for token in text.split(|c: char| !c.is_alphanumeric()) {
            if token.len() < 3 || ANALYSIS_STOPWORDS.contains(&token) {
                continue;
            }
            *counts.entry(token.to_string()).or_insert(0) += 1;
        }
    }

    let mut ranked: Vec<(String, usize)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    let top: Vec<String> = ranked.into_iter().take(5).map(|(word, _)| word).collect();

    let finding = match lang {
        Lang::Ru => format!("Ключевые слова: {}", top.join(", ")),
        Lang::En => format!("Top keywords: {}", top.join(", ")),
    };
    AnalysisFinding {
        name: "keywords".to_string(),
        finding: trim_chars(&finding, 180),
    }
}

fn sentiment_finding(docs: &[Document], lang: Lang) -> AnalysisFinding {
    let mut positive = 0i64;
    let mut negative = 0i64;
    for doc in docs {
        let text = format!("{} {}", doc.title, doc.snippet).to_lowercase();
        positive += POSITIVE_WORDS.iter().filter(|w| text.contains(*w)).count() as i64;
        negative += NEGATIVE_WORDS.iter().filter(|w| text.contains(*w)).count() as i64;
    }
    let total = positive + negative;
    let overall = if total == 0 {
        0.0
    } else {
        (positive - negative) as f64 / total as f64
    };

    let finding = match lang {
        Lang::Ru => format!("Общий тон покрытия: {overall:.2} (от -1 до 1)"),
        Lang::En => format!("Overall coverage sentiment: {overall:.2} (scale -1 to 1)"),
    };
    AnalysisFinding {
        name: "sentiment".to_string(),
        finding: trim_chars(&finding, 180),
    }
}

fn topic_finding(docs: &[Document], lang: Lang) -> AnalysisFinding {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for doc in docs {
        let text = format!("{} {}", doc.title, doc.snippet);
        for entity in extract_entities(&text, 10) {
            *counts.entry(entity).or_insert(0) += 1;
        }
    }

    let mut ranked: Vec<(String, usize)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    let top: Vec<String> = ranked.into_iter().take(3).map(|(topic, _)| topic).collect();

    let finding = match lang {
        Lang::Ru => format!("Основные темы: {}", top.join(", ")),
        Lang::En => format!("Main topics: {}", top.join(", ")),
    };
    AnalysisFinding {
        name: "topics".to_string(),
        finding: trim_chars(&finding, 180),
    }
}
