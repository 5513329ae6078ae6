//! Deterministic context assembly from retrieved documents.

use insight_core::Document;

/// Maximum documents included in a prompt context.
pub const MAX_CONTEXT_DOCS: usize = 10;
/// Maximum excerpt length per document, in characters.
pub const MAX_EXCERPT: usize = 200;

/// Build a compact textual context block from up to [`MAX_CONTEXT_DOCS`]
/// documents. Input order is preserved; the output is deterministic.
#[must_use]
pub fn build_context(docs: &[Document]) -> String {
    if docs.is_empty() {
        return "No supporting documents provided.".to_string();
    }

    let mut parts = Vec::with_capacity(docs.len().min(MAX_CONTEXT_DOCS));
    for (idx, doc) in docs.iter().take(MAX_CONTEXT_DOCS).enumerate() {
        let title = if doc.title.is_empty() {
            "Untitled"
        } else {
            doc.title.as_str()
        };
        let excerpt: String = doc.snippet.chars().take(MAX_EXCERPT).collect();
        parts.push(format!(
            "[{}] {}\nDate: {}\nURL: {}\nExcerpt: {}\n",
            idx + 1,
            title,
            doc.date,
            doc.url.as_deref().unwrap_or(""),
            excerpt
        ));
    }
    parts.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(i: usize) -> Document {
        Document::new(format!("Title {i}"), "2025-06-01")
            .with_url(format!("https://reuters.com/{i}"))
            .with_snippet(format!("Snippet {i}"))
    }

    #[test]
    fn test_empty_docs() {
        assert_eq!(build_context(&[]), "No supporting documents provided.");
    }

    #[test]
    fn test_numbering_and_order() {
        let docs: Vec<_> = (1..=3).map(doc).collect();
        let context = build_context(&docs);
        let pos1 = context.find("[1] Title 1").unwrap();
        let pos2 = context.find("[2] Title 2").unwrap();
        let pos3 = context.find("[3] Title 3").unwrap();
        assert!(pos1 < pos2 && pos2 < pos3);
    }

    #[test]
    fn test_caps_at_ten_docs() {
        let docs: Vec<_> = (1..=15).map(doc).collect();
        let context = build_context(&docs);
        assert!(context.contains("[10] Title 10"));
        assert!(!context.contains("[11]"));
    }

    #[test]
    fn test_excerpt_truncated() {
        let long = Document::new("T", "2025-06-01").with_snippet("x".repeat(500));
        let context = build_context(&[long]);
        let excerpt_line = context
            .lines()
            .find(|l| l.starts_with("Excerpt:"))
            .unwrap();
        assert!(excerpt_line.chars().count() <= "Excerpt: ".len() + MAX_EXCERPT);
    }

    #[test]
    fn test_deterministic() {
        let docs: Vec<_> = (1..=5).map(doc).collect();
        assert_eq!(build_context(&docs), build_context(&docs));
    }
}
