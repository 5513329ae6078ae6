//! Character-budget helpers shared by builders and agents.

/// Trim `text` to at most `limit` characters, appending an ellipsis when
/// truncation occurs. Limits are counted in characters, not bytes, so the
/// result is always valid UTF-8 and within the policy length caps.
#[must_use]
pub fn trim_chars(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }
    let take = limit.saturating_sub(1);
    let mut out: String = text.chars().take(take).collect();
    while out.ends_with(' ') {
        out.pop();
    }
    out.push('…');
    out
}
