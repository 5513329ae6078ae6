//! Response language selection.

use serde::{Deserialize, Serialize};

/// Language used for generated headers, reasons and template text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Lang {
    /// English.
    #[default]
    En,
    /// Russian.
    Ru,
}

impl Lang {
    /// Parse a language tag; `"auto"` and unknown tags resolve to English.
    #[must_use]
    pub fn parse(tag: &str) -> Self {
        match tag.trim().to_ascii_lowercase().as_str() {
            "ru" => Self::Ru,
            _ => Self::En,
        }
    }

    /// Pick the matching variant of a bilingual pair.
    #[must_use]
    pub fn pick<'a>(&self, en: &'a str, ru: &'a str) -> &'a str {
        match self {
            Self::En => en,
            Self::Ru => ru,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        assert_eq!(Lang::parse("ru"), Lang::Ru);
        assert_eq!(Lang::parse("en"), Lang::En);
        assert_eq!(Lang::parse("auto"), Lang::En);
        assert_eq!(Lang::parse("de"), Lang::En);
    }

    #[test]
    fn test_pick() {
        assert_eq!(Lang::Ru.pick("hello", "привет"), "привет");
        assert_eq!(Lang::En.pick("hello", "привет"), "hello");
    }
}
