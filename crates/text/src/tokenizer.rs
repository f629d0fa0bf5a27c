//! `tokenize(text, language) -> Tokens` (spec §4.1).

use once_cell::sync::Lazy;
use souq_core::{Language, Tokens};
use std::collections::HashSet;

use crate::normalizer::normalize;

static AR_STOPWORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "\u{0641}\u{064A}",                   // في
        "\u{0645}\u{0646}",                   // من
        "\u{0625}\u{0644}\u{0649}",           // إلى
        "\u{0639}\u{0644}\u{0649}",           // على
        "\u{0639}\u{0646}",                   // عن
        "\u{0645}\u{0639}",                   // مع
        "\u{0647}\u{0630}\u{0627}",           // هذا
        "\u{0647}\u{0630}\u{0647}",           // هذه
        "\u{0648}",                           // و
        "\u{0623}\u{0648}",                   // أو
        "\u{0627}\u{0644}",                   // ال
        "\u{0644}\u{0644}",                   // لل
        "\u{0628}\u{0627}\u{0644}",           // بال
    ]
    .into_iter()
    .collect()
});

static EN_STOPWORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "the", "a", "an", "in", "on", "at", "for", "to", "of", "with", "and", "or",
    ]
    .into_iter()
    .collect()
});

fn stopwords(language: Language) -> &'static HashSet<&'static str> {
    match language {
        Language::Ar => &AR_STOPWORDS,
        Language::En => &EN_STOPWORDS,
    }
}

/// Splits `text` on whitespace after normalizing, dropping tokens of
/// length ≤ 1 and language-specific stopwords. Order is preserved.
pub fn tokenize(text: &str, language: Language) -> Tokens {
    let normalized = normalize(text);
    let stop = stopwords(language);

    normalized
        .as_str()
        .split_whitespace()
        .filter(|tok| tok.chars().count() > 1)
        .filter(|tok| !stop.contains(tok))
        .map(|tok| tok.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drops_short_tokens_and_stopwords_en() {
        let tokens = tokenize("I want a car in Damascus", Language::En);
        assert_eq!(
            tokens.as_slice(),
            &["want".to_string(), "car".to_string(), "damascus".to_string()]
        );
    }

    #[test]
    fn drops_arabic_stopwords() {
        let tokens = tokenize("\u{0633}\u{064A}\u{0627}\u{0631}\u{0629} \u{0641}\u{064A} \u{062F}\u{0645}\u{0634}\u{0642}", Language::Ar);
        assert!(!tokens.iter().any(|t| t == "\u{0641}\u{064A}"));
    }

    #[test]
    fn deterministic() {
        let a = tokenize("Toyota Camry 2020", Language::En);
        let b = tokenize("Toyota Camry 2020", Language::En);
        assert_eq!(a, b);
    }
}
