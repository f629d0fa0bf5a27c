//! `normalize(text) -> NormalizedText` (spec §4.1).
//!
//! Pure, deterministic, idempotent: `normalize(normalize(x)) == normalize(x)`.

use souq_core::NormalizedText;
use unicode_normalization::UnicodeNormalization;

/// Arabic diacritic / tatweel ranges stripped prior to matching.
fn is_diacritic(c: char) -> bool {
    matches!(c as u32,
        0x0610..=0x061A
        | 0x064B..=0x065F
        | 0x0670
        | 0x06D6..=0x06ED
        | 0x0640 // tatweel
    )
}

fn fold_alef(c: char) -> char {
    match c {
        '\u{0623}' | '\u{0625}' | '\u{0622}' | '\u{0671}' => '\u{0627}', // أ إ آ ٱ -> ا
        other => other,
    }
}

fn fold_ya(c: char) -> char {
    match c {
        '\u{0649}' => '\u{064A}', // ى -> ي
        other => other,
    }
}

fn fold_ta_marbuta(c: char) -> char {
    match c {
        '\u{0629}' => '\u{0647}', // ة -> ه
        other => other,
    }
}

/// Strips a leading Arabic definite article ("ال") when it prefixes a
/// word of more than two characters, so the article itself doesn't
/// survive as a spurious token boundary.
fn strip_definite_article(word: &str) -> &str {
    if let Some(rest) = word.strip_prefix("\u{0627}\u{0644}") {
        if rest.chars().count() >= 2 {
            return rest;
        }
    }
    word
}

/// Canonicalizes a raw utterance: Unicode NFKC, diacritic stripping,
/// alef/ya/ta-marbuta folding, definite-article stripping, ASCII
/// lowercasing, whitespace collapse.
pub fn normalize(text: &str) -> NormalizedText {
    let nfkc: String = text.nfkc().collect();

    let folded: String = nfkc
        .chars()
        .filter(|c| !is_diacritic(*c))
        .map(fold_alef)
        .map(fold_ya)
        .map(fold_ta_marbuta)
        .map(|c| c.to_ascii_lowercase())
        .collect();

    let normalized = folded
        .split_whitespace()
        .map(strip_definite_article)
        .collect::<Vec<_>>()
        .join(" ");

    NormalizedText(normalized)
}

/// Ta-marbuta-aware equivalence (spec §4.1): two strings are equivalent
/// if they normalize equal, or if they normalize equal after swapping
/// ة↔ه uniformly in both.
pub fn ta_marbuta_equivalent(a: &str, b: &str) -> bool {
    let na = normalize(a);
    let nb = normalize(b);
    if na == nb {
        return true;
    }
    swap_ta_marbuta(na.as_str()) == swap_ta_marbuta(nb.as_str())
}

fn swap_ta_marbuta(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            '\u{0629}' => '\u{0647}',
            '\u{0647}' => '\u{0629}',
            other => other,
        })
        .collect()
}

/// Produces the ta-marbuta-swapped variant of a single token, used by
/// `LexicalRetriever`'s `titleOnlySearch`/`fallbackSearch` expansion
/// (spec §4.8).
pub fn ta_marbuta_variant(token: &str) -> String {
    swap_ta_marbuta(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idempotent() {
        let once = normalize("السيارة الجميلة");
        let twice = normalize(once.as_str());
        assert_eq!(once, twice);
    }

    #[test]
    fn folds_alef_variants() {
        let a = normalize("أحمد");
        let b = normalize("احمد");
        assert_eq!(a, b);
    }

    #[test]
    fn strips_definite_article() {
        let n = normalize("السيارة");
        assert!(!n.as_str().starts_with("\u{0627}\u{0644}"));
    }

    #[test]
    fn collapses_whitespace_and_lowercases_ascii() {
        let n = normalize("  Toyota   Camry  ");
        assert_eq!(n.as_str(), "toyota camry");
    }

    #[test]
    fn ta_marbuta_aware_equivalence() {
        assert!(ta_marbuta_equivalent("شقة", "شقه"));
    }
}
