//! Language tag shared across the pipeline.

use serde::{Deserialize, Serialize};

/// A declared or detected utterance language.
///
/// Spec §1/§3: the protocol is language-agnostic, but lexicons (stopwords,
/// regex patterns, full-text configuration) are language-sensitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Ar,
    En,
}

impl Language {
    /// Parse a language tag, the only two accepted values per spec §7
    /// (`InvalidInput` on anything else).
    pub fn parse(tag: &str) -> Option<Self> {
        match tag.to_ascii_lowercase().as_str() {
            "ar" => Some(Language::Ar),
            "en" => Some(Language::En),
            _ => None,
        }
    }

    /// Tag as used in store full-text configuration names (`"arabic"` /
    /// `"english"`) per spec §6.
    pub fn fts_config(&self) -> &'static str {
        match self {
            Language::Ar => "arabic",
            Language::En => "english",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Ar => "ar",
            Language::En => "en",
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_tags() {
        assert_eq!(Language::parse("ar"), Some(Language::Ar));
        assert_eq!(Language::parse("EN"), Some(Language::En));
    }

    #[test]
    fn rejects_unknown_tags() {
        assert_eq!(Language::parse("fr"), None);
        assert_eq!(Language::parse(""), None);
    }
}
