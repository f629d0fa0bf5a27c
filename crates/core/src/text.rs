//! The Utterance / NormalizedText / Tokens chain (spec §3).
//!
//! `souq-text` owns the actual normalize/tokenize algorithms; this module
//! only carries the shared types so every crate agrees on their shape.

use crate::Language;
use serde::{Deserialize, Serialize};

/// Raw user text plus a declared or detected language tag. Immutable
/// within a request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Utterance {
    pub text: String,
    pub language: Language,
}

impl Utterance {
    pub fn new(text: impl Into<String>, language: Language) -> Self {
        Self {
            text: text.into(),
            language,
        }
    }
}

/// A deterministic lowercase, diacritic-stripped, hamza/alef/ta-marbuta
/// folded form of an utterance. Newtype so callers can't mix up raw and
/// normalized text at the type level.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NormalizedText(pub String);

impl NormalizedText {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for NormalizedText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Ordered sequence of whitespace-separated normalized fragments, already
/// filtered for length and stopwords. Order is preserved but not required
/// by matchers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tokens(pub Vec<String>);

impl Tokens {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.0.iter()
    }
}

impl IntoIterator for Tokens {
    type Item = String;
    type IntoIter = std::vec::IntoIter<String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl FromIterator<String> for Tokens {
    fn from_iter<T: IntoIterator<Item = String>>(iter: T) -> Self {
        Tokens(iter.into_iter().collect())
    }
}
