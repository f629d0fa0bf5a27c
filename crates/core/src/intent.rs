//! Parsed query intent (spec §3, §4.6) — the output of the tiered parser
//! and the input to the retrieval orchestrator.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::attribute::AttributeValue;
use crate::category::CategoryMatch;
use crate::location::LocationMatch;
use crate::text::Tokens;
use crate::transaction::TransactionMatch;
use crate::Language;

/// Which tier of the parser produced an `Intent`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum Tier {
    /// Exact cache hit.
    Exact = 0,
    /// DB-only match, no LLM call.
    DbOnly = 1,
    /// Semantic cache hit.
    Semantic = 2,
    /// Short LLM prompt.
    LlmShort = 3,
    /// Richer LLM prompt with attribute extraction.
    LlmRich = 4,
    /// Tier 1's best-effort intent, returned at `confidence * 0.8` after
    /// both LLM tiers fail to resolve anything new (spec §4.6 step 7,
    /// §7 item 3).
    Fallback = 5,
}

/// How an `Intent` was produced, independent of `Tier` (a cache hit and a
/// fresh DB match can both land at `Tier::DbOnly` confidence-wise but are
/// reported differently for observability).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParseMethod {
    ExactCache,
    SemanticCache,
    DbMatch,
    LlmShort,
    LlmRich,
    Fallback,
}

/// Metadata about an LLM call that contributed to an `Intent`, carried
/// through for observability/cost accounting (spec §4.6, §7).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmMetadata {
    pub model: String,
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

/// Weights for the confidence-1 scoring formula (spec §4.6):
/// `confidence = Σ wᵢ·cᵢ / Σ wᵢ` over present components.
pub struct ConfidenceWeights {
    pub category: f32,
    pub location: f32,
    pub transaction: f32,
    pub attributes: f32,
}

impl Default for ConfidenceWeights {
    fn default() -> Self {
        Self {
            category: 0.40,
            location: 0.30,
            transaction: 0.15,
            attributes: 0.15,
        }
    }
}

/// Structured understanding of a single search query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Intent {
    pub original: String,
    pub normalized: String,
    pub language: Language,
    pub category: Option<CategoryMatch>,
    pub location: Option<LocationMatch>,
    pub transaction_type: Option<TransactionMatch>,
    pub attributes: HashMap<String, AttributeValue>,
    pub keywords: Tokens,
    pub confidence: f32,
    pub tier: Tier,
    pub method: ParseMethod,
    pub llm: Option<LlmMetadata>,
}

impl Intent {
    /// Recomputes `confidence` from the present components using the given
    /// weights, per spec §4.6. Components with no match contribute neither
    /// to the numerator nor the denominator.
    pub fn weighted_confidence(&self, weights: &ConfidenceWeights) -> f32 {
        let mut num = 0.0;
        let mut den = 0.0;

        if let Some(c) = &self.category {
            num += weights.category * c.confidence;
            den += weights.category;
        }
        if let Some(l) = &self.location {
            num += weights.location * l.confidence;
            den += weights.location;
        }
        if let Some(t) = &self.transaction_type {
            num += weights.transaction * t.confidence;
            den += weights.transaction;
        }
        if !self.attributes.is_empty() {
            num += weights.attributes;
            den += weights.attributes;
        }

        if den == 0.0 {
            0.0
        } else {
            num / den
        }
    }

    /// True when no component carries enough signal to drive retrieval —
    /// the caller should fall back to a plain keyword search (spec §4.6
    /// "fallback at 0.8x confidence").
    pub fn is_unresolved(&self) -> bool {
        self.category.is_none()
            && self.location.is_none()
            && self.transaction_type.is_none()
            && self.attributes.is_empty()
            && self.keywords.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn category(confidence: f32) -> CategoryMatch {
        CategoryMatch {
            id: 1,
            slug: "cars".into(),
            name: "Cars".into(),
            level: 1,
            confidence,
        }
    }

    #[test]
    fn weighted_confidence_ignores_absent_components() {
        let intent = Intent {
            original: "cars".into(),
            normalized: "cars".into(),
            language: Language::En,
            category: Some(category(0.9)),
            location: None,
            transaction_type: None,
            attributes: HashMap::new(),
            keywords: Tokens::default(),
            confidence: 0.0,
            tier: Tier::DbOnly,
            method: ParseMethod::DbMatch,
            llm: None,
        };
        assert!((intent.weighted_confidence(&ConfidenceWeights::default()) - 0.9).abs() < 1e-6);
    }

    #[test]
    fn unresolved_when_nothing_matched() {
        let intent = Intent {
            original: "xyzzy".into(),
            normalized: "xyzzy".into(),
            language: Language::En,
            category: None,
            location: None,
            transaction_type: None,
            attributes: HashMap::new(),
            keywords: Tokens::default(),
            confidence: 0.0,
            tier: Tier::LlmRich,
            method: ParseMethod::LlmRich,
            llm: None,
        };
        assert!(intent.is_unresolved());
    }
}
