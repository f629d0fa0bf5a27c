//! LLM collaborator surface used by Tier 3/4 and the confidence-gate
//! validator (spec §4.6, §4.9).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{Language, LlmMetadata, Result};

/// JSON hints returned by the Tier 3/4 prompts, fed back through
/// `matchCategory`/`matchLocation`/`matchTransactionType` rather than
/// trusted directly.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LlmHints {
    pub category: Option<String>,
    pub location: Option<String>,
    pub transaction: Option<String>,
    /// Only populated by the Tier 4 (richer) prompt.
    #[serde(default)]
    pub attributes: std::collections::HashMap<String, String>,
}

#[derive(Debug, Clone)]
pub struct LlmCompletion<T> {
    pub value: T,
    pub metadata: LlmMetadata,
}

#[async_trait]
pub trait IntentHintClient: Send + Sync {
    /// Tier 3: short prompt, category/location/transaction only.
    async fn short_hints(&self, utterance: &str, language: Language) -> Result<LlmCompletion<LlmHints>>;

    /// Tier 4: richer prompt, also extracts attribute hints.
    async fn rich_hints(&self, utterance: &str, language: Language) -> Result<LlmCompletion<LlmHints>>;

    /// Confidence-gate validator: is `category_name` an appropriate match
    /// for `utterance`? (spec §4.9, confidence ∈ [0.70, 0.85)).
    async fn validate_category(&self, utterance: &str, category_name: &str) -> Result<bool>;
}
