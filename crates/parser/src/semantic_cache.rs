//! SemanticCache (spec §4.5): Tier 2 of the parser. Wraps the store's
//! `SemanticCacheRepository` with the embedding step and the similarity
//! gate, since the repository itself is oblivious to both.

use std::sync::Arc;

use souq_core::{EmbeddingClient, Intent, Language, Result, SemanticCacheRepository};

pub struct SemanticCache {
    repo: Arc<dyn SemanticCacheRepository>,
    embedder: Arc<dyn EmbeddingClient>,
    similarity_threshold: f32,
}

impl SemanticCache {
    pub fn new(
        repo: Arc<dyn SemanticCacheRepository>,
        embedder: Arc<dyn EmbeddingClient>,
        similarity_threshold: f32,
    ) -> Self {
        Self {
            repo,
            embedder,
            similarity_threshold,
        }
    }

    /// `lookup(normalizedText) -> Intent? | null` (spec §4.5).
    pub async fn lookup(&self, normalized_text: &str, language: Language) -> Result<Option<Intent>> {
        let embedding = self.embedder.embed(normalized_text, language).await?;
        match self.repo.find_nearest(&embedding).await? {
            Some((record, similarity)) if similarity >= self.similarity_threshold => {
                self.repo.bump_hit_count(record.id).await?;
                Ok(Some(record.parsed_result))
            }
            _ => Ok(None),
        }
    }

    /// `store(normalizedText, intent)`: upserts by normalized text,
    /// incrementing hit count on conflict (delegated to the repository's
    /// `ON CONFLICT` clause).
    pub async fn store(&self, normalized_text: &str, language: Language, intent: &Intent) -> Result<()> {
        let embedding = self.embedder.embed(normalized_text, language).await?;
        let intent_json = serde_json::to_string(intent).map_err(|e| {
            souq_core::Error::InternalInvariantViolation(format!(
                "failed to serialize intent for semantic cache: {e}"
            ))
        })?;
        self.repo.upsert(normalized_text, &embedding, &intent_json).await
    }
}
