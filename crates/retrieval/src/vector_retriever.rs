//! VectorRetriever (spec §4.8): dense nearest-neighbor search against
//! listing embeddings.

use std::sync::Arc;

use souq_core::{EmbeddingClient, Language, Listing, ListingPredicate, ListingRepository, Result};

pub struct VectorRetriever {
    listing_repo: Arc<dyn ListingRepository>,
    embedder: Arc<dyn EmbeddingClient>,
}

impl VectorRetriever {
    pub fn new(listing_repo: Arc<dyn ListingRepository>, embedder: Arc<dyn EmbeddingClient>) -> Self {
        Self { listing_repo, embedder }
    }

    /// Available iff the store holds at least one matching listing with a
    /// non-null embedding in `language` (spec §4.8 "availability probe").
    pub async fn available(&self, language: Language, predicate: &ListingPredicate) -> Result<bool> {
        self.listing_repo.has_embedded(language, predicate).await
    }

    /// Orders by `(cosine_similarity DESC, is_boosted DESC, priority DESC,
    /// created_at DESC)` — delegated entirely to the repository's SQL
    /// `ORDER BY`; this layer only owns the embedding step.
    pub async fn search(
        &self,
        utterance: &str,
        language: Language,
        predicate: &ListingPredicate,
        k: u32,
    ) -> Result<Vec<(Listing, f32)>> {
        let query_vector = self.embedder.embed(utterance, language).await?;
        self.listing_repo
            .nearest_by_embedding(language, &query_vector, predicate, k)
            .await
    }
}
