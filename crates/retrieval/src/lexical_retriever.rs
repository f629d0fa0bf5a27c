//! LexicalRetriever (spec §4.8): `search_vector` ranking plus the
//! `titleOnlySearch`/`fallbackSearch` degradations.

use std::sync::Arc;

use souq_core::{Language, Listing, ListingPredicate, ListingRepository, Result};
use souq_text::tokenize;

pub struct LexicalRetriever {
    listing_repo: Arc<dyn ListingRepository>,
}

impl LexicalRetriever {
    pub fn new(listing_repo: Arc<dyn ListingRepository>) -> Self {
        Self { listing_repo }
    }

    /// Available iff `search_vector` is populated for at least one
    /// matching row (spec §4.8 "availability probe").
    pub async fn available(&self, predicate: &ListingPredicate) -> Result<bool> {
        self.listing_repo.has_indexed_text(predicate).await
    }

    pub async fn search(
        &self,
        utterance: &str,
        language: Language,
        predicate: &ListingPredicate,
        k: u32,
    ) -> Result<Vec<(Listing, f32)>> {
        self.listing_repo.lexical_search(language, utterance, predicate, k).await
    }

    /// `titleOnlySearch` (spec §4.8): ILIKE on title, tokens expanded with
    /// their ta-marbuta-swapped variant.
    pub async fn title_only_search(
        &self,
        utterance: &str,
        language: Language,
        predicate: &ListingPredicate,
        k: u32,
    ) -> Result<Vec<Listing>> {
        let tokens = tokenize(utterance, language);
        self.listing_repo.title_only_search(&tokens.0, predicate, k).await
    }

    /// `fallbackSearch` (spec §4.8): ILIKE on title and description.
    pub async fn fallback_search(
        &self,
        utterance: &str,
        language: Language,
        predicate: &ListingPredicate,
        k: u32,
    ) -> Result<Vec<Listing>> {
        let tokens = tokenize(utterance, language);
        self.listing_repo.fallback_search(&tokens.0, predicate, k).await
    }
}
