//! Store-backed read access to the reference data (spec §4.1, §4.3,
//! §6). Implemented against Postgres in `souq-store`; kept as traits
//! here so `souq-parser`/`souq-retrieval` never depend on `sqlx`
//! directly.

use async_trait::async_trait;

use crate::category::{Category, CategoryWithKeywords};
use crate::location::{City, Neighborhood};
use crate::listing::{Listing, ParsedResultRecord};
use crate::transaction::TransactionType;
use crate::{Error, Language, Result};

/// The full active category tree plus curated keywords, the unit the
/// process-local `HotCache` refreshes atomically (spec §4.1).
#[async_trait]
pub trait CategoryRepository: Send + Sync {
    async fn load_all_with_keywords(&self) -> Result<Vec<CategoryWithKeywords>>;
    async fn get(&self, id: i64) -> Result<Option<Category>>;
    async fn children(&self, parent_id: i64) -> Result<Vec<Category>>;
    async fn active_child_count(&self, id: i64) -> Result<usize>;

    /// DB keyword-array strategy (spec §4.3.1 #2): categories whose
    /// keyword array intersects `tokens`, with the count of distinct
    /// tokens matched.
    async fn keyword_array_match(&self, tokens: &[String], language: Language) -> Result<Vec<(Category, usize)>>;

    /// DB meta-keyword ILIKE strategy (spec §4.3.1 #3).
    async fn meta_keyword_ilike(&self, token: &str, language: Language) -> Result<Vec<Category>>;

    /// Full-text search over `name || description` (spec §4.3.1 #4),
    /// returning a rank score.
    async fn fulltext_search(&self, query: &str, language: Language) -> Result<Vec<(Category, f32)>>;

    /// Trigram similarity of `token` against `name`/`slug` (spec §4.3.1
    /// #5), returning a [0,1] score.
    async fn trigram_similar(&self, token: &str) -> Result<Vec<(Category, f32)>>;

    /// All active descendants of `parent_id`, for `findLeafCategory`
    /// (spec §4.3.4) — implemented as a recursive CTE walk in Postgres.
    async fn active_descendants(&self, parent_id: i64) -> Result<Vec<Category>>;

    /// Same walk as `active_descendants`, but with each category's
    /// curated keywords attached so `findLeafCategory` can fold
    /// `max_keyword_similarity` into its ranking (spec §4.3.4).
    async fn active_descendants_with_keywords(&self, parent_id: i64) -> Result<Vec<CategoryWithKeywords>>;
}

#[async_trait]
pub trait LocationRepository: Send + Sync {
    async fn load_all_cities(&self) -> Result<Vec<City>>;
    async fn load_all_neighborhoods(&self) -> Result<Vec<Neighborhood>>;
    async fn get_city(&self, id: i64) -> Result<Option<City>>;

    /// City trigram/substring strategy (spec §4.3.2 #2).
    async fn trigram_similar_cities(&self, token: &str) -> Result<Vec<(City, f32)>>;

    /// Neighborhood trigram strategy (spec §4.3.2 #3).
    async fn trigram_similar_neighborhoods(&self, token: &str) -> Result<Vec<(Neighborhood, f32)>>;
}

#[async_trait]
pub trait TransactionTypeRepository: Send + Sync {
    async fn load_all(&self) -> Result<Vec<TransactionType>>;
}

/// Parameterized predicate, built by `FilterBuilder`, that both retrievers
/// accept. Kept opaque (serialized) at this layer so the trait does not
/// leak `souq-store`'s SQL fragment representation.
#[derive(Debug, Clone, Default)]
pub struct ListingPredicate {
    pub category_id: Option<i64>,
    pub category_path_prefix: Option<String>,
    pub city_id: Option<i64>,
    pub neighborhood_id: Option<i64>,
    pub transaction_type_id: Option<i64>,
    pub price_min: Option<f64>,
    pub price_max: Option<f64>,
    pub area_min: Option<f64>,
    pub area_max: Option<f64>,
    pub extra_numeric: Vec<(String, Option<f64>, Option<f64>)>,
    pub extra_enum: Vec<(String, String)>,
}

#[async_trait]
pub trait ListingRepository: Send + Sync {
    /// Whether the store holds at least one listing matching `predicate`,
    /// ignoring ranking and any index/embedding requirement.
    async fn has_any(&self, predicate: &ListingPredicate) -> Result<bool>;

    /// Whether at least one matching listing has a non-null embedding in
    /// `language` — the vector-retriever availability probe (spec §4.8).
    async fn has_embedded(&self, language: Language, predicate: &ListingPredicate) -> Result<bool>;

    /// Whether at least one matching listing has a populated
    /// `search_vector` — the lexical-retriever availability probe (spec
    /// §4.8).
    async fn has_indexed_text(&self, predicate: &ListingPredicate) -> Result<bool>;

    async fn fetch_page(
        &self,
        predicate: &ListingPredicate,
        offset: u32,
        limit: u32,
    ) -> Result<Vec<Listing>>;

    async fn nearest_by_embedding(
        &self,
        language: Language,
        query_vector: &[f32],
        predicate: &ListingPredicate,
        k: u32,
    ) -> Result<Vec<(Listing, f32)>>;

    async fn lexical_search(
        &self,
        language: Language,
        query_text: &str,
        predicate: &ListingPredicate,
        k: u32,
    ) -> Result<Vec<(Listing, f32)>>;

    /// `titleOnlySearch` fallback (spec §4.8): ILIKE on title only, tokens
    /// already expanded with their ta-marbuta-swapped variant.
    async fn title_only_search(&self, tokens: &[String], predicate: &ListingPredicate, k: u32) -> Result<Vec<Listing>>;

    /// `fallbackSearch` (spec §4.8): ILIKE on title and description.
    async fn fallback_search(&self, tokens: &[String], predicate: &ListingPredicate, k: u32) -> Result<Vec<Listing>>;
}

#[async_trait]
pub trait SemanticCacheRepository: Send + Sync {
    /// Cosine nearest neighbor against `query_embedding`; `None` if the
    /// best candidate falls below the caller's similarity threshold.
    async fn find_nearest(&self, query_embedding: &[f32]) -> Result<Option<(ParsedResultRecord, f32)>>;

    async fn upsert(&self, query_text: &str, query_embedding: &[f32], intent_json: &str) -> Result<()>;

    async fn bump_hit_count(&self, id: i64) -> Result<()>;

    /// Deletes records matching the eviction predicate (spec §3
    /// "Lifecycle"); returns the count removed. Invoked on demand, not on
    /// a scheduled job (spec §9 open question, resolved in SPEC_FULL.md).
    async fn evict_stale(&self, max_age_days: i64) -> Result<u64>;
}

/// Validates the embedding dimension the store was provisioned with
/// against the embedding collaborator in use; mismatches are a
/// configuration error (spec §6).
pub fn check_embedding_dimension(expected: usize, actual: usize) -> Result<()> {
    if expected != actual {
        return Err(Error::Config(format!(
            "embedding dimension mismatch: store expects {expected}, got {actual}"
        )));
    }
    Ok(())
}
