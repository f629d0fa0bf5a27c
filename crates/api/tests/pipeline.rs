//! End-to-end exercise of `TieredParser` + `RetrievalOrchestrator` over
//! in-memory fakes: no Postgres, no LLM, no embedding provider. Seeds a
//! small Syrian-cities/cars-apartments-phones fixture and drives the
//! scenarios spec §8 names (Arabic/English queries across categories).

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use souq_cache::{ExactCache, ParserStats, ResultCache};
use souq_config::{ParserConfig, RetrievalConfig};
use souq_core::{
    Category, CategoryKeywords, CategoryRepository, CategoryWithKeywords, City, EmbeddingClient,
    IntentHintClient, Language, Listing, ListingPredicate, ListingRepository,
    LlmCompletion, LlmHints, Neighborhood, LocationRepository, Result as CoreResult,
    TransactionType, TransactionTypeRepository, TransactionTypeSlug,
};
use souq_parser::{SemanticCache, TieredParser};
use souq_retrieval::{LexicalRetriever, RetrievalOrchestrator, SearchParams, VectorRetriever};
use souq_store::matcher::DbMatcher;
use souq_store::HotCache;

fn damascus() -> City {
    City {
        id: 1,
        name_ar: "دمشق".into(),
        name_en: "Damascus".into(),
        province_name_ar: "دمشق".into(),
        province_name_en: "Damascus".into(),
        lat: None,
        lon: None,
        active: true,
    }
}

fn aleppo() -> City {
    City {
        id: 2,
        name_ar: "حلب".into(),
        name_en: "Aleppo".into(),
        province_name_ar: "حلب".into(),
        province_name_en: "Aleppo".into(),
        lat: None,
        lon: None,
        active: true,
    }
}

fn cars_category() -> CategoryWithKeywords {
    CategoryWithKeywords {
        category: Category {
            id: 10,
            slug: "cars".into(),
            name_ar: "سيارات".into(),
            name_en: "Cars".into(),
            level: 2,
            parent_id: None,
            path: "/10".into(),
            active: true,
            sort_order: 0,
        },
        keywords: CategoryKeywords {
            category_id: 10,
            keywords_ar: vec!["سيارة".into(), "سيارات".into()],
            keywords_en: vec!["car".into(), "cars".into()],
            meta_keywords_ar: String::new(),
            meta_keywords_en: String::new(),
        },
    }
}

fn apartments_category() -> CategoryWithKeywords {
    CategoryWithKeywords {
        category: Category {
            id: 20,
            slug: "apartments".into(),
            name_ar: "شقق".into(),
            name_en: "Apartments".into(),
            level: 2,
            parent_id: None,
            path: "/20".into(),
            active: true,
            sort_order: 0,
        },
        keywords: CategoryKeywords {
            category_id: 20,
            keywords_ar: vec!["شقة".into(), "شقق".into()],
            keywords_en: vec!["apartment".into(), "flat".into()],
            meta_keywords_ar: String::new(),
            meta_keywords_en: String::new(),
        },
    }
}

struct FakeCategoryRepo {
    categories: Vec<CategoryWithKeywords>,
}

#[async_trait]
impl CategoryRepository for FakeCategoryRepo {
    async fn load_all_with_keywords(&self) -> CoreResult<Vec<CategoryWithKeywords>> {
        Ok(self.categories.clone())
    }
    async fn get(&self, id: i64) -> CoreResult<Option<Category>> {
        Ok(self.categories.iter().map(|c| c.category.clone()).find(|c| c.id == id))
    }
    async fn children(&self, _parent_id: i64) -> CoreResult<Vec<Category>> {
        Ok(vec![])
    }
    async fn active_child_count(&self, _id: i64) -> CoreResult<usize> {
        Ok(0)
    }
    async fn keyword_array_match(&self, _tokens: &[String], _language: Language) -> CoreResult<Vec<(Category, usize)>> {
        Ok(vec![])
    }
    async fn meta_keyword_ilike(&self, _token: &str, _language: Language) -> CoreResult<Vec<Category>> {
        Ok(vec![])
    }
    async fn fulltext_search(&self, _query: &str, _language: Language) -> CoreResult<Vec<(Category, f32)>> {
        Ok(vec![])
    }
    async fn trigram_similar(&self, _token: &str) -> CoreResult<Vec<(Category, f32)>> {
        Ok(vec![])
    }
    async fn active_descendants(&self, _parent_id: i64) -> CoreResult<Vec<Category>> {
        Ok(vec![])
    }
    async fn active_descendants_with_keywords(&self, _parent_id: i64) -> CoreResult<Vec<CategoryWithKeywords>> {
        Ok(vec![])
    }
}

struct FakeLocationRepo {
    cities: Vec<City>,
}

#[async_trait]
impl LocationRepository for FakeLocationRepo {
    async fn load_all_cities(&self) -> CoreResult<Vec<City>> {
        Ok(self.cities.clone())
    }
    async fn load_all_neighborhoods(&self) -> CoreResult<Vec<Neighborhood>> {
        Ok(vec![])
    }
    async fn get_city(&self, id: i64) -> CoreResult<Option<City>> {
        Ok(self.cities.iter().find(|c| c.id == id).cloned())
    }
    async fn trigram_similar_cities(&self, _token: &str) -> CoreResult<Vec<(City, f32)>> {
        Ok(vec![])
    }
    async fn trigram_similar_neighborhoods(&self, _token: &str) -> CoreResult<Vec<(Neighborhood, f32)>> {
        Ok(vec![])
    }
}

struct FakeTransactionRepo;

#[async_trait]
impl TransactionTypeRepository for FakeTransactionRepo {
    async fn load_all(&self) -> CoreResult<Vec<TransactionType>> {
        Ok(vec![
            TransactionType { id: 100, slug: TransactionTypeSlug::ForSale, name_ar: "للبيع".into(), name_en: "For sale".into() },
            TransactionType { id: 101, slug: TransactionTypeSlug::ForRentMonthly, name_ar: "للإيجار".into(), name_en: "For rent".into() },
        ])
    }
}

/// In-memory listing store. Filters only on the fields this fixture's
/// scenarios exercise (category/city/transaction) — it stands in for
/// the SQL predicate evaluation `PgListingRepository` does for real.
struct FakeListingRepo {
    listings: Vec<Listing>,
}

impl FakeListingRepo {
    fn matches(&self, listing: &Listing, predicate: &ListingPredicate) -> bool {
        if let Some(c) = predicate.category_id {
            if listing.category_id != c {
                return false;
            }
        }
        if let Some(city) = predicate.city_id {
            if listing.city_id != city {
                return false;
            }
        }
        if let Some(tx) = predicate.transaction_type_id {
            if listing.transaction_type_id != tx {
                return false;
            }
        }
        true
    }

    fn filtered(&self, predicate: &ListingPredicate) -> Vec<Listing> {
        self.listings.iter().filter(|l| self.matches(l, predicate)).cloned().collect()
    }
}

#[async_trait]
impl ListingRepository for FakeListingRepo {
    async fn has_any(&self, predicate: &ListingPredicate) -> CoreResult<bool> {
        Ok(self.listings.iter().any(|l| self.matches(l, predicate)))
    }

    async fn has_embedded(&self, _language: Language, predicate: &ListingPredicate) -> CoreResult<bool> {
        Ok(self.listings.iter().any(|l| self.matches(l, predicate)))
    }

    async fn has_indexed_text(&self, predicate: &ListingPredicate) -> CoreResult<bool> {
        Ok(self.listings.iter().any(|l| self.matches(l, predicate)))
    }

    async fn fetch_page(&self, predicate: &ListingPredicate, offset: u32, limit: u32) -> CoreResult<Vec<Listing>> {
        Ok(self.filtered(predicate).into_iter().skip(offset as usize).take(limit as usize).collect())
    }

    async fn nearest_by_embedding(
        &self,
        _language: Language,
        _query_vector: &[f32],
        predicate: &ListingPredicate,
        k: u32,
    ) -> CoreResult<Vec<(Listing, f32)>> {
        Ok(self.filtered(predicate).into_iter().take(k as usize).map(|l| (l, 0.8)).collect())
    }

    async fn lexical_search(
        &self,
        _language: Language,
        _query_text: &str,
        predicate: &ListingPredicate,
        k: u32,
    ) -> CoreResult<Vec<(Listing, f32)>> {
        Ok(self.filtered(predicate).into_iter().take(k as usize).map(|l| (l, 0.6)).collect())
    }

    async fn title_only_search(&self, _tokens: &[String], predicate: &ListingPredicate, k: u32) -> CoreResult<Vec<Listing>> {
        Ok(self.filtered(predicate).into_iter().take(k as usize).collect())
    }

    async fn fallback_search(&self, _tokens: &[String], predicate: &ListingPredicate, k: u32) -> CoreResult<Vec<Listing>> {
        Ok(self.filtered(predicate).into_iter().take(k as usize).collect())
    }
}

struct FakeEmbeddingClient;

#[async_trait]
impl EmbeddingClient for FakeEmbeddingClient {
    fn dimension(&self) -> usize {
        4
    }

    async fn embed(&self, _text: &str, _language: Language) -> CoreResult<Vec<f32>> {
        Ok(vec![0.1, 0.2, 0.3, 0.4])
    }
}

struct UnavailableSemanticCacheRepo;

#[async_trait]
impl souq_core::SemanticCacheRepository for UnavailableSemanticCacheRepo {
    async fn find_nearest(&self, _query_embedding: &[f32]) -> CoreResult<Option<(souq_core::ParsedResultRecord, f32)>> {
        Ok(None)
    }
    async fn upsert(&self, _query_text: &str, _query_embedding: &[f32], _intent_json: &str) -> CoreResult<()> {
        Ok(())
    }
    async fn bump_hit_count(&self, _id: i64) -> CoreResult<()> {
        Ok(())
    }
    async fn evict_stale(&self, _max_age_days: i64) -> CoreResult<u64> {
        Ok(0)
    }
}

/// Never resolves hints; the fixture relies entirely on Tier 1
/// (DB-only) matching, so these should never be reached.
struct UnreachableLlmClient;

#[async_trait]
impl IntentHintClient for UnreachableLlmClient {
    async fn short_hints(&self, _utterance: &str, _language: Language) -> CoreResult<LlmCompletion<LlmHints>> {
        panic!("tier 3 should not be reached when tier 1 resolves with high confidence")
    }
    async fn rich_hints(&self, _utterance: &str, _language: Language) -> CoreResult<LlmCompletion<LlmHints>> {
        panic!("tier 4 should not be reached when tier 1 resolves with high confidence")
    }
    async fn validate_category(&self, _utterance: &str, _category_name: &str) -> CoreResult<bool> {
        Ok(true)
    }
}

fn listing(id: i64, category_id: i64, city_id: i64, transaction_type_id: i64, is_boosted: bool, priority: i32) -> Listing {
    Listing {
        id,
        title: format!("listing {id}"),
        description: String::new(),
        category_id,
        city_id,
        neighborhood_id: None,
        transaction_type_id,
        is_boosted,
        priority,
        created_at: chrono::Utc::now(),
        attributes: HashMap::new(),
    }
}

struct Fixture {
    parser: Arc<TieredParser>,
    orchestrator: Arc<RetrievalOrchestrator>,
}

async fn build_fixture(listings: Vec<Listing>) -> Fixture {
    let category_repo = Arc::new(FakeCategoryRepo { categories: vec![cars_category(), apartments_category()] });
    let location_repo = Arc::new(FakeLocationRepo { cities: vec![damascus(), aleppo()] });
    let transaction_repo = Arc::new(FakeTransactionRepo);
    let listing_repo: Arc<dyn ListingRepository> = Arc::new(FakeListingRepo { listings });
    let embedder: Arc<dyn EmbeddingClient> = Arc::new(FakeEmbeddingClient);
    let llm_client: Arc<dyn IntentHintClient> = Arc::new(UnreachableLlmClient);

    let hot_cache = Arc::new(HotCache::new(
        Duration::from_secs(300),
        500,
        category_repo.clone(),
        location_repo.clone(),
        transaction_repo,
    ));
    hot_cache.initialize().await.unwrap();

    let db_matcher = Arc::new(DbMatcher::new(hot_cache.clone(), category_repo.clone(), location_repo.clone()));
    let semantic_cache = Arc::new(SemanticCache::new(Arc::new(UnavailableSemanticCacheRepo), embedder.clone(), 0.92));
    let exact_cache = Arc::new(ExactCache::new(Duration::from_secs(3600)));
    let stats = Arc::new(ParserStats::new());

    let parser = Arc::new(TieredParser::new(
        db_matcher,
        semantic_cache,
        exact_cache,
        stats,
        llm_client.clone(),
        ParserConfig::default(),
    ));

    let vector = VectorRetriever::new(listing_repo.clone(), embedder);
    let lexical = LexicalRetriever::new(listing_repo);
    let result_cache = Arc::new(ResultCache::new(Duration::from_secs(3600)));

    let orchestrator = Arc::new(RetrievalOrchestrator::new(
        parser.clone(),
        vector,
        lexical,
        category_repo,
        location_repo,
        hot_cache,
        llm_client,
        result_cache,
        RetrievalConfig::default(),
    ));

    Fixture { parser, orchestrator }
}

#[tokio::test]
async fn english_car_query_resolves_category_city_and_transaction_at_tier_one() {
    let fixture = build_fixture(vec![
        listing(1, 10, 1, 100, false, 0),
        listing(2, 10, 1, 100, true, 5),
        listing(3, 20, 1, 100, false, 0),
    ])
    .await;

    let intent = fixture.parser.parse("cars for sale in Damascus", Language::En).await.unwrap();

    assert_eq!(intent.tier, souq_core::Tier::DbOnly);
    assert_eq!(intent.category.as_ref().unwrap().slug, "cars");
    assert_eq!(intent.location.as_ref().unwrap().name, "Damascus");
    assert_eq!(intent.transaction_type.as_ref().unwrap().slug, TransactionTypeSlug::ForSale);
    assert!(intent.confidence > 0.8);
}

#[tokio::test]
async fn arabic_apartment_query_matches_category_via_hot_cache_keywords() {
    let fixture = build_fixture(vec![listing(1, 20, 2, 100, false, 0)]).await;

    let intent = fixture.parser.parse("شقق للبيع في حلب", Language::Ar).await.unwrap();

    assert_eq!(intent.category.as_ref().unwrap().slug, "apartments");
    assert_eq!(intent.location.as_ref().unwrap().name, "Aleppo");
}

#[tokio::test]
async fn search_returns_only_listings_in_the_matched_category_and_city() {
    let fixture = build_fixture(vec![
        listing(1, 10, 1, 100, false, 0),
        listing(2, 10, 1, 100, false, 0),
        listing(3, 10, 2, 100, false, 0),
        listing(4, 20, 1, 100, false, 0),
    ])
    .await;

    let page = fixture
        .orchestrator
        .search(SearchParams {
            query: "cars for sale in Damascus".into(),
            language: Language::En,
            page: 1,
            limit: 20,
            filters: HashMap::new(),
            user_id: None,
        })
        .await
        .unwrap();

    let ids: Vec<i64> = page.listings.iter().map(|l| l.id).collect();
    assert_eq!(ids, vec![1, 2]);
}

#[tokio::test]
async fn boosted_listing_ranks_above_a_plain_listing_in_the_same_city() {
    let fixture = build_fixture(vec![
        listing(1, 10, 1, 100, false, 0),
        listing(2, 10, 1, 100, true, 0),
    ])
    .await;

    let page = fixture
        .orchestrator
        .search(SearchParams {
            query: "cars for sale in Damascus".into(),
            language: Language::En,
            page: 1,
            limit: 20,
            filters: HashMap::new(),
            user_id: None,
        })
        .await
        .unwrap();

    assert_eq!(page.listings.first().unwrap().id, 2);
}

#[tokio::test]
async fn repeated_search_hits_the_result_cache_and_is_byte_identical() {
    let fixture = build_fixture(vec![listing(1, 10, 1, 100, false, 0)]).await;
    let params = || SearchParams {
        query: "cars for sale in Damascus".into(),
        language: Language::En,
        page: 1,
        limit: 20,
        filters: HashMap::new(),
        user_id: None,
    };

    let first = fixture.orchestrator.search(params()).await.unwrap();
    let second = fixture.orchestrator.search(params()).await.unwrap();

    assert_eq!(
        serde_json::to_string(&first.listings).unwrap(),
        serde_json::to_string(&second.listings).unwrap()
    );
}
