//! `SearchEngine`: wires every crate together behind the three
//! language-neutral entry points spec §6 names (`parse`, `search`,
//! `healthCheck`). No transport layer — HTTP/WS framing is an explicit
//! Non-goal; a binary embedding this crate owns that.

use std::sync::Arc;
use std::time::Duration;

use souq_cache::{ExactCache, ParserStats, ResultCache};
use souq_config::Settings;
use souq_core::{IntentHintClient, Intent, Language, Result, ResultPage};
use souq_llm::{HttpEmbeddingClient, JsonCompletionBackend};
use souq_parser::TieredParser;
use souq_retrieval::{LexicalRetriever, RetrievalOrchestrator, SearchParams, VectorRetriever};
use souq_store::matcher::DbMatcher;
use souq_store::postgres::{
    PgCategoryRepository, PgListingRepository, PgLocationRepository, PgSemanticCacheRepository,
    PgStore, PgTransactionTypeRepository,
};
use souq_store::HotCache;

use crate::health::{ComponentHealth, ComponentStatus, HealthStatus};

pub struct SearchEngine {
    settings: Settings,
    hot_cache: Arc<HotCache>,
    parser: Arc<TieredParser>,
    orchestrator: Arc<RetrievalOrchestrator>,
    store: PgStore,
    llm_client: Arc<dyn IntentHintClient>,
}

impl SearchEngine {
    /// Connects to the store, primes the `HotCache`, and wires the
    /// parser/retrieval pipeline. Call once at process startup.
    pub async fn bootstrap(settings: Settings) -> Result<Self> {
        let store = PgStore::connect(&settings.store).await?;

        let category_repo = Arc::new(PgCategoryRepository::new(store.clone()));
        let location_repo = Arc::new(PgLocationRepository::new(store.clone()));
        let transaction_repo = Arc::new(PgTransactionTypeRepository::new(store.clone()));
        let listing_repo = Arc::new(PgListingRepository::new(store.clone()));
        let semantic_cache_repo = Arc::new(PgSemanticCacheRepository::new(
            store.clone(),
            settings.parser.semantic_cache_similarity_threshold,
        ));

        let hot_cache = Arc::new(HotCache::new(
            Duration::from_millis(settings.hot_cache.ttl_ms),
            settings.hot_cache.top_n_categories,
            category_repo.clone(),
            location_repo.clone(),
            transaction_repo,
        ));
        hot_cache.initialize().await?;

        let embedder = Arc::new(HttpEmbeddingClient::new(settings.embedding.clone()));
        let llm_backend = Arc::new(JsonCompletionBackend::new(
            settings.llm.clone(),
            Duration::from_millis(settings.parser.tier4_budget_ms + 500),
        )?);

        let db_matcher = Arc::new(DbMatcher::new(hot_cache.clone(), category_repo.clone(), location_repo.clone()));
        let semantic_cache = Arc::new(souq_parser::SemanticCache::new(
            semantic_cache_repo,
            embedder.clone(),
            settings.parser.semantic_cache_similarity_threshold,
        ));
        let exact_cache = Arc::new(ExactCache::new(Duration::from_secs(settings.parser.exact_cache_ttl_s)));
        let stats = Arc::new(ParserStats::new());

        let parser = Arc::new(TieredParser::new(
            db_matcher,
            semantic_cache,
            exact_cache,
            stats,
            llm_backend.clone(),
            settings.parser.clone(),
        ));

        let vector_retriever = VectorRetriever::new(listing_repo.clone(), embedder);
        let lexical_retriever = LexicalRetriever::new(listing_repo);
        let result_cache = Arc::new(ResultCache::new(Duration::from_secs(settings.parser.exact_cache_ttl_s)));

        let llm_client: Arc<dyn IntentHintClient> = llm_backend.clone();

        let orchestrator = Arc::new(RetrievalOrchestrator::new(
            parser.clone(),
            vector_retriever,
            lexical_retriever,
            category_repo,
            location_repo,
            hot_cache.clone(),
            llm_backend,
            result_cache,
            settings.retrieval.clone(),
        ));

        Ok(Self { settings, hot_cache, parser, orchestrator, store, llm_client })
    }

    /// `parse(utterance, language) -> Intent` (spec §6).
    pub async fn parse(&self, utterance: &str, language: Language) -> Result<Intent> {
        if utterance.chars().count() < 2 || utterance.chars().count() > 500 {
            return Err(souq_core::Error::InvalidInput(format!(
                "utterance length must be in [2, 500], got {}",
                utterance.chars().count()
            )));
        }
        self.hot_cache.refresh_if_stale().await;
        self.parser.parse(utterance, language).await
    }

    /// `search(params) -> ResultPage` (spec §6, §4.9).
    pub async fn search(&self, params: SearchParams) -> Result<ResultPage> {
        if params.query.chars().count() < 2 || params.query.chars().count() > 500 {
            return Err(souq_core::Error::InvalidInput(format!(
                "utterance length must be in [2, 500], got {}",
                params.query.chars().count()
            )));
        }
        self.hot_cache.refresh_if_stale().await;
        self.orchestrator.search(params).await
    }

    /// `healthCheck() -> { status, components }` (spec §6).
    pub async fn health_check(&self) -> HealthStatus {
        let store_health = match self.store.ping().await {
            Ok(()) => ComponentHealth { name: "store".into(), status: ComponentStatus::Ok, detail: None },
            Err(err) => ComponentHealth { name: "store".into(), status: ComponentStatus::Down, detail: Some(err.to_string()) },
        };

        let hot_cache_health = {
            let snapshot = self.hot_cache.snapshot();
            if snapshot.loaded_at.elapsed() > Duration::from_millis(self.settings.hot_cache.ttl_ms) * 3 {
                ComponentHealth { name: "hot_cache".into(), status: ComponentStatus::Degraded, detail: Some("stale beyond 3x TTL".into()) }
            } else {
                ComponentHealth { name: "hot_cache".into(), status: ComponentStatus::Ok, detail: None }
            }
        };

        let llm_health = match self.llm_client.validate_category("ping", "ping").await {
            Ok(_) => ComponentHealth { name: "llm".into(), status: ComponentStatus::Ok, detail: None },
            Err(err) => ComponentHealth { name: "llm".into(), status: ComponentStatus::Down, detail: Some(err.to_string()) },
        };

        HealthStatus::from_components(vec![store_health, hot_cache_health, llm_health])
    }
}
