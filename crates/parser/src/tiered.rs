//! TieredParser: the Tier 0-4 orchestration pipeline (spec §4.6).

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use souq_cache::{ExactCache, ParserStats};
use souq_config::ParserConfig;
use souq_core::{
    AttributeValue, Category, CategoryMatch, ConfidenceWeights, Intent, IntentHintClient,
    Language, LlmHints, LlmMetadata, ParseMethod, Result, Tier,
};
use souq_store::matcher::DbMatcher;
use souq_text::{normalize, tokenize};
use tracing::warn;

use crate::attributes::AttributeExtractor;
use crate::semantic_cache::SemanticCache;

/// A draft in progress through Tier 1: the matched components plus the
/// tokens/attributes that feed every later tier.
struct Draft {
    original: String,
    normalized: String,
    language: Language,
    tokens: Vec<String>,
    category: Option<CategoryMatch>,
    location: Option<souq_core::LocationMatch>,
    transaction_type: Option<souq_core::TransactionMatch>,
    attributes: HashMap<String, AttributeValue>,
}

pub struct TieredParser {
    db_matcher: Arc<DbMatcher>,
    attribute_extractor: AttributeExtractor,
    semantic_cache: Arc<SemanticCache>,
    exact_cache: Arc<ExactCache>,
    stats: Arc<ParserStats>,
    llm_client: Arc<dyn IntentHintClient>,
    config: ParserConfig,
    weights: ConfidenceWeights,
}

impl TieredParser {
    pub fn new(
        db_matcher: Arc<DbMatcher>,
        semantic_cache: Arc<SemanticCache>,
        exact_cache: Arc<ExactCache>,
        stats: Arc<ParserStats>,
        llm_client: Arc<dyn IntentHintClient>,
        config: ParserConfig,
    ) -> Self {
        Self {
            db_matcher,
            attribute_extractor: AttributeExtractor::new(),
            semantic_cache,
            exact_cache,
            stats,
            llm_client,
            config,
            weights: ConfidenceWeights::default(),
        }
    }

    /// `parse(utterance, language) -> Intent` (spec §4.6).
    pub async fn parse(&self, utterance: &str, language: Language) -> Result<Intent> {
        let normalized = normalize(utterance);
        let tokens = tokenize(normalized.as_str(), language);

        // Tier 0: exact cache.
        if let Some(cached) = self.exact_cache.get(normalized.as_str()) {
            self.stats.record(Tier::Exact);
            return Ok(cached);
        }

        // Tier 1: DB-only match.
        let draft = self.tier1(utterance, &normalized, &tokens.0, language).await?;
        let confidence1 = self.draft_confidence(&draft);

        if confidence1 >= self.config.tier1_confidence_threshold {
            let intent = self.finalize(draft, confidence1, Tier::DbOnly, ParseMethod::DbMatch, None);
            self.cache_and_record(&intent, true).await;
            return Ok(intent);
        }

        // Tier 2: semantic cache.
        match self.semantic_cache.lookup(normalized.as_str(), language).await {
            Ok(Some(mut intent)) => {
                intent.tier = Tier::Semantic;
                intent.method = ParseMethod::SemanticCache;
                self.exact_cache.put(normalized.as_str(), intent.clone());
                self.stats.record(Tier::Semantic);
                return Ok(intent);
            }
            Ok(None) => {}
            Err(e) => warn!(error = %e, "semantic cache lookup failed, continuing to tier 3"),
        }

        // Tier 3: short LLM prompt.
        let short_budget = Duration::from_millis(self.config.tier3_budget_ms);
        match tokio::time::timeout(short_budget, self.llm_client.short_hints(utterance, language)).await {
            Ok(Ok(completion)) => {
                let mut next = self.apply_hints(&draft, &completion.value, language).await;
                if next.resolved_more_than(&draft) {
                    let intent = self.finalize(
                        next.take(),
                        0.85,
                        Tier::LlmShort,
                        ParseMethod::LlmShort,
                        Some(completion.metadata),
                    );
                    self.cache_and_record(&intent, true).await;
                    return Ok(intent);
                }
            }
            Ok(Err(e)) => warn!(error = %e, "tier 3 llm call failed, continuing to tier 4"),
            Err(_) => warn!("tier 3 llm call exceeded budget, continuing to tier 4"),
        }

        // Tier 4: richer LLM prompt.
        let rich_budget = Duration::from_millis(self.config.tier4_budget_ms);
        match tokio::time::timeout(rich_budget, self.llm_client.rich_hints(utterance, language)).await {
            Ok(Ok(completion)) => {
                let mut next = self.apply_hints(&draft, &completion.value, language).await;
                for (key, value) in &completion.value.attributes {
                    next.attributes.entry(key.clone()).or_insert_with(|| AttributeValue::Enum {
                        value: value.clone(),
                    });
                }
                if next.resolved_more_than(&draft) || !completion.value.attributes.is_empty() {
                    let intent = self.finalize(
                        next.take(),
                        0.85,
                        Tier::LlmRich,
                        ParseMethod::LlmRich,
                        Some(completion.metadata),
                    );
                    self.cache_and_record(&intent, true).await;
                    return Ok(intent);
                }
            }
            Ok(Err(e)) => warn!(error = %e, "tier 4 llm call failed, falling back to tier 1 best-effort"),
            Err(_) => warn!("tier 4 llm call exceeded budget, falling back to tier 1 best-effort"),
        }

        let fallback_confidence = confidence1 * 0.8;
        let intent = self.finalize(draft, fallback_confidence, Tier::Fallback, ParseMethod::Fallback, None);
        self.cache_and_record(&intent, true).await;
        Ok(intent)
    }

    async fn tier1(
        &self,
        raw_text: &str,
        normalized: &souq_core::NormalizedText,
        tokens: &[String],
        language: Language,
    ) -> Result<Draft> {
        let (category, location) = tokio::join!(
            self.db_matcher.match_category(tokens, language),
            self.db_matcher.match_location(tokens, language),
        );
        let mut category = category?;
        let location = location?;
        let transaction_type = self.db_matcher.match_transaction_type(raw_text, language);
        let attributes = self.attribute_extractor.extract(raw_text);

        if let Some(cat) = &category {
            if cat.level < 2 {
                if let Some(leaf) = self
                    .db_matcher
                    .find_leaf_category(cat.id, tokens, language)
                    .await?
                {
                    category = Some(leaf_match(&leaf, cat.confidence * 0.95));
                }
            }
        }

        Ok(Draft {
            original: raw_text.to_string(),
            normalized: normalized.as_str().to_string(),
            language,
            tokens: tokens.to_vec(),
            category,
            location,
            transaction_type,
            attributes,
        })
    }

    fn draft_confidence(&self, draft: &Draft) -> f32 {
        let mut num = 0.0;
        let mut den = 0.0;
        if let Some(c) = &draft.category {
            num += self.weights.category * c.confidence;
            den += self.weights.category;
        }
        if let Some(l) = &draft.location {
            num += self.weights.location * l.confidence;
            den += self.weights.location;
        }
        if let Some(t) = &draft.transaction_type {
            if t.confidence > 0.7 {
                num += self.weights.transaction * t.confidence;
                den += self.weights.transaction;
            }
        }
        if !draft.attributes.is_empty() {
            num += self.weights.attributes;
            den += self.weights.attributes;
        }
        if den == 0.0 {
            0.0
        } else {
            num / den
        }
    }

    /// Re-resolves LLM hint strings through the same matchers tier 1 used,
    /// returning a candidate draft that the caller compares against the
    /// original to decide whether anything new resolved.
    async fn apply_hints(&self, draft: &Draft, hints: &LlmHints, language: Language) -> DraftUpdate {
        let mut next = DraftUpdate::from(draft);

        if next.category.is_none() {
            if let Some(hint) = &hints.category {
                let hint_tokens = tokenize(hint, language);
                if let Ok(Some(m)) = self.db_matcher.match_category(&hint_tokens.0, language).await {
                    next.category = Some(m);
                }
            }
        }
        if next.location.is_none() {
            if let Some(hint) = &hints.location {
                let hint_tokens = tokenize(hint, language);
                if let Ok(Some(m)) = self.db_matcher.match_location(&hint_tokens.0, language).await {
                    next.location = Some(m);
                }
            }
        }
        if next.transaction_type.is_none() {
            if let Some(hint) = &hints.transaction {
                next.transaction_type = self.db_matcher.match_transaction_type(hint, language);
            }
        }

        next
    }

    fn finalize(
        &self,
        draft: Draft,
        confidence: f32,
        tier: Tier,
        method: ParseMethod,
        llm: Option<LlmMetadata>,
    ) -> Intent {
        Intent {
            original: draft.original,
            normalized: draft.normalized,
            language: draft.language,
            category: draft.category,
            location: draft.location,
            transaction_type: draft.transaction_type,
            attributes: draft.attributes,
            keywords: souq_core::Tokens(draft.tokens),
            confidence,
            tier,
            method,
            llm,
        }
    }

    async fn cache_and_record(&self, intent: &Intent, also_semantic: bool) {
        self.exact_cache.put(&intent.normalized, intent.clone());
        self.stats.record(intent.tier);
        if also_semantic {
            if let Err(e) = self
                .semantic_cache
                .store(&intent.normalized, intent.language, intent)
                .await
            {
                warn!(error = %e, "failed to store intent in semantic cache");
            }
        }
    }
}

fn leaf_match(category: &Category, confidence: f32) -> CategoryMatch {
    CategoryMatch {
        id: category.id,
        slug: category.slug.clone(),
        name: category.name_en.clone(),
        level: category.level,
        confidence,
    }
}

/// Mutable staging area for `apply_hints`, compared back against the
/// originating `Draft` to decide whether any hint actually resolved
/// something new (spec §4.6 "if any hint resolves").
struct DraftUpdate {
    original: String,
    normalized: String,
    language: Language,
    tokens: Vec<String>,
    category: Option<CategoryMatch>,
    location: Option<souq_core::LocationMatch>,
    transaction_type: Option<souq_core::TransactionMatch>,
    attributes: HashMap<String, AttributeValue>,
    had_category: bool,
    had_location: bool,
    had_transaction: bool,
}

impl From<&Draft> for DraftUpdate {
    fn from(draft: &Draft) -> Self {
        Self {
            original: draft.original.clone(),
            normalized: draft.normalized.clone(),
            language: draft.language,
            tokens: draft.tokens.clone(),
            category: draft.category.clone(),
            location: draft.location.clone(),
            transaction_type: draft.transaction_type.clone(),
            attributes: draft.attributes.clone(),
            had_category: draft.category.is_some(),
            had_location: draft.location.is_some(),
            had_transaction: draft.transaction_type.is_some(),
        }
    }
}

impl DraftUpdate {
    fn resolved_more_than(&self, original: &Draft) -> bool {
        (self.category.is_some() && !self.had_category)
            || (self.location.is_some() && !self.had_location)
            || (self.transaction_type.is_some() && !self.had_transaction)
            || self.attributes.len() > original.attributes.len()
    }

    fn take(self) -> Draft {
        Draft {
            original: self.original,
            normalized: self.normalized,
            language: self.language,
            tokens: self.tokens,
            category: self.category,
            location: self.location,
            transaction_type: self.transaction_type,
            attributes: self.attributes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use souq_core::{
        Category, CategoryWithKeywords, City, EmbeddingClient, LlmCompletion, Neighborhood,
        Result as CoreResult, SemanticCacheRepository, TransactionType, TransactionTypeRepository,
    };
    use souq_store::HotCache;

    struct EmptyCategoryRepo;
    #[async_trait]
    impl souq_core::CategoryRepository for EmptyCategoryRepo {
        async fn load_all_with_keywords(&self) -> CoreResult<Vec<CategoryWithKeywords>> {
            Ok(vec![])
        }
        async fn get(&self, _id: i64) -> CoreResult<Option<Category>> {
            Ok(None)
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

    struct EmptyLocationRepo;
    #[async_trait]
    impl souq_core::LocationRepository for EmptyLocationRepo {
        async fn load_all_cities(&self) -> CoreResult<Vec<City>> {
            Ok(vec![])
        }
        async fn load_all_neighborhoods(&self) -> CoreResult<Vec<Neighborhood>> {
            Ok(vec![])
        }
        async fn get_city(&self, _id: i64) -> CoreResult<Option<City>> {
            Ok(None)
        }
        async fn trigram_similar_cities(&self, _token: &str) -> CoreResult<Vec<(City, f32)>> {
            Ok(vec![])
        }
        async fn trigram_similar_neighborhoods(&self, _token: &str) -> CoreResult<Vec<(Neighborhood, f32)>> {
            Ok(vec![])
        }
    }

    struct EmptyTxRepo;
    #[async_trait]
    impl TransactionTypeRepository for EmptyTxRepo {
        async fn load_all(&self) -> CoreResult<Vec<TransactionType>> {
            Ok(vec![])
        }
    }

    struct EmptySemanticCacheRepo;
    #[async_trait]
    impl SemanticCacheRepository for EmptySemanticCacheRepo {
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

    struct StubEmbedder;
    #[async_trait]
    impl EmbeddingClient for StubEmbedder {
        fn dimension(&self) -> usize {
            4
        }
        async fn embed(&self, _text: &str, _language: Language) -> CoreResult<Vec<f32>> {
            Ok(vec![0.0; 4])
        }
    }

    /// Never resolves anything, so the pipeline always falls through to
    /// the tier-1 best-effort fallback.
    struct SilentLlm;
    #[async_trait]
    impl IntentHintClient for SilentLlm {
        async fn short_hints(&self, _utterance: &str, _language: Language) -> CoreResult<LlmCompletion<LlmHints>> {
            Ok(LlmCompletion {
                value: LlmHints::default(),
                metadata: LlmMetadata {
                    model: "test".into(),
                    prompt_tokens: 0,
                    completion_tokens: 0,
                },
            })
        }
        async fn rich_hints(&self, _utterance: &str, _language: Language) -> CoreResult<LlmCompletion<LlmHints>> {
            Ok(LlmCompletion {
                value: LlmHints::default(),
                metadata: LlmMetadata {
                    model: "test".into(),
                    prompt_tokens: 0,
                    completion_tokens: 0,
                },
            })
        }
        async fn validate_category(&self, _utterance: &str, _category_name: &str) -> CoreResult<bool> {
            Ok(true)
        }
    }

    fn make_parser() -> TieredParser {
        let hot_cache = Arc::new(HotCache::new(
            Duration::from_secs(300),
            500,
            Arc::new(EmptyCategoryRepo),
            Arc::new(EmptyLocationRepo),
            Arc::new(EmptyTxRepo),
        ));
        let db_matcher = Arc::new(DbMatcher::new(hot_cache, Arc::new(EmptyCategoryRepo), Arc::new(EmptyLocationRepo)));
        let semantic_cache = Arc::new(SemanticCache::new(
            Arc::new(EmptySemanticCacheRepo),
            Arc::new(StubEmbedder),
            0.92,
        ));
        let exact_cache = Arc::new(ExactCache::new(Duration::from_secs(3600)));
        let stats = Arc::new(ParserStats::new());
        TieredParser::new(db_matcher, semantic_cache, exact_cache, stats, Arc::new(SilentLlm), ParserConfig::default())
    }

    #[tokio::test]
    async fn empty_catalog_falls_through_to_tier1_best_effort_fallback() {
        let parser = make_parser();
        let intent = parser.parse("random query with nothing to match", Language::En).await.unwrap();
        assert_eq!(intent.tier, Tier::Fallback);
        assert_eq!(intent.confidence, 0.0);
        assert!(intent.category.is_none());
    }

    #[tokio::test]
    async fn second_call_hits_the_exact_cache() {
        let parser = make_parser();
        let first = parser.parse("same query twice", Language::En).await.unwrap();
        let second = parser.parse("same query twice", Language::En).await.unwrap();
        assert_eq!(second.tier, Tier::Exact);
        assert_eq!(first.normalized, second.normalized);
    }
}
