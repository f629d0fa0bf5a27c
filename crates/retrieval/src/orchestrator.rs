//! RetrievalOrchestrator (spec §4.9): turns a parsed intent into a
//! ranked, paginated `ResultPage`.

use std::cmp::Ordering;
use std::collections::HashSet;
use std::sync::Arc;

use souq_cache::ResultCache;
use souq_config::RetrievalConfig;
use souq_core::{
    CategoryRepository, IntentHintClient, Intent, Language, Listing, LocationKind, LocationRepository,
    ResultPage, Result,
};
use souq_parser::TieredParser;
use souq_store::{build_predicate, FilterBuilderOptions, FilterExtras, HotCache};
use souq_text::normalize;
use tracing::{info, warn};

use crate::lexical_retriever::LexicalRetriever;
use crate::vector_retriever::VectorRetriever;

/// Retrieval method chosen by the step-5 decision rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Method {
    Vector,
    Lexical,
    Hybrid,
}

/// `search(params: { query, language, page, limit, filters?, userId? })`
/// (spec §6).
#[derive(Debug, Clone)]
pub struct SearchParams {
    pub query: String,
    pub language: Language,
    pub page: u32,
    pub limit: u32,
    pub filters: FilterExtras,
    pub user_id: Option<String>,
}

struct Scored {
    listing: Listing,
    primary_score: f32,
}

fn score(listing: &Listing, base: f32) -> f32 {
    let boost = if listing.is_boosted { 0.2 } else { 0.0 };
    base + boost + 0.01 * listing.priority as f32
}

fn merge_hybrid(vector_hits: Vec<(Listing, f32)>, lexical_hits: Vec<(Listing, f32)>) -> Vec<Scored> {
    let mut seen = HashSet::new();
    let mut merged = Vec::with_capacity(vector_hits.len() + lexical_hits.len());
    for (listing, s) in vector_hits {
        seen.insert(listing.id);
        merged.push(Scored { primary_score: score(&listing, s), listing });
    }
    for (listing, s) in lexical_hits {
        if seen.insert(listing.id) {
            merged.push(Scored { primary_score: score(&listing, s), listing });
        }
    }
    merged
}

pub struct RetrievalOrchestrator {
    parser: Arc<TieredParser>,
    vector: VectorRetriever,
    lexical: LexicalRetriever,
    category_repo: Arc<dyn CategoryRepository>,
    location_repo: Arc<dyn LocationRepository>,
    hot_cache: Arc<HotCache>,
    llm_client: Arc<dyn IntentHintClient>,
    result_cache: Arc<ResultCache>,
    config: RetrievalConfig,
}

impl RetrievalOrchestrator {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        parser: Arc<TieredParser>,
        vector: VectorRetriever,
        lexical: LexicalRetriever,
        category_repo: Arc<dyn CategoryRepository>,
        location_repo: Arc<dyn LocationRepository>,
        hot_cache: Arc<HotCache>,
        llm_client: Arc<dyn IntentHintClient>,
        result_cache: Arc<ResultCache>,
        config: RetrievalConfig,
    ) -> Self {
        Self {
            parser,
            vector,
            lexical,
            category_repo,
            location_repo,
            hot_cache,
            llm_client,
            result_cache,
            config,
        }
    }

    pub async fn search(&self, params: SearchParams) -> Result<ResultPage> {
        let cache_key = Self::cache_key(&params);
        if let Some(page) = self.result_cache.get(&cache_key) {
            return Ok(page);
        }

        let intent = self.parser.parse(&params.query, params.language).await?;

        let include_category = self.resolve_category_gate(&intent).await?;

        if !include_category && intent.category.is_some() && intent.confidence < self.config.category_confidence_gate_low {
            let predicate = self.build_predicate(&intent, &params, false);
            let title_hits = self
                .lexical
                .title_only_search(&params.query, params.language, &predicate, params.limit)
                .await?;
            if !title_hits.is_empty() {
                let scored: Vec<Scored> = title_hits.into_iter().map(|l| Scored { primary_score: score(&l, 0.0), listing: l }).collect();
                let ranked = self.rerank_by_location(&intent, scored).await?;
                return self.paginate_and_cache(&cache_key, &params, ranked).await;
            }
        }

        let predicate = self.build_predicate(&intent, &params, include_category);
        let k = params.page.saturating_mul(params.limit).max(params.limit) + params.limit;

        let method = self.select_method(&intent, &predicate).await?;
        info!(?method, confidence = intent.confidence, "retrieval method selected");

        let mut hits = match method {
            Method::Vector => self
                .vector
                .search(&params.query, params.language, &predicate, k)
                .await?
                .into_iter()
                .map(|(l, s)| Scored { primary_score: score(&l, s), listing: l })
                .collect::<Vec<_>>(),
            Method::Lexical => self
                .lexical
                .search(&params.query, params.language, &predicate, k)
                .await?
                .into_iter()
                .map(|(l, s)| Scored { primary_score: score(&l, s), listing: l })
                .collect::<Vec<_>>(),
            Method::Hybrid => {
                let (vector_hits, lexical_hits) = tokio::join!(
                    self.vector.search(&params.query, params.language, &predicate, k),
                    self.lexical.search(&params.query, params.language, &predicate, k)
                );
                merge_hybrid(vector_hits?, lexical_hits?)
            }
        };

        if hits.is_empty() {
            hits = self.parent_category_fallback(&intent, &predicate, &params, k).await?;
        }

        if hits.is_empty() {
            hits = self.global_fallback(&predicate, &params, k).await?;
        }

        let ranked = self.rerank_by_location(&intent, hits).await?;
        self.paginate_and_cache(&cache_key, &params, ranked).await
    }

    /// Confidence gate on category (spec §4.9 step 4). Returns whether the
    /// category should be kept in the predicate.
    async fn resolve_category_gate(&self, intent: &Intent) -> Result<bool> {
        let Some(category) = &intent.category else {
            return Ok(true);
        };

        if intent.confidence >= self.config.category_confidence_gate_high {
            return Ok(true);
        }

        if intent.confidence >= self.config.category_confidence_gate_low {
            return match self.llm_client.validate_category(&intent.original, &category.name).await {
                Ok(keep) => Ok(keep),
                Err(err) => {
                    warn!(error = %err, "category validator unavailable, keeping category");
                    Ok(true)
                }
            };
        }

        Ok(false)
    }

    fn build_predicate(&self, intent: &Intent, params: &SearchParams, include_category: bool) -> souq_core::ListingPredicate {
        let mut predicate = build_predicate(intent, &params.filters, FilterBuilderOptions { include_category });

        if let Some(transaction) = &intent.transaction_type {
            let snapshot = self.hot_cache.snapshot();
            if let Some(tx) = snapshot.transaction_types.iter().find(|t| t.slug == transaction.slug) {
                predicate.transaction_type_id = Some(tx.id);
            }
        }

        predicate
    }

    async fn select_method(&self, intent: &Intent, predicate: &souq_core::ListingPredicate) -> Result<Method> {
        let vector_available = self.vector.available(intent.language, predicate).await?;
        let many_signals = intent.attributes.len() >= 2 || intent.keywords.0.len() >= 2;

        if vector_available && intent.confidence > self.config.vector_method_min_confidence && many_signals {
            Ok(Method::Vector)
        } else if intent.confidence < 0.5 {
            Ok(Method::Lexical)
        } else {
            Ok(Method::Hybrid)
        }
    }

    /// Recursive parent-category fallback (spec §4.9 step 6): walk up the
    /// category tree, running the lexical retriever at each ancestor until
    /// one returns a non-empty page or the max depth is exhausted.
    async fn parent_category_fallback(
        &self,
        intent: &Intent,
        predicate: &souq_core::ListingPredicate,
        params: &SearchParams,
        k: u32,
    ) -> Result<Vec<Scored>> {
        let Some(category) = &intent.category else {
            return Ok(vec![]);
        };

        let mut current_id = category.id;
        for _ in 0..self.config.max_parent_fallback_depth {
            let Some(current) = self.category_repo.get(current_id).await? else {
                break;
            };
            let Some(parent_id) = current.parent_id else {
                break;
            };

            let mut parent_predicate = predicate.clone();
            parent_predicate.category_id = Some(parent_id);

            let hits = self.lexical.search(&params.query, params.language, &parent_predicate, k).await?;
            if !hits.is_empty() {
                return Ok(hits.into_iter().map(|(l, s)| Scored { primary_score: score(&l, s), listing: l }).collect());
            }

            current_id = parent_id;
        }

        Ok(vec![])
    }

    /// Global `titleOnlySearch` then `fallbackSearch`, neither filtered by
    /// category (spec §4.9 step 6).
    async fn global_fallback(&self, predicate: &souq_core::ListingPredicate, params: &SearchParams, k: u32) -> Result<Vec<Scored>> {
        let mut global = predicate.clone();
        global.category_id = None;
        global.category_path_prefix = None;

        let title_hits = self.lexical.title_only_search(&params.query, params.language, &global, k).await?;
        if !title_hits.is_empty() {
            return Ok(title_hits.into_iter().map(|l| Scored { primary_score: score(&l, 0.0), listing: l }).collect());
        }

        let fallback_hits = self.lexical.fallback_search(&params.query, params.language, &global, k).await?;
        Ok(fallback_hits.into_iter().map(|l| Scored { primary_score: score(&l, 0.0), listing: l }).collect())
    }

    /// Resolves the city/province a query's location refers to, for
    /// proximity re-ranking (spec §4.9 step 7). Neighborhoods are not part
    /// of the hot cache so their city is looked up on demand.
    async fn location_context(&self, intent: &Intent) -> Result<Option<(i64, String)>> {
        let Some(location) = &intent.location else {
            return Ok(None);
        };

        let city_id = match location.kind {
            LocationKind::City => location.id,
            LocationKind::Neighborhood => {
                let neighborhoods = self.location_repo.load_all_neighborhoods().await?;
                match neighborhoods.into_iter().find(|n| n.id == location.id) {
                    Some(n) => n.city_id,
                    None => return Ok(None),
                }
            }
        };

        let snapshot = self.hot_cache.snapshot();
        let province = snapshot
            .cities
            .iter()
            .find(|c| c.id == city_id)
            .map(|c| c.localized_province(intent.language).to_string());

        Ok(province.map(|p| (city_id, p)))
    }

    async fn rerank_by_location(&self, intent: &Intent, hits: Vec<Scored>) -> Result<Vec<Scored>> {
        let context = self.location_context(intent).await?;

        let Some((city_id, province)) = context else {
            let mut hits = hits;
            hits.sort_by(|a, b| b.primary_score.partial_cmp(&a.primary_score).unwrap_or(Ordering::Equal));
            return Ok(hits);
        };

        let snapshot = self.hot_cache.snapshot();
        let mut ranked: Vec<(u8, u8, Scored)> = hits
            .into_iter()
            .map(|scored| {
                let same_city = scored.listing.city_id == city_id;
                let same_province = snapshot
                    .cities
                    .iter()
                    .find(|c| c.id == scored.listing.city_id)
                    .map(|c| c.localized_province(intent.language) == province)
                    .unwrap_or(false);
                let city_rank = if same_city { 0 } else { 1 };
                let province_rank = if same_province { 0 } else { 1 };
                (city_rank, province_rank, scored)
            })
            .collect();

        ranked.sort_by(|a, b| {
            a.0.cmp(&b.0)
                .then(a.1.cmp(&b.1))
                .then(b.2.primary_score.partial_cmp(&a.2.primary_score).unwrap_or(Ordering::Equal))
        });

        Ok(ranked.into_iter().map(|(_, _, scored)| scored).collect())
    }

    async fn paginate_and_cache(&self, cache_key: &str, params: &SearchParams, ranked: Vec<Scored>) -> Result<ResultPage> {
        let offset = (params.page.saturating_sub(1) as usize) * params.limit as usize;
        let listings: Vec<Listing> = ranked
            .into_iter()
            .skip(offset)
            .take(params.limit as usize)
            .map(|s| s.listing)
            .collect();

        let page = ResultPage {
            listings,
            page: params.page,
            limit: params.limit,
            cached: false,
        };

        if !page.is_empty() {
            self.result_cache.put(cache_key.to_string(), page.clone());
        }

        Ok(page)
    }

    /// Hash of the effective search parameters (spec §4.9 step 1). Filters
    /// are sorted by key before hashing since `HashMap` iteration order is
    /// not guaranteed stable.
    fn cache_key(params: &SearchParams) -> String {
        let normalized_query = normalize(&params.query);

        let mut filters: Vec<(String, String)> =
            params.filters.iter().map(|(k, v)| (k.clone(), format!("{v:?}"))).collect();
        filters.sort();
        let filters_str = filters.iter().map(|(k, v)| format!("{k}={v}")).collect::<Vec<_>>().join("&");

        let raw = format!(
            "{}|{}|{}|{}|{}",
            normalized_query.as_str(),
            params.language.as_str(),
            params.page,
            params.limit,
            filters_str,
        );

        format!("search:{:x}", md5::compute(raw.as_bytes()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use souq_core::AttributeValue;
    use std::collections::HashMap;

    fn listing(id: i64, is_boosted: bool, priority: i32) -> Listing {
        Listing {
            id,
            title: format!("listing {id}"),
            description: String::new(),
            category_id: 1,
            city_id: 1,
            neighborhood_id: None,
            transaction_type_id: 1,
            is_boosted,
            priority,
            created_at: Utc::now(),
            attributes: HashMap::new(),
        }
    }

    fn params(query: &str, page: u32, filters: FilterExtras) -> SearchParams {
        SearchParams {
            query: query.to_string(),
            language: Language::En,
            page,
            limit: 20,
            filters,
            user_id: None,
        }
    }

    #[test]
    fn score_adds_boost_and_priority_bonus() {
        let boosted = listing(1, true, 10);
        let plain = listing(2, false, 10);
        assert!((score(&boosted, 0.5) - (0.5 + 0.2 + 0.1)).abs() < 1e-6);
        assert!((score(&plain, 0.5) - (0.5 + 0.1)).abs() < 1e-6);
    }

    #[test]
    fn merge_hybrid_ranks_vector_first_then_novel_lexical() {
        let vector_hits = vec![(listing(1, false, 0), 0.9)];
        let lexical_hits = vec![(listing(1, false, 0), 0.4), (listing(2, false, 0), 0.3)];
        let merged = merge_hybrid(vector_hits, lexical_hits);
        let ids: Vec<i64> = merged.iter().map(|s| s.listing.id).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn cache_key_is_stable_regardless_of_filter_insertion_order() {
        let mut a = FilterExtras::new();
        a.insert("condition".to_string(), AttributeValue::Enum { value: "new".into() });
        a.insert("rooms".to_string(), AttributeValue::Number { value: 3.0 });

        let mut b = FilterExtras::new();
        b.insert("rooms".to_string(), AttributeValue::Number { value: 3.0 });
        b.insert("condition".to_string(), AttributeValue::Enum { value: "new".into() });

        let key_a = RetrievalOrchestrator::cache_key(&params("apartment", 1, a));
        let key_b = RetrievalOrchestrator::cache_key(&params("apartment", 1, b));
        assert_eq!(key_a, key_b);
    }

    #[test]
    fn cache_key_differs_by_page() {
        let key_1 = RetrievalOrchestrator::cache_key(&params("apartment", 1, FilterExtras::new()));
        let key_2 = RetrievalOrchestrator::cache_key(&params("apartment", 2, FilterExtras::new()));
        assert_ne!(key_1, key_2);
    }
}
