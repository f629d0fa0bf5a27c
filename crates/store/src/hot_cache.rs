//! Process-local, TTL-refreshed snapshot of the top-N categories, all
//! active cities, and the transaction-type closed set (spec §4.2).
//!
//! Readers see either the previous snapshot or the new one in full,
//! never a torn mix: the whole collection is rebuilt off to the side and
//! published with a single atomic pointer swap, the same pattern the
//! teacher's `ScyllaClient` uses for its schema-version snapshot.

use std::cmp::Reverse;
use std::sync::Arc;
use std::time::{Duration, Instant};

use arc_swap::ArcSwap;
use souq_core::{CategoryRepository, CategoryWithKeywords, City, LocationRepository, TransactionType, TransactionTypeRepository};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::error::Result;

#[derive(Debug, Clone)]
pub struct HotCacheSnapshot {
    pub top_categories: Vec<CategoryWithKeywords>,
    pub cities: Vec<City>,
    pub transaction_types: Vec<TransactionType>,
    pub loaded_at: Instant,
}

impl HotCacheSnapshot {
    fn empty() -> Self {
        Self {
            top_categories: Vec::new(),
            cities: Vec::new(),
            transaction_types: Vec::new(),
            loaded_at: Instant::now() - Duration::from_secs(u64::MAX / 2),
        }
    }
}

/// `{Empty -> Loaded -> Stale -> Loaded}` state machine (spec §4.10). A
/// failed refresh preserves the prior `Loaded` state rather than
/// transitioning anywhere.
pub struct HotCache {
    snapshot: ArcSwap<HotCacheSnapshot>,
    ttl: Duration,
    top_n: usize,
    refresh_lock: Mutex<()>,
    category_repo: Arc<dyn CategoryRepository>,
    location_repo: Arc<dyn LocationRepository>,
    transaction_repo: Arc<dyn TransactionTypeRepository>,
}

impl HotCache {
    pub fn new(
        ttl: Duration,
        top_n: usize,
        category_repo: Arc<dyn CategoryRepository>,
        location_repo: Arc<dyn LocationRepository>,
        transaction_repo: Arc<dyn TransactionTypeRepository>,
    ) -> Self {
        Self {
            snapshot: ArcSwap::from_pointee(HotCacheSnapshot::empty()),
            ttl,
            top_n,
            refresh_lock: Mutex::new(()),
            category_repo,
            location_repo,
            transaction_repo,
        }
    }

    /// Repopulates all three collections atomically. Call once at
    /// startup; `refresh_if_stale` handles subsequent rebuilds.
    pub async fn initialize(&self) -> Result<()> {
        self.rebuild().await
    }

    /// Rebuilds the snapshot if the TTL has expired since the last
    /// successful rebuild. Single-flights concurrent callers: a caller
    /// that cannot acquire the refresh lock simply uses the current
    /// snapshot (double-fetch is acceptable but wasteful, per spec §4.2).
    pub async fn refresh_if_stale(&self) {
        if self.snapshot.load().loaded_at.elapsed() < self.ttl {
            return;
        }

        let Ok(_guard) = self.refresh_lock.try_lock() else {
            debug!("hot cache refresh already in flight, skipping");
            return;
        };

        if self.snapshot.load().loaded_at.elapsed() < self.ttl {
            return;
        }

        if let Err(err) = self.rebuild().await {
            warn!(error = %err, "hot cache refresh failed, keeping prior snapshot");
        }
    }

    async fn rebuild(&self) -> Result<()> {
        let mut categories = self.category_repo.load_all_with_keywords().await?;
        categories.sort_by_key(|c| (Reverse(c.category.level), c.category.sort_order));
        categories.truncate(self.top_n);

        let cities = self
            .location_repo
            .load_all_cities()
            .await?
            .into_iter()
            .filter(|c| c.active)
            .collect();

        let transaction_types = self.transaction_repo.load_all().await?;

        self.snapshot.store(Arc::new(HotCacheSnapshot {
            top_categories: categories,
            cities,
            transaction_types,
            loaded_at: Instant::now(),
        }));

        Ok(())
    }

    pub fn snapshot(&self) -> Arc<HotCacheSnapshot> {
        self.snapshot.load_full()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use souq_core::{Category, Neighborhood, Result as CoreResult, TransactionTypeSlug};

    struct EmptyCategoryRepo;
    #[async_trait]
    impl CategoryRepository for EmptyCategoryRepo {
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
        async fn keyword_array_match(
            &self,
            _tokens: &[String],
            _language: souq_core::Language,
        ) -> CoreResult<Vec<(Category, usize)>> {
            Ok(vec![])
        }
        async fn meta_keyword_ilike(&self, _token: &str, _language: souq_core::Language) -> CoreResult<Vec<Category>> {
            Ok(vec![])
        }
        async fn fulltext_search(&self, _query: &str, _language: souq_core::Language) -> CoreResult<Vec<(Category, f32)>> {
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
    impl LocationRepository for EmptyLocationRepo {
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
            Ok(vec![TransactionType {
                id: 1,
                slug: TransactionTypeSlug::ForSale,
                name_ar: "\u{0644}\u{0644}\u{0628}\u{064A}\u{0639}".into(),
                name_en: "For sale".into(),
            }])
        }
    }

    #[tokio::test]
    async fn initialize_populates_snapshot() {
        let cache = HotCache::new(
            Duration::from_secs(300),
            500,
            Arc::new(EmptyCategoryRepo),
            Arc::new(EmptyLocationRepo),
            Arc::new(EmptyTxRepo),
        );
        cache.initialize().await.unwrap();
        let snap = cache.snapshot();
        assert_eq!(snap.transaction_types.len(), 1);
    }

    #[tokio::test]
    async fn fresh_snapshot_is_not_refreshed() {
        let cache = HotCache::new(
            Duration::from_secs(300),
            500,
            Arc::new(EmptyCategoryRepo),
            Arc::new(EmptyLocationRepo),
            Arc::new(EmptyTxRepo),
        );
        cache.initialize().await.unwrap();
        let before = cache.snapshot().loaded_at;
        cache.refresh_if_stale().await;
        assert_eq!(cache.snapshot().loaded_at, before);
    }
}
