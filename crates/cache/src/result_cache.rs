//! Result-page cache: short-TTL memoization of
//! `RetrievalOrchestrator.search` pages keyed on the effective search
//! parameters (spec §4.9 step 1, §6 "cached" flag on `ResultPage`).

use std::time::{Duration, Instant};

use dashmap::DashMap;
use souq_core::ResultPage;

struct Entry {
    page: ResultPage,
    expires_at: Instant,
}

/// Keyed on a caller-supplied digest of the normalized intent plus
/// pagination, since the orchestrator (not this crate) knows how to
/// build that digest from a `ListingPredicate`.
pub struct ResultCache {
    entries: DashMap<String, Entry>,
    ttl: Duration,
}

impl ResultCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    pub fn get(&self, key: &str) -> Option<ResultPage> {
        let entry = self.entries.get(key)?;
        if entry.expires_at < Instant::now() {
            drop(entry);
            self.entries.remove(key);
            return None;
        }
        let mut page = entry.page.clone();
        page.cached = true;
        Some(page)
    }

    pub fn put(&self, key: String, page: ResultPage) {
        self.entries.insert(
            key,
            Entry {
                page,
                expires_at: Instant::now() + self.ttl,
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page() -> ResultPage {
        ResultPage {
            listings: vec![],
            page: 1,
            limit: 20,
            cached: false,
        }
    }

    #[test]
    fn hit_marks_the_page_as_cached() {
        let cache = ResultCache::new(Duration::from_secs(60));
        cache.put("k".into(), page());
        let hit = cache.get("k").unwrap();
        assert!(hit.cached);
    }

    #[test]
    fn expired_entry_is_a_miss() {
        let cache = ResultCache::new(Duration::from_millis(0));
        cache.put("k".into(), page());
        std::thread::sleep(Duration::from_millis(5));
        assert!(cache.get("k").is_none());
    }
}
