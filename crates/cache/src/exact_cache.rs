//! Exact-match cache: Tier 0 of the parser (spec §4.6 step 2-3, §3
//! "Lifecycle", §5 "unordered concurrent writes, last-writer-wins").

use std::time::{Duration, Instant};

use dashmap::DashMap;
use souq_core::Intent;

struct Entry {
    intent: Intent,
    expires_at: Instant,
}

/// `md5(normalized)`-keyed cache of parsed intents, TTL default 1h.
/// Concurrent writes are unordered; last writer wins, matching the
/// store's own semantic-cache upsert semantics.
pub struct ExactCache {
    entries: DashMap<String, Entry>,
    ttl: Duration,
}

impl ExactCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    /// `exactKey = "parsed:" || md5(normalized)` (spec §4.6 step 2).
    pub fn key(normalized: &str) -> String {
        format!("parsed:{:x}", md5::compute(normalized.as_bytes()))
    }

    pub fn get(&self, normalized: &str) -> Option<Intent> {
        let key = Self::key(normalized);
        let entry = self.entries.get(&key)?;
        if entry.expires_at < Instant::now() {
            drop(entry);
            self.entries.remove(&key);
            return None;
        }
        Some(entry.intent.clone())
    }

    pub fn put(&self, normalized: &str, intent: Intent) {
        let key = Self::key(normalized);
        self.entries.insert(
            key,
            Entry {
                intent,
                expires_at: Instant::now() + self.ttl,
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use souq_core::{Language, ParseMethod, Tier, Tokens};
    use std::collections::HashMap;

    fn intent() -> Intent {
        Intent {
            original: "cars".into(),
            normalized: "cars".into(),
            language: Language::En,
            category: None,
            location: None,
            transaction_type: None,
            attributes: HashMap::new(),
            keywords: Tokens::default(),
            confidence: 0.5,
            tier: Tier::DbOnly,
            method: ParseMethod::DbMatch,
            llm: None,
        }
    }

    #[test]
    fn miss_then_hit() {
        let cache = ExactCache::new(Duration::from_secs(60));
        assert!(cache.get("cars").is_none());
        cache.put("cars", intent());
        assert!(cache.get("cars").is_some());
    }

    #[test]
    fn expired_entry_is_a_miss() {
        let cache = ExactCache::new(Duration::from_millis(0));
        cache.put("cars", intent());
        std::thread::sleep(Duration::from_millis(5));
        assert!(cache.get("cars").is_none());
    }

    #[test]
    fn key_is_stable_for_same_input() {
        assert_eq!(ExactCache::key("cars"), ExactCache::key("cars"));
        assert_ne!(ExactCache::key("cars"), ExactCache::key("trucks"));
    }
}
