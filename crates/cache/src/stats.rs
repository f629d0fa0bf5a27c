//! Parser tier counters (spec §5 "Shared resources" / "Stats counters
//! incremented under relaxed atomicity, never read for correctness").

use std::sync::atomic::{AtomicU64, Ordering};

use souq_core::Tier;

#[derive(Debug, Default)]
pub struct ParserStats {
    tier0: AtomicU64,
    tier1: AtomicU64,
    tier2: AtomicU64,
    tier3: AtomicU64,
    tier4: AtomicU64,
    fallback: AtomicU64,
}

#[derive(Debug, Clone, Copy, Default, serde::Serialize)]
pub struct ParserStatsSnapshot {
    pub tier0: u64,
    pub tier1: u64,
    pub tier2: u64,
    pub tier3: u64,
    pub tier4: u64,
    pub fallback: u64,
    pub total: u64,
}

impl ParserStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, tier: Tier) {
        let counter = match tier {
            Tier::Exact => &self.tier0,
            Tier::DbOnly => &self.tier1,
            Tier::Semantic => &self.tier2,
            Tier::LlmShort => &self.tier3,
            Tier::LlmRich => &self.tier4,
            Tier::Fallback => &self.fallback,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> ParserStatsSnapshot {
        let tier0 = self.tier0.load(Ordering::Relaxed);
        let tier1 = self.tier1.load(Ordering::Relaxed);
        let tier2 = self.tier2.load(Ordering::Relaxed);
        let tier3 = self.tier3.load(Ordering::Relaxed);
        let tier4 = self.tier4.load(Ordering::Relaxed);
        let fallback = self.fallback.load(Ordering::Relaxed);
        ParserStatsSnapshot {
            tier0,
            tier1,
            tier2,
            tier3,
            tier4,
            fallback,
            total: tier0 + tier1 + tier2 + tier3 + tier4 + fallback,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_increment_the_matching_tier_only() {
        let stats = ParserStats::new();
        stats.record(Tier::Exact);
        stats.record(Tier::Exact);
        stats.record(Tier::LlmRich);
        let snap = stats.snapshot();
        assert_eq!(snap.tier0, 2);
        assert_eq!(snap.tier4, 1);
        assert_eq!(snap.tier1, 0);
        assert_eq!(snap.total, 3);
    }
}
