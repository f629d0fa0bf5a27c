//! In-process caches shared by the parser and retrieval orchestrator:
//! the Tier 0 exact-match cache, the result-page cache, and tier
//! counters (spec §4.6, §4.9, §5).

pub mod exact_cache;
pub mod result_cache;
pub mod stats;

pub use exact_cache::ExactCache;
pub use result_cache::ResultCache;
pub use stats::{ParserStats, ParserStatsSnapshot};
