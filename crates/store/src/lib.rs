//! Postgres-backed reference-data matching and listing retrieval.
//!
//! Owns everything spec §6 asks of "a relational data store": array
//! predicates, ILIKE, trigram similarity, per-language full-text search,
//! pgvector cosine nearest-neighbor, and recursive category walks — one
//! Postgres instance standing in for the teacher's separate Qdrant +
//! Tantivy stack.

pub mod error;
pub mod filter;
pub mod hot_cache;
pub mod matcher;
pub mod postgres;

pub use error::{Result, StoreError};
pub use filter::{build as build_predicate, FilterBuilderOptions, FilterExtras};
pub use hot_cache::{HotCache, HotCacheSnapshot};
pub use matcher::DbMatcher;
pub use postgres::{
    PgCategoryRepository, PgListingRepository, PgLocationRepository, PgSemanticCacheRepository,
    PgStore, PgTransactionTypeRepository,
};
