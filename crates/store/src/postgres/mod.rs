pub mod category;
pub mod client;
pub mod listing;
pub mod location;
pub mod semantic_cache;
pub mod transaction;

pub use category::PgCategoryRepository;
pub use client::PgStore;
pub use listing::PgListingRepository;
pub use location::PgLocationRepository;
pub use semantic_cache::PgSemanticCacheRepository;
pub use transaction::PgTransactionTypeRepository;
