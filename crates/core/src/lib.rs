//! Core domain types and traits for the classifieds search engine.
//!
//! This crate provides foundational types used across all other crates:
//! - Query understanding types (`Utterance`, `Intent`, `AttributeValue`)
//! - Reference-data types (`Category`, `Location`, `TransactionType`)
//! - `Listing` and semantic-cache record types
//! - Pluggable-backend traits (repositories, embedding client, LLM hints)
//! - Error types

pub mod attribute;
pub mod category;
pub mod error;
pub mod intent;
pub mod language;
pub mod listing;
pub mod location;
pub mod result_page;
pub mod text;
pub mod traits;
pub mod transaction;

pub use attribute::AttributeValue;
pub use category::{Category, CategoryKeywords, CategoryMatch, CategoryWithKeywords};
pub use error::{Error, Result};
pub use intent::{ConfidenceWeights, Intent, LlmMetadata, ParseMethod, Tier};
pub use language::Language;
pub use listing::{Listing, ListingEmbedding, ParsedResultRecord};
pub use location::{City, Location, LocationKind, LocationMatch, Neighborhood};
pub use result_page::ResultPage;
pub use text::{NormalizedText, Tokens, Utterance};
pub use transaction::{TransactionMatch, TransactionType, TransactionTypeSlug};

pub use traits::{
    check_embedding_dimension, CategoryRepository, EmbeddingClient, IntentHintClient,
    LlmCompletion, LlmHints, ListingPredicate, ListingRepository, LocationRepository,
    SemanticCacheRepository, TransactionTypeRepository,
};
