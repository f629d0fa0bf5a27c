mod embedding;
mod llm;
mod repository;

pub use embedding::EmbeddingClient;
pub use llm::{IntentHintClient, LlmCompletion, LlmHints};
pub use repository::{
    check_embedding_dimension, CategoryRepository, ListingPredicate, ListingRepository,
    LocationRepository, SemanticCacheRepository, TransactionTypeRepository,
};
