//! Vector/lexical retrievers and the retrieval orchestrator (spec §4.8,
//! §4.9): turns a parsed `Intent` into a ranked, paginated `ResultPage`.

pub mod lexical_retriever;
pub mod orchestrator;
pub mod vector_retriever;

pub use lexical_retriever::LexicalRetriever;
pub use orchestrator::{RetrievalOrchestrator, SearchParams};
pub use vector_retriever::VectorRetriever;
