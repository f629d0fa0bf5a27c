//! LLM collaborator: Tier 3/4 hint extraction and the category-validator
//! call (spec §4.6, §4.9, §6). Treated as a black box that returns JSON
//! when given a prompt; its output is only ever a hint re-resolved
//! against the catalog.

pub mod backend;
pub mod embedding;
pub mod error;
pub mod prompt;

pub use backend::JsonCompletionBackend;
pub use embedding::HttpEmbeddingClient;
pub use error::{LlmError, Result};
