//! Embedding collaborator (spec §4.9, §6): `embed(text) -> float[D]`.

use async_trait::async_trait;

use crate::{Language, Result};

#[async_trait]
pub trait EmbeddingClient: Send + Sync {
    /// Fixed output dimension; mismatches against the store's vector
    /// column are a configuration error, not a runtime one.
    fn dimension(&self) -> usize;

    async fn embed(&self, text: &str, language: Language) -> Result<Vec<f32>>;
}
