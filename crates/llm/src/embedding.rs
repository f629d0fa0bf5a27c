//! HTTP embedding collaborator (spec §4.8, §6): embeds utterances and
//! listing text into the fixed-dimensional vector space the store's
//! `embedding_ar`/`embedding_en` columns are provisioned with.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use souq_config::EmbeddingConfig;
use souq_core::{check_embedding_dimension, EmbeddingClient, Error, Language, Result};

#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

/// Ollama-compatible `/api/embeddings` client. One endpoint and model
/// serve both languages; language only chooses which store column the
/// caller later compares the vector against.
pub struct HttpEmbeddingClient {
    client: Client,
    config: EmbeddingConfig,
}

impl HttpEmbeddingClient {
    pub fn new(config: EmbeddingConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }
}

#[async_trait]
impl EmbeddingClient for HttpEmbeddingClient {
    fn dimension(&self) -> usize {
        self.config.dimension
    }

    async fn embed(&self, text: &str, _language: Language) -> Result<Vec<f32>> {
        let request = EmbedRequest { model: &self.config.model, input: text };

        let response = self
            .client
            .post(&self.config.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::EmbeddingUnavailable(format!("request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::EmbeddingUnavailable(format!("provider returned {status}: {body}")));
        }

        let parsed: EmbedResponse = response
            .json()
            .await
            .map_err(|e| Error::EmbeddingUnavailable(format!("invalid response: {e}")))?;

        let vector = parsed
            .embeddings
            .into_iter()
            .next()
            .ok_or_else(|| Error::EmbeddingUnavailable("provider returned no embedding".to_string()))?;

        check_embedding_dimension(self.config.dimension, vector.len())?;
        Ok(vector)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dimension_reflects_configured_value() {
        let client = HttpEmbeddingClient::new(EmbeddingConfig { dimension: 768, ..EmbeddingConfig::default() });
        assert_eq!(client.dimension(), 768);
    }
}
