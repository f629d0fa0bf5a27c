//! Typed configuration surface (spec §6 "Configuration").

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// `HotCache` refresh policy (spec §4.1, §6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HotCacheConfig {
    #[serde(default = "default_hot_cache_ttl_ms")]
    pub ttl_ms: u64,
    #[serde(default = "default_hot_cache_top_n")]
    pub top_n_categories: usize,
}

fn default_hot_cache_ttl_ms() -> u64 {
    300_000
}
fn default_hot_cache_top_n() -> usize {
    500
}

impl Default for HotCacheConfig {
    fn default() -> Self {
        Self {
            ttl_ms: default_hot_cache_ttl_ms(),
            top_n_categories: default_hot_cache_top_n(),
        }
    }
}

/// Tier thresholds and cache TTLs for `TieredParser` (spec §4.6, §6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParserConfig {
    #[serde(default = "default_tier1_threshold")]
    pub tier1_confidence_threshold: f32,
    #[serde(default = "default_semantic_threshold")]
    pub semantic_cache_similarity_threshold: f32,
    #[serde(default = "default_exact_cache_ttl_s")]
    pub exact_cache_ttl_s: u64,
    #[serde(default = "default_tier3_budget_ms")]
    pub tier3_budget_ms: u64,
    #[serde(default = "default_tier4_budget_ms")]
    pub tier4_budget_ms: u64,
}

fn default_tier1_threshold() -> f32 {
    0.80
}
fn default_semantic_threshold() -> f32 {
    0.92
}
fn default_exact_cache_ttl_s() -> u64 {
    3600
}
fn default_tier3_budget_ms() -> u64 {
    500
}
fn default_tier4_budget_ms() -> u64 {
    1500
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            tier1_confidence_threshold: default_tier1_threshold(),
            semantic_cache_similarity_threshold: default_semantic_threshold(),
            exact_cache_ttl_s: default_exact_cache_ttl_s(),
            tier3_budget_ms: default_tier3_budget_ms(),
            tier4_budget_ms: default_tier4_budget_ms(),
        }
    }
}

/// Confidence gate and method-selection thresholds for
/// `RetrievalOrchestrator` (spec §4.9, §6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    #[serde(default = "default_gate_low")]
    pub category_confidence_gate_low: f32,
    #[serde(default = "default_gate_high")]
    pub category_confidence_gate_high: f32,
    #[serde(default = "default_vector_min_confidence")]
    pub vector_method_min_confidence: f32,
    #[serde(default = "default_max_parent_fallback_depth")]
    pub max_parent_fallback_depth: u32,
    #[serde(default = "default_page_limit")]
    pub default_page_limit: u32,
}

fn default_gate_low() -> f32 {
    0.70
}
fn default_gate_high() -> f32 {
    0.85
}
fn default_vector_min_confidence() -> f32 {
    0.7
}
fn default_max_parent_fallback_depth() -> u32 {
    5
}
fn default_page_limit() -> u32 {
    20
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            category_confidence_gate_low: default_gate_low(),
            category_confidence_gate_high: default_gate_high(),
            vector_method_min_confidence: default_vector_min_confidence(),
            max_parent_fallback_depth: default_max_parent_fallback_depth(),
            default_page_limit: default_page_limit(),
        }
    }
}

/// Relational store connection settings (spec §5 "Store connection pool",
/// §6 "Store requirements").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_database_url")]
    pub database_url: String,
    #[serde(default = "default_pool_min")]
    pub pool_min: u32,
    #[serde(default = "default_pool_max")]
    pub pool_max: u32,
}

fn default_database_url() -> String {
    "postgres://localhost/souq_search".to_string()
}
fn default_pool_min() -> u32 {
    5
}
fn default_pool_max() -> u32 {
    20
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database_url: default_database_url(),
            pool_min: default_pool_min(),
            pool_max: default_pool_max(),
        }
    }
}

/// Embedding collaborator settings (spec §4.9, §6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    #[serde(default = "default_embedding_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_embedding_model")]
    pub model: String,
    #[serde(default = "default_embedding_dimension")]
    pub dimension: usize,
}

fn default_embedding_endpoint() -> String {
    "http://localhost:11434/api/embeddings".to_string()
}
fn default_embedding_model() -> String {
    "qwen3-embedding:0.6b".to_string()
}
fn default_embedding_dimension() -> usize {
    1536
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            endpoint: default_embedding_endpoint(),
            model: default_embedding_model(),
            dimension: default_embedding_dimension(),
        }
    }
}

/// LLM collaborator settings (spec §4.9, §6): Tier 3/4 prompts and the
/// category validator share one backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_llm_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_llm_model")]
    pub model: String,
    #[serde(default = "default_llm_max_retries")]
    pub max_retries: u32,
}

fn default_llm_endpoint() -> String {
    "http://localhost:11434".to_string()
}
fn default_llm_model() -> String {
    "qwen2.5:7b-instruct-q4_K_M".to_string()
}
fn default_llm_max_retries() -> u32 {
    2
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            endpoint: default_llm_endpoint(),
            model: default_llm_model(),
            max_retries: default_llm_max_retries(),
        }
    }
}

/// Top-level settings tree, loaded compiled-defaults → file → env
/// (`SOUQ_SEARCH_` prefix), the same layering `config::Config` applies in
/// the teacher pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub hot_cache: HotCacheConfig,
    #[serde(default)]
    pub parser: ParserConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub llm: LlmConfig,
}

const ENV_PREFIX: &str = "SOUQ_SEARCH";

/// Loads `Settings` from compiled-in defaults, optionally overlaid by a
/// config file at `path`, then overlaid by `SOUQ_SEARCH_*` environment
/// variables (e.g. `SOUQ_SEARCH_STORE__POOL_MAX=40`).
pub fn load_settings(path: Option<&str>) -> Result<Settings, ConfigError> {
    let mut builder = config::Config::builder()
        .add_source(config::Config::try_from(&Settings::default())?);

    if let Some(path) = path {
        builder = builder.add_source(config::File::with_name(path).required(false));
    }

    builder = builder.add_source(
        config::Environment::with_prefix(ENV_PREFIX)
            .separator("__")
            .try_parsing(true),
    );

    let settings = builder.build()?;
    settings.try_deserialize().map_err(ConfigError::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec_values() {
        let settings = Settings::default();
        assert_eq!(settings.hot_cache.ttl_ms, 300_000);
        assert_eq!(settings.parser.tier1_confidence_threshold, 0.80);
        assert_eq!(settings.retrieval.category_confidence_gate_low, 0.70);
        assert_eq!(settings.retrieval.category_confidence_gate_high, 0.85);
        assert_eq!(settings.store.pool_min, 5);
        assert_eq!(settings.store.pool_max, 20);
        assert_eq!(settings.embedding.dimension, 1536);
    }

    #[test]
    fn loads_with_no_file_present() {
        let settings = load_settings(Some("/nonexistent/path")).expect("defaults still load");
        assert_eq!(settings.parser.semantic_cache_similarity_threshold, 0.92);
    }
}
