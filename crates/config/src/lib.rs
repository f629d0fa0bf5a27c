//! Layered configuration for the classifieds search engine.
//!
//! Supports loading configuration from:
//! - TOML/YAML files
//! - Environment variables (`SOUQ_SEARCH_` prefix)
//! - Compiled-in defaults matching spec §6

pub mod settings;

pub use settings::{
    load_settings, EmbeddingConfig, HotCacheConfig, LlmConfig, ParserConfig, RetrievalConfig,
    Settings, StoreConfig,
};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("configuration file not found: {0}")]
    FileNotFound(String),

    #[error("failed to parse configuration: {0}")]
    ParseError(String),

    #[error("missing required field: {0}")]
    MissingField(String),

    #[error("invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}

impl From<ConfigError> for souq_core::Error {
    fn from(err: ConfigError) -> Self {
        souq_core::Error::Config(err.to_string())
    }
}
