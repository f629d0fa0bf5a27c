//! Top-level error type for the classifieds search engine.
//!
//! Each crate defines its own scoped error enum and converts into this one
//! at the crate boundary, the same shape as `voice_agent_core::Error` in the
//! teacher pipeline.

use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Error taxonomy per spec §7.
#[derive(Error, Debug)]
pub enum Error {
    /// Empty/too-short/too-long utterance, or an unknown language tag.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The relational store is unreachable or a statement failed.
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    /// The LLM provider errored or exceeded its per-call budget.
    #[error("llm unavailable: {0}")]
    LlmUnavailable(String),

    /// The embedding provider errored or exceeded its per-call budget.
    #[error("embedding unavailable: {0}")]
    EmbeddingUnavailable(String),

    /// The parser could not resolve a category or any keywords.
    #[error("could not understand query")]
    ParseUnresolved,

    /// The request deadline elapsed somewhere in the pipeline.
    #[error("deadline exceeded")]
    DeadlineExceeded,

    /// Same as `DeadlineExceeded` but no partial intent was available to
    /// fall back to.
    #[error("timeout")]
    Timeout,

    /// A broken invariant; always fatal to the request.
    #[error("internal invariant violated: {0}")]
    InternalInvariantViolation(String),

    /// Text-processing failure (normalizer/tokenizer), see `souq-text`.
    #[error("text processing error: {0}")]
    Text(String),

    /// Configuration failure, see `souq-config`.
    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    /// True for errors a matcher should degrade from rather than propagate.
    pub fn is_degradable_store_error(&self) -> bool {
        matches!(self, Error::StoreUnavailable(_))
    }
}
