//! Arabic/English text canonicalization and tokenization (spec §4.1).
//!
//! Pure functions only: no I/O, no suspension points, safe to call from
//! any async or sync context.

pub mod normalizer;
pub mod tokenizer;

pub use normalizer::{normalize, ta_marbuta_equivalent, ta_marbuta_variant};
pub use tokenizer::tokenize;
