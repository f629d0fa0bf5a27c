//! Wires parsing, retrieval, and the ambient stack into the three
//! language-neutral entry points spec §6 names: `parse`, `search`,
//! `healthCheck`. Deliberately carries no HTTP/WS transport — that
//! framing is an explicit Non-goal; a binary embedding this crate owns
//! whatever transport it needs.

pub mod engine;
pub mod health;
pub mod tracing_init;

pub use engine::SearchEngine;
pub use health::{ComponentHealth, ComponentStatus, HealthStatus};
pub use tracing_init::init_tracing;
