//! Tracing initialization, matching `voice-agent-server`'s `main.rs`:
//! `RUST_LOG`-driven `EnvFilter`, JSON logs in release, pretty spans in
//! debug builds.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

/// Call once at process startup before constructing a `SearchEngine`.
pub fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "souq=info".into());

    let fmt_layer = if cfg!(debug_assertions) {
        tracing_subscriber::fmt::layer().boxed()
    } else {
        tracing_subscriber::fmt::layer().json().boxed()
    };

    tracing_subscriber::registry().with(env_filter).with(fmt_layer).init();
}
