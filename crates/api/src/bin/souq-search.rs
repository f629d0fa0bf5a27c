//! Minimal CLI front end over `SearchEngine`. Not a transport — just
//! enough to drive `parse`/`search`/`health_check` from a shell, the
//! way `voice-agent-server`'s `main.rs` drives its `AppState` before
//! handing it to a router this crate deliberately doesn't build.

use std::collections::HashMap;

use souq_api::{init_tracing, SearchEngine};
use souq_config::load_settings;
use souq_core::Language;
use souq_retrieval::SearchParams;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let env = std::env::var("SOUQ_SEARCH_ENV").ok();
    let settings = load_settings(env.as_deref()).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "failed to load configuration, using defaults");
        souq_config::Settings::default()
    });

    let mut args = std::env::args().skip(1);
    let query = args.next().unwrap_or_else(|| {
        eprintln!("usage: souq-search <utterance> [ar|en]");
        std::process::exit(1);
    });
    let language = args
        .next()
        .and_then(|tag| Language::parse(&tag))
        .unwrap_or(Language::Ar);

    tracing::info!("bootstrapping search engine");
    let engine = SearchEngine::bootstrap(settings).await?;

    let health = engine.health_check().await;
    tracing::info!(status = ?health.status, "health check complete");

    let intent = engine.parse(&query, language).await?;
    println!("{}", serde_json::to_string_pretty(&intent)?);

    let page = engine
        .search(SearchParams {
            query,
            language,
            page: 1,
            limit: 20,
            filters: HashMap::new(),
            user_id: None,
        })
        .await?;
    println!("{}", serde_json::to_string_pretty(&page)?);

    Ok(())
}
