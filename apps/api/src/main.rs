mod analysis;
mod config;
mod db;
mod errors;
mod extract;
mod models;
mod routes;
mod state;
mod store;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::analysis::cache::AnalysisCache;
use crate::analysis::client::LlmAnalyzer;
use crate::analysis::llm::LlmClient;
use crate::analysis::orchestrator::{Orchestrator, OrchestratorSettings};
use crate::analysis::reclaimer;
use crate::analysis::worker::AnalysisContext;
use crate::config::Config;
use crate::db::create_pool;
use crate::routes::build_router;
use crate::state::AppState;
use crate::store::{CandidateStore, PgCandidateStore};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting resume analysis API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL
    let db = create_pool(&config.database_url, config.max_workers).await?;
    let store: Arc<dyn CandidateStore> = Arc::new(PgCandidateStore::new(db));

    // Initialize the on-disk analysis cache
    let cache = Arc::new(AnalysisCache::new(&config.cache_dir)?);
    info!(dir = %config.cache_dir, "analysis cache initialized");

    // Initialize LLM client and analyzer
    let llm = LlmClient::new(
        config.llm_api_key.clone(),
        config.llm_base_url.clone(),
        config.llm_model.clone(),
    );
    info!("LLM client initialized (model: {})", llm.model());
    let analyzer = Arc::new(LlmAnalyzer::new(llm));

    // Build the batch orchestrator
    let ctx = AnalysisContext {
        store: store.clone(),
        cache: cache.clone(),
        analyzer,
    };
    let orchestrator = Arc::new(Orchestrator::new(
        ctx,
        OrchestratorSettings {
            max_workers: config.max_workers,
            batch_size: config.batch_size,
            batch_pause: Duration::from_secs(config.batch_pause_secs),
            candidate_timeout: Duration::from_secs(config.candidate_timeout_secs),
        },
    ));

    // Background stale-work reclaim loop
    tokio::spawn(reclaimer::run_periodic(
        store.clone(),
        Duration::from_secs(config.stale_after_secs),
        Duration::from_secs(config.reclaim_interval_secs),
    ));

    // Build app state
    let state = AppState {
        store,
        cache,
        orchestrator,
        config: config.clone(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: tighten CORS in production

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
