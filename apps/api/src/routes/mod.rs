pub mod analysis;
pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Analysis API
        .route("/api/v1/analysis/start", post(analysis::start_analysis))
        .route("/api/v1/analysis/status", post(analysis::analysis_status))
        .route(
            "/api/v1/analysis/reprocess",
            post(analysis::reprocess_candidates),
        )
        .route("/api/v1/analysis/reclaim", post(analysis::reclaim_now))
        .route("/api/v1/cache/stats", get(analysis::cache_stats))
        .with_state(state)
}
