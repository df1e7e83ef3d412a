//! HTTP boundary for the analysis subsystem: batch trigger, status polling,
//! reprocess, manual reclaim, and cache introspection.

use std::time::Duration;

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;

use crate::analysis::cache::CacheStats;
use crate::analysis::reclaimer::reclaim_stale;
use crate::errors::AppError;
use crate::models::candidate::StatusCounts;
use crate::state::AppState;

const MAX_BATCH_IDS: usize = 500;

#[derive(Debug, Deserialize)]
pub struct CandidateIdsRequest {
    pub candidate_ids: Vec<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct StartResponse {
    pub submitted: usize,
    pub message: &'static str,
}

fn check_batch_bound(ids: &[Uuid]) -> Result<(), AppError> {
    if ids.len() > MAX_BATCH_IDS {
        return Err(AppError::Validation(format!(
            "candidate_ids must not exceed {MAX_BATCH_IDS} entries"
        )));
    }
    Ok(())
}

fn validate_ids(ids: &[Uuid]) -> Result<(), AppError> {
    if ids.is_empty() {
        return Err(AppError::Validation(
            "candidate_ids must not be empty".to_string(),
        ));
    }
    check_batch_bound(ids)
}

/// POST /api/v1/analysis/start
/// Kicks off background analysis for the given candidates and returns
/// immediately with 202. Progress is observed via the status endpoint.
/// An empty list is accepted as a no-op, not an error.
pub async fn start_analysis(
    State(state): State<AppState>,
    Json(req): Json<CandidateIdsRequest>,
) -> Result<(StatusCode, Json<StartResponse>), AppError> {
    check_batch_bound(&req.candidate_ids)?;

    let submitted = req.candidate_ids.len();
    info!(submitted, "analysis batch submitted");
    state.orchestrator.start(req.candidate_ids);

    Ok((
        StatusCode::ACCEPTED,
        Json(StartResponse {
            submitted,
            message: "analysis started",
        }),
    ))
}

/// POST /api/v1/analysis/status
/// Per-status counts for a set of candidates. A POST so the id list rides in
/// the body rather than an unwieldy query string.
pub async fn analysis_status(
    State(state): State<AppState>,
    Json(req): Json<CandidateIdsRequest>,
) -> Result<Json<StatusCounts>, AppError> {
    validate_ids(&req.candidate_ids)?;
    let counts = state.store.status_counts(&req.candidate_ids).await?;
    Ok(Json(counts))
}

/// POST /api/v1/analysis/reprocess
/// Resets candidates to `pending` (clearing prior output) and resubmits them.
pub async fn reprocess_candidates(
    State(state): State<AppState>,
    Json(req): Json<CandidateIdsRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    validate_ids(&req.candidate_ids)?;

    let reset = state.store.reset_to_pending(&req.candidate_ids).await?;
    if reset == 0 {
        return Err(AppError::NotFound(
            "none of the given candidates exist".to_string(),
        ));
    }

    info!(reset, "candidates reset for reprocessing");
    state.orchestrator.start(req.candidate_ids);

    Ok((
        StatusCode::ACCEPTED,
        Json(json!({ "reset": reset, "message": "reprocessing started" })),
    ))
}

/// POST /api/v1/analysis/reclaim
/// Manual trigger for one stale-work reclaim pass, alongside the background
/// loop. Useful after a deploy that interrupted in-flight work.
pub async fn reclaim_now(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    let older_than = Duration::from_secs(state.config.stale_after_secs);
    let reclaimed = reclaim_stale(state.store.as_ref(), older_than).await?;
    Ok(Json(json!({ "reclaimed": reclaimed })))
}

/// GET /api/v1/cache/stats
pub async fn cache_stats(State(state): State<AppState>) -> Json<CacheStats> {
    Json(state.cache.stats())
}
