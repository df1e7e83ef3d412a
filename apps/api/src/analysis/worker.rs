//! Candidate analysis worker: owns one candidate's full attempt, from the
//! `processing` claim through extraction, cache check, LLM calls, the
//! completeness gate, and the terminal persist.
//!
//! Nothing escapes this boundary. Every failure mode inside an attempt turns
//! into a `failed` row with an operator-readable diagnostic; the orchestrator
//! only ever sees the outcome enum.

use std::sync::Arc;

use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::analysis::cache::AnalysisCache;
use crate::analysis::client::{ResumeAnalyzer, FAILURE_PREFIX};
use crate::analysis::completeness::check_analysis;
use crate::analysis::skills::extract_skills;
use crate::extract::extract_text;
use crate::models::candidate::AnalysisResult;
use crate::store::CandidateStore;

/// Shared dependencies handed to every worker in a batch.
#[derive(Clone)]
pub struct AnalysisContext {
    pub store: Arc<dyn CandidateStore>,
    pub cache: Arc<AnalysisCache>,
    pub analyzer: Arc<dyn ResumeAnalyzer>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerOutcome {
    Completed,
    Failed,
    /// The candidate was not in `pending` when we tried to claim it;
    /// a duplicate submission or a concurrent worker got there first.
    Skipped,
    /// The record vanished (deleted mid-batch). Benign no-op.
    NotFound,
}

/// Runs one analysis attempt for `id`.
pub async fn analyze_candidate(ctx: &AnalysisContext, id: Uuid) -> WorkerOutcome {
    let candidate = match ctx.store.get(id).await {
        Ok(Some(c)) => c,
        Ok(None) => {
            debug!(candidate_id = %id, "candidate not found, skipping");
            return WorkerOutcome::NotFound;
        }
        Err(e) => {
            error!(candidate_id = %id, error = %e, "could not load candidate");
            return WorkerOutcome::Failed;
        }
    };

    match ctx.store.claim_for_processing(id).await {
        Ok(true) => {}
        Ok(false) => {
            debug!(candidate_id = %id, "claim lost, candidate not pending");
            return WorkerOutcome::Skipped;
        }
        Err(e) => {
            error!(candidate_id = %id, error = %e, "could not claim candidate");
            return WorkerOutcome::Failed;
        }
    }

    // Extraction is blocking file + parser work; keep it off the runtime.
    let locator = candidate.resume.clone();
    let extracted = tokio::task::spawn_blocking(move || {
        extract_text(&locator.file_path, &locator.file_type)
    })
    .await;

    let resume_text = match extracted {
        Ok(Ok(text)) => text,
        Ok(Err(e)) => {
            warn!(candidate_id = %id, error = %e, "text extraction failed");
            return fail_candidate(ctx, id, &format!("could not read resume: {e}")).await;
        }
        Err(e) => {
            error!(candidate_id = %id, error = %e, "extraction task panicked");
            return fail_candidate(ctx, id, "internal error during text extraction").await;
        }
    };

    // Cache hit: adopt the previous result wholesale, no LLM traffic.
    if let Some(result) = ctx.cache.lookup(&resume_text, candidate.job_id) {
        info!(candidate_id = %id, score = result.score, "analysis served from cache");
        return complete_candidate(ctx, id, &result).await;
    }

    let score = ctx.analyzer.score_only(&resume_text, &candidate.job).await;
    let (summary, analysis) = ctx
        .analyzer
        .summarize_and_analyze(&resume_text, &candidate.job)
        .await;
    let skills = extract_skills(&resume_text);

    let report = check_analysis(score, &summary, &analysis);
    if !report.complete {
        warn!(
            candidate_id = %id,
            problems = ?report.problems,
            "analysis rejected by completeness gate"
        );
        return fail_candidate(
            ctx,
            id,
            &format!("incomplete analysis — {}", report.problems.join("; ")),
        )
        .await;
    }

    let result = AnalysisResult {
        score,
        summary,
        analysis,
        skills,
    };
    ctx.cache.store(&resume_text, candidate.job_id, &result);

    let outcome = complete_candidate(ctx, id, &result).await;
    if outcome == WorkerOutcome::Completed {
        info!(candidate_id = %id, score = result.score, "candidate analysis completed");
    }
    outcome
}

async fn complete_candidate(
    ctx: &AnalysisContext,
    id: Uuid,
    result: &AnalysisResult,
) -> WorkerOutcome {
    // Best-effort retry: a transient store hiccup on the final write must not
    // discard a finished (and paid-for) analysis.
    for attempt in 0..2 {
        match ctx.store.mark_completed(id, result).await {
            Ok(()) => return WorkerOutcome::Completed,
            Err(e) if attempt == 0 => {
                warn!(candidate_id = %id, error = %e, "final write failed, retrying");
                tokio::time::sleep(std::time::Duration::from_millis(500)).await;
            }
            Err(e) => {
                error!(candidate_id = %id, error = %e, "final write failed twice");
            }
        }
    }
    WorkerOutcome::Failed
}

async fn fail_candidate(ctx: &AnalysisContext, id: Uuid, diagnostic: &str) -> WorkerOutcome {
    let summary = format!("{FAILURE_PREFIX} {diagnostic}");
    let analysis = format!("ANALYSIS FAILED: {diagnostic}. Reprocess this candidate to retry.");

    for attempt in 0..2 {
        match ctx.store.mark_failed(id, &summary, &analysis).await {
            Ok(()) => break,
            Err(e) if attempt == 0 => {
                warn!(candidate_id = %id, error = %e, "failure write failed, retrying");
                tokio::time::sleep(std::time::Duration::from_millis(500)).await;
            }
            Err(e) => {
                error!(candidate_id = %id, error = %e, "could not persist failure state");
            }
        }
    }
    WorkerOutcome::Failed
}
