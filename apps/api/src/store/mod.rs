//! Durable candidate store boundary.
//!
//! All worker, orchestrator, and reclaimer logic talks to this trait; the
//! Postgres implementation is the single source of truth for analysis status.

pub mod pg;

#[cfg(test)]
pub mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::models::candidate::{AnalysisResult, CandidateRecord, StatusCounts};

pub use pg::PgCandidateStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait CandidateStore: Send + Sync {
    /// Loads one candidate with its job descriptor; `None` if the row vanished.
    async fn get(&self, id: Uuid) -> Result<Option<CandidateRecord>, StoreError>;

    /// Conditional `pending -> processing` transition, stamping
    /// `processing_started_at`. Returns `false` when the candidate is not in
    /// `pending` (already claimed, terminal, or gone); the caller must then
    /// leave the record alone. This UPDATE is the at-most-one-worker guarantee.
    async fn claim_for_processing(&self, id: Uuid) -> Result<bool, StoreError>;

    /// Terminal success: stores the result, sets `analyzed_at`, clears the
    /// processing stamp. Gated on the record still being in `processing`.
    async fn mark_completed(&self, id: Uuid, result: &AnalysisResult) -> Result<(), StoreError>;

    /// Terminal failure with operator-readable diagnostics. Score is cleared;
    /// a failed record never carries a score. Gated on `processing`.
    async fn mark_failed(&self, id: Uuid, summary: &str, analysis: &str)
        -> Result<(), StoreError>;

    /// Per-status counts for a set of ids. Ids with no row contribute nothing.
    async fn status_counts(&self, ids: &[Uuid]) -> Result<StatusCounts, StoreError>;

    /// Resets candidates to `pending`, clearing any prior analysis output.
    /// Returns how many rows were reset.
    async fn reset_to_pending(&self, ids: &[Uuid]) -> Result<u64, StoreError>;

    /// Fails every `processing` record whose claim stamp predates `cutoff`,
    /// writing `diagnostic` into its summary/analysis. Returns the count.
    /// Records claimed after the cutoff are live workers and are left alone.
    async fn fail_stale_processing(
        &self,
        cutoff: DateTime<Utc>,
        diagnostic: &str,
    ) -> Result<u64, StoreError>;
}
