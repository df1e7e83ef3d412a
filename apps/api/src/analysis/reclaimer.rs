//! Stale-work reclaim.
//!
//! A crashed or wedged worker leaves its candidate stuck in `processing` with
//! no one ever writing a terminal state. The reclaimer periodically fails
//! every `processing` record whose claim stamp is older than the threshold,
//! so the record becomes visible as broken and an operator can reprocess it.
//! Reclaim never requeues automatically: a wedged input would otherwise loop.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{error, info};

use crate::analysis::client::FAILURE_PREFIX;
use crate::store::{CandidateStore, StoreError};

/// One reclaim pass: fails records claimed more than `older_than` ago.
/// Returns the number of reclaimed records.
pub async fn reclaim_stale(
    store: &dyn CandidateStore,
    older_than: Duration,
) -> Result<u64, StoreError> {
    let cutoff = Utc::now()
        - chrono::Duration::from_std(older_than).unwrap_or_else(|_| chrono::Duration::zero());
    let diagnostic = format!(
        "{FAILURE_PREFIX} processing stalled and was reclaimed after {}s. \
         Reprocess this candidate to retry.",
        older_than.as_secs()
    );

    let reclaimed = store.fail_stale_processing(cutoff, &diagnostic).await?;
    if reclaimed > 0 {
        info!(reclaimed, "reclaimed stale processing candidates");
    }
    Ok(reclaimed)
}

/// Background loop driving [`reclaim_stale`] on a fixed interval. Errors are
/// logged and the loop keeps going; the next tick retries.
pub async fn run_periodic(
    store: Arc<dyn CandidateStore>,
    older_than: Duration,
    every: Duration,
) {
    let mut ticker = tokio::time::interval(every);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    // First tick fires immediately; skip it so startup is quiet.
    ticker.tick().await;

    loop {
        ticker.tick().await;
        if let Err(e) = reclaim_stale(store.as_ref(), older_than).await {
            error!(error = %e, "stale-work reclaim pass failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use uuid::Uuid;

    use super::*;
    use crate::models::candidate::AnalysisStatus;
    use crate::store::memory::MemoryCandidateStore;

    #[tokio::test]
    async fn test_reclaims_only_stale_records() {
        let store = MemoryCandidateStore::new();
        let stale = Uuid::new_v4();
        let fresh = Uuid::new_v4();
        let job = Uuid::new_v4();

        let mut record = MemoryCandidateStore::pending_candidate(stale, job, "/tmp/a.txt", "txt");
        record.analysis_status = AnalysisStatus::Processing;
        record.processing_started_at = Some(Utc::now() - chrono::Duration::hours(1));
        store.insert(record);

        let mut record = MemoryCandidateStore::pending_candidate(fresh, job, "/tmp/b.txt", "txt");
        record.analysis_status = AnalysisStatus::Processing;
        record.processing_started_at = Some(Utc::now());
        store.insert(record);

        let reclaimed = reclaim_stale(&store, Duration::from_secs(600)).await.unwrap();
        assert_eq!(reclaimed, 1);

        let stale = store.snapshot(stale).unwrap();
        assert_eq!(stale.analysis_status, AnalysisStatus::Failed);
        assert!(stale.summary.unwrap().contains("stalled"));
        assert_eq!(
            store.snapshot(fresh).unwrap().analysis_status,
            AnalysisStatus::Processing
        );
    }

    #[tokio::test]
    async fn test_pending_and_terminal_records_untouched() {
        let store = MemoryCandidateStore::new();
        let id = Uuid::new_v4();
        store.insert(MemoryCandidateStore::pending_candidate(
            id,
            Uuid::new_v4(),
            "/tmp/a.txt",
            "txt",
        ));

        let reclaimed = reclaim_stale(&store, Duration::ZERO).await.unwrap();
        assert_eq!(reclaimed, 0);
        assert_eq!(
            store.snapshot(id).unwrap().analysis_status,
            AnalysisStatus::Pending
        );
    }
}
