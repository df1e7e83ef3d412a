//! Parallel batch orchestrator: fans candidate ids out over a bounded worker
//! pool, in capped batches with an inter-batch pause to keep peak load on the
//! LLM endpoint and the database bounded.
//!
//! The orchestrator never retries: a failed candidate stays failed until an
//! operator reprocesses it. Progress is observed by polling persisted status,
//! not by awaiting the batch.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use tokio::sync::Semaphore;
use tokio::task::{JoinHandle, JoinSet};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::analysis::client::FAILURE_PREFIX;
use crate::analysis::worker::{analyze_candidate, AnalysisContext, WorkerOutcome};

#[derive(Debug, Clone)]
pub struct OrchestratorSettings {
    /// Maximum concurrently running workers.
    pub max_workers: usize,
    /// Candidates per batch; batches run sequentially.
    pub batch_size: usize,
    /// Pause between batches.
    pub batch_pause: Duration,
    /// Wall-clock ceiling per candidate, over and above the LLM call timeouts.
    pub candidate_timeout: Duration,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            max_workers: 8,
            batch_size: 5,
            batch_pause: Duration::from_secs(2),
            candidate_timeout: Duration::from_secs(180),
        }
    }
}

/// Aggregate outcome of one batch run. Transient: the same information is
/// always reconstructable from persisted candidate statuses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    pub success_count: u64,
    pub failed_count: u64,
    /// Vanished or already-claimed candidates; benign, not failures.
    pub skipped_count: u64,
    pub total: u64,
    pub duration_ms: u64,
}

pub struct Orchestrator {
    ctx: AnalysisContext,
    settings: OrchestratorSettings,
}

impl Orchestrator {
    pub fn new(ctx: AnalysisContext, settings: OrchestratorSettings) -> Self {
        Self { ctx, settings }
    }

    /// Fire-and-forget entry point: spawns the batch onto the runtime and
    /// returns immediately. An empty list is a no-op.
    pub fn start(self: &Arc<Self>, candidate_ids: Vec<Uuid>) -> JoinHandle<BatchReport> {
        let this = Arc::clone(self);
        tokio::spawn(async move { this.run(candidate_ids).await })
    }

    /// Runs a batch to completion and returns the aggregate report.
    pub async fn run(&self, candidate_ids: Vec<Uuid>) -> BatchReport {
        let ids = dedup_preserving_order(candidate_ids);
        let total = ids.len() as u64;
        if ids.is_empty() {
            return BatchReport::default();
        }

        info!(
            total,
            max_workers = self.settings.max_workers,
            batch_size = self.settings.batch_size,
            "starting batch analysis"
        );
        let started = Instant::now();

        let semaphore = Arc::new(Semaphore::new(self.settings.max_workers.max(1)));
        let mut report = BatchReport {
            total,
            ..Default::default()
        };

        for (i, chunk) in ids.chunks(self.settings.batch_size.max(1)).enumerate() {
            if i > 0 && !self.settings.batch_pause.is_zero() {
                tokio::time::sleep(self.settings.batch_pause).await;
            }

            let mut workers = JoinSet::new();
            for &id in chunk {
                let ctx = self.ctx.clone();
                let semaphore = Arc::clone(&semaphore);
                let ceiling = self.settings.candidate_timeout;

                workers.spawn(async move {
                    let _permit = semaphore
                        .acquire_owned()
                        .await
                        .expect("worker semaphore closed");
                    match tokio::time::timeout(ceiling, analyze_candidate(&ctx, id)).await {
                        Ok(outcome) => outcome,
                        Err(_) => {
                            warn!(candidate_id = %id, "candidate exceeded wall-clock ceiling");
                            finalize_timed_out(&ctx, id).await;
                            WorkerOutcome::Failed
                        }
                    }
                });
            }

            while let Some(joined) = workers.join_next().await {
                match joined {
                    Ok(WorkerOutcome::Completed) => report.success_count += 1,
                    Ok(WorkerOutcome::Failed) => report.failed_count += 1,
                    Ok(WorkerOutcome::Skipped | WorkerOutcome::NotFound) => {
                        report.skipped_count += 1
                    }
                    Err(e) => {
                        // A panicking worker must not take the batch down.
                        error!(error = %e, "worker task panicked");
                        report.failed_count += 1;
                    }
                }
            }
        }

        report.duration_ms = started.elapsed().as_millis() as u64;
        info!(
            success = report.success_count,
            failed = report.failed_count,
            skipped = report.skipped_count,
            duration_ms = report.duration_ms,
            "batch analysis finished"
        );
        report
    }
}

/// The timeout dropped the worker mid-attempt, so the record may be stranded
/// in `processing`. The conditional `mark_failed` finalizes it without ever
/// clobbering a terminal write that beat the deadline.
async fn finalize_timed_out(ctx: &AnalysisContext, id: Uuid) {
    let diagnostic =
        "processing timed out, the analysis did not finish within the per-candidate limit";
    let summary = format!("{FAILURE_PREFIX} {diagnostic}");
    let analysis = format!("ANALYSIS FAILED: {diagnostic}. Reprocess this candidate to retry.");
    if let Err(e) = ctx.store.mark_failed(id, &summary, &analysis).await {
        error!(candidate_id = %id, error = %e, "could not persist timeout failure");
    }
}

/// Duplicate ids in one submission must not race two workers over the same
/// record; keep first occurrence, preserve order.
fn dedup_preserving_order(ids: Vec<Uuid>) -> Vec<Uuid> {
    let mut seen = HashSet::with_capacity(ids.len());
    ids.into_iter().filter(|id| seen.insert(*id)).collect()
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;
    use crate::analysis::cache::AnalysisCache;
    use crate::analysis::test_support::MockAnalyzer;
    use crate::models::candidate::AnalysisStatus;
    use crate::store::memory::MemoryCandidateStore;
    use crate::store::CandidateStore;

    const RESUME: &str = "Jane Doe\njane@example.com\nSenior Rust engineer with ten years \
                          of experience in PostgreSQL, Docker and AWS deployments.";

    fn resume_file() -> NamedTempFile {
        let mut f = NamedTempFile::with_suffix(".txt").unwrap();
        f.write_all(RESUME.as_bytes()).unwrap();
        f
    }

    fn fast_settings() -> OrchestratorSettings {
        OrchestratorSettings {
            max_workers: 4,
            batch_size: 16,
            batch_pause: Duration::ZERO,
            candidate_timeout: Duration::from_secs(30),
        }
    }

    fn orchestrator(
        store: Arc<MemoryCandidateStore>,
        analyzer: Arc<MockAnalyzer>,
        settings: OrchestratorSettings,
    ) -> (Arc<Orchestrator>, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let ctx = AnalysisContext {
            store,
            cache: Arc::new(AnalysisCache::new(dir.path()).unwrap()),
            analyzer,
        };
        (Arc::new(Orchestrator::new(ctx, settings)), dir)
    }

    #[test]
    fn test_dedup_preserves_order() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        assert_eq!(dedup_preserving_order(vec![a, b, a, b, a]), vec![a, b]);
    }

    #[tokio::test]
    async fn test_empty_batch_is_noop() {
        let store = Arc::new(MemoryCandidateStore::new());
        let (orch, _dir) = orchestrator(store, Arc::new(MockAnalyzer::good()), fast_settings());
        assert_eq!(orch.run(Vec::new()).await, BatchReport::default());
    }

    #[tokio::test]
    async fn test_partial_failure_batch() {
        let file = resume_file();
        let store = Arc::new(MemoryCandidateStore::new());
        let mut ids = Vec::new();
        for i in 0..10 {
            let id = Uuid::new_v4();
            // Three candidates rigged to fail during extraction.
            let path = if i < 3 {
                "/nonexistent/resume.txt".to_string()
            } else {
                file.path().to_str().unwrap().to_string()
            };
            store.insert(MemoryCandidateStore::pending_candidate(
                id,
                Uuid::new_v4(),
                &path,
                "txt",
            ));
            ids.push(id);
        }

        let (orch, _dir) =
            orchestrator(store.clone(), Arc::new(MockAnalyzer::good()), fast_settings());
        let report = orch.run(ids.clone()).await;

        assert_eq!(report.success_count, 7);
        assert_eq!(report.failed_count, 3);
        assert_eq!(report.total, 10);

        // Every record reached a terminal state.
        for id in ids {
            assert!(store.snapshot(id).unwrap().analysis_status.is_terminal());
        }
    }

    #[tokio::test]
    async fn test_duplicate_ids_processed_once() {
        let file = resume_file();
        let store = Arc::new(MemoryCandidateStore::new());
        let id = Uuid::new_v4();
        store.insert(MemoryCandidateStore::pending_candidate(
            id,
            Uuid::new_v4(),
            file.path().to_str().unwrap(),
            "txt",
        ));
        let analyzer = Arc::new(MockAnalyzer::good());
        let (orch, _dir) = orchestrator(store, analyzer.clone(), fast_settings());

        let report = orch.run(vec![id, id, id]).await;
        assert_eq!(report.total, 1);
        assert_eq!(report.success_count, 1);
        assert_eq!(analyzer.total_calls(), 2); // one score + one summary call
    }

    #[tokio::test]
    async fn test_slow_candidate_hits_wall_clock_ceiling() {
        let file = resume_file();
        let store = Arc::new(MemoryCandidateStore::new());
        let id = Uuid::new_v4();
        store.insert(MemoryCandidateStore::pending_candidate(
            id,
            Uuid::new_v4(),
            file.path().to_str().unwrap(),
            "txt",
        ));

        let mut analyzer = MockAnalyzer::good();
        analyzer.delay = Some(Duration::from_secs(5));
        let mut settings = fast_settings();
        settings.candidate_timeout = Duration::from_millis(100);
        let (orch, _dir) = orchestrator(store.clone(), Arc::new(analyzer), settings);

        let report = orch.run(vec![id]).await;
        assert_eq!(report.failed_count, 1);

        let record = store.snapshot(id).unwrap();
        assert_eq!(record.analysis_status, AnalysisStatus::Failed);
        assert!(record.summary.unwrap().contains("timed out"));
    }

    #[tokio::test]
    async fn test_end_to_end_status_counts() {
        // Three candidates, the middle one with a missing file.
        let file = resume_file();
        let store = Arc::new(MemoryCandidateStore::new());
        let ids: Vec<Uuid> = (0..3).map(|_| Uuid::new_v4()).collect();
        for (i, &id) in ids.iter().enumerate() {
            let path = if i == 1 {
                "/nonexistent/resume.txt".to_string()
            } else {
                file.path().to_str().unwrap().to_string()
            };
            store.insert(MemoryCandidateStore::pending_candidate(
                id,
                Uuid::new_v4(),
                &path,
                "txt",
            ));
        }

        let (orch, _dir) =
            orchestrator(store.clone(), Arc::new(MockAnalyzer::good()), fast_settings());
        let report = orch.run(ids.clone()).await;
        assert_eq!((report.success_count, report.failed_count), (2, 1));

        assert_eq!(
            store.snapshot(ids[0]).unwrap().analysis_status,
            AnalysisStatus::Completed
        );
        assert_eq!(
            store.snapshot(ids[1]).unwrap().analysis_status,
            AnalysisStatus::Failed
        );
        assert_eq!(
            store.snapshot(ids[2]).unwrap().analysis_status,
            AnalysisStatus::Completed
        );

        let counts = store.status_counts(&ids).await.unwrap();
        assert_eq!(counts.pending, 0);
        assert_eq!(counts.processing, 0);
        assert_eq!(counts.completed, 2);
        assert_eq!(counts.failed, 1);
    }

    #[tokio::test]
    async fn test_start_is_fire_and_forget() {
        let file = resume_file();
        let store = Arc::new(MemoryCandidateStore::new());
        let id = Uuid::new_v4();
        store.insert(MemoryCandidateStore::pending_candidate(
            id,
            Uuid::new_v4(),
            file.path().to_str().unwrap(),
            "txt",
        ));
        let (orch, _dir) = orchestrator(store.clone(), Arc::new(MockAnalyzer::good()), fast_settings());

        let handle = orch.start(vec![id]);
        let report = handle.await.unwrap();
        assert_eq!(report.success_count, 1);
        assert_eq!(
            store.snapshot(id).unwrap().analysis_status,
            AnalysisStatus::Completed
        );
    }
}
