//! In-memory `CandidateStore` used by worker/orchestrator/reclaimer tests.
//! Mirrors the Postgres implementation's conditional-transition semantics.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::candidate::{
    AnalysisResult, AnalysisStatus, CandidateRecord, ResumeLocator, StatusCounts,
};
use crate::models::job::JobDescriptor;
use crate::store::{CandidateStore, StoreError};

#[derive(Default)]
pub struct MemoryCandidateStore {
    records: Mutex<HashMap<Uuid, CandidateRecord>>,
}

impl MemoryCandidateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, record: CandidateRecord) {
        self.records.lock().unwrap().insert(record.id, record);
    }

    pub fn snapshot(&self, id: Uuid) -> Option<CandidateRecord> {
        self.records.lock().unwrap().get(&id).cloned()
    }

    /// Convenience constructor for a pending candidate pointing at `file_path`.
    pub fn pending_candidate(id: Uuid, job_id: Uuid, file_path: &str, file_type: &str) -> CandidateRecord {
        CandidateRecord {
            id,
            job_id,
            resume: ResumeLocator {
                file_path: file_path.to_string(),
                file_type: file_type.to_string(),
            },
            analysis_status: AnalysisStatus::Pending,
            score: None,
            summary: None,
            detailed_analysis: None,
            skills: Vec::new(),
            processing_started_at: None,
            analyzed_at: None,
            job: JobDescriptor {
                title: "Backend Engineer".to_string(),
                description: "Build and operate APIs.".to_string(),
                requirements: "Rust, SQL, distributed systems.".to_string(),
            },
        }
    }
}

#[async_trait]
impl CandidateStore for MemoryCandidateStore {
    async fn get(&self, id: Uuid) -> Result<Option<CandidateRecord>, StoreError> {
        Ok(self.records.lock().unwrap().get(&id).cloned())
    }

    async fn claim_for_processing(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut records = self.records.lock().unwrap();
        match records.get_mut(&id) {
            Some(r) if r.analysis_status == AnalysisStatus::Pending => {
                r.analysis_status = AnalysisStatus::Processing;
                r.processing_started_at = Some(Utc::now());
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn mark_completed(&self, id: Uuid, result: &AnalysisResult) -> Result<(), StoreError> {
        let mut records = self.records.lock().unwrap();
        if let Some(r) = records.get_mut(&id) {
            if r.analysis_status == AnalysisStatus::Processing {
                r.analysis_status = AnalysisStatus::Completed;
                r.score = Some(result.score);
                r.summary = Some(result.summary.clone());
                r.detailed_analysis = Some(result.analysis.clone());
                r.skills = result.skills.clone();
                r.analyzed_at = Some(Utc::now());
                r.processing_started_at = None;
            }
        }
        Ok(())
    }

    async fn mark_failed(
        &self,
        id: Uuid,
        summary: &str,
        analysis: &str,
    ) -> Result<(), StoreError> {
        let mut records = self.records.lock().unwrap();
        if let Some(r) = records.get_mut(&id) {
            if r.analysis_status == AnalysisStatus::Processing {
                r.analysis_status = AnalysisStatus::Failed;
                r.score = None;
                r.summary = Some(summary.to_string());
                r.detailed_analysis = Some(analysis.to_string());
                r.processing_started_at = None;
            }
        }
        Ok(())
    }

    async fn status_counts(&self, ids: &[Uuid]) -> Result<StatusCounts, StoreError> {
        let records = self.records.lock().unwrap();
        let mut counts = StatusCounts::default();
        for id in ids {
            if let Some(r) = records.get(id) {
                counts.bump(r.analysis_status);
            }
        }
        Ok(counts)
    }

    async fn reset_to_pending(&self, ids: &[Uuid]) -> Result<u64, StoreError> {
        let mut records = self.records.lock().unwrap();
        let mut reset = 0;
        for id in ids {
            if let Some(r) = records.get_mut(id) {
                r.analysis_status = AnalysisStatus::Pending;
                r.score = None;
                r.summary = None;
                r.detailed_analysis = None;
                r.skills.clear();
                r.analyzed_at = None;
                r.processing_started_at = None;
                reset += 1;
            }
        }
        Ok(reset)
    }

    async fn fail_stale_processing(
        &self,
        cutoff: DateTime<Utc>,
        diagnostic: &str,
    ) -> Result<u64, StoreError> {
        let mut records = self.records.lock().unwrap();
        let mut failed = 0;
        for r in records.values_mut() {
            if r.analysis_status == AnalysisStatus::Processing
                && r.processing_started_at.is_some_and(|t| t < cutoff)
            {
                r.analysis_status = AnalysisStatus::Failed;
                r.score = None;
                r.summary = Some(diagnostic.to_string());
                r.detailed_analysis = Some(diagnostic.to_string());
                r.processing_started_at = None;
                failed += 1;
            }
        }
        Ok(failed)
    }
}
