use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::job::JobDescriptor;

/// Lifecycle of one analysis attempt: `Pending -> Processing -> {Completed, Failed}`.
/// Terminal states only move back to `Pending` through an explicit reprocess.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl AnalysisStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisStatus::Pending => "pending",
            AnalysisStatus::Processing => "processing",
            AnalysisStatus::Completed => "completed",
            AnalysisStatus::Failed => "failed",
        }
    }

    /// Unknown strings decode as `Pending` rather than erroring: a row with a
    /// mangled status should be re-analyzable, not poisonous.
    pub fn parse(s: &str) -> Self {
        match s {
            "processing" => AnalysisStatus::Processing,
            "completed" => AnalysisStatus::Completed,
            "failed" => AnalysisStatus::Failed,
            _ => AnalysisStatus::Pending,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, AnalysisStatus::Completed | AnalysisStatus::Failed)
    }
}

/// Where the uploaded resume lives on disk and how to decode it.
/// `file_type` is the tag recorded at upload time (`pdf` | `docx` | `txt`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResumeLocator {
    pub file_path: String,
    pub file_type: String,
}

/// The slice of a candidate row this service reads and writes.
#[derive(Debug, Clone)]
pub struct CandidateRecord {
    pub id: Uuid,
    pub job_id: Uuid,
    pub resume: ResumeLocator,
    pub analysis_status: AnalysisStatus,
    pub score: Option<f64>,
    pub summary: Option<String>,
    pub detailed_analysis: Option<String>,
    pub skills: Vec<String>,
    pub processing_started_at: Option<DateTime<Utc>>,
    pub analyzed_at: Option<DateTime<Utc>>,
    pub job: JobDescriptor,
}

/// Payload produced by a successful analysis; also the cache value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub score: f64,
    pub summary: String,
    pub analysis: String,
    pub skills: Vec<String>,
}

/// Per-status counts over a set of candidate ids, always derived from
/// durable-store reads so the numbers survive a process restart.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    pub pending: u64,
    pub processing: u64,
    pub completed: u64,
    pub failed: u64,
}

impl StatusCounts {
    pub fn bump(&mut self, status: AnalysisStatus) {
        match status {
            AnalysisStatus::Pending => self.pending += 1,
            AnalysisStatus::Processing => self.processing += 1,
            AnalysisStatus::Completed => self.completed += 1,
            AnalysisStatus::Failed => self.failed += 1,
        }
    }
}
