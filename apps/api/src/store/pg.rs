use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::candidate::{
    AnalysisResult, AnalysisStatus, CandidateRecord, ResumeLocator, StatusCounts,
};
use crate::models::job::JobDescriptor;
use crate::store::{CandidateStore, StoreError};

/// Postgres-backed candidate store. Every status transition is a single
/// conditional UPDATE, so concurrent workers and the reclaimer serialize on
/// the row itself rather than on any in-process state.
#[derive(Clone)]
pub struct PgCandidateStore {
    pool: PgPool,
}

impl PgCandidateStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct CandidateRow {
    id: Uuid,
    job_id: Uuid,
    file_path: String,
    file_type: String,
    analysis_status: String,
    ai_score: Option<f64>,
    ai_summary: Option<String>,
    ai_analysis: Option<String>,
    extracted_skills: Vec<String>,
    processing_started_at: Option<DateTime<Utc>>,
    analyzed_at: Option<DateTime<Utc>>,
    job_title: String,
    job_description: String,
    job_requirements: String,
}

impl From<CandidateRow> for CandidateRecord {
    fn from(row: CandidateRow) -> Self {
        CandidateRecord {
            id: row.id,
            job_id: row.job_id,
            resume: ResumeLocator {
                file_path: row.file_path,
                file_type: row.file_type,
            },
            analysis_status: AnalysisStatus::parse(&row.analysis_status),
            score: row.ai_score,
            summary: row.ai_summary,
            detailed_analysis: row.ai_analysis,
            skills: row.extracted_skills,
            processing_started_at: row.processing_started_at,
            analyzed_at: row.analyzed_at,
            job: JobDescriptor {
                title: row.job_title,
                description: row.job_description,
                requirements: row.job_requirements,
            },
        }
    }
}

#[async_trait]
impl CandidateStore for PgCandidateStore {
    async fn get(&self, id: Uuid) -> Result<Option<CandidateRecord>, StoreError> {
        let row: Option<CandidateRow> = sqlx::query_as(
            r#"
            SELECT c.id, c.job_id, c.file_path, c.file_type, c.analysis_status,
                   c.ai_score, c.ai_summary, c.ai_analysis, c.extracted_skills,
                   c.processing_started_at, c.analyzed_at,
                   j.title AS job_title,
                   j.description AS job_description,
                   j.requirements AS job_requirements
            FROM candidates c
            JOIN jobs j ON j.id = c.job_id
            WHERE c.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(CandidateRecord::from))
    }

    async fn claim_for_processing(&self, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE candidates
            SET analysis_status = 'processing', processing_started_at = NOW()
            WHERE id = $1 AND analysis_status = 'pending'
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn mark_completed(&self, id: Uuid, result: &AnalysisResult) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            UPDATE candidates
            SET analysis_status = 'completed',
                ai_score = $2, ai_summary = $3, ai_analysis = $4, extracted_skills = $5,
                analyzed_at = NOW(), processing_started_at = NULL
            WHERE id = $1 AND analysis_status = 'processing'
            "#,
        )
        .bind(id)
        .bind(result.score)
        .bind(&result.summary)
        .bind(&result.analysis)
        .bind(&result.skills)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn mark_failed(
        &self,
        id: Uuid,
        summary: &str,
        analysis: &str,
    ) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            UPDATE candidates
            SET analysis_status = 'failed',
                ai_score = NULL, ai_summary = $2, ai_analysis = $3,
                processing_started_at = NULL
            WHERE id = $1 AND analysis_status = 'processing'
            "#,
        )
        .bind(id)
        .bind(summary)
        .bind(analysis)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn status_counts(&self, ids: &[Uuid]) -> Result<StatusCounts, StoreError> {
        let rows: Vec<(String, i64)> = sqlx::query_as(
            r#"
            SELECT analysis_status, COUNT(*)
            FROM candidates
            WHERE id = ANY($1)
            GROUP BY analysis_status
            "#,
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        let mut counts = StatusCounts::default();
        for (status, n) in rows {
            match AnalysisStatus::parse(&status) {
                AnalysisStatus::Pending => counts.pending += n as u64,
                AnalysisStatus::Processing => counts.processing += n as u64,
                AnalysisStatus::Completed => counts.completed += n as u64,
                AnalysisStatus::Failed => counts.failed += n as u64,
            }
        }
        Ok(counts)
    }

    async fn reset_to_pending(&self, ids: &[Uuid]) -> Result<u64, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE candidates
            SET analysis_status = 'pending',
                ai_score = NULL, ai_summary = NULL, ai_analysis = NULL,
                extracted_skills = '{}', analyzed_at = NULL, processing_started_at = NULL
            WHERE id = ANY($1)
            "#,
        )
        .bind(ids)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn fail_stale_processing(
        &self,
        cutoff: DateTime<Utc>,
        diagnostic: &str,
    ) -> Result<u64, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE candidates
            SET analysis_status = 'failed',
                ai_score = NULL, ai_summary = $1, ai_analysis = $1,
                processing_started_at = NULL
            WHERE analysis_status = 'processing' AND processing_started_at < $2
            "#,
        )
        .bind(diagnostic)
        .bind(cutoff)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}
