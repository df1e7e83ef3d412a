//! Content-addressed cache of analysis results.
//!
//! Key: SHA-256 of (resume text, job id). Value: one small JSON file per key
//! under the cache directory. LLM calls dominate cost and latency, and
//! repeated bulk uploads routinely resolve to the same (resume, job) pair, so
//! a hit turns reprocessing into a cheap idempotent read.
//!
//! Cache problems never fail the caller: a corrupted or unreadable entry is a
//! miss (and is removed), a failed write is logged and swallowed.

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::models::candidate::AnalysisResult;

/// Entries older than this are expired on lookup and by `evict_expired`.
pub const MAX_AGE_HOURS: i64 = 24;

#[derive(Debug, Serialize, Deserialize)]
struct CacheEntry {
    created_at: DateTime<Utc>,
    job_id: Uuid,
    result: AnalysisResult,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct CacheStats {
    pub entries: usize,
    pub total_bytes: u64,
}

/// Entries live in separate per-key files, so concurrent workers only ever
/// race on identical (resume, job) pairs, where last-write-wins is fine.
#[derive(Debug)]
pub struct AnalysisCache {
    dir: PathBuf,
}

impl AnalysisCache {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("creating cache directory {}", dir.display()))?;
        Ok(Self { dir })
    }

    fn cache_key(resume_text: &str, job_id: Uuid) -> String {
        let mut hasher = Sha256::new();
        hasher.update(resume_text.trim().as_bytes());
        hasher.update(job_id.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }

    /// Returns the cached result for this (resume, job) pair if present and
    /// fresher than [`MAX_AGE_HOURS`].
    pub fn lookup(&self, resume_text: &str, job_id: Uuid) -> Option<AnalysisResult> {
        let key = Self::cache_key(resume_text, job_id);
        let path = self.entry_path(&key);

        let raw = std::fs::read_to_string(&path).ok()?;
        let entry: CacheEntry = match serde_json::from_str(&raw) {
            Ok(e) => e,
            Err(e) => {
                warn!(key, error = %e, "removing corrupted cache entry");
                let _ = std::fs::remove_file(&path);
                return None;
            }
        };

        if Utc::now() - entry.created_at > Duration::hours(MAX_AGE_HOURS) {
            let _ = std::fs::remove_file(&path);
            return None;
        }

        debug!(key, "analysis cache hit");
        Some(entry.result)
    }

    /// Writes (or overwrites) the entry for this pair. Never fails the
    /// caller's flow.
    pub fn store(&self, resume_text: &str, job_id: Uuid, result: &AnalysisResult) {
        let key = Self::cache_key(resume_text, job_id);
        let entry = CacheEntry {
            created_at: Utc::now(),
            job_id,
            result: result.clone(),
        };

        match serde_json::to_vec(&entry) {
            Ok(bytes) => {
                if let Err(e) = std::fs::write(self.entry_path(&key), bytes) {
                    warn!(key, error = %e, "cache write failed");
                }
            }
            Err(e) => warn!(key, error = %e, "cache serialization failed"),
        }
    }

    /// Removes entries older than `max_age`; corrupted files count as expired.
    /// Safe to run concurrently with lookups and stores.
    pub fn evict_expired(&self, max_age: Duration) -> usize {
        let cutoff = Utc::now() - max_age;
        let mut removed = 0;

        for path in self.entry_files() {
            let expired = match std::fs::read_to_string(&path)
                .ok()
                .and_then(|raw| serde_json::from_str::<CacheEntry>(&raw).ok())
            {
                Some(entry) => entry.created_at < cutoff,
                None => true,
            };
            if expired && std::fs::remove_file(&path).is_ok() {
                removed += 1;
            }
        }

        if removed > 0 {
            debug!(removed, "evicted expired cache entries");
        }
        removed
    }

    pub fn stats(&self) -> CacheStats {
        let mut entries = 0;
        let mut total_bytes = 0;
        for path in self.entry_files() {
            entries += 1;
            total_bytes += path.metadata().map(|m| m.len()).unwrap_or(0);
        }
        CacheStats {
            entries,
            total_bytes,
        }
    }

    fn entry_files(&self) -> impl Iterator<Item = PathBuf> {
        std::fs::read_dir(&self.dir)
            .into_iter()
            .flatten()
            .flatten()
            .map(|e| e.path())
            .filter(|p: &PathBuf| p.extension().is_some_and(|ext| ext == "json"))
            .collect::<Vec<_>>()
            .into_iter()
    }
}
