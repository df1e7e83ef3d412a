//! Concurrent resume-analysis subsystem: extraction, caching, LLM scoring,
//! per-candidate lifecycle, batch orchestration, and stale-work reclaim.

pub mod cache;
pub mod client;
pub mod completeness;
pub mod llm;
pub mod orchestrator;
pub mod prompts;
pub mod reclaimer;
pub mod skills;
pub mod worker;

#[cfg(test)]
pub mod test_support {
    //! Scripted `ResumeAnalyzer` double shared by worker and orchestrator tests.

    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;

    use crate::analysis::client::ResumeAnalyzer;
    use crate::models::job::JobDescriptor;

    pub struct MockAnalyzer {
        pub score: f64,
        pub summary: String,
        pub analysis: String,
        pub delay: Option<Duration>,
        pub score_calls: AtomicUsize,
        pub summary_calls: AtomicUsize,
    }

    impl MockAnalyzer {
        /// A response that clears the completeness gate.
        pub fn good() -> Self {
            Self::scripted(
                8.25,
                "Jane Doe, jane@example.com. Ten years of backend engineering \
                 across fintech and infrastructure teams.",
                "1. Technical alignment: deep Rust and SQL experience covering the \
                 core requirements. 2. Gaps: limited Kubernetes exposure. \
                 3. Final recommendation: SUITABLE — strong fundamentals.",
            )
        }

        pub fn scripted(score: f64, summary: &str, analysis: &str) -> Self {
            Self {
                score,
                summary: summary.to_string(),
                analysis: analysis.to_string(),
                delay: None,
                score_calls: AtomicUsize::new(0),
                summary_calls: AtomicUsize::new(0),
            }
        }

        pub fn total_calls(&self) -> usize {
            self.score_calls.load(Ordering::SeqCst) + self.summary_calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ResumeAnalyzer for MockAnalyzer {
        async fn score_only(&self, _resume_text: &str, _job: &JobDescriptor) -> f64 {
            self.score_calls.fetch_add(1, Ordering::SeqCst);
            if let Some(d) = self.delay {
                tokio::time::sleep(d).await;
            }
            self.score
        }

        async fn summarize_and_analyze(
            &self,
            _resume_text: &str,
            _job: &JobDescriptor,
        ) -> (String, String) {
            self.summary_calls.fetch_add(1, Ordering::SeqCst);
            if let Some(d) = self.delay {
                tokio::time::sleep(d).await;
            }
            (self.summary.clone(), self.analysis.clone())
        }
    }
}
