//! LLM analysis client: the two logical operations the worker needs, with
//! tolerant parsing of free-form model output.
//!
//! Neither operation fails its caller. Scoring falls back through
//! regex -> sentiment keywords -> neutral default; the summary call degrades
//! to a `FAILED:`-prefixed placeholder that the completeness gate then
//! converts into a failed candidate.

use std::sync::OnceLock;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use tracing::warn;

use crate::analysis::llm::{classify_llm_error, ChatMessage, LlmClient};
use crate::analysis::prompts;
use crate::models::job::JobDescriptor;

/// Prefix carried by placeholder output from a failed or degraded call.
/// The completeness gate rejects anything starting with it.
pub const FAILURE_PREFIX: &str = "FAILED:";

/// Neutral score used when no signal can be extracted from the response.
pub const DEFAULT_SCORE: f64 = 5.0;

/// Responses shorter than this are treated as a failed generation even though
/// the API call itself succeeded.
const MIN_RESPONSE_CHARS: usize = 100;

const SCORE_TIMEOUT: Duration = Duration::from_secs(45);
const ANALYSIS_TIMEOUT: Duration = Duration::from_secs(90);

/// Seam between the worker and the LLM. The production implementation is
/// [`LlmAnalyzer`]; tests substitute scripted doubles.
#[async_trait]
pub trait ResumeAnalyzer: Send + Sync {
    /// Scores a resume against a job on [0, 10]. Always returns a usable value.
    async fn score_only(&self, resume_text: &str, job: &JobDescriptor) -> f64;

    /// Produces `(summary, detailed_analysis)`. Degraded output is prefixed
    /// with [`FAILURE_PREFIX`] instead of raising.
    async fn summarize_and_analyze(
        &self,
        resume_text: &str,
        job: &JobDescriptor,
    ) -> (String, String);
}

pub struct LlmAnalyzer {
    llm: LlmClient,
}

impl LlmAnalyzer {
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl ResumeAnalyzer for LlmAnalyzer {
    async fn score_only(&self, resume_text: &str, job: &JobDescriptor) -> f64 {
        let prompt = prompts::scoring_prompt(resume_text, job);
        let messages = [ChatMessage::user(prompt)];

        match self.llm.chat(&messages, 50, 0.1, SCORE_TIMEOUT).await {
            Ok(text) => parse_score(&text),
            Err(e) => {
                warn!(error = %e, "score call failed, using default score");
                DEFAULT_SCORE
            }
        }
    }

    async fn summarize_and_analyze(
        &self,
        resume_text: &str,
        job: &JobDescriptor,
    ) -> (String, String) {
        let prompt = prompts::analysis_prompt(resume_text, job);
        let messages = [ChatMessage::user(prompt)];

        match self.llm.chat(&messages, 1500, 0.2, ANALYSIS_TIMEOUT).await {
            Ok(text) if text.trim().chars().count() >= MIN_RESPONSE_CHARS => {
                split_sections(&text)
            }
            Ok(text) => {
                warn!(chars = text.trim().len(), "analysis response too short");
                failure_pair("the analysis service returned an unusably short response")
            }
            Err(e) => {
                let diagnostic = classify_llm_error(&e);
                warn!(error = %e, "analysis call failed");
                failure_pair(&diagnostic)
            }
        }
    }
}

fn failure_pair(diagnostic: &str) -> (String, String) {
    let text = format!("{FAILURE_PREFIX} {diagnostic}. Reprocess this candidate to retry.");
    (text.clone(), text)
}

fn score_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d{1,3}(?:\.\d{1,2})?)").expect("valid score regex"))
}

/// Best-effort extraction of a [0, 10] score from free-form model output.
/// Fallback chain: first numeric token -> sentiment keywords -> 5.0.
pub fn parse_score(response: &str) -> f64 {
    if let Some(caps) = score_regex().captures(response) {
        if let Ok(mut raw) = caps[1].parse::<f64>() {
            // A model answering on a 0-100 scale (e.g. "85/100").
            if raw > 10.0 {
                raw /= 10.0;
            }
            return round2(raw.clamp(0.0, 10.0));
        }
    }

    let lower = response.to_lowercase();
    for (keywords, score) in [
        (&["excellent", "outstanding"][..], 8.5),
        (&["good", "suitable", "strong fit"][..], 7.0),
        (&["average", "fair", "moderate"][..], 5.5),
        (&["weak", "poor", "unsuitable"][..], 3.0),
    ] {
        if keywords.iter().any(|k| lower.contains(k)) {
            return score;
        }
    }

    DEFAULT_SCORE
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// Splits a structured response into `(summary, detailed_analysis)` on the
/// known section markers. Markers absent: the whole response serves as both
/// outputs, degraded but non-failing.
pub fn split_sections(response: &str) -> (String, String) {
    if let Some((head, tail)) = response.split_once(prompts::ANALYSIS_MARKER) {
        let summary = clean_section(&head.replace(prompts::SUMMARY_MARKER, ""));
        let analysis = clean_section(tail);
        if !summary.is_empty() && !analysis.is_empty() {
            return (summary, analysis);
        }
    }
    let whole = clean_section(response);
    (whole.clone(), whole)
}

fn clean_section(text: &str) -> String {
    text.replace("---", "")
        .trim_matches(|c: char| c == ':' || c.is_whitespace())
        .to_string()
}
