//! Completeness gate for analysis output.
//!
//! An LLM call can "succeed" and still return empty or error-shaped content;
//! without this gate such a candidate would be marked completed with garbage
//! that looks done but is not useful. The gate is the only thing standing
//! between a degraded response and a bogus `completed` row.

use serde::Serialize;

use crate::analysis::client::FAILURE_PREFIX;

pub const MIN_SUMMARY_CHARS: usize = 50;
pub const MIN_ANALYSIS_CHARS: usize = 100;

/// Prefixes that mark placeholder or error-shaped content.
const FAILURE_MARKERS: [&str; 2] = [FAILURE_PREFIX, "ANALYSIS FAILED"];

#[derive(Debug, Clone, Serialize)]
pub struct CompletenessReport {
    pub complete: bool,
    pub problems: Vec<String>,
}

/// Accepts an attempt as complete only if the score is positive, both text
/// fields are non-trivially long, and neither is failure-prefixed.
pub fn check_analysis(score: f64, summary: &str, analysis: &str) -> CompletenessReport {
    let mut problems = Vec::new();

    if score <= 0.0 {
        problems.push(format!("score is not positive ({score})"));
    }

    let summary = summary.trim();
    let analysis = analysis.trim();

    if summary.chars().count() <= MIN_SUMMARY_CHARS {
        problems.push(format!(
            "summary too short ({} chars, need > {MIN_SUMMARY_CHARS})",
            summary.chars().count()
        ));
    }
    if analysis.chars().count() <= MIN_ANALYSIS_CHARS {
        problems.push(format!(
            "detailed analysis too short ({} chars, need > {MIN_ANALYSIS_CHARS})",
            analysis.chars().count()
        ));
    }

    for marker in FAILURE_MARKERS {
        if summary.starts_with(marker) {
            problems.push(format!("summary carries failure marker '{marker}'"));
        }
        if analysis.starts_with(marker) {
            problems.push(format!("analysis carries failure marker '{marker}'"));
        }
    }

    CompletenessReport {
        complete: problems.is_empty(),
        problems,
    }
}
