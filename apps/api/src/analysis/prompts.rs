//! Prompt templates for the two analysis calls.
//!
//! The summary prompt pins an exact section layout (`RESUME SUMMARY` /
//! `RECRUITER ANALYSIS`) so the client can split the response into the two
//! stored fields. Keep the markers in sync with `client::split_sections`.

use crate::models::job::JobDescriptor;

pub const SUMMARY_MARKER: &str = "RESUME SUMMARY";
pub const ANALYSIS_MARKER: &str = "RECRUITER ANALYSIS";

/// Resume text budget for the scoring call.
pub const SCORE_TEXT_BUDGET: usize = 3000;
/// Resume text budget for the summary/analysis call.
pub const ANALYSIS_TEXT_BUDGET: usize = 4000;

fn clip(text: &str, budget: usize) -> &str {
    match text.char_indices().nth(budget) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

pub fn scoring_prompt(resume_text: &str, job: &JobDescriptor) -> String {
    format!(
        "You are a senior recruiter specialized in candidate evaluation.\n\
         \n\
         Evaluate the resume below for the position '{title}' and assign a score from 0 to 10.\n\
         \n\
         POSITION: {title}\n\
         DESCRIPTION: {description}\n\
         REQUIREMENTS: {requirements}\n\
         \n\
         EVALUATION CRITERIA:\n\
         1. Relevant experience in the field (weight 4)\n\
         2. Technical skills matching the requirements (weight 3)\n\
         3. Adequate academic background (weight 2)\n\
         4. Clarity and quality of the resume (weight 1)\n\
         \n\
         RESUME:\n\
         {resume}\n\
         \n\
         INSTRUCTIONS:\n\
         - Objectively assess the candidate's fit for this specific position\n\
         - Assign a score from 0 to 10 with up to two decimal places\n\
         - Return only the final score (e.g. 7.91 or 6.25), with no commentary\n\
         \n\
         Score: [your evaluation]",
        title = job.title,
        description = clip(&job.description, 300),
        requirements = clip(&job.requirements, 500),
        resume = clip(resume_text, SCORE_TEXT_BUDGET),
    )
}

pub fn analysis_prompt(resume_text: &str, job: &JobDescriptor) -> String {
    format!(
        "You are a senior recruiter specialized in resume analysis.\n\
         \n\
         ANALYZE ONLY THE REAL RESUME PROVIDED BELOW. DO NOT INVENT INFORMATION.\n\
         If something is not in the resume, write \"Not provided\".\n\
         \n\
         POSITION: {title}\n\
         DESCRIPTION: {description}\n\
         REQUIREMENTS: {requirements}\n\
         \n\
         CANDIDATE RESUME:\n\
         {resume}\n\
         \n\
         Respond in EXACTLY this layout, using these two section titles verbatim:\n\
         \n\
         {summary_marker}\n\
         \n\
         Full name and contact information first, then professional experience\n\
         (role, company, dates), technical skills, education, and languages —\n\
         strictly factual, taken from the resume only.\n\
         \n\
         {analysis_marker}\n\
         \n\
         1. Technical alignment: relevant experience and which requirements the\n\
            candidate's skills actually cover\n\
         2. Identified gaps: missing skills and knowledge relative to the requirements\n\
         3. Final recommendation: SUITABLE / PARTIAL / UNSUITABLE, with strengths,\n\
            limitations, and an objective justification\n\
         \n\
         Do not mix the two sections: the summary holds only resume facts, the\n\
         analysis holds only your professional assessment.",
        title = job.title,
        description = clip(&job.description, 500),
        requirements = clip(&job.requirements, 1000),
        resume = clip(resume_text, ANALYSIS_TEXT_BUDGET),
        summary_marker = SUMMARY_MARKER,
        analysis_marker = ANALYSIS_MARKER,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job() -> JobDescriptor {
        JobDescriptor {
            title: "Backend Engineer".to_string(),
            description: "d".repeat(1000),
            requirements: "r".repeat(2000),
        }
    }

    #[test]
    fn test_scoring_prompt_clips_fields() {
        let prompt = scoring_prompt(&"x".repeat(10_000), &job());
        assert!(prompt.contains("Backend Engineer"));
        // Job description clipped to 300, requirements to 500, resume to budget.
        assert!(prompt.len() < 10_000);
        assert!(prompt.contains(&"x".repeat(SCORE_TEXT_BUDGET)));
        assert!(!prompt.contains(&"x".repeat(SCORE_TEXT_BUDGET + 1)));
    }

    #[test]
    fn test_analysis_prompt_contains_markers() {
        let prompt = analysis_prompt("resume text", &job());
        assert!(prompt.contains(SUMMARY_MARKER));
        assert!(prompt.contains(ANALYSIS_MARKER));
    }

    #[test]
    fn test_clip_respects_char_boundaries() {
        let text = "é".repeat(10);
        assert_eq!(clip(&text, 4).chars().count(), 4);
        assert_eq!(clip(&text, 20), text);
    }
}
