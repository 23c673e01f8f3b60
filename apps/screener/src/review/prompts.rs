// Prompt construction for resume feedback.
// Reuses cross-cutting fragments from llm_client::prompts.

use crate::llm_client::prompts::{quoted_block, EVALUATOR_PERSONA, SCORE_HEADER_INSTRUCTION};
use crate::review::ReviewMode;

const BRIEF_INSTRUCTION: &str = "Keep the answer brief (max 80 words).";
const DETAILED_INSTRUCTION: &str = "Give a detailed explanation in around 150-200 words.";

pub fn length_instruction(mode: ReviewMode) -> &'static str {
    match mode {
        ReviewMode::Brief => BRIEF_INSTRUCTION,
        ReviewMode::Detailed => DETAILED_INSTRUCTION,
    }
}

/// Builds the evaluation prompt. The JD block is only present when a JD was supplied.
pub fn build_review_prompt(
    resume_text: &str,
    job_title: &str,
    job_description: Option<&str>,
    mode: ReviewMode,
) -> String {
    let mut sections = vec![
        EVALUATOR_PERSONA.to_string(),
        format!("Evaluate the following resume for the job title: **{job_title}**."),
        quoted_block("Resume", resume_text),
    ];

    if let Some(jd) = job_description.filter(|jd| !jd.trim().is_empty()) {
        sections.push(quoted_block("Job Description", jd.trim()));
        sections.push(
            "Judge the fit against this job description rather than the title alone.".to_string(),
        );
    }

    sections.push(format!(
        "Provide the following:\n\
         1. A score out of 100 indicating how suitable the resume is for this role.\n\
         2. Two strengths of the resume.\n\
         3. Two areas of improvement.\n\
         4. {}",
        length_instruction(mode)
    ));
    sections.push(SCORE_HEADER_INSTRUCTION.to_string());

    sections.join("\n\n")
}
