// Shared prompt fragments.
// Each service that needs LLM calls defines its own prompts.rs alongside it.

/// Persona line opening every evaluation prompt.
pub const EVALUATOR_PERSONA: &str =
    "You are a helpful AI assistant skilled at evaluating resumes for job applications.";

/// Output contract that makes the leading score machine-readable.
pub const SCORE_HEADER_INSTRUCTION: &str = "Start your response with: **Score: <number>/100**\n\
    Then list the strengths and areas to improve clearly.";

/// Wraps free text in a triple-quoted block so the model treats it as data.
pub fn quoted_block(label: &str, body: &str) -> String {
    format!("{label}:\n\"\"\"\n{body}\n\"\"\"")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quoted_block_wraps_body() {
        assert_eq!(quoted_block("Resume", "Jane"), "Resume:\n\"\"\"\nJane\n\"\"\"");
    }
}
