//! Resume review — pluggable, trait-based feedback generator.
//!
//! Default: `LlmReviewer` (hosted model via `llm_client`).
//! Fallback: `KeywordReviewer` (offline, deterministic, built from the ATS result),
//! used when no API key is configured or `--offline` is passed.

pub mod prompts;

use std::str::FromStr;
use std::sync::OnceLock;

use async_trait::async_trait;
use clap::ValueEnum;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::ats::AtsScore;
use crate::errors::AppError;
use crate::llm_client::LlmClient;
use crate::review::prompts::build_review_prompt;

const DEFAULT_JOB_TITLE: &str = "general role";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum ReviewMode {
    #[default]
    Brief,
    Detailed,
}

impl FromStr for ReviewMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "brief" => Ok(ReviewMode::Brief),
            "detailed" => Ok(ReviewMode::Detailed),
            other => Err(anyhow::anyhow!("unknown feedback style '{other}'")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ReviewRequest {
    pub resume_text: String,
    pub job_title: String,
    pub job_description: Option<String>,
    pub mode: ReviewMode,
}

impl ReviewRequest {
    /// The title sent to the reviewer; blank titles become "general role".
    pub fn effective_title(&self) -> &str {
        let title = self.job_title.trim();
        if title.is_empty() {
            DEFAULT_JOB_TITLE
        } else {
            title
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
    pub feedback: String,
    /// Score parsed from the `Score: N/100` header, if the reviewer produced one.
    pub score: Option<u32>,
    pub backend: String, // "llm" | "keyword"
}

/// Implement this to swap feedback backends without touching the pipeline.
#[async_trait]
pub trait Reviewer: Send + Sync {
    async fn review(&self, request: &ReviewRequest, ats: &AtsScore) -> Result<Review, AppError>;

    fn backend(&self) -> &'static str;
}

// ────────────────────────────────────────────────────────────────────────────
// LlmReviewer
// ────────────────────────────────────────────────────────────────────────────

pub struct LlmReviewer(pub LlmClient);

#[async_trait]
impl Reviewer for LlmReviewer {
    async fn review(&self, request: &ReviewRequest, _ats: &AtsScore) -> Result<Review, AppError> {
        let prompt = build_review_prompt(
            &request.resume_text,
            request.effective_title(),
            request.job_description.as_deref(),
            request.mode,
        );
        info!("Requesting {:?} feedback for '{}'", request.mode, request.effective_title());

        let feedback = self.0.call_text(&prompt).await?;
        Ok(Review {
            score: parse_feedback_score(&feedback),
            feedback,
            backend: self.backend().to_string(),
        })
    }

    fn backend(&self) -> &'static str {
        "llm"
    }
}

// ────────────────────────────────────────────────────────────────────────────
// KeywordReviewer
// ────────────────────────────────────────────────────────────────────────────

/// Offline reviewer. Produces feedback in the same shape as the LLM
/// (score header, strengths, areas to improve) from keyword coverage alone.
pub struct KeywordReviewer;

#[async_trait]
impl Reviewer for KeywordReviewer {
    async fn review(&self, request: &ReviewRequest, ats: &AtsScore) -> Result<Review, AppError> {
        let feedback = keyword_feedback(request, ats);
        Ok(Review {
            score: Some(ats.final_score),
            feedback,
            backend: self.backend().to_string(),
        })
    }

    fn backend(&self) -> &'static str {
        "keyword"
    }
}

fn keyword_feedback(request: &ReviewRequest, ats: &AtsScore) -> String {
    let title = request.effective_title();
    let matched: Vec<&str> = ats
        .role
        .matched
        .iter()
        .chain(ats.jd.matched.iter())
        .map(String::as_str)
        .collect();
    let missing: Vec<&str> = ats.missing_keywords.iter().map(String::as_str).take(5).collect();

    let mut lines = vec![format!("**Score: {}/100**", ats.final_score), String::new()];

    lines.push("Strengths:".to_string());
    if matched.is_empty() {
        lines.push("- The resume text is machine-readable, so ATS filters can parse it.".to_string());
    } else {
        lines.push(format!("- Mentions relevant keywords: {}.", dedup_join(&matched)));
    }
    if ats.role.fuzzy.is_empty() {
        lines.push(format!("- Content can be mapped against the {title} profile."));
    } else {
        let near: Vec<&str> = ats.role.fuzzy.iter().map(|f| f.matched_text.as_str()).collect();
        lines.push(format!("- Close variants of key terms appear: {}.", dedup_join(&near)));
    }

    lines.push(String::new());
    lines.push("Areas to Improve:".to_string());
    if missing.is_empty() {
        lines.push("- Keyword coverage is complete; quantify outcomes to stand out.".to_string());
    } else {
        lines.push(format!("- Add evidence for missing keywords: {}.", missing.join(", ")));
    }
    lines.push(format!(
        "- Mirror the exact wording a {title} posting uses so keyword filters match."
    ));

    if request.mode == ReviewMode::Detailed {
        lines.push(String::new());
        lines.push(format!(
            "Role keyword coverage is {}/100 and job-description coverage is {}/100. \
             The final score takes the better of the two. Fuzzy matches earn partial credit, \
             so prefer the exact term where it is accurate.",
            ats.role.score, ats.jd.score
        ));
    }

    lines.join("\n")
}

fn dedup_join(items: &[&str]) -> String {
    let mut seen: Vec<&str> = Vec::new();
    for item in items {
        if !seen.contains(item) {
            seen.push(item);
        }
    }
    seen.join(", ")
}

fn score_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)score\s*:\s*\**\s*(\d{1,3})\s*/\s*100").expect("static score pattern is valid")
    })
}

/// Extracts `N` from the first `Score: N/100`, tolerating markdown emphasis.
pub fn parse_feedback_score(text: &str) -> Option<u32> {
    score_pattern()
        .captures(text)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse::<u32>().ok())
        .map(|n| n.min(100))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ats::{combine, match_jd_keywords, match_role, MatchOptions, ScoreCurve};

    fn request(mode: ReviewMode) -> ReviewRequest {
        ReviewRequest {
            resume_text: "Python developer building REST api services with SQL".to_string(),
            job_title: "Software Engineer".to_string(),
            job_description: None,
            mode,
        }
    }

    fn ats_for(req: &ReviewRequest) -> AtsScore {
        let role = match_role(&req.resume_text, &req.job_title, &MatchOptions::default());
        let jd = match_jd_keywords(&req.resume_text, &["docker".to_string()], ScoreCurve::Linear);
        combine(role, jd)
    }

    #[test]
    fn test_parse_feedback_score_variants() {
        assert_eq!(parse_feedback_score("**Score: 82/100**\nStrengths"), Some(82));
        assert_eq!(parse_feedback_score("score:  7 / 100"), Some(7));
        assert_eq!(parse_feedback_score("Score: 140/100"), Some(100));
        assert_eq!(parse_feedback_score("No score here"), None);
    }

    #[test]
    fn test_effective_title_defaults() {
        let mut req = request(ReviewMode::Brief);
        req.job_title = "   ".to_string();
        assert_eq!(req.effective_title(), "general role");
    }

    #[test]
    fn test_review_mode_from_str() {
        assert_eq!("Detailed".parse::<ReviewMode>().unwrap(), ReviewMode::Detailed);
        assert!("verbose".parse::<ReviewMode>().is_err());
    }

    #[tokio::test]
    async fn test_keyword_reviewer_shape() {
        let req = request(ReviewMode::Brief);
        let ats = ats_for(&req);
        let review = KeywordReviewer.review(&req, &ats).await.unwrap();

        assert_eq!(review.backend, "keyword");
        assert_eq!(review.score, Some(ats.final_score));
        assert_eq!(parse_feedback_score(&review.feedback), Some(ats.final_score));
        assert!(review.feedback.contains("Strengths:"));
        assert!(review.feedback.contains("Areas to Improve:"));
        assert!(review.feedback.contains("docker"));
        assert!(review.feedback.contains("java"));
    }

    #[tokio::test]
    async fn test_keyword_reviewer_detailed_adds_explanation() {
        let brief_req = request(ReviewMode::Brief);
        let detailed_req = request(ReviewMode::Detailed);
        let ats = ats_for(&brief_req);
        let brief = KeywordReviewer.review(&brief_req, &ats).await.unwrap();
        let detailed = KeywordReviewer.review(&detailed_req, &ats).await.unwrap();
        assert!(detailed.feedback.len() > brief.feedback.len());
        assert!(detailed.feedback.contains("job-description coverage"));
    }

    #[test]
    fn test_dedup_join_keeps_first_occurrence_order() {
        assert_eq!(dedup_join(&["python", "sql", "python"]), "python, sql");
    }

    #[tokio::test]
    async fn test_llm_reviewer_parses_score_from_reply() {
        use crate::llm_client::{stub_server::StubServer, LlmClient};

        let server = StubServer::start(vec![
            (429, r#"{"message": "too many requests"}"#),
            (200, r#"{"text": "**Score: 64/100**\nStrengths:\n- SQL"}"#),
        ])
        .await;
        let client = LlmClient::with_endpoint(
            "test-key".to_string(),
            server.endpoint(),
            std::time::Duration::from_millis(5),
        )
        .unwrap();
        let reviewer = LlmReviewer(client);
        let req = request(ReviewMode::Detailed);

        let review = reviewer.review(&req, &ats_for(&req)).await.unwrap();
        assert_eq!(review.score, Some(64));
        assert_eq!(review.backend, "llm");
        assert!(review.feedback.starts_with("**Score: 64/100**"));
        assert_eq!(server.hits(), 2);
    }

    #[tokio::test]
    async fn test_llm_reviewer_surfaces_unauthorized() {
        use crate::llm_client::{stub_server::StubServer, LlmClient, LlmError};

        let server = StubServer::start(vec![(401, r#"{"message": "invalid api token"}"#)]).await;
        let client = LlmClient::with_endpoint(
            "bad-key".to_string(),
            server.endpoint(),
            std::time::Duration::from_millis(5),
        )
        .unwrap();
        let req = request(ReviewMode::Brief);

        let err = LlmReviewer(client).review(&req, &ats_for(&req)).await.unwrap_err();
        assert!(matches!(err, AppError::Llm(LlmError::Api { status: 401, .. })));
        assert_eq!(err.user_message(), "❌ Invalid Cohere API key.");
    }
}
