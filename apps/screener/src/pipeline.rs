//! Screening pipeline — one resume, one report.
//!
//! Flow: JD keywords → ATS role + JD match → review → classify →
//!       freshness → role suggestions → ScreeningReport.

use chrono::{Datelike, Utc};
use tracing::info;
use uuid::Uuid;

use crate::ats::{combine, extract_keywords, match_jd_keywords, match_role, suggest_roles};
use crate::classifier::UNAVAILABLE_CATEGORY;
use crate::errors::AppError;
use crate::extraction::estimate_freshness;
use crate::report::ScreeningReport;
use crate::review::{ReviewMode, ReviewRequest};
use crate::state::AppState;

#[derive(Debug, Clone)]
pub struct ScreeningRequest {
    pub resume_text: String,
    pub job_title: String,
    pub job_description: Option<String>,
    pub mode: ReviewMode,
}

/// Runs every screening step over already-extracted resume text.
pub async fn screen_resume(
    state: &AppState,
    request: ScreeningRequest,
) -> Result<ScreeningReport, AppError> {
    if request.resume_text.trim().is_empty() {
        return Err(AppError::Validation("Resume text cannot be empty".to_string()));
    }

    let job_description = request
        .job_description
        .filter(|jd| !jd.trim().is_empty());

    // Step 1: JD keywords, from the title when no JD was given
    let keyword_source = job_description.as_deref().unwrap_or(&request.job_title);
    let jd_keywords = extract_keywords(keyword_source, state.config.jd_top_keywords);
    info!("Extracted {} JD keywords", jd_keywords.len());

    // Step 2: ATS match
    let role_match = match_role(&request.resume_text, &request.job_title, &state.match_options);
    let jd_match = match_jd_keywords(&request.resume_text, &jd_keywords, state.match_options.curve);
    let ats = combine(role_match, jd_match);
    info!(
        "ATS score: {}/100 (role {}, jd {})",
        ats.final_score, ats.role.score, ats.jd.score
    );

    // Step 3: Feedback
    let review_request = ReviewRequest {
        resume_text: request.resume_text.clone(),
        job_title: request.job_title.clone(),
        job_description: job_description.clone(),
        mode: request.mode,
    };
    let review = state.reviewer.review(&review_request, &ats).await?;
    info!("Feedback generated by {} reviewer", review.backend);

    // Step 4: Category
    let category = match &state.classifier {
        Some(classifier) => {
            let prediction = classifier.predict(&request.resume_text);
            info!(
                "Predicted category: {} (margin {:.3})",
                prediction.category, prediction.confidence_margin
            );
            prediction.category
        }
        None => UNAVAILABLE_CATEGORY.to_string(),
    };

    // Step 5: Freshness and suggestions
    let freshness = estimate_freshness(&request.resume_text, Utc::now().year());
    let suggested_roles = suggest_roles(&request.resume_text);

    Ok(ScreeningReport {
        report_id: Uuid::new_v4(),
        generated_at: Utc::now(),
        target_role: review_request.effective_title().to_string(),
        feedback: review.feedback,
        feedback_score: review.score,
        reviewer_backend: review.backend,
        category,
        ats,
        freshness,
        suggested_roles,
        jd_keywords,
    })
}
