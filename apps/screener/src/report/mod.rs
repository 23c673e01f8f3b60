//! Report rendering — terminal markdown, standalone HTML, PDF and JSON.

pub mod html;
pub mod pdf;

use std::fmt::Write as _;

use chrono::{DateTime, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ats::{AtsScore, RoleSuggestion};
use crate::errors::AppError;
use crate::extraction::Freshness;

pub use html::render_html;
pub use pdf::render_pdf;

const HEADING_MARKERS: &[&str] = &["strength", "area", "improve"];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Markdown,
    Html,
    Json,
    Pdf,
}

impl OutputFormat {
    pub fn file_extension(&self) -> &'static str {
        match self {
            OutputFormat::Markdown => "md",
            OutputFormat::Html => "html",
            OutputFormat::Json => "json",
            OutputFormat::Pdf => "pdf",
        }
    }

    /// Binary formats are always written to a file, never to the terminal.
    pub fn is_binary(&self) -> bool {
        matches!(self, OutputFormat::Pdf)
    }
}

/// Layout role of one feedback line in document reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedbackLine {
    Score,
    Heading,
    Body,
}

/// Splits feedback into trimmed, non-blank lines and tags each with its layout role.
/// Emphasis markers are ignored when deciding the role, not removed from the text.
pub fn classify_feedback(text: &str) -> Vec<(FeedbackLine, &str)> {
    text.trim()
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| {
            let plain = line.trim_matches('*').trim().to_lowercase();
            let kind = if plain.starts_with("score:") {
                FeedbackLine::Score
            } else if HEADING_MARKERS.iter().any(|m| plain.contains(m)) {
                FeedbackLine::Heading
            } else {
                FeedbackLine::Body
            };
            (kind, line)
        })
        .collect()
}

/// One labelled value of the report header block.
pub struct MetadataRow {
    pub icon: &'static str,
    pub label: &'static str,
    pub value: String,
}

pub fn metadata_rows(report: &ScreeningReport) -> Vec<MetadataRow> {
    let jd_keywords = if report.jd_keywords.is_empty() {
        "N/A".to_string()
    } else {
        report.jd_keywords.join(", ")
    };
    let row = |icon, label, value| MetadataRow { icon, label, value };

    vec![
        row("🎯", "Target Role", report.target_role.clone()),
        row("🧠", "Predicted Category", report.category.clone()),
        row("📊", "ATS Match Score", format!("{}/100", report.ats.final_score)),
        row("📅", "Resume Freshness", report.freshness.to_string()),
        row("📌", "Extracted JD Keywords", jd_keywords),
    ]
}

/// Everything produced by one screening run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScreeningReport {
    pub report_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub target_role: String,
    pub feedback: String,
    pub feedback_score: Option<u32>,
    pub reviewer_backend: String,
    pub category: String,
    pub ats: AtsScore,
    pub freshness: Freshness,
    pub suggested_roles: Vec<RoleSuggestion>,
    pub jd_keywords: Vec<String>,
}

impl ScreeningReport {
    /// Default file name when the report is saved without an explicit path.
    pub fn default_file_name(&self, format: OutputFormat) -> String {
        let id = self.report_id.simple().to_string();
        format!("resume_feedback_{}.{}", &id[..8], format.file_extension())
    }
}

/// Renders the report as the bytes to write for `format`.
pub fn render(report: &ScreeningReport, format: OutputFormat) -> Result<Vec<u8>, AppError> {
    match format {
        OutputFormat::Markdown => Ok(render_markdown(report).into_bytes()),
        OutputFormat::Html => Ok(render_html(report).into_bytes()),
        OutputFormat::Json => render_json(report).map(String::into_bytes),
        OutputFormat::Pdf => render_pdf(report),
    }
}

pub fn render_json(report: &ScreeningReport) -> Result<String, AppError> {
    serde_json::to_string_pretty(report)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to serialize report: {e}")))
}

pub fn render_markdown(report: &ScreeningReport) -> String {
    let mut out = String::new();

    // write! into a String cannot fail
    let _ = writeln!(out, "# 📄 Resume Screening Report\n");
    let _ = writeln!(out, "🎯 Target role: **{}**\n", report.target_role);

    let _ = writeln!(out, "## ✅ Feedback ({})\n", report.reviewer_backend);
    let _ = writeln!(out, "{}\n", report.feedback.trim());

    let _ = writeln!(out, "## 🧠 Predicted Resume Category\n");
    let _ = writeln!(out, "**{}**\n", report.category);

    let _ = writeln!(out, "## 📊 ATS Match Score\n");
    let _ = writeln!(
        out,
        "**Score:** {}/100 (role keywords {}/100, job description {}/100)\n",
        report.ats.final_score, report.ats.role.score, report.ats.jd.score
    );
    if report.ats.missing_keywords.is_empty() {
        let _ = writeln!(out, "_Your resume contains all relevant keywords!_\n");
    } else {
        let _ = writeln!(out, "**🔻 Missing Keywords:**");
        let _ = writeln!(out, "{}\n", report.ats.missing_keywords.join(", "));
    }
    if !report.ats.role.fuzzy.is_empty() {
        let near: Vec<String> = report
            .ats
            .role
            .fuzzy
            .iter()
            .map(|f| format!("{} ≈ {}", f.keyword, f.matched_text))
            .collect();
        let _ = writeln!(out, "Partial matches: {}\n", near.join(", "));
    }

    let _ = writeln!(out, "## 📅 Resume Freshness Estimate\n");
    let _ = writeln!(out, "🗓️ Last update appears to be from: **{}**\n", report.freshness);

    let _ = writeln!(out, "## 💡 Suggested Job Roles\n");
    if report.suggested_roles.is_empty() {
        let _ = writeln!(out, "_No strong matches found._\n");
    } else {
        let roles: Vec<&str> = report.suggested_roles.iter().map(|r| r.role.as_str()).collect();
        let _ = writeln!(out, "{}\n", roles.join(", "));
    }

    if !report.jd_keywords.is_empty() {
        let _ = writeln!(out, "## 📌 Extracted JD Keywords\n");
        let _ = writeln!(out, "{}\n", report.jd_keywords.join(", "));
    }

    out
}
