//! Resume ingestion: text extraction from PDF / plain text / markdown, and a
//! freshness estimate from the most recent year mentioned.

use std::fmt;
use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::errors::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResumeFormat {
    Pdf,
    PlainText,
    Markdown,
}

impl ResumeFormat {
    pub fn from_path(path: &Path) -> Result<Self, AppError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();

        match ext.as_str() {
            "pdf" => Ok(ResumeFormat::Pdf),
            "txt" => Ok(ResumeFormat::PlainText),
            "md" | "markdown" => Ok(ResumeFormat::Markdown),
            _ => Err(AppError::Validation(format!(
                "Unsupported resume format '{}'. Use a .pdf, .txt or .md file.",
                path.display()
            ))),
        }
    }
}

/// How recently the resume appears to have been updated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Freshness {
    UpdatedRecently,
    UpdatedWithinThreeYears,
    Outdated,
    Unknown,
}

impl fmt::Display for Freshness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Freshness::UpdatedRecently => "Updated Recently",
            Freshness::UpdatedWithinThreeYears => "Updated within last 2-3 years",
            Freshness::Outdated => "Outdated",
            Freshness::Unknown => "Unknown",
        };
        f.write_str(label)
    }
}

/// Reads a resume from disk and returns its text.
/// PDF parsing is CPU-bound and runs on the blocking pool.
pub async fn extract_text(path: &Path) -> Result<String, AppError> {
    let format = ResumeFormat::from_path(path)?;
    let bytes = tokio::fs::read(path).await?;
    info!("Read {} bytes from {}", bytes.len(), path.display());

    let text = tokio::task::spawn_blocking(move || extract_text_from_bytes(&bytes, format))
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("spawn_blocking failed in extraction: {e}")))??;

    ensure_has_text(text)
}

/// Extracts text from in-memory document bytes.
pub fn extract_text_from_bytes(bytes: &[u8], format: ResumeFormat) -> Result<String, AppError> {
    match format {
        ResumeFormat::Pdf => pdf_extract::extract_text_from_mem(bytes)
            .map_err(|e| AppError::Extraction(format!("PDF extraction failed: {e}"))),
        ResumeFormat::PlainText | ResumeFormat::Markdown => String::from_utf8(bytes.to_vec())
            .map_err(|e| AppError::Extraction(format!("File is not valid UTF-8: {e}"))),
    }
}

fn ensure_has_text(text: String) -> Result<String, AppError> {
    if text.trim().is_empty() {
        return Err(AppError::Validation(
            "The resume contains no extractable text (is it a scanned image?)".to_string(),
        ));
    }
    debug!("Extracted {} characters of resume text", text.len());
    Ok(text)
}

fn year_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\b(20\d{2}|19\d{2})\b").expect("static year pattern is valid"))
}

/// Guesses recency from the latest 19xx/20xx year in the text.
pub fn estimate_freshness(text: &str, current_year: i32) -> Freshness {
    let latest = year_pattern()
        .find_iter(text)
        .filter_map(|m| m.as_str().parse::<i32>().ok())
        .max();

    match latest {
        None => Freshness::Unknown,
        Some(year) => match current_year - year {
            diff if diff <= 1 => Freshness::UpdatedRecently,
            diff if diff <= 3 => Freshness::UpdatedWithinThreeYears,
            _ => Freshness::Outdated,
        },
    }
}
