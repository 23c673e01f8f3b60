use std::path::PathBuf;

use anyhow::{bail, Context, Result};

use crate::ats::ScoreCurve;

const DEFAULT_MODEL_PATH: &str = "models/category_model.json";
const DEFAULT_TOP_KEYWORDS: usize = 10;
const DEFAULT_FUZZY_THRESHOLD: f64 = 0.92;
const DEFAULT_FUZZY_WEIGHT: f64 = 0.5;

/// Screener configuration loaded from environment variables.
/// Only malformed values are fatal; every variable has a usable default.
#[derive(Debug, Clone)]
pub struct Config {
    /// Absent key switches the reviewer to the offline keyword backend.
    pub cohere_api_key: Option<String>,
    pub classifier_model_path: PathBuf,
    pub jd_top_keywords: usize,
    pub score_curve: ScoreCurve,
    pub fuzzy_threshold: f64,
    /// Credit for a fuzzy keyword hit, relative to an exact hit.
    pub fuzzy_weight: f64,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            cohere_api_key: optional_env("COHERE_API_KEY"),
            classifier_model_path: optional_env("CLASSIFIER_MODEL_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_MODEL_PATH)),
            jd_top_keywords: parse_env("JD_TOP_KEYWORDS", DEFAULT_TOP_KEYWORDS)?,
            score_curve: optional_env("ATS_SCORE_CURVE")
                .map(|v| v.parse::<ScoreCurve>())
                .transpose()
                .context("ATS_SCORE_CURVE must be 'linear' or 'sqrt'")?
                .unwrap_or_default(),
            fuzzy_threshold: parse_unit_interval(
                "ATS_FUZZY_THRESHOLD",
                parse_env("ATS_FUZZY_THRESHOLD", DEFAULT_FUZZY_THRESHOLD)?,
            )?,
            fuzzy_weight: parse_unit_interval(
                "ATS_FUZZY_WEIGHT",
                parse_env("ATS_FUZZY_WEIGHT", DEFAULT_FUZZY_WEIGHT)?,
            )?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

/// Reads a variable, treating empty strings as unset.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match optional_env(key) {
        Some(raw) => raw
            .parse::<T>()
            .with_context(|| format!("Environment variable '{key}' has an invalid value '{raw}'")),
        None => Ok(default),
    }
}

fn parse_unit_interval(key: &str, value: f64) -> Result<f64> {
    if !(0.0..=1.0).contains(&value) {
        bail!("{key} must be between 0.0 and 1.0, got {value}");
    }
    Ok(value)
}
