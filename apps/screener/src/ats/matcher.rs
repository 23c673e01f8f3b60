//! Keyword matching against a resume.
//!
//! Role match: exact word-boundary hit → weight 1.0, fuzzy token hit → `fuzzy_weight`.
//! JD match: case-insensitive substring hit.
//! Both ratios pass through a `ScoreCurve` into an integer 0–100 score.

use std::collections::BTreeSet;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strsim::jaro_winkler;

use crate::ats::roles::role_keywords;
use crate::ats::tfidf::tokenize;

/// Keywords shorter than this never fuzzy-match ("ui" vs "uk" is noise).
const MIN_FUZZY_KEYWORD_LEN: usize = 5;
/// Absorbs float error so 0.29 * 100 floors to 29, not 28.
const CURVE_EPSILON: f64 = 1e-9;

/// Maps a coverage ratio in 0.0–1.0 to a 0–100 score.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreCurve {
    #[default]
    Linear,
    Sqrt,
}

impl ScoreCurve {
    pub fn apply(&self, ratio: f64) -> u32 {
        let ratio = ratio.clamp(0.0, 1.0);
        let curved = match self {
            ScoreCurve::Linear => ratio,
            ScoreCurve::Sqrt => ratio.sqrt(),
        };
        ((curved * 100.0 + CURVE_EPSILON).floor() as u32).min(100)
    }
}

impl FromStr for ScoreCurve {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "linear" => Ok(ScoreCurve::Linear),
            "sqrt" => Ok(ScoreCurve::Sqrt),
            other => Err(anyhow::anyhow!("unknown score curve '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct MatchOptions {
    pub curve: ScoreCurve,
    /// Minimum Jaro-Winkler similarity for a fuzzy hit.
    pub fuzzy_threshold: f64,
    /// Credit given to a fuzzy hit relative to an exact one.
    pub fuzzy_weight: f64,
}

impl Default for MatchOptions {
    fn default() -> Self {
        Self {
            curve: ScoreCurve::Linear,
            fuzzy_threshold: 0.92,
            fuzzy_weight: 0.5,
        }
    }
}

/// A keyword credited through a near-miss token rather than an exact hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FuzzyHit {
    pub keyword: String,
    pub matched_text: String,
    pub similarity: f64,
}

/// Outcome of matching one keyword list against a resume.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KeywordMatch {
    pub score: u32,
    pub ratio: f64,
    pub total_keywords: usize,
    pub matched: Vec<String>,
    pub fuzzy: Vec<FuzzyHit>,
    pub missing: Vec<String>,
}

/// Combined ATS result: the better of the role and JD scores, union of gaps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AtsScore {
    pub final_score: u32,
    pub role: KeywordMatch,
    pub jd: KeywordMatch,
    pub missing_keywords: Vec<String>,
}

/// Scores a resume against the built-in keyword list for `job_title`.
/// Unknown titles have no keywords and score 0.
pub fn match_role(resume_text: &str, job_title: &str, options: &MatchOptions) -> KeywordMatch {
    let title = job_title.trim().to_lowercase();
    let keywords = role_keywords(&title);
    if keywords.is_empty() {
        return KeywordMatch::default();
    }

    let lower = resume_text.to_lowercase();
    let tokens: BTreeSet<String> = tokenize(resume_text).into_iter().collect();

    let mut matched = Vec::new();
    let mut fuzzy = Vec::new();
    let mut missing = Vec::new();
    let mut credit = 0.0_f64;

    for &keyword in keywords {
        if contains_word(&lower, keyword) {
            matched.push(keyword.to_string());
            credit += 1.0;
        } else if let Some(hit) = best_fuzzy_hit(keyword, &tokens, options.fuzzy_threshold) {
            credit += options.fuzzy_weight;
            fuzzy.push(hit);
        } else {
            missing.push(keyword.to_string());
        }
    }

    missing.sort();
    let ratio = credit / keywords.len() as f64;

    KeywordMatch {
        score: options.curve.apply(ratio),
        ratio,
        total_keywords: keywords.len(),
        matched,
        fuzzy,
        missing,
    }
}

/// Scores a resume against extracted JD keywords by case-insensitive substring.
pub fn match_jd_keywords(resume_text: &str, keywords: &[String], curve: ScoreCurve) -> KeywordMatch {
    if keywords.is_empty() {
        return KeywordMatch::default();
    }

    let lower = resume_text.to_lowercase();
    let (matched, missing): (Vec<String>, Vec<String>) = keywords
        .iter()
        .cloned()
        .partition(|kw| lower.contains(&kw.to_lowercase()));

    let missing: Vec<String> = missing
        .into_iter()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let ratio = matched.len() as f64 / keywords.len() as f64;

    KeywordMatch {
        score: curve.apply(ratio),
        ratio,
        total_keywords: keywords.len(),
        matched,
        fuzzy: Vec::new(),
        missing,
    }
}

pub fn combine(role: KeywordMatch, jd: KeywordMatch) -> AtsScore {
    let missing_keywords: Vec<String> = role
        .missing
        .iter()
        .chain(jd.missing.iter())
        .cloned()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    AtsScore {
        final_score: role.score.max(jd.score),
        role,
        jd,
        missing_keywords,
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// True if `needle` occurs in `haystack` with no word character on either side.
fn contains_word(haystack: &str, needle: &str) -> bool {
    if needle.is_empty() {
        return false;
    }
    haystack.match_indices(needle).any(|(start, _)| {
        let before = haystack[..start].chars().next_back();
        let after = haystack[start + needle.len()..].chars().next();
        !before.is_some_and(is_word_char) && !after.is_some_and(is_word_char)
    })
}

fn best_fuzzy_hit(keyword: &str, tokens: &BTreeSet<String>, threshold: f64) -> Option<FuzzyHit> {
    if keyword.chars().count() < MIN_FUZZY_KEYWORD_LEN || keyword.contains(' ') {
        return None;
    }

    tokens
        .iter()
        .map(|token| (token, jaro_winkler(keyword, token)))
        .filter(|(_, similarity)| *similarity >= threshold)
        .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(token, similarity)| FuzzyHit {
            keyword: keyword.to_string(),
            matched_text: token.clone(),
            similarity,
        })
}
