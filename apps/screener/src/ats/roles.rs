//! Static role tables: keywords per target title, and signals for role suggestions.

use serde::{Deserialize, Serialize};

/// Keywords an ATS would look for, keyed by lowercase job title.
const ROLE_KEYWORDS: &[(&str, &[&str])] = &[
    (
        "data scientist",
        &["machine learning", "python", "data", "model", "analysis"],
    ),
    (
        "software engineer",
        &["java", "python", "api", "sql", "development"],
    ),
    ("hr", &["recruiting", "payroll", "training", "compliance"]),
    ("designer", &["adobe", "figma", "ui", "ux", "illustrator"]),
];

/// Resume signals that point towards a role.
const SUGGESTION_SIGNALS: &[(&str, &[&str])] = &[
    (
        "Data Scientist",
        &["machine learning", "pandas", "dataframe", "statistics"],
    ),
    (
        "Software Engineer",
        &["java", "c++", "backend", "frontend", "api", "django", "flask"],
    ),
    (
        "HR",
        &["employee relations", "recruiting", "onboarding", "training"],
    ),
    ("Designer", &["photoshop", "illustrator", "figma", "ux", "ui"]),
    (
        "Manager",
        &["project management", "team lead", "planning", "budgeting"],
    ),
];

/// Keywords for a lowercase title; empty for titles not in the table.
pub fn role_keywords(title: &str) -> &'static [&'static str] {
    ROLE_KEYWORDS
        .iter()
        .find(|(role, _)| *role == title)
        .map(|(_, keywords)| *keywords)
        .unwrap_or(&[])
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleSuggestion {
    pub role: String,
    pub matched_keywords: Vec<String>,
    pub hits: usize,
}

/// Roles whose signals appear (case-insensitive substring) in the resume,
/// ranked by number of distinct signals hit, then by role name.
pub fn suggest_roles(resume_text: &str) -> Vec<RoleSuggestion> {
    let lower = resume_text.to_lowercase();

    let mut suggestions: Vec<RoleSuggestion> = SUGGESTION_SIGNALS
        .iter()
        .filter_map(|(role, signals)| {
            let matched_keywords: Vec<String> = signals
                .iter()
                .filter(|s| lower.contains(*s))
                .map(|s| s.to_string())
                .collect();
            (!matched_keywords.is_empty()).then(|| RoleSuggestion {
                role: role.to_string(),
                hits: matched_keywords.len(),
                matched_keywords,
            })
        })
        .collect();

    suggestions.sort_by(|a, b| b.hits.cmp(&a.hits).then_with(|| a.role.cmp(&b.role)));
    suggestions
}
