// ATS keyword engine: TF-IDF keyword extraction, role/JD keyword matching,
// score curving and role suggestions. Pure functions, no I/O.

pub mod matcher;
pub mod roles;
pub mod tfidf;

pub use matcher::{combine, match_jd_keywords, match_role, AtsScore, MatchOptions, ScoreCurve};
pub use roles::{suggest_roles, RoleSuggestion};
pub use tfidf::extract_keywords;
