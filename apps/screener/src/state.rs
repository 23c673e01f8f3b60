use std::sync::Arc;

use tracing::{info, warn};

use crate::ats::MatchOptions;
use crate::classifier::CategoryClassifier;
use crate::config::Config;
use crate::errors::AppError;
use crate::llm_client::{self, LlmClient};
use crate::review::{KeywordReviewer, LlmReviewer, Reviewer};

/// Shared state for one screening run.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Pluggable reviewer. LlmReviewer when an API key is present, else KeywordReviewer.
    pub reviewer: Arc<dyn Reviewer>,
    /// None when the model file is missing; the report then shows "Unavailable".
    pub classifier: Option<Arc<CategoryClassifier>>,
    pub match_options: MatchOptions,
}

impl AppState {
    pub fn build(config: Config, offline: bool) -> Result<Self, AppError> {
        let reviewer: Arc<dyn Reviewer> = match (&config.cohere_api_key, offline) {
            (Some(key), false) => {
                let llm = LlmClient::new(key.clone())?;
                info!("LLM client initialized (model: {})", llm_client::MODEL);
                Arc::new(LlmReviewer(llm))
            }
            (None, false) => {
                warn!("COHERE_API_KEY is not set; falling back to offline keyword feedback");
                Arc::new(KeywordReviewer)
            }
            (_, true) => {
                info!("Offline mode: using keyword feedback");
                Arc::new(KeywordReviewer)
            }
        };

        let classifier = if config.classifier_model_path.exists() {
            Some(Arc::new(CategoryClassifier::load(&config.classifier_model_path)?))
        } else {
            warn!(
                "Category model not found at {}; category will be reported as unavailable",
                config.classifier_model_path.display()
            );
            None
        };

        let match_options = MatchOptions {
            curve: config.score_curve,
            fuzzy_threshold: config.fuzzy_threshold,
            fuzzy_weight: config.fuzzy_weight,
        };

        Ok(Self {
            config,
            reviewer,
            classifier,
            match_options,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn config(api_key: Option<&str>) -> Config {
        Config {
            cohere_api_key: api_key.map(String::from),
            classifier_model_path: PathBuf::from("/nonexistent/category_model.json"),
            jd_top_keywords: 10,
            score_curve: crate::ats::ScoreCurve::Sqrt,
            fuzzy_threshold: 0.9,
            fuzzy_weight: 0.25,
            rust_log: "info".to_string(),
        }
    }

    #[test]
    fn test_missing_key_uses_keyword_reviewer() {
        let state = AppState::build(config(None), false).unwrap();
        assert_eq!(state.reviewer.backend(), "keyword");
        assert!(state.classifier.is_none());
    }

    #[test]
    fn test_key_selects_llm_reviewer_unless_offline() {
        let state = AppState::build(config(Some("key")), false).unwrap();
        assert_eq!(state.reviewer.backend(), "llm");
        let offline = AppState::build(config(Some("key")), true).unwrap();
        assert_eq!(offline.reviewer.backend(), "keyword");
    }

    #[test]
    fn test_match_options_follow_config() {
        let state = AppState::build(config(None), true).unwrap();
        assert_eq!(state.match_options.curve, crate::ats::ScoreCurve::Sqrt);
        assert_eq!(state.match_options.fuzzy_threshold, 0.9);
        assert_eq!(state.match_options.fuzzy_weight, 0.25);
    }
}
