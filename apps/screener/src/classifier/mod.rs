//! Career-category classifier backed by a pretrained linear model.
//!
//! The model is exported once from the training pipeline as JSON:
//! ```json
//! {
//!   "classes": ["Data Science", "HR"],
//!   "vocabulary": {"python": 0, "payroll": 1},
//!   "idf": [1.2, 1.9],
//!   "coef": [[0.8, -0.4], [-0.8, 0.4]],
//!   "intercept": [0.1, -0.1]
//! }
//! ```
//! A binary model may carry a single coefficient row; a positive decision
//! then selects the second class.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::ats::tfidf::{l2_normalize, term_counts, tokenize};
use crate::errors::AppError;

/// Category reported when no model could be loaded.
pub const UNAVAILABLE_CATEGORY: &str = "Unavailable";

#[derive(Debug, Clone, Deserialize)]
struct ModelFile {
    classes: Vec<String>,
    vocabulary: HashMap<String, usize>,
    idf: Vec<f64>,
    coef: Vec<Vec<f64>>,
    intercept: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub category: String,
    /// Gap between the winning decision value and the runner-up.
    pub confidence_margin: f64,
}

#[derive(Debug, Clone)]
pub struct CategoryClassifier {
    model: ModelFile,
}

impl CategoryClassifier {
    pub fn load(path: &Path) -> Result<Self, AppError> {
        let raw = std::fs::read_to_string(path)?;
        let classifier = Self::from_json(&raw)?;
        info!(
            "Loaded category model from {} ({} classes, {} terms)",
            path.display(),
            classifier.model.classes.len(),
            classifier.model.vocabulary.len()
        );
        Ok(classifier)
    }

    pub fn from_json(raw: &str) -> Result<Self, AppError> {
        let model: ModelFile = serde_json::from_str(raw)
            .map_err(|e| AppError::Classifier(format!("invalid model file: {e}")))?;
        validate(&model)?;
        Ok(Self { model })
    }

    #[cfg(test)]
    pub fn classes(&self) -> &[String] {
        &self.model.classes
    }

    pub fn predict(&self, text: &str) -> Prediction {
        let features = self.vectorize(text);
        let decisions: Vec<f64> = self
            .model
            .coef
            .iter()
            .zip(&self.model.intercept)
            .map(|(row, bias)| dot(row, &features) + bias)
            .collect();

        if decisions.len() == 1 {
            let decision = decisions[0];
            let index = usize::from(decision > 0.0);
            return Prediction {
                category: self.model.classes[index].clone(),
                confidence_margin: decision.abs(),
            };
        }

        let mut best = 0;
        for (i, value) in decisions.iter().enumerate() {
            if *value > decisions[best] {
                best = i;
            }
        }
        let runner_up = decisions
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != best)
            .map(|(_, v)| *v)
            .fold(f64::NEG_INFINITY, f64::max);

        Prediction {
            category: self.model.classes[best].clone(),
            confidence_margin: decisions[best] - runner_up,
        }
    }

    /// Sparse term counts × idf, L2-normalised, as `(column, weight)` pairs.
    fn vectorize(&self, text: &str) -> Vec<(usize, f64)> {
        let tokens = tokenize(text);
        let mut features: Vec<(usize, f64)> = term_counts(&tokens)
            .into_iter()
            .filter_map(|(term, count)| {
                self.model
                    .vocabulary
                    .get(term)
                    .map(|&col| (col, count as f64 * self.model.idf[col]))
            })
            .collect();

        let mut weights: Vec<f64> = features.iter().map(|(_, w)| *w).collect();
        l2_normalize(&mut weights);
        for (feature, weight) in features.iter_mut().zip(weights) {
            feature.1 = weight;
        }
        features
    }
}

fn dot(row: &[f64], features: &[(usize, f64)]) -> f64 {
    features.iter().map(|(col, w)| row[*col] * w).sum()
}

fn validate(model: &ModelFile) -> Result<(), AppError> {
    let columns = model.idf.len();
    let invalid = |msg: String| Err(AppError::Classifier(msg));

    if model.classes.len() < 2 {
        return invalid("model needs at least two classes".to_string());
    }
    let expected_rows = if model.classes.len() == 2 && model.coef.len() == 1 {
        1
    } else {
        model.classes.len()
    };
    if model.coef.len() != expected_rows || model.intercept.len() != expected_rows {
        return invalid(format!(
            "expected {expected_rows} coefficient rows and intercepts, got {} and {}",
            model.coef.len(),
            model.intercept.len()
        ));
    }
    if let Some(row) = model.coef.iter().find(|r| r.len() != columns) {
        return invalid(format!(
            "coefficient row has {} columns, idf has {columns}",
            row.len()
        ));
    }
    if let Some((term, col)) = model.vocabulary.iter().find(|(_, col)| **col >= columns) {
        return invalid(format!("term '{term}' maps to column {col}, beyond {columns}"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const MULTICLASS_MODEL: &str = r#"{
        "classes": ["Data Science", "HR", "Design"],
        "vocabulary": {"python": 0, "pandas": 1, "payroll": 2, "recruiting": 3, "figma": 4},
        "idf": [1.0, 1.5, 1.5, 1.2, 1.7],
        "coef": [
            [1.2, 1.4, -0.5, -0.5, -0.3],
            [-0.6, -0.4, 1.5, 1.3, -0.2],
            [-0.3, -0.2, -0.4, -0.3, 1.8]
        ],
        "intercept": [0.0, 0.05, -0.05]
    }"#;

    const BINARY_MODEL: &str = r#"{
        "classes": ["Non-Technical", "Technical"],
        "vocabulary": {"rust": 0, "sales": 1},
        "idf": [1.0, 1.0],
        "coef": [[2.0, -2.0]],
        "intercept": [0.0]
    }"#;

    #[test]
    fn test_multiclass_prediction() {
        let classifier = CategoryClassifier::from_json(MULTICLASS_MODEL).unwrap();
        assert_eq!(classifier.predict("Python and pandas notebooks").category, "Data Science");
        assert_eq!(classifier.predict("Payroll, recruiting, payroll").category, "HR");
        assert_eq!(classifier.predict("Figma prototypes").category, "Design");
    }

    #[test]
    fn test_margin_is_positive_for_clear_winner() {
        let classifier = CategoryClassifier::from_json(MULTICLASS_MODEL).unwrap();
        assert!(classifier.predict("figma").confidence_margin > 0.5);
    }

    #[test]
    fn test_unknown_vocabulary_falls_to_intercept() {
        let classifier = CategoryClassifier::from_json(MULTICLASS_MODEL).unwrap();
        assert_eq!(classifier.predict("juggling unicycles").category, "HR");
    }

    #[test]
    fn test_binary_single_row_model() {
        let classifier = CategoryClassifier::from_json(BINARY_MODEL).unwrap();
        assert_eq!(classifier.predict("Rust services").category, "Technical");
        assert_eq!(classifier.predict("Enterprise sales").category, "Non-Technical");
    }

    #[test]
    fn test_dimension_mismatch_rejected() {
        let bad = r#"{
            "classes": ["A", "B", "C"],
            "vocabulary": {"x": 0},
            "idf": [1.0],
            "coef": [[1.0], [1.0]],
            "intercept": [0.0, 0.0]
        }"#;
        assert!(matches!(CategoryClassifier::from_json(bad), Err(AppError::Classifier(_))));
    }

    #[test]
    fn test_vocabulary_column_out_of_range_rejected() {
        let bad = r#"{
            "classes": ["A", "B"],
            "vocabulary": {"x": 3},
            "idf": [1.0],
            "coef": [[1.0], [1.0]],
            "intercept": [0.0, 0.0]
        }"#;
        assert!(CategoryClassifier::from_json(bad).is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(BINARY_MODEL.as_bytes()).unwrap();
        let classifier = CategoryClassifier::load(file.path()).unwrap();
        assert_eq!(classifier.classes().len(), 2);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let result = CategoryClassifier::load(Path::new("/nonexistent/model.json"));
        assert!(matches!(result, Err(AppError::Io(_))));
    }
}
