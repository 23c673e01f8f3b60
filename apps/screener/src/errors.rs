use thiserror::Error;

use crate::llm_client::LlmError;

/// Application-level error type.
/// The CLI prints `user_message()` and exits with `exit_code()`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Text extraction failed: {0}")]
    Extraction(String),

    #[error("Classifier error: {0}")]
    Classifier(String),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Text shown to the person running the screener.
    /// Provider failures are translated by status code; internals are logged, not shown.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Validation(msg) => format!("❌ {msg}"),
            AppError::Extraction(msg) => format!("❌ Could not read the resume: {msg}"),
            AppError::Classifier(msg) => format!("❌ Category model problem: {msg}"),
            AppError::Llm(LlmError::Api { status: 401, .. }) => {
                "❌ Invalid Cohere API key.".to_string()
            }
            AppError::Llm(LlmError::Api { status: 429, .. })
            | AppError::Llm(LlmError::RateLimited { .. }) => {
                "❌ Rate limit exceeded. Try again later.".to_string()
            }
            AppError::Llm(LlmError::Api { status: 500, .. }) => {
                "❌ Server error. Please try again later.".to_string()
            }
            AppError::Llm(LlmError::Http(e)) => {
                tracing::error!("LLM transport error: {e}");
                format!("❌ HTTP error: {e}")
            }
            AppError::Llm(LlmError::Api { status, message }) => {
                tracing::error!("LLM API error {status}: {message}");
                format!("❌ HTTP error {status}: {message}")
            }
            AppError::Llm(e) => {
                tracing::error!("LLM error: {e}");
                format!("❌ {e}")
            }
            AppError::Io(e) => format!("❌ File error: {e}"),
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                format!("❌ Unexpected error: {e}")
            }
        }
    }

    /// Process exit code: 2 for bad input, 3 for provider failures, 1 otherwise.
    pub fn exit_code(&self) -> i32 {
        match self {
            AppError::Validation(_) | AppError::Extraction(_) | AppError::Classifier(_) => 2,
            AppError::Llm(_) => 3,
            AppError::Io(_) | AppError::Internal(_) => 1,
        }
    }
}
